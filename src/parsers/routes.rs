use super::{coerce, ParseFailure, Record};
use crate::coerce::parse_int;
use crate::session::RawResponse;
use serde::Serialize;

/// One routing table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub net: String,
    pub gw: String,
    pub flags: String,
    pub uses: u64,
    pub mtu: u64,
    pub interface: String,
}

pub fn parse_routes_v4(response: &RawResponse) -> Result<Record, ParseFailure> {
    parse_routes(&response.body).map(Record::RoutesV4)
}

pub fn parse_routes_v6(response: &RawResponse) -> Result<Record, ParseFailure> {
    parse_routes(&response.body).map(Record::RoutesV6)
}

/// Parses `netstat -rW` style output
///
/// Columns are destination, gateway, flags, use count, MTU and interface;
/// trailing columns such as `Expire` are ignored. Banner and header lines
/// are skipped.
fn parse_routes(body: &str) -> Result<Vec<Route>, ParseFailure> {
    let mut routes = Vec::new();

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_banner(line) {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 6 {
            return Err(ParseFailure::Malformed(format!("route line {:?}", line)));
        }

        routes.push(Route {
            net: tokens[0].to_string(),
            gw: tokens[1].to_string(),
            flags: tokens[2].to_string(),
            uses: coerce("uses", parse_int(tokens[3]))?,
            mtu: coerce("mtu", parse_int(tokens[4]))?,
            interface: tokens[5].to_string(),
        });
    }

    Ok(routes)
}

fn is_banner(line: &str) -> bool {
    line.starts_with("Destination")
        || line.starts_with("Routing tables")
        || line.starts_with("Internet")
}
