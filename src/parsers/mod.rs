//! Endpoint parsers
//!
//! One normalization routine per endpoint, each turning a raw response body
//! into a fixed-schema record. Parsers are pure: no I/O, no session access,
//! and the same body always yields the same record.
//!
//! A parser either returns a fully populated record or fails with a
//! [`ParseFailure`] naming what was wrong. Fields some hardware legitimately
//! omits are `Option`; address-shaped fields degrade to
//! [`Validated::Malformed`](crate::coerce::Validated) instead of failing.

mod carp;
mod dhcp;
mod disks;
mod gateways;
mod general;
mod haproxy;
mod interfaces;
mod neighbors;
mod openvpn;
mod routes;
mod software;
mod states;
mod thermal;

pub use carp::{parse_carp, CarpInterface};
pub use dhcp::{parse_dhcp_leases, DhcpLease, DhcpStatus, PoolStatus, PoolUtilization};
pub use disks::{parse_disks, Disk};
pub use gateways::{parse_gateways, Gateway, GatewayStatus};
pub use general::{parse_general, GeneralStats};
pub use haproxy::{parse_haproxy, HaproxyObject};
pub use interfaces::{parse_interface_stats, InterfaceCounters};
pub use neighbors::{parse_arp, parse_ndp, ArpEntry, NdpEntry};
pub use openvpn::{parse_openvpn, OpenVpnConnection};
pub use routes::{parse_routes_v4, parse_routes_v6, Route};
pub use software::{parse_software_system, SoftwareVersion};
pub use states::{parse_states, TextRecord};
pub use thermal::{parse_thermal, ThermalSensor};

use crate::coerce::CoercionError;
use crate::session::RawResponse;
use crate::table::{extract_table_from_str, Columns, HeaderedTable, TableError, TableLocator};
use serde::Serialize;
use thiserror::Error;

/// Present on every status page; pages that only report "nothing
/// configured" render an alert box instead of a panel
pub(crate) const STATUS_PAGE: &str = "div.panel, div.alert";

/// Present on every populated status page
pub(crate) const STATUS_PANEL: &str = "div.panel";

/// Dashboard widgets answer with a bare table fragment
pub(crate) const WIDGET_TABLE: &str = "table";

/// Signature shared by every endpoint parser
pub type ParserFn = fn(&RawResponse) -> Result<Record, ParseFailure>;

/// Why a response body could not be normalized
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error("missing column {0:?}")]
    MissingColumn(String),

    #[error("missing field {0:?}")]
    MissingField(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized content: {0}")]
    Malformed(String),
}

/// One normalized result, tagged with the endpoint it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "endpoint", content = "data", rename_all = "snake_case")]
pub enum Record {
    General(GeneralStats),
    SoftwareSystem(SoftwareVersion),
    Thermal(Vec<ThermalSensor>),
    Disks(Vec<Disk>),
    InterfaceStats(Vec<InterfaceCounters>),
    OpenvpnConnections(Vec<OpenVpnConnection>),
    DhcpLeases(DhcpStatus),
    Gateways(Vec<Gateway>),
    RoutesV4(Vec<Route>),
    RoutesV6(Vec<Route>),
    Carp(Vec<CarpInterface>),
    Arp(Vec<ArpEntry>),
    Ndp(Vec<NdpEntry>),
    States(TextRecord),
    Haproxy(Vec<HaproxyObject>),
}

impl Record {
    /// Identifier of the endpoint that produced this record
    pub fn endpoint_id(&self) -> &'static str {
        match self {
            Self::General(_) => "general",
            Self::SoftwareSystem(_) => "software_system",
            Self::Thermal(_) => "thermal",
            Self::Disks(_) => "disks",
            Self::InterfaceStats(_) => "interface_stats",
            Self::OpenvpnConnections(_) => "openvpn_connections",
            Self::DhcpLeases(_) => "dhcp_leases",
            Self::Gateways(_) => "gateways",
            Self::RoutesV4(_) => "routes_v4",
            Self::RoutesV6(_) => "routes_v6",
            Self::Carp(_) => "carp",
            Self::Arp(_) => "arp",
            Self::Ndp(_) => "ndp",
            Self::States(_) => "states",
            Self::Haproxy(_) => "haproxy",
        }
    }
}

/// Extracts a table and splits it into header and data rows
pub(crate) fn headered_table(
    body: &str,
    locator: &TableLocator,
) -> Result<HeaderedTable, ParseFailure> {
    let rows = extract_table_from_str(body, locator)?;
    Ok(HeaderedTable::from_rows(rows))
}

/// Resolves a record field to a column, trying `aliases` in order
pub(crate) fn require_column(
    columns: &Columns,
    field: &str,
    aliases: &[&str],
) -> Result<usize, ParseFailure> {
    columns
        .find(aliases)
        .ok_or_else(|| ParseFailure::MissingColumn(field.to_string()))
}

/// Cell backing a record field; rows shorter than the header fail
pub(crate) fn required_cell<'a>(
    row: &'a [String],
    index: usize,
    field: &str,
) -> Result<&'a str, ParseFailure> {
    row.get(index).map(String::as_str).ok_or_else(|| {
        ParseFailure::MissingField(format!("{} (row has {} cells)", field, row.len()))
    })
}

/// Attaches the record field name to a coercion failure
pub(crate) fn coerce<T>(field: &str, result: Result<T, CoercionError>) -> Result<T, ParseFailure> {
    result.map_err(|e| ParseFailure::Coercion(e.in_field(field)))
}

/// Blank cells and the UI's placeholders for "no value"
pub(crate) fn is_placeholder(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "n/a" | "na" | "-" | "pending" | "unknown"
    )
}

/// Sorted serialized field names of a record element
#[cfg(test)]
pub(crate) fn field_names<T: Serialize>(value: &T) -> Vec<String> {
    let json = serde_json::to_value(value).expect("records serialize");
    let mut keys: Vec<String> = json
        .as_object()
        .expect("record elements serialize to objects")
        .keys()
        .cloned()
        .collect();
    keys.sort_unstable();
    keys
}
