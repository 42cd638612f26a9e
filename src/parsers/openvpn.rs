use super::{
    coerce, headered_table, is_placeholder, require_column, required_cell, ParseFailure, Record,
    STATUS_PAGE,
};
use crate::coerce::parse_bytes;
use crate::session::RawResponse;
use crate::table::TableLocator;
use serde::Serialize;

const CLIENT_PANEL: &str = "Client Instance Statistics";

/// One OpenVPN client instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenVpnConnection {
    pub name: String,
    pub status: String,
    pub last_change: String,
    pub local_address: String,
    pub virtual_address: String,
    pub remote_host: String,

    /// Absent while the tunnel is down
    pub bytes_sent: Option<u64>,
    pub bytes_received: Option<u64>,

    /// Service state as displayed, e.g. `"running"`
    pub service: String,
}

/// Parses the client instance table of `status_openvpn.php`
///
/// Addresses keep their `host:port` form. A page without client instances
/// yields an empty list.
pub fn parse_openvpn(response: &RawResponse) -> Result<Record, ParseFailure> {
    let locator = TableLocator::heading(CLIENT_PANEL).within(STATUS_PAGE);
    let table = headered_table(&response.body, &locator)?;
    if table.rows.is_empty() {
        return Ok(Record::OpenvpnConnections(Vec::new()));
    }

    let columns = &table.columns;
    let name = require_column(columns, "name", &["name"])?;
    let status = require_column(columns, "status", &["status"])?;
    let last_change = require_column(columns, "last_change", &["last_change", "connected_since"])?;
    let local = require_column(columns, "local_address", &["local_address"])?;
    let virtual_address = require_column(columns, "virtual_address", &["virtual_address"])?;
    let remote = require_column(columns, "remote_host", &["remote_host"])?;
    let sent = require_column(columns, "bytes_sent", &["bytes_sent"])?;
    let received = require_column(columns, "bytes_received", &["bytes_received", "bytes_rcvd"])?;
    let service = require_column(columns, "service", &["service"])?;

    let mut connections = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        connections.push(OpenVpnConnection {
            name: required_cell(row, name, "name")?.to_string(),
            status: required_cell(row, status, "status")?.to_string(),
            last_change: required_cell(row, last_change, "last_change")?.to_string(),
            local_address: required_cell(row, local, "local_address")?.to_string(),
            virtual_address: required_cell(row, virtual_address, "virtual_address")?.to_string(),
            remote_host: required_cell(row, remote, "remote_host")?.to_string(),
            bytes_sent: optional_bytes("bytes_sent", required_cell(row, sent, "bytes_sent")?)?,
            bytes_received: optional_bytes(
                "bytes_received",
                required_cell(row, received, "bytes_received")?,
            )?,
            service: required_cell(row, service, "service")?.to_string(),
        });
    }

    Ok(Record::OpenvpnConnections(connections))
}

fn optional_bytes(field: &str, raw: &str) -> Result<Option<u64>, ParseFailure> {
    if is_placeholder(raw) {
        return Ok(None);
    }
    coerce(field, parse_bytes(raw)).map(Some)
}
