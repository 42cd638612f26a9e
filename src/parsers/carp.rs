use super::{headered_table, require_column, required_cell, ParseFailure, Record, STATUS_PAGE};
use crate::coerce::{parse_ip, Validated};
use crate::session::RawResponse;
use crate::table::TableLocator;
use serde::Serialize;
use std::net::IpAddr;

/// One CARP virtual IP and its role on this node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarpInterface {
    /// `"LAN@1"`: interface and VHID as displayed
    pub interface_vhid: String,
    pub virtual_ip: Validated<IpAddr>,

    /// `MASTER`, `BACKUP`, `INIT` or `DISABLED`
    pub status: String,
}

/// Parses the CARP interface table of `status_carp.php`
///
/// Without CARP configured the page shows a notice instead of the table
/// and the result is empty. The pfsync node table on the same page is ignored.
pub fn parse_carp(response: &RawResponse) -> Result<Record, ParseFailure> {
    let locator = TableLocator::heading("CARP Interfaces").within(STATUS_PAGE);
    let table = headered_table(&response.body, &locator)?;
    if table.rows.is_empty() {
        return Ok(Record::Carp(Vec::new()));
    }

    let columns = &table.columns;
    let interface = require_column(columns, "interface_vhid", &["interface_and_vhid", "interface"])?;
    let address = require_column(columns, "virtual_ip", &["virtual_ip_address", "virtual_ip"])?;
    let status = require_column(columns, "status", &["status"])?;

    let mut interfaces = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        // Addresses may carry their prefix length
        let raw_address = required_cell(row, address, "virtual_ip")?;
        let host = raw_address.split('/').next().unwrap_or(raw_address);
        interfaces.push(CarpInterface {
            interface_vhid: required_cell(row, interface, "interface_vhid")?.to_string(),
            virtual_ip: parse_ip(host),
            status: required_cell(row, status, "status")?.to_string(),
        });
    }

    Ok(Record::Carp(interfaces))
}
