use super::{headered_table, require_column, required_cell, ParseFailure, Record, STATUS_PANEL};
use crate::coerce::{parse_ip, parse_mac, MacAddr, Validated};
use crate::session::RawResponse;
use crate::table::TableLocator;
use serde::Serialize;
use std::net::IpAddr;

/// One entry of the IPv4 ARP table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArpEntry {
    pub interface: String,
    pub ip_address: Validated<IpAddr>,
    pub mac_address: Validated<MacAddr>,
    pub hostname: String,

    /// Expiry as displayed, e.g. `"Expires in 1187 seconds"` or `"Permanent"`
    pub status: String,
    pub link_type: String,
}

/// One entry of the IPv6 neighbor table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NdpEntry {
    pub ip_address: Validated<IpAddr>,
    pub mac_address: Validated<MacAddr>,
    pub hostname: String,
    pub interface: String,
    pub expiration: String,
}

/// Parses `diag_arp.php`
pub fn parse_arp(response: &RawResponse) -> Result<Record, ParseFailure> {
    let table = headered_table(&response.body, &TableLocator::index(0).within(STATUS_PANEL))?;
    if table.rows.is_empty() {
        return Ok(Record::Arp(Vec::new()));
    }

    let columns = &table.columns;
    let interface = require_column(columns, "interface", &["interface"])?;
    let ip = require_column(columns, "ip_address", &["ip_address"])?;
    let mac = require_column(columns, "mac_address", &["mac_address"])?;
    let hostname = require_column(columns, "hostname", &["hostname"])?;
    let status = require_column(columns, "status", &["status", "status_expires", "expires"])?;
    let link_type = require_column(columns, "link_type", &["link_type", "type"])?;

    let mut entries = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        entries.push(ArpEntry {
            interface: required_cell(row, interface, "interface")?.to_string(),
            ip_address: parse_ip(required_cell(row, ip, "ip_address")?),
            mac_address: parse_mac(hardware_address(required_cell(row, mac, "mac_address")?)),
            hostname: required_cell(row, hostname, "hostname")?.to_string(),
            status: required_cell(row, status, "status")?.to_string(),
            link_type: required_cell(row, link_type, "link_type")?.to_string(),
        });
    }

    Ok(Record::Arp(entries))
}

/// Parses `diag_ndp.php`
pub fn parse_ndp(response: &RawResponse) -> Result<Record, ParseFailure> {
    let table = headered_table(&response.body, &TableLocator::index(0).within(STATUS_PANEL))?;
    if table.rows.is_empty() {
        return Ok(Record::Ndp(Vec::new()));
    }

    let columns = &table.columns;
    let ip = require_column(columns, "ip_address", &["ipv6_address", "ip_address"])?;
    let mac = require_column(columns, "mac_address", &["mac_address"])?;
    let hostname = require_column(columns, "hostname", &["hostname"])?;
    let interface = require_column(columns, "interface", &["interface"])?;
    let expiration = require_column(columns, "expiration", &["expiration", "expire"])?;

    let mut entries = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        entries.push(NdpEntry {
            ip_address: parse_ip(required_cell(row, ip, "ip_address")?),
            mac_address: parse_mac(hardware_address(required_cell(row, mac, "mac_address")?)),
            hostname: required_cell(row, hostname, "hostname")?.to_string(),
            interface: required_cell(row, interface, "interface")?.to_string(),
            expiration: required_cell(row, expiration, "expiration")?.to_string(),
        });
    }

    Ok(Record::Ndp(entries))
}

/// Drops the vendor name the UI appends after the address
fn hardware_address(raw: &str) -> &str {
    raw.split_whitespace().next().unwrap_or("")
}
