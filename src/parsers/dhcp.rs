use super::{
    coerce, headered_table, is_placeholder, require_column, required_cell, ParseFailure, Record,
    STATUS_PAGE,
};
use crate::coerce::{
    parse_int, parse_ip, parse_mac, parse_percent, parse_timestamp, MacAddr, Validated,
};
use crate::session::RawResponse;
use crate::table::{HeaderedTable, TableLocator};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::net::IpAddr;

/// The three tables of `status_dhcp_leases.php`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DhcpStatus {
    /// Only present when DHCP failover is configured
    pub pool_status: Vec<PoolStatus>,
    pub leases: Vec<DhcpLease>,
    pub utilization: Vec<PoolUtilization>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub failover_group: String,
    pub my_state: String,
    pub since: String,
    pub peer_state: String,
    pub peer_since: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DhcpLease {
    pub ip_address: Validated<IpAddr>,
    pub mac_address: Validated<MacAddr>,
    pub hostname: String,
    pub description: String,

    /// Static mappings have no lease window
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,

    pub online: String,
    pub lease_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolUtilization {
    pub interface: String,
    pub pool_start: Validated<IpAddr>,
    pub pool_end: Validated<IpAddr>,
    pub used: u64,
    pub capacity: u64,
    pub utilization_percent: f64,
}

/// Parses pool status, leases and pool utilization
///
/// Each table is optional on a recognized page; an absent table or one
/// holding only a placeholder row yields an empty list.
pub fn parse_dhcp_leases(response: &RawResponse) -> Result<Record, ParseFailure> {
    let body = &response.body;
    let section =
        |heading: &str| headered_table(body, &TableLocator::heading(heading).within(STATUS_PAGE));

    let pool_status = pool_status(&section("Pool Status")?)?;
    let leases = leases(&section("Leases")?)?;
    let utilization = utilization(&section("Leases in Use")?)?;

    tracing::debug!(
        "Parsed {} DHCP leases across {} pools",
        leases.len(),
        utilization.len()
    );
    Ok(Record::DhcpLeases(DhcpStatus {
        pool_status,
        leases,
        utilization,
    }))
}

fn pool_status(table: &HeaderedTable) -> Result<Vec<PoolStatus>, ParseFailure> {
    if table.rows.is_empty() {
        return Ok(Vec::new());
    }

    let columns = &table.columns;
    let group = require_column(columns, "failover_group", &["failover_group", "pool_name"])?;
    let my_state = require_column(columns, "my_state", &["my_state"])?;
    let since = require_column(columns, "since", &["since"])?;
    let peer_state = require_column(columns, "peer_state", &["peer_state"])?;
    let peer_since = require_column(columns, "peer_since", &["since_1", "peer_since"])?;

    let mut pools = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        pools.push(PoolStatus {
            failover_group: required_cell(row, group, "failover_group")?.to_string(),
            my_state: required_cell(row, my_state, "my_state")?.to_string(),
            since: required_cell(row, since, "since")?.to_string(),
            peer_state: required_cell(row, peer_state, "peer_state")?.to_string(),
            peer_since: required_cell(row, peer_since, "peer_since")?.to_string(),
        });
    }
    Ok(pools)
}

fn leases(table: &HeaderedTable) -> Result<Vec<DhcpLease>, ParseFailure> {
    if table.rows.is_empty() {
        return Ok(Vec::new());
    }

    let columns = &table.columns;
    let ip = require_column(columns, "ip_address", &["ip_address", "ip"])?;
    let mac = require_column(columns, "mac_address", &["mac_address", "mac"])?;
    let hostname = require_column(columns, "hostname", &["hostname"])?;
    let description = require_column(columns, "description", &["description"])?;
    let start = require_column(columns, "start", &["start"])?;
    let end = require_column(columns, "end", &["end"])?;
    let online = require_column(columns, "online", &["online", "status"])?;
    let lease_type = require_column(columns, "lease_type", &["lease_type", "lease"])?;

    let mut leases = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        leases.push(DhcpLease {
            ip_address: parse_ip(required_cell(row, ip, "ip_address")?),
            mac_address: parse_mac(first_word(required_cell(row, mac, "mac_address")?)),
            hostname: required_cell(row, hostname, "hostname")?.to_string(),
            description: required_cell(row, description, "description")?.to_string(),
            start: optional_timestamp("start", required_cell(row, start, "start")?)?,
            end: optional_timestamp("end", required_cell(row, end, "end")?)?,
            online: required_cell(row, online, "online")?.to_string(),
            lease_type: required_cell(row, lease_type, "lease_type")?.to_string(),
        });
    }
    Ok(leases)
}

fn utilization(table: &HeaderedTable) -> Result<Vec<PoolUtilization>, ParseFailure> {
    if table.rows.is_empty() {
        return Ok(Vec::new());
    }

    let columns = &table.columns;
    let interface = require_column(columns, "interface", &["interface"])?;
    let pool_start = require_column(columns, "pool_start", &["pool_start"])?;
    let pool_end = require_column(columns, "pool_end", &["pool_end"])?;
    let used = require_column(columns, "used", &["used"])?;
    let capacity = require_column(columns, "capacity", &["capacity"])?;
    let percent = require_column(columns, "utilization_percent", &["utilization"])?;

    let mut pools = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let percent = required_cell(row, percent, "utilization_percent")?;
        pools.push(PoolUtilization {
            interface: required_cell(row, interface, "interface")?.to_string(),
            pool_start: parse_ip(required_cell(row, pool_start, "pool_start")?),
            pool_end: parse_ip(required_cell(row, pool_end, "pool_end")?),
            used: coerce("used", parse_int(required_cell(row, used, "used")?))?,
            capacity: coerce("capacity", parse_int(required_cell(row, capacity, "capacity")?))?,
            utilization_percent: coerce("utilization_percent", parse_percent(percent))?,
        });
    }
    Ok(pools)
}

fn optional_timestamp(field: &str, raw: &str) -> Result<Option<NaiveDateTime>, ParseFailure> {
    if is_placeholder(raw) {
        return Ok(None);
    }
    coerce(field, parse_timestamp(raw)).map(Some)
}

/// MAC cells append the vendor name: `"00:0c:29:aa:bb:cc (VMware)"`
fn first_word(raw: &str) -> &str {
    raw.split_whitespace().next().unwrap_or("")
}
