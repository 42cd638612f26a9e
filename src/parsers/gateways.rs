use super::{
    coerce, headered_table, is_placeholder, require_column, required_cell, ParseFailure, Record,
    STATUS_PANEL,
};
use crate::coerce::{parse_float, parse_ip, parse_percent, Validated};
use crate::session::RawResponse;
use crate::table::TableLocator;
use serde::Serialize;
use std::net::IpAddr;

/// Monitoring verdict for a gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Online,
    Offline,
    Pending,

    /// Reachable but over a latency or loss threshold
    Warning,

    /// Text this crate does not know, kept verbatim
    Other(String),
}

impl GatewayStatus {
    pub fn from_text(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        if lower.contains("offline") || lower.contains("down") {
            Self::Offline
        } else if lower.contains("pending") {
            Self::Pending
        } else if lower.contains("latency") || lower.contains("loss") || lower.contains("warning") {
            Self::Warning
        } else if lower.contains("online") {
            Self::Online
        } else {
            Self::Other(raw.trim().to_string())
        }
    }
}

/// One row of `status_gateways.php`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gateway {
    pub name: String,

    /// `dynamic` gateways show no address until they come up
    pub gateway: Validated<IpAddr>,
    pub monitor: Validated<IpAddr>,

    /// Milliseconds; absent while monitoring is pending
    pub rtt_ms: Option<f64>,
    pub rttsd_ms: Option<f64>,
    pub loss_percent: Option<f64>,

    pub status: GatewayStatus,
    pub description: String,
}

pub fn parse_gateways(response: &RawResponse) -> Result<Record, ParseFailure> {
    let table = headered_table(&response.body, &TableLocator::index(0).within(STATUS_PANEL))?;
    if table.rows.is_empty() {
        return Ok(Record::Gateways(Vec::new()));
    }

    let columns = &table.columns;
    let name = require_column(columns, "name", &["name"])?;
    let gateway = require_column(columns, "gateway", &["gateway"])?;
    let monitor = require_column(columns, "monitor", &["monitor"])?;
    let rtt = require_column(columns, "rtt_ms", &["rtt"])?;
    let rttsd = require_column(columns, "rttsd_ms", &["rttsd"])?;
    let loss = require_column(columns, "loss_percent", &["loss"])?;
    let status = require_column(columns, "status", &["status"])?;
    let description = require_column(columns, "description", &["description"])?;

    let mut gateways = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let loss_text = required_cell(row, loss, "loss_percent")?;
        gateways.push(Gateway {
            name: required_cell(row, name, "name")?.to_string(),
            gateway: parse_ip(required_cell(row, gateway, "gateway")?),
            monitor: parse_ip(required_cell(row, monitor, "monitor")?),
            rtt_ms: optional_millis("rtt_ms", required_cell(row, rtt, "rtt_ms")?)?,
            rttsd_ms: optional_millis("rttsd_ms", required_cell(row, rttsd, "rttsd_ms")?)?,
            loss_percent: if is_placeholder(loss_text) {
                None
            } else {
                Some(coerce("loss_percent", parse_percent(loss_text))?)
            },
            status: GatewayStatus::from_text(required_cell(row, status, "status")?),
            description: required_cell(row, description, "description")?.to_string(),
        });
    }

    Ok(Record::Gateways(gateways))
}

/// `"0.512ms"` → 0.512
fn optional_millis(field: &str, raw: &str) -> Result<Option<f64>, ParseFailure> {
    if is_placeholder(raw) {
        return Ok(None);
    }
    let number = raw.trim().trim_end_matches("ms").trim_end();
    coerce(field, parse_float(number)).map(Some)
}
