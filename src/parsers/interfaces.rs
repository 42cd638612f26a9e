use super::{coerce, ParseFailure, Record, WIDGET_TABLE};
use crate::coerce::{parse_bytes, parse_int};
use crate::session::RawResponse;
use crate::table::{extract_table_from_str, normalize_header, TableLocator};
use serde::Serialize;
use std::collections::HashMap;

/// Traffic counters for one interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceCounters {
    pub name: String,
    pub packets_in: u64,
    pub packets_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub errors_in: u64,
    pub errors_out: u64,
    pub collisions: u64,
}

const STATISTICS: &[(&str, &[&str])] = &[
    ("packets_in", &["packets_in", "pkts_in"]),
    ("packets_out", &["packets_out", "pkts_out"]),
    ("bytes_in", &["bytes_in"]),
    ("bytes_out", &["bytes_out"]),
    ("errors_in", &["errors_in", "errs_in"]),
    ("errors_out", &["errors_out", "errs_out"]),
    ("collisions", &["collisions"]),
];

fn statistic_name(label: &str) -> Option<&'static str> {
    let normalized = normalize_header(label);
    STATISTICS
        .iter()
        .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
        .map(|(name, _)| *name)
}

/// Parses the interface statistics widget
///
/// The widget renders a matrix whose orientation is a user setting:
/// interfaces as columns and statistics as rows, or the transpose. The
/// orientation is detected from which axis carries statistic names. A
/// response with no table at all is not the widget.
pub fn parse_interface_stats(response: &RawResponse) -> Result<Record, ParseFailure> {
    let locator = TableLocator::index(0).within(WIDGET_TABLE);
    let rows = extract_table_from_str(&response.body, &locator)?;
    let mut rows = rows.into_iter().filter(|r| !r.is_message_row());

    let Some(header) = rows.next() else {
        return Ok(Record::InterfaceStats(Vec::new()));
    };
    let body: Vec<Vec<String>> = rows.filter(|r| !r.header).map(|r| r.cells).collect();

    let statistics_in_header = header.cells.iter().skip(1).any(|c| statistic_name(c).is_some());

    // interface name -> statistic -> raw value
    let mut order: Vec<String> = Vec::new();
    let mut values: HashMap<String, HashMap<&'static str, String>> = HashMap::new();
    let mut record = |interface: &str, label: &str, value: &str| {
        let Some(statistic) = statistic_name(label) else {
            return;
        };
        if !values.contains_key(interface) {
            order.push(interface.to_string());
        }
        values
            .entry(interface.to_string())
            .or_default()
            .insert(statistic, value.to_string());
    };

    for row in &body {
        let Some((first, rest)) = row.split_first() else {
            continue;
        };
        for (label, value) in header.cells.iter().skip(1).zip(rest) {
            if statistics_in_header {
                record(first, label, value);
            } else {
                record(label, first, value);
            }
        }
    }

    let mut interfaces = Vec::with_capacity(order.len());
    for name in order {
        let stats = values.remove(&name).unwrap_or_default();
        let get = |statistic| statistic_value(&stats, &name, statistic);

        let counters = InterfaceCounters {
            packets_in: coerce("packets_in", parse_int(get("packets_in")?))?,
            packets_out: coerce("packets_out", parse_int(get("packets_out")?))?,
            bytes_in: coerce("bytes_in", parse_bytes(get("bytes_in")?))?,
            bytes_out: coerce("bytes_out", parse_bytes(get("bytes_out")?))?,
            errors_in: coerce("errors_in", parse_int(get("errors_in")?))?,
            errors_out: coerce("errors_out", parse_int(get("errors_out")?))?,
            collisions: coerce("collisions", parse_int(get("collisions")?))?,
            name: name.clone(),
        };
        interfaces.push(counters);
    }

    Ok(Record::InterfaceStats(interfaces))
}

fn statistic_value<'a>(
    stats: &'a HashMap<&'static str, String>,
    interface: &str,
    statistic: &str,
) -> Result<&'a str, ParseFailure> {
    stats
        .get(statistic)
        .map(String::as_str)
        .ok_or_else(|| ParseFailure::MissingField(format!("{}.{}", interface, statistic)))
}
