use super::{
    coerce, headered_table, require_column, required_cell, ParseFailure, Record, WIDGET_TABLE,
};
use crate::coerce::{parse_bytes, parse_percent, CoercionError};
use crate::session::RawResponse;
use crate::table::TableLocator;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// One mounted filesystem from the disks widget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Disk {
    pub mount: String,
    pub size: u64,
    pub used: u64,
    pub fs_type: String,
    pub usage_percent: f64,
}

/// `"12% of 18GiB (zfs)"`
fn usage_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([0-9.]+)\s*%[^(]*\(([^)]*)\)").expect("disk usage pattern is valid")
    })
}

/// Parses the disks dashboard widget
///
/// A widget without any table is not the disks widget; a table holding only
/// its header lists no disks.
pub fn parse_disks(response: &RawResponse) -> Result<Record, ParseFailure> {
    let table = headered_table(&response.body, &TableLocator::index(0).within(WIDGET_TABLE))?;
    if table.rows.is_empty() {
        return Ok(Record::Disks(Vec::new()));
    }

    let mount = require_column(&table.columns, "mount", &["path", "mount", "mount_point"])?;
    let size = require_column(&table.columns, "size", &["size", "total"])?;
    let used = require_column(&table.columns, "used", &["used"])?;
    let usage = require_column(&table.columns, "usage_percent", &["usage", "usage_percent"])?;

    let mut disks = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let usage_text = required_cell(row, usage, "usage_percent")?;
        let caps = usage_pattern().captures(usage_text).ok_or_else(|| {
            CoercionError::new(usage_text, "a disk usage summary").in_field("usage_percent")
        })?;

        disks.push(Disk {
            mount: required_cell(row, mount, "mount")?.to_string(),
            size: coerce("size", parse_bytes(required_cell(row, size, "size")?))?,
            used: coerce("used", parse_bytes(required_cell(row, used, "used")?))?,
            fs_type: caps[2].trim().to_string(),
            usage_percent: coerce("usage_percent", parse_percent(&caps[1]))?,
        });
    }

    Ok(Record::Disks(disks))
}
