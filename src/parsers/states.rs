use super::{ParseFailure, Record, STATUS_PANEL};
use crate::session::RawResponse;
use crate::table::{extract_table_from_str, TableLocator};
use serde::Serialize;

/// Unstructured text: one line per table row, cells joined by tabs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextRecord {
    pub lines: Vec<String>,
}

/// Dumps the state table of `diag_dump_states.php` as text
///
/// State entries mix protocols, NAT notation and direction arrows in free
/// form, so rows are passed through as tab-joined lines rather than typed.
/// Header and placeholder rows are left out.
pub fn parse_states(response: &RawResponse) -> Result<Record, ParseFailure> {
    let locator = TableLocator::heading("States").within(STATUS_PANEL);
    let rows = extract_table_from_str(&response.body, &locator)?;

    let lines = rows
        .into_iter()
        .filter(|row| !row.header && !row.is_message_row())
        .map(|row| {
            row.cells
                .iter()
                .map(|c| c.replace('\t', " "))
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect();

    Ok(Record::States(TextRecord { lines }))
}
