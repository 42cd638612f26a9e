use super::{coerce, ParseFailure, Record};
use crate::coerce::parse_temperature;
use crate::session::RawResponse;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// One temperature sensor reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThermalSensor {
    pub sensor: String,
    pub temp_c: f64,
}

fn reading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9._-]+)\s*:\s*(.+)$").expect("sensor reading pattern is valid")
    })
}

/// Parses the thermal widget's `sensor:temperature` list
///
/// Readings are separated by `|`, `,` or newlines. Every reading must be
/// well formed; an empty body means the hardware has no sensors.
pub fn parse_thermal(response: &RawResponse) -> Result<Record, ParseFailure> {
    let mut sensors = Vec::new();

    for reading in response
        .body
        .split(['|', ',', '\n'])
        .map(str::trim)
        .filter(|r| !r.is_empty())
    {
        let caps = reading_pattern().captures(reading).ok_or_else(|| {
            ParseFailure::Malformed(format!("sensor reading {:?}", reading))
        })?;
        sensors.push(ThermalSensor {
            sensor: caps[1].to_string(),
            temp_c: coerce("temp_c", parse_temperature(&caps[2]))?,
        });
    }

    Ok(Record::Thermal(sensors))
}
