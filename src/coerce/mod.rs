//! Field coercion utilities
//!
//! Pure conversions from the raw strings found on status pages into typed
//! values. Every function either returns a value or a [`CoercionError`]
//! naming the offending input; nothing here guesses or silently defaults.
//!
//! Percentages stay on the 0–100 scale the web UI displays.

mod address;
mod size;
mod time;

pub use address::{parse_ip, parse_mac, MacAddr, Validated};
pub use size::parse_bytes;
pub use time::{parse_timestamp, parse_uptime, Uptime};

use thiserror::Error;

/// A raw string that could not be converted to the expected type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot read {raw_value:?} as {expected}{}", field_suffix(.field))]
pub struct CoercionError {
    /// Record field the value was destined for, when known
    pub field: Option<String>,

    /// The offending input, untrimmed
    pub raw_value: String,

    /// Human readable description of the expected shape
    pub expected: &'static str,
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|f| format!(" (field {})", f))
        .unwrap_or_default()
}

impl CoercionError {
    pub fn new(raw_value: &str, expected: &'static str) -> Self {
        Self {
            field: None,
            raw_value: raw_value.to_string(),
            expected,
        }
    }

    /// Attaches the destination field name
    pub fn in_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

/// Parses an unsigned integer, tolerating surrounding whitespace and
/// thousands separators (`"1,024"`)
pub fn parse_int(raw: &str) -> Result<u64, CoercionError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoercionError::new(raw, "an unsigned integer"));
    }
    cleaned
        .parse()
        .map_err(|_| CoercionError::new(raw, "an unsigned integer"))
}

/// Parses a finite floating point number
pub fn parse_float(raw: &str) -> Result<f64, CoercionError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CoercionError::new(raw, "a number"))
}

/// Parses a percentage such as `"87%"` or `"87 %"` into a value in 0–100
pub fn parse_percent(raw: &str) -> Result<f64, CoercionError> {
    let number = raw.trim().trim_end_matches('%').trim_end();
    let value = parse_float(number).map_err(|_| CoercionError::new(raw, "a percentage"))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(CoercionError::new(raw, "a percentage between 0 and 100"));
    }
    Ok(value)
}

/// Parses a temperature in degrees Celsius (`"45.0"`, `"45.0C"`, `"45.0 °C"`)
pub fn parse_temperature(raw: &str) -> Result<f64, CoercionError> {
    let number = raw
        .trim()
        .trim_end_matches(['C', 'c'])
        .trim_end()
        .trim_end_matches('°')
        .trim_end();
    parse_float(number).map_err(|_| CoercionError::new(raw, "a temperature"))
}

/// Parses a load-average triple (`"0.15, 0.20, 0.18"`)
pub fn parse_load_average(raw: &str) -> Result<[f64; 3], CoercionError> {
    let parts: Vec<&str> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() != 3 {
        return Err(CoercionError::new(raw, "a load-average triple"));
    }

    let mut loads = [0.0; 3];
    for (slot, part) in loads.iter_mut().zip(parts) {
        *slot = parse_float(part).map_err(|_| CoercionError::new(raw, "a load-average triple"))?;
    }
    Ok(loads)
}

/// Parses a `current/max` counter pair such as `"120/400000"`
pub fn parse_counter_pair(raw: &str) -> Result<(u64, u64), CoercionError> {
    let (current, max) = raw
        .split_once('/')
        .ok_or_else(|| CoercionError::new(raw, "a current/max pair"))?;
    let current = parse_int(current).map_err(|_| CoercionError::new(raw, "a current/max pair"))?;
    let max = parse_int(max).map_err(|_| CoercionError::new(raw, "a current/max pair"))?;
    Ok((current, max))
}

/// CPU tick counters as reported by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTicks {
    pub total: u64,
    pub used: u64,
}

impl CpuTicks {
    /// Parses the two tick counters, which arrive as separate fields
    pub fn parse(total: &str, used: &str) -> Result<Self, CoercionError> {
        Ok(Self {
            total: parse_int(total).map_err(|e| e.in_field("cpu_tick_total"))?,
            used: parse_int(used).map_err(|e| e.in_field("cpu_tick_used"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42").unwrap(), 42);
        assert_eq!(parse_int(" 1,024 ").unwrap(), 1024);
        assert!(parse_int("").is_err());
        assert!(parse_int("-3").is_err());
        assert!(parse_int("12a").is_err());
    }

    #[test]
    fn test_parse_float_rejects_non_finite() {
        assert_eq!(parse_float("0.5").unwrap(), 0.5);
        assert!(parse_float("NaN").is_err());
        assert!(parse_float("inf").is_err());
        assert!(parse_float("abc").is_err());
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("87%").unwrap(), 87.0);
        assert_eq!(parse_percent("12.5 %").unwrap(), 12.5);
        assert_eq!(parse_percent("0").unwrap(), 0.0);
        assert!(parse_percent("101%").is_err());
        assert!(parse_percent("-1%").is_err());
        assert!(parse_percent("lots").is_err());
    }

    #[test]
    fn test_parse_temperature() {
        assert_eq!(parse_temperature("45.0").unwrap(), 45.0);
        assert_eq!(parse_temperature("45.0C").unwrap(), 45.0);
        assert_eq!(parse_temperature("45.0 °C").unwrap(), 45.0);
        assert_eq!(parse_temperature("-5c").unwrap(), -5.0);
        assert!(parse_temperature("hot").is_err());
    }

    #[test]
    fn test_parse_load_average() {
        assert_eq!(
            parse_load_average("0.15, 0.20, 0.18").unwrap(),
            [0.15, 0.20, 0.18]
        );
        assert_eq!(parse_load_average("1.0 2.0 3.0").unwrap(), [1.0, 2.0, 3.0]);
        assert!(parse_load_average("0.15, 0.20").is_err());
        assert!(parse_load_average("a, b, c").is_err());
    }

    #[test]
    fn test_parse_counter_pair() {
        assert_eq!(parse_counter_pair("120/400000").unwrap(), (120, 400000));
        assert_eq!(parse_counter_pair(" 3 / 9 ").unwrap(), (3, 9));
        assert!(parse_counter_pair("120").is_err());
    }

    #[test]
    fn test_cpu_ticks_reports_field() {
        let err = CpuTicks::parse("100", "x").unwrap_err();
        assert_eq!(err.field.as_deref(), Some("cpu_tick_used"));
        assert_eq!(err.raw_value, "x");
    }

    #[test]
    fn test_error_message_names_field() {
        let err = CoercionError::new("12 XB", "a byte size").in_field("size");
        assert_eq!(
            err.to_string(),
            "cannot read \"12 XB\" as a byte size (field size)"
        );
    }
}
