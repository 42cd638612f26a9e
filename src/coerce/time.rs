use super::CoercionError;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Uptime as displayed by the dashboard, split into its literal components
///
/// The components are kept exactly as shown and are not normalized into a
/// single duration: `"0 days, 25:00:00"` yields 25 hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Uptime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

fn clock_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:(\d+)\s*days?\s*,?\s*)?(\d+):(\d{1,2})(?::(\d{1,2}))?$")
            .expect("uptime clock pattern is valid")
    })
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(\d+)\s*(days?|hours?|min(?:ute)?s?|sec(?:ond)?s?)\b")
            .expect("uptime word pattern is valid")
    })
}

/// Parses an uptime string into its components
///
/// Two layouts are accepted: `"3 days, 04:12:08"` and
/// `"3 Days 04 Hours 12 Minutes 08 Seconds"` (any component may be absent in
/// the word form, but at least one must be present).
pub fn parse_uptime(raw: &str) -> Result<Uptime, CoercionError> {
    let trimmed = raw.trim();
    let err = || CoercionError::new(raw, "an uptime");

    if let Some(caps) = clock_pattern().captures(trimmed) {
        let number = |idx: usize| -> Result<u64, CoercionError> {
            caps.get(idx)
                .map(|m| m.as_str().parse().map_err(|_| err()))
                .unwrap_or(Ok(0))
        };
        return Ok(Uptime {
            days: number(1)?,
            hours: number(2)?,
            minutes: number(3)?,
            seconds: number(4)?,
        });
    }

    let mut uptime = Uptime::default();
    let mut matched = 0;
    for caps in word_pattern().captures_iter(trimmed) {
        let value: u64 = caps[1].parse().map_err(|_| err())?;
        let unit = caps[2].to_ascii_lowercase();
        match unit.as_bytes()[0] {
            b'd' => uptime.days = value,
            b'h' => uptime.hours = value,
            b'm' => uptime.minutes = value,
            _ => uptime.seconds = value,
        }
        matched += 1;
    }

    // Whatever the components did not consume may only be separators
    let leftover = word_pattern().replace_all(trimmed, "");
    if matched == 0 || leftover.chars().any(|c| !(c.is_whitespace() || c == ',')) {
        return Err(err());
    }

    Ok(uptime)
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%a %b %d %H:%M:%S %Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Parses the timestamp formats the web UI prints
///
/// A timezone abbreviation in the `date(1)` layout
/// (`"Mon Oct 16 10:12:08 UTC 2023"`) is dropped; the value is returned as
/// the appliance's local wall-clock time.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, CoercionError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let normalized = if tokens.len() == 6 && tokens[4].chars().all(|c| c.is_ascii_alphabetic()) {
        format!(
            "{} {} {} {} {}",
            tokens[0], tokens[1], tokens[2], tokens[3], tokens[5]
        )
    } else {
        tokens.join(" ")
    };

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .ok_or_else(|| CoercionError::new(raw, "a timestamp"))
}
