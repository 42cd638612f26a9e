use super::{coerce, is_placeholder, ParseFailure, Record};
use crate::coerce::{
    parse_counter_pair, parse_float, parse_load_average, parse_percent, parse_temperature,
    parse_timestamp, parse_uptime, CoercionError, CpuTicks,
};
use crate::session::RawResponse;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const FIELD_COUNT: usize = 12;

/// Dashboard system information from `getstats.php`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralStats {
    pub cpu_tick_total: u64,
    pub cpu_tick_used: u64,
    pub memory_used_percent: f64,
    pub uptime_days: u64,
    pub uptime_hours: u64,
    pub uptime_minutes: u64,
    pub uptime_seconds: u64,
    pub state_used: u64,
    pub state_max: u64,

    /// Absent on hardware without a readable sensor
    pub temp_c: Option<f64>,

    pub datetime: NaiveDateTime,

    /// MHz; absent when the CPU does not report frequency scaling
    pub cpu_freq_current: Option<f64>,
    pub cpu_freq_max: Option<f64>,

    pub sys_load_1: f64,
    pub sys_load_5: f64,
    pub sys_load_15: f64,
    pub mbuf_current: u64,
    pub mbuf_max: u64,
    pub mbuf_percent: f64,
    pub state_percent: f64,
}

fn frequency_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:current\s*:\s*)?([0-9.]+)\s*mhz(?:\s*,\s*max\s*:\s*([0-9.]+)\s*mhz)?$",
        )
        .expect("cpu frequency pattern is valid")
    })
}

/// Parses the `|`-separated dashboard statistics line
///
/// Field order: cpu ticks total, cpu ticks used, memory %, uptime,
/// states used/max, temperature, date, cpu frequency, load averages,
/// mbufs used/max, mbuf %, state table %. Fields past the twelfth are
/// ignored.
pub fn parse_general(response: &RawResponse) -> Result<Record, ParseFailure> {
    let fields: Vec<&str> = response.body.trim().split('|').collect();
    if fields.len() < FIELD_COUNT {
        return Err(ParseFailure::Malformed(format!(
            "expected at least {} '|'-separated fields, found {}",
            FIELD_COUNT,
            fields.len()
        )));
    }

    let cpu = CpuTicks::parse(fields[0], fields[1])?;
    let uptime = coerce("uptime", parse_uptime(fields[3]))?;
    let (state_used, state_max) = coerce("state_used", parse_counter_pair(fields[4]))?;
    let temp_c = if is_placeholder(fields[5]) {
        None
    } else {
        Some(coerce("temp_c", parse_temperature(fields[5]))?)
    };
    let (cpu_freq_current, cpu_freq_max) = parse_frequency(fields[7])?;
    let [sys_load_1, sys_load_5, sys_load_15] = coerce("sys_load", parse_load_average(fields[8]))?;
    let (mbuf_current, mbuf_max) = coerce("mbuf_current", parse_counter_pair(fields[9]))?;

    Ok(Record::General(GeneralStats {
        cpu_tick_total: cpu.total,
        cpu_tick_used: cpu.used,
        memory_used_percent: coerce("memory_used_percent", parse_percent(fields[2]))?,
        uptime_days: uptime.days,
        uptime_hours: uptime.hours,
        uptime_minutes: uptime.minutes,
        uptime_seconds: uptime.seconds,
        state_used,
        state_max,
        temp_c,
        datetime: coerce("datetime", parse_timestamp(fields[6]))?,
        cpu_freq_current,
        cpu_freq_max,
        sys_load_1,
        sys_load_5,
        sys_load_15,
        mbuf_current,
        mbuf_max,
        mbuf_percent: coerce("mbuf_percent", parse_percent(fields[10]))?,
        state_percent: coerce("state_percent", parse_percent(fields[11]))?,
    }))
}

fn parse_frequency(raw: &str) -> Result<(Option<f64>, Option<f64>), ParseFailure> {
    if is_placeholder(raw) {
        return Ok((None, None));
    }

    let caps = frequency_pattern()
        .captures(raw.trim())
        .ok_or_else(|| CoercionError::new(raw, "a CPU frequency").in_field("cpu_freq_current"))?;
    let current = coerce("cpu_freq_current", parse_float(&caps[1]))?;
    let max = caps
        .get(2)
        .map(|m| coerce("cpu_freq_max", parse_float(m.as_str())))
        .transpose()?;
    Ok((Some(current), max))
}
