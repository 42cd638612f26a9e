use super::CoercionError;

/// Parses a human readable byte size into a byte count
///
/// The web UI always renders sizes with binary multipliers, so `K`, `KB`
/// and `KiB` all mean 1024. A bare number is taken as bytes. Sizes of 2^64
/// bytes or more are rejected.
///
/// # Examples
///
/// ```
/// use pfsense_watch::coerce::parse_bytes;
///
/// assert_eq!(parse_bytes("1.00 GiB").unwrap(), 1_073_741_824);
/// assert_eq!(parse_bytes("512 MiB").unwrap(), 536_870_912);
/// assert!(parse_bytes("3 parsecs").is_err());
/// ```
pub fn parse_bytes(raw: &str) -> Result<u64, CoercionError> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let number: String = number.chars().filter(|c| *c != ',').collect();
    let value: f64 = number
        .parse()
        .map_err(|_| CoercionError::new(raw, "a byte size"))?;

    let multiplier = unit_multiplier(unit.trim())
        .ok_or_else(|| CoercionError::new(raw, "a byte size with a known unit"))?;

    // u64::MAX rounds up to 2^64 as f64, the first value out of range
    let bytes = (value * multiplier as f64).round();
    if !bytes.is_finite() || bytes >= u64::MAX as f64 {
        return Err(CoercionError::new(raw, "a byte size that fits in 64 bits"));
    }
    Ok(bytes as u64)
}

fn unit_multiplier(unit: &str) -> Option<u64> {
    let multiplier = match unit.to_ascii_lowercase().as_str() {
        "" | "b" | "byte" | "bytes" => 1,
        "k" | "kb" | "kib" => 1 << 10,
        "m" | "mb" | "mib" => 1 << 20,
        "g" | "gb" | "gib" => 1 << 30,
        "t" | "tb" | "tib" => 1 << 40,
        "p" | "pb" | "pib" => 1 << 50,
        _ => return None,
    };
    Some(multiplier)
}
