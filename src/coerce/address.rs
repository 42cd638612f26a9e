use serde::{Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// A value that either passed structural validation or is kept raw
///
/// Monitoring consumers would rather see a malformed address than lose the
/// row, so address-shaped fields never fail a parse; they degrade to
/// `Malformed` with the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Validated<T> {
    Valid(T),
    Malformed(String),
}

impl<T> Validated<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Returns the validated value, if any
    pub fn valid(&self) -> Option<&T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Malformed(_) => None,
        }
    }
}

/// A 48-bit hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl FromStr for MacAddr {
    type Err = ();

    /// Accepts `aa:bb:cc:dd:ee:ff` and `aa-bb-cc-dd-ee-ff`, any case.
    /// BSD's `arp` drops leading zeros (`0:1b:2:..`), so one-digit octets
    /// are accepted too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = if s.contains('-') { '-' } else { ':' };
        let mut octets = [0u8; 6];
        let mut count = 0;

        for part in s.split(separator) {
            if count == 6 || part.is_empty() || part.len() > 2 {
                return Err(());
            }
            octets[count] = u8::from_str_radix(part, 16).map_err(|_| ())?;
            count += 1;
        }

        if count != 6 {
            return Err(());
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Validates an IP address, tolerating an IPv6 zone suffix (`fe80::1%em0`)
pub fn parse_ip(raw: &str) -> Validated<IpAddr> {
    let trimmed = raw.trim();
    let address = trimmed.split('%').next().unwrap_or(trimmed);
    match address.parse::<IpAddr>() {
        Ok(ip) => Validated::Valid(ip),
        Err(_) => {
            tracing::debug!("Keeping malformed IP address {:?} as raw text", raw);
            Validated::Malformed(trimmed.to_string())
        }
    }
}

/// Validates a MAC address
pub fn parse_mac(raw: &str) -> Validated<MacAddr> {
    let trimmed = raw.trim();
    match trimmed.parse::<MacAddr>() {
        Ok(mac) => Validated::Valid(mac),
        Err(()) => {
            tracing::debug!("Keeping malformed MAC address {:?} as raw text", raw);
            Validated::Malformed(trimmed.to_string())
        }
    }
}
