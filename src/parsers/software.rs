use super::{ParseFailure, Record};
use crate::session::RawResponse;
use serde::{Deserialize, Serialize};

/// Installed and available firmware versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareVersion {
    pub installed_version: String,
    pub version: String,

    /// `=`, `<` or `>`: how the installed version compares to the latest
    pub pkg_version_compare: String,
}

/// Parses the version check JSON returned by `pkg_mgr_install.php`
pub fn parse_software_system(response: &RawResponse) -> Result<Record, ParseFailure> {
    let version: SoftwareVersion = serde_json::from_str(response.body.trim())?;
    Ok(Record::SoftwareSystem(version))
}
