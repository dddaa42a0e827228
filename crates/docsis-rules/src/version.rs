//! Firmware version token extraction and comparison.
//!
//! Filenames and `sysDescr` strings embed a version somewhere
//! (`CM_FW_v1.2.3.bin`, `SBV3-1.0.4-reg.bin`, ...). This module pulls out the
//! first dotted numeric run and compares components numerically, so `1.9`
//! correctly orders before `1.10`.

use std::cmp::Ordering;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(Vec<u64>);

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        for i in 0..len {
            let a = self.0.get(i).copied().unwrap_or(0);
            let b = other.0.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

/// Extracts the first `v?<digits>(.<digits>)+` run from `text` as a
/// comparable [`Version`]. Returns `None` if no such token is present.
pub fn extract_version(text: &str) -> Option<Version> {
    let re = Regex::new(r"v?(\d+(?:\.\d+)+)").ok()?;
    let caps = re.captures(text)?;
    let raw = caps.get(1)?.as_str();
    let parts: Vec<u64> = raw.split('.').filter_map(|p| p.parse().ok()).collect();
    if parts.is_empty() {
        None
    } else {
        Some(Version(parts))
    }
}

/// Extracts the same version token as [`extract_version`] but as the raw
/// matched substring, for stashing into `Modem::current_firmware` straight
/// off a `sysDescr` string.
pub fn extract_version_token(text: &str) -> Option<String> {
    let re = Regex::new(r"v?\d+(?:\.\d+)+").ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_dotted_version_with_v_prefix() {
        assert_eq!(extract_version("fw-v1.2.3.bin").unwrap(), Version(vec![1, 2, 3]));
    }

    #[test]
    fn extracts_dotted_version_without_v_prefix() {
        assert_eq!(extract_version("SBV3-1.0.4-reg.bin").unwrap(), Version(vec![1, 0, 4]));
    }

    #[test]
    fn no_version_token_returns_none() {
        assert!(extract_version("genericfirmware.bin").is_none());
    }

    #[test]
    fn numeric_comparison_not_lexicographic() {
        let a = extract_version("v1.9").unwrap();
        let b = extract_version("v1.10").unwrap();
        assert!(a < b);
    }
}
