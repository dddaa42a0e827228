//! MAC address parsing and canonical formatting.
//!
//! Accepts colon-separated (`aa:bb:cc:dd:ee:ff`), hyphen-separated
//! (`aa-bb-cc-dd-ee-ff`), Cisco dot-triplet (`aabb.ccdd.eeff`), and bare hex
//! (`aabbccddeeff`) forms, case-insensitively. All normalize to the same
//! uppercase colon-separated canonical form (`AA:BB:CC:DD:EE:FF`, spec.md §3)
//! and the same `u64` integer value used by `MatchCriteria::MacRange`.

use crate::error::{CoreError, Result};

/// Parses any of the accepted MAC string forms into a 48-bit integer.
pub fn parse(input: &str) -> Result<u64> {
    let hex: String = input
        .chars()
        .filter(|c| *c != ':' && *c != '-' && *c != '.')
        .collect();

    if hex.len() != 12 {
        return Err(CoreError::Validation(format!(
            "invalid MAC address: {input}"
        )));
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::Validation(format!(
            "invalid MAC address: {input}"
        )));
    }

    u64::from_str_radix(&hex, 16)
        .map_err(|_| CoreError::Validation(format!("invalid MAC address: {input}")))
}

/// Formats a 48-bit MAC integer as uppercase colon-separated hex, the
/// canonical form stored in `modems.mac_address`.
pub fn format(value: u64) -> String {
    let bytes = value.to_be_bytes();
    // low 6 bytes of the 8-byte big-endian representation
    bytes[2..8]
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parses then reformats, so any accepted input form collapses to the
/// canonical one.
pub fn normalize(input: &str) -> Result<String> {
    Ok(format(parse(input)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_all_four_forms() {
        let forms = [
            "aa:bb:cc:dd:ee:ff",
            "AA:BB:CC:DD:EE:FF",
            "aa-bb-cc-dd-ee-ff",
            "aabb.ccdd.eeff",
            "aabbccddeeff",
        ];
        let values: Vec<u64> = forms.iter().map(|s| parse(s).unwrap()).collect();
        assert!(values.iter().all(|v| *v == values[0]));
    }

    #[test]
    fn normalizes_to_canonical_colon_form() {
        assert_eq!(normalize("aabb.ccdd.eeff").unwrap(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(normalize("aabbccddeeff").unwrap(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn rejects_wrong_length_and_nonhex() {
        assert!(parse("aa:bb:cc:dd:ee").is_err());
        assert!(parse("zz:bb:cc:dd:ee:ff").is_err());
        assert!(parse("aa:bb:cc:dd:ee:ff:00").is_err());
    }

    #[test]
    fn round_trips_through_format() {
        let v = parse("00:11:22:33:44:55").unwrap();
        assert_eq!(format(v), "00:11:22:33:44:55".to_uppercase());
    }
}
