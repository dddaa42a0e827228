//! Rule-based matching between discovered modems and firmware-upgrade rules.
//!
//! Pure logic: no I/O, no store access. `docsis-engine` calls these functions
//! against data it has already loaded, so every decision here can be unit
//! tested without a database or an SNMP session.

use docsis_core::types::{MatchCriteria, Modem, ModemStatus, Rule};

mod version;

pub use version::{extract_version, extract_version_token};

/// Validates a rule's match criteria beyond what `RuleInput::validate`
/// already checks at construction time (start<=end, regex compiles). Kept
/// separate so the engine can re-validate criteria loaded from storage
/// without re-running the full `RuleInput` path.
pub fn validate_criteria(criteria: &MatchCriteria) -> docsis_core::Result<()> {
    match criteria {
        MatchCriteria::MacRange { start, end } => {
            if start > end {
                return Err(docsis_core::CoreError::Validation(
                    "match_criteria: start_mac must be <= end_mac".into(),
                ));
            }
        }
        MatchCriteria::SysDescrRegex { pattern } => {
            regex::Regex::new(pattern).map_err(|e| {
                docsis_core::CoreError::Validation(format!("invalid regex pattern: {e}"))
            })?;
        }
    }
    Ok(())
}

/// Whether `rule`'s criteria match `modem`. MAC_RANGE compares the modem's
/// parsed MAC integer against the inclusive `[start, end]` range;
/// SYSDESCR_REGEX matches the modem's `sys_descr` (absent sysDescr never
/// matches).
pub fn criteria_matches(criteria: &MatchCriteria, modem: &Modem) -> bool {
    match criteria {
        MatchCriteria::MacRange { start, end } => match docsis_core::mac::parse(&modem.mac_address)
        {
            Ok(mac) => mac >= *start && mac <= *end,
            Err(_) => false,
        },
        MatchCriteria::SysDescrRegex { pattern } => {
            let Some(descr) = &modem.sys_descr else {
                return false;
            };
            match regex::Regex::new(pattern) {
                Ok(re) => re.is_match(descr),
                Err(_) => false,
            }
        }
    }
}

/// A modem is eligible for an upgrade attempt only while it is reachable
/// (`online`) and its signal is within `[signal_min, signal_max]` dBmV.
/// Marginal signal modems are excluded so a firmware push doesn't strand a
/// modem that is already barely holding a registration. The bounds come
/// from the `signal_level_min`/`signal_level_max` settings.
pub fn is_eligible(modem: &Modem, signal_min: f64, signal_max: f64) -> bool {
    if modem.status != ModemStatus::Online {
        return false;
    }
    match modem.signal_level {
        Some(level) => (signal_min..=signal_max).contains(&level),
        None => false,
    }
}

/// Whether a modem should be upgraded to the firmware named by `rule`.
/// Returns `false` only when the modem's `current_firmware` equals the
/// version embedded in `rule.firmware_filename`; any other comparison
/// (including a rule firmware that is *older* than what's installed)
/// returns `true`. If either side carries no extractable version token, an
/// upgrade is proposed conservatively (we cannot prove the modem is already
/// current).
pub fn should_upgrade(modem: &Modem, rule: &Rule) -> bool {
    let target = match extract_version(&rule.firmware_filename) {
        Some(v) => v,
        None => return true,
    };
    let current = match modem.current_firmware.as_deref().and_then(extract_version) {
        Some(v) => v,
        None => return true,
    };
    target != current
}

/// Finds the highest-priority enabled rule that matches `modem`, the modem
/// is eligible, and the upgrade is actually needed. `rules` must already be
/// sorted by priority descending (the store's `list_enabled_rules` ordering)
/// so the first hit wins.
pub fn find_matching_rule<'a>(
    modem: &Modem,
    rules: &'a [Rule],
    signal_min: f64,
    signal_max: f64,
) -> Option<&'a Rule> {
    if !is_eligible(modem, signal_min, signal_max) {
        return None;
    }
    rules
        .iter()
        .filter(|r| r.enabled)
        .find(|r| criteria_matches(&r.criteria, modem) && should_upgrade(modem, r))
}

/// Filters a modem list down to those currently eligible for any upgrade
/// attempt, independent of any specific rule. Used by the rule-evaluation
/// scheduler to size its candidate set before running the matcher.
pub fn filter_eligible(modems: &[Modem], signal_min: f64, signal_max: f64) -> Vec<&Modem> {
    modems.iter().filter(|m| is_eligible(m, signal_min, signal_max)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsis_core::types::Id;

    fn modem(mac: &str, status: ModemStatus, signal: Option<f64>, fw: Option<&str>) -> Modem {
        Modem {
            id: 1 as Id,
            cmts_id: 1,
            mac_address: mac.to_string(),
            ip_address: None,
            sys_descr: Some("ARRIS; Model: E6000;".to_string()),
            current_firmware: fw.map(|s| s.to_string()),
            signal_level: signal,
            status,
            last_seen: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn rule(criteria: MatchCriteria, enabled: bool, priority: i64, fw_filename: &str) -> Rule {
        Rule {
            id: 1,
            name: "test rule".to_string(),
            description: None,
            criteria,
            tftp_server_ip: "10.0.0.1".to_string(),
            firmware_filename: fw_filename.to_string(),
            enabled,
            priority,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn mac_range_matches_inclusive_bounds() {
        let m = modem("aa:bb:cc:00:00:05", ModemStatus::Online, Some(0.0), Some("v1.0.0"));
        let start = docsis_core::mac::parse("aa:bb:cc:00:00:00").unwrap();
        let end = docsis_core::mac::parse("aa:bb:cc:00:00:0a").unwrap();
        let c = MatchCriteria::MacRange { start, end };
        assert!(criteria_matches(&c, &m));
    }

    #[test]
    fn mac_range_excludes_outside_bounds() {
        let m = modem("aa:bb:cc:00:00:ff", ModemStatus::Online, Some(0.0), Some("v1.0.0"));
        let start = docsis_core::mac::parse("aa:bb:cc:00:00:00").unwrap();
        let end = docsis_core::mac::parse("aa:bb:cc:00:00:0a").unwrap();
        let c = MatchCriteria::MacRange { start, end };
        assert!(!criteria_matches(&c, &m));
    }

    #[test]
    fn sysdescr_regex_matches_and_requires_presence() {
        let mut m = modem("aa:bb:cc:00:00:05", ModemStatus::Online, Some(0.0), Some("v1.0.0"));
        let c = MatchCriteria::SysDescrRegex {
            pattern: "ARRIS".to_string(),
        };
        assert!(criteria_matches(&c, &m));
        m.sys_descr = None;
        assert!(!criteria_matches(&c, &m));
    }

    const SIGNAL_LEVEL_MIN_DBMV: f64 = -15.0;
    const SIGNAL_LEVEL_MAX_DBMV: f64 = 15.0;

    #[test]
    fn eligibility_requires_online_and_signal_within_bounds() {
        let bounds = (SIGNAL_LEVEL_MIN_DBMV, SIGNAL_LEVEL_MAX_DBMV);
        assert!(is_eligible(&modem("a", ModemStatus::Online, Some(0.0), None), bounds.0, bounds.1));
        assert!(!is_eligible(&modem("a", ModemStatus::Offline, Some(0.0), None), bounds.0, bounds.1));
        assert!(!is_eligible(&modem("a", ModemStatus::Online, None, None), bounds.0, bounds.1));
        assert!(is_eligible(
            &modem("a", ModemStatus::Online, Some(SIGNAL_LEVEL_MAX_DBMV), None),
            bounds.0,
            bounds.1
        ));
        assert!(!is_eligible(
            &modem("a", ModemStatus::Online, Some(SIGNAL_LEVEL_MAX_DBMV + 0.1), None),
            bounds.0,
            bounds.1
        ));
        assert!(!is_eligible(
            &modem("a", ModemStatus::Online, Some(SIGNAL_LEVEL_MIN_DBMV - 0.1), None),
            bounds.0,
            bounds.1
        ));
    }

    #[test]
    fn should_upgrade_is_false_only_when_versions_are_equal() {
        let m = modem("a", ModemStatus::Online, Some(0.0), Some("fw-v1.2.0.bin"));
        let different = rule(
            MatchCriteria::SysDescrRegex {
                pattern: ".*".into(),
            },
            true,
            0,
            "fw-v1.3.0.bin",
        );
        let same = rule(
            MatchCriteria::SysDescrRegex {
                pattern: ".*".into(),
            },
            true,
            0,
            "fw-v1.2.0.bin",
        );
        let older = rule(
            MatchCriteria::SysDescrRegex {
                pattern: ".*".into(),
            },
            true,
            0,
            "fw-v1.0.0.bin",
        );
        assert!(should_upgrade(&m, &different));
        assert!(!should_upgrade(&m, &same));
        assert!(should_upgrade(&m, &older));
    }

    #[test]
    fn find_matching_rule_honors_priority_order() {
        let m = modem("aa:bb:cc:00:00:05", ModemStatus::Online, Some(0.0), Some("v1.0.0"));
        let start = docsis_core::mac::parse("aa:bb:cc:00:00:00").unwrap();
        let end = docsis_core::mac::parse("aa:bb:cc:00:00:0a").unwrap();
        let low = rule(
            MatchCriteria::MacRange { start, end },
            true,
            1,
            "fw-v2.0.0.bin",
        );
        let high = rule(
            MatchCriteria::MacRange { start, end },
            true,
            10,
            "fw-v3.0.0.bin",
        );
        let rules = vec![high.clone(), low];
        let found = find_matching_rule(&m, &rules, SIGNAL_LEVEL_MIN_DBMV, SIGNAL_LEVEL_MAX_DBMV).unwrap();
        assert_eq!(found.priority, high.priority);
    }

    #[test]
    fn find_matching_rule_skips_disabled_and_ineligible() {
        let ineligible = modem("aa:bb:cc:00:00:05", ModemStatus::Offline, Some(0.0), Some("v1.0.0"));
        let start = docsis_core::mac::parse("aa:bb:cc:00:00:00").unwrap();
        let end = docsis_core::mac::parse("aa:bb:cc:00:00:0a").unwrap();
        let r = rule(MatchCriteria::MacRange { start, end }, true, 1, "fw-v2.0.0.bin");
        assert!(
            find_matching_rule(&ineligible, &[r.clone()], SIGNAL_LEVEL_MIN_DBMV, SIGNAL_LEVEL_MAX_DBMV).is_none()
        );

        let eligible = modem("aa:bb:cc:00:00:05", ModemStatus::Online, Some(0.0), Some("v1.0.0"));
        let disabled = rule(MatchCriteria::MacRange { start, end }, false, 1, "fw-v2.0.0.bin");
        assert!(
            find_matching_rule(&eligible, &[disabled], SIGNAL_LEVEL_MIN_DBMV, SIGNAL_LEVEL_MAX_DBMV).is_none()
        );
    }
}
