//! DOCSIS MIB object identifiers used by [`crate::session::SnmpSession`].
//! Values per spec.md §4.2 / SPEC_FULL.md §4.2 — standard DOCSIS and
//! vendor-neutral RFC 4639 (`docsDevSw`) OIDs.

/// `docsIfCmtsCmStatusMacAddress` — base of the CM-status table, walked to
/// discover every modem registered with a CMTS.
pub const CM_STATUS_MAC_ADDRESS: &str = "1.3.6.1.2.1.10.127.1.3.3.1.2";

/// `docsIfCmtsCmStatusIPAddress`
pub const CM_STATUS_IP_ADDRESS: &str = "1.3.6.1.2.1.10.127.1.3.3.1.3";

/// `docsIfCmtsCmStatusRxPower` — downstream receive power, our signal proxy.
pub const CM_STATUS_RX_POWER: &str = "1.3.6.1.2.1.10.127.1.3.3.1.6";

/// `docsIfCmtsCmStatusValue` — CM operational status enum.
pub const CM_STATUS_VALUE: &str = "1.3.6.1.2.1.10.127.1.3.3.1.9";

/// `sysDescr.0`
pub const SYS_DESCR: &str = "1.3.6.1.2.1.1.1.0";

/// `docsDevSwServer.0` — TFTP server the modem should pull firmware from.
pub const DEV_SW_SERVER: &str = "1.3.6.1.2.1.69.1.3.1.0";

/// `docsDevSwFilename.0`
pub const DEV_SW_FILENAME: &str = "1.3.6.1.2.1.69.1.3.2.0";

/// `docsDevSwAdminStatus.0` — SET to 1 (upgradeFromMgt) to trigger a pull.
pub const DEV_SW_ADMIN_STATUS: &str = "1.3.6.1.2.1.69.1.3.3.0";

/// `docsDevSwOperStatus.0` — progress of an in-flight upgrade.
pub const DEV_SW_OPER_STATUS: &str = "1.3.6.1.2.1.69.1.3.4.0";

/// `docsDevSwAdminStatus` value meaning "start the upgrade now".
pub const ADMIN_STATUS_UPGRADE_FROM_MGT: i64 = 1;

/// Decodes a `docsIfCmtsCmStatusValue` reading into a [`docsis_core::types::ModemStatus`].
pub fn decode_operational_status(value: i64) -> docsis_core::types::ModemStatus {
    use docsis_core::types::ModemStatus;
    match value {
        12 => ModemStatus::Online,
        13 => ModemStatus::Denied,
        1 | 2 | 3 => ModemStatus::Offline,
        _ => ModemStatus::Partial,
    }
}

/// Status an in-flight firmware push has reached, decoded from
/// `docsDevSwOperStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeStatus {
    InProgress,
    Completed,
    Failed,
    Unknown,
}

pub fn decode_upgrade_status(value: i64) -> UpgradeStatus {
    match value {
        1 => UpgradeStatus::InProgress,
        2 | 3 => UpgradeStatus::Completed,
        4 => UpgradeStatus::Failed,
        _ => UpgradeStatus::Unknown,
    }
}
