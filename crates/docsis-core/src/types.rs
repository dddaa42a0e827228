use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub type Id = i64;
pub type Timestamp = i64; // seconds since epoch

// ── CMTS ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cmts {
    pub id: Id,
    pub name: String,
    pub ip_address: String,
    pub snmp_port: u16,
    pub community_read: String,
    pub community_write: Option<String>,
    pub cm_community_string: Option<String>,
    pub snmp_version: SnmpVersion,
    pub enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SnmpVersion {
    V1,
    V2,
    V3,
}

impl SnmpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "V1",
            Self::V2 => "V2",
            Self::V3 => "V3",
        }
    }
}

impl std::str::FromStr for SnmpVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "V1" | "1" => Ok(Self::V1),
            "V2" | "2" | "V2C" => Ok(Self::V2),
            "V3" | "3" => Ok(Self::V3),
            other => Err(CoreError::Validation(format!(
                "unknown snmp_version: {other}"
            ))),
        }
    }
}

/// Fields accepted when creating or updating a CMTS. Separated from `Cmts`
/// so identity/timestamps are never caller-supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmtsInput {
    pub name: String,
    pub ip_address: String,
    pub snmp_port: u16,
    pub community_read: String,
    pub community_write: Option<String>,
    pub cm_community_string: Option<String>,
    pub snmp_version: SnmpVersion,
    pub enabled: bool,
}

impl CmtsInput {
    /// Invariants from spec §3: name/community_read/ip_address non-empty,
    /// port in range.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("cmts.name must not be empty".into()));
        }
        if self.ip_address.trim().is_empty() {
            return Err(CoreError::Validation(
                "cmts.ip_address must not be empty".into(),
            ));
        }
        if self.community_read.trim().is_empty() {
            return Err(CoreError::Validation(
                "cmts.community_read must not be empty".into(),
            ));
        }
        if self.snmp_port == 0 {
            return Err(CoreError::Validation(
                "cmts.snmp_port must be in [1, 65535]".into(),
            ));
        }
        Ok(())
    }
}

// ── Modem ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModemStatus {
    Online,
    Offline,
    Denied,
    Partial,
    Unknown,
}

impl ModemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Denied => "denied",
            Self::Partial => "partial",
            Self::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for ModemStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            "denied" => Ok(Self::Denied),
            "partial" => Ok(Self::Partial),
            "unknown" => Ok(Self::Unknown),
            other => Err(CoreError::Validation(format!(
                "unknown modem status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modem {
    pub id: Id,
    pub cmts_id: Id,
    pub mac_address: String,
    pub ip_address: Option<String>,
    pub sys_descr: Option<String>,
    pub current_firmware: Option<String>,
    pub signal_level: Option<f64>,
    pub status: ModemStatus,
    pub last_seen: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields a discovery poll has for one modem; fed to `upsert_modem`.
#[derive(Debug, Clone)]
pub struct ModemUpsert {
    pub cmts_id: Id,
    pub mac_address: String,
    pub ip_address: Option<String>,
    pub sys_descr: Option<String>,
    pub current_firmware: Option<String>,
    pub signal_level: Option<f64>,
    pub status: ModemStatus,
}

// ── Rule ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    MacRange,
    SysdescrRegex,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MacRange => "MAC_RANGE",
            Self::SysdescrRegex => "SYSDESCR_REGEX",
        }
    }
}

impl std::str::FromStr for MatchType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MAC_RANGE" => Ok(Self::MacRange),
            "SYSDESCR_REGEX" => Ok(Self::SysdescrRegex),
            other => Err(CoreError::Validation(format!(
                "unknown match_type: {other}"
            ))),
        }
    }
}

/// The criteria sum type named in the spec's design notes: a discriminant
/// alongside a validated payload, never a bare stringly-typed JSON blob at
/// the domain layer. Stores serialize/deserialize it at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MatchCriteria {
    MacRange { start: u64, end: u64 },
    SysDescrRegex { pattern: String },
}

impl MatchCriteria {
    pub fn match_type(&self) -> MatchType {
        match self {
            Self::MacRange { .. } => MatchType::MacRange,
            Self::SysDescrRegex { .. } => MatchType::SysdescrRegex,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub criteria: MatchCriteria,
    pub tftp_server_ip: String,
    pub firmware_filename: String,
    pub enabled: bool,
    pub priority: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleInput {
    pub name: String,
    pub description: Option<String>,
    pub criteria: MatchCriteria,
    pub tftp_server_ip: String,
    pub firmware_filename: String,
    pub enabled: bool,
    pub priority: i64,
}

impl RuleInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("rule.name must not be empty".into()));
        }
        if self.tftp_server_ip.trim().is_empty() {
            return Err(CoreError::Validation(
                "rule.tftp_server_ip must not be empty".into(),
            ));
        }
        if self.firmware_filename.trim().is_empty() {
            return Err(CoreError::Validation(
                "rule.firmware_filename must not be empty".into(),
            ));
        }
        if let MatchCriteria::MacRange { start, end } = &self.criteria {
            if start > end {
                return Err(CoreError::Validation(
                    "match_criteria: start_mac must be <= end_mac".into(),
                ));
            }
        }
        if let MatchCriteria::SysDescrRegex { pattern } = &self.criteria {
            regex::Regex::new(pattern)
                .map_err(|e| CoreError::Validation(format!("invalid regex pattern: {e}")))?;
        }
        Ok(())
    }
}

// ── Job ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!("unknown job status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Id,
    pub modem_id: Id,
    pub rule_id: Id,
    pub cmts_id: Id,
    pub mac_address: String,
    pub status: JobStatus,
    pub tftp_server_ip: String,
    pub firmware_filename: String,
    pub retry_count: i64,
    pub max_retries: i64,
    pub error_message: Option<String>,
    /// When a retrying job becomes eligible for re-dispatch again. `None`
    /// means "eligible now" (fresh job, never retried).
    pub retry_after: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// What the rule matcher hands the job layer when it decides to create a job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub modem_id: Id,
    pub rule_id: Id,
    pub cmts_id: Id,
    pub mac_address: String,
    pub tftp_server_ip: String,
    pub firmware_filename: String,
    pub max_retries: i64,
}

// ── ActivityEvent ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ModemDiscovered,
    ModemCleanup,
    UpgradeStarted,
    UpgradeCompleted,
    UpgradeFailed,
    RuleCreated,
    RuleUpdated,
    RuleDeleted,
    CmtsAdded,
    CmtsUpdated,
    CmtsDeleted,
    SystemEvent,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModemDiscovered => "MODEM_DISCOVERED",
            Self::ModemCleanup => "MODEM_CLEANUP",
            Self::UpgradeStarted => "UPGRADE_STARTED",
            Self::UpgradeCompleted => "UPGRADE_COMPLETED",
            Self::UpgradeFailed => "UPGRADE_FAILED",
            Self::RuleCreated => "RULE_CREATED",
            Self::RuleUpdated => "RULE_UPDATED",
            Self::RuleDeleted => "RULE_DELETED",
            Self::CmtsAdded => "CMTS_ADDED",
            Self::CmtsUpdated => "CMTS_UPDATED",
            Self::CmtsDeleted => "CMTS_DELETED",
            Self::SystemEvent => "SYSTEM_EVENT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: Id,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: Option<Id>,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewActivityEvent {
    pub event_type: EventType,
    pub entity_type: String,
    pub entity_id: Option<Id>,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

// ── Setting ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: Timestamp,
}

// ── Filters ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ModemFilter {
    pub cmts_id: Option<Id>,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub limit: Option<i64>,
}
