use std::str::FromStr;

use docsis_core::error::{CoreError, Result};
use docsis_core::types::{
    ActivityEvent, Cmts, Job, JobStatus, MatchCriteria, Modem, ModemStatus, Rule, Setting,
    SnmpVersion,
};

#[derive(sqlx::FromRow)]
pub(crate) struct CmtsRow {
    pub id: i64,
    pub name: String,
    pub ip_address: String,
    pub snmp_port: i64,
    pub community_read: String,
    pub community_write: Option<String>,
    pub cm_community_string: Option<String>,
    pub snmp_version: String,
    pub enabled: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<CmtsRow> for Cmts {
    type Error = CoreError;

    fn try_from(r: CmtsRow) -> Result<Self> {
        Ok(Cmts {
            id: r.id,
            name: r.name,
            ip_address: r.ip_address,
            snmp_port: r.snmp_port as u16,
            community_read: r.community_read,
            community_write: r.community_write,
            cm_community_string: r.cm_community_string,
            snmp_version: SnmpVersion::from_str(&r.snmp_version)?,
            enabled: r.enabled,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ModemRow {
    pub id: i64,
    pub cmts_id: i64,
    pub mac_address: String,
    pub ip_address: Option<String>,
    pub sys_descr: Option<String>,
    pub current_firmware: Option<String>,
    pub signal_level: Option<f64>,
    pub status: String,
    pub last_seen: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<ModemRow> for Modem {
    type Error = CoreError;

    fn try_from(r: ModemRow) -> Result<Self> {
        Ok(Modem {
            id: r.id,
            cmts_id: r.cmts_id,
            mac_address: r.mac_address,
            ip_address: r.ip_address,
            sys_descr: r.sys_descr,
            current_firmware: r.current_firmware,
            signal_level: r.signal_level,
            status: ModemStatus::from_str(&r.status)?,
            last_seen: r.last_seen,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RuleRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub match_criteria: String,
    pub tftp_server_ip: String,
    pub firmware_filename: String,
    pub enabled: bool,
    pub priority: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<RuleRow> for Rule {
    type Error = CoreError;

    fn try_from(r: RuleRow) -> Result<Self> {
        let criteria: MatchCriteria = serde_json::from_str(&r.match_criteria)
            .map_err(|e| CoreError::Internal(anyhow::anyhow!("corrupt match_criteria: {e}")))?;
        Ok(Rule {
            id: r.id,
            name: r.name,
            description: r.description,
            criteria,
            tftp_server_ip: r.tftp_server_ip,
            firmware_filename: r.firmware_filename,
            enabled: r.enabled,
            priority: r.priority,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct JobRow {
    pub id: i64,
    pub modem_id: i64,
    pub rule_id: i64,
    pub cmts_id: i64,
    pub mac_address: String,
    pub status: String,
    pub tftp_server_ip: String,
    pub firmware_filename: String,
    pub retry_count: i64,
    pub max_retries: i64,
    pub error_message: Option<String>,
    pub retry_after: Option<i64>,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<JobRow> for Job {
    type Error = CoreError;

    fn try_from(r: JobRow) -> Result<Self> {
        Ok(Job {
            id: r.id,
            modem_id: r.modem_id,
            rule_id: r.rule_id,
            cmts_id: r.cmts_id,
            mac_address: r.mac_address,
            status: JobStatus::from_str(&r.status)?,
            tftp_server_ip: r.tftp_server_ip,
            firmware_filename: r.firmware_filename,
            retry_count: r.retry_count,
            max_retries: r.max_retries,
            error_message: r.error_message,
            retry_after: r.retry_after,
            started_at: r.started_at,
            completed_at: r.completed_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ActivityEventRow {
    pub id: i64,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub message: String,
    pub details: Option<String>,
    pub created_at: i64,
}

impl TryFrom<ActivityEventRow> for ActivityEvent {
    type Error = CoreError;

    fn try_from(r: ActivityEventRow) -> Result<Self> {
        let details = match r.details {
            Some(s) => Some(
                serde_json::from_str(&s)
                    .map_err(|e| CoreError::Internal(anyhow::anyhow!("corrupt details json: {e}")))?,
            ),
            None => None,
        };
        Ok(ActivityEvent {
            id: r.id,
            event_type: r.event_type,
            entity_type: r.entity_type,
            entity_id: r.entity_id,
            message: r.message,
            details,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SettingRow {
    pub key: String,
    pub value: String,
    pub updated_at: i64,
}

impl From<SettingRow> for Setting {
    fn from(r: SettingRow) -> Self {
        Setting {
            key: r.key,
            value: r.value,
            updated_at: r.updated_at,
        }
    }
}
