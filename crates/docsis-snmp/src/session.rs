use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use csnmp::{ObjectIdentifier, ObjectValue, Snmp2cClient};
use docsis_core::error::{CoreError, Result};
use docsis_core::types::{ModemStatus, SnmpVersion};
use tracing::{debug, warn};

use crate::oids;

/// Configuration for opening a session against one CMTS. Mirrors the
/// `Cmts` row's SNMP-relevant columns.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub community_read: String,
    pub community_write: Option<String>,
    pub version: SnmpVersion,
    pub timeout: Duration,
    pub retries: u32,
    pub max_oids_per_request: u32,
}

/// A live SNMP session against one CMTS. Holds a read-community client and,
/// if a write community is configured, a separate write client — CMTS
/// deployments commonly use distinct communities for the two.
pub struct SnmpSession {
    host: String,
    port: u16,
    read_client: Snmp2cClient,
    write_client: Option<Snmp2cClient>,
    retries: u32,
    max_oids_per_request: u32,
}

impl SnmpSession {
    /// Opens the session. SNMPv1/v3 are validated but only v2c is wired
    /// through `csnmp`; v1 falls back to v2c framing (GETBULK unused),
    /// v3 is rejected until a v3-capable transport is added.
    pub async fn open(cfg: SessionConfig) -> Result<Self> {
        if cfg.version == SnmpVersion::V3 {
            return Err(CoreError::SnmpTransport {
                host: cfg.host.clone(),
                detail: "SNMPv3 is not supported by this build".to_string(),
            });
        }

        let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
            .parse()
            .map_err(|e| CoreError::SnmpTransport {
                host: cfg.host.clone(),
                detail: format!("invalid host/port: {e}"),
            })?;

        let read_client = Snmp2cClient::new(
            addr,
            cfg.community_read.clone().into_bytes().into(),
            None,
            Some(cfg.timeout),
        )
        .await
        .map_err(|e| CoreError::SnmpTransport {
            host: cfg.host.clone(),
            detail: format!(
                "connect failed (port={}, version={}, community={}): {e}",
                cfg.port,
                cfg.version.as_str(),
                cfg.community_read
            ),
        })?;

        let write_client = match &cfg.community_write {
            Some(community) => Some(
                Snmp2cClient::new(addr, community.clone().into_bytes().into(), None, Some(cfg.timeout))
                    .await
                    .map_err(|e| CoreError::SnmpTransport {
                        host: cfg.host.clone(),
                        detail: format!("write-community connect failed: {e}"),
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            host: cfg.host,
            port: cfg.port,
            read_client,
            write_client,
            retries: cfg.retries,
            max_oids_per_request: cfg.max_oids_per_request,
        })
    }

    fn parse_oid(&self, s: &str) -> Result<ObjectIdentifier> {
        ObjectIdentifier::from_str(s).map_err(|e| CoreError::SnmpTransport {
            host: self.host.clone(),
            detail: format!("bad OID {s}: {e}"),
        })
    }

    async fn get_with_retry(&self, oid: &ObjectIdentifier) -> Result<ObjectValue> {
        let mut last_err = None;
        for attempt in 0..=self.retries {
            match self.read_client.get(*oid).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    warn!(host = %self.host, attempt, error = %e, "snmp get failed, retrying");
                    last_err = Some(e);
                }
            }
        }
        Err(CoreError::SnmpTransport {
            host: self.host.clone(),
            detail: format!(
                "get failed after {} retries: {}",
                self.retries,
                last_err.map(|e| e.to_string()).unwrap_or_default()
            ),
        })
    }

    /// Walks the CM-status MAC-address table, returning each row's MAC
    /// address and the table index it was found at (the index is reused to
    /// look up the other per-modem columns). Requests are chunked to
    /// `max_oids_per_request` bulk-walk steps.
    pub async fn discover_modems(&self) -> Result<Vec<(String, ObjectIdentifier)>> {
        let base = self.parse_oid(oids::CM_STATUS_MAC_ADDRESS)?;
        let rows = self
            .read_client
            .walk_bulk(base, 0, self.max_oids_per_request)
            .await
            .map_err(|e| CoreError::SnmpTransport {
                host: self.host.clone(),
                detail: format!("walk of CM-status table failed: {e}"),
            })?;

        let mut out = Vec::with_capacity(rows.len());
        for (oid, value) in rows {
            if let ObjectValue::OctetString(bytes) = value {
                if bytes.len() == 6 {
                    let mac = bytes
                        .iter()
                        .map(|b| format!("{b:02X}"))
                        .collect::<Vec<_>>()
                        .join(":");
                    out.push((mac, oid));
                }
            }
        }
        debug!(host = %self.host, count = out.len(), "discovered modems");
        Ok(out)
    }

    pub async fn get_modem_ip(&self, index: &ObjectIdentifier) -> Result<Option<String>> {
        let oid = self.suffixed(oids::CM_STATUS_IP_ADDRESS, index)?;
        match self.get_with_retry(&oid).await? {
            ObjectValue::IpAddress(addr) => Ok(Some(addr.to_string())),
            _ => Ok(None),
        }
    }

    pub async fn get_signal_level(&self, index: &ObjectIdentifier) -> Result<Option<f64>> {
        let oid = self.suffixed(oids::CM_STATUS_RX_POWER, index)?;
        match self.get_with_retry(&oid).await? {
            ObjectValue::Integer(v) => Ok(Some(v as f64 / 10.0)),
            _ => Ok(None),
        }
    }

    pub async fn get_modem_status(&self, index: &ObjectIdentifier) -> Result<ModemStatus> {
        let oid = self.suffixed(oids::CM_STATUS_VALUE, index)?;
        match self.get_with_retry(&oid).await? {
            ObjectValue::Integer(v) => Ok(oids::decode_operational_status(v)),
            _ => Ok(ModemStatus::Unknown),
        }
    }

    /// sysDescr is fetched directly against the modem's own IP, not through
    /// the CMTS proxy table, using the CMTS's `cm_community_string` (spec.md
    /// §4.4) rather than its read community.
    pub async fn get_sys_descr(&self, modem_addr: SocketAddr, community: &str) -> Result<Option<String>> {
        let oid = self.parse_oid(oids::SYS_DESCR)?;
        let client = Snmp2cClient::new(
            modem_addr,
            community.to_string().into_bytes().into(),
            None,
            Some(Duration::from_secs(5)),
        )
        .await
        .map_err(|e| CoreError::SnmpTransport {
            host: modem_addr.to_string(),
            detail: format!("sysDescr session failed: {e}"),
        })?;

        match client.get(oid).await {
            Ok(ObjectValue::OctetString(bytes)) => {
                Ok(Some(String::from_utf8_lossy(&bytes).to_string()))
            }
            Ok(_) => Ok(None),
            Err(e) => Err(CoreError::SnmpTransport {
                host: modem_addr.to_string(),
                detail: format!("sysDescr get failed: {e}"),
            }),
        }
    }

    /// Triggers a firmware pull against one modem by SETting, in order: the
    /// TFTP server, the filename, then the admin-status trigger. A liveness
    /// GET against `docsDevSwOperStatus` runs first so we fail fast instead
    /// of leaving a half-applied SET sequence on an unreachable modem.
    pub async fn trigger_firmware_upgrade(
        &self,
        modem_addr: SocketAddr,
        community_write: &str,
        tftp_server_ip: &str,
        firmware_filename: &str,
    ) -> Result<()> {
        let client = Snmp2cClient::new(
            modem_addr,
            community_write.to_string().into_bytes().into(),
            None,
            Some(Duration::from_secs(10)),
        )
        .await
        .map_err(|e| CoreError::SnmpTransport {
            host: modem_addr.to_string(),
            detail: format!("upgrade session failed: {e}"),
        })?;

        let oper_oid = self.parse_oid(oids::DEV_SW_OPER_STATUS)?;
        client.get(oper_oid).await.map_err(|e| CoreError::SnmpTransport {
            host: modem_addr.to_string(),
            detail: format!("liveness check failed before triggering upgrade: {e}"),
        })?;

        let server_addr: std::net::Ipv4Addr =
            tftp_server_ip.parse().map_err(|e| CoreError::Validation(format!(
                "tftp_server_ip is not a valid IPv4 address: {e}"
            )))?;

        let server_oid = self.parse_oid(oids::DEV_SW_SERVER)?;
        client
            .set(server_oid, ObjectValue::IpAddress(server_addr))
            .await
            .map_err(|e| CoreError::UpgradeRemote(format!("set docsDevSwServer failed: {e}")))?;

        let filename_oid = self.parse_oid(oids::DEV_SW_FILENAME)?;
        client
            .set(
                filename_oid,
                ObjectValue::OctetString(firmware_filename.as_bytes().to_vec().into()),
            )
            .await
            .map_err(|e| CoreError::UpgradeRemote(format!("set docsDevSwFilename failed: {e}")))?;

        let admin_oid = self.parse_oid(oids::DEV_SW_ADMIN_STATUS)?;
        client
            .set(
                admin_oid,
                ObjectValue::Integer(oids::ADMIN_STATUS_UPGRADE_FROM_MGT),
            )
            .await
            .map_err(|e| CoreError::UpgradeRemote(format!("set docsDevSwAdminStatus failed: {e}")))?;

        Ok(())
    }

    pub async fn check_upgrade_status(&self, modem_addr: SocketAddr, community_read: &str) -> Result<oids::UpgradeStatus> {
        let client = Snmp2cClient::new(
            modem_addr,
            community_read.to_string().into_bytes().into(),
            None,
            Some(Duration::from_secs(10)),
        )
        .await
        .map_err(|e| CoreError::SnmpTransport {
            host: modem_addr.to_string(),
            detail: format!("status-check session failed: {e}"),
        })?;

        let oid = self.parse_oid(oids::DEV_SW_OPER_STATUS)?;
        match client.get(oid).await {
            Ok(ObjectValue::Integer(v)) => Ok(oids::decode_upgrade_status(v)),
            Ok(_) => Ok(oids::UpgradeStatus::Unknown),
            Err(e) => Err(CoreError::SnmpTransport {
                host: modem_addr.to_string(),
                detail: format!("docsDevSwOperStatus get failed: {e}"),
            }),
        }
    }

    fn suffixed(&self, base: &str, index: &ObjectIdentifier) -> Result<ObjectIdentifier> {
        let combined = format!("{base}.{index}");
        self.parse_oid(&combined)
    }
}
