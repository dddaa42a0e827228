//! SNMP adapter: the only crate in the workspace that depends on `csnmp`.
//! Everything else talks to [`SnmpSession`] and `docsis_core` types.

pub mod oids;
pub mod session;

pub use oids::{decode_operational_status, decode_upgrade_status, UpgradeStatus};
pub use session::{SessionConfig, SnmpSession};
