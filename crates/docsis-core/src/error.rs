use thiserror::Error;

/// The error taxonomy shared by every component. Each variant maps to one
/// row of the propagation table in the spec: Validation/NotFound/Conflict
/// surface verbatim to API callers, Transient/SNMPTransport/UpgradeRemote/
/// Timeout/Cancelled are the engine's internal vocabulary for deciding
/// retry vs. terminal failure.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage busy, retries exhausted: {0}")]
    Transient(String),

    #[error("SNMP transport error talking to {host}: {detail}")]
    SnmpTransport { host: String, detail: String },

    #[error("modem reported upgrade failure: {0}")]
    UpgradeRemote(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    /// HTTP status the management API should translate this error to.
    /// Asynchronous triggers never return through this path — they return
    /// 202 immediately regardless of what happens later.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Transient(_) => 503,
            Self::SnmpTransport { .. } => 502,
            Self::UpgradeRemote(_) => 502,
            Self::Timeout(_) => 504,
            Self::Cancelled => 499,
            Self::Internal(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
