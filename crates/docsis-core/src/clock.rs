use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as Unix seconds, the timestamp representation used
/// throughout the schema and the job retry/backoff calculations.
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as i64
}
