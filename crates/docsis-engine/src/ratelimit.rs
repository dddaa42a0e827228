use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// A shared token-bucket-style gate: every `acquire` waits for the next
/// tick of a fixed-period interval. Cheap enough to hand-roll rather than
/// pull in a dedicated rate-limiting crate for one use site.
pub struct RateLimiter {
    interval: Mutex<Interval>,
}

impl RateLimiter {
    pub fn new(per_sec: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / per_sec.max(1) as f64);
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval: Mutex::new(interval),
        }
    }

    pub async fn acquire(&self) {
        self.interval.lock().await.tick().await;
    }
}
