use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

const WINDOW_SECS: u64 = 15 * 60;
const MAX_FAILURES: u32 = 5;

/// Per-client PIN brute force limiter. A four-digit PIN has only 10k values,
/// so failures are counted per client IP: 5 failures per 15 minutes.
pub struct PinRateLimiter {
    /// ip -> (failed_count, window_start)
    entries: DashMap<IpAddr, (u32, Instant)>,
}

impl Default for PinRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl PinRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if a login attempt is allowed. Returns Err with retry-after seconds.
    /// Does NOT increment the counter; call `record_failure()` on a wrong PIN.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        let window = Duration::from_secs(WINDOW_SECS);
        let now = Instant::now();

        let Some(entry) = self.entries.get(&ip) else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > window {
            return Ok(());
        }

        if *count >= MAX_FAILURES {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(WINDOW_SECS.saturating_sub(elapsed));
        }

        Ok(())
    }

    pub fn record_failure(&self, ip: IpAddr) {
        let window = Duration::from_secs(WINDOW_SECS);
        let now = Instant::now();

        let mut entry = self.entries.entry(ip).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn reset(&self, ip: IpAddr) {
        self.entries.remove(&ip);
    }

    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}
