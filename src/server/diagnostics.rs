use chrono::{DateTime, Utc};
use std::time::Instant;

/// Process-lifetime diagnostics, captured once at startup and queried
/// read-only by the status endpoint.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    started: Instant,
    started_at: DateTime<Utc>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_starts_near_zero() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.uptime_seconds() < 2);
        assert!(diagnostics.started_at() <= Utc::now());
    }
}
