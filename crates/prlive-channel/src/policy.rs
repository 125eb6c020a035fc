use std::time::Duration;

/// What to do after an unplanned close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Arm one retry timer for `delay`. `attempt` is the new attempt count.
    Retry { delay: Duration, attempt: u32 },
    /// The budget is spent; stay disconnected.
    Exhausted,
}

/// Fixed-interval reconnection bounded by an attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Decide given the number of retries already scheduled since the last
    /// successful open.
    pub fn decide(&self, attempt_count: u32) -> RetryDecision {
        if attempt_count < self.max_attempts {
            RetryDecision::Retry {
                delay: self.interval,
                attempt: attempt_count + 1,
            }
        } else {
            RetryDecision::Exhausted
        }
    }
}
