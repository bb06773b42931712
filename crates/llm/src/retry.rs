//! Bounded Retry Policy
//!
//! Text generator calls are not retried by default. The only exception is
//! the duplicate-question retry of the follow-up generator, which allows one
//! extra attempt. The policy object makes that bound explicit and
//! unrepresentable beyond it.

use serde::{Deserialize, Serialize};

/// Hard ceiling on attempts for any single generation step.
pub const MAX_ATTEMPTS_CEILING: u32 = 2;

/// How many times one generation step may call the text generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// A single attempt, no retry.
    pub fn none() -> Self {
        Self { max_attempts: 1 }
    }

    /// Build a policy from a configured attempt count, clamped to
    /// `1..=MAX_ATTEMPTS_CEILING`.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_CEILING),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
