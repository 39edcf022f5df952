//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Constant-interval retry policy.

use super::traits::{RetryMetrics, RetryPolicy};
use crate::transport::TransportError;
use parking_lot::Mutex;
use std::time::Duration;

/// Retries after the same delay every time.
///
/// # Examples
///
/// ```
/// use hublink::retry::{FixedDelay, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = FixedDelay::builder()
///     .delay(Duration::from_secs(2))
///     .max_attempts(Some(4))
///     .build();
///
/// assert_eq!(policy.next_delay(3), Duration::from_secs(2));
/// ```
#[derive(Debug)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<u32>,
    metrics: Mutex<RetryMetrics>,
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl FixedDelay {
    /// Unbounded retries separated by `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
            metrics: Mutex::new(RetryMetrics::new()),
        }
    }

    /// Create a new builder.
    pub fn builder() -> FixedDelayBuilder {
        FixedDelayBuilder::default()
    }

    /// Snapshot of the policy's counters.
    pub fn metrics(&self) -> RetryMetrics {
        self.metrics.lock().clone()
    }
}

impl RetryPolicy for FixedDelay {
    fn should_retry(&self, attempt: u32, last_error: &TransportError) -> bool {
        last_error.is_recoverable() && self.max_attempts.is_none_or(|max| attempt < max)
    }

    fn next_delay(&self, _attempt: u32) -> Duration {
        self.delay
    }

    fn on_recovered(&self) {
        self.metrics.lock().record_recovery();
    }

    fn on_failed(&self, error: &TransportError) {
        self.metrics.lock().record_failure(error);
    }

    fn reset(&self) {
        self.metrics.lock().reset();
    }

    fn name(&self) -> &str {
        "FixedDelay"
    }
}

/// Builder for [`FixedDelay`].
#[derive(Debug, Clone)]
pub struct FixedDelayBuilder {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl Default for FixedDelayBuilder {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl FixedDelayBuilder {
    /// Delay between attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Maximum number of retries; `None` retries forever.
    pub fn max_attempts(mut self, max: Option<u32>) -> Self {
        self.max_attempts = max;
        self
    }

    /// Build the policy.
    pub fn build(self) -> FixedDelay {
        FixedDelay {
            delay: self.delay,
            max_attempts: self.max_attempts,
            metrics: Mutex::new(RetryMetrics::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_is_constant() {
        let policy = FixedDelay::new(Duration::from_millis(250));
        assert_eq!(policy.next_delay(0), Duration::from_millis(250));
        assert_eq!(policy.next_delay(50), Duration::from_millis(250));
    }

    #[test]
    fn test_attempt_limit() {
        let policy = FixedDelay::builder().max_attempts(Some(2)).build();
        let error = TransportError::NotConnected;

        assert!(policy.should_retry(0, &error));
        assert!(policy.should_retry(1, &error));
        assert!(!policy.should_retry(2, &error));
    }

    #[test]
    fn test_metrics() {
        let policy = FixedDelay::default();
        policy.on_failed(&TransportError::NotConnected);
        assert_eq!(policy.metrics().failed_attempts, 1);
        policy.on_recovered();
        assert_eq!(policy.metrics().recoveries, 1);
    }
}
