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

//! Exponential backoff with bounded attempts.

use super::traits::{RetryMetrics, RetryPolicy};
use crate::transport::TransportError;
use parking_lot::Mutex;
use std::time::Duration;

/// Attempts allowed by the default policy before the client gives up and
/// reports `RetryExpired`.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);
const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Retry policy whose delay grows geometrically up to a ceiling.
///
/// The delay before retry `n` is `initial_delay * multiplier^n`, capped at
/// `max_delay`. With jitter enabled the delay is drawn uniformly from the
/// upper half of that value, so that many clients recovering at once do not
/// reconnect in lockstep.
///
/// This is the client's default policy.
///
/// # Examples
///
/// ```
/// use hublink::retry::{ExponentialBackoff, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = ExponentialBackoff::builder()
///     .initial_delay(Duration::from_millis(200))
///     .max_delay(Duration::from_secs(5))
///     .jitter(false)
///     .build();
///
/// assert_eq!(policy.next_delay(0), Duration::from_millis(200));
/// assert_eq!(policy.next_delay(1), Duration::from_millis(400));
/// assert_eq!(policy.next_delay(10), Duration::from_secs(5));
/// ```
#[derive(Debug)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
    max_attempts: Option<u32>,
    metrics: Mutex<RetryMetrics>,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        ExponentialBackoffBuilder::default().build()
    }
}

impl ExponentialBackoff {
    /// Create a new builder for configuring exponential backoff.
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// Snapshot of the policy's counters.
    pub fn metrics(&self) -> RetryMetrics {
        self.metrics.lock().clone()
    }

    /// Maximum number of retries, `None` when unbounded.
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    fn capped_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = self.multiplier.powi(exponent);
        if !factor.is_finite() {
            return self.max_delay;
        }
        let scaled = self.initial_delay.as_secs_f64() * factor;
        if scaled >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(scaled)
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn should_retry(&self, attempt: u32, last_error: &TransportError) -> bool {
        if !last_error.is_recoverable() {
            return false;
        }
        self.max_attempts.is_none_or(|max| attempt < max)
    }

    fn next_delay(&self, attempt: u32) -> Duration {
        let delay = self.capped_delay(attempt);
        if self.jitter {
            delay.mul_f64(0.5 + rand::random::<f64>() * 0.5)
        } else {
            delay
        }
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
        "ExponentialBackoff"
    }
}

/// Builder for [`ExponentialBackoff`].
#[derive(Debug, Clone)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
    max_attempts: Option<u32>,
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            jitter: true,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
        }
    }
}

impl ExponentialBackoffBuilder {
    /// Delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Upper bound on any single delay.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Growth factor applied per attempt. Values below `1.0` are clamped.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Enable or disable jitter.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Maximum number of retries; `None` retries forever.
    pub fn max_attempts(mut self, max: Option<u32>) -> Self {
        self.max_attempts = max;
        self
    }

    /// Build the policy.
    pub fn build(self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_delay: self.initial_delay,
            max_delay: self.max_delay.max(self.initial_delay),
            multiplier: self.multiplier,
            jitter: self.jitter,
            max_attempts: self.max_attempts,
            metrics: Mutex::new(RetryMetrics::new()),
        }
    }
}
