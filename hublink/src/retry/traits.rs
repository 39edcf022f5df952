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

//! Retry policy trait and bookkeeping.

use crate::transport::TransportError;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Decides whether and when a failed pipeline operation is attempted again.
///
/// Policies are shared between the client and the retry layer, so all
/// methods take `&self`; implementations keep any mutable state behind
/// interior mutability.
pub trait RetryPolicy: Send + Sync {
    /// Returns `true` if another attempt should be made.
    ///
    /// `attempt` is the number of attempts that have already failed, minus
    /// one (the first retry decision sees `0`).
    fn should_retry(&self, attempt: u32, last_error: &TransportError) -> bool;

    /// Delay before the next attempt.
    fn next_delay(&self, attempt: u32) -> Duration;

    /// Called when an operation eventually succeeds.
    fn on_recovered(&self);

    /// Called after every failed attempt.
    fn on_failed(&self, error: &TransportError);

    /// Clears internal state.
    fn reset(&self);

    /// Name of the policy, used in logs.
    fn name(&self) -> &str;
}

/// A replaceable policy shared between the client and its retry layer.
///
/// Clones refer to the same slot, so a policy installed through one clone is
/// used by every retry loop that starts afterwards.
#[derive(Clone)]
pub struct SharedRetryPolicy {
    slot: Arc<RwLock<Arc<dyn RetryPolicy>>>,
}

impl SharedRetryPolicy {
    /// Creates a slot holding `policy`.
    pub fn new(policy: Arc<dyn RetryPolicy>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(policy)),
        }
    }

    /// The policy currently installed.
    pub fn current(&self) -> Arc<dyn RetryPolicy> {
        self.slot.read().clone()
    }

    /// Installs `policy`, returning the previous one.
    pub fn replace(&self, policy: Arc<dyn RetryPolicy>) -> Arc<dyn RetryPolicy> {
        std::mem::replace(&mut *self.slot.write(), policy)
    }
}

impl fmt::Debug for SharedRetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRetryPolicy")
            .field("current", &self.slot.read().name())
            .finish()
    }
}

/// Counters kept by the built-in policies.
#[derive(Debug, Clone, Default)]
pub struct RetryMetrics {
    /// Number of failed attempts
    pub failed_attempts: u64,
    /// Number of operations that eventually succeeded
    pub recoveries: u64,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Last error seen
    pub last_error: Option<String>,
}

impl RetryMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful operation.
    pub fn record_recovery(&mut self) {
        self.recoveries += 1;
        self.consecutive_failures = 0;
        self.last_error = None;
    }

    /// Record a failed attempt.
    pub fn record_failure(&mut self, error: &TransportError) {
        self.failed_attempts += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error.to_string());
    }

    /// Reset all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_failure_then_recovery() {
        let mut metrics = RetryMetrics::new();
        let error = TransportError::connection_lost("test");

        metrics.record_failure(&error);
        metrics.record_failure(&error);
        assert_eq!(metrics.failed_attempts, 2);
        assert_eq!(metrics.consecutive_failures, 2);
        assert_eq!(metrics.last_error.as_deref(), Some("connection lost: test"));

        metrics.record_recovery();
        assert_eq!(metrics.recoveries, 1);
        assert_eq!(metrics.consecutive_failures, 0);
        assert!(metrics.last_error.is_none());
        assert_eq!(metrics.failed_attempts, 2);
    }

    #[test]
    fn test_shared_policy_replace() {
        use crate::retry::{FixedDelay, NoRetry};

        let shared = SharedRetryPolicy::new(Arc::new(NoRetry::new()));
        let other = shared.clone();
        assert_eq!(other.current().name(), "NoRetry");

        let previous = shared.replace(Arc::new(FixedDelay::default()));
        assert_eq!(previous.name(), "NoRetry");
        assert_eq!(other.current().name(), "FixedDelay");
    }

    #[test]
    fn test_reset() {
        let mut metrics = RetryMetrics::new();
        metrics.record_failure(&TransportError::NotConnected);
        metrics.reset();

        assert_eq!(metrics.failed_attempts, 0);
        assert_eq!(metrics.consecutive_failures, 0);
        assert!(metrics.last_error.is_none());
    }
}
