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

use super::traits::RetryPolicy;
use crate::transport::TransportError;
use std::time::Duration;

/// Policy that never retries.
///
/// With this policy a single failed recovery attempt moves the client to
/// `Disconnected`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl NoRetry {
    /// Create a new instance.
    pub fn new() -> Self {
        Self
    }
}

impl RetryPolicy for NoRetry {
    fn should_retry(&self, _attempt: u32, _last_error: &TransportError) -> bool {
        false
    }

    fn next_delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }

    fn on_recovered(&self) {}

    fn on_failed(&self, _error: &TransportError) {}

    fn reset(&self) {}

    fn name(&self) -> &str {
        "NoRetry"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_retries() {
        let policy = NoRetry::new();
        assert!(!policy.should_retry(0, &TransportError::NotConnected));
        assert_eq!(policy.next_delay(0), Duration::ZERO);
        assert_eq!(policy.name(), "NoRetry");
    }
}
