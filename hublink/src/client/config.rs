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

//! Client configuration: defaults, validation and the shared timeout cell.

use super::ConfigError;
use crate::retry::{ExponentialBackoff, RetryPolicy};
use crate::transport::{OperationToken, TransportSettings};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default bound on client operations, in milliseconds (4 minutes).
pub const DEFAULT_OPERATION_TIMEOUT_MS: u32 = 240_000;

/// Diagnostic sampling is off unless configured.
pub const DEFAULT_DIAGNOSTIC_SAMPLING_PERCENTAGE: i32 = 0;

/// Upper bound for the diagnostic sampling percentage.
pub const MAX_DIAGNOSTIC_SAMPLING_PERCENTAGE: i32 = 100;

fn default_retry_policy() -> Arc<dyn RetryPolicy> {
    Arc::new(ExponentialBackoff::default())
}

/// Options applied when a client is built.
///
/// Every option can also be changed later through the corresponding
/// [`DeviceClient`](super::DeviceClient) setter.
///
/// # Examples
///
/// ```rust
/// use hublink::client::{ClientOptions, DEFAULT_OPERATION_TIMEOUT_MS};
///
/// let options = ClientOptions::default();
/// assert_eq!(options.operation_timeout_ms, DEFAULT_OPERATION_TIMEOUT_MS);
///
/// let options = ClientOptions {
///     operation_timeout_ms: 0,
///     product_info: "thermostat/1.2".to_string(),
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Bound on open, send, receive and method operations.
    ///
    /// `0` disables the bound: operations receive a non-cancelable token.
    ///
    /// Default: 240000 (4 minutes)
    pub operation_timeout_ms: u32,

    /// Percentage of telemetry messages carrying end-to-end diagnostics.
    ///
    /// Must be within `0..=100`, and non-zero values require every
    /// configured transport to support diagnostics.
    ///
    /// Default: 0
    pub diagnostic_sampling_percentage: i32,

    /// Product information appended to the user agent.
    ///
    /// Default: empty
    pub product_info: String,

    /// Policy governing retries of `open` and connection recovery.
    ///
    /// Default: bounded [`ExponentialBackoff`]
    #[serde(skip, default = "default_retry_policy")]
    pub retry_policy: Arc<dyn RetryPolicy>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
            diagnostic_sampling_percentage: DEFAULT_DIAGNOSTIC_SAMPLING_PERCENTAGE,
            product_info: String::new(),
            retry_policy: default_retry_policy(),
        }
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("operation_timeout_ms", &self.operation_timeout_ms)
            .field(
                "diagnostic_sampling_percentage",
                &self.diagnostic_sampling_percentage,
            )
            .field("product_info", &self.product_info)
            .field("retry_policy", &self.retry_policy.name())
            .finish()
    }
}

impl ClientOptions {
    /// Checks the options against the transports the client will use.
    ///
    /// # Errors
    ///
    /// See [`validate_diagnostic_sampling`].
    pub fn validate(&self, transports: &[TransportSettings]) -> Result<(), ConfigError> {
        validate_diagnostic_sampling(self.diagnostic_sampling_percentage, transports)
    }
}

/// Checks a diagnostic sampling percentage.
///
/// # Errors
///
/// - [`ConfigError::DiagnosticSamplingOutOfRange`] when `value` is outside
///   `0..=100`.
/// - [`ConfigError::DiagnosticsNotSupported`] when `value > 0` and any of
///   `transports` lacks diagnostic support. The error names the first such
///   transport.
pub fn validate_diagnostic_sampling(
    value: i32,
    transports: &[TransportSettings],
) -> Result<(), ConfigError> {
    if !(0..=MAX_DIAGNOSTIC_SAMPLING_PERCENTAGE).contains(&value) {
        return Err(ConfigError::DiagnosticSamplingOutOfRange { value });
    }

    if value > 0 {
        if let Some(unsupported) = transports
            .iter()
            .map(TransportSettings::transport_type)
            .find(|transport| !transport.supports_diagnostics())
        {
            return Err(ConfigError::DiagnosticsNotSupported {
                transport: unsupported,
            });
        }
    }

    Ok(())
}

/// The client's operation timeout, shared with the dispatcher and state
/// machine.
///
/// Mints the [`OperationToken`] for each operation from the value current at
/// that moment. All tokens are children of one shutdown signal that
/// [`cancel_outstanding`](Self::cancel_outstanding) fires.
#[derive(Debug)]
pub struct OperationTimeout {
    millis: AtomicU32,
    shutdown: RwLock<CancellationToken>,
}

impl OperationTimeout {
    /// Creates a cell holding `millis`.
    pub fn new(millis: u32) -> Self {
        Self {
            millis: AtomicU32::new(millis),
            shutdown: RwLock::new(CancellationToken::new()),
        }
    }

    /// Current timeout in milliseconds.
    pub fn get(&self) -> u32 {
        self.millis.load(Ordering::Acquire)
    }

    /// Replaces the timeout. Tokens already minted keep their deadline.
    pub fn set(&self, millis: u32) {
        self.millis.store(millis, Ordering::Release);
    }

    /// Token for a user-facing operation.
    ///
    /// A timeout of `0` yields [`OperationToken::none`].
    pub fn token(&self) -> OperationToken {
        match self.get() {
            0 => OperationToken::none(),
            millis => OperationToken::with_timeout(
                &self.shutdown.read(),
                Duration::from_millis(u64::from(millis)),
            ),
        }
    }

    /// Cancelable token without a deadline, for connection recovery.
    pub fn recovery_token(&self) -> OperationToken {
        OperationToken::cancel_only(&self.shutdown.read())
    }

    /// Cancels every token minted so far. Later tokens are unaffected.
    pub fn cancel_outstanding(&self) {
        let previous = std::mem::replace(&mut *self.shutdown.write(), CancellationToken::new());
        previous.cancel();
    }
}

impl Default for OperationTimeout {
    fn default() -> Self {
        Self::new(DEFAULT_OPERATION_TIMEOUT_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportType;

    fn settings(types: &[TransportType]) -> Vec<TransportSettings> {
        types.iter().copied().map(TransportSettings::from_type).collect()
    }

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.operation_timeout_ms, 240_000);
        assert_eq!(options.diagnostic_sampling_percentage, 0);
        assert!(options.product_info.is_empty());
        assert_eq!(options.retry_policy.name(), "ExponentialBackoff");
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let options: ClientOptions =
            serde_json::from_str(r#"{"diagnostic_sampling_percentage": 10}"#).unwrap();
        assert_eq!(options.diagnostic_sampling_percentage, 10);
        assert_eq!(options.operation_timeout_ms, DEFAULT_OPERATION_TIMEOUT_MS);
    }

    #[test]
    fn test_range() {
        let amqp = settings(&[TransportType::Amqp]);
        assert!(validate_diagnostic_sampling(0, &amqp).is_ok());
        assert!(validate_diagnostic_sampling(100, &amqp).is_ok());
        assert_eq!(
            validate_diagnostic_sampling(200, &amqp),
            Err(ConfigError::DiagnosticSamplingOutOfRange { value: 200 })
        );
        assert_eq!(
            validate_diagnostic_sampling(-100, &amqp),
            Err(ConfigError::DiagnosticSamplingOutOfRange { value: -100 })
        );
    }

    #[test]
    fn test_mixed_transports_name_unsupported_one() {
        let mixed = settings(&[TransportType::Mqtt, TransportType::Http1, TransportType::Amqp]);
        assert_eq!(
            validate_diagnostic_sampling(10, &mixed),
            Err(ConfigError::DiagnosticsNotSupported {
                transport: TransportType::Http1
            })
        );
        assert!(validate_diagnostic_sampling(0, &mixed).is_ok());
    }

    #[tokio::test]
    async fn test_zero_timeout_mints_non_cancelable_tokens() {
        let timeout = OperationTimeout::new(0);
        assert!(!timeout.token().can_be_canceled());

        timeout.set(1_000);
        let token = timeout.token();
        assert!(token.can_be_canceled());
        assert_eq!(token.timeout(), Some(Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_cancel_outstanding_spares_new_tokens() {
        let timeout = OperationTimeout::default();
        let before = timeout.token();
        let recovery = timeout.recovery_token();

        timeout.cancel_outstanding();
        assert!(before.is_cancelled());
        assert!(recovery.is_cancelled());
        assert!(!timeout.token().is_cancelled());
    }
}
