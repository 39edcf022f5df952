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

//! Top-level error type for the client.
//!
//! Errors are layered the way the client is:
//!
//! 1. **Transport**: the pipeline failed or an operation timed out
//!    ([`TransportError`])
//! 2. **Configuration**: a setting or connection string was rejected
//!    ([`ConfigError`])
//! 3. **Methods**: handler registration failed ([`MethodError`])
//!
//! [`HubError`] composes the three. Failures inside event delivery (bad
//! request bodies, failing handlers, failed recovery) never reach this type;
//! they surface as response status codes or status notifications.
//!
//! # Examples
//!
//! ```rust
//! use hublink::HubError;
//! use hublink::client::ConfigError;
//! use hublink::transport::TransportError;
//!
//! let error: HubError = TransportError::NotConnected.into();
//! assert!(error.is_transport_error());
//! assert!(error.is_recoverable());
//!
//! let error: HubError = ConfigError::ModuleIdNotAllowed.into();
//! assert!(error.is_config_error());
//! assert!(!error.is_recoverable());
//! ```

use crate::client::ConfigError;
use crate::methods::MethodError;
use crate::transport::TransportError;
use std::error::Error as StdError;
use std::fmt;

/// Error returned by [`DeviceClient`](crate::DeviceClient) operations.
#[derive(Debug)]
pub enum HubError {
    /// The pipeline failed, timed out or was cancelled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hublink::HubError;
    /// use hublink::transport::TransportError;
    ///
    /// let error = HubError::Transport(TransportError::Cancelled);
    /// assert!(error.is_transport_error());
    /// ```
    Transport(TransportError),

    /// A configuration value was rejected. The previous value is kept.
    Config(ConfigError),

    /// Registering or removing a method handler failed.
    Method(MethodError),
}

impl HubError {
    /// Returns `true` if this is a transport error.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns `true` if this is a method registration error.
    #[must_use]
    pub const fn is_method_error(&self) -> bool {
        matches!(self, Self::Method(_))
    }

    /// Returns `true` if retrying the operation may succeed.
    ///
    /// Configuration errors never are.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_recoverable(),
            Self::Config(_) => false,
            Self::Method(e) => e.is_recoverable(),
        }
    }

    /// Returns `true` if the operation timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Transport(TransportError::Timeout { .. })
                | Self::Method(MethodError::Transport(TransportError::Timeout { .. }))
        )
    }
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Config(e) => write!(f, "configuration error: {}", e),
            Self::Method(e) => write!(f, "method error: {}", e),
        }
    }
}

impl StdError for HubError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Method(e) => Some(e),
        }
    }
}

impl From<TransportError> for HubError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<ConfigError> for HubError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<MethodError> for HubError {
    fn from(error: MethodError) -> Self {
        Self::Method(error)
    }
}
