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

//! Transport pipeline error types.
//!
//! These are the lowest level of the client's error hierarchy. They describe
//! failures reported by the transport pipeline: the remote hub could not be
//! reached, an established sub-channel dropped, an operation ran past its
//! deadline or was cancelled.
//!
//! # Recovery
//!
//! A [`TransportError`] raised while recovering a sub-channel is consumed by
//! the connection state machine and turned into a status notification. Errors
//! raised by user-initiated operations (`open`, `send_event`, handler
//! registration) are returned to the caller.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the transport pipeline.
///
/// # Examples
///
/// ```rust
/// use hublink::transport::TransportError;
///
/// let error = TransportError::connection_lost("keep-alive expired");
/// assert!(error.is_recoverable());
///
/// let error = TransportError::Closed;
/// assert!(!error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish a connection to the hub.
    #[error("failed to connect to {host}: {reason}")]
    ConnectionFailed {
        /// The host that could not be reached
        host: String,
        /// Description of the failure
        reason: String,
    },

    /// An established sub-channel was lost.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Description of why the connection was lost
        reason: String,
    },

    /// Operation exceeded the configured operation timeout.
    #[error("operation timed out after {duration:?}")]
    Timeout {
        /// The duration that was exceeded
        duration: Duration,
    },

    /// Operation was cancelled before it completed.
    ///
    /// This happens when the client is closed while an operation is in flight.
    #[error("operation was cancelled")]
    Cancelled,

    /// Invalid pipeline configuration. Never retried.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
    },

    /// The pipeline has been closed.
    #[error("transport pipeline is closed")]
    Closed,

    /// The pipeline has not been opened yet.
    #[error("transport pipeline is not connected")]
    NotConnected,

    /// The pipeline does not implement the requested operation.
    #[error("operation {operation} is not supported by this transport")]
    Unsupported {
        /// Name of the unsupported operation
        operation: &'static str,
    },

    /// An unexpected I/O error occurred.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Returns `true` if retrying the operation may succeed.
    ///
    /// Configuration errors, closed pipelines, cancellations and unsupported
    /// operations are permanent; everything else is worth another attempt.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. }
            | TransportError::ConnectionLost { .. }
            | TransportError::Timeout { .. }
            | TransportError::NotConnected => true,

            TransportError::Io { source } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            ),

            TransportError::Cancelled
            | TransportError::InvalidConfiguration { .. }
            | TransportError::Closed
            | TransportError::Unsupported { .. } => false,
        }
    }

    /// Creates a [`TransportError::ConnectionFailed`].
    pub fn connection_failed(host: impl Into<String>, reason: impl Into<String>) -> Self {
        TransportError::ConnectionFailed {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`TransportError::ConnectionLost`].
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        TransportError::ConnectionLost {
            reason: reason.into(),
        }
    }

    /// Creates a [`TransportError::InvalidConfiguration`].
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        TransportError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io { source: error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_recoverable() {
        assert!(TransportError::connection_failed("acme.example.net", "refused").is_recoverable());
        assert!(TransportError::connection_lost("peer closed").is_recoverable());
        assert!(TransportError::NotConnected.is_recoverable());
    }

    #[test]
    fn test_timeout_is_recoverable() {
        let error = TransportError::Timeout {
            duration: Duration::from_secs(30),
        };
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!TransportError::Closed.is_recoverable());
        assert!(!TransportError::Cancelled.is_recoverable());
        assert!(!TransportError::invalid_configuration("bad host").is_recoverable());
        assert!(
            !TransportError::Unsupported {
                operation: "receive"
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_io_error_classification() {
        let transient: TransportError = io::Error::new(io::ErrorKind::ConnectionReset, "reset").into();
        assert!(transient.is_recoverable());

        let permanent: TransportError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(!permanent.is_recoverable());
    }

    #[test]
    fn test_display() {
        let error = TransportError::connection_failed("acme.example.net", "refused");
        assert_eq!(error.to_string(), "failed to connect to acme.example.net: refused");
    }
}
