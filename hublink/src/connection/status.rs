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

//! Connection status values and the events that carry them.

use crate::transport::ConnectionType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally observed connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Not opened, or closed by the application. Initial state.
    Disabled,
    /// An open is in progress.
    Connecting,
    /// Connected to the hub.
    Connected,
    /// Connection lost; recovery is in progress.
    DisconnectedRetrying,
    /// Connection lost and no further automatic recovery will be attempted.
    Disconnected,
}

impl ConnectionStatus {
    /// Returns `true` if a close event reporting this status should trigger
    /// recovery.
    ///
    /// `Disabled` comes from an explicit close and `Disconnected` means
    /// recovery already gave up.
    pub const fn allows_recovery(&self) -> bool {
        !matches!(self, Self::Disabled | Self::Disconnected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "Disabled",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::DisconnectedRetrying => "Disconnected_Retrying",
            Self::Disconnected => "Disconnected",
        })
    }
}

/// Why the status last changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStatusChangeReason {
    /// Connection established normally.
    ConnectionOk,
    /// The SAS token expired and could not be renewed.
    ExpiredSasToken,
    /// The device is disabled on the hub.
    DeviceDisabled,
    /// Credentials were rejected.
    BadCredential,
    /// Recovery gave up.
    RetryExpired,
    /// The network is unavailable.
    NoNetwork,
    /// A protocol or communication failure.
    CommunicationError,
    /// The application closed the client.
    ClientClose,
}

impl fmt::Display for ConnectionStatusChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConnectionOk => "Connection_Ok",
            Self::ExpiredSasToken => "Expired_SAS_Token",
            Self::DeviceDisabled => "Device_Disabled",
            Self::BadCredential => "Bad_Credential",
            Self::RetryExpired => "Retry_Expired",
            Self::NoNetwork => "No_Network",
            Self::CommunicationError => "Communication_Error",
            Self::ClientClose => "Client_Close",
        })
    }
}

/// A sub-channel status report raised by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    /// The sub-channel the event concerns
    pub connection_type: ConnectionType,
    /// Resulting status
    pub status: ConnectionStatus,
    /// Resulting reason
    pub reason: ConnectionStatusChangeReason,
}

impl ConnectionEvent {
    /// Creates an event.
    pub const fn new(
        connection_type: ConnectionType,
        status: ConnectionStatus,
        reason: ConnectionStatusChangeReason,
    ) -> Self {
        Self {
            connection_type,
            status,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_eligibility() {
        assert!(ConnectionStatus::DisconnectedRetrying.allows_recovery());
        assert!(ConnectionStatus::Connected.allows_recovery());
        assert!(!ConnectionStatus::Disabled.allows_recovery());
        assert!(!ConnectionStatus::Disconnected.allows_recovery());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ConnectionStatus::DisconnectedRetrying.to_string(), "Disconnected_Retrying");
        assert_eq!(ConnectionStatusChangeReason::RetryExpired.to_string(), "Retry_Expired");
    }
}
