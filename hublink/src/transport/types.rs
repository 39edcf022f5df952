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

//! Transport kinds, per-transport settings and sub-channel identifiers.

use crate::client::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire protocol family of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportFamily {
    /// AMQP 1.0
    Amqp,
    /// MQTT 3.1.1
    Mqtt,
    /// HTTPS polling
    Http,
}

/// A concrete transport choice.
///
/// The `*TcpOnly` and `*WebSocketOnly` variants pin the underlying socket;
/// the bare `Amqp` and `Mqtt` variants try TCP first and fall back to
/// WebSockets.
///
/// # Examples
///
/// ```rust
/// use hublink::transport::{TransportFamily, TransportType};
///
/// assert_eq!(TransportType::MqttWebSocketOnly.family(), TransportFamily::Mqtt);
/// assert!(TransportType::AmqpTcpOnly.supports_diagnostics());
/// assert!(!TransportType::Http1.supports_diagnostics());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportType {
    /// AMQP over TCP with WebSocket fallback
    Amqp,
    /// AMQP over TCP only
    AmqpTcpOnly,
    /// AMQP over WebSockets only
    AmqpWebSocketOnly,
    /// MQTT over TCP with WebSocket fallback
    Mqtt,
    /// MQTT over TCP only
    MqttTcpOnly,
    /// MQTT over WebSockets only
    MqttWebSocketOnly,
    /// HTTP/1.1
    Http1,
}

impl TransportType {
    /// Returns the protocol family of this transport.
    pub const fn family(&self) -> TransportFamily {
        match self {
            Self::Amqp | Self::AmqpTcpOnly | Self::AmqpWebSocketOnly => TransportFamily::Amqp,
            Self::Mqtt | Self::MqttTcpOnly | Self::MqttWebSocketOnly => TransportFamily::Mqtt,
            Self::Http1 => TransportFamily::Http,
        }
    }

    /// Returns `true` if this transport can carry end-to-end diagnostic
    /// context on outgoing telemetry.
    pub const fn supports_diagnostics(&self) -> bool {
        !matches!(self.family(), TransportFamily::Http)
    }

    /// Returns the string name of this transport type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Amqp => "Amqp",
            Self::AmqpTcpOnly => "Amqp_Tcp_Only",
            Self::AmqpWebSocketOnly => "Amqp_WebSocket_Only",
            Self::Mqtt => "Mqtt",
            Self::MqttTcpOnly => "Mqtt_Tcp_Only",
            Self::MqttWebSocketOnly => "Mqtt_WebSocket_Only",
            Self::Http1 => "Http1",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for one transport in the client's transport set.
///
/// Construct through [`amqp`](Self::amqp), [`mqtt`](Self::mqtt) or
/// [`http1`](Self::http1); the family-specific constructors reject a
/// transport type from a different family.
///
/// # Examples
///
/// ```rust
/// use hublink::transport::{TransportSettings, TransportType};
///
/// let settings = TransportSettings::mqtt(TransportType::MqttWebSocketOnly).unwrap();
/// assert_eq!(settings.transport_type(), TransportType::MqttWebSocketOnly);
///
/// assert!(TransportSettings::amqp(TransportType::Mqtt).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSettings {
    transport_type: TransportType,
}

impl TransportSettings {
    /// Settings for an AMQP transport.
    pub fn amqp(transport_type: TransportType) -> Result<Self, ConfigError> {
        Self::for_family(TransportFamily::Amqp, transport_type)
    }

    /// Settings for an MQTT transport.
    pub fn mqtt(transport_type: TransportType) -> Result<Self, ConfigError> {
        Self::for_family(TransportFamily::Mqtt, transport_type)
    }

    /// Settings for the HTTP/1.1 transport.
    pub fn http1() -> Self {
        Self {
            transport_type: TransportType::Http1,
        }
    }

    /// Default settings for any transport type.
    pub fn from_type(transport_type: TransportType) -> Self {
        Self { transport_type }
    }

    fn for_family(expected: TransportFamily, transport_type: TransportType) -> Result<Self, ConfigError> {
        if transport_type.family() != expected {
            return Err(ConfigError::MismatchedTransport {
                expected,
                actual: transport_type,
            });
        }
        Ok(Self { transport_type })
    }

    /// Returns the transport type these settings configure.
    pub fn transport_type(&self) -> TransportType {
        self.transport_type
    }
}

/// Identifies the logical sub-channel a connection event concerns.
///
/// An AMQP client opens separate links for telemetry, cloud-to-device
/// messaging, methods and twin; an MQTT client multiplexes everything over a
/// single connection. Each sub-channel reports its status independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    /// AMQP telemetry sending link
    AmqpTelemetry,
    /// AMQP cloud-to-device messaging link
    AmqpMessaging,
    /// AMQP method response sending link
    AmqpMethodSending,
    /// AMQP method request receiving link
    AmqpMethodReceiving,
    /// AMQP twin request sending link
    AmqpTwinSending,
    /// AMQP twin response receiving link
    AmqpTwinReceiving,
    /// The single MQTT connection
    MqttConnection,
    /// HTTP has no persistent connection; used for request-scoped failures
    Http,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AmqpTelemetry => "amqp-telemetry",
            Self::AmqpMessaging => "amqp-messaging",
            Self::AmqpMethodSending => "amqp-method-sending",
            Self::AmqpMethodReceiving => "amqp-method-receiving",
            Self::AmqpTwinSending => "amqp-twin-sending",
            Self::AmqpTwinReceiving => "amqp-twin-receiving",
            Self::MqttConnection => "mqtt",
            Self::Http => "http",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_families() {
        assert_eq!(TransportType::Amqp.family(), TransportFamily::Amqp);
        assert_eq!(TransportType::AmqpWebSocketOnly.family(), TransportFamily::Amqp);
        assert_eq!(TransportType::MqttTcpOnly.family(), TransportFamily::Mqtt);
        assert_eq!(TransportType::Http1.family(), TransportFamily::Http);
    }

    #[test]
    fn test_only_http_lacks_diagnostics() {
        let all = [
            TransportType::Amqp,
            TransportType::AmqpTcpOnly,
            TransportType::AmqpWebSocketOnly,
            TransportType::Mqtt,
            TransportType::MqttTcpOnly,
            TransportType::MqttWebSocketOnly,
        ];
        for transport in all {
            assert!(transport.supports_diagnostics(), "{transport}");
        }
        assert!(!TransportType::Http1.supports_diagnostics());
    }

    #[test]
    fn test_settings_reject_wrong_family() {
        let err = TransportSettings::mqtt(TransportType::AmqpTcpOnly).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MismatchedTransport {
                expected: TransportFamily::Mqtt,
                actual: TransportType::AmqpTcpOnly,
            }
        ));
        assert!(TransportSettings::amqp(TransportType::AmqpTcpOnly).is_ok());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(TransportType::Http1.to_string(), "Http1");
        assert_eq!(ConnectionType::AmqpMethodReceiving.to_string(), "amqp-method-receiving");
    }
}
