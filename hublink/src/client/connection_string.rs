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

//! Device connection strings.
//!
//! A connection string is a `;`-separated list of `Key=Value` segments:
//!
//! ```text
//! HostName=acme.azure-devices.net;DeviceId=thermostat-7;SharedAccessKey=c2VjcmV0
//! ```
//!
//! Only the structure is checked here. Credentials are carried opaquely and
//! never turned into tokens.

use super::ConfigError;
use std::fmt;
use std::str::FromStr;

const HOST_NAME: &str = "HostName";
const DEVICE_ID: &str = "DeviceId";
const MODULE_ID: &str = "ModuleId";
const SHARED_ACCESS_KEY_NAME: &str = "SharedAccessKeyName";
const SHARED_ACCESS_KEY: &str = "SharedAccessKey";
const SHARED_ACCESS_SIGNATURE: &str = "SharedAccessSignature";
const GATEWAY_HOST_NAME: &str = "GatewayHostName";

/// A parsed connection string.
///
/// # Examples
///
/// ```rust
/// use hublink::client::ConnectionString;
///
/// let cs: ConnectionString =
///     "HostName=acme.example.net;DeviceId=pump-3;SharedAccessKey=a2V5".parse().unwrap();
/// assert_eq!(cs.host_name(), "acme.example.net");
/// assert_eq!(cs.device_id(), "pump-3");
/// assert!(cs.module_id().is_none());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    host_name: String,
    device_id: String,
    module_id: Option<String>,
    shared_access_key_name: Option<String>,
    shared_access_key: Option<String>,
    shared_access_signature: Option<String>,
    gateway_host_name: Option<String>,
}

impl ConnectionString {
    /// Parses a connection string.
    ///
    /// Keys are case-sensitive. Values may contain `=`; the first `=` in a
    /// segment separates key from value. Empty segments are skipped.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MalformedSegment`] for a segment without `=`, with an
    ///   empty value, or with an unknown key.
    /// - [`ConfigError::MissingField`] if `HostName`, `DeviceId` or a
    ///   credential (`SharedAccessKey` or `SharedAccessSignature`) is absent.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut host_name = None;
        let mut device_id = None;
        let mut module_id = None;
        let mut shared_access_key_name = None;
        let mut shared_access_key = None;
        let mut shared_access_signature = None;
        let mut gateway_host_name = None;

        for segment in input.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let Some((key, value)) = segment.split_once('=') else {
                return Err(malformed(segment));
            };
            let (key, value) = (key.trim(), value.trim());
            if value.is_empty() {
                return Err(malformed(segment));
            }

            let slot = match key {
                HOST_NAME => &mut host_name,
                DEVICE_ID => &mut device_id,
                MODULE_ID => &mut module_id,
                SHARED_ACCESS_KEY_NAME => &mut shared_access_key_name,
                SHARED_ACCESS_KEY => &mut shared_access_key,
                SHARED_ACCESS_SIGNATURE => &mut shared_access_signature,
                GATEWAY_HOST_NAME => &mut gateway_host_name,
                _ => return Err(malformed(segment)),
            };
            *slot = Some(value.to_string());
        }

        let host_name = host_name.ok_or(ConfigError::MissingField { field: HOST_NAME })?;
        let device_id = device_id.ok_or(ConfigError::MissingField { field: DEVICE_ID })?;
        if shared_access_key.is_none() && shared_access_signature.is_none() {
            return Err(ConfigError::MissingField {
                field: SHARED_ACCESS_KEY,
            });
        }

        Ok(Self {
            host_name,
            device_id,
            module_id,
            shared_access_key_name,
            shared_access_key,
            shared_access_signature,
            gateway_host_name,
        })
    }

    /// Parses a connection string for a device-level client.
    ///
    /// # Errors
    ///
    /// As [`parse`](Self::parse), plus [`ConfigError::ModuleIdNotAllowed`]
    /// if the string names a module.
    pub fn parse_device(input: &str) -> Result<Self, ConfigError> {
        let parsed = Self::parse(input)?;
        if parsed.module_id.is_some() {
            return Err(ConfigError::ModuleIdNotAllowed);
        }
        Ok(parsed)
    }

    /// Hub host name.
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Device identity.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Module identity, for module-scoped strings.
    pub fn module_id(&self) -> Option<&str> {
        self.module_id.as_deref()
    }

    /// Shared access policy name.
    pub fn shared_access_key_name(&self) -> Option<&str> {
        self.shared_access_key_name.as_deref()
    }

    /// Shared access key.
    pub fn shared_access_key(&self) -> Option<&str> {
        self.shared_access_key.as_deref()
    }

    /// Pre-generated shared access signature.
    pub fn shared_access_signature(&self) -> Option<&str> {
        self.shared_access_signature.as_deref()
    }

    /// Edge gateway to connect through instead of the hub.
    pub fn gateway_host_name(&self) -> Option<&str> {
        self.gateway_host_name.as_deref()
    }

    /// The host the transport should connect to.
    pub fn target_host(&self) -> &str {
        self.gateway_host_name.as_deref().unwrap_or(&self.host_name)
    }
}

/// Builds a malformed-segment error without echoing secret values.
fn malformed(segment: &str) -> ConfigError {
    let key = segment.split_once('=').map_or(segment, |(key, _)| key).trim();
    let shown = match key {
        SHARED_ACCESS_KEY | SHARED_ACCESS_SIGNATURE => format!("{key}=<redacted>"),
        _ => segment.to_string(),
    };
    ConfigError::MalformedSegment { segment: shown }
}

impl FromStr for ConnectionString {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Credentials stay out of logs.
impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("host_name", &self.host_name)
            .field("device_id", &self.device_id)
            .field("module_id", &self.module_id)
            .field("shared_access_key_name", &self.shared_access_key_name)
            .field("shared_access_key", &self.shared_access_key.as_ref().map(|_| "<redacted>"))
            .field(
                "shared_access_signature",
                &self.shared_access_signature.as_ref().map(|_| "<redacted>"),
            )
            .field("gateway_host_name", &self.gateway_host_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE: &str = "HostName=acme.example.net;DeviceId=pump-3;SharedAccessKey=a2V5PT0=";

    #[test]
    fn test_parse_device_string() {
        let cs = ConnectionString::parse_device(DEVICE).unwrap();
        assert_eq!(cs.host_name(), "acme.example.net");
        assert_eq!(cs.device_id(), "pump-3");
        assert_eq!(cs.shared_access_key(), Some("a2V5PT0="));
        assert_eq!(cs.target_host(), "acme.example.net");
    }

    #[test]
    fn test_module_id_rejected_for_device() {
        let input = format!("{DEVICE};ModuleId=filter");
        assert_eq!(
            ConnectionString::parse_device(&input),
            Err(ConfigError::ModuleIdNotAllowed)
        );

        let cs = ConnectionString::parse(&input).unwrap();
        assert_eq!(cs.module_id(), Some("filter"));
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            ConnectionString::parse("DeviceId=x;SharedAccessKey=k"),
            Err(ConfigError::MissingField { field: "HostName" })
        );
        assert_eq!(
            ConnectionString::parse("HostName=h;DeviceId=x"),
            Err(ConfigError::MissingField {
                field: "SharedAccessKey"
            })
        );
    }

    #[test]
    fn test_signature_is_a_credential() {
        let cs = ConnectionString::parse(
            "HostName=h;DeviceId=d;SharedAccessSignature=SharedAccessSignature sr=h&sig=abc",
        )
        .unwrap();
        assert!(cs.shared_access_signature().unwrap().contains("sig=abc"));
    }

    #[test]
    fn test_gateway_overrides_target() {
        let cs = "HostName=h;DeviceId=d;SharedAccessKey=k;GatewayHostName=edge.local"
            .parse::<ConnectionString>()
            .unwrap();
        assert_eq!(cs.target_host(), "edge.local");
    }

    #[test]
    fn test_malformed_segments() {
        assert!(matches!(
            ConnectionString::parse("HostName=h;DeviceId"),
            Err(ConfigError::MalformedSegment { .. })
        ));
        assert!(matches!(
            ConnectionString::parse("HostName=h;Color=blue"),
            Err(ConfigError::MalformedSegment { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let cs = ConnectionString::parse(DEVICE).unwrap();
        let debug = format!("{cs:?}");
        assert!(!debug.contains("a2V5PT0="));
        assert!(debug.contains("<redacted>"));
    }
}
