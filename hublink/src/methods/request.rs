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

//! Inbound method requests.

use super::MethodError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::OnceLock;

/// A device method invocation delivered by the pipeline.
///
/// The body is kept as raw bytes. Its JSON form is parsed on first use and
/// cached; an empty body is treated as `{}`.
///
/// # Examples
///
/// ```rust
/// use hublink::methods::MethodRequest;
///
/// let request = MethodRequest::new("reboot", "rid-1", br#"{"delay":5}"#.to_vec());
/// assert_eq!(request.name(), "reboot");
/// assert_eq!(request.json().unwrap()["delay"], 5);
///
/// let empty = MethodRequest::new("ping", "rid-2", Vec::new());
/// assert!(empty.json().unwrap().as_object().unwrap().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct MethodRequest {
    name: String,
    request_id: String,
    body: Vec<u8>,
    parsed: OnceLock<Option<Value>>,
}

impl MethodRequest {
    /// Creates a request.
    pub fn new(
        name: impl Into<String>,
        request_id: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            request_id: request_id.into(),
            body: body.into(),
            parsed: OnceLock::new(),
        }
    }

    /// Method name. Matching is case-sensitive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Correlation ID echoed back on the response.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8 text, if it is valid UTF-8.
    pub fn data_as_json(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Parsed body.
    ///
    /// # Errors
    ///
    /// Returns [`MethodError::InvalidRequestBody`] if the body is not empty
    /// and is not valid JSON.
    pub fn json(&self) -> Result<&Value, MethodError> {
        self.parsed
            .get_or_init(|| {
                if self.body.is_empty() {
                    Some(Value::Object(Default::default()))
                } else {
                    serde_json::from_slice(&self.body).ok()
                }
            })
            .as_ref()
            .ok_or_else(|| MethodError::InvalidRequestBody {
                reason: self.parse_failure(),
            })
    }

    /// Returns `true` if [`json`](Self::json) succeeds.
    pub fn is_valid_json(&self) -> bool {
        self.json().is_ok()
    }

    /// Deserializes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`MethodError::InvalidRequestBody`] if the body is malformed
    /// or does not match `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, MethodError> {
        let value = self.json()?.clone();
        serde_json::from_value(value).map_err(|error| MethodError::InvalidRequestBody {
            reason: error.to_string(),
        })
    }

    fn parse_failure(&self) -> String {
        match serde_json::from_slice::<serde::de::IgnoredAny>(&self.body) {
            Err(error) => error.to_string(),
            Ok(_) => "unparseable body".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_accessors() {
        let request = MethodRequest::new("getTemp", "42", b"{}".to_vec());
        assert_eq!(request.name(), "getTemp");
        assert_eq!(request.request_id(), "42");
        assert_eq!(request.body(), b"{}");
        assert_eq!(request.data_as_json(), Some("{}"));
    }

    #[test]
    fn test_empty_body_is_empty_object() {
        let request = MethodRequest::new("ping", "1", Vec::new());
        assert_eq!(request.json().unwrap(), &Value::Object(Default::default()));
    }

    #[test]
    fn test_malformed_body() {
        let request = MethodRequest::new("ping", "1", b"{key".to_vec());
        assert!(!request.is_valid_json());
        assert!(matches!(request.json(), Err(MethodError::InvalidRequestBody { .. })));
    }

    #[test]
    fn test_scalar_body_is_valid() {
        let request = MethodRequest::new("setLevel", "1", b"7".to_vec());
        assert_eq!(request.json().unwrap(), &Value::from(7));
    }

    #[test]
    fn test_parse_typed() {
        #[derive(Deserialize)]
        struct Reboot {
            delay: u32,
        }

        let request = MethodRequest::new("reboot", "1", br#"{"delay":30}"#.to_vec());
        let reboot: Reboot = request.parse().unwrap();
        assert_eq!(reboot.delay, 30);

        let wrong = MethodRequest::new("reboot", "1", br#"{"delay":"soon"}"#.to_vec());
        assert!(wrong.parse::<Reboot>().is_err());
    }
}
