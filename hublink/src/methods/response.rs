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

//! Method responses and the status codes the dispatcher produces itself.

use super::MethodError;
use serde::Serialize;
use serde::de::IgnoredAny;

/// Status sent when the request body is not valid JSON.
pub const STATUS_BAD_REQUEST: i32 = 400;

/// Status sent when the handler failed or produced a payload that is not
/// valid JSON.
pub const STATUS_USER_CODE_ERROR: i32 = 500;

/// Status sent when neither a named nor a default handler matches.
pub const STATUS_NOT_IMPLEMENTED: i32 = 501;

/// What a method handler returns.
///
/// The status code is chosen by the handler. A non-empty payload must be
/// valid JSON or the dispatcher replaces the whole response with an empty
/// [`STATUS_USER_CODE_ERROR`] response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodResponse {
    status: i32,
    payload: Vec<u8>,
}

impl MethodResponse {
    /// A response with no payload.
    pub fn new(status: i32) -> Self {
        Self {
            status,
            payload: Vec::new(),
        }
    }

    /// A response carrying `payload` as-is.
    pub fn with_payload(payload: impl Into<Vec<u8>>, status: i32) -> Self {
        Self {
            status,
            payload: payload.into(),
        }
    }

    /// A response whose payload is `value` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MethodError::InvalidResponseBody`] if serialization fails.
    pub fn from_json<T: Serialize + ?Sized>(value: &T, status: i32) -> Result<Self, MethodError> {
        let payload = serde_json::to_vec(value).map_err(|error| MethodError::InvalidResponseBody {
            reason: error.to_string(),
        })?;
        Ok(Self { status, payload })
    }

    /// Status code.
    pub fn status(&self) -> i32 {
        self.status
    }

    /// Payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns `true` if the payload is empty or valid JSON.
    pub fn has_valid_payload(&self) -> bool {
        self.payload.is_empty() || serde_json::from_slice::<IgnoredAny>(&self.payload).is_ok()
    }

    pub(crate) fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// A response on its way to the pipeline, tagged with the request it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMethodResponse {
    /// Status code
    pub status: i32,
    /// Payload bytes, empty or valid JSON
    pub payload: Vec<u8>,
    /// Correlation ID copied from the request
    pub request_id: String,
}

impl OutboundMethodResponse {
    /// Tags `response` with `request_id`.
    pub fn new(response: MethodResponse, request_id: impl Into<String>) -> Self {
        Self {
            status: response.status(),
            payload: response.into_payload(),
            request_id: request_id.into(),
        }
    }

    /// A payload-less response with the given status.
    pub fn status_only(status: i32, request_id: impl Into<String>) -> Self {
        Self::new(MethodResponse::new(status), request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let response = MethodResponse::from_json(&json!({"uptime": 12}), 200).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.payload(), br#"{"uptime":12}"#);
        assert!(response.has_valid_payload());
    }

    #[test]
    fn test_payload_validation() {
        assert!(MethodResponse::new(200).has_valid_payload());
        assert!(MethodResponse::with_payload(b"\"ok\"".to_vec(), 200).has_valid_payload());
        assert!(!MethodResponse::with_payload(b"{key".to_vec(), 200).has_valid_payload());
        assert!(!MethodResponse::with_payload(b"{} trailing".to_vec(), 200).has_valid_payload());
    }

    #[test]
    fn test_outbound_copies_request_id() {
        let outbound = OutboundMethodResponse::new(
            MethodResponse::with_payload(b"{}".to_vec(), 201),
            "rid-9",
        );
        assert_eq!(outbound.status, 201);
        assert_eq!(outbound.payload, b"{}");
        assert_eq!(outbound.request_id, "rid-9");

        let synthesized = OutboundMethodResponse::status_only(STATUS_NOT_IMPLEMENTED, "rid-10");
        assert!(synthesized.payload.is_empty());
        assert_eq!(synthesized.status, 501);
    }
}
