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

//! Error types for method registration and payload handling.

use crate::transport::TransportError;
use thiserror::Error;

/// Errors raised by the method layer.
///
/// Dispatch never surfaces these to the pipeline: malformed requests and
/// bad handler output become 400 and 500 responses. They are returned from
/// registration calls and from the payload helpers on
/// [`MethodRequest`](super::MethodRequest) and
/// [`MethodResponse`](super::MethodResponse).
#[derive(Debug, Error)]
pub enum MethodError {
    /// A named handler was registered under an empty name.
    #[error("method name must not be empty")]
    EmptyName,

    /// A request body is not valid JSON or does not match the expected shape.
    #[error("invalid method request body: {reason}")]
    InvalidRequestBody {
        /// Parser message
        reason: String,
    },

    /// A response payload could not be produced as JSON.
    #[error("invalid method response body: {reason}")]
    InvalidResponseBody {
        /// Serializer message
        reason: String,
    },

    /// Enabling or disabling method delivery failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl MethodError {
    /// Returns `true` if the error came from the pipeline and a later attempt
    /// may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MethodError::Transport(error) if error.is_recoverable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(MethodError::EmptyName.to_string(), "method name must not be empty");
        let error = MethodError::InvalidRequestBody {
            reason: "EOF while parsing".to_string(),
        };
        assert!(error.to_string().contains("EOF while parsing"));
    }

    #[test]
    fn test_transport_conversion() {
        let error: MethodError = TransportError::NotConnected.into();
        assert!(matches!(error, MethodError::Transport(TransportError::NotConnected)));
        assert!(error.is_recoverable());
        assert!(!MethodError::EmptyName.is_recoverable());
    }
}
