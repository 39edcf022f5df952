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

//! Configuration errors raised by the client facade.

use crate::transport::{TransportFamily, TransportType};
use thiserror::Error;

/// A rejected configuration value.
///
/// Configuration errors are raised synchronously at the call site and leave
/// the previously valid configuration untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Diagnostic sampling percentage outside `0..=100`.
    #[error("diagnostic sampling percentage {value} is outside 0..=100")]
    DiagnosticSamplingOutOfRange {
        /// The rejected value
        value: i32,
    },

    /// Diagnostic sampling requested on a transport that cannot carry it.
    #[error("{transport} protocol doesn't support E2E diagnostic.")]
    DiagnosticsNotSupported {
        /// The first configured transport lacking support
        transport: TransportType,
    },

    /// A device-level client was given a module-scoped connection string.
    #[error("connection string contains a ModuleId; use a module client for module identities")]
    ModuleIdNotAllowed,

    /// A required connection string key is absent.
    #[error("connection string is missing {field}")]
    MissingField {
        /// Name of the missing key
        field: &'static str,
    },

    /// A connection string segment is not `Key=Value` or uses an unknown key.
    #[error("malformed connection string segment '{segment}'")]
    MalformedSegment {
        /// The offending segment with any secret value removed
        segment: String,
    },

    /// A client was built with an empty transport list.
    #[error("at least one transport setting is required")]
    EmptyTransportSettings,

    /// A transport type was used with settings for another protocol family.
    #[error("transport type {actual} does not belong to the {expected:?} family")]
    MismatchedTransport {
        /// Family the settings constructor expects
        expected: TransportFamily,
        /// Transport type that was supplied
        actual: TransportType,
    },
}
