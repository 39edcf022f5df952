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

#![doc = include_str!("../../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! ## Architecture
//!
//! A [`DeviceClient`] is a thin facade over three collaborators:
//!
//! - **[`methods`]**: the method dispatcher. Keeps the name to handler
//!   registry, turns inbound requests into exactly one response and asks the
//!   pipeline to enable or disable method delivery on the first and last
//!   registration.
//! - **[`connection`]**: the connection state machine. Folds pipeline
//!   opened/closed events into a `(status, reason)` pair, drives recovery and
//!   notifies a single subscriber of each distinct change.
//! - **[`transport`]**: the pipeline contract both depend on, plus an
//!   in-process [`MemoryPipeline`](transport::MemoryPipeline) and a
//!   [`RetryPipeline`](transport::RetryPipeline) layer.
//!
//! [`retry`] holds the policies the retry layer consults and [`client`] the
//! configuration surface.
//!
//! ## Feature flags
//!
//! - `observability` (default): structured logging through `tracing`.

pub mod client;
pub mod connection;
pub mod error;
pub mod methods;
pub mod retry;
pub mod transport;

pub use client::{ClientOptions, ConfigError, ConnectionString, DeviceClient, DeviceClientBuilder};
pub use connection::{ConnectionStatus, ConnectionStatusChangeReason};
pub use error::HubError;
pub use methods::{MethodHandler, MethodRequest, MethodResponse, method_handler};
pub use retry::RetryPolicy;
pub use transport::{Message, TransportError, TransportPipeline, TransportType};
