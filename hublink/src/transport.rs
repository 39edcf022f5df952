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

//! Transport pipeline boundary.
//!
//! The client never talks to a wire protocol directly. It drives a
//! [`TransportPipeline`]: an ordered chain of layers, each able to act on an
//! operation before forwarding it inward. The client holds only the
//! outermost layer (through a [`PipelineHandle`]) and receives inbound
//! traffic through the [`PipelineEventHandler`] it attaches.
//!
//! # Operations
//!
//! | Operation               | Direction        | Notes                                   |
//! |-------------------------|------------------|-----------------------------------------|
//! | `open` / `close`        | client → hub     | `open` is retried by [`RetryPipeline`]  |
//! | `send_event`/`receive`  | client ↔ hub     | telemetry and cloud-to-device messages  |
//! | `enable_methods`        | client → hub     | only on the first handler registration  |
//! | `disable_methods`       | client → hub     | only on the last handler removal        |
//! | `send_method_response`  | client → hub     | once per dispatched request             |
//! | `recover_connections`   | client → hub     | driven by the connection state machine  |
//!
//! # Events
//!
//! Pipelines call back into the client with method requests and
//! opened/closed notifications carrying a [`ConnectionType`] and the
//! resulting status and reason. The client never polls.
//!
//! # Implementations
//!
//! - [`MemoryPipeline`]: in-process pipeline for tests and demos
//! - [`RetryPipeline`]: delegating layer applying the client's retry policy
//! - [`DetachedPipeline`]: placeholder used before a pipeline is installed
//!
//! # Cancellation
//!
//! Every operation receives an [`OperationToken`]. With an operation timeout
//! of `0` the token is non-cancelable; see [`OperationToken::none`].

mod detached;
mod error;
pub mod memory;
mod message;
mod retry;
mod token;
mod traits;
mod types;

pub use detached::DetachedPipeline;
pub use error::TransportError;
pub use memory::{MemoryPipeline, PipelineCall, PipelineOperation};
pub use message::Message;
pub use retry::RetryPipeline;
pub use token::OperationToken;
pub use traits::{PipelineEventHandler, PipelineHandle, SourceId, TransportPipeline};
pub use types::{ConnectionType, TransportFamily, TransportSettings, TransportType};
