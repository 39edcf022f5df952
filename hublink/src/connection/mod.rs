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

//! Connection status tracking and recovery.
//!
//! The pipeline reports each sub-channel's transitions as
//! [`ConnectionEvent`]s. The [`ConnectionStateMachine`] folds them into one
//! externally visible (status, reason) pair, forwards changes to a single
//! subscriber and asks the pipeline to recover failed sub-channels.
//!
//! # States
//!
//! ```text
//!  Disabled ──open──▶ Connecting ──▶ Connected
//!     ▲                                  │ closed
//!     │ close                            ▼
//!     └──────────────────────── DisconnectedRetrying ──recovery fails──▶ Disconnected
//! ```
//!
//! `Disconnected` with reason `RetryExpired` is terminal for automatic
//! recovery; the application may still reopen the client.

mod state;
mod status;

pub use crate::transport::SourceId;
pub use state::{ConnectionStateMachine, StatusChangeHandler};
pub use status::{ConnectionEvent, ConnectionStatus, ConnectionStatusChangeReason};
