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

//! Device methods: remote procedure calls from the hub to the device.
//!
//! The hub invokes a method by name with a JSON body and a correlation ID;
//! the device answers with a status code and an optional JSON payload. This
//! module holds the request and response types, the [`MethodHandler`] trait
//! user callbacks implement, and the [`MethodDispatcher`] that routes
//! inbound requests.
//!
//! # Handler Resolution
//!
//! A request goes to the handler registered under its exact (case-sensitive)
//! name. If there is none it goes to the default handler. If there is no
//! default handler either, the dispatcher answers 501 itself.
//!
//! # Status Codes Produced by the Dispatcher
//!
//! - [`STATUS_BAD_REQUEST`] (400): the request body is not valid JSON
//! - [`STATUS_USER_CODE_ERROR`] (500): the handler failed or returned a
//!   payload that is not valid JSON
//! - [`STATUS_NOT_IMPLEMENTED`] (501): no handler matched
//!
//! # Examples
//!
//! ```rust
//! use hublink::methods::{method_handler, HandlerError, MethodResponse};
//!
//! let get_uptime = method_handler(|_request, _context| async move {
//!     MethodResponse::from_json(&serde_json::json!({ "uptime": 3600 }), 200)
//!         .map_err(HandlerError::from)
//! });
//! ```

mod dispatcher;
mod error;
mod handler;
mod registry;
mod request;
mod response;

pub use dispatcher::MethodDispatcher;
pub use error::MethodError;
pub use handler::{HandlerError, MethodHandler, UserContext, method_handler};
pub use registry::{MethodRegistry, Registration};
pub use request::MethodRequest;
pub use response::{
    MethodResponse, OutboundMethodResponse, STATUS_BAD_REQUEST, STATUS_NOT_IMPLEMENTED,
    STATUS_USER_CODE_ERROR,
};
