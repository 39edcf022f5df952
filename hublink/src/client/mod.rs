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

//! The client facade applications hold.
//!
//! [`DeviceClient`] validates and stores configuration and hands everything
//! else to the method dispatcher, the connection state machine and the
//! transport pipeline.
//!
//! # Configuration
//!
//! | Setting                         | Default   | Validation                                  |
//! |---------------------------------|-----------|---------------------------------------------|
//! | operation timeout (ms)          | 240000    | any value; `0` disables the timeout         |
//! | diagnostic sampling percentage  | 0         | `0..=100`, and `> 0` needs transport support |
//! | product info                    | empty     | none                                        |
//! | retry policy                    | bounded exponential backoff | none                      |
//!
//! A rejected setting leaves the previous value in place.

mod config;
mod connection_string;
mod device_client;
mod error;

pub use crate::transport::Message;
pub use config::{
    ClientOptions, DEFAULT_DIAGNOSTIC_SAMPLING_PERCENTAGE, DEFAULT_OPERATION_TIMEOUT_MS,
    MAX_DIAGNOSTIC_SAMPLING_PERCENTAGE, OperationTimeout, validate_diagnostic_sampling,
};
pub use connection_string::ConnectionString;
pub use device_client::{DeviceClient, DeviceClientBuilder};
pub use error::ConfigError;
