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

//! Telemetry and cloud-to-device messages carried by the pipeline.

use std::collections::HashMap;

/// A telemetry or cloud-to-device message.
///
/// The control plane treats the body as opaque bytes; application
/// properties travel alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Message body
    pub body: Vec<u8>,
    /// Application properties
    pub properties: HashMap<String, String>,
    /// Optional message ID set by the sender
    pub message_id: Option<String>,
}

impl Message {
    /// Creates a message with the given body and no properties.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    /// Adds an application property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Sets the message ID.
    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }
}
