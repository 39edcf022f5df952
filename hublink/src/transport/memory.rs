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

//! In-process pipeline for tests and demos.
//!
//! [`MemoryPipeline`] implements the full [`TransportPipeline`] contract
//! without any I/O. It records every call it receives, can be told to fail
//! selected operations, and can inject inbound method requests and
//! connection events into the attached client.

use crate::connection::{ConnectionEvent, ConnectionStatus, ConnectionStatusChangeReason};
use crate::methods::{MethodRequest, OutboundMethodResponse};
use crate::transport::{
    ConnectionType, Message, OperationToken, PipelineEventHandler, SourceId, TransportError,
    TransportPipeline,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

#[cfg(feature = "observability")]
use tracing::debug;

/// Failure count meaning "fail every call".
pub const FAIL_ALWAYS: u32 = u32::MAX;

/// A pipeline operation as seen by [`MemoryPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOperation {
    /// `open`
    Open {
        /// Whether the caller asked for a transport-level timeout
        use_timeout: bool,
    },
    /// `close`
    Close,
    /// `send_event`
    SendEvent,
    /// `receive`
    Receive,
    /// `enable_methods`
    EnableMethods,
    /// `disable_methods`
    DisableMethods,
    /// `send_method_response`
    SendMethodResponse,
    /// `recover_connections`
    RecoverConnections {
        /// The sub-channel being recovered
        connection_type: ConnectionType,
    },
}

/// One recorded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineCall {
    /// The operation invoked
    pub operation: PipelineOperation,
    /// Whether the token handed to the operation could be cancelled
    pub cancelable: bool,
}

#[derive(Debug, Default)]
struct FailureBudget {
    open: u32,
    enable: u32,
    disable: u32,
    recover: u32,
}

/// Consumes one unit of a failure budget, returning `true` if the call
/// should fail.
fn take_failure(remaining: &mut u32) -> bool {
    match *remaining {
        0 => false,
        FAIL_ALWAYS => true,
        _ => {
            *remaining -= 1;
            true
        }
    }
}

#[derive(Debug, Default)]
struct State {
    open: bool,
    methods_enabled: bool,
    calls: Vec<PipelineCall>,
    responses: Vec<OutboundMethodResponse>,
    sent: Vec<Message>,
    inbound: VecDeque<Message>,
    failures: FailureBudget,
    latency: Duration,
    announce_recovery: bool,
}

/// In-process [`TransportPipeline`].
///
/// Every operation completes immediately (or after the configured
/// [latency](Self::set_latency)) and is wrapped in the token it receives, so
/// cancellation and timeouts behave as they would against a real transport.
///
/// # Examples
///
/// ```rust
/// use hublink::transport::{MemoryPipeline, Message, OperationToken, TransportPipeline};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = MemoryPipeline::new();
/// pipeline.open(true, OperationToken::none()).await?;
///
/// pipeline.push_inbound(Message::new(b"reboot".to_vec()));
/// let message = pipeline.receive(OperationToken::none()).await?;
/// assert_eq!(message.map(|m| m.body), Some(b"reboot".to_vec()));
/// # Ok(())
/// # }
/// ```
pub struct MemoryPipeline {
    name: String,
    source: SourceId,
    state: Mutex<State>,
    handler: RwLock<Option<Weak<dyn PipelineEventHandler>>>,
}

impl MemoryPipeline {
    /// Creates a pipeline named `"memory"`.
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Creates a pipeline with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: SourceId::next(),
            state: Mutex::new(State::default()),
            handler: RwLock::new(None),
        }
    }

    /// The source ID this pipeline reports events under.
    pub fn source_id(&self) -> SourceId {
        self.source
    }

    /// Returns `true` between a successful `open` and the next `close`.
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Returns `true` while method delivery is enabled.
    pub fn methods_enabled(&self) -> bool {
        self.state.lock().methods_enabled
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<PipelineCall> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&PipelineOperation) -> bool) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| predicate(&call.operation))
            .count()
    }

    /// Number of `enable_methods` calls.
    pub fn enable_calls(&self) -> usize {
        self.count(|op| matches!(op, PipelineOperation::EnableMethods))
    }

    /// Number of `disable_methods` calls.
    pub fn disable_calls(&self) -> usize {
        self.count(|op| matches!(op, PipelineOperation::DisableMethods))
    }

    /// Number of `recover_connections` calls.
    pub fn recover_calls(&self) -> usize {
        self.count(|op| matches!(op, PipelineOperation::RecoverConnections { .. }))
    }

    /// Method responses sent so far.
    pub fn responses(&self) -> Vec<OutboundMethodResponse> {
        self.state.lock().responses.clone()
    }

    /// Telemetry messages sent so far.
    pub fn sent_events(&self) -> Vec<Message> {
        self.state.lock().sent.clone()
    }

    /// Queues a message for the next `receive`.
    pub fn push_inbound(&self, message: Message) {
        self.state.lock().inbound.push_back(message);
    }

    /// Makes the next `times` calls to `open` fail. [`FAIL_ALWAYS`] never
    /// stops failing; `0` clears the knob.
    pub fn fail_open(&self, times: u32) {
        self.state.lock().failures.open = times;
    }

    /// Makes the next `times` calls to `enable_methods` fail.
    pub fn fail_enable_methods(&self, times: u32) {
        self.state.lock().failures.enable = times;
    }

    /// Makes the next `times` calls to `disable_methods` fail.
    pub fn fail_disable_methods(&self, times: u32) {
        self.state.lock().failures.disable = times;
    }

    /// Makes the next `times` calls to `recover_connections` fail.
    pub fn fail_recovery(&self, times: u32) {
        self.state.lock().failures.recover = times;
    }

    /// Delays every operation by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// When enabled, a successful recovery reports the sub-channel as
    /// `Connected`/`ConnectionOk` to the attached handler.
    pub fn announce_recovery(&self, enabled: bool) {
        self.state.lock().announce_recovery = enabled;
    }

    /// Clears the call, response and event logs.
    pub fn clear_log(&self) {
        let mut state = self.state.lock();
        state.calls.clear();
        state.responses.clear();
        state.sent.clear();
    }

    fn handler(&self) -> Option<Arc<dyn PipelineEventHandler>> {
        self.handler.read().as_ref().and_then(Weak::upgrade)
    }

    /// Delivers an inbound method request to the attached handler.
    ///
    /// Returns `false` if no handler is attached.
    pub async fn deliver_method(&self, request: Option<MethodRequest>) -> bool {
        match self.handler() {
            Some(handler) => {
                handler.on_method_called(request).await;
                true
            }
            None => false,
        }
    }

    /// Reports a sub-channel as opened.
    pub fn emit_opened(
        &self,
        connection_type: ConnectionType,
        status: ConnectionStatus,
        reason: ConnectionStatusChangeReason,
    ) -> bool {
        match self.handler() {
            Some(handler) => {
                handler.on_connection_opened(
                    self.source,
                    ConnectionEvent::new(connection_type, status, reason),
                );
                true
            }
            None => false,
        }
    }

    /// Reports a sub-channel as closed and waits for the client to finish
    /// reacting, recovery included.
    pub async fn emit_closed(
        &self,
        connection_type: ConnectionType,
        status: ConnectionStatus,
        reason: ConnectionStatusChangeReason,
    ) -> bool {
        match self.handler() {
            Some(handler) => {
                handler
                    .on_connection_closed(
                        self.source,
                        ConnectionEvent::new(connection_type, status, reason),
                    )
                    .await;
                true
            }
            None => false,
        }
    }

    /// Records the call and returns the configured latency.
    fn record(&self, operation: PipelineOperation, token: &OperationToken) -> Duration {
        let mut state = self.state.lock();
        state.calls.push(PipelineCall {
            operation,
            cancelable: token.can_be_canceled(),
        });
        state.latency
    }

    async fn delay(latency: Duration) {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MemoryPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryPipeline")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("open", &state.open)
            .field("methods_enabled", &state.methods_enabled)
            .field("calls", &state.calls.len())
            .finish()
    }
}

#[async_trait]
impl TransportPipeline for MemoryPipeline {
    fn attach(&self, handler: Weak<dyn PipelineEventHandler>) {
        *self.handler.write() = Some(handler);
    }

    async fn open(&self, use_timeout: bool, token: OperationToken) -> Result<(), TransportError> {
        let latency = self.record(PipelineOperation::Open { use_timeout }, &token);
        token
            .run(async {
                Self::delay(latency).await;
                let mut state = self.state.lock();
                if take_failure(&mut state.failures.open) {
                    return Err(TransportError::connection_failed(&self.name, "injected failure"));
                }
                state.open = true;
                Ok(())
            })
            .await?;

        #[cfg(feature = "observability")]
        debug!(pipeline = %self.name, "memory pipeline opened");
        Ok(())
    }

    async fn close(&self, token: OperationToken) -> Result<(), TransportError> {
        self.record(PipelineOperation::Close, &token);
        let mut state = self.state.lock();
        state.open = false;
        state.methods_enabled = false;
        Ok(())
    }

    async fn send_event(&self, message: Message, token: OperationToken) -> Result<(), TransportError> {
        let latency = self.record(PipelineOperation::SendEvent, &token);
        token
            .run(async {
                Self::delay(latency).await;
                let mut state = self.state.lock();
                if !state.open {
                    return Err(TransportError::NotConnected);
                }
                state.sent.push(message);
                Ok(())
            })
            .await
    }

    async fn receive(&self, token: OperationToken) -> Result<Option<Message>, TransportError> {
        let latency = self.record(PipelineOperation::Receive, &token);
        token
            .run(async {
                Self::delay(latency).await;
                let mut state = self.state.lock();
                if !state.open {
                    return Err(TransportError::NotConnected);
                }
                Ok(state.inbound.pop_front())
            })
            .await
    }

    async fn enable_methods(&self, token: OperationToken) -> Result<(), TransportError> {
        let latency = self.record(PipelineOperation::EnableMethods, &token);
        token
            .run(async {
                Self::delay(latency).await;
                let mut state = self.state.lock();
                if take_failure(&mut state.failures.enable) {
                    return Err(TransportError::connection_lost("injected enable failure"));
                }
                state.methods_enabled = true;
                Ok(())
            })
            .await
    }

    async fn disable_methods(&self, token: OperationToken) -> Result<(), TransportError> {
        let latency = self.record(PipelineOperation::DisableMethods, &token);
        token
            .run(async {
                Self::delay(latency).await;
                let mut state = self.state.lock();
                if take_failure(&mut state.failures.disable) {
                    return Err(TransportError::connection_lost("injected disable failure"));
                }
                state.methods_enabled = false;
                Ok(())
            })
            .await
    }

    async fn send_method_response(
        &self,
        response: OutboundMethodResponse,
        token: OperationToken,
    ) -> Result<(), TransportError> {
        let latency = self.record(PipelineOperation::SendMethodResponse, &token);
        token
            .run(async {
                Self::delay(latency).await;
                self.state.lock().responses.push(response);
                Ok(())
            })
            .await
    }

    async fn recover_connections(
        &self,
        _source: SourceId,
        connection_type: ConnectionType,
        token: OperationToken,
    ) -> Result<(), TransportError> {
        let latency = self.record(PipelineOperation::RecoverConnections { connection_type }, &token);
        let announce = token
            .run(async {
                Self::delay(latency).await;
                let mut state = self.state.lock();
                if take_failure(&mut state.failures.recover) {
                    return Err(TransportError::connection_lost(format!(
                        "injected {connection_type} recovery failure"
                    )));
                }
                state.open = true;
                Ok(state.announce_recovery)
            })
            .await?;

        #[cfg(feature = "observability")]
        debug!(pipeline = %self.name, connection_type = %connection_type, "memory pipeline recovered");

        if announce {
            self.emit_opened(
                connection_type,
                ConnectionStatus::Connected,
                ConnectionStatusChangeReason::ConnectionOk,
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
