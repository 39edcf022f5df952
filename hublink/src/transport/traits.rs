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

use crate::connection::ConnectionEvent;
use crate::methods::{MethodRequest, OutboundMethodResponse};
use crate::transport::{ConnectionType, Message, OperationToken, TransportError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Global counter for generating unique source IDs.
static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the pipeline layer that raised a connection event.
///
/// The connection state machine hands the same ID back to
/// [`TransportPipeline::recover_connections`] so the pipeline knows which of
/// its layers reported the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    /// Allocates a fresh, process-unique source ID.
    pub fn next() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a source ID from a raw value.
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source({})", self.0)
    }
}

/// The transport pipeline the client drives.
///
/// A pipeline is an ordered chain of layers. The client only ever holds the
/// outermost layer; each layer may act on an operation and then forward it
/// inward (see [`RetryPipeline`](crate::transport::RetryPipeline)). Concrete
/// wire transports live behind this trait and are not part of this crate.
///
/// Every operation receives an [`OperationToken`]. When the client's operation
/// timeout is `0` the token is non-cancelable and the layer must not treat it
/// as already expired.
///
/// # Examples
///
/// ```rust
/// use hublink::transport::{MemoryPipeline, TransportPipeline, OperationToken};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = MemoryPipeline::new();
/// pipeline.open(true, OperationToken::none()).await?;
/// pipeline.enable_methods(OperationToken::none()).await?;
/// assert!(pipeline.methods_enabled());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TransportPipeline: Send + Sync {
    /// Hands the pipeline the handler it reports inbound events to.
    ///
    /// Called by the client whenever this pipeline becomes its outermost
    /// layer. Delegating layers forward the handler inward.
    fn attach(&self, _handler: Weak<dyn PipelineEventHandler>) {}

    /// Opens all sub-channels.
    ///
    /// `use_timeout` is `false` when the caller wants the open to wait as long
    /// as the token allows rather than applying a transport-level timeout.
    async fn open(&self, use_timeout: bool, token: OperationToken) -> Result<(), TransportError>;

    /// Closes all sub-channels.
    async fn close(&self, token: OperationToken) -> Result<(), TransportError>;

    /// Sends a device-to-cloud telemetry message.
    async fn send_event(&self, message: Message, token: OperationToken) -> Result<(), TransportError>;

    /// Receives the next cloud-to-device message, if one is available.
    async fn receive(&self, token: OperationToken) -> Result<Option<Message>, TransportError>;

    /// Subscribes to inbound method requests. Idempotent.
    async fn enable_methods(&self, token: OperationToken) -> Result<(), TransportError>;

    /// Unsubscribes from inbound method requests. Idempotent.
    async fn disable_methods(&self, token: OperationToken) -> Result<(), TransportError>;

    /// Sends the response to a previously delivered method request.
    async fn send_method_response(
        &self,
        response: OutboundMethodResponse,
        token: OperationToken,
    ) -> Result<(), TransportError>;

    /// Attempts to restore the sub-channel identified by `connection_type`.
    ///
    /// `source` is the layer that reported the failure.
    async fn recover_connections(
        &self,
        source: SourceId,
        connection_type: ConnectionType,
        token: OperationToken,
    ) -> Result<(), TransportError>;

    /// Human-readable name of this layer, used in logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<P: TransportPipeline + ?Sized> TransportPipeline for Arc<P> {
    fn attach(&self, handler: Weak<dyn PipelineEventHandler>) {
        (**self).attach(handler);
    }

    async fn open(&self, use_timeout: bool, token: OperationToken) -> Result<(), TransportError> {
        (**self).open(use_timeout, token).await
    }

    async fn close(&self, token: OperationToken) -> Result<(), TransportError> {
        (**self).close(token).await
    }

    async fn send_event(&self, message: Message, token: OperationToken) -> Result<(), TransportError> {
        (**self).send_event(message, token).await
    }

    async fn receive(&self, token: OperationToken) -> Result<Option<Message>, TransportError> {
        (**self).receive(token).await
    }

    async fn enable_methods(&self, token: OperationToken) -> Result<(), TransportError> {
        (**self).enable_methods(token).await
    }

    async fn disable_methods(&self, token: OperationToken) -> Result<(), TransportError> {
        (**self).disable_methods(token).await
    }

    async fn send_method_response(
        &self,
        response: OutboundMethodResponse,
        token: OperationToken,
    ) -> Result<(), TransportError> {
        (**self).send_method_response(response, token).await
    }

    async fn recover_connections(
        &self,
        source: SourceId,
        connection_type: ConnectionType,
        token: OperationToken,
    ) -> Result<(), TransportError> {
        (**self).recover_connections(source, connection_type, token).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Receiver of events raised by the pipeline.
///
/// Implemented by the client. Pipelines never poll the client; they call
/// into this handler when a method request arrives or a sub-channel opens or
/// closes. None of these calls return errors: every failure is handled on
/// the client side.
#[async_trait]
pub trait PipelineEventHandler: Send + Sync {
    /// Called once per inbound method request.
    ///
    /// `None` represents a discarded or cancelled delivery and is ignored.
    async fn on_method_called(&self, request: Option<MethodRequest>);

    /// Called when a sub-channel reaches an open or connected condition.
    fn on_connection_opened(&self, source: SourceId, event: ConnectionEvent);

    /// Called when a sub-channel closes or fails.
    async fn on_connection_closed(&self, source: SourceId, event: ConnectionEvent);
}

/// Holder of the outermost pipeline layer.
///
/// The dispatcher, the state machine and the client share one handle, so
/// replacing the pipeline is seen by all of them at once.
pub struct PipelineHandle {
    current: RwLock<Arc<dyn TransportPipeline>>,
}

impl PipelineHandle {
    /// Creates a handle around `pipeline`.
    pub fn new(pipeline: Arc<dyn TransportPipeline>) -> Self {
        Self {
            current: RwLock::new(pipeline),
        }
    }

    /// Returns the current outermost layer.
    pub fn current(&self) -> Arc<dyn TransportPipeline> {
        self.current.read().clone()
    }

    /// Replaces the outermost layer, returning the previous one.
    pub fn replace(&self, pipeline: Arc<dyn TransportPipeline>) -> Arc<dyn TransportPipeline> {
        std::mem::replace(&mut *self.current.write(), pipeline)
    }
}

impl fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("current", &self.current.read().name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryPipeline;

    #[test]
    fn test_source_ids_are_unique() {
        let a = SourceId::next();
        let b = SourceId::next();
        assert_ne!(a, b);
        assert_eq!(SourceId::from_raw(a.as_u64()), a);
        assert_eq!(SourceId::from_raw(9).to_string(), "Source(9)");
    }

    #[test]
    fn test_handle_replace() {
        let first: Arc<dyn TransportPipeline> = Arc::new(MemoryPipeline::named("first"));
        let second: Arc<dyn TransportPipeline> = Arc::new(MemoryPipeline::named("second"));

        let handle = PipelineHandle::new(first);
        assert_eq!(handle.current().name(), "first");

        let previous = handle.replace(second);
        assert_eq!(previous.name(), "first");
        assert_eq!(handle.current().name(), "second");
    }
}
