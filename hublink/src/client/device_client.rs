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

//! The device client facade.

use super::config::validate_diagnostic_sampling;
use super::{ClientOptions, ConfigError, ConnectionString, OperationTimeout};
use crate::HubError;
use crate::connection::{
    ConnectionEvent, ConnectionStateMachine, ConnectionStatus, ConnectionStatusChangeReason,
    StatusChangeHandler,
};
use crate::methods::{MethodDispatcher, MethodHandler, MethodRequest, UserContext};
use crate::retry::{RetryPolicy, SharedRetryPolicy};
use crate::transport::{
    DetachedPipeline, Message, PipelineEventHandler, PipelineHandle, RetryPipeline, SourceId,
    TransportPipeline, TransportSettings, TransportType,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "observability")]
use tracing::{debug, info};

/// Transport used when none is configured.
const DEFAULT_TRANSPORT: TransportType = TransportType::Amqp;

#[derive(Debug)]
struct Settings {
    diagnostic_sampling_percentage: i32,
    product_info: String,
}

/// State shared by the facade and the pipeline's event callbacks.
struct ClientCore {
    connection_string: Option<ConnectionString>,
    transports: Vec<TransportSettings>,
    settings: RwLock<Settings>,
    timeout: Arc<OperationTimeout>,
    retry_policy: SharedRetryPolicy,
    pipeline: Arc<PipelineHandle>,
    dispatcher: MethodDispatcher,
    connection: ConnectionStateMachine,
}

impl ClientCore {
    fn attach(self: &Arc<Self>, pipeline: &Arc<dyn TransportPipeline>) {
        let handler: Arc<dyn PipelineEventHandler> = self.clone();
        pipeline.attach(Arc::downgrade(&handler));
    }
}

#[async_trait]
impl PipelineEventHandler for ClientCore {
    async fn on_method_called(&self, request: Option<MethodRequest>) {
        self.dispatcher.dispatch(request).await;
    }

    fn on_connection_opened(&self, source: SourceId, event: ConnectionEvent) {
        self.connection.on_opened(source, event);
    }

    async fn on_connection_closed(&self, source: SourceId, event: ConnectionEvent) {
        self.connection.on_closed(source, event).await;
    }
}

/// The object applications hold to talk to the hub.
///
/// A `DeviceClient` owns no protocol logic of its own. It validates and
/// stores configuration, and hands everything else to the method dispatcher,
/// the connection state machine and the transport pipeline. Clones share the
/// same client.
///
/// # Examples
///
/// ```rust
/// use hublink::DeviceClient;
/// use hublink::methods::{method_handler, MethodResponse};
/// use hublink::transport::MemoryPipeline;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = Arc::new(MemoryPipeline::new());
/// let client = DeviceClient::builder()
///     .connection_string("HostName=acme.example.net;DeviceId=pump-3;SharedAccessKey=a2V5")
///     .pipeline(pipeline.clone())
///     .build()?;
///
/// client.open().await?;
/// client
///     .set_method_handler(
///         "ping",
///         Some(method_handler(|_, _| async { Ok(MethodResponse::with_payload(b"\"pong\"".to_vec(), 200)) })),
///         None,
///     )
///     .await?;
/// assert!(pipeline.methods_enabled());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DeviceClient {
    core: Arc<ClientCore>,
}

impl DeviceClient {
    /// Creates a builder.
    pub fn builder() -> DeviceClientBuilder {
        DeviceClientBuilder::default()
    }

    /// Creates a client for `connection_string` using the default transport.
    ///
    /// No pipeline is installed; see [`set_pipeline`](Self::set_pipeline).
    ///
    /// # Errors
    ///
    /// Any connection string error, including
    /// [`ConfigError::ModuleIdNotAllowed`].
    pub fn from_connection_string(connection_string: &str) -> Result<Self, ConfigError> {
        Self::builder().connection_string(connection_string).build()
    }

    /// Creates a client for `connection_string` using `transport`.
    ///
    /// # Errors
    ///
    /// As [`from_connection_string`](Self::from_connection_string).
    pub fn from_connection_string_with_transport(
        connection_string: &str,
        transport: TransportType,
    ) -> Result<Self, ConfigError> {
        Self::builder()
            .connection_string(connection_string)
            .transport(transport)
            .build()
    }

    /// Creates a client for `connection_string` over a set of transports.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyTransportSettings`] if `settings` is empty, or any
    /// connection string error.
    pub fn from_connection_string_with_settings(
        connection_string: &str,
        settings: &[TransportSettings],
    ) -> Result<Self, ConfigError> {
        if settings.is_empty() {
            return Err(ConfigError::EmptyTransportSettings);
        }
        settings
            .iter()
            .cloned()
            .fold(
                Self::builder().connection_string(connection_string),
                DeviceClientBuilder::transport_settings,
            )
            .build()
    }

    /// Opens the connection to the hub.
    ///
    /// # Errors
    ///
    /// The pipeline's error once the retry policy gives up, or
    /// [`TransportError::Timeout`](crate::transport::TransportError::Timeout)
    /// when the operation timeout elapses first.
    pub async fn open(&self) -> Result<(), HubError> {
        let pipeline = self.core.pipeline.current();

        #[cfg(feature = "observability")]
        info!(pipeline = %pipeline.name(), "opening device client");

        pipeline.open(true, self.core.timeout.token()).await?;
        Ok(())
    }

    /// Closes the connection.
    ///
    /// Cancels every outstanding operation and reports
    /// `Disabled`/`ClientClose`, even if the pipeline's close fails.
    ///
    /// # Errors
    ///
    /// The pipeline's close error.
    pub async fn close(&self) -> Result<(), HubError> {
        let result = self
            .core
            .pipeline
            .current()
            .close(self.core.timeout.token())
            .await;

        self.core.timeout.cancel_outstanding();
        self.core.connection.on_client_close();

        #[cfg(feature = "observability")]
        info!("device client closed");

        result.map_err(HubError::from)
    }

    /// Sends a telemetry message.
    ///
    /// # Errors
    ///
    /// The pipeline's send error or a timeout.
    pub async fn send_event(&self, message: Message) -> Result<(), HubError> {
        self.core
            .pipeline
            .current()
            .send_event(message, self.core.timeout.token())
            .await?;
        Ok(())
    }

    /// Receives the next cloud-to-device message, if any is pending.
    ///
    /// # Errors
    ///
    /// The pipeline's receive error or a timeout.
    pub async fn receive(&self) -> Result<Option<Message>, HubError> {
        let message = self
            .core
            .pipeline
            .current()
            .receive(self.core.timeout.token())
            .await?;
        Ok(message)
    }

    /// Operation timeout in milliseconds. `0` means no timeout.
    pub fn operation_timeout_ms(&self) -> u32 {
        self.core.timeout.get()
    }

    /// Sets the operation timeout. Any value is accepted; `0` makes later
    /// operations non-cancelable rather than immediately expired.
    pub fn set_operation_timeout_ms(&self, timeout_ms: u32) {
        self.core.timeout.set(timeout_ms);

        #[cfg(feature = "observability")]
        debug!(timeout_ms, "operation timeout updated");
    }

    /// Diagnostic sampling percentage.
    pub fn diagnostic_sampling_percentage(&self) -> i32 {
        self.core.settings.read().diagnostic_sampling_percentage
    }

    /// Sets the diagnostic sampling percentage.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DiagnosticSamplingOutOfRange`] outside `0..=100`, or
    /// [`ConfigError::DiagnosticsNotSupported`] naming the first configured
    /// transport that cannot carry diagnostics when `percentage > 0`. The
    /// previous value is kept on error.
    pub fn set_diagnostic_sampling_percentage(&self, percentage: i32) -> Result<(), ConfigError> {
        validate_diagnostic_sampling(percentage, &self.core.transports)?;
        self.core.settings.write().diagnostic_sampling_percentage = percentage;

        #[cfg(feature = "observability")]
        debug!(percentage, "diagnostic sampling updated");
        Ok(())
    }

    /// Product information appended to the user agent.
    pub fn product_info(&self) -> String {
        self.core.settings.read().product_info.clone()
    }

    /// Sets the product information.
    pub fn set_product_info(&self, product_info: impl Into<String>) {
        self.core.settings.write().product_info = product_info.into();
    }

    /// The retry policy applied to `open` and connection recovery.
    pub fn retry_policy(&self) -> Arc<dyn RetryPolicy> {
        self.core.retry_policy.current()
    }

    /// Replaces the retry policy. Retry loops already running keep the
    /// policy they started with.
    pub fn set_retry_policy(&self, policy: Arc<dyn RetryPolicy>) {
        #[cfg(feature = "observability")]
        debug!(policy = %policy.name(), "retry policy updated");

        self.core.retry_policy.replace(policy);
    }

    /// Registers, replaces or removes (`None`) the handler for `name`.
    ///
    /// The first registration enables method delivery on the pipeline and
    /// removing the last one disables it.
    ///
    /// # Errors
    ///
    /// [`MethodError::EmptyName`](crate::methods::MethodError::EmptyName), or
    /// the pipeline's error when enabling or disabling delivery fails.
    pub async fn set_method_handler(
        &self,
        name: &str,
        handler: Option<Arc<dyn MethodHandler>>,
        context: Option<UserContext>,
    ) -> Result<(), HubError> {
        self.core
            .dispatcher
            .set_method_handler(name, handler, context)
            .await?;
        Ok(())
    }

    /// Sets or clears (`None`) the handler used when no named handler
    /// matches.
    ///
    /// # Errors
    ///
    /// The pipeline's error when enabling or disabling delivery fails.
    pub async fn set_method_default_handler(
        &self,
        handler: Option<Arc<dyn MethodHandler>>,
        context: Option<UserContext>,
    ) -> Result<(), HubError> {
        self.core
            .dispatcher
            .set_default_handler(handler, context)
            .await?;
        Ok(())
    }

    /// Subscribes to connection status changes. `None` unsubscribes.
    pub fn set_connection_status_changes_handler(&self, handler: Option<StatusChangeHandler>) {
        self.core.connection.set_status_change_handler(handler);
    }

    /// Current connection status and the reason for the last change.
    pub fn connection_status(&self) -> (ConnectionStatus, ConnectionStatusChangeReason) {
        self.core.connection.status()
    }

    /// Installs `pipeline` as the outermost layer, returning the previous
    /// one.
    ///
    /// The pipeline is used as given. Wrap it in a [`RetryPipeline`] if
    /// `open` and recovery should be retried.
    pub fn set_pipeline(&self, pipeline: Arc<dyn TransportPipeline>) -> Arc<dyn TransportPipeline> {
        self.core.attach(&pipeline);

        #[cfg(feature = "observability")]
        debug!(pipeline = %pipeline.name(), "pipeline replaced");

        self.core.pipeline.replace(pipeline)
    }

    /// The handler the pipeline reports events to.
    pub fn events(&self) -> Arc<dyn PipelineEventHandler> {
        self.core.clone()
    }

    /// The connection string the client was created from, if any.
    pub fn connection_string(&self) -> Option<&ConnectionString> {
        self.core.connection_string.as_ref()
    }

    /// Configured transports.
    pub fn transport_settings(&self) -> &[TransportSettings] {
        &self.core.transports
    }
}

impl fmt::Debug for DeviceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = self.core.settings.read();
        f.debug_struct("DeviceClient")
            .field("connection_string", &self.core.connection_string)
            .field("transports", &self.core.transports)
            .field("operation_timeout_ms", &self.core.timeout.get())
            .field(
                "diagnostic_sampling_percentage",
                &settings.diagnostic_sampling_percentage,
            )
            .field("product_info", &settings.product_info)
            .field("pipeline", &self.core.pipeline)
            .field("connection", &self.core.connection)
            .finish()
    }
}

/// Builder for [`DeviceClient`].
///
/// # Examples
///
/// ```rust
/// use hublink::DeviceClient;
/// use hublink::retry::FixedDelay;
/// use hublink::transport::{MemoryPipeline, TransportType};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let client = DeviceClient::builder()
///     .transport(TransportType::MqttTcpOnly)
///     .operation_timeout_ms(30_000)
///     .retry_policy(Arc::new(FixedDelay::new(Duration::from_secs(5))))
///     .pipeline(MemoryPipeline::new())
///     .build()
///     .unwrap();
///
/// assert_eq!(client.operation_timeout_ms(), 30_000);
/// ```
#[derive(Default)]
pub struct DeviceClientBuilder {
    connection_string: Option<String>,
    transports: Vec<TransportSettings>,
    options: ClientOptions,
    pipeline: Option<Arc<dyn TransportPipeline>>,
}

impl DeviceClientBuilder {
    /// Connection string identifying the device. Must not name a module.
    pub fn connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    /// Adds a transport with default settings.
    pub fn transport(self, transport: TransportType) -> Self {
        self.transport_settings(TransportSettings::from_type(transport))
    }

    /// Adds a transport.
    pub fn transport_settings(mut self, settings: TransportSettings) -> Self {
        self.transports.push(settings);
        self
    }

    /// Replaces all options at once.
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Operation timeout in milliseconds.
    pub fn operation_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.options.operation_timeout_ms = timeout_ms;
        self
    }

    /// Diagnostic sampling percentage, validated at [`build`](Self::build).
    pub fn diagnostic_sampling_percentage(mut self, percentage: i32) -> Self {
        self.options.diagnostic_sampling_percentage = percentage;
        self
    }

    /// Product information.
    pub fn product_info(mut self, product_info: impl Into<String>) -> Self {
        self.options.product_info = product_info.into();
        self
    }

    /// Retry policy for `open` and recovery.
    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.options.retry_policy = policy;
        self
    }

    /// Pipeline to drive. It is wrapped in a [`RetryPipeline`] bound to the
    /// client's retry policy.
    pub fn pipeline<P>(mut self, pipeline: P) -> Self
    where
        P: TransportPipeline + 'static,
    {
        self.pipeline = Some(Arc::new(pipeline));
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Any connection string error, or a diagnostic sampling percentage the
    /// configured transports reject.
    pub fn build(self) -> Result<DeviceClient, ConfigError> {
        let connection_string = self
            .connection_string
            .as_deref()
            .map(ConnectionString::parse_device)
            .transpose()?;

        let transports = if self.transports.is_empty() {
            vec![TransportSettings::from_type(DEFAULT_TRANSPORT)]
        } else {
            self.transports
        };

        self.options.validate(&transports)?;

        let retry_policy = SharedRetryPolicy::new(self.options.retry_policy);
        let pipeline: Arc<dyn TransportPipeline> = match self.pipeline {
            Some(inner) => Arc::new(RetryPipeline::new(inner, retry_policy.clone())),
            None => Arc::new(DetachedPipeline),
        };

        let timeout = Arc::new(OperationTimeout::new(self.options.operation_timeout_ms));
        let handle = Arc::new(PipelineHandle::new(pipeline.clone()));

        let core = Arc::new(ClientCore {
            connection_string,
            transports,
            settings: RwLock::new(Settings {
                diagnostic_sampling_percentage: self.options.diagnostic_sampling_percentage,
                product_info: self.options.product_info,
            }),
            timeout: timeout.clone(),
            retry_policy,
            pipeline: handle.clone(),
            dispatcher: MethodDispatcher::new(handle.clone(), timeout.clone()),
            connection: ConnectionStateMachine::new(handle, timeout),
        });
        core.attach(&pipeline);

        #[cfg(feature = "observability")]
        debug!(
            device_id = core.connection_string.as_ref().map(ConnectionString::device_id),
            pipeline = %pipeline.name(),
            "device client built"
        );

        Ok(DeviceClient { core })
    }
}

impl fmt::Debug for DeviceClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceClientBuilder")
            .field("has_connection_string", &self.connection_string.is_some())
            .field("transports", &self.transports)
            .field("options", &self.options)
            .field("pipeline", &self.pipeline.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DEFAULT_OPERATION_TIMEOUT_MS;
    use crate::retry::NoRetry;
    use crate::transport::{MemoryPipeline, TransportError};

    const CS: &str = "HostName=acme.example.net;DeviceId=pump-3;SharedAccessKey=a2V5";

    #[test]
    fn test_defaults() {
        let client = DeviceClient::from_connection_string(CS).unwrap();
        assert_eq!(client.operation_timeout_ms(), DEFAULT_OPERATION_TIMEOUT_MS);
        assert_eq!(client.diagnostic_sampling_percentage(), 0);
        assert_eq!(client.transport_settings()[0].transport_type(), TransportType::Amqp);
        assert_eq!(
            client.connection_status(),
            (ConnectionStatus::Disabled, ConnectionStatusChangeReason::ClientClose)
        );
        assert_eq!(client.connection_string().unwrap().device_id(), "pump-3");
    }

    #[tokio::test]
    async fn test_detached_client_cannot_open() {
        let client = DeviceClient::from_connection_string(CS).unwrap();
        let result = client.open().await;
        assert!(matches!(result, Err(HubError::Transport(TransportError::NotConnected))));
    }

    #[test]
    fn test_build_rejects_bad_sampling() {
        let result = DeviceClient::builder()
            .transport(TransportType::Http1)
            .diagnostic_sampling_percentage(5)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::DiagnosticsNotSupported {
                transport: TransportType::Http1
            })
        ));
    }

    #[test]
    fn test_product_info_round_trip() {
        let client = DeviceClient::builder().build().unwrap();
        assert!(client.product_info().is_empty());
        client.set_product_info("name/version (runtime; os; arch)");
        assert_eq!(client.product_info(), "name/version (runtime; os; arch)");
    }

    #[test]
    fn test_retry_policy_swap() {
        let client = DeviceClient::builder().build().unwrap();
        assert_eq!(client.retry_policy().name(), "ExponentialBackoff");
        client.set_retry_policy(Arc::new(NoRetry));
        assert_eq!(client.retry_policy().name(), "NoRetry");
    }

    #[tokio::test]
    async fn test_set_pipeline_attaches_events() {
        let client = DeviceClient::builder().build().unwrap();
        let memory = Arc::new(MemoryPipeline::new());

        let previous = client.set_pipeline(memory.clone());
        assert_eq!(previous.name(), "detached");

        assert!(memory.emit_opened(
            crate::transport::ConnectionType::MqttConnection,
            ConnectionStatus::Connected,
            ConnectionStatusChangeReason::ConnectionOk,
        ));
        assert_eq!(client.connection_status().0, ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn test_close_reports_client_close() {
        let memory = Arc::new(MemoryPipeline::new());
        let client = DeviceClient::builder().pipeline(memory.clone()).build().unwrap();
        client.open().await.unwrap();
        memory.emit_opened(
            crate::transport::ConnectionType::MqttConnection,
            ConnectionStatus::Connected,
            ConnectionStatusChangeReason::ConnectionOk,
        );

        client.close().await.unwrap();
        assert!(!memory.is_open());
        assert_eq!(
            client.connection_status(),
            (ConnectionStatus::Disabled, ConnectionStatusChangeReason::ClientClose)
        );
    }

    #[tokio::test]
    async fn test_events_handle_reaches_dispatcher() {
        let memory = Arc::new(MemoryPipeline::new());
        let client = DeviceClient::builder().pipeline(memory.clone()).build().unwrap();

        client.events().on_method_called(Some(MethodRequest::new("missing", "r1", Vec::new()))).await;
        assert_eq!(memory.responses()[0].status, crate::methods::STATUS_NOT_IMPLEMENTED);
    }
}
