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

//! Delegating pipeline layer that retries `open` and recovery.

use crate::methods::OutboundMethodResponse;
use crate::retry::SharedRetryPolicy;
use crate::transport::{
    ConnectionType, Message, OperationToken, PipelineEventHandler, SourceId, TransportError,
    TransportPipeline,
};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Weak;

/// Wraps an inner pipeline and retries failed `open` and
/// `recover_connections` calls according to a [`RetryPolicy`].
///
/// All other operations are forwarded untouched. The policy is read from a
/// [`SharedRetryPolicy`] at the start of every retry loop, so replacing it
/// through the client takes effect for the next failure without rebuilding
/// the pipeline.
///
/// When the policy gives up, the last error is returned to the caller. The
/// loop also stops as soon as the operation token is cancelled or its
/// deadline passes.
///
/// [`RetryPolicy`]: crate::retry::RetryPolicy
pub struct RetryPipeline<P> {
    inner: P,
    policy: SharedRetryPolicy,
}

impl<P: TransportPipeline> RetryPipeline<P> {
    /// Wraps `inner`, retrying under the policy held by `policy`.
    pub fn new(inner: P, policy: SharedRetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped layer.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// The policy slot this layer reads from.
    pub fn policy(&self) -> &SharedRetryPolicy {
        &self.policy
    }

    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        token: &OperationToken,
        mut attempt_fn: F,
    ) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, TransportError>> + Send,
        T: Send,
    {
        let policy = self.policy.current();
        let mut attempt: u32 = 0;

        loop {
            match attempt_fn().await {
                Ok(value) => {
                    if attempt > 0 {
                        #[cfg(feature = "observability")]
                        tracing::info!(
                            "Pipeline '{}' {} succeeded after {} retries",
                            self.inner.name(),
                            operation,
                            attempt
                        );
                        policy.on_recovered();
                    }
                    return Ok(value);
                }
                Err(error) => {
                    policy.on_failed(&error);

                    if token.is_cancelled() || !policy.should_retry(attempt, &error) {
                        #[cfg(feature = "observability")]
                        tracing::warn!(
                            "Pipeline '{}' {} giving up after {} attempts: {}",
                            self.inner.name(),
                            operation,
                            attempt + 1,
                            error
                        );
                        return Err(error);
                    }

                    let delay = policy.next_delay(attempt);

                    #[cfg(feature = "observability")]
                    tracing::debug!(
                        "Pipeline '{}' {} failed ({}), retrying in {:?} under {}",
                        self.inner.name(),
                        operation,
                        error,
                        delay,
                        policy.name()
                    );

                    token.sleep(delay).await?;
                    attempt += 1;
                }
            }
        }
    }
}

impl<P> fmt::Debug for RetryPipeline<P>
where
    P: TransportPipeline,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPipeline")
            .field("inner", &self.inner.name())
            .field("policy", &self.policy)
            .finish()
    }
}

#[async_trait]
impl<P: TransportPipeline> TransportPipeline for RetryPipeline<P> {
    fn attach(&self, handler: Weak<dyn PipelineEventHandler>) {
        self.inner.attach(handler);
    }

    async fn open(&self, use_timeout: bool, token: OperationToken) -> Result<(), TransportError> {
        self.with_retry("open", &token, || self.inner.open(use_timeout, token.clone()))
            .await
    }

    async fn close(&self, token: OperationToken) -> Result<(), TransportError> {
        self.inner.close(token).await
    }

    async fn send_event(&self, message: Message, token: OperationToken) -> Result<(), TransportError> {
        self.inner.send_event(message, token).await
    }

    async fn receive(&self, token: OperationToken) -> Result<Option<Message>, TransportError> {
        self.inner.receive(token).await
    }

    async fn enable_methods(&self, token: OperationToken) -> Result<(), TransportError> {
        self.inner.enable_methods(token).await
    }

    async fn disable_methods(&self, token: OperationToken) -> Result<(), TransportError> {
        self.inner.disable_methods(token).await
    }

    async fn send_method_response(
        &self,
        response: OutboundMethodResponse,
        token: OperationToken,
    ) -> Result<(), TransportError> {
        self.inner.send_method_response(response, token).await
    }

    async fn recover_connections(
        &self,
        source: SourceId,
        connection_type: ConnectionType,
        token: OperationToken,
    ) -> Result<(), TransportError> {
        self.with_retry("recovery", &token, || {
            self.inner
                .recover_connections(source, connection_type, token.clone())
        })
        .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
