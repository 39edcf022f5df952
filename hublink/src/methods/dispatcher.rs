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

//! Routes inbound method requests to registered handlers.

use super::{
    MethodError, MethodHandler, MethodRegistry, MethodRequest, MethodResponse,
    OutboundMethodResponse, Registration, STATUS_BAD_REQUEST, STATUS_NOT_IMPLEMENTED,
    STATUS_USER_CODE_ERROR, UserContext,
};
use crate::client::OperationTimeout;
use crate::transport::PipelineHandle;
use futures_util::FutureExt;
use parking_lot::RwLock;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Mutex;

#[cfg(feature = "observability")]
use tracing::{debug, info, warn};

/// Owns the method registry and turns inbound requests into responses.
///
/// # Registration
///
/// Handler registration and removal are serialized. Method delivery is
/// enabled on the pipeline when the registry goes from empty to non-empty
/// and disabled when it becomes empty again; named handlers and the default
/// handler count together. Changes that do not cross that edge never touch
/// the pipeline.
///
/// # Dispatch
///
/// Lookups take a read lock on the registry and never observe a partial
/// update. Every request that reaches a lookup produces exactly one
/// response:
///
/// | Condition                                  | Status sent               |
/// |--------------------------------------------|---------------------------|
/// | no named handler and no default handler    | 501                       |
/// | body is neither empty nor valid JSON       | 400, handler not called   |
/// | handler fails, panics or returns bad JSON  | 500, empty payload        |
/// | otherwise                                  | handler's status/payload  |
///
/// Failures to send the response are logged and dropped.
pub struct MethodDispatcher {
    registry: RwLock<MethodRegistry>,
    edges: Mutex<()>,
    pipeline: Arc<PipelineHandle>,
    timeout: Arc<OperationTimeout>,
}

impl MethodDispatcher {
    /// Creates a dispatcher sending through `pipeline`.
    pub fn new(pipeline: Arc<PipelineHandle>, timeout: Arc<OperationTimeout>) -> Self {
        Self {
            registry: RwLock::new(MethodRegistry::new()),
            edges: Mutex::new(()),
            pipeline,
            timeout,
        }
    }

    /// Registers, replaces or removes the handler for `name`.
    ///
    /// Passing `None` removes the registration; removing a name that is not
    /// registered does nothing.
    ///
    /// # Errors
    ///
    /// - [`MethodError::EmptyName`] if `name` is empty.
    /// - [`MethodError::Transport`] if enabling or disabling method delivery
    ///   fails. A failed enable leaves the registry unchanged.
    pub async fn set_method_handler(
        &self,
        name: &str,
        handler: Option<Arc<dyn MethodHandler>>,
        context: Option<UserContext>,
    ) -> Result<(), MethodError> {
        if name.is_empty() {
            return Err(MethodError::EmptyName);
        }

        match handler {
            Some(handler) => {
                self.add(Registration::new(handler, context), |registry, registration| {
                    registry.insert(name, registration);
                })
                .await?;

                #[cfg(feature = "observability")]
                debug!(method = %name, "method handler registered");
            }
            None => {
                if self.remove(|registry| registry.remove(name).is_some()).await? {
                    #[cfg(feature = "observability")]
                    debug!(method = %name, "method handler removed");
                }
            }
        }
        Ok(())
    }

    /// Sets or clears the default handler, used when no named handler
    /// matches.
    ///
    /// # Errors
    ///
    /// [`MethodError::Transport`] if enabling or disabling method delivery
    /// fails.
    pub async fn set_default_handler(
        &self,
        handler: Option<Arc<dyn MethodHandler>>,
        context: Option<UserContext>,
    ) -> Result<(), MethodError> {
        match handler {
            Some(handler) => {
                self.add(Registration::new(handler, context), |registry, registration| {
                    registry.set_default(Some(registration));
                })
                .await
            }
            None => self
                .remove(|registry| registry.set_default(None).is_some())
                .await
                .map(|_| ()),
        }
    }

    async fn add(
        &self,
        registration: Registration,
        apply: impl FnOnce(&mut MethodRegistry, Registration),
    ) -> Result<(), MethodError> {
        let _edge = self.edges.lock().await;

        let was_empty = self.registry.read().is_empty();
        if was_empty {
            self.pipeline
                .current()
                .enable_methods(self.timeout.token())
                .await?;

            #[cfg(feature = "observability")]
            info!("method delivery enabled");
        }

        apply(&mut self.registry.write(), registration);
        Ok(())
    }

    /// Applies `apply` and disables delivery if it emptied the registry.
    /// Returns whatever `apply` reported as removed.
    async fn remove(
        &self,
        apply: impl FnOnce(&mut MethodRegistry) -> bool,
    ) -> Result<bool, MethodError> {
        let _edge = self.edges.lock().await;

        let (removed, now_empty) = {
            let mut registry = self.registry.write();
            let removed = apply(&mut registry);
            (removed, registry.is_empty())
        };

        if removed && now_empty {
            self.pipeline
                .current()
                .disable_methods(self.timeout.token())
                .await?;

            #[cfg(feature = "observability")]
            info!("method delivery disabled");
        }
        Ok(removed)
    }

    /// Number of active registrations, the default handler included.
    pub fn handler_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Handles one inbound request.
    ///
    /// `None` is a discarded delivery and is ignored without a response.
    #[cfg_attr(not(feature = "observability"), allow(unused_variables))]
    pub async fn dispatch(&self, request: Option<MethodRequest>) {
        let Some(request) = request else {
            #[cfg(feature = "observability")]
            debug!("ignoring empty method delivery");
            return;
        };

        let request_id = request.request_id().to_string();
        let response = self.respond(request).await;
        let status = response.status;

        if let Err(error) = self
            .pipeline
            .current()
            .send_method_response(response, self.timeout.token())
            .await
        {
            #[cfg(feature = "observability")]
            warn!(request_id = %request_id, status, %error, "failed to send method response");
        }
    }

    #[cfg_attr(not(feature = "observability"), allow(unused_variables))]
    async fn respond(&self, request: MethodRequest) -> OutboundMethodResponse {
        let request_id = request.request_id().to_string();
        let registration = self.registry.read().lookup(request.name());

        let Some(Registration { handler, context }) = registration else {
            #[cfg(feature = "observability")]
            warn!(method = %request.name(), "no handler registered");
            return OutboundMethodResponse::status_only(STATUS_NOT_IMPLEMENTED, request_id);
        };

        if let Err(error) = request.json() {
            #[cfg(feature = "observability")]
            warn!(method = %request.name(), %error, "rejecting malformed request body");
            return OutboundMethodResponse::status_only(STATUS_BAD_REQUEST, request_id);
        }

        #[cfg(feature = "observability")]
        let method = request.name().to_string();

        let outcome = AssertUnwindSafe(handler.handle(request, context))
            .catch_unwind()
            .await;

        let response = match outcome {
            Ok(Ok(response)) if response.has_valid_payload() => response,
            Ok(Ok(response)) => {
                #[cfg(feature = "observability")]
                warn!(method = %method, status = response.status(), "handler returned invalid JSON payload");
                MethodResponse::new(STATUS_USER_CODE_ERROR)
            }
            Ok(Err(error)) => {
                #[cfg(feature = "observability")]
                warn!(method = %method, %error, "handler failed");
                MethodResponse::new(STATUS_USER_CODE_ERROR)
            }
            Err(_panic) => {
                #[cfg(feature = "observability")]
                warn!(method = %method, "handler panicked");
                MethodResponse::new(STATUS_USER_CODE_ERROR)
            }
        };

        #[cfg(feature = "observability")]
        debug!(method = %method, status = response.status(), "method dispatched");

        OutboundMethodResponse::new(response, request_id)
    }
}

impl fmt::Debug for MethodDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDispatcher")
            .field("handlers", &self.handler_count())
            .field("pipeline", &self.pipeline)
            .finish()
    }
}
