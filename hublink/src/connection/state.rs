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

//! The connection status state machine.

use super::{ConnectionEvent, ConnectionStatus, ConnectionStatusChangeReason};
use crate::client::OperationTimeout;
use crate::transport::{ConnectionType, PipelineHandle, SourceId};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

#[cfg(feature = "observability")]
use tracing::{debug, info, warn};

/// Callback invoked with the new status and reason on every change.
pub type StatusChangeHandler =
    Arc<dyn Fn(ConnectionStatus, ConnectionStatusChangeReason) + Send + Sync>;

#[derive(Debug)]
struct State {
    status: ConnectionStatus,
    reason: ConnectionStatusChangeReason,
    channels: HashMap<ConnectionType, (ConnectionStatus, ConnectionStatusChangeReason)>,
    /// Bumped by every client close.
    epoch: u64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disabled,
            reason: ConnectionStatusChangeReason::ClientClose,
            channels: HashMap::new(),
            epoch: 0,
        }
    }
}

/// Tracks the client's connection status and drives recovery.
///
/// Sub-channels report independently; the externally observed pair is the
/// one most recently reported by any of them. The subscriber is called
/// synchronously, once per change of the (status, reason) pair, in the
/// order the events arrived. Reports that repeat the current pair are
/// suppressed.
///
/// A close event whose status still allows recovery is reported first and
/// then handed to the pipeline's `recover_connections`. If recovery fails
/// the state machine moves to `Disconnected`/`RetryExpired` and reports
/// that too, unless the client was closed while recovery ran. Recovery
/// errors never propagate to the pipeline.
pub struct ConnectionStateMachine {
    state: Mutex<State>,
    notify: ReentrantMutex<()>,
    subscriber: RwLock<Option<StatusChangeHandler>>,
    pipeline: Arc<PipelineHandle>,
    timeout: Arc<OperationTimeout>,
}

impl ConnectionStateMachine {
    /// Creates a state machine in the `Disabled` state.
    pub fn new(pipeline: Arc<PipelineHandle>, timeout: Arc<OperationTimeout>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            notify: ReentrantMutex::new(()),
            subscriber: RwLock::new(None),
            pipeline,
            timeout,
        }
    }

    /// Replaces the subscriber. `None` unsubscribes.
    pub fn set_status_change_handler(&self, handler: Option<StatusChangeHandler>) {
        *self.subscriber.write() = handler;
    }

    /// The current aggregate status and reason.
    pub fn status(&self) -> (ConnectionStatus, ConnectionStatusChangeReason) {
        let state = self.state.lock();
        (state.status, state.reason)
    }

    /// The last pair reported for one sub-channel.
    pub fn channel_status(
        &self,
        connection_type: ConnectionType,
    ) -> Option<(ConnectionStatus, ConnectionStatusChangeReason)> {
        self.state.lock().channels.get(&connection_type).copied()
    }

    /// Handles a sub-channel reaching an open or connected condition.
    #[cfg_attr(not(feature = "observability"), allow(unused_variables))]
    pub fn on_opened(&self, source: SourceId, event: ConnectionEvent) {
        #[cfg(feature = "observability")]
        debug!(%source, connection_type = %event.connection_type, status = %event.status, "connection opened");

        self.transition(Some(event.connection_type), event.status, event.reason);
    }

    /// Handles a sub-channel closing or failing, attempting recovery when the
    /// reported status allows it.
    #[cfg_attr(not(feature = "observability"), allow(unused_variables))]
    pub async fn on_closed(&self, source: SourceId, event: ConnectionEvent) {
        let epoch = self.state.lock().epoch;
        self.transition(Some(event.connection_type), event.status, event.reason);

        if !event.status.allows_recovery() {
            return;
        }

        #[cfg(feature = "observability")]
        info!(%source, connection_type = %event.connection_type, reason = %event.reason, "recovering connection");

        let pipeline = self.pipeline.current();
        match pipeline
            .recover_connections(source, event.connection_type, self.timeout.recovery_token())
            .await
        {
            Ok(()) => {
                #[cfg(feature = "observability")]
                debug!(connection_type = %event.connection_type, "recovery completed");
            }
            Err(error) => {
                #[cfg(feature = "observability")]
                warn!(connection_type = %event.connection_type, %error, "recovery failed");

                // A client close since the event wins over the failure.
                self.apply(
                    Some(epoch),
                    Some(event.connection_type),
                    ConnectionStatus::Disconnected,
                    ConnectionStatusChangeReason::RetryExpired,
                );
            }
        }
    }

    /// Records an explicit close by the application.
    pub fn on_client_close(&self) {
        {
            let mut state = self.state.lock();
            state.channels.clear();
            state.epoch += 1;
        }
        self.transition(
            None,
            ConnectionStatus::Disabled,
            ConnectionStatusChangeReason::ClientClose,
        );
    }

    /// Applies a reported pair and notifies the subscriber if it changed.
    fn transition(
        &self,
        connection_type: Option<ConnectionType>,
        status: ConnectionStatus,
        reason: ConnectionStatusChangeReason,
    ) -> bool {
        self.apply(None, connection_type, status, reason)
    }

    /// As [`transition`](Self::transition), but discarded when `epoch` no
    /// longer matches the close epoch.
    fn apply(
        &self,
        epoch: Option<u64>,
        connection_type: Option<ConnectionType>,
        status: ConnectionStatus,
        reason: ConnectionStatusChangeReason,
    ) -> bool {
        // Held across the callback so notifications keep event order.
        let _order = self.notify.lock();

        let changed = {
            let mut state = self.state.lock();
            if epoch.is_some_and(|epoch| epoch != state.epoch) {
                return false;
            }
            if let Some(connection_type) = connection_type {
                state.channels.insert(connection_type, (status, reason));
            }
            if state.status == status && state.reason == reason {
                false
            } else {
                state.status = status;
                state.reason = reason;
                true
            }
        };

        if !changed {
            return false;
        }

        #[cfg(feature = "observability")]
        info!(status = %status, reason = %reason, "connection status changed");

        let subscriber = self.subscriber.read().clone();
        if let Some(subscriber) = subscriber {
            if catch_unwind(AssertUnwindSafe(|| subscriber(status, reason))).is_err() {
                #[cfg(feature = "observability")]
                warn!(status = %status, "connection status handler panicked");
            }
        }
        true
    }
}

impl fmt::Debug for ConnectionStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (status, reason) = self.status();
        f.debug_struct("ConnectionStateMachine")
            .field("status", &status)
            .field("reason", &reason)
            .field("subscribed", &self.subscriber.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryPipeline, PipelineOperation, TransportPipeline};
    use crate::transport::memory::FAIL_ALWAYS;

    type Seen = Arc<Mutex<Vec<(ConnectionStatus, ConnectionStatusChangeReason)>>>;

    fn setup() -> (Arc<MemoryPipeline>, Arc<ConnectionStateMachine>, Seen) {
        let memory = Arc::new(MemoryPipeline::new());
        let handle = Arc::new(PipelineHandle::new(memory.clone() as Arc<dyn TransportPipeline>));
        let machine = Arc::new(ConnectionStateMachine::new(
            handle,
            Arc::new(OperationTimeout::default()),
        ));

        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        machine.set_status_change_handler(Some(Arc::new(move |status, reason| {
            sink.lock().push((status, reason));
        })));
        (memory, machine, seen)
    }

    fn event(status: ConnectionStatus, reason: ConnectionStatusChangeReason) -> ConnectionEvent {
        ConnectionEvent::new(ConnectionType::MqttConnection, status, reason)
    }

    #[test]
    fn test_initial_state() {
        let (_, machine, seen) = setup();
        assert_eq!(machine.status().0, ConnectionStatus::Disabled);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_duplicate_open_suppressed() {
        let (_, machine, seen) = setup();
        let opened = event(ConnectionStatus::Connected, ConnectionStatusChangeReason::ConnectionOk);

        machine.on_opened(SourceId::next(), opened);
        machine.on_opened(SourceId::next(), opened);

        assert_eq!(seen.lock().len(), 1);
        assert_eq!(
            machine.channel_status(ConnectionType::MqttConnection),
            Some((ConnectionStatus::Connected, ConnectionStatusChangeReason::ConnectionOk))
        );
    }

    #[tokio::test]
    async fn test_recovery_success_reports_once() {
        let (memory, machine, seen) = setup();
        machine.on_opened(
            SourceId::next(),
            event(ConnectionStatus::Connected, ConnectionStatusChangeReason::ConnectionOk),
        );

        machine
            .on_closed(
                memory.source_id(),
                event(ConnectionStatus::DisconnectedRetrying, ConnectionStatusChangeReason::NoNetwork),
            )
            .await;

        assert_eq!(memory.recover_calls(), 1);
        assert_eq!(
            seen.lock().last().copied(),
            Some((ConnectionStatus::DisconnectedRetrying, ConnectionStatusChangeReason::NoNetwork))
        );
        assert_eq!(seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_recovery_token_is_cancelable() {
        let (memory, machine, _) = setup();
        machine
            .on_closed(
                memory.source_id(),
                event(ConnectionStatus::DisconnectedRetrying, ConnectionStatusChangeReason::NoNetwork),
            )
            .await;

        let call = memory.calls()[0];
        assert_eq!(
            call.operation,
            PipelineOperation::RecoverConnections {
                connection_type: ConnectionType::MqttConnection
            }
        );
        assert!(call.cancelable);
    }

    #[tokio::test]
    async fn test_recovery_failure_reports_twice() {
        let (memory, machine, seen) = setup();
        memory.fail_recovery(FAIL_ALWAYS);

        machine
            .on_closed(
                memory.source_id(),
                event(ConnectionStatus::DisconnectedRetrying, ConnectionStatusChangeReason::RetryExpired),
            )
            .await;

        assert_eq!(
            *seen.lock(),
            vec![
                (ConnectionStatus::DisconnectedRetrying, ConnectionStatusChangeReason::RetryExpired),
                (ConnectionStatus::Disconnected, ConnectionStatusChangeReason::RetryExpired),
            ]
        );
    }

    #[tokio::test]
    async fn test_terminal_close_skips_recovery() {
        let (memory, machine, seen) = setup();
        machine
            .on_closed(
                memory.source_id(),
                event(ConnectionStatus::Disconnected, ConnectionStatusChangeReason::BadCredential),
            )
            .await;
        machine.on_client_close();

        assert_eq!(memory.recover_calls(), 0);
        assert_eq!(seen.lock().len(), 2);
        assert_eq!(
            machine.status(),
            (ConnectionStatus::Disabled, ConnectionStatusChangeReason::ClientClose)
        );
    }

    #[test]
    fn test_subscriber_may_read_status() {
        let (_, machine, _) = setup();
        let observed = Arc::new(Mutex::new(None));
        let (weak, sink) = (Arc::downgrade(&machine), observed.clone());
        machine.set_status_change_handler(Some(Arc::new(move |_: ConnectionStatus, _: ConnectionStatusChangeReason| {
            if let Some(machine) = weak.upgrade() {
                *sink.lock() = Some(machine.status());
            }
        })));

        machine.on_opened(
            SourceId::next(),
            event(ConnectionStatus::Connected, ConnectionStatusChangeReason::ConnectionOk),
        );
        assert_eq!(
            *observed.lock(),
            Some((ConnectionStatus::Connected, ConnectionStatusChangeReason::ConnectionOk))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_client_close_is_discarded() {
        let (memory, machine, seen) = setup();
        memory.fail_recovery(FAIL_ALWAYS);
        memory.set_latency(std::time::Duration::from_secs(30));

        let recovering = {
            let machine = machine.clone();
            let source = memory.source_id();
            tokio::spawn(async move {
                machine
                    .on_closed(
                        source,
                        event(ConnectionStatus::DisconnectedRetrying, ConnectionStatusChangeReason::NoNetwork),
                    )
                    .await;
            })
        };
        tokio::task::yield_now().await;

        machine.on_client_close();
        recovering.await.unwrap();

        assert_eq!(memory.recover_calls(), 1);
        assert_eq!(
            machine.status(),
            (ConnectionStatus::Disabled, ConnectionStatusChangeReason::ClientClose)
        );
        assert_eq!(
            *seen.lock(),
            vec![
                (ConnectionStatus::DisconnectedRetrying, ConnectionStatusChangeReason::NoNetwork),
                (ConnectionStatus::Disabled, ConnectionStatusChangeReason::ClientClose),
            ]
        );
    }

    #[test]
    fn test_panicking_subscriber_is_contained() {
        let (_, machine, _) = setup();
        machine.set_status_change_handler(Some(Arc::new(
            |_: ConnectionStatus, _: ConnectionStatusChangeReason| panic!("subscriber bug"),
        )));

        machine.on_opened(
            SourceId::next(),
            event(ConnectionStatus::Connected, ConnectionStatusChangeReason::ConnectionOk),
        );
        assert_eq!(machine.status().0, ConnectionStatus::Connected);
    }
}
