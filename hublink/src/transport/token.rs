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

//! Cancellation and deadline tokens passed to every pipeline operation.
//!
//! A token is either *cancelable* (bound to the client's shutdown signal and
//! usually to a deadline derived from the operation timeout) or explicitly
//! *non-cancelable*. An operation timeout of `0` produces a non-cancelable
//! token rather than an already-expired one; pipeline layers check
//! [`OperationToken::can_be_canceled`] to decide whether to apply a bounded
//! wait of their own.

use crate::transport::TransportError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation signal and optional deadline for one pipeline operation.
///
/// # Examples
///
/// ```rust
/// use hublink::transport::OperationToken;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let unbounded = OperationToken::none();
/// assert!(!unbounded.can_be_canceled());
///
/// let shutdown = CancellationToken::new();
/// let bounded = OperationToken::with_timeout(&shutdown, Duration::from_secs(5));
/// assert!(bounded.can_be_canceled());
/// assert_eq!(bounded.timeout(), Some(Duration::from_secs(5)));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OperationToken {
    cancel: Option<CancellationToken>,
    deadline: Option<(Instant, Duration)>,
}

impl OperationToken {
    /// A token that can never be cancelled and carries no deadline.
    pub fn none() -> Self {
        Self {
            cancel: None,
            deadline: None,
        }
    }

    /// A token cancelled by `parent` or when `timeout` elapses, whichever
    /// comes first.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_timeout(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            cancel: Some(parent.child_token()),
            deadline: Some((Instant::now() + timeout, timeout)),
        }
    }

    /// A token cancelled only by `parent`.
    pub fn cancel_only(parent: &CancellationToken) -> Self {
        Self {
            cancel: Some(parent.child_token()),
            deadline: None,
        }
    }

    /// Returns `false` for tokens created with [`none`](Self::none).
    pub fn can_be_canceled(&self) -> bool {
        self.cancel.is_some()
    }

    /// The timeout this token was created with, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.deadline.map(|(_, timeout)| timeout)
    }

    /// Returns `true` once the cancellation signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Drives `operation` to completion unless the token is cancelled or its
    /// deadline passes first.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Cancelled`] if the cancellation signal fires,
    /// [`TransportError::Timeout`] if the deadline passes, or the error
    /// produced by `operation` itself.
    pub async fn run<F, T>(&self, operation: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        let Some(cancel) = &self.cancel else {
            return operation.await;
        };

        match self.deadline {
            Some((deadline, duration)) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(TransportError::Cancelled),
                    result = tokio::time::timeout_at(deadline, operation) => match result {
                        Ok(inner) => inner,
                        Err(_) => Err(TransportError::Timeout { duration }),
                    },
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(TransportError::Cancelled),
                    result = operation => result,
                }
            }
        }
    }

    /// Sleeps for `delay`, waking early with an error if the token fires.
    pub async fn sleep(&self, delay: Duration) -> Result<(), TransportError> {
        self.run(async {
            tokio::time::sleep(delay).await;
            Ok(())
        })
        .await
    }
}

impl Default for OperationToken {
    fn default() -> Self {
        Self::none()
    }
}
