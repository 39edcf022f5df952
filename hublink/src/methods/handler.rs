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

//! The handler trait user callbacks implement.

use super::{MethodRequest, MethodResponse};
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Opaque value registered alongside a handler and passed back on every call.
pub type UserContext = Arc<dyn Any + Send + Sync>;

/// Error a handler may return. The dispatcher answers with a 500 response.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A device method callback.
///
/// Closures can be adapted with [`method_handler`].
///
/// # Examples
///
/// ```rust
/// use hublink::methods::{HandlerError, MethodHandler, MethodRequest, MethodResponse, UserContext};
/// use async_trait::async_trait;
///
/// struct Reboot;
///
/// #[async_trait]
/// impl MethodHandler for Reboot {
///     async fn handle(
///         &self,
///         _request: MethodRequest,
///         _context: Option<UserContext>,
///     ) -> Result<MethodResponse, HandlerError> {
///         Ok(MethodResponse::with_payload(br#"{"rebooting":true}"#.to_vec(), 200))
///     }
/// }
/// ```
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Handles one request.
    async fn handle(
        &self,
        request: MethodRequest,
        context: Option<UserContext>,
    ) -> Result<MethodResponse, HandlerError>;
}

/// Wraps an async closure as a [`MethodHandler`].
///
/// ```rust
/// use hublink::methods::{method_handler, MethodResponse};
///
/// let echo = method_handler(|request, _context| async move {
///     Ok(MethodResponse::with_payload(request.body().to_vec(), 200))
/// });
/// ```
pub fn method_handler<F, Fut>(f: F) -> Arc<dyn MethodHandler>
where
    F: Fn(MethodRequest, Option<UserContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<MethodResponse, HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler {
        f,
        _marker: PhantomData,
    })
}

struct FnHandler<F, Fut> {
    f: F,
    _marker: PhantomData<fn() -> Fut>,
}

#[async_trait]
impl<F, Fut> MethodHandler for FnHandler<F, Fut>
where
    F: Fn(MethodRequest, Option<UserContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<MethodResponse, HandlerError>> + Send + 'static,
{
    async fn handle(
        &self,
        request: MethodRequest,
        context: Option<UserContext>,
    ) -> Result<MethodResponse, HandlerError> {
        (self.f)(request, context).await
    }
}

impl<F, Fut> fmt::Debug for FnHandler<F, Fut> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHandler")
    }
}
