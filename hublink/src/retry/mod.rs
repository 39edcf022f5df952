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

//! Retry policies applied while opening and recovering the pipeline.
//!
//! A [`RetryPolicy`] decides whether a failed `open` or
//! `recover_connections` is attempted again and how long to wait first.
//! The [`RetryPipeline`](crate::transport::RetryPipeline) layer consults the
//! client's current policy; once the policy gives up, the failure reaches the
//! connection state machine and the client reports
//! `Disconnected`/`RetryExpired`.
//!
//! # Available Policies
//!
//! - [`ExponentialBackoff`]: Delay grows geometrically, with optional jitter (default)
//! - [`FixedDelay`]: Constant delay between attempts
//! - [`NoRetry`]: Never retries
//!
//! # Examples
//!
//! ```
//! use hublink::retry::{ExponentialBackoff, FixedDelay, NoRetry};
//! use std::time::Duration;
//!
//! let backoff = ExponentialBackoff::builder()
//!     .initial_delay(Duration::from_millis(100))
//!     .max_delay(Duration::from_secs(10))
//!     .max_attempts(Some(5))
//!     .build();
//!
//! let fixed = FixedDelay::new(Duration::from_secs(2));
//! let never = NoRetry::new();
//! ```

mod exponential;
mod fixed;
mod no_retry;
mod traits;

pub use exponential::{DEFAULT_MAX_ATTEMPTS, ExponentialBackoff, ExponentialBackoffBuilder};
pub use fixed::{FixedDelay, FixedDelayBuilder};
pub use no_retry::NoRetry;
pub use traits::{RetryMetrics, RetryPolicy, SharedRetryPolicy};
