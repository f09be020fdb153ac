// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A blocking smart-polling coordinator: turns a non-blocking, maybe-empty
//! poll function into either a blocking wait or a callback loop, with
//! adaptive back-off between empty polls and cooperative cancellation
//! throughout. [`queue`] specializes the driver to a cloud-style message
//! queue (batch receive, visibility timeout, explicit ack).

pub mod backoff;
pub mod cancel;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod process_cancellation;
pub mod proxy;
pub mod queue;
pub mod sleep;

pub use backoff::BackoffPolicy;
pub use cancel::CancelSignal;
pub use config::{DriverConfig, QueueMonitorConfig};
pub use driver::{DriverMode, PollCounters, PollDriver, PollResult};
pub use error::{PollError, Result};
pub use process_cancellation::process_cancel_signal;
pub use proxy::{ProxyInvoker, QueueOp};
pub use queue::{Message, MessageQueue, QueueMonitor};
pub use sleep::{cancelable_sleep, WakeReason};
