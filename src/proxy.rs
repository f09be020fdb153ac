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

//! The proxy-invoker boundary: an optional seam a [`QueueMonitor`] can route
//! its dequeue calls through instead of calling the queue directly.
//!
//! This crate does not implement a proxy — logging, retries, caching behind
//! this boundary are out of scope (spec.md §1, §6). It is deliberately a
//! one-method trait; it must not grow into an aspect pipeline.
//!
//! [`QueueMonitor`]: crate::queue::QueueMonitor

use crate::error::Result;
use crate::queue::Message;
use std::time::Duration;

/// The parameters of a single dequeue call, handed to a [`ProxyInvoker`]
/// instead of exposing the underlying [`MessageQueue`](crate::queue::MessageQueue) directly.
#[derive(Debug, Clone, Copy)]
pub struct QueueOp {
    pub max_count: u32,
    pub visibility: Duration,
}

/// A pluggable boundary for routing a queue monitor's dequeue calls through
/// an external invoker (e.g. one that applies logging or retry policy)
/// instead of calling the queue directly. Opaque to the core: whatever it
/// does, it must preserve the empty/present contract.
pub trait ProxyInvoker: Send + Sync {
    fn invoke(&self, op: QueueOp) -> Result<Vec<Message>>;
}
