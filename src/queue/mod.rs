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

//! Adapts a cloud-style message queue (SQS/Pub/Sub-shaped: batch receive
//! with a visibility timeout) to the poll-function contract the driver
//! expects. Each poll yields a whole batch — the monitor does not split a
//! batch across several `Present` returns.

mod monitor;

pub use monitor::QueueMonitor;

use crate::error::Result;
use std::time::Duration;

/// The largest batch a single [`MessageQueue::get_messages`] call may
/// return. Matches SQS's own `ReceiveMessage` batch ceiling.
pub const BATCH_MAX: u32 = 32;

/// One message pulled off a queue. `receipt_handle` identifies this
/// specific delivery (a redelivered message gets a new handle) and is what
/// a handler would present back to the queue to acknowledge or delete the
/// message — a `QueueMonitor` never touches it; see module docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub body: Vec<u8>,
    pub receipt_handle: String,
}

/// The one queue operation a [`QueueMonitor`] needs. Implementations are
/// expected to be thin adapters over a concrete SDK client (SQS, Pub/Sub,
/// ...); this crate ships no such adapter, only the trait. Acknowledging or
/// deleting a message is deliberately not part of this contract — that is
/// the handler's responsibility, exercised against whatever client produced
/// the `Message` in the first place.
pub trait MessageQueue: Send + Sync {
    /// Returns at most `max_count` messages (never more than
    /// [`BATCH_MAX`]), each hidden from other consumers for
    /// `visibility_timeout`; an unacknowledged message reappears once that
    /// window elapses. Returns an empty `Vec` rather than blocking when
    /// nothing is available — the monitor supplies the waiting.
    fn get_messages(&self, max_count: u32, visibility_timeout: Duration) -> Result<Vec<Message>>;
}
