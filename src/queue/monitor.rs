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

//! [`QueueMonitor`]: the cloud-message-queue specialization of the poll
//! driver. Dequeues are serialized through a single mutex — matching
//! `kopi::locking::controller::LockController`'s single-flight access
//! pattern — so the underlying queue sees at most one in-flight
//! `get_messages` call per monitor. A batch is handed to the driver whole,
//! as one `Present`; the monitor does not split it into per-message polls.

use super::{Message, MessageQueue, BATCH_MAX};
use crate::config::QueueMonitorConfig;
use crate::driver::{PollDriver, PollResult};
use crate::error::Result;
use crate::proxy::{ProxyInvoker, QueueOp};
use std::sync::{Arc, Mutex};

struct Inner<Q> {
    proxy: Option<Arc<dyn ProxyInvoker>>,
    config: QueueMonitorConfig,
    receive_lock: Mutex<()>,
    queue: Arc<Q>,
}

fn poll_once<Q: MessageQueue>(inner: &Inner<Q>) -> Result<PollResult<Vec<Message>>> {
    // Serializes dequeue attempts: only one in-flight `get_messages` call at
    // a time, so concurrent callers of the same monitor can't race the
    // underlying queue's batch semantics.
    let _single_flight = inner.receive_lock.lock().unwrap();

    let op = QueueOp {
        max_count: BATCH_MAX,
        visibility: inner.config.visibility_timeout(),
    };
    let batch = match &inner.proxy {
        Some(proxy) => proxy.invoke(op)?,
        None => inner.queue.get_messages(op.max_count, op.visibility)?,
    };

    if batch.is_empty() {
        Ok(PollResult::Empty)
    } else {
        Ok(PollResult::Present(batch))
    }
}

/// Adapts a [`MessageQueue`] into the poll-function contract and hands it
/// to an internal [`PollDriver<Vec<Message>>`](PollDriver) — composition,
/// not inheritance: a `QueueMonitor` contains a driver rather than
/// subclassing one. Holds the queue by `Arc`, a reference to a handle the
/// monitor does not own exclusively.
pub struct QueueMonitor<Q: MessageQueue + 'static> {
    inner: Arc<Inner<Q>>,
}

impl<Q: MessageQueue + 'static> QueueMonitor<Q> {
    pub fn new(queue: Arc<Q>, config: QueueMonitorConfig) -> Self {
        Self::build(queue, config, None)
    }

    /// Routes every dequeue through `proxy` instead of calling `queue`
    /// directly — see [`crate::proxy`]. A construction-time choice rather
    /// than a runtime flag, so the two paths can't be confused later.
    pub fn with_proxy(queue: Arc<Q>, config: QueueMonitorConfig, proxy: Arc<dyn ProxyInvoker>) -> Self {
        Self::build(queue, config, Some(proxy))
    }

    fn build(queue: Arc<Q>, config: QueueMonitorConfig, proxy: Option<Arc<dyn ProxyInvoker>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                proxy,
                config,
                receive_lock: Mutex::new(()),
                queue,
            }),
        }
    }

    fn poll_fn(&self) -> impl FnMut() -> Result<PollResult<Vec<Message>>> + Send + 'static {
        let inner = Arc::clone(&self.inner);
        move || poll_once(&inner)
    }

    /// Blocks the calling thread until a non-empty batch arrives or the
    /// monitor's driver is canceled. The realization of spec's
    /// `WaitForMessages` convenience: construct a monitor, wait, and let it
    /// drop on return.
    pub fn wait_for_messages(self) -> Result<Option<Vec<Message>>> {
        let driver = PollDriver::new(self.poll_fn(), self.inner.config.driver())?;
        driver.wait_for_payload()
    }

    /// Starts a background loop invoking `handler` with each received
    /// batch, in arrival order, until the returned driver is stopped. The
    /// realization of spec's `RegisterMessageHandler` convenience: the
    /// returned driver is the "monitor handle" for a later `stop()`.
    /// Dropping it without stopping leaves the worker thread running.
    pub fn register_message_handler<H>(&self, handler: H) -> Result<PollDriver<Vec<Message>>>
    where
        H: FnMut(Vec<Message>) -> Result<()> + Send + 'static,
    {
        let driver = PollDriver::new(self.poll_fn(), self.inner.config.driver())?;
        driver.start_notification_loop(handler)?;
        Ok(driver)
    }
}
