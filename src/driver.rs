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

//! The generic poll driver: turns a non-blocking, maybe-empty poll function
//! into a blocking wait or a callback loop, with adaptive back-off between
//! empty polls.
//!
//! The retry-loop shape here (check cancellation, try, back off, sleep,
//! repeat) follows `kopi::locking::controller::LockController::acquire_advisory`;
//! bundling the back-off policy, cancellation, and counters together follows
//! `kopi::locking::acquisition::LockAcquisitionRequest`.

use crate::backoff::BackoffPolicy;
use crate::cancel::CancelSignal;
use crate::config::DriverConfig;
use crate::error::{PollError, Result};
use crate::process_cancellation::process_cancel_signal;
use crate::sleep::{cancelable_sleep, WakeReason};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Outcome of one call to a poll function.
pub enum PollResult<T> {
    /// No payload available right now.
    Empty,
    /// A payload was produced.
    Present(T),
}

/// The driver's lifecycle state. An instance is single-use: it transitions
/// `Idle -> {BlockingWait | LoopRunning} -> Stopped` exactly once; any other
/// transition is a [`PollError::Misuse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverMode {
    Idle,
    BlockingWait,
    LoopRunning,
    Stopped,
}

type PollFn<T> = Box<dyn FnMut() -> Result<PollResult<T>> + Send>;
type Handler<T> = Box<dyn FnMut(T) -> Result<()> + Send>;

struct Shared<T> {
    poll_fn: Mutex<Option<PollFn<T>>>,
    backoff: BackoffPolicy,
    cancel: CancelSignal,
    mode: Mutex<DriverMode>,
    empty_total: std::sync::atomic::AtomicU64,
    payload_total: std::sync::atomic::AtomicU64,
    failure: Mutex<Option<PollError>>,
}

impl<T> Shared<T> {
    fn set_mode(&self, mode: DriverMode) {
        *self.mode.lock().unwrap() = mode;
    }
}

enum PollOutcome<T> {
    Present(T),
    Empty,
}

fn poll_once<T>(shared: &Shared<T>, poll_fn: &mut PollFn<T>) -> Result<PollOutcome<T>> {
    match poll_fn() {
        Ok(PollResult::Present(payload)) => {
            shared.payload_total.fetch_add(1, Ordering::Relaxed);
            Ok(PollOutcome::Present(payload))
        }
        Ok(PollResult::Empty) => {
            shared.empty_total.fetch_add(1, Ordering::Relaxed);
            Ok(PollOutcome::Empty)
        }
        Err(err) => Err(err),
    }
}

/// A cloneable, read-only handle to a driver's lifetime counters.
///
/// [`PollDriver::wait_for_payload`] consumes the driver, so a caller who
/// wants the final counts must obtain a `PollCounters` handle (via
/// [`PollDriver::counters`]) *before* calling it; the handle stays valid
/// after the driver itself is gone.
pub struct PollCounters<T: Send + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> PollCounters<T> {
    pub fn empty_poll_count(&self) -> u64 {
        self.shared.empty_total.load(Ordering::Relaxed)
    }

    pub fn payload_poll_count(&self) -> u64 {
        self.shared.payload_total.load(Ordering::Relaxed)
    }

    pub fn mode(&self) -> DriverMode {
        *self.shared.mode.lock().unwrap()
    }
}

impl<T: Send + 'static> Clone for PollCounters<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Turns a non-blocking, maybe-empty poll function into a blocking wait
/// ([`wait_for_payload`](Self::wait_for_payload)) or a callback loop
/// ([`start_notification_loop`](Self::start_notification_loop)).
///
/// At most one poll is ever in flight per driver; the two entrypoints are
/// mutually exclusive uses of the same underlying state.
pub struct PollDriver<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl<T: Send + 'static> PollDriver<T> {
    /// Builds an `Idle` driver with a driver-local cancellation signal.
    /// `poll_fn` must be total: it signals "empty" by returning
    /// `Ok(PollResult::Empty)`, never by returning `Err`.
    pub fn new<F>(poll_fn: F, config: DriverConfig) -> Result<Self>
    where
        F: FnMut() -> Result<PollResult<T>> + Send + 'static,
    {
        Self::with_cancel_signal(poll_fn, config, CancelSignal::new())
    }

    /// Like [`PollDriver::new`], but shares the process-wide cancellation
    /// signal (see [`crate::process_cancellation`]) instead of a fresh,
    /// driver-local one, so `SIGINT`/`SIGTERM` stop this driver too.
    pub fn new_with_process_cancellation<F>(poll_fn: F, config: DriverConfig) -> Result<Self>
    where
        F: FnMut() -> Result<PollResult<T>> + Send + 'static,
    {
        Self::with_cancel_signal(poll_fn, config, process_cancel_signal())
    }

    fn with_cancel_signal<F>(poll_fn: F, config: DriverConfig, cancel: CancelSignal) -> Result<Self>
    where
        F: FnMut() -> Result<PollResult<T>> + Send + 'static,
    {
        if config.max_idle_delay().is_zero() {
            return Err(PollError::Config(
                "max_idle_delay must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            shared: Arc::new(Shared {
                poll_fn: Mutex::new(Some(Box::new(poll_fn))),
                backoff: config.backoff_policy(),
                cancel,
                mode: Mutex::new(DriverMode::Idle),
                empty_total: std::sync::atomic::AtomicU64::new(0),
                payload_total: std::sync::atomic::AtomicU64::new(0),
                failure: Mutex::new(None),
            }),
            worker: Mutex::new(None),
            started: AtomicBool::new(false),
        })
    }

    /// A cloneable counters handle, independent of this driver's own
    /// lifetime — see [`PollCounters`].
    pub fn counters(&self) -> PollCounters<T> {
        PollCounters {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn empty_poll_count(&self) -> u64 {
        self.shared.empty_total.load(Ordering::Relaxed)
    }

    pub fn payload_poll_count(&self) -> u64 {
        self.shared.payload_total.load(Ordering::Relaxed)
    }

    pub fn mode(&self) -> DriverMode {
        *self.shared.mode.lock().unwrap()
    }

    /// A [`CancelSignal`] clone, for callers who want to trigger
    /// cancellation without going through [`stop`](Self::stop) (e.g. a
    /// caller-supplied timeout wrapping `wait_for_payload`, per spec.md's
    /// "timeouts are the caller's responsibility" design).
    pub fn cancel_signal(&self) -> CancelSignal {
        self.shared.cancel.clone()
    }

    /// Blocks until a payload is produced or the driver is canceled.
    /// Consumes the driver: `wait_for_payload` can only be called once,
    /// enforced by the type system rather than a runtime flag. Call
    /// [`counters`](Self::counters) first if you need the final counts.
    pub fn wait_for_payload(self) -> Result<Option<T>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(PollError::Misuse(
                "driver already started in another mode".to_string(),
            ));
        }
        self.shared.set_mode(DriverMode::BlockingWait);

        let mut poll_fn = self
            .shared
            .poll_fn
            .lock()
            .unwrap()
            .take()
            .expect("poll function already taken by a prior start");

        let mut empty_count: u64 = 0;
        let result = loop {
            if self.shared.cancel.is_signaled() {
                break Ok(None);
            }

            match poll_once(&self.shared, &mut poll_fn) {
                Ok(PollOutcome::Present(payload)) => break Ok(Some(payload)),
                Ok(PollOutcome::Empty) => {
                    empty_count += 1;
                    let delay = self.shared.backoff.delay_for(empty_count);
                    if cancelable_sleep(delay, &self.shared.cancel) == WakeReason::Canceled {
                        break Ok(None);
                    }
                }
                Err(err) => break Err(err),
            }
        };

        self.shared.set_mode(DriverMode::Stopped);
        result
    }

    /// Starts a background worker that calls `handler` for every payload, in
    /// arrival order, until [`stop`](Self::stop) is called or the driver is
    /// otherwise canceled. Returns immediately. The handler runs on the poll
    /// thread: the next poll does not begin until it returns, which gives
    /// handlers a natural back-pressure signal rather than spawning a
    /// thread per message.
    pub fn start_notification_loop<H>(&self, handler: H) -> Result<()>
    where
        H: FnMut(T) -> Result<()> + Send + 'static,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(PollError::Misuse(
                "driver already started in another mode".to_string(),
            ));
        }
        self.shared.set_mode(DriverMode::LoopRunning);

        let mut poll_fn = self
            .shared
            .poll_fn
            .lock()
            .unwrap()
            .take()
            .expect("poll function already taken by a prior start");
        let mut handler: Handler<T> = Box::new(handler);
        let shared = Arc::clone(&self.shared);

        let join = thread::Builder::new()
            .name("smartpoll-driver".to_string())
            .spawn(move || run_notification_loop(&shared, &mut poll_fn, &mut handler))
            .map_err(|err| {
                PollError::Misuse(format!("failed to spawn poll driver thread: {err}"))
            })?;

        *self.worker.lock().unwrap() = Some(join);
        Ok(())
    }

    /// Signals cancellation and waits for the background worker, if any, to
    /// exit. Idempotent: a second call is a no-op. Safe to call even if
    /// [`start_notification_loop`](Self::start_notification_loop) was never
    /// called. Re-surfaces a captured [`PollFunction`](PollError::PollFunction)
    /// or [`Handler`](PollError::Handler) failure from a `LoopRunning` run.
    pub fn stop(&self) -> Result<()> {
        self.shared.cancel.signal();

        if let Some(handle) = self.worker.lock().unwrap().take() {
            if handle.join().is_err() {
                warn!("poll driver worker thread panicked");
            }
        }
        self.shared.set_mode(DriverMode::Stopped);

        match self.shared.failure.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<T: Send + 'static> Drop for PollDriver<T> {
    /// Signals cancellation so an abandoned `LoopRunning` worker doesn't
    /// poll forever, matching `kopi::locking::scoped_guard::ScopedPackageLockGuard`'s
    /// release-on-drop idiom. Does not join the worker thread: joining from
    /// `Drop` can deadlock if the last handle is dropped from within the
    /// handler itself, and a caller that wants to observe a captured
    /// failure must call [`stop`](Self::stop) explicitly anyway.
    fn drop(&mut self) {
        self.shared.cancel.signal();
    }
}

fn run_notification_loop<T>(shared: &Arc<Shared<T>>, poll_fn: &mut PollFn<T>, handler: &mut Handler<T>) {
    let mut empty_count: u64 = 0;
    loop {
        if shared.cancel.is_signaled() {
            return;
        }

        match poll_once(shared, poll_fn) {
            Ok(PollOutcome::Present(payload)) => {
                empty_count = 0;
                if let Err(err) = handler(payload) {
                    debug!("handler failed, stopping notification loop: {err}");
                    *shared.failure.lock().unwrap() = Some(err);
                    return;
                }
                // Poll again immediately; a freshly-drained source should be
                // polled aggressively for its next payload.
            }
            Ok(PollOutcome::Empty) => {
                empty_count += 1;
                let delay = shared.backoff.delay_for(empty_count);
                if cancelable_sleep(delay, &shared.cancel) == WakeReason::Canceled {
                    return;
                }
            }
            Err(err) => {
                debug!("poll function failed, stopping notification loop: {err}");
                *shared.failure.lock().unwrap() = Some(err);
                return;
            }
        }
    }
}
