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

//! A process-wide [`CancelSignal`] tied to `SIGINT`/`SIGTERM`, registered
//! lazily and shared by every driver that opts into it.
//!
//! This is deliberately *not* an ambient default: [`PollDriver::new`] wires a
//! fresh, driver-local signal. Only [`PollDriver::new_with_process_cancellation`]
//! subscribes to this global token, matching spec.md's design note that
//! process-exit cancellation "should be explicit ... not an ambient
//! singleton".
//!
//! [`PollDriver::new`]: crate::driver::PollDriver::new
//! [`PollDriver::new_with_process_cancellation`]: crate::driver::PollDriver::new_with_process_cancellation

use crate::cancel::CancelSignal;
use log::warn;
use signal_hook::SigId;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

#[cfg(windows)]
use signal_hook::consts::signal::SIGBREAK;

struct ProcessCancellationRegistry {
    signal: CancelSignal,
    _handles: Vec<SigId>,
}

impl ProcessCancellationRegistry {
    fn new() -> Self {
        let signal = CancelSignal::new();
        let mut handles = Vec::new();

        for sig in registered_signals() {
            match register_flag(*sig, &signal) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    warn!("Failed to register process cancellation handler for signal {sig}: {err}")
                }
            }
        }

        Self {
            signal,
            _handles: handles,
        }
    }
}

/// Bridges `signal_hook::flag::register`'s `Arc<AtomicBool>` contract to a
/// [`CancelSignal`] by spawning a watcher thread that forwards the flag flip
/// into a condvar notification. The flag itself still flips from signal
/// context (async-signal-safe); only the forwarding thread, not the signal
/// handler, ever touches the mutex/condvar.
fn register_flag(sig: i32, signal: &CancelSignal) -> std::io::Result<SigId> {
    let flag = Arc::new(AtomicBool::new(false));
    let handle = signal_hook::flag::register(sig, Arc::clone(&flag))?;

    let forwarded = signal.clone();
    std::thread::Builder::new()
        .name("smart-poll-sigwatch".into())
        .spawn(move || {
            loop {
                if flag.load(Ordering::SeqCst) {
                    forwarded.signal();
                    return;
                }
                std::thread::sleep(std::time::Duration::from_millis(25));
            }
        })
        .expect("failed to spawn signal forwarding thread");

    Ok(handle)
}

fn registered_signals() -> &'static [i32] {
    #[cfg(windows)]
    {
        static SIGNALS: [i32; 3] = [SIGINT, SIGTERM, SIGBREAK];
        &SIGNALS
    }

    #[cfg(not(windows))]
    {
        static SIGNALS: [i32; 2] = [SIGINT, SIGTERM];
        &SIGNALS
    }
}

static GLOBAL_REGISTRY: OnceLock<ProcessCancellationRegistry> = OnceLock::new();

/// Returns the process-wide cancellation signal, registering `SIGINT`
/// (and, on Windows, `SIGBREAK`) handlers the first time it is called.
pub fn process_cancel_signal() -> CancelSignal {
    GLOBAL_REGISTRY.get_or_init(ProcessCancellationRegistry::new).signal.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // The process-wide registry lives behind a `OnceLock`: any test that
    // touches it must run `#[serial]` so a future test added to this module
    // can't race the first call that initializes it, matching kopi's own
    // convention for tests that share process-global state.
    #[test]
    #[serial]
    fn returns_the_same_signal_on_repeated_calls() {
        let first = process_cancel_signal();
        let second = process_cancel_signal();
        assert!(!first.is_signaled());
        assert!(!second.is_signaled());
    }
}
