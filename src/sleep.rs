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

//! Cancelable sleep: blocks up to a duration, waking early if canceled.

use crate::cancel::CancelSignal;
use std::time::Duration;

/// Why [`cancelable_sleep`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// The full duration elapsed without cancellation.
    Timeout,
    /// The signal fired before the duration elapsed.
    Canceled,
}

/// Blocks the calling thread for up to `duration`, waking early and
/// returning [`WakeReason::Canceled`] as soon as `cancel` is signaled.
///
/// Implemented with a condition variable, not a busy-poll loop: the thread
/// consumes no CPU while waiting and wakes within a small, OS-scheduler
/// bound slack of the signal firing (well under the ~50ms target this
/// primitive is held to).
pub fn cancelable_sleep(duration: Duration, cancel: &CancelSignal) -> WakeReason {
    if cancel.is_signaled() {
        return WakeReason::Canceled;
    }
    if duration.is_zero() {
        return WakeReason::Timeout;
    }

    let (flag, condvar) = cancel.condvar_pair();
    let guard = flag.lock().unwrap();
    let (guard, timeout_result) = condvar
        .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
        .unwrap();

    if *guard {
        WakeReason::Canceled
    } else if timeout_result.timed_out() {
        WakeReason::Timeout
    } else {
        // Spurious wake with the flag still false: treat as a (short) timeout
        // rather than spin, matching the "do not busy-spin" requirement.
        WakeReason::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn sleeps_the_full_duration_when_not_canceled() {
        let cancel = CancelSignal::new();
        let start = Instant::now();
        let reason = cancelable_sleep(Duration::from_millis(100), &cancel);
        assert_eq!(reason, WakeReason::Timeout);
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn returns_immediately_if_already_canceled() {
        let cancel = CancelSignal::new();
        cancel.signal();
        let start = Instant::now();
        let reason = cancelable_sleep(Duration::from_secs(10), &cancel);
        assert_eq!(reason, WakeReason::Canceled);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn wakes_promptly_on_cancel_from_another_thread() {
        let cancel = Arc::new(CancelSignal::new());
        let waiter_cancel = Arc::clone(&cancel);

        let start = Instant::now();
        let handle = thread::spawn(move || cancelable_sleep(Duration::from_secs(10), &waiter_cancel));

        thread::sleep(Duration::from_millis(50));
        cancel.signal();

        let reason = handle.join().unwrap();
        assert_eq!(reason, WakeReason::Canceled);
        assert!(
            start.elapsed() < Duration::from_millis(350),
            "cancellation took too long: {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn zero_duration_returns_timeout_without_blocking() {
        let cancel = CancelSignal::new();
        let start = Instant::now();
        let reason = cancelable_sleep(Duration::ZERO, &cancel);
        assert_eq!(reason, WakeReason::Timeout);
        assert!(start.elapsed() < Duration::from_millis(10));
    }
}
