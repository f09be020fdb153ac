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

//! A one-shot cancellation signal shared between a [`PollDriver`] and the
//! [`cancelable_sleep`] calls it makes between empty polls.
//!
//! [`PollDriver`]: crate::driver::PollDriver
//! [`cancelable_sleep`]: crate::sleep::cancelable_sleep

use std::sync::{Arc, Condvar, Mutex};

/// Shared, clonable handle to a one-shot cancellation flag.
///
/// Cloning a `CancelSignal` shares the same underlying flag and condition
/// variable; signaling through any clone wakes every sleeper waiting on any
/// other clone. A fresh driver should be given a fresh `CancelSignal` (via
/// [`CancelSignal::new`]) unless it deliberately opts into a shared,
/// process-wide token (see [`crate::process_cancellation`]).
#[derive(Debug, Clone)]
pub struct CancelSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    /// Marks the signal as canceled and wakes every current and future
    /// sleeper. Idempotent: signaling an already-canceled signal is a no-op.
    pub fn signal(&self) {
        let (flag, condvar) = &*self.inner;
        let mut cancelled = flag.lock().unwrap();
        *cancelled = true;
        condvar.notify_all();
    }

    pub fn is_signaled(&self) -> bool {
        let (flag, _) = &*self.inner;
        *flag.lock().unwrap()
    }

    pub(crate) fn condvar_pair(&self) -> &(Mutex<bool>, Condvar) {
        &self.inner
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}
