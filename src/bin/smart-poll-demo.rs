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

//! Minimal demonstration of `PollDriver` against a synthetic source: a
//! payload shows up every third poll, everything else is empty. Run with
//! `RUST_LOG=smart_poll=debug` to see the back-off growing between polls.

use log::info;
use smart_poll::{logging, DriverConfig, PollDriver, PollResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

fn main() {
    logging::init_logger(1);

    let tick = AtomicU64::new(0);
    let config = DriverConfig::new(Duration::from_millis(250)).expect("valid max_idle_delay");
    let driver = PollDriver::new(
        move || {
            let n = tick.fetch_add(1, Ordering::SeqCst);
            if n % 3 == 2 {
                Ok(PollResult::Present(n))
            } else {
                Ok(PollResult::Empty)
            }
        },
        config,
    )
    .expect("driver construction");

    let counters = driver.counters();
    match driver.wait_for_payload() {
        Ok(Some(payload)) => info!("received payload {payload} after {} empty polls", counters.empty_poll_count()),
        Ok(None) => info!("canceled before a payload arrived"),
        Err(err) => eprintln!("poll failed: {err}"),
    }
}
