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

//! End-to-end driver scenarios exercised through the public API only.

use smart_poll::{DriverConfig, PollDriver, PollError, PollResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn config(max_idle_ms: u64) -> DriverConfig {
    DriverConfig::new(Duration::from_millis(max_idle_ms)).unwrap()
}

#[test]
fn blocking_wait_surfaces_payload_after_three_seconds_within_twelve_empty_polls() {
    let start = Instant::now();
    let driver = PollDriver::new(
        move || {
            if start.elapsed() >= Duration::from_secs(3) {
                Ok(PollResult::Present("ready"))
            } else {
                Ok(PollResult::Empty)
            }
        },
        config(500),
    )
    .unwrap();

    let counters = driver.counters();
    let payload = driver.wait_for_payload().unwrap();

    assert_eq!(payload, Some("ready"));
    assert_eq!(counters.payload_poll_count(), 1);
    assert!(counters.empty_poll_count() <= 12);
    assert!(start.elapsed() < Duration::from_millis(3_600));
}

#[test]
fn callback_loop_runs_for_about_three_seconds_and_stops_cleanly() {
    let count = Arc::new(AtomicUsize::new(0));
    let count_for_fn = Arc::clone(&count);

    let driver = PollDriver::new(
        move || {
            let n = count_for_fn.fetch_add(1, Ordering::SeqCst);
            if n % 4 == 0 {
                Ok(PollResult::Present(n))
            } else {
                Ok(PollResult::Empty)
            }
        },
        config(100),
    )
    .unwrap();

    let delivered = Arc::new(AtomicUsize::new(0));
    let delivered_for_handler = Arc::clone(&delivered);
    driver
        .start_notification_loop(move |_payload| {
            delivered_for_handler.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    thread::sleep(Duration::from_millis(3_100));
    driver.stop().unwrap();

    assert!(delivered.load(Ordering::SeqCst) >= 1);
    assert_eq!(driver.payload_poll_count(), delivered.load(Ordering::SeqCst) as u64);
}

#[test]
fn always_empty_source_yields_a_small_bounded_number_of_empty_polls_over_one_second() {
    let driver = PollDriver::new(
        move || Ok::<_, PollError>(PollResult::<()>::Empty),
        config(200),
    )
    .unwrap();

    driver.start_notification_loop(|_| Ok(())).unwrap();
    thread::sleep(Duration::from_millis(1_000));
    driver.stop().unwrap();

    let empties = driver.empty_poll_count();
    assert_eq!(driver.payload_poll_count(), 0);
    assert!((3..=20).contains(&empties), "empties = {empties}");
}

#[test]
fn cancellation_stops_a_slow_poll_function_within_the_promptness_budget() {
    let driver = PollDriver::new(
        move || {
            thread::sleep(Duration::from_millis(30));
            Ok::<_, PollError>(PollResult::<()>::Empty)
        },
        config(50),
    )
    .unwrap();

    let cancel = driver.cancel_signal();
    driver.start_notification_loop(|_| Ok(())).unwrap();
    thread::sleep(Duration::from_millis(100));

    let began = Instant::now();
    cancel.signal();
    driver.stop().unwrap();
    assert!(began.elapsed() <= Duration::from_millis(350));
}

#[test]
fn a_driver_can_only_be_started_once() {
    let driver = PollDriver::new(
        move || Ok::<_, PollError>(PollResult::<()>::Empty),
        config(50),
    )
    .unwrap();

    driver.start_notification_loop(|_| Ok(())).unwrap();
    let second = driver.start_notification_loop(|_| Ok(()));
    assert!(matches!(second, Err(PollError::Misuse(_))));
    driver.stop().unwrap();
}

#[test]
fn handler_errors_propagate_through_stop() {
    let driver = PollDriver::new(
        move || Ok::<_, PollError>(PollResult::Present(())),
        config(50),
    )
    .unwrap();

    driver
        .start_notification_loop(|_| Err(PollError::Handler("sink unavailable".to_string())))
        .unwrap();

    thread::sleep(Duration::from_millis(100));
    let err = driver.stop().unwrap_err();
    assert!(matches!(err, PollError::Handler(_)));
}

#[test]
fn handler_runs_on_the_poll_thread_with_no_overlap() {
    // Proof that the next poll doesn't start until the handler returns:
    // an overlap would let `active` observe 2.
    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));
    let remaining = Arc::new(Mutex::new(20));

    let remaining_for_fn = Arc::clone(&remaining);
    let driver = PollDriver::new(
        move || {
            let mut left = remaining_for_fn.lock().unwrap();
            if *left == 0 {
                Ok(PollResult::Empty)
            } else {
                *left -= 1;
                Ok(PollResult::Present(()))
            }
        },
        config(20),
    )
    .unwrap();

    let active_for_handler = Arc::clone(&active);
    let max_active_for_handler = Arc::clone(&max_active);
    driver
        .start_notification_loop(move |_| {
            let now = active_for_handler.fetch_add(1, Ordering::SeqCst) + 1;
            max_active_for_handler.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            active_for_handler.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

    thread::sleep(Duration::from_millis(400));
    driver.stop().unwrap();

    assert_eq!(max_active.load(Ordering::SeqCst), 1);
}
