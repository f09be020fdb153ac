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

//! The adaptive back-off policy driving the delay between empty polls.

use std::cmp;
use std::time::Duration;

/// Pure function of consecutive-empty-poll count to next sleep duration.
///
/// `delay_for(0, _)` is always zero, so the first poll attempt never waits.
/// From there the delay grows geometrically (ratio 2.0) from `floor` until
/// it hits `cap`, after which it stays at `cap` forever. The curve is
/// deterministic and carries no internal mutable state — the caller already
/// tracks `empty_count`, so the policy only needs to map it to a duration.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    floor: Duration,
    cap: Duration,
}

impl BackoffPolicy {
    /// `floor` is the delay after the first empty poll; `cap` bounds every
    /// subsequent delay. `cap` must be strictly positive — callers construct
    /// this through [`crate::config::DriverConfig`], which validates that.
    pub fn new(floor: Duration, cap: Duration) -> Self {
        Self {
            floor: cmp::min(floor, cap),
            cap,
        }
    }

    /// Matches `kopi::locking::acquisition::PollingBackoff`'s default floor
    /// of 10ms, with the cap supplied by the driver's configuration.
    pub fn with_cap(cap: Duration) -> Self {
        Self::new(Duration::from_millis(10), cap)
    }

    pub fn cap(&self) -> Duration {
        self.cap
    }

    /// The sleep that should follow the `empty_count`-th consecutive empty
    /// poll. `delay_for(0, ..)` is always `Duration::ZERO`.
    pub fn delay_for(&self, empty_count: u64) -> Duration {
        if empty_count == 0 {
            return Duration::ZERO;
        }

        // floor * 2^(empty_count - 1), saturating before it can overflow.
        let shift = (empty_count - 1).min(63) as u32;
        let scaled = self.floor.as_nanos().checked_shl(shift);
        match scaled {
            Some(nanos) if nanos <= self.cap.as_nanos() => {
                Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
            }
            _ => self.cap,
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::with_cap(Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_sleeps_before_the_first_attempt() {
        let policy = BackoffPolicy::with_cap(Duration::from_millis(500));
        assert_eq!(policy.delay_for(0), Duration::ZERO);
    }

    #[test]
    fn doubles_until_the_cap_then_holds() {
        let policy = BackoffPolicy::new(Duration::from_millis(10), Duration::from_millis(80));
        assert_eq!(policy.delay_for(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for(2), Duration::from_millis(20));
        assert_eq!(policy.delay_for(3), Duration::from_millis(40));
        assert_eq!(policy.delay_for(4), Duration::from_millis(80));
        assert_eq!(policy.delay_for(5), Duration::from_millis(80));
        assert_eq!(policy.delay_for(100), Duration::from_millis(80));
    }

    #[test]
    fn is_monotonically_non_decreasing_and_bounded() {
        let policy = BackoffPolicy::with_cap(Duration::from_millis(500));
        let mut previous = Duration::ZERO;
        for n in 1..=30 {
            let delay = policy.delay_for(n);
            assert!(delay >= previous);
            assert!(delay <= policy.cap());
            previous = delay;
        }
    }

    #[test]
    fn reaches_cap_within_twenty_steps_for_any_cap_at_least_50ms() {
        for cap_ms in [50, 100, 250, 500, 1_000, 5_000] {
            let policy = BackoffPolicy::with_cap(Duration::from_millis(cap_ms));
            let cap = policy.cap();
            let reached = (1..=20).any(|n| policy.delay_for(n) == cap);
            assert!(reached, "cap {cap_ms}ms not reached within 20 steps");
            for n in 20..25 {
                assert_eq!(policy.delay_for(n), cap);
            }
        }
    }

    #[test]
    fn three_second_wait_at_500ms_cap_needs_at_most_twelve_empty_polls() {
        let policy = BackoffPolicy::with_cap(Duration::from_millis(500));
        let target = Duration::from_secs(3);
        let mut elapsed = Duration::ZERO;
        let mut empties = 0u64;
        while elapsed < target && empties < 1_000 {
            empties += 1;
            elapsed += policy.delay_for(empties);
        }
        assert!(empties <= 12, "needed {empties} empty polls to cover 3s");
    }
}
