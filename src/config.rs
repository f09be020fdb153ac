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

//! Construction-time configuration for [`PollDriver`] and [`QueueMonitor`],
//! with environment-variable overrides resolved in `env > default` order —
//! the same precedence idea as `kopi`'s layered configuration, reduced to
//! the handful of knobs this crate actually exposes.
//!
//! [`PollDriver`]: crate::driver::PollDriver
//! [`QueueMonitor`]: crate::queue::QueueMonitor

use crate::backoff::BackoffPolicy;
use crate::error::{PollError, Result};
use std::env;
use std::time::Duration;

const ENV_MAX_IDLE_MS: &str = "SMARTPOLL_MAX_IDLE_MS";
const ENV_BACKOFF_FLOOR_MS: &str = "SMARTPOLL_BACKOFF_FLOOR_MS";
const ENV_VISIBILITY_MS: &str = "SMARTPOLL_VISIBILITY_MS";

const DEFAULT_MAX_IDLE_MS: u64 = 500;
const DEFAULT_BACKOFF_FLOOR_MS: u64 = 10;
const DEFAULT_VISIBILITY_MS: u64 = 30_000;

/// Construction-time configuration for a [`PollDriver`](crate::driver::PollDriver).
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    max_idle_delay: Duration,
    backoff_floor: Duration,
}

impl DriverConfig {
    /// `max_idle_delay` must be strictly positive.
    pub fn new(max_idle_delay: Duration) -> Result<Self> {
        if max_idle_delay.is_zero() {
            return Err(PollError::Config(
                "max_idle_delay must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_idle_delay,
            backoff_floor: Duration::from_millis(DEFAULT_BACKOFF_FLOOR_MS),
        })
    }

    pub fn with_backoff_floor(mut self, floor: Duration) -> Self {
        self.backoff_floor = floor;
        self
    }

    /// Reads `SMARTPOLL_MAX_IDLE_MS` / `SMARTPOLL_BACKOFF_FLOOR_MS` from the
    /// environment, falling back to crate defaults (500ms cap, 10ms floor)
    /// when unset or unparsable.
    pub fn from_env() -> Result<Self> {
        let max_idle_ms = env_u64(ENV_MAX_IDLE_MS).unwrap_or(DEFAULT_MAX_IDLE_MS);
        let floor_ms = env_u64(ENV_BACKOFF_FLOOR_MS).unwrap_or(DEFAULT_BACKOFF_FLOOR_MS);
        Self::new(Duration::from_millis(max_idle_ms))
            .map(|config| config.with_backoff_floor(Duration::from_millis(floor_ms)))
    }

    pub fn max_idle_delay(&self) -> Duration {
        self.max_idle_delay
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.backoff_floor, self.max_idle_delay)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_idle_delay: Duration::from_millis(DEFAULT_MAX_IDLE_MS),
            backoff_floor: Duration::from_millis(DEFAULT_BACKOFF_FLOOR_MS),
        }
    }
}

/// Construction-time configuration for a [`QueueMonitor`](crate::queue::QueueMonitor).
#[derive(Debug, Clone, Copy)]
pub struct QueueMonitorConfig {
    driver: DriverConfig,
    visibility_timeout: Duration,
}

impl QueueMonitorConfig {
    /// `visibility_timeout` must be strictly positive — spec.md §9
    /// recommends rejecting non-positive values; the cloud queue's own
    /// upper bound (e.g. a ~7 day cap) is left to the `MessageQueue`
    /// implementation, which is the only party that knows it.
    pub fn new(driver: DriverConfig, visibility_timeout: Duration) -> Result<Self> {
        if visibility_timeout.is_zero() {
            return Err(PollError::Config(
                "visibility_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            driver,
            visibility_timeout,
        })
    }

    /// Reads `SMARTPOLL_VISIBILITY_MS` on top of [`DriverConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        let driver = DriverConfig::from_env()?;
        let visibility_ms = env_u64(ENV_VISIBILITY_MS).unwrap_or(DEFAULT_VISIBILITY_MS);
        Self::new(driver, Duration::from_millis(visibility_ms))
    }

    pub fn driver(&self) -> DriverConfig {
        self.driver
    }

    pub fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}
