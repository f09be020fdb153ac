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

use thiserror::Error;

/// Errors produced by the poll driver and its queue monitor specialization.
///
/// Cancellation is deliberately not represented here: a canceled wait ends
/// with `Ok(None)` from `wait_for_payload` or `Ok(())` from `stop`, never an
/// `Err`.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("invalid poll driver configuration: {0}")]
    Config(String),

    #[error("poll driver misuse: {0}")]
    Misuse(String),

    #[error("poll function failed: {0}")]
    PollFunction(String),

    #[error("handler failed: {0}")]
    Handler(String),
}

pub type Result<T> = std::result::Result<T, PollError>;
