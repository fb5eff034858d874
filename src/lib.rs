// Copyright 2025 Lablup Inc. and Jeongkyu Shin
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

//! FPGA accelerator telemetry collector.
//!
//! Stats are read from the `swarm64da` PostgreSQL extension and, optionally,
//! from the vendor diagnostic tools. A static catalog is expanded against the
//! devices discovered at start-up, and every poll yields a flat [`Snapshot`]
//! keyed `fpga-N-<column>` that the netdata and Prometheus publishers render.

pub mod api;
pub mod app_state;
pub mod catalog;
pub mod cli;
pub mod collector;
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod netdata;
pub mod parsing;
pub mod registry;
pub mod sampler;
pub mod source;
pub mod traits;
pub mod utils;

pub mod common {
    pub mod config;
}

pub use collector::FpgaCollector;
pub use error::{Error, Result};
pub use registry::{SeriesRegistry, Snapshot};
pub use sampler::Sample;
pub use traits::Poller;
