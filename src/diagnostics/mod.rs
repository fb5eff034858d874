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

//! Temperature and power side-channel.
//!
//! Vendor tools are slow, so they run on their own timer thread
//! ([`DiagnosticsUpdater`]) and the poll path only reads the cached readings
//! from [`DiagnosticStore`].

pub mod command;
pub mod config;
pub mod parser;
pub mod store;
pub mod updater;

pub use config::{DiagnosticMetric, DiagnosticsConfig, Vendor, MIN_INTERVAL_SECS};
pub use store::DiagnosticStore;
pub use updater::{refresh_once, DiagnosticsUpdater};
