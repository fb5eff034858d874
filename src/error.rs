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

//! Unified error types for the fpga-monitor library.
//!
//! Covers start-up (configuration, device discovery), the database data
//! source, and vendor diagnostic commands.
//!
//! # Example
//!
//! ```rust,no_run
//! use fpga_monitor::common::config::CollectorConfig;
//! use fpga_monitor::Result;
//!
//! fn load() -> Result<CollectorConfig> {
//!     let config = CollectorConfig::load("/etc/fpga-monitor/fpga.toml")?;
//!     config.validate()?;
//!     Ok(config)
//! }
//! ```

use thiserror::Error;

/// The main error type for fpga-monitor operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file or a command-line override is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The data source could not be reached, or the extension could not be
    /// created.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The stats query failed on an open connection.
    ///
    /// The sampler drops its connection when this happens and reconnects on
    /// the next poll.
    #[error("Query failed: {0}")]
    Query(String),

    /// A row reported a hardware id that was not seen during start-up
    /// enumeration.
    #[error("Unknown FPGA id '{0}' (device set is fixed at start-up)")]
    UnknownDevice(String),

    /// The enumerated device count does not match the configured `fpga_count`.
    #[error("Expected {expected} FPGA(s) but the data source reports {found}")]
    DeviceCountMismatch { expected: usize, found: usize },

    /// Start-up enumeration returned no devices.
    #[error("No FPGA devices found")]
    NoDevicesFound,

    /// A vendor diagnostic command could not be run.
    #[error("Diagnostic command failed: {0}")]
    Command(String),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<tokio_postgres::Error> for Error {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            Error::Connection(err.to_string())
        } else {
            Error::Query(err.to_string())
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    /// Errors a publisher loop must not retry.
    ///
    /// The device set is fixed at start-up, so a new device keeps failing
    /// every poll until the process is restarted and enumerates again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::UnknownDevice(_))
    }
}

/// A specialized Result type for fpga-monitor operations.
pub type Result<T> = std::result::Result<T, Error>;
