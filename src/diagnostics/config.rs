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

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shortest refresh interval for vendor tools, in seconds. The tools are slow
/// and some of them hold a device lock while running.
pub const MIN_INTERVAL_SECS: u64 = 10;

/// Default timeout for one vendor tool invocation.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 5;

/// FPGA vendor family; selects the tool invocation and output patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Intel,
    Xilinx,
}

impl Vendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Intel => "intel",
            Vendor::Xilinx => "xilinx",
        }
    }
}

/// A reading the side-channel collects per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticMetric {
    Temperature,
    Power,
}

impl DiagnosticMetric {
    pub const ALL: [DiagnosticMetric; 2] = [DiagnosticMetric::Temperature, DiagnosticMetric::Power];

    /// Catalog column fed by this reading.
    pub fn column(&self) -> &'static str {
        match self {
            DiagnosticMetric::Temperature => "temperature",
            DiagnosticMetric::Power => "power",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|metric| metric.column() == column)
    }
}

/// One vendor tool run and the readings to extract from its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    pub metrics: &'static [DiagnosticMetric],
}

/// Configuration for the diagnostics side-channel
#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    pub vendor: Vendor,
    /// Path or name of the vendor tool
    pub command: String,
    /// Requested refresh interval in seconds, floored at [`MIN_INTERVAL_SECS`]
    pub interval_secs: u64,
    pub command_timeout: Duration,
    /// Device indices to query, in assignment order
    pub device_indices: Vec<usize>,
}

impl DiagnosticsConfig {
    pub fn new(vendor: Vendor, command: impl Into<String>, device_count: usize) -> Self {
        Self {
            vendor,
            command: command.into(),
            interval_secs: MIN_INTERVAL_SECS,
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            device_indices: (0..device_count).collect(),
        }
    }

    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Effective refresh interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(MIN_INTERVAL_SECS))
    }

    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(Error::Config(format!(
                "{} diagnostic command is empty",
                self.vendor.as_str()
            )));
        }
        if self.command_timeout.is_zero() {
            return Err(Error::Config(
                "diagnostic command timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Tool runs needed to read every metric of the device at `index`.
    pub fn invocations(&self, index: usize) -> Vec<Invocation> {
        let index = index.to_string();
        match self.vendor {
            Vendor::Intel => vec![
                Invocation {
                    args: vec!["temp".to_string(), "--device".to_string(), index.clone()],
                    metrics: &[DiagnosticMetric::Temperature],
                },
                Invocation {
                    args: vec!["power".to_string(), "--device".to_string(), index],
                    metrics: &[DiagnosticMetric::Power],
                },
            ],
            Vendor::Xilinx => vec![Invocation {
                args: vec!["query".to_string(), "-d".to_string(), index],
                metrics: &[DiagnosticMetric::Temperature, DiagnosticMetric::Power],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_is_floored() {
        let config = DiagnosticsConfig::new(Vendor::Intel, "fpgainfo", 2).with_interval_secs(3);
        assert_eq!(config.interval(), Duration::from_secs(MIN_INTERVAL_SECS));

        let config = config.with_interval_secs(30);
        assert_eq!(config.interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_device_indices() {
        let config = DiagnosticsConfig::new(Vendor::Xilinx, "xbutil", 3);
        assert_eq!(config.device_indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_intel_invocations() {
        let config = DiagnosticsConfig::new(Vendor::Intel, "fpgainfo", 1);
        let invocations = config.invocations(1);
        assert_eq!(invocations.len(), 2);
        assert_eq!(invocations[0].args, vec!["temp", "--device", "1"]);
        assert_eq!(invocations[0].metrics, &[DiagnosticMetric::Temperature]);
        assert_eq!(invocations[1].args, vec!["power", "--device", "1"]);
    }

    #[test]
    fn test_xilinx_single_invocation() {
        let config = DiagnosticsConfig::new(Vendor::Xilinx, "xbutil", 1);
        let invocations = config.invocations(0);
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].args, vec!["query", "-d", "0"]);
        assert_eq!(invocations[0].metrics.len(), 2);
    }

    #[test]
    fn test_validate() {
        assert!(DiagnosticsConfig::new(Vendor::Intel, "fpgainfo", 1)
            .validate()
            .is_ok());
        assert!(DiagnosticsConfig::new(Vendor::Intel, "  ", 1)
            .validate()
            .is_err());
        assert!(DiagnosticsConfig::new(Vendor::Intel, "fpgainfo", 1)
            .with_command_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_metric_columns() {
        assert_eq!(
            DiagnosticMetric::from_column("temperature"),
            Some(DiagnosticMetric::Temperature)
        );
        assert_eq!(DiagnosticMetric::from_column("power"), Some(DiagnosticMetric::Power));
        assert_eq!(DiagnosticMetric::from_column("filter_job_count"), None);
    }
}
