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

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{ComponentTag, MetricSource};
use crate::diagnostics::{DiagnosticsConfig, Vendor};
use crate::error::{Error, Result};

/// Application configuration constants
pub struct AppConfig;

impl AppConfig {
    // Collection
    pub const DEFAULT_UPDATE_EVERY_SECS: u64 = 1;
    pub const DEFAULT_TEMP_POWER_UPDATE_EVERY_SECS: u64 = 10;
    pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 5;

    // Publishing
    pub const DEFAULT_API_PORT: u16 = 9101;
    pub const NETDATA_CHART_TYPE: &'static str = "fpga";
    pub const NETDATA_BASE_PRIORITY: u32 = 90000;
    /// Values are sent to netdata as integers scaled by this factor.
    pub const NETDATA_PRECISION: i64 = 1000;
    pub const METRIC_PREFIX: &'static str = "fpga_monitor";

    pub const DEFAULT_CONFIG_PATH: &'static str = "/etc/fpga-monitor/fpga.toml";
}

/// Collector settings, read from a TOML file and overridable from the CLI.
///
/// ```toml
/// dsn = "host=localhost user=netdata dbname=postgres"
/// fpga_count = 2
/// pu_ddr_stats_enable = true
/// check_temp_power = true
/// intel_cmd = "/usr/bin/fpgainfo"
/// update_every = 1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectorConfig {
    /// PostgreSQL connection string (key/value or URL form)
    pub dsn: String,
    /// Expected number of FPGAs; start-up fails if enumeration disagrees
    pub fpga_count: Option<usize>,
    /// Add processing-unit and DDR charts
    pub pu_ddr_stats_enable: bool,
    /// Run the vendor tools for temperature and power
    pub check_temp_power: bool,
    pub intel_cmd: Option<String>,
    pub xilinx_cmd: Option<String>,
    /// Vendor tool to use; inferred from whichever command is set when absent
    pub vendor: Option<Vendor>,
    /// Poll interval in seconds
    pub update_every: u64,
    /// Vendor tool interval in seconds, never below 10
    pub temp_power_update_every: u64,
    pub command_timeout_secs: u64,
    /// Publish `fpga-total` charts when more than one FPGA is present
    pub include_total: bool,
    /// Explicit component list; derived from the flags above when absent
    pub components: Option<Vec<ComponentTag>>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            fpga_count: None,
            pu_ddr_stats_enable: false,
            check_temp_power: false,
            intel_cmd: None,
            xilinx_cmd: None,
            vendor: None,
            update_every: AppConfig::DEFAULT_UPDATE_EVERY_SECS,
            temp_power_update_every: AppConfig::DEFAULT_TEMP_POWER_UPDATE_EVERY_SECS,
            command_timeout_secs: AppConfig::DEFAULT_COMMAND_TIMEOUT_SECS,
            include_total: true,
            components: None,
        }
    }
}

impl CollectorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dsn.trim().is_empty() {
            return Err(Error::Config("dsn is required".to_string()));
        }
        if self.update_every == 0 {
            return Err(Error::Config("update_every must be at least 1".to_string()));
        }
        if self.fpga_count == Some(0) {
            return Err(Error::Config("fpga_count must be at least 1".to_string()));
        }
        if self.command_timeout_secs == 0 {
            return Err(Error::Config(
                "command_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.components.as_ref().is_some_and(|tags| tags.is_empty()) {
            return Err(Error::Config("components must not be empty".to_string()));
        }

        let wants_diagnostics = self
            .component_tags()
            .iter()
            .any(|tag| tag.definition().source == MetricSource::Diagnostics);
        if wants_diagnostics && !self.check_temp_power {
            return Err(Error::Config(
                "temps/powers components require check_temp_power".to_string(),
            ));
        }
        if self.check_temp_power {
            self.diagnostic_command()?;
        }
        Ok(())
    }

    /// Components to publish, in chart order.
    pub fn component_tags(&self) -> Vec<ComponentTag> {
        match &self.components {
            Some(tags) => tags.clone(),
            None => ComponentTag::defaults(self.pu_ddr_stats_enable, self.check_temp_power),
        }
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_every)
    }

    /// Vendor and tool path for the diagnostics side-channel.
    pub fn diagnostic_command(&self) -> Result<(Vendor, String)> {
        let command_for = |vendor: Vendor| match vendor {
            Vendor::Intel => self.intel_cmd.clone(),
            Vendor::Xilinx => self.xilinx_cmd.clone(),
        };

        let vendor = match self.vendor {
            Some(vendor) => vendor,
            None if self.intel_cmd.is_some() => Vendor::Intel,
            None if self.xilinx_cmd.is_some() => Vendor::Xilinx,
            None => {
                return Err(Error::Config(
                    "check_temp_power requires intel_cmd or xilinx_cmd".to_string(),
                ))
            }
        };

        command_for(vendor)
            .filter(|command| !command.trim().is_empty())
            .map(|command| (vendor, command))
            .ok_or_else(|| {
                Error::Config(format!(
                    "vendor '{}' selected but {}_cmd is not set",
                    vendor.as_str(),
                    vendor.as_str()
                ))
            })
    }

    /// Side-channel settings for `device_count` devices, if enabled.
    pub fn diagnostics(&self, device_count: usize) -> Result<Option<DiagnosticsConfig>> {
        if !self.check_temp_power {
            return Ok(None);
        }
        let (vendor, command) = self.diagnostic_command()?;
        Ok(Some(
            DiagnosticsConfig::new(vendor, command, device_count)
                .with_interval_secs(self.temp_power_update_every)
                .with_command_timeout(Duration::from_secs(self.command_timeout_secs)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MIN_INTERVAL_SECS;

    fn base() -> CollectorConfig {
        CollectorConfig {
            dsn: "host=localhost user=netdata".to_string(),
            ..CollectorConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.update_every, 1);
        assert_eq!(config.temp_power_update_every, 10);
        assert!(config.include_total);
        assert_eq!(
            config.component_tags(),
            vec![ComponentTag::Bytes, ComponentTag::Jobs, ComponentTag::Max]
        );
    }

    #[test]
    fn test_from_toml() {
        let config = CollectorConfig::from_toml(
            r#"
            dsn = "postgres://netdata@db/postgres"
            fpga_count = 2
            pu_ddr_stats_enable = true
            check_temp_power = true
            xilinx_cmd = "/opt/xilinx/xrt/bin/xbutil"
            update_every = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.fpga_count, Some(2));
        assert_eq!(config.update_interval(), Duration::from_secs(5));
        assert_eq!(config.component_tags().len(), 7);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.diagnostic_command().unwrap(),
            (Vendor::Xilinx, "/opt/xilinx/xrt/bin/xbutil".to_string())
        );
    }

    #[test]
    fn test_from_toml_explicit_components() {
        let config = CollectorConfig::from_toml(
            r#"
            dsn = "host=db"
            components = ["max", "bytes"]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.component_tags(),
            vec![ComponentTag::Max, ComponentTag::Bytes]
        );
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = CollectorConfig::from_toml("dsn = \"x\"\nfpga_cnt = 2\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = CollectorConfig::from_toml("components = [\"gpu\"]\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate() {
        assert!(CollectorConfig::default().validate().is_err());
        assert!(base().validate().is_ok());

        let config = CollectorConfig {
            update_every: 0,
            ..base()
        };
        assert!(config.validate().is_err());

        let config = CollectorConfig {
            fpga_count: Some(0),
            ..base()
        };
        assert!(config.validate().is_err());

        let config = CollectorConfig {
            check_temp_power: true,
            ..base()
        };
        assert!(config.validate().is_err());

        let config = CollectorConfig {
            components: Some(vec![ComponentTag::Temps]),
            ..base()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_vendor_inference() {
        let config = CollectorConfig {
            check_temp_power: true,
            intel_cmd: Some("fpgainfo".to_string()),
            xilinx_cmd: Some("xbutil".to_string()),
            ..base()
        };
        assert_eq!(config.diagnostic_command().unwrap().0, Vendor::Intel);

        let config = CollectorConfig {
            vendor: Some(Vendor::Xilinx),
            ..config
        };
        assert_eq!(config.diagnostic_command().unwrap().0, Vendor::Xilinx);

        let config = CollectorConfig {
            vendor: Some(Vendor::Xilinx),
            xilinx_cmd: None,
            ..config
        };
        assert!(config.diagnostic_command().is_err());
    }

    #[test]
    fn test_diagnostics_settings() {
        assert!(base().diagnostics(2).unwrap().is_none());

        let config = CollectorConfig {
            check_temp_power: true,
            intel_cmd: Some("fpgainfo".to_string()),
            temp_power_update_every: 2,
            ..base()
        };
        let diagnostics = config.diagnostics(2).unwrap().unwrap();
        assert_eq!(diagnostics.device_indices, vec![0, 1]);
        assert_eq!(
            diagnostics.interval(),
            Duration::from_secs(MIN_INTERVAL_SECS)
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fpga.toml");
        std::fs::write(&path, "dsn = \"host=db\"\ninclude_total = false\n").unwrap();

        let config = CollectorConfig::load(&path).unwrap();
        assert_eq!(config.dsn, "host=db");
        assert!(!config.include_total);

        assert!(matches!(
            CollectorConfig::load(dir.path().join("missing.toml")),
            Err(Error::Io(_))
        ));
    }
}
