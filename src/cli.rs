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

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::common::config::{AppConfig, CollectorConfig};
use crate::diagnostics::Vendor;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments for the default `plugin` mode, so netdata can start the
    /// binary as `fpga-monitor <update_every>`.
    #[command(flatten)]
    pub plugin: PluginArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run as a netdata external plugin, writing to stdout. (default)
    Plugin(PluginArgs),
    /// Run in API mode, exposing metrics in Prometheus format.
    Api(ApiArgs),
    /// Discover the FPGAs, print the charts and one sample, then exit.
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Configuration file. Defaults to /etc/fpga-monitor/fpga.toml if present.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// PostgreSQL connection string.
    #[arg(long)]
    pub dsn: Option<String>,
    /// Expected number of FPGAs.
    #[arg(long)]
    pub fpga_count: Option<usize>,
    /// Add processing-unit utilization and DDR transfer charts.
    #[arg(long)]
    pub pu_ddr_stats: bool,
    /// Collect temperature and power with the vendor tool.
    #[arg(long)]
    pub check_temp_power: bool,
    /// Path to Intel `fpgainfo`.
    #[arg(long)]
    pub intel_cmd: Option<String>,
    /// Path to Xilinx `xbutil`.
    #[arg(long)]
    pub xilinx_cmd: Option<String>,
    /// Do not publish the `fpga-total` charts.
    #[arg(long)]
    pub no_total: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PluginArgs {
    /// Seconds between updates, as passed by netdata.
    pub update_every: Option<u64>,
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// The port to listen on for the API server.
    #[arg(short, long, default_value_t = AppConfig::DEFAULT_API_PORT)]
    pub port: u16,
    /// The interval in seconds at which to poll the FPGAs.
    #[arg(short, long)]
    pub interval: Option<u64>,
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

impl CommonArgs {
    /// Read the configuration file, then apply the command-line overrides.
    /// The result is not validated yet.
    pub fn load_config(&self) -> Result<CollectorConfig> {
        let mut config = match &self.config {
            Some(path) => CollectorConfig::load(path)?,
            None if Path::new(AppConfig::DEFAULT_CONFIG_PATH).exists() => {
                CollectorConfig::load(AppConfig::DEFAULT_CONFIG_PATH)?
            }
            None => CollectorConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut CollectorConfig) {
        if let Some(dsn) = &self.dsn {
            config.dsn = dsn.clone();
        }
        if let Some(count) = self.fpga_count {
            config.fpga_count = Some(count);
        }
        if self.pu_ddr_stats {
            config.pu_ddr_stats_enable = true;
        }
        if self.check_temp_power {
            config.check_temp_power = true;
        }
        if let Some(command) = &self.intel_cmd {
            config.intel_cmd = Some(command.clone());
            config.vendor.get_or_insert(Vendor::Intel);
        }
        if let Some(command) = &self.xilinx_cmd {
            config.xilinx_cmd = Some(command.clone());
            config.vendor.get_or_insert(Vendor::Xilinx);
        }
        if self.no_total {
            config.include_total = false;
        }
    }
}
