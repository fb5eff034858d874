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

use std::io;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fpga_monitor::api::run_api_mode;
use fpga_monitor::cli::{ApiArgs, CheckArgs, Cli, Commands, PluginArgs};
use fpga_monitor::collector::FpgaCollector;
use fpga_monitor::netdata;
use fpga_monitor::traits::Poller;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the plugin protocol, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fpga_monitor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match cli.command {
        Some(Commands::Plugin(args)) => run_plugin_mode(args).await,
        Some(Commands::Api(args)) => run_api(args).await,
        Some(Commands::Check(args)) => run_check(args).await,
        None => run_plugin_mode(cli.plugin).await,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn start_plugin_collector(args: &PluginArgs) -> fpga_monitor::Result<FpgaCollector> {
    let mut config = args.common.load_config()?;
    if let Some(update_every) = args.update_every {
        config.update_every = update_every;
    }
    FpgaCollector::start(&config).await
}

async fn run_plugin_mode(args: PluginArgs) -> anyhow::Result<()> {
    let mut collector = match start_plugin_collector(&args).await {
        Ok(collector) => collector,
        Err(e) => {
            tracing::error!("Cannot start FPGA collector: {e}");
            netdata::disable(io::stdout())?;
            return Err(e.into());
        }
    };

    let result = tokio::select! {
        result = netdata::run_plugin(&mut collector, io::stdout()) => result,
        _ = shutdown_signal() => Ok(()),
    };
    collector.shutdown();
    result.context("netdata plugin stopped")
}

async fn run_api(args: ApiArgs) -> anyhow::Result<()> {
    let mut config = args.common.load_config()?;
    if let Some(interval) = args.interval {
        config.update_every = interval;
    }

    let collector = FpgaCollector::start(&config)
        .await
        .context("Cannot start FPGA collector")?;
    run_api_mode(collector, args.port, shutdown_signal())
        .await
        .context("API server stopped")
}

async fn run_check(args: CheckArgs) -> anyhow::Result<()> {
    let config = args.common.load_config()?;
    let mut collector = FpgaCollector::start(&config)
        .await
        .context("Cannot start FPGA collector")?;

    println!("Devices:");
    for device in collector.identities().devices() {
        println!("  {:<12} id={}", device.name, device.id);
    }

    println!("Charts:");
    for chart in collector.describe() {
        println!("  {:<28} {} ({})", chart.id, chart.title, chart.units);
    }

    let sample = collector.poll().await.context("Sample poll failed")?;
    if !sample.fresh {
        collector.shutdown();
        anyhow::bail!("Sample poll failed: data source unavailable");
    }
    println!("Sample:");
    for (key, value) in sample.snapshot.iter() {
        println!("  {key:<56} {value}");
    }

    collector.shutdown();
    Ok(())
}
