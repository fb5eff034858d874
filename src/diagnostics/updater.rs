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

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::command::{execute_command, CommandOptions};
use super::config::DiagnosticsConfig;
use super::parser::parse_reading;
use super::store::DiagnosticStore;
use crate::error::Result;

/// Runs the vendor tool for every device on its own timer and writes the
/// parsed readings into a [`DiagnosticStore`].
pub struct DiagnosticsUpdater {
    store: Arc<DiagnosticStore>,
    shutdown_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl DiagnosticsUpdater {
    /// Validate `config` and start the background thread. The first refresh
    /// runs immediately.
    pub fn start(config: DiagnosticsConfig, store: Arc<DiagnosticStore>) -> Result<Self> {
        config.validate()?;

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let thread_store = store.clone();
        tracing::info!(
            "Starting {} diagnostics via '{}' every {:?} for {} device(s)",
            config.vendor.as_str(),
            config.command,
            config.interval(),
            config.device_indices.len()
        );

        let handle = thread::Builder::new()
            .name("fpga-diagnostics".to_string())
            .spawn(move || loop {
                refresh_once(&config, &thread_store);
                // The shutdown channel doubles as the timer.
                match shutdown_rx.recv_timeout(config.interval()) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            store,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn store(&self) -> Arc<DiagnosticStore> {
        self.store.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signal the thread and wait for the refresh in progress to finish.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Diagnostics thread panicked");
            }
        }
    }
}

impl Drop for DiagnosticsUpdater {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Query every configured device once. Returns the number of readings stored.
///
/// Failed runs and unmatched output leave the previous reading in place.
pub fn refresh_once(config: &DiagnosticsConfig, store: &DiagnosticStore) -> usize {
    let options = CommandOptions {
        timeout: config.command_timeout,
        check_status: true,
    };
    let mut stored = 0;

    for &index in &config.device_indices {
        for invocation in config.invocations(index) {
            let output = match execute_command(&config.command, &invocation.args, &options) {
                Ok(output) => output,
                Err(e) => {
                    tracing::debug!("Diagnostics for fpga-{index} failed: {e}");
                    continue;
                }
            };
            for &metric in invocation.metrics {
                match parse_reading(config.vendor, metric, &output.stdout) {
                    Some(value) => {
                        store.record(index, metric, value);
                        stored += 1;
                    }
                    None => tracing::debug!(
                        "No {} reading for fpga-{index} in {} output",
                        metric.column(),
                        config.vendor.as_str()
                    ),
                }
            }
        }
    }

    stored
}
