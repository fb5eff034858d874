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

//! One data-fetch cycle: query, reshape, merge diagnostics, total.

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::MetricSource;
use crate::diagnostics::{DiagnosticMetric, DiagnosticStore};
use crate::error::{Error, Result};
use crate::identity::IdentityMapper;
use crate::registry::{series_key, SeriesRegistry, Snapshot};
use crate::source::{StatsConnection, StatsConnector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// The outcome of one poll.
///
/// `fresh` is false when the source could not be reached. The snapshot is
/// then only the all-zero default and publishers should not treat it as data.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub snapshot: Snapshot,
    pub fresh: bool,
}

impl Sample {
    pub fn collected(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            fresh: true,
        }
    }

    pub fn unavailable(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            fresh: false,
        }
    }
}

pub struct Sampler {
    connector: Arc<dyn StatsConnector>,
    connection: Option<Box<dyn StatsConnection>>,
    identities: IdentityMapper,
    registry: Arc<SeriesRegistry>,
    diagnostics: Option<Arc<DiagnosticStore>>,
    device_indices: HashMap<String, usize>,
    columns: Vec<&'static str>,
}

impl Sampler {
    /// The mapper is frozen here if the caller has not already done so.
    pub fn new(
        connector: Arc<dyn StatsConnector>,
        mut identities: IdentityMapper,
        registry: Arc<SeriesRegistry>,
    ) -> Self {
        identities.freeze();
        let device_indices = identities
            .devices()
            .iter()
            .map(|device| (device.name.clone(), device.index))
            .collect();
        let columns = registry.database_columns();

        Self {
            connector,
            connection: None,
            identities,
            registry,
            diagnostics: None,
            device_indices,
            columns,
        }
    }

    /// Start out connected, reusing the connection opened for discovery.
    pub fn with_connection(mut self, connection: Box<dyn StatsConnection>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn with_diagnostics(mut self, store: Arc<DiagnosticStore>) -> Self {
        self.diagnostics = Some(store);
        self
    }

    pub fn state(&self) -> ConnectionState {
        if self.connection.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn identities(&self) -> &IdentityMapper {
        &self.identities
    }

    pub fn registry(&self) -> &Arc<SeriesRegistry> {
        &self.registry
    }

    /// Produce one sample.
    ///
    /// If the source cannot be opened the all-zero default snapshot is
    /// returned, marked not fresh, and the next poll retries. A failed query
    /// drops the connection and is returned as an error. A row from a device
    /// that was not seen at start-up fails with [`Error::UnknownDevice`] and
    /// keeps the connection.
    pub async fn poll(&mut self) -> Result<Sample> {
        let mut snapshot = self.registry.default_snapshot().clone();

        if !self.columns.is_empty() {
            if self.connection.is_none() {
                match self.connector.connect().await {
                    Ok(connection) => {
                        tracing::info!("Connected to {}", self.connector.target());
                        self.connection = Some(connection);
                    }
                    Err(e) => {
                        tracing::warn!("Cannot connect to {}: {e}", self.connector.target());
                        return Ok(Sample::unavailable(snapshot));
                    }
                }
            }
            let Some(connection) = self.connection.as_mut() else {
                return Ok(Sample::unavailable(snapshot));
            };

            let rows = match connection.fetch_stats(&self.columns).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!("FPGA stats query failed, dropping connection: {e}");
                    self.connection = None;
                    return Err(e);
                }
            };

            for row in rows {
                let device = self
                    .identities
                    .lookup(&row.device)
                    .ok_or_else(|| Error::UnknownDevice(row.device.to_string()))?;
                for (column, raw) in &row.values {
                    let Some(metric) = self.registry.metric(column) else {
                        continue;
                    };
                    snapshot.set(&series_key(&device.name, column), metric.transform(*raw));
                }
            }
        }

        self.merge_diagnostics(&mut snapshot);
        apply_totals(&self.registry, &mut snapshot);
        Ok(Sample::collected(snapshot))
    }

    fn merge_diagnostics(&self, snapshot: &mut Snapshot) {
        let Some(store) = &self.diagnostics else {
            return;
        };
        for chart in self.registry.device_charts(MetricSource::Diagnostics) {
            let Some(&index) = self.device_indices.get(&chart.device) else {
                continue;
            };
            for dim in &chart.dimensions {
                let Some(metric) = DiagnosticMetric::from_column(dim.column) else {
                    continue;
                };
                let raw = store.value(index, metric);
                snapshot.set(&dim.key, raw * f64::from(dim.sign) / dim.divisor);
            }
        }
    }
}

/// Overwrite every total series from the per-device values in `snapshot`.
///
/// Percentage columns are averaged over the real devices, all others summed.
pub fn apply_totals(registry: &SeriesRegistry, snapshot: &mut Snapshot) {
    let devices = registry.devices();
    if !registry.has_total() || devices.is_empty() {
        return;
    }

    let mut totals = Vec::new();
    for chart in registry.total_charts() {
        for dim in &chart.dimensions {
            let sum: f64 = devices
                .iter()
                .filter_map(|device| snapshot.get(&series_key(device, dim.column)))
                .sum();
            let percentage = registry
                .metric(dim.column)
                .is_some_and(|metric| metric.is_percentage());
            let value = if percentage {
                sum / devices.len() as f64
            } else {
                sum
            };
            totals.push((dim.key.clone(), value));
        }
    }

    for (key, value) in totals {
        snapshot.set(&key, value);
    }
}
