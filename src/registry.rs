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

//! Expands the catalog against the known devices.
//!
//! The registry is built once after device discovery. Its chart and series
//! ordering is what publishers emit, so [`instantiate`] must be deterministic.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::catalog::{
    ChartType, ComponentDefinition, ComponentTag, MetricDefinition, MetricKind, MetricSource,
    CHART_CONTEXT,
};
use crate::identity::TOTAL_DEVICE;

/// Key of one output series: `{device}-{column}`.
pub fn series_key(device: &str, column: &str) -> String {
    format!("{device}-{column}")
}

/// Id of one chart: `{device}-{tag}`.
pub fn chart_id(device: &str, tag: ComponentTag) -> String {
    format!("{device}-{tag}")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionDefinition {
    pub key: String,
    pub column: &'static str,
    pub label: &'static str,
    pub kind: MetricKind,
    pub sign: i8,
    pub divisor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDefinition {
    pub id: String,
    /// Device the chart belongs to; also used as the chart's family label.
    pub device: String,
    pub component: ComponentTag,
    pub title: &'static str,
    pub units: &'static str,
    pub context: &'static str,
    pub chart_type: ChartType,
    pub source: MetricSource,
    pub dimensions: Vec<DimensionDefinition>,
}

/// Build the chart of `component` owned by `device`.
pub fn build_series(component: &ComponentDefinition, device: &str) -> ChartDefinition {
    let dimensions = component
        .metrics
        .iter()
        .map(|metric| DimensionDefinition {
            key: series_key(device, metric.column),
            column: metric.column,
            label: metric.label,
            kind: metric.kind,
            sign: metric.sign,
            divisor: metric.divisor,
        })
        .collect();

    ChartDefinition {
        id: chart_id(device, component.tag),
        device: device.to_string(),
        component: component.tag,
        title: component.title,
        units: component.units,
        context: CHART_CONTEXT,
        chart_type: component.chart_type,
        source: component.source,
        dimensions,
    }
}

/// Current value of every series. Holds exactly the registry's keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot(BTreeMap<String, f64>);

impl Snapshot {
    pub fn zeroed<'a>(keys: impl IntoIterator<Item = &'a String>) -> Self {
        Self(keys.into_iter().map(|key| (key.clone(), 0.0)).collect())
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Overwrite an existing series. Unknown keys are ignored so the key set
    /// never changes; returns whether the key existed.
    pub fn set(&mut self, key: &str, value: f64) -> bool {
        match self.0.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }
}

#[derive(Debug, Clone)]
pub struct SeriesRegistry {
    charts: Vec<ChartDefinition>,
    keys: Vec<String>,
    defaults: Snapshot,
    devices: Vec<String>,
    metrics: HashMap<&'static str, &'static MetricDefinition>,
    has_total: bool,
}

impl SeriesRegistry {
    pub fn charts(&self) -> &[ChartDefinition] {
        &self.charts
    }

    /// Series keys in (device, component, metric) order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn default_snapshot(&self) -> &Snapshot {
        &self.defaults
    }

    /// Real devices, without the total.
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    pub fn has_total(&self) -> bool {
        self.has_total
    }

    pub fn metric(&self, column: &str) -> Option<&'static MetricDefinition> {
        self.metrics.get(column).copied()
    }

    /// Columns to request from the database, in first-use order.
    pub fn database_columns(&self) -> Vec<&'static str> {
        let mut seen = HashSet::new();
        self.charts
            .iter()
            .filter(|chart| chart.source == MetricSource::Database)
            .flat_map(|chart| chart.dimensions.iter().map(|dim| dim.column))
            .filter(|column| seen.insert(*column))
            .collect()
    }

    /// Charts of one source kind belonging to real devices.
    pub fn device_charts(&self, source: MetricSource) -> impl Iterator<Item = &ChartDefinition> {
        self.charts
            .iter()
            .filter(move |chart| chart.source == source && chart.device != TOTAL_DEVICE)
    }

    pub fn total_charts(&self) -> impl Iterator<Item = &ChartDefinition> {
        self.charts
            .iter()
            .filter(|chart| chart.device == TOTAL_DEVICE)
    }
}

/// Expand `tags` for every device in `device_names`.
///
/// When `include_total` is set and more than one device is given, the
/// synthetic [`TOTAL_DEVICE`] comes first and receives every component whose
/// definition allows totals. Duplicate tags or names keep their first position.
pub fn instantiate(
    tags: &[ComponentTag],
    device_names: &[String],
    include_total: bool,
) -> SeriesRegistry {
    let mut seen_tags = HashSet::new();
    let tags: Vec<ComponentTag> = tags
        .iter()
        .copied()
        .filter(|tag| seen_tags.insert(*tag))
        .collect();
    let mut seen_names = HashSet::new();
    let devices: Vec<String> = device_names
        .iter()
        .filter(|name| seen_names.insert(name.as_str()))
        .cloned()
        .collect();

    let has_total = include_total && devices.len() > 1;
    let mut owners: Vec<&str> = Vec::with_capacity(devices.len() + 1);
    if has_total {
        owners.push(TOTAL_DEVICE);
    }
    owners.extend(devices.iter().map(String::as_str));

    let mut charts = Vec::new();
    let mut metrics = HashMap::new();
    for owner in owners {
        for tag in &tags {
            let component = tag.definition();
            if owner == TOTAL_DEVICE && !component.totals {
                continue;
            }
            for metric in component.metrics {
                metrics.insert(metric.column, metric);
            }
            charts.push(build_series(component, owner));
        }
    }

    let keys: Vec<String> = charts
        .iter()
        .flat_map(|chart| chart.dimensions.iter().map(|dim| dim.key.clone()))
        .collect();
    let defaults = Snapshot::zeroed(&keys);

    SeriesRegistry {
        charts,
        keys,
        defaults,
        devices,
        metrics,
        has_total,
    }
}
