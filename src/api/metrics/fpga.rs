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

//! Per-device FPGA series.
//!
//! Each catalog column becomes one metric family `fpga_monitor_<column>`
//! with `device` and `component` labels. Incremental columns are exported as
//! counters named `fpga_monitor_<column>_total`, so values are published with
//! their display sign removed.

use super::{MetricBuilder, MetricExporter};
use crate::app_state::AppState;
use crate::catalog::MetricKind;
use crate::common::config::AppConfig;
use crate::registry::{ChartDefinition, DimensionDefinition};

pub struct FpgaMetricExporter<'a> {
    state: &'a AppState,
}

impl<'a> FpgaMetricExporter<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Dimensions grouped by column, families in first-seen order.
    fn families(&self) -> Vec<Vec<(&'a ChartDefinition, &'a DimensionDefinition)>> {
        let state = self.state;
        let mut families: Vec<Vec<(&ChartDefinition, &DimensionDefinition)>> = Vec::new();
        for chart in &state.charts {
            for dim in &chart.dimensions {
                match families
                    .iter_mut()
                    .find(|family| family[0].1.column == dim.column)
                {
                    Some(family) => family.push((chart, dim)),
                    None => families.push(vec![(chart, dim)]),
                }
            }
        }
        families
    }

    fn export_health(&self, builder: &mut MetricBuilder) {
        let prefix = AppConfig::METRIC_PREFIX;

        let name = format!("{prefix}_up");
        builder
            .family(&name, "Whether the last FPGA stats poll succeeded", "gauge")
            .metric(&name, &[], u8::from(self.state.up));

        let name = format!("{prefix}_consecutive_failures");
        builder
            .family(&name, "Failed polls since the last success", "gauge")
            .metric(&name, &[], self.state.consecutive_failures);

        if let Some(last_update) = self.state.last_update {
            let name = format!("{prefix}_last_update_timestamp_seconds");
            builder
                .family(&name, "Unix time of the last successful poll", "gauge")
                .metric(&name, &[], last_update.timestamp());
        }
    }
}

impl MetricExporter for FpgaMetricExporter<'_> {
    fn export_metrics(&self) -> String {
        let mut builder = MetricBuilder::new();
        self.export_health(&mut builder);

        for family in self.families() {
            let (first_chart, first_dim) = family[0];
            let (name, metric_type) = match first_dim.kind {
                MetricKind::Incremental => (
                    format!("{}_{}_total", AppConfig::METRIC_PREFIX, first_dim.column),
                    "counter",
                ),
                MetricKind::Absolute => (
                    format!("{}_{}", AppConfig::METRIC_PREFIX, first_dim.column),
                    "gauge",
                ),
            };
            builder.family(
                &name,
                &format!(
                    "{}: {} ({})",
                    first_chart.title, first_dim.label, first_chart.units
                ),
                metric_type,
            );

            for (chart, dim) in family {
                let Some(value) = self.state.snapshot.get(&dim.key) else {
                    continue;
                };
                builder.metric(
                    &name,
                    &[
                        ("device", chart.device.as_str()),
                        ("component", chart.component.as_str()),
                    ],
                    // `+ 0.0` turns -0 into 0
                    value * f64::from(dim.sign) + 0.0,
                );
            }
        }

        builder.build()
    }
}
