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

use std::fmt::Write;
use std::time::Duration;

use crate::common::config::AppConfig;
use crate::registry::{ChartDefinition, Snapshot};

const PLUGIN_NAME: &str = "fpga-monitor";

/// `CHART` and `DIMENSION` lines for every chart, in order.
pub fn render_definitions(charts: &[ChartDefinition], update_every: u64) -> String {
    let mut out = String::new();
    for (position, chart) in charts.iter().enumerate() {
        let priority = AppConfig::NETDATA_BASE_PRIORITY as usize + position;
        let _ = writeln!(
            out,
            "CHART {}.{} '' '{}' '{}' '{}' '{}.{}' {} {priority} {update_every} '' '{PLUGIN_NAME}' '{}'",
            AppConfig::NETDATA_CHART_TYPE,
            chart.id,
            chart.title,
            chart.units,
            chart.device,
            chart.context,
            chart.component,
            chart.chart_type.as_str(),
            chart.component,
        );
        for dim in &chart.dimensions {
            let _ = writeln!(
                out,
                "DIMENSION '{}' '{}' {} 1 {}",
                dim.key,
                dim.label,
                dim.kind.as_str(),
                AppConfig::NETDATA_PRECISION
            );
        }
    }
    out
}

/// One `BEGIN`/`SET`/`END` block per chart. Series missing from the
/// snapshot are left out so netdata records a gap.
pub fn render_update(
    charts: &[ChartDefinition],
    snapshot: &Snapshot,
    since_last: Option<Duration>,
) -> String {
    let mut out = String::new();
    for chart in charts {
        let _ = match since_last {
            Some(elapsed) => writeln!(
                out,
                "BEGIN {}.{} {}",
                AppConfig::NETDATA_CHART_TYPE,
                chart.id,
                elapsed.as_micros()
            ),
            None => writeln!(out, "BEGIN {}.{}", AppConfig::NETDATA_CHART_TYPE, chart.id),
        };
        for dim in &chart.dimensions {
            if let Some(value) = snapshot.get(&dim.key) {
                let _ = writeln!(out, "SET '{}' = {}", dim.key, scale(value));
            }
        }
        out.push_str("END\n");
    }
    out
}

/// Fixed-point value as sent to netdata.
pub fn scale(value: f64) -> i64 {
    if value.is_finite() {
        (value * AppConfig::NETDATA_PRECISION as f64).round() as i64
    } else {
        0
    }
}
