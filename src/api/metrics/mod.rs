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

//! Prometheus text exposition.

pub mod fpga;

use std::fmt::Write;

pub use fpga::FpgaMetricExporter;

/// Trait for exporting metrics in Prometheus format
pub trait MetricExporter {
    fn export_metrics(&self) -> String;
}

/// Helper struct to build Prometheus metrics
#[derive(Default)]
pub struct MetricBuilder {
    metrics: String,
}

impl MetricBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `# HELP` and `# TYPE` lines for one metric family
    pub fn family(&mut self, name: &str, description: &str, metric_type: &str) -> &mut Self {
        let _ = writeln!(self.metrics, "# HELP {name} {description}");
        let _ = writeln!(self.metrics, "# TYPE {name} {metric_type}");
        self
    }

    /// Add a metric line with labels
    pub fn metric(
        &mut self,
        name: &str,
        labels: &[(&str, &str)],
        value: impl ToString,
    ) -> &mut Self {
        self.metrics.push_str(name);

        if !labels.is_empty() {
            self.metrics.push('{');
            for (i, (key, value)) in labels.iter().enumerate() {
                if i > 0 {
                    self.metrics.push_str(", ");
                }
                let _ = write!(self.metrics, "{key}=\"{}\"", escape_label(value));
            }
            self.metrics.push('}');
        }

        self.metrics.push(' ');
        self.metrics.push_str(&value.to_string());
        self.metrics.push('\n');
        self
    }

    pub fn build(self) -> String {
        self.metrics
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
