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

//! Static metric catalog.
//!
//! Every chart the collector can publish is described here once, keyed by a
//! closed set of [`ComponentTag`]s. Per-device charts are derived from these
//! definitions by [`crate::registry`]; nothing here is mutated at runtime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Bytes per MiB, used to report transfer counters in MB/sec.
pub const MIB: f64 = 1_048_576.0;

/// Chart context shared by every FPGA chart.
pub const CHART_CONTEXT: &str = "fpga";

/// How the publisher should interpret successive values of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Monotonic counter; the publisher derives the per-second rate.
    Incremental,
    /// Instantaneous gauge.
    Absolute,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Incremental => "incremental",
            MetricKind::Absolute => "absolute",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Area,
    Stacked,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Stacked => "stacked",
        }
    }
}

/// Where the values of a component come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    /// Columns of `swarm64da.get_fpga_stats()`.
    Database,
    /// Cached readings from the vendor diagnostic tools.
    Diagnostics,
}

/// One column of a component and how to turn its raw value into a series value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDefinition {
    pub column: &'static str,
    pub label: &'static str,
    pub kind: MetricKind,
    /// Either `1` or `-1`. Negative values draw below the axis.
    pub sign: i8,
    pub divisor: f64,
}

impl MetricDefinition {
    pub const fn incremental(column: &'static str, label: &'static str) -> Self {
        Self {
            column,
            label,
            kind: MetricKind::Incremental,
            sign: 1,
            divisor: 1.0,
        }
    }

    pub const fn absolute(column: &'static str, label: &'static str) -> Self {
        Self {
            column,
            label,
            kind: MetricKind::Absolute,
            sign: 1,
            divisor: 1.0,
        }
    }

    pub const fn negated(mut self) -> Self {
        self.sign = -1;
        self
    }

    pub const fn with_divisor(mut self, divisor: f64) -> Self {
        self.divisor = divisor;
        self
    }

    /// Apply sign and divisor to a raw source value.
    pub fn transform(&self, raw: f64) -> f64 {
        raw * f64::from(self.sign) / self.divisor
    }

    /// Percentage columns are averaged, not summed, into the total series.
    pub fn is_percentage(&self) -> bool {
        self.column.ends_with("_percent")
    }
}

/// Chart-level description of one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDefinition {
    pub tag: ComponentTag,
    pub title: &'static str,
    pub units: &'static str,
    pub chart_type: ChartType,
    pub source: MetricSource,
    /// Whether the synthetic `fpga-total` device gets this chart.
    pub totals: bool,
    pub metrics: &'static [MetricDefinition],
}

impl ComponentDefinition {
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.metrics.iter().map(|metric| metric.column)
    }
}

static BYTES: ComponentDefinition = ComponentDefinition {
    tag: ComponentTag::Bytes,
    title: "Transfered data",
    units: "MB/sec",
    chart_type: ChartType::Line,
    source: MetricSource::Database,
    totals: true,
    metrics: &[
        MetricDefinition::incremental("host_to_fpga_byte_count", "sent to fpga").with_divisor(MIB),
        MetricDefinition::incremental("fpga_to_host_byte_count", "received from fpga")
            .negated()
            .with_divisor(MIB),
    ],
};

static JOBS: ComponentDefinition = ComponentDefinition {
    tag: ComponentTag::Jobs,
    title: "Processed jobs",
    units: "Jobs/sec",
    chart_type: ChartType::Line,
    source: MetricSource::Database,
    totals: true,
    metrics: &[
        MetricDefinition::incremental("compression_job_count", "compressed jobs"),
        MetricDefinition::incremental("decompression_job_count", "decompressed jobs"),
        MetricDefinition::incremental(
            "decompression_and_filter_job_count",
            "decompressed and filtered jobs",
        ),
        MetricDefinition::incremental("filter_job_count", "filtered jobs"),
    ],
};

static MAX: ComponentDefinition = ComponentDefinition {
    tag: ComponentTag::Max,
    title: "Max outstanding jobs",
    units: "max outstanding",
    chart_type: ChartType::Line,
    source: MetricSource::Database,
    totals: true,
    metrics: &[
        MetricDefinition::absolute("max_outstanding_compression_jobs", "compression"),
        MetricDefinition::absolute(
            "max_outstanding_decompression_and_filter_jobs",
            "decompress and filter",
        ),
        MetricDefinition::absolute("max_outstanding_filter_jobs", "filter"),
    ],
};

static PU_STATS: ComponentDefinition = ComponentDefinition {
    tag: ComponentTag::PuStats,
    title: "Processing unit utilization",
    units: "%",
    chart_type: ChartType::Line,
    source: MetricSource::Database,
    totals: true,
    metrics: &[
        MetricDefinition::absolute("compression_pu_utilization_percent", "compression"),
        MetricDefinition::absolute("decompression_pu_utilization_percent", "decompression"),
        MetricDefinition::absolute("filter_pu_utilization_percent", "filter"),
    ],
};

static DDR_STATS: ComponentDefinition = ComponentDefinition {
    tag: ComponentTag::DdrStats,
    title: "DDR transfer",
    units: "MB/sec",
    chart_type: ChartType::Area,
    source: MetricSource::Database,
    totals: true,
    metrics: &[
        MetricDefinition::incremental("ddr_read_byte_count", "read").with_divisor(MIB),
        MetricDefinition::incremental("ddr_write_byte_count", "written")
            .negated()
            .with_divisor(MIB),
    ],
};

// Summing temperatures is meaningless, so there is no total chart.
static TEMPS: ComponentDefinition = ComponentDefinition {
    tag: ComponentTag::Temps,
    title: "FPGA Temperature",
    units: "°C",
    chart_type: ChartType::Line,
    source: MetricSource::Diagnostics,
    totals: false,
    metrics: &[MetricDefinition::absolute("temperature", "Degrees Celcius")],
};

static POWERS: ComponentDefinition = ComponentDefinition {
    tag: ComponentTag::Powers,
    title: "FPGA Power",
    units: "W",
    chart_type: ChartType::Line,
    source: MetricSource::Diagnostics,
    totals: true,
    metrics: &[MetricDefinition::absolute("power", "Watts")],
};

/// Closed set of chart components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentTag {
    Bytes,
    Jobs,
    Max,
    PuStats,
    DdrStats,
    Temps,
    Powers,
}

impl ComponentTag {
    pub const ALL: [ComponentTag; 7] = [
        ComponentTag::Bytes,
        ComponentTag::Jobs,
        ComponentTag::Max,
        ComponentTag::PuStats,
        ComponentTag::DdrStats,
        ComponentTag::Temps,
        ComponentTag::Powers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentTag::Bytes => "bytes",
            ComponentTag::Jobs => "jobs",
            ComponentTag::Max => "max",
            ComponentTag::PuStats => "pu_stats",
            ComponentTag::DdrStats => "ddr_stats",
            ComponentTag::Temps => "temps",
            ComponentTag::Powers => "powers",
        }
    }

    pub fn definition(self) -> &'static ComponentDefinition {
        match self {
            ComponentTag::Bytes => &BYTES,
            ComponentTag::Jobs => &JOBS,
            ComponentTag::Max => &MAX,
            ComponentTag::PuStats => &PU_STATS,
            ComponentTag::DdrStats => &DDR_STATS,
            ComponentTag::Temps => &TEMPS,
            ComponentTag::Powers => &POWERS,
        }
    }

    /// The component list used when the configuration does not name one.
    pub fn defaults(pu_ddr_stats_enable: bool, check_temp_power: bool) -> Vec<ComponentTag> {
        let mut tags = vec![ComponentTag::Bytes, ComponentTag::Jobs, ComponentTag::Max];
        if pu_ddr_stats_enable {
            tags.extend([ComponentTag::PuStats, ComponentTag::DdrStats]);
        }
        if check_temp_power {
            tags.extend([ComponentTag::Temps, ComponentTag::Powers]);
        }
        tags
    }
}

impl fmt::Display for ComponentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s.trim())
            .ok_or_else(|| Error::Config(format!("unknown component '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_tag_resolves_to_its_own_definition() {
        for tag in ComponentTag::ALL {
            assert_eq!(tag.definition().tag, tag);
            assert!(!tag.definition().metrics.is_empty());
        }
    }

    #[test]
    fn test_columns_unique_across_catalog() {
        let mut seen = HashSet::new();
        for tag in ComponentTag::ALL {
            for column in tag.definition().columns() {
                assert!(seen.insert(column), "duplicate column {column}");
            }
        }
    }

    #[test]
    fn test_bytes_definition() {
        let bytes = ComponentTag::Bytes.definition();
        assert_eq!(bytes.units, "MB/sec");
        let columns: Vec<_> = bytes.columns().collect();
        assert_eq!(
            columns,
            vec!["host_to_fpga_byte_count", "fpga_to_host_byte_count"]
        );
        assert_eq!(bytes.metrics[0].sign, 1);
        assert_eq!(bytes.metrics[1].sign, -1);
        assert_eq!(bytes.metrics[1].divisor, MIB);
    }

    #[test]
    fn test_transform_applies_sign_and_divisor() {
        let bytes = ComponentTag::Bytes.definition();
        assert_eq!(bytes.metrics[0].transform(2_097_152.0), 2.0);
        assert_eq!(bytes.metrics[1].transform(1_048_576.0), -1.0);

        let max = ComponentTag::Max.definition();
        assert_eq!(max.metrics[0].transform(7.0), 7.0);
    }

    #[test]
    fn test_percentage_detection() {
        for metric in ComponentTag::PuStats.definition().metrics {
            assert!(metric.is_percentage());
        }
        assert!(!ComponentTag::Bytes.definition().metrics[0].is_percentage());
        assert!(!ComponentTag::Temps.definition().metrics[0].is_percentage());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("pu_stats".parse::<ComponentTag>().unwrap(), ComponentTag::PuStats);
        assert_eq!(" bytes ".parse::<ComponentTag>().unwrap(), ComponentTag::Bytes);
        assert!(matches!(
            "gpu".parse::<ComponentTag>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            ComponentTag::defaults(false, false),
            vec![ComponentTag::Bytes, ComponentTag::Jobs, ComponentTag::Max]
        );
        assert_eq!(ComponentTag::defaults(true, true).len(), 7);
        assert_eq!(
            ComponentTag::defaults(false, true),
            vec![
                ComponentTag::Bytes,
                ComponentTag::Jobs,
                ComponentTag::Max,
                ComponentTag::Temps,
                ComponentTag::Powers
            ]
        );
    }
}
