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

//! Fixed output patterns of the vendor diagnostic tools.
//!
//! Intel (OPAE `fpgainfo`):
//!
//! ```text
//! FPGA Core Temperature          : 61.00 Celsius
//! Board Power                    : 48.35 Watts
//! ```
//!
//! Xilinx (`xbutil query`):
//!
//! ```text
//! FPGA Temp: 52 C
//! Power: 23.41 W
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use super::config::{DiagnosticMetric, Vendor};
use crate::parsing::common::first_captured_number;

static INTEL_TEMPERATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*FPGA\s+(?:Core\s+|Die\s+)?Temperature\s*:\s*(-?[\d.]+)")
        .expect("valid Intel temperature pattern")
});

static INTEL_POWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*Board\s+Power\s*:\s*([\d.]+)").expect("valid Intel power pattern")
});

static XILINX_TEMPERATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*FPGA\s+Temp(?:erature)?\s*[:=]\s*(-?[\d.]+)")
        .expect("valid Xilinx temperature pattern")
});

static XILINX_POWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*Power\s*[:=]\s*([\d.]+)\s*W").expect("valid Xilinx power pattern")
});

fn pattern(vendor: Vendor, metric: DiagnosticMetric) -> &'static Regex {
    match (vendor, metric) {
        (Vendor::Intel, DiagnosticMetric::Temperature) => &INTEL_TEMPERATURE,
        (Vendor::Intel, DiagnosticMetric::Power) => &INTEL_POWER,
        (Vendor::Xilinx, DiagnosticMetric::Temperature) => &XILINX_TEMPERATURE,
        (Vendor::Xilinx, DiagnosticMetric::Power) => &XILINX_POWER,
    }
}

/// Extract one reading from tool output. `None` when no line matches.
pub fn parse_reading(vendor: Vendor, metric: DiagnosticMetric, output: &str) -> Option<f64> {
    first_captured_number(pattern(vendor, metric), output)
}
