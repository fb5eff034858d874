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

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Instant;

use super::config::DiagnosticMetric;

/// Last good reading of one metric on one device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticReading {
    pub value: f64,
    pub updated_at: Instant,
}

/// Latest temperature/power per device index.
///
/// The diagnostics updater is the only writer. The poll path reads with
/// [`DiagnosticStore::value`] and never waits on a running vendor tool, only
/// on the short write lock held while a reading is stored.
#[derive(Debug, Default)]
pub struct DiagnosticStore {
    readings: RwLock<HashMap<(usize, DiagnosticMetric), DiagnosticReading>>,
}

impl DiagnosticStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a successful reading, replacing the previous one.
    pub fn record(&self, index: usize, metric: DiagnosticMetric, value: f64) {
        let mut readings = match self.readings.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        readings.insert(
            (index, metric),
            DiagnosticReading {
                value,
                updated_at: Instant::now(),
            },
        );
    }

    pub fn reading(&self, index: usize, metric: DiagnosticMetric) -> Option<DiagnosticReading> {
        let readings = match self.readings.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        readings.get(&(index, metric)).copied()
    }

    /// Last good value, or zero when the device was never read successfully.
    pub fn value(&self, index: usize, metric: DiagnosticMetric) -> f64 {
        self.reading(index, metric)
            .map(|reading| reading.value)
            .unwrap_or(0.0)
    }

    pub fn clear(&self) {
        let mut readings = match self.readings.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        readings.clear();
    }
}
