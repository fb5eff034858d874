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

//! In-memory stats source shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fpga_monitor::common::config::CollectorConfig;
use fpga_monitor::identity::DeviceId;
use fpga_monitor::source::{StatsConnection, StatsConnector, StatsRow};
use fpga_monitor::{Error, Result};

#[derive(Default)]
pub struct FakeSource {
    devices: Mutex<Vec<DeviceId>>,
    responses: Mutex<VecDeque<Result<Vec<StatsRow>>>>,
    /// Number of upcoming connect attempts that fail.
    failing_connects: AtomicUsize,
    connects: AtomicUsize,
    queries: AtomicUsize,
}

impl FakeSource {
    pub fn with_devices(ids: &[&str]) -> Arc<Self> {
        let source = Self::default();
        *source.devices.lock().unwrap() = ids.iter().map(|id| DeviceId::from(*id)).collect();
        Arc::new(source)
    }

    pub fn push_rows(&self, rows: Vec<StatsRow>) {
        self.responses.lock().unwrap().push_back(Ok(rows));
    }

    pub fn push_error(&self, error: Error) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn fail_next_connects(&self, count: usize) {
        self.failing_connects.store(count, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

struct FakeConnection {
    source: Arc<FakeSource>,
}

/// Connector handle; the test keeps its own `Arc<FakeSource>` for assertions.
pub struct FakeConnector(pub Arc<FakeSource>);

#[async_trait]
impl StatsConnector for FakeConnector {
    async fn connect(&self) -> Result<Box<dyn StatsConnection>> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        let failing = self.0.failing_connects.load(Ordering::SeqCst);
        if failing > 0 {
            self.0.failing_connects.store(failing - 1, Ordering::SeqCst);
            return Err(Error::Connection("connection refused".to_string()));
        }
        Ok(Box::new(FakeConnection {
            source: self.0.clone(),
        }))
    }

    fn target(&self) -> String {
        "fake".to_string()
    }
}

#[async_trait]
impl StatsConnection for FakeConnection {
    async fn enumerate_devices(&mut self) -> Result<Vec<DeviceId>> {
        Ok(self.source.devices.lock().unwrap().clone())
    }

    async fn fetch_stats(&mut self, columns: &[&'static str]) -> Result<Vec<StatsRow>> {
        self.source.queries.fetch_add(1, Ordering::SeqCst);
        let next = self.source.responses.lock().unwrap().pop_front();
        let rows = next.unwrap_or_else(|| Ok(Vec::new()))?;
        // Behave like the database: only requested columns come back.
        Ok(rows
            .into_iter()
            .map(|mut row| {
                row.values.retain(|column, _| columns.contains(&column.as_str()));
                row
            })
            .collect())
    }
}

pub fn config() -> CollectorConfig {
    CollectorConfig {
        dsn: "host=fake".to_string(),
        ..CollectorConfig::default()
    }
}
