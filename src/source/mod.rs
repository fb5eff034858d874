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

//! Data source boundary.
//!
//! The sampler only sees these traits; [`postgres`] provides the production
//! implementation against the `swarm64da` extension.

pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::identity::DeviceId;

pub use postgres::PostgresConnector;

/// One result row of the stats function.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRow {
    pub device: DeviceId,
    /// Requested columns that were present and non-NULL.
    pub values: HashMap<String, f64>,
}

impl StatsRow {
    pub fn new(device: impl Into<DeviceId>) -> Self {
        Self {
            device: device.into(),
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, column: &str, value: f64) -> Self {
        self.values.insert(column.to_string(), value);
        self
    }
}

/// Opens connections to the stats source.
#[async_trait]
pub trait StatsConnector: Send + Sync {
    /// Connect and make sure the stats extension is installed.
    async fn connect(&self) -> Result<Box<dyn StatsConnection>>;

    /// Human readable target for logs; must not contain credentials.
    fn target(&self) -> String;
}

/// An open connection. Dropped by the sampler after any error.
#[async_trait]
pub trait StatsConnection: Send {
    /// Raw device ids in result order, duplicates included.
    async fn enumerate_devices(&mut self) -> Result<Vec<DeviceId>>;

    /// Fetch one row per device, restricted to `columns`.
    async fn fetch_stats(&mut self, columns: &[&'static str]) -> Result<Vec<StatsRow>>;
}
