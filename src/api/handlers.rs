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

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::api::metrics::{FpgaMetricExporter, MetricExporter};
use crate::app_state::AppState;
use crate::registry::ChartDefinition;

pub type SharedState = Arc<RwLock<AppState>>;

pub async fn metrics_handler(State(state): State<SharedState>) -> String {
    let state = state.read().await;
    FpgaMetricExporter::new(&state).export_metrics()
}

#[derive(Debug, Serialize)]
pub struct ChartsResponse {
    pub up: bool,
    pub loading: bool,
    /// RFC 3339
    pub last_update: Option<String>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub charts: Vec<ChartValues>,
}

#[derive(Debug, Serialize)]
pub struct ChartValues {
    #[serde(flatten)]
    pub chart: ChartDefinition,
    pub values: BTreeMap<String, f64>,
}

pub async fn charts_handler(State(state): State<SharedState>) -> Json<ChartsResponse> {
    let state = state.read().await;
    let charts = state
        .charts
        .iter()
        .map(|chart| ChartValues {
            values: chart
                .dimensions
                .iter()
                .filter_map(|dim| Some((dim.key.clone(), state.snapshot.get(&dim.key)?)))
                .collect(),
            chart: chart.clone(),
        })
        .collect();

    Json(ChartsResponse {
        up: state.up,
        loading: state.loading,
        last_update: state.last_update.map(|time| time.to_rfc3339()),
        consecutive_failures: state.consecutive_failures,
        last_error: state.last_error.clone(),
        charts,
    })
}
