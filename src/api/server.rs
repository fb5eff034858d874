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

use std::future::Future;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{charts_handler, metrics_handler, SharedState};
use crate::app_state::AppState;
use crate::error::{Error, Result};
use crate::registry::{ChartDefinition, Snapshot};
use crate::traits::Poller;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/charts", get(charts_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// State for `charts` with every series at zero until the first poll.
pub fn initial_state(charts: Vec<ChartDefinition>) -> SharedState {
    let defaults = Snapshot::zeroed(
        charts
            .iter()
            .flat_map(|chart| chart.dimensions.iter().map(|dim| &dim.key)),
    );
    SharedState::new(RwLock::new(AppState::new(charts, defaults)))
}

/// Poll once and record the outcome in `state`.
///
/// Only a fresh sample replaces the published snapshot. A failed poll or an
/// unreachable source marks the endpoint down and keeps the last good
/// values. Fatal errors are returned so the caller can stop.
pub async fn poll_once<P: Poller + ?Sized>(poller: &mut P, state: &SharedState) -> Result<()> {
    match poller.poll().await {
        Ok(sample) if sample.fresh => {
            state.write().await.mark_success(sample.snapshot);
            Ok(())
        }
        Ok(_) => {
            state
                .write()
                .await
                .mark_failure("data source unavailable".to_string());
            Ok(())
        }
        Err(e) if e.is_fatal() => {
            tracing::error!("FPGA poll failed fatally: {e}");
            state.write().await.mark_failure(e.to_string());
            Err(e)
        }
        Err(e) => {
            tracing::warn!("FPGA poll failed: {e}");
            state.write().await.mark_failure(e.to_string());
            Ok(())
        }
    }
}

async fn poll_loop<P: Poller>(mut poller: P, state: SharedState) -> Result<()> {
    let mut ticker = interval(poller.update_every());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        poll_once(&mut poller, &state).await?;
    }
}

/// Poll in the background and serve the results on `port` until `shutdown`
/// resolves or a poll fails fatally.
pub async fn run_api_mode<P, F>(poller: P, port: u16, shutdown: F) -> Result<()>
where
    P: Poller + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let state = initial_state(poller.describe().to_vec());
    let mut poll_task = tokio::spawn(poll_loop(poller, state.clone()));

    let listener = match TcpListener::bind(&format!("0.0.0.0:{port}")).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind TCP listener on port {port}: {e}");
            poll_task.abort();
            return Err(e.into());
        }
    };
    match listener.local_addr() {
        Ok(addr) => tracing::info!("API server listening on {addr}"),
        Err(_) => tracing::info!("API server listening on port {port}"),
    }

    let server = async move {
        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown)
            .await
    };

    tokio::select! {
        served = server => {
            poll_task.abort();
            served?;
            Ok(())
        }
        polled = &mut poll_task => match polled {
            Ok(result) => result,
            Err(e) => Err(Error::Io(std::io::Error::other(e.to_string()))),
        },
    }
}
