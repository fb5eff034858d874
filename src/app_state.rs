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

use chrono::{DateTime, Utc};

use crate::registry::{ChartDefinition, Snapshot};

/// State shared between the poll task and the HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub charts: Vec<ChartDefinition>,
    /// Last good snapshot. Kept unchanged while polls fail.
    pub snapshot: Snapshot,
    pub up: bool,
    pub loading: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new(charts: Vec<ChartDefinition>, defaults: Snapshot) -> Self {
        Self {
            charts,
            snapshot: defaults,
            up: false,
            loading: true,
            last_update: None,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    pub fn mark_success(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.up = true;
        self.loading = false;
        self.last_update = Some(Utc::now());
        self.consecutive_failures = 0;
        self.last_error = None;
    }

    pub fn mark_failure(&mut self, error: String) {
        self.up = false;
        self.loading = false;
        self.consecutive_failures += 1;
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ComponentTag;
    use crate::registry::instantiate;

    #[test]
    fn test_failure_keeps_last_snapshot() {
        let registry = instantiate(&[ComponentTag::Jobs], &["fpga-0".to_string()], true);
        let mut state = AppState::new(
            registry.charts().to_vec(),
            registry.default_snapshot().clone(),
        );
        assert!(state.loading);
        assert!(!state.up);

        let mut snapshot = registry.default_snapshot().clone();
        snapshot.set("fpga-0-filter_job_count", 12.0);
        state.mark_success(snapshot.clone());
        assert!(state.up);
        assert!(state.last_update.is_some());

        state.mark_failure("query failed".to_string());
        state.mark_failure("query failed".to_string());
        assert!(!state.up);
        assert_eq!(state.consecutive_failures, 2);
        assert_eq!(state.snapshot, snapshot);

        state.mark_success(snapshot);
        assert_eq!(state.consecutive_failures, 0);
        assert!(state.last_error.is_none());
    }
}
