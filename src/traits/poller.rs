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

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::registry::ChartDefinition;
use crate::sampler::Sample;

/// A source of periodic snapshots, as seen by a publisher.
///
/// Publishers call [`describe`](Poller::describe) once at start-up and then
/// [`poll`](Poller::poll) every [`update_every`](Poller::update_every). The
/// chart set never changes after start-up.
#[async_trait]
pub trait Poller: Send {
    /// Charts and dimensions, in publication order.
    fn describe(&self) -> &[ChartDefinition];

    /// Collect one snapshot holding every series named by `describe`.
    ///
    /// A sample that is not fresh carries only defaults and must not
    /// replace published values.
    async fn poll(&mut self) -> Result<Sample>;

    fn update_every(&self) -> Duration;
}
