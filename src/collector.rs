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

//! Start-up wiring: discovery, registry, diagnostics and the sampler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::common::config::CollectorConfig;
use crate::diagnostics::{DiagnosticStore, DiagnosticsUpdater};
use crate::error::{Error, Result};
use crate::identity::IdentityMapper;
use crate::registry::{instantiate, ChartDefinition, SeriesRegistry};
use crate::sampler::{ConnectionState, Sample, Sampler};
use crate::source::{PostgresConnector, StatsConnection, StatsConnector};
use crate::traits::Poller;

/// Resolve every enumerated id in row order and freeze the mapper.
///
/// Fails when nothing is found, or when `expected` is set and differs from
/// the number of distinct ids.
pub async fn discover_devices(
    connection: &mut dyn StatsConnection,
    expected: Option<usize>,
) -> Result<IdentityMapper> {
    let ids = connection.enumerate_devices().await?;

    let mut identities = IdentityMapper::new();
    for id in &ids {
        identities.resolve(id)?;
    }
    identities.freeze();

    let found = identities.known_count();
    if found == 0 {
        return Err(Error::NoDevicesFound);
    }
    if let Some(expected) = expected {
        if expected != found {
            return Err(Error::DeviceCountMismatch { expected, found });
        }
    }
    Ok(identities)
}

pub struct FpgaCollector {
    sampler: Sampler,
    registry: Arc<SeriesRegistry>,
    update_every: Duration,
    diagnostics: Option<DiagnosticsUpdater>,
}

impl FpgaCollector {
    /// Connect to PostgreSQL using `config.dsn` and start collecting.
    pub async fn start(config: &CollectorConfig) -> Result<Self> {
        let connector = Arc::new(PostgresConnector::new(config.dsn.clone()));
        Self::with_connector(config, connector).await
    }

    /// Start against any stats source. Every failure here is fatal.
    pub async fn with_connector(
        config: &CollectorConfig,
        connector: Arc<dyn StatsConnector>,
    ) -> Result<Self> {
        config.validate()?;

        let mut connection = connector.connect().await?;
        let identities = discover_devices(connection.as_mut(), config.fpga_count).await?;
        for device in identities.devices() {
            tracing::info!("Found FPGA '{}' as {}", device.id, device.name);
        }

        let registry = Arc::new(instantiate(
            &config.component_tags(),
            &identities.names(),
            config.include_total,
        ));
        tracing::info!(
            "Publishing {} chart(s) with {} series for {} FPGA(s) from {}",
            registry.charts().len(),
            registry.keys().len(),
            identities.known_count(),
            connector.target()
        );

        let diagnostics = match config.diagnostics(identities.known_count())? {
            Some(settings) => Some(DiagnosticsUpdater::start(
                settings,
                Arc::new(DiagnosticStore::new()),
            )?),
            None => None,
        };

        let mut sampler = Sampler::new(connector, identities, registry.clone())
            .with_connection(connection);
        if let Some(updater) = &diagnostics {
            sampler = sampler.with_diagnostics(updater.store());
        }

        Ok(Self {
            sampler,
            registry,
            update_every: config.update_interval(),
            diagnostics,
        })
    }

    pub fn identities(&self) -> &IdentityMapper {
        self.sampler.identities()
    }

    pub fn registry(&self) -> &Arc<SeriesRegistry> {
        &self.registry
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.sampler.state()
    }

    pub fn diagnostics_running(&self) -> bool {
        self.diagnostics
            .as_ref()
            .is_some_and(DiagnosticsUpdater::is_running)
    }

    /// Stop the diagnostics thread. Polling still works afterwards but
    /// temperature and power keep their last values.
    pub fn shutdown(&mut self) {
        if let Some(mut updater) = self.diagnostics.take() {
            updater.stop();
        }
    }
}

#[async_trait]
impl Poller for FpgaCollector {
    fn describe(&self) -> &[ChartDefinition] {
        self.registry.charts()
    }

    async fn poll(&mut self) -> Result<Sample> {
        self.sampler.poll().await
    }

    fn update_every(&self) -> Duration {
        self.update_every
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::DeviceId;
    use crate::source::StatsRow;

    struct Enumeration(Vec<DeviceId>);

    #[async_trait]
    impl StatsConnection for Enumeration {
        async fn enumerate_devices(&mut self) -> Result<Vec<DeviceId>> {
            Ok(self.0.clone())
        }

        async fn fetch_stats(&mut self, _columns: &[&'static str]) -> Result<Vec<StatsRow>> {
            Ok(vec![])
        }
    }

    fn ids(raw: &[&str]) -> Enumeration {
        Enumeration(raw.iter().map(|id| DeviceId::from(*id)).collect())
    }

    #[tokio::test]
    async fn test_discover_in_row_order() {
        let mut connection = ids(&["5", "2", "5"]);
        let identities = discover_devices(&mut connection, Some(2)).await.unwrap();

        assert!(identities.is_frozen());
        assert_eq!(identities.names(), vec!["fpga-0", "fpga-1"]);
        assert_eq!(
            identities.lookup(&DeviceId::from("2")).map(|d| d.name.as_str()),
            Some("fpga-1")
        );
    }

    #[tokio::test]
    async fn test_discover_failures() {
        assert!(matches!(
            discover_devices(&mut ids(&[]), None).await,
            Err(Error::NoDevicesFound)
        ));
        assert!(matches!(
            discover_devices(&mut ids(&["0", "1"]), Some(3)).await,
            Err(Error::DeviceCountMismatch {
                expected: 3,
                found: 2
            })
        ));
    }
}
