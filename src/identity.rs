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

//! Stable per-device naming.
//!
//! Hardware ids reported by the data source are opaque. The mapper gives each
//! distinct id a short name (`fpga-0`, `fpga-1`, ...) in first-seen order and
//! never reassigns it for the lifetime of the process.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

pub const DEVICE_PREFIX: &str = "fpga-";

/// Name of the synthetic aggregate device.
pub const TOTAL_DEVICE: &str = "fpga-total";

/// Short name for the device at `index` in assignment order.
pub fn device_name(index: usize) -> String {
    format!("{DEVICE_PREFIX}{index}")
}

/// Raw hardware id as reported by the data source, normalized to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<i64> for DeviceId {
    fn from(raw: i64) -> Self {
        Self(raw.to_string())
    }
}

/// A resolved device identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Position in assignment order; also the index passed to vendor tools.
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct IdentityMapper {
    by_id: HashMap<DeviceId, usize>,
    devices: Vec<Device>,
    frozen: bool,
}

impl IdentityMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the short name for `id`, allocating the next one on first sight.
    ///
    /// Fails with [`Error::UnknownDevice`] for a new id once the mapper has
    /// been frozen.
    pub fn resolve(&mut self, id: &DeviceId) -> Result<&str> {
        if let Some(&index) = self.by_id.get(id) {
            return Ok(&self.devices[index].name);
        }
        if self.frozen {
            return Err(Error::UnknownDevice(id.to_string()));
        }

        let index = self.devices.len();
        self.by_id.insert(id.clone(), index);
        self.devices.push(Device {
            id: id.clone(),
            name: device_name(index),
            index,
        });
        tracing::debug!("Mapped FPGA id '{id}' to {}", self.devices[index].name);
        Ok(&self.devices[index].name)
    }

    pub fn lookup(&self, id: &DeviceId) -> Option<&Device> {
        self.by_id.get(id).map(|&index| &self.devices[index])
    }

    pub fn known_count(&self) -> usize {
        self.devices.len()
    }

    /// Stop accepting new ids.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Devices in assignment order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn names(&self) -> Vec<String> {
        self.devices.iter().map(|device| device.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_idempotent() {
        let mut mapper = IdentityMapper::new();
        let first = mapper.resolve(&DeviceId::from("A")).unwrap().to_string();
        let second = mapper.resolve(&DeviceId::from("A")).unwrap().to_string();
        assert_eq!(first, second);
        assert_eq!(mapper.known_count(), 1);
    }

    #[test]
    fn test_names_follow_first_seen_order() {
        let mut mapper = IdentityMapper::new();
        let sequence = ["c", "a", "c", "b", "a", "d", "b"];
        let resolved: Vec<String> = sequence
            .iter()
            .map(|raw| mapper.resolve(&DeviceId::from(*raw)).unwrap().to_string())
            .collect();

        assert_eq!(
            resolved,
            vec!["fpga-0", "fpga-1", "fpga-0", "fpga-2", "fpga-1", "fpga-3", "fpga-2"]
        );
        assert_eq!(mapper.names(), vec!["fpga-0", "fpga-1", "fpga-2", "fpga-3"]);
        for (position, device) in mapper.devices().iter().enumerate() {
            assert_eq!(device.index, position);
        }
    }

    #[test]
    fn test_integer_and_text_ids_normalize() {
        let mut mapper = IdentityMapper::new();
        let from_int = mapper.resolve(&DeviceId::from(7_i64)).unwrap().to_string();
        let from_text = mapper.resolve(&DeviceId::from(" 7 ")).unwrap().to_string();
        assert_eq!(from_int, from_text);
    }

    #[test]
    fn test_frozen_mapper_rejects_new_ids() {
        let mut mapper = IdentityMapper::new();
        mapper.resolve(&DeviceId::from("A")).unwrap();
        mapper.freeze();

        assert_eq!(mapper.resolve(&DeviceId::from("A")).unwrap(), "fpga-0");
        let err = mapper.resolve(&DeviceId::from("B")).unwrap_err();
        assert!(matches!(err, Error::UnknownDevice(ref id) if id == "B"));
        assert_eq!(mapper.known_count(), 1);
    }

    #[test]
    fn test_lookup_does_not_allocate() {
        let mapper = IdentityMapper::new();
        assert!(mapper.lookup(&DeviceId::from("A")).is_none());
        assert_eq!(mapper.known_count(), 0);
    }
}
