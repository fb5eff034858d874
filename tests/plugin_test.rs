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

//! netdata plugin loop driven by a scripted poller.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fpga_monitor::catalog::ComponentTag;
use fpga_monitor::netdata::run_plugin;
use fpga_monitor::registry::{instantiate, ChartDefinition, SeriesRegistry, Snapshot};
use fpga_monitor::{Error, Poller, Result, Sample};

struct ScriptedPoller {
    registry: SeriesRegistry,
    script: VecDeque<Result<Sample>>,
    polls: usize,
}

#[async_trait]
impl Poller for ScriptedPoller {
    fn describe(&self) -> &[ChartDefinition] {
        self.registry.charts()
    }

    async fn poll(&mut self) -> Result<Sample> {
        self.polls += 1;
        self.script
            .pop_front()
            .unwrap_or_else(|| Ok(Sample::collected(self.registry.default_snapshot().clone())))
    }

    fn update_every(&self) -> Duration {
        Duration::from_millis(5)
    }
}

/// Accepts a fixed number of writes, then reports a closed pipe.
#[derive(Clone)]
struct ClosingPipe {
    buffer: Arc<Mutex<Vec<u8>>>,
    writes_left: Arc<Mutex<usize>>,
}

impl Write for ClosingPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut left = self.writes_left.lock().unwrap();
        if *left == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "netdata went away"));
        }
        *left -= 1;
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn pipe(writes: usize) -> ClosingPipe {
    ClosingPipe {
        buffer: Arc::new(Mutex::new(Vec::new())),
        writes_left: Arc::new(Mutex::new(writes)),
    }
}

fn output(pipe: &ClosingPipe) -> String {
    String::from_utf8(pipe.buffer.lock().unwrap().clone()).unwrap()
}

fn max_registry() -> (SeriesRegistry, Snapshot) {
    let registry = instantiate(&[ComponentTag::Max], &["fpga-0".to_string()], true);
    let mut good = registry.default_snapshot().clone();
    good.set("fpga-0-max_outstanding_compression_jobs", 7.0);
    (registry, good)
}

#[tokio::test]
async fn test_plugin_skips_failed_polls() {
    let (registry, good) = max_registry();
    let defaults = registry.default_snapshot().clone();
    let mut poller = ScriptedPoller {
        script: VecDeque::from(vec![
            Ok(Sample::collected(good)),
            Err(Error::Query("stats function failed".to_string())),
            Ok(Sample::collected(defaults)),
        ]),
        registry,
        polls: 0,
    };
    let pipe = pipe(2);

    let result = run_plugin(&mut poller, pipe.clone()).await;
    assert!(matches!(result, Err(Error::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe));
    assert_eq!(poller.polls, 3);

    let output = output(&pipe);
    assert!(output.starts_with("CHART fpga.fpga-0-max "));
    assert_eq!(output.matches("BEGIN fpga.fpga-0-max").count(), 1);
    assert!(output.contains("SET 'fpga-0-max_outstanding_compression_jobs' = 7000\n"));
}

#[tokio::test]
async fn test_plugin_sends_nothing_while_source_is_down() {
    let (registry, good) = max_registry();
    let defaults = registry.default_snapshot().clone();
    let mut poller = ScriptedPoller {
        script: VecDeque::from(vec![
            Ok(Sample::collected(good)),
            Err(Error::Query("server closed the connection".to_string())),
            Ok(Sample::unavailable(defaults.clone())),
            Ok(Sample::unavailable(defaults.clone())),
            Ok(Sample::collected(defaults)),
        ]),
        registry,
        polls: 0,
    };
    let pipe = pipe(2);

    let result = run_plugin(&mut poller, pipe.clone()).await;
    assert!(matches!(result, Err(Error::Io(_))));
    assert_eq!(poller.polls, 5);

    let output = output(&pipe);
    assert_eq!(output.matches("BEGIN fpga.fpga-0-max").count(), 1);
    assert!(!output.contains("SET 'fpga-0-max_outstanding_compression_jobs' = 0\n"));
}

#[tokio::test]
async fn test_plugin_exits_on_unknown_device() {
    let (registry, good) = max_registry();
    let mut poller = ScriptedPoller {
        script: VecDeque::from(vec![
            Ok(Sample::collected(good)),
            Err(Error::UnknownDevice("5".to_string())),
        ]),
        registry,
        polls: 0,
    };
    let pipe = pipe(16);

    let result = run_plugin(&mut poller, pipe.clone()).await;
    assert!(matches!(result, Err(Error::UnknownDevice(id)) if id == "5"));
    assert_eq!(poller.polls, 2);
    assert_eq!(output(&pipe).matches("BEGIN fpga.fpga-0-max").count(), 1);
}
