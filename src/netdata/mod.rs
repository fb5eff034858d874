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

//! netdata external plugin publisher.
//!
//! The plugin writes chart definitions once and then one
//! `BEGIN`/`SET`/`END` block per chart every tick on stdout. netdata reads
//! integers only, so values are scaled by
//! [`AppConfig::NETDATA_PRECISION`](crate::common::config::AppConfig::NETDATA_PRECISION)
//! and every dimension declares the matching divisor.

pub mod protocol;

use std::io::Write;
use std::time::Instant;

use tokio::time::{interval, MissedTickBehavior};

use crate::error::{Error, Result};
use crate::traits::Poller;

pub use protocol::{render_definitions, render_update};

/// Run the plugin loop until writing to `out` fails or a poll fails fatally.
///
/// A failed poll, or a sample taken while the source is unreachable, sends
/// nothing for that tick, so netdata shows a gap instead of fake zeros.
/// A fatal error such as [`Error::UnknownDevice`] ends the loop so netdata
/// restarts the plugin and devices are enumerated again.
pub async fn run_plugin<P, W>(poller: &mut P, mut out: W) -> Result<()>
where
    P: Poller + ?Sized,
    W: Write,
{
    let update_every = poller.update_every();
    let update_secs = update_every.as_secs().max(1);

    out.write_all(render_definitions(poller.describe(), update_secs).as_bytes())?;
    out.flush()?;

    let mut ticker = interval(update_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_sent: Option<Instant> = None;

    loop {
        ticker.tick().await;
        let snapshot = match poller.poll().await {
            Ok(sample) if sample.fresh => sample.snapshot,
            Ok(_) => continue,
            Err(e) if e.is_fatal() => {
                tracing::error!("Stopping plugin: {e}");
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("Skipping update: {e}");
                continue;
            }
        };

        let now = Instant::now();
        let since_last = last_sent.map(|sent| now.duration_since(sent));
        last_sent = Some(now);

        out.write_all(render_update(poller.describe(), &snapshot, since_last).as_bytes())?;
        out.flush()?;
    }
}

/// Tell netdata not to restart the plugin.
pub fn disable<W: Write>(mut out: W) -> Result<()> {
    writeln!(out, "DISABLE")?;
    out.flush()?;
    Ok(())
}

