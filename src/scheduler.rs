// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use tracing::info;

use crate::dmx::DmxSink;
use crate::engine::playback::TickOutcome;
use crate::engine::PlaybackEngine;
use crate::mtc::MtcReceiver;
use crate::osc::ControlEvent;
use crate::thread_priority::configure_scheduler_thread_priority;

/// Nominal scheduler tick period (100 Hz).
pub const T_TICK: Duration = Duration::from_millis(10);

/// Single-threaded cooperative tick loop. Owns no state of its own beyond the tick period; all
/// playback state lives in the PlaybackEngine it drives.
///
/// Uses `spin_sleep` rather than a tokio interval to hold a tight, jitter-bounded period on a
/// dedicated OS thread.
pub struct Scheduler {
    tick_period: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tick_period: T_TICK,
        }
    }

    /// Runs until the engine signals termination on some universe, or the event channel closes.
    pub fn run(
        &self,
        mut engine: PlaybackEngine,
        mtc: &MtcReceiver,
        events_rx: &Receiver<ControlEvent>,
        mut sinks: Vec<Box<dyn DmxSink>>,
    ) {
        configure_scheduler_thread_priority();
        info!(period_ms = self.tick_period.as_millis(), "scheduler starting");

        let sleeper = spin_sleep::SpinSleeper::default();
        loop {
            let tick_start = Instant::now();

            for event in events_rx.try_iter() {
                engine.apply_event(event);
            }

            if engine.tick(mtc, &mut sinks) == TickOutcome::Terminate {
                info!("scheduler stopping");
                break;
            }

            let elapsed = tick_start.elapsed();
            if let Some(remaining) = self.tick_period.checked_sub(elapsed) {
                sleeper.sleep(remaining);
            }
        }
    }
}
