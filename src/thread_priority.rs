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
use std::env;

use thread_priority::{RealtimeThreadSchedulePolicy, ThreadPriority, ThreadSchedulePolicy};
use tracing::warn;

const DISABLE_RT_ENV: &str = "LUMACUE_DISABLE_RT_SCHEDULER";

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Whether real-time scheduling for the scheduler thread is enabled. Opt out with
/// `LUMACUE_DISABLE_RT_SCHEDULER=1`.
pub fn rt_scheduler_enabled() -> bool {
    !env_flag(DISABLE_RT_ENV)
}

/// Attempts to raise the current thread to SCHED_FIFO real-time priority on Unix. Falls back
/// silently (with a warning) on any failure or on non-Unix platforms, since the scheduler is
/// still correct without it, just subject to more jitter under system load.
pub fn configure_scheduler_thread_priority() {
    if !rt_scheduler_enabled() {
        return;
    }

    #[cfg(unix)]
    {
        if let Err(e) = thread_priority::set_thread_priority_and_policy(
            thread_priority::thread_native_id(),
            ThreadPriority::Crossplatform(50.try_into().unwrap_or_default()),
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            warn!(error = ?e, "failed to set real-time scheduler thread priority, continuing without it");
        }
    }
    #[cfg(not(unix))]
    {
        warn!("real-time scheduler thread priority is only supported on Unix");
    }
}
