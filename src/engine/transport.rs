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
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Sentinel for `end_wait_ms` meaning "only terminate on an explicit `/quit`".
pub const END_WAIT_FOREVER: i64 = i64::MAX;

/// Transport playback mode, toggled by `/play` and `/stop` (identical in this version).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayControl {
    Paused,
    Playing,
}

impl PlayControl {
    pub fn toggled(self) -> Self {
        match self {
            PlayControl::Paused => PlayControl::Playing,
            PlayControl::Playing => PlayControl::Paused,
        }
    }
}

/// Mutable, process-wide transport state owned by the PlaybackEngine.
///
/// The fields the OSC thread writes and the scheduler reads are atomics (single-writer
/// discipline); the fields only the scheduler thread ever touches are plain values with no
/// synchronization.
pub struct TransportState {
    // Written by the OSC/signal side, read by the scheduler.
    head_offset_ms: AtomicI64,
    end_wait_ms: AtomicI64,
    playing: AtomicBool,
    stop_on_mtc_lost: AtomicBool,
    terminate_requested: AtomicBool,

    // Scheduler-only; no synchronization required.
    pub mtc_started: bool,
    pub mtc_lost: bool,
    pub end_of_play: bool,
    pub end_timestamp_ms: i64,
    /// Latches that Sustain's dense buffer has already been emitted once; cleared on leaving
    /// Sustain. An implementation may re-emit on every tick instead; both are permitted.
    pub scene_set: bool,
    /// Latches that a zero buffer has already been emitted for the current zero-output region
    /// (PreRoll, or the moment PostRoll is entered); cleared whenever the phase changes away
    /// from a zero-output phase.
    pub zero_latched: bool,
    /// The play-head position, in milliseconds, as tracked by the engine when not directly
    /// following MTC (advances one frame per tick rather than per wall-clock millisecond).
    pub play_head: i64,
}

impl TransportState {
    pub fn new(head_offset_ms: i64, end_wait_ms: i64, stop_on_mtc_lost: bool) -> Self {
        Self {
            head_offset_ms: AtomicI64::new(head_offset_ms),
            end_wait_ms: AtomicI64::new(end_wait_ms),
            playing: AtomicBool::new(true),
            stop_on_mtc_lost: AtomicBool::new(stop_on_mtc_lost),
            terminate_requested: AtomicBool::new(false),
            mtc_started: false,
            mtc_lost: false,
            end_of_play: false,
            end_timestamp_ms: 0,
            scene_set: false,
            zero_latched: false,
            play_head: 0,
        }
    }

    pub fn head_offset_ms(&self) -> i64 {
        self.head_offset_ms.load(Ordering::Acquire)
    }

    pub fn set_head_offset_ms(&self, value: i64) {
        self.head_offset_ms.store(value, Ordering::Release);
    }

    pub fn end_wait_ms(&self) -> i64 {
        self.end_wait_ms.load(Ordering::Acquire)
    }

    pub fn set_end_wait_ms(&self, value: i64) {
        self.end_wait_ms.store(value, Ordering::Release);
    }

    pub fn play_control(&self) -> PlayControl {
        if self.playing.load(Ordering::Acquire) {
            PlayControl::Playing
        } else {
            PlayControl::Paused
        }
    }

    pub fn toggle_play_control(&self) {
        let current = self.playing.load(Ordering::Acquire);
        self.playing.store(!current, Ordering::Release);
    }

    pub fn stop_on_mtc_lost(&self) -> bool {
        self.stop_on_mtc_lost.load(Ordering::Acquire)
    }

    pub fn toggle_stop_on_mtc_lost(&self) {
        let current = self.stop_on_mtc_lost.load(Ordering::Acquire);
        self.stop_on_mtc_lost.store(!current, Ordering::Release);
    }

    pub fn request_terminate(&self) {
        self.terminate_requested.store(true, Ordering::Release);
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate_requested.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_toggle_play_control() {
        let state = TransportState::new(0, 0, false);
        assert_eq!(PlayControl::Playing, state.play_control());
        state.toggle_play_control();
        assert_eq!(PlayControl::Paused, state.play_control());
        state.toggle_play_control();
        assert_eq!(PlayControl::Playing, state.play_control());
    }

    #[test]
    fn test_offset_and_wait_setters() {
        let state = TransportState::new(0, 0, false);
        state.set_head_offset_ms(1500);
        assert_eq!(1500, state.head_offset_ms());
        state.set_end_wait_ms(END_WAIT_FOREVER);
        assert_eq!(END_WAIT_FOREVER, state.end_wait_ms());
    }
}
