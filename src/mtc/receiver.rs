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
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::Mutex;

use midir::{MidiInput, MidiInputConnection};
use midly::live::{LiveEvent, MtcQuarterFrameMessage, SystemCommon};
use tracing::{debug, trace, warn};

use crate::mtc::quarterframe::{parse_full_frame_sysex, QuarterFrameAccumulator};
use crate::util::wall_clock_ms;

fn quarter_frame_index(kind: MtcQuarterFrameMessage) -> u8 {
    match kind {
        MtcQuarterFrameMessage::FramesLow => 0,
        MtcQuarterFrameMessage::FramesHigh => 1,
        MtcQuarterFrameMessage::SecondsLow => 2,
        MtcQuarterFrameMessage::SecondsHigh => 3,
        MtcQuarterFrameMessage::MinutesLow => 4,
        MtcQuarterFrameMessage::MinutesHigh => 5,
        MtcQuarterFrameMessage::HoursLow => 6,
        MtcQuarterFrameMessage::HoursHigh => 7,
    }
}

/// Reconstructs a monotonically advancing timecode position from incoming MTC messages.
///
/// `head_ms` and `frame_rate` are written from the MIDI callback thread and read from the
/// scheduler thread; both are plain atomics, keeping a single-writer discipline at this
/// boundary.
pub struct MtcReceiver {
    head_ms: AtomicI64,
    frame_rate: AtomicU8,
    last_message_at_ms: AtomicI64,
    accumulator: Mutex<QuarterFrameAccumulator>,
    connection: Mutex<Option<MidiInputConnection<()>>>,
}

impl Default for MtcReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl MtcReceiver {
    pub fn new() -> Self {
        Self {
            head_ms: AtomicI64::new(0),
            frame_rate: AtomicU8::new(30),
            last_message_at_ms: AtomicI64::new(0),
            accumulator: Mutex::new(QuarterFrameAccumulator::new()),
            connection: Mutex::new(None),
        }
    }

    pub fn head_ms(&self) -> i64 {
        self.head_ms.load(Ordering::Acquire)
    }

    pub fn frame_rate(&self) -> u8 {
        self.frame_rate.load(Ordering::Acquire)
    }

    /// True unless MIDI ingress has been silent for more than two frame periods.
    pub fn running(&self) -> bool {
        let last = self.last_message_at_ms.load(Ordering::Acquire);
        if last == 0 {
            return false;
        }
        let frame_period_ms = self.frame_period_ms();
        wall_clock_ms() - last <= 2 * frame_period_ms
    }

    fn frame_period_ms(&self) -> i64 {
        let fps = match self.frame_rate() {
            29 => 30,
            other => other as i64,
        };
        if fps == 0 {
            1000
        } else {
            1000 / fps
        }
    }

    /// Connects to the named MIDI input port and begins reconstructing timecode from it.
    pub fn connect(self: &std::sync::Arc<Self>, port_name: &str) -> Result<(), String> {
        let midi_in = MidiInput::new("lumacue-mtc").map_err(|e| e.to_string())?;
        let port = midi_in
            .ports()
            .into_iter()
            .find(|p| midi_in.port_name(p).map(|n| n == port_name).unwrap_or(false))
            .ok_or_else(|| format!("MIDI input port not found: {}", port_name))?;

        let receiver = std::sync::Arc::clone(self);
        let connection = midi_in
            .connect(
                &port,
                "lumacue-mtc-in",
                move |_stamp, message, _| {
                    receiver.handle_message(message);
                },
                (),
            )
            .map_err(|e| e.to_string())?;

        *self.connection.lock().expect("lock poisoned") = Some(connection);
        Ok(())
    }

    fn handle_message(&self, raw: &[u8]) {
        let event = match LiveEvent::parse(raw) {
            Ok(event) => event,
            Err(_) => return,
        };
        match event {
            LiveEvent::Common(SystemCommon::MidiTimeCodeQuarterFrame(kind, value)) => {
                let index = quarter_frame_index(kind);
                let mut accumulator = self.accumulator.lock().expect("lock poisoned");
                if let Some(frame) = accumulator.feed(index, u8::from(value)) {
                    self.commit(frame.to_ms(), frame.frame_rate);
                    trace!(head_ms = frame.to_ms(), "MTC quarter-frame cycle complete");
                }
            }
            LiveEvent::Common(SystemCommon::SysEx(payload)) => {
                if let Some(frame) = parse_full_frame_sysex(midly::num::u7::slice_as_int(payload)) {
                    // A full-frame message resets head_ms outright, per the MtcReceiver
                    // contract: resumption does not reset head_ms except via full-frame.
                    self.accumulator.lock().expect("lock poisoned").reset();
                    self.commit(frame.to_ms(), frame.frame_rate);
                    debug!(head_ms = frame.to_ms(), "MTC full-frame message");
                } else {
                    self.touch_liveness();
                }
            }
            _ => {
                // Other live events (note on/off, clock, etc.) don't carry timecode but still
                // count as ingress activity for liveness purposes if present on this port.
            }
        }
    }

    fn commit(&self, head_ms: i64, frame_rate: u8) {
        self.head_ms.store(head_ms, Ordering::Release);
        self.frame_rate.store(frame_rate, Ordering::Release);
        self.touch_liveness();
    }

    fn touch_liveness(&self) {
        self.last_message_at_ms
            .store(wall_clock_ms(), Ordering::Release);
    }

    #[cfg(test)]
    pub fn inject_for_test(&self, raw: &[u8]) {
        self.handle_message(raw);
    }
}
