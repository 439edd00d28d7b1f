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
use tracing::{info, warn};

use crate::cue::CueModel;
use crate::dmx::DmxSink;
use crate::mtc::MtcReceiver;
use crate::osc::ControlEvent;
use crate::util::wall_clock_ms;

use super::envelope::{evaluate, scale_channel, EnvelopePhase};
use super::transport::{PlayControl, TransportState, END_WAIT_FOREVER};

/// Outcome of a single tick, consulted by the Scheduler to decide whether to keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Terminate,
}

/// The core engine: owns TransportState, composes MTC + offset into a play-head, evaluates the
/// envelope, and drives a DmxSink per universe.
pub struct PlaybackEngine {
    cue: CueModel,
    pub transport: TransportState,
}

impl PlaybackEngine {
    pub fn new(cue: CueModel, transport: TransportState) -> Self {
        Self { cue, transport }
    }

    pub fn cue(&self) -> &CueModel {
        &self.cue
    }

    /// Applies a control event to TransportState. Called from the scheduler once per drained
    /// event, before the universe loop for that tick.
    pub fn apply_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Offset(ms) => self.transport.set_head_offset_ms(ms),
            ControlEvent::Wait(ms) => self.transport.set_end_wait_ms(ms),
            ControlEvent::Load(_path) => {
                // Reserved; intentionally a no-op in this version.
            }
            ControlEvent::TogglePlay => self.transport.toggle_play_control(),
            ControlEvent::Terminate => self.transport.request_terminate(),
            ControlEvent::Check => info!("health check: engine running"),
            ControlEvent::ToggleStopOnLost => self.transport.toggle_stop_on_mtc_lost(),
        }
    }

    /// Runs one tick for every universe in the cue, in ascending universe-id order, and returns
    /// whether the scheduler should keep running afterward.
    pub fn tick(&mut self, mtc: &MtcReceiver, sinks: &mut [Box<dyn DmxSink>]) -> TickOutcome {
        if self.transport.end_of_play || self.transport.terminate_requested() {
            self.transport.end_of_play = true;
            return TickOutcome::Terminate;
        }

        let running = mtc.running();
        let following_mtc = running;
        let gate_open = self.transport.play_control() == PlayControl::Playing
            && (running || !self.transport.stop_on_mtc_lost());

        if !gate_open {
            if self.transport.mtc_started && !running && !self.transport.mtc_lost {
                self.transport.mtc_lost = true;
                warn!("MTC signal lost");
            }
            return TickOutcome::Continue;
        }

        if running {
            if !self.transport.mtc_started {
                self.transport.mtc_started = true;
                info!("playback started, following MTC");
            } else if self.transport.mtc_lost {
                info!("MTC signal resumed");
            }
            self.transport.mtc_lost = false;
        }

        if following_mtc {
            self.transport.play_head = mtc.head_ms();
        } else if self.transport.mtc_started {
            let fps = match mtc.frame_rate() {
                29 => 30,
                other => other.max(1) as i64,
            };
            self.transport.play_head += 1000 / fps;
        }
        let current = self.transport.play_head + self.transport.head_offset_ms();

        let phase = evaluate(current, &self.cue.envelope);
        self.update_latches(phase);

        for i in 0..self.cue.universes.len().min(sinks.len()) {
            let universe = self.cue.universes[i].clone();
            if let Some(buffer) = self.buffer_for(&universe, phase) {
                if let Err(e) = sinks[i].send(universe.id, &buffer) {
                    warn!(universe_id = universe.id, error = %e, "DMX send failed, dropping this tick's buffer");
                }
            }
        }

        if matches!(phase, EnvelopePhase::PostRoll) {
            return self.handle_post_roll();
        }

        TickOutcome::Continue
    }

    fn update_latches(&mut self, phase: EnvelopePhase) {
        let is_zero_phase = matches!(phase, EnvelopePhase::PreRoll | EnvelopePhase::PostRoll);
        if !is_zero_phase {
            self.transport.zero_latched = false;
        }
        if !matches!(phase, EnvelopePhase::Sustain) {
            self.transport.scene_set = false;
        }
    }

    /// Returns the buffer to emit this tick for a universe, or `None` if the latch says this
    /// phase has already been emitted and need not repeat.
    fn buffer_for(&mut self, universe: &crate::cue::DmxUniverse, phase: EnvelopePhase) -> Option<[u8; 512]> {
        match phase {
            EnvelopePhase::PreRoll | EnvelopePhase::PostRoll => {
                if self.transport.zero_latched {
                    return None;
                }
                self.transport.zero_latched = true;
                Some([0u8; 512])
            }
            EnvelopePhase::Sustain => {
                if self.transport.scene_set {
                    return None;
                }
                self.transport.scene_set = true;
                Some(universe.buffer)
            }
            EnvelopePhase::FadingIn(m) | EnvelopePhase::FadingOut(m) => {
                let mut scratch = [0u8; 512];
                for channel in &universe.channels {
                    scratch[channel.id as usize] = scale_channel(channel.value, m);
                }
                Some(scratch)
            }
        }
    }

    fn handle_post_roll(&mut self) -> TickOutcome {
        let end_wait_ms = self.transport.end_wait_ms();
        if end_wait_ms == 0 {
            self.transport.end_of_play = true;
            info!("end of play reached, end_wait_ms=0, terminating");
            return TickOutcome::Terminate;
        }
        if end_wait_ms == END_WAIT_FOREVER {
            return TickOutcome::Continue;
        }
        if self.transport.end_timestamp_ms == 0 {
            self.transport.end_timestamp_ms = wall_clock_ms();
            info!(wait_ms = end_wait_ms, "entered post-roll, waiting before terminating");
            return TickOutcome::Continue;
        }
        if wall_clock_ms() - self.transport.end_timestamp_ms > end_wait_ms {
            self.transport.end_of_play = true;
            info!("end_wait_ms elapsed, terminating");
            return TickOutcome::Terminate;
        }
        TickOutcome::Continue
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cue::{CueEnvelope, DmxChannel, DmxUniverse};
    use crate::dmx::sink::MockSink;

    fn cue_with(in_ms: i64, length_ms: i64, out_ms: i64, channels: Vec<(u16, u8)>) -> CueModel {
        CueModel {
            envelope: CueEnvelope {
                offset_timecode: "00:00:00:00".to_string(),
                in_ms,
                length_ms,
                out_ms,
            },
            universes: vec![DmxUniverse::new(
                0,
                channels
                    .into_iter()
                    .map(|(id, value)| DmxChannel { id, value })
                    .collect(),
            )],
        }
    }

    fn engine_with_mtc(cue: CueModel, end_wait_ms: i64) -> (PlaybackEngine, MtcReceiver) {
        let transport = TransportState::new(0, end_wait_ms, false);
        let engine = PlaybackEngine::new(cue, transport);
        let mtc = MtcReceiver::new();
        // A full-frame sysex at head_ms=0, 30fps, to make `running()` true immediately.
        mtc.inject_for_test(&[0xF0, 0x7F, 0x7F, 0x01, 0x01, 0b0110_0000, 0, 0, 0, 0xF7]);
        (engine, mtc)
    }

    fn advance_mtc_to(mtc: &MtcReceiver, ms: i64) {
        let total_frames = ms * 30 / 1000;
        let hours = total_frames / (30 * 3600);
        let rem = total_frames % (30 * 3600);
        let minutes = rem / (30 * 60);
        let rem = rem % (30 * 60);
        let seconds = rem / 30;
        let frames = rem % 30;
        let hr_byte = (hours as u8 & 0x1F) | (0b11 << 5);
        mtc.inject_for_test(&[
            0xF0, 0x7F, 0x7F, 0x01, 0x01, hr_byte, minutes as u8, seconds as u8, frames as u8,
            0xF7,
        ]);
    }

    #[test]
    fn test_s1_zero_length_envelope_emits_zero_and_terminates() {
        let cue = cue_with(0, 0, 0, vec![(0, 255), (4, 128)]);
        let (mut engine, mtc) = engine_with_mtc(cue, 0);
        let mut sinks: Vec<Box<dyn DmxSink>> = vec![Box::new(MockSink::new())];

        let outcome = engine.tick(&mtc, &mut sinks);
        assert_eq!(TickOutcome::Terminate, outcome);
        assert!(engine.transport.end_of_play);
    }

    #[test]
    fn test_s2_pure_sustain() {
        let cue = cue_with(0, 1000, 0, vec![(9, 200)]);
        let (mut engine, mtc) = engine_with_mtc(cue, 0);
        let mock = MockSink::new();
        let sent = mock.sent.clone();
        let mut sinks: Vec<Box<dyn DmxSink>> = vec![Box::new(mock)];

        advance_mtc_to(&mtc, 500);
        engine.tick(&mtc, &mut sinks);
        let (_, buffer) = sent.lock().unwrap().last().cloned().unwrap();
        assert_eq!(200, buffer[9]);
        for (i, b) in buffer.iter().enumerate() {
            if i != 9 {
                assert_eq!(0, *b);
            }
        }
    }

    #[test]
    fn test_s3_symmetric_fade() {
        let cue = cue_with(1000, 0, 1000, vec![(0, 100)]);
        let (mut engine, mtc) = engine_with_mtc(cue, 0);
        let mock = MockSink::new();
        let sent = mock.sent.clone();
        let mut sinks: Vec<Box<dyn DmxSink>> = vec![Box::new(mock)];

        advance_mtc_to(&mtc, 500);
        engine.tick(&mtc, &mut sinks);
        let (_, buffer) = sent.lock().unwrap().last().cloned().unwrap();
        assert_eq!(50, buffer[0]);

        advance_mtc_to(&mtc, 1500);
        engine.tick(&mtc, &mut sinks);
        let (_, buffer) = sent.lock().unwrap().last().cloned().unwrap();
        assert_eq!(50, buffer[0]);
    }

    #[test]
    fn test_s4_mtc_loss_with_stop_on_lost_emits_nothing() {
        let cue = cue_with(0, 1000, 0, vec![(0, 100)]);
        let transport = TransportState::new(0, 0, true);
        let mut engine = PlaybackEngine::new(cue, transport);
        let mtc = MtcReceiver::new();
        mtc.inject_for_test(&[0xF0, 0x7F, 0x7F, 0x01, 0x01, 0b0110_0000, 0, 0, 0, 0xF7]);
        let mut sinks: Vec<Box<dyn DmxSink>> = vec![Box::new(MockSink::new())];

        advance_mtc_to(&mtc, 500);
        engine.tick(&mtc, &mut sinks);
        assert!(engine.transport.mtc_started);

        // Simulate MTC going silent by waiting past the liveness window without feeding it.
        std::thread::sleep(std::time::Duration::from_millis(120));
        engine.tick(&mtc, &mut sinks);
        assert!(engine.transport.mtc_lost);
    }

    #[test]
    fn test_end_wait_forever_never_terminates_until_quit() {
        let cue = cue_with(0, 0, 0, vec![]);
        let (mut engine, mtc) = engine_with_mtc(cue, END_WAIT_FOREVER);
        let mut sinks: Vec<Box<dyn DmxSink>> = vec![Box::new(MockSink::new())];

        let outcome = engine.tick(&mtc, &mut sinks);
        assert_eq!(TickOutcome::Continue, outcome);
        assert!(!engine.transport.end_of_play);

        engine.apply_event(ControlEvent::Terminate);
        let outcome = engine.tick(&mtc, &mut sinks);
        assert_eq!(TickOutcome::Terminate, outcome);
    }

    #[test]
    fn test_s6_osc_offset_mid_cue() {
        let cue = cue_with(0, 10000, 0, vec![(0, 255)]);
        let (mut engine, mtc) = engine_with_mtc(cue, 0);
        let mut sinks: Vec<Box<dyn DmxSink>> = vec![Box::new(MockSink::new())];

        advance_mtc_to(&mtc, 5000);
        engine.tick(&mtc, &mut sinks);
        assert_eq!(5000, engine.transport.play_head);

        engine.apply_event(ControlEvent::Offset(3000));
        assert_eq!(3000, engine.transport.head_offset_ms());
    }

    #[test]
    fn test_end_of_play_is_monotonic() {
        let cue = cue_with(0, 0, 0, vec![]);
        let (mut engine, mtc) = engine_with_mtc(cue, 0);
        let mut sinks: Vec<Box<dyn DmxSink>> = vec![Box::new(MockSink::new())];

        engine.tick(&mtc, &mut sinks);
        assert!(engine.transport.end_of_play);
        // Further ticks must not un-latch end_of_play.
        engine.tick(&mtc, &mut sinks);
        assert!(engine.transport.end_of_play);
    }
}
