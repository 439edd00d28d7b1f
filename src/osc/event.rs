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

/// A decoded control event, produced either from an OSC message or from a signal, and consumed
/// by the scheduler on the following tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// `/offset` — sets `head_offset_ms`.
    Offset(i64),
    /// `/wait` — sets `end_wait_ms`.
    Wait(i64),
    /// `/load` — reserved; carried through but intentionally a no-op in this version.
    Load(String),
    /// `/play` and `/stop` both toggle `play_control` in this version; see the open-question
    /// note in the design ledger for why they are not distinguished.
    TogglePlay,
    /// `/quit`, SIGTERM, or SIGINT — raises a terminate request.
    Terminate,
    /// `/check` or SIGUSR1 — emit a "running" health signal.
    Check,
    /// `/stoponlost` — toggles `stop_on_mtc_lost`.
    ToggleStopOnLost,
}
