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
//! CLI-facing settings. Named `settings` rather than `config` to avoid colliding with the
//! `config` crate name.
use clap::{Parser, ValueEnum};

/// How status is reported to the console while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowMode {
    /// Continuous human-readable status lines, for interactive console use.
    #[value(name = "w")]
    Watch,
    /// Only state-transition and error lines, for running under a process supervisor.
    #[value(name = "c")]
    Compact,
}

#[derive(Parser, Debug)]
#[clap(
    author = "Michael Wilson",
    version = "0.1.0",
    about = "Plays a DMX lighting cue synchronized to MIDI Time Code, with OSC control."
)]
pub struct Settings {
    /// Path to the cue description file.
    #[arg(short, long)]
    pub file: String,

    /// UDP port to listen for OSC control messages on.
    #[arg(short, long, default_value_t = 7000)]
    pub port: u16,

    /// Initial play-head offset in milliseconds.
    #[arg(short, long, default_value_t = 0)]
    pub offset: i64,

    /// Initial end-of-play wait in milliseconds.
    #[arg(short, long, default_value_t = 0)]
    pub wait: i64,

    /// An identifying string for this player instance, used only in logging.
    #[arg(short, long, default_value = "")]
    pub uuid: String,

    /// Continue if MTC lost: inverts the default `stop_on_mtc_lost` behavior.
    #[arg(short = 'c', long = "ciml")]
    pub ciml: bool,

    /// MIDI input device name to receive MTC from.
    #[arg(long)]
    pub midi_device: String,

    /// OSC address prefix; messages outside this prefix are ignored.
    #[arg(long, default_value = "")]
    pub osc_prefix: String,

    /// Status reporting mode.
    #[arg(long = "show", value_enum, default_value_t = ShowMode::Compact)]
    pub show: ShowMode,
}

impl Settings {
    pub fn stop_on_mtc_lost(&self) -> bool {
        !self.ciml
    }
}
