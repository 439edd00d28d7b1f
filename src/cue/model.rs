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
use std::fmt::Write as _;

/// A single DMX channel assertion. `id` is 0-based internally; the document format is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmxChannel {
    pub id: u16,
    pub value: u8,
}

/// One DMX universe: a dense 512-byte buffer plus the sparse channel list it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct DmxUniverse {
    pub id: u16,
    pub channels: Vec<DmxChannel>,
    pub buffer: [u8; 512],
}

impl DmxUniverse {
    /// Builds a universe from an id and a channel list, projecting the channels into a dense
    /// buffer. Duplicate channel ids: last occurrence in the list wins.
    pub fn new(id: u16, channels: Vec<DmxChannel>) -> Self {
        let mut buffer = [0u8; 512];
        for channel in &channels {
            buffer[channel.id as usize] = channel.value;
        }
        Self {
            id,
            channels,
            buffer,
        }
    }
}

/// The temporal envelope applied to a cue's channel targets. Holds the offset timecode string
/// verbatim (decoded later by the engine against a frame rate) plus the three timing windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueEnvelope {
    pub offset_timecode: String,
    pub in_ms: i64,
    pub length_ms: i64,
    pub out_ms: i64,
}

impl CueEnvelope {
    pub fn length_end_ms(&self) -> i64 {
        self.in_ms + self.length_ms
    }

    pub fn out_end_ms(&self) -> i64 {
        self.length_end_ms() + self.out_ms
    }
}

/// An immutable, fully loaded cue: the envelope plus every universe it drives.
#[derive(Debug, Clone, PartialEq)]
pub struct CueModel {
    pub envelope: CueEnvelope,
    pub universes: Vec<DmxUniverse>,
}

impl CueModel {
    /// Re-serializes the cue back into the same document shape it was loaded from. Used only by
    /// the load -> serialize -> load round-trip test; not part of the runtime control surface.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<Root>\n");
        let _ = writeln!(out, "  <Offset>{}</Offset>", self.envelope.offset_timecode);
        let _ = writeln!(out, "  <InTime>{}</InTime>", self.envelope.in_ms);
        let _ = writeln!(out, "  <Length>{}</Length>", self.envelope.length_ms);
        let _ = writeln!(out, "  <OutTime>{}</OutTime>", self.envelope.out_ms);
        out.push_str("  <DmxScene>\n");
        for universe in &self.universes {
            let _ = writeln!(out, "    <DmxUniverse id=\"{}\">", universe.id);
            for channel in &universe.channels {
                let _ = writeln!(
                    out,
                    "      <DmxChannel id=\"{}\">{}</DmxChannel>",
                    channel.id + 1,
                    channel.value
                );
            }
            out.push_str("    </DmxUniverse>\n");
        }
        out.push_str("  </DmxScene>\n");
        out.push_str("</Root>\n");
        out
    }
}
