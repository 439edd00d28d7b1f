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
use std::collections::HashMap;

use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::CueError;

use super::model::{CueEnvelope, CueModel, DmxChannel, DmxUniverse};

/// Parses a cue description document into a CueModel.
///
/// Recognized elements under the root: `Offset`, `InTime`, `Length`, `OutTime`, and one or more
/// `DmxScene` containing `DmxUniverse`/`DmxChannel`. Unknown elements are ignored (logged at
/// debug level). Absent timing elements default to zero. The root must exist.
pub fn parse(document: &str) -> Result<CueModel, CueError> {
    let doc = Document::parse(document).map_err(|e| CueError::Parse {
        path: "document".to_string(),
        message: e.to_string(),
    })?;

    let root = doc
        .descendants()
        .find(|n| n.is_element() && n.has_tag_name("Root"))
        .ok_or(CueError::Empty)?;

    let mut offset_timecode = String::new();
    let mut in_ms = 0i64;
    let mut length_ms = 0i64;
    let mut out_ms = 0i64;
    let mut universes: Vec<DmxUniverse> = Vec::new();

    for child in root.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "Offset" => offset_timecode = text_of(&child),
            "InTime" => in_ms = parse_number(&child, "InTime")?,
            "Length" => length_ms = parse_number(&child, "Length")?,
            "OutTime" => out_ms = parse_number(&child, "OutTime")?,
            "DmxScene" => universes.extend(parse_scene(&child)?),
            other => debug!(element = other, "ignoring unrecognized cue element"),
        }
    }

    universes.sort_by_key(|u| u.id);

    Ok(CueModel {
        envelope: CueEnvelope {
            offset_timecode,
            in_ms,
            length_ms,
            out_ms,
        },
        universes,
    })
}

fn parse_scene(scene: &Node) -> Result<Vec<DmxUniverse>, CueError> {
    let mut universes = Vec::new();
    for universe_node in scene
        .children()
        .filter(|n| n.is_element() && n.has_tag_name("DmxUniverse"))
    {
        let id: u16 = universe_node
            .attribute("id")
            .ok_or_else(|| CueError::InvalidNumber {
                field: "DmxUniverse/@id".to_string(),
                value: "missing".to_string(),
            })?
            .parse()
            .map_err(|_| CueError::InvalidNumber {
                field: "DmxUniverse/@id".to_string(),
                value: universe_node.attribute("id").unwrap_or("").to_string(),
            })?;

        // Last occurrence wins for duplicate channel ids; a map preserves that while an ordered
        // Vec (built from the map in ascending id order) keeps channel listing deterministic.
        let mut by_id: HashMap<u16, u8> = HashMap::new();
        for channel_node in universe_node
            .children()
            .filter(|n| n.is_element() && n.has_tag_name("DmxChannel"))
        {
            let doc_id: u16 = channel_node
                .attribute("id")
                .ok_or_else(|| CueError::InvalidNumber {
                    field: "DmxChannel/@id".to_string(),
                    value: "missing".to_string(),
                })?
                .parse()
                .map_err(|_| CueError::InvalidNumber {
                    field: "DmxChannel/@id".to_string(),
                    value: channel_node.attribute("id").unwrap_or("").to_string(),
                })?;
            if doc_id == 0 || doc_id as usize > 512 {
                return Err(CueError::InvalidNumber {
                    field: "DmxChannel/@id".to_string(),
                    value: doc_id.to_string(),
                });
            }
            let value: u8 = text_of(&channel_node)
                .trim()
                .parse()
                .map_err(|_| CueError::InvalidNumber {
                    field: "DmxChannel".to_string(),
                    value: text_of(&channel_node),
                })?;
            by_id.insert(doc_id - 1, value);
        }

        let mut channels: Vec<DmxChannel> = by_id
            .into_iter()
            .map(|(id, value)| DmxChannel { id, value })
            .collect();
        channels.sort_by_key(|c| c.id);

        universes.push(DmxUniverse::new(id, channels));
    }
    Ok(universes)
}

fn text_of(node: &Node) -> String {
    node.text().unwrap_or("").trim().to_string()
}

fn parse_number(node: &Node, field: &str) -> Result<i64, CueError> {
    let text = text_of(node);
    if text.is_empty() {
        return Ok(0);
    }
    text.parse().map_err(|_| CueError::InvalidNumber {
        field: field.to_string(),
        value: text,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = r#"
        <Root>
          <Offset>01:00:00:00</Offset>
          <InTime>1000</InTime>
          <Length>2000</Length>
          <OutTime>500</OutTime>
          <DmxScene>
            <DmxUniverse id="1">
              <DmxChannel id="1">255</DmxChannel>
              <DmxChannel id="5">128</DmxChannel>
              <DmxChannel id="5">64</DmxChannel>
            </DmxUniverse>
          </DmxScene>
        </Root>
    "#;

    #[test]
    fn test_parse_basic_cue() {
        let model = parse(SAMPLE).expect("should parse");
        assert_eq!("01:00:00:00", model.envelope.offset_timecode);
        assert_eq!(1000, model.envelope.in_ms);
        assert_eq!(2000, model.envelope.length_ms);
        assert_eq!(500, model.envelope.out_ms);
        assert_eq!(1, model.universes.len());

        let universe = &model.universes[0];
        assert_eq!(1, universe.id);
        assert_eq!(255, universe.buffer[0]);
        // Duplicate channel id 5: last occurrence (64) wins.
        assert_eq!(64, universe.buffer[4]);
        for (i, b) in universe.buffer.iter().enumerate() {
            if i != 0 && i != 4 {
                assert_eq!(0, *b);
            }
        }
    }

    #[test]
    fn test_missing_timing_elements_default_to_zero() {
        let model = parse("<Root><DmxScene><DmxUniverse id=\"0\"></DmxUniverse></DmxScene></Root>")
            .expect("should parse");
        assert_eq!(0, model.envelope.in_ms);
        assert_eq!(0, model.envelope.length_ms);
        assert_eq!(0, model.envelope.out_ms);
    }

    #[test]
    fn test_unknown_elements_are_ignored() {
        let model = parse(
            "<Root><Bogus>hello</Bogus><InTime>10</InTime><DmxScene><DmxUniverse id=\"0\"/></DmxScene></Root>",
        )
        .expect("should parse");
        assert_eq!(10, model.envelope.in_ms);
    }

    #[test]
    fn test_missing_root_is_empty_error() {
        let err = parse("<NotRoot></NotRoot>").unwrap_err();
        assert!(matches!(err, CueError::Empty));
    }

    #[test]
    fn test_invalid_number_errors() {
        let err = parse("<Root><InTime>not-a-number</InTime></Root>").unwrap_err();
        assert!(matches!(err, CueError::InvalidNumber { .. }));
    }

    #[test]
    fn test_universes_are_sorted_by_id() {
        let model = parse(
            "<Root><DmxScene>\
               <DmxUniverse id=\"5\"/>\
               <DmxUniverse id=\"2\"/>\
               <DmxUniverse id=\"3\"/>\
             </DmxScene></Root>",
        )
        .expect("should parse");
        let ids: Vec<u16> = model.universes.iter().map(|u| u.id).collect();
        assert_eq!(vec![2, 3, 5], ids);
    }

    #[test]
    fn test_round_trip() {
        let model = parse(SAMPLE).expect("should parse");
        let serialized = model.to_xml();
        let reparsed = parse(&serialized).expect("should reparse");
        assert_eq!(model, reparsed);
    }
}
