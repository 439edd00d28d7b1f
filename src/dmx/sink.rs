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

/// Opaque interface to push a 512-byte DMX buffer for a given universe id.
///
/// Delivery is best-effort; back-pressure is not propagated. Implementations are assumed to
/// coalesce: the engine may call `send` faster than the wire can transmit, and the most recent
/// buffer is expected to win.
pub trait DmxSink: Send + Sync {
    fn send(&mut self, universe_id: u16, buffer: &[u8; 512]) -> Result<(), String>;
}

/// Test-only sink that records every buffer sent, keyed by universe.
#[cfg(test)]
#[derive(Default)]
pub struct MockSink {
    pub sent: std::sync::Arc<std::sync::Mutex<Vec<(u16, [u8; 512])>>>,
    pub should_fail: bool,
}

#[cfg(test)]
impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_for(&self, universe_id: u16) -> Option<[u8; 512]> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _)| *id == universe_id)
            .map(|(_, buf)| *buf)
    }

    pub fn count_for(&self, universe_id: u16) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == universe_id)
            .count()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[cfg(test)]
impl DmxSink for MockSink {
    fn send(&mut self, universe_id: u16, buffer: &[u8; 512]) -> Result<(), String> {
        if self.should_fail {
            return Err("mock sink failure".to_string());
        }
        self.sent.lock().unwrap().push((universe_id, *buffer));
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mock_sink_records_messages() {
        let mut sink = MockSink::new();
        let buf = [7u8; 512];
        sink.send(1, &buf).unwrap();
        sink.send(2, &[0u8; 512]).unwrap();
        assert_eq!(2, sink.message_count());
        assert_eq!(1, sink.count_for(1));
        assert_eq!(Some(buf), sink.last_for(1));
        sink.clear();
        assert_eq!(0, sink.message_count());
    }
}
