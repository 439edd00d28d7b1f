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
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::EngineError;

use super::sink::DmxSink;

const CONNECT_ATTEMPTS: u32 = 10;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// A DmxSink backed by a running `olad` instance via the streaming client protocol.
pub struct OlaSink {
    client: ola::StreamingClient<TcpStream>,
}

impl OlaSink {
    /// Connects to olad, retrying with a bounded backoff the same way the engine's DMX output
    /// thread waits for the daemon to come up on process start.
    pub fn connect(config: ola::client::StreamingClientConfig) -> Result<Self, EngineError> {
        let mut last_err = None;
        for attempt in 1..=CONNECT_ATTEMPTS {
            match ola::connect_with_config(config.clone()) {
                Ok(client) => {
                    info!(attempt, "connected to olad");
                    return Ok(Self { client });
                }
                Err(e) => {
                    warn!(attempt, error = %e, "failed to connect to olad, retrying");
                    last_err = Some(e.to_string());
                    thread::sleep(CONNECT_RETRY_DELAY);
                }
            }
        }
        Err(EngineError::DmxBackendSetup(last_err.unwrap_or_else(
            || "exhausted connection attempts".to_string(),
        )))
    }
}

impl DmxSink for OlaSink {
    fn send(&mut self, universe_id: u16, buffer: &[u8; 512]) -> Result<(), String> {
        let mut dmx_buffer = ola::DmxBuffer::new();
        for (i, byte) in buffer.iter().enumerate() {
            dmx_buffer.set_channel(i, *byte);
        }
        self.client
            .send_dmx(universe_id as u32, &dmx_buffer)
            .map_err(|e| {
                error!(universe_id, error = %e, "failed to send DMX buffer");
                e.to_string()
            })
    }
}
