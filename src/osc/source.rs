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
use std::net::SocketAddr;

use crossbeam_channel::Sender;
use rosc::{OscMessage, OscPacket, OscType};
use tokio::net::UdpSocket;
use tracing::{info, warn};

use super::event::ControlEvent;

const RECV_BUFFER_SIZE: usize = 1536;

/// Listens for OSC messages on a configured port and emits ControlEvents on `events_tx`.
///
/// A bound UdpSocket consumed in an async task, decoding each datagram and matching its address
/// against a configured prefix. Inbound-only: there is no outbound status broadcast.
pub struct OscCommandSource {
    addr: SocketAddr,
    prefix: String,
}

impl OscCommandSource {
    pub fn new(addr: SocketAddr, prefix: String) -> Self {
        Self { addr, prefix }
    }

    /// Binds the socket and spawns the receive loop as a tokio task, returning immediately.
    pub async fn monitor(self, events_tx: Sender<ControlEvent>) -> Result<(), String> {
        let socket = UdpSocket::bind(self.addr).await.map_err(|e| e.to_string())?;
        info!(addr = %self.addr, prefix = %self.prefix, "OSC command source listening");

        tokio::spawn(async move {
            let mut buf = [0u8; RECV_BUFFER_SIZE];
            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((size, _from)) => {
                        handle_datagram(&buf[..size], &self.prefix, &events_tx);
                    }
                    Err(e) => {
                        warn!(error = %e, "OSC socket recv error");
                    }
                }
            }
        });

        Ok(())
    }
}

fn handle_datagram(data: &[u8], prefix: &str, events_tx: &Sender<ControlEvent>) {
    match rosc::decoder::decode_udp(data) {
        Ok((_, packet)) => handle_packet(packet, prefix, events_tx),
        Err(e) => {
            warn!(error = ?e, "discarding malformed OSC packet");
        }
    }
}

fn handle_packet(packet: OscPacket, prefix: &str, events_tx: &Sender<ControlEvent>) {
    match packet {
        OscPacket::Message(message) => handle_message(message, prefix, events_tx),
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                handle_packet(inner, prefix, events_tx);
            }
        }
    }
}

fn handle_message(message: OscMessage, prefix: &str, events_tx: &Sender<ControlEvent>) {
    let Some(suffix) = message.addr.strip_prefix(prefix) else {
        return;
    };

    let event = match suffix {
        "/offset" => first_float_floor(&message.args).map(ControlEvent::Offset),
        "/wait" => first_float_floor(&message.args).map(ControlEvent::Wait),
        "/load" => first_string(&message.args).map(ControlEvent::Load),
        "/play" | "/stop" => Some(ControlEvent::TogglePlay),
        "/quit" => Some(ControlEvent::Terminate),
        "/check" => Some(ControlEvent::Check),
        "/stoponlost" => Some(ControlEvent::ToggleStopOnLost),
        other => {
            warn!(address = other, "unrecognized OSC address, discarding");
            None
        }
    };

    match event {
        Some(event) => {
            if events_tx.send(event).is_err() {
                warn!("control event channel closed, dropping OSC event");
            }
        }
        None => warn!(address = %message.addr, "malformed OSC message, discarding"),
    }
}

fn first_float_floor(args: &[OscType]) -> Option<i64> {
    match args.first()? {
        OscType::Float(f) => Some(f.floor() as i64),
        OscType::Double(d) => Some(d.floor() as i64),
        OscType::Int(i) => Some(*i as i64),
        _ => None,
    }
}

fn first_string(args: &[OscType]) -> Option<String> {
    match args.first()? {
        OscType::String(s) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_offset_message_emits_event() {
        let (tx, rx) = unbounded();
        let message = OscMessage {
            addr: "/offset".to_string(),
            args: vec![OscType::Float(42.9)],
        };
        handle_message(message, "", &tx);
        assert_eq!(Some(ControlEvent::Offset(42)), rx.try_recv().ok());
    }

    #[test]
    fn test_prefix_is_stripped() {
        let (tx, rx) = unbounded();
        let message = OscMessage {
            addr: "/show1/quit".to_string(),
            args: vec![],
        };
        handle_message(message, "/show1", &tx);
        assert_eq!(Some(ControlEvent::Terminate), rx.try_recv().ok());
    }

    #[test]
    fn test_unrecognized_address_emits_nothing() {
        let (tx, rx) = unbounded();
        let message = OscMessage {
            addr: "/bogus".to_string(),
            args: vec![],
        };
        handle_message(message, "", &tx);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_malformed_offset_missing_arg_emits_nothing() {
        let (tx, rx) = unbounded();
        let message = OscMessage {
            addr: "/offset".to_string(),
            args: vec![],
        };
        handle_message(message, "", &tx);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_play_and_stop_both_toggle() {
        let (tx, rx) = unbounded();
        handle_message(
            OscMessage {
                addr: "/play".to_string(),
                args: vec![],
            },
            "",
            &tx,
        );
        handle_message(
            OscMessage {
                addr: "/stop".to_string(),
                args: vec![],
            },
            "",
            &tx,
        );
        assert_eq!(Some(ControlEvent::TogglePlay), rx.try_recv().ok());
        assert_eq!(Some(ControlEvent::TogglePlay), rx.try_recv().ok());
    }
}
