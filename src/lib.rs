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
pub mod cue;
pub mod dmx;
pub mod engine;
pub mod error;
pub mod mtc;
pub mod osc;
pub mod scheduler;
pub mod settings;
pub mod thread_priority;
#[cfg(test)]
pub mod test;
pub mod util;

use std::sync::Arc;

use crossbeam_channel::unbounded;
use tracing::{error, info};

use dmx::ola_sink::OlaSink;
use dmx::DmxSink;
use engine::{PlaybackEngine, TransportState};
use error::{EngineError, ExitCode};
use mtc::MtcReceiver;
use osc::{ControlEvent, OscCommandSource};
use scheduler::Scheduler;
use settings::Settings;

/// Loads the cue, wires the MTC receiver, OSC source, and OLA sink, and runs the scheduler to
/// completion.
pub async fn run(settings: Settings) -> Result<(), ExitCode> {
    let document = std::fs::read_to_string(&settings.file).map_err(|e| {
        error!(file = %settings.file, error = %e, "failed to read cue file");
        ExitCode::MissingFile
    })?;

    let cue = cue::load(&document).map_err(|e| {
        error!(error = %e, "failed to load cue");
        ExitCode::from(&e)
    })?;

    let transport = TransportState::new(
        settings.offset,
        settings.wait,
        settings.stop_on_mtc_lost(),
    );
    let mut engine = PlaybackEngine::new(cue, transport);

    let mtc = Arc::new(MtcReceiver::new());
    mtc.connect(&settings.midi_device).map_err(|e| {
        error!(error = %e, "failed to connect to MIDI input device");
        ExitCode::WrongParameters
    })?;

    let (events_tx, events_rx) = unbounded::<ControlEvent>();

    let osc_addr = format!("0.0.0.0:{}", settings.port)
        .parse()
        .map_err(|_| ExitCode::WrongParameters)?;
    let osc_source = OscCommandSource::new(osc_addr, settings.osc_prefix.clone());
    osc_source
        .monitor(events_tx.clone())
        .await
        .map_err(|e| {
            error!(error = %e, "failed to start OSC command source");
            ExitCode::WrongParameters
        })?;

    spawn_signal_bridge(events_tx);

    let universe_count = engine.cue().universes.len();
    let mut sinks: Vec<Box<dyn DmxSink>> = Vec::with_capacity(universe_count);
    for _ in 0..universe_count {
        let sink = OlaSink::connect(ola::client::StreamingClientConfig::default())
            .map_err(|e: EngineError| {
                error!(error = %e, "failed to connect to DMX backend");
                ExitCode::from(&e)
            })?;
        sinks.push(Box::new(sink));
    }

    info!(
        universes = universe_count,
        port = settings.port,
        "lumacue starting"
    );

    let scheduler = Scheduler::new();
    tokio::task::spawn_blocking(move || {
        scheduler.run(engine, &mtc, &events_rx, sinks);
    })
    .await
    .map_err(|_| ExitCode::WrongParameters)?;

    Ok(())
}

/// Bridges SIGTERM/SIGINT to a terminate event and SIGUSR1 to a check event, replacing
/// signal-handler-mutated globals with a channel the scheduler already drains.
fn spawn_signal_bridge(events_tx: crossbeam_channel::Sender<ControlEvent>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let term_tx = events_tx.clone();
        tokio::spawn(async move {
            let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
            let mut int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
            loop {
                tokio::select! {
                    _ = term.recv() => { let _ = term_tx.send(ControlEvent::Terminate); }
                    _ = int.recv() => { let _ = term_tx.send(ControlEvent::Terminate); }
                }
            }
        });

        tokio::spawn(async move {
            let mut usr1 = signal(SignalKind::user_defined1()).expect("failed to install SIGUSR1 handler");
            loop {
                usr1.recv().await;
                let _ = events_tx.send(ControlEvent::Check);
            }
        });
    }
}
