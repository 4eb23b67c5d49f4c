//! In-process plugin server for the integration tests.
//!
//! Serves a fixed catalog over a Unix socket in a temp directory and records every
//! message it receives.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tutti_dssi::ffi::{DssiDescriptor, LadspaDescriptor, LadspaHandle};
use tutti_dssi::{BridgeConfig, PluginRecord};
use tutti_dssi_remote::protocol::{BridgeMessage, HostMessage};
use tutti_dssi_remote::transport::{MessageTransport, TransportListener};

pub const PROGRAMS: [(&str, f32); 2] = [("Unity", 1.0), ("Half", 0.5)];

/// - "Mono Gain": out = in * param 0
/// - "Note Counter" (synth): out = number of MIDI events received so far
/// - "Broken": drops the connection when asked for its parameter count
/// - "Fragile": drops the connection instead of processing audio
pub fn catalog() -> Vec<PluginRecord> {
    vec![
        PluginRecord::new("Mono Gain", "Gain")
            .vendor("Tutti Test")
            .audio_io(1, 1)
            .parameter("Gain", 1.0),
        PluginRecord::new("Note Counter", "Counter")
            .audio_io(0, 1)
            .parameter("Level", 0.2)
            .synth(true),
        PluginRecord::new("Broken", "Broken").audio_io(1, 1),
        PluginRecord::new("Fragile", "Fragile").audio_io(1, 1),
    ]
}

pub struct TestServer {
    _dir: TempDir,
    socket: PathBuf,
    log: Arc<Mutex<Vec<HostMessage>>>,
}

impl TestServer {
    pub fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("plugins.sock");
        let log = Arc::new(Mutex::new(Vec::new()));

        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let path = socket.clone();
        let server_log = log.clone();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async move {
                let listener = TransportListener::bind(&path).await.unwrap();
                ready_tx.send(()).unwrap();
                while let Ok(transport) = listener.accept().await {
                    tokio::spawn(serve(transport, server_log.clone()));
                }
            });
        });

        ready_rx.recv().unwrap();
        Self {
            _dir: dir,
            socket,
            log,
        }
    }

    pub fn config(&self) -> BridgeConfig {
        BridgeConfig::default()
            .socket_path(&self.socket)
            .connect_timeout_ms(1000)
    }

    pub fn messages(&self) -> Vec<HostMessage> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

async fn serve(mut transport: MessageTransport, log: Arc<Mutex<Vec<HostMessage>>>) {
    let plugins = catalog();
    let mut loaded: Option<PluginRecord> = None;
    let mut params: Vec<f32> = Vec::new();
    let mut midi_events = 0usize;

    while let Ok(msg) = transport.recv_host_message().await {
        log.lock().unwrap().push(msg.clone());
        let name = loaded.as_ref().map(|p| p.dll_name.clone()).unwrap_or_default();

        let reply = match msg {
            HostMessage::QueryPlugins => Some(BridgeMessage::PluginList {
                plugins: plugins.clone(),
            }),
            HostMessage::LoadPlugin { name } => match plugins.iter().find(|p| p.dll_name == name) {
                Some(record) => {
                    params = record.parameters.iter().map(|p| p.default).collect();
                    loaded = Some(record.clone());
                    Some(BridgeMessage::PluginLoaded)
                }
                None => Some(BridgeMessage::Error {
                    message: format!("unknown plugin {}", name),
                }),
            },
            HostMessage::GetParameterCount => {
                if name == "Broken" {
                    return;
                }
                Some(BridgeMessage::Count {
                    value: params.len() as u32,
                })
            }
            HostMessage::GetInputCount => Some(BridgeMessage::Count {
                value: loaded.as_ref().map_or(0, |p| p.inputs as u32),
            }),
            HostMessage::GetOutputCount => Some(BridgeMessage::Count {
                value: loaded.as_ref().map_or(0, |p| p.outputs as u32),
            }),
            HostMessage::GetProgramCount => Some(BridgeMessage::Count {
                value: PROGRAMS.len() as u32,
            }),
            HostMessage::GetProgramName { index } => Some(BridgeMessage::ProgramName {
                name: PROGRAMS[index as usize].0.to_string(),
            }),
            HostMessage::GetParameter { index } => Some(BridgeMessage::ParameterValue {
                value: params[index as usize],
            }),
            HostMessage::SetParameter { index, value } => {
                params[index as usize] = value;
                None
            }
            HostMessage::SetCurrentProgram { index } => {
                if let Some(first) = params.first_mut() {
                    *first = PROGRAMS[index as usize].1;
                }
                None
            }
            HostMessage::SendMidi { events } => {
                midi_events += events.len();
                None
            }
            HostMessage::ProcessAudio {
                num_samples,
                inputs,
            } => {
                let frames = num_samples as usize;
                let output = match name.as_str() {
                    "Fragile" => return,
                    "Note Counter" => vec![midi_events as f32; frames],
                    _ => inputs[0].iter().map(|s| s * params[0]).collect(),
                };
                Some(BridgeMessage::AudioProcessed {
                    outputs: vec![output],
                })
            }
            HostMessage::Terminate => {
                let _ = transport.send_bridge_message(&BridgeMessage::Ack).await;
                return;
            }
            HostMessage::SetSampleRate { .. }
            | HostMessage::SetBufferSize { .. }
            | HostMessage::Reset => None,
        };

        if let Some(reply) = reply {
            if transport.send_bridge_message(&reply).await.is_err() {
                return;
            }
        }
    }
}

/// The LADSPA half of a DSSI descriptor pointer.
///
/// # Safety
///
/// `dssi` must be a live descriptor.
pub unsafe fn ladspa<'a>(dssi: *const DssiDescriptor) -> &'a LadspaDescriptor {
    &*(*dssi).ladspa_plugin
}

/// Instantiate through the descriptor's own function pointer, as a host would.
///
/// # Safety
///
/// `dssi` must be a live descriptor.
pub unsafe fn instantiate(dssi: *const DssiDescriptor, sample_rate: u64) -> LadspaHandle {
    let ladspa = ladspa(dssi);
    (ladspa.instantiate.unwrap())(ladspa, sample_rate as _)
}
