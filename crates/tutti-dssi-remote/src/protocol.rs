//! IPC protocol between the adapter and the plugin server.

use crate::record::PluginRecord;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

const MIDI_STACK_CAPACITY: usize = 256;

/// Bytes per encoded MIDI event in a batch. Shorter messages are zero padded.
pub const MIDI_EVENT_STRIDE: usize = 3;

/// IPC-serializable MIDI event (raw bytes format for cross-process communication).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcMidiEvent {
    pub frame_offset: i32,
    pub data: [u8; MIDI_EVENT_STRIDE],
}

impl IpcMidiEvent {
    pub fn from_bytes(frame_offset: i32, bytes: &[u8]) -> Self {
        let mut data = [0u8; MIDI_EVENT_STRIDE];
        let len = bytes.len().min(MIDI_EVENT_STRIDE);
        data[..len].copy_from_slice(&bytes[..len]);
        Self { frame_offset, data }
    }

    /// Splits a strided byte buffer plus its parallel frame offsets into events.
    ///
    /// `count` is clamped to what both buffers actually hold.
    pub fn batch(data: &[u8], frame_offsets: &[i32], count: usize) -> IpcMidiEventVec {
        data.chunks_exact(MIDI_EVENT_STRIDE)
            .zip(frame_offsets)
            .take(count)
            .map(|(bytes, &offset)| Self::from_bytes(offset, bytes))
            .collect()
    }
}

pub type IpcMidiEventVec = SmallVec<[IpcMidiEvent; MIDI_STACK_CAPACITY]>;

/// Host to bridge message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HostMessage {
    QueryPlugins,
    LoadPlugin {
        name: String,
    },
    GetParameterCount,
    GetInputCount,
    GetOutputCount,
    GetProgramCount,
    GetProgramName {
        index: u32,
    },
    SetSampleRate {
        rate: u32,
    },
    SetBufferSize {
        frames: u32,
    },
    Reset,
    GetParameter {
        index: u32,
    },
    SetParameter {
        index: u32,
        value: f32,
    },
    SetCurrentProgram {
        index: u32,
    },
    SendMidi {
        events: IpcMidiEventVec,
    },
    ProcessAudio {
        num_samples: u32,
        inputs: Vec<Vec<f32>>,
    },
    Terminate,
}

impl HostMessage {
    /// Whether the server answers this message.
    pub fn expects_reply(&self) -> bool {
        !matches!(
            self,
            HostMessage::SetSampleRate { .. }
                | HostMessage::SetBufferSize { .. }
                | HostMessage::Reset
                | HostMessage::SetParameter { .. }
                | HostMessage::SetCurrentProgram { .. }
                | HostMessage::SendMidi { .. }
        )
    }
}

/// Bridge to host message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeMessage {
    PluginList { plugins: Vec<PluginRecord> },
    PluginLoaded,
    Count { value: u32 },
    ProgramName { name: String },
    ParameterValue { value: f32 },
    AudioProcessed { outputs: Vec<Vec<f32>> },
    Ack,
    Error { message: String },
}
