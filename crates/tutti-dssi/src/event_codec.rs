//! Sequencer event → raw MIDI packing.
//!
//! A DSSI host hands over a block of `snd_seq_event_t`s. The remote side wants raw
//! MIDI at a fixed 3-byte stride plus one frame offset per event, so each block is
//! decoded into two flat buffers owned by the codec.

use crate::ffi::*;
use thiserror::Error;
use tutti_dssi_remote::MIDI_EVENT_STRIDE;

/// Byte capacity of the per-instance MIDI buffer.
pub const MIDI_BUFFER_SIZE: usize = 1023;

/// Largest fixed-size decoding (RPN/NRPN: four controller messages).
const SCRATCH_SIZE: usize = 12;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unsupported sequencer event type {0}")]
    Unsupported(u8),

    #[error("{len} byte payload does not fit in {room} bytes")]
    NoSpace { len: usize, room: usize },
}

/// Decode one event into `out` as raw MIDI without running status.
///
/// Returns the number of bytes the event decodes to. Bytes past what `out` can
/// hold are never written.
pub fn decode_event(event: &SndSeqEvent, out: &mut [u8]) -> Result<usize, DecodeError> {
    let mut buf = [0u8; SCRATCH_SIZE];

    let len = match event.kind {
        SND_SEQ_EVENT_NOTEON | SND_SEQ_EVENT_NOTE => note(event, 0x90, &mut buf),
        SND_SEQ_EVENT_NOTEOFF => note(event, 0x80, &mut buf),
        SND_SEQ_EVENT_KEYPRESS => note(event, 0xA0, &mut buf),
        SND_SEQ_EVENT_CONTROLLER => {
            let ctrl = event.control_data();
            buf[..3].copy_from_slice(&[
                0xB0 | (ctrl.channel & 0x0F),
                (ctrl.param & 0x7F) as u8,
                (ctrl.value & 0x7F) as u8,
            ]);
            3
        }
        SND_SEQ_EVENT_PGMCHANGE => channel_byte(event, 0xC0, &mut buf),
        SND_SEQ_EVENT_CHANPRESS => channel_byte(event, 0xD0, &mut buf),
        SND_SEQ_EVENT_PITCHBEND => {
            let ctrl = event.control_data();
            let value = (ctrl.value + 8192).clamp(0, 16383);
            buf[..3].copy_from_slice(&[
                0xE0 | (ctrl.channel & 0x0F),
                (value & 0x7F) as u8,
                ((value >> 7) & 0x7F) as u8,
            ]);
            3
        }
        SND_SEQ_EVENT_CONTROL14 => control14(event, &mut buf),
        SND_SEQ_EVENT_NONREGPARAM => parameter_number(event, 0x63, 0x62, &mut buf),
        SND_SEQ_EVENT_REGPARAM => parameter_number(event, 0x65, 0x64, &mut buf),
        SND_SEQ_EVENT_SONGPOS => {
            let value = event.control_data().value;
            buf[..3].copy_from_slice(&[0xF2, (value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8]);
            3
        }
        SND_SEQ_EVENT_SONGSEL => system_byte(event, 0xF3, &mut buf),
        SND_SEQ_EVENT_QFRAME => system_byte(event, 0xF1, &mut buf),
        SND_SEQ_EVENT_TUNE_REQUEST => single(0xF6, &mut buf),
        SND_SEQ_EVENT_CLOCK => single(0xF8, &mut buf),
        SND_SEQ_EVENT_START => single(0xFA, &mut buf),
        SND_SEQ_EVENT_CONTINUE => single(0xFB, &mut buf),
        SND_SEQ_EVENT_STOP => single(0xFC, &mut buf),
        SND_SEQ_EVENT_SENSING => single(0xFE, &mut buf),
        SND_SEQ_EVENT_RESET => single(0xFF, &mut buf),
        SND_SEQ_EVENT_SYSEX => return sysex(event, out),
        other => return Err(DecodeError::Unsupported(other)),
    };

    let room = out.len();
    if len > room {
        return Err(DecodeError::NoSpace { len, room });
    }
    out[..len].copy_from_slice(&buf[..len]);
    Ok(len)
}

fn note(event: &SndSeqEvent, status: u8, buf: &mut [u8]) -> usize {
    let note = event.note_data();
    buf[..3].copy_from_slice(&[
        status | (note.channel & 0x0F),
        note.note & 0x7F,
        note.velocity & 0x7F,
    ]);
    3
}

fn channel_byte(event: &SndSeqEvent, status: u8, buf: &mut [u8]) -> usize {
    let ctrl = event.control_data();
    buf[0] = status | (ctrl.channel & 0x0F);
    buf[1] = (ctrl.value & 0x7F) as u8;
    2
}

fn system_byte(event: &SndSeqEvent, status: u8, buf: &mut [u8]) -> usize {
    buf[0] = status;
    buf[1] = (event.control_data().value & 0x7F) as u8;
    2
}

fn single(status: u8, buf: &mut [u8]) -> usize {
    buf[0] = status;
    1
}

/// Controllers below 32 carry a 14-bit value as an MSB/LSB pair.
fn control14(event: &SndSeqEvent, buf: &mut [u8]) -> usize {
    let ctrl = event.control_data();
    let status = 0xB0 | (ctrl.channel & 0x0F);

    if ctrl.param >= 32 {
        buf[..3].copy_from_slice(&[status, (ctrl.param & 0x7F) as u8, (ctrl.value & 0x7F) as u8]);
        return 3;
    }

    let param = ctrl.param as u8;
    buf[..6].copy_from_slice(&[
        status,
        param,
        ((ctrl.value >> 7) & 0x7F) as u8,
        status,
        param + 0x20,
        (ctrl.value & 0x7F) as u8,
    ]);
    6
}

fn parameter_number(event: &SndSeqEvent, msb_cc: u8, lsb_cc: u8, buf: &mut [u8]) -> usize {
    let ctrl = event.control_data();
    let status = 0xB0 | (ctrl.channel & 0x0F);
    let param = ctrl.param;
    let value = ctrl.value;

    buf.copy_from_slice(&[
        status,
        msb_cc,
        ((param >> 7) & 0x7F) as u8,
        status,
        lsb_cc,
        (param & 0x7F) as u8,
        status,
        0x06,
        ((value >> 7) & 0x7F) as u8,
        status,
        0x26,
        (value & 0x7F) as u8,
    ]);
    SCRATCH_SIZE
}

fn sysex(event: &SndSeqEvent, out: &mut [u8]) -> Result<usize, DecodeError> {
    let (len, ptr) = event.ext_data();
    if len > out.len() {
        return Err(DecodeError::NoSpace {
            len,
            room: out.len(),
        });
    }
    if len == 0 || ptr.is_null() {
        return Ok(0);
    }

    // SAFETY: the sender of a SYSEX event guarantees `ptr` is valid for `len` bytes
    // for the duration of the callback that delivered it.
    let payload = unsafe { std::slice::from_raw_parts(ptr, len) };
    out[..len].copy_from_slice(payload);
    Ok(len)
}

/// Per-instance MIDI packing buffers.
///
/// Holds `capacity / 3` events per block. Each stored event occupies one 3-byte slot
/// (right-padded with zeros) and one frame offset slot.
pub struct EventCodec {
    data: Box<[u8]>,
    frame_offsets: Box<[i32]>,
    len: usize,
    count: usize,
}

impl Default for EventCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl EventCodec {
    pub fn new() -> Self {
        Self::with_capacity(MIDI_BUFFER_SIZE)
    }

    /// `capacity` is in bytes and is rounded down to a whole number of slots.
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = capacity / MIDI_EVENT_STRIDE;
        Self {
            data: vec![0; slots * MIDI_EVENT_STRIDE].into_boxed_slice(),
            frame_offsets: vec![0; slots].into_boxed_slice(),
            len: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.count = 0;
    }

    /// Decode one block, replacing whatever the previous block left behind.
    ///
    /// Returns the number of events stored. Events past the buffer's capacity are
    /// dropped for this block.
    pub fn decode_block(&mut self, events: &[SndSeqEvent]) -> usize {
        self.clear();
        let mut scratch = [0u8; SCRATCH_SIZE];

        for event in events {
            // Stop once less than one whole slot is left. Every stored event takes
            // exactly one slot, so a buffer of N slots holds N events.
            if self.capacity() - self.len < MIDI_EVENT_STRIDE {
                break;
            }

            match decode_event(event, &mut scratch) {
                Ok(n @ 1..=MIDI_EVENT_STRIDE) => {
                    self.frame_offsets[self.count] = event.tick() as i32;
                    let slot = &mut self.data[self.len..self.len + MIDI_EVENT_STRIDE];
                    slot[..n].copy_from_slice(&scratch[..n]);
                    slot[n..].fill(0);
                    self.len += MIDI_EVENT_STRIDE;
                    self.count += 1;
                }
                Ok(n) => {
                    tracing::warn!(
                        "MIDI event of type {} decoded to {} bytes, discarding",
                        event.kind,
                        n
                    );
                }
                Err(e) => {
                    tracing::warn!("MIDI decoder error for event type {}: {}", event.kind, e);
                }
            }
        }

        self.count
    }

    /// Packed events of the last decoded block.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn frame_offsets(&self) -> &[i32] {
        &self.frame_offsets[..self.count]
    }

    pub fn event_count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
