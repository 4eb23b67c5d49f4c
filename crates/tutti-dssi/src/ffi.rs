//! LADSPA / DSSI / ALSA sequencer FFI structures
//!
//! These structures match `ladspa.h` (1.1), `dssi.h` (1.0) and the
//! `snd_seq_event_t` layout from `alsa/seq_event.h`.

use std::ffi::{c_char, c_int, c_uint, c_ulong, c_void};

// =============================================================================
// LADSPA
// =============================================================================

pub type LadspaData = f32;
pub type LadspaHandle = *mut c_void;
pub type LadspaProperties = c_int;
pub type LadspaPortDescriptor = c_int;
pub type LadspaPortRangeHintDescriptor = c_int;

pub const LADSPA_PROPERTY_REALTIME: LadspaProperties = 0x1;
pub const LADSPA_PROPERTY_INPLACE_BROKEN: LadspaProperties = 0x2;
pub const LADSPA_PROPERTY_HARD_RT_CAPABLE: LadspaProperties = 0x4;

pub const LADSPA_PORT_INPUT: LadspaPortDescriptor = 0x1;
pub const LADSPA_PORT_OUTPUT: LadspaPortDescriptor = 0x2;
pub const LADSPA_PORT_CONTROL: LadspaPortDescriptor = 0x4;
pub const LADSPA_PORT_AUDIO: LadspaPortDescriptor = 0x8;

pub const LADSPA_HINT_BOUNDED_BELOW: LadspaPortRangeHintDescriptor = 0x1;
pub const LADSPA_HINT_BOUNDED_ABOVE: LadspaPortRangeHintDescriptor = 0x2;
pub const LADSPA_HINT_TOGGLED: LadspaPortRangeHintDescriptor = 0x4;
pub const LADSPA_HINT_SAMPLE_RATE: LadspaPortRangeHintDescriptor = 0x8;
pub const LADSPA_HINT_LOGARITHMIC: LadspaPortRangeHintDescriptor = 0x10;
pub const LADSPA_HINT_INTEGER: LadspaPortRangeHintDescriptor = 0x20;
pub const LADSPA_HINT_DEFAULT_MASK: LadspaPortRangeHintDescriptor = 0x3C0;
pub const LADSPA_HINT_DEFAULT_NONE: LadspaPortRangeHintDescriptor = 0x0;
pub const LADSPA_HINT_DEFAULT_MINIMUM: LadspaPortRangeHintDescriptor = 0x40;
pub const LADSPA_HINT_DEFAULT_LOW: LadspaPortRangeHintDescriptor = 0x80;
pub const LADSPA_HINT_DEFAULT_MIDDLE: LadspaPortRangeHintDescriptor = 0xC0;
pub const LADSPA_HINT_DEFAULT_HIGH: LadspaPortRangeHintDescriptor = 0x100;
pub const LADSPA_HINT_DEFAULT_MAXIMUM: LadspaPortRangeHintDescriptor = 0x140;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LadspaPortRangeHint {
    pub hint_descriptor: LadspaPortRangeHintDescriptor,
    pub lower_bound: LadspaData,
    pub upper_bound: LadspaData,
}

#[repr(C)]
pub struct LadspaDescriptor {
    pub unique_id: c_ulong,
    pub label: *const c_char,
    pub properties: LadspaProperties,
    pub name: *const c_char,
    pub maker: *const c_char,
    pub copyright: *const c_char,
    pub port_count: c_ulong,
    pub port_descriptors: *const LadspaPortDescriptor,
    pub port_names: *const *const c_char,
    pub port_range_hints: *const LadspaPortRangeHint,
    pub implementation_data: *mut c_void,
    pub instantiate: Option<
        unsafe extern "C" fn(
            descriptor: *const LadspaDescriptor,
            sample_rate: c_ulong,
        ) -> LadspaHandle,
    >,
    pub connect_port: Option<
        unsafe extern "C" fn(instance: LadspaHandle, port: c_ulong, location: *mut LadspaData),
    >,
    pub activate: Option<unsafe extern "C" fn(instance: LadspaHandle)>,
    pub run: Option<unsafe extern "C" fn(instance: LadspaHandle, sample_count: c_ulong)>,
    pub run_adding: Option<unsafe extern "C" fn(instance: LadspaHandle, sample_count: c_ulong)>,
    pub set_run_adding_gain: Option<unsafe extern "C" fn(instance: LadspaHandle, gain: LadspaData)>,
    pub deactivate: Option<unsafe extern "C" fn(instance: LadspaHandle)>,
    pub cleanup: Option<unsafe extern "C" fn(instance: LadspaHandle)>,
}

// =============================================================================
// DSSI
// =============================================================================

pub const DSSI_API_VERSION: c_int = 1;

#[repr(C)]
#[derive(Debug)]
pub struct DssiProgramDescriptor {
    pub bank: c_ulong,
    pub program: c_ulong,
    pub name: *const c_char,
}

impl Default for DssiProgramDescriptor {
    fn default() -> Self {
        Self {
            bank: 0,
            program: 0,
            name: std::ptr::null(),
        }
    }
}

pub type RunSynthFn = unsafe extern "C" fn(
    instance: LadspaHandle,
    sample_count: c_ulong,
    events: *mut SndSeqEvent,
    event_count: c_ulong,
);

pub type RunMultipleSynthsFn = unsafe extern "C" fn(
    instance_count: c_ulong,
    instances: *mut LadspaHandle,
    sample_count: c_ulong,
    events: *mut *mut SndSeqEvent,
    event_counts: *mut c_ulong,
);

#[repr(C)]
pub struct DssiDescriptor {
    pub dssi_api_version: c_int,
    pub ladspa_plugin: *const LadspaDescriptor,
    pub configure: Option<
        unsafe extern "C" fn(
            instance: LadspaHandle,
            key: *const c_char,
            value: *const c_char,
        ) -> *mut c_char,
    >,
    pub get_program: Option<
        unsafe extern "C" fn(
            instance: LadspaHandle,
            index: c_ulong,
        ) -> *const DssiProgramDescriptor,
    >,
    pub select_program:
        Option<unsafe extern "C" fn(instance: LadspaHandle, bank: c_ulong, program: c_ulong)>,
    pub get_midi_controller_for_port:
        Option<unsafe extern "C" fn(instance: LadspaHandle, port: c_ulong) -> c_int>,
    pub run_synth: Option<RunSynthFn>,
    pub run_synth_adding: Option<RunSynthFn>,
    pub run_multiple_synths: Option<RunMultipleSynthsFn>,
    pub run_multiple_synths_adding: Option<RunMultipleSynthsFn>,
}

// =============================================================================
// ALSA sequencer events
// =============================================================================

pub const SND_SEQ_EVENT_SYSTEM: u8 = 0;
pub const SND_SEQ_EVENT_RESULT: u8 = 1;
pub const SND_SEQ_EVENT_NOTE: u8 = 5;
pub const SND_SEQ_EVENT_NOTEON: u8 = 6;
pub const SND_SEQ_EVENT_NOTEOFF: u8 = 7;
pub const SND_SEQ_EVENT_KEYPRESS: u8 = 8;
pub const SND_SEQ_EVENT_CONTROLLER: u8 = 10;
pub const SND_SEQ_EVENT_PGMCHANGE: u8 = 11;
pub const SND_SEQ_EVENT_CHANPRESS: u8 = 12;
pub const SND_SEQ_EVENT_PITCHBEND: u8 = 13;
pub const SND_SEQ_EVENT_CONTROL14: u8 = 14;
pub const SND_SEQ_EVENT_NONREGPARAM: u8 = 15;
pub const SND_SEQ_EVENT_REGPARAM: u8 = 16;
pub const SND_SEQ_EVENT_SONGPOS: u8 = 20;
pub const SND_SEQ_EVENT_SONGSEL: u8 = 21;
pub const SND_SEQ_EVENT_QFRAME: u8 = 22;
pub const SND_SEQ_EVENT_START: u8 = 30;
pub const SND_SEQ_EVENT_CONTINUE: u8 = 31;
pub const SND_SEQ_EVENT_STOP: u8 = 32;
pub const SND_SEQ_EVENT_CLOCK: u8 = 36;
pub const SND_SEQ_EVENT_TUNE_REQUEST: u8 = 40;
pub const SND_SEQ_EVENT_RESET: u8 = 41;
pub const SND_SEQ_EVENT_SENSING: u8 = 42;
pub const SND_SEQ_EVENT_SYSEX: u8 = 130;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SndSeqRealTime {
    pub tv_sec: c_uint,
    pub tv_nsec: c_uint,
}

/// DSSI hosts put the frame offset within the block in `tick`.
#[repr(C)]
#[derive(Clone, Copy)]
pub union SndSeqTimestamp {
    pub tick: c_uint,
    pub time: SndSeqRealTime,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SndSeqAddr {
    pub client: u8,
    pub port: u8,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SndSeqEvNote {
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
    pub off_velocity: u8,
    pub duration: c_uint,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SndSeqEvCtrl {
    pub channel: u8,
    pub unused: [u8; 3],
    pub param: c_uint,
    pub value: c_int,
}

#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct SndSeqEvExt {
    pub len: c_uint,
    pub ptr: *mut c_void,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union SndSeqEventData {
    pub note: SndSeqEvNote,
    pub control: SndSeqEvCtrl,
    pub raw8: [u8; 12],
    pub raw32: [u32; 3],
    pub ext: SndSeqEvExt,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct SndSeqEvent {
    pub kind: u8,
    pub flags: u8,
    pub tag: u8,
    pub queue: u8,
    pub time: SndSeqTimestamp,
    pub source: SndSeqAddr,
    pub dest: SndSeqAddr,
    pub data: SndSeqEventData,
}

const _: () = assert!(std::mem::size_of::<SndSeqEvent>() == 28);
const _: () = assert!(std::mem::align_of::<SndSeqEvent>() == 4);
const _: () = assert!(std::mem::size_of::<SndSeqEventData>() == 12);

impl SndSeqEvent {
    /// Event of `kind` at frame `tick` with an all-zero payload.
    pub fn new(kind: u8, tick: u32) -> Self {
        Self {
            kind,
            flags: 0,
            tag: 0,
            queue: 0,
            time: SndSeqTimestamp { tick },
            source: SndSeqAddr::default(),
            dest: SndSeqAddr::default(),
            data: SndSeqEventData { raw8: [0; 12] },
        }
    }

    pub fn note(kind: u8, tick: u32, channel: u8, note: u8, velocity: u8) -> Self {
        let mut event = Self::new(kind, tick);
        event.data.note = SndSeqEvNote {
            channel,
            note,
            velocity,
            off_velocity: 0,
            duration: 0,
        };
        event
    }

    pub fn control(kind: u8, tick: u32, channel: u8, param: u32, value: i32) -> Self {
        let mut event = Self::new(kind, tick);
        event.data.control = SndSeqEvCtrl {
            channel,
            unused: [0; 3],
            param,
            value,
        };
        event
    }

    /// Variable-length payload event. `data` must outlive every use of the event.
    pub fn ext(kind: u8, tick: u32, data: &[u8]) -> Self {
        let mut event = Self::new(kind, tick);
        event.data.ext = SndSeqEvExt {
            len: data.len() as c_uint,
            ptr: data.as_ptr() as *mut c_void,
        };
        event
    }

    pub fn tick(&self) -> u32 {
        // SAFETY: both union members are plain integers; every bit pattern is valid.
        unsafe { self.time.tick }
    }

    pub fn note_data(&self) -> SndSeqEvNote {
        // SAFETY: POD union member, all bit patterns valid.
        unsafe { self.data.note }
    }

    pub fn control_data(&self) -> SndSeqEvCtrl {
        // SAFETY: POD union member, all bit patterns valid.
        unsafe { self.data.control }
    }

    /// `(len, ptr)` of a variable-length payload.
    pub fn ext_data(&self) -> (usize, *const u8) {
        // SAFETY: integer and raw pointer, all bit patterns valid; copied out of the
        // packed struct before use.
        let ext = unsafe { self.data.ext };
        let len = ext.len;
        let ptr = ext.ptr;
        (len as usize, ptr as *const u8)
    }
}

impl std::fmt::Debug for SndSeqEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SndSeqEvent")
            .field("kind", &self.kind)
            .field("tick", &self.tick())
            .field("raw", &unsafe { self.data.raw8 })
            .finish()
    }
}
