//! C-side descriptor records.
//!
//! A [`NativeDescriptor`] owns every string and array its `DSSI_Descriptor` /
//! `LADSPA_Descriptor` point at. All of it is boxed or heap-backed, so the pointers
//! stay valid for as long as the `NativeDescriptor` lives, wherever it is moved.

use crate::descriptor::{DefaultHint, PluginDescriptor, PortDirection, PortKind};
use crate::entry;
use crate::ffi::*;
use std::ffi::{c_char, c_ulong, c_void, CString};

pub struct NativeDescriptor {
    dssi: Box<DssiDescriptor>,
    ladspa: Box<LadspaDescriptor>,
    _label: CString,
    _name: CString,
    _maker: CString,
    _copyright: CString,
    _port_names: Vec<CString>,
    _port_name_ptrs: Vec<*const c_char>,
    _port_descriptors: Vec<LadspaPortDescriptor>,
    _port_hints: Vec<LadspaPortRangeHint>,
}

// SAFETY: the records are never written after construction (apart from
// `set_implementation_data` through `&mut self`), and everything they point at is
// owned here.
unsafe impl Send for NativeDescriptor {}
unsafe impl Sync for NativeDescriptor {}

/// C string with any interior NULs removed.
pub(crate) fn c_string(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

impl DefaultHint {
    pub fn ladspa_bits(self) -> LadspaPortRangeHintDescriptor {
        match self {
            Self::Minimum => LADSPA_HINT_DEFAULT_MINIMUM,
            Self::Low => LADSPA_HINT_DEFAULT_LOW,
            Self::Middle => LADSPA_HINT_DEFAULT_MIDDLE,
            Self::High => LADSPA_HINT_DEFAULT_HIGH,
            Self::Maximum => LADSPA_HINT_DEFAULT_MAXIMUM,
        }
    }
}

impl NativeDescriptor {
    pub fn new(descriptor: &PluginDescriptor) -> Self {
        let label = c_string(&descriptor.label);
        let name = c_string(&descriptor.name);
        let maker = c_string(&descriptor.maker);
        let copyright = c_string(&descriptor.copyright);

        let port_names: Vec<CString> = descriptor.ports.iter().map(|p| c_string(&p.name)).collect();
        let port_name_ptrs: Vec<*const c_char> = port_names.iter().map(|n| n.as_ptr()).collect();

        let port_descriptors: Vec<LadspaPortDescriptor> = descriptor
            .ports
            .iter()
            .map(|port| {
                let direction = match port.direction {
                    PortDirection::Input => LADSPA_PORT_INPUT,
                    PortDirection::Output => LADSPA_PORT_OUTPUT,
                };
                let kind = match port.kind {
                    PortKind::Control => LADSPA_PORT_CONTROL,
                    PortKind::Audio => LADSPA_PORT_AUDIO,
                };
                direction | kind
            })
            .collect();

        let port_hints: Vec<LadspaPortRangeHint> = descriptor
            .ports
            .iter()
            .map(|port| match port.hint {
                Some(hint) => LadspaPortRangeHint {
                    hint_descriptor: LADSPA_HINT_BOUNDED_BELOW
                        | LADSPA_HINT_BOUNDED_ABOVE
                        | hint.default.ladspa_bits(),
                    lower_bound: hint.lower,
                    upper_bound: hint.upper,
                },
                None => LadspaPortRangeHint::default(),
            })
            .collect();

        let ladspa = Box::new(LadspaDescriptor {
            unique_id: descriptor.unique_id as c_ulong,
            label: label.as_ptr(),
            properties: 0,
            name: name.as_ptr(),
            maker: maker.as_ptr(),
            copyright: copyright.as_ptr(),
            port_count: port_descriptors.len() as c_ulong,
            port_descriptors: port_descriptors.as_ptr(),
            port_names: port_name_ptrs.as_ptr(),
            port_range_hints: port_hints.as_ptr(),
            implementation_data: std::ptr::null_mut(),
            instantiate: Some(entry::instantiate),
            connect_port: Some(entry::connect_port),
            activate: Some(entry::activate),
            run: Some(entry::run),
            run_adding: None,
            set_run_adding_gain: None,
            deactivate: Some(entry::deactivate),
            cleanup: Some(entry::cleanup),
        });

        let dssi = Box::new(DssiDescriptor {
            dssi_api_version: DSSI_API_VERSION,
            ladspa_plugin: &*ladspa,
            configure: None,
            get_program: Some(entry::get_program),
            select_program: Some(entry::select_program),
            get_midi_controller_for_port: None,
            run_synth: descriptor
                .is_instrument()
                .then_some(entry::run_synth as RunSynthFn),
            run_synth_adding: None,
            run_multiple_synths: None,
            run_multiple_synths_adding: None,
        });

        Self {
            dssi,
            ladspa,
            _label: label,
            _name: name,
            _maker: maker,
            _copyright: copyright,
            _port_names: port_names,
            _port_name_ptrs: port_name_ptrs,
            _port_descriptors: port_descriptors,
            _port_hints: port_hints,
        }
    }

    pub(crate) fn set_implementation_data(&mut self, data: *mut c_void) {
        self.ladspa.implementation_data = data;
    }

    pub fn dssi(&self) -> &DssiDescriptor {
        &self.dssi
    }

    pub fn ladspa(&self) -> &LadspaDescriptor {
        &self.ladspa
    }

    pub fn as_ptr(&self) -> *const DssiDescriptor {
        &*self.dssi
    }
}
