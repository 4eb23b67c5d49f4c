//! `extern "C"` entry points behind the descriptor function slots.
//!
//! Every trampoline tolerates a null handle and catches panics, so no Rust unwind
//! ever reaches the host.

use crate::ffi::*;
use crate::instance::DssiInstance;
use crate::registry::{self, DescriptorRegistry, RegistryEntry};
use std::ffi::{c_ulong, CStr};

/// What a `LADSPA_Handle` points at.
pub struct InstanceHandle {
    instance: DssiInstance,
    /// One record per program; `get_program` hands out pointers into this.
    program_slots: Vec<DssiProgramDescriptor>,
}

impl InstanceHandle {
    pub fn instance(&self) -> &DssiInstance {
        &self.instance
    }
}

/// Catch panics and handle null pointers for a handle-taking trampoline.
macro_rules! with_instance {
    ($instance:expr, $default:expr, |$handle:ident| $body:expr) => {{
        let handle = $instance as *mut InstanceHandle;
        if handle.is_null() {
            return $default;
        }
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| unsafe {
            let $handle = &mut *handle;
            $body
        }))
        .unwrap_or($default)
    }};
}

/// Variant of `with_instance!` for functions that return `()`.
macro_rules! with_instance_void {
    ($instance:expr, |$handle:ident| $body:expr) => {{
        let handle = $instance as *mut InstanceHandle;
        if handle.is_null() {
            return;
        }
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| unsafe {
            let $handle = &mut *handle;
            $body
        }));
    }};
}

// =============================================================================
// Library entry points
// =============================================================================

/// Backs the exported `dssi_descriptor` symbol.
pub fn dssi_descriptor(index: usize) -> *const DssiDescriptor {
    std::panic::catch_unwind(|| registry::global().native_descriptor(index))
        .unwrap_or(std::ptr::null())
}

/// Export `ladspa_descriptor` and `dssi_descriptor` from the crate this is
/// invoked in.
///
/// Plain LADSPA hosts get nothing: the plugins need DSSI's program and event
/// support.
#[macro_export]
macro_rules! export_dssi {
    () => {
        #[no_mangle]
        pub extern "C" fn ladspa_descriptor(
            _index: std::ffi::c_ulong,
        ) -> *const $crate::ffi::LadspaDescriptor {
            std::ptr::null()
        }

        #[no_mangle]
        pub extern "C" fn dssi_descriptor(
            index: std::ffi::c_ulong,
        ) -> *const $crate::ffi::DssiDescriptor {
            $crate::entry::dssi_descriptor(index as usize)
        }
    };
}

// =============================================================================
// LADSPA slots
// =============================================================================

/// The registry entry behind `descriptor`.
///
/// Normally found through `ImplementationData`. A host that hands back a copy of the
/// record without it is resolved by unique id instead.
unsafe fn resolve_entry<'a>(
    descriptor: &LadspaDescriptor,
    registry: impl FnOnce() -> &'a DescriptorRegistry,
) -> Option<&'a RegistryEntry> {
    match (descriptor.implementation_data as *const RegistryEntry).as_ref() {
        Some(entry) => Some(entry),
        None => registry().by_unique_id(descriptor.unique_id as u64),
    }
}

pub(crate) unsafe extern "C" fn instantiate(
    descriptor: *const LadspaDescriptor,
    sample_rate: c_ulong,
) -> LadspaHandle {
    if descriptor.is_null() {
        return std::ptr::null_mut();
    }

    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let descriptor = &*descriptor;
        let Some(entry) = resolve_entry(descriptor, registry::global) else {
            return std::ptr::null_mut();
        };

        let label = if descriptor.label.is_null() {
            entry.descriptor().label.clone()
        } else {
            CStr::from_ptr(descriptor.label).to_string_lossy().into_owned()
        };

        let instance = entry.instantiate(&label, sample_rate as u32);
        if !instance.is_ok() {
            return std::ptr::null_mut();
        }

        let program_slots = (0..instance.program_count())
            .map(|_| DssiProgramDescriptor::default())
            .collect();

        Box::into_raw(Box::new(InstanceHandle {
            instance,
            program_slots,
        })) as LadspaHandle
    }))
    .unwrap_or(std::ptr::null_mut())
}

pub(crate) unsafe extern "C" fn connect_port(
    instance: LadspaHandle,
    port: c_ulong,
    location: *mut LadspaData,
) {
    with_instance_void!(instance, |h| h.instance.connect_port(port as usize, location))
}

pub(crate) unsafe extern "C" fn activate(instance: LadspaHandle) {
    with_instance_void!(instance, |h| h.instance.activate())
}

pub(crate) unsafe extern "C" fn run(instance: LadspaHandle, sample_count: c_ulong) {
    with_instance_void!(instance, |h| h.instance.run(sample_count as usize))
}

pub(crate) unsafe extern "C" fn deactivate(instance: LadspaHandle) {
    with_instance_void!(instance, |h| h.instance.deactivate())
}

pub(crate) unsafe extern "C" fn cleanup(instance: LadspaHandle) {
    let handle = instance as *mut InstanceHandle;
    if handle.is_null() {
        return;
    }
    let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        drop(Box::from_raw(handle));
    }));
}

// =============================================================================
// DSSI slots
// =============================================================================

/// Program `index`, with a freshly `strdup`ed name the host takes ownership of.
pub(crate) unsafe extern "C" fn get_program(
    instance: LadspaHandle,
    index: c_ulong,
) -> *const DssiProgramDescriptor {
    with_instance!(instance, std::ptr::null(), |h| {
        let index = index as usize;
        let Some(program) = h.instance.program(index) else {
            return std::ptr::null();
        };
        let Some(slot) = h.program_slots.get_mut(index) else {
            return std::ptr::null();
        };

        let name = crate::native::c_string(&program.name);
        let name = libc::strdup(name.as_ptr());
        if name.is_null() {
            return std::ptr::null();
        }

        *slot = DssiProgramDescriptor {
            bank: program.bank as c_ulong,
            program: program.program as c_ulong,
            name,
        };
        slot as *const DssiProgramDescriptor
    })
}

pub(crate) unsafe extern "C" fn select_program(
    instance: LadspaHandle,
    bank: c_ulong,
    program: c_ulong,
) {
    with_instance_void!(instance, |h| {
        h.instance.select_program(bank as usize, program as usize)
    })
}

pub(crate) unsafe extern "C" fn run_synth(
    instance: LadspaHandle,
    sample_count: c_ulong,
    events: *mut SndSeqEvent,
    event_count: c_ulong,
) {
    with_instance_void!(instance, |h| {
        let events = if events.is_null() || event_count == 0 {
            &[][..]
        } else {
            std::slice::from_raw_parts(events, event_count as usize)
        };
        h.instance.run_synth(sample_count as usize, events)
    })
}
