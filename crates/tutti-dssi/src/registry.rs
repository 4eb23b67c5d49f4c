//! Process-wide descriptor registry.
//!
//! Built once from the remote catalog on the first `dssi_descriptor` call and kept
//! until the library is unloaded. Each entry's LADSPA `ImplementationData` points
//! back at the entry, which is how `instantiate` finds the host to open the plugin
//! on.

use crate::descriptor::{DescriptorFactory, PluginDescriptor};
use crate::ffi::DssiDescriptor;
use crate::instance::DssiInstance;
use crate::native::NativeDescriptor;
use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::{Arc, OnceLock};
use tutti_dssi_remote::{BridgeConfig, RemotePluginHost, SocketHost};

pub struct RegistryEntry {
    descriptor: PluginDescriptor,
    native: NativeDescriptor,
    host: Arc<dyn RemotePluginHost>,
}

impl RegistryEntry {
    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    pub fn native(&self) -> &NativeDescriptor {
        &self.native
    }

    pub fn instantiate(&self, label: &str, sample_rate: u32) -> DssiInstance {
        DssiInstance::new(self.host.as_ref(), label, sample_rate)
    }
}

pub struct DescriptorRegistry {
    /// Boxed so `ImplementationData` pointers stay put.
    entries: Vec<Box<RegistryEntry>>,
    by_id: HashMap<u64, usize>,
}

impl DescriptorRegistry {
    pub fn build(host: Arc<dyn RemotePluginHost>) -> Self {
        let descriptors = DescriptorFactory::build_all(host.as_ref());

        let mut entries = Vec::with_capacity(descriptors.len());
        let mut by_id = HashMap::with_capacity(descriptors.len());

        for (index, descriptor) in descriptors.into_iter().enumerate() {
            let native = NativeDescriptor::new(&descriptor);
            let mut entry = Box::new(RegistryEntry {
                descriptor,
                native,
                host: host.clone(),
            });

            let data = &*entry as *const RegistryEntry as *mut c_void;
            entry.native.set_implementation_data(data);

            tracing::debug!(
                "Registered {} as {} ({})",
                entry.descriptor.dll_name,
                entry.descriptor.unique_id,
                entry.descriptor.label
            );
            by_id.insert(entry.descriptor.unique_id, index);
            entries.push(entry);
        }

        Self { entries, by_id }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn descriptor(&self, index: usize) -> Option<&RegistryEntry> {
        self.entries.get(index).map(|entry| &**entry)
    }

    pub fn by_unique_id(&self, unique_id: u64) -> Option<&RegistryEntry> {
        self.by_id.get(&unique_id).map(|&index| &*self.entries[index])
    }

    /// C record for enumeration `index`, or null past the end.
    pub fn native_descriptor(&self, index: usize) -> *const DssiDescriptor {
        self.descriptor(index)
            .map_or(std::ptr::null(), |entry| entry.native.as_ptr())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter().map(|entry| &**entry)
    }
}

static GLOBAL: OnceLock<DescriptorRegistry> = OnceLock::new();

/// The process-wide registry, built against the socket host on first use.
pub fn global() -> &'static DescriptorRegistry {
    GLOBAL.get_or_init(|| {
        crate::logging::init();

        let config = BridgeConfig::from_env();
        tracing::info!(
            "Building DSSI descriptors from plugin server at {}",
            config.socket_path.display()
        );

        let registry = DescriptorRegistry::build(Arc::new(SocketHost::new(config)));
        tracing::info!("{} DSSI descriptors available", registry.len());
        registry
    })
}
