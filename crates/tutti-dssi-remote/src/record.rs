//! Catalog records returned by the plugin server.
//!
//! One [`PluginRecord`] describes one plugin the server can instantiate. Records are
//! produced once per catalog query and never modified afterwards.

use serde::{Deserialize, Serialize};

/// A single plugin parameter as reported by the catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub name: String,
    /// Normalized 0..1.
    pub default: f32,
}

/// Catalog entry for one instantiable plugin.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Identifying name the server loads the plugin by (may contain spaces).
    pub dll_name: String,

    /// Human-readable name
    pub plugin_name: String,

    /// Vendor/author name
    pub vendor_name: String,

    /// Number of audio input channels
    pub inputs: usize,

    /// Number of audio output channels
    pub outputs: usize,

    /// Parameters in index order
    pub parameters: Vec<ParameterRecord>,

    /// Does this plugin take note input?
    #[serde(default)]
    pub is_synth: bool,
}

impl PluginRecord {
    pub fn new(dll_name: impl Into<String>, plugin_name: impl Into<String>) -> Self {
        Self {
            dll_name: dll_name.into(),
            plugin_name: plugin_name.into(),
            vendor_name: String::new(),
            inputs: 2,
            outputs: 2,
            parameters: Vec::new(),
            is_synth: false,
        }
    }

    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor_name = vendor.into();
        self
    }

    pub fn audio_io(mut self, inputs: usize, outputs: usize) -> Self {
        self.inputs = inputs;
        self.outputs = outputs;
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, default: f32) -> Self {
        self.parameters.push(ParameterRecord {
            name: name.into(),
            default,
        });
        self
    }

    pub fn synth(mut self, is_synth: bool) -> Self {
        self.is_synth = is_synth;
        self
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }
}
