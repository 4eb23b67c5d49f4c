//! DSSI adapter for out-of-process plugins
//!
//! Presents every plugin a remote plugin server can host as a DSSI plugin, so any
//! DSSI host (or LADSPA host with DSSI support) can load them from one shared
//! library. Audio, control values and MIDI are forwarded per block over a
//! [`tutti_dssi_remote`] channel.
//!
//! ## Usage
//!
//! The loadable library only needs to export the entry points:
//!
//! ```ignore
//! tutti_dssi::export_dssi!();
//! ```
//!
//! The server location comes from `TUTTI_DSSI_SOCKET` (see
//! [`BridgeConfig::from_env`](tutti_dssi_remote::BridgeConfig::from_env)), and the
//! log level from [`logging::LOG_LEVEL_ENV`].

pub mod descriptor;
pub use descriptor::{
    DefaultHint, DescriptorFactory, PluginDescriptor, PluginKind, PortDirection, PortInfo,
    PortKind, PortLayout, PortSlot, RangeHint,
};

pub mod event_codec;
pub use event_codec::{DecodeError, EventCodec, MIDI_BUFFER_SIZE};

pub mod instance;
pub use instance::{DssiInstance, ProgramDescriptor};

pub mod registry;
pub use registry::{DescriptorRegistry, RegistryEntry};

mod native;
pub use native::NativeDescriptor;

pub mod entry;
pub mod ffi;
pub mod logging;

#[cfg(test)]
mod mock;

pub use tutti_dssi_remote::{
    BridgeConfig, BridgeError, PluginRecord, RemotePluginChannel, RemotePluginHost, SocketHost,
    CONNECT_TIMEOUT_ENV, SOCKET_ENV,
};
