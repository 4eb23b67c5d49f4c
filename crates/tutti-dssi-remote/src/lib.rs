//! Remote plugin channel for tutti-dssi
//!
//! The plugins wrapped by `tutti-dssi` run inside a separate plugin server process.
//! This crate is everything the adapter needs to reach them:
//!
//! - [`RemotePluginHost`] / [`RemotePluginChannel`]: the seam the adapter is written
//!   against
//! - [`SocketHost`] / [`RemotePluginClient`]: the implementation over a Unix socket
//! - [`protocol`] and [`transport`]: the wire format, including the server half
//!
//! Launching the server is not handled here; it is expected to be listening on
//! [`BridgeConfig::socket_path`] already.
//!
//! ## Usage
//!
//! ```ignore
//! use tutti_dssi_remote::{BridgeConfig, RemotePluginHost, SocketHost};
//!
//! let host = SocketHost::new(BridgeConfig::from_env());
//! for record in host.query_plugins()? {
//!     println!("{} ({} params)", record.plugin_name, record.parameter_count());
//! }
//! let mut channel = host.open("Hyper Saw")?;
//! channel.set_sample_rate(48000)?;
//! ```

pub mod error;
pub use error::{BridgeError, Result};

mod channel;
pub use channel::{RemotePluginChannel, RemotePluginHost};

mod client;
pub use client::{RemotePluginClient, SocketHost};

mod config;
pub use config::{BridgeConfig, CONNECT_TIMEOUT_ENV, SOCKET_ENV};

mod record;
pub use record::{ParameterRecord, PluginRecord};

#[doc(hidden)]
pub mod protocol;

pub use protocol::{IpcMidiEvent, IpcMidiEventVec, MIDI_EVENT_STRIDE};

#[doc(hidden)]
pub mod transport;
