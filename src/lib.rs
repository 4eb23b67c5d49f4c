//! # Tutti DSSI-VST
//!
//! Loadable DSSI plugin library. Every plugin the Tutti plugin server can host shows
//! up in a DSSI host as `<name> VST`, with its parameters as control ports, its audio
//! channels as audio ports and, for instruments, MIDI input through `run_synth`.
//!
//! ## Architecture
//!
//! - **tutti-dssi** - descriptors, per-instance adapter, MIDI packing, C entry points
//! - **tutti-dssi-remote** - channel to the out-of-process plugin server
//!
//! ## Setup
//!
//! Install the built `libtutti_dssi_vst.so` on the host's `DSSI_PATH` and start the
//! plugin server first:
//!
//! ```text
//! TUTTI_DSSI_SOCKET=/run/user/1000/tutti-dssi-vst.sock jack-dssi-host libtutti_dssi_vst.so
//! ```
//!
//! | Variable | Default |
//! |---|---|
//! | `TUTTI_DSSI_SOCKET` | `$TMPDIR/tutti-dssi-vst.sock` |
//! | `TUTTI_DSSI_CONNECT_TIMEOUT_MS` | `5000` |
//! | `TUTTI_DSSI_LOG` | `info` |

pub use tutti_dssi::*;

tutti_dssi::export_dssi!();
