//! The remote plugin seam.
//!
//! The adapter only ever talks to a plugin through these two traits. The socket
//! implementation lives in [`crate::client`]; tests substitute their own.

use crate::error::Result;
use crate::record::PluginRecord;

/// Control channel to one out-of-process plugin instance.
///
/// Calls block until the remote side answers. Once a call has failed with a closed
/// channel, every later call fails the same way.
pub trait RemotePluginChannel: Send {
    fn parameter_count(&mut self) -> Result<usize>;

    fn input_count(&mut self) -> Result<usize>;

    fn output_count(&mut self) -> Result<usize>;

    fn program_count(&mut self) -> Result<usize>;

    fn program_name(&mut self, index: usize) -> Result<String>;

    fn set_sample_rate(&mut self, rate: u32) -> Result<()>;

    fn set_buffer_size(&mut self, frames: usize) -> Result<()>;

    /// Clear processing state (the deactivate path).
    fn reset(&mut self) -> Result<()>;

    /// Normalized 0..1.
    fn get_parameter(&mut self, index: usize) -> Result<f32>;

    /// Normalized 0..1.
    fn set_parameter(&mut self, index: usize, value: f32) -> Result<()>;

    fn set_current_program(&mut self, index: usize) -> Result<()>;

    /// Process one block. Unconnected ports are `None`: inputs read as silence,
    /// outputs are not written.
    fn process(
        &mut self,
        num_samples: usize,
        inputs: &[Option<&[f32]>],
        outputs: &mut [Option<&mut [f32]>],
    ) -> Result<()>;

    /// Send `count` events packed at a 3-byte stride in `data`, with their frame
    /// offsets in `frame_offsets`.
    fn send_midi(&mut self, data: &[u8], frame_offsets: &[i32], count: usize) -> Result<()>;

    /// Ask the remote instance to shut down.
    fn terminate(&mut self) -> Result<()>;
}

/// Factory side of the remote world: the plugin catalog and channel creation.
pub trait RemotePluginHost: Send + Sync {
    /// Every plugin the remote host can instantiate, in a stable enumeration order.
    fn query_plugins(&self) -> Result<Vec<PluginRecord>>;

    /// Load the plugin identified by `name` and return its channel.
    fn open(&self, name: &str) -> Result<Box<dyn RemotePluginChannel>>;
}
