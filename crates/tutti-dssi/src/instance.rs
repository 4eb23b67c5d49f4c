//! One live DSSI plugin instance.
//!
//! A `DssiInstance` sits between the host's port buffers and a remote plugin channel.
//! It forwards sample-rate and block-size changes, pushes control port changes it
//! has not sent yet, ships audio through the channel and packs incoming sequencer
//! events for the remote side.
//!
//! The first time the channel reports itself closed, the instance is disabled for
//! good: the channel is dropped and every later call is a no-op. Errors the remote
//! side answers with (a rejected index, an unexpected reply) only abandon the call
//! they happened in.

use crate::descriptor::{name_from_label, PortLayout, PortSlot};
use crate::event_codec::EventCodec;
use crate::ffi::SndSeqEvent;
use smallvec::SmallVec;
use tutti_dssi_remote::{BridgeError, RemotePluginChannel, RemotePluginHost, Result};

type PortBuffers<'a> = SmallVec<[Option<&'a [f32]>; 16]>;
type PortBuffersMut<'a> = SmallVec<[Option<&'a mut [f32]>; 16]>;

/// A remote program slot. DSSI programs are always in bank 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDescriptor {
    pub bank: u32,
    pub program: u32,
    pub name: String,
}

pub struct DssiInstance {
    name: String,
    sample_rate: u32,
    /// `None` once the instance has failed.
    channel: Option<Box<dyn RemotePluginChannel>>,
    layout: PortLayout,

    control_ports: Vec<*mut f32>,
    /// Last value sent per control port; `None` until the first send.
    control_shadow: Vec<Option<f32>>,
    audio_ins: Vec<*mut f32>,
    audio_outs: Vec<*mut f32>,
    latency_out: *mut f32,
    /// Copies of the input buffers, so hosts that process in place never see
    /// an input aliasing an output.
    input_scratch: Vec<Vec<f32>>,
    /// Outputs are rendered here and copied out, so two output ports sharing one
    /// host buffer never become two live `&mut` slices.
    output_scratch: Vec<Vec<f32>>,

    programs: Vec<ProgramDescriptor>,
    last_sample_count: usize,
    codec: EventCodec,
}

// SAFETY: the raw port pointers are only dereferenced from the host's audio calls,
// which the host serializes per instance.
unsafe impl Send for DssiInstance {}

struct Opened {
    channel: Box<dyn RemotePluginChannel>,
    layout: PortLayout,
    programs: Vec<ProgramDescriptor>,
}

impl DssiInstance {
    /// Open the plugin named by `label` on `host`.
    ///
    /// Never fails outright; check [`is_ok`](Self::is_ok).
    pub fn new(host: &dyn RemotePluginHost, label: &str, sample_rate: u32) -> Self {
        let name = name_from_label(label);

        let mut instance = Self {
            name,
            sample_rate,
            channel: None,
            layout: PortLayout::default(),
            control_ports: Vec::new(),
            control_shadow: Vec::new(),
            audio_ins: Vec::new(),
            audio_outs: Vec::new(),
            latency_out: std::ptr::null_mut(),
            input_scratch: Vec::new(),
            output_scratch: Vec::new(),
            programs: Vec::new(),
            last_sample_count: 0,
            codec: EventCodec::new(),
        };

        match Self::open(host, &instance.name) {
            Ok(opened) => {
                let layout = opened.layout;
                tracing::info!(
                    "Instantiated {} at {} Hz ({} parameters, {} in, {} out, {} programs)",
                    instance.name,
                    sample_rate,
                    layout.parameters,
                    layout.inputs,
                    layout.outputs,
                    opened.programs.len()
                );

                instance.control_ports = vec![std::ptr::null_mut(); layout.parameters];
                instance.control_shadow = vec![None; layout.parameters];
                instance.audio_ins = vec![std::ptr::null_mut(); layout.inputs];
                instance.audio_outs = vec![std::ptr::null_mut(); layout.outputs];
                instance.input_scratch = vec![Vec::new(); layout.inputs];
                instance.output_scratch = vec![Vec::new(); layout.outputs];
                instance.layout = layout;
                instance.programs = opened.programs;
                instance.channel = Some(opened.channel);
            }
            Err(e) => {
                tracing::warn!("Failed to instantiate {}: {}", instance.name, e);
            }
        }

        instance
    }

    fn open(host: &dyn RemotePluginHost, name: &str) -> Result<Opened> {
        let mut channel = host.open(name)?;

        let parameters = channel.parameter_count()?;
        let inputs = channel.input_count()?;
        let outputs = channel.output_count()?;
        let program_count = channel.program_count()?;

        let programs = (0..program_count)
            .map(|index| {
                Ok(ProgramDescriptor {
                    bank: 0,
                    program: index as u32,
                    name: channel.program_name(index)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Opened {
            channel,
            layout: PortLayout::new(parameters, inputs, outputs),
            programs,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.channel.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> PortLayout {
        self.layout
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Disable the instance if `err` closed the channel; otherwise only log it.
    fn fail(&mut self, operation: &str, err: BridgeError) {
        if err.is_channel_closed() {
            tracing::warn!(
                "Remote plugin {} failed during {}: {}; disabling instance",
                self.name,
                operation,
                err
            );
            self.channel = None;
        } else {
            tracing::warn!("Remote plugin {} rejected {}: {}", self.name, operation, err);
        }
    }

    /// Run `f` against the channel, handing any error to [`fail`](Self::fail).
    fn with_channel<T>(
        &mut self,
        operation: &str,
        f: impl FnOnce(&mut dyn RemotePluginChannel) -> Result<T>,
    ) -> Option<T> {
        let channel = self.channel.as_deref_mut()?;
        match f(channel) {
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(operation, e);
                None
            }
        }
    }

    /// Attach a host buffer to a port. Out-of-range indices are ignored.
    ///
    /// # Safety
    ///
    /// `location` must be null or stay valid (for the block size passed to each
    /// `run`, or one value for control ports) until it is re-connected or the
    /// instance is dropped.
    pub unsafe fn connect_port(&mut self, port: usize, location: *mut f32) {
        if !self.is_ok() {
            return;
        }

        match self.layout.slot(port) {
            Some(PortSlot::Control(index)) => self.control_ports[index] = location,
            Some(PortSlot::AudioIn(index)) => self.audio_ins[index] = location,
            Some(PortSlot::AudioOut(index)) => self.audio_outs[index] = location,
            Some(PortSlot::Latency) => {
                self.latency_out = location;
                if !location.is_null() {
                    *location = 0.0;
                }
            }
            None => {}
        }
    }

    pub fn activate(&mut self) {
        let rate = self.sample_rate;
        self.with_channel("activate", |channel| channel.set_sample_rate(rate));
    }

    pub fn deactivate(&mut self) {
        self.with_channel("deactivate", |channel| channel.reset());
    }

    /// Switch program and pull the new parameter values into the control ports.
    pub fn select_program(&mut self, bank: usize, program: usize) {
        if !self.is_ok() || bank != 0 || program >= self.programs.len() {
            return;
        }

        if let Err(e) = self.load_program(program) {
            self.fail("select_program", e);
        }
    }

    fn load_program(&mut self, program: usize) -> Result<()> {
        let channel = self.channel.as_deref_mut().ok_or(BridgeError::ChannelClosed)?;
        channel.set_current_program(program)?;

        for (index, (&port, shadow)) in self
            .control_ports
            .iter()
            .zip(self.control_shadow.iter_mut())
            .enumerate()
        {
            if port.is_null() {
                continue;
            }
            let value = channel.get_parameter(index)?;
            // SAFETY: connect_port contract
            unsafe { *port = value };
            *shadow = Some(value);
        }

        Ok(())
    }

    /// Program slot `index`, with its own copy of the name.
    pub fn program(&self, index: usize) -> Option<ProgramDescriptor> {
        if !self.is_ok() {
            return None;
        }
        self.programs.get(index).cloned()
    }

    pub fn run(&mut self, sample_count: usize) {
        if !self.is_ok() {
            return;
        }
        if let Err(e) = self.process_block(sample_count) {
            self.fail("run", e);
        }
    }

    fn process_block(&mut self, sample_count: usize) -> Result<()> {
        let channel = self.channel.as_deref_mut().ok_or(BridgeError::ChannelClosed)?;

        if sample_count != self.last_sample_count {
            channel.set_buffer_size(sample_count)?;
            self.last_sample_count = sample_count;
            tracing::debug!("{}: block size now {}", self.name, sample_count);
            if !self.latency_out.is_null() {
                // SAFETY: connect_port contract
                unsafe { *self.latency_out = sample_count as f32 };
            }
        }

        for (index, (&port, shadow)) in self
            .control_ports
            .iter()
            .zip(self.control_shadow.iter_mut())
            .enumerate()
        {
            if port.is_null() {
                continue;
            }
            // SAFETY: connect_port contract
            let value = unsafe { *port };
            if *shadow != Some(value) {
                channel.set_parameter(index, value)?;
                *shadow = Some(value);
            }
        }

        for (&port, scratch) in self.audio_ins.iter().zip(self.input_scratch.iter_mut()) {
            scratch.clear();
            if !port.is_null() {
                // SAFETY: connect_port contract
                let input = unsafe { std::slice::from_raw_parts(port, sample_count) };
                scratch.extend_from_slice(input);
            }
        }

        let inputs: PortBuffers = self
            .audio_ins
            .iter()
            .zip(&self.input_scratch)
            .map(|(port, scratch)| (!port.is_null()).then_some(scratch.as_slice()))
            .collect();

        // Seed with the host's contents, so samples the remote leaves alone are kept
        for (&port, scratch) in self.audio_outs.iter().zip(self.output_scratch.iter_mut()) {
            scratch.clear();
            if !port.is_null() {
                // SAFETY: connect_port contract
                let output = unsafe { std::slice::from_raw_parts(port, sample_count) };
                scratch.extend_from_slice(output);
            }
        }

        let mut outputs: PortBuffersMut = self
            .audio_outs
            .iter()
            .zip(self.output_scratch.iter_mut())
            .map(|(port, scratch)| (!port.is_null()).then_some(scratch.as_mut_slice()))
            .collect();

        channel.process(sample_count, &inputs, &mut outputs)?;
        drop(outputs);

        for (&port, scratch) in self.audio_outs.iter().zip(&self.output_scratch) {
            if !port.is_null() {
                // SAFETY: connect_port contract; the scratch buffer is ours, so the
                // ranges never overlap
                unsafe { std::ptr::copy_nonoverlapping(scratch.as_ptr(), port, sample_count) };
            }
        }

        Ok(())
    }

    /// Send this block's events to the remote side, then [`run`](Self::run).
    pub fn run_synth(&mut self, sample_count: usize, events: &[SndSeqEvent]) {
        if self.is_ok() {
            self.codec.decode_block(events);
            if !self.codec.is_empty() {
                let result = match self.channel.as_deref_mut() {
                    Some(channel) => channel.send_midi(
                        self.codec.data(),
                        self.codec.frame_offsets(),
                        self.codec.event_count(),
                    ),
                    None => Ok(()),
                };
                if let Err(e) = result {
                    self.fail("run_synth", e);
                }
            }
        }

        self.run(sample_count);
    }
}

impl Drop for DssiInstance {
    fn drop(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.terminate() {
                tracing::debug!("Terminate for {} failed: {}", self.name, e);
            }
        }
    }
}
