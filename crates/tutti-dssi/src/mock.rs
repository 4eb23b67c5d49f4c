//! In-memory remote host for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tutti_dssi_remote::{
    BridgeError, PluginRecord, RemotePluginChannel, RemotePluginHost, Result,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open(String),
    SetSampleRate(u32),
    SetBufferSize(usize),
    Reset,
    GetParameter(usize),
    SetParameter(usize, f32),
    SetCurrentProgram(usize),
    Process(usize),
    SendMidi {
        data: Vec<u8>,
        frame_offsets: Vec<i32>,
        count: usize,
    },
    Terminate,
}

/// Records every call. Once `dead` is set every call fails as a closed channel;
/// while `rejecting` is set every call gets a remote error reply instead.
#[derive(Clone)]
pub struct MockHost {
    pub records: Vec<PluginRecord>,
    pub programs: Vec<String>,
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub dead: Arc<AtomicBool>,
    pub rejecting: Arc<AtomicBool>,
}

impl MockHost {
    pub fn new(records: Vec<PluginRecord>) -> Self {
        Self {
            records,
            programs: vec!["Init".to_string(), "Bright".to_string()],
            calls: Arc::new(Mutex::new(Vec::new())),
            dead: Arc::new(AtomicBool::new(false)),
            rejecting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn kill(&self) {
        self.dead.store(true, Ordering::SeqCst);
    }

    pub fn reject(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }
}

impl RemotePluginHost for MockHost {
    fn query_plugins(&self) -> Result<Vec<PluginRecord>> {
        Ok(self.records.clone())
    }

    fn open(&self, name: &str) -> Result<Box<dyn RemotePluginChannel>> {
        let record = self
            .records
            .iter()
            .find(|r| r.dll_name == name)
            .ok_or_else(|| BridgeError::Remote(format!("unknown plugin {}", name)))?;
        self.calls.lock().unwrap().push(Call::Open(name.to_string()));

        Ok(Box::new(MockChannel {
            params: record.parameters.iter().map(|p| p.default).collect(),
            inputs: record.inputs,
            outputs: record.outputs,
            programs: self.programs.clone(),
            calls: self.calls.clone(),
            dead: self.dead.clone(),
            rejecting: self.rejecting.clone(),
        }))
    }
}

/// Outputs are filled with `input[0] + output index + 1` (input reads 0 when absent).
/// Program `k` sets every parameter to `(k + 1) / 10`. Panics if two output
/// slices handed to `process` share memory.
pub struct MockChannel {
    params: Vec<f32>,
    inputs: usize,
    outputs: usize,
    programs: Vec<String>,
    calls: Arc<Mutex<Vec<Call>>>,
    dead: Arc<AtomicBool>,
    rejecting: Arc<AtomicBool>,
}

impl MockChannel {
    fn check(&self) -> Result<()> {
        if self.dead.load(Ordering::SeqCst) {
            Err(BridgeError::ChannelClosed)
        } else if self.rejecting.load(Ordering::SeqCst) {
            Err(BridgeError::Remote("rejected".to_string()))
        } else {
            Ok(())
        }
    }

    fn record(&self, call: Call) -> Result<()> {
        self.check()?;
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl RemotePluginChannel for MockChannel {
    fn parameter_count(&mut self) -> Result<usize> {
        self.check()?;
        Ok(self.params.len())
    }

    fn input_count(&mut self) -> Result<usize> {
        self.check()?;
        Ok(self.inputs)
    }

    fn output_count(&mut self) -> Result<usize> {
        self.check()?;
        Ok(self.outputs)
    }

    fn program_count(&mut self) -> Result<usize> {
        self.check()?;
        Ok(self.programs.len())
    }

    fn program_name(&mut self, index: usize) -> Result<String> {
        self.check()?;
        Ok(self.programs[index].clone())
    }

    fn set_sample_rate(&mut self, rate: u32) -> Result<()> {
        self.record(Call::SetSampleRate(rate))
    }

    fn set_buffer_size(&mut self, frames: usize) -> Result<()> {
        self.record(Call::SetBufferSize(frames))
    }

    fn reset(&mut self) -> Result<()> {
        self.record(Call::Reset)
    }

    fn get_parameter(&mut self, index: usize) -> Result<f32> {
        self.record(Call::GetParameter(index))?;
        Ok(self.params[index])
    }

    fn set_parameter(&mut self, index: usize, value: f32) -> Result<()> {
        self.record(Call::SetParameter(index, value))?;
        self.params[index] = value;
        Ok(())
    }

    fn set_current_program(&mut self, index: usize) -> Result<()> {
        self.record(Call::SetCurrentProgram(index))?;
        let value = (index as f32 + 1.0) / 10.0;
        self.params.iter_mut().for_each(|p| *p = value);
        Ok(())
    }

    fn process(
        &mut self,
        num_samples: usize,
        inputs: &[Option<&[f32]>],
        outputs: &mut [Option<&mut [f32]>],
    ) -> Result<()> {
        self.record(Call::Process(num_samples))?;

        let starts: Vec<*const f32> = outputs
            .iter()
            .flatten()
            .filter(|o| !o.is_empty())
            .map(|o| o.as_ptr())
            .collect();
        for (i, a) in starts.iter().enumerate() {
            assert!(!starts[i + 1..].contains(a), "output buffers alias");
        }

        let first = inputs.first().copied().flatten();

        for (index, output) in outputs.iter_mut().enumerate() {
            if let Some(output) = output {
                for (frame, sample) in output.iter_mut().enumerate() {
                    let input = first.map_or(0.0, |i| i[frame]);
                    *sample = input + index as f32 + 1.0;
                }
            }
        }
        Ok(())
    }

    fn send_midi(&mut self, data: &[u8], frame_offsets: &[i32], count: usize) -> Result<()> {
        self.record(Call::SendMidi {
            data: data.to_vec(),
            frame_offsets: frame_offsets.to_vec(),
            count,
        })
    }

    fn terminate(&mut self) -> Result<()> {
        self.record(Call::Terminate)
    }
}
