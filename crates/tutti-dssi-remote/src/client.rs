//! Blocking socket client for the plugin server.
//!
//! Each client owns a single-threaded tokio runtime and `block_on`s every exchange,
//! which turns the async transport into the synchronous calls the host's audio
//! callbacks need.

use crate::channel::{RemotePluginChannel, RemotePluginHost};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::protocol::{BridgeMessage, HostMessage, IpcMidiEvent};
use crate::record::PluginRecord;
use crate::transport::MessageTransport;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Channel to one plugin instance hosted by the server.
pub struct RemotePluginClient {
    runtime: Runtime,
    /// `None` once the connection has failed.
    transport: Option<MessageTransport>,
    name: String,
}

impl RemotePluginClient {
    /// Connect and ask the server to load `name`.
    pub fn open(config: &BridgeConfig, name: &str) -> Result<Self> {
        let mut client = Self::connect(config, name)?;

        match client.call(HostMessage::LoadPlugin {
            name: name.to_string(),
        })? {
            BridgeMessage::PluginLoaded => {
                tracing::info!("Remote plugin loaded: {}", name);
                Ok(client)
            }
            other => Err(unexpected(other)),
        }
    }

    /// One-shot catalog query on a fresh connection.
    pub fn query_plugins(config: &BridgeConfig) -> Result<Vec<PluginRecord>> {
        let mut client = Self::connect(config, "<catalog>")?;

        match client.call(HostMessage::QueryPlugins)? {
            BridgeMessage::PluginList { plugins } => {
                tracing::debug!("Catalog query returned {} plugins", plugins.len());
                Ok(plugins)
            }
            other => Err(unexpected(other)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    fn connect(config: &BridgeConfig, name: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let transport = runtime
            .block_on(async {
                tokio::time::timeout(timeout, MessageTransport::connect(&config.socket_path)).await
            })
            .map_err(|_| BridgeError::Timeout {
                operation: format!("connect to {}", config.socket_path.display()),
                duration_ms: config.connect_timeout_ms,
            })?
            .map_err(|e| {
                BridgeError::ConnectionFailed(format!(
                    "{}: {}",
                    config.socket_path.display(),
                    e
                ))
            })?;

        Ok(Self {
            runtime,
            transport: Some(transport),
            name: name.to_string(),
        })
    }

    /// Send `msg` and, if the server answers this kind of message, wait for the reply.
    fn exchange(&mut self, msg: HostMessage) -> Result<Option<BridgeMessage>> {
        let transport = self.transport.as_mut().ok_or(BridgeError::ChannelClosed)?;

        let result = self.runtime.block_on(async {
            transport.send_host_message(&msg).await?;
            if msg.expects_reply() {
                transport.recv_bridge_message().await.map(Some)
            } else {
                Ok(None)
            }
        });

        if let Err(e) = &result {
            if e.is_channel_closed() {
                tracing::warn!("Remote plugin channel for {} closed: {}", self.name, e);
                self.transport = None;
            }
        }

        result
    }

    fn call(&mut self, msg: HostMessage) -> Result<BridgeMessage> {
        match self.exchange(msg)? {
            Some(BridgeMessage::Error { message }) => Err(BridgeError::Remote(message)),
            Some(reply) => Ok(reply),
            None => Err(BridgeError::ProtocolError("missing reply".to_string())),
        }
    }

    fn post(&mut self, msg: HostMessage) -> Result<()> {
        self.exchange(msg).map(|_| ())
    }

    fn call_count(&mut self, msg: HostMessage) -> Result<usize> {
        match self.call(msg)? {
            BridgeMessage::Count { value } => Ok(value as usize),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(reply: BridgeMessage) -> BridgeError {
    BridgeError::ProtocolError(format!("Unexpected response: {:?}", reply))
}

impl RemotePluginChannel for RemotePluginClient {
    fn parameter_count(&mut self) -> Result<usize> {
        self.call_count(HostMessage::GetParameterCount)
    }

    fn input_count(&mut self) -> Result<usize> {
        self.call_count(HostMessage::GetInputCount)
    }

    fn output_count(&mut self) -> Result<usize> {
        self.call_count(HostMessage::GetOutputCount)
    }

    fn program_count(&mut self) -> Result<usize> {
        self.call_count(HostMessage::GetProgramCount)
    }

    fn program_name(&mut self, index: usize) -> Result<String> {
        match self.call(HostMessage::GetProgramName {
            index: index as u32,
        })? {
            BridgeMessage::ProgramName { name } => Ok(name),
            other => Err(unexpected(other)),
        }
    }

    fn set_sample_rate(&mut self, rate: u32) -> Result<()> {
        self.post(HostMessage::SetSampleRate { rate })
    }

    fn set_buffer_size(&mut self, frames: usize) -> Result<()> {
        self.post(HostMessage::SetBufferSize {
            frames: frames as u32,
        })
    }

    fn reset(&mut self) -> Result<()> {
        self.post(HostMessage::Reset)
    }

    fn get_parameter(&mut self, index: usize) -> Result<f32> {
        match self.call(HostMessage::GetParameter {
            index: index as u32,
        })? {
            BridgeMessage::ParameterValue { value } => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    fn set_parameter(&mut self, index: usize, value: f32) -> Result<()> {
        self.post(HostMessage::SetParameter {
            index: index as u32,
            value,
        })
    }

    fn set_current_program(&mut self, index: usize) -> Result<()> {
        self.post(HostMessage::SetCurrentProgram {
            index: index as u32,
        })
    }

    fn process(
        &mut self,
        num_samples: usize,
        inputs: &[Option<&[f32]>],
        outputs: &mut [Option<&mut [f32]>],
    ) -> Result<()> {
        let inputs = inputs
            .iter()
            .map(|channel| match channel {
                Some(data) => data[..num_samples.min(data.len())].to_vec(),
                None => vec![0.0; num_samples],
            })
            .collect();

        match self.call(HostMessage::ProcessAudio {
            num_samples: num_samples as u32,
            inputs,
        })? {
            BridgeMessage::AudioProcessed { outputs: rendered } => {
                for (output, source) in outputs.iter_mut().zip(&rendered) {
                    if let Some(output) = output {
                        let n = output.len().min(source.len());
                        output[..n].copy_from_slice(&source[..n]);
                    }
                }
                Ok(())
            }
            other => Err(unexpected(other)),
        }
    }

    fn send_midi(&mut self, data: &[u8], frame_offsets: &[i32], count: usize) -> Result<()> {
        self.post(HostMessage::SendMidi {
            events: IpcMidiEvent::batch(data, frame_offsets, count),
        })
    }

    fn terminate(&mut self) -> Result<()> {
        let reply = self.call(HostMessage::Terminate);
        self.transport = None;
        reply.map(|_| ())
    }
}

/// [`RemotePluginHost`] backed by a plugin server listening on a Unix socket.
///
/// Every [`open`](RemotePluginHost::open) gets its own connection.
#[derive(Debug, Clone, Default)]
pub struct SocketHost {
    config: BridgeConfig,
}

impl SocketHost {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

impl RemotePluginHost for SocketHost {
    fn query_plugins(&self) -> Result<Vec<PluginRecord>> {
        RemotePluginClient::query_plugins(&self.config)
    }

    fn open(&self, name: &str) -> Result<Box<dyn RemotePluginChannel>> {
        Ok(Box::new(RemotePluginClient::open(&self.config, name)?))
    }
}
