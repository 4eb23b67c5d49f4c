//! Plugin descriptor synthesis from the remote catalog.

use tutti_dssi_remote::{PluginRecord, RemotePluginHost};

/// First unique id handed out; catalog position is added to it.
pub const UNIQUE_ID_BASE: u64 = 6666;

/// Stands in for spaces in labels, which must be a single token.
pub const LABEL_SPACE_PLACEHOLDER: char = '*';

pub const LATENCY_PORT_NAME: &str = "_latency";

const NAME_SUFFIX: &str = " VST";

/// Label for an identifying name. Reversed by [`name_from_label`].
pub fn label_from_name(name: &str) -> String {
    name.replace(' ', "*")
}

pub fn name_from_label(label: &str) -> String {
    label.replace(LABEL_SPACE_PLACEHOLDER, " ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Control,
    Audio,
}

/// Which end of a port's range the host should start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultHint {
    Minimum,
    Low,
    Middle,
    High,
    Maximum,
}

impl DefaultHint {
    /// Band a normalized default value.
    pub fn from_default(default: f32) -> Self {
        if default < 0.0001 {
            Self::Minimum
        } else if default > 0.999 {
            Self::Maximum
        } else if default < 0.35 {
            Self::Low
        } else if default > 0.65 {
            Self::High
        } else {
            Self::Middle
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeHint {
    pub lower: f32,
    pub upper: f32,
    pub default: DefaultHint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortInfo {
    pub direction: PortDirection,
    pub kind: PortKind,
    pub name: String,
    pub hint: Option<RangeHint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Effect,
    Instrument,
}

/// Port counts of one plugin.
///
/// Ports are laid out as `[parameters.., inputs.., outputs.., latency]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortLayout {
    pub parameters: usize,
    pub inputs: usize,
    pub outputs: usize,
}

/// What a flat port index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSlot {
    Control(usize),
    AudioIn(usize),
    AudioOut(usize),
    Latency,
}

impl PortLayout {
    pub fn new(parameters: usize, inputs: usize, outputs: usize) -> Self {
        Self {
            parameters,
            inputs,
            outputs,
        }
    }

    pub fn port_count(&self) -> usize {
        self.parameters + self.inputs + self.outputs + 1
    }

    pub fn slot(&self, index: usize) -> Option<PortSlot> {
        let mut index = index;
        if index < self.parameters {
            return Some(PortSlot::Control(index));
        }
        index -= self.parameters;
        if index < self.inputs {
            return Some(PortSlot::AudioIn(index));
        }
        index -= self.inputs;
        if index < self.outputs {
            return Some(PortSlot::AudioOut(index));
        }
        index -= self.outputs;
        (index == 0).then_some(PortSlot::Latency)
    }
}

/// Everything a DSSI host learns about one plugin before instantiating it.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDescriptor {
    pub unique_id: u64,
    pub label: String,
    pub name: String,
    pub maker: String,
    pub copyright: String,
    /// Identifying name the remote host loads the plugin by.
    pub dll_name: String,
    pub layout: PortLayout,
    pub ports: Vec<PortInfo>,
    pub kind: PluginKind,
}

impl PluginDescriptor {
    pub fn is_instrument(&self) -> bool {
        self.kind == PluginKind::Instrument
    }
}

pub struct DescriptorFactory;

impl DescriptorFactory {
    /// One descriptor per catalog entry, in catalog order. Empty if the catalog
    /// cannot be read.
    pub fn build_all(host: &dyn RemotePluginHost) -> Vec<PluginDescriptor> {
        match host.query_plugins() {
            Ok(records) => {
                tracing::info!("Remote catalog lists {} plugins", records.len());
                records
                    .iter()
                    .enumerate()
                    .map(|(position, record)| Self::synthesize(position, record))
                    .collect()
            }
            Err(e) => {
                tracing::error!("Error on plugin query: {}", e);
                Vec::new()
            }
        }
    }

    pub fn synthesize(position: usize, record: &PluginRecord) -> PluginDescriptor {
        let layout = PortLayout::new(record.parameters.len(), record.inputs, record.outputs);
        let mut ports = Vec::with_capacity(layout.port_count());

        for parameter in &record.parameters {
            ports.push(PortInfo {
                direction: PortDirection::Input,
                kind: PortKind::Control,
                name: parameter.name.clone(),
                hint: Some(RangeHint {
                    lower: 0.0,
                    upper: 1.0,
                    default: DefaultHint::from_default(parameter.default),
                }),
            });
        }

        for i in 0..record.inputs {
            ports.push(audio_port(PortDirection::Input, format!("in{}", i + 1)));
        }

        for i in 0..record.outputs {
            ports.push(audio_port(PortDirection::Output, format!("out{}", i + 1)));
        }

        ports.push(PortInfo {
            direction: PortDirection::Output,
            kind: PortKind::Control,
            name: LATENCY_PORT_NAME.to_string(),
            hint: None,
        });

        PluginDescriptor {
            unique_id: UNIQUE_ID_BASE + position as u64,
            label: label_from_name(&record.dll_name),
            name: format!("{}{}", record.plugin_name, NAME_SUFFIX),
            maker: record.vendor_name.clone(),
            copyright: record.vendor_name.clone(),
            dll_name: record.dll_name.clone(),
            layout,
            ports,
            kind: if record.is_synth {
                PluginKind::Instrument
            } else {
                PluginKind::Effect
            },
        }
    }
}

fn audio_port(direction: PortDirection, name: String) -> PortInfo {
    PortInfo {
        direction,
        kind: PortKind::Audio,
        name,
        hint: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutti_dssi_remote::{BridgeError, RemotePluginChannel, Result};

    struct Catalog(Result<Vec<PluginRecord>>);

    impl RemotePluginHost for Catalog {
        fn query_plugins(&self) -> Result<Vec<PluginRecord>> {
            match &self.0 {
                Ok(records) => Ok(records.clone()),
                Err(_) => Err(BridgeError::ConnectionFailed("no server".into())),
            }
        }

        fn open(&self, _name: &str) -> Result<Box<dyn RemotePluginChannel>> {
            Err(BridgeError::ChannelClosed)
        }
    }

    #[test]
    fn test_default_banding() {
        assert_eq!(DefaultHint::from_default(0.0), DefaultHint::Minimum);
        assert_eq!(DefaultHint::from_default(0.00009), DefaultHint::Minimum);
        assert_eq!(DefaultHint::from_default(0.0001), DefaultHint::Low);
        assert_eq!(DefaultHint::from_default(0.2), DefaultHint::Low);
        assert_eq!(DefaultHint::from_default(0.35), DefaultHint::Middle);
        assert_eq!(DefaultHint::from_default(0.5), DefaultHint::Middle);
        assert_eq!(DefaultHint::from_default(0.65), DefaultHint::Middle);
        assert_eq!(DefaultHint::from_default(0.8), DefaultHint::High);
        assert_eq!(DefaultHint::from_default(0.999), DefaultHint::High);
        assert_eq!(DefaultHint::from_default(1.0), DefaultHint::Maximum);
    }

    #[test]
    fn test_label_round_trip() {
        assert_eq!(label_from_name("Hyper Saw 2"), "Hyper*Saw*2");
        assert_eq!(name_from_label("Hyper*Saw*2"), "Hyper Saw 2");
        assert_eq!(name_from_label(&label_from_name("Plain")), "Plain");
    }

    #[test]
    fn test_port_order_two_params_stereo_in_mono_out() {
        let record = PluginRecord::new("Crush", "Crush")
            .audio_io(2, 1)
            .parameter("Bits", 0.5)
            .parameter("Rate", 1.0);

        let descriptor = DescriptorFactory::synthesize(0, &record);
        let ports: Vec<_> = descriptor
            .ports
            .iter()
            .map(|p| (p.name.as_str(), p.kind, p.direction))
            .collect();
        assert_eq!(
            ports,
            [
                ("Bits", PortKind::Control, PortDirection::Input),
                ("Rate", PortKind::Control, PortDirection::Input),
                ("in1", PortKind::Audio, PortDirection::Input),
                ("in2", PortKind::Audio, PortDirection::Input),
                ("out1", PortKind::Audio, PortDirection::Output),
                (LATENCY_PORT_NAME, PortKind::Control, PortDirection::Output),
            ]
        );

        let slots: Vec<_> = (0..7).map(|i| descriptor.layout.slot(i)).collect();
        assert_eq!(
            slots,
            [
                Some(PortSlot::Control(0)),
                Some(PortSlot::Control(1)),
                Some(PortSlot::AudioIn(0)),
                Some(PortSlot::AudioIn(1)),
                Some(PortSlot::AudioOut(0)),
                Some(PortSlot::Latency),
                None,
            ]
        );
    }

    #[test]
    fn test_port_table() {
        let record = PluginRecord::new("Wide Delay", "WideDelay")
            .vendor("Acme")
            .audio_io(2, 2)
            .parameter("Time", 0.5);

        let descriptor = DescriptorFactory::synthesize(0, &record);
        assert_eq!(descriptor.ports.len(), 6);
        assert_eq!(descriptor.layout.port_count(), 6);

        let names: Vec<_> = descriptor.ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Time", "in1", "in2", "out1", "out2", LATENCY_PORT_NAME]);

        let time = &descriptor.ports[0];
        assert_eq!(time.kind, PortKind::Control);
        assert_eq!(time.direction, PortDirection::Input);
        assert_eq!(
            time.hint,
            Some(RangeHint {
                lower: 0.0,
                upper: 1.0,
                default: DefaultHint::Middle
            })
        );

        let latency = descriptor.ports.last().unwrap();
        assert_eq!(latency.kind, PortKind::Control);
        assert_eq!(latency.direction, PortDirection::Output);
        assert!(latency.hint.is_none());
        assert!(descriptor.ports[1..5].iter().all(|p| p.hint.is_none()));
    }

    #[test]
    fn test_identity_fields() {
        let record = PluginRecord::new("Wide Delay", "WideDelay").vendor("Acme");
        let descriptor = DescriptorFactory::synthesize(3, &record);

        assert_eq!(descriptor.unique_id, 6669);
        assert_eq!(descriptor.label, "Wide*Delay");
        assert_eq!(descriptor.name, "WideDelay VST");
        assert_eq!(descriptor.maker, "Acme");
        assert_eq!(descriptor.copyright, "Acme");
        assert_eq!(descriptor.dll_name, "Wide Delay");
        assert_eq!(descriptor.kind, PluginKind::Effect);

        let synth = DescriptorFactory::synthesize(0, &record.clone().synth(true));
        assert!(synth.is_instrument());
    }

    #[test]
    fn test_layout_slots() {
        let layout = PortLayout::new(2, 1, 2);
        assert_eq!(layout.slot(0), Some(PortSlot::Control(0)));
        assert_eq!(layout.slot(1), Some(PortSlot::Control(1)));
        assert_eq!(layout.slot(2), Some(PortSlot::AudioIn(0)));
        assert_eq!(layout.slot(3), Some(PortSlot::AudioOut(0)));
        assert_eq!(layout.slot(4), Some(PortSlot::AudioOut(1)));
        assert_eq!(layout.slot(5), Some(PortSlot::Latency));
        assert_eq!(layout.slot(6), None);
    }

    #[test]
    fn test_build_all_in_catalog_order() {
        let host = Catalog(Ok(vec![
            PluginRecord::new("A", "A"),
            PluginRecord::new("B", "B"),
            PluginRecord::new("C", "C"),
        ]));

        let descriptors = DescriptorFactory::build_all(&host);
        let ids: Vec<_> = descriptors.iter().map(|d| d.unique_id).collect();
        assert_eq!(ids, [6666, 6667, 6668]);
        assert_eq!(descriptors[2].label, "C");
    }

    #[test]
    fn test_build_all_query_failure_is_empty() {
        let host = Catalog(Err(BridgeError::ChannelClosed));
        assert!(DescriptorFactory::build_all(&host).is_empty());
    }
}
