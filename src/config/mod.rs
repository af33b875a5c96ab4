pub mod gate;
pub mod packet;

pub use gate::GateThreshold;
pub use packet::{encode_config_packet, CONFIG_PACKET_LEN};

use serde::{Deserialize, Serialize};

// Channel counts fixed by the instrument firmware
pub const DISCRETE_CHANNEL_COUNT: usize = 8;
pub const ANALOG_CHANNEL_COUNT: usize = 4;

/// Full scale of the instrument's 10-bit ADC. Thresholds and reported
/// levels live in [0, ADC_FULL_SCALE].
pub const ADC_FULL_SCALE: u16 = 1023;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Threshold {value} out of range on analog channel {channel}")]
    ThresholdOutOfRange { channel: u8, value: u16 },

    #[error("Channel {found} out of order, expected {expected}")]
    ChannelOutOfOrder { expected: u8, found: u8 },

    #[error("Invalid threshold entry: {0:?}")]
    InvalidThresholdEntry(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Edge selection for a discrete (switch/contact) channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscreteMode {
    Off,
    RisingEdge,
    FallingEdge,
}

impl DiscreteMode {
    /// Wire code in the configuration packet.
    pub fn code(self) -> u8 {
        match self {
            DiscreteMode::Off => 0,
            DiscreteMode::RisingEdge => 1,
            DiscreteMode::FallingEdge => 2,
        }
    }
}

/// Input mode for an analog channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalogMode {
    Off,
    /// 0-20 mA current loop.
    Current,
    /// 0-10 V input.
    Voltage,
}

impl AnalogMode {
    /// Wire code in the configuration packet.
    pub fn code(self) -> u8 {
        match self {
            AnalogMode::Off => 0,
            AnalogMode::Current => 1,
            AnalogMode::Voltage => 2,
        }
    }

    /// Convert a raw ADC reading to engineering units for this mode.
    pub fn raw_to_units(self, raw: u16) -> Option<f64> {
        let full_scale = f64::from(ADC_FULL_SCALE);
        match self {
            AnalogMode::Off => None,
            AnalogMode::Current => Some(f64::from(raw) * 20.0 / full_scale),
            AnalogMode::Voltage => Some(f64::from(raw) * 10.0 / full_scale),
        }
    }

    pub fn unit_label(self) -> Option<&'static str> {
        match self {
            AnalogMode::Off => None,
            AnalogMode::Current => Some("mA"),
            AnalogMode::Voltage => Some("V"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscreteChannelConfig {
    pub channel: u8,
    pub mode: DiscreteMode,
}

impl DiscreteChannelConfig {
    pub fn off(channel: u8) -> Self {
        Self {
            channel,
            mode: DiscreteMode::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogChannelConfig {
    pub channel: u8,
    pub mode: AnalogMode,
    pub low_threshold: u16,
    pub high_threshold: u16,
}

impl AnalogChannelConfig {
    /// Disabled channel with the threshold window wide open.
    pub fn off(channel: u8) -> Self {
        Self {
            channel,
            mode: AnalogMode::Off,
            low_threshold: 0,
            high_threshold: ADC_FULL_SCALE,
        }
    }
}

/// Immutable bundle of channel and gate settings, read once at test
/// start to build the configuration packet. Channels must be ordered
/// ascending from 1; the encoder rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSetup {
    pub discrete: [DiscreteChannelConfig; DISCRETE_CHANNEL_COUNT],
    pub analog: [AnalogChannelConfig; ANALOG_CHANNEL_COUNT],
    pub gate: GateThreshold,
}

impl Default for TestSetup {
    fn default() -> Self {
        Self {
            discrete: std::array::from_fn(|i| DiscreteChannelConfig::off(i as u8 + 1)),
            analog: std::array::from_fn(|i| AnalogChannelConfig::off(i as u8 + 1)),
            gate: GateThreshold::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_setup_orders_channels_from_one() {
        let setup = TestSetup::default();
        for (i, d) in setup.discrete.iter().enumerate() {
            assert_eq!(d.channel, i as u8 + 1);
        }
        for (i, a) in setup.analog.iter().enumerate() {
            assert_eq!(a.channel, i as u8 + 1);
        }
    }

    #[test]
    fn current_mode_scales_to_twenty_milliamps() {
        let full = AnalogMode::Current.raw_to_units(ADC_FULL_SCALE).unwrap();
        assert!((full - 20.0).abs() < 1e-9);
        assert_eq!(AnalogMode::Current.raw_to_units(0), Some(0.0));
    }

    #[test]
    fn voltage_mode_scales_to_ten_volts() {
        let full = AnalogMode::Voltage.raw_to_units(ADC_FULL_SCALE).unwrap();
        assert!((full - 10.0).abs() < 1e-9);
        assert_eq!(AnalogMode::Voltage.unit_label(), Some("V"));
    }

    #[test]
    fn off_mode_has_no_units() {
        assert_eq!(AnalogMode::Off.raw_to_units(512), None);
        assert_eq!(AnalogMode::Off.unit_label(), None);
    }
}
