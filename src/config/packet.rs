use super::{
    ConfigError, Result, TestSetup, ADC_FULL_SCALE, ANALOG_CHANNEL_COUNT, DISCRETE_CHANNEL_COUNT,
};

/// Size of the one-shot configuration packet: one mode byte per
/// discrete channel, a mode byte plus two 16-bit thresholds per analog
/// channel, then the 32-bit gate microseconds.
pub const CONFIG_PACKET_LEN: usize = DISCRETE_CHANNEL_COUNT + ANALOG_CHANNEL_COUNT * 5 + 4;

// The device consumes exactly this many bytes, no framing around them
const _: () = assert!(CONFIG_PACKET_LEN == 32);

/// Build the configuration packet written once at test start.
///
/// Field order is fixed: discrete mode codes for channels 1..8, then
/// per analog channel its mode code, little-endian low threshold and
/// little-endian high threshold, then the little-endian gate value in
/// microseconds. Validation runs before any byte is produced, so a
/// malformed setup never yields a partial packet.
pub fn encode_config_packet(setup: &TestSetup) -> Result<[u8; CONFIG_PACKET_LEN]> {
    validate(setup)?;

    let mut packet = [0u8; CONFIG_PACKET_LEN];
    let mut at = 0;

    for discrete in &setup.discrete {
        packet[at] = discrete.mode.code();
        at += 1;
    }

    for analog in &setup.analog {
        packet[at] = analog.mode.code();
        at += 1;
        packet[at..at + 2].copy_from_slice(&analog.low_threshold.to_le_bytes());
        at += 2;
        packet[at..at + 2].copy_from_slice(&analog.high_threshold.to_le_bytes());
        at += 2;
    }

    packet[at..at + 4].copy_from_slice(&setup.gate.micros().to_le_bytes());
    at += 4;

    debug_assert_eq!(at, CONFIG_PACKET_LEN);
    Ok(packet)
}

fn validate(setup: &TestSetup) -> Result<()> {
    for (i, discrete) in setup.discrete.iter().enumerate() {
        let expected = i as u8 + 1;
        if discrete.channel != expected {
            return Err(ConfigError::ChannelOutOfOrder {
                expected,
                found: discrete.channel,
            });
        }
    }

    for (i, analog) in setup.analog.iter().enumerate() {
        let expected = i as u8 + 1;
        if analog.channel != expected {
            return Err(ConfigError::ChannelOutOfOrder {
                expected,
                found: analog.channel,
            });
        }
        for threshold in [analog.low_threshold, analog.high_threshold] {
            if threshold > ADC_FULL_SCALE {
                return Err(ConfigError::ThresholdOutOfRange {
                    channel: analog.channel,
                    value: threshold,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalogMode, DiscreteMode, GateThreshold};

    #[test]
    fn packet_is_exactly_32_bytes_for_default_setup() {
        let packet = encode_config_packet(&TestSetup::default()).unwrap();
        assert_eq!(packet.len(), CONFIG_PACKET_LEN);
        // All-off discrete block
        assert_eq!(&packet[0..8], &[0u8; 8]);
        // Off analog channels still carry their wide-open window
        for ch in 0..ANALOG_CHANNEL_COUNT {
            let base = 8 + ch * 5;
            assert_eq!(packet[base], 0);
            assert_eq!(&packet[base + 1..base + 3], &0u16.to_le_bytes());
            assert_eq!(&packet[base + 3..base + 5], &ADC_FULL_SCALE.to_le_bytes());
        }
        // Default gate, 1000 us
        assert_eq!(&packet[28..32], &1000u32.to_le_bytes());
    }

    #[test]
    fn packet_layout_matches_field_order() {
        let mut setup = TestSetup::default();
        setup.discrete[0].mode = DiscreteMode::RisingEdge;
        setup.discrete[7].mode = DiscreteMode::FallingEdge;
        setup.analog[0].mode = AnalogMode::Current;
        setup.analog[0].low_threshold = 258;
        setup.analog[0].high_threshold = 1023;
        setup.analog[2].mode = AnalogMode::Voltage;
        setup.gate = GateThreshold::from_micros(1250);

        let packet = encode_config_packet(&setup).unwrap();

        assert_eq!(packet[0], 1);
        assert_eq!(packet[7], 2);
        assert_eq!(&packet[1..7], &[0u8; 6]);

        // Analog channel 1 at offset 8: mode, low LE, high LE
        assert_eq!(packet[8], 1);
        assert_eq!(&packet[9..11], &[0x02, 0x01]);
        assert_eq!(&packet[11..13], &[0xFF, 0x03]);

        // Analog channel 3 starts at 8 + 2 * 5
        assert_eq!(packet[18], 2);

        assert_eq!(&packet[28..32], &[0xE2, 0x04, 0x00, 0x00]);
    }

    #[test]
    fn rejects_threshold_above_full_scale() {
        let mut setup = TestSetup::default();
        setup.analog[1].high_threshold = ADC_FULL_SCALE + 1;

        let err = encode_config_packet(&setup).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ThresholdOutOfRange { channel: 2, value } if value == ADC_FULL_SCALE + 1
        ));
    }

    #[test]
    fn rejects_channels_out_of_order() {
        let mut setup = TestSetup::default();
        setup.discrete.swap(2, 3);

        let err = encode_config_packet(&setup).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ChannelOutOfOrder {
                expected: 3,
                found: 4
            }
        ));
    }
}
