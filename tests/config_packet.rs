use shockvibe_core::config::{
    encode_config_packet, AnalogMode, ConfigError, DiscreteMode, GateThreshold, TestSetup,
    CONFIG_PACKET_LEN,
};

#[test]
fn encodes_a_representative_test_setup() {
    let mut setup = TestSetup::default();
    setup.discrete[0].mode = DiscreteMode::RisingEdge;
    setup.discrete[1].mode = DiscreteMode::FallingEdge;
    setup.analog[0].mode = AnalogMode::Current;
    setup.analog[0].low_threshold = 100;
    setup.analog[0].high_threshold = 900;
    setup.analog[3].mode = AnalogMode::Voltage;
    setup.analog[3].low_threshold = 0;
    setup.analog[3].high_threshold = 512;
    setup.gate = GateThreshold::from_micros(2500);

    let packet = encode_config_packet(&setup).unwrap();
    assert_eq!(packet.len(), CONFIG_PACKET_LEN);

    let mut expected = Vec::with_capacity(CONFIG_PACKET_LEN);
    // Discrete block: one mode code per channel
    expected.extend_from_slice(&[1, 2, 0, 0, 0, 0, 0, 0]);
    // Analog channel 1: current mode with a 100..900 window
    expected.push(1);
    expected.extend_from_slice(&100u16.to_le_bytes());
    expected.extend_from_slice(&900u16.to_le_bytes());
    // Analog channels 2 and 3: off, window wide open
    for _ in 0..2 {
        expected.push(0);
        expected.extend_from_slice(&0u16.to_le_bytes());
        expected.extend_from_slice(&1023u16.to_le_bytes());
    }
    // Analog channel 4: voltage mode, window 0..512
    expected.push(2);
    expected.extend_from_slice(&0u16.to_le_bytes());
    expected.extend_from_slice(&512u16.to_le_bytes());
    // Gate microseconds
    expected.extend_from_slice(&2500u32.to_le_bytes());

    assert_eq!(packet.as_slice(), expected.as_slice());
}

#[test]
fn gate_arithmetic_feeds_the_packet() {
    let mut setup = TestSetup::default();
    setup.gate = GateThreshold::from_micros(1000);
    setup.gate.increment();

    let packet = encode_config_packet(&setup).unwrap();
    assert_eq!(&packet[28..32], &1250u32.to_le_bytes());
}

#[test]
fn invalid_setups_are_rejected() {
    let mut setup = TestSetup::default();
    setup.analog[0].low_threshold = 2000;
    assert!(matches!(
        encode_config_packet(&setup),
        Err(ConfigError::ThresholdOutOfRange {
            channel: 1,
            value: 2000
        })
    ));

    let mut setup = TestSetup::default();
    setup.discrete[4].channel = 9;
    assert!(matches!(
        encode_config_packet(&setup),
        Err(ConfigError::ChannelOutOfOrder {
            expected: 5,
            found: 9
        })
    ));
}

#[test]
fn setup_roundtrips_through_json() {
    let mut setup = TestSetup::default();
    setup.analog[1].mode = AnalogMode::Current;
    setup.gate = GateThreshold::from_micros(750);

    let json = serde_json::to_string(&setup).unwrap();
    let back: TestSetup = serde_json::from_str(&json).unwrap();
    assert_eq!(back, setup);
}
