//! Telnet framing and TN3270E negotiation driven end-to-end through their
//! public APIs, independent of any transport.

use tn3270::telnet::negotiation::{Negotiator, NegotiationStage, Tn3270EDeviceType, Tn3270EFunction};
use tn3270::telnet::{encode_command, encode_subnegotiation, Framer, TelnetEvent, DO, WILL};

/// Scenario 1: TTYPE reply. `start()` proactively offers `WILL TTYPE` as
/// `FF FB 18`; when the host then sends `SB TTYPE SEND IAC SE`, the
/// negotiator answers with `SB TTYPE IS "IBM-3278-2" IAC SE`.
#[test]
fn ttype_reply_matches_the_host_handshake() {
    let mut neg = Negotiator::new(Tn3270EDeviceType::Model2, None, vec![]);
    let offer = neg.start();
    assert!(offer.windows(3).any(|w| w == [0xFF, 0xFB, 0x18]));

    let reply = neg
        .handle_event(&TelnetEvent::Subnegotiation { option: 24, data: vec![0x01] })
        .unwrap();
    assert_eq!(
        reply,
        vec![0xFF, 0xFA, 0x18, 0x00, 0x49, 0x42, 0x4D, 0x2D, 0x33, 0x32, 0x37, 0x38, 0x2D, 0x32, 0xFF, 0xF0]
    );
}

#[test]
fn full_handshake_reaches_complete_with_negotiated_functions() {
    let mut neg = Negotiator::new(
        Tn3270EDeviceType::Model2,
        Some("LUA001".to_string()),
        vec![Tn3270EFunction::Bind, Tn3270EFunction::ResponseMode],
    );
    let offer = neg.start();
    assert!(!offer.is_empty());

    let will_tn3270e = neg.handle_event(&TelnetEvent::Command { verb: WILL, option: 40 }).unwrap();
    assert!(!will_tn3270e.is_empty());
    assert_eq!(neg.stage(), NegotiationStage::DeviceTypePending);

    let mut device_is = vec![2, 4]; // DEVICE_TYPE, IS
    device_is.extend_from_slice(b"IBM-3278-2");
    let functions_request = neg
        .handle_event(&TelnetEvent::Subnegotiation { option: 40, data: device_is })
        .unwrap();
    assert!(!functions_request.is_empty());
    assert_eq!(neg.stage(), NegotiationStage::FunctionsPending);
    assert_eq!(neg.negotiated_device_type(), Some("IBM-3278-2"));

    let functions_is = vec![3, 4, 0, 2]; // FUNCTIONS, IS, Bind, ResponseMode
    neg.handle_event(&TelnetEvent::Subnegotiation { option: 40, data: functions_is }).unwrap();
    assert_eq!(neg.stage(), NegotiationStage::Complete);
    assert!(neg.is_complete());
    assert_eq!(neg.negotiated_functions().len(), 2);
}

#[test]
fn wire_bytes_round_trip_through_the_framer() {
    let mut framer = Framer::new();

    let will = encode_command(DO, 40);
    let events = framer.feed(&will).unwrap();
    assert_eq!(events, vec![TelnetEvent::Command { verb: DO, option: 40 }]);

    let sub = encode_subnegotiation(40, &[2, 4, 0xC8, 0xC9]);
    let events = framer.feed(&sub).unwrap();
    assert_eq!(
        events,
        vec![TelnetEvent::Subnegotiation { option: 40, data: vec![2, 4, 0xC8, 0xC9] }]
    );

    let record = Framer::frame_record(&[0xC8, 0xC9, 0xFF]);
    let events = framer.feed(&record).unwrap();
    assert_eq!(events, vec![TelnetEvent::Record(vec![0xC8, 0xC9, 0xFF])]);
}
