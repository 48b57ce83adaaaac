//! End-to-end codec properties: round-trips, checksum behavior, and the
//! mapping from corruption location to error kind.

use patchwire::protocol::checksum;
use patchwire::{
    EOX, Error, MACHINE_ID, MANUFACTURER_ID, MemoryDump, MessageType, ParamTag, ParameterSet, SOX,
    SysexMessage,
};

fn sample_params() -> ParameterSet {
    let mut params = ParameterSet::new();
    params.set(ParamTag::ProgramNumber, 3).unwrap();
    params.set(ParamTag::Osc1Semitone, 64).unwrap();
    params.set(ParamTag::Osc1Shape, 1).unwrap();
    params.set(ParamTag::FilterCutoff, 101).unwrap();
    params.set(ParamTag::FilterResonance, 45).unwrap();
    params.set(ParamTag::AmpAttack, 4).unwrap();
    params.set(ParamTag::AmpRelease, 88).unwrap();
    params.set(ParamTag::Lfo1Speed, 33).unwrap();
    params.set(ParamTag::BendRange, 12).unwrap();
    params.set(ParamTag::MidiChannel, 1).unwrap();
    params
}

fn sample_memory() -> MemoryDump {
    let mut memory = MemoryDump::new();
    memory.set_global(0, 0x32).unwrap();
    memory.set_global(7, 0x11).unwrap();
    for slot in 0..19 {
        let program = memory.program_mut(slot).unwrap();
        *program = sample_params();
        program.set(ParamTag::ProgramNumber, slot).unwrap();
    }
    memory
}

#[test]
fn round_trip_every_message_type() {
    let messages = [
        SysexMessage::program_dump(0x00, sample_params()),
        SysexMessage::program_bulk_dump(0x05, sample_params()),
        SysexMessage::all_dump(0x01, sample_memory()),
        SysexMessage::program_request(0x00),
        SysexMessage::program_bulk_request(0x00, 9).unwrap(),
        SysexMessage::all_request(0x7F),
    ];
    for message in messages {
        let encoded = message.encode().unwrap();
        let decoded = SysexMessage::decode(&encoded).unwrap();
        assert_eq!(decoded, message);
        // and a decoded message re-encodes byte-identical
        assert_eq!(decoded.encode().unwrap(), encoded);
    }
}

#[test]
fn checksum_invariant_every_window_byte() {
    let encoded = SysexMessage::program_dump(0x00, sample_params())
        .encode()
        .unwrap();
    let message_type = MessageType::ProgramDump { is_request: false };

    for index in message_type.checksum_start()..message_type.checksum_end() {
        let mut corrupted = encoded.clone();
        corrupted[index] = corrupted[index].wrapping_add(1) & 0x7F;
        if corrupted[index] == encoded[index] {
            continue;
        }
        assert!(
            !checksum::validate(&corrupted, message_type),
            "mutation at {index} passed validation"
        );
    }
}

#[test]
fn corruption_location_maps_to_error_kind() {
    let encoded = SysexMessage::program_dump(0x00, sample_params())
        .encode()
        .unwrap();

    // start marker -> malformed
    let mut frame = encoded.clone();
    frame[0] = 0x00;
    assert!(matches!(
        SysexMessage::decode(&frame),
        Err(Error::MalformedMessage { .. })
    ));

    // end marker -> malformed
    let mut frame = encoded.clone();
    let last = frame.len() - 1;
    frame[last] = 0x00;
    assert!(matches!(
        SysexMessage::decode(&frame),
        Err(Error::MalformedMessage { .. })
    ));

    // below the minimum classifiable length -> malformed
    assert!(matches!(
        SysexMessage::decode(&encoded[..5]),
        Err(Error::MalformedMessage { .. })
    ));

    // manufacturer byte -> wrong manufacturer
    let mut frame = encoded.clone();
    frame[1] = 0x43;
    assert!(matches!(
        SysexMessage::decode(&frame),
        Err(Error::WrongManufacturerId { found: 0x43, .. })
    ));

    // machine byte -> wrong machine
    let mut frame = encoded.clone();
    frame[2] = 0x0E;
    assert!(matches!(
        SysexMessage::decode(&frame),
        Err(Error::WrongMachineId { found: 0x0E, .. })
    ));

    // command byte to an unassigned value -> unknown command
    let mut frame = encoded.clone();
    frame[4] = 0x33;
    assert!(matches!(
        SysexMessage::decode(&frame),
        Err(Error::UnknownCommandByte { command: 0x33, .. })
    ));

    // well-formed frame without room for its checksum -> incomplete
    let truncated = [SOX, MANUFACTURER_ID, MACHINE_ID, 0x00, 0x00, EOX];
    assert!(matches!(
        SysexMessage::decode(&truncated),
        Err(Error::IncompleteMessage { .. })
    ));

    // checksum byte -> invalid checksum
    let mut frame = encoded.clone();
    frame[35] ^= 0x01;
    assert!(matches!(
        SysexMessage::decode(&frame),
        Err(Error::InvalidChecksum { .. })
    ));

    // the untouched original still decodes
    assert!(SysexMessage::decode(&encoded).is_ok());
}

#[test]
fn classification_error_carries_offending_frame() {
    let mut frame = SysexMessage::program_dump(0x00, sample_params())
        .encode()
        .unwrap();
    frame[2] = 0x7B;
    let err = SysexMessage::decode(&frame).unwrap_err();
    assert_eq!(err.buffer().unwrap().as_ref(), frame.as_slice());
}

#[test]
fn scenario_program_dump_response_then_request() {
    // F0 3E 04 <device> 00 <30 payload bytes> <checksum> F7
    let encoded = SysexMessage::program_dump(0x00, sample_params())
        .encode()
        .unwrap();
    assert_eq!(encoded[0], SOX);
    assert_eq!(encoded[1], 0x3E);
    assert_eq!(encoded[2], 0x04);
    assert_eq!(encoded[4], 0x00);
    assert_eq!(*encoded.last().unwrap(), EOX);

    let decoded = SysexMessage::decode(&encoded).unwrap();
    assert_eq!(
        decoded.message_type(),
        MessageType::ProgramDump { is_request: false }
    );
    let SysexMessage::ProgramDump { params, .. } = &decoded else {
        panic!("expected program dump");
    };
    // a full 30-parameter set came out
    assert_eq!(params.iter().count(), 30);
    assert_eq!(params.get(ParamTag::FilterCutoff), 101);

    // the same frame with the command byte flipped to 0x40 is a request
    let mut request = encoded.clone();
    request[4] = 0x40;
    request[35] = checksum::compute(&request, 4, 34);
    let decoded = SysexMessage::decode(&request).unwrap();
    assert!(decoded.is_request());
    assert_eq!(
        decoded.message_type(),
        MessageType::ProgramDump { is_request: true }
    );
}

#[test]
fn bulk_dump_and_all_dump_share_nothing_but_the_header() {
    let bulk = SysexMessage::program_bulk_dump(0x00, sample_params())
        .encode()
        .unwrap();
    let all = SysexMessage::all_dump(0x00, sample_memory()).encode().unwrap();

    assert_eq!(bulk.len(), 37);
    assert_eq!(all.len(), 593);
    assert_eq!(bulk[4], 0x01);
    assert_eq!(all[4], 0x08);
    assert_eq!(&bulk[..4], &all[..4]);
}

#[test]
fn all_dump_preserves_every_slot() {
    let memory = sample_memory();
    let encoded = SysexMessage::all_dump(0x00, memory.clone()).encode().unwrap();
    let decoded = SysexMessage::decode(&encoded).unwrap();
    let SysexMessage::AllDump {
        memory: decoded_memory,
        ..
    } = decoded
    else {
        panic!("expected all dump");
    };
    assert_eq!(*decoded_memory, memory);
    for slot in 0..19u8 {
        assert_eq!(
            decoded_memory.program(slot).unwrap().program_number(),
            slot
        );
    }
    assert!(decoded_memory.program(19).is_none());
}
