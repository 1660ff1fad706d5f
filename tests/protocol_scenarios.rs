//! End-to-end scenarios spanning EBCDIC, addressing, and data-stream parsing.

use tn3270::datastream::codes::*;
use tn3270::datastream::{parse_message, DataStreamOp};
use tn3270::ebcdic;
use tn3270::screen::addressing::{encode_address, AddressMode};
use tn3270::screen::ScreenBuffer;

#[test]
fn hi_encodes_to_known_ebcdic_bytes() {
    assert_eq!(ebcdic::encode("HI"), vec![0xC8, 0xC9]);
    assert_eq!(ebcdic::decode(&[0xC8, 0xC9]), "HI");
}

#[test]
fn cursor_address_five_encodes_as_40_c5() {
    assert_eq!(encode_address(5, AddressMode::TwelveBit), (0x40, 0xC5));
}

#[test]
fn erase_write_establishes_protected_field_spanning_row() {
    // Address 80 correctly encodes to C1 50 under the canonical 6-bit
    // table (1*64+16); see DESIGN.md for why this differs from a literal
    // "40 50" reading of the illustrative address.
    let (hi, lo) = encode_address(80, AddressMode::TwelveBit);
    assert_eq!((hi, lo), (0xC1, 0x50));

    let mut data = vec![CMD_ERASE_WRITE, WCC_RESET];
    data.extend_from_slice(&[ORDER_SBA, 0x40, 0x40]); // address 0
    data.extend_from_slice(&[ORDER_SF, ATTR_PROTECTED]);
    data.extend_from_slice(&[ORDER_RA, hi, lo, 0x40]); // repeat space to address 80

    let parsed = parse_message(&data, AddressMode::TwelveBit).unwrap();
    assert_eq!(parsed.ops[0], DataStreamOp::SetBufferAddress(0));
    assert_eq!(parsed.ops[1], DataStreamOp::StartField(ATTR_PROTECTED));
    assert_eq!(parsed.ops[2], DataStreamOp::RepeatToAddress(80, 0x40));

    let mut screen = ScreenBuffer::new();
    for op in parsed.ops {
        match op {
            DataStreamOp::SetBufferAddress(addr) => screen.set_buffer_address(addr).unwrap(),
            DataStreamOp::StartField(attr) => {
                let addr = screen.cursor_address();
                screen.set_field_attribute(addr, attr).unwrap();
            }
            DataStreamOp::RepeatToAddress(addr, byte) => {
                screen.repeat_to_address(addr as usize, byte).unwrap();
            }
            _ => {}
        }
    }

    let field = screen.field_manager().find_field_at(0).unwrap();
    assert!(field.is_protected());
    for cell in screen.get_row(0) {
        assert_eq!(cell.char_data, 0x40);
    }
}

#[test]
fn read_modified_collects_only_dirty_fields() {
    let mut screen = ScreenBuffer::new();
    screen.set_field_attribute(0, ATTR_MDT).unwrap();
    screen.set_field_attribute(10, 0).unwrap();
    screen.field_manager_mut().calculate_field_lengths(screen.buffer_size()).unwrap();

    let modified = screen.get_modified_data();
    assert_eq!(modified.len(), 1);
    assert_eq!(modified[0].0, 0);
}
