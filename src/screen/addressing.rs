//! 3270 buffer-address encoding.
//!
//! The wire format is not a raw bitfield split of the address: each 6-bit
//! half of a 12-bit address is translated through a fixed code table so
//! that address bytes fall in printable EBCDIC ranges (the same table
//! `x3270` and other 3270 emulators use). Mode selection (12-bit vs.
//! 14-bit) is a property of the buffer size being negotiated, not of the
//! bit pattern of an already-received address — see DESIGN.md.

/// 6-bit index → address byte, and its reverse, for 12-bit addressing.
const CODE_TABLE: [u8; 64] = [
    0x40, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7,
    0xC8, 0xC9, 0x4A, 0x4B, 0x4C, 0x4D, 0x4E, 0x4F,
    0x50, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7,
    0xD8, 0xD9, 0x5A, 0x5B, 0x5C, 0x5D, 0x5E, 0x5F,
    0x60, 0x61, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7,
    0xE8, 0xE9, 0x6A, 0x6B, 0x6C, 0x6D, 0x6E, 0x6F,
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7,
    0xF8, 0xF9, 0x7A, 0x7B, 0x7C, 0x7D, 0x7E, 0x7F,
];

fn code_table_encode(value: u8) -> u8 {
    CODE_TABLE[(value & 0x3F) as usize]
}

fn code_table_decode(byte: u8) -> u8 {
    match CODE_TABLE.iter().position(|&b| b == byte) {
        Some(idx) => idx as u8,
        // Any byte the table doesn't recognize decodes via its low 6 bits,
        // matching how real hosts emit out-of-table addresses defensively.
        None => byte & 0x3F,
    }
}

/// Addressing mode, selected by the negotiated buffer size (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Buffer of 4095 cells or fewer.
    TwelveBit,
    /// Larger buffers (e.g. Model 5's 3564... some extended partitions exceed 4095).
    FourteenBit,
}

impl AddressMode {
    pub fn for_buffer_size(cells: usize) -> Self {
        if cells <= 4095 {
            AddressMode::TwelveBit
        } else {
            AddressMode::FourteenBit
        }
    }
}

/// Encode a linear buffer address to its two-byte wire form.
pub fn encode_address(address: u16, mode: AddressMode) -> (u8, u8) {
    match mode {
        AddressMode::TwelveBit => {
            let high = ((address >> 6) & 0x3F) as u8;
            let low = (address & 0x3F) as u8;
            (code_table_encode(high), code_table_encode(low))
        }
        AddressMode::FourteenBit => {
            let high = ((address >> 8) & 0x3F) as u8;
            let low = (address & 0xFF) as u8;
            (high, low)
        }
    }
}

/// Decode a two-byte wire address. `mode` governs interpretation; per §6 the
/// top two bits of the first byte additionally hint at 14-bit encoding from
/// hosts that mix modes mid-session, so callers should prefer the mode from
/// the negotiated buffer size rather than re-deriving it per address.
pub fn decode_address(byte0: u8, byte1: u8, mode: AddressMode) -> u16 {
    match mode {
        AddressMode::TwelveBit => {
            let high = code_table_decode(byte0) as u16;
            let low = code_table_decode(byte1) as u16;
            (high << 6) | low
        }
        AddressMode::FourteenBit => {
            let high = ((byte0 & 0x3F) as u16) << 8;
            let low = byte1 as u16;
            high | low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_zero_encodes_to_40_40() {
        assert_eq!(encode_address(0, AddressMode::TwelveBit), (0x40, 0x40));
    }

    #[test]
    fn address_five_encodes_to_40_c5() {
        assert_eq!(encode_address(5, AddressMode::TwelveBit), (0x40, 0xC5));
    }

    #[test]
    fn round_trip_12bit_addresses() {
        for addr in [0u16, 1, 5, 63, 64, 80, 1919, 4095] {
            let (b0, b1) = encode_address(addr, AddressMode::TwelveBit);
            assert_eq!(decode_address(b0, b1, AddressMode::TwelveBit), addr, "addr={addr}");
        }
    }

    #[test]
    fn round_trip_14bit_addresses() {
        for addr in [0u16, 1, 4096, 8191, 16383] {
            let (b0, b1) = encode_address(addr, AddressMode::FourteenBit);
            assert_eq!(decode_address(b0, b1, AddressMode::FourteenBit), addr, "addr={addr}");
        }
    }

    #[test]
    fn mode_selection_follows_buffer_size() {
        assert_eq!(AddressMode::for_buffer_size(1920), AddressMode::TwelveBit);
        assert_eq!(AddressMode::for_buffer_size(4095), AddressMode::TwelveBit);
        assert_eq!(AddressMode::for_buffer_size(4096), AddressMode::FourteenBit);
    }
}
