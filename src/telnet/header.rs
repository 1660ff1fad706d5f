//! TN3270E 5-byte header (RFC 2355 §4).

use crate::error::{ParseError, ParseResult};

pub const DATA_TYPE_3270_DATA: u8 = 0x00;
pub const DATA_TYPE_SCS_DATA: u8 = 0x01;
pub const DATA_TYPE_RESPONSE: u8 = 0x02;
pub const DATA_TYPE_BIND_IMAGE: u8 = 0x03;
pub const DATA_TYPE_UNBIND: u8 = 0x04;
pub const DATA_TYPE_NVT_DATA: u8 = 0x05;
pub const DATA_TYPE_REQUEST: u8 = 0x06;
pub const DATA_TYPE_SSCP_LU_DATA: u8 = 0x07;
pub const DATA_TYPE_PRINT_EOJ: u8 = 0x08;

pub const RESPONSE_FLAG_NO_RESPONSE: u8 = 0x00;
pub const RESPONSE_FLAG_ERROR_RESPONSE: u8 = 0x01;
pub const RESPONSE_FLAG_ALWAYS_RESPONSE: u8 = 0x02;

pub const REQUEST_FLAG_NONE: u8 = 0x00;

/// Response-data status byte, carried as the first byte of a RESPONSE
/// record's body. A deliberate simplification of RFC 2355 §5.4's full
/// SNA-sense-code format: real negative responses carry a 4-byte sense
/// code identifying what went wrong, which this engine doesn't model.
pub const RESPONSE_POSITIVE: u8 = 0x00;
pub const RESPONSE_NEGATIVE: u8 = 0x01;

/// The 5-byte header prefixed to every TN3270E record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tn3270EHeader {
    pub data_type: u8,
    pub request_flag: u8,
    pub response_flag: u8,
    pub seq_number: u16,
}

impl Tn3270EHeader {
    pub fn new(data_type: u8, response_flag: u8, seq_number: u16) -> Self {
        Tn3270EHeader {
            data_type,
            request_flag: REQUEST_FLAG_NONE,
            response_flag,
            seq_number,
        }
    }

    pub fn encode(&self) -> [u8; 5] {
        let [hi, lo] = self.seq_number.to_be_bytes();
        [self.data_type, self.request_flag, self.response_flag, hi, lo]
    }

    pub fn decode(bytes: &[u8]) -> ParseResult<Self> {
        if bytes.len() < 5 {
            return Err(ParseError::TruncatedHeader { got: bytes.len() });
        }
        Ok(Tn3270EHeader {
            data_type: bytes[0],
            request_flag: bytes[1],
            response_flag: bytes[2],
            seq_number: u16::from_be_bytes([bytes[3], bytes[4]]),
        })
    }

    pub fn is_response_required(&self) -> bool {
        self.response_flag != RESPONSE_FLAG_NO_RESPONSE
    }
}

/// Build the 5-byte header plus status-byte body of the RESPONSE record
/// that satisfies a `response_flag` of ALWAYS_RESPONSE or ERROR_RESPONSE,
/// echoing the inbound record's sequence number.
pub fn build_response(seq_number: u16, positive: bool) -> Vec<u8> {
    let header = Tn3270EHeader::new(DATA_TYPE_RESPONSE, RESPONSE_FLAG_NO_RESPONSE, seq_number);
    let status = if positive { RESPONSE_POSITIVE } else { RESPONSE_NEGATIVE };
    let mut out = header.encode().to_vec();
    out.push(status);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_encode_decode() {
        let header = Tn3270EHeader::new(DATA_TYPE_3270_DATA, RESPONSE_FLAG_ALWAYS_RESPONSE, 42);
        let bytes = header.encode();
        let decoded = Tn3270EHeader::decode(&bytes).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn decode_rejects_short_input() {
        assert!(Tn3270EHeader::decode(&[0, 0, 0]).is_err());
    }

    #[test]
    fn sequence_number_is_big_endian() {
        let header = Tn3270EHeader::new(DATA_TYPE_3270_DATA, 0, 0x0102);
        assert_eq!(header.encode()[3..5], [0x01, 0x02]);
    }

    #[test]
    fn build_response_echoes_sequence_and_status() {
        let positive = build_response(7, true);
        assert_eq!(positive[0], DATA_TYPE_RESPONSE);
        assert_eq!(positive[3..5], [0x00, 0x07]);
        assert_eq!(positive[5], RESPONSE_POSITIVE);

        let negative = build_response(7, false);
        assert_eq!(negative[5], RESPONSE_NEGATIVE);
    }

    #[test]
    fn is_response_required_covers_always_and_error() {
        let always = Tn3270EHeader::new(DATA_TYPE_3270_DATA, RESPONSE_FLAG_ALWAYS_RESPONSE, 0);
        let error = Tn3270EHeader::new(DATA_TYPE_3270_DATA, RESPONSE_FLAG_ERROR_RESPONSE, 0);
        let none = Tn3270EHeader::new(DATA_TYPE_3270_DATA, RESPONSE_FLAG_NO_RESPONSE, 0);
        assert!(always.is_response_required());
        assert!(error.is_response_required());
        assert!(!none.is_response_required());
    }
}
