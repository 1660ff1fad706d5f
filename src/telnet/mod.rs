//! Telnet byte-stream framing: IAC escaping and record (EOR) boundaries.

pub mod negotiation;
pub mod header;

use crate::error::{ParseError, ParseResult};

pub const IAC: u8 = 255;
pub const WILL: u8 = 251;
pub const WONT: u8 = 252;
pub const DO: u8 = 253;
pub const DONT: u8 = 254;
pub const SB: u8 = 250;
pub const SE: u8 = 240;
/// RFC 885 End-of-Record *option* number, used only in WILL/WONT/DO/DONT
/// negotiation. The teacher's `TelnetOption::EndOfRecord = 19` conflates
/// this with the TERMINAL-TYPE option number; the correct option number
/// is 25.
pub const EOR: u8 = 25;
/// The end-of-record *command* byte that follows IAC on the wire
/// (`IAC EOR` = `0xFF 0xEF`). Distinct from the option number above —
/// confusing the two means a real host's `IAC EOR` is never recognized.
pub const EOR_CMD: u8 = 0xEF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelnetOption {
    Binary = 0,
    Echo = 1,
    SuppressGoAhead = 3,
    EndOfRecord = 25,
    TerminalType = 24,
    NewEnvironment = 39,
    Tn3270E = 40,
}

impl TelnetOption {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Binary),
            1 => Some(Self::Echo),
            3 => Some(Self::SuppressGoAhead),
            25 => Some(Self::EndOfRecord),
            24 => Some(Self::TerminalType),
            39 => Some(Self::NewEnvironment),
            40 => Some(Self::Tn3270E),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// A single unit parsed out of a raw telnet byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelnetEvent {
    /// Application data accumulated up to (but not including) an IAC EOR.
    Record(Vec<u8>),
    Command { verb: u8, option: u8 },
    Subnegotiation { option: u8, data: Vec<u8> },
    /// A literal 0xFF in the data stream (IAC IAC).
    DataByte(u8),
}

/// Incrementally escapes/unescapes the telnet byte stream and reassembles
/// records delimited by IAC EOR, one feed-chunk at a time.
#[derive(Debug, Default)]
pub struct Framer {
    record: Vec<u8>,
    in_iac: bool,
    in_sb: bool,
    sb_option: u8,
    sb_data: Vec<u8>,
    pending_verb: Option<u8>,
}

impl Framer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes from the transport; returns every event produced.
    pub fn feed(&mut self, bytes: &[u8]) -> ParseResult<Vec<TelnetEvent>> {
        let mut events = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let byte = bytes[i];
            i += 1;

            if self.in_sb {
                if self.in_iac {
                    self.in_iac = false;
                    match byte {
                        IAC => self.sb_data.push(IAC),
                        SE => {
                            self.in_sb = false;
                            events.push(TelnetEvent::Subnegotiation {
                                option: self.sb_option,
                                data: std::mem::take(&mut self.sb_data),
                            });
                        }
                        other => {
                            return Err(ParseError::TruncatedOrder {
                                order: IAC,
                                expected: SE as usize,
                                got: other as usize,
                            });
                        }
                    }
                    continue;
                }
                if byte == IAC {
                    self.in_iac = true;
                    continue;
                }
                if self.sb_data.is_empty() && self.sb_option == 0 {
                    self.sb_option = byte;
                } else {
                    self.sb_data.push(byte);
                }
                continue;
            }

            if let Some(verb) = self.pending_verb {
                self.pending_verb = None;
                events.push(TelnetEvent::Command { verb, option: byte });
                continue;
            }

            if self.in_iac {
                self.in_iac = false;
                match byte {
                    IAC => {
                        self.record.push(IAC);
                    }
                    EOR_CMD => {
                        events.push(TelnetEvent::Record(std::mem::take(&mut self.record)));
                    }
                    WILL | WONT | DO | DONT => {
                        self.pending_verb = Some(byte);
                    }
                    SB => {
                        self.in_sb = true;
                        self.sb_option = 0;
                        self.sb_data.clear();
                    }
                    other => {
                        // Unrecognized two-byte command (e.g. NOP, GA); ignore.
                        log::debug!("ignoring telnet command byte 0x{other:02X} after IAC");
                    }
                }
                continue;
            }

            if byte == IAC {
                self.in_iac = true;
            } else {
                self.record.push(byte);
            }
        }
        Ok(events)
    }

    /// Escape `data` for the wire: doubles any literal 0xFF.
    pub fn escape(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        for &b in data {
            out.push(b);
            if b == IAC {
                out.push(IAC);
            }
        }
        out
    }

    /// Frame a complete outbound 3270 record: escaped data plus terminating
    /// IAC EOR.
    pub fn frame_record(data: &[u8]) -> Vec<u8> {
        let mut out = Self::escape(data);
        out.push(IAC);
        out.push(EOR_CMD);
        out
    }
}

pub fn encode_command(verb: u8, option: u8) -> [u8; 3] {
    [IAC, verb, option]
}

pub fn encode_subnegotiation(option: u8, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 5);
    out.push(IAC);
    out.push(SB);
    out.push(option);
    out.extend_from_slice(&Framer::escape(data));
    out.push(IAC);
    out.push(SE);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_data_buffers_until_eor() {
        let mut framer = Framer::new();
        let events = framer.feed(b"hello").unwrap();
        assert!(events.is_empty());
        let events = framer.feed(&[IAC, EOR_CMD]).unwrap();
        assert_eq!(events, vec![TelnetEvent::Record(b"hello".to_vec())]);
    }

    #[test]
    fn doubled_iac_decodes_to_single_data_byte() {
        let mut framer = Framer::new();
        let events = framer.feed(&[0x61, IAC, IAC, 0x62, IAC, EOR_CMD]).unwrap();
        assert_eq!(events, vec![TelnetEvent::Record(vec![0x61, IAC, 0x62])]);
    }

    #[test]
    fn will_wont_do_dont_produce_command_events() {
        let mut framer = Framer::new();
        let events = framer.feed(&[IAC, DO, 40]).unwrap();
        assert_eq!(events, vec![TelnetEvent::Command { verb: DO, option: 40 }]);
    }

    #[test]
    fn subnegotiation_round_trip() {
        let mut framer = Framer::new();
        let wire = encode_subnegotiation(40, &[1, 2, 3]);
        let events = framer.feed(&wire).unwrap();
        assert_eq!(
            events,
            vec![TelnetEvent::Subnegotiation { option: 40, data: vec![1, 2, 3] }]
        );
    }

    #[test]
    fn escape_doubles_iac_bytes() {
        assert_eq!(Framer::escape(&[1, IAC, 2]), vec![1, IAC, IAC, 2]);
    }

    #[test]
    fn frame_record_terminates_with_iac_eor() {
        let framed = Framer::frame_record(&[0x01, 0x02]);
        assert_eq!(framed, vec![0x01, 0x02, IAC, EOR_CMD]);
    }
}
