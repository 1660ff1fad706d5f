//! Telnet option and TN3270E subnegotiation state machine.
//!
//! Grounded on the teacher's `src/telnet_negotiation.rs` WILL/WONT/DO/DONT
//! bookkeeping and its `TN3270EDeviceType`/`TN3270ESessionState` shape, but
//! narrowed to what a pure TN3270E client actually negotiates (TERMINAL-TYPE,
//! NEW-ENVIRON, TN3270E DEVICE-TYPE/FUNCTIONS) and rewritten where the
//! teacher's AS/400-specific NEW-ENVIRON handling doesn't apply: RFC 1572
//! variables are parsed generically by VAR/VALUE/ESC/USERVAR markers rather
//! than by hardcoding variable names like DEVNAME/KBDTYPE.

use super::{encode_command, encode_subnegotiation, TelnetEvent, TelnetOption, DO, WILL};
use crate::error::{NegotiationError, NegotiationResult};
use std::collections::HashMap;

/// TN3270E device types from RFC 2355 §5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tn3270EDeviceType {
    Model2,
    Model3,
    Model4,
    Model5,
    Model2Color,
    Model3Color,
    Model4Color,
    Model5Color,
}

impl Tn3270EDeviceType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Model2 => "IBM-3278-2",
            Self::Model3 => "IBM-3278-3",
            Self::Model4 => "IBM-3278-4",
            Self::Model5 => "IBM-3278-5",
            Self::Model2Color => "IBM-3279-2",
            Self::Model3Color => "IBM-3279-3",
            Self::Model4Color => "IBM-3279-4",
            Self::Model5Color => "IBM-3279-5",
        }
    }

    pub fn screen_size(self) -> (usize, usize) {
        match self {
            Self::Model2 | Self::Model2Color => (24, 80),
            Self::Model3 | Self::Model3Color => (32, 80),
            Self::Model4 | Self::Model4Color => (43, 80),
            Self::Model5 | Self::Model5Color => (27, 132),
        }
    }
}

/// TN3270E subnegotiation command bytes (RFC 2355 §4).
mod tn3270e_cmd {
    pub const CONNECT: u8 = 1;
    pub const DEVICE_TYPE: u8 = 2;
    pub const FUNCTIONS: u8 = 3;
    pub const IS: u8 = 4;
    pub const REASON: u8 = 5;
    pub const REJECT: u8 = 6;
    pub const REQUEST: u8 = 7;
}

/// TN3270E negotiable functions (RFC 2355 §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tn3270EFunction {
    Bind,
    DataStreamCtl,
    ResponseMode,
    Scs,
    Sysreq,
}

impl Tn3270EFunction {
    fn code(self) -> u8 {
        match self {
            Self::Bind => 0,
            Self::DataStreamCtl => 1,
            Self::ResponseMode => 2,
            Self::Scs => 3,
            Self::Sysreq => 4,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Bind),
            1 => Some(Self::DataStreamCtl),
            2 => Some(Self::ResponseMode),
            3 => Some(Self::Scs),
            4 => Some(Self::Sysreq),
            _ => None,
        }
    }
}

/// RFC 1572 NEW-ENVIRON markers.
mod env_marker {
    pub const VAR: u8 = 0;
    pub const VALUE: u8 = 1;
    pub const ESC: u8 = 2;
    pub const USERVAR: u8 = 3;
    pub const SEND: u8 = 1;
    pub const IS: u8 = 0;
}

/// Parse a NEW-ENVIRON IS/INFO payload into name/value pairs, honoring ESC
/// as a literal-marker escape rather than splitting on any VAR/USERVAR byte
/// that happens to appear inside a name or value.
pub fn parse_new_environ(data: &[u8]) -> HashMap<Vec<u8>, Vec<u8>> {
    let mut result = HashMap::new();
    if data.is_empty() {
        return result;
    }
    let body = &data[1..]; // skip the leading IS/SEND command byte

    let mut cur_name: Option<Vec<u8>> = None;
    let mut cur_value: Vec<u8> = Vec::new();
    let mut in_value = false;
    let mut i = 0;
    let mut escaped = false;

    let flush = |result: &mut HashMap<Vec<u8>, Vec<u8>>, name: &mut Option<Vec<u8>>, value: &mut Vec<u8>| {
        if let Some(n) = name.take() {
            result.insert(n, std::mem::take(value));
        }
    };

    while i < body.len() {
        let b = body[i];
        i += 1;
        if escaped {
            escaped = false;
            if in_value {
                cur_value.push(b);
            } else if let Some(n) = cur_name.as_mut() {
                n.push(b);
            }
            continue;
        }
        match b {
            env_marker::ESC => escaped = true,
            env_marker::VAR | env_marker::USERVAR => {
                flush(&mut result, &mut cur_name, &mut cur_value);
                cur_name = Some(Vec::new());
                in_value = false;
            }
            env_marker::VALUE => {
                in_value = true;
            }
            _ => {
                if in_value {
                    cur_value.push(b);
                } else if let Some(n) = cur_name.as_mut() {
                    n.push(b);
                }
            }
        }
    }
    flush(&mut result, &mut cur_name, &mut cur_value);
    result
}

/// Build a NEW-ENVIRON IS payload from name/value pairs, escaping any
/// marker byte that appears literally inside a name or value.
pub fn build_new_environ_is(vars: &[(Vec<u8>, Vec<u8>)]) -> Vec<u8> {
    fn push_escaped(out: &mut Vec<u8>, bytes: &[u8]) {
        for &b in bytes {
            if matches!(
                b,
                env_marker::VAR | env_marker::VALUE | env_marker::ESC | env_marker::USERVAR
            ) {
                out.push(env_marker::ESC);
            }
            out.push(b);
        }
    }

    let mut out = vec![env_marker::IS];
    for (name, value) in vars {
        out.push(env_marker::VAR);
        push_escaped(&mut out, name);
        out.push(env_marker::VALUE);
        push_escaped(&mut out, value);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStage {
    NotStarted,
    OptionsPending,
    DeviceTypePending,
    FunctionsPending,
    Complete,
    /// The host refused TN3270E (WONT/DONT); the session continues as
    /// basic TN3270 (binary + EOR, no TN3270E header) rather than failing.
    BasicTn3270,
    FellBackToNvt,
}

/// The negotiation outcome a session ends up running under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationMode {
    Tn3270E,
    BasicTn3270,
    Nvt,
}

/// A snapshot of what was actually negotiated, for callers (and tests) that
/// want the whole outcome rather than polling `Negotiator`'s individual
/// getters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedProfile {
    pub mode: NegotiationMode,
    pub device_type: Option<String>,
    pub functions: Vec<Tn3270EFunction>,
}

/// Bytes of inbound data inspected before the NVT heuristic commits to a
/// verdict (spec scenario 6): below this, the printable-ASCII-density check
/// is skipped.
const NVT_HEURISTIC_MIN_LEN: usize = 32;
const NVT_HEURISTIC_PRINTABLE_THRESHOLD: f64 = 0.7;

/// True when `data` looks like NVT/VT100 terminal traffic rather than a
/// 3270 data stream: either a VT100 ESC-CSI sequence, or a long run that is
/// overwhelmingly printable ASCII (3270 orders use high-bit/control bytes
/// densely enough that real 3270 data won't pass this).
pub fn looks_like_nvt_content(data: &[u8]) -> bool {
    if data.windows(2).any(|w| w[0] == 0x1B && w[1] == b'[') {
        return true;
    }
    if data.len() < NVT_HEURISTIC_MIN_LEN {
        return false;
    }
    let printable = data
        .iter()
        .filter(|&&b| (0x20..0x7F).contains(&b) || b == b'\r' || b == b'\n' || b == b'\t')
        .count();
    (printable as f64 / data.len() as f64) >= NVT_HEURISTIC_PRINTABLE_THRESHOLD
}

/// Drives telnet option and TN3270E subnegotiation to completion (or NVT
/// fallback) for a single connection.
pub struct Negotiator {
    stage: NegotiationStage,
    requested_device_type: String,
    lu_name: Option<String>,
    negotiated_device_type: Option<String>,
    requested_functions: Vec<Tn3270EFunction>,
    negotiated_functions: Vec<Tn3270EFunction>,
    options_active: HashMap<TelnetOption, bool>,
}

impl Negotiator {
    pub fn new(device_type: Tn3270EDeviceType, lu_name: Option<String>, functions: Vec<Tn3270EFunction>) -> Self {
        Negotiator {
            stage: NegotiationStage::NotStarted,
            requested_device_type: device_type.name().to_string(),
            lu_name,
            negotiated_device_type: None,
            requested_functions: functions,
            negotiated_functions: Vec::new(),
            options_active: HashMap::new(),
        }
    }

    pub fn stage(&self) -> NegotiationStage {
        self.stage
    }

    pub fn negotiated_device_type(&self) -> Option<&str> {
        self.negotiated_device_type.as_deref()
    }

    pub fn negotiated_functions(&self) -> &[Tn3270EFunction] {
        &self.negotiated_functions
    }

    /// Summarize what this negotiation actually settled on.
    pub fn profile(&self) -> NegotiatedProfile {
        let mode = match self.stage {
            NegotiationStage::FellBackToNvt => NegotiationMode::Nvt,
            NegotiationStage::BasicTn3270 => NegotiationMode::BasicTn3270,
            _ => NegotiationMode::Tn3270E,
        };
        NegotiatedProfile {
            mode,
            device_type: self.negotiated_device_type.clone(),
            functions: self.negotiated_functions.clone(),
        }
    }

    /// Inspect inbound data while running under basic TN3270 (post
    /// TN3270E-refusal) for the VT100/NVT content heuristic (spec scenario
    /// 6). Has no effect once TN3270E is active or NVT has already been
    /// detected. Returns true if this call just triggered the fallback.
    pub fn classify_content(&mut self, data: &[u8]) -> bool {
        if self.stage != NegotiationStage::BasicTn3270 {
            return false;
        }
        if looks_like_nvt_content(data) {
            self.stage = NegotiationStage::FellBackToNvt;
            return true;
        }
        false
    }

    /// Initial client-side offers: DO TN3270E, DO/WILL TERMINAL-TYPE and
    /// NEW-ENVIRON as the host requires them.
    pub fn start(&mut self) -> Vec<u8> {
        self.stage = NegotiationStage::OptionsPending;
        let mut out = Vec::new();
        out.extend_from_slice(&encode_command(DO, TelnetOption::Tn3270E.to_u8()));
        out.extend_from_slice(&encode_command(WILL, TelnetOption::TerminalType.to_u8()));
        out.extend_from_slice(&encode_command(WILL, TelnetOption::NewEnvironment.to_u8()));
        out.extend_from_slice(&encode_command(WILL, TelnetOption::EndOfRecord.to_u8()));
        out.extend_from_slice(&encode_command(WILL, TelnetOption::Binary.to_u8()));
        out
    }

    /// Feed one telnet event observed on the wire; returns bytes to send
    /// in response, if any.
    pub fn handle_event(&mut self, event: &TelnetEvent) -> NegotiationResult<Vec<u8>> {
        match event {
            TelnetEvent::Command { verb, option } => self.handle_command(*verb, *option),
            TelnetEvent::Subnegotiation { option, data } => {
                self.handle_subnegotiation(*option, data)
            }
            _ => Ok(Vec::new()),
        }
    }

    fn handle_command(&mut self, verb: u8, option: u8) -> NegotiationResult<Vec<u8>> {
        use super::{DONT, WONT};
        let Some(opt) = TelnetOption::from_u8(option) else {
            return Ok(Vec::new());
        };

        if verb == WONT || verb == DONT {
            if opt == TelnetOption::Tn3270E {
                // Non-fatal: continue as basic TN3270 (binary + EOR, no
                // TN3270E header) rather than failing the connection.
                self.stage = NegotiationStage::BasicTn3270;
                return Ok(Vec::new());
            }
            self.options_active.insert(opt, false);
            return Ok(Vec::new());
        }

        self.options_active.insert(opt, true);

        match opt {
            TelnetOption::TerminalType => {
                // Host will SEND; we answer from handle_subnegotiation. Echo
                // our side of the option so both ends agree it's active.
                Ok(Vec::new())
            }
            TelnetOption::Tn3270E => {
                self.stage = NegotiationStage::DeviceTypePending;
                let payload = self.build_device_type_request();
                Ok(encode_subnegotiation(TelnetOption::Tn3270E.to_u8(), &payload))
            }
            _ => Ok(Vec::new()),
        }
    }

    fn build_device_type_request(&self) -> Vec<u8> {
        let mut payload = vec![tn3270e_cmd::DEVICE_TYPE, tn3270e_cmd::REQUEST];
        payload.extend_from_slice(self.requested_device_type.as_bytes());
        if let Some(lu) = &self.lu_name {
            payload.push(tn3270e_cmd::CONNECT);
            payload.extend_from_slice(lu.as_bytes());
        }
        payload
    }

    fn handle_subnegotiation(&mut self, option: u8, data: &[u8]) -> NegotiationResult<Vec<u8>> {
        let Some(opt) = TelnetOption::from_u8(option) else {
            return Ok(Vec::new());
        };

        match opt {
            TelnetOption::TerminalType => self.handle_terminal_type(data),
            TelnetOption::NewEnvironment => Ok(self.handle_new_environ(data)),
            TelnetOption::Tn3270E => self.handle_tn3270e(data),
            _ => Ok(Vec::new()),
        }
    }

    fn handle_terminal_type(&mut self, data: &[u8]) -> NegotiationResult<Vec<u8>> {
        if data.first() == Some(&1) {
            // SEND: host wants our terminal type.
            let mut payload = vec![0u8]; // IS
            payload.extend_from_slice(self.requested_device_type.as_bytes());
            Ok(encode_subnegotiation(TelnetOption::TerminalType.to_u8(), &payload))
        } else {
            Ok(Vec::new())
        }
    }

    fn handle_new_environ(&mut self, data: &[u8]) -> Vec<u8> {
        if data.first() == Some(&env_marker::SEND) {
            let vars = vec![
                (b"USER".to_vec(), b"TN3270".to_vec()),
                (b"TERM".to_vec(), self.requested_device_type.clone().into_bytes()),
            ];
            let payload = build_new_environ_is(&vars);
            encode_subnegotiation(TelnetOption::NewEnvironment.to_u8(), &payload)
        } else {
            Vec::new()
        }
    }

    fn handle_tn3270e(&mut self, data: &[u8]) -> NegotiationResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        match data[0] {
            tn3270e_cmd::DEVICE_TYPE => self.handle_device_type_response(&data[1..]),
            tn3270e_cmd::FUNCTIONS => self.handle_functions_response(&data[1..]),
            _ => Ok(Vec::new()),
        }
    }

    fn handle_device_type_response(&mut self, data: &[u8]) -> NegotiationResult<Vec<u8>> {
        if data.first() == Some(&tn3270e_cmd::IS) {
            let rest = &data[1..];
            let end = rest
                .iter()
                .position(|&b| b == tn3270e_cmd::CONNECT)
                .unwrap_or(rest.len());
            let device_type = String::from_utf8_lossy(&rest[..end]).into_owned();
            self.negotiated_device_type = Some(device_type);
            self.stage = NegotiationStage::FunctionsPending;

            let mut payload = vec![tn3270e_cmd::FUNCTIONS, tn3270e_cmd::REQUEST];
            payload.extend(self.requested_functions.iter().map(|f| f.code()));
            Ok(encode_subnegotiation(TelnetOption::Tn3270E.to_u8(), &payload))
        } else if data.first() == Some(&tn3270e_cmd::REJECT) {
            Err(NegotiationError::DeviceTypeRejected {
                requested: self.requested_device_type.clone(),
            })
        } else {
            Ok(Vec::new())
        }
    }

    fn handle_functions_response(&mut self, data: &[u8]) -> NegotiationResult<Vec<u8>> {
        if data.first() == Some(&tn3270e_cmd::IS) {
            self.negotiated_functions = data[1..]
                .iter()
                .filter_map(|&b| Tn3270EFunction::from_code(b))
                .collect();
            self.stage = NegotiationStage::Complete;
        }
        Ok(Vec::new())
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self.stage,
            NegotiationStage::Complete | NegotiationStage::BasicTn3270 | NegotiationStage::FellBackToNvt
        )
    }
}
