//! Error taxonomy for the TN3270/TN3270E engine.
//!
//! One hand-rolled top-level enum wraps a leaf error per subsystem plus the
//! context every public error is required to carry: host/port, session
//! state, last TN3270E sequence number, and a bounded hex window of the
//! bytes being processed when the error occurred.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Context attached to every public error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub session_state: Option<String>,
    pub last_seq_number: Option<u16>,
    pub recent_bytes: Vec<u8>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host_port(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    pub fn with_session_state(mut self, state: impl Into<String>) -> Self {
        self.session_state = Some(state.into());
        self
    }

    pub fn with_seq(mut self, seq: u16) -> Self {
        self.last_seq_number = Some(seq);
        self
    }

    /// Stores at most the last 32 bytes of `bytes` as a hex window.
    pub fn with_recent_bytes(mut self, bytes: &[u8]) -> Self {
        let start = bytes.len().saturating_sub(32);
        self.recent_bytes = bytes[start..].to_vec();
        self
    }

    fn fmt_suffix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(host), Some(port)) = (&self.host, self.port) {
            write!(f, " [{host}:{port}]")?;
        }
        if let Some(state) = &self.session_state {
            write!(f, " state={state}")?;
        }
        if let Some(seq) = self.last_seq_number {
            write!(f, " seq={seq}")?;
        }
        if !self.recent_bytes.is_empty() {
            write!(f, " recent=")?;
            for b in &self.recent_bytes {
                write!(f, "{b:02X}")?;
            }
        }
        Ok(())
    }
}

/// Top-level error type for engine operations.
#[derive(Debug)]
pub enum Tn3270Error {
    Transport(TransportError, ErrorContext),
    Negotiation(NegotiationError, ErrorContext),
    Protocol(ProtocolError, ErrorContext),
    Parse(ParseError, ErrorContext),
    Timeout(TimeoutError, ErrorContext),
    IndFile(IndFileError, ErrorContext),
    Config(ConfigError, ErrorContext),
}

/// Byte-stream transport failures. Session moves to CLOSED.
#[derive(Debug)]
pub enum TransportError {
    ConnectFailed { reason: String },
    ReadFailed { reason: String },
    WriteFailed { reason: String },
    ConnectionLost { reason: String },
    Closed,
}

/// Telnet/TN3270E handshake failures. Fatal for the connection.
#[derive(Debug)]
pub enum NegotiationError {
    OptionRejected { option: u8 },
    RequiredOptionMissing { option: u8 },
    DeviceTypeRejected { requested: String },
    UnsupportedDeviceType { device_type: String },
    Timeout { stage: String, timeout_ms: u64 },
    MalformedSubnegotiation { option: u8, data: Vec<u8> },
}

/// Illegal sequence for the current session state.
#[derive(Debug)]
pub enum ProtocolError {
    IllegalCommand { command: u8, session_state: String },
    DataBeforeBind,
    UnexpectedHeaderDataType { data_type: u8 },
    InvalidAddress { address: usize, buffer_size: usize },
}

/// Truncated or malformed data-stream content. Never fatal by itself.
#[derive(Debug)]
pub enum ParseError {
    TruncatedOrder { order: u8, expected: usize, got: usize },
    StructuredFieldTooShort { length: usize, minimum: usize },
    UnknownCommand { byte: u8 },
    TruncatedHeader { got: usize },
}

/// A pending operation's deadline expired.
#[derive(Debug)]
pub struct TimeoutError {
    pub operation: String,
    pub timeout_ms: u64,
}

/// IND$FILE transfer failures reported by the host.
#[derive(Debug)]
pub enum IndFileError {
    HostError { code: u32, message: String },
    UnexpectedState { expected: String, actual: String },
    SinkFailed { reason: String },
    SourceFailed { reason: String },
}

/// Session/runtime configuration failures.
#[derive(Debug)]
pub enum ConfigError {
    InvalidParameter { parameter: String, value: String, reason: String },
    MissingRequired { parameter: String },
    FileError { path: String, error: String },
}

impl fmt::Display for Tn3270Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tn3270Error::Transport(e, ctx) => { write!(f, "transport error: {e}")?; ctx.fmt_suffix(f) }
            Tn3270Error::Negotiation(e, ctx) => { write!(f, "negotiation error: {e}")?; ctx.fmt_suffix(f) }
            Tn3270Error::Protocol(e, ctx) => { write!(f, "protocol error: {e}")?; ctx.fmt_suffix(f) }
            Tn3270Error::Parse(e, ctx) => { write!(f, "parse error: {e}")?; ctx.fmt_suffix(f) }
            Tn3270Error::Timeout(e, ctx) => { write!(f, "timeout: {e}")?; ctx.fmt_suffix(f) }
            Tn3270Error::IndFile(e, ctx) => { write!(f, "IND$FILE error: {e}")?; ctx.fmt_suffix(f) }
            Tn3270Error::Config(e, ctx) => { write!(f, "configuration error: {e}")?; ctx.fmt_suffix(f) }
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectFailed { reason } => write!(f, "connect failed: {reason}"),
            TransportError::ReadFailed { reason } => write!(f, "read failed: {reason}"),
            TransportError::WriteFailed { reason } => write!(f, "write failed: {reason}"),
            TransportError::ConnectionLost { reason } => write!(f, "connection lost: {reason}"),
            TransportError::Closed => write!(f, "transport already closed"),
        }
    }
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationError::OptionRejected { option } => write!(f, "option 0x{option:02X} rejected by host"),
            NegotiationError::RequiredOptionMissing { option } => write!(f, "required option 0x{option:02X} not negotiated"),
            NegotiationError::DeviceTypeRejected { requested } => write!(f, "device type '{requested}' rejected by host"),
            NegotiationError::UnsupportedDeviceType { device_type } => write!(f, "unsupported device type '{device_type}'"),
            NegotiationError::Timeout { stage, timeout_ms } => write!(f, "negotiation timed out during {stage} after {timeout_ms}ms"),
            NegotiationError::MalformedSubnegotiation { option, data } => write!(f, "malformed subnegotiation for option 0x{option:02X}: {data:?}"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::IllegalCommand { command, session_state } => write!(f, "command 0x{command:02X} illegal in state {session_state}"),
            ProtocolError::DataBeforeBind => write!(f, "3270 data received before BIND"),
            ProtocolError::UnexpectedHeaderDataType { data_type } => write!(f, "unexpected TN3270E header data-type 0x{data_type:02X}"),
            ProtocolError::InvalidAddress { address, buffer_size } => write!(f, "address {address} out of range for buffer of size {buffer_size}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TruncatedOrder { order, expected, got } => write!(f, "order 0x{order:02X} truncated: expected {expected} bytes, got {got}"),
            ParseError::StructuredFieldTooShort { length, minimum } => write!(f, "structured field length {length} below minimum {minimum}"),
            ParseError::UnknownCommand { byte } => write!(f, "unknown 3270 command byte 0x{byte:02X}"),
            ParseError::TruncatedHeader { got } => write!(f, "TN3270E header truncated: got {got} of 5 bytes"),
        }
    }
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} timed out after {}ms", self.operation, self.timeout_ms)
    }
}

impl fmt::Display for IndFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndFileError::HostError { code, message } => write!(f, "host reported error {code}: {message}"),
            IndFileError::UnexpectedState { expected, actual } => write!(f, "expected state {expected}, was {actual}"),
            IndFileError::SinkFailed { reason } => write!(f, "sink write failed: {reason}"),
            IndFileError::SourceFailed { reason } => write!(f, "source read failed: {reason}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidParameter { parameter, value, reason } => write!(f, "invalid parameter '{parameter}' = '{value}': {reason}"),
            ConfigError::MissingRequired { parameter } => write!(f, "missing required parameter: {parameter}"),
            ConfigError::FileError { path, error } => write!(f, "config file error '{path}': {error}"),
        }
    }
}

impl StdError for Tn3270Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        None
    }
}
impl StdError for TransportError {}
impl StdError for NegotiationError {}
impl StdError for ProtocolError {}
impl StdError for ParseError {}
impl StdError for TimeoutError {}
impl StdError for IndFileError {}
impl StdError for ConfigError {}

impl From<io::Error> for Tn3270Error {
    fn from(err: io::Error) -> Self {
        let reason = err.to_string();
        let leaf = match err.kind() {
            io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionAborted | io::ErrorKind::ConnectionReset => {
                TransportError::ConnectionLost { reason }
            }
            io::ErrorKind::TimedOut => TransportError::ReadFailed { reason },
            _ => TransportError::ReadFailed { reason },
        };
        Tn3270Error::Transport(leaf, ErrorContext::new())
    }
}

/// Result type alias for engine operations.
pub type Tn3270Result<T> = Result<T, Tn3270Error>;

pub type TransportResult<T> = Result<T, TransportError>;
pub type NegotiationResult<T> = Result<T, NegotiationError>;
pub type ProtocolResult<T> = Result<T, ProtocolError>;
pub type ParseResult<T> = Result<T, ParseError>;
pub type IndFileResult<T> = Result<T, IndFileError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_suffix_includes_host_and_seq() {
        let ctx = ErrorContext::new().with_host_port("host.example", 23).with_seq(7);
        let err = Tn3270Error::Negotiation(NegotiationError::OptionRejected { option: 0x28 }, ctx);
        let rendered = err.to_string();
        assert!(rendered.contains("host.example:23"));
        assert!(rendered.contains("seq=7"));
    }

    #[test]
    fn recent_bytes_are_capped_at_32() {
        let bytes: Vec<u8> = (0..64).collect();
        let ctx = ErrorContext::new().with_recent_bytes(&bytes);
        assert_eq!(ctx.recent_bytes.len(), 32);
        assert_eq!(ctx.recent_bytes[0], 32);
    }
}
