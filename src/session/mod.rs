//! Session core: the state machine driving one TN3270E connection from
//! connect through negotiation to a live, readable/writable terminal.
//!
//! Grounded on the teacher's `Session`/`AsyncTerminalController` split
//! (`src/session.rs`, `src/controller.rs`): an async core plus a thin
//! blocking façade for callers that don't want to drive a tokio runtime
//! themselves. The state machine itself replaces the teacher's informal
//! `connected`/`connecting` booleans with the explicit states the
//! TN3270E handshake actually goes through.

pub mod blocking;

use crate::config::SessionConfig;
use crate::datastream::structured_field::{
    build_query_reply, is_query_request, parse_structured_fields, QueryReplyType,
    SF_ID_ERASE_RESET, SF_ID_READ_PARTITION,
};
use crate::error::{ErrorContext, NegotiationError, ProtocolError, Tn3270Error, Tn3270Result};
use crate::printer::PrintJob;
use crate::screen::ScreenBuffer;
use crate::telnet::header::{
    build_response, Tn3270EHeader, DATA_TYPE_3270_DATA, DATA_TYPE_PRINT_EOJ, DATA_TYPE_SCS_DATA,
    RESPONSE_FLAG_ALWAYS_RESPONSE, RESPONSE_FLAG_ERROR_RESPONSE,
};
use crate::telnet::negotiation::{Negotiator, NegotiationStage, Tn3270EDeviceType, Tn3270EFunction};
use crate::telnet::{Framer, TelnetEvent};
use crate::transport::Transport;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Negotiating,
    Ready,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Disconnected => "DISCONNECTED",
            SessionState::Connecting => "CONNECTING",
            SessionState::Negotiating => "NEGOTIATING",
            SessionState::Ready => "READY",
            SessionState::Closing => "CLOSING",
            SessionState::Closed => "CLOSED",
        };
        write!(f, "{s}")
    }
}

/// A live TN3270E session: transport, negotiation state, and the screen
/// buffer the host is driving.
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    state: SessionState,
    framer: Framer,
    negotiator: Negotiator,
    screen: ScreenBuffer,
    last_seq: u16,
    /// Records awaiting a write to the transport, queued so record-applying
    /// code stays synchronous and only `flush_outbound` needs to `.await`.
    outbound_queue: Vec<Vec<u8>>,
    print_job: Option<PrintJob>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: SessionConfig) -> Tn3270Result<Self> {
        let device_type = config.device_type()?;
        let functions = config.preferred_functions();
        let lu_name = config.lu_name().map(|s| s.to_string());
        Ok(Session {
            transport,
            config,
            state: SessionState::Disconnected,
            framer: Framer::new(),
            negotiator: Negotiator::new(device_type, lu_name, functions),
            screen: ScreenBuffer::new(),
            last_seq: 0,
            outbound_queue: Vec::new(),
            print_job: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    /// What negotiation actually settled on: TN3270E, basic TN3270, or NVT.
    pub fn negotiated_profile(&self) -> crate::telnet::negotiation::NegotiatedProfile {
        self.negotiator.profile()
    }

    fn error_context(&self) -> ErrorContext {
        ErrorContext::new()
            .with_host_port(self.config.host(), self.config.port())
            .with_session_state(self.state.to_string())
            .with_seq(self.last_seq)
    }

    /// Wrap `body` in a TN3270E header (when TN3270E is actually active)
    /// and telnet-frame it, queuing it for the next `flush_outbound`.
    fn frame_outbound(&mut self, data_type: u8, body: &[u8]) {
        let payload = if self.negotiator.stage() == NegotiationStage::Complete
            && self.config.uses_tn3270e_header()
        {
            let header = Tn3270EHeader::new(data_type, 0, self.last_seq);
            let mut out = header.encode().to_vec();
            out.extend_from_slice(body);
            out
        } else {
            body.to_vec()
        };
        self.outbound_queue.push(Framer::frame_record(&payload));
    }

    /// Write every queued outbound record to the transport, in order.
    async fn flush_outbound(&mut self) -> Tn3270Result<()> {
        while !self.outbound_queue.is_empty() {
            let record = self.outbound_queue.remove(0);
            self.transport.write_all(&record).await.map_err(|e| {
                Tn3270Error::Transport(
                    crate::error::TransportError::WriteFailed { reason: e.to_string() },
                    self.error_context(),
                )
            })?;
        }
        Ok(())
    }

    /// Queue a RESPONSE record if the inbound header's `response_flag`
    /// obligates one (RFC 2355 §4.7).
    fn maybe_queue_response(&mut self, header: &Tn3270EHeader, positive: bool) {
        if matches!(
            header.response_flag,
            RESPONSE_FLAG_ALWAYS_RESPONSE | RESPONSE_FLAG_ERROR_RESPONSE
        ) {
            let body = build_response(header.seq_number, positive);
            // build_response already includes its own header; frame directly.
            self.outbound_queue.push(Framer::frame_record(&body));
        }
    }

    /// Drive the connection from DISCONNECTED to READY, running telnet
    /// option negotiation and the TN3270E device-type/functions handshake.
    pub async fn connect(&mut self) -> Tn3270Result<()> {
        self.state = SessionState::Connecting;
        self.state = SessionState::Negotiating;

        let initial = self.negotiator.start();
        self.transport.write_all(&initial).await.map_err(|e| {
            Tn3270Error::Transport(
                crate::error::TransportError::WriteFailed { reason: e.to_string() },
                self.error_context(),
            )
        })?;

        let timeout = std::time::Duration::from_millis(self.config.negotiation_timeout_ms());
        let deadline = tokio::time::Instant::now() + timeout;

        let mut buf = [0u8; 4096];
        while !self.negotiator.is_complete() {
            if tokio::time::Instant::now() >= deadline {
                return Err(Tn3270Error::Negotiation(
                    NegotiationError::Timeout {
                        stage: format!("{:?}", self.negotiator.stage()),
                        timeout_ms: self.config.negotiation_timeout_ms(),
                    },
                    self.error_context(),
                ));
            }

            let n = tokio::time::timeout(timeout, self.transport.read(&mut buf))
                .await
                .map_err(|_| {
                    Tn3270Error::Negotiation(
                        NegotiationError::Timeout {
                            stage: format!("{:?}", self.negotiator.stage()),
                            timeout_ms: self.config.negotiation_timeout_ms(),
                        },
                        self.error_context(),
                    )
                })?
                .map_err(|e| {
                    Tn3270Error::Transport(
                        crate::error::TransportError::ReadFailed { reason: e.to_string() },
                        self.error_context(),
                    )
                })?;

            if n == 0 {
                return Err(Tn3270Error::Transport(
                    crate::error::TransportError::ConnectionLost {
                        reason: "EOF during negotiation".to_string(),
                    },
                    self.error_context(),
                ));
            }

            let events = self.framer.feed(&buf[..n]).map_err(|e| {
                Tn3270Error::Parse(e, self.error_context().with_recent_bytes(&buf[..n]))
            })?;

            for event in events {
                if matches!(event, TelnetEvent::Record(_)) {
                    continue; // data records before READY are unexpected; ignore.
                }
                let response = self.negotiator.handle_event(&event).map_err(|e| {
                    Tn3270Error::Negotiation(e, self.error_context())
                })?;
                if !response.is_empty() {
                    self.transport.write_all(&response).await.map_err(|e| {
                        Tn3270Error::Transport(
                            crate::error::TransportError::WriteFailed { reason: e.to_string() },
                            self.error_context(),
                        )
                    })?;
                }
            }
        }

        // TN3270E refusal (BasicTn3270) and NVT fallback both end
        // negotiation successfully; only a hard timeout above is fatal.
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Read and apply the next complete 3270 record from the host.
    pub async fn poll(&mut self) -> Tn3270Result<()> {
        if self.state != SessionState::Ready {
            return Err(Tn3270Error::Protocol(
                ProtocolError::IllegalCommand { command: 0, session_state: self.state.to_string() },
                self.error_context(),
            ));
        }

        let mut buf = [0u8; 4096];
        let n = self.transport.read(&mut buf).await.map_err(|e| {
            Tn3270Error::Transport(
                crate::error::TransportError::ReadFailed { reason: e.to_string() },
                self.error_context(),
            )
        })?;

        if n == 0 {
            self.state = SessionState::Closed;
            return Err(Tn3270Error::Transport(
                crate::error::TransportError::ConnectionLost { reason: "EOF".to_string() },
                self.error_context(),
            ));
        }

        let events = self.framer.feed(&buf[..n]).map_err(|e| {
            Tn3270Error::Parse(e, self.error_context().with_recent_bytes(&buf[..n]))
        })?;

        for event in events {
            if let TelnetEvent::Record(record) = event {
                self.apply_record(&record).await?;
            }
        }

        Ok(())
    }

    async fn apply_record(&mut self, record: &[u8]) -> Tn3270Result<()> {
        if self.negotiator.stage() == NegotiationStage::FellBackToNvt {
            // NVT content is free-form text, not a 3270 data stream; this
            // engine surfaces it to callers via the screen's NVT buffer
            // rather than attempting to parse 3270 orders out of it.
            self.screen.append_nvt_data(record);
            return Ok(());
        }

        let header_active = self.negotiator.stage() == NegotiationStage::Complete
            && self.config.uses_tn3270e_header();

        let (header, body) = if header_active {
            let header = Tn3270EHeader::decode(record).map_err(|e| {
                Tn3270Error::Parse(e, self.error_context().with_recent_bytes(record))
            })?;
            self.last_seq = header.seq_number;
            (Some(header), &record[5..])
        } else {
            (None, record)
        };

        if self.negotiator.stage() == NegotiationStage::BasicTn3270 && self.negotiator.classify_content(record) {
            self.screen.append_nvt_data(record);
            return Ok(());
        }

        match header.as_ref().map(|h| h.data_type) {
            Some(DATA_TYPE_SCS_DATA) => {
                let ops = crate::printer::decode_scs(body)
                    .map_err(|e| Tn3270Error::Parse(e, self.error_context().with_recent_bytes(body)))?;
                self.print_job.get_or_insert_with(PrintJob::new).append(&ops);
                if let Some(h) = &header {
                    self.maybe_queue_response(h, true);
                }
                self.flush_outbound().await
            }
            Some(DATA_TYPE_PRINT_EOJ) => {
                if let Some(mut job) = self.print_job.take() {
                    job.finish();
                }
                if let Some(h) = &header {
                    self.maybe_queue_response(h, true);
                }
                self.flush_outbound().await
            }
            Some(crate::telnet::header::DATA_TYPE_NVT_DATA) => {
                self.screen.append_nvt_data(body);
                Ok(())
            }
            Some(dt) if dt != DATA_TYPE_3270_DATA => {
                // BIND-IMAGE, UNBIND, SSCP-LU data: session-control records
                // this engine acknowledges without further decoding.
                if let Some(h) = &header {
                    self.maybe_queue_response(h, true);
                }
                self.flush_outbound().await
            }
            _ => {
                let parse_result = crate::datastream::parse_message(body, self.screen.address_mode());
                match parse_result {
                    Ok(parsed) => {
                        let apply_result = self.apply_parsed(parsed);
                        if let Some(h) = &header {
                            self.maybe_queue_response(h, apply_result.is_ok());
                        }
                        apply_result?;
                    }
                    Err(e) => {
                        if let Some(h) = &header {
                            self.maybe_queue_response(h, false);
                        }
                        self.flush_outbound().await?;
                        return Err(Tn3270Error::Parse(e, self.error_context().with_recent_bytes(body)));
                    }
                }
                self.flush_outbound().await
            }
        }
    }

    fn apply_parsed(&mut self, parsed: crate::datastream::ParsedMessage) -> Tn3270Result<()> {
        use crate::datastream::codes::CommandCode;
        use crate::datastream::DataStreamOp;

        if matches!(
            parsed.command,
            CommandCode::EraseWrite | CommandCode::EraseWriteAlternate
        ) {
            self.screen.clear();
        }

        if parsed.command == CommandCode::EraseAllUnprotected {
            self.screen.erase_unprotected_all();
            return Ok(());
        }

        for op in parsed.ops {
            match op {
                DataStreamOp::SetBufferAddress(addr) => {
                    self.screen.set_buffer_address(addr).map_err(|e| {
                        Tn3270Error::Parse(e, self.error_context())
                    })?;
                }
                DataStreamOp::StartField(attr) => {
                    let addr = self.screen.cursor_address();
                    self.screen.set_field_attribute(addr, attr).map_err(|e| {
                        Tn3270Error::Protocol(e, self.error_context())
                    })?;
                }
                DataStreamOp::Data(byte) => {
                    self.screen.write_char(byte).map_err(|e| {
                        Tn3270Error::Protocol(e, self.error_context())
                    })?;
                }
                DataStreamOp::InsertCursor => {
                    // cursor already at the data position that follows IC
                }
                DataStreamOp::ProgramTab => {
                    self.screen.tab_to_next_field().map_err(|e| {
                        Tn3270Error::Protocol(e, self.error_context())
                    })?;
                }
                DataStreamOp::RepeatToAddress(addr, byte) => {
                    self.screen.repeat_to_address(addr as usize, byte).map_err(|e| {
                        Tn3270Error::Protocol(e, self.error_context())
                    })?;
                }
                DataStreamOp::EraseUnprotectedToAddress(addr) => {
                    self.screen.erase_unprotected_to_address(addr as usize).map_err(|e| {
                        Tn3270Error::Protocol(e, self.error_context())
                    })?;
                }
                DataStreamOp::StartFieldExtended(_, mut extended) => {
                    let addr = self.screen.cursor_address();
                    let base = extended.base_3270.take().unwrap_or(0);
                    self.screen
                        .set_field_attribute_extended(addr, base, extended)
                        .map_err(|e| Tn3270Error::Protocol(e, self.error_context()))?;
                }
                DataStreamOp::SetAttribute(attr_type, value) => {
                    self.screen.set_character_attribute(attr_type, value);
                }
                DataStreamOp::ModifyField(extended) => {
                    let addr = self.screen.cursor_address();
                    self.screen.field_manager_mut().modify_field_at(addr as u16, extended);
                }
                DataStreamOp::GraphicEscape(gchar) => {
                    self.screen.write_char(gchar).map_err(|e| {
                        Tn3270Error::Protocol(e, self.error_context())
                    })?;
                }
                DataStreamOp::StructuredField(raw) => {
                    self.handle_structured_field(&raw)?;
                }
            }
        }

        if let Some(wcc) = parsed.wcc {
            if wcc & crate::datastream::codes::WCC_RESET_MDT != 0 {
                self.screen.clear_unprotected();
            }
            if wcc & crate::datastream::codes::WCC_ALARM != 0 {
                self.screen.set_alarm(true);
            }
            if wcc & crate::datastream::codes::WCC_RESTORE != 0 {
                self.screen.unlock_keyboard();
            }
        }

        Ok(())
    }

    /// Dispatch the structured fields carried in a Write Structured Field
    /// command body.
    fn handle_structured_field(&mut self, raw: &[u8]) -> Tn3270Result<()> {
        let fields = parse_structured_fields(raw)
            .map_err(|e| Tn3270Error::Parse(e, self.error_context().with_recent_bytes(raw)))?;

        for sf in fields {
            match sf.id {
                SF_ID_READ_PARTITION if is_query_request(&sf.payload) => {
                    let reply = build_query_reply(&[
                        QueryReplyType::Summary,
                        QueryReplyType::Usable,
                        QueryReplyType::Color,
                        QueryReplyType::Highlighting,
                    ]);
                    self.frame_outbound(DATA_TYPE_3270_DATA, &reply);
                }
                SF_ID_ERASE_RESET => {
                    self.screen.clear();
                }
                _ => {} // BIND-IMAGE/Set-Reply-Mode/Outbound-3270DS: no terminal-side effect yet
            }
        }
        Ok(())
    }

    /// Send an AID key plus the contents of every modified field, per the
    /// Read Modified convention, then lock the keyboard until the next
    /// Write/Erase-Write unlocks it.
    pub async fn send_aid(&mut self, aid: crate::datastream::codes::AidKey) -> Tn3270Result<()> {
        let mut builder = crate::datastream::MessageBuilder::new().aid(aid.to_u8());
        for (address, data) in self.screen.get_modified_data() {
            builder = builder
                .buffer_address(address, self.screen.address_mode())
                .raw(&data);
        }
        let payload = builder.build();
        self.frame_outbound(DATA_TYPE_3270_DATA, &payload);
        self.flush_outbound().await?;
        self.screen.lock_keyboard();
        Ok(())
    }

    pub async fn close(&mut self) -> Tn3270Result<()> {
        self.state = SessionState::Closing;
        self.transport.shutdown().await.ok();
        self.state = SessionState::Closed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::test_support::MockTransport;

    fn test_config() -> SessionConfig {
        SessionConfig::new("host.example".to_string(), 23)
    }

    #[tokio::test]
    async fn new_session_starts_disconnected() {
        let transport = MockTransport::default();
        let session = Session::new(transport, test_config()).unwrap();
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn close_transitions_to_closed() {
        let transport = MockTransport::default();
        let mut session = Session::new(transport, test_config()).unwrap();
        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
    }

    /// Drive a TN3270E session to READY over a `MockTransport` by feeding
    /// it the device-type/functions handshake bytes directly.
    async fn negotiate_to_ready(session: &mut Session<MockTransport>) {
        session.transport.push_inbound(&[0xFF, crate::telnet::DO, 40]); // IAC DO TN3270E

        let mut device_is = vec![0xFF, 0xFA, 40, 2, 4]; // IAC SB TN3270E DEVICE_TYPE IS
        device_is.extend_from_slice(b"IBM-3278-2");
        device_is.extend_from_slice(&[0xFF, 0xF0]); // IAC SE
        session.transport.push_inbound(&device_is);

        // FUNCTIONS IS: Bind(0), DataStreamCtl(1) — the config defaults.
        session.transport.push_inbound(&[0xFF, 0xFA, 40, 3, 4, 0, 1, 0xFF, 0xF0]);

        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
    }

    /// Scenario: a TN3270E response-obligation frame gets an immediate,
    /// correctly sequenced RESPONSE frame queued ahead of any other output.
    ///
    /// The inbound header's data-type byte is corrected to 0x00 (3270-DATA)
    /// here; a literal reading of the specification's illustrative bytes
    /// (`02 00 02 00 07 ...`) puts 0x02 (RESPONSE) in that position, which
    /// would make the frame a RESPONSE rather than the data frame the
    /// scenario describes — the same kind of transcription slip as the
    /// addressing example in DESIGN.md.
    #[tokio::test]
    async fn tn3270e_always_response_frame_gets_a_matching_response() {
        use crate::telnet::header::{DATA_TYPE_RESPONSE, RESPONSE_FLAG_ALWAYS_RESPONSE};

        let transport = MockTransport::default();
        let mut session = Session::new(transport, test_config()).unwrap();
        negotiate_to_ready(&mut session).await;

        let mut record = vec![
            crate::telnet::header::DATA_TYPE_3270_DATA,
            0x00,
            RESPONSE_FLAG_ALWAYS_RESPONSE,
            0x00,
            0x07,
        ];
        record.extend_from_slice(&[0xF5, 0xC3, 0x11, 0x40, 0x40]); // EW, WCC, SBA->0

        session.apply_record(&record).await.unwrap();

        let outbound = &session.transport.outbound;
        let expected_response = crate::telnet::header::build_response(7, true);
        let expected_record = Framer::frame_record(&expected_response);
        assert!(
            outbound.windows(expected_record.len()).any(|w| w == expected_record.as_slice()),
            "expected a RESPONSE record {:?} in outbound bytes {:?}",
            expected_record,
            outbound
        );
        assert_eq!(expected_response[0], DATA_TYPE_RESPONSE);
        assert_eq!(&expected_response[3..5], &[0x00, 0x07]);
        assert_eq!(expected_response[5], 0x00); // positive/device-end
    }

    /// Scenario: the first post-negotiation record contains a VT100 escape
    /// sequence, switching the session to NVT permanently.
    #[tokio::test]
    async fn vt100_escape_in_first_record_switches_to_nvt_permanently() {
        let mut transport = MockTransport::default();
        // Host refuses TN3270E outright (non-fatal fallback to basic TN3270).
        transport.push_inbound(&[0xFF, crate::telnet::WONT, 40]);
        let mut session = Session::new(transport, test_config()).unwrap();
        session.connect().await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);

        let record = vec![0x1B, 0x5B, 0x32, 0x4A]; // ESC [ 2 J
        session.apply_record(&record).await.unwrap();

        assert_eq!(session.screen.take_nvt_data(), record);
        assert_eq!(
            session.negotiated_profile().mode,
            crate::telnet::negotiation::NegotiationMode::Nvt
        );

        // Subsequent bytes keep flowing through as NVT text, not 3270 orders.
        session.apply_record(b"more text").await.unwrap();
        assert_eq!(session.screen.take_nvt_data(), b"more text".to_vec());
    }

    #[tokio::test]
    async fn erase_all_unprotected_command_clears_unprotected_cells() {
        let transport = MockTransport::default();
        let mut session = Session::new(transport, test_config()).unwrap();
        negotiate_to_ready(&mut session).await;

        session.screen.write_char_at(5, 0xC1).unwrap();

        let record = vec![
            crate::telnet::header::DATA_TYPE_3270_DATA,
            0x00,
            0x00,
            0x00,
            0x01,
            crate::datastream::codes::CMD_ERASE_ALL_UNPROTECTED,
        ];
        session.apply_record(&record).await.unwrap();

        assert_eq!(session.screen.read_char_at(5).unwrap(), crate::ebcdic::EBCDIC_SPACE);
        assert_eq!(session.screen.cursor_address(), 0);
    }
}
