//! IND$FILE transfer subcore: the host/terminal file-transfer protocol
//! layered on top of Distributed Function Terminal (DFT) structured
//! fields.
//!
//! No teacher analogue (tn5250r doesn't implement file transfer);
//! grounded on [`crate::error::IndFileError`]'s existing taxonomy and on
//! [`crate::datastream::structured_field`] for the structured-field
//! envelope DFT messages travel in.

use crate::datastream::structured_field::{encode_structured_field, StructuredField};
use crate::error::{IndFileError, IndFileResult};

/// IND$FILE's structured-field ID. Distinct from `SF_ID_READ_PARTITION`
/// (0x01) — the two are unrelated structured fields that happen to both
/// start with small values in other implementations; IBM assigns IND$FILE's
/// DFT envelope 0xD0.
pub const SF_ID_IND_FILE: u8 = 0xD0;

/// DFT function codes relevant to IND$FILE (a subset of the full DFT set).
mod dft_fn {
    pub const OPEN: u8 = 0x40;
    pub const CLOSE: u8 = 0x42;
    pub const GET: u8 = 0x4C;
    pub const INSERT: u8 = 0x4D;
    pub const DATA: u8 = 0x4E;
    pub const GET_NEXT_DATA: u8 = 0x48;
    pub const ERROR: u8 = 0x47;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Host to terminal.
    Download,
    /// Terminal to host.
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Opening,
    Transferring,
    Closing,
    Complete,
    Failed,
}

/// Drives one IND$FILE transfer's state machine; the caller supplies bytes
/// read from the local file (uploads) or a sink for bytes received
/// (downloads) — this type has no filesystem access of its own.
pub struct Transfer {
    direction: TransferDirection,
    state: TransferState,
    buffer: Vec<u8>,
    bytes_transferred: u64,
}

impl Transfer {
    pub fn new(direction: TransferDirection) -> Self {
        Transfer {
            direction,
            state: TransferState::Idle,
            buffer: Vec::new(),
            bytes_transferred: 0,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// Build the DFT OPEN request that starts the transfer.
    pub fn open_request(&mut self, filename: &str) -> IndFileResult<Vec<u8>> {
        if self.state != TransferState::Idle {
            return Err(IndFileError::UnexpectedState {
                expected: "Idle".to_string(),
                actual: format!("{:?}", self.state),
            });
        }
        self.state = TransferState::Opening;
        let mut payload = vec![dft_fn::OPEN];
        payload.extend_from_slice(&crate::ebcdic::encode(filename));
        Ok(encode_structured_field(SF_ID_IND_FILE, &payload))
    }

    /// For a download: the next chunk of file data read off the wire.
    /// For an upload: the chunk the caller should send next via
    /// [`Transfer::data_chunk`].
    pub fn handle_incoming(&mut self, sf: &StructuredField) -> IndFileResult<Option<Vec<u8>>> {
        if sf.id != SF_ID_IND_FILE {
            return Ok(None);
        }
        let Some(&func) = sf.payload.first() else {
            return Err(IndFileError::HostError { code: 0, message: "empty DFT payload".to_string() });
        };

        match func {
            dft_fn::DATA | dft_fn::INSERT => {
                self.state = TransferState::Transferring;
                let chunk = sf.payload[1..].to_vec();
                self.bytes_transferred += chunk.len() as u64;
                self.buffer.extend_from_slice(&chunk);
                Ok(Some(chunk))
            }
            dft_fn::GET_NEXT_DATA => {
                self.state = TransferState::Transferring;
                Ok(None)
            }
            dft_fn::CLOSE => {
                self.state = TransferState::Complete;
                Ok(None)
            }
            dft_fn::ERROR => {
                self.state = TransferState::Failed;
                let code = sf.payload.get(1).copied().unwrap_or(0) as u32;
                Err(IndFileError::HostError { code, message: "host reported transfer error".to_string() })
            }
            other => {
                self.state = TransferState::Failed;
                Err(IndFileError::UnexpectedState {
                    expected: "known DFT function".to_string(),
                    actual: format!("0x{other:02X}"),
                })
            }
        }
    }

    /// Build a DATA structured field carrying `chunk`, for uploads.
    pub fn data_chunk(&mut self, chunk: &[u8]) -> IndFileResult<Vec<u8>> {
        if self.direction != TransferDirection::Upload {
            return Err(IndFileError::UnexpectedState {
                expected: "Upload".to_string(),
                actual: "Download".to_string(),
            });
        }
        self.bytes_transferred += chunk.len() as u64;
        let mut payload = vec![dft_fn::DATA];
        payload.extend_from_slice(chunk);
        Ok(encode_structured_field(SF_ID_IND_FILE, &payload))
    }

    pub fn close_request(&mut self) -> Vec<u8> {
        self.state = TransferState::Closing;
        encode_structured_field(SF_ID_IND_FILE, &[dft_fn::CLOSE])
    }

    pub fn take_buffer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }
}
