//! SCS printer-session support: decoding the SCS control codes a
//! TN3270E printer LU receives instead of a 3270 data stream.
//!
//! There is no teacher analogue for printer sessions (tn5250r is a
//! display-only emulator); grounded instead on the TN3270E header's
//! `DATA_TYPE_SCS_DATA` branch point in [`crate::telnet::header`] and on
//! the SCS control-code table from the IBM 3270 reference the other
//! orders in [`crate::datastream::codes`] are drawn from.

use crate::error::{ParseError, ParseResult};

pub const SCS_NUL: u8 = 0x00;
pub const SCS_CR: u8 = 0x0D;
pub const SCS_NL: u8 = 0x15;
pub const SCS_FF: u8 = 0x0C;
pub const SCS_HT: u8 = 0x05;
pub const SCS_SO: u8 = 0x0E;
pub const SCS_SI: u8 = 0x0F;
pub const SCS_TRN: u8 = 0x35;
/// Line Feed: advance one line without returning to the left margin,
/// distinct from New Line (which does both).
pub const SCS_LF: u8 = 0x25;
/// Set Attribute: length-prefixed like TRN, carrying printer attribute
/// type/value pairs.
pub const SCS_SA: u8 = 0x2C;
/// Set Horizontal Format: length-prefixed tab-stop/margin parameters.
pub const SCS_SHF: u8 = 0x2B;
/// Set Vertical Format: length-prefixed page-length/line-spacing parameters.
pub const SCS_SVF: u8 = 0x2D;

/// One decoded unit of SCS output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScsOp {
    CarriageReturn,
    NewLine,
    LineFeed,
    FormFeed,
    HorizontalTab,
    ShiftOut,
    ShiftIn,
    /// Transparent data: the following `len` bytes pass through unmodified
    /// (e.g. embedded printer-control escapes).
    Transparent(Vec<u8>),
    SetAttribute(Vec<u8>),
    SetHorizontalFormat(Vec<u8>),
    SetVerticalFormat(Vec<u8>),
    Text(Vec<u8>),
}

/// Read a length-prefixed parameter run (as used by TRN/SA/SHF/SVF): one
/// length byte followed by that many raw bytes.
fn take_len_prefixed(data: &[u8], i: &mut usize, order: u8) -> ParseResult<Vec<u8>> {
    let len = *data.get(*i).ok_or(ParseError::TruncatedOrder {
        order,
        expected: *i + 1,
        got: data.len(),
    })? as usize;
    *i += 1;
    let end = *i + len;
    if end > data.len() {
        return Err(ParseError::TruncatedOrder { order, expected: end, got: data.len() });
    }
    let bytes = data[*i..end].to_vec();
    *i = end;
    Ok(bytes)
}

/// Decode one SCS data buffer (the body of a `DATA_TYPE_SCS_DATA` record)
/// into a sequence of printer operations.
pub fn decode_scs(data: &[u8]) -> ParseResult<Vec<ScsOp>> {
    let mut ops = Vec::new();
    let mut text_run = Vec::new();
    let mut i = 0;

    macro_rules! flush_text {
        () => {
            if !text_run.is_empty() {
                ops.push(ScsOp::Text(std::mem::take(&mut text_run)));
            }
        };
    }

    while i < data.len() {
        let byte = data[i];
        i += 1;
        match byte {
            SCS_CR => {
                flush_text!();
                ops.push(ScsOp::CarriageReturn);
            }
            SCS_NL => {
                flush_text!();
                ops.push(ScsOp::NewLine);
            }
            SCS_FF => {
                flush_text!();
                ops.push(ScsOp::FormFeed);
            }
            SCS_HT => {
                flush_text!();
                ops.push(ScsOp::HorizontalTab);
            }
            SCS_SO => {
                flush_text!();
                ops.push(ScsOp::ShiftOut);
            }
            SCS_SI => {
                flush_text!();
                ops.push(ScsOp::ShiftIn);
            }
            SCS_LF => {
                flush_text!();
                ops.push(ScsOp::LineFeed);
            }
            SCS_TRN => {
                flush_text!();
                let bytes = take_len_prefixed(data, &mut i, SCS_TRN)?;
                ops.push(ScsOp::Transparent(bytes));
            }
            SCS_SA => {
                flush_text!();
                let bytes = take_len_prefixed(data, &mut i, SCS_SA)?;
                ops.push(ScsOp::SetAttribute(bytes));
            }
            SCS_SHF => {
                flush_text!();
                let bytes = take_len_prefixed(data, &mut i, SCS_SHF)?;
                ops.push(ScsOp::SetHorizontalFormat(bytes));
            }
            SCS_SVF => {
                flush_text!();
                let bytes = take_len_prefixed(data, &mut i, SCS_SVF)?;
                ops.push(ScsOp::SetVerticalFormat(bytes));
            }
            _ => text_run.push(byte),
        }
    }
    flush_text!();
    Ok(ops)
}

/// Render decoded SCS operations to plain text (EBCDIC-decoded, with CR/NL/FF
/// mapped to their ASCII equivalents), for callers that want a simple print
/// preview rather than raw device control.
pub fn render_scs_as_text(ops: &[ScsOp]) -> String {
    let mut out = String::new();
    for op in ops {
        match op {
            ScsOp::CarriageReturn => out.push('\r'),
            ScsOp::NewLine => out.push('\n'),
            ScsOp::LineFeed => out.push('\n'),
            ScsOp::FormFeed => out.push('\u{000C}'),
            ScsOp::HorizontalTab => out.push('\t'),
            ScsOp::ShiftOut | ScsOp::ShiftIn => {}
            ScsOp::Transparent(_) => {}
            ScsOp::SetAttribute(_) | ScsOp::SetHorizontalFormat(_) | ScsOp::SetVerticalFormat(_) => {}
            ScsOp::Text(bytes) => out.push_str(&crate::ebcdic::decode(bytes)),
        }
    }
    out
}

/// Accumulates one printer LU's SCS output across records until a
/// PRINT-EOJ record closes the job, tracking page-break offsets for
/// pagination.
#[derive(Debug, Default)]
pub struct PrintJob {
    pub bytes: Vec<u8>,
    pub page_breaks: Vec<usize>,
    pub length: usize,
}

impl PrintJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one SCS-data record's decoded ops into the job buffer.
    pub fn append(&mut self, ops: &[ScsOp]) {
        for op in ops {
            match op {
                ScsOp::FormFeed => self.page_breaks.push(self.length),
                ScsOp::Text(bytes) | ScsOp::Transparent(bytes) => {
                    self.bytes.extend_from_slice(bytes);
                    self.length += bytes.len();
                }
                _ => {}
            }
        }
    }

    /// Close the job at PRINT-EOJ, returning the accumulated bytes.
    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }
}

/// Printer status structured-field ID the terminal reports back to the
/// host (distinct from the host-to-terminal structured-field IDs in
/// [`crate::datastream::structured_field`]).
pub const SF_ID_PRINTER_STATUS: u8 = 0x08;

pub const PRINTER_STATUS_DEVICE_END: u8 = 0x00;
pub const PRINTER_STATUS_INTERVENTION_REQUIRED: u8 = 0x01;

/// Build the printer-status structured field the terminal sends back to the
/// host: device-end on successful job completion, intervention-required on
/// a paper-out/offline condition.
pub fn build_printer_status_sf(status: u8) -> Vec<u8> {
    crate::datastream::structured_field::encode_structured_field(SF_ID_PRINTER_STATUS, &[status])
}
