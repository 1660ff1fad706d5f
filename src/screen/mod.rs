//! The 3270 screen buffer: cell storage, cursor, fields, and addressing.
//!
//! Grounded on the teacher's `Display3270`, reworked around the corrected
//! [`addressing`] table and a `FieldManager` with real mutable iteration so
//! that WCC reset-MDT actually clears every field's MDT bit (the teacher's
//! `clear_unprotected` only cleared the field it could see through a
//! non-mutable borrow).

pub mod addressing;
pub mod field;

use crate::datastream::codes::*;
use crate::error::{ParseError, ParseResult, ProtocolError, ProtocolResult};
use field::{ExtendedAttributes, FieldAttribute, FieldManager};
use std::fmt;

/// Supported 3270 display geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenSize {
    Model2,
    Model3,
    Model4,
    Model5,
}

impl ScreenSize {
    pub fn rows(self) -> usize {
        match self {
            ScreenSize::Model2 => 24,
            ScreenSize::Model3 => 32,
            ScreenSize::Model4 => 43,
            ScreenSize::Model5 => 27,
        }
    }

    pub fn cols(self) -> usize {
        match self {
            ScreenSize::Model2 | ScreenSize::Model3 | ScreenSize::Model4 => 80,
            ScreenSize::Model5 => 132,
        }
    }

    pub fn buffer_size(self) -> usize {
        self.rows() * self.cols()
    }

    pub fn address_to_coords(self, address: usize) -> (usize, usize) {
        (address / self.cols(), address % self.cols())
    }

    pub fn coords_to_address(self, row: usize, col: usize) -> usize {
        row * self.cols() + col
    }
}

/// One position in the screen buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// EBCDIC byte, or the field attribute byte when `is_field_attr` is set.
    pub char_data: u8,
    pub is_field_attr: bool,
    pub extended_attr: u8,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            char_data: crate::ebcdic::EBCDIC_SPACE,
            is_field_attr: false,
            extended_attr: 0,
        }
    }
}

/// The 3270 screen buffer and everything addressed relative to it.
pub struct ScreenBuffer {
    size: ScreenSize,
    cells: Vec<Cell>,
    cursor_address: usize,
    fields: FieldManager,
    keyboard_locked: bool,
    alarm: bool,
    address_mode: addressing::AddressMode,
    /// The character attribute set by the most recent Set Attribute order,
    /// applied to subsequently written cells until the next field boundary.
    pending_char_attr: Option<u8>,
    /// Raw bytes received while the session has fallen back to NVT mode;
    /// not a 3270 data stream, so callers read it as plain text instead.
    nvt_buffer: Vec<u8>,
}

impl ScreenBuffer {
    pub fn new() -> Self {
        Self::with_size(ScreenSize::Model2)
    }

    pub fn with_size(size: ScreenSize) -> Self {
        let buffer_size = size.buffer_size();
        ScreenBuffer {
            size,
            cells: vec![Cell::default(); buffer_size],
            cursor_address: 0,
            fields: FieldManager::new(),
            keyboard_locked: false,
            alarm: false,
            address_mode: addressing::AddressMode::for_buffer_size(buffer_size),
            pending_char_attr: None,
            nvt_buffer: Vec::new(),
        }
    }

    /// Append bytes received while the connection is running as NVT.
    pub fn append_nvt_data(&mut self, data: &[u8]) {
        self.nvt_buffer.extend_from_slice(data);
    }

    /// Take and clear the accumulated NVT text buffer.
    pub fn take_nvt_data(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.nvt_buffer)
    }

    pub fn size(&self) -> ScreenSize {
        self.size
    }

    pub fn address_mode(&self) -> addressing::AddressMode {
        self.address_mode
    }

    pub fn buffer_size(&self) -> usize {
        self.cells.len()
    }

    /// Clear the buffer to nulls/spaces and drop all field definitions.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
        self.fields.clear();
        self.cursor_address = 0;
    }

    /// Reset the MDT bit of every field without touching cell content.
    pub fn clear_unprotected(&mut self) {
        self.fields.reset_mdt();
    }

    pub fn set_cursor(&mut self, address: usize) -> ProtocolResult<()> {
        if address >= self.cells.len() {
            return Err(ProtocolError::InvalidAddress {
                address,
                buffer_size: self.cells.len(),
            });
        }
        self.cursor_address = address;
        Ok(())
    }

    pub fn cursor_address(&self) -> usize {
        self.cursor_address
    }

    pub fn cursor_position(&self) -> (usize, usize) {
        self.size.address_to_coords(self.cursor_address)
    }

    fn check_address(&self, address: usize) -> ProtocolResult<()> {
        if address >= self.cells.len() {
            Err(ProtocolError::InvalidAddress {
                address,
                buffer_size: self.cells.len(),
            })
        } else {
            Ok(())
        }
    }

    pub fn write_char_at(&mut self, address: usize, byte: u8) -> ProtocolResult<()> {
        self.check_address(address)?;
        self.cells[address] = Cell {
            char_data: byte,
            is_field_attr: false,
            extended_attr: self.pending_char_attr.unwrap_or(0),
        };
        Ok(())
    }

    /// Apply a Set Attribute order's character attribute, in effect for
    /// subsequent writes until the next field boundary resets it.
    pub fn set_character_attribute(&mut self, _attr_type: u8, value: u8) {
        self.pending_char_attr = Some(value);
    }

    pub fn write_char(&mut self, byte: u8) -> ProtocolResult<()> {
        let addr = self.cursor_address;
        self.write_char_at(addr, byte)?;
        self.advance_cursor();
        Ok(())
    }

    pub fn read_char_at(&self, address: usize) -> ProtocolResult<u8> {
        self.check_address(address)?;
        Ok(self.cells[address].char_data)
    }

    fn advance_cursor(&mut self) {
        self.cursor_address = (self.cursor_address + 1) % self.cells.len();
    }

    /// Start a field at `address` with the given base attribute byte. Per
    /// the 3270 Start Field order, the attribute byte itself occupies the
    /// field's starting position; field data begins at the next address.
    pub fn set_field_attribute(&mut self, address: usize, base_attr: u8) -> ProtocolResult<()> {
        self.check_address(address)?;
        self.pending_char_attr = None;
        self.cells[address] = Cell {
            char_data: base_attr,
            is_field_attr: true,
            extended_attr: 0,
        };
        self.fields.add_field(FieldAttribute::new(address as u16, base_attr));
        Ok(())
    }

    /// Start a field via the Start Field Extended order: `base_attr` is the
    /// XA_3270 base attribute pair (or 0 if the host omitted it) and
    /// `extended` the remaining extended attribute pairs.
    pub fn set_field_attribute_extended(
        &mut self,
        address: usize,
        base_attr: u8,
        extended: ExtendedAttributes,
    ) -> ProtocolResult<()> {
        self.check_address(address)?;
        self.pending_char_attr = None;
        self.cells[address] = Cell {
            char_data: base_attr,
            is_field_attr: true,
            extended_attr: extended.highlighting.unwrap_or(0),
        };
        self.fields
            .add_field(FieldAttribute::new_extended(address as u16, base_attr, extended));
        Ok(())
    }

    pub fn field_manager(&self) -> &FieldManager {
        &self.fields
    }

    pub fn field_manager_mut(&mut self) -> &mut FieldManager {
        &mut self.fields
    }

    pub fn find_next_unprotected_field(&self, from: usize) -> Option<&FieldAttribute> {
        self.fields
            .fields()
            .iter()
            .find(|f| f.address as usize > from && !f.is_protected())
            .or_else(|| self.fields.fields().iter().find(|f| !f.is_protected()))
    }

    /// Move the cursor to the first data position of the next unprotected
    /// field after the current cursor address, per the Program Tab order.
    pub fn tab_to_next_field(&mut self) -> ProtocolResult<()> {
        if let Some(field) = self.find_next_unprotected_field(self.cursor_address) {
            let data_start = (field.address as usize + 1) % self.cells.len();
            self.cursor_address = data_start;
        }
        Ok(())
    }

    /// Repeat `byte` from the cursor's current address through `to_address`
    /// inclusive, per the Repeat to Address order.
    pub fn repeat_to_address(&mut self, to_address: usize, byte: u8) -> ProtocolResult<()> {
        self.check_address(to_address)?;
        let mut addr = self.cursor_address;
        loop {
            self.cells[addr] = Cell {
                char_data: byte,
                is_field_attr: false,
                extended_attr: 0,
            };
            if addr == to_address {
                break;
            }
            addr = (addr + 1) % self.cells.len();
        }
        self.cursor_address = (to_address + 1) % self.cells.len();
        Ok(())
    }

    /// Erase all unprotected positions from the cursor through `to_address`
    /// inclusive, per the Erase Unprotected to Address order.
    pub fn erase_unprotected_to_address(&mut self, to_address: usize) -> ProtocolResult<()> {
        self.check_address(to_address)?;
        let mut addr = self.cursor_address;
        loop {
            let protected = self
                .fields
                .find_field_at(addr as u16)
                .is_some_and(|f| f.is_protected());
            if !protected && !self.cells[addr].is_field_attr {
                self.cells[addr] = Cell::default();
            }
            if addr == to_address {
                break;
            }
            addr = (addr + 1) % self.cells.len();
        }
        Ok(())
    }

    /// Erase every unprotected, non-attribute position on the buffer and
    /// reset the cursor to address 0, per the Erase All Unprotected (EAU)
    /// command and the terminal-to-host CLEAR key.
    pub fn erase_unprotected_all(&mut self) {
        for addr in 0..self.cells.len() {
            let protected = self
                .fields
                .find_field_at(addr as u16)
                .is_some_and(|f| f.is_protected());
            if !protected && !self.cells[addr].is_field_attr {
                self.cells[addr] = Cell::default();
            }
        }
        self.fields.reset_mdt();
        self.cursor_address = 0;
    }

    pub fn lock_keyboard(&mut self) {
        self.keyboard_locked = true;
    }

    pub fn unlock_keyboard(&mut self) {
        self.keyboard_locked = false;
    }

    pub fn is_keyboard_locked(&self) -> bool {
        self.keyboard_locked
    }

    pub fn set_alarm(&mut self, on: bool) {
        self.alarm = on;
    }

    pub fn is_alarm(&self) -> bool {
        self.alarm
    }

    pub fn get_row(&self, row: usize) -> &[Cell] {
        let cols = self.size.cols();
        &self.cells[row * cols..(row + 1) * cols]
    }

    pub fn get_buffer_data(&self) -> &[Cell] {
        &self.cells
    }

    /// Collect the content of every modified (MDT-set) field, in field order.
    pub fn get_modified_data(&self) -> Vec<(u16, Vec<u8>)> {
        let mut out = Vec::new();
        for field in self.fields.modified_fields() {
            let start = field.address as usize + 1;
            let end = (start + field.length).min(self.cells.len());
            let data: Vec<u8> = self.cells[start..end].iter().map(|c| c.char_data).collect();
            out.push((field.address, data));
        }
        out
    }

    /// Apply a Set Buffer Address order's decoded address and validate it.
    pub fn set_buffer_address(&mut self, address: u16) -> ParseResult<()> {
        if address as usize >= self.cells.len() {
            return Err(ParseError::TruncatedOrder {
                order: ORDER_SBA,
                expected: self.cells.len(),
                got: address as usize,
            });
        }
        self.cursor_address = address as usize;
        Ok(())
    }
}

impl Default for ScreenBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScreenBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size.rows() {
            for cell in self.get_row(row) {
                let ch = if cell.is_field_attr {
                    ' '
                } else {
                    crate::ebcdic::decode_byte(cell.char_data)
                };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_size_geometry() {
        assert_eq!(ScreenSize::Model2.rows(), 24);
        assert_eq!(ScreenSize::Model2.cols(), 80);
        assert_eq!(ScreenSize::Model2.buffer_size(), 1920);
    }

    #[test]
    fn coords_round_trip() {
        let size = ScreenSize::Model2;
        for addr in [0usize, 1, 79, 80, 1919] {
            let (row, col) = size.address_to_coords(addr);
            assert_eq!(size.coords_to_address(row, col), addr);
        }
    }

    #[test]
    fn write_char_advances_cursor() {
        let mut buf = ScreenBuffer::new();
        buf.write_char(0xC1).unwrap();
        assert_eq!(buf.cursor_address(), 1);
        assert_eq!(buf.read_char_at(0).unwrap(), 0xC1);
    }

    #[test]
    fn set_cursor_rejects_out_of_range() {
        let mut buf = ScreenBuffer::new();
        assert!(buf.set_cursor(1920).is_err());
        assert!(buf.set_cursor(1919).is_ok());
    }

    #[test]
    fn reset_mdt_clears_all_fields_not_just_one() {
        let mut buf = ScreenBuffer::new();
        buf.set_field_attribute(0, ATTR_MDT).unwrap();
        buf.set_field_attribute(80, ATTR_MDT).unwrap();
        assert_eq!(buf.field_manager().modified_fields().len(), 2);

        buf.clear_unprotected();
        assert_eq!(buf.field_manager().modified_fields().len(), 0);
    }

    #[test]
    fn repeat_to_address_fills_range() {
        let mut buf = ScreenBuffer::new();
        buf.set_cursor(0).unwrap();
        buf.repeat_to_address(79, 0x40).unwrap();
        for i in 0..=79 {
            assert_eq!(buf.read_char_at(i).unwrap(), 0x40);
        }
    }

    #[test]
    fn erase_unprotected_all_spares_protected_fields() {
        let mut buf = ScreenBuffer::new();
        buf.set_field_attribute(0, ATTR_PROTECTED).unwrap();
        buf.write_char_at(1, 0xC1).unwrap();
        buf.set_field_attribute(10, 0).unwrap();
        buf.write_char_at(11, 0xC2).unwrap();
        buf.set_cursor(11).unwrap();

        buf.erase_unprotected_all();

        assert_eq!(buf.read_char_at(1).unwrap(), 0xC1);
        assert_eq!(buf.read_char_at(11).unwrap(), crate::ebcdic::EBCDIC_SPACE);
        assert_eq!(buf.cursor_address(), 0);
    }

    #[test]
    fn character_attribute_applies_until_next_field_boundary() {
        let mut buf = ScreenBuffer::new();
        buf.set_character_attribute(XA_HIGHLIGHTING, HIGHLIGHT_BLINK);
        buf.write_char_at(5, 0xC1).unwrap();
        assert_eq!(buf.get_buffer_data()[5].extended_attr, HIGHLIGHT_BLINK);

        buf.set_field_attribute(6, 0).unwrap();
        buf.write_char_at(7, 0xC2).unwrap();
        assert_eq!(buf.get_buffer_data()[7].extended_attr, 0);
    }

    #[test]
    fn set_field_attribute_extended_records_field() {
        let mut buf = ScreenBuffer::new();
        let extended = field::ExtendedAttributes::new().with_foreground(COLOR_RED);
        buf.set_field_attribute_extended(0, ATTR_PROTECTED, extended).unwrap();
        let field = buf.field_manager().find_field_at(0).unwrap();
        assert!(field.is_protected());
        assert_eq!(field.extended_attrs.foreground_color, Some(COLOR_RED));
    }

    #[test]
    fn standard_models_stay_within_twelve_bit_addressing() {
        for size in [ScreenSize::Model2, ScreenSize::Model3, ScreenSize::Model4, ScreenSize::Model5] {
            let buf = ScreenBuffer::with_size(size);
            assert_eq!(buf.address_mode(), addressing::AddressMode::TwelveBit);
        }
    }

    #[test]
    fn fourteen_bit_mode_selected_above_4095_cells() {
        assert_eq!(
            addressing::AddressMode::for_buffer_size(ScreenSize::Model5.buffer_size() * 2),
            addressing::AddressMode::FourteenBit
        );
    }

    #[test]
    fn nvt_data_accumulates_and_drains() {
        let mut buf = ScreenBuffer::new();
        buf.append_nvt_data(b"login: ");
        buf.append_nvt_data(b"guest\r\n");
        assert_eq!(buf.take_nvt_data(), b"login: guest\r\n".to_vec());
        assert!(buf.take_nvt_data().is_empty());
    }
}
