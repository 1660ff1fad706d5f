//! Field attributes and the field manager.
//!
//! A field begins at an SF/SFE order's buffer address and runs to the
//! next field's start address (or the end of the buffer, wrapping).
//! Unlike most of the display module, field content validation returns
//! the crate's own [`ParseError`] rather than ad hoc strings.

use crate::datastream::codes::*;
use crate::error::{ParseError, ParseResult};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldAttribute {
    pub address: u16,
    pub base_attr: u8,
    pub extended_attrs: ExtendedAttributes,
    pub length: usize,
}

impl FieldAttribute {
    pub fn new(address: u16, base_attr: u8) -> Self {
        Self {
            address,
            base_attr,
            extended_attrs: ExtendedAttributes::default(),
            length: 0,
        }
    }

    pub fn new_extended(address: u16, base_attr: u8, extended_attrs: ExtendedAttributes) -> Self {
        Self {
            address,
            base_attr,
            extended_attrs,
            length: 0,
        }
    }

    pub fn is_protected(&self) -> bool {
        (self.base_attr & ATTR_PROTECTED) != 0
    }

    pub fn is_numeric(&self) -> bool {
        (self.base_attr & ATTR_NUMERIC) != 0
    }

    pub fn is_hidden(&self) -> bool {
        (self.base_attr & ATTR_DISPLAY) == DISPLAY_HIDDEN
    }

    pub fn is_intensified(&self) -> bool {
        (self.base_attr & ATTR_DISPLAY) == DISPLAY_INTENSIFIED
    }

    pub fn is_modified(&self) -> bool {
        (self.base_attr & ATTR_MDT) != 0
    }

    pub fn set_modified(&mut self, modified: bool) {
        if modified {
            self.base_attr |= ATTR_MDT;
        } else {
            self.base_attr &= !ATTR_MDT;
        }
    }

    pub fn display_attr(&self) -> u8 {
        self.base_attr & ATTR_DISPLAY
    }

    pub fn is_mandatory_fill(&self) -> bool {
        self.extended_attrs
            .validation
            .is_some_and(|v| v & VALIDATION_MANDATORY_FILL != 0)
    }

    pub fn is_mandatory_entry(&self) -> bool {
        self.extended_attrs
            .validation
            .is_some_and(|v| v & VALIDATION_MANDATORY_ENTRY != 0)
    }

    pub fn is_trigger(&self) -> bool {
        self.extended_attrs
            .validation
            .is_some_and(|v| v & VALIDATION_TRIGGER != 0)
    }

    /// Validate field content against the field's attributes.
    pub fn validate_content(&self, content: &[u8]) -> ParseResult<()> {
        if self.is_mandatory_fill() {
            if content.len() < self.length
                || content.iter().any(|&ch| ch == 0x00 || ch == 0x40)
            {
                return Err(ParseError::TruncatedOrder {
                    order: ORDER_SF,
                    expected: self.length,
                    got: content.iter().filter(|&&ch| ch != 0x00 && ch != 0x40).count(),
                });
            }
        }

        if self.is_mandatory_entry() {
            let has_content = content.iter().any(|&ch| ch != 0x00 && ch != 0x40);
            if !has_content {
                return Err(ParseError::TruncatedOrder {
                    order: ORDER_SF,
                    expected: 1,
                    got: 0,
                });
            }
        }

        if self.is_numeric() {
            for &ch in content {
                if ch != 0x00 && ch != 0x40 && !(0xF0..=0xF9).contains(&ch) {
                    return Err(ParseError::UnknownCommand { byte: ch });
                }
            }
        }

        Ok(())
    }
}

/// Extended attributes carried by an SFE order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtendedAttributes {
    pub highlighting: Option<u8>,
    pub foreground_color: Option<u8>,
    pub background_color: Option<u8>,
    pub charset: Option<u8>,
    pub validation: Option<u8>,
    pub outlining: Option<u8>,
    pub transparency: Option<u8>,
    /// The XA_3270 pair (0xC0): the base Start Field attribute byte, carried
    /// as one of SFE's own type/value pairs rather than a separate argument.
    pub base_3270: Option<u8>,
}

impl ExtendedAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_highlighting(mut self, highlighting: u8) -> Self {
        self.highlighting = Some(highlighting);
        self
    }

    pub fn with_foreground(mut self, color: u8) -> Self {
        self.foreground_color = Some(color);
        self
    }

    pub fn with_background(mut self, color: u8) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn with_charset(mut self, charset: u8) -> Self {
        self.charset = Some(charset);
        self
    }

    pub fn with_validation(mut self, validation: u8) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Parse extended attributes from SFE payload: a pair count followed by
    /// that many (type, value) bytes. Returns the attributes and the number
    /// of payload bytes consumed.
    pub fn parse_from_sfe(data: &[u8]) -> ParseResult<(Self, usize)> {
        if data.is_empty() {
            return Err(ParseError::StructuredFieldTooShort { length: 0, minimum: 1 });
        }

        let num_pairs = data[0] as usize;
        let mut attrs = ExtendedAttributes::new();
        let mut pos = 1;

        for _ in 0..num_pairs {
            if pos + 1 >= data.len() {
                return Err(ParseError::TruncatedOrder {
                    order: ORDER_SFE,
                    expected: pos + 2,
                    got: data.len(),
                });
            }

            let attr_type = data[pos];
            let attr_value = data[pos + 1];
            pos += 2;

            match attr_type {
                XA_3270 => attrs.base_3270 = Some(attr_value),
                XA_HIGHLIGHTING => attrs.highlighting = Some(attr_value),
                XA_FOREGROUND => attrs.foreground_color = Some(attr_value),
                XA_BACKGROUND => attrs.background_color = Some(attr_value),
                XA_CHARSET => attrs.charset = Some(attr_value),
                XA_VALIDATION => attrs.validation = Some(attr_value),
                XA_OUTLINING => attrs.outlining = Some(attr_value),
                XA_TRANSPARENCY => attrs.transparency = Some(attr_value),
                _ => log::debug!("unknown extended attribute type 0x{attr_type:02X}"),
            }
        }

        Ok((attrs, pos))
    }

    /// Merge `other`'s present fields over `self`, per Modify Field's
    /// overlay-only-what's-given semantics.
    pub fn merge_from(&mut self, other: &ExtendedAttributes) {
        if other.highlighting.is_some() {
            self.highlighting = other.highlighting;
        }
        if other.foreground_color.is_some() {
            self.foreground_color = other.foreground_color;
        }
        if other.background_color.is_some() {
            self.background_color = other.background_color;
        }
        if other.charset.is_some() {
            self.charset = other.charset;
        }
        if other.validation.is_some() {
            self.validation = other.validation;
        }
        if other.outlining.is_some() {
            self.outlining = other.outlining;
        }
        if other.transparency.is_some() {
            self.transparency = other.transparency;
        }
        if other.base_3270.is_some() {
            self.base_3270 = other.base_3270;
        }
    }
}

/// Parsed form of a Start Field base attribute byte.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAttributeInfo {
    pub protected: bool,
    pub numeric: bool,
    pub display: u8,
    pub modified: bool,
    pub reserved: bool,
}

pub fn parse_base_attribute(attr_byte: u8) -> FieldAttributeInfo {
    FieldAttributeInfo {
        protected: (attr_byte & ATTR_PROTECTED) != 0,
        numeric: (attr_byte & ATTR_NUMERIC) != 0,
        display: attr_byte & ATTR_DISPLAY,
        modified: (attr_byte & ATTR_MDT) != 0,
        reserved: (attr_byte & ATTR_RESERVED) != 0,
    }
}

impl FieldAttributeInfo {
    pub fn is_hidden(&self) -> bool {
        self.display == DISPLAY_HIDDEN
    }

    pub fn is_intensified(&self) -> bool {
        self.display == DISPLAY_INTENSIFIED
    }

    pub fn is_normal(&self) -> bool {
        self.display == DISPLAY_NORMAL
    }
}

/// Tracks the collection of fields on a screen.
#[derive(Debug, Default)]
pub struct FieldManager {
    fields: Vec<FieldAttribute>,
}

impl FieldManager {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn add_field(&mut self, field: FieldAttribute) {
        self.fields.push(field);
        self.fields.sort_by_key(|f| f.address);
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn fields(&self) -> &[FieldAttribute] {
        &self.fields
    }

    /// Mutable iteration over every field, used to reset MDT bits and similar
    /// bulk operations without losing writes to a borrowed copy.
    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut FieldAttribute> {
        self.fields.iter_mut()
    }

    pub fn find_field_at(&self, address: u16) -> Option<&FieldAttribute> {
        self.fields.iter().rev().find(|f| f.address <= address)
    }

    pub fn find_field_at_mut(&mut self, address: u16) -> Option<&mut FieldAttribute> {
        self.fields.iter_mut().rev().find(|f| f.address <= address)
    }

    pub fn next_field(&self, address: u16) -> Option<&FieldAttribute> {
        self.fields.iter().find(|f| f.address > address)
    }

    /// Recompute each field's length from the next field's start address,
    /// wrapping the last field around to the first.
    pub fn calculate_field_lengths(&mut self, buffer_size: usize) -> ParseResult<()> {
        let field_count = self.fields.len();

        for i in 0..field_count {
            let start_addr = self.fields[i].address as usize;

            if start_addr >= buffer_size {
                return Err(ParseError::TruncatedOrder {
                    order: ORDER_SF,
                    expected: buffer_size,
                    got: start_addr,
                });
            }

            let end_addr = if i + 1 < field_count {
                self.fields[i + 1].address as usize
            } else {
                buffer_size
            };

            self.fields[i].length = end_addr - start_addr;
        }

        Ok(())
    }

    pub fn modified_fields(&self) -> Vec<&FieldAttribute> {
        self.fields.iter().filter(|f| f.is_modified()).collect()
    }

    /// Reset every field's MDT bit, e.g. on WCC reset-MDT.
    pub fn reset_mdt(&mut self) {
        for field in self.fields_mut() {
            field.set_modified(false);
        }
    }

    pub fn validate_field_at(&self, address: u16, content: &[u8]) -> ParseResult<()> {
        match self.find_field_at(address) {
            Some(field) => field.validate_content(content),
            None => Ok(()),
        }
    }

    /// Apply a Modify Field order's extended attributes to the field owning
    /// `address`, overlaying only the pairs the order actually carried.
    pub fn modify_field_at(&mut self, address: u16, attrs: ExtendedAttributes) {
        if let Some(field) = self.find_field_at_mut(address) {
            field.extended_attrs.merge_from(&attrs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_attribute_protected() {
        let attr = FieldAttribute::new(0, ATTR_PROTECTED);
        assert!(attr.is_protected());
        assert!(!attr.is_numeric());
    }

    #[test]
    fn field_attribute_mdt_round_trip() {
        let mut attr = FieldAttribute::new(0, 0);
        assert!(!attr.is_modified());
        attr.set_modified(true);
        assert!(attr.is_modified());
        attr.set_modified(false);
        assert!(!attr.is_modified());
    }

    #[test]
    fn extended_attributes_builder() {
        let attrs = ExtendedAttributes::new()
            .with_highlighting(HIGHLIGHT_BLINK)
            .with_foreground(COLOR_RED);

        assert_eq!(attrs.highlighting, Some(HIGHLIGHT_BLINK));
        assert_eq!(attrs.foreground_color, Some(COLOR_RED));
        assert_eq!(attrs.background_color, None);
    }

    #[test]
    fn field_manager_find_at() {
        let mut manager = FieldManager::new();
        manager.add_field(FieldAttribute::new(100, ATTR_PROTECTED));
        manager.add_field(FieldAttribute::new(200, ATTR_NUMERIC));

        assert_eq!(manager.fields().len(), 2);
        let field = manager.find_field_at(150);
        assert_eq!(field.unwrap().address, 100);
    }

    #[test]
    fn field_manager_calculate_lengths() {
        let mut manager = FieldManager::new();
        manager.add_field(FieldAttribute::new(0, 0));
        manager.add_field(FieldAttribute::new(100, 0));
        manager.add_field(FieldAttribute::new(200, 0));

        manager.calculate_field_lengths(1920).unwrap();

        assert_eq!(manager.fields()[0].length, 100);
        assert_eq!(manager.fields()[1].length, 100);
        assert_eq!(manager.fields()[2].length, 1720);
    }

    #[test]
    fn reset_mdt_clears_every_field() {
        let mut manager = FieldManager::new();
        manager.add_field(FieldAttribute::new(0, ATTR_MDT));
        manager.add_field(FieldAttribute::new(80, ATTR_MDT));
        assert_eq!(manager.modified_fields().len(), 2);

        manager.reset_mdt();
        assert_eq!(manager.modified_fields().len(), 0);
    }

    #[test]
    fn numeric_field_rejects_letters() {
        let attr = FieldAttribute::new(0, ATTR_NUMERIC);
        assert!(attr.validate_content(&[0xF1, 0xF2, 0xF3]).is_ok());
        assert!(attr.validate_content(&[0xC1, 0xC2]).is_err());
    }

    #[test]
    fn sfe_captures_base_3270_pair() {
        let data = vec![1, XA_3270, ATTR_PROTECTED];
        let (attrs, consumed) = ExtendedAttributes::parse_from_sfe(&data).unwrap();
        assert_eq!(attrs.base_3270, Some(ATTR_PROTECTED));
        assert_eq!(consumed, 3);
    }

    #[test]
    fn modify_field_overlays_only_given_pairs() {
        let mut manager = FieldManager::new();
        manager.add_field(FieldAttribute::new_extended(
            0,
            0,
            ExtendedAttributes::new().with_foreground(COLOR_RED),
        ));

        manager.modify_field_at(0, ExtendedAttributes::new().with_highlighting(HIGHLIGHT_BLINK));

        let field = manager.find_field_at(0).unwrap();
        assert_eq!(field.extended_attrs.highlighting, Some(HIGHLIGHT_BLINK));
        assert_eq!(field.extended_attrs.foreground_color, Some(COLOR_RED));
    }
}
