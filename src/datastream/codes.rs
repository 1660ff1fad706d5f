//! 3270 data-stream command, order, and attribute constants.
//!
//! IBM defines two parallel byte sets for the same commands: the
//! "primary" non-SNA codes and the SNA codes used under SSCP-LU/LU-LU
//! sessions. A host may send either depending on how the session was
//! bound, so both decode to the same [`CommandCode`].

pub const CMD_WRITE: u8 = 0xF1;
pub const CMD_ERASE_WRITE: u8 = 0xF5;
pub const CMD_ERASE_WRITE_ALTERNATE: u8 = 0x7E;
pub const CMD_READ_BUFFER: u8 = 0xF2;
pub const CMD_READ_MODIFIED: u8 = 0xF6;
pub const CMD_READ_MODIFIED_ALL: u8 = 0x6E;
pub const CMD_ERASE_ALL_UNPROTECTED: u8 = 0x6F;
pub const CMD_WRITE_STRUCTURED_FIELD: u8 = 0xF3;

pub const CMD_SNA_WRITE: u8 = 0x01;
pub const CMD_SNA_ERASE_WRITE: u8 = 0x05;
pub const CMD_SNA_ERASE_WRITE_ALTERNATE: u8 = 0x0D;
pub const CMD_SNA_READ_BUFFER: u8 = 0x02;
pub const CMD_SNA_READ_MODIFIED: u8 = 0x06;
pub const CMD_SNA_READ_MODIFIED_ALL: u8 = 0x0E;
pub const CMD_SNA_ERASE_ALL_UNPROTECTED: u8 = 0x0F;
pub const CMD_SNA_WRITE_STRUCTURED_FIELD: u8 = 0x11;

/// Order codes embedded in the data stream to control formatting.
pub const ORDER_SF: u8 = 0x1D; // Start Field
pub const ORDER_SFE: u8 = 0x29; // Start Field Extended
pub const ORDER_SBA: u8 = 0x11; // Set Buffer Address
pub const ORDER_SA: u8 = 0x28; // Set Attribute
pub const ORDER_MF: u8 = 0x2C; // Modify Field
pub const ORDER_IC: u8 = 0x13; // Insert Cursor
pub const ORDER_PT: u8 = 0x05; // Program Tab
pub const ORDER_RA: u8 = 0x3C; // Repeat to Address
pub const ORDER_EUA: u8 = 0x12; // Erase Unprotected to Address
pub const ORDER_GE: u8 = 0x08; // Graphic Escape

/// Write Control Character bits, accompanying Write and Erase/Write commands.
pub const WCC_RESET: u8 = 0x40;
pub const WCC_ALARM: u8 = 0x04;
pub const WCC_RESTORE: u8 = 0x02;
pub const WCC_RESET_MDT: u8 = 0x01;

/// Attention Identifier bytes, sent terminal-to-host.
pub const AID_NO_AID: u8 = 0x60;
pub const AID_STRUCTURED_FIELD: u8 = 0x88;
pub const AID_READ_PARTITION: u8 = 0x61;
pub const AID_TRIGGER: u8 = 0x7F;

pub const AID_PF1: u8 = 0xF1;
pub const AID_PF2: u8 = 0xF2;
pub const AID_PF3: u8 = 0xF3;
pub const AID_PF4: u8 = 0xF4;
pub const AID_PF5: u8 = 0xF5;
pub const AID_PF6: u8 = 0xF6;
pub const AID_PF7: u8 = 0xF7;
pub const AID_PF8: u8 = 0xF8;
pub const AID_PF9: u8 = 0xF9;
pub const AID_PF10: u8 = 0x7A;
pub const AID_PF11: u8 = 0x7B;
pub const AID_PF12: u8 = 0x7C;
pub const AID_PF13: u8 = 0xC1;
pub const AID_PF14: u8 = 0xC2;
pub const AID_PF15: u8 = 0xC3;
pub const AID_PF16: u8 = 0xC4;
pub const AID_PF17: u8 = 0xC5;
pub const AID_PF18: u8 = 0xC6;
pub const AID_PF19: u8 = 0xC7;
pub const AID_PF20: u8 = 0xC8;
pub const AID_PF21: u8 = 0xC9;
pub const AID_PF22: u8 = 0x4A;
pub const AID_PF23: u8 = 0x4B;
pub const AID_PF24: u8 = 0x4C;

pub const AID_PA1: u8 = 0x6C;
pub const AID_PA2: u8 = 0x6E;
pub const AID_PA3: u8 = 0x6B;

pub const AID_CLEAR: u8 = 0x6D;
pub const AID_ENTER: u8 = 0x7D;
pub const AID_SYSREQ: u8 = 0xF0;

/// Field attribute byte bits, from the Start Field order.
pub const ATTR_PROTECTED: u8 = 0x20;
pub const ATTR_NUMERIC: u8 = 0x10;
pub const ATTR_DISPLAY: u8 = 0x0C;
pub const ATTR_RESERVED: u8 = 0x02;
pub const ATTR_MDT: u8 = 0x01;

pub const DISPLAY_NORMAL: u8 = 0x00;
pub const DISPLAY_INTENSIFIED: u8 = 0x08;
pub const DISPLAY_HIDDEN: u8 = 0x0C;

/// Extended field attribute types, from the Start Field Extended order.
pub const XA_ALL: u8 = 0x00;
pub const XA_3270: u8 = 0xC0;
pub const XA_VALIDATION: u8 = 0xC1;
pub const XA_OUTLINING: u8 = 0xC2;
pub const XA_HIGHLIGHTING: u8 = 0x41;
pub const XA_FOREGROUND: u8 = 0x42;
pub const XA_CHARSET: u8 = 0x43;
pub const XA_BACKGROUND: u8 = 0x45;
pub const XA_TRANSPARENCY: u8 = 0x46;

pub const COLOR_DEFAULT: u8 = 0x00;
pub const COLOR_BLUE: u8 = 0xF1;
pub const COLOR_RED: u8 = 0xF2;
pub const COLOR_PINK: u8 = 0xF3;
pub const COLOR_GREEN: u8 = 0xF4;
pub const COLOR_TURQUOISE: u8 = 0xF5;
pub const COLOR_YELLOW: u8 = 0xF6;
pub const COLOR_WHITE: u8 = 0xF7;
pub const COLOR_BLACK: u8 = 0xF8;
pub const COLOR_DEEP_BLUE: u8 = 0xF9;
pub const COLOR_ORANGE: u8 = 0xFA;
pub const COLOR_PURPLE: u8 = 0xFB;
pub const COLOR_PALE_GREEN: u8 = 0xFC;
pub const COLOR_PALE_TURQUOISE: u8 = 0xFD;
pub const COLOR_GREY: u8 = 0xFE;
pub const COLOR_NEUTRAL: u8 = 0xFF;

pub const HIGHLIGHT_DEFAULT: u8 = 0x00;
pub const HIGHLIGHT_NORMAL: u8 = 0xF0;
pub const HIGHLIGHT_BLINK: u8 = 0xF1;
pub const HIGHLIGHT_REVERSE: u8 = 0xF2;
pub const HIGHLIGHT_UNDERSCORE: u8 = 0xF4;

pub const VALIDATION_MANDATORY_FILL: u8 = 0x04;
pub const VALIDATION_MANDATORY_ENTRY: u8 = 0x02;
pub const VALIDATION_TRIGGER: u8 = 0x01;

/// A 3270 command, decoded from either its primary or SNA byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    Write,
    EraseWrite,
    EraseWriteAlternate,
    ReadBuffer,
    ReadModified,
    ReadModifiedAll,
    EraseAllUnprotected,
    WriteStructuredField,
}

impl CommandCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            CMD_WRITE | CMD_SNA_WRITE => Some(Self::Write),
            CMD_ERASE_WRITE | CMD_SNA_ERASE_WRITE => Some(Self::EraseWrite),
            CMD_ERASE_WRITE_ALTERNATE | CMD_SNA_ERASE_WRITE_ALTERNATE => {
                Some(Self::EraseWriteAlternate)
            }
            CMD_READ_BUFFER | CMD_SNA_READ_BUFFER => Some(Self::ReadBuffer),
            CMD_READ_MODIFIED | CMD_SNA_READ_MODIFIED => Some(Self::ReadModified),
            CMD_READ_MODIFIED_ALL | CMD_SNA_READ_MODIFIED_ALL => Some(Self::ReadModifiedAll),
            CMD_ERASE_ALL_UNPROTECTED | CMD_SNA_ERASE_ALL_UNPROTECTED => {
                Some(Self::EraseAllUnprotected)
            }
            CMD_WRITE_STRUCTURED_FIELD | CMD_SNA_WRITE_STRUCTURED_FIELD => {
                Some(Self::WriteStructuredField)
            }
            _ => None,
        }
    }

    /// Encode using the primary (non-SNA) byte.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Write => CMD_WRITE,
            Self::EraseWrite => CMD_ERASE_WRITE,
            Self::EraseWriteAlternate => CMD_ERASE_WRITE_ALTERNATE,
            Self::ReadBuffer => CMD_READ_BUFFER,
            Self::ReadModified => CMD_READ_MODIFIED,
            Self::ReadModifiedAll => CMD_READ_MODIFIED_ALL,
            Self::EraseAllUnprotected => CMD_ERASE_ALL_UNPROTECTED,
            Self::WriteStructuredField => CMD_WRITE_STRUCTURED_FIELD,
        }
    }

    /// Encode using the SNA byte, for sessions bound under SSCP-LU/LU-LU.
    pub fn to_sna_u8(self) -> u8 {
        match self {
            Self::Write => CMD_SNA_WRITE,
            Self::EraseWrite => CMD_SNA_ERASE_WRITE,
            Self::EraseWriteAlternate => CMD_SNA_ERASE_WRITE_ALTERNATE,
            Self::ReadBuffer => CMD_SNA_READ_BUFFER,
            Self::ReadModified => CMD_SNA_READ_MODIFIED,
            Self::ReadModifiedAll => CMD_SNA_READ_MODIFIED_ALL,
            Self::EraseAllUnprotected => CMD_SNA_ERASE_ALL_UNPROTECTED,
            Self::WriteStructuredField => CMD_SNA_WRITE_STRUCTURED_FIELD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderCode {
    StartField,
    StartFieldExtended,
    SetBufferAddress,
    SetAttribute,
    ModifyField,
    InsertCursor,
    ProgramTab,
    RepeatToAddress,
    EraseUnprotectedToAddress,
    GraphicEscape,
}

impl OrderCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            ORDER_SF => Some(Self::StartField),
            ORDER_SFE => Some(Self::StartFieldExtended),
            ORDER_SBA => Some(Self::SetBufferAddress),
            ORDER_SA => Some(Self::SetAttribute),
            ORDER_MF => Some(Self::ModifyField),
            ORDER_IC => Some(Self::InsertCursor),
            ORDER_PT => Some(Self::ProgramTab),
            ORDER_RA => Some(Self::RepeatToAddress),
            ORDER_EUA => Some(Self::EraseUnprotectedToAddress),
            ORDER_GE => Some(Self::GraphicEscape),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::StartField => ORDER_SF,
            Self::StartFieldExtended => ORDER_SFE,
            Self::SetBufferAddress => ORDER_SBA,
            Self::SetAttribute => ORDER_SA,
            Self::ModifyField => ORDER_MF,
            Self::InsertCursor => ORDER_IC,
            Self::ProgramTab => ORDER_PT,
            Self::RepeatToAddress => ORDER_RA,
            Self::EraseUnprotectedToAddress => ORDER_EUA,
            Self::GraphicEscape => ORDER_GE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AidKey {
    NoAid,
    Enter,
    Clear,
    PA1,
    PA2,
    PA3,
    PF1, PF2, PF3, PF4, PF5, PF6,
    PF7, PF8, PF9, PF10, PF11, PF12,
    PF13, PF14, PF15, PF16, PF17, PF18,
    PF19, PF20, PF21, PF22, PF23, PF24,
    StructuredField,
    ReadPartition,
    Trigger,
    SysReq,
}

impl AidKey {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            AID_NO_AID => Some(Self::NoAid),
            AID_ENTER => Some(Self::Enter),
            AID_CLEAR => Some(Self::Clear),
            AID_PA1 => Some(Self::PA1),
            AID_PA2 => Some(Self::PA2),
            AID_PA3 => Some(Self::PA3),
            AID_PF1 => Some(Self::PF1),
            AID_PF2 => Some(Self::PF2),
            AID_PF3 => Some(Self::PF3),
            AID_PF4 => Some(Self::PF4),
            AID_PF5 => Some(Self::PF5),
            AID_PF6 => Some(Self::PF6),
            AID_PF7 => Some(Self::PF7),
            AID_PF8 => Some(Self::PF8),
            AID_PF9 => Some(Self::PF9),
            AID_PF10 => Some(Self::PF10),
            AID_PF11 => Some(Self::PF11),
            AID_PF12 => Some(Self::PF12),
            AID_PF13 => Some(Self::PF13),
            AID_PF14 => Some(Self::PF14),
            AID_PF15 => Some(Self::PF15),
            AID_PF16 => Some(Self::PF16),
            AID_PF17 => Some(Self::PF17),
            AID_PF18 => Some(Self::PF18),
            AID_PF19 => Some(Self::PF19),
            AID_PF20 => Some(Self::PF20),
            AID_PF21 => Some(Self::PF21),
            AID_PF22 => Some(Self::PF22),
            AID_PF23 => Some(Self::PF23),
            AID_PF24 => Some(Self::PF24),
            AID_STRUCTURED_FIELD => Some(Self::StructuredField),
            AID_READ_PARTITION => Some(Self::ReadPartition),
            AID_TRIGGER => Some(Self::Trigger),
            AID_SYSREQ => Some(Self::SysReq),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::NoAid => AID_NO_AID,
            Self::Enter => AID_ENTER,
            Self::Clear => AID_CLEAR,
            Self::PA1 => AID_PA1,
            Self::PA2 => AID_PA2,
            Self::PA3 => AID_PA3,
            Self::PF1 => AID_PF1,
            Self::PF2 => AID_PF2,
            Self::PF3 => AID_PF3,
            Self::PF4 => AID_PF4,
            Self::PF5 => AID_PF5,
            Self::PF6 => AID_PF6,
            Self::PF7 => AID_PF7,
            Self::PF8 => AID_PF8,
            Self::PF9 => AID_PF9,
            Self::PF10 => AID_PF10,
            Self::PF11 => AID_PF11,
            Self::PF12 => AID_PF12,
            Self::PF13 => AID_PF13,
            Self::PF14 => AID_PF14,
            Self::PF15 => AID_PF15,
            Self::PF16 => AID_PF16,
            Self::PF17 => AID_PF17,
            Self::PF18 => AID_PF18,
            Self::PF19 => AID_PF19,
            Self::PF20 => AID_PF20,
            Self::PF21 => AID_PF21,
            Self::PF22 => AID_PF22,
            Self::PF23 => AID_PF23,
            Self::PF24 => AID_PF24,
            Self::StructuredField => AID_STRUCTURED_FIELD,
            Self::ReadPartition => AID_READ_PARTITION,
            Self::Trigger => AID_TRIGGER,
            Self::SysReq => AID_SYSREQ,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_code_accepts_both_byte_sets() {
        assert_eq!(CommandCode::from_u8(CMD_WRITE), Some(CommandCode::Write));
        assert_eq!(CommandCode::from_u8(CMD_SNA_WRITE), Some(CommandCode::Write));
        assert_eq!(CommandCode::Write.to_u8(), CMD_WRITE);
        assert_eq!(CommandCode::Write.to_sna_u8(), CMD_SNA_WRITE);
        assert_eq!(CommandCode::from_u8(0xFF), None);
    }

    #[test]
    fn order_code_round_trip() {
        assert_eq!(OrderCode::from_u8(ORDER_SF), Some(OrderCode::StartField));
        assert_eq!(OrderCode::StartField.to_u8(), ORDER_SF);
        assert_eq!(OrderCode::from_u8(0xFF), None);
    }

    #[test]
    fn aid_key_round_trip() {
        assert_eq!(AidKey::from_u8(AID_ENTER), Some(AidKey::Enter));
        assert_eq!(AidKey::Enter.to_u8(), AID_ENTER);
        assert_eq!(AidKey::from_u8(AID_PF1), Some(AidKey::PF1));
        assert_eq!(AidKey::PF1.to_u8(), AID_PF1);
    }

    #[test]
    fn field_attribute_bits() {
        let protected_numeric = ATTR_PROTECTED | ATTR_NUMERIC;
        assert_eq!(protected_numeric & ATTR_PROTECTED, ATTR_PROTECTED);
        assert_eq!(protected_numeric & ATTR_NUMERIC, ATTR_NUMERIC);
    }
}
