//! Addressing mode definitions for the 680x0 family.
//!
//! The 6-bit EA field decodes to one of twelve modes. On the 68020 and later
//! the two indexed modes also accept the full extension-word format (scaled
//! index, base/index suppression, memory indirection); that is decided by
//! the extension word itself, not by the EA field, so it is handled in `ea`.

/// Addressing mode for 680x0 instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// Data register direct: Dn
    DataReg(u8),
    /// Address register direct: An
    AddrReg(u8),
    /// Address register indirect: (An)
    AddrInd(u8),
    /// Address register indirect with postincrement: (An)+
    AddrIndPostInc(u8),
    /// Address register indirect with predecrement: -(An)
    AddrIndPreDec(u8),
    /// Address register indirect with displacement: d16(An)
    AddrIndDisp(u8),
    /// Address register indirect with index: d8(An,Xn) or full format
    AddrIndIndex(u8),
    /// Absolute short: (xxx).W
    AbsShort,
    /// Absolute long: (xxx).L
    AbsLong,
    /// Program counter with displacement: d16(PC)
    PcDisp,
    /// Program counter with index: d8(PC,Xn) or full format
    PcIndex,
    /// Immediate: #<data>
    Immediate,
}

impl AddrMode {
    /// Decode addressing mode from mode/register fields.
    #[must_use]
    pub fn decode(mode: u8, reg: u8) -> Option<Self> {
        let reg = reg & 0x07;
        match mode & 0x07 {
            0 => Some(Self::DataReg(reg)),
            1 => Some(Self::AddrReg(reg)),
            2 => Some(Self::AddrInd(reg)),
            3 => Some(Self::AddrIndPostInc(reg)),
            4 => Some(Self::AddrIndPreDec(reg)),
            5 => Some(Self::AddrIndDisp(reg)),
            6 => Some(Self::AddrIndIndex(reg)),
            _ => match reg {
                0 => Some(Self::AbsShort),
                1 => Some(Self::AbsLong),
                2 => Some(Self::PcDisp),
                3 => Some(Self::PcIndex),
                4 => Some(Self::Immediate),
                _ => None,
            },
        }
    }

    /// Decode the standard EA field in bits 5-0 of an opcode.
    #[must_use]
    pub fn from_ea_field(field: u16) -> Option<Self> {
        Self::decode(((field >> 3) & 7) as u8, (field & 7) as u8)
    }

    /// Decode the MOVE destination field (register in 11-9, mode in 8-6).
    #[must_use]
    pub fn from_move_dest(opcode: u16) -> Option<Self> {
        Self::decode(((opcode >> 6) & 7) as u8, ((opcode >> 9) & 7) as u8)
    }

    /// Position of this mode in the EA class bitmasks below and in the
    /// per-mode timing tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::DataReg(_) => 0,
            Self::AddrReg(_) => 1,
            Self::AddrInd(_) => 2,
            Self::AddrIndPostInc(_) => 3,
            Self::AddrIndPreDec(_) => 4,
            Self::AddrIndDisp(_) => 5,
            Self::AddrIndIndex(_) => 6,
            Self::AbsShort => 7,
            Self::AbsLong => 8,
            Self::PcDisp => 9,
            Self::PcIndex => 10,
            Self::Immediate => 11,
        }
    }

    /// Bit for this mode in an EA class mask.
    #[must_use]
    pub const fn bit(self) -> u16 {
        1 << self.index()
    }

    /// True for the two register-direct modes.
    #[must_use]
    pub const fn is_register(self) -> bool {
        matches!(self, Self::DataReg(_) | Self::AddrReg(_))
    }
}

/// Bitmask of acceptable addressing modes, indexed by [`AddrMode::index`].
pub type EaClass = u16;

pub const EA_DN: EaClass = 1 << 0;
pub const EA_AN: EaClass = 1 << 1;
pub const EA_IND: EaClass = 1 << 2;
pub const EA_POSTINC: EaClass = 1 << 3;
pub const EA_PREDEC: EaClass = 1 << 4;
pub const EA_DISP: EaClass = 1 << 5;
pub const EA_INDEX: EaClass = 1 << 6;
pub const EA_ABS_W: EaClass = 1 << 7;
pub const EA_ABS_L: EaClass = 1 << 8;
pub const EA_PC_DISP: EaClass = 1 << 9;
pub const EA_PC_INDEX: EaClass = 1 << 10;
pub const EA_IMM: EaClass = 1 << 11;

/// Every mode.
pub const EA_ALL: EaClass = 0x0FFF;
/// All modes except address register direct.
pub const EA_DATA: EaClass = EA_ALL & !EA_AN;
/// Memory modes (no register direct).
pub const EA_MEMORY: EaClass = EA_ALL & !(EA_DN | EA_AN);
/// Modes without side effects that name a memory location.
pub const EA_CONTROL: EaClass =
    EA_IND | EA_DISP | EA_INDEX | EA_ABS_W | EA_ABS_L | EA_PC_DISP | EA_PC_INDEX;
/// Writable modes.
pub const EA_ALTERABLE: EaClass = EA_ALL & !(EA_PC_DISP | EA_PC_INDEX | EA_IMM);
pub const EA_DATA_ALT: EaClass = EA_ALTERABLE & !EA_AN;
pub const EA_MEM_ALT: EaClass = EA_ALTERABLE & !(EA_DN | EA_AN);
pub const EA_CONTROL_ALT: EaClass = EA_CONTROL & EA_ALTERABLE;
/// Data modes minus immediate (BTST #n and CMPI on the 68020 read PC modes).
pub const EA_DATA_NO_IMM: EaClass = EA_DATA & !EA_IMM;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_special_modes() {
        assert_eq!(AddrMode::decode(7, 0), Some(AddrMode::AbsShort));
        assert_eq!(AddrMode::decode(7, 4), Some(AddrMode::Immediate));
        assert_eq!(AddrMode::decode(7, 5), None);
        assert_eq!(AddrMode::from_ea_field(0x1F), Some(AddrMode::AddrIndPostInc(7)));
    }

    #[test]
    fn move_destination_swaps_fields() {
        // MOVE.W D0,(A1): 0011 001 010 000 000
        assert_eq!(AddrMode::from_move_dest(0x3280), Some(AddrMode::AddrInd(1)));
    }

    #[test]
    fn class_masks() {
        assert_eq!(EA_DATA_ALT & AddrMode::AddrReg(0).bit(), 0);
        assert_ne!(EA_CONTROL & AddrMode::PcIndex.bit(), 0);
        assert_eq!(EA_CONTROL & AddrMode::AddrIndPostInc(0).bit(), 0);
        assert_eq!(EA_MEM_ALT.count_ones(), 7);
    }
}
