//! Operand sizes and the integer ALU shared by the instruction handlers.
//!
//! ALU helpers are pure: they take operands and return the result together
//! with the condition codes it produces. Handlers decide which of those bits
//! they commit (CMP leaves X alone, ADDX only ever clears Z, and so on).

use crate::flags::{C, N, V, X, Z};

/// Operation size for 680x0 instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// 8-bit byte operation.
    Byte,
    /// 16-bit word operation.
    Word,
    /// 32-bit long operation.
    Long,
}

impl Size {
    /// Get size from the standard 2-bit encoding (00=byte, 01=word, 10=long).
    #[must_use]
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x03 {
            0 => Some(Self::Byte),
            1 => Some(Self::Word),
            2 => Some(Self::Long),
            _ => None,
        }
    }

    /// Get size from the move encoding (01=byte, 11=word, 10=long).
    #[must_use]
    pub fn from_move_bits(bits: u8) -> Option<Self> {
        match bits & 0x03 {
            1 => Some(Self::Byte),
            3 => Some(Self::Word),
            2 => Some(Self::Long),
            _ => None,
        }
    }

    /// Operand width in bytes.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long => 4,
        }
    }

    /// Operand width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bytes() * 8
    }

    /// Mask covering the operand.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0xFF,
            Self::Word => 0xFFFF,
            Self::Long => 0xFFFF_FFFF,
        }
    }

    /// Sign bit of the operand.
    #[must_use]
    pub const fn msb(self) -> u32 {
        match self {
            Self::Byte => 0x80,
            Self::Word => 0x8000,
            Self::Long => 0x8000_0000,
        }
    }

    /// Sign-extend an operand of this size to 32 bits.
    #[must_use]
    pub const fn sign_extend(self, value: u32) -> u32 {
        match self {
            Self::Byte => value as u8 as i8 as i32 as u32,
            Self::Word => value as u16 as i16 as i32 as u32,
            Self::Long => value,
        }
    }

    /// Assembler size suffix.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Byte => ".B",
            Self::Word => ".W",
            Self::Long => ".L",
        }
    }
}

/// Add `src + dst + x`. Returns the masked result and X/N/Z/V/C.
#[must_use]
pub(crate) fn add(src: u32, dst: u32, x: bool, size: Size) -> (u32, u16) {
    let mask = size.mask();
    let (src, dst) = (src & mask, dst & mask);
    let wide = u64::from(src) + u64::from(dst) + u64::from(x);
    let result = (wide as u32) & mask;
    let msb = size.msb();

    let mut ccr = 0;
    if wide > u64::from(mask) {
        ccr |= C | X;
    }
    if (src ^ result) & (dst ^ result) & msb != 0 {
        ccr |= V;
    }
    if result & msb != 0 {
        ccr |= N;
    }
    if result == 0 {
        ccr |= Z;
    }
    (result, ccr)
}

/// Subtract `dst - src - x`. Returns the masked result and X/N/Z/V/C.
#[must_use]
pub(crate) fn sub(src: u32, dst: u32, x: bool, size: Size) -> (u32, u16) {
    let mask = size.mask();
    let (src, dst) = (src & mask, dst & mask);
    let result = dst.wrapping_sub(src).wrapping_sub(u32::from(x)) & mask;
    let msb = size.msb();

    let mut ccr = 0;
    if u64::from(src) + u64::from(x) > u64::from(dst) {
        ccr |= C | X;
    }
    if (src ^ dst) & (result ^ dst) & msb != 0 {
        ccr |= V;
    }
    if result & msb != 0 {
        ccr |= N;
    }
    if result == 0 {
        ccr |= Z;
    }
    (result, ccr)
}

/// Compare `dst - src`: N/Z/V/C only, X is never touched by compares.
#[must_use]
pub(crate) fn cmp(src: u32, dst: u32, size: Size) -> u16 {
    sub(src, dst, false, size).1 & !X
}

/// BCD addition `src + dst + x`. Returns (result, carry, overflow).
#[must_use]
pub(crate) fn bcd_add(src: u8, dst: u8, x: bool) -> (u8, bool, bool) {
    let extend = u8::from(x);
    let low_sum = (dst & 0x0F) + (src & 0x0F) + extend;
    let corf: u16 = if low_sum > 9 { 6 } else { 0 };
    let uncorrected = u16::from(dst) + u16::from(src) + u16::from(extend);

    let low_carry = (low_sum + if low_sum > 9 { 6 } else { 0 }) >> 4;
    let carry = (dst >> 4) + (src >> 4) + low_carry > 9;

    let result = if carry {
        uncorrected + corf + 0x60
    } else {
        uncorrected + corf
    };
    let overflow = (!uncorrected & result & 0x80) != 0;
    (result as u8, carry, overflow)
}

/// BCD subtraction `dst - src - x`. Returns (result, borrow, overflow).
#[must_use]
pub(crate) fn bcd_sub(src: u8, dst: u8, x: bool) -> (u8, bool, bool) {
    let extend = u8::from(x);
    let uncorrected = dst.wrapping_sub(src).wrapping_sub(extend);
    let mut result = uncorrected;

    let low_borrowed = (dst & 0x0F) < (src & 0x0F).saturating_add(extend);
    if low_borrowed {
        result = result.wrapping_sub(6);
    }
    let high_borrowed = (dst >> 4) < (src >> 4) + u8::from(low_borrowed);
    if high_borrowed {
        result = result.wrapping_sub(0x60);
    }

    let borrow = high_borrowed || (low_borrowed && uncorrected < 6);
    let overflow = (uncorrected & !result & 0x80) != 0;
    (result, borrow, overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sets_carry_and_overflow() {
        assert_eq!(add(1, 0xFF, false, Size::Byte), (0, C | X | Z));
        assert_eq!(add(1, 0x7F, false, Size::Byte), (0x80, V | N));
        assert_eq!(add(1, 0xFFFF_FFFF, true, Size::Long), (1, C | X));
    }

    #[test]
    fn sub_borrows() {
        assert_eq!(sub(1, 0, false, Size::Word), (0xFFFF, C | X | N));
        assert_eq!(sub(1, 0x8000, false, Size::Word), (0x7FFF, V));
        assert_eq!(sub(0, 0, true, Size::Byte), (0xFF, C | X | N));
    }

    #[test]
    fn cmp_never_reports_extend() {
        assert_eq!(cmp(2, 1, Size::Long), C | N);
    }

    #[test]
    fn bcd_round_trip_digits() {
        assert_eq!(bcd_add(0x45, 0x38, false), (0x83, false, true));
        assert_eq!(bcd_add(0x99, 0x01, false).0, 0x00);
        assert!(bcd_add(0x99, 0x01, false).1);
        assert_eq!(bcd_sub(0x38, 0x45, false).0, 0x07);
        let (r, borrow, _) = bcd_sub(0x01, 0x00, false);
        assert_eq!(r, 0x99);
        assert!(borrow);
    }

    #[test]
    fn sign_extension() {
        assert_eq!(Size::Byte.sign_extend(0x80), 0xFFFF_FF80);
        assert_eq!(Size::Word.sign_extend(0x7FFF), 0x7FFF);
        assert_eq!(Size::from_move_bits(3), Some(Size::Word));
        assert_eq!(Size::from_bits(3), None);
    }
}
