//! 680x0 status register flags.
//!
//! The status register is 16 bits:
//! - Bits 0-4: Condition code register (CCR): C, V, Z, N, X
//! - Bits 8-10: Interrupt mask (I0, I1, I2)
//! - Bit 12: Master/interrupt state (M, 68020 and later)
//! - Bit 13: Supervisor mode (S)
//! - Bit 14: Trace on change of flow (T0, 68020 and later)
//! - Bit 15: Trace (T1)

use crate::alu::Size;

/// Carry flag.
pub const C: u16 = 0x0001;
/// Overflow flag.
pub const V: u16 = 0x0002;
/// Zero flag.
pub const Z: u16 = 0x0004;
/// Negative flag.
pub const N: u16 = 0x0008;
/// Extend flag.
pub const X: u16 = 0x0010;

/// Interrupt priority mask field.
pub const IPL_MASK: u16 = 0x0700;
/// Master stack select (68020+).
pub const M: u16 = 0x1000;
/// Supervisor mode flag.
pub const S: u16 = 0x2000;
/// Trace on change of flow (68020+).
pub const T0: u16 = 0x4000;
/// Trace every instruction.
pub const T: u16 = 0x8000;

/// Mask for condition codes only (bits 0-4).
pub const CCR_MASK: u16 = 0x001F;

/// Status register helper functions.
pub struct Status;

impl Status {
    /// Update N and Z from a value of the given operand size.
    #[must_use]
    pub fn update_nz(sr: u16, value: u32, size: Size) -> u16 {
        let value = value & size.mask();
        let mut result = sr & !(N | Z);
        if value == 0 {
            result |= Z;
        }
        if value & size.msb() != 0 {
            result |= N;
        }
        result
    }

    /// MOVE-style flags: N and Z from the value, V and C cleared, X kept.
    #[must_use]
    pub fn logical(sr: u16, value: u32, size: Size) -> u16 {
        Self::update_nz(sr & !(V | C), value, size)
    }

    /// Set a flag if condition is true, clear if false.
    #[must_use]
    pub fn set_if(sr: u16, flag: u16, condition: bool) -> u16 {
        if condition { sr | flag } else { sr & !flag }
    }

    /// Replace the five condition code bits.
    #[must_use]
    pub fn with_ccr(sr: u16, ccr: u16) -> u16 {
        (sr & !CCR_MASK) | (ccr & CCR_MASK)
    }

    /// Evaluate a condition code (0-15).
    #[must_use]
    pub fn condition(sr: u16, cc: u8) -> bool {
        let c = sr & C != 0;
        let v = sr & V != 0;
        let z = sr & Z != 0;
        let n = sr & N != 0;
        match cc & 0x0F {
            0x0 => true,        // T
            0x1 => false,       // F
            0x2 => !c && !z,    // HI
            0x3 => c || z,      // LS
            0x4 => !c,          // CC
            0x5 => c,           // CS
            0x6 => !z,          // NE
            0x7 => z,           // EQ
            0x8 => !v,          // VC
            0x9 => v,           // VS
            0xA => !n,          // PL
            0xB => n,           // MI
            0xC => n == v,      // GE
            0xD => n != v,      // LT
            0xE => !z && n == v, // GT
            _ => z || n != v,   // LE
        }
    }

    /// Assembler suffix for a condition code.
    #[must_use]
    pub fn condition_name(cc: u8) -> &'static str {
        const NAMES: [&str; 16] = [
            "T", "F", "HI", "LS", "CC", "CS", "NE", "EQ", "VC", "VS", "PL", "MI", "GE", "LT",
            "GT", "LE",
        ];
        NAMES[usize::from(cc & 0x0F)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nz_follow_operand_size() {
        assert_eq!(Status::update_nz(0, 0x80, Size::Byte), N);
        assert_eq!(Status::update_nz(0, 0x100, Size::Byte), Z);
        assert_eq!(Status::update_nz(N | Z | C, 0x7FFF, Size::Word), C);
        assert_eq!(Status::update_nz(0, 0x8000_0000, Size::Long), N);
    }

    #[test]
    fn logical_keeps_extend() {
        assert_eq!(Status::logical(X | V | C, 0, Size::Long), X | Z);
    }

    #[test]
    fn signed_conditions() {
        assert!(Status::condition(N | V, 0xC));
        assert!(Status::condition(N, 0xD));
        assert!(!Status::condition(Z, 0xE));
        assert!(Status::condition(Z, 0xF));
        assert!(Status::condition(0, 0x2));
        assert!(Status::condition(C, 0x3));
    }
}
