//! 680x0 register file.
//!
//! - D0-D7: 8 data registers (32-bit)
//! - A0-A7: 8 address registers; A7 is the *live* stack pointer
//! - USP / ISP / MSP: shadow slots for the stack pointers that are not live
//! - PC, SR, VBR, CACR, CAAR, SFC, DFC
//!
//! Exactly one stack pointer lives in `a[7]` at any time. Every SR write goes
//! through [`Registers::set_sr`], which parks the live value in the slot of
//! the mode being left before loading the slot of the mode being entered.

use crate::error::ConfigError;
use crate::flags::{CCR_MASK, IPL_MASK, M, S, T};

/// Shadow slot indices.
const USER: usize = 0;
const INTERRUPT: usize = 1;
const MASTER: usize = 2;

/// 680x0 register set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    /// Data registers D0-D7.
    pub d: [u32; 8],
    /// Address registers A0-A7 (A7 is the live stack pointer).
    pub a: [u32; 8],
    /// Program counter.
    pub pc: u32,
    /// Start address of the most recently executed instruction.
    pub prev_pc: u32,
    /// Vector base register (always zero on the 68000).
    pub vbr: u32,
    /// Cache control register.
    pub cacr: u32,
    /// Cache address register.
    pub caar: u32,
    /// Source function code register (MOVES).
    pub sfc: u8,
    /// Destination function code register (MOVES).
    pub dfc: u8,
    sr: u16,
    sr_mask: u16,
    sp: [u32; 3],
}

impl Registers {
    /// Create registers in reset state: supervisor mode, interrupt level 7.
    #[must_use]
    pub const fn new(sr_mask: u16) -> Self {
        Self {
            d: [0; 8],
            a: [0; 8],
            pc: 0,
            prev_pc: 0,
            vbr: 0,
            cacr: 0,
            caar: 0,
            sfc: 0,
            dfc: 0,
            sr: 0x2700,
            sr_mask,
            sp: [0; 3],
        }
    }

    /// Current status register.
    #[must_use]
    pub const fn sr(&self) -> u16 {
        self.sr
    }

    /// Write the full status register, swapping the live stack pointer when
    /// the S or M bit changes. Bits the model does not implement read as 0.
    pub fn set_sr(&mut self, value: u16) {
        let value = value & self.sr_mask;
        let old_slot = Self::slot(self.sr);
        let new_slot = Self::slot(value);
        if old_slot != new_slot {
            self.sp[old_slot] = self.a[7];
            self.a[7] = self.sp[new_slot];
        }
        self.sr = value;
    }

    /// Get the condition code register (low byte of SR).
    #[must_use]
    pub const fn ccr(&self) -> u8 {
        (self.sr & CCR_MASK) as u8
    }

    /// Set the condition code bits; the system byte is untouched.
    pub fn set_ccr(&mut self, value: u16) {
        self.sr = (self.sr & !CCR_MASK) | (value & CCR_MASK);
    }

    fn slot(sr: u16) -> usize {
        if sr & S == 0 {
            USER
        } else if sr & M != 0 {
            MASTER
        } else {
            INTERRUPT
        }
    }

    /// Check if in supervisor mode.
    #[must_use]
    pub const fn is_supervisor(&self) -> bool {
        self.sr & S != 0
    }

    /// Check if trace mode is enabled.
    #[must_use]
    pub const fn is_trace(&self) -> bool {
        self.sr & T != 0
    }

    /// Get the interrupt mask level (0-7).
    #[must_use]
    pub const fn interrupt_mask(&self) -> u8 {
        ((self.sr & IPL_MASK) >> 8) as u8
    }

    fn shadow(&self, slot: usize) -> u32 {
        if Self::slot(self.sr) == slot {
            self.a[7]
        } else {
            self.sp[slot]
        }
    }

    fn set_shadow(&mut self, slot: usize, value: u32) {
        if Self::slot(self.sr) == slot {
            self.a[7] = value;
        } else {
            self.sp[slot] = value;
        }
    }

    /// User stack pointer, wherever it currently lives.
    #[must_use]
    pub fn usp(&self) -> u32 {
        self.shadow(USER)
    }

    /// Set the user stack pointer.
    pub fn set_usp(&mut self, value: u32) {
        self.set_shadow(USER, value);
    }

    /// Interrupt stack pointer (the SSP of the 68000/68010).
    #[must_use]
    pub fn isp(&self) -> u32 {
        self.shadow(INTERRUPT)
    }

    /// Set the interrupt stack pointer.
    pub fn set_isp(&mut self, value: u32) {
        self.set_shadow(INTERRUPT, value);
    }

    /// Master stack pointer (68020+).
    #[must_use]
    pub fn msp(&self) -> u32 {
        self.shadow(MASTER)
    }

    /// Set the master stack pointer.
    pub fn set_msp(&mut self, value: u32) {
        self.set_shadow(MASTER, value);
    }

    /// The supervisor stack pointer selected by the M bit.
    #[must_use]
    pub fn ssp(&self) -> u32 {
        if self.sr & M != 0 { self.msp() } else { self.isp() }
    }

    /// Data or address register by combined index (0-7 = Dn, 8-15 = An).
    #[must_use]
    pub const fn da(&self, n: usize) -> u32 {
        if n < 8 { self.d[n] } else { self.a[n - 8] }
    }
}

/// Host-visible register identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum RegisterId {
    D0, D1, D2, D3, D4, D5, D6, D7,
    A0, A1, A2, A3, A4, A5, A6, A7,
    Pc,
    Sr,
    /// Stack pointer slots independent of the current mode.
    Usp,
    Isp,
    Msp,
    Vbr,
    Cacr,
    Caar,
    Sfc,
    Dfc,
    /// Start address of the last executed instruction.
    PrevPc,
}

impl RegisterId {
    const ALL: [RegisterId; 27] = [
        Self::D0, Self::D1, Self::D2, Self::D3, Self::D4, Self::D5, Self::D6, Self::D7,
        Self::A0, Self::A1, Self::A2, Self::A3, Self::A4, Self::A5, Self::A6, Self::A7,
        Self::Pc, Self::Sr, Self::Usp, Self::Isp, Self::Msp, Self::Vbr, Self::Cacr,
        Self::Caar, Self::Sfc, Self::Dfc, Self::PrevPc,
    ];

    /// Data register Dn.
    #[must_use]
    pub const fn data(n: u8) -> Self {
        Self::ALL[(n & 7) as usize]
    }

    /// Address register An.
    #[must_use]
    pub const fn address(n: u8) -> Self {
        Self::ALL[8 + (n & 7) as usize]
    }
}

impl TryFrom<u32> for RegisterId {
    type Error = ConfigError;

    /// Numeric ids: 0-7 D0-D7, 8-15 A0-A7, then PC, SR, USP, ISP, MSP, VBR,
    /// CACR, CAAR, SFC, DFC, PREV_PC.
    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or(ConfigError::UnknownRegister(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASK_68000: u16 = 0xA71F;
    const MASK_68020: u16 = 0xF71F;

    #[test]
    fn reset_state_is_supervisor_level_7() {
        let regs = Registers::new(MASK_68000);
        assert!(regs.is_supervisor());
        assert_eq!(regs.interrupt_mask(), 7);
    }

    #[test]
    fn supervisor_toggle_preserves_user_stack() {
        let mut regs = Registers::new(MASK_68000);
        regs.a[7] = 0x8000; // ISP (live)
        regs.set_usp(0x4000);

        regs.set_sr(0x0000); // to user
        assert_eq!(regs.a[7], 0x4000);
        assert_eq!(regs.isp(), 0x8000);

        regs.a[7] = 0x3FFC;
        regs.set_sr(0x2000);
        assert_eq!(regs.a[7], 0x8000);
        assert_eq!(regs.usp(), 0x3FFC);

        regs.set_sr(0x0000);
        assert_eq!(regs.a[7], 0x3FFC);
    }

    #[test]
    fn master_bit_ignored_without_master_stack() {
        let mut regs = Registers::new(MASK_68000);
        regs.a[7] = 0x1000;
        regs.set_sr(0x3000);
        assert_eq!(regs.sr(), 0x2000);
        assert_eq!(regs.a[7], 0x1000);
    }

    #[test]
    fn master_stack_swaps_on_m_bit() {
        let mut regs = Registers::new(MASK_68020);
        regs.a[7] = 0x1000;
        regs.set_msp(0x2000);
        regs.set_sr(0x3000);
        assert_eq!(regs.a[7], 0x2000);
        assert_eq!(regs.isp(), 0x1000);
        assert_eq!(regs.ssp(), 0x2000);
    }

    #[test]
    fn register_ids_round_trip() {
        assert_eq!(RegisterId::try_from(0).ok(), Some(RegisterId::D0));
        assert_eq!(RegisterId::try_from(15).ok(), Some(RegisterId::A7));
        assert_eq!(RegisterId::try_from(26).ok(), Some(RegisterId::PrevPc));
        assert_eq!(
            RegisterId::try_from(27),
            Err(ConfigError::UnknownRegister(27))
        );
        assert_eq!(RegisterId::address(3), RegisterId::A3);
    }
}
