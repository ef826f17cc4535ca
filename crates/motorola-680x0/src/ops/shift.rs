//! Shifts and rotates: ASL/ASR, LSL/LSR, ROXL/ROXR, ROL/ROR.

use super::{reg_x, reg_y, sized};
use crate::alu::Size;
use crate::cpu::Cpu680x0;
use crate::exceptions::Fault;
use crate::flags::{C, N, V, X, Z};
use crate::memory::HostBus;
use crate::table::SizeField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftKind {
    Arithmetic,
    Logical,
    RotateExtend,
    Rotate,
}

impl ShiftKind {
    fn from_bits(bits: u16) -> Self {
        match bits & 3 {
            0 => Self::Arithmetic,
            1 => Self::Logical,
            2 => Self::RotateExtend,
            _ => Self::Rotate,
        }
    }
}

/// Shift `value` by `count` one bit at a time. Returns the result and the
/// new CCR.
fn shift(kind: ShiftKind, left: bool, value: u32, count: u32, size: Size, sr: u16) -> (u32, u16) {
    let mask = size.mask();
    let msb = size.msb();
    let x_in = sr & X != 0;
    let mut v = value & mask;
    let mut x = x_in;
    let mut c = false;
    let mut overflow = false;

    for _ in 0..count {
        match (kind, left) {
            (ShiftKind::Arithmetic | ShiftKind::Logical, true) => {
                c = v & msb != 0;
                let next = (v << 1) & mask;
                // ASL sets V if the sign bit changes at any point.
                if kind == ShiftKind::Arithmetic && (next ^ v) & msb != 0 {
                    overflow = true;
                }
                v = next;
                x = c;
            }
            (ShiftKind::Arithmetic, false) => {
                c = v & 1 != 0;
                v = (v >> 1) | (v & msb);
                x = c;
            }
            (ShiftKind::Logical, false) => {
                c = v & 1 != 0;
                v >>= 1;
                x = c;
            }
            (ShiftKind::RotateExtend, true) => {
                c = v & msb != 0;
                v = ((v << 1) | u32::from(x)) & mask;
                x = c;
            }
            (ShiftKind::RotateExtend, false) => {
                c = v & 1 != 0;
                v = (v >> 1) | if x { msb } else { 0 };
                x = c;
            }
            (ShiftKind::Rotate, true) => {
                c = v & msb != 0;
                v = ((v << 1) | u32::from(c)) & mask;
            }
            (ShiftKind::Rotate, false) => {
                c = v & 1 != 0;
                v = (v >> 1) | if c { msb } else { 0 };
            }
        }
    }
    if count == 0 && kind == ShiftKind::RotateExtend {
        c = x_in;
    }

    let mut ccr = 0;
    if x {
        ccr |= X;
    }
    if v & msb != 0 {
        ccr |= N;
    }
    if v == 0 {
        ccr |= Z;
    }
    if overflow {
        ccr |= V;
    }
    if c {
        ccr |= C;
    }
    (v, ccr)
}

impl Cpu680x0 {
    // ================================================================
    // Register shifts
    // ================================================================
    //
    // Encoding: 1110 CCC D SS I TT RRR
    //   CCC = count (0 means 8) or count register when I = 1 (modulo 64)
    //   D = 1 left, 0 right   TT = 00 AS, 01 LS, 10 ROX, 11 RO

    pub(super) fn exec_shift_register(&mut self, _bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let count = if op & 0x0020 != 0 {
            self.regs.d[reg_x(op)] & 63
        } else {
            match reg_x(op) {
                0 => 8,
                n => n as u32,
            }
        };
        let dn = reg_y(op);
        let kind = ShiftKind::from_bits(op >> 3);
        let (result, ccr) = shift(kind, op & 0x0100 != 0, self.regs.d[dn], count, size, self.regs.sr());
        self.set_d(dn as u8, size, result);
        self.regs.set_ccr(ccr);
        self.add_cycles_000(2 * count);
        Ok(())
    }

    // ================================================================
    // Memory shifts: one bit, word only
    // ================================================================
    //
    // Encoding: 1110 0TT D 11 MMMRRR

    pub(super) fn exec_shift_memory(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let operand = self.ea_operand(bus, op, Size::Word)?;
        let value = self.read_operand(bus, operand, Size::Word)?;
        let kind = ShiftKind::from_bits(op >> 9);
        let (result, ccr) = shift(kind, op & 0x0100 != 0, value, 1, Size::Word, self.regs.sr());
        self.write_operand(bus, operand, Size::Word, result)?;
        self.regs.set_ccr(ccr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CpuModel;
    use crate::testing::Rig;

    #[test]
    fn asl_reports_sign_change_as_overflow() {
        let (r, ccr) = shift(ShiftKind::Arithmetic, true, 0x40, 1, Size::Byte, 0);
        assert_eq!(r, 0x80);
        assert_eq!(ccr, N | V);
        let (_, ccr) = shift(ShiftKind::Logical, true, 0x40, 1, Size::Byte, 0);
        assert_eq!(ccr, N);
    }

    #[test]
    fn asr_keeps_the_sign() {
        let (r, ccr) = shift(ShiftKind::Arithmetic, false, 0x8001, 1, Size::Word, 0);
        assert_eq!(r, 0xC000);
        assert_eq!(ccr, X | N | C);
    }

    #[test]
    fn zero_count_clears_carry_and_keeps_extend() {
        let (r, ccr) = shift(ShiftKind::Logical, true, 0x1234, 0, Size::Word, X | C);
        assert_eq!(r, 0x1234);
        assert_eq!(ccr, X);
        let (_, ccr) = shift(ShiftKind::RotateExtend, true, 0x1234, 0, Size::Word, X);
        assert_eq!(ccr, X | C);
    }

    #[test]
    fn rotates_wrap_bits_around() {
        let (r, ccr) = shift(ShiftKind::Rotate, true, 0x8000_0001, 1, Size::Long, 0);
        assert_eq!(r, 0x0000_0003);
        assert_eq!(ccr, C);
        let (r, _) = shift(ShiftKind::RotateExtend, false, 0x00, 1, Size::Byte, X);
        assert_eq!(r, 0x80);
    }

    #[test]
    fn register_count_is_modulo_64() {
        // LSL.L D1,D0
        let mut rig = Rig::new(CpuModel::M68000, &[0xE3A8]);
        rig.cpu.regs.d[0] = 1;
        rig.cpu.regs.d[1] = 65;
        let cycles = rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 2);
        assert_eq!(cycles, 8 + 2);
    }

    #[test]
    fn memory_shift_moves_one_bit() {
        // ROR.W (A0)
        let mut rig = Rig::new(CpuModel::M68000, &[0xE6D0]);
        rig.cpu.regs.a[0] = 0x6000;
        rig.poke_word(0x6000, 0x0001);
        rig.steps(1);
        assert_eq!(rig.peek_word(0x6000), 0x8000);
        assert_eq!(rig.cpu.regs.sr() & 0x1F, N | C);
    }
}
