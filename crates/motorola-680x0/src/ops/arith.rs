//! Arithmetic: ADD, SUB, CMP and their A/I/Q/X/M forms, NEG, NEGX, MULU,
//! MULS, DIVU, DIVS, ABCD, SBCD, NBCD, CHK.

use super::{reg_x, reg_y, sized};
use crate::addressing::AddrMode;
use crate::alu::{self, Size};
use crate::cpu::Cpu680x0;
use crate::ea::Operand;
use crate::exceptions::{CHK, Fault, ZERO_DIVIDE};
use crate::flags::{C, N, Status, V, X, Z};
use crate::memory::HostBus;
use crate::table::SizeField;
use crate::timing;

/// Binary operations that share the `<ea>,Dn` / `Dn,<ea>` / `#imm,<ea>`
/// shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AluOp {
    Add,
    Sub,
    And,
    Or,
    Eor,
}

impl Cpu680x0 {
    /// `dst op src`: masked result and the full new CCR.
    fn alu(&self, kind: AluOp, src: u32, dst: u32, size: Size) -> (u32, u16) {
        let logical = |value: u32| {
            let value = value & size.mask();
            (value, Status::logical(self.regs.sr(), value, size))
        };
        match kind {
            AluOp::Add => alu::add(src, dst, false, size),
            AluOp::Sub => alu::sub(src, dst, false, size),
            AluOp::And => logical(dst & src),
            AluOp::Or => logical(dst | src),
            AluOp::Eor => logical(dst ^ src),
        }
    }

    /// Extended-arithmetic CCR: Z is only ever cleared.
    fn sticky_z(&self, ccr: u16, result: u32) -> u16 {
        if result == 0 {
            (ccr & !Z) | (self.regs.sr() & Z)
        } else {
            ccr & !Z
        }
    }

    /// Compare flags keep X.
    pub(super) fn set_compare_flags(&mut self, ccr: u16) {
        self.regs.set_ccr((self.regs.sr() & X) | ccr);
    }

    // ================================================================
    // ADD / SUB / AND / OR / EOR: shared shapes
    // ================================================================
    //
    // Encoding: TTTT RRR OOO MMMRRR
    //   OOO = 000-010 <ea> op Dn -> Dn (byte, word, long)
    //         100-110 Dn op <ea> -> <ea>

    pub(super) fn alu_to_register(
        &mut self,
        bus: &mut dyn HostBus,
        op: u16,
        kind: AluOp,
    ) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let src = self.read_ea(bus, op, size)?;
        let dn = reg_x(op);
        let (result, ccr) = self.alu(kind, src, self.regs.d[dn], size);
        self.set_d(dn as u8, size, result);
        self.regs.set_ccr(ccr);
        Ok(())
    }

    pub(super) fn alu_to_memory(
        &mut self,
        bus: &mut dyn HostBus,
        op: u16,
        kind: AluOp,
    ) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let operand = self.ea_operand(bus, op, size)?;
        let dst = self.read_operand(bus, operand, size)?;
        let (result, ccr) = self.alu(kind, self.regs.d[reg_x(op)], dst, size);
        self.write_operand(bus, operand, size, result)?;
        self.regs.set_ccr(ccr);
        Ok(())
    }

    /// The immediate comes before the destination's extension words.
    pub(super) fn alu_immediate(
        &mut self,
        bus: &mut dyn HostBus,
        op: u16,
        kind: AluOp,
    ) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let imm = self.fetch_imm(bus, size)?;
        let operand = self.ea_operand(bus, op, size)?;
        let dst = self.read_operand(bus, operand, size)?;
        let (result, ccr) = self.alu(kind, imm, dst, size);
        self.write_operand(bus, operand, size, result)?;
        self.regs.set_ccr(ccr);
        Ok(())
    }

    pub(super) fn exec_add(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_to_register(bus, op, AluOp::Add)
    }

    pub(super) fn exec_add_to_ea(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_to_memory(bus, op, AluOp::Add)
    }

    pub(super) fn exec_sub(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_to_register(bus, op, AluOp::Sub)
    }

    pub(super) fn exec_sub_to_ea(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_to_memory(bus, op, AluOp::Sub)
    }

    pub(super) fn exec_addi(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_immediate(bus, op, AluOp::Add)
    }

    pub(super) fn exec_subi(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_immediate(bus, op, AluOp::Sub)
    }

    // ================================================================
    // ADDA / SUBA / ADDQ / SUBQ
    // ================================================================

    fn address_arith(&mut self, bus: &mut dyn HostBus, op: u16, add: bool) -> Result<(), Fault> {
        let size = sized(SizeField::Bit8, op);
        let src = size.sign_extend(self.read_ea(bus, op, size)?);
        let an = &mut self.regs.a[reg_x(op)];
        *an = if add { an.wrapping_add(src) } else { an.wrapping_sub(src) };
        Ok(())
    }

    pub(super) fn exec_adda(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.address_arith(bus, op, true)
    }

    pub(super) fn exec_suba(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.address_arith(bus, op, false)
    }

    /// Data 1-8 in bits 11-9 (0 means 8). On an address register the whole
    /// register changes and the flags do not.
    fn quick(&mut self, bus: &mut dyn HostBus, op: u16, kind: AluOp) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let data = match reg_x(op) {
            0 => 8,
            n => n as u32,
        };
        let operand = self.ea_operand(bus, op, size)?;
        if let Operand::AddrReg(r) = operand {
            if size == Size::Word {
                self.add_cycles_000(4);
            }
            let an = &mut self.regs.a[usize::from(r)];
            *an = if kind == AluOp::Add { an.wrapping_add(data) } else { an.wrapping_sub(data) };
            return Ok(());
        }
        let dst = self.read_operand(bus, operand, size)?;
        let (result, ccr) = self.alu(kind, data, dst, size);
        self.write_operand(bus, operand, size, result)?;
        self.regs.set_ccr(ccr);
        Ok(())
    }

    pub(super) fn exec_addq(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.quick(bus, op, AluOp::Add)
    }

    pub(super) fn exec_subq(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.quick(bus, op, AluOp::Sub)
    }

    // ================================================================
    // ADDX / SUBX
    // ================================================================
    //
    // Encoding: 1T01 XXX 1SS 00M YYY
    //   M = 0 Dy,Dx   M = 1 -(Ay),-(Ax)

    fn extended(&mut self, bus: &mut dyn HostBus, op: u16, add: bool) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let (src_mode, dst_mode) = if op & 0x0008 != 0 {
            let cost = if size == Size::Long { 22 } else { 14 };
            self.add_cycles_000(cost);
            (
                AddrMode::AddrIndPreDec(reg_y(op) as u8),
                AddrMode::AddrIndPreDec(reg_x(op) as u8),
            )
        } else {
            (AddrMode::DataReg(reg_y(op) as u8), AddrMode::DataReg(reg_x(op) as u8))
        };
        let src_operand = self.resolve_ea(bus, src_mode, size)?;
        let src = self.read_operand(bus, src_operand, size)?;
        let dst_operand = self.resolve_ea(bus, dst_mode, size)?;
        let dst = self.read_operand(bus, dst_operand, size)?;

        let x = self.regs.sr() & X != 0;
        let (result, ccr) = if add {
            alu::add(src, dst, x, size)
        } else {
            alu::sub(src, dst, x, size)
        };
        self.write_operand(bus, dst_operand, size, result)?;
        let ccr = self.sticky_z(ccr, result);
        self.regs.set_ccr(ccr);
        Ok(())
    }

    pub(super) fn exec_addx(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.extended(bus, op, true)
    }

    pub(super) fn exec_subx(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.extended(bus, op, false)
    }

    // ================================================================
    // CMP / CMPA / CMPI / CMPM
    // ================================================================

    pub(super) fn exec_cmp(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let src = self.read_ea(bus, op, size)?;
        let ccr = alu::cmp(src, self.regs.d[reg_x(op)], size);
        self.set_compare_flags(ccr);
        Ok(())
    }

    /// Word sources are sign-extended and compared as longs.
    pub(super) fn exec_cmpa(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Bit8, op);
        let src = size.sign_extend(self.read_ea(bus, op, size)?);
        let ccr = alu::cmp(src, self.regs.a[reg_x(op)], Size::Long);
        self.set_compare_flags(ccr);
        Ok(())
    }

    pub(super) fn exec_cmpi(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let imm = self.fetch_imm(bus, size)?;
        let dst = self.read_ea(bus, op, size)?;
        self.set_compare_flags(alu::cmp(imm, dst, size));
        Ok(())
    }

    /// CMPM (Ay)+,(Ax)+
    pub(super) fn exec_cmpm(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let src_operand = self.resolve_ea(bus, AddrMode::AddrIndPostInc(reg_y(op) as u8), size)?;
        let src = self.read_operand(bus, src_operand, size)?;
        let dst_operand = self.resolve_ea(bus, AddrMode::AddrIndPostInc(reg_x(op) as u8), size)?;
        let dst = self.read_operand(bus, dst_operand, size)?;
        self.set_compare_flags(alu::cmp(src, dst, size));
        Ok(())
    }

    // ================================================================
    // NEG / NEGX
    // ================================================================

    pub(super) fn exec_neg(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let operand = self.ea_operand(bus, op, size)?;
        let dst = self.read_operand(bus, operand, size)?;
        let (result, ccr) = alu::sub(dst, 0, false, size);
        self.write_operand(bus, operand, size, result)?;
        self.regs.set_ccr(ccr);
        Ok(())
    }

    pub(super) fn exec_negx(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let operand = self.ea_operand(bus, op, size)?;
        let dst = self.read_operand(bus, operand, size)?;
        let x = self.regs.sr() & X != 0;
        let (result, ccr) = alu::sub(dst, 0, x, size);
        self.write_operand(bus, operand, size, result)?;
        let ccr = self.sticky_z(ccr, result);
        self.regs.set_ccr(ccr);
        Ok(())
    }

    // ================================================================
    // MULU / MULS (16x16 -> 32)
    // ================================================================

    pub(super) fn exec_mulu(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let src = self.read_ea(bus, op, Size::Word)? as u16;
        let dn = reg_x(op);
        let product = u32::from(self.regs.d[dn] as u16) * u32::from(src);
        self.regs.d[dn] = product;
        self.set_logic_flags(product, Size::Long);
        if !self.caps.long_ops {
            self.extra_cycles += timing::mulu_cycles(src);
        }
        Ok(())
    }

    pub(super) fn exec_muls(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let src = self.read_ea(bus, op, Size::Word)? as u16;
        let dn = reg_x(op);
        let product = i32::from(self.regs.d[dn] as i16) * i32::from(src as i16);
        self.regs.d[dn] = product as u32;
        self.set_logic_flags(product as u32, Size::Long);
        if !self.caps.long_ops {
            self.extra_cycles += timing::muls_cycles(src);
        }
        Ok(())
    }

    // ================================================================
    // DIVU / DIVS (32/16 -> 16r:16q)
    // ================================================================
    //
    // Overflow sets V and leaves the destination untouched. Division by
    // zero clears C and takes vector 5.

    pub(super) fn divide_by_zero(&mut self) -> Fault {
        self.regs.set_ccr(self.regs.sr() & !C);
        self.trap(ZERO_DIVIDE)
    }

    pub(super) fn exec_divu(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let divisor = self.read_ea(bus, op, Size::Word)? as u16;
        if divisor == 0 {
            return Err(self.divide_by_zero());
        }
        let dn = reg_x(op);
        let dividend = self.regs.d[dn];
        if !self.caps.long_ops {
            self.extra_cycles += timing::divu_cycles(dividend, divisor);
        }
        let quotient = dividend / u32::from(divisor);
        let remainder = dividend % u32::from(divisor);
        let sr = self.regs.sr() & !C;
        if quotient > 0xFFFF {
            self.regs.set_ccr(sr | V);
            return Ok(());
        }
        self.regs.d[dn] = (remainder << 16) | quotient;
        self.regs.set_ccr(Status::logical(sr, quotient, Size::Word));
        Ok(())
    }

    pub(super) fn exec_divs(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let divisor = self.read_ea(bus, op, Size::Word)? as u16 as i16;
        if divisor == 0 {
            return Err(self.divide_by_zero());
        }
        let dn = reg_x(op);
        let dividend = self.regs.d[dn] as i32;
        if !self.caps.long_ops {
            self.extra_cycles += timing::divs_cycles(dividend, divisor);
        }
        let quotient = i64::from(dividend) / i64::from(divisor);
        let remainder = i64::from(dividend) % i64::from(divisor);
        let sr = self.regs.sr() & !C;
        if !(i64::from(i16::MIN)..=i64::from(i16::MAX)).contains(&quotient) {
            self.regs.set_ccr(sr | V);
            return Ok(());
        }
        let quotient = quotient as u32 & 0xFFFF;
        self.regs.d[dn] = ((remainder as u32) << 16) | quotient;
        self.regs.set_ccr(Status::logical(sr, quotient, Size::Word));
        Ok(())
    }

    // ================================================================
    // ABCD / SBCD / NBCD
    // ================================================================
    //
    // Encoding: 1T00 XXX 1 0000 M YYY   (T = 1 ABCD, 0 SBCD)

    fn set_bcd_flags(&mut self, result: u8, carry: bool, overflow: bool) {
        let mut sr = self.regs.sr() & !(X | N | V | C);
        if carry {
            sr |= X | C;
        }
        if overflow {
            sr |= V;
        }
        if result & 0x80 != 0 {
            sr |= N;
        }
        if result != 0 {
            sr &= !Z;
        }
        self.regs.set_ccr(sr);
    }

    fn bcd(&mut self, bus: &mut dyn HostBus, op: u16, add: bool) -> Result<(), Fault> {
        let (src_mode, dst_mode) = if op & 0x0008 != 0 {
            self.add_cycles_000(12);
            (
                AddrMode::AddrIndPreDec(reg_y(op) as u8),
                AddrMode::AddrIndPreDec(reg_x(op) as u8),
            )
        } else {
            (AddrMode::DataReg(reg_y(op) as u8), AddrMode::DataReg(reg_x(op) as u8))
        };
        let src_operand = self.resolve_ea(bus, src_mode, Size::Byte)?;
        let src = self.read_operand(bus, src_operand, Size::Byte)? as u8;
        let dst_operand = self.resolve_ea(bus, dst_mode, Size::Byte)?;
        let dst = self.read_operand(bus, dst_operand, Size::Byte)? as u8;

        let x = self.regs.sr() & X != 0;
        let (result, carry, overflow) = if add {
            alu::bcd_add(src, dst, x)
        } else {
            alu::bcd_sub(src, dst, x)
        };
        self.write_operand(bus, dst_operand, Size::Byte, u32::from(result))?;
        self.set_bcd_flags(result, carry, overflow);
        Ok(())
    }

    pub(super) fn exec_abcd(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.bcd(bus, op, true)
    }

    pub(super) fn exec_sbcd(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.bcd(bus, op, false)
    }

    pub(super) fn exec_nbcd(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let operand = self.ea_operand(bus, op, Size::Byte)?;
        let dst = self.read_operand(bus, operand, Size::Byte)? as u8;
        let x = self.regs.sr() & X != 0;
        let (result, carry, overflow) = alu::bcd_sub(dst, 0, x);
        self.write_operand(bus, operand, Size::Byte, u32::from(result))?;
        self.set_bcd_flags(result, carry, overflow);
        Ok(())
    }

    // ================================================================
    // CHK
    // ================================================================
    //
    // Traps (vector 6) when Dn < 0 (N set) or Dn > bound (N clear).

    pub(super) fn exec_chk(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = if op & 0x0080 != 0 { Size::Word } else { Size::Long };
        let bound = size.sign_extend(self.read_ea(bus, op, size)?) as i32;
        let value = size.sign_extend(self.regs.d[reg_x(op)]) as i32;
        let sr = Status::set_if(self.regs.sr(), Z, value == 0) & !(V | C);
        if value < 0 {
            self.regs.set_ccr(sr | N);
            return Err(self.trap(CHK));
        }
        if value > bound {
            self.regs.set_ccr(sr & !N);
            return Err(self.trap(CHK));
        }
        self.regs.set_ccr(sr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::flags::{C, N, V, X, Z};
    use crate::model::CpuModel;
    use crate::testing::Rig;

    fn ccr(rig: &Rig) -> u16 {
        rig.cpu.regs.sr() & 0x1F
    }

    #[test]
    fn add_sets_carry_and_extend() {
        let mut rig = Rig::new(CpuModel::M68000, &[0xD001]); // ADD.B D1,D0
        rig.cpu.regs.d[0] = 0xF0;
        rig.cpu.regs.d[1] = 0x20;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 0x10);
        assert_eq!(ccr(&rig), X | C);
    }

    #[test]
    fn sub_to_memory_updates_the_destination() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x9350]); // SUB.W D1,(A0)
        rig.cpu.regs.a[0] = 0x6000;
        rig.cpu.regs.d[1] = 1;
        rig.poke_word(0x6000, 0);
        rig.steps(1);
        assert_eq!(rig.peek_word(0x6000), 0xFFFF);
        assert_eq!(ccr(&rig), X | N | C);
    }

    #[test]
    fn addq_to_address_register_skips_flags() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x5049]); // ADDQ.W #8,A1
        rig.cpu.regs.a[1] = 0xFFFF_FFFC;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.a[1], 4);
        assert_eq!(ccr(&rig), 0);
    }

    #[test]
    fn addx_only_clears_z() {
        let mut rig = Rig::new(CpuModel::M68000, &[0xD181, 0xD181]); // ADDX.L D1,D0 twice
        rig.cpu.regs.set_ccr(Z);
        rig.steps(1);
        assert_eq!(ccr(&rig), Z);
        rig.cpu.regs.d[1] = 1;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 1);
        assert_eq!(ccr(&rig), 0);
    }

    #[test]
    fn cmp_leaves_extend_alone() {
        let mut rig = Rig::new(CpuModel::M68000, &[0xB081]); // CMP.L D1,D0
        rig.cpu.regs.set_ccr(X);
        rig.cpu.regs.d[0] = 5;
        rig.cpu.regs.d[1] = 5;
        rig.steps(1);
        assert_eq!(ccr(&rig), X | Z);
    }

    #[test]
    fn cmpa_word_compares_sign_extended() {
        let mut rig = Rig::new(CpuModel::M68000, &[0xB0C1]); // CMPA.W D1,A0
        rig.cpu.regs.a[0] = 0xFFFF_FFFF;
        rig.cpu.regs.d[1] = 0xFFFF;
        rig.steps(1);
        assert_eq!(ccr(&rig), Z);
    }

    #[test]
    fn mulu_timing_counts_set_bits() {
        let mut rig = Rig::new(CpuModel::M68000, &[0xC0C1]); // MULU.W D1,D0
        rig.cpu.regs.d[0] = 0x0002;
        rig.cpu.regs.d[1] = 0x0003;
        let cycles = rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 6);
        assert_eq!(cycles, 38 + 2 * 2);
    }

    #[test]
    fn muls_is_signed() {
        let mut rig = Rig::new(CpuModel::M68000, &[0xC1C1]); // MULS.W D1,D0
        rig.cpu.regs.d[0] = 0xFFFF;
        rig.cpu.regs.d[1] = 0x0002;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 0xFFFF_FFFE);
        assert_eq!(ccr(&rig), N);
    }

    #[test]
    fn divu_packs_remainder_and_quotient() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x80C1]); // DIVU.W D1,D0
        rig.cpu.regs.d[0] = 100;
        rig.cpu.regs.d[1] = 7;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], (2 << 16) | 14);
    }

    #[test]
    fn divu_overflow_keeps_destination() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x80C1]);
        rig.cpu.regs.d[0] = 0x0010_0000;
        rig.cpu.regs.d[1] = 1;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 0x0010_0000);
        assert_ne!(ccr(&rig) & V, 0);
    }

    #[test]
    fn divs_remainder_follows_the_dividend() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x81C1]); // DIVS.W D1,D0
        rig.cpu.regs.d[0] = (-7i32) as u32;
        rig.cpu.regs.d[1] = 2;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 0xFFFF_FFFD);
    }

    #[test]
    pub(super) fn divide_by_zero_traps_past_the_instruction() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x80C1, 0x4E71]);
        rig.vector(5, 0x600);
        rig.steps(1);
        assert_eq!(rig.cpu.regs.pc, 0x600);
        assert_eq!(rig.peek_long(0x8000 - 4), 0x402);
    }

    #[test]
    fn abcd_adds_decimal() {
        let mut rig = Rig::new(CpuModel::M68000, &[0xC101]); // ABCD D1,D0
        rig.cpu.regs.d[0] = 0x45;
        rig.cpu.regs.d[1] = 0x38;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 0x83);
    }

    #[test]
    fn chk_out_of_bounds_traps() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x4181]); // CHK.W D1,D0
        rig.vector(6, 0x600);
        rig.cpu.regs.d[0] = 10;
        rig.cpu.regs.d[1] = 5;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.pc, 0x600);
        assert_eq!(ccr(&rig) & N, 0);
    }
}
