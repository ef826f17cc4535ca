//! 68020 integer extensions: MULU.L/MULS.L, DIVU.L/DIVS.L, CHK2/CMP2,
//! CAS, PACK and UNPK.

use super::{reg_x, reg_y, sized};
use crate::addressing::AddrMode;
use crate::alu::{self, Size};
use crate::cpu::Cpu680x0;
use crate::ea::Operand;
use crate::exceptions::{CHK, Fault};
use crate::flags::{C, N, V, X, Z};
use crate::memory::HostBus;
use crate::table::SizeField;

impl Cpu680x0 {
    // ================================================================
    // MULU.L / MULS.L
    // ================================================================
    //
    // Extension: 0 LLL S Q 0000000 HHH
    //   LLL = Dl (low result / multiplicand), HHH = Dh (high result)
    //   S = signed, Q = 64-bit result in Dh:Dl

    pub(super) fn exec_mul_long(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let ext = self.fetch_word(bus)?;
        let src = self.read_ea(bus, op, Size::Long)?;
        let dl = usize::from((ext >> 12) & 7);
        let dh = usize::from(ext & 7);
        let signed = ext & 0x0800 != 0;
        let quad = ext & 0x0400 != 0;

        let product = if signed {
            (i64::from(self.regs.d[dl] as i32) * i64::from(src as i32)) as u64
        } else {
            u64::from(self.regs.d[dl]) * u64::from(src)
        };
        let low = product as u32;
        let mut sr = self.regs.sr() & X;
        if quad {
            self.regs.d[dh] = (product >> 32) as u32;
            self.regs.d[dl] = low;
            if product >> 63 != 0 {
                sr |= N;
            }
            if product == 0 {
                sr |= Z;
            }
        } else {
            self.regs.d[dl] = low;
            let overflow = if signed {
                product as i64 != i64::from(low as i32)
            } else {
                product >> 32 != 0
            };
            if low & 0x8000_0000 != 0 {
                sr |= N;
            }
            if low == 0 {
                sr |= Z;
            }
            if overflow {
                sr |= V;
            }
        }
        self.regs.set_ccr(sr);
        Ok(())
    }

    // ================================================================
    // DIVU.L / DIVS.L
    // ================================================================
    //
    // Extension: 0 QQQ S Q 0000000 RRR
    //   QQQ = Dq (quotient, low dividend), RRR = Dr (remainder, high
    //   dividend when Q = 1). With Dr = Dq only the quotient is stored.

    pub(super) fn exec_div_long(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let ext = self.fetch_word(bus)?;
        let divisor = self.read_ea(bus, op, Size::Long)?;
        if divisor == 0 {
            return Err(self.divide_by_zero());
        }
        let dq = usize::from((ext >> 12) & 7);
        let dr = usize::from(ext & 7);
        let signed = ext & 0x0800 != 0;
        let quad = ext & 0x0400 != 0;
        let sr = self.regs.sr() & X;

        let (quotient, remainder) = if signed {
            let dividend = if quad {
                i128::from(((u64::from(self.regs.d[dr]) << 32) | u64::from(self.regs.d[dq])) as i64)
            } else {
                i128::from(self.regs.d[dq] as i32)
            };
            let divisor = i128::from(divisor as i32);
            let q = dividend / divisor;
            if q < i128::from(i32::MIN) || q > i128::from(i32::MAX) {
                self.regs.set_ccr(sr | V);
                return Ok(());
            }
            (q as u32, (dividend % divisor) as u32)
        } else {
            let dividend = if quad {
                (u64::from(self.regs.d[dr]) << 32) | u64::from(self.regs.d[dq])
            } else {
                u64::from(self.regs.d[dq])
            };
            let q = dividend / u64::from(divisor);
            if q > u64::from(u32::MAX) {
                self.regs.set_ccr(sr | V);
                return Ok(());
            }
            (q as u32, (dividend % u64::from(divisor)) as u32)
        };

        if dr != dq {
            self.regs.d[dr] = remainder;
        }
        self.regs.d[dq] = quotient;
        let mut sr = sr;
        if quotient & 0x8000_0000 != 0 {
            sr |= N;
        }
        if quotient == 0 {
            sr |= Z;
        }
        self.regs.set_ccr(sr);
        Ok(())
    }

    // ================================================================
    // CHK2 / CMP2
    // ================================================================
    //
    // Encoding: 0000 0SS0 11 MMMRRR + extension A/D RRR C 000 0000 0000
    //   Lower bound at <ea>, upper bound right after it. C = 1 for CHK2,
    //   which traps through vector 6 when out of bounds. Against an
    //   address register the bounds are sign-extended to 32 bits.

    pub(super) fn exec_chk2(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Chk2, op);
        let ext = self.fetch_word(bus)?;
        let rn = usize::from(ext >> 12);
        let (lower_at, upper_at) = match self.ea_operand(bus, op, size)? {
            Operand::Memory(addr) => (
                Operand::Memory(addr),
                Operand::Memory(addr.wrapping_add(size.bytes())),
            ),
            Operand::Program(addr) => (
                Operand::Program(addr),
                Operand::Program(addr.wrapping_add(size.bytes())),
            ),
            _ => return Err(self.illegal()),
        };
        let lower = self.read_operand(bus, lower_at, size)?;
        let upper = self.read_operand(bus, upper_at, size)?;

        let (lower, upper, value, width) = if rn >= 8 {
            (
                size.sign_extend(lower),
                size.sign_extend(upper),
                self.regs.a[rn - 8],
                Size::Long,
            )
        } else {
            (lower, upper, self.regs.d[rn] & size.mask(), size)
        };

        let out_of_bounds = if lower <= upper {
            value < lower || value > upper
        } else {
            // The bounds straddle the sign boundary: compare signed.
            let s = |v: u32| width.sign_extend(v) as i32;
            s(value) < s(lower) || s(value) > s(upper)
        };
        let mut sr = self.regs.sr() & (X | N | V);
        if value == lower || value == upper {
            sr |= Z;
        }
        if out_of_bounds {
            sr |= C;
        }
        self.regs.set_ccr(sr);
        if out_of_bounds && ext & 0x0800 != 0 {
            return Err(self.trap(CHK));
        }
        Ok(())
    }

    // ================================================================
    // CAS
    // ================================================================
    //
    // Extension: 0000 000 UUU 000 CCC
    //   Compare Dc with <ea>; equal writes Du to <ea>, otherwise <ea> is
    //   loaded into Dc.

    pub(super) fn exec_cas(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Cas, op);
        let ext = self.fetch_word(bus)?;
        let dc = ext & 7;
        let du = usize::from((ext >> 6) & 7);
        let operand = self.ea_operand(bus, op, size)?;
        let dest = self.read_operand(bus, operand, size)?;
        let ccr = alu::cmp(self.regs.d[usize::from(dc)], dest, size);
        self.set_compare_flags(ccr);
        if ccr & Z != 0 {
            let update = self.regs.d[du];
            self.write_operand(bus, operand, size, update)
        } else {
            self.set_d(dc as u8, size, dest);
            Ok(())
        }
    }

    // ================================================================
    // PACK / UNPK
    // ================================================================
    //
    // Encoding: 1000 XXX 1TT 00M YYY + adjustment word
    //   TT = 10 PACK, 11 UNPK; M = 0 Dy,Dx  M = 1 -(Ay),-(Ax)

    pub(super) fn exec_pack(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let adjust = self.fetch_word(bus)?;
        let (x, y) = (reg_x(op) as u8, reg_y(op) as u8);
        if op & 0x0008 == 0 {
            let src = (self.regs.d[usize::from(y)] as u16).wrapping_add(adjust);
            let packed = ((src >> 4) & 0xF0) | (src & 0x0F);
            self.set_d(x, Size::Byte, u32::from(packed));
            return Ok(());
        }
        let low_at = self.resolve_ea(bus, AddrMode::AddrIndPreDec(y), Size::Byte)?;
        let low = self.read_operand(bus, low_at, Size::Byte)?;
        let high_at = self.resolve_ea(bus, AddrMode::AddrIndPreDec(y), Size::Byte)?;
        let high = self.read_operand(bus, high_at, Size::Byte)?;
        let src = ((high << 8) | low) as u16;
        let src = src.wrapping_add(adjust);
        let packed = ((src >> 4) & 0xF0) | (src & 0x0F);
        let dest = self.resolve_ea(bus, AddrMode::AddrIndPreDec(x), Size::Byte)?;
        self.write_operand(bus, dest, Size::Byte, u32::from(packed))
    }

    pub(super) fn exec_unpk(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let adjust = self.fetch_word(bus)?;
        let (x, y) = (reg_x(op) as u8, reg_y(op) as u8);
        let unpack = |byte: u32| {
            let byte = byte as u16;
            (((byte & 0xF0) << 4) | (byte & 0x0F)).wrapping_add(adjust)
        };
        if op & 0x0008 == 0 {
            let unpacked = unpack(self.regs.d[usize::from(y)]);
            self.set_d(x, Size::Word, u32::from(unpacked));
            return Ok(());
        }
        let src_at = self.resolve_ea(bus, AddrMode::AddrIndPreDec(y), Size::Byte)?;
        let unpacked = unpack(self.read_operand(bus, src_at, Size::Byte)?);
        let low_at = self.resolve_ea(bus, AddrMode::AddrIndPreDec(x), Size::Byte)?;
        self.write_operand(bus, low_at, Size::Byte, u32::from(unpacked & 0xFF))?;
        let high_at = self.resolve_ea(bus, AddrMode::AddrIndPreDec(x), Size::Byte)?;
        self.write_operand(bus, high_at, Size::Byte, u32::from(unpacked >> 8))
    }
}

#[cfg(test)]
mod tests {
    use crate::flags::{C, V, Z};
    use crate::model::CpuModel;
    use crate::testing::Rig;

    #[test]
    fn mulu_long_to_quad() {
        // MULU.L D1,D3:D0
        let mut rig = Rig::new(CpuModel::M68020, &[0x4C01, 0x0403]);
        rig.cpu.regs.d[0] = 0xFFFF_FFFF;
        rig.cpu.regs.d[1] = 2;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 0xFFFF_FFFE);
        assert_eq!(rig.cpu.regs.d[3], 1);
    }

    #[test]
    fn muls_long_overflow_sets_v() {
        // MULS.L D1,D0
        let mut rig = Rig::new(CpuModel::M68020, &[0x4C01, 0x0800]);
        rig.cpu.regs.d[0] = 0x4000_0000;
        rig.cpu.regs.d[1] = 4;
        rig.steps(1);
        assert_ne!(rig.cpu.regs.sr() & V, 0);
    }

    #[test]
    fn divs_long_with_remainder() {
        // DIVSL.L D1,D2:D0
        let mut rig = Rig::new(CpuModel::M68020, &[0x4C41, 0x0802]);
        rig.cpu.regs.d[0] = (-7i32) as u32;
        rig.cpu.regs.d[1] = 2;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0] as i32, -3);
        assert_eq!(rig.cpu.regs.d[2] as i32, -1);
    }

    #[test]
    fn divu_long_quad_dividend() {
        // DIVU.L D1,D2:D0 with D2:D0 = $1_0000_0000
        let mut rig = Rig::new(CpuModel::M68020, &[0x4C41, 0x0402]);
        rig.cpu.regs.d[2] = 1;
        rig.cpu.regs.d[0] = 0;
        rig.cpu.regs.d[1] = 0x10;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 0x1000_0000);
        assert_eq!(rig.cpu.regs.d[2], 0);
    }

    #[test]
    fn cmp2_flags_bounds() {
        // CMP2.B (A0),D0
        let mut rig = Rig::new(CpuModel::M68020, &[0x00D0, 0x0000]);
        rig.cpu.regs.a[0] = 0x6000;
        rig.poke_word(0x6000, 0x1020);
        rig.cpu.regs.d[0] = 0x20;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.sr() & (Z | C), Z);
    }

    #[test]
    fn chk2_traps_out_of_bounds() {
        // CHK2.W (A0),D0
        let mut rig = Rig::new(CpuModel::M68020, &[0x02D0, 0x0800]);
        rig.vector(6, 0x600);
        rig.cpu.regs.a[0] = 0x6000;
        rig.poke_long(0x6000, 0x0010_0020);
        rig.cpu.regs.d[0] = 0x30;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.pc, 0x600);
    }

    #[test]
    fn cas_swaps_on_match() {
        // CAS.L D1,D2,(A0)
        let mut rig = Rig::new(CpuModel::M68020, &[0x0ED0, 0x0081]);
        rig.cpu.regs.a[0] = 0x6000;
        rig.poke_long(0x6000, 5);
        rig.cpu.regs.d[1] = 5;
        rig.cpu.regs.d[2] = 9;
        rig.steps(1);
        assert_eq!(rig.peek_long(0x6000), 9);
        assert_ne!(rig.cpu.regs.sr() & Z, 0);
    }

    #[test]
    fn cas_loads_compare_register_on_mismatch() {
        let mut rig = Rig::new(CpuModel::M68020, &[0x0ED0, 0x0081]);
        rig.cpu.regs.a[0] = 0x6000;
        rig.poke_long(0x6000, 7);
        rig.cpu.regs.d[1] = 5;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[1], 7);
        assert_eq!(rig.peek_long(0x6000), 7);
    }

    #[test]
    fn pack_and_unpk_registers() {
        // PACK D0,D1,#0; UNPK D1,D2,#$3030
        let mut rig = Rig::new(CpuModel::M68020, &[0x8340, 0x0000, 0x8581, 0x3030]);
        rig.cpu.regs.d[0] = 0x0304;
        rig.steps(2);
        assert_eq!(rig.cpu.regs.d[1] & 0xFF, 0x34);
        assert_eq!(rig.cpu.regs.d[2] & 0xFFFF, 0x3334);
    }
}
