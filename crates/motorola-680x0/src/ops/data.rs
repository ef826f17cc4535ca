//! Data movement: MOVE, MOVEA, MOVEQ, LEA, PEA, CLR, TST, TAS, Scc, EXG,
//! SWAP, EXT, MOVEM, MOVEP, LINK, UNLK.

use super::{reg_x, reg_y, sized};
use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::cpu::Cpu680x0;
use crate::ea::Operand;
use crate::exceptions::Fault;
use crate::flags::{Status, X, Z};
use crate::memory::HostBus;
use crate::table::SizeField;

impl Cpu680x0 {
    // ================================================================
    // MOVE / MOVEA / MOVEQ
    // ================================================================
    //
    // Encoding: 00SS RRR MMM mmm rrr
    //   SS = 01 byte, 11 word, 10 long
    //   RRR MMM = destination register/mode (swapped), mmm rrr = source

    pub(super) fn exec_move(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Move, op);
        let value = self.read_ea(bus, op, size)?;
        let dest = AddrMode::from_move_dest(op).ok_or_else(|| self.illegal())?;
        let operand = self.resolve_ea(bus, dest, size)?;
        self.write_operand(bus, operand, size, value)?;
        self.set_logic_flags(value, size);
        Ok(())
    }

    /// Word sources are sign-extended; flags are untouched.
    pub(super) fn exec_movea(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::MoveAddr, op);
        let value = self.read_ea(bus, op, size)?;
        self.regs.a[reg_x(op)] = size.sign_extend(value);
        Ok(())
    }

    pub(super) fn exec_moveq(&mut self, _bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let value = op as u8 as i8 as u32;
        self.regs.d[reg_x(op)] = value;
        self.set_logic_flags(value, Size::Long);
        Ok(())
    }

    // ================================================================
    // LEA / PEA
    // ================================================================

    pub(super) fn exec_lea(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let addr = self.control_address(bus, op)?;
        self.regs.a[reg_x(op)] = addr;
        Ok(())
    }

    pub(super) fn exec_pea(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let addr = self.control_address(bus, op)?;
        self.push(bus, Size::Long, addr)
    }

    // ================================================================
    // CLR / TST / TAS / Scc
    // ================================================================

    /// The 68000 and 68010 read the destination before clearing it.
    pub(super) fn exec_clr(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let operand = self.ea_operand(bus, op, size)?;
        if !self.caps.long_ops && operand.address().is_some() {
            self.read_operand(bus, operand, size)?;
        }
        self.write_operand(bus, operand, size, 0)?;
        self.regs.set_ccr((self.regs.sr() & X) | Z);
        Ok(())
    }

    pub(super) fn exec_tst(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let value = self.read_ea(bus, op, size)?;
        self.set_logic_flags(value, size);
        Ok(())
    }

    /// Test and set: flags from the old byte, then bit 7 set.
    pub(super) fn exec_tas(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let operand = self.ea_operand(bus, op, Size::Byte)?;
        let value = self.read_operand(bus, operand, Size::Byte)?;
        self.set_logic_flags(value, Size::Byte);
        self.write_operand(bus, operand, Size::Byte, value | 0x80)
    }

    pub(super) fn exec_scc(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let taken = Status::condition(self.regs.sr(), (op >> 8) as u8);
        let operand = self.ea_operand(bus, op, Size::Byte)?;
        if taken && matches!(operand, Operand::DataReg(_)) {
            self.add_cycles_000(2);
        }
        self.write_operand(bus, operand, Size::Byte, if taken { 0xFF } else { 0 })
    }

    // ================================================================
    // EXG / SWAP / EXT / EXTB
    // ================================================================
    //
    // EXG opmode (bits 7-3): 01000 Dx,Dy  01001 Ax,Ay  10001 Dx,Ay

    pub(super) fn exec_exg(&mut self, _bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let (x, y) = (reg_x(op), reg_y(op));
        match (op >> 3) & 0x1F {
            0x08 => self.regs.d.swap(x, y),
            0x09 => self.regs.a.swap(x, y),
            _ => std::mem::swap(&mut self.regs.d[x], &mut self.regs.a[y]),
        }
        Ok(())
    }

    pub(super) fn exec_swap(&mut self, _bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let r = reg_y(op);
        let value = self.regs.d[r].rotate_left(16);
        self.regs.d[r] = value;
        self.set_logic_flags(value, Size::Long);
        Ok(())
    }

    /// EXT.W sign-extends byte to word, EXT.L word to long.
    pub(super) fn exec_ext(&mut self, _bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let r = reg_y(op);
        let size = sized(SizeField::Bit6, op);
        let value = match size {
            Size::Long => self.regs.d[r] as u16 as i16 as u32,
            _ => self.regs.d[r] as u8 as i8 as u16 as u32,
        };
        self.set_d(r as u8, size, value);
        self.set_logic_flags(value, size);
        Ok(())
    }

    pub(super) fn exec_extb(&mut self, _bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let r = reg_y(op);
        let value = self.regs.d[r] as u8 as i8 as u32;
        self.regs.d[r] = value;
        self.set_logic_flags(value, Size::Long);
        Ok(())
    }

    // ================================================================
    // MOVEM
    // ================================================================
    //
    // Encoding: 0100 1D00 1S MMMRRR + register mask
    //   D = 0 registers to memory, 1 memory to registers
    //   S = 0 word, 1 long
    // Mask bit 0 is D0 and bit 15 is A7, except for -(An) where the order
    // is reversed (bit 0 is A7).

    fn movem_register_cycles(&mut self, count: u32, size: Size) {
        let each = if self.caps.long_ops { 4 } else { size.bytes() * 2 };
        self.extra_cycles += count * each;
    }

    pub(super) fn exec_movem_store(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Bit6, op);
        let mask = self.fetch_word(bus)?;
        let mode = self.ea_mode(op)?;
        let count = mask.count_ones();
        self.movem_register_cycles(count, size);

        if let AddrMode::AddrIndPreDec(r) = mode {
            let r = usize::from(r);
            let start = self.regs.a[r];
            let end = start.wrapping_sub(count * size.bytes());
            let mut addr = start;
            for bit in 0..16 {
                if mask & (1 << bit) == 0 {
                    continue;
                }
                let reg = 15 - bit;
                addr = addr.wrapping_sub(size.bytes());
                // The base register stores its initial value on the 68000
                // and 68010, its final value on later models.
                let value = if reg == 8 + r && self.caps.long_ops {
                    end
                } else {
                    self.regs.da(reg)
                };
                self.write(bus, addr, size, value)?;
            }
            self.regs.a[r] = end;
            return Ok(());
        }

        let operand = self.resolve_ea(bus, mode, size)?;
        let mut addr = operand.address().ok_or_else(|| self.illegal())?;
        for reg in 0..16 {
            if mask & (1 << reg) != 0 {
                let value = self.regs.da(reg);
                self.write(bus, addr, size, value)?;
                addr = addr.wrapping_add(size.bytes());
            }
        }
        Ok(())
    }

    /// Words are sign-extended into the whole register, data registers
    /// included.
    pub(super) fn exec_movem_load(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Bit6, op);
        let mask = self.fetch_word(bus)?;
        let mode = self.ea_mode(op)?;
        self.movem_register_cycles(mask.count_ones(), size);

        let (mut addr, program, post_inc) = match mode {
            AddrMode::AddrIndPostInc(r) => (self.regs.a[usize::from(r)], false, Some(usize::from(r))),
            _ => match self.resolve_ea(bus, mode, size)? {
                Operand::Memory(addr) => (addr, false, None),
                Operand::Program(addr) => (addr, true, None),
                _ => return Err(self.illegal()),
            },
        };

        for reg in 0..16 {
            if mask & (1 << reg) == 0 {
                continue;
            }
            let at = if program { Operand::Program(addr) } else { Operand::Memory(addr) };
            let value = size.sign_extend(self.read_operand(bus, at, size)?);
            if reg < 8 {
                self.regs.d[reg] = value;
            } else {
                self.regs.a[reg - 8] = value;
            }
            addr = addr.wrapping_add(size.bytes());
        }
        if let Some(r) = post_inc {
            self.regs.a[r] = addr;
        }
        Ok(())
    }

    // ================================================================
    // MOVEP
    // ================================================================
    //
    // Encoding: 0000 DDD 1OO 001 AAA + displacement
    //   OO = 00 word to Dn, 01 long to Dn, 10 word to memory, 11 long to memory
    // Bytes go to every other address starting at (d16,An).

    pub(super) fn exec_movep(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Bit6, op);
        let dn = reg_x(op);
        let disp = self.fetch_word(bus)? as i16 as u32;
        let base = self.regs.a[reg_y(op)].wrapping_add(disp);
        let bytes = size.bytes();

        if op & 0x0080 != 0 {
            let value = self.regs.d[dn];
            for i in 0..bytes {
                let shift = 8 * (bytes - 1 - i);
                self.write(bus, base.wrapping_add(2 * i), Size::Byte, value >> shift)?;
            }
        } else {
            let mut value = 0u32;
            for i in 0..bytes {
                value = (value << 8) | self.read(bus, base.wrapping_add(2 * i), Size::Byte)?;
            }
            self.set_d(dn as u8, size, value);
        }
        Ok(())
    }

    // ================================================================
    // LINK / UNLK
    // ================================================================

    fn link(&mut self, bus: &mut dyn HostBus, r: usize, disp: u32) -> Result<(), Fault> {
        let sp = self.regs.a[7].wrapping_sub(4);
        let saved = if r == 7 { sp } else { self.regs.a[r] };
        self.write(bus, sp, Size::Long, saved)?;
        self.regs.a[7] = sp;
        self.regs.a[r] = sp;
        self.regs.a[7] = self.regs.a[7].wrapping_add(disp);
        Ok(())
    }

    pub(super) fn exec_link(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let disp = self.fetch_word(bus)? as i16 as u32;
        self.link(bus, reg_y(op), disp)
    }

    pub(super) fn exec_link_long(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let disp = self.fetch_long(bus)?;
        self.link(bus, reg_y(op), disp)
    }

    pub(super) fn exec_unlk(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let r = reg_y(op);
        let frame = self.regs.a[r];
        let saved = self.read(bus, frame, Size::Long)?;
        self.regs.a[7] = frame.wrapping_add(4);
        self.regs.a[r] = saved;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::flags::{N, Z};
    use crate::model::CpuModel;
    use crate::testing::Rig;

    #[test]
    fn moveq_sign_extends_and_sets_flags() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x70FF]); // MOVEQ #-1,D0
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 0xFFFF_FFFF);
        assert_ne!(rig.cpu.regs.sr() & N, 0);
    }

    #[test]
    fn movea_word_sign_extends() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x3041]); // MOVEA.W D1,A0
        rig.cpu.regs.d[1] = 0x8000;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.a[0], 0xFFFF_8000);
    }

    #[test]
    fn clr_keeps_upper_register_bits() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x4202]); // CLR.B D2
        rig.cpu.regs.d[2] = 0x1234_5678;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[2], 0x1234_5600);
        assert_ne!(rig.cpu.regs.sr() & Z, 0);
    }

    #[test]
    fn movem_predec_then_postinc_round_trips() {
        // MOVEM.L D0-D1/A0,-(A7); MOVEM.L (A7)+,D2-D3/A1
        let mut rig = Rig::new(CpuModel::M68000, &[0x48E7, 0xC080, 0x4CDF, 0x020C]);
        rig.cpu.regs.d[0] = 0x1111_1111;
        rig.cpu.regs.d[1] = 0x2222_2222;
        rig.cpu.regs.a[0] = 0x3333_3333;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.a[7], 0x8000 - 12);
        assert_eq!(rig.peek_long(0x8000 - 12), 0x1111_1111);
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[2], 0x1111_1111);
        assert_eq!(rig.cpu.regs.d[3], 0x2222_2222);
        assert_eq!(rig.cpu.regs.a[1], 0x3333_3333);
        assert_eq!(rig.cpu.regs.a[7], 0x8000);
    }

    #[test]
    fn movem_word_load_sign_extends_data_registers() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x4C90, 0x0001]); // MOVEM.W (A0),D0
        rig.cpu.regs.a[0] = 0x7000;
        rig.cpu.regs.d[0] = 0x1234_5678;
        rig.poke_word(0x7000, 0xFFFE);
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 0xFFFF_FFFE);
    }

    #[test]
    fn movem_store_cost_grows_with_the_list() {
        // MOVEM.L D0-D7,-(A7): 8 + 8 per register
        let mut rig = Rig::new(CpuModel::M68000, &[0x48E7, 0xFF00]);
        assert_eq!(rig.steps(1), 8 + 8 * 8);
    }

    #[test]
    fn link_and_unlk_restore_the_frame() {
        // LINK A6,#-8; UNLK A6
        let mut rig = Rig::new(CpuModel::M68000, &[0x4E56, 0xFFF8, 0x4E5E]);
        rig.cpu.regs.a[6] = 0xCAFE;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.a[6], 0x7FFC);
        assert_eq!(rig.cpu.regs.a[7], 0x7FF4);
        assert_eq!(rig.peek_long(0x7FFC), 0xCAFE);
        rig.steps(1);
        assert_eq!(rig.cpu.regs.a[6], 0xCAFE);
        assert_eq!(rig.cpu.regs.a[7], 0x8000);
    }

    #[test]
    fn movep_spreads_bytes_over_even_addresses() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x01C8, 0x0000]); // MOVEP.L D0,0(A0)
        rig.cpu.regs.a[0] = 0x6000;
        rig.cpu.regs.d[0] = 0xAABB_CCDD;
        rig.steps(1);
        assert_eq!(rig.peek_long(0x6000), 0xAA00_BB00);
        assert_eq!(rig.peek_long(0x6004), 0xCC00_DD00);
    }

    #[test]
    fn exg_data_and_address() {
        let mut rig = Rig::new(CpuModel::M68000, &[0xC38A]); // EXG D1,A2
        rig.cpu.regs.d[1] = 1;
        rig.cpu.regs.a[2] = 2;
        rig.steps(1);
        assert_eq!((rig.cpu.regs.d[1], rig.cpu.regs.a[2]), (2, 1));
    }

    #[test]
    fn tas_sets_bit_seven_after_testing() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x4AD0]); // TAS (A0)
        rig.cpu.regs.a[0] = 0x6000;
        rig.steps(1);
        assert_eq!(rig.peek_byte(0x6000), 0x80);
        assert_ne!(rig.cpu.regs.sr() & Z, 0);
    }
}
