//! Single-bit operations (BTST, BCHG, BCLR, BSET) and the 68020 bit field
//! instructions.
//!
//! Bit numbers are taken modulo 32 on a data register and modulo 8 on a
//! memory byte. Bit field offsets count from the most significant bit; in
//! memory the offset is signed and may reach outside the byte at the
//! effective address.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::cpu::Cpu680x0;
use crate::ea::Operand;
use crate::exceptions::Fault;
use crate::flags::{Status, C, N, V, Z};
use crate::memory::HostBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BitOp {
    Test,
    Change,
    Clear,
    Set,
}

impl Cpu680x0 {
    fn bit_op(&mut self, bus: &mut dyn HostBus, op: u16, bit: u32, kind: BitOp) -> Result<(), Fault> {
        let in_register = matches!(AddrMode::from_ea_field(op), Some(AddrMode::DataReg(_)));
        let (size, bit) = if in_register {
            (Size::Long, bit & 31)
        } else {
            (Size::Byte, bit & 7)
        };
        let operand = self.ea_operand(bus, op, size)?;
        let value = self.read_operand(bus, operand, size)?;
        let mask = 1u32 << bit;
        self.regs.set_ccr(Status::set_if(self.regs.sr(), Z, value & mask == 0));
        let result = match kind {
            BitOp::Test => return Ok(()),
            BitOp::Change => value ^ mask,
            BitOp::Clear => value & !mask,
            BitOp::Set => value | mask,
        };
        if in_register && bit >= 16 {
            self.add_cycles_000(2);
        }
        self.write_operand(bus, operand, size, result)
    }

    // ================================================================
    // Dynamic: bit number in Dn (bits 11-9)
    // ================================================================

    fn bit_dynamic(&mut self, bus: &mut dyn HostBus, op: u16, kind: BitOp) -> Result<(), Fault> {
        let bit = self.regs.d[super::reg_x(op)];
        self.bit_op(bus, op, bit, kind)
    }

    pub(super) fn exec_btst_dyn(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.bit_dynamic(bus, op, BitOp::Test)
    }

    pub(super) fn exec_bchg_dyn(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.bit_dynamic(bus, op, BitOp::Change)
    }

    pub(super) fn exec_bclr_dyn(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.bit_dynamic(bus, op, BitOp::Clear)
    }

    pub(super) fn exec_bset_dyn(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.bit_dynamic(bus, op, BitOp::Set)
    }

    // ================================================================
    // Static: bit number in the extension word, before the EA words
    // ================================================================

    fn bit_static(&mut self, bus: &mut dyn HostBus, op: u16, kind: BitOp) -> Result<(), Fault> {
        let bit = u32::from(self.fetch_word(bus)? & 0xFF);
        self.bit_op(bus, op, bit, kind)
    }

    pub(super) fn exec_btst_imm(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.bit_static(bus, op, BitOp::Test)
    }

    pub(super) fn exec_bchg_imm(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.bit_static(bus, op, BitOp::Change)
    }

    pub(super) fn exec_bclr_imm(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.bit_static(bus, op, BitOp::Clear)
    }

    pub(super) fn exec_bset_imm(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.bit_static(bus, op, BitOp::Set)
    }

    // ================================================================
    // Bit fields (68020+)
    // ================================================================
    //
    // Encoding: 1110 1TTT 11 MMMRRR + extension
    //   TTT = 000 BFTST  001 BFEXTU  010 BFCHG  011 BFEXTS
    //         100 BFCLR  101 BFFFO   110 BFSET  111 BFINS
    // Extension: 0 RRR Do OOOOO Dw WWWWW
    //   RRR = data register for EXTU/EXTS/FFO/INS
    //   Do = offset in Dn (signed), else 0-31
    //   Dw = width in Dn (low 5 bits), else 1-32 with 0 meaning 32

    pub(super) fn exec_bitfield(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let kind = (op >> 8) & 7;
        let ext = self.fetch_word(bus)?;
        let reg = usize::from((ext >> 12) & 7);
        let offset = if ext & 0x0800 != 0 {
            self.regs.d[usize::from((ext >> 6) & 7)] as i32
        } else {
            i32::from((ext >> 6) & 0x1F)
        };
        let width = match if ext & 0x0020 != 0 {
            self.regs.d[usize::from(ext & 7)] & 31
        } else {
            u32::from(ext & 31)
        } {
            0 => 32,
            w => w,
        };
        let field_mask = u32::MAX >> (32 - width);
        let mode = self.ea_mode(op)?;

        let (field, location) = match mode {
            AddrMode::DataReg(r) => {
                let r = usize::from(r);
                let rotated = self.regs.d[r].rotate_left(offset as u32 & 31);
                (rotated >> (32 - width), FieldAt::Register(r))
            }
            _ => {
                let (addr, program) = match self.resolve_ea(bus, mode, Size::Byte)? {
                    Operand::Memory(addr) => (addr, false),
                    Operand::Program(addr) => (addr, true),
                    _ => return Err(self.illegal()),
                };
                let addr = addr.wrapping_add((offset >> 3) as u32);
                let bit = (offset & 7) as u32;
                let bytes = (bit + width).div_ceil(8);
                let mut data = 0u64;
                for i in 0..bytes {
                    let at = addr.wrapping_add(i);
                    let at = if program { Operand::Program(at) } else { Operand::Memory(at) };
                    data |= u64::from(self.read_operand(bus, at, Size::Byte)?) << (56 - 8 * i);
                }
                let field = ((data << bit) >> (64 - width)) as u32;
                (field, FieldAt::Memory { addr, bit, bytes, data })
            }
        };

        let mut sr = self.regs.sr() & !(N | Z | V | C);
        if field & (1 << (width - 1)) != 0 {
            sr |= N;
        }
        if field == 0 {
            sr |= Z;
        }

        let new_field = match kind {
            0 => None,
            1 => {
                self.regs.d[reg] = field;
                None
            }
            2 => Some(!field & field_mask),
            3 => {
                self.regs.d[reg] = (((field << (32 - width)) as i32) >> (32 - width)) as u32;
                None
            }
            4 => Some(0),
            5 => {
                let leading = if field == 0 { width } else { field.leading_zeros() - (32 - width) };
                self.regs.d[reg] = (offset as u32).wrapping_add(leading);
                None
            }
            6 => Some(field_mask),
            _ => {
                let inserted = self.regs.d[reg] & field_mask;
                sr &= !(N | Z);
                if inserted & (1 << (width - 1)) != 0 {
                    sr |= N;
                }
                if inserted == 0 {
                    sr |= Z;
                }
                Some(inserted)
            }
        };
        self.regs.set_ccr(sr);

        let Some(new_field) = new_field else {
            return Ok(());
        };
        match location {
            FieldAt::Register(r) => {
                let off = offset as u32 & 31;
                let shift = 32 - width;
                let rotated = self.regs.d[r].rotate_left(off);
                let rotated = (rotated & !(field_mask << shift)) | (new_field << shift);
                self.regs.d[r] = rotated.rotate_right(off);
            }
            FieldAt::Memory { addr, bit, bytes, data } => {
                let shift = 64 - bit - width;
                let mask = u64::from(field_mask) << shift;
                let data = (data & !mask) | (u64::from(new_field) << shift);
                for i in 0..bytes {
                    let byte = (data >> (56 - 8 * i)) as u32 & 0xFF;
                    self.write(bus, addr.wrapping_add(i), Size::Byte, byte)?;
                }
            }
        }
        Ok(())
    }
}

/// Where a bit field was read from.
enum FieldAt {
    Register(usize),
    /// Up to five bytes starting at `addr`, left-aligned in `data`.
    Memory { addr: u32, bit: u32, bytes: u32, data: u64 },
}

#[cfg(test)]
mod tests {
    use crate::flags::{N, Z};
    use crate::model::CpuModel;
    use crate::testing::Rig;

    #[test]
    fn btst_register_uses_bit_modulo_32() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x0300]); // BTST D1,D0
        rig.cpu.regs.d[0] = 1;
        rig.cpu.regs.d[1] = 32;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.sr() & Z, 0);
    }

    #[test]
    fn bset_memory_uses_bit_modulo_8() {
        // BSET #9,(A0)
        let mut rig = Rig::new(CpuModel::M68000, &[0x08D0, 0x0009]);
        rig.cpu.regs.a[0] = 0x6000;
        rig.steps(1);
        assert_eq!(rig.peek_byte(0x6000), 0x02);
        assert_eq!(rig.cpu.regs.sr() & Z, Z);
    }

    #[test]
    fn bfextu_from_register() {
        // BFEXTU D0{4:8},D1
        let mut rig = Rig::new(CpuModel::M68020, &[0xE9C0, 0x1108]);
        rig.cpu.regs.d[0] = 0x0AB0_0000;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[1], 0xAB);
        assert_eq!(rig.cpu.regs.sr() & N, N);
    }

    #[test]
    fn bfexts_sign_extends() {
        // BFEXTS D0{0:4},D1
        let mut rig = Rig::new(CpuModel::M68020, &[0xEBC0, 0x1004]);
        rig.cpu.regs.d[0] = 0xF000_0000;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[1], 0xFFFF_FFFF);
    }

    #[test]
    fn bfins_spans_memory_bytes() {
        // BFINS D1,(A0){4:12}
        let mut rig = Rig::new(CpuModel::M68020, &[0xEFD0, 0x110C]);
        rig.cpu.regs.a[0] = 0x6000;
        rig.cpu.regs.d[1] = 0xABC;
        rig.steps(1);
        assert_eq!(rig.peek_word(0x6000), 0x0ABC);
    }

    #[test]
    fn bfffo_finds_first_set_bit() {
        // BFFFO D0{8:16},D1
        let mut rig = Rig::new(CpuModel::M68020, &[0xEDC0, 0x1210]);
        rig.cpu.regs.d[0] = 0x0000_1000;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[1], 8 + 11);
    }

    #[test]
    fn bfclr_with_negative_offset_reaches_backwards() {
        // BFCLR (A0){D2:8} with D2 = -8
        let mut rig = Rig::new(CpuModel::M68020, &[0xECD0, 0x0888]);
        rig.cpu.regs.a[0] = 0x6001;
        rig.cpu.regs.d[2] = (-8i32) as u32;
        rig.poke_word(0x6000, 0xFFFF);
        rig.steps(1);
        assert_eq!(rig.peek_word(0x6000), 0x00FF);
    }
}
