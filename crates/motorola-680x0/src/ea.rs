//! Effective address resolution.
//!
//! Resolution consumes the extension words of the operand and applies the
//! address register side effect exactly once: predecrement before the
//! address is formed, postincrement right after. Byte-sized stack accesses
//! through A7 move it by two so the stack stays word aligned.
//!
//! The base address of the PC-relative modes is the address of their first
//! extension word.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::cpu::Cpu680x0;
use crate::exceptions::Fault;
use crate::memory::{FunctionCode, HostBus};

/// A resolved operand location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operand {
    DataReg(u8),
    AddrReg(u8),
    /// Data-space memory.
    Memory(u32),
    /// Program-space memory (PC-relative modes, read only).
    Program(u32),
    Immediate(u32),
}

impl Operand {
    /// Memory address of the operand, if it has one.
    pub(crate) fn address(self) -> Option<u32> {
        match self {
            Self::Memory(addr) | Self::Program(addr) => Some(addr),
            _ => None,
        }
    }
}

fn step(reg: u8, size: Size) -> u32 {
    if reg == 7 && size == Size::Byte {
        2
    } else {
        size.bytes()
    }
}

impl Cpu680x0 {
    /// Decode the EA field in bits 5-0.
    pub(crate) fn ea_mode(&self, opcode: u16) -> Result<AddrMode, Fault> {
        AddrMode::from_ea_field(opcode).ok_or_else(|| self.illegal())
    }

    /// Resolve the EA field in bits 5-0.
    pub(crate) fn ea_operand(
        &mut self,
        bus: &mut dyn HostBus,
        opcode: u16,
        size: Size,
    ) -> Result<Operand, Fault> {
        let mode = self.ea_mode(opcode)?;
        self.resolve_ea(bus, mode, size)
    }

    /// Resolve and read the EA field in bits 5-0.
    pub(crate) fn read_ea(
        &mut self,
        bus: &mut dyn HostBus,
        opcode: u16,
        size: Size,
    ) -> Result<u32, Fault> {
        let operand = self.ea_operand(bus, opcode, size)?;
        self.read_operand(bus, operand, size)
    }

    /// Address computed by a control addressing mode (LEA, JMP, PEA, ...).
    pub(crate) fn control_address(
        &mut self,
        bus: &mut dyn HostBus,
        opcode: u16,
    ) -> Result<u32, Fault> {
        let operand = self.ea_operand(bus, opcode, Size::Long)?;
        operand.address().ok_or_else(|| self.illegal())
    }

    /// Resolve an addressing mode to an operand location.
    pub(crate) fn resolve_ea(
        &mut self,
        bus: &mut dyn HostBus,
        mode: AddrMode,
        size: Size,
    ) -> Result<Operand, Fault> {
        let operand = match mode {
            AddrMode::DataReg(r) => Operand::DataReg(r),
            AddrMode::AddrReg(r) => Operand::AddrReg(r),
            AddrMode::AddrInd(r) => Operand::Memory(self.regs.a[r as usize]),
            AddrMode::AddrIndPostInc(r) => {
                let addr = self.regs.a[r as usize];
                self.regs.a[r as usize] = addr.wrapping_add(step(r, size));
                Operand::Memory(addr)
            }
            AddrMode::AddrIndPreDec(r) => {
                let addr = self.regs.a[r as usize].wrapping_sub(step(r, size));
                self.regs.a[r as usize] = addr;
                Operand::Memory(addr)
            }
            AddrMode::AddrIndDisp(r) => {
                let disp = self.fetch_word(bus)? as i16 as u32;
                Operand::Memory(self.regs.a[r as usize].wrapping_add(disp))
            }
            AddrMode::AddrIndIndex(r) => {
                let base = self.regs.a[r as usize];
                Operand::Memory(self.indexed(bus, base)?)
            }
            AddrMode::AbsShort => Operand::Memory(self.fetch_word(bus)? as i16 as u32),
            AddrMode::AbsLong => Operand::Memory(self.fetch_long(bus)?),
            AddrMode::PcDisp => {
                let base = self.regs.pc;
                let disp = self.fetch_word(bus)? as i16 as u32;
                Operand::Program(base.wrapping_add(disp))
            }
            AddrMode::PcIndex => {
                let base = self.regs.pc;
                Operand::Program(self.indexed(bus, base)?)
            }
            AddrMode::Immediate => Operand::Immediate(self.fetch_imm(bus, size)?),
        };
        Ok(operand)
    }

    /// Indexed address from a brief or (68020+) full extension word.
    fn indexed(&mut self, bus: &mut dyn HostBus, base: u32) -> Result<u32, Fault> {
        let ext = self.fetch_word(bus)?;
        let reg = usize::from((ext >> 12) & 0x0F);
        let raw = self.regs.da(reg);
        let xn = if ext & 0x0800 != 0 {
            raw
        } else {
            raw as u16 as i16 as u32
        };
        let full = self.caps.full_extension;
        let index = if full { xn << ((ext >> 9) & 3) } else { xn };

        if !full || ext & 0x0100 == 0 {
            let disp = ext as u8 as i8 as u32;
            return Ok(base.wrapping_add(disp).wrapping_add(index));
        }

        self.extra_cycles += crate::timing::full_extension_020(ext);
        let base_suppress = ext & 0x0080 != 0;
        let index_suppress = ext & 0x0040 != 0;
        let selector = ext & 0x0007;
        if (index_suppress && selector > 3) || (!index_suppress && selector == 4) {
            return Err(self.illegal());
        }

        let bd = match (ext >> 4) & 3 {
            0 => return Err(self.illegal()),
            1 => 0,
            2 => self.fetch_word(bus)? as i16 as u32,
            _ => self.fetch_long(bus)?,
        };
        let base = if base_suppress { 0 } else { base };
        let index = if index_suppress { 0 } else { index };

        if selector == 0 {
            return Ok(base.wrapping_add(bd).wrapping_add(index));
        }

        let od = match selector & 3 {
            2 => self.fetch_word(bus)? as i16 as u32,
            3 => self.fetch_long(bus)?,
            _ => 0,
        };
        let post_indexed = selector > 4;
        let intermediate = if post_indexed {
            base.wrapping_add(bd)
        } else {
            base.wrapping_add(bd).wrapping_add(index)
        };
        let pointer = self.read(bus, intermediate, Size::Long)?;
        Ok(if post_indexed {
            pointer.wrapping_add(index).wrapping_add(od)
        } else {
            pointer.wrapping_add(od)
        })
    }

    /// Read a resolved operand.
    pub(crate) fn read_operand(
        &mut self,
        bus: &mut dyn HostBus,
        operand: Operand,
        size: Size,
    ) -> Result<u32, Fault> {
        match operand {
            Operand::DataReg(r) => Ok(self.regs.d[r as usize] & size.mask()),
            Operand::AddrReg(r) => Ok(self.regs.a[r as usize] & size.mask()),
            Operand::Memory(addr) => self.read(bus, addr, size),
            Operand::Program(addr) => {
                let fc = FunctionCode::from_flags(self.regs.is_supervisor(), true);
                self.read_fc(bus, addr, size, fc)
            }
            Operand::Immediate(value) => Ok(value & size.mask()),
        }
    }

    /// Write a resolved operand. Data registers keep their untouched upper
    /// bits; address registers always take the full 32-bit value.
    pub(crate) fn write_operand(
        &mut self,
        bus: &mut dyn HostBus,
        operand: Operand,
        size: Size,
        value: u32,
    ) -> Result<(), Fault> {
        match operand {
            Operand::DataReg(r) => {
                self.set_d(r, size, value);
                Ok(())
            }
            Operand::AddrReg(r) => {
                self.regs.a[r as usize] = value;
                Ok(())
            }
            Operand::Memory(addr) => self.write(bus, addr, size, value),
            Operand::Program(_) | Operand::Immediate(_) => Err(self.illegal()),
        }
    }

    /// Write the low `size` bits of a data register.
    pub(crate) fn set_d(&mut self, reg: u8, size: Size, value: u32) {
        let mask = size.mask();
        let d = &mut self.regs.d[reg as usize & 7];
        *d = (*d & !mask) | (value & mask);
    }
}
