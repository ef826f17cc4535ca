//! System control: status register moves, MOVE USP, MOVEC, MOVES, RESET,
//! STOP, RTE, NOP, and the 68040 cache and MOVE16 instructions.

use tracing::debug;

use super::{reg_y, sized};
use crate::alu::Size;
use crate::cpu::{Cpu680x0, State};
use crate::exceptions::Fault;
use crate::memory::{FunctionCode, HostBus};
use crate::model::CpuModel;
use crate::table::SizeField;

impl Cpu680x0 {
    // ================================================================
    // MOVE to/from SR and CCR
    // ================================================================

    /// Unprivileged on the 68000, privileged from the 68010 on.
    pub(super) fn exec_move_from_sr(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        if self.caps.vbr {
            self.require_supervisor()?;
        }
        let sr = u32::from(self.regs.sr());
        let operand = self.ea_operand(bus, op, Size::Word)?;
        // 6 clocks to a data register on the 68000, 4 on later models.
        if !self.caps.vbr && operand.address().is_none() {
            self.extra_cycles += 2;
        }
        self.write_operand(bus, operand, Size::Word, sr)
    }

    pub(super) fn exec_move_from_ccr(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let ccr = u32::from(self.regs.ccr());
        let operand = self.ea_operand(bus, op, Size::Word)?;
        self.write_operand(bus, operand, Size::Word, ccr)
    }

    pub(super) fn exec_move_to_ccr(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let value = self.read_ea(bus, op, Size::Word)?;
        self.regs.set_ccr(value as u16);
        Ok(())
    }

    pub(super) fn exec_move_to_sr(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.require_supervisor()?;
        let value = self.read_ea(bus, op, Size::Word)?;
        self.regs.set_sr(value as u16);
        Ok(())
    }

    /// MOVE USP,An (bit 3 set) or MOVE An,USP.
    pub(super) fn exec_move_usp(&mut self, _bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.require_supervisor()?;
        let an = reg_y(op);
        if op & 0x0008 != 0 {
            self.regs.a[an] = self.regs.usp();
        } else {
            self.regs.set_usp(self.regs.a[an]);
        }
        Ok(())
    }

    // ================================================================
    // MOVEC (68010+)
    // ================================================================
    //
    // Encoding: 0100 1110 0111 101D + extension A/D RRR CCCC CCCC CCCC
    //   D = 0 control register to Rn, 1 Rn to control register
    // Control registers: $000 SFC, $001 DFC, $002 CACR, $800 USP, $801 VBR,
    // $802 CAAR, $803 MSP, $804 ISP. Anything else is illegal.

    fn control_register_known(&self, code: u16) -> bool {
        match code {
            0x000 | 0x001 | 0x800 | 0x801 => true,
            0x002 | 0x803 | 0x804 => self.caps.cacr,
            0x802 => self.caps.cacr && !self.model().is_040(),
            _ => false,
        }
    }

    pub(super) fn exec_movec(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.require_supervisor()?;
        let ext = self.fetch_word(bus)?;
        let rn = usize::from(ext >> 12);
        let code = ext & 0x0FFF;
        if !self.control_register_known(code) {
            return Err(self.illegal());
        }

        if op & 1 == 0 {
            let value = match code {
                0x000 => u32::from(self.regs.sfc),
                0x001 => u32::from(self.regs.dfc),
                0x002 => self.regs.cacr,
                0x800 => self.regs.usp(),
                0x801 => self.regs.vbr,
                0x802 => self.regs.caar,
                0x803 => self.regs.msp(),
                _ => self.regs.isp(),
            };
            if rn < 8 {
                self.regs.d[rn] = value;
            } else {
                self.regs.a[rn - 8] = value;
            }
        } else {
            let value = self.regs.da(rn);
            match code {
                0x000 => self.regs.sfc = (value & 7) as u8,
                0x001 => self.regs.dfc = (value & 7) as u8,
                0x002 => self.regs.cacr = value,
                0x800 => self.regs.set_usp(value),
                0x801 => self.regs.vbr = value,
                0x802 => self.regs.caar = value,
                0x803 => self.regs.set_msp(value),
                _ => self.regs.set_isp(value),
            }
        }
        Ok(())
    }

    // ================================================================
    // MOVES (68010+)
    // ================================================================
    //
    // Extension: A/D RRR D 000 0000 0000
    //   D = 1 Rn to <ea> in the DFC space, 0 <ea> to Rn in the SFC space

    pub(super) fn exec_moves(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.require_supervisor()?;
        let size = sized(SizeField::Standard, op);
        let ext = self.fetch_word(bus)?;
        let rn = usize::from(ext >> 12);
        let operand = self.ea_operand(bus, op, size)?;
        let addr = operand.address().ok_or_else(|| self.illegal())?;

        if ext & 0x0800 != 0 {
            let fc = FunctionCode::from_bits(self.regs.dfc);
            let value = self.regs.da(rn);
            self.write_fc(bus, addr, size, value, fc)
        } else {
            let fc = FunctionCode::from_bits(self.regs.sfc);
            let value = self.read_fc(bus, addr, size, fc)?;
            if rn < 8 {
                self.set_d(rn as u8, size, value);
            } else {
                self.regs.a[rn - 8] = size.sign_extend(value);
            }
            Ok(())
        }
    }

    // ================================================================
    // RESET / STOP / RTE / NOP
    // ================================================================

    /// Asserts the external reset line; the processor state is unchanged.
    pub(super) fn exec_reset(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        self.require_supervisor()?;
        debug!(pc = format_args!("{:#010X}", self.regs.prev_pc), "RESET instruction");
        bus.reset();
        Ok(())
    }

    /// Load SR and wait for an interrupt, trace or reset.
    pub(super) fn exec_stop(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        self.require_supervisor()?;
        let sr = self.fetch_word(bus)?;
        self.regs.set_sr(sr);
        self.state = State::Stopped;
        Ok(())
    }

    pub(super) fn exec_rte(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        self.return_from_exception(bus)?;
        // The format word read.
        if self.model() == CpuModel::M68010 {
            self.extra_cycles += 4;
        }
        Ok(())
    }

    pub(super) fn exec_nop(&mut self, _bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        Ok(())
    }

    // ================================================================
    // 68040: CINV / CPUSH / MOVE16
    // ================================================================

    /// No caches are modelled; only the privilege check remains.
    pub(super) fn exec_cache(&mut self, _bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        self.require_supervisor()
    }

    /// Copy one aligned 16-byte line.
    ///
    /// `F620` form: MOVE16 (Ax)+,(Ay)+ with Ay in the extension word.
    /// `F600` form: bits 4-3 select 00 (Ay)+,abs  01 abs,(Ay)+  10 (Ay),abs
    /// 11 abs,(Ay).
    pub(super) fn exec_move16(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let r = reg_y(op);
        let (src, dst) = if op & 0x0020 != 0 {
            let ext = self.fetch_word(bus)?;
            let ay = usize::from((ext >> 12) & 7);
            let pair = (self.regs.a[r], self.regs.a[ay]);
            self.regs.a[r] = self.regs.a[r].wrapping_add(16);
            if ay != r {
                self.regs.a[ay] = self.regs.a[ay].wrapping_add(16);
            }
            pair
        } else {
            let abs = self.fetch_long(bus)?;
            let ay = self.regs.a[r];
            let pair = match (op >> 3) & 3 {
                0 | 2 => (ay, abs),
                _ => (abs, ay),
            };
            if (op >> 3) & 3 < 2 {
                self.regs.a[r] = ay.wrapping_add(16);
            }
            pair
        };

        let (src, dst) = (src & !15, dst & !15);
        for i in 0..4 {
            let value = self.read(bus, src.wrapping_add(4 * i), Size::Long)?;
            self.write(bus, dst.wrapping_add(4 * i), Size::Long, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::flags::S;
    use crate::model::CpuModel;
    use crate::testing::Rig;

    #[test]
    fn move_from_sr_is_privileged_from_the_68010() {
        // ANDI #$0000,SR; MOVE SR,D0
        let program = [0x027C, 0x0000, 0x40C0];
        let mut old = Rig::new(CpuModel::M68000, &program);
        old.steps(2);
        assert_eq!(old.cpu.regs.pc, 0x406);

        let mut new = Rig::new(CpuModel::M68010, &program);
        new.vector(8, 0x600);
        new.steps(2);
        assert_eq!(new.cpu.regs.pc, 0x600);
    }

    #[test]
    fn the_68010_adjusts_move_from_sr_and_rte() {
        // MOVE SR,D0; ILLEGAL; handler: RTE
        let program = [0x40C0, 0x4AFC];
        let mut old = Rig::new(CpuModel::M68000, &program);
        old.vector(4, 0x600).poke_word(0x600, 0x4E73);
        let mut new = Rig::new(CpuModel::M68010, &program);
        new.vector(4, 0x600).poke_word(0x600, 0x4E73);

        assert_eq!(old.steps(1), 6);
        assert_eq!(new.steps(1), 4);
        old.steps(1);
        new.steps(1);
        assert_eq!(old.steps(1), 20);
        assert_eq!(new.steps(1), 24);
        assert_eq!(new.cpu.regs.pc, 0x404);
    }

    #[test]
    fn movec_reads_and_writes_vbr() {
        // MOVEC D0,VBR; MOVEC VBR,D1
        let mut rig = Rig::new(CpuModel::M68010, &[0x4E7B, 0x0801, 0x4E7A, 0x1801]);
        rig.cpu.regs.d[0] = 0x1000;
        rig.steps(2);
        assert_eq!(rig.cpu.regs.vbr, 0x1000);
        assert_eq!(rig.cpu.regs.d[1], 0x1000);
    }

    #[test]
    fn movec_rejects_registers_the_model_lacks() {
        // MOVEC CACR,D0 on a 68010
        let mut rig = Rig::new(CpuModel::M68010, &[0x4E7A, 0x0002]);
        rig.vector(4, 0x600);
        rig.steps(1);
        assert_eq!(rig.cpu.regs.pc, 0x600);
    }

    #[test]
    fn move_usp_transfers_the_user_stack() {
        // MOVE A0,USP; MOVE USP,A1
        let mut rig = Rig::new(CpuModel::M68000, &[0x4E60, 0x4E69]);
        rig.cpu.regs.a[0] = 0x3000;
        rig.steps(2);
        assert_eq!(rig.cpu.regs.usp(), 0x3000);
        assert_eq!(rig.cpu.regs.a[1], 0x3000);
        assert_eq!(rig.cpu.regs.a[7], 0x8000);
    }

    #[test]
    fn stop_loads_sr() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x4E72, 0x2300]); // STOP #$2300
        rig.steps(1);
        assert!(rig.cpu.is_stopped());
        assert_eq!(rig.cpu.regs.sr(), 0x2300);
        assert_ne!(rig.cpu.regs.sr() & S, 0);
    }

    #[test]
    fn move16_copies_an_aligned_line() {
        // MOVE16 (A0)+,(A1)+
        let mut rig = Rig::new(CpuModel::M68040, &[0xF620, 0x9000]);
        rig.cpu.regs.a[0] = 0x6004;
        rig.cpu.regs.a[1] = 0x7000;
        for i in 0..4 {
            rig.poke_long(0x6000 + 4 * i, 0x1111_1111 * (i + 1));
        }
        rig.steps(1);
        assert_eq!(rig.peek_long(0x7000), 0x1111_1111);
        assert_eq!(rig.peek_long(0x700C), 0x4444_4444);
        assert_eq!((rig.cpu.regs.a[0], rig.cpu.regs.a[1]), (0x6014, 0x7010));
    }
}
