//! Program flow: Bcc, BRA, BSR, DBcc, JMP, JSR, RTS, RTR, RTD and the
//! instruction traps (TRAP, TRAPV, TRAPcc, ILLEGAL, BKPT, line A, line F).

use super::reg_y;
use crate::alu::Size;
use crate::cpu::Cpu680x0;
use crate::exceptions::{Fault, TRAP_BASE, TRAPV};
use crate::flags::{Status, V};
use crate::memory::HostBus;
use crate::trace::FlowKind;

impl Cpu680x0 {
    /// Branch target and whether the displacement came from extension
    /// words. The base is the address just past the opcode.
    fn branch_target(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(u32, bool), Fault> {
        let base = self.regs.pc;
        let disp = match op as u8 {
            0x00 => (self.fetch_word(bus)? as i16 as u32, true),
            0xFF if self.caps.long_ops => (self.fetch_long(bus)?, true),
            d => (d as i8 as u32, false),
        };
        Ok((base.wrapping_add(disp.0), disp.1))
    }

    // ================================================================
    // BRA / BSR / Bcc
    // ================================================================
    //
    // Encoding: 0110 CCCC DDDDDDDD
    //   D = 00 word displacement follows, FF long displacement (68020+)

    pub(super) fn exec_bra(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let (target, _) = self.branch_target(bus, op)?;
        self.regs.pc = target;
        self.note_flow(FlowKind::BranchTaken, target, None);
        Ok(())
    }

    pub(super) fn exec_bsr(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let (target, _) = self.branch_target(bus, op)?;
        let ret = self.regs.pc;
        self.push(bus, Size::Long, ret)?;
        self.regs.pc = target;
        self.note_flow(FlowKind::Call, target, None);
        Ok(())
    }

    pub(super) fn exec_bcc(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let taken = Status::condition(self.regs.sr(), (op >> 8) as u8);
        let (target, extended) = self.branch_target(bus, op)?;
        if taken {
            self.add_cycles_000(2);
            self.regs.pc = target;
            self.note_flow(FlowKind::BranchTaken, target, None);
        } else {
            if extended {
                self.add_cycles_000(4);
            }
            self.note_flow(FlowKind::BranchNotTaken, self.regs.pc, None);
        }
        Ok(())
    }

    // ================================================================
    // DBcc
    // ================================================================
    //
    // If the condition is false, decrement Dn.w and branch unless it wrapped
    // to -1.

    pub(super) fn exec_dbcc(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let base = self.regs.pc;
        let disp = self.fetch_word(bus)? as i16 as u32;
        if Status::condition(self.regs.sr(), (op >> 8) as u8) {
            self.add_cycles_000(2);
            self.note_flow(FlowKind::BranchNotTaken, self.regs.pc, None);
            return Ok(());
        }
        let dn = reg_y(op);
        let count = (self.regs.d[dn] as u16).wrapping_sub(1);
        self.set_d(dn as u8, Size::Word, u32::from(count));
        if count == 0xFFFF {
            self.add_cycles_000(4);
            self.note_flow(FlowKind::BranchNotTaken, self.regs.pc, None);
        } else {
            let target = base.wrapping_add(disp);
            self.regs.pc = target;
            self.note_flow(FlowKind::BranchTaken, target, None);
        }
        Ok(())
    }

    // ================================================================
    // JMP / JSR / RTS / RTR / RTD
    // ================================================================

    pub(super) fn exec_jmp(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let target = self.control_address(bus, op)?;
        self.regs.pc = target;
        self.note_flow(FlowKind::Jump, target, None);
        Ok(())
    }

    pub(super) fn exec_jsr(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let target = self.control_address(bus, op)?;
        let ret = self.regs.pc;
        self.push(bus, Size::Long, ret)?;
        self.regs.pc = target;
        self.note_flow(FlowKind::Call, target, None);
        Ok(())
    }

    pub(super) fn exec_rts(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        let target = self.pop(bus, Size::Long)?;
        self.regs.pc = target;
        self.note_flow(FlowKind::Return, target, None);
        Ok(())
    }

    /// Pops CCR (the system byte of the stacked word is ignored), then PC.
    pub(super) fn exec_rtr(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        let ccr = self.pop(bus, Size::Word)?;
        let target = self.pop(bus, Size::Long)?;
        self.regs.set_ccr(ccr as u16);
        self.regs.pc = target;
        self.note_flow(FlowKind::Return, target, None);
        Ok(())
    }

    pub(super) fn exec_rtd(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        let disp = self.fetch_word(bus)? as i16 as u32;
        let target = self.pop(bus, Size::Long)?;
        self.regs.a[7] = self.regs.a[7].wrapping_add(disp);
        self.regs.pc = target;
        self.note_flow(FlowKind::Return, target, None);
        Ok(())
    }

    // ================================================================
    // Traps
    // ================================================================

    pub(super) fn exec_trap(&mut self, _bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        Err(self.trap(TRAP_BASE + (op & 0x0F) as u8))
    }

    pub(super) fn exec_trapv(&mut self, _bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        if self.regs.sr() & V != 0 {
            return Err(self.trap(TRAPV));
        }
        Ok(())
    }

    /// TRAPcc with no operand, a word or a long operand (ignored but
    /// consumed).
    pub(super) fn exec_trapcc(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        match op & 7 {
            2 => {
                self.fetch_word(bus)?;
            }
            3 => {
                self.fetch_long(bus)?;
            }
            _ => {}
        }
        if Status::condition(self.regs.sr(), (op >> 8) as u8) {
            return Err(self.trap(TRAPV));
        }
        Ok(())
    }

    pub(super) fn exec_illegal(&mut self, _bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        Err(self.illegal())
    }

    /// No breakpoint acknowledge hardware answers, so BKPT is illegal.
    pub(super) fn exec_bkpt(&mut self, _bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        Err(self.illegal())
    }

    pub(super) fn exec_line_a(&mut self, _bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        Err(self.line_a())
    }

    pub(super) fn exec_line_f(&mut self, _bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        Err(self.line_f())
    }
}

#[cfg(test)]
mod tests {
    use crate::flags::Z;
    use crate::model::CpuModel;
    use crate::testing::Rig;

    #[test]
    fn bsr_and_rts_round_trip() {
        // BSR.S +4; NOP; NOP; RTS
        let mut rig = Rig::new(CpuModel::M68000, &[0x6104, 0x4E71, 0x4E71, 0x4E75]);
        assert_eq!(rig.steps(1), 18);
        assert_eq!(rig.cpu.regs.pc, 0x406);
        assert_eq!(rig.peek_long(0x7FFC), 0x402);
        assert_eq!(rig.steps(1), 16);
        assert_eq!(rig.cpu.regs.pc, 0x402);
    }

    #[test]
    fn bcc_costs_depend_on_the_outcome() {
        // BEQ.S +2 not taken, then BNE.W taken
        let mut rig = Rig::new(CpuModel::M68000, &[0x6702, 0x6600, 0x0010]);
        assert_eq!(rig.steps(1), 8);
        assert_eq!(rig.cpu.regs.pc, 0x402);
        assert_eq!(rig.steps(1), 10);
        assert_eq!(rig.cpu.regs.pc, 0x414);
    }

    #[test]
    fn bcc_word_not_taken_costs_twelve() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x6700, 0x0010]); // BEQ.W
        assert_eq!(rig.steps(1), 12);
        assert_eq!(rig.cpu.regs.pc, 0x404);
    }

    #[test]
    fn long_branch_needs_a_68020() {
        let mut rig = Rig::new(CpuModel::M68020, &[0x60FF, 0x0000, 0x0100]); // BRA.L
        rig.steps(1);
        assert_eq!(rig.cpu.regs.pc, 0x502);
    }

    #[test]
    fn dbcc_counts_down_to_minus_one() {
        // loop: DBF D0,loop
        let mut rig = Rig::new(CpuModel::M68000, &[0x51C8, 0xFFFE]);
        rig.cpu.regs.d[0] = 0xABCD_0002;
        assert_eq!(rig.steps(1), 10);
        assert_eq!(rig.cpu.regs.pc, 0x400);
        rig.steps(2);
        assert_eq!(rig.cpu.regs.pc, 0x404);
        assert_eq!(rig.cpu.regs.d[0], 0xABCD_FFFF);
    }

    #[test]
    fn dbcc_true_condition_falls_through() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x57C8, 0xFFFE]); // DBEQ D0
        rig.cpu.regs.set_ccr(Z);
        assert_eq!(rig.steps(1), 12);
        assert_eq!(rig.cpu.regs.d[0], 0);
    }

    #[test]
    fn jsr_pushes_the_return_address() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x4EB8, 0x0500]); // JSR $0500.W
        assert_eq!(rig.steps(1), 18);
        assert_eq!(rig.cpu.regs.pc, 0x500);
        assert_eq!(rig.peek_long(0x7FFC), 0x404);
    }

    #[test]
    fn rtd_releases_arguments() {
        let mut rig = Rig::new(CpuModel::M68010, &[0x4E74, 0x0008]); // RTD #8
        rig.cpu.regs.a[7] = 0x7000;
        rig.poke_long(0x7000, 0x1234);
        rig.steps(1);
        assert_eq!(rig.cpu.regs.pc, 0x1234);
        assert_eq!(rig.cpu.regs.a[7], 0x700C);
    }

    #[test]
    fn trap_vectors_through_32_plus_n() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x4E43]); // TRAP #3
        rig.vector(35, 0x600);
        assert_eq!(rig.steps(1), 34);
        assert_eq!(rig.cpu.regs.pc, 0x600);
        assert_eq!(rig.peek_long(0x7FFC), 0x402);
    }
}
