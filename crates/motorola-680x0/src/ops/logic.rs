//! Logical operations: AND, OR, EOR, NOT and the immediate forms that
//! target CCR and SR.

use super::arith::AluOp;
use super::sized;
use crate::cpu::Cpu680x0;
use crate::exceptions::Fault;
use crate::memory::HostBus;
use crate::table::SizeField;

impl Cpu680x0 {
    pub(super) fn exec_and(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_to_register(bus, op, AluOp::And)
    }

    pub(super) fn exec_and_to_ea(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_to_memory(bus, op, AluOp::And)
    }

    pub(super) fn exec_or(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_to_register(bus, op, AluOp::Or)
    }

    pub(super) fn exec_or_to_ea(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_to_memory(bus, op, AluOp::Or)
    }

    /// EOR only exists as Dn,<ea> (the <ea>,Dn slot is CMP).
    pub(super) fn exec_eor(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_to_memory(bus, op, AluOp::Eor)
    }

    pub(super) fn exec_andi(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_immediate(bus, op, AluOp::And)
    }

    pub(super) fn exec_ori(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_immediate(bus, op, AluOp::Or)
    }

    pub(super) fn exec_eori(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        self.alu_immediate(bus, op, AluOp::Eor)
    }

    pub(super) fn exec_not(&mut self, bus: &mut dyn HostBus, op: u16) -> Result<(), Fault> {
        let size = sized(SizeField::Standard, op);
        let operand = self.ea_operand(bus, op, size)?;
        let value = !self.read_operand(bus, operand, size)? & size.mask();
        self.write_operand(bus, operand, size, value)?;
        self.set_logic_flags(value, size);
        Ok(())
    }

    // ================================================================
    // ORI / ANDI / EORI to CCR and SR
    // ================================================================
    //
    // The CCR forms use the low byte of the immediate word. The SR forms
    // are privileged and may change S, M and the interrupt mask.

    fn logic_ccr(&mut self, bus: &mut dyn HostBus, kind: AluOp) -> Result<(), Fault> {
        let imm = self.fetch_word(bus)? & 0x00FF;
        let ccr = u16::from(self.regs.ccr());
        self.regs.set_ccr(combine(kind, ccr, imm));
        Ok(())
    }

    fn logic_sr(&mut self, bus: &mut dyn HostBus, kind: AluOp) -> Result<(), Fault> {
        self.require_supervisor()?;
        let imm = self.fetch_word(bus)?;
        let sr = combine(kind, self.regs.sr(), imm);
        self.regs.set_sr(sr);
        Ok(())
    }

    pub(super) fn exec_ori_ccr(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        self.logic_ccr(bus, AluOp::Or)
    }

    pub(super) fn exec_andi_ccr(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        self.logic_ccr(bus, AluOp::And)
    }

    pub(super) fn exec_eori_ccr(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        self.logic_ccr(bus, AluOp::Eor)
    }

    pub(super) fn exec_ori_sr(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        self.logic_sr(bus, AluOp::Or)
    }

    pub(super) fn exec_andi_sr(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        self.logic_sr(bus, AluOp::And)
    }

    pub(super) fn exec_eori_sr(&mut self, bus: &mut dyn HostBus, _op: u16) -> Result<(), Fault> {
        self.logic_sr(bus, AluOp::Eor)
    }
}

fn combine(kind: AluOp, value: u16, imm: u16) -> u16 {
    match kind {
        AluOp::And => value & imm,
        AluOp::Eor => value ^ imm,
        _ => value | imm,
    }
}

#[cfg(test)]
mod tests {
    use crate::flags::{C, N, S, X, Z};
    use crate::model::CpuModel;
    use crate::testing::Rig;

    #[test]
    fn and_to_register_clears_v_and_c() {
        let mut rig = Rig::new(CpuModel::M68000, &[0xC081]); // AND.L D1,D0
        rig.cpu.regs.set_ccr(X | C);
        rig.cpu.regs.d[0] = 0xF0F0_0000;
        rig.cpu.regs.d[1] = 0x8000_FFFF;
        rig.steps(1);
        assert_eq!(rig.cpu.regs.d[0], 0x8000_0000);
        assert_eq!(rig.cpu.regs.sr() & 0x1F, X | N);
    }

    #[test]
    fn eor_writes_the_effective_address() {
        let mut rig = Rig::new(CpuModel::M68000, &[0xB350]); // EOR.W D1,(A0)
        rig.cpu.regs.a[0] = 0x6000;
        rig.cpu.regs.d[1] = 0xFFFF;
        rig.poke_word(0x6000, 0xFFFF);
        rig.steps(1);
        assert_eq!(rig.peek_word(0x6000), 0);
        assert_eq!(rig.cpu.regs.sr() & Z, Z);
    }

    #[test]
    fn andi_to_sr_can_drop_to_user_mode() {
        // ANDI #$0700,SR
        let mut rig = Rig::new(CpuModel::M68000, &[0x027C, 0x0700]);
        rig.cpu.regs.set_usp(0x4000);
        rig.steps(1);
        assert_eq!(rig.cpu.regs.sr() & S, 0);
        assert_eq!(rig.cpu.regs.a[7], 0x4000);
        assert_eq!(rig.cpu.regs.isp(), 0x8000);
    }

    #[test]
    fn ori_to_sr_in_user_mode_is_a_privilege_violation() {
        // ANDI #$0000,SR then ORI #$0700,SR
        let mut rig = Rig::new(CpuModel::M68000, &[0x027C, 0x0000, 0x007C, 0x0700]);
        rig.vector(8, 0x600);
        rig.steps(2);
        assert_eq!(rig.cpu.regs.pc, 0x600);
        // Stacked PC is the offending instruction.
        assert_eq!(rig.peek_long(0x8000 - 4), 0x404);
    }

    #[test]
    fn eori_to_ccr_uses_the_low_byte() {
        let mut rig = Rig::new(CpuModel::M68000, &[0x0A3C, 0xFF1F]); // EORI #$1F,CCR
        rig.steps(1);
        assert_eq!(rig.cpu.regs.sr(), 0x271F);
    }
}
