//! Instruction semantics and the declarative instruction list.
//!
//! Each line of [`INSTRUCTIONS`] is (name, fixed bits, mask, handler) plus
//! the size field, the allowed addressing modes, the models that have the
//! instruction, its base timing and its operand syntax. The dispatch table
//! and the disassembler are both generated from this list.
//!
//! Timing columns are `Timing::new(reg.w, reg.l, mem.w, mem.l, 68020)` with
//! the effective address cost added by the table; handlers add the
//! data-dependent part (shift counts, multiply/divide, taken branches,
//! MOVEM register counts).

mod arith;
mod bits;
mod data;
mod extended;
mod flow;
mod logic;
mod shift;
mod system;

use crate::addressing::{
    EA_ALL, EA_ALTERABLE, EA_CONTROL, EA_CONTROL_ALT, EA_DATA, EA_DATA_ALT, EA_DATA_NO_IMM, EA_DN,
    EA_MEM_ALT, EA_POSTINC, EA_PREDEC,
};
use crate::alu::Size;
use crate::cpu::Cpu680x0;
use crate::decode::Syntax;
use crate::exceptions::Fault;
use crate::flags::Status;
use crate::memory::HostBus;
use crate::model::{M010_UP, M020_UP, M040_ONLY, PRE_020};
use crate::table::{InstrDef, SizeField, Timing};
use crate::timing::{CONTROL_020, JMP_000, JSR_000, LEA_000, MOVEM_LOAD_000, MOVEM_STORE_000, PEA_000};

/// Operation size from a size field the table has already validated.
fn sized(field: SizeField, opcode: u16) -> Size {
    field.size(opcode).unwrap_or(Size::Word)
}

/// Register number in bits 11-9.
fn reg_x(opcode: u16) -> usize {
    usize::from((opcode >> 9) & 7)
}

/// Register number in bits 2-0.
fn reg_y(opcode: u16) -> usize {
    usize::from(opcode & 7)
}

impl Cpu680x0 {
    /// Push onto the active stack.
    pub(crate) fn push(&mut self, bus: &mut dyn HostBus, size: Size, value: u32) -> Result<(), Fault> {
        let sp = self.regs.a[7].wrapping_sub(size.bytes());
        self.write(bus, sp, size, value)?;
        self.regs.a[7] = sp;
        Ok(())
    }

    /// Pop from the active stack.
    pub(crate) fn pop(&mut self, bus: &mut dyn HostBus, size: Size) -> Result<u32, Fault> {
        let sp = self.regs.a[7];
        let value = self.read(bus, sp, size)?;
        self.regs.a[7] = sp.wrapping_add(size.bytes());
        Ok(value)
    }

    /// N and Z from `value`, V and C cleared, X kept.
    fn set_logic_flags(&mut self, value: u32, size: Size) {
        let sr = Status::logical(self.regs.sr(), value, size);
        self.regs.set_ccr(sr);
    }

    /// Cycles that only the 68000/68010 charge.
    fn add_cycles_000(&mut self, cycles: u32) {
        if !self.caps.long_ops {
            self.extra_cycles += cycles;
        }
    }
}

const fn def(name: &'static str, bits: u16, mask: u16, handler: crate::table::Handler) -> InstrDef {
    InstrDef::new(name, bits, mask, handler)
}

/// Timing for the ALU instructions with an immediate source.
const IMM_ALU: Timing = Timing::new(8, 16, 12, 20, 4);
/// `<ea>,Dn` forms.
const EA_TO_DN: Timing = Timing::new(4, 8, 4, 6, 2);
/// `Dn,<ea>` read-modify-write forms.
const DN_TO_EA: Timing = Timing::new(4, 8, 8, 12, 4);
/// Single-operand read-modify-write (NEG, NOT, CLR, ...).
const UNARY: Timing = Timing::new(4, 6, 8, 12, 4);

/// The instruction list, across all models.
pub(crate) static INSTRUCTIONS: &[InstrDef] = &[
    // ---- Immediate ALU, CCR/SR forms ----
    def("ORI", 0x003C, 0xFFFF, Cpu680x0::exec_ori_ccr).time(Timing::fixed(20, 12)).syntax(Syntax::ImmCcr),
    def("ORI", 0x007C, 0xFFFF, Cpu680x0::exec_ori_sr).time(Timing::fixed(20, 12)).syntax(Syntax::ImmSr),
    def("ANDI", 0x023C, 0xFFFF, Cpu680x0::exec_andi_ccr).time(Timing::fixed(20, 12)).syntax(Syntax::ImmCcr),
    def("ANDI", 0x027C, 0xFFFF, Cpu680x0::exec_andi_sr).time(Timing::fixed(20, 12)).syntax(Syntax::ImmSr),
    def("EORI", 0x0A3C, 0xFFFF, Cpu680x0::exec_eori_ccr).time(Timing::fixed(20, 12)).syntax(Syntax::ImmCcr),
    def("EORI", 0x0A7C, 0xFFFF, Cpu680x0::exec_eori_sr).time(Timing::fixed(20, 12)).syntax(Syntax::ImmSr),
    // ---- Immediate ALU ----
    def("ORI", 0x0000, 0xFF00, Cpu680x0::exec_ori).size(SizeField::Standard).ea(EA_DATA_ALT).time(IMM_ALU).syntax(Syntax::ImmEa),
    def("ANDI", 0x0200, 0xFF00, Cpu680x0::exec_andi).size(SizeField::Standard).ea(EA_DATA_ALT).time(IMM_ALU).syntax(Syntax::ImmEa),
    def("SUBI", 0x0400, 0xFF00, Cpu680x0::exec_subi).size(SizeField::Standard).ea(EA_DATA_ALT).time(IMM_ALU).syntax(Syntax::ImmEa),
    def("ADDI", 0x0600, 0xFF00, Cpu680x0::exec_addi).size(SizeField::Standard).ea(EA_DATA_ALT).time(IMM_ALU).syntax(Syntax::ImmEa),
    def("EORI", 0x0A00, 0xFF00, Cpu680x0::exec_eori).size(SizeField::Standard).ea(EA_DATA_ALT).time(IMM_ALU).syntax(Syntax::ImmEa),
    def("CMPI", 0x0C00, 0xFF00, Cpu680x0::exec_cmpi).size(SizeField::Standard).ea(EA_DATA_ALT).models(PRE_020)
        .time(Timing::new(8, 14, 8, 12, 2)).syntax(Syntax::ImmEa),
    def("CMPI", 0x0C00, 0xFF00, Cpu680x0::exec_cmpi).size(SizeField::Standard).ea(EA_DATA_NO_IMM).models(M020_UP)
        .time(Timing::new(8, 14, 8, 12, 2)).syntax(Syntax::ImmEa),
    def("MOVES", 0x0E00, 0xFF00, Cpu680x0::exec_moves).size(SizeField::Standard).ea(EA_MEM_ALT).models(M010_UP)
        .time(Timing::new(0, 0, 18, 22, 5)).syntax(Syntax::Moves),
    // ---- Bit manipulation ----
    def("MOVEP", 0x0108, 0xF138, Cpu680x0::exec_movep).size(SizeField::Bit6).time(Timing::new(16, 24, 16, 24, 11)).syntax(Syntax::Movep),
    def("BTST", 0x0100, 0xF1C0, Cpu680x0::exec_btst_dyn).ea(EA_DATA).time(Timing::new(6, 6, 4, 4, 4)).syntax(Syntax::BitDyn),
    def("BCHG", 0x0140, 0xF1C0, Cpu680x0::exec_bchg_dyn).ea(EA_DATA_ALT).time(Timing::new(8, 8, 8, 8, 4)).syntax(Syntax::BitDyn),
    def("BCLR", 0x0180, 0xF1C0, Cpu680x0::exec_bclr_dyn).ea(EA_DATA_ALT).time(Timing::new(10, 10, 8, 8, 4)).syntax(Syntax::BitDyn),
    def("BSET", 0x01C0, 0xF1C0, Cpu680x0::exec_bset_dyn).ea(EA_DATA_ALT).time(Timing::new(8, 8, 8, 8, 4)).syntax(Syntax::BitDyn),
    def("BTST", 0x0800, 0xFFC0, Cpu680x0::exec_btst_imm).ea(EA_DATA_NO_IMM).time(Timing::new(10, 10, 8, 8, 4)).syntax(Syntax::BitImm),
    def("BCHG", 0x0840, 0xFFC0, Cpu680x0::exec_bchg_imm).ea(EA_DATA_ALT).time(Timing::new(12, 12, 12, 12, 6)).syntax(Syntax::BitImm),
    def("BCLR", 0x0880, 0xFFC0, Cpu680x0::exec_bclr_imm).ea(EA_DATA_ALT).time(Timing::new(14, 14, 12, 12, 6)).syntax(Syntax::BitImm),
    def("BSET", 0x08C0, 0xFFC0, Cpu680x0::exec_bset_imm).ea(EA_DATA_ALT).time(Timing::new(12, 12, 12, 12, 6)).syntax(Syntax::BitImm),
    // ---- 68020 compare/swap and bounds ----
    def("CAS", 0x08C0, 0xF9C0, Cpu680x0::exec_cas).size(SizeField::Cas).ea(EA_MEM_ALT).models(M020_UP)
        .time(Timing::fixed(0, 12)).syntax(Syntax::Cas),
    def("CHK2", 0x00C0, 0xF9C0, Cpu680x0::exec_chk2).size(SizeField::Chk2).ea(EA_CONTROL).models(M020_UP)
        .time(Timing::fixed(0, 18)).syntax(Syntax::Chk2),
    // ---- MOVE ----
    def("MOVEA", 0x0040, 0xC1C0, Cpu680x0::exec_movea).size(SizeField::MoveAddr).ea(EA_ALL)
        .time(Timing::fixed(4, 2)).syntax(Syntax::EaAn),
    def("MOVE", 0x0000, 0xC000, Cpu680x0::exec_move).size(SizeField::Move).ea(EA_ALL).dest(EA_DATA_ALT)
        .time(Timing::fixed(4, 2)).syntax(Syntax::Move),
    // ---- Group 4 ----
    def("NEGX", 0x4000, 0xFF00, Cpu680x0::exec_negx).size(SizeField::Standard).ea(EA_DATA_ALT).time(UNARY).syntax(Syntax::Ea),
    def("MOVE", 0x40C0, 0xFFC0, Cpu680x0::exec_move_from_sr).ea(EA_DATA_ALT).time(Timing::new(4, 4, 8, 8, 8)).syntax(Syntax::SrEa),
    def("CHK", 0x4180, 0xF1C0, Cpu680x0::exec_chk).size(SizeField::Fixed(Size::Word)).ea(EA_DATA)
        .time(Timing::fixed(10, 8)).syntax(Syntax::EaDn),
    def("CHK", 0x4100, 0xF1C0, Cpu680x0::exec_chk).size(SizeField::Fixed(Size::Long)).ea(EA_DATA).models(M020_UP)
        .time(Timing::fixed(10, 8)).syntax(Syntax::EaDn),
    def("LEA", 0x41C0, 0xF1C0, Cpu680x0::exec_lea).ea_untimed(EA_CONTROL).table(&LEA_000, &CONTROL_020)
        .time(Timing::fixed(0, 2)).syntax(Syntax::EaAn),
    def("CLR", 0x4200, 0xFF00, Cpu680x0::exec_clr).size(SizeField::Standard).ea(EA_DATA_ALT).time(UNARY).syntax(Syntax::Ea),
    def("MOVE", 0x42C0, 0xFFC0, Cpu680x0::exec_move_from_ccr).ea(EA_DATA_ALT).models(M010_UP)
        .time(Timing::new(4, 4, 8, 8, 4)).syntax(Syntax::CcrEa),
    def("NEG", 0x4400, 0xFF00, Cpu680x0::exec_neg).size(SizeField::Standard).ea(EA_DATA_ALT).time(UNARY).syntax(Syntax::Ea),
    def("MOVE", 0x44C0, 0xFFC0, Cpu680x0::exec_move_to_ccr).ea(EA_DATA).time(Timing::fixed(12, 4)).syntax(Syntax::EaCcr),
    def("NOT", 0x4600, 0xFF00, Cpu680x0::exec_not).size(SizeField::Standard).ea(EA_DATA_ALT).time(UNARY).syntax(Syntax::Ea),
    def("MOVE", 0x46C0, 0xFFC0, Cpu680x0::exec_move_to_sr).ea(EA_DATA).time(Timing::fixed(12, 8)).syntax(Syntax::EaSr),
    def("NBCD", 0x4800, 0xFFC0, Cpu680x0::exec_nbcd).ea(EA_DATA_ALT).time(Timing::new(6, 6, 8, 8, 6)).syntax(Syntax::Ea),
    def("LINK", 0x4808, 0xFFF8, Cpu680x0::exec_link_long).models(M020_UP).time(Timing::fixed(0, 6)).syntax(Syntax::LinkL),
    def("SWAP", 0x4840, 0xFFF8, Cpu680x0::exec_swap).time(Timing::fixed(4, 4)).syntax(Syntax::DataReg),
    def("BKPT", 0x4848, 0xFFF8, Cpu680x0::exec_bkpt).models(M010_UP).time(Timing::fixed(4, 10)).syntax(Syntax::Bkpt),
    def("PEA", 0x4840, 0xFFC0, Cpu680x0::exec_pea).ea_untimed(EA_CONTROL).table(&PEA_000, &CONTROL_020)
        .time(Timing::fixed(0, 5)).syntax(Syntax::Ea),
    def("EXT", 0x4880, 0xFFB8, Cpu680x0::exec_ext).size(SizeField::Bit6).time(Timing::fixed(4, 4)).syntax(Syntax::DataReg),
    def("EXTB", 0x49C0, 0xFFF8, Cpu680x0::exec_extb).models(M020_UP).time(Timing::fixed(4, 4)).syntax(Syntax::DataReg),
    def("MOVEM", 0x4880, 0xFF80, Cpu680x0::exec_movem_store).size(SizeField::Bit6).ea_untimed(EA_CONTROL_ALT | EA_PREDEC)
        .table(&MOVEM_STORE_000, &CONTROL_020).time(Timing::fixed(0, 4)).syntax(Syntax::MovemStore),
    def("TST", 0x4A00, 0xFF00, Cpu680x0::exec_tst).size(SizeField::Standard).ea(EA_DATA_ALT).models(PRE_020)
        .time(Timing::fixed(4, 2)).syntax(Syntax::Ea),
    def("TST", 0x4A00, 0xFF00, Cpu680x0::exec_tst).size(SizeField::Standard).ea(EA_ALL).models(M020_UP)
        .time(Timing::fixed(4, 2)).syntax(Syntax::Ea),
    def("ILLEGAL", 0x4AFC, 0xFFFF, Cpu680x0::exec_illegal).time(Timing::fixed(4, 4)),
    def("TAS", 0x4AC0, 0xFFC0, Cpu680x0::exec_tas).ea(EA_DATA_ALT).time(Timing::new(4, 4, 10, 10, 12)).syntax(Syntax::Ea),
    def("MULL", 0x4C00, 0xFFC0, Cpu680x0::exec_mul_long).ea(EA_DATA).models(M020_UP)
        .time(Timing::fixed(0, 43)).syntax(Syntax::MulDivLong),
    def("DIVL", 0x4C40, 0xFFC0, Cpu680x0::exec_div_long).ea(EA_DATA).models(M020_UP)
        .time(Timing::fixed(0, 78)).syntax(Syntax::MulDivLong),
    def("MOVEM", 0x4C80, 0xFF80, Cpu680x0::exec_movem_load).size(SizeField::Bit6).ea_untimed(EA_CONTROL | EA_POSTINC)
        .table(&MOVEM_LOAD_000, &CONTROL_020).time(Timing::fixed(0, 8)).syntax(Syntax::MovemLoad),
    def("TRAP", 0x4E40, 0xFFF0, Cpu680x0::exec_trap).time(Timing::fixed(4, 4)).syntax(Syntax::Trap),
    def("LINK", 0x4E50, 0xFFF8, Cpu680x0::exec_link).time(Timing::fixed(16, 6)).syntax(Syntax::LinkW),
    def("UNLK", 0x4E58, 0xFFF8, Cpu680x0::exec_unlk).time(Timing::fixed(12, 6)).syntax(Syntax::AddrReg),
    def("MOVE", 0x4E60, 0xFFF0, Cpu680x0::exec_move_usp).time(Timing::fixed(4, 2)).syntax(Syntax::MoveUsp),
    def("RESET", 0x4E70, 0xFFFF, Cpu680x0::exec_reset).time(Timing::fixed(132, 518)),
    def("NOP", 0x4E71, 0xFFFF, Cpu680x0::exec_nop).time(Timing::fixed(4, 2)),
    def("STOP", 0x4E72, 0xFFFF, Cpu680x0::exec_stop).time(Timing::fixed(4, 8)).syntax(Syntax::ImmWord),
    def("RTE", 0x4E73, 0xFFFF, Cpu680x0::exec_rte).time(Timing::fixed(20, 20)),
    def("RTD", 0x4E74, 0xFFFF, Cpu680x0::exec_rtd).models(M010_UP).time(Timing::fixed(16, 10)).syntax(Syntax::ImmWord),
    def("RTS", 0x4E75, 0xFFFF, Cpu680x0::exec_rts).time(Timing::fixed(16, 10)),
    def("TRAPV", 0x4E76, 0xFFFF, Cpu680x0::exec_trapv).time(Timing::fixed(4, 4)),
    def("RTR", 0x4E77, 0xFFFF, Cpu680x0::exec_rtr).time(Timing::fixed(20, 14)),
    def("MOVEC", 0x4E7A, 0xFFFE, Cpu680x0::exec_movec).models(M010_UP).time(Timing::fixed(12, 6)).syntax(Syntax::Movec),
    def("JSR", 0x4E80, 0xFFC0, Cpu680x0::exec_jsr).ea_untimed(EA_CONTROL).table(&JSR_000, &CONTROL_020)
        .time(Timing::fixed(0, 4)).syntax(Syntax::Ea),
    def("JMP", 0x4EC0, 0xFFC0, Cpu680x0::exec_jmp).ea_untimed(EA_CONTROL).table(&JMP_000, &CONTROL_020)
        .time(Timing::fixed(0, 4)).syntax(Syntax::Ea),
    // ---- Group 5 ----
    def("TRAPcc", 0x50FA, 0xF0FE, Cpu680x0::exec_trapcc).models(M020_UP).time(Timing::fixed(4, 4)).syntax(Syntax::TrapCc),
    def("TRAPcc", 0x50FC, 0xF0FF, Cpu680x0::exec_trapcc).models(M020_UP).time(Timing::fixed(4, 4)).syntax(Syntax::TrapCc),
    def("DBcc", 0x50C8, 0xF0F8, Cpu680x0::exec_dbcc).time(Timing::fixed(10, 6)).syntax(Syntax::Dbcc),
    def("Scc", 0x50C0, 0xF0C0, Cpu680x0::exec_scc).ea(EA_DATA_ALT).time(Timing::new(4, 4, 8, 8, 4)).syntax(Syntax::Ea),
    def("ADDQ", 0x5000, 0xF100, Cpu680x0::exec_addq).size(SizeField::Standard).ea(EA_ALTERABLE)
        .time(Timing::new(4, 8, 8, 12, 2)).syntax(Syntax::Quick),
    def("SUBQ", 0x5100, 0xF100, Cpu680x0::exec_subq).size(SizeField::Standard).ea(EA_ALTERABLE)
        .time(Timing::new(4, 8, 8, 12, 2)).syntax(Syntax::Quick),
    // ---- Group 6: branches ----
    def("BRA", 0x6000, 0xFF00, Cpu680x0::exec_bra).time(Timing::fixed(10, 10)).syntax(Syntax::Branch),
    def("BSR", 0x6100, 0xFF00, Cpu680x0::exec_bsr).time(Timing::fixed(18, 7)).syntax(Syntax::Branch),
    def("Bcc", 0x6000, 0xF000, Cpu680x0::exec_bcc).time(Timing::fixed(8, 6)).syntax(Syntax::Branch),
    // ---- Group 7 ----
    def("MOVEQ", 0x7000, 0xF100, Cpu680x0::exec_moveq).time(Timing::fixed(4, 2)).syntax(Syntax::Moveq),
    // ---- Group 8: OR, DIV, SBCD, PACK, UNPK ----
    def("DIVU", 0x80C0, 0xF1C0, Cpu680x0::exec_divu).size(SizeField::Fixed(Size::Word)).ea(EA_DATA)
        .time(Timing::fixed(0, 44)).syntax(Syntax::EaDn),
    def("DIVS", 0x81C0, 0xF1C0, Cpu680x0::exec_divs).size(SizeField::Fixed(Size::Word)).ea(EA_DATA)
        .time(Timing::fixed(0, 56)).syntax(Syntax::EaDn),
    def("SBCD", 0x8100, 0xF1F0, Cpu680x0::exec_sbcd).time(Timing::fixed(6, 4)).syntax(Syntax::Extended),
    def("PACK", 0x8140, 0xF1F0, Cpu680x0::exec_pack).models(M020_UP).time(Timing::fixed(0, 6)).syntax(Syntax::PackUnpack),
    def("UNPK", 0x8180, 0xF1F0, Cpu680x0::exec_unpk).models(M020_UP).time(Timing::fixed(0, 8)).syntax(Syntax::PackUnpack),
    def("OR", 0x8000, 0xF100, Cpu680x0::exec_or).size(SizeField::Standard).ea(EA_DATA).time(EA_TO_DN).syntax(Syntax::EaDn),
    def("OR", 0x8100, 0xF100, Cpu680x0::exec_or_to_ea).size(SizeField::Standard).ea(EA_MEM_ALT).time(DN_TO_EA).syntax(Syntax::DnEa),
    // ---- Group 9/D: SUB, ADD ----
    def("SUBA", 0x90C0, 0xF0C0, Cpu680x0::exec_suba).size(SizeField::Bit8).ea(EA_ALL)
        .time(Timing::new(8, 8, 8, 6, 2)).syntax(Syntax::EaAn),
    def("SUBX", 0x9100, 0xF130, Cpu680x0::exec_subx).size(SizeField::Standard).time(Timing::new(4, 8, 4, 8, 2)).syntax(Syntax::Extended),
    def("SUB", 0x9000, 0xF100, Cpu680x0::exec_sub).size(SizeField::Standard).ea(EA_ALL).time(EA_TO_DN).syntax(Syntax::EaDn),
    def("SUB", 0x9100, 0xF100, Cpu680x0::exec_sub_to_ea).size(SizeField::Standard).ea(EA_MEM_ALT).time(DN_TO_EA).syntax(Syntax::DnEa),
    def("ADDA", 0xD0C0, 0xF0C0, Cpu680x0::exec_adda).size(SizeField::Bit8).ea(EA_ALL)
        .time(Timing::new(8, 8, 8, 6, 2)).syntax(Syntax::EaAn),
    def("ADDX", 0xD100, 0xF130, Cpu680x0::exec_addx).size(SizeField::Standard).time(Timing::new(4, 8, 4, 8, 2)).syntax(Syntax::Extended),
    def("ADD", 0xD000, 0xF100, Cpu680x0::exec_add).size(SizeField::Standard).ea(EA_ALL).time(EA_TO_DN).syntax(Syntax::EaDn),
    def("ADD", 0xD100, 0xF100, Cpu680x0::exec_add_to_ea).size(SizeField::Standard).ea(EA_MEM_ALT).time(DN_TO_EA).syntax(Syntax::DnEa),
    // ---- Group B: CMP, EOR ----
    def("CMPA", 0xB0C0, 0xF0C0, Cpu680x0::exec_cmpa).size(SizeField::Bit8).ea(EA_ALL).time(Timing::fixed(6, 4)).syntax(Syntax::EaAn),
    def("CMPM", 0xB108, 0xF138, Cpu680x0::exec_cmpm).size(SizeField::Standard).time(Timing::new(12, 20, 12, 20, 10)).syntax(Syntax::Cmpm),
    def("CMP", 0xB000, 0xF100, Cpu680x0::exec_cmp).size(SizeField::Standard).ea(EA_ALL).time(Timing::new(4, 6, 4, 6, 2)).syntax(Syntax::EaDn),
    def("EOR", 0xB100, 0xF100, Cpu680x0::exec_eor).size(SizeField::Standard).ea(EA_DATA_ALT).time(DN_TO_EA).syntax(Syntax::DnEa),
    // ---- Group C: AND, MUL, ABCD, EXG ----
    def("MULU", 0xC0C0, 0xF1C0, Cpu680x0::exec_mulu).size(SizeField::Fixed(Size::Word)).ea(EA_DATA)
        .time(Timing::fixed(0, 27)).syntax(Syntax::EaDn),
    def("MULS", 0xC1C0, 0xF1C0, Cpu680x0::exec_muls).size(SizeField::Fixed(Size::Word)).ea(EA_DATA)
        .time(Timing::fixed(0, 27)).syntax(Syntax::EaDn),
    def("ABCD", 0xC100, 0xF1F0, Cpu680x0::exec_abcd).time(Timing::fixed(6, 4)).syntax(Syntax::Extended),
    def("EXG", 0xC140, 0xF1F8, Cpu680x0::exec_exg).time(Timing::fixed(6, 2)).syntax(Syntax::Exg),
    def("EXG", 0xC148, 0xF1F8, Cpu680x0::exec_exg).time(Timing::fixed(6, 2)).syntax(Syntax::Exg),
    def("EXG", 0xC188, 0xF1F8, Cpu680x0::exec_exg).time(Timing::fixed(6, 2)).syntax(Syntax::Exg),
    def("AND", 0xC000, 0xF100, Cpu680x0::exec_and).size(SizeField::Standard).ea(EA_DATA).time(EA_TO_DN).syntax(Syntax::EaDn),
    def("AND", 0xC100, 0xF100, Cpu680x0::exec_and_to_ea).size(SizeField::Standard).ea(EA_MEM_ALT).time(DN_TO_EA).syntax(Syntax::DnEa),
    // ---- Group E: shifts, rotates, bit fields ----
    def("ASd", 0xE0C0, 0xFEC0, Cpu680x0::exec_shift_memory).size(SizeField::Fixed(Size::Word)).ea(EA_MEM_ALT)
        .time(Timing::fixed(8, 6)).syntax(Syntax::Ea),
    def("LSd", 0xE2C0, 0xFEC0, Cpu680x0::exec_shift_memory).size(SizeField::Fixed(Size::Word)).ea(EA_MEM_ALT)
        .time(Timing::fixed(8, 6)).syntax(Syntax::Ea),
    def("ROXd", 0xE4C0, 0xFEC0, Cpu680x0::exec_shift_memory).size(SizeField::Fixed(Size::Word)).ea(EA_MEM_ALT)
        .time(Timing::fixed(8, 6)).syntax(Syntax::Ea),
    def("ROd", 0xE6C0, 0xFEC0, Cpu680x0::exec_shift_memory).size(SizeField::Fixed(Size::Word)).ea(EA_MEM_ALT)
        .time(Timing::fixed(8, 6)).syntax(Syntax::Ea),
    def("ASd", 0xE000, 0xF018, Cpu680x0::exec_shift_register).size(SizeField::Standard)
        .time(Timing::new(6, 8, 6, 8, 6)).syntax(Syntax::ShiftReg),
    def("LSd", 0xE008, 0xF018, Cpu680x0::exec_shift_register).size(SizeField::Standard)
        .time(Timing::new(6, 8, 6, 8, 4)).syntax(Syntax::ShiftReg),
    def("ROXd", 0xE010, 0xF018, Cpu680x0::exec_shift_register).size(SizeField::Standard)
        .time(Timing::new(6, 8, 6, 8, 12)).syntax(Syntax::ShiftReg),
    def("ROd", 0xE018, 0xF018, Cpu680x0::exec_shift_register).size(SizeField::Standard)
        .time(Timing::new(6, 8, 6, 8, 6)).syntax(Syntax::ShiftReg),
    def("BFTST", 0xE8C0, 0xFFC0, Cpu680x0::exec_bitfield).ea_untimed(EA_DN | EA_CONTROL).models(M020_UP)
        .time(Timing::fixed(0, 13)).syntax(Syntax::Bitfield),
    def("BFEXTU", 0xE9C0, 0xFFC0, Cpu680x0::exec_bitfield).ea_untimed(EA_DN | EA_CONTROL).models(M020_UP)
        .time(Timing::fixed(0, 18)).syntax(Syntax::Bitfield),
    def("BFCHG", 0xEAC0, 0xFFC0, Cpu680x0::exec_bitfield).ea_untimed(EA_DN | EA_CONTROL_ALT).models(M020_UP)
        .time(Timing::fixed(0, 24)).syntax(Syntax::Bitfield),
    def("BFEXTS", 0xEBC0, 0xFFC0, Cpu680x0::exec_bitfield).ea_untimed(EA_DN | EA_CONTROL).models(M020_UP)
        .time(Timing::fixed(0, 18)).syntax(Syntax::Bitfield),
    def("BFCLR", 0xECC0, 0xFFC0, Cpu680x0::exec_bitfield).ea_untimed(EA_DN | EA_CONTROL_ALT).models(M020_UP)
        .time(Timing::fixed(0, 24)).syntax(Syntax::Bitfield),
    def("BFFFO", 0xEDC0, 0xFFC0, Cpu680x0::exec_bitfield).ea_untimed(EA_DN | EA_CONTROL).models(M020_UP)
        .time(Timing::fixed(0, 32)).syntax(Syntax::Bitfield),
    def("BFSET", 0xEEC0, 0xFFC0, Cpu680x0::exec_bitfield).ea_untimed(EA_DN | EA_CONTROL_ALT).models(M020_UP)
        .time(Timing::fixed(0, 24)).syntax(Syntax::Bitfield),
    def("BFINS", 0xEFC0, 0xFFC0, Cpu680x0::exec_bitfield).ea_untimed(EA_DN | EA_CONTROL_ALT).models(M020_UP)
        .time(Timing::fixed(0, 21)).syntax(Syntax::Bitfield),
    // ---- Line A / line F ----
    def("LINEA", 0xA000, 0xF000, Cpu680x0::exec_line_a).time(Timing::fixed(4, 4)),
    def("CINV", 0xF400, 0xFF20, Cpu680x0::exec_cache).models(M040_ONLY).time(Timing::fixed(0, 16)).syntax(Syntax::Cache),
    def("CPUSH", 0xF420, 0xFF20, Cpu680x0::exec_cache).models(M040_ONLY).time(Timing::fixed(0, 16)).syntax(Syntax::Cache),
    def("MOVE16", 0xF620, 0xFFF8, Cpu680x0::exec_move16).models(M040_ONLY).time(Timing::fixed(0, 18)).syntax(Syntax::Move16),
    def("MOVE16", 0xF600, 0xFFE0, Cpu680x0::exec_move16).models(M040_ONLY).time(Timing::fixed(0, 18)).syntax(Syntax::Move16),
    def("LINEF", 0xF000, 0xF000, Cpu680x0::exec_line_f).time(Timing::fixed(4, 4)),
];

#[cfg(test)]
mod tests {
    use crate::model::CpuModel;
    use crate::table::DispatchTable;

    #[test]
    fn every_model_decodes_its_baseline() {
        for model in CpuModel::ALL {
            let t = DispatchTable::for_model(model);
            for op in [0x4E71u16, 0x2200, 0xD081, 0x6700, 0x4E75, 0xE348, 0x4E40, 0x4E73] {
                assert!(t.def(op).is_some(), "{model}: {op:#06X}");
            }
        }
    }

    #[test]
    fn later_models_only_add_opcodes() {
        let old = DispatchTable::for_model(CpuModel::M68000);
        let new = DispatchTable::for_model(CpuModel::M68020);
        for op in 0..=u16::MAX {
            if old.def(op).is_some() {
                assert!(new.def(op).is_some(), "{op:#06X} lost on the 68020");
            }
        }
    }

    #[test]
    fn fpu_and_mmu_opcodes_take_line_f() {
        let t = DispatchTable::for_model(CpuModel::M68040);
        assert_eq!(t.def(0xF200).map(|d| d.name), Some("LINEF")); // FPU general
        assert_eq!(t.def(0xF000).map(|d| d.name), Some("LINEF")); // PMOVE
        assert_eq!(t.def(0xF4D8).map(|d| d.name), Some("CINV"));
    }
}
