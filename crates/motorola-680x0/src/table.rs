//! Opcode dispatch table generated from the declarative instruction list.
//!
//! Every one of the 65536 opcode words gets an entry: the instruction
//! definition that claims it (or none, which routes to the illegal
//! instruction handler) and its base cycle cost with the cost of the
//! effective address folded in. The table is derived, never edited: to add
//! or fix an instruction, change its definition in `ops`.
//!
//! Matching walks the definitions from the most specific mask to the least
//! specific one (ties keep list order) and takes the first definition whose
//! fixed bits match, whose model mask includes the configured model, whose
//! size field is a valid encoding and whose EA fields are in the allowed
//! classes. Byte operations on an address register never match.

use std::cmp::Reverse;
use std::sync::OnceLock;

use crate::addressing::{AddrMode, EaClass};
use crate::alu::Size;
use crate::cpu::Cpu680x0;
use crate::decode::Syntax;
use crate::exceptions::Fault;
use crate::memory::HostBus;
use crate::model::{ALL_MODELS, CpuModel, ModelMask, TimingClass};
use crate::timing::{self, ModeTable};

/// Instruction handler. Extension words are fetched by the handler itself.
pub(crate) type Handler = fn(&mut Cpu680x0, &mut dyn HostBus, u16) -> Result<(), Fault>;

/// Where an instruction keeps its operation size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SizeField {
    /// Unsized (or sized by something other than a field).
    None,
    /// Always this size.
    Fixed(Size),
    /// Bits 7-6: 00 byte, 01 word, 10 long.
    Standard,
    /// Bits 13-12: 01 byte, 11 word, 10 long.
    Move,
    /// MOVEA: bits 13-12, word or long only.
    MoveAddr,
    /// Bit 6: 0 word, 1 long (MOVEM).
    Bit6,
    /// Bit 8: 0 word, 1 long (ADDA, SUBA, CMPA).
    Bit8,
    /// Bits 10-9: 01 byte, 10 word, 11 long (CAS).
    Cas,
    /// Bits 10-9: 00 byte, 01 word, 10 long (CHK2/CMP2).
    Chk2,
}

impl SizeField {
    /// Operation size, or `None` for unsized and invalid encodings.
    pub(crate) fn size(self, opcode: u16) -> Option<Size> {
        let bits = |shift: u16| ((opcode >> shift) & 3) as u8;
        match self {
            Self::None => None,
            Self::Fixed(size) => Some(size),
            Self::Standard => Size::from_bits(bits(6)),
            Self::Move => Size::from_move_bits(bits(12)),
            Self::MoveAddr => match bits(12) {
                2 => Some(Size::Long),
                3 => Some(Size::Word),
                _ => None,
            },
            Self::Bit6 | Self::Bit8 => {
                let bit = if self == Self::Bit6 { 6 } else { 8 };
                Some(if opcode & (1 << bit) != 0 { Size::Long } else { Size::Word })
            }
            Self::Cas => match bits(9) {
                1 => Some(Size::Byte),
                2 => Some(Size::Word),
                3 => Some(Size::Long),
                _ => None,
            },
            Self::Chk2 => Size::from_bits(bits(9)),
        }
    }

    fn accepts(self, opcode: u16) -> bool {
        self == Self::None || self.size(opcode).is_some()
    }

    /// Whether the disassembler prints a size suffix.
    pub(crate) fn shows_suffix(self) -> bool {
        !matches!(self, Self::None | Self::Fixed(_))
    }
}

/// 68000 base cycles as (register or immediate EA, memory EA), each as
/// (byte/word, long); plus the 68020 cache-case base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Timing {
    reg: [u16; 2],
    mem: [u16; 2],
    c020: u16,
}

impl Timing {
    pub(crate) const fn new(reg_w: u16, reg_l: u16, mem_w: u16, mem_l: u16, c020: u16) -> Self {
        Self {
            reg: [reg_w, reg_l],
            mem: [mem_w, mem_l],
            c020,
        }
    }

    /// Same cost regardless of size and operand location.
    pub(crate) const fn fixed(c000: u16, c020: u16) -> Self {
        Self::new(c000, c000, c000, c000, c020)
    }
}

/// How the effective address cost is folded into the base cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EaTime {
    /// Nothing to add (or the handler accounts for it).
    None,
    /// Operand fetch cost of the EA in bits 5-0.
    Source,
    /// MOVE: source fetch plus destination write.
    Move,
    /// Per-mode totals for control instructions: 68000 and 68020 tables.
    Table(&'static ModeTable, &'static ModeTable),
}

/// One line of the instruction list.
#[derive(Clone, Copy)]
pub(crate) struct InstrDef {
    pub name: &'static str,
    pub bits: u16,
    pub mask: u16,
    pub size: SizeField,
    /// Allowed modes for the EA in bits 5-0 (0: no EA there).
    pub ea: EaClass,
    /// Allowed modes for the MOVE destination in bits 11-6 (0: none).
    pub ea2: EaClass,
    pub models: ModelMask,
    pub timing: Timing,
    pub ea_time: EaTime,
    pub syntax: Syntax,
    pub handler: Handler,
}

impl InstrDef {
    pub(crate) const fn new(name: &'static str, bits: u16, mask: u16, handler: Handler) -> Self {
        Self {
            name,
            bits,
            mask,
            size: SizeField::None,
            ea: 0,
            ea2: 0,
            models: ALL_MODELS,
            timing: Timing::fixed(4, 2),
            ea_time: EaTime::None,
            syntax: Syntax::None,
            handler,
        }
    }

    pub(crate) const fn size(mut self, size: SizeField) -> Self {
        self.size = size;
        self
    }

    /// EA field in bits 5-0; its fetch cost is added to the base.
    pub(crate) const fn ea(mut self, class: EaClass) -> Self {
        self.ea = class;
        self.ea_time = EaTime::Source;
        self
    }

    /// EA field in bits 5-0 whose cost the handler or a table accounts for.
    pub(crate) const fn ea_untimed(mut self, class: EaClass) -> Self {
        self.ea = class;
        self.ea_time = EaTime::None;
        self
    }

    pub(crate) const fn dest(mut self, class: EaClass) -> Self {
        self.ea2 = class;
        self.ea_time = EaTime::Move;
        self
    }

    pub(crate) const fn models(mut self, models: ModelMask) -> Self {
        self.models = models;
        self
    }

    pub(crate) const fn time(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub(crate) const fn table(mut self, t000: &'static ModeTable, t020: &'static ModeTable) -> Self {
        self.ea_time = EaTime::Table(t000, t020);
        self
    }

    pub(crate) const fn syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    fn mode_ok(class: EaClass, mode: Option<AddrMode>) -> bool {
        class == 0 || mode.is_some_and(|m| class & m.bit() != 0)
    }

    /// Does this definition claim `opcode` on `model`?
    fn claims(&self, opcode: u16, model: CpuModel) -> bool {
        if opcode & self.mask != self.bits || self.models & model.bit() == 0 {
            return false;
        }
        if !self.size.accepts(opcode) {
            return false;
        }
        let src = AddrMode::from_ea_field(opcode);
        let dst = AddrMode::from_move_dest(opcode);
        if !Self::mode_ok(self.ea, src) || !Self::mode_ok(self.ea2, dst) {
            return false;
        }
        if self.size.size(opcode) == Some(Size::Byte) {
            let an = |class: EaClass, mode: Option<AddrMode>| {
                class != 0 && matches!(mode, Some(AddrMode::AddrReg(_)))
            };
            if an(self.ea, src) || an(self.ea2, dst) {
                return false;
            }
        }
        true
    }

    /// (total base cycles, of which effective address cycles).
    fn cost(&self, opcode: u16, class: TimingClass) -> (u16, u16) {
        let size = self.size.size(opcode).unwrap_or(Size::Word);
        let long = usize::from(size == Size::Long);
        let src = if self.ea == 0 {
            None
        } else {
            AddrMode::from_ea_field(opcode)
        };
        let in_memory = src.is_some_and(|m| !m.is_register() && m != AddrMode::Immediate);

        let base = match class {
            TimingClass::M68020 => self.timing.c020,
            _ if in_memory => self.timing.mem[long],
            _ => self.timing.reg[long],
        };
        let ea = match (self.ea_time, src) {
            (EaTime::Source, Some(m)) => timing::ea_fetch(class, m, size),
            (EaTime::Move, Some(m)) => {
                let dst = AddrMode::from_move_dest(opcode).map_or(0, |d| timing::move_dest(class, d, size));
                timing::ea_fetch(class, m, size) + dst
            }
            (EaTime::Table(t000, t020), Some(m)) => match class {
                TimingClass::M68020 => t020[m.index()],
                _ => t000[m.index()],
            },
            _ => 0,
        };
        (base + u16::from(ea), u16::from(ea))
    }
}

/// Dispatch entry for one opcode word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry {
    def: u16,
    /// Base cost including the effective address.
    pub cycles: u16,
    /// The effective address part of `cycles`.
    pub ea_cycles: u16,
}

impl Entry {
    const UNMATCHED: u16 = u16::MAX;
}

/// The 2^16-entry decode table for one model.
pub(crate) struct DispatchTable {
    entries: Box<[Entry]>,
    defs: Vec<&'static InstrDef>,
}

impl DispatchTable {
    /// Build the table for `model` from [`crate::ops::INSTRUCTIONS`].
    pub(crate) fn build(model: CpuModel) -> Self {
        let mut defs: Vec<&'static InstrDef> = crate::ops::INSTRUCTIONS
            .iter()
            .filter(|d| d.models & model.bit() != 0)
            .collect();
        defs.sort_by_key(|d| Reverse(d.mask.count_ones()));

        let class = model.timing();
        let entries = (0..=u16::MAX)
            .map(|opcode| {
                defs.iter()
                    .position(|d| d.claims(opcode, model))
                    .map_or(
                        Entry {
                            def: Entry::UNMATCHED,
                            cycles: 0,
                            ea_cycles: 0,
                        },
                        |i| {
                            let (cycles, ea_cycles) = defs[i].cost(opcode, class);
                            Entry {
                                def: i as u16,
                                cycles,
                                ea_cycles,
                            }
                        },
                    )
            })
            .collect();
        Self { entries, defs }
    }

    /// Shared, lazily built table for `model`.
    pub(crate) fn for_model(model: CpuModel) -> &'static Self {
        static TABLES: [OnceLock<DispatchTable>; 8] = [const { OnceLock::new() }; 8];
        TABLES[model.index()].get_or_init(|| Self::build(model))
    }

    pub(crate) fn entry(&self, opcode: u16) -> Entry {
        self.entries[usize::from(opcode)]
    }

    /// The definition that claims `opcode`, if any.
    pub(crate) fn def(&self, opcode: u16) -> Option<&'static InstrDef> {
        let entry = self.entry(opcode);
        if entry.def == Entry::UNMATCHED {
            None
        } else {
            Some(self.defs[usize::from(entry.def)])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(model: CpuModel, opcode: u16) -> Option<&'static str> {
        DispatchTable::for_model(model).def(opcode).map(|d| d.name)
    }

    #[test]
    fn specific_patterns_win() {
        let m = CpuModel::M68000;
        assert_eq!(name(m, 0x4E71), Some("NOP"));
        assert_eq!(name(m, 0x4E75), Some("RTS"));
        assert_eq!(name(m, 0x3040), Some("MOVEA")); // MOVEA.W D0,A0
        assert_eq!(name(m, 0x3000), Some("MOVE"));
        assert_eq!(name(m, 0xD388), Some("ADDX")); // ADDX.L -(A0),-(A1)
        assert_eq!(name(m, 0x4880), Some("EXT")); // EXT.W D0
        assert_eq!(name(m, 0x4890), Some("MOVEM")); // MOVEM.W list,(A0)
        assert_eq!(name(m, 0x6000), Some("BRA"));
        assert_eq!(name(m, 0x6700), Some("Bcc"));
    }

    #[test]
    fn invalid_encodings_are_unmatched() {
        let m = CpuModel::M68000;
        assert_eq!(name(m, 0x1008), None); // MOVE.B A0,D0
        assert_eq!(name(m, 0x5108), None); // SUBQ.B #8,A0
        assert_eq!(name(m, 0x4AFC), Some("ILLEGAL"));
        assert_eq!(name(m, 0x00FC), None); // ORI with size 11
        assert_eq!(name(m, 0xA123), Some("LINEA"));
    }

    #[test]
    fn model_gating() {
        assert_eq!(name(CpuModel::M68000, 0x49C0), None); // EXTB.L
        assert_eq!(name(CpuModel::M68020, 0x49C0), Some("EXTB"));
        assert_eq!(name(CpuModel::M68000, 0x4E7A), None); // MOVEC
        assert_eq!(name(CpuModel::M68010, 0x4E7A), Some("MOVEC"));
        assert_eq!(name(CpuModel::M68030, 0xF620), None);
        assert_eq!(name(CpuModel::M68040, 0xF620), Some("MOVE16"));
    }

    #[test]
    fn cycle_costs_fold_in_effective_address() {
        let t = DispatchTable::for_model(CpuModel::M68000);
        assert_eq!(t.entry(0x4E71).cycles, 4); // NOP
        assert_eq!(t.entry(0x4E75).cycles, 16); // RTS
        assert_eq!(t.entry(0x203C).cycles, 12); // MOVE.L #imm,D0
        assert_eq!(t.entry(0x3010).cycles, 8); // MOVE.W (A0),D0
        assert_eq!(t.entry(0x41F9).cycles, 12); // LEA abs.L,A0
        assert_eq!(t.entry(0x4EB9).cycles, 20); // JSR abs.L
        assert_eq!(t.entry(0x4290).cycles, 20); // CLR.L (A0)
    }

    #[test]
    fn reset_costs_fit_the_table() {
        let reset = |model| DispatchTable::for_model(model).entry(0x4E70).cycles;
        assert_eq!(reset(CpuModel::M68000), 132);
        assert_eq!(reset(CpuModel::M68020), 518);
        assert_eq!(reset(CpuModel::M68040), 518);
    }

    #[test]
    fn rebuilding_reproduces_the_table() {
        let a = DispatchTable::build(CpuModel::M68010);
        let b = DispatchTable::for_model(CpuModel::M68010);
        assert!(a.entries.iter().eq(b.entries.iter()));
    }
}
