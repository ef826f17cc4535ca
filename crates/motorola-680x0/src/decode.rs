//! Length decoding and disassembly.
//!
//! Both are driven by the dispatch table: the definition that executes an
//! opcode also describes its operand layout, so the length reported here is
//! exactly what the engine consumes when it runs the instruction.

use std::fmt::Write as _;

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::cpu::Cpu680x0;
use crate::flags::Status;
use crate::memory::HostBus;
use crate::model::CpuModel;
use crate::table::{DispatchTable, InstrDef};

/// Operand layout of an instruction, after the opcode word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Syntax {
    None,
    /// `<ea>`
    Ea,
    /// `#imm,<ea>`
    ImmEa,
    /// `#imm,CCR`
    ImmCcr,
    /// `#imm,SR`
    ImmSr,
    /// `<ea>,Dn`
    EaDn,
    /// `Dn,<ea>`
    DnEa,
    /// `<ea>,An`
    EaAn,
    /// `<ea>,<ea>`
    Move,
    /// `#1-8,<ea>`
    Quick,
    /// `#-128..127,Dn`
    Moveq,
    Branch,
    Dbcc,
    /// `Dn,<ea>` with byte (memory) or long (register) size.
    BitDyn,
    /// `#n,<ea>` with byte (memory) or long (register) size.
    BitImm,
    /// `#1-8,Dy` or `Dx,Dy`
    ShiftReg,
    /// `Dy,Dx` or `-(Ay),-(Ax)`
    Extended,
    /// `(Ay)+,(Ax)+`
    Cmpm,
    Exg,
    MovemStore,
    MovemLoad,
    Movep,
    Trap,
    LinkW,
    LinkL,
    DataReg,
    AddrReg,
    MoveUsp,
    /// `#imm16`
    ImmWord,
    SrEa,
    EaSr,
    CcrEa,
    EaCcr,
    Movec,
    Moves,
    MulDivLong,
    Chk2,
    Cas,
    Bitfield,
    TrapCc,
    PackUnpack,
    Cache,
    Move16,
    Bkpt,
}

/// Result of decoding one instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    /// Instruction length in bytes, extension words included.
    pub length: u32,
    /// Assembler text.
    pub mnemonic: String,
}

struct Reader<'a> {
    read: &'a mut dyn FnMut(u32) -> u16,
    pc: u32,
    full_extension: bool,
}

impl Reader<'_> {
    fn word(&mut self) -> u16 {
        let w = (self.read)(self.pc);
        self.pc = self.pc.wrapping_add(2);
        w
    }

    fn long(&mut self) -> u32 {
        let hi = self.word();
        let lo = self.word();
        (u32::from(hi) << 16) | u32::from(lo)
    }

    fn imm(&mut self, size: Size) -> u32 {
        match size {
            Size::Byte => u32::from(self.word() & 0xFF),
            Size::Word => u32::from(self.word()),
            Size::Long => self.long(),
        }
    }

    fn ea(&mut self, mode: Option<AddrMode>, size: Size) -> String {
        let Some(mode) = mode else {
            return "?".to_string();
        };
        match mode {
            AddrMode::DataReg(r) => format!("D{r}"),
            AddrMode::AddrReg(r) => format!("A{r}"),
            AddrMode::AddrInd(r) => format!("(A{r})"),
            AddrMode::AddrIndPostInc(r) => format!("(A{r})+"),
            AddrMode::AddrIndPreDec(r) => format!("-(A{r})"),
            AddrMode::AddrIndDisp(r) => {
                let d = self.word() as i16;
                format!("{}(A{r})", signed(i32::from(d)))
            }
            AddrMode::AddrIndIndex(r) => self.indexed(&format!("A{r}")),
            AddrMode::AbsShort => format!("${:04X}.W", self.word()),
            AddrMode::AbsLong => format!("${:08X}.L", self.long()),
            AddrMode::PcDisp => {
                let base = self.pc;
                let d = self.word() as i16;
                format!("${:X}(PC)", base.wrapping_add(d as u32))
            }
            AddrMode::PcIndex => self.indexed("PC"),
            AddrMode::Immediate => format!("#${:X}", self.imm(size)),
        }
    }

    fn indexed(&mut self, base: &str) -> String {
        let ext = self.word();
        let reg = (ext >> 12) & 7;
        let kind = if ext & 0x8000 != 0 { 'A' } else { 'D' };
        let width = if ext & 0x0800 != 0 { 'L' } else { 'W' };
        let scale = 1 << ((ext >> 9) & 3);
        let mut xn = format!("{kind}{reg}.{width}");
        if self.full_extension && scale > 1 {
            let _ = write!(xn, "*{scale}");
        }
        if !self.full_extension || ext & 0x0100 == 0 {
            return format!("{}({base},{xn})", signed(i32::from(ext as u8 as i8)));
        }

        let bd = match (ext >> 4) & 3 {
            2 => i64::from(self.word() as i16),
            3 => i64::from(self.long() as i32),
            _ => 0,
        };
        let base = if ext & 0x0080 != 0 { String::new() } else { format!(",{base}") };
        let xn = if ext & 0x0040 != 0 { String::new() } else { format!(",{xn}") };
        let selector = ext & 7;
        let od = match selector & 3 {
            2 => i64::from(self.word() as i16),
            3 => i64::from(self.long() as i32),
            _ => 0,
        };
        let bd = signed(bd as i32);
        match selector {
            0 => format!("({bd}{base}{xn})"),
            1..=3 => format!("([{bd}{base}{xn}],{})", signed(od as i32)),
            _ => format!("([{bd}{base}]{xn},{})", signed(od as i32)),
        }
    }
}

fn signed(value: i32) -> String {
    if value < 0 {
        format!("-${:X}", value.unsigned_abs())
    } else {
        format!("${value:X}")
    }
}

/// MOVEM register list; `reversed` for the predecrement form (bit 0 = A7).
fn register_list(mask: u16, reversed: bool) -> String {
    let mask = if reversed { mask.reverse_bits() } else { mask };
    let mut parts = Vec::new();
    for (bank, kind) in [(0, 'D'), (8, 'A')] {
        let mut n = 0;
        while n < 8 {
            if mask & (1 << (bank + n)) == 0 {
                n += 1;
                continue;
            }
            let start = n;
            while n < 8 && mask & (1 << (bank + n)) != 0 {
                n += 1;
            }
            if n - start == 1 {
                parts.push(format!("{kind}{start}"));
            } else {
                parts.push(format!("{kind}{start}-{kind}{}", n - 1));
            }
        }
    }
    parts.join("/")
}

fn control_register(code: u16) -> String {
    match code & 0x0FFF {
        0x000 => "SFC".into(),
        0x001 => "DFC".into(),
        0x002 => "CACR".into(),
        0x800 => "USP".into(),
        0x801 => "VBR".into(),
        0x802 => "CAAR".into(),
        0x803 => "MSP".into(),
        0x804 => "ISP".into(),
        other => format!("CR${other:03X}"),
    }
}

fn general_register(n: u16) -> String {
    let kind = if n & 8 != 0 { 'A' } else { 'D' };
    format!("{kind}{}", n & 7)
}

fn mnemonic_base(def: &InstrDef, opcode: u16) -> String {
    let name = def.name;
    if let Some(stem) = name.strip_suffix("cc") {
        let cc = ((opcode >> 8) & 0x0F) as u8;
        return format!("{stem}{}", Status::condition_name(cc));
    }
    if let Some(stem) = name.strip_suffix('d') {
        let dir = if opcode & 0x0100 != 0 { 'L' } else { 'R' };
        return format!("{stem}{dir}");
    }
    name.to_string()
}

/// Decode the instruction at `pc`. `read_word` supplies big-endian words
/// of the instruction stream.
pub fn disassemble(read_word: &mut dyn FnMut(u32) -> u16, pc: u32, model: CpuModel) -> Disassembly {
    let mut r = Reader {
        read: read_word,
        pc,
        full_extension: model.capabilities().full_extension,
    };
    let opcode = r.word();
    let Some(def) = DispatchTable::for_model(model).def(opcode) else {
        return Disassembly {
            length: 2,
            mnemonic: format!("DC.W ${opcode:04X}"),
        };
    };

    let size = def.size.size(opcode);
    let sz = size.unwrap_or(Size::Word);
    let src = AddrMode::from_ea_field(opcode);
    let dst = AddrMode::from_move_dest(opcode);
    let dn = (opcode >> 9) & 7;
    let low = opcode & 7;
    let mut name = mnemonic_base(def, opcode);
    let mut suffix = if def.size.shows_suffix() {
        size.map_or("", Size::suffix)
    } else {
        ""
    };

    let operands = match def.syntax {
        Syntax::None => String::new(),
        Syntax::Ea => r.ea(src, sz),
        Syntax::ImmEa => {
            let imm = r.imm(sz);
            format!("#${imm:X},{}", r.ea(src, sz))
        }
        Syntax::ImmCcr => format!("#${:02X},CCR", r.word() & 0xFF),
        Syntax::ImmSr => format!("#${:04X},SR", r.word()),
        Syntax::EaDn => format!("{},D{dn}", r.ea(src, sz)),
        Syntax::DnEa => format!("D{dn},{}", r.ea(src, sz)),
        Syntax::EaAn => format!("{},A{dn}", r.ea(src, sz)),
        Syntax::Move => {
            let s = r.ea(src, sz);
            format!("{s},{}", r.ea(dst, sz))
        }
        Syntax::Quick => {
            let q = if dn == 0 { 8 } else { dn };
            format!("#{q},{}", r.ea(src, sz))
        }
        Syntax::Moveq => format!("#{},D{dn}", signed(i32::from(opcode as u8 as i8))),
        Syntax::Branch => {
            let base = r.pc;
            let disp = match opcode & 0xFF {
                0 => {
                    suffix = ".W";
                    i32::from(r.word() as i16)
                }
                0xFF if model.capabilities().long_ops => {
                    suffix = ".L";
                    r.long() as i32
                }
                d => {
                    suffix = ".S";
                    i32::from(d as u8 as i8)
                }
            };
            format!("${:X}", base.wrapping_add(disp as u32))
        }
        Syntax::Dbcc => {
            let base = r.pc;
            let disp = r.word() as i16;
            format!("D{low},${:X}", base.wrapping_add(disp as u32))
        }
        Syntax::BitDyn | Syntax::BitImm => {
            let bit_size = if matches!(src, Some(AddrMode::DataReg(_))) {
                Size::Long
            } else {
                Size::Byte
            };
            suffix = bit_size.suffix();
            let bit = if def.syntax == Syntax::BitImm {
                format!("#{}", r.word() & 0xFF)
            } else {
                format!("D{dn}")
            };
            format!("{bit},{}", r.ea(src, bit_size))
        }
        Syntax::ShiftReg => {
            if opcode & 0x0020 != 0 {
                format!("D{dn},D{low}")
            } else {
                let q = if dn == 0 { 8 } else { dn };
                format!("#{q},D{low}")
            }
        }
        Syntax::Extended => {
            if opcode & 0x0008 != 0 {
                format!("-(A{low}),-(A{dn})")
            } else {
                format!("D{low},D{dn}")
            }
        }
        Syntax::Cmpm => format!("(A{low})+,(A{dn})+"),
        Syntax::Exg => match (opcode >> 3) & 0x1F {
            0x08 => format!("D{dn},D{low}"),
            0x09 => format!("A{dn},A{low}"),
            _ => format!("D{dn},A{low}"),
        },
        Syntax::MovemStore => {
            let mask = r.word();
            let predec = matches!(src, Some(AddrMode::AddrIndPreDec(_)));
            format!("{},{}", register_list(mask, predec), r.ea(src, sz))
        }
        Syntax::MovemLoad => {
            let mask = r.word();
            format!("{},{}", r.ea(src, sz), register_list(mask, false))
        }
        Syntax::Movep => {
            let d = signed(i32::from(r.word() as i16));
            if opcode & 0x0080 != 0 {
                format!("D{dn},{d}(A{low})")
            } else {
                format!("{d}(A{low}),D{dn}")
            }
        }
        Syntax::Trap => format!("#{}", opcode & 0x0F),
        Syntax::LinkW => format!("A{low},#{}", signed(i32::from(r.word() as i16))),
        Syntax::LinkL => format!("A{low},#{}", signed(r.long() as i32)),
        Syntax::DataReg => format!("D{low}"),
        Syntax::AddrReg => format!("A{low}"),
        Syntax::MoveUsp => {
            if opcode & 0x0008 != 0 {
                format!("USP,A{low}")
            } else {
                format!("A{low},USP")
            }
        }
        Syntax::ImmWord => format!("#${:04X}", r.word()),
        Syntax::SrEa => format!("SR,{}", r.ea(src, Size::Word)),
        Syntax::EaSr => format!("{},SR", r.ea(src, Size::Word)),
        Syntax::CcrEa => format!("CCR,{}", r.ea(src, Size::Word)),
        Syntax::EaCcr => format!("{},CCR", r.ea(src, Size::Word)),
        Syntax::Movec => {
            let ext = r.word();
            let rn = general_register(ext >> 12);
            let cr = control_register(ext);
            if opcode & 1 != 0 {
                format!("{rn},{cr}")
            } else {
                format!("{cr},{rn}")
            }
        }
        Syntax::Moves => {
            let ext = r.word();
            let rn = general_register(ext >> 12);
            let ea = r.ea(src, sz);
            if ext & 0x0800 != 0 {
                format!("{rn},{ea}")
            } else {
                format!("{ea},{rn}")
            }
        }
        Syntax::MulDivLong => {
            let ext = r.word();
            let signed_op = if ext & 0x0800 != 0 { "S" } else { "U" };
            let dl = (ext >> 12) & 7;
            let dh = ext & 7;
            let quad = ext & 0x0400 != 0;
            let ea = r.ea(src, Size::Long);
            let divide = name.starts_with("DIV");
            name = format!("{}{signed_op}", &name[..3]);
            if divide && !quad && dh != dl {
                name.push('L');
            }
            suffix = ".L";
            if quad || (divide && dh != dl) {
                format!("{ea},D{dh}:D{dl}")
            } else {
                format!("{ea},D{dl}")
            }
        }
        Syntax::Chk2 => {
            let ext = r.word();
            name = if ext & 0x0800 != 0 { "CHK2" } else { "CMP2" }.to_string();
            format!("{},{}", r.ea(src, sz), general_register(ext >> 12))
        }
        Syntax::Cas => {
            let ext = r.word();
            format!("D{},D{},{}", ext & 7, (ext >> 6) & 7, r.ea(src, sz))
        }
        Syntax::Bitfield => {
            let ext = r.word();
            let offset = if ext & 0x0800 != 0 {
                format!("D{}", (ext >> 6) & 7)
            } else {
                format!("{}", (ext >> 6) & 0x1F)
            };
            let width = if ext & 0x0020 != 0 {
                format!("D{}", ext & 7)
            } else {
                let w = ext & 0x1F;
                format!("{}", if w == 0 { 32 } else { w })
            };
            let field = format!("{}{{{offset}:{width}}}", r.ea(src, Size::Long));
            let reg = (ext >> 12) & 7;
            match name.as_str() {
                "BFEXTU" | "BFEXTS" | "BFFFO" => format!("{field},D{reg}"),
                "BFINS" => format!("D{reg},{field}"),
                _ => field,
            }
        }
        Syntax::TrapCc => match low {
            2 => {
                suffix = ".W";
                format!("#${:04X}", r.word())
            }
            3 => {
                suffix = ".L";
                format!("#${:08X}", r.long())
            }
            _ => String::new(),
        },
        Syntax::PackUnpack => {
            let adj = r.word();
            if opcode & 0x0008 != 0 {
                format!("-(A{low}),-(A{dn}),#${adj:04X}")
            } else {
                format!("D{low},D{dn},#${adj:04X}")
            }
        }
        Syntax::Cache => {
            let caches = ["NC", "DC", "IC", "BC"][usize::from((opcode >> 6) & 3)];
            let scope = (opcode >> 3) & 3;
            let letter = ["", "L", "P", "A"][usize::from(scope)];
            name = format!("{name}{letter}");
            if scope == 3 {
                caches.to_string()
            } else {
                format!("{caches},(A{low})")
            }
        }
        Syntax::Move16 => {
            if opcode & 0x0020 != 0 {
                let ext = r.word();
                format!("(A{low})+,(A{})+", (ext >> 12) & 7)
            } else {
                let abs = format!("${:08X}", r.long());
                match (opcode >> 3) & 3 {
                    0 => format!("(A{low})+,{abs}"),
                    1 => format!("{abs},(A{low})+"),
                    2 => format!("(A{low}),{abs}"),
                    _ => format!("{abs},(A{low})"),
                }
            }
        }
        Syntax::Bkpt => format!("#{low}"),
    };

    let mut mnemonic = format!("{name}{suffix}");
    if !operands.is_empty() {
        mnemonic.push(' ');
        mnemonic.push_str(&operands);
    }
    Disassembly {
        length: r.pc.wrapping_sub(pc),
        mnemonic,
    }
}

impl Cpu680x0 {
    /// Disassemble the instruction at `pc` using this session's model,
    /// reading through regions and the host bus without side effects on
    /// the processor (no hooks, no cycles).
    pub fn disassemble(&self, bus: &mut dyn HostBus, pc: u32) -> Disassembly {
        let mut read = |addr: u32| self.peek_word(bus, addr);
        disassemble(&mut read, pc, self.model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dis(model: CpuModel, words: &[u16]) -> Disassembly {
        let words = words.to_vec();
        let mut read = |addr: u32| {
            let i = ((addr - 0x1000) / 2) as usize;
            words.get(i).copied().unwrap_or(0)
        };
        disassemble(&mut read, 0x1000, model)
    }

    #[test]
    fn lengths_follow_extension_words() {
        let m = CpuModel::M68000;
        assert_eq!(dis(m, &[0x4E71]).length, 2);
        assert_eq!(dis(m, &[0x203C, 0x1234, 0x5678]).length, 6);
        assert_eq!(dis(m, &[0x0679, 0x0001, 0x0000, 0x2000]).length, 8); // ADDI.W #1,$2000.L
        assert_eq!(dis(m, &[0x48E7, 0xFFFE]).length, 4); // MOVEM.L list,-(A7)
        assert_eq!(dis(m, &[0x6000, 0x0010]).length, 4);
        assert_eq!(dis(m, &[0x6010]).length, 2);
    }

    #[test]
    fn full_extension_words_on_68020() {
        // MOVE.L ([$10,A0],D1.L*4,$20),D0: full format, bd word, post-indexed, od word
        let ext = 0x1000 | 0x0800 | 0x0400 | 0x0100 | 0x0020 | 0x0006;
        let d = dis(CpuModel::M68020, &[0x2030, ext, 0x0010, 0x0020]);
        assert_eq!(d.length, 8);
        assert_eq!(d.mnemonic, "MOVE.L ([$10,A0],D1.L*4,$20),D0");
        // The same words on a 68000 are a brief extension word.
        assert_eq!(dis(CpuModel::M68000, &[0x2030, ext]).length, 4);
    }

    #[test]
    fn mnemonics() {
        let m = CpuModel::M68000;
        assert_eq!(dis(m, &[0x203C, 0x1234, 0x5678]).mnemonic, "MOVE.L #$12345678,D0");
        assert_eq!(dis(m, &[0x4E75]).mnemonic, "RTS");
        assert_eq!(dis(m, &[0x6706]).mnemonic, "BEQ.S $1008");
        assert_eq!(dis(m, &[0x51C8, 0xFFFE]).mnemonic, "DBF D0,$1000");
        assert_eq!(dis(m, &[0xE348]).mnemonic, "LSL.W #1,D0");
        assert_eq!(dis(m, &[0x48E7, 0xC0C0]).mnemonic, "MOVEM.L D0-D1/A0-A1,-(A7)");
        assert_eq!(dis(m, &[0xFFFF]).mnemonic, "LINEF");
        assert_eq!(dis(m, &[0x4AFB]).mnemonic, "DC.W $4AFB");
    }

    #[test]
    fn register_lists() {
        assert_eq!(register_list(0x00FF, false), "D0-D7");
        assert_eq!(register_list(0x8001, false), "D0/A7");
        assert_eq!(register_list(0x8000, true), "D0");
    }
}
