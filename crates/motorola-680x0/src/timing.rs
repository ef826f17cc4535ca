//! Cycle tables.
//!
//! 68000/68010 figures come from the MC68000 user manual (effective address
//! calculation, instruction execution and exception processing tables).
//! 68020 and later use the MC68020 cache-case figures. Bus wait cycles
//! reported by the host are added on top by the engine.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::model::TimingClass;

/// Per-mode table indexed by [`AddrMode::index`].
pub(crate) type ModeTable = [u8; 12];

/// 68000 effective address fetch time, byte/word operands.
const EA_000_WORD: ModeTable = [0, 0, 4, 4, 6, 8, 10, 8, 12, 8, 10, 4];
/// 68000 effective address fetch time, long operands.
const EA_000_LONG: ModeTable = [0, 0, 8, 8, 10, 12, 14, 12, 16, 12, 14, 8];
/// MOVE destination on the 68000: predecrement costs the same as (An).
const MOVE_DST_000_WORD: ModeTable = [0, 0, 4, 4, 4, 8, 10, 8, 12, 0, 0, 0];
const MOVE_DST_000_LONG: ModeTable = [0, 0, 8, 8, 8, 12, 14, 12, 16, 0, 0, 0];
/// 68020 fetch effective address, cache case.
const EA_020: ModeTable = [0, 0, 3, 4, 3, 3, 4, 3, 3, 3, 4, 2];
/// 68020 write effective address, cache case.
const EA_020_DST: ModeTable = [0, 0, 3, 3, 4, 3, 4, 3, 3, 0, 0, 0];

/// Control-mode instructions with their own per-mode totals.
pub(crate) const LEA_000: ModeTable = [0, 0, 4, 0, 0, 8, 12, 8, 12, 8, 12, 0];
pub(crate) const PEA_000: ModeTable = [0, 0, 12, 0, 0, 16, 20, 16, 20, 16, 20, 0];
pub(crate) const JMP_000: ModeTable = [0, 0, 8, 0, 0, 10, 14, 10, 12, 10, 14, 0];
pub(crate) const JSR_000: ModeTable = [0, 0, 16, 0, 0, 18, 22, 18, 20, 18, 22, 0];
/// MOVEM memory-to-register (plus 4 per word / 8 per long moved).
pub(crate) const MOVEM_LOAD_000: ModeTable = [0, 0, 12, 12, 0, 16, 18, 16, 20, 16, 18, 0];
/// MOVEM register-to-memory (plus 4 per word / 8 per long moved).
pub(crate) const MOVEM_STORE_000: ModeTable = [0, 0, 8, 0, 8, 12, 14, 12, 16, 0, 0, 0];
/// Control-mode address calculation on the 68020.
pub(crate) const CONTROL_020: ModeTable = [0, 0, 2, 0, 0, 4, 5, 4, 4, 4, 5, 0];

/// Effective address fetch cost for a source operand.
#[must_use]
pub(crate) fn ea_fetch(class: TimingClass, mode: AddrMode, size: Size) -> u8 {
    let i = mode.index();
    match class {
        TimingClass::M68000 | TimingClass::M68010 => {
            if size == Size::Long {
                EA_000_LONG[i]
            } else {
                EA_000_WORD[i]
            }
        }
        TimingClass::M68020 => {
            if mode == AddrMode::Immediate && size == Size::Long {
                4
            } else {
                EA_020[i]
            }
        }
    }
}

/// Effective address cost for a MOVE destination.
#[must_use]
pub(crate) fn move_dest(class: TimingClass, mode: AddrMode, size: Size) -> u8 {
    let i = mode.index();
    match class {
        TimingClass::M68000 | TimingClass::M68010 => {
            if size == Size::Long {
                MOVE_DST_000_LONG[i]
            } else {
                MOVE_DST_000_WORD[i]
            }
        }
        TimingClass::M68020 => EA_020_DST[i],
    }
}

/// Extra cost of a 68020 full-format extension word beyond the brief form.
#[must_use]
pub(crate) fn full_extension_020(ext: u16) -> u32 {
    let mut cycles = 2;
    if ext & 0x0030 >= 0x0020 {
        cycles += 2; // base displacement
    }
    if ext & 0x0007 != 0 {
        cycles += 5; // memory indirection
    }
    cycles
}

/// Exception processing cost (stacking, vector fetch, refill).
#[must_use]
pub(crate) fn exception_cycles(class: TimingClass, vector: u8) -> u32 {
    match class {
        TimingClass::M68000 => match vector {
            2 | 3 => 50,
            5 => 38,
            6 => 40,
            24..=31 => 44,
            _ => 34,
        },
        TimingClass::M68010 => match vector {
            2 | 3 => 126,
            5 | 6 => 44,
            7 => 34,
            24..=31 => 46,
            _ => 38,
        },
        TimingClass::M68020 => match vector {
            2 | 3 => 50,
            5 => 38,
            6 => 40,
            8 => 34,
            9 => 25,
            15 | 24..=31 => 26,
            _ => 20,
        },
    }
}

/// Cycles for a 68000 MULU: 38 + 2 per set bit in the source.
#[must_use]
pub(crate) fn mulu_cycles(src: u16) -> u32 {
    38 + 2 * src.count_ones()
}

/// Cycles for a 68000 MULS: 38 + 2 per 01/10 transition in `src:0`.
#[must_use]
pub(crate) fn muls_cycles(src: u16) -> u32 {
    let pattern = u32::from(src) << 1;
    38 + 2 * ((pattern ^ (pattern >> 1)) & 0xFFFF).count_ones()
}

/// Exact 68000 DIVU timing, Jorge Cwik's algorithm.
#[must_use]
pub(crate) fn divu_cycles(dividend: u32, divisor: u16) -> u32 {
    if (dividend >> 16) >= u32::from(divisor) {
        return 10;
    }

    let mut mcycles: u32 = 38;
    let hdivisor = u32::from(divisor) << 16;
    let mut dvd = dividend;

    for _ in 0..15 {
        let temp = dvd;
        dvd <<= 1;

        if temp & 0x8000_0000 != 0 {
            dvd = dvd.wrapping_sub(hdivisor);
        } else {
            mcycles += 2;
            if dvd >= hdivisor {
                dvd = dvd.wrapping_sub(hdivisor);
                mcycles -= 1;
            }
        }
    }
    mcycles * 2
}

/// Exact 68000 DIVS timing, Jorge Cwik's algorithm.
#[must_use]
pub(crate) fn divs_cycles(dividend: i32, divisor: i16) -> u32 {
    let mut mcycles: u32 = 6;
    if dividend < 0 {
        mcycles += 1;
    }

    let abs_dividend = dividend.unsigned_abs();
    let abs_divisor = divisor.unsigned_abs();

    if (abs_dividend >> 16) >= u32::from(abs_divisor) {
        return (mcycles + 2) * 2;
    }

    let mut aquot = abs_dividend / u32::from(abs_divisor);

    mcycles += 55;

    if divisor >= 0 {
        if dividend >= 0 {
            mcycles -= 1;
        } else {
            mcycles += 1;
        }
    }

    // Every zero among the 15 quotient MSBs costs one more microcycle.
    for _ in 0..15 {
        if (aquot as i16) >= 0 {
            mcycles += 1;
        }
        aquot <<= 1;
    }
    mcycles * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ea_fetch_tables() {
        let c = TimingClass::M68000;
        assert_eq!(ea_fetch(c, AddrMode::Immediate, Size::Long), 8);
        assert_eq!(ea_fetch(c, AddrMode::AddrIndPreDec(0), Size::Word), 6);
        assert_eq!(ea_fetch(c, AddrMode::AbsLong, Size::Long), 16);
        assert_eq!(move_dest(c, AddrMode::AddrIndPreDec(0), Size::Word), 4);
        assert_eq!(ea_fetch(TimingClass::M68020, AddrMode::DataReg(0), Size::Long), 0);
    }

    #[test]
    fn multiply_timing_is_data_dependent() {
        assert_eq!(mulu_cycles(0), 38);
        assert_eq!(mulu_cycles(0xFFFF), 70);
        assert_eq!(muls_cycles(0), 38);
        assert_eq!(muls_cycles(0x5555), 38 + 2 * 16);
    }

    #[test]
    fn divide_timing() {
        assert_eq!(divu_cycles(0x0001_0000, 1), 10);
        assert!((76..=140).contains(&divu_cycles(100, 7)));
        assert!((120..=158).contains(&divs_cycles(-100, 7)));
        assert_eq!(divs_cycles(0x7FFF_FFFF, 1), 16);
    }
}
