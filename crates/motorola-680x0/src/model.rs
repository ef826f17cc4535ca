//! CPU model/capability definitions for the Motorola 680x0 family.
//!
//! The model is fixed when a session is created. Everything that differs
//! between family members (address width, VBR, stack-frame shapes, which
//! opcodes exist, which timing table applies) is derived from it here so the
//! rest of the core asks questions instead of matching on models.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Selected Motorola 680x0 CPU model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CpuModel {
    /// Motorola MC68000.
    #[default]
    M68000,
    /// Motorola MC68010.
    M68010,
    /// Motorola MC68EC020 (24-bit address bus).
    M68EC020,
    /// Motorola MC68020.
    M68020,
    /// Motorola MC68EC030 (no MMU).
    M68EC030,
    /// Motorola MC68030.
    M68030,
    /// Motorola MC68EC040 (no MMU, no FPU).
    M68EC040,
    /// Motorola MC68040.
    M68040,
}

/// Capability flags for a specific CPU model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuCapabilities {
    /// `MOVEC`, `MOVES`, `RTD` and MOVE from CCR are available.
    pub movec: bool,
    /// Vector Base Register (`VBR`) is present.
    pub vbr: bool,
    /// Cache control registers (`CACR`, `CAAR`) are present.
    pub cacr: bool,
    /// Master stack pointer and the SR M bit are present.
    pub master_stack: bool,
    /// Full-format extension words, scaled index and memory indirection.
    pub full_extension: bool,
    /// 32-bit multiply/divide, bit-field ops, CAS, CHK2, TRAPcc and friends.
    pub long_ops: bool,
    /// Word and long operands may sit at odd addresses.
    pub misaligned_data: bool,
}

/// Which timing table an instruction's cycle cost comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimingClass {
    M68000 = 0,
    M68010 = 1,
    M68020 = 2,
}

/// Bitmask over [`CpuModel`] used by the instruction table to gate opcodes.
pub(crate) type ModelMask = u8;

pub(crate) const ALL_MODELS: ModelMask = 0xFF;
pub(crate) const M010_UP: ModelMask = 0xFE;
pub(crate) const M020_UP: ModelMask = 0xFC;
pub(crate) const M040_ONLY: ModelMask = 0xC0;
/// 68000 and 68010.
pub(crate) const PRE_020: ModelMask = 0x03;

impl CpuModel {
    /// Every supported model, oldest first.
    pub const ALL: [CpuModel; 8] = [
        Self::M68000,
        Self::M68010,
        Self::M68EC020,
        Self::M68020,
        Self::M68EC030,
        Self::M68030,
        Self::M68EC040,
        Self::M68040,
    ];

    /// Static capability set for this CPU model.
    #[must_use]
    pub const fn capabilities(self) -> CpuCapabilities {
        match self {
            Self::M68000 => CpuCapabilities {
                movec: false,
                vbr: false,
                cacr: false,
                master_stack: false,
                full_extension: false,
                long_ops: false,
                misaligned_data: false,
            },
            Self::M68010 => CpuCapabilities {
                movec: true,
                vbr: true,
                cacr: false,
                master_stack: false,
                full_extension: false,
                long_ops: false,
                misaligned_data: false,
            },
            _ => CpuCapabilities {
                movec: true,
                vbr: true,
                cacr: true,
                master_stack: true,
                full_extension: true,
                long_ops: true,
                misaligned_data: true,
            },
        }
    }

    /// Physical address mask applied before any bus lookup.
    #[must_use]
    pub const fn address_mask(self) -> u32 {
        match self {
            Self::M68000 | Self::M68010 | Self::M68EC020 => 0x00FF_FFFF,
            _ => 0xFFFF_FFFF,
        }
    }

    /// Bits of SR that can hold a value on this model.
    #[must_use]
    pub const fn sr_mask(self) -> u16 {
        if self.capabilities().master_stack {
            0xF71F
        } else {
            0xA71F
        }
    }

    /// True for the 68040 pair, which use their own fault frame (format $7).
    #[must_use]
    pub const fn is_040(self) -> bool {
        matches!(self, Self::M68EC040 | Self::M68040)
    }

    /// Convenience helper for decode gating.
    #[must_use]
    pub const fn supports_movec(self) -> bool {
        self.capabilities().movec
    }

    /// Index into per-model tables.
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// This model's bit in a [`ModelMask`].
    #[must_use]
    pub(crate) const fn bit(self) -> ModelMask {
        1 << (self as u8)
    }

    pub(crate) const fn timing(self) -> TimingClass {
        match self {
            Self::M68000 => TimingClass::M68000,
            Self::M68010 => TimingClass::M68010,
            _ => TimingClass::M68020,
        }
    }

    /// Short lowercase name, also accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::M68000 => "68000",
            Self::M68010 => "68010",
            Self::M68EC020 => "68ec020",
            Self::M68020 => "68020",
            Self::M68EC030 => "68ec030",
            Self::M68030 => "68030",
            Self::M68EC040 => "68ec040",
            Self::M68040 => "68040",
        }
    }
}

impl fmt::Display for CpuModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MC{}", self.name().to_ascii_uppercase())
    }
}

impl FromStr for CpuModel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let bare = lower.strip_prefix("mc").unwrap_or(&lower);
        Self::ALL
            .into_iter()
            .find(|m| m.name() == bare)
            .ok_or_else(|| ConfigError::UnknownModel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_match_expected_baseline_models() {
        assert!(!CpuModel::M68000.capabilities().vbr);
        assert!(CpuModel::M68010.capabilities().vbr);
        assert!(!CpuModel::M68010.capabilities().cacr);
        for model in &CpuModel::ALL[2..] {
            let caps = model.capabilities();
            assert!(caps.cacr && caps.master_stack && caps.long_ops, "{model}");
        }
    }

    #[test]
    fn address_width_follows_bus_size() {
        assert_eq!(CpuModel::M68000.address_mask(), 0x00FF_FFFF);
        assert_eq!(CpuModel::M68EC020.address_mask(), 0x00FF_FFFF);
        assert_eq!(CpuModel::M68020.address_mask(), 0xFFFF_FFFF);
        assert_eq!(CpuModel::M68EC030.address_mask(), 0xFFFF_FFFF);
    }

    #[test]
    fn parses_model_names() {
        assert_eq!("68000".parse::<CpuModel>().ok(), Some(CpuModel::M68000));
        assert_eq!("MC68EC020".parse::<CpuModel>().ok(), Some(CpuModel::M68EC020));
        assert_eq!(" mc68040 ".parse::<CpuModel>().ok(), Some(CpuModel::M68040));
        assert!(matches!(
            "68060".parse::<CpuModel>(),
            Err(ConfigError::UnknownModel(name)) if name == "68060"
        ));
    }

    #[test]
    fn model_masks_select_expected_members() {
        assert_ne!(M010_UP & CpuModel::M68010.bit(), 0);
        assert_eq!(M010_UP & CpuModel::M68000.bit(), 0);
        assert_eq!(M020_UP & CpuModel::M68010.bit(), 0);
        assert_ne!(M020_UP & CpuModel::M68EC020.bit(), 0);
        assert_ne!(M040_ONLY & CpuModel::M68EC040.bit(), 0);
        assert_eq!(M040_ONLY & CpuModel::M68030.bit(), 0);
        assert_eq!(ALL_MODELS.count_ones(), 8);
        assert_eq!(PRE_020, CpuModel::M68000.bit() | CpuModel::M68010.bit());
    }
}
