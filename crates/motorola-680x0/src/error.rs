//! Configuration errors reported synchronously to the host.
//!
//! Architectural faults never show up here: they are modeled as 680x0
//! exceptions inside the core.

use thiserror::Error;

use crate::model::CpuModel;
use crate::registers::RegisterId;

/// A caller mistake rejected before it touched processor state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("memory region at {base:#010X} has zero length")]
    EmptyRegion { base: u32 },

    #[error("a memory region is already registered at {base:#010X}")]
    DuplicateRegion { base: u32 },

    #[error("memory region at {base:#010X} with length {len:#X} wraps past the end of the address space")]
    RegionOutOfRange { base: u32, len: usize },

    #[error("register {register:?} does not exist on the {model}")]
    UnsupportedRegister { register: RegisterId, model: CpuModel },

    #[error("unknown register id {0}")]
    UnknownRegister(u32),

    #[error("unknown CPU model {0:?}")]
    UnknownModel(String),

    #[error("interrupt level {0} is out of range (0-7)")]
    InterruptLevel(u8),
}
