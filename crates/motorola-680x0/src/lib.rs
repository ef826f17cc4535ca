//! Motorola 680x0 family processor core.
//!
//! One [`Cpu680x0`] emulates a 68000, 68010, 68020, 68030, 68040, 68EC020,
//! 68EC030 or 68EC040 at instruction granularity. Memory is split between
//! RAM regions the session owns and a [`HostBus`] the embedder lends to
//! every call; accesses outside the regions go to the host.
//!
//! ```no_run
//! use motorola_680x0::{Cpu680x0, CpuConfig, CpuModel, OpenBus};
//!
//! let mut cpu = Cpu680x0::new(CpuConfig::new(CpuModel::M68000));
//! let mut ram = vec![0u8; 0x1_0000];
//! ram[..8].copy_from_slice(&[0, 0, 0x80, 0, 0, 0, 0x04, 0]);
//! cpu.add_region(0, ram).ok();
//! let mut bus = OpenBus;
//! cpu.reset(&mut bus);
//! let cycles = cpu.execute(&mut bus, 1_000);
//! # let _ = cycles;
//! ```

pub mod addressing;
pub mod alu;
pub mod cpu;
pub mod decode;
mod ea;
pub mod error;
mod exceptions;
mod execute;
pub mod flags;
pub mod memory;
pub mod model;
mod ops;
pub mod registers;
mod table;
mod timing;
pub mod trace;

#[cfg(test)]
mod testing;

pub use addressing::AddrMode;
pub use alu::Size;
pub use cpu::{Cpu680x0, CpuConfig};
pub use decode::{Disassembly, disassemble};
pub use error::ConfigError;
pub use memory::{BusResult, FunctionCode, HostBus, MemoryRegion, OpenBus, RegionId, UnmappedAccess};
pub use model::{CpuCapabilities, CpuModel};
pub use registers::{RegisterId, Registers};
pub use trace::{
    FlowEvent, FlowHook, FlowKind, HookAction, InstructionEvent, InstructionHook, MemoryAccess,
    MemoryEvent, MemoryHook, TraceCategory,
};
