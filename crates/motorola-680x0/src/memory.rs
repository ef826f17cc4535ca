//! Memory bridge: host bus contract, fast-path region table and the sized
//! accessors every other part of the core goes through.
//!
//! Resolution order for a sub-access is:
//! 1. mask the address to the model's physical width
//! 2. scan registered regions in registration order; the first region that
//!    contains the whole sub-access serves it straight from its buffer
//! 3. otherwise hand the access to the host bus
//!
//! Long accesses are split into two word accesses (high word first). On the
//! 68020 and later a misaligned word is split into two byte accesses and a
//! misaligned long into byte, word, byte, always in ascending address order.

use crate::alu::Size;
use crate::cpu::Cpu680x0;
use crate::error::ConfigError;
use crate::exceptions::{AccessFault, Fault};
use crate::trace::MemoryAccess;

/// Function code values from the FC0-FC2 pins.
///
/// These distinguish access types for memory management and bus arbitration.
/// MOVES can drive any of the eight values through SFC/DFC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    /// Undefined, reserved (FC=0).
    Reserved0 = 0,
    /// User data access (FC=1).
    UserData = 1,
    /// User program access (FC=2).
    UserProgram = 2,
    /// Undefined, reserved for user definition (FC=3).
    Reserved3 = 3,
    /// Undefined, reserved (FC=4).
    Reserved4 = 4,
    /// Supervisor data access (FC=5).
    SupervisorData = 5,
    /// Supervisor program access (FC=6).
    SupervisorProgram = 6,
    /// CPU space: interrupt acknowledge and coprocessor cycles (FC=7).
    CpuSpace = 7,
}

impl FunctionCode {
    /// Build a function code from supervisor flag and program/data flag.
    #[must_use]
    pub fn from_flags(supervisor: bool, program: bool) -> Self {
        match (supervisor, program) {
            (false, false) => Self::UserData,
            (false, true) => Self::UserProgram,
            (true, false) => Self::SupervisorData,
            (true, true) => Self::SupervisorProgram,
        }
    }

    /// Function code from its 3-bit value (SFC/DFC contents).
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            0 => Self::Reserved0,
            1 => Self::UserData,
            2 => Self::UserProgram,
            3 => Self::Reserved3,
            4 => Self::Reserved4,
            5 => Self::SupervisorData,
            6 => Self::SupervisorProgram,
            _ => Self::CpuSpace,
        }
    }

    /// Returns the 3-bit value for the function code.
    #[must_use]
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// True for program-space accesses.
    #[must_use]
    pub fn is_program(self) -> bool {
        matches!(self, Self::UserProgram | Self::SupervisorProgram)
    }
}

/// Result of a bus access: data read, wait cycles, and bus error status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusResult {
    /// Data read from the bus. For writes, this is 0. Byte reads use the
    /// low 8 bits.
    pub data: u16,
    /// Extra wait cycles inserted by the bus (DMA contention, slow memory).
    /// They are added to the cost of the instruction that made the access.
    pub wait_cycles: u8,
    /// True if nothing answered the access. Depending on
    /// [`UnmappedAccess`] the core either reads zero or takes a bus error.
    pub bus_error: bool,
}

impl BusResult {
    /// Create a result with data and no wait cycles.
    #[must_use]
    pub const fn new(data: u16) -> Self {
        Self {
            data,
            wait_cycles: 0,
            bus_error: false,
        }
    }

    /// Create a result with data and wait cycles.
    #[must_use]
    pub const fn with_wait(data: u16, wait_cycles: u8) -> Self {
        Self {
            data,
            wait_cycles,
            bus_error: false,
        }
    }

    /// Create a write result (no data returned).
    #[must_use]
    pub const fn write_ok() -> Self {
        Self::new(0)
    }

    /// Create a bus error result (nothing mapped at the address).
    #[must_use]
    pub const fn error() -> Self {
        Self {
            data: 0,
            wait_cycles: 0,
            bus_error: true,
        }
    }
}

/// Host side of the memory bridge.
///
/// Only the byte accessors are required. The word accessors default to two
/// ordered byte accesses (high byte first) so a host that only understands
/// bytes still sees every access in big-endian order.
pub trait HostBus {
    /// Read a byte (returned in the low 8 bits of `data`).
    fn read_byte(&mut self, addr: u32, fc: FunctionCode) -> BusResult;

    /// Write a byte.
    fn write_byte(&mut self, addr: u32, value: u8, fc: FunctionCode) -> BusResult;

    /// Read a big-endian word from an even address.
    fn read_word(&mut self, addr: u32, fc: FunctionCode) -> BusResult {
        let hi = self.read_byte(addr, fc);
        let lo = self.read_byte(addr.wrapping_add(1), fc);
        BusResult {
            data: (hi.data << 8) | (lo.data & 0xFF),
            wait_cycles: hi.wait_cycles.saturating_add(lo.wait_cycles),
            bus_error: hi.bus_error || lo.bus_error,
        }
    }

    /// Write a big-endian word to an even address.
    fn write_word(&mut self, addr: u32, value: u16, fc: FunctionCode) -> BusResult {
        let hi = self.write_byte(addr, (value >> 8) as u8, fc);
        let lo = self.write_byte(addr.wrapping_add(1), value as u8, fc);
        BusResult {
            data: 0,
            wait_cycles: hi.wait_cycles.saturating_add(lo.wait_cycles),
            bus_error: hi.bus_error || lo.bus_error,
        }
    }

    /// The RESET instruction asserted the reset line for external devices.
    fn reset(&mut self) {}

    /// Interrupt acknowledge cycle. Returns the vector number.
    /// Default implementation returns the autovector (24 + level).
    fn interrupt_ack(&mut self, level: u8) -> u8 {
        AUTOVECTOR_BASE + level
    }
}

/// First autovector; level n uses `AUTOVECTOR_BASE + n`.
pub const AUTOVECTOR_BASE: u8 = 24;
/// Vector a device returns when it cannot name its interrupt.
pub const SPURIOUS_VECTOR: u8 = 24;

/// A host bus with nothing attached: every access reports a bus error.
///
/// Handy when all memory lives in registered regions.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenBus;

impl HostBus for OpenBus {
    fn read_byte(&mut self, _addr: u32, _fc: FunctionCode) -> BusResult {
        BusResult::error()
    }

    fn write_byte(&mut self, _addr: u32, _value: u8, _fc: FunctionCode) -> BusResult {
        BusResult::error()
    }
}

/// What happens when the host bus reports that nothing answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmappedAccess {
    /// Reads return zero and writes are dropped.
    #[default]
    ReadZero,
    /// The access takes a bus error exception.
    BusError,
}

/// Handle for a registered region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(u32);

/// A caller-supplied buffer mapped at a fixed physical base address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    id: RegionId,
    base: u32,
    data: Vec<u8>,
}

impl MemoryRegion {
    /// Physical base address.
    #[must_use]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Regions are never empty once registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Backing buffer.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable backing buffer.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Give the buffer back.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Byte offset of `addr` if `len` bytes starting there fit inside.
    fn offset(&self, addr: u32, len: usize) -> Option<usize> {
        let offset = addr.checked_sub(self.base)? as usize;
        (offset + len <= self.data.len()).then_some(offset)
    }
}

/// Registered regions, scanned in registration order.
#[derive(Debug, Default)]
pub(crate) struct RegionTable {
    regions: Vec<MemoryRegion>,
    next_id: u32,
}

impl RegionTable {
    pub(crate) fn add(&mut self, base: u32, data: Vec<u8>) -> Result<RegionId, ConfigError> {
        if data.is_empty() {
            return Err(ConfigError::EmptyRegion { base });
        }
        if u64::from(base) + data.len() as u64 > 1 << 32 {
            return Err(ConfigError::RegionOutOfRange {
                base,
                len: data.len(),
            });
        }
        if self.regions.iter().any(|r| r.base == base) {
            return Err(ConfigError::DuplicateRegion { base });
        }
        let id = RegionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.regions.push(MemoryRegion { id, base, data });
        Ok(id)
    }

    pub(crate) fn clear(&mut self) -> Vec<MemoryRegion> {
        std::mem::take(&mut self.regions)
    }

    pub(crate) fn get(&self, id: RegionId) -> Option<&MemoryRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: RegionId) -> Option<&mut MemoryRegion> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    fn find(&self, addr: u32, len: usize) -> Option<(usize, usize)> {
        self.regions
            .iter()
            .enumerate()
            .find_map(|(i, r)| r.offset(addr, len).map(|off| (i, off)))
    }

    fn read_byte(&self, addr: u32) -> Option<u8> {
        let (i, off) = self.find(addr, 1)?;
        Some(self.regions[i].data[off])
    }

    fn read_word(&self, addr: u32) -> Option<u16> {
        let (i, off) = self.find(addr, 2)?;
        let d = &self.regions[i].data;
        Some(u16::from_be_bytes([d[off], d[off + 1]]))
    }

    fn write_byte(&mut self, addr: u32, value: u8) -> bool {
        match self.find(addr, 1) {
            Some((i, off)) => {
                self.regions[i].data[off] = value;
                true
            }
            None => false,
        }
    }

    fn write_word(&mut self, addr: u32, value: u16) -> bool {
        match self.find(addr, 2) {
            Some((i, off)) => {
                self.regions[i].data[off..off + 2].copy_from_slice(&value.to_be_bytes());
                true
            }
            None => false,
        }
    }
}

impl Cpu680x0 {
    /// Register a buffer at `base`. Regions are consulted before the host bus.
    pub fn add_region(&mut self, base: u32, data: Vec<u8>) -> Result<RegionId, ConfigError> {
        self.regions.add(base, data)
    }

    /// Unregister every region and hand the buffers back.
    pub fn clear_regions(&mut self) -> Vec<MemoryRegion> {
        self.regions.clear()
    }

    /// Borrow a registered region.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&MemoryRegion> {
        self.regions.get(id)
    }

    /// Mutably borrow a registered region.
    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut MemoryRegion> {
        self.regions.get_mut(id)
    }

    fn phys(&self, addr: u32) -> u32 {
        addr & self.model().address_mask()
    }

    /// Account for one completed bus cycle and apply the unmapped policy.
    fn settle(
        &mut self,
        result: BusResult,
        fault: impl FnOnce() -> AccessFault,
    ) -> Result<u16, Fault> {
        self.bus_clocks += self.bus_cycle_clocks();
        self.wait_cycles += u32::from(result.wait_cycles);
        if result.bus_error && self.unmapped == UnmappedAccess::BusError {
            return Err(Fault::Bus(fault()));
        }
        Ok(if result.bus_error { 0 } else { result.data })
    }

    fn cycle_read_byte(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        fc: FunctionCode,
        size: Size,
    ) -> Result<u8, Fault> {
        let addr = self.phys(addr);
        if let Some(v) = self.regions.read_byte(addr) {
            self.bus_clocks += self.bus_cycle_clocks();
            return Ok(v);
        }
        let result = bus.read_byte(addr, fc);
        let data = self.settle(result, || AccessFault::read(addr, size, fc))?;
        Ok(data as u8)
    }

    fn cycle_read_word(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        fc: FunctionCode,
        size: Size,
    ) -> Result<u16, Fault> {
        let addr = self.phys(addr);
        if let Some(v) = self.regions.read_word(addr) {
            self.bus_clocks += self.bus_cycle_clocks();
            return Ok(v);
        }
        let result = bus.read_word(addr, fc);
        self.settle(result, || AccessFault::read(addr, size, fc))
    }

    fn cycle_write_byte(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        value: u8,
        fc: FunctionCode,
        size: Size,
    ) -> Result<(), Fault> {
        let addr = self.phys(addr);
        if self.regions.write_byte(addr, value) {
            self.bus_clocks += self.bus_cycle_clocks();
            return Ok(());
        }
        let result = bus.write_byte(addr, value, fc);
        self.settle(result, || AccessFault::write(addr, size, fc))
            .map(|_| ())
    }

    fn cycle_write_word(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        value: u16,
        fc: FunctionCode,
        size: Size,
    ) -> Result<(), Fault> {
        let addr = self.phys(addr);
        if self.regions.write_word(addr, value) {
            self.bus_clocks += self.bus_cycle_clocks();
            return Ok(());
        }
        let result = bus.write_word(addr, value, fc);
        self.settle(result, || AccessFault::write(addr, size, fc))
            .map(|_| ())
    }

    /// Word read that splits into bytes when the address is odd.
    fn split_read_word(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        fc: FunctionCode,
        size: Size,
    ) -> Result<u16, Fault> {
        if addr & 1 == 0 {
            return self.cycle_read_word(bus, addr, fc, size);
        }
        let hi = self.cycle_read_byte(bus, addr, fc, size)?;
        let lo = self.cycle_read_byte(bus, addr.wrapping_add(1), fc, size)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    fn split_write_word(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        value: u16,
        fc: FunctionCode,
        size: Size,
    ) -> Result<(), Fault> {
        if addr & 1 == 0 {
            return self.cycle_write_word(bus, addr, value, fc, size);
        }
        let [hi, lo] = value.to_be_bytes();
        self.cycle_write_byte(bus, addr, hi, fc, size)?;
        self.cycle_write_byte(bus, addr.wrapping_add(1), lo, fc, size)
    }

    /// Physical read of `size` bytes with an explicit function code.
    /// No alignment check and no tracing.
    pub(crate) fn bus_read(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        size: Size,
        fc: FunctionCode,
    ) -> Result<u32, Fault> {
        match size {
            Size::Byte => self.cycle_read_byte(bus, addr, fc, size).map(u32::from),
            Size::Word => self.split_read_word(bus, addr, fc, size).map(u32::from),
            Size::Long if addr & 1 != 0 => {
                let b0 = self.cycle_read_byte(bus, addr, fc, size)?;
                let mid = self.cycle_read_word(bus, addr.wrapping_add(1), fc, size)?;
                let b3 = self.cycle_read_byte(bus, addr.wrapping_add(3), fc, size)?;
                Ok((u32::from(b0) << 24) | (u32::from(mid) << 8) | u32::from(b3))
            }
            Size::Long => {
                let hi = self.cycle_read_word(bus, addr, fc, size)?;
                let lo = self.cycle_read_word(bus, addr.wrapping_add(2), fc, size)?;
                Ok((u32::from(hi) << 16) | u32::from(lo))
            }
        }
    }

    /// Physical write of `size` bytes with an explicit function code.
    pub(crate) fn bus_write(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        size: Size,
        value: u32,
        fc: FunctionCode,
    ) -> Result<(), Fault> {
        match size {
            Size::Byte => self.cycle_write_byte(bus, addr, value as u8, fc, size),
            Size::Word => self.split_write_word(bus, addr, value as u16, fc, size),
            Size::Long if addr & 1 != 0 => {
                self.cycle_write_byte(bus, addr, (value >> 24) as u8, fc, size)?;
                self.cycle_write_word(bus, addr.wrapping_add(1), (value >> 8) as u16, fc, size)?;
                self.cycle_write_byte(bus, addr.wrapping_add(3), value as u8, fc, size)
            }
            Size::Long => {
                self.cycle_write_word(bus, addr, (value >> 16) as u16, fc, size)?;
                self.cycle_write_word(bus, addr.wrapping_add(2), value as u16, fc, size)
            }
        }
    }

    fn check_alignment(&self, addr: u32, size: Size, fault: AccessFault) -> Result<(), Fault> {
        if size != Size::Byte && addr & 1 != 0 && !self.caps.misaligned_data {
            return Err(Fault::Address(fault));
        }
        Ok(())
    }

    pub(crate) fn data_fc(&self) -> FunctionCode {
        FunctionCode::from_flags(self.regs.is_supervisor(), false)
    }

    fn program_fc(&self) -> FunctionCode {
        FunctionCode::from_flags(self.regs.is_supervisor(), true)
    }

    /// Data read in the current address space. Reported to the memory hook.
    pub(crate) fn read(&mut self, bus: &mut dyn HostBus, addr: u32, size: Size) -> Result<u32, Fault> {
        let fc = self.data_fc();
        self.read_fc(bus, addr, size, fc)
    }

    /// Data write in the current address space. Reported to the memory hook.
    pub(crate) fn write(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        size: Size,
        value: u32,
    ) -> Result<(), Fault> {
        let fc = self.data_fc();
        self.write_fc(bus, addr, size, value, fc)
    }

    /// Data read with an explicit function code (MOVES, PC-relative operands).
    pub(crate) fn read_fc(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        size: Size,
        fc: FunctionCode,
    ) -> Result<u32, Fault> {
        self.check_alignment(addr, size, AccessFault::read(self.phys(addr), size, fc))?;
        let value = self.bus_read(bus, addr, size, fc)?;
        self.note_memory(MemoryAccess::Read, self.phys(addr), size, value);
        Ok(value)
    }

    /// Data write with an explicit function code.
    pub(crate) fn write_fc(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        size: Size,
        value: u32,
        fc: FunctionCode,
    ) -> Result<(), Fault> {
        let value = value & size.mask();
        self.check_alignment(addr, size, AccessFault::write(self.phys(addr), size, fc))?;
        self.bus_write(bus, addr, size, value, fc)?;
        self.note_memory(MemoryAccess::Write, self.phys(addr), size, value);
        Ok(())
    }

    /// Fetch the next instruction-stream word and advance PC.
    pub(crate) fn fetch_word(&mut self, bus: &mut dyn HostBus) -> Result<u16, Fault> {
        let pc = self.regs.pc;
        let fc = self.program_fc();
        if pc & 1 != 0 {
            return Err(Fault::Address(AccessFault::read(self.phys(pc), Size::Word, fc)));
        }
        let word = self.cycle_read_word(bus, pc, fc, Size::Word)?;
        self.regs.pc = pc.wrapping_add(2);
        Ok(word)
    }

    /// Fetch a long from the instruction stream.
    pub(crate) fn fetch_long(&mut self, bus: &mut dyn HostBus) -> Result<u32, Fault> {
        let hi = self.fetch_word(bus)?;
        let lo = self.fetch_word(bus)?;
        Ok((u32::from(hi) << 16) | u32::from(lo))
    }

    /// Fetch an immediate operand of the given size.
    pub(crate) fn fetch_imm(&mut self, bus: &mut dyn HostBus, size: Size) -> Result<u32, Fault> {
        match size {
            Size::Byte => Ok(u32::from(self.fetch_word(bus)? & 0xFF)),
            Size::Word => self.fetch_word(bus).map(u32::from),
            Size::Long => self.fetch_long(bus),
        }
    }

    /// Side-effect-free word read for the disassembler: no tracing, no
    /// cycles, unmapped reads as zero.
    pub(crate) fn peek_word(&self, bus: &mut dyn HostBus, addr: u32) -> u16 {
        let addr = self.phys(addr);
        if let Some(v) = self.regions.read_word(addr) {
            return v;
        }
        let result = bus.read_word(addr, FunctionCode::SupervisorProgram);
        if result.bus_error { 0 } else { result.data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_validation() {
        let mut table = RegionTable::default();
        assert_eq!(table.add(0x1000, Vec::new()), Err(ConfigError::EmptyRegion { base: 0x1000 }));
        assert!(table.add(0x1000, vec![0; 16]).is_ok());
        assert_eq!(
            table.add(0x1000, vec![0; 4]),
            Err(ConfigError::DuplicateRegion { base: 0x1000 })
        );
        assert_eq!(
            table.add(0xFFFF_FFF0, vec![0; 0x20]),
            Err(ConfigError::RegionOutOfRange { base: 0xFFFF_FFF0, len: 0x20 })
        );
        assert!(table.add(0xFFFF_FFF0, vec![0; 0x10]).is_ok());
    }

    #[test]
    fn first_registered_region_wins() {
        let mut table = RegionTable::default();
        let a = table.add(0x0000, vec![0x11; 0x100]).ok();
        let _b = table.add(0x0080, vec![0x22; 0x100]).ok();
        assert_eq!(table.read_byte(0x0090), Some(0x11));
        assert_eq!(table.read_byte(0x0150), Some(0x22));
        assert!(a.is_some());
    }

    #[test]
    fn word_straddling_region_end_falls_through() {
        let mut table = RegionTable::default();
        let _ = table.add(0x0000, vec![0xAB; 0x10]);
        assert_eq!(table.read_word(0x000E), Some(0xABAB));
        assert_eq!(table.read_word(0x000F), None);
        assert!(!table.write_word(0x000F, 0));
    }

    #[test]
    fn default_word_access_is_two_ordered_bytes() {
        struct Recorder(Vec<(u32, u8)>);
        impl HostBus for Recorder {
            fn read_byte(&mut self, addr: u32, _fc: FunctionCode) -> BusResult {
                BusResult::new(u16::from(addr as u8))
            }
            fn write_byte(&mut self, addr: u32, value: u8, _fc: FunctionCode) -> BusResult {
                self.0.push((addr, value));
                BusResult::write_ok()
            }
        }
        let mut bus = Recorder(Vec::new());
        assert_eq!(bus.read_word(0x40, FunctionCode::UserData).data, 0x4041);
        bus.write_word(0x40, 0xBEEF, FunctionCode::UserData);
        assert_eq!(bus.0, vec![(0x40, 0xBE), (0x41, 0xEF)]);
    }

    #[test]
    fn function_codes() {
        assert_eq!(FunctionCode::from_flags(true, true).bits(), 6);
        assert_eq!(FunctionCode::from_bits(7), FunctionCode::CpuSpace);
        assert!(FunctionCode::UserProgram.is_program());
    }
}
