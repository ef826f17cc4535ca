//! Instrumentation: instruction, flow and memory hooks.
//!
//! A hook fires only while the global switch and its category switch are
//! both on. Per instruction the order is fixed: the instruction hook fires
//! before the opcode executes, then every flow event the instruction caused,
//! then every data access it made, in access order. Flow and memory events
//! are buffered while the instruction runs and delivered once it has
//! retired, so a hook never observes a half-executed instruction.
//!
//! Hooks receive event data only. They cannot reach the session that is
//! calling them, which rules out re-entering `execute` from a hook.

use std::ops::RangeInclusive;

use emu_core::Ticks;

use crate::alu::Size;
use crate::cpu::Cpu680x0;

/// Hook categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceCategory {
    /// Control transfers.
    Flow,
    /// Data reads and writes.
    Memory,
    /// One event per instruction, before it executes.
    Instruction,
}

/// What a hook wants the engine to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookAction {
    /// Keep running.
    #[default]
    Continue,
    /// End the timeslice at the next instruction boundary.
    Stop,
}

/// Kind of control transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// BSR, JSR.
    Call,
    /// RTS, RTR, RTD.
    Return,
    /// Bcc/DBcc that branched, and BRA.
    BranchTaken,
    /// Bcc/DBcc that fell through.
    BranchNotTaken,
    /// JMP.
    Jump,
    /// TRAP #n, TRAPV, TRAPcc, CHK and friends entering their handler.
    Trap,
    /// Any other exception or interrupt entering its handler.
    Exception,
    /// RTE.
    ExceptionReturn,
}

/// A control transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowEvent {
    pub kind: FlowKind,
    /// Address of the instruction that caused the transfer.
    pub from: u32,
    /// Destination address.
    pub to: u32,
    /// Exception vector for `Trap` and `Exception`.
    pub vector: Option<u8>,
    /// Total cycle count when the instruction started.
    pub cycles: u64,
}

/// Direction of a data access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryAccess {
    Read,
    Write,
}

/// A data access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryEvent {
    pub access: MemoryAccess,
    /// Physical address.
    pub address: u32,
    pub size: Size,
    pub value: u32,
    /// Address of the instruction that made the access.
    pub pc: u32,
    /// Total cycle count when the instruction started.
    pub cycles: u64,
}

/// An instruction about to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionEvent {
    pub pc: u32,
    pub opcode: u16,
    /// Total cycle count when the instruction started.
    pub cycles: u64,
}

pub type FlowHook = Box<dyn FnMut(&FlowEvent) -> HookAction>;
pub type MemoryHook = Box<dyn FnMut(&MemoryEvent) -> HookAction>;
pub type InstructionHook = Box<dyn FnMut(&InstructionEvent) -> HookAction>;

struct Category<E> {
    enabled: bool,
    hook: Option<Box<dyn FnMut(&E) -> HookAction>>,
}

impl<E> Default for Category<E> {
    fn default() -> Self {
        Self {
            enabled: false,
            hook: None,
        }
    }
}

impl<E> Category<E> {
    fn live(&self) -> bool {
        self.enabled && self.hook.is_some()
    }

    fn fire(&mut self, event: &E) -> HookAction {
        match &mut self.hook {
            Some(hook) => hook(event),
            None => HookAction::Continue,
        }
    }
}

/// Hook registrations, filters and the cycle counter.
#[derive(Default)]
pub(crate) struct TraceState {
    enabled: bool,
    flow: Category<FlowEvent>,
    memory: Category<MemoryEvent>,
    instruction: Category<InstructionEvent>,
    filters: Vec<RangeInclusive<u32>>,
    total: Ticks,
    /// Timestamp and PC of the instruction in flight.
    stamp: u64,
    pc: u32,
    pending_flow: Vec<FlowEvent>,
    pending_memory: Vec<MemoryEvent>,
}

impl TraceState {
    fn category_live(&self, category: TraceCategory) -> bool {
        self.enabled
            && match category {
                TraceCategory::Flow => self.flow.live(),
                TraceCategory::Memory => self.memory.live(),
                TraceCategory::Instruction => self.instruction.live(),
            }
    }

    fn passes_filter(&self, address: u32, size: Size) -> bool {
        if self.filters.is_empty() {
            return true;
        }
        let last = address.wrapping_add(size.bytes() - 1);
        let overlaps = |lo: u32, hi: u32| {
            self.filters
                .iter()
                .any(|r| !r.is_empty() && *r.start() <= hi && lo <= *r.end())
        };
        if last < address {
            // The access wraps past the top of the address space.
            overlaps(address, u32::MAX) || overlaps(0, last)
        } else {
            overlaps(address, last)
        }
    }

    pub(crate) fn begin(&mut self, pc: u32) {
        self.stamp = self.total.get();
        self.pc = pc;
        self.pending_flow.clear();
        self.pending_memory.clear();
    }

    pub(crate) fn add_cycles(&mut self, cycles: u32) {
        self.total += cycles;
    }

    /// Deliver buffered flow events, then memory events.
    pub(crate) fn flush(&mut self) -> HookAction {
        let mut action = HookAction::Continue;
        // Flags are re-read per event so a hook toggling a category takes
        // effect from the next event on.
        for event in std::mem::take(&mut self.pending_flow) {
            if self.category_live(TraceCategory::Flow)
                && self.flow.fire(&event) == HookAction::Stop
            {
                action = HookAction::Stop;
            }
        }
        for event in std::mem::take(&mut self.pending_memory) {
            if self.category_live(TraceCategory::Memory)
                && self.memory.fire(&event) == HookAction::Stop
            {
                action = HookAction::Stop;
            }
        }
        action
    }
}

impl Cpu680x0 {
    /// Master switch for every hook category.
    pub fn set_trace_enabled(&mut self, enabled: bool) {
        self.trace.enabled = enabled;
    }

    /// Whether the master switch is on.
    #[must_use]
    pub fn trace_enabled(&self) -> bool {
        self.trace.enabled
    }

    /// Per-category switch. Both this and the master switch must be on.
    pub fn set_category_enabled(&mut self, category: TraceCategory, enabled: bool) {
        match category {
            TraceCategory::Flow => self.trace.flow.enabled = enabled,
            TraceCategory::Memory => self.trace.memory.enabled = enabled,
            TraceCategory::Instruction => self.trace.instruction.enabled = enabled,
        }
    }

    /// Install or remove (`None`) the flow hook.
    pub fn set_flow_hook(&mut self, hook: Option<FlowHook>) {
        self.trace.flow.hook = hook;
    }

    /// Install or remove (`None`) the memory hook.
    pub fn set_memory_hook(&mut self, hook: Option<MemoryHook>) {
        self.trace.memory.hook = hook;
    }

    /// Install or remove (`None`) the instruction hook.
    pub fn set_instruction_hook(&mut self, hook: Option<InstructionHook>) {
        self.trace.instruction.hook = hook;
    }

    /// Restrict memory events to accesses touching one of these ranges.
    /// An empty list traces every address.
    pub fn set_address_filter(&mut self, ranges: Vec<RangeInclusive<u32>>) {
        self.trace.filters = ranges;
    }

    /// Drop every hook, filter and switch. The cycle counter survives.
    pub fn reset_trace(&mut self) {
        let total = self.trace.total;
        self.trace = TraceState {
            total,
            ..TraceState::default()
        };
    }

    /// Zero the cycle counter.
    pub fn reset_cycle_counter(&mut self) {
        self.trace.total = Ticks::ZERO;
    }

    /// Cycles executed since creation or the last counter reset.
    #[must_use]
    pub fn total_cycles(&self) -> Ticks {
        self.trace.total
    }

    /// Fire the instruction hook for the opcode about to execute.
    pub(crate) fn note_instruction(&mut self, pc: u32, opcode: u16) {
        if !self.trace.category_live(TraceCategory::Instruction) {
            return;
        }
        let event = InstructionEvent {
            pc,
            opcode,
            cycles: self.trace.stamp,
        };
        if self.trace.instruction.fire(&event) == HookAction::Stop {
            self.stop_requested = true;
        }
    }

    pub(crate) fn note_flow(&mut self, kind: FlowKind, to: u32, vector: Option<u8>) {
        if !self.trace.category_live(TraceCategory::Flow) {
            return;
        }
        let event = FlowEvent {
            kind,
            from: self.trace.pc,
            to,
            vector,
            cycles: self.trace.stamp,
        };
        self.trace.pending_flow.push(event);
    }

    pub(crate) fn note_memory(&mut self, access: MemoryAccess, address: u32, size: Size, value: u32) {
        if !self.trace.category_live(TraceCategory::Memory)
            || !self.trace.passes_filter(address, size)
        {
            return;
        }
        let event = MemoryEvent {
            access,
            address,
            size,
            value,
            pc: self.trace.pc,
            cycles: self.trace.stamp,
        };
        self.trace.pending_memory.push(event);
    }
}
