//! The processor session.
//!
//! A [`Cpu680x0`] owns everything one emulated processor needs: the
//! register file, the region table, the instrumentation state and the
//! exception bookkeeping. Several sessions can coexist; none of them share
//! state. The host bus is not owned: it is lent to [`Cpu680x0::reset`],
//! [`Cpu680x0::execute`] and [`Cpu680x0::step`] for the duration of the call.

use emu_core::{Observable, Value};
use tracing::debug;

use crate::alu::Size;
use crate::error::ConfigError;
use crate::exceptions::FrameLog;
use crate::memory::{FunctionCode, HostBus, RegionTable, UnmappedAccess};
use crate::model::{CpuCapabilities, CpuModel};
use crate::registers::{RegisterId, Registers};
use crate::table::DispatchTable;
use crate::trace::TraceState;

/// Session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuConfig {
    pub model: CpuModel,
    /// What an access nothing answers turns into.
    pub unmapped: UnmappedAccess,
}

impl CpuConfig {
    #[must_use]
    pub fn new(model: CpuModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }
}

/// Run state between instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Running,
    /// STOP executed; waits for an unmasked interrupt or reset.
    Stopped,
    /// Double bus fault or a halt pulse; waits for reset.
    Halted,
}

/// Single-step sub-state used by [`Cpu680x0::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepMode {
    Off,
    /// One instruction may still start.
    Armed,
    /// The instruction has retired; the loop must return.
    Break,
}

/// Pending external signals.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Irq {
    /// Level currently driven on the IPL lines (0 = none).
    pub level: u8,
    /// Level 7 is edge triggered: latched on the rising edge.
    pub nmi_latched: bool,
    /// A bus error pulse waiting for the next instruction boundary.
    pub bus_error: bool,
}

/// A Motorola 680x0 processor session.
pub struct Cpu680x0 {
    /// Register file. Writes to SR should go through
    /// [`Registers::set_sr`] so the stack pointers stay consistent.
    pub regs: Registers,
    model: CpuModel,
    pub(crate) caps: CpuCapabilities,
    pub(crate) unmapped: UnmappedAccess,
    pub(crate) regions: RegionTable,
    pub(crate) trace: TraceState,
    pub(crate) table: &'static DispatchTable,
    pub(crate) state: State,
    pub(crate) step_mode: StepMode,
    pub(crate) irq: Irq,
    pub(crate) frames: FrameLog,
    /// Opcode of the instruction being executed (IR).
    pub(crate) opcode: u16,
    /// Data-dependent cycles added by the current handler.
    pub(crate) extra_cycles: u32,
    /// Exception processing cycles of the current instruction boundary.
    pub(crate) exception_cycles: u32,
    /// Bus clocks spent by the current instruction's accesses.
    pub(crate) bus_clocks: u32,
    /// Wait states reported by the host for the current instruction.
    pub(crate) wait_cycles: u32,
    /// A hook asked to end the timeslice.
    pub(crate) stop_requested: bool,
}

impl Cpu680x0 {
    /// Create a session. Registers start zeroed in supervisor mode with
    /// interrupts masked; call [`reset`](Self::reset) to load the vectors.
    #[must_use]
    pub fn new(config: CpuConfig) -> Self {
        let model = config.model;
        Self {
            regs: Registers::new(model.sr_mask()),
            model,
            caps: model.capabilities(),
            unmapped: config.unmapped,
            regions: RegionTable::default(),
            trace: TraceState::default(),
            table: DispatchTable::for_model(model),
            state: State::Running,
            step_mode: StepMode::Off,
            irq: Irq::default(),
            frames: FrameLog::default(),
            opcode: 0,
            extra_cycles: 0,
            exception_cycles: 0,
            bus_clocks: 0,
            wait_cycles: 0,
            stop_requested: false,
        }
    }

    /// The configured CPU model.
    #[must_use]
    pub fn model(&self) -> CpuModel {
        self.model
    }

    /// Clocks per bus cycle: 4 on the 68000/68010, 3 from the 68020 on.
    #[must_use]
    pub(crate) fn bus_cycle_clocks(&self) -> u32 {
        if self.caps.long_ops { 3 } else { 4 }
    }

    /// Reset: supervisor mode, interrupts masked, trace off, VBR cleared;
    /// SSP from address 0 and PC from address 4. A bus error while
    /// loading the vectors halts the processor.
    pub fn reset(&mut self, bus: &mut dyn HostBus) {
        self.regs.set_sr(0x2700);
        self.regs.vbr = 0;
        self.regs.cacr = 0;
        self.state = State::Running;
        self.step_mode = StepMode::Off;
        self.irq = Irq::default();
        self.frames.clear();
        self.stop_requested = false;

        let fc = FunctionCode::SupervisorProgram;
        let vectors = self
            .bus_read(bus, 0, Size::Long, fc)
            .and_then(|ssp| Ok((ssp, self.bus_read(bus, 4, Size::Long, fc)?)));
        self.bus_clocks = 0;
        self.wait_cycles = 0;
        match vectors {
            Ok((ssp, pc)) => {
                self.regs.a[7] = ssp;
                self.regs.pc = pc;
                self.regs.prev_pc = pc;
                debug!(
                    model = %self.model,
                    ssp = format_args!("{ssp:#010X}"),
                    pc = format_args!("{pc:#010X}"),
                    "reset"
                );
            }
            Err(fault) => {
                debug!(?fault, "bus error loading reset vectors, processor halted");
                self.state = State::Halted;
            }
        }
    }

    /// Read a register. Registers the model lacks are rejected.
    pub fn get_register(&self, id: RegisterId) -> Result<u32, ConfigError> {
        self.check_register(id)?;
        let r = &self.regs;
        Ok(match id {
            RegisterId::Pc => r.pc,
            RegisterId::Sr => u32::from(r.sr()),
            RegisterId::Usp => r.usp(),
            RegisterId::Isp => r.isp(),
            RegisterId::Msp => r.msp(),
            RegisterId::Vbr => r.vbr,
            RegisterId::Cacr => r.cacr,
            RegisterId::Caar => r.caar,
            RegisterId::Sfc => u32::from(r.sfc),
            RegisterId::Dfc => u32::from(r.dfc),
            RegisterId::PrevPc => r.prev_pc,
            gp => {
                let n = gp as usize;
                r.da(n)
            }
        })
    }

    /// Write a register. Registers the model lacks are rejected and
    /// nothing changes.
    pub fn set_register(&mut self, id: RegisterId, value: u32) -> Result<(), ConfigError> {
        self.check_register(id)?;
        let r = &mut self.regs;
        match id {
            RegisterId::Pc => r.pc = value,
            RegisterId::Sr => r.set_sr(value as u16),
            RegisterId::Usp => r.set_usp(value),
            RegisterId::Isp => r.set_isp(value),
            RegisterId::Msp => r.set_msp(value),
            RegisterId::Vbr => r.vbr = value,
            RegisterId::Cacr => r.cacr = value,
            RegisterId::Caar => r.caar = value,
            RegisterId::Sfc => r.sfc = (value & 7) as u8,
            RegisterId::Dfc => r.dfc = (value & 7) as u8,
            RegisterId::PrevPc => r.prev_pc = value,
            gp => {
                let n = gp as usize;
                if n < 8 {
                    r.d[n] = value;
                } else {
                    r.a[n - 8] = value;
                }
            }
        }
        Ok(())
    }

    fn check_register(&self, id: RegisterId) -> Result<(), ConfigError> {
        let caps = self.caps;
        let present = match id {
            RegisterId::Vbr | RegisterId::Sfc | RegisterId::Dfc => caps.vbr,
            RegisterId::Cacr | RegisterId::Msp => caps.cacr,
            RegisterId::Caar => caps.cacr && !self.model.is_040(),
            _ => true,
        };
        if present {
            Ok(())
        } else {
            Err(ConfigError::UnsupportedRegister {
                register: id,
                model: self.model,
            })
        }
    }

    /// Drive the interrupt priority lines. Level 0 withdraws the request.
    /// Level 7 is edge triggered: it is taken once per rising edge, even
    /// with the mask at 7. Lower levels are taken while they stay asserted
    /// above the mask; a masked request stays pending.
    pub fn raise_interrupt(&mut self, level: u8) -> Result<(), ConfigError> {
        if level > 7 {
            return Err(ConfigError::InterruptLevel(level));
        }
        if level == 7 && self.irq.level != 7 {
            self.irq.nmi_latched = true;
        }
        self.irq.level = level;
        Ok(())
    }

    /// Assert HALT: the processor stops until reset.
    pub fn pulse_halt(&mut self) {
        debug!(pc = format_args!("{:#010X}", self.regs.pc), "halt pulse");
        self.state = State::Halted;
    }

    /// Assert BERR: a bus error exception is taken at the next instruction
    /// boundary.
    pub fn pulse_bus_error(&mut self) {
        self.irq.bus_error = true;
    }

    /// True after a double bus fault or a halt pulse.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// True while waiting in STOP.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state == State::Stopped
    }
}

impl Observable for Cpu680x0 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(n) = path.strip_prefix('d').and_then(|n| n.parse::<usize>().ok()) {
            return self.regs.d.get(n).map(|&v| Value::U32(v));
        }
        if let Some(n) = path.strip_prefix('a').and_then(|n| n.parse::<usize>().ok()) {
            return self.regs.a.get(n).map(|&v| Value::U32(v));
        }
        let sr = self.regs.sr();
        let flag = |bit: u16| Some(Value::Bool(sr & bit != 0));
        match path {
            "pc" => Some(Value::U32(self.regs.pc)),
            "prev_pc" => Some(Value::U32(self.regs.prev_pc)),
            "sr" => Some(Value::U16(sr)),
            "ccr" => Some(Value::U8(self.regs.ccr())),
            "usp" => Some(Value::U32(self.regs.usp())),
            "isp" => Some(Value::U32(self.regs.isp())),
            "msp" if self.caps.master_stack => Some(Value::U32(self.regs.msp())),
            "vbr" if self.caps.vbr => Some(Value::U32(self.regs.vbr)),
            "cacr" if self.caps.cacr => Some(Value::U32(self.regs.cacr)),
            "ir" => Some(Value::U16(self.opcode)),
            "flags.c" => flag(crate::flags::C),
            "flags.v" => flag(crate::flags::V),
            "flags.z" => flag(crate::flags::Z),
            "flags.n" => flag(crate::flags::N),
            "flags.x" => flag(crate::flags::X),
            "flags.s" => flag(crate::flags::S),
            "flags.m" => flag(crate::flags::M),
            "flags.t" => flag(crate::flags::T),
            "flags.ipl" => Some(Value::U8(self.regs.interrupt_mask())),
            "halted" => Some(Value::Bool(self.is_halted())),
            "stopped" => Some(Value::Bool(self.is_stopped())),
            "model" => Some(Value::String(self.model.to_string())),
            "cycles" => Some(Value::U64(self.total_cycles().get())),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "prev_pc", "sr", "ccr",
            "d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7",
            "a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7",
            "usp", "isp", "msp", "vbr", "cacr", "ir",
            "flags.c", "flags.v", "flags.z", "flags.n", "flags.x",
            "flags.s", "flags.m", "flags.t", "flags.ipl",
            "halted", "stopped", "model", "cycles",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::OpenBus;

    fn cpu(model: CpuModel) -> Cpu680x0 {
        Cpu680x0::new(CpuConfig::new(model))
    }

    #[test]
    fn reset_loads_vectors_from_regions() {
        let mut cpu = cpu(CpuModel::M68000);
        let mut rom = vec![0; 8];
        rom[..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        rom[4..].copy_from_slice(&0x0000_0400u32.to_be_bytes());
        cpu.add_region(0, rom).expect("region");
        cpu.regs.set_sr(0);
        cpu.reset(&mut OpenBus);
        assert_eq!(cpu.regs.a[7], 0x0001_0000);
        assert_eq!(cpu.regs.pc, 0x400);
        assert_eq!(cpu.regs.sr(), 0x2700);
        assert!(!cpu.is_halted());
    }

    #[test]
    fn reset_with_bus_errors_halts() {
        let mut cpu = Cpu680x0::new(CpuConfig {
            model: CpuModel::M68000,
            unmapped: UnmappedAccess::BusError,
        });
        cpu.reset(&mut OpenBus);
        assert!(cpu.is_halted());
    }

    #[test]
    fn registers_are_gated_by_model() {
        let mut c = cpu(CpuModel::M68000);
        assert!(matches!(
            c.set_register(RegisterId::Vbr, 0x1000),
            Err(ConfigError::UnsupportedRegister { register: RegisterId::Vbr, .. })
        ));
        assert_eq!(c.get_register(RegisterId::D0), Ok(0));

        let mut c = cpu(CpuModel::M68010);
        c.set_register(RegisterId::Vbr, 0x1000).expect("68010 has VBR");
        assert_eq!(c.regs.vbr, 0x1000);
        assert!(c.get_register(RegisterId::Cacr).is_err());

        let c = cpu(CpuModel::M68040);
        assert!(c.get_register(RegisterId::Caar).is_err());
        assert!(c.get_register(RegisterId::Msp).is_ok());
    }

    #[test]
    fn stack_pointer_ids_read_their_slot() {
        let mut c = cpu(CpuModel::M68000);
        c.set_register(RegisterId::A7, 0x8000).expect("a7");
        c.set_register(RegisterId::Usp, 0x4000).expect("usp");
        assert_eq!(c.get_register(RegisterId::Isp), Ok(0x8000));
        c.set_register(RegisterId::Sr, 0).expect("sr");
        assert_eq!(c.get_register(RegisterId::A7), Ok(0x4000));
        assert_eq!(c.get_register(RegisterId::Isp), Ok(0x8000));
    }

    #[test]
    fn interrupt_level_is_validated() {
        let mut c = cpu(CpuModel::M68000);
        assert_eq!(c.raise_interrupt(8), Err(ConfigError::InterruptLevel(8)));
        c.raise_interrupt(7).expect("level 7");
        assert!(c.irq.nmi_latched);
        c.irq.nmi_latched = false;
        c.raise_interrupt(7).expect("level 7 held");
        assert!(!c.irq.nmi_latched, "no new edge while held");
    }

    #[test]
    fn observable_paths() {
        let mut c = cpu(CpuModel::M68020);
        c.regs.d[3] = 0xDEAD_BEEF;
        c.regs.set_sr(0x2704);
        assert_eq!(c.query("d3"), Some(Value::U32(0xDEAD_BEEF)));
        assert_eq!(c.query("flags.z"), Some(Value::Bool(true)));
        assert_eq!(c.query("flags.ipl"), Some(Value::U8(7)));
        assert_eq!(c.query("model"), Some(Value::String("MC68020".into())));
        assert_eq!(c.query("d8"), None);
        assert_eq!(c.query("bogus"), None);
        for path in c.query_paths() {
            assert!(c.query(path).is_some(), "{path}");
        }
    }
}
