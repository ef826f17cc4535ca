//! The fetch/decode/execute loop.
//!
//! One iteration is one instruction boundary:
//!
//! 1. pending bus error pulse, then pending interrupt (either enters a
//!    handler instead of executing an instruction)
//! 2. capture the previous PC and fetch the opcode
//! 3. per-instruction hook
//! 4. dispatch through the table
//! 5. convert a fault into exception processing
//! 6. trace exception if T was set when the instruction started
//! 7. deliver buffered flow and memory events, bill the cycles
//!
//! There is no prefetch queue: after an instruction retires, PC is the
//! address of the next instruction and `prev_pc` the address of the one
//! that just ran.

use crate::alu::Size;
use crate::cpu::{Cpu680x0, State, StepMode};
use crate::exceptions::{AccessFault, Fault, TRACE, TRAP_BASE, TRAPV, ZERO_DIVIDE};
use crate::memory::{FunctionCode, HostBus};
use crate::trace::HookAction;

impl Cpu680x0 {
    /// Run until at least `budget` cycles have been consumed, a hook asks
    /// to stop, or the processor stops or halts. Returns the cycles
    /// actually consumed, which can exceed the budget by the tail of the
    /// last instruction. A stopped or halted processor consumes the rest
    /// of the budget idling.
    pub fn execute(&mut self, bus: &mut dyn HostBus, budget: u32) -> u32 {
        self.stop_requested = false;
        let mut used = 0u32;
        while used < budget {
            if self.idle() {
                let rest = budget - used;
                self.trace.add_cycles(rest);
                used = budget;
                break;
            }
            used = used.saturating_add(self.boundary(bus));
            if self.stop_requested {
                break;
            }
        }
        used
    }

    /// Execute exactly one instruction (entering a pending interrupt or
    /// bus error handler first, if any) and return its cycles. A stopped
    /// or halted processor returns 0.
    pub fn step(&mut self, bus: &mut dyn HostBus) -> u32 {
        self.stop_requested = false;
        self.step_mode = StepMode::Armed;
        let mut used = 0u32;
        while self.step_mode == StepMode::Armed && !self.idle() {
            used = used.saturating_add(self.boundary(bus));
        }
        self.step_mode = StepMode::Off;
        used
    }

    /// Halted, or stopped with nothing to wake up for.
    fn idle(&self) -> bool {
        match self.state {
            State::Running => false,
            State::Halted => true,
            State::Stopped => !self.signal_pending(),
        }
    }

    fn signal_pending(&self) -> bool {
        let irq = self.irq;
        irq.bus_error
            || irq.nmi_latched
            || (irq.level < 7 && irq.level > self.regs.interrupt_mask())
    }

    /// One instruction boundary. Returns the cycles it took.
    fn boundary(&mut self, bus: &mut dyn HostBus) -> u32 {
        self.trace.begin(self.regs.pc);
        self.extra_cycles = 0;
        self.exception_cycles = 0;
        self.bus_clocks = 0;
        self.wait_cycles = 0;

        let cycles = if self.irq.bus_error {
            self.irq.bus_error = false;
            self.regs.prev_pc = self.regs.pc;
            let fc = FunctionCode::from_flags(self.regs.is_supervisor(), true);
            let fault = AccessFault::read(self.regs.pc, Size::Word, fc);
            self.process_fault(bus, Fault::Bus(fault));
            self.exception_cycles + self.wait_cycles
        } else {
            self.regs.prev_pc = self.regs.pc;
            match self.service_interrupt(bus) {
                Ok(true) => self.exception_cycles + self.wait_cycles,
                Ok(false) => self.run_instruction(bus),
                Err(fault) => {
                    self.process_fault(bus, fault);
                    self.exception_cycles + self.wait_cycles
                }
            }
        };

        if self.trace.flush() == HookAction::Stop {
            self.stop_requested = true;
        }
        self.frames.prune(self.regs.isp(), self.regs.msp());
        self.trace.add_cycles(cycles);
        cycles
    }

    fn run_instruction(&mut self, bus: &mut dyn HostBus) -> u32 {
        let traced = self.regs.is_trace();
        let pc = self.regs.pc;

        let opcode = match self.fetch_word(bus) {
            Ok(opcode) => opcode,
            Err(fault) => {
                let spent = self.bus_clocks;
                self.process_fault(bus, fault);
                return spent + self.exception_cycles + self.wait_cycles;
            }
        };
        self.opcode = opcode;
        self.note_instruction(pc, opcode);

        let entry = self.table.entry(opcode);
        let result = match self.table.def(opcode) {
            Some(def) => (def.handler)(self, bus, opcode),
            None => Err(self.illegal()),
        };

        let (base, trace_after) = match result {
            Ok(()) => (u32::from(entry.cycles) + self.extra_cycles, true),
            Err(fault) => {
                let billed = match fault {
                    Fault::Trap { .. } => u32::from(entry.ea_cycles) + self.extra_cycles,
                    Fault::Bus(_) | Fault::Address(_) => {
                        self.bus_clocks.min(u32::from(entry.cycles))
                    }
                };
                let traceable = matches!(
                    fault,
                    Fault::Trap { vector, .. }
                        if (ZERO_DIVIDE..=TRAPV).contains(&vector)
                            || (TRAP_BASE..TRAP_BASE + 16).contains(&vector)
                );
                self.process_fault(bus, fault);
                (billed, traceable)
            }
        };

        if traced && trace_after && self.state != State::Halted {
            let return_pc = self.regs.pc;
            if let Err(fault) = self.take_trap(bus, TRACE, return_pc) {
                self.process_fault(bus, fault);
            }
        }

        if self.step_mode == StepMode::Armed {
            self.step_mode = StepMode::Break;
        }
        base + self.exception_cycles + self.wait_cycles
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::{Cpu680x0, CpuConfig};
    use crate::memory::OpenBus;
    use crate::model::CpuModel;

    fn machine(model: CpuModel, program: &[u16]) -> Cpu680x0 {
        let mut cpu = Cpu680x0::new(CpuConfig::new(model));
        let mut ram = vec![0u8; 0x1_0000];
        ram[..4].copy_from_slice(&0x0000_8000u32.to_be_bytes());
        ram[4..8].copy_from_slice(&0x0000_0400u32.to_be_bytes());
        // Level 1 autovector (25) -> NOP at 0x500.
        ram[100..104].copy_from_slice(&0x0000_0500u32.to_be_bytes());
        ram[0x500..0x502].copy_from_slice(&0x4E71u16.to_be_bytes());
        for (i, word) in program.iter().enumerate() {
            let at = 0x400 + 2 * i;
            ram[at..at + 2].copy_from_slice(&word.to_be_bytes());
        }
        cpu.add_region(0, ram).expect("ram");
        cpu.reset(&mut OpenBus);
        cpu
    }

    #[test]
    fn step_reports_exact_boundaries() {
        let mut cpu = machine(CpuModel::M68000, &[0x203C, 0x1234, 0x5678, 0x4E71]);
        let cycles = cpu.step(&mut OpenBus);
        assert_eq!(cycles, 12);
        assert_eq!(cpu.regs.pc, 0x406);
        assert_eq!(cpu.regs.prev_pc, 0x400);
        assert_eq!(cpu.regs.d[0], 0x1234_5678);
    }

    #[test]
    fn budget_is_exact_and_may_overshoot() {
        let mut cpu = machine(CpuModel::M68000, &[0x4E71, 0x4E71, 0x4E71]);
        assert_eq!(cpu.execute(&mut OpenBus, 5), 8);
        assert_eq!(cpu.regs.pc, 0x404);
        assert_eq!(cpu.total_cycles().get(), 8);
        assert_eq!(cpu.execute(&mut OpenBus, 0), 0);
    }

    #[test]
    fn stop_idles_until_an_interrupt() {
        // STOP #$2000
        let mut cpu = machine(CpuModel::M68000, &[0x4E72, 0x2000, 0x4E71]);
        cpu.step(&mut OpenBus);
        assert!(cpu.is_stopped());
        assert_eq!(cpu.step(&mut OpenBus), 0);
        assert_eq!(cpu.execute(&mut OpenBus, 100), 100);

        cpu.raise_interrupt(1).expect("level");
        cpu.step(&mut OpenBus);
        assert!(!cpu.is_stopped());
        assert_eq!(cpu.regs.prev_pc, 0x500);
        assert_eq!(cpu.regs.interrupt_mask(), 1);
    }

    #[test]
    fn halted_consumes_the_budget() {
        let mut cpu = machine(CpuModel::M68000, &[0x4E71]);
        cpu.pulse_halt();
        assert_eq!(cpu.execute(&mut OpenBus, 40), 40);
        assert_eq!(cpu.regs.pc, 0x400);
        assert_eq!(cpu.step(&mut OpenBus), 0);
    }
}
