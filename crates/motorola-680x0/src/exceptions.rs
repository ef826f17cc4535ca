//! Exception processing for the 680x0 family.
//!
//! Exception groups:
//! - Group 0: Reset, bus error, address error (highest priority)
//! - Group 1: Trace, interrupt, illegal instruction, privilege violation
//! - Group 2: TRAP, TRAPV, TRAPcc, CHK, CHK2, zero divide
//!
//! Stack frames by model:
//! - 68000: SR + PC (6 bytes); group 0 adds access info, fault address and
//!   IR (14 bytes). No format word.
//! - 68010: format $0 (8 bytes), format $8 for bus/address error (58 bytes).
//! - 68020/68030: format $0, $1 (throwaway, interrupt taken with M set),
//!   $2 (instruction address, 12 bytes), $A (short bus fault, 32 bytes).
//! - 68040: format $0, $2 (also used for address error), $7 (access error,
//!   60 bytes).
//!
//! Every frame pushed on a 68010 or later is recorded with its stack
//! address. RTE validates the format word it pops against that record; a
//! disagreement means push and pop logic have diverged and the session
//! panics.

use tracing::{debug, trace, warn};

use crate::alu::Size;
use crate::cpu::{Cpu680x0, State};
use crate::flags::{IPL_MASK, M, S, T, T0};
use crate::memory::{FunctionCode, HostBus};
use crate::trace::FlowKind;

pub(crate) const BUS_ERROR: u8 = 2;
pub(crate) const ADDRESS_ERROR: u8 = 3;
pub(crate) const ILLEGAL_INSTRUCTION: u8 = 4;
pub(crate) const ZERO_DIVIDE: u8 = 5;
pub(crate) const CHK: u8 = 6;
pub(crate) const TRAPV: u8 = 7;
pub(crate) const PRIVILEGE_VIOLATION: u8 = 8;
pub(crate) const TRACE: u8 = 9;
pub(crate) const LINE_A: u8 = 10;
pub(crate) const LINE_F: u8 = 11;
pub(crate) const FORMAT_ERROR: u8 = 14;
pub(crate) const TRAP_BASE: u8 = 32;

/// Details of a faulted bus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AccessFault {
    pub address: u32,
    pub write: bool,
    pub size: Size,
    pub fc: FunctionCode,
}

impl AccessFault {
    pub(crate) fn read(address: u32, size: Size, fc: FunctionCode) -> Self {
        Self {
            address,
            write: false,
            size,
            fc,
        }
    }

    pub(crate) fn write(address: u32, size: Size, fc: FunctionCode) -> Self {
        Self {
            address,
            write: true,
            size,
            fc,
        }
    }
}

/// Why an instruction stopped early. Converted into exception processing by
/// the engine; never seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// Nothing answered the access (or the host asked for a bus error).
    Bus(AccessFault),
    /// Word or long access at an odd address.
    Address(AccessFault),
    /// Exception raised by the instruction itself.
    Trap { vector: u8, return_pc: u32 },
}

/// Frame shapes the controller knows how to push.
#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Plain group 1/2 frame.
    Normal { return_pc: u32 },
    /// Group 2 frame carrying the faulting instruction's address
    /// (format $2 on the 68020 and later).
    Instruction { return_pc: u32, address: u32 },
    /// Interrupt (format $0 plus a throwaway frame when M was set).
    Interrupt { return_pc: u32 },
    /// Group 0 bus or address error.
    Access { return_pc: u32, fault: AccessFault },
}

/// Which supervisor stack a recorded frame lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stack {
    Interrupt,
    Master,
}

#[derive(Debug, Clone, Copy)]
struct FrameRecord {
    stack: Stack,
    sp: u32,
    format: u8,
}

/// Frames pushed and not yet popped.
#[derive(Debug, Default)]
pub(crate) struct FrameLog {
    records: Vec<FrameRecord>,
}

impl FrameLog {
    const CAPACITY: usize = 256;

    fn push(&mut self, stack: Stack, sp: u32, format: u8) {
        self.records.retain(|r| r.stack != stack || r.sp > sp);
        if self.records.len() == Self::CAPACITY {
            self.records.remove(0);
        }
        self.records.push(FrameRecord { stack, sp, format });
    }

    /// Check a frame about to be popped against its record.
    fn pop(&mut self, stack: Stack, sp: u32, format: u8) {
        if let Some(pos) = self
            .records
            .iter()
            .rposition(|r| r.stack == stack && r.sp == sp)
        {
            let pushed = self.records.remove(pos);
            assert!(
                pushed.format == format,
                "exception frame mismatch at RTE: format ${:X} pushed at {sp:#010X}, popped as format ${format:X}",
                pushed.format
            );
        }
    }

    /// Forget frames whose stack pointer has moved above them.
    pub(crate) fn prune(&mut self, isp: u32, msp: u32) {
        if self.records.is_empty() {
            return;
        }
        self.records.retain(|r| match r.stack {
            Stack::Interrupt => r.sp >= isp,
            Stack::Master => r.sp >= msp,
        });
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}

fn flow_kind(vector: u8) -> FlowKind {
    match vector {
        ZERO_DIVIDE | CHK | TRAPV => FlowKind::Trap,
        v if v >= TRAP_BASE && v < TRAP_BASE + 16 => FlowKind::Trap,
        _ => FlowKind::Exception,
    }
}

fn split(value: u32) -> [u16; 2] {
    [(value >> 16) as u16, value as u16]
}

impl Cpu680x0 {
    /// Illegal instruction: the stacked PC points past the opcode.
    pub(crate) fn illegal(&self) -> Fault {
        Fault::Trap {
            vector: ILLEGAL_INSTRUCTION,
            return_pc: self.regs.pc,
        }
    }

    pub(crate) fn line_a(&self) -> Fault {
        Fault::Trap {
            vector: LINE_A,
            return_pc: self.regs.pc,
        }
    }

    pub(crate) fn line_f(&self) -> Fault {
        Fault::Trap {
            vector: LINE_F,
            return_pc: self.regs.pc,
        }
    }

    /// Privilege violation: the stacked PC points at the offending opcode.
    pub(crate) fn privilege(&self) -> Fault {
        Fault::Trap {
            vector: PRIVILEGE_VIOLATION,
            return_pc: self.regs.prev_pc,
        }
    }

    /// Instruction trap (TRAP, TRAPV, CHK, zero divide); returns to the
    /// next instruction.
    pub(crate) fn trap(&self, vector: u8) -> Fault {
        Fault::Trap {
            vector,
            return_pc: self.regs.pc,
        }
    }

    /// Privileged instructions call this first.
    pub(crate) fn require_supervisor(&self) -> Result<(), Fault> {
        if self.regs.is_supervisor() {
            Ok(())
        } else {
            Err(self.privilege())
        }
    }

    fn format_word(format: u8, vector: u8) -> u16 {
        (u16::from(format) << 12) | (u16::from(vector) * 4)
    }

    /// Words of the frame in memory order (lowest address first) and the
    /// format recorded for RTE validation (`None` on the 68000).
    fn frame_words(&self, frame: Frame, sr: u16, vector: u8) -> (Vec<u16>, Option<u8>) {
        let model = self.model();
        let head = |pc: u32| {
            let [hi, lo] = split(pc);
            vec![sr, hi, lo]
        };
        if !model.capabilities().vbr {
            return match frame {
                Frame::Access { return_pc, fault } => {
                    let mut info = u16::from(fault.fc.bits());
                    if !fault.write {
                        info |= 0x10;
                    }
                    if !fault.fc.is_program() {
                        info |= 0x08;
                    }
                    let [ahi, alo] = split(fault.address);
                    let mut words = vec![info, ahi, alo, self.opcode];
                    words.extend(head(return_pc));
                    (words, None)
                }
                Frame::Normal { return_pc }
                | Frame::Instruction { return_pc, .. }
                | Frame::Interrupt { return_pc } => (head(return_pc), None),
            };
        }

        let caps = model.capabilities();
        match frame {
            Frame::Normal { return_pc } | Frame::Interrupt { return_pc } => {
                let mut words = head(return_pc);
                words.push(Self::format_word(0, vector));
                (words, Some(0))
            }
            Frame::Instruction { return_pc, address } if caps.long_ops => {
                let mut words = head(return_pc);
                words.push(Self::format_word(2, vector));
                words.extend(split(address));
                (words, Some(2))
            }
            Frame::Instruction { return_pc, .. } => {
                let mut words = head(return_pc);
                words.push(Self::format_word(0, vector));
                (words, Some(0))
            }
            Frame::Access { return_pc, fault } if model.is_040() && vector == ADDRESS_ERROR => {
                let mut words = head(return_pc);
                words.push(Self::format_word(2, vector));
                words.extend(split(fault.address));
                (words, Some(2))
            }
            Frame::Access { return_pc, fault } if model.is_040() => {
                let mut ssw = u16::from(fault.fc.bits());
                if !fault.write {
                    ssw |= 0x0100;
                }
                ssw |= match fault.size {
                    Size::Long => 0x0000,
                    Size::Byte => 0x0020,
                    Size::Word => 0x0040,
                };
                let mut words = head(return_pc);
                words.push(Self::format_word(7, vector));
                words.extend(split(fault.address)); // effective address
                words.extend([ssw, 0, 0, 0]);
                words.extend(split(fault.address));
                words.extend([0; 18]);
                (words, Some(7))
            }
            Frame::Access { return_pc, fault } if caps.long_ops => {
                let mut ssw = u16::from(fault.fc.bits());
                if !fault.write {
                    ssw |= 0x0040;
                }
                ssw |= match fault.size {
                    Size::Long => 0x0000,
                    Size::Byte => 0x0010,
                    Size::Word => 0x0020,
                };
                if fault.fc.is_program() {
                    ssw |= 0x4000;
                } else {
                    ssw |= 0x0100;
                }
                let mut words = head(return_pc);
                words.push(Self::format_word(0xA, vector));
                words.extend([0, ssw, self.opcode, 0]);
                words.extend(split(fault.address));
                words.extend([0, 0, 0, 0, 0, 0]);
                (words, Some(0xA))
            }
            Frame::Access { return_pc, fault } => {
                let mut ssw = u16::from(fault.fc.bits());
                if !fault.write {
                    ssw |= 0x0100;
                }
                if fault.size == Size::Byte {
                    ssw |= 0x0200;
                }
                ssw |= if fault.fc.is_program() { 0x2000 } else { 0x1000 };
                let mut words = head(return_pc);
                words.push(Self::format_word(8, vector));
                words.push(ssw);
                words.extend(split(fault.address));
                words.extend([0, 0, 0, 0, 0, self.opcode]);
                words.extend([0; 16]);
                (words, Some(8))
            }
        }
    }

    /// Push a frame on the active supervisor stack, highest word first.
    fn push_frame(
        &mut self,
        bus: &mut dyn HostBus,
        frame: Frame,
        sr: u16,
        vector: u8,
    ) -> Result<(), Fault> {
        let (words, format) = self.frame_words(frame, sr, vector);
        let sp = self.regs.a[7].wrapping_sub(2 * words.len() as u32);
        for (i, word) in words.iter().enumerate().rev() {
            let addr = sp.wrapping_add(2 * i as u32);
            self.write_fc(bus, addr, Size::Word, u32::from(*word), FunctionCode::SupervisorData)?;
        }
        self.regs.a[7] = sp;
        if let Some(format) = format {
            self.frames.push(self.active_stack(), sp, format);
        }
        Ok(())
    }

    fn active_stack(&self) -> Stack {
        if self.regs.sr() & M != 0 {
            Stack::Master
        } else {
            Stack::Interrupt
        }
    }

    /// Common exception entry: supervisor mode, frame, vector fetch, jump.
    fn enter(
        &mut self,
        bus: &mut dyn HostBus,
        vector: u8,
        frame: Frame,
        new_mask: Option<u8>,
    ) -> Result<(), Fault> {
        let old_sr = self.regs.sr();
        let mut sr = (old_sr | S) & !(T | T0);
        if let Some(level) = new_mask {
            sr = (sr & !IPL_MASK) | (u16::from(level) << 8);
        }
        self.regs.set_sr(sr);
        self.push_frame(bus, frame, old_sr, vector)?;

        // An interrupt taken on the master stack leaves a throwaway frame on
        // the interrupt stack and continues there.
        if let Frame::Interrupt { return_pc } = frame {
            if self.regs.sr() & M != 0 {
                self.regs.set_sr(self.regs.sr() & !M);
                let [hi, lo] = split(return_pc);
                let words = [old_sr | S, hi, lo, Self::format_word(1, vector)];
                let sp = self.regs.a[7].wrapping_sub(8);
                for (i, word) in words.iter().enumerate().rev() {
                    let addr = sp.wrapping_add(2 * i as u32);
                    self.write_fc(bus, addr, Size::Word, u32::from(*word), FunctionCode::SupervisorData)?;
                }
                self.regs.a[7] = sp;
                self.frames.push(Stack::Interrupt, sp, 1);
            }
        }

        let table = self.regs.vbr.wrapping_add(u32::from(vector) * 4);
        let handler = self.read_fc(bus, table, Size::Long, FunctionCode::SupervisorData)?;
        self.regs.pc = handler;
        if self.state == State::Stopped {
            self.state = State::Running;
        }
        self.exception_cycles += crate::timing::exception_cycles(self.model().timing(), vector);
        self.note_flow(flow_kind(vector), handler, Some(vector));
        debug!(vector, handler = format_args!("{handler:#010X}"), "exception");
        Ok(())
    }

    /// Exception raised by an instruction (or by trace).
    pub(crate) fn take_trap(
        &mut self,
        bus: &mut dyn HostBus,
        vector: u8,
        return_pc: u32,
    ) -> Result<(), Fault> {
        let frame = match vector {
            ZERO_DIVIDE | CHK | TRAPV | TRACE => Frame::Instruction {
                return_pc,
                address: self.regs.prev_pc,
            },
            _ => Frame::Normal { return_pc },
        };
        self.enter(bus, vector, frame, None)
    }

    /// Bus or address error.
    pub(crate) fn take_access_fault(
        &mut self,
        bus: &mut dyn HostBus,
        vector: u8,
        fault: AccessFault,
    ) -> Result<(), Fault> {
        // The 68000 stacks the PC as advanced so far; later models stack the
        // instruction address so the handler can rerun it.
        let return_pc = if self.caps.vbr {
            self.regs.prev_pc
        } else {
            self.regs.pc
        };
        self.enter(bus, vector, Frame::Access { return_pc, fault }, None)
    }

    /// Take an external interrupt at `level` if one is due.
    /// Returns true when exception processing started.
    pub(crate) fn service_interrupt(&mut self, bus: &mut dyn HostBus) -> Result<bool, Fault> {
        let level = if self.irq.nmi_latched {
            self.irq.nmi_latched = false;
            7
        } else if self.irq.level < 7 && self.irq.level > self.regs.interrupt_mask() {
            self.irq.level
        } else {
            return Ok(false);
        };
        let vector = bus.interrupt_ack(level);
        trace!(level, vector, "interrupt acknowledge");
        let return_pc = self.regs.pc;
        self.enter(bus, vector, Frame::Interrupt { return_pc }, Some(level))?;
        Ok(true)
    }

    /// Frame length for a format word the current model can produce.
    fn frame_length(&self, format: u8) -> Option<u32> {
        let model = self.model();
        if model.is_040() {
            match format {
                0 | 1 => Some(8),
                2 | 3 => Some(12),
                4 => Some(16),
                7 => Some(60),
                _ => None,
            }
        } else if self.caps.long_ops {
            match format {
                0 | 1 => Some(8),
                2 => Some(12),
                9 => Some(20),
                0xA => Some(32),
                0xB => Some(92),
                _ => None,
            }
        } else {
            match format {
                0 => Some(8),
                8 => Some(58),
                _ => None,
            }
        }
    }

    /// RTE: pop the frame in the shape it was pushed and resume.
    pub(crate) fn return_from_exception(&mut self, bus: &mut dyn HostBus) -> Result<(), Fault> {
        self.require_supervisor()?;
        let fc = FunctionCode::SupervisorData;
        loop {
            let sp = self.regs.a[7];
            let sr = self.read_fc(bus, sp, Size::Word, fc)? as u16;
            let pc = self.read_fc(bus, sp.wrapping_add(2), Size::Long, fc)?;

            if !self.caps.vbr {
                self.regs.a[7] = sp.wrapping_add(6);
                self.regs.set_sr(sr);
                self.regs.pc = pc;
                break;
            }

            let format_word = self.read_fc(bus, sp.wrapping_add(6), Size::Word, fc)? as u16;
            let format = (format_word >> 12) as u8;
            let Some(length) = self.frame_length(format) else {
                return Err(Fault::Trap {
                    vector: FORMAT_ERROR,
                    return_pc: self.regs.prev_pc,
                });
            };
            self.frames.pop(self.active_stack(), sp, format);
            trace!(format, sp = format_args!("{sp:#010X}"), "RTE frame");

            self.regs.a[7] = sp.wrapping_add(length);
            self.regs.set_sr(sr);
            if format != 1 {
                self.regs.pc = pc;
                break;
            }
        }
        self.note_flow(FlowKind::ExceptionReturn, self.regs.pc, None);
        Ok(())
    }

    /// Convert a fault into exception processing. A bus or address error
    /// while stacking a bus or address error frame halts the processor.
    pub(crate) fn process_fault(&mut self, bus: &mut dyn HostBus, fault: Fault) {
        let group0 = !matches!(fault, Fault::Trap { .. });
        let result = match fault {
            Fault::Trap { vector, return_pc } => self.take_trap(bus, vector, return_pc),
            Fault::Bus(access) => self.take_access_fault(bus, BUS_ERROR, access),
            Fault::Address(access) => self.take_access_fault(bus, ADDRESS_ERROR, access),
        };
        let Err(second) = result else {
            return;
        };
        match second {
            Fault::Bus(access) | Fault::Address(access) if group0 => self.double_fault(access),
            Fault::Bus(access) => {
                if self.take_access_fault(bus, BUS_ERROR, access).is_err() {
                    self.double_fault(access);
                }
            }
            Fault::Address(access) => {
                if self.take_access_fault(bus, ADDRESS_ERROR, access).is_err() {
                    self.double_fault(access);
                }
            }
            Fault::Trap { vector, .. } => {
                // Entry never decodes a format word, so no trap can come back.
                warn!(vector, "unexpected trap during exception entry");
            }
        }
    }

    fn double_fault(&mut self, access: AccessFault) {
        warn!(
            address = format_args!("{:#010X}", access.address),
            "double bus fault, processor halted"
        );
        self.state = State::Halted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_log_matches_push_and_pop() {
        let mut log = FrameLog::default();
        log.push(Stack::Interrupt, 0x1000, 0);
        log.push(Stack::Interrupt, 0x0FF0, 2);
        log.pop(Stack::Interrupt, 0x0FF0, 2);
        log.pop(Stack::Interrupt, 0x1000, 0);
        assert!(log.records.is_empty());
    }

    #[test]
    #[should_panic(expected = "exception frame mismatch")]
    fn frame_log_panics_on_shape_change() {
        let mut log = FrameLog::default();
        log.push(Stack::Interrupt, 0x1000, 2);
        log.pop(Stack::Interrupt, 0x1000, 0);
    }

    #[test]
    fn abandoned_frames_are_pruned() {
        let mut log = FrameLog::default();
        log.push(Stack::Interrupt, 0x1000, 2);
        log.prune(0x1008, 0);
        // A handcrafted frame later built at the same address is not checked
        // against the abandoned one.
        log.pop(Stack::Interrupt, 0x1000, 0);
        assert!(log.records.is_empty());
    }

    #[test]
    fn trap_vectors_report_trap_flow() {
        assert_eq!(flow_kind(TRAP_BASE + 15), FlowKind::Trap);
        assert_eq!(flow_kind(CHK), FlowKind::Trap);
        assert_eq!(flow_kind(ILLEGAL_INSTRUCTION), FlowKind::Exception);
        assert_eq!(flow_kind(TRAP_BASE + 16), FlowKind::Exception);
    }
}
