//! Property tests for the memory bridge and addressing side effects.

mod common;

use common::Machine;
use motorola_680x0::CpuModel;
use proptest::prelude::*;

fn any_model() -> impl Strategy<Value = CpuModel> {
    prop::sample::select(CpuModel::ALL.to_vec())
}

proptest! {
    /// A long write lands big-endian in the region and reads back byte by
    /// byte in order.
    #[test]
    fn long_writes_are_big_endian(value: u32, slot in 0u32..0x1000, model in any_model()) {
        let addr = 0x8000 + slot * 4;
        // MOVE.L D0,(A0); MOVE.B (A0)+,D1 x4
        let mut m = Machine::new(model, &[0x2080, 0x1218, 0x1218, 0x1218, 0x1218]);
        m.cpu.regs.d[0] = value;
        m.cpu.regs.a[0] = addr;
        m.step();

        prop_assert_eq!(m.peek_long(addr), value);
        let expected = value.to_be_bytes();
        for (i, byte) in expected.iter().enumerate() {
            prop_assert_eq!(m.peek_byte(addr + i as u32), *byte);
        }

        let mut rebuilt = 0u32;
        for _ in 0..4 {
            m.step();
            rebuilt = (rebuilt << 8) | (m.cpu.regs.d[1] & 0xFF);
        }
        prop_assert_eq!(rebuilt, value);
        prop_assert_eq!(m.cpu.regs.a[0], addr + 4);
    }

    /// Untouched neighbours survive a narrower write.
    #[test]
    fn word_writes_touch_two_bytes(value: u16, slot in 1u32..0x1000, fill: u8) {
        let addr = 0x8000 + slot * 2;
        // MOVE.W D0,(A0)
        let mut m = Machine::new(CpuModel::M68000, &[0x3080]);
        m.poke_byte(addr - 1, fill);
        m.poke_byte(addr + 2, fill);
        m.cpu.regs.d[0] = u32::from(value);
        m.cpu.regs.a[0] = addr;
        m.step();
        prop_assert_eq!(m.peek_word(addr), value);
        prop_assert_eq!(m.peek_byte(addr - 1), fill);
        prop_assert_eq!(m.peek_byte(addr + 2), fill);
    }

    /// N post-increments advance An by N operand sizes; N pre-decrements
    /// bring it back.
    #[test]
    fn postinc_then_predec_round_trips(
        size in 0usize..3,
        reg in 0u16..7,
        n in 1usize..24,
        model in any_model(),
    ) {
        let (step, post, pre) = [(1u32, 0x1018u16, 0x1020u16), (2, 0x3018, 0x3020), (4, 0x2018, 0x2020)][size];
        // MOVE.<size> (An)+,D0 then MOVE.<size> -(An),D0
        let post = post | reg;
        let pre = pre | reg;
        let mut program = vec![post; n];
        program.extend(std::iter::repeat_n(pre, n));
        let mut m = Machine::new(model, &program);
        let start = 0x9000;
        m.cpu.regs.a[usize::from(reg)] = start;

        for _ in 0..n {
            m.step();
        }
        prop_assert_eq!(m.cpu.regs.a[usize::from(reg)], start + n as u32 * step);
        for _ in 0..n {
            m.step();
        }
        prop_assert_eq!(m.cpu.regs.a[usize::from(reg)], start);
    }
}
