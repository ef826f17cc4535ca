//! Unit test rig: 64 KiB of RAM at address 0, SSP $8000, program at $400.

use crate::cpu::{Cpu680x0, CpuConfig};
use crate::memory::{OpenBus, RegionId};
use crate::model::CpuModel;

pub(crate) const PROGRAM: u32 = 0x400;
pub(crate) const STACK: u32 = 0x8000;

pub(crate) struct Rig {
    pub cpu: Cpu680x0,
    ram: RegionId,
}

impl Rig {
    pub(crate) fn new(model: CpuModel, program: &[u16]) -> Self {
        let mut ram = vec![0u8; 0x1_0000];
        ram[..4].copy_from_slice(&STACK.to_be_bytes());
        ram[4..8].copy_from_slice(&PROGRAM.to_be_bytes());
        for (i, word) in program.iter().enumerate() {
            let at = PROGRAM as usize + 2 * i;
            ram[at..at + 2].copy_from_slice(&word.to_be_bytes());
        }
        let mut cpu = Cpu680x0::new(CpuConfig::new(model));
        let ram = cpu.add_region(0, ram).expect("ram");
        cpu.reset(&mut OpenBus);
        Self { cpu, ram }
    }

    fn bytes(&mut self) -> &mut [u8] {
        self.cpu.region_mut(self.ram).expect("ram").data_mut()
    }

    /// Point exception vector `n` at `handler`.
    pub(crate) fn vector(&mut self, n: u8, handler: u32) -> &mut Self {
        self.poke_long(u32::from(n) * 4, handler)
    }

    pub(crate) fn poke_word(&mut self, addr: u32, value: u16) -> &mut Self {
        let at = addr as usize;
        self.bytes()[at..at + 2].copy_from_slice(&value.to_be_bytes());
        self
    }

    pub(crate) fn poke_long(&mut self, addr: u32, value: u32) -> &mut Self {
        let at = addr as usize;
        self.bytes()[at..at + 4].copy_from_slice(&value.to_be_bytes());
        self
    }

    pub(crate) fn peek_byte(&mut self, addr: u32) -> u8 {
        self.bytes()[addr as usize]
    }

    pub(crate) fn peek_word(&mut self, addr: u32) -> u16 {
        let at = addr as usize;
        u16::from_be_bytes([self.bytes()[at], self.bytes()[at + 1]])
    }

    pub(crate) fn peek_long(&mut self, addr: u32) -> u32 {
        let at = addr as usize;
        let b = &self.bytes()[at..at + 4];
        u32::from_be_bytes([b[0], b[1], b[2], b[3]])
    }

    /// Execute `n` instructions and return the cycles they took.
    pub(crate) fn steps(&mut self, n: usize) -> u32 {
        (0..n).map(|_| self.cpu.step(&mut OpenBus)).sum()
    }
}
