//! Shared harness: a session with 128 KiB of RAM registered at address 0.

#![allow(dead_code)]

use motorola_680x0::{Cpu680x0, CpuConfig, CpuModel, OpenBus, RegionId};

pub const RAM_SIZE: usize = 0x2_0000;
pub const STACK: u32 = 0x1_0000;
pub const PROGRAM: u32 = 0x400;

pub struct Machine {
    pub cpu: Cpu680x0,
    pub bus: OpenBus,
    ram: RegionId,
}

impl Machine {
    /// Reset vectors SSP = $10000, PC = $400; `program` loaded at $400.
    pub fn new(model: CpuModel, program: &[u16]) -> Self {
        let mut ram = vec![0u8; RAM_SIZE];
        ram[..4].copy_from_slice(&STACK.to_be_bytes());
        ram[4..8].copy_from_slice(&PROGRAM.to_be_bytes());
        let mut cpu = Cpu680x0::new(CpuConfig::new(model));
        let ram = cpu.add_region(0, ram).expect("RAM region");
        let mut machine = Self {
            cpu,
            bus: OpenBus,
            ram,
        };
        machine.load(PROGRAM, program);
        machine.cpu.reset(&mut machine.bus);
        machine
    }

    pub fn load(&mut self, addr: u32, words: &[u16]) {
        for (i, word) in words.iter().enumerate() {
            self.poke_word(addr + 2 * i as u32, *word);
        }
    }

    pub fn vector(&mut self, n: u32, handler: u32) {
        self.poke_long(4 * n, handler);
    }

    fn ram(&self) -> &[u8] {
        self.cpu.region(self.ram).expect("RAM region").data()
    }

    fn ram_mut(&mut self) -> &mut [u8] {
        self.cpu.region_mut(self.ram).expect("RAM region").data_mut()
    }

    pub fn poke_byte(&mut self, addr: u32, value: u8) {
        self.ram_mut()[addr as usize] = value;
    }

    pub fn poke_word(&mut self, addr: u32, value: u16) {
        let at = addr as usize;
        self.ram_mut()[at..at + 2].copy_from_slice(&value.to_be_bytes());
    }

    pub fn poke_long(&mut self, addr: u32, value: u32) {
        let at = addr as usize;
        self.ram_mut()[at..at + 4].copy_from_slice(&value.to_be_bytes());
    }

    pub fn peek_byte(&self, addr: u32) -> u8 {
        self.ram()[addr as usize]
    }

    pub fn peek_word(&self, addr: u32) -> u16 {
        let at = addr as usize;
        u16::from_be_bytes([self.ram()[at], self.ram()[at + 1]])
    }

    pub fn peek_long(&self, addr: u32) -> u32 {
        let at = addr as usize;
        let b = &self.ram()[at..at + 4];
        u32::from_be_bytes([b[0], b[1], b[2], b[3]])
    }

    pub fn step(&mut self) -> u32 {
        self.cpu.step(&mut self.bus)
    }

    pub fn execute(&mut self, budget: u32) -> u32 {
        self.cpu.execute(&mut self.bus, budget)
    }
}

/// Route `tracing` output to the test writer once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
