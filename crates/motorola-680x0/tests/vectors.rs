//! Data-driven single-instruction vectors.
//!
//! Every `tests/vectors/*.json` file holds an array of cases. A case loads
//! the initial register and RAM state, executes one instruction and checks
//! the final state (and the cycle count, when the case gives one).

mod common;

use std::fs;
use std::path::Path;

use common::Machine;
use motorola_680x0::CpuModel;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TestCase {
    name: String,
    model: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    #[serde(default)]
    cycles: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CpuState {
    d: [u32; 8],
    a: [u32; 7],
    usp: u32,
    ssp: u32,
    sr: u16,
    pc: u32,
    #[serde(default)]
    ram: Vec<(u32, u8)>,
}

fn setup(m: &mut Machine, state: &CpuState) {
    for &(addr, value) in &state.ram {
        m.poke_byte(addr, value);
    }
    let regs = &mut m.cpu.regs;
    regs.set_sr(state.sr);
    regs.set_usp(state.usp);
    regs.set_isp(state.ssp);
    regs.d = state.d;
    regs.a[..7].copy_from_slice(&state.a);
    regs.pc = state.pc;
}

fn compare(m: &Machine, expected: &CpuState) -> Vec<String> {
    let mut errors = Vec::new();
    let regs = &m.cpu.regs;

    for (i, (&got, &want)) in regs.d.iter().zip(&expected.d).enumerate() {
        if got != want {
            errors.push(format!("D{i}: got ${got:08X}, want ${want:08X}"));
        }
    }
    for (i, (&got, &want)) in regs.a.iter().zip(&expected.a).enumerate() {
        if got != want {
            errors.push(format!("A{i}: got ${got:08X}, want ${want:08X}"));
        }
    }
    let pairs = [
        ("USP", regs.usp(), expected.usp),
        ("SSP", regs.ssp(), expected.ssp),
        ("SR", u32::from(regs.sr()), u32::from(expected.sr)),
        ("PC", regs.pc, expected.pc),
    ];
    for (name, got, want) in pairs {
        if got != want {
            errors.push(format!("{name}: got ${got:08X}, want ${want:08X}"));
        }
    }
    for &(addr, want) in &expected.ram {
        let got = m.peek_byte(addr);
        if got != want {
            errors.push(format!("RAM[${addr:06X}]: got ${got:02X}, want ${want:02X}"));
        }
    }
    errors
}

fn run_case(case: &TestCase) -> Vec<String> {
    let model: CpuModel = match case.model.parse() {
        Ok(model) => model,
        Err(e) => return vec![e.to_string()],
    };
    let mut m = Machine::new(model, &[]);
    setup(&mut m, &case.initial);
    let cycles = m.step();

    let mut errors = compare(&m, &case.final_state);
    if let Some(want) = case.cycles {
        if cycles != want {
            errors.push(format!("cycles: got {cycles}, want {want}"));
        }
    }
    errors
}

fn run_file(path: &Path) -> (usize, Vec<String>) {
    let text = fs::read_to_string(path).expect("readable vector file");
    let cases: Vec<TestCase> = serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("{}: {e}", path.display()));
    let mut failures = Vec::new();
    for case in &cases {
        let errors = run_case(case);
        if !errors.is_empty() {
            failures.push(format!("{} [{}]: {}", case.name, case.model, errors.join("; ")));
        }
    }
    (cases.len(), failures)
}

#[test]
fn instruction_vectors() {
    common::init_tracing();
    let pattern = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/vectors/*.json");
    let mut total = 0;
    let mut failures = Vec::new();
    for entry in glob::glob(pattern).expect("valid glob pattern") {
        let path = entry.expect("readable directory entry");
        let (count, mut failed) = run_file(&path);
        total += count;
        failures.append(&mut failed);
    }

    assert!(total > 0, "no vectors found under tests/vectors");
    assert!(
        failures.is_empty(),
        "{} of {total} vectors failed:\n{}",
        failures.len(),
        failures.join("\n")
    );
}
