//! Harness for the stock CP/M diagnostic binaries (cpudiag, 8080PRE,
//! TEST, diag2). The binaries are not redistributable, so each case
//! runs only when the image has been dropped into `tests/res/`.

use std::path::PathBuf;

use s100_core::prelude::*;

mod common;
use common::SharedBuf;

const MAX_STEPS: usize = 200_000_000;

fn res(name: &str) -> Option<Vec<u8>> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/res")
        .join(name);
    std::fs::read(path).ok()
}

/// Run a CP/M transient program at 0x100 through the pseudo-BDOS shim
/// and return everything it printed.
fn run_transient(image: &[u8]) -> String {
    let buf = SharedBuf::new();
    let mut bus = FlatRam::new();
    let mut cpu = I8080::new();
    cpu.set_pseudo_bdos(true);
    cpu.redirect_bdos_print(Box::new(buf.clone()));
    cpu.load(&mut bus, image, 0x100, true).unwrap();

    for _ in 0..MAX_STEPS {
        if cpu.is_halted() {
            break;
        }
        cpu.step(&mut bus).unwrap();
    }
    assert!(cpu.is_halted(), "diagnostic did not halt");
    String::from_utf8_lossy(&buf.contents()).into_owned()
}

#[test]
fn test_cpudiag_passes_if_present() {
    let Some(image) = res("cpudiag.bin") else {
        return;
    };
    let output = run_transient(&image);
    assert!(output.contains("CPU IS OPERATIONAL"), "output: {output}");
}

#[test]
fn test_8080pre_passes_if_present() {
    let Some(image) = res("8080PRE.COM") else {
        return;
    };
    let output = run_transient(&image);
    assert!(output.contains("8080 Preliminary tests complete"), "output: {output}");
}

#[test]
fn test_diag2_passes_if_present() {
    for name in ["TEST.COM", "diag2.com"] {
        let Some(image) = res(name) else {
            continue;
        };
        let output = run_transient(&image);
        assert!(!output.contains("ERROR"), "{name} output: {output}");
        assert!(!output.is_empty(), "{name} printed nothing");
    }
}
