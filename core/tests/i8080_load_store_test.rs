use s100_core::prelude::*;

mod common;
use common::{run_program, run_with};

// ==========================================================================
// MVI / MOV
// ==========================================================================

#[test]
fn test_mvi_into_registers() {
    // MVI B,0x11; MVI C,0x22; MVI D,0x33; MVI E,0x44; HLT
    let (cpu, _) = run_program(&[0x06, 0x11, 0x0E, 0x22, 0x16, 0x33, 0x1E, 0x44, 0x76]);
    assert_eq!(cpu.state.get8(Reg8::B), 0x11);
    assert_eq!(cpu.state.get8(Reg8::C), 0x22);
    assert_eq!(cpu.state.get8(Reg8::D), 0x33);
    assert_eq!(cpu.state.get8(Reg8::E), 0x44);
}

#[test]
fn test_mov_register_to_register() {
    // MVI A,0x7E; MOV B,A; MOV C,B; MOV H,C; HLT
    let (cpu, _) = run_program(&[0x3E, 0x7E, 0x47, 0x48, 0x61, 0x76]);
    assert_eq!(cpu.state.get8(Reg8::B), 0x7E);
    assert_eq!(cpu.state.get8(Reg8::C), 0x7E);
    assert_eq!(cpu.state.get8(Reg8::H), 0x7E);
}

#[test]
fn test_mov_through_memory() {
    // LXI H,0x2000; MVI A,0x99; MOV M,A; MVI A,0x00; MOV A,M; HLT
    let (cpu, mut bus) =
        run_program(&[0x21, 0x00, 0x20, 0x3E, 0x99, 0x77, 0x3E, 0x00, 0x7E, 0x76]);
    assert_eq!(bus.read(0x2000, false).unwrap(), 0x99);
    assert_eq!(cpu.state.get8(Reg8::A), 0x99);
}

#[test]
fn test_moves_do_not_touch_flags() {
    let (cpu, _) = run_with(
        // MVI B,0xFF; MOV A,B; LXI D,0x1234; XCHG; HLT
        &[0x06, 0xFF, 0x78, 0x11, 0x34, 0x12, 0xEB, 0x76],
        |cpu, _| {
            cpu.state.set_flag(Flag::C, true);
            cpu.state.set_flag(Flag::Z, true);
        },
    );
    assert!(cpu.state.flag(Flag::C));
    assert!(cpu.state.flag(Flag::Z));
}

// ==========================================================================
// 16-bit immediates, loads, stores
// ==========================================================================

#[test]
fn test_lxi_all_pairs() {
    let (cpu, _) = run_program(&[
        0x01, 0x34, 0x12, // LXI B,0x1234
        0x11, 0x78, 0x56, // LXI D,0x5678
        0x21, 0xBC, 0x9A, // LXI H,0x9ABC
        0x31, 0xF0, 0xDE, // LXI SP,0xDEF0
        0x76,
    ]);
    assert_eq!(cpu.state.get16(Reg16::BC), 0x1234);
    assert_eq!(cpu.state.get16(Reg16::DE), 0x5678);
    assert_eq!(cpu.state.get16(Reg16::HL), 0x9ABC);
    assert_eq!(cpu.state.get16(Reg16::SP), 0xDEF0);
}

#[test]
fn test_sta_lda() {
    // MVI A,0xAB; STA 0x2345; MVI A,0x00; LDA 0x2345; HLT
    let (cpu, mut bus) =
        run_program(&[0x3E, 0xAB, 0x32, 0x45, 0x23, 0x3E, 0x00, 0x3A, 0x45, 0x23, 0x76]);
    assert_eq!(bus.read(0x2345, false).unwrap(), 0xAB);
    assert_eq!(cpu.state.get8(Reg8::A), 0xAB);
}

#[test]
fn test_shld_lhld_little_endian() {
    // LXI H,0x1234; SHLD 0x2000; LXI H,0x0000; LHLD 0x2000; HLT
    let (cpu, mut bus) = run_program(&[
        0x21, 0x34, 0x12, 0x22, 0x00, 0x20, 0x21, 0x00, 0x00, 0x2A, 0x00, 0x20, 0x76,
    ]);
    assert_eq!(bus.read(0x2000, false).unwrap(), 0x34);
    assert_eq!(bus.read(0x2001, false).unwrap(), 0x12);
    assert_eq!(cpu.state.get16(Reg16::HL), 0x1234);
}

#[test]
fn test_stax_ldax() {
    // LXI B,0x2100; MVI A,0x5C; STAX B; MVI A,0x00; LDAX B; HLT
    let (cpu, mut bus) = run_program(&[0x01, 0x00, 0x21, 0x3E, 0x5C, 0x02, 0x3E, 0x00, 0x0A, 0x76]);
    assert_eq!(bus.read(0x2100, false).unwrap(), 0x5C);
    assert_eq!(cpu.state.get8(Reg8::A), 0x5C);
}

// ==========================================================================
// Exchanges and pointer moves
// ==========================================================================

#[test]
fn test_xchg() {
    // LXI D,0x1111; LXI H,0x2222; XCHG; HLT
    let (cpu, _) = run_program(&[0x11, 0x11, 0x11, 0x21, 0x22, 0x22, 0xEB, 0x76]);
    assert_eq!(cpu.state.get16(Reg16::DE), 0x2222);
    assert_eq!(cpu.state.get16(Reg16::HL), 0x1111);
}

#[test]
fn test_sphl() {
    // LXI H,0x4000; SPHL; HLT
    let (cpu, _) = run_program(&[0x21, 0x00, 0x40, 0xF9, 0x76]);
    assert_eq!(cpu.state.get16(Reg16::SP), 0x4000);
}

#[test]
fn test_pchl_jumps() {
    // LXI H,0x0010; PCHL; (HLT at 0x0010)
    let mut program = vec![0x21, 0x10, 0x00, 0xE9];
    program.resize(0x10, 0x00);
    program.push(0x76);
    let (cpu, _) = run_program(&program);
    assert!(cpu.is_halted());
    assert_eq!(cpu.state.get16(Reg16::PC), 0x0011);
}

// ==========================================================================
// Port I/O against a flat bus is rejected
// ==========================================================================

#[test]
fn test_port_io_unsupported_on_flat_ram() {
    let mut bus = FlatRam::new();
    let mut cpu = I8080::new();
    // IN 0x10; HLT
    cpu.load(&mut bus, &[0xDB, 0x10, 0x76], 0, false).unwrap();
    let err = cpu.step(&mut bus).unwrap_err();
    assert!(matches!(err, CpuError::Bus(BusError::PortIo)));
}
