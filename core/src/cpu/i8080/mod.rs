//! Intel 8080 interpreter.
//!
//! The CPU is generic over [`Bus`]: the same interpreter runs against the
//! card backplane or against a bare 64KB array for fast CPU-only work.
//! `step()` executes one full instruction including its operand fetches;
//! each fetch increments PC, so a step leaves PC at the next opcode.

mod alu;
mod bdos;
mod branch;
pub mod disasm;
mod load_store;
mod stack;

use std::io::Write;
use std::path::Path;

use log::{error, log_enabled, trace, Level};
use thiserror::Error;

use crate::core::bus::{Bus, BusError};
use crate::cpu::state::{CpuState, Reg16, Reg8};

use bdos::Printer;

#[derive(Debug, Error)]
pub enum CpuError {
    #[error("unknown opcode {opcode:#04x} at {pc:#06x}")]
    UnknownOpcode { pc: u16, opcode: u8 },
    #[error("unsupported BDOS call with C={0:#04x}")]
    InvalidBdosCall(u8),
    #[error("program of {data} bytes does not fit at offset {offset:#x}")]
    LoadTooLarge { data: usize, offset: usize },
    #[error("reset vector would overwrite a program loaded at {0:#x}")]
    ResetVectorClash(usize),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error("print sink write failed: {0}")]
    Print(#[source] std::io::Error),
}

/// Decode table for the 3-bit register selectors in an opcode.
const R8_DECODE: [Reg8; 8] = [
    Reg8::B,
    Reg8::C,
    Reg8::D,
    Reg8::E,
    Reg8::H,
    Reg8::L,
    Reg8::M,
    Reg8::A,
];

fn pair_sel(opcode: u8) -> Reg16 {
    match (opcode >> 4) & 0b11 {
        0b00 => Reg16::BC,
        0b01 => Reg16::DE,
        0b10 => Reg16::HL,
        _ => Reg16::SP,
    }
}

fn dst_sel(opcode: u8) -> Reg8 {
    R8_DECODE[((opcode >> 3) & 0b111) as usize]
}

fn src_sel(opcode: u8) -> Reg8 {
    R8_DECODE[(opcode & 0b111) as usize]
}

pub struct I8080 {
    pub state: CpuState,
    halted: bool,
    interrupts_enabled: bool,
    just_booted: bool,
    handle_bdos: bool,
    printer: Printer,
    // Operand bytes placed on the data bus by an interrupting device;
    // consulted by fetch() instead of memory while non-empty.
    int_ops: [u8; 2],
    int_ops_len: u8,
    int_ops_idx: u8,
}

impl Default for I8080 {
    fn default() -> Self {
        Self::new()
    }
}

impl I8080 {
    pub fn new() -> Self {
        Self {
            state: CpuState::new(),
            halted: false,
            interrupts_enabled: true,
            just_booted: true,
            handle_bdos: false,
            printer: Printer::stdout(),
            int_ops: [0; 2],
            int_ops_len: 0,
            int_ops_idx: 0,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    /// Restore the initial architectural state. Keeps the pseudo-BDOS
    /// configuration.
    pub fn clear(&mut self) {
        self.state = CpuState::new();
        self.just_booted = true;
        self.halted = false;
    }

    /// Replace the whole register state.
    pub fn load_state(&mut self, state: CpuState) {
        self.state = state;
    }

    /// Snapshot the register state.
    pub fn save_state(&self) -> CpuState {
        self.state
    }

    /// Resolve CP/M BDOS calls internally instead of emulating CP/M.
    /// Essential for running stock diagnostic binaries.
    pub fn set_pseudo_bdos(&mut self, enabled: bool) {
        self.handle_bdos = enabled;
    }

    /// Redirect pseudo-BDOS print output to an arbitrary writer.
    pub fn redirect_bdos_print(&mut self, sink: Box<dyn Write + Send>) {
        self.printer = Printer::writer(sink);
    }

    /// Redirect pseudo-BDOS print output to a file (truncated).
    pub fn redirect_bdos_print_to_file(&mut self, path: &Path) -> Result<(), CpuError> {
        self.printer = Printer::file(path).map_err(CpuError::Print)?;
        Ok(())
    }

    /// Route pseudo-BDOS print output back to stdout.
    pub fn reset_bdos_print(&mut self) {
        self.printer = Printer::stdout();
    }

    pub(crate) fn fetch<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<u8, CpuError> {
        if self.int_ops_idx < self.int_ops_len {
            let byte = self.int_ops[self.int_ops_idx as usize];
            self.int_ops_idx += 1;
            return Ok(byte);
        }
        let pc = self.state.get_then_inc16(Reg16::PC);
        Ok(bus.read(pc, false)?)
    }

    /// Two fetches, little-endian.
    pub(crate) fn fetch2<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<u16, CpuError> {
        let lo = self.fetch(bus)? as u16;
        let hi = self.fetch(bus)? as u16;
        Ok((hi << 8) | lo)
    }

    /// Execute one full instruction. Returns immediately while halted.
    pub fn step<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if self.halted {
            return Ok(());
        }
        if self.handle_bdos {
            self.handle_bdos_hook(bus)?;
        }
        let opcode = self.fetch(bus)?;
        self.execute(opcode, bus)
    }

    /// Accept an interrupt: push PC, disable interrupts and execute the
    /// instruction the device placed on the data bus, drawing any operand
    /// bytes from it instead of from memory. No-op while interrupts are
    /// disabled.
    pub fn interrupt<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        inst: [u8; 3],
    ) -> Result<(), CpuError> {
        if !self.interrupts_enabled {
            return Ok(());
        }
        self.interrupts_enabled = false;
        self.push16(bus, Reg16::PC)?;
        self.int_ops = [inst[1], inst[2]];
        self.int_ops_len = 2;
        self.int_ops_idx = 0;
        let result = self.execute(inst[0], bus);
        self.int_ops_len = 0;
        self.int_ops_idx = 0;
        result
    }

    /// Copy a program image onto the bus through `write_force` so ROM
    /// regions load too. With `auto_reset_vector`, the zero page becomes
    /// `JMP offset`; the image must then not overlap it.
    pub fn load<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        bytes: &[u8],
        offset: usize,
        auto_reset_vector: bool,
    ) -> Result<(), CpuError> {
        if offset >= bus.size() || bytes.len() > bus.size() - offset {
            return Err(CpuError::LoadTooLarge {
                data: bytes.len(),
                offset,
            });
        }
        for (i, &byte) in bytes.iter().enumerate() {
            bus.write_force((offset + i) as u16, byte, false)?;
        }
        if auto_reset_vector {
            if offset <= 2 {
                return Err(CpuError::ResetVectorClash(offset));
            }
            bus.write_force(0x0000, 0xC3, false)?;
            bus.write_force(0x0001, (offset & 0xFF) as u8, false)?;
            bus.write_force(0x0002, (offset >> 8) as u8, false)?;
        }
        Ok(())
    }

    /// Disassembly trace of the instruction about to execute. PC has
    /// already advanced past the opcode byte.
    fn trace_op<B: Bus + ?Sized>(&mut self, bus: &mut B, opcode: u8) -> Result<(), CpuError> {
        if !log_enabled!(Level::Trace) {
            return Ok(());
        }
        let pc = self.state.get16(Reg16::PC);
        let at = pc.wrapping_sub(1);
        let name = disasm::mnemonic(opcode);
        match disasm::operand_len(opcode) {
            2 => {
                let op1 = bus.read(pc, false)?;
                trace!("{at:04X}    {opcode:02X} {op1:02X}   \t {name}");
            }
            3 => {
                let op1 = bus.read(pc, false)?;
                let op2 = bus.read(pc.wrapping_add(1), false)?;
                trace!("{at:04X}    {opcode:02X} {op1:02X} {op2:02X}\t {name}");
            }
            _ => trace!("{at:04X}    {opcode:02X}      \t {name}"),
        }
        Ok(())
    }

    /// Decode and execute a single opcode. Operand fetches come from the
    /// current fetch source (memory, or a pending interrupt instruction).
    pub fn execute<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) -> Result<(), CpuError> {
        self.trace_op(bus, opcode)?;

        let pair = pair_sel(opcode);
        let dst = dst_sel(opcode);
        let src = src_sel(opcode);
        let sel = (opcode >> 3) & 0b111;

        match opcode {
            // NOP
            0x00 => {}

            // Data transfer and 16-bit loads
            0x01 | 0x11 | 0x21 | 0x31 => self.lxi(bus, pair)?,
            0x02 | 0x12 => self.stax(bus, pair)?,
            0x0A | 0x1A => self.ldax(bus, pair)?,
            0x22 => self.shld(bus)?,
            0x2A => self.lhld(bus)?,
            0x32 => self.sta(bus)?,
            0x3A => self.lda(bus)?,
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => self.mvi(bus, dst)?,

            // 16-bit increment/decrement and add
            0x03 | 0x13 | 0x23 | 0x33 => self.inx(pair),
            0x0B | 0x1B | 0x2B | 0x3B => self.dcx(pair),
            0x09 | 0x19 | 0x29 | 0x39 => self.dad(pair),

            // 8-bit increment/decrement
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => self.inr(bus, dst)?,
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => self.dcr(bus, dst)?,

            // Rotates and accumulator/flag specials
            0x07 => self.rlc(),
            0x0F => self.rrc(),
            0x17 => self.ral(),
            0x1F => self.rar(),
            0x27 => self.daa(),
            0x2F => self.cma(),
            0x37 => self.stc(),
            0x3F => self.cmc(),

            // HLT sits in the middle of the MOV block
            0x76 => self.halted = true,
            0x40..=0x7F => self.mov(bus, dst, src)?,

            // ALU, register and immediate forms
            0x80..=0xBF => self.alu(bus, sel, src)?,
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => self.alu_imm(bus, sel)?,

            // Control flow
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => self.ret_on(bus, sel)?,
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => self.jump_on(bus, sel)?,
            0xC3 => self.jmp(bus)?,
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => self.call_on(bus, sel)?,
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => self.rst(bus, sel)?,
            0xC9 => self.ret(bus)?,
            0xCD => self.call(bus)?,
            0xE9 => self.pchl(),

            // Stack
            0xC1 | 0xD1 | 0xE1 | 0xF1 => self.pop(bus, pair)?,
            0xC5 | 0xD5 | 0xE5 | 0xF5 => self.push(bus, pair)?,
            0xE3 => self.xthl(bus)?,
            0xF9 => self.sphl(),

            // Port I/O
            0xD3 => self.port_out(bus)?,
            0xDB => self.port_in(bus)?,

            // Exchange and interrupt control
            0xEB => self.xchg(),
            0xF3 => self.interrupts_enabled = false,
            0xFB => self.interrupts_enabled = true,

            _ => {
                let pc = self.state.get16(Reg16::PC).wrapping_sub(1);
                error!("{pc:04X}    {opcode:02X}      \t UNKNOWN");
                return Err(CpuError::UnknownOpcode { pc, opcode });
            }
        }
        Ok(())
    }
}
