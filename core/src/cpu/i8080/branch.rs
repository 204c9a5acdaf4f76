//! Control flow: jumps, calls, returns and restarts.
//!
//! A not-taken conditional jump or call still consumes its two operand
//! bytes; the operand fetches happen either way.

use crate::core::bus::Bus;
use crate::cpu::state::{Flag, Reg16};

use super::{CpuError, I8080};

impl I8080 {
    /// Resolve a 3-bit condition code:
    /// NZ, Z, NC, C, PO, PE, P, M.
    pub(super) fn cond(&self, cc: u8) -> bool {
        match cc & 0b111 {
            0b000 => !self.state.flag(Flag::Z),
            0b001 => self.state.flag(Flag::Z),
            0b010 => !self.state.flag(Flag::C),
            0b011 => self.state.flag(Flag::C),
            0b100 => !self.state.flag(Flag::P),
            0b101 => self.state.flag(Flag::P),
            0b110 => !self.state.flag(Flag::S),
            _ => self.state.flag(Flag::S),
        }
    }

    pub(super) fn jmp<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let adr = self.fetch2(bus)?;
        self.state.set16(Reg16::PC, adr);
        Ok(())
    }

    pub(super) fn jump_on<B: Bus + ?Sized>(&mut self, bus: &mut B, cc: u8) -> Result<(), CpuError> {
        if self.cond(cc) {
            self.jmp(bus)
        } else {
            self.fetch2(bus).map(|_| ())
        }
    }

    pub(super) fn call<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let adr = self.fetch2(bus)?;
        self.push16(bus, Reg16::PC)?;
        self.state.set16(Reg16::PC, adr);
        Ok(())
    }

    pub(super) fn call_on<B: Bus + ?Sized>(&mut self, bus: &mut B, cc: u8) -> Result<(), CpuError> {
        if self.cond(cc) {
            self.call(bus)
        } else {
            self.fetch2(bus).map(|_| ())
        }
    }

    pub(super) fn ret<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        self.pop16(bus, Reg16::PC)
    }

    pub(super) fn ret_on<B: Bus + ?Sized>(&mut self, bus: &mut B, cc: u8) -> Result<(), CpuError> {
        if self.cond(cc) {
            self.ret(bus)?;
        }
        Ok(())
    }

    /// `RST n`: one-byte call to vector `n * 8`.
    pub(super) fn rst<B: Bus + ?Sized>(&mut self, bus: &mut B, n: u8) -> Result<(), CpuError> {
        self.push16(bus, Reg16::PC)?;
        self.state.set16(Reg16::PC, (n as u16 & 0b111) * 8);
        Ok(())
    }
}
