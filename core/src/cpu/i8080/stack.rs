//! Stack group. SP grows downward; a pushed pair lands low byte first.
//!
//! In the PUSH/POP encoding slot the SP selector means the PSW (AF), and
//! a popped F byte is renormalized by the register file.

use crate::core::bus::Bus;
use crate::cpu::state::Reg16;

use super::{CpuError, I8080};

impl I8080 {
    pub(super) fn push<B: Bus + ?Sized>(&mut self, bus: &mut B, pair: Reg16) -> Result<(), CpuError> {
        let pair = if pair == Reg16::SP { Reg16::AF } else { pair };
        self.push16(bus, pair)
    }

    pub(super) fn pop<B: Bus + ?Sized>(&mut self, bus: &mut B, pair: Reg16) -> Result<(), CpuError> {
        let pair = if pair == Reg16::SP { Reg16::AF } else { pair };
        self.pop16(bus, pair)
    }

    pub(super) fn push16<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        pair: Reg16,
    ) -> Result<(), CpuError> {
        let sp = self.state.get16(Reg16::SP).wrapping_sub(2);
        self.state.set16(Reg16::SP, sp);
        let value = self.state.get16(pair);
        bus.write(sp, (value & 0xFF) as u8, false)?;
        bus.write(sp.wrapping_add(1), (value >> 8) as u8, false)?;
        Ok(())
    }

    pub(super) fn pop16<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        pair: Reg16,
    ) -> Result<(), CpuError> {
        let sp = self.state.get16(Reg16::SP);
        let lo = bus.read(sp, false)? as u16;
        let hi = bus.read(sp.wrapping_add(1), false)? as u16;
        self.state.set16(pair, (hi << 8) | lo);
        self.state.set16(Reg16::SP, sp.wrapping_add(2));
        Ok(())
    }

    /// `XTHL`: exchange HL with the word on top of the stack.
    pub(super) fn xthl<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let sp = self.state.get16(Reg16::SP);
        let lo = bus.read(sp, false)? as u16;
        let hi = bus.read(sp.wrapping_add(1), false)? as u16;
        let hl = self.state.get16(Reg16::HL);
        self.state.set16(Reg16::HL, (hi << 8) | lo);
        bus.write(sp, (hl & 0xFF) as u8, false)?;
        bus.write(sp.wrapping_add(1), (hl >> 8) as u8, false)?;
        Ok(())
    }
}
