//! Data movement: register/memory moves, 16-bit loads and stores,
//! exchanges and port I/O. None of these touch the flags.

use crate::core::bus::Bus;
use crate::cpu::state::{Reg16, Reg8};

use super::{CpuError, I8080};

impl I8080 {
    pub(super) fn mov<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        dst: Reg8,
        src: Reg8,
    ) -> Result<(), CpuError> {
        if src == Reg8::M {
            let value = bus.read(self.state.get16(Reg16::HL), false)?;
            self.state.set8(dst, value);
        } else if dst == Reg8::M {
            bus.write(self.state.get16(Reg16::HL), self.state.get8(src), false)?;
        } else {
            self.state.set8(dst, self.state.get8(src));
        }
        Ok(())
    }

    pub(super) fn mvi<B: Bus + ?Sized>(&mut self, bus: &mut B, dst: Reg8) -> Result<(), CpuError> {
        let value = self.fetch(bus)?;
        if dst == Reg8::M {
            bus.write(self.state.get16(Reg16::HL), value, false)?;
        } else {
            self.state.set8(dst, value);
        }
        Ok(())
    }

    pub(super) fn lxi<B: Bus + ?Sized>(&mut self, bus: &mut B, pair: Reg16) -> Result<(), CpuError> {
        let value = self.fetch2(bus)?;
        self.state.set16(pair, value);
        Ok(())
    }

    pub(super) fn stax<B: Bus + ?Sized>(&mut self, bus: &mut B, pair: Reg16) -> Result<(), CpuError> {
        bus.write(self.state.get16(pair), self.state.get8(Reg8::A), false)?;
        Ok(())
    }

    pub(super) fn ldax<B: Bus + ?Sized>(&mut self, bus: &mut B, pair: Reg16) -> Result<(), CpuError> {
        let value = bus.read(self.state.get16(pair), false)?;
        self.state.set8(Reg8::A, value);
        Ok(())
    }

    pub(super) fn sta<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let adr = self.fetch2(bus)?;
        bus.write(adr, self.state.get8(Reg8::A), false)?;
        Ok(())
    }

    pub(super) fn lda<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let adr = self.fetch2(bus)?;
        let value = bus.read(adr, false)?;
        self.state.set8(Reg8::A, value);
        Ok(())
    }

    pub(super) fn shld<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let adr = self.fetch2(bus)?;
        bus.write(adr, self.state.get8(Reg8::L), false)?;
        bus.write(adr.wrapping_add(1), self.state.get8(Reg8::H), false)?;
        Ok(())
    }

    pub(super) fn lhld<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let adr = self.fetch2(bus)?;
        let lo = bus.read(adr, false)?;
        let hi = bus.read(adr.wrapping_add(1), false)?;
        self.state.set8(Reg8::L, lo);
        self.state.set8(Reg8::H, hi);
        Ok(())
    }

    pub(super) fn xchg(&mut self) {
        let de = self.state.get16(Reg16::DE);
        self.state.set16(Reg16::DE, self.state.get16(Reg16::HL));
        self.state.set16(Reg16::HL, de);
    }

    pub(super) fn sphl(&mut self) {
        self.state.set16(Reg16::SP, self.state.get16(Reg16::HL));
    }

    pub(super) fn pchl(&mut self) {
        self.state.set16(Reg16::PC, self.state.get16(Reg16::HL));
    }

    /// `IN port`: the port byte is duplicated on both halves of the
    /// address bus, as the 8080 does in hardware.
    pub(super) fn port_in<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let port = self.fetch(bus)? as u16;
        let value = bus.read(port | (port << 8), true)?;
        self.state.set8(Reg8::A, value);
        Ok(())
    }

    /// `OUT port`: same address duplication as `IN`.
    pub(super) fn port_out<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        let port = self.fetch(bus)? as u16;
        bus.write(port | (port << 8), self.state.get8(Reg8::A), true)?;
        Ok(())
    }
}
