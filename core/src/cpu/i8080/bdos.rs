//! Pseudo-BDOS shim: just enough CP/M to run stock diagnostic binaries.
//!
//! With the shim enabled, two addresses get special treatment before
//! each step. PC 0x0000 is the warm-boot entry: the first visit is the
//! reset out of power-on, any later visit plants a HLT there so the run
//! ends cleanly. PC 0x0005 is the BDOS entry: calls 0x02 (console out)
//! and 0x09 (print `$`-terminated string) are resolved against the print
//! sink, everything else is fatal.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::core::bus::Bus;
use crate::cpu::state::{Reg16, Reg8};

use super::{CpuError, I8080};

/// Byte-exact print sink for the shim, stdout by default.
pub(super) enum Printer {
    Stdout,
    Writer(Box<dyn Write + Send>),
}

impl Printer {
    pub(super) fn stdout() -> Self {
        Printer::Stdout
    }

    pub(super) fn writer(sink: Box<dyn Write + Send>) -> Self {
        Printer::Writer(sink)
    }

    pub(super) fn file(path: &Path) -> io::Result<Self> {
        Ok(Printer::Writer(Box::new(File::create(path)?)))
    }

    fn put(&mut self, byte: u8) -> io::Result<()> {
        match self {
            Printer::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(&[byte])?;
                out.flush()
            }
            Printer::Writer(sink) => sink.write_all(&[byte]),
        }
    }
}

impl I8080 {
    pub(super) fn handle_bdos_hook<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> Result<(), CpuError> {
        let pc = self.state.get16(Reg16::PC);

        if pc == 0x0000 {
            if self.just_booted {
                self.just_booted = false;
                return Ok(());
            }
            // Program warm-booted back to zero: halt on the next step.
            bus.write(0x0000, 0x76, false)?;
        }

        if pc == 0x0005 {
            match self.state.get8(Reg8::C) {
                0x02 => {
                    let e = self.state.get8(Reg8::E);
                    self.printer.put(e).map_err(CpuError::Print)?;
                }
                0x09 => {
                    let mut de = self.state.get16(Reg16::DE);
                    loop {
                        let byte = bus.read(de, false)?;
                        if byte == b'$' {
                            break;
                        }
                        self.printer.put(byte).map_err(CpuError::Print)?;
                        de = de.wrapping_add(1);
                    }
                }
                c => return Err(CpuError::InvalidBdosCall(c)),
            }
            // Consume the opcode byte the hook replaces, keeping the
            // trace aligned, then return to the caller.
            self.fetch(bus)?;
            self.ret(bus)?;
        }

        Ok(())
    }
}
