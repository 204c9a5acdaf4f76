//! A configured system: the backplane, one 8080 and the glue loop.

use log::info;

use s100_core::core::bus::{Backplane, Bus, BusError};
use s100_core::cpu::i8080::{CpuError, I8080};
use s100_core::cpu::state::Reg16;
use s100_core::device::data_card::DataCard;

use crate::config::SystemConfig;

/// Slot the default 64KB RAM card occupies when no configuration is
/// given.
const DEFAULT_RAM_SLOT: usize = 4;

pub struct System {
    bus: Backplane,
    cpu: I8080,
}

impl System {
    pub fn new(bus: Backplane) -> Self {
        Self {
            bus,
            cpu: I8080::new(),
        }
    }

    /// The fallback machine: a single 64KB RAM card and nothing else.
    pub fn with_default_hardware() -> Result<Self, BusError> {
        let mut bus = Backplane::new();
        bus.insert(
            Box::new(DataCard::ram(0x0000, 0x1_0000)),
            DEFAULT_RAM_SLOT,
            false,
        )?;
        Ok(Self::new(bus))
    }

    /// Assemble a system from a parsed hardware description.
    pub fn from_config(config: SystemConfig) -> Self {
        let pseudo_bdos = config.pseudo_bdos_enabled();
        let start_pc = config.start_with_pc_at();

        let mut system = Self::new(config.into_bus());
        system.cpu.set_pseudo_bdos(pseudo_bdos);
        system.cpu.state.set16(Reg16::PC, start_pc);
        system
    }

    pub fn cpu(&self) -> &I8080 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut I8080 {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Backplane {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Backplane {
        &mut self.bus
    }

    /// Load a program image through the CPU loader (forced writes, so
    /// ROM regions are seeded too).
    pub fn load_image(
        &mut self,
        bytes: &[u8],
        offset: usize,
        auto_reset_vector: bool,
    ) -> Result<(), CpuError> {
        self.cpu.load(&mut self.bus, bytes, offset, auto_reset_vector)
    }

    /// One emulation cycle: an instruction step, the card refresh hook,
    /// then interrupt acceptance while the IRQ line is up and the CPU is
    /// willing. Interrupts are only ever taken here, between
    /// instructions.
    pub fn step(&mut self) -> Result<(), CpuError> {
        self.cpu.step(&mut self.bus)?;
        self.bus.refresh()?;
        while self.cpu.interrupts_enabled() && self.bus.is_irq() {
            let inst = self.bus.irq_inst()?;
            self.cpu.interrupt(&mut self.bus, inst)?;
        }
        Ok(())
    }

    /// Drive the system until the CPU executes HLT.
    pub fn run_to_halt(&mut self) -> Result<(), CpuError> {
        info!("running to halt");
        while !self.cpu.is_halted() {
            self.step()?;
        }
        info!("halted at {:#06x}", self.cpu.state.get16(Reg16::PC));
        Ok(())
    }
}
