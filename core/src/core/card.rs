use super::bus::{BusError, BAD_U8};

/// Identifying details reported by a card for slot maps and diagnostics.
#[derive(Clone, Debug)]
pub struct CardInfo {
    /// First address the card decodes.
    pub start_adr: u16,
    /// Number of consecutive addresses decoded from `start_adr`.
    pub adr_range: usize,
    /// Short card type name (e.g., "ram area").
    pub name: &'static str,
    /// Free-form details (configuration, attached device, ...).
    pub detail: String,
}

impl CardInfo {
    pub fn new(start_adr: u16, adr_range: usize, name: &'static str) -> Self {
        Self {
            start_adr,
            adr_range,
            name,
            detail: String::new(),
        }
    }

    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = detail;
        self
    }
}

/// Contract for anything that plugs into a [`Backplane`](super::Backplane) slot.
///
/// The bus performs all address filtering: `read`, `write` and `write_force`
/// are only ever called with an address for which `in_range` returned true,
/// so cards do not need to re-check.
///
/// Reads and writes are fallible because I/O cards may touch an external
/// device (a pseudo-terminal, a file) on every access; data cards never
/// actually fail.
pub trait Card {
    /// Whether `adr` falls inside this card's decoded range.
    fn in_range(&self, adr: u16) -> bool;

    /// Identifying details for slot maps and diagnostics.
    fn identify(&self) -> CardInfo;

    /// False for a memory card, true for a port I/O card. Cards in
    /// different spaces may share address ranges without conflict.
    fn is_io(&self) -> bool;

    /// Read one byte.
    fn read(&mut self, adr: u16) -> Result<u8, BusError>;

    /// Write one byte, honoring the card's write lock if it has one.
    fn write(&mut self, adr: u16, byte: u8) -> Result<(), BusError>;

    /// Write one byte, bypassing any write lock (used by program loaders
    /// to seed ROM regions).
    fn write_force(&mut self, adr: u16, byte: u8) -> Result<(), BusError>;

    /// Periodic housekeeping hook, fanned out by the bus between
    /// instructions. Most cards have nothing to do here.
    fn refresh(&mut self) -> Result<(), BusError> {
        Ok(())
    }

    /// Whether the card is currently requesting an interrupt.
    fn is_irq(&self) -> bool {
        false
    }

    /// The instruction (opcode plus up to two operand bytes) the card
    /// places on the data bus when its interrupt is accepted.
    fn irq_inst(&self) -> [u8; 3] {
        [BAD_U8; 3]
    }

    /// Reset card data or configuration to its power-on state.
    fn clear(&mut self) -> Result<(), BusError>;
}
