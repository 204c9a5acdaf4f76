use std::fmt::Write as _;

use thiserror::Error;

use super::card::Card;

/// Number of card slots on the backplane.
pub const N_SLOTS: usize = 18;

/// Number of addressable locations on the bus.
pub const BUS_SIZE: usize = 0x1_0000;

/// Value read from an address no card decodes (floating data bus).
pub const BAD_U8: u8 = 0xFF;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("slot {0} is out of range")]
    InvalidSlot(usize),
    #[error("slot {0} is already occupied")]
    SlotOccupied(usize),
    #[error("address range conflicts with the card in slot {0}")]
    Conflict(usize),
    #[error("no IRQ is raised on the bus")]
    NoIrq,
    #[error("port I/O is not supported by this bus")]
    PortIo,
    #[error("data image of {data} bytes does not fit card capacity of {capacity} bytes")]
    ImageTooLarge { data: usize, capacity: usize },
    #[error("serial endpoint I/O failed: {0}")]
    Endpoint(#[from] std::io::Error),
}

/// Uniform address-space interface the CPU, loader and tests run against.
///
/// The `io` flag carried by every access models the 8080's IOR/IOW control
/// signals: memory reads/writes and `IN`/`OUT` port accesses share the same
/// 16-bit address lines but select different device spaces.
///
/// Two implementations exist: [`Backplane`] routes each access through the
/// card slots, while [`FlatRam`] is a bare 64KB array for fast CPU-only
/// runs (it rejects port I/O and never raises interrupts).
pub trait Bus {
    /// Read one byte. Returns [`BAD_U8`] when nothing decodes the address.
    fn read(&mut self, adr: u16, io: bool) -> Result<u8, BusError>;

    /// Write one byte to every device decoding the address, honoring
    /// write locks.
    fn write(&mut self, adr: u16, byte: u8, io: bool) -> Result<(), BusError>;

    /// Write one byte to every device decoding the address, bypassing
    /// write locks.
    fn write_force(&mut self, adr: u16, byte: u8, io: bool) -> Result<(), BusError>;

    /// Number of addressable locations (not the number of devices).
    fn size(&self) -> usize {
        BUS_SIZE
    }

    /// Whether any device is requesting an interrupt.
    fn is_irq(&self) -> bool {
        false
    }

    /// The interrupt instruction of the highest-priority requesting device.
    fn irq_inst(&mut self) -> Result<[u8; 3], BusError> {
        Err(BusError::NoIrq)
    }

    /// Fan out the periodic housekeeping hook to every device.
    fn refresh(&mut self) -> Result<(), BusError> {
        Ok(())
    }
}

struct Slot {
    card: Box<dyn Card>,
    allow_conflict: bool,
}

/// The S-100 style backplane: a fixed array of card slots with
/// address-range routing, conflict detection and IRQ aggregation.
///
/// Slot order is significant. A read returns the byte of the *first*
/// matching card in slot order; a write goes to *every* matching card.
/// Interrupts are serviced in slot order too, modeling the daisy-chained
/// IRQ line of simple S-100 systems.
///
/// The backplane owns its cards; [`remove`](Backplane::remove) hands a
/// card back to the caller.
#[derive(Default)]
pub struct Backplane {
    slots: [Option<Slot>; N_SLOTS],
}

impl Backplane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find an occupied slot whose card overlaps `card` in the same
    /// address space and does not tolerate conflicts.
    fn conflicting_slot(&self, card: &dyn Card) -> Option<usize> {
        let info = card.identify();
        self.slots.iter().enumerate().find_map(|(i, slot)| {
            let slot = slot.as_ref()?;
            if slot.allow_conflict || slot.card.is_io() != card.is_io() {
                return None;
            }
            let other = slot.card.identify();
            let overlap =
                slot.card.in_range(info.start_adr) || card.in_range(other.start_adr);
            overlap.then_some(i)
        })
    }

    /// Bind `card` to `slot`.
    ///
    /// Fails with [`BusError::Conflict`] when the card's range overlaps an
    /// existing same-space card, unless `allow_conflict` is set. An allowed
    /// conflict means writes reach both cards but only the lower slot is
    /// ever read back.
    pub fn insert(
        &mut self,
        card: Box<dyn Card>,
        slot: usize,
        allow_conflict: bool,
    ) -> Result<(), BusError> {
        if slot >= N_SLOTS {
            return Err(BusError::InvalidSlot(slot));
        }
        if self.slots[slot].is_some() {
            return Err(BusError::SlotOccupied(slot));
        }
        if !allow_conflict {
            if let Some(other) = self.conflicting_slot(card.as_ref()) {
                return Err(BusError::Conflict(other));
            }
        }
        self.slots[slot] = Some(Slot {
            card,
            allow_conflict,
        });
        Ok(())
    }

    /// Empty a slot, returning the card that occupied it (if any).
    pub fn remove(&mut self, slot: usize) -> Result<Option<Box<dyn Card>>, BusError> {
        if slot >= N_SLOTS {
            return Err(BusError::InvalidSlot(slot));
        }
        Ok(self.slots[slot].take().map(|s| s.card))
    }

    /// The lowest slot whose card decodes `adr` in either space.
    pub fn slot_by_adr(&self, adr: u16) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.card.in_range(adr)))
    }

    /// Reset every card to its power-on state.
    pub fn clear(&mut self) -> Result<(), BusError> {
        for slot in self.slots.iter_mut().flatten() {
            slot.card.clear()?;
        }
        Ok(())
    }

    /// Render a human-readable slot map, one line per occupied slot:
    ///
    /// ```text
    /// Slot  4: MEM 0x0000/65536  : ram area
    /// Slot  0: I/O 0x10/2        : serial uart, baud: 1200, ...
    /// ```
    pub fn slot_map(&self) -> String {
        let mut out = String::new();
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(slot) = slot.as_ref() else { continue };
            let info = slot.card.identify();
            let (space, digits) = if slot.card.is_io() {
                ("I/O", 2)
            } else {
                ("MEM", 4)
            };
            let range = format!(
                "{:#0w$x}/{}",
                info.start_adr,
                info.adr_range,
                w = digits + 2
            );
            let sep = if info.detail.is_empty() { "" } else { ", " };
            let _ = writeln!(
                out,
                "Slot {i:2}: {space} {range:<12}: {}{sep}{}",
                info.name, info.detail
            );
        }
        out
    }

    fn first_match(&mut self, adr: u16, io: bool) -> Option<&mut Box<dyn Card>> {
        self.slots
            .iter_mut()
            .flatten()
            .map(|s| &mut s.card)
            .find(|c| c.is_io() == io && c.in_range(adr))
    }
}

impl Bus for Backplane {
    fn read(&mut self, adr: u16, io: bool) -> Result<u8, BusError> {
        match self.first_match(adr, io) {
            Some(card) => card.read(adr),
            None => Ok(BAD_U8),
        }
    }

    fn write(&mut self, adr: u16, byte: u8, io: bool) -> Result<(), BusError> {
        for slot in self.slots.iter_mut().flatten() {
            if slot.card.is_io() == io && slot.card.in_range(adr) {
                slot.card.write(adr, byte)?;
            }
        }
        Ok(())
    }

    fn write_force(&mut self, adr: u16, byte: u8, io: bool) -> Result<(), BusError> {
        for slot in self.slots.iter_mut().flatten() {
            if slot.card.is_io() == io && slot.card.in_range(adr) {
                slot.card.write_force(adr, byte)?;
            }
        }
        Ok(())
    }

    fn is_irq(&self) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|s| s.card.is_irq())
    }

    fn irq_inst(&mut self) -> Result<[u8; 3], BusError> {
        self.slots
            .iter()
            .flatten()
            .find(|s| s.card.is_irq())
            .map(|s| s.card.irq_inst())
            .ok_or(BusError::NoIrq)
    }

    fn refresh(&mut self) -> Result<(), BusError> {
        for slot in self.slots.iter_mut().flatten() {
            slot.card.refresh()?;
        }
        Ok(())
    }
}

/// A bare 64KB memory with no device dispatch, for CPU-only runs and
/// tests. Port I/O fails with [`BusError::PortIo`].
pub struct FlatRam {
    mem: Box<[u8; BUS_SIZE]>,
}

impl FlatRam {
    pub fn new() -> Self {
        Self {
            mem: Box::new([0; BUS_SIZE]),
        }
    }
}

impl Default for FlatRam {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for FlatRam {
    fn read(&mut self, adr: u16, io: bool) -> Result<u8, BusError> {
        if io {
            return Err(BusError::PortIo);
        }
        Ok(self.mem[adr as usize])
    }

    fn write(&mut self, adr: u16, byte: u8, io: bool) -> Result<(), BusError> {
        if io {
            return Err(BusError::PortIo);
        }
        self.mem[adr as usize] = byte;
        Ok(())
    }

    fn write_force(&mut self, adr: u16, byte: u8, io: bool) -> Result<(), BusError> {
        self.write(adr, byte, io)
    }
}
