use crate::core::bus::{BusError, BAD_U8};
use crate::core::card::{Card, CardInfo};

/// A memory card holding a contiguous run of bytes, usable as RAM or
/// (when write-locked) as ROM.
///
/// Normal writes are silently dropped while the card is locked;
/// `write_force` always lands, which is how program loaders seed ROM
/// regions. `clear` zero-fills only an unlocked card.
pub struct DataCard {
    start_adr: u16,
    data: Vec<u8>,
    write_locked: bool,
}

impl DataCard {
    /// A card of `capacity` bytes starting at `start_adr`, filled with
    /// `fill`.
    pub fn new(start_adr: u16, capacity: usize, fill: u8, write_locked: bool) -> Self {
        Self {
            start_adr,
            data: vec![fill; capacity],
            write_locked,
        }
    }

    /// A zero-filled, writable card.
    pub fn ram(start_adr: u16, capacity: usize) -> Self {
        Self::new(start_adr, capacity, 0x00, false)
    }

    /// A write-locked card filled with `fill`.
    pub fn rom(start_adr: u16, capacity: usize, fill: u8) -> Self {
        Self::new(start_adr, capacity, fill, true)
    }

    /// A card seeded with `bytes`. `capacity` of zero means "exactly the
    /// image size"; a non-zero capacity pads the remainder with the
    /// floating-bus value. Fails when the image exceeds the capacity.
    pub fn with_bytes(
        start_adr: u16,
        bytes: Vec<u8>,
        capacity: usize,
        write_locked: bool,
    ) -> Result<Self, BusError> {
        let capacity = if capacity == 0 { bytes.len() } else { capacity };
        if bytes.len() > capacity {
            return Err(BusError::ImageTooLarge {
                data: bytes.len(),
                capacity,
            });
        }
        let mut data = bytes;
        data.resize(capacity, BAD_U8);
        Ok(Self {
            start_adr,
            data,
            write_locked,
        })
    }

    pub fn is_write_locked(&self) -> bool {
        self.write_locked
    }

    pub fn lock(&mut self) {
        self.write_locked = true;
    }

    pub fn unlock(&mut self) {
        self.write_locked = false;
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl Card for DataCard {
    fn in_range(&self, adr: u16) -> bool {
        (adr as usize) >= (self.start_adr as usize)
            && (adr as usize) < (self.start_adr as usize + self.data.len())
    }

    fn identify(&self) -> CardInfo {
        let name = if self.write_locked { "rom area" } else { "ram area" };
        CardInfo::new(self.start_adr, self.data.len(), name)
    }

    fn is_io(&self) -> bool {
        false
    }

    fn read(&mut self, adr: u16) -> Result<u8, BusError> {
        Ok(self.data[(adr - self.start_adr) as usize])
    }

    fn write(&mut self, adr: u16, byte: u8) -> Result<(), BusError> {
        if !self.write_locked {
            self.data[(adr - self.start_adr) as usize] = byte;
        }
        Ok(())
    }

    fn write_force(&mut self, adr: u16, byte: u8) -> Result<(), BusError> {
        self.data[(adr - self.start_adr) as usize] = byte;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), BusError> {
        if !self.write_locked {
            self.data.fill(0x00);
        }
        Ok(())
    }
}
