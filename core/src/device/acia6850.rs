use crate::core::bus::{BusError, BAD_U8};
use crate::core::card::{Card, CardInfo};

use super::endpoint::{Parity, SerialEndpoint};

/// Number of I/O addresses the card decodes.
pub const SERIAL_IO_ADDRESSES: usize = 2;

/// Base clock of the UART before the counter-divide stage.
pub const SERIAL_BASE_CLOCK: u32 = 19_200;

/// Bit masks of the ACIA status register.
#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum StatusFlag {
    /// Receive Data Register Full
    Rdrf = 0x01,
    /// Transmit Data Register Empty
    Tdre = 0x02,
    /// Data Carrier Detect
    Dcd = 0x04,
    /// Clear To Send
    Cts = 0x08,
    /// Framing Error
    Fe = 0x10,
    /// Receiver Overrun
    Ovrn = 0x20,
    /// Parity Error
    Pe = 0x40,
    /// Interrupt Request
    Irq = 0x80,
}

const TX_DATA: usize = 0;
const RX_DATA: usize = 1;
const CONTROL: usize = 2;
const STATUS: usize = 3;

/// A serial card modeled on the Motorola 6850 ACIA, bridging the bus to
/// an external byte-stream endpoint.
///
/// The card exposes two port addresses: `start_adr` is Status (read) /
/// Control (write), `start_adr + 1` is the Data register. Address decode
/// looks only at the low 8 bits of the 16-bit bus address, because the
/// 8080's `IN`/`OUT` duplicate the port byte on both address-bus halves;
/// the card therefore appears mirrored 256 times across the port space.
///
/// Endpoint state is refreshed on every register access rather than by a
/// periodic tick: each read first polls the endpoint and latches an
/// available byte into RX_DATA.
pub struct Acia6850<E: SerialEndpoint> {
    start_adr: u16,
    base_clock: u32,
    endpoint: E,
    regs: [u8; 4],
    divide_shift: u32,
    rts: bool,
}

impl<E: SerialEndpoint> Acia6850<E> {
    /// A card at `start_adr` driving an already-open endpoint, reset to
    /// its power-on configuration.
    pub fn new(start_adr: u16, endpoint: E) -> Result<Self, BusError> {
        Self::with_base_clock(start_adr, SERIAL_BASE_CLOCK, endpoint)
    }

    pub fn with_base_clock(
        start_adr: u16,
        base_clock: u32,
        endpoint: E,
    ) -> Result<Self, BusError> {
        let mut card = Self {
            start_adr,
            base_clock,
            endpoint,
            regs: [0; 4],
            divide_shift: 4,
            rts: true,
        };
        card.reset()?;
        Ok(card)
    }

    /// Current baud rate after the counter-divide stage.
    pub fn baud_rate(&self) -> u32 {
        self.base_clock >> self.divide_shift
    }

    /// State of the Request To Send line.
    pub fn rts(&self) -> bool {
        self.rts
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn endpoint_mut(&mut self) -> &mut E {
        &mut self.endpoint
    }

    fn status_flag(&self, flag: StatusFlag) -> bool {
        self.regs[STATUS] & flag as u8 != 0
    }

    fn set_status_flag(&mut self, flag: StatusFlag, on: bool) {
        if on {
            self.regs[STATUS] |= flag as u8;
        } else {
            self.regs[STATUS] &= !(flag as u8);
        }
    }

    /// Master reset: default control word, transmitter empty, RTS
    /// asserted, base clock divided by 16.
    fn reset(&mut self) -> Result<(), BusError> {
        self.regs = [0; 4];
        self.divide_shift = 4;
        self.endpoint
            .set_baud_rate(self.base_clock >> self.divide_shift)?;
        self.regs[CONTROL] = 0b1001_0101;
        self.set_status_flag(StatusFlag::Tdre, true);
        self.rts = true;
        Ok(())
    }

    /// Decode a control-register write.
    ///
    /// | Bits | Field              |
    /// |------|--------------------|
    /// | 1..0 | counter divide (11 = master reset) |
    /// | 4..2 | word select        |
    /// | 6..5 | transmit control   |
    /// | 7    | receive IRQ enable |
    fn write_control(&mut self, byte: u8) -> Result<(), BusError> {
        match byte & 0b0000_0011 {
            0b00 => {
                self.divide_shift = 1;
                self.endpoint
                    .set_baud_rate(self.base_clock >> self.divide_shift)?;
            }
            0b01 => {
                self.divide_shift = 4;
                self.endpoint
                    .set_baud_rate(self.base_clock >> self.divide_shift)?;
            }
            0b10 => {
                self.divide_shift = 6;
                self.endpoint
                    .set_baud_rate(self.base_clock >> self.divide_shift)?;
            }
            _ => self.reset()?,
        }

        match byte & 0b0001_1100 {
            0b0000_0000 => self.endpoint.setup(7, Parity::Even, 2)?,
            0b0000_0100 => self.endpoint.setup(7, Parity::Odd, 2)?,
            0b0000_1000 => self.endpoint.setup(7, Parity::Even, 1)?,
            0b0000_1100 => self.endpoint.setup(7, Parity::Odd, 1)?,
            0b0001_0000 => self.endpoint.setup(8, Parity::None, 2)?,
            0b0001_0100 => self.endpoint.setup(8, Parity::None, 1)?,
            0b0001_1000 => self.endpoint.setup(8, Parity::Even, 1)?,
            _ => self.endpoint.setup(8, Parity::Odd, 1)?,
        }

        match byte & 0b0110_0000 {
            0b0000_0000 | 0b0010_0000 => self.rts = true,
            0b0100_0000 => self.rts = false,
            _ => {
                self.rts = true;
                self.endpoint.send_break()?;
            }
        }

        // Quirk: STATUS.IRQ mirrors control bit 7 directly instead of
        // tracking actual receive-interrupt conditions.
        self.set_status_flag(StatusFlag::Irq, byte & 0b1000_0000 != 0);

        self.regs[CONTROL] = byte;
        Ok(())
    }
}

impl<E: SerialEndpoint> Card for Acia6850<E> {
    fn in_range(&self, adr: u16) -> bool {
        let low = adr & 0x00FF;
        low >= self.start_adr && low < self.start_adr + SERIAL_IO_ADDRESSES as u16
    }

    fn identify(&self) -> CardInfo {
        let detail = format!(
            "baud: {}, ctrl: {:#04x}, dev: '{}'",
            self.baud_rate(),
            self.regs[CONTROL],
            self.endpoint.name()
        );
        CardInfo::new(self.start_adr, SERIAL_IO_ADDRESSES, "serial uart").with_detail(detail)
    }

    fn is_io(&self) -> bool {
        true
    }

    fn read(&mut self, adr: u16) -> Result<u8, BusError> {
        if !self.status_flag(StatusFlag::Rdrf) && self.endpoint.poll()? {
            self.regs[RX_DATA] = self.endpoint.getch()?;
            self.set_status_flag(StatusFlag::Rdrf, true);
        }

        let low = adr & 0x00FF;
        if low == self.start_adr {
            Ok(self.regs[STATUS])
        } else if low == self.start_adr + 1 {
            // Quirk: RDRF stays set after a data read; a real 6850 clears
            // it here.
            Ok(self.regs[RX_DATA])
        } else {
            Ok(BAD_U8)
        }
    }

    fn write(&mut self, adr: u16, byte: u8) -> Result<(), BusError> {
        let low = adr & 0x00FF;
        if low == self.start_adr {
            self.write_control(byte)?;
        } else if low == self.start_adr + 1 {
            self.regs[TX_DATA] = byte;
            self.set_status_flag(StatusFlag::Tdre, false);
        }

        if !self.status_flag(StatusFlag::Tdre) {
            self.endpoint.putch(self.regs[TX_DATA])?;
            self.set_status_flag(StatusFlag::Tdre, true);
        }
        Ok(())
    }

    fn write_force(&mut self, adr: u16, byte: u8) -> Result<(), BusError> {
        self.write(adr, byte)
    }

    fn clear(&mut self) -> Result<(), BusError> {
        self.reset()
    }
}
