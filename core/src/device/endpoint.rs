use std::io;

/// Line parity for a serial endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Byte-stream endpoint on the far side of a serial card: typically a
/// Unix pseudo-terminal, or a scripted stand-in under test.
///
/// This is the only OS-facing boundary of the emulation core. All calls
/// except `poll` may block briefly at the OS layer; `poll` must be a
/// non-blocking availability check.
pub trait SerialEndpoint {
    /// Endpoint name an operator can use to attach to the other side
    /// (e.g., the pty slave device path).
    fn name(&self) -> &str;

    /// Whether a byte is available to read right now.
    fn poll(&mut self) -> io::Result<bool>;

    /// Read one byte.
    fn getch(&mut self) -> io::Result<u8>;

    /// Write one byte.
    fn putch(&mut self, byte: u8) -> io::Result<()>;

    /// Assert a break condition on the line.
    fn send_break(&mut self) -> io::Result<()>;

    /// Configure framing: 5..=8 data bits, parity, 1..=2 stop bits.
    fn setup(&mut self, data_bits: u8, parity: Parity, stop_bits: u8) -> io::Result<()>;

    /// Configure the line speed.
    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()>;

    /// Release the endpoint. Must be idempotent; also expected on drop.
    fn close(&mut self);
}
