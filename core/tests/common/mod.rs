#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use s100_core::prelude::*;

/// Cap on steps for test programs, so a broken branch cannot hang a test.
const MAX_STEPS: usize = 100_000;

/// Load `program` at address 0 of a flat 64KB bus, apply `setup`, then
/// step until HLT.
pub fn run_with(
    program: &[u8],
    setup: impl FnOnce(&mut I8080, &mut FlatRam),
) -> (I8080, FlatRam) {
    let mut bus = FlatRam::new();
    let mut cpu = I8080::new();
    cpu.load(&mut bus, program, 0, false).unwrap();
    setup(&mut cpu, &mut bus);
    for _ in 0..MAX_STEPS {
        if cpu.is_halted() {
            break;
        }
        cpu.step(&mut bus).unwrap();
    }
    assert!(cpu.is_halted(), "program did not halt");
    (cpu, bus)
}

/// Run a program that needs no setup.
pub fn run_program(program: &[u8]) -> (I8080, FlatRam) {
    run_with(program, |_, _| {})
}

/// Clonable in-memory sink for capturing pseudo-BDOS print output.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Scripted serial endpoint: reads come from a queue, writes are
/// recorded, configuration calls are remembered for assertions.
pub struct MockEndpoint {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub breaks_sent: usize,
    pub baud: u32,
    pub framing: Option<(u8, Parity, u8)>,
    pub closed: bool,
}

impl MockEndpoint {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
            breaks_sent: 0,
            baud: 0,
            framing: None,
            closed: false,
        }
    }
}

impl Default for MockEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialEndpoint for MockEndpoint {
    fn name(&self) -> &str {
        "mock"
    }

    fn poll(&mut self) -> io::Result<bool> {
        Ok(!self.rx.is_empty())
    }

    fn getch(&mut self) -> io::Result<u8> {
        self.rx
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::WouldBlock, "rx queue empty"))
    }

    fn putch(&mut self, byte: u8) -> io::Result<()> {
        self.tx.push(byte);
        Ok(())
    }

    fn send_break(&mut self) -> io::Result<()> {
        self.breaks_sent += 1;
        Ok(())
    }

    fn setup(&mut self, data_bits: u8, parity: Parity, stop_bits: u8) -> io::Result<()> {
        self.framing = Some((data_bits, parity, stop_bits));
        Ok(())
    }

    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()> {
        self.baud = baud;
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// A card that decodes no addresses but can raise an interrupt with a
/// fixed instruction, driven from the test through a shared flag.
pub struct IrqCard {
    raised: Arc<AtomicBool>,
    inst: [u8; 3],
}

impl IrqCard {
    pub fn new(inst: [u8; 3]) -> (Self, Arc<AtomicBool>) {
        let raised = Arc::new(AtomicBool::new(false));
        (
            Self {
                raised: raised.clone(),
                inst,
            },
            raised,
        )
    }
}

impl Card for IrqCard {
    fn in_range(&self, _adr: u16) -> bool {
        false
    }

    fn identify(&self) -> CardInfo {
        CardInfo::new(0, 0, "irq test card")
    }

    fn is_io(&self) -> bool {
        false
    }

    fn read(&mut self, _adr: u16) -> Result<u8, BusError> {
        Ok(BAD_U8)
    }

    fn write(&mut self, _adr: u16, _byte: u8) -> Result<(), BusError> {
        Ok(())
    }

    fn write_force(&mut self, _adr: u16, _byte: u8) -> Result<(), BusError> {
        Ok(())
    }

    fn is_irq(&self) -> bool {
        self.raised.load(Ordering::Relaxed)
    }

    fn irq_inst(&self) -> [u8; 3] {
        self.inst
    }

    fn clear(&mut self) -> Result<(), BusError> {
        self.raised.store(false, Ordering::Relaxed);
        Ok(())
    }
}
