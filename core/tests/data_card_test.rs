use s100_core::prelude::*;

// ==========================================================================
// Fill and read-back
// ==========================================================================

#[test]
fn test_rom_reads_fill_byte_everywhere() {
    let mut rom = DataCard::rom(0x1000, 64, 0x5A);
    for adr in 0x1000..0x1040u16 {
        assert!(rom.in_range(adr));
        assert_eq!(rom.read(adr).unwrap(), 0x5A);
    }
    assert!(!rom.in_range(0x0FFF));
    assert!(!rom.in_range(0x1040));
}

#[test]
fn test_ram_starts_zeroed_and_is_writable() {
    let mut ram = DataCard::ram(0x0400, 16);
    assert_eq!(ram.read(0x0400).unwrap(), 0x00);
    ram.write(0x0400, 0x88).unwrap();
    assert_eq!(ram.read(0x0400).unwrap(), 0x88);
}

// ==========================================================================
// Write lock
// ==========================================================================

#[test]
fn test_rom_write_is_a_noop() {
    let mut rom = DataCard::rom(0x0000, 16, 0x5A);
    rom.write(0x0000, 0x99).unwrap();
    assert_eq!(rom.read(0x0000).unwrap(), 0x5A);
}

#[test]
fn test_write_force_bypasses_lock() {
    let mut rom = DataCard::rom(0x0000, 16, 0x5A);
    rom.write_force(0x0003, 0x99).unwrap();
    assert_eq!(rom.read(0x0003).unwrap(), 0x99);
}

#[test]
fn test_lock_toggle() {
    let mut card = DataCard::ram(0x0000, 16);
    card.lock();
    assert!(card.is_write_locked());
    card.write(0x0000, 0x11).unwrap();
    assert_eq!(card.read(0x0000).unwrap(), 0x00);
    card.unlock();
    card.write(0x0000, 0x11).unwrap();
    assert_eq!(card.read(0x0000).unwrap(), 0x11);
}

// ==========================================================================
// Clear
// ==========================================================================

#[test]
fn test_clear_zero_fills_only_unlocked() {
    let mut ram = DataCard::ram(0x0000, 4);
    ram.write(0x0002, 0x77).unwrap();
    ram.clear().unwrap();
    assert_eq!(ram.read(0x0002).unwrap(), 0x00);

    let mut rom = DataCard::rom(0x0000, 4, 0x5A);
    rom.clear().unwrap();
    assert_eq!(rom.read(0x0002).unwrap(), 0x5A);
}

// ==========================================================================
// Seeded construction
// ==========================================================================

#[test]
fn test_with_bytes_autodetects_capacity() {
    let mut card = DataCard::with_bytes(0x0100, vec![1, 2, 3], 0, false).unwrap();
    assert_eq!(card.capacity(), 3);
    assert_eq!(card.read(0x0102).unwrap(), 3);
    assert!(!card.in_range(0x0103));
}

#[test]
fn test_with_bytes_pads_with_floating_bus_value() {
    let mut card = DataCard::with_bytes(0x0000, vec![1, 2], 4, true).unwrap();
    assert_eq!(card.read(0x0001).unwrap(), 2);
    assert_eq!(card.read(0x0003).unwrap(), BAD_U8);
}

#[test]
fn test_with_bytes_rejects_oversized_image() {
    let result = DataCard::with_bytes(0x0000, vec![0; 10], 4, false);
    assert!(matches!(
        result,
        Err(BusError::ImageTooLarge {
            data: 10,
            capacity: 4
        })
    ));
}

// ==========================================================================
// Identity
// ==========================================================================

#[test]
fn test_identify_reflects_lock_state() {
    let ram = DataCard::ram(0x4000, 1024);
    let info = ram.identify();
    assert_eq!(info.start_adr, 0x4000);
    assert_eq!(info.adr_range, 1024);
    assert_eq!(info.name, "ram area");

    let rom = DataCard::rom(0x0000, 1024, 0xFF);
    assert_eq!(rom.identify().name, "rom area");
}
