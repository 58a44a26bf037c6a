use z80_core::cpu::z80::{Reg16, Reg8, Z80};
mod common;
use common::TestBus;

// ============================================================
// LDI
// ============================================================

#[test]
fn test_ldi() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::H, 0x10, false); cpu.set_reg8_named(Reg8::L, 0x00, false); // HL = source
    cpu.set_reg8_named(Reg8::D, 0x20, false); cpu.set_reg8_named(Reg8::E, 0x00, false); // DE = dest
    cpu.set_reg8_named(Reg8::B, 0x00, false); cpu.set_reg8_named(Reg8::C, 0x03, false); // BC = count
    cpu.set_reg8_named(Reg8::F, 0x01, false); // C set
    cpu.bus.load(0, &[0xED, 0xA0]); // LDI
    cpu.bus.memory[0x1000] = 0x42;

    let cycles = cpu.step();
    assert_eq!(cycles, 16, "LDI should be 16 T-states");
    assert_eq!(cpu.bus.memory[0x2000], 0x42, "Byte should be transferred");
    assert_eq!(cpu.get_hl(), 0x1001, "HL should be incremented");
    assert_eq!(cpu.get_de(), 0x2001, "DE should be incremented");
    assert_eq!(cpu.get_bc(), 0x0002, "BC should be decremented");
    assert_ne!(cpu.get_reg8_named(Reg8::F, false) & 0x04, 0, "PV should be set (BC != 0)");
    assert_eq!(cpu.get_reg8_named(Reg8::F, false) & 0x02, 0, "N should be clear");
    assert_eq!(cpu.get_reg8_named(Reg8::F, false) & 0x10, 0, "H should be clear");
    assert_ne!(cpu.get_reg8_named(Reg8::F, false) & 0x01, 0, "C should be preserved");
}

#[test]
fn test_ldi_bc_reaches_zero() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::H, 0x10, false); cpu.set_reg8_named(Reg8::L, 0x00, false);
    cpu.set_reg8_named(Reg8::D, 0x20, false); cpu.set_reg8_named(Reg8::E, 0x00, false);
    cpu.set_reg8_named(Reg8::B, 0x00, false); cpu.set_reg8_named(Reg8::C, 0x01, false); // BC = 1, will become 0
    cpu.bus.load(0, &[0xED, 0xA0]);
    cpu.bus.memory[0x1000] = 0x55;

    cpu.step();
    assert_eq!(cpu.get_bc(), 0x0000);
    assert_eq!(cpu.get_reg8_named(Reg8::F, false) & 0x04, 0, "PV should be clear (BC == 0)");
}

// ============================================================
// LDD
// ============================================================

#[test]
fn test_ldd() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::H, 0x10, false); cpu.set_reg8_named(Reg8::L, 0x05, false);
    cpu.set_reg8_named(Reg8::D, 0x20, false); cpu.set_reg8_named(Reg8::E, 0x05, false);
    cpu.set_reg8_named(Reg8::B, 0x00, false); cpu.set_reg8_named(Reg8::C, 0x03, false);
    cpu.bus.load(0, &[0xED, 0xA8]); // LDD
    cpu.bus.memory[0x1005] = 0x77;

    let cycles = cpu.step();
    assert_eq!(cycles, 16);
    assert_eq!(cpu.bus.memory[0x2005], 0x77);
    assert_eq!(cpu.get_hl(), 0x1004, "HL should be decremented");
    assert_eq!(cpu.get_de(), 0x2004, "DE should be decremented");
    assert_eq!(cpu.get_bc(), 0x0002);
}

// ============================================================
// LDIR
// ============================================================

#[test]
fn test_ldir() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::H, 0x10, false); cpu.set_reg8_named(Reg8::L, 0x00, false);
    cpu.set_reg8_named(Reg8::D, 0x20, false); cpu.set_reg8_named(Reg8::E, 0x00, false);
    cpu.set_reg8_named(Reg8::B, 0x00, false); cpu.set_reg8_named(Reg8::C, 0x03, false);
    cpu.set_reg8_named(Reg8::F, 0x01, false);
    cpu.bus.load(0, &[0xED, 0xB0]); // LDIR
    cpu.bus.memory[0x1000] = 0xAA;
    cpu.bus.memory[0x1001] = 0xBB;
    cpu.bus.memory[0x1002] = 0xCC;

    // Run 3 iterations
    let cycles1 = cpu.step();
    assert_eq!(cycles1, 21, "LDIR repeating should be 21 T-states");
    assert_eq!(cpu.bus.memory[0x2000], 0xAA);
    assert_eq!(cpu.get_bc(), 0x0002);

    let cycles2 = cpu.step();
    assert_eq!(cycles2, 21);
    assert_eq!(cpu.bus.memory[0x2001], 0xBB);

    let cycles3 = cpu.step();
    assert_eq!(cycles3, 16, "LDIR final iteration should be 16 T-states");
    assert_eq!(cpu.bus.memory[0x2002], 0xCC);
    assert_eq!(cpu.get_bc(), 0x0000);
    assert_eq!(cpu.get_reg8_named(Reg8::F, false) & 0x04, 0, "PV should be clear after LDIR completes");
}

// ============================================================
// LDDR
// ============================================================

#[test]
fn test_lddr() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::H, 0x10, false); cpu.set_reg8_named(Reg8::L, 0x02, false);
    cpu.set_reg8_named(Reg8::D, 0x20, false); cpu.set_reg8_named(Reg8::E, 0x02, false);
    cpu.set_reg8_named(Reg8::B, 0x00, false); cpu.set_reg8_named(Reg8::C, 0x03, false);
    cpu.bus.load(0, &[0xED, 0xB8]); // LDDR
    cpu.bus.memory[0x1000] = 0x11;
    cpu.bus.memory[0x1001] = 0x22;
    cpu.bus.memory[0x1002] = 0x33;

    cpu.step(); // Transfer [0x1002] → [0x2002]
    assert_eq!(cpu.bus.memory[0x2002], 0x33);
    assert_eq!(cpu.get_hl(), 0x1001);
    assert_eq!(cpu.get_de(), 0x2001);

    cpu.step(); // Transfer [0x1001] → [0x2001]
    assert_eq!(cpu.bus.memory[0x2001], 0x22);

    cpu.step(); // Transfer [0x1000] → [0x2000]
    assert_eq!(cpu.bus.memory[0x2000], 0x11);
    assert_eq!(cpu.get_bc(), 0x0000);
}

// ============================================================
// CPI
// ============================================================

#[test]
fn test_cpi_match() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::A, 0x42, false);
    cpu.set_reg8_named(Reg8::H, 0x10, false); cpu.set_reg8_named(Reg8::L, 0x00, false);
    cpu.set_reg8_named(Reg8::B, 0x00, false); cpu.set_reg8_named(Reg8::C, 0x03, false);
    cpu.set_reg8_named(Reg8::F, 0x01, false); // C set
    cpu.bus.load(0, &[0xED, 0xA1]); // CPI
    cpu.bus.memory[0x1000] = 0x42; // Match

    let cycles = cpu.step();
    assert_eq!(cycles, 16, "CPI should be 16 T-states");
    assert_ne!(cpu.get_reg8_named(Reg8::F, false) & 0x40, 0, "Z should be set (match)");
    assert_ne!(cpu.get_reg8_named(Reg8::F, false) & 0x02, 0, "N should be set");
    assert_ne!(cpu.get_reg8_named(Reg8::F, false) & 0x01, 0, "C should be preserved");
    assert_ne!(cpu.get_reg8_named(Reg8::F, false) & 0x04, 0, "PV should be set (BC != 0)");
    assert_eq!(cpu.get_hl(), 0x1001, "HL should be incremented");
    assert_eq!(cpu.get_bc(), 0x0002);
    assert_eq!(cpu.get_reg8_named(Reg8::A, false), 0x42, "A should be unchanged");
}

#[test]
fn test_cpi_no_match() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::A, 0x42, false);
    cpu.set_reg8_named(Reg8::H, 0x10, false); cpu.set_reg8_named(Reg8::L, 0x00, false);
    cpu.set_reg8_named(Reg8::B, 0x00, false); cpu.set_reg8_named(Reg8::C, 0x01, false);
    cpu.bus.load(0, &[0xED, 0xA1]);
    cpu.bus.memory[0x1000] = 0x43; // No match

    cpu.step();
    assert_eq!(cpu.get_reg8_named(Reg8::F, false) & 0x40, 0, "Z should be clear (no match)");
    assert_eq!(cpu.get_reg8_named(Reg8::F, false) & 0x04, 0, "PV should be clear (BC == 0)");
}

// ============================================================
// CPD
// ============================================================

#[test]
fn test_cpd() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::A, 0x42, false);
    cpu.set_reg8_named(Reg8::H, 0x10, false); cpu.set_reg8_named(Reg8::L, 0x05, false);
    cpu.set_reg8_named(Reg8::B, 0x00, false); cpu.set_reg8_named(Reg8::C, 0x03, false);
    cpu.bus.load(0, &[0xED, 0xA9]); // CPD
    cpu.bus.memory[0x1005] = 0x42; // Match

    cpu.step();
    assert_ne!(cpu.get_reg8_named(Reg8::F, false) & 0x40, 0, "Z should be set (match)");
    assert_eq!(cpu.get_hl(), 0x1004, "HL should be decremented");
    assert_eq!(cpu.get_bc(), 0x0002);
}

// ============================================================
// CPIR
// ============================================================

#[test]
fn test_cpir_find() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::A, 0x42, false);
    cpu.set_reg8_named(Reg8::H, 0x10, false); cpu.set_reg8_named(Reg8::L, 0x00, false);
    cpu.set_reg8_named(Reg8::B, 0x00, false); cpu.set_reg8_named(Reg8::C, 0x05, false);
    cpu.bus.load(0, &[0xED, 0xB1]); // CPIR
    cpu.bus.memory[0x1000] = 0x00;
    cpu.bus.memory[0x1001] = 0x00;
    cpu.bus.memory[0x1002] = 0x42; // Match at [0x1002]

    let cycles1 = cpu.step();
    assert_eq!(cycles1, 21, "CPIR repeating should be 21 T-states");
    assert_eq!(cpu.get_reg8_named(Reg8::F, false) & 0x40, 0, "Z clear (no match yet)");

    cpu.step(); // Skip [0x1001]

    let cycles3 = cpu.step(); // Match at [0x1002]
    assert_eq!(cycles3, 16, "CPIR match should be 16 T-states");
    assert_ne!(cpu.get_reg8_named(Reg8::F, false) & 0x40, 0, "Z should be set (match found)");
    assert_eq!(cpu.get_hl(), 0x1003);
}

// ============================================================
// CPDR
// ============================================================

#[test]
fn test_cpdr_find() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::A, 0x42, false);
    cpu.set_reg8_named(Reg8::H, 0x10, false); cpu.set_reg8_named(Reg8::L, 0x02, false);
    cpu.set_reg8_named(Reg8::B, 0x00, false); cpu.set_reg8_named(Reg8::C, 0x05, false);
    cpu.bus.load(0, &[0xED, 0xB9]); // CPDR
    cpu.bus.memory[0x1002] = 0x00;
    cpu.bus.memory[0x1001] = 0x42; // Match at [0x1001]

    cpu.step(); // Skip [0x1002]
    assert_eq!(cpu.get_reg8_named(Reg8::F, false) & 0x40, 0, "Z clear (no match)");

    cpu.step(); // Match at [0x1001]
    assert_ne!(cpu.get_reg8_named(Reg8::F, false) & 0x40, 0, "Z should be set");
    assert_eq!(cpu.get_hl(), 0x1000);
}

// ============================================================
// INI / OUTI (timing)
// ============================================================

#[test]
fn test_ini() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::B, 0x03, false);
    cpu.set_reg8_named(Reg8::C, 0x10, false);
    cpu.set_reg8_named(Reg8::H, 0x20, false); cpu.set_reg8_named(Reg8::L, 0x00, false);
    cpu.bus.load(0, &[0xED, 0xA2]); // INI

    let cycles = cpu.step();
    assert_eq!(cycles, 16, "INI should be 16 T-states");
    assert_eq!(cpu.get_reg8_named(Reg8::B, false), 0x02, "B should be decremented");
    assert_eq!(cpu.bus.memory[0x2000], 0x00, "byte from port 0x0210 written to (HL)");
    assert_eq!(cpu.get_hl(), 0x2001, "HL should be incremented");
    assert_eq!(cpu.get_reg8_named(Reg8::F, false) & 0x40, 0, "Z should be clear (B != 0)");
}

#[test]
fn test_outi() {
    let mut cpu = Z80::new(TestBus::new());
    cpu.set_reg8_named(Reg8::B, 0x01, false);
    cpu.set_reg8_named(Reg8::C, 0x10, false);
    cpu.set_reg8_named(Reg8::H, 0x20, false); cpu.set_reg8_named(Reg8::L, 0x00, false);
    cpu.bus.load(0, &[0xED, 0xA3]); // OUTI
    cpu.bus.memory[0x2000] = 0x42;

    let cycles = cpu.step();
    assert_eq!(cycles, 16, "OUTI should be 16 T-states");
    assert_eq!(cpu.get_reg8_named(Reg8::B, false), 0x00, "B should be decremented");
    assert_eq!(cpu.get_hl(), 0x2001, "HL should be incremented");
    assert_ne!(cpu.get_reg8_named(Reg8::F, false) & 0x40, 0, "Z should be set (B == 0)");
}
