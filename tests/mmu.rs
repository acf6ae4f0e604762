//! Bus-level behavior: region dispatch, DMA, and register quirks.

use dmg_core::cartridge::FlatCart;
use dmg_core::mmu::Mmu;

#[test]
fn cartridge_claims_rom_and_external_ram() {
    let mut mmu = Mmu::new();
    let mut rom = vec![0u8; 0x8000];
    rom[0x0100] = 0x42;
    mmu.load_cartridge(Box::new(FlatCart::new(rom)));

    assert_eq!(mmu.read_byte(0x0100), 0x42);
    mmu.write_byte(0x0100, 0x99); // mapper command on a flat cart: ignored
    assert_eq!(mmu.read_byte(0x0100), 0x42);

    mmu.write_byte(0xA000, 0x77);
    assert_eq!(mmu.read_byte(0xA000), 0x77);
}

#[test]
fn echo_ram_is_a_true_mirror() {
    let mut mmu = Mmu::new();
    for offset in [0x0000u16, 0x0ABC, 0x1DFF] {
        mmu.write_byte(0xC000 + offset, 0x11);
        assert_eq!(mmu.read_byte(0xE000 + offset), 0x11);
        mmu.write_byte(0xE000 + offset, 0x22);
        assert_eq!(mmu.read_byte(0xC000 + offset), 0x22);
    }
}

#[test]
fn oam_dma_copies_a_full_page_slice() {
    let mut mmu = Mmu::new();
    for i in 0..0xA0u16 {
        mmu.write_byte(0xC200 + i, (i as u8) ^ 0x5A);
    }
    mmu.write_byte(0xFF46, 0xC2);
    for i in 0..0xA0u16 {
        assert_eq!(mmu.read_byte(0xFE00 + i), (i as u8) ^ 0x5A);
    }
}

#[test]
fn oam_dma_from_rom_source() {
    let mut mmu = Mmu::new();
    let mut rom = vec![0u8; 0x8000];
    for i in 0..0xA0usize {
        rom[0x1000 + i] = i as u8;
    }
    mmu.load_cartridge(Box::new(FlatCart::new(rom)));
    mmu.write_byte(0xFF46, 0x10);
    assert_eq!(mmu.read_byte(0xFE5F), 0x5F);
}

#[test]
fn vram_and_oam_reach_the_ppu() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0x8000, 0xAA);
    assert_eq!(mmu.ppu.vram[0], 0xAA);
    mmu.write_byte(0xFE00, 0xBB);
    assert_eq!(mmu.ppu.oam[0], 0xBB);
}

#[test]
fn sound_registers_reach_the_apu() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xFF12, 0xF3);
    assert_eq!(mmu.read_byte(0xFF12), 0xF3);
    // NR52 power-off wipes the block through the bus too.
    mmu.write_byte(0xFF26, 0x00);
    assert_eq!(mmu.read_byte(0xFF12), 0x00);
}

#[test]
fn interrupt_registers_mask_correctly() {
    let mut mmu = Mmu::new();
    mmu.write_byte(0xFFFF, 0xFF);
    assert_eq!(mmu.read_byte(0xFFFF), 0xFF); // IE stores all bits
    mmu.write_byte(0xFF0F, 0xFF);
    assert_eq!(mmu.if_reg, 0x1F); // IF keeps only the wired five
    assert_eq!(mmu.read_byte(0xFF0F), 0xFF); // unwired bits read as one
}

#[test]
fn word_access_spans_region_boundaries() {
    let mut mmu = Mmu::new();
    // 0xDFFF is the last WRAM byte; 0xE000 mirrors 0xC000.
    mmu.write_word(0xDFFF, 0xBEEF);
    assert_eq!(mmu.read_byte(0xDFFF), 0xEF);
    assert_eq!(mmu.read_byte(0xC000), 0xBE);
}
