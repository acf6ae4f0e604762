//! Cartridge interface and ROM header parsing.
//!
//! Bank-switching hardware is an external collaborator: the bus forwards
//! every access in the cartridge ranges to a [`Cartridge`] implementation
//! and lets it do whatever its mapper requires. The core ships only the
//! flat (no-MBC) cartridge, enough to run 32 KiB ROMs and test programs.

const HEADER_END: usize = 0x0150;

const TITLE_RANGE: std::ops::Range<usize> = 0x0134..0x0144;
const LOGO_RANGE: std::ops::Range<usize> = 0x0104..0x0134;
const TYPE_OFFSET: usize = 0x0147;
const ROM_SIZE_OFFSET: usize = 0x0148;
const RAM_SIZE_OFFSET: usize = 0x0149;
const CHECKSUM_RANGE: std::ops::Range<usize> = 0x0134..0x014D;
const CHECKSUM_OFFSET: usize = 0x014D;

/// The Nintendo logo bitmap every licensed ROM carries; the boot ROM
/// refuses to start without it.
const NINTENDO_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00,
    0x0D, 0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD,
    0xD9, 0x99, 0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB,
    0xB9, 0x33, 0x3E,
];

/// Memory access over the cartridge address ranges (0x0000-0x7FFF ROM,
/// 0xA000-0xBFFF external RAM). Mappers take `&mut self` on reads too, since
/// some real hardware (RTC latches) has read side effects.
pub trait Cartridge {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, val: u8);
}

/// Mapper chip named by the cartridge-type header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbcType {
    NoMbc,
    Mbc1,
    Mbc2,
    Mbc3,
    Mbc5,
    Unknown(u8),
}

impl MbcType {
    pub fn from_type_byte(byte: u8) -> Self {
        match byte {
            0x00 | 0x08 | 0x09 => MbcType::NoMbc,
            0x01..=0x03 => MbcType::Mbc1,
            0x05 | 0x06 => MbcType::Mbc2,
            0x0F..=0x13 => MbcType::Mbc3,
            0x19..=0x1E => MbcType::Mbc5,
            other => MbcType::Unknown(other),
        }
    }
}

/// Parsed ROM header fields.
#[derive(Debug, Clone)]
pub struct Header {
    pub title: String,
    pub mbc: MbcType,
    pub rom_size: usize,
    pub ram_size: usize,
    pub logo_valid: bool,
    pub checksum_valid: bool,
}

impl Header {
    /// Parse the header block. Returns `None` when the ROM is too short to
    /// contain one.
    pub fn parse(rom: &[u8]) -> Option<Self> {
        if rom.len() < HEADER_END {
            return None;
        }
        let title = rom[TITLE_RANGE]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect();
        let rom_size = 0x8000usize << rom[ROM_SIZE_OFFSET].min(8);
        let ram_size = match rom[RAM_SIZE_OFFSET] {
            0x02 => 0x2000,
            0x03 => 0x8000,
            0x04 => 0x20000,
            0x05 => 0x10000,
            _ => 0,
        };
        let checksum = rom[CHECKSUM_RANGE]
            .iter()
            .fold(0u8, |sum, &b| sum.wrapping_sub(b).wrapping_sub(1));
        Some(Self {
            title,
            mbc: MbcType::from_type_byte(rom[TYPE_OFFSET]),
            rom_size,
            ram_size,
            logo_valid: rom[LOGO_RANGE] == NINTENDO_LOGO,
            checksum_valid: checksum == rom[CHECKSUM_OFFSET],
        })
    }
}

/// Unbanked 32 KiB ROM with optional 8 KiB external RAM.
pub struct FlatCart {
    rom: Vec<u8>,
    ram: [u8; 0x2000],
}

impl FlatCart {
    pub fn new(rom: Vec<u8>) -> Self {
        if let Some(header) = Header::parse(&rom) {
            if header.mbc != MbcType::NoMbc {
                log::warn!(
                    "ROM \"{}\" declares mapper {:?}; running it unbanked",
                    header.title,
                    header.mbc
                );
            }
            if !header.checksum_valid {
                log::warn!("ROM \"{}\" has a bad header checksum", header.title);
            }
        }
        Self { rom, ram: [0; 0x2000] }
    }
}

impl Cartridge for FlatCart {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => self.rom.get(addr as usize).copied().unwrap_or(0xFF),
            0xA000..=0xBFFF => self.ram[(addr - 0xA000) as usize],
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        if let 0xA000..=0xBFFF = addr {
            self.ram[(addr - 0xA000) as usize] = val;
        }
        // ROM-range writes are mapper commands; a flat cart has no mapper.
    }
}
