use anyhow::Context;
use log::info;
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::vec::Vec;

use crate::common::*;
use crate::error::FormatError;

pub const HEADER_SIZE: usize = 0x10;
pub static PRG_BANK_SIZE: usize = 0x4000;
pub static CHR_BANK_SIZE: usize = 0x2000;

// 'N' 'E' 'S' followed by the MS-DOS end-of-file byte.
static MAGIC: [Byte; 4] = [0x4E, 0x45, 0x53, 0x1A];

#[derive(
  Default, Debug, Clone, Copy, IntoPrimitive, FromPrimitive, PartialEq, Eq, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Mirroring {
  #[default]
  Vertical = 0,
  Horizontal = 1,
}

impl std::fmt::Display for Mirroring {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Mirroring::Vertical => write!(f, "vertical"),
      Mirroring::Horizontal => write!(f, "horizontal"),
    }
  }
}

/// Decoded form of the fixed 16-byte iNES header. Built once from the raw
/// bytes and never mutated afterwards.
///
/// Only bytes 0-6 are interpreted; the upper mapper nibble in byte 7 and the
/// extended iNES 2.0 fields are out of scope, so `mapper_number` is the low
/// nibble only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomHeader {
  pub prg_rom_banks: Byte,
  pub chr_rom_banks: Byte,
  pub mirroring: Mirroring,
  pub has_battery_backed_ram: bool,
  pub has_trainer: bool,
  pub ignore_mirroring_control: bool,
  pub mapper_number: Byte,
}

impl RomHeader {
  pub fn decode(header: &[u8]) -> Result<Self, FormatError> {
    debug_assert!(header.len() >= HEADER_SIZE);
    let mut found = [0; 4];
    found.copy_from_slice(&header[0..4]);
    if found != MAGIC {
      return Err(FormatError::BadMagic { found });
    }

    let flags = header[6];
    Ok(Self {
      prg_rom_banks: header[4],
      chr_rom_banks: header[5],
      mirroring: Mirroring::from(flags & 0x1),
      has_battery_backed_ram: bit_eq(flags, 0x2),
      has_trainer: bit_eq(flags, 0x4),
      ignore_mirroring_control: bit_eq(flags, 0x8),
      mapper_number: (flags >> 4) & 0xF,
    })
  }

  /// Inverse of `decode` over the seven decoded fields; bytes 7-15 stay zero.
  pub fn encode(&self) -> [Byte; HEADER_SIZE] {
    let mut header = [0; HEADER_SIZE];
    header[0..4].copy_from_slice(&MAGIC);
    header[4] = self.prg_rom_banks;
    header[5] = self.chr_rom_banks;
    let mut flags = u8::from(self.mirroring) & 0x1;
    if self.has_battery_backed_ram {
      flags |= 0x2;
    }
    if self.has_trainer {
      flags |= 0x4;
    }
    if self.ignore_mirroring_control {
      flags |= 0x8;
    }
    flags |= self.mapper_number << 4;
    header[6] = flags;
    header
  }

  pub fn expected_size(&self) -> usize {
    HEADER_SIZE
      + self.prg_rom_banks as usize * PRG_BANK_SIZE
      + self.chr_rom_banks as usize * CHR_BANK_SIZE
  }
}

/// Checks the file body against the header it came from. A trainer or any
/// length mismatch is a hard failure, truncated files are never salvaged.
pub fn validate_layout(data: &[u8], header: &RomHeader) -> Result<(), FormatError> {
  if header.has_trainer {
    return Err(FormatError::TrainerUnsupported);
  }
  let expected = header.expected_size();
  if expected != data.len() {
    return Err(FormatError::SizeMismatch {
      expected,
      actual: data.len(),
    });
  }
  Ok(())
}

pub struct RomImage {
  header: RomHeader,
  data: Vec<Byte>,
}

impl RomImage {
  pub fn from_bytes(data: Vec<Byte>) -> Result<Self, FormatError> {
    if data.len() < HEADER_SIZE {
      return Err(FormatError::SizeMismatch {
        expected: HEADER_SIZE,
        actual: data.len(),
      });
    }
    let header = RomHeader::decode(&data[..HEADER_SIZE])?;
    validate_layout(&data, &header)?;
    info!(
      "load header finished. 16KB PRG-ROM banks: {}, 8KB CHR-ROM banks: {}",
      header.prg_rom_banks, header.chr_rom_banks
    );
    if header.chr_rom_banks == 0 {
      info!("cartridge with CHR-RAM, no CHR banks to walk");
    }
    Ok(Self { header, data })
  }

  pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
    let path = path.as_ref();
    info!("reading ROM content from {}", path.display());
    let data = std::fs::read(path)
      .with_context(|| format!("can't open the ROM file {}", path.display()))?;
    Ok(Self::from_bytes(data)?)
  }

  pub fn header(&self) -> &RomHeader {
    return &self.header;
  }

  pub fn prg_rom(&self) -> &[Byte] {
    &self.data[HEADER_SIZE..HEADER_SIZE + self.header.prg_rom_banks as usize * PRG_BANK_SIZE]
  }

  pub fn chr_rom(&self) -> &[Byte] {
    let start = HEADER_SIZE + self.header.prg_rom_banks as usize * PRG_BANK_SIZE;
    &self.data[start..]
  }

  /// Exact 8 KB slices of the CHR region, in file order. Empty for CHR-RAM
  /// cartridges.
  pub fn chr_banks(&self) -> impl Iterator<Item = &[Byte]> {
    self.chr_rom().chunks_exact(CHR_BANK_SIZE)
  }
}
