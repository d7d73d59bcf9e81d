use anyhow::Context;
use image::{GrayImage, Luma};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::cartridge::RomImage;
use crate::common::Byte;
use crate::error::FormatError;

pub const TILE_DIM: usize = 8;
pub const TILE_BYTES: usize = 16;
pub const BANK_TILE_COLUMNS: usize = 32;
pub const BANK_TILE_ROWS: usize = 16;

/// One 8x8 tile, each pixel a 2-bit value (0-3).
pub type Tile = [[Byte; TILE_DIM]; TILE_DIM];

/// Decodes a 16-byte tile record: the first 8 bytes are bit plane 0, the
/// next 8 are bit plane 1, the most significant bit of each row byte is the
/// leftmost pixel. Callers always hand in exactly 16 bytes.
pub fn decode_tile(record: &[u8]) -> Tile {
  debug_assert_eq!(record.len(), TILE_BYTES);
  let mut tile = [[0; TILE_DIM]; TILE_DIM];
  for y in 0..TILE_DIM {
    let plane0 = record[y];
    let plane1 = record[y + TILE_DIM];
    for x in 0..TILE_DIM {
      let bit0 = (plane0 >> (7 - x)) & 0x1;
      let bit1 = (plane1 >> (7 - x)) & 0x1;
      tile[y][x] = (bit1 << 1) | bit0;
    }
  }
  tile
}

/// Renders one 8 KB CHR bank into a 256x128 grayscale sheet.
///
/// Tile records are consumed column-major: record `n` lands at tile
/// `(n / 16, n % 16)`. Pixel intensity is `value << 6`, so the plane bits
/// occupy the top two bits of the gray byte (0/64/128/192 only). Both
/// choices match the reference sheets byte for byte.
pub fn render_bank(bank: &[u8]) -> Result<GrayImage, FormatError> {
  if bank.len() != BANK_TILE_COLUMNS * BANK_TILE_ROWS * TILE_BYTES {
    return Err(FormatError::BadBankSize { actual: bank.len() });
  }
  let mut canvas = GrayImage::new(
    (BANK_TILE_COLUMNS * TILE_DIM) as u32,
    (BANK_TILE_ROWS * TILE_DIM) as u32,
  );
  for tile_x in 0..BANK_TILE_COLUMNS {
    for tile_y in 0..BANK_TILE_ROWS {
      let offset = (tile_x * BANK_TILE_ROWS + tile_y) * TILE_BYTES;
      let tile = decode_tile(&bank[offset..offset + TILE_BYTES]);
      for y in 0..TILE_DIM {
        for x in 0..TILE_DIM {
          canvas.put_pixel(
            (tile_x * TILE_DIM + x) as u32,
            (tile_y * TILE_DIM + y) as u32,
            Luma([tile[y][x] << 6]),
          );
        }
      }
    }
  }
  Ok(canvas)
}

/// Renders the bank and writes it as `chr_rom_bank_<index>.png` under
/// `out_dir`. Any render, encode or write failure aborts this bank.
pub fn export_bank<P: AsRef<Path>>(
  index: usize,
  bank: &[u8],
  out_dir: P,
) -> anyhow::Result<PathBuf> {
  let canvas = render_bank(bank)?;
  let path = out_dir.as_ref().join(format!("chr_rom_bank_{}.png", index));
  canvas
    .save(&path)
    .with_context(|| format!("can't write bank sheet {}", path.display()))?;
  debug!("bank {} rendered to {}", index, path.display());
  Ok(path)
}

/// Walks every CHR bank of the ROM in file order, one sheet per bank. Stops
/// at the first failing bank.
pub fn export_chr_banks<P: AsRef<Path>>(rom: &RomImage, out_dir: P) -> anyhow::Result<Vec<PathBuf>> {
  let out_dir = out_dir.as_ref();
  let mut written = Vec::new();
  for (index, bank) in rom.chr_banks().enumerate() {
    written.push(export_bank(index, bank, out_dir)?);
  }
  info!("exported {} CHR bank(s)", written.len());
  Ok(written)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cartridge::{RomHeader, RomImage, CHR_BANK_SIZE, HEADER_SIZE, PRG_BANK_SIZE};

  static BANK_BYTES: usize = BANK_TILE_COLUMNS * BANK_TILE_ROWS * TILE_BYTES;

  #[test]
  fn zero_tile_test() {
    let tile = decode_tile(&[0; TILE_BYTES]);
    for row in tile.iter() {
      for &pixel in row.iter() {
        assert_eq!(pixel, 0);
      }
    }
  }

  #[test]
  fn full_tile_test() {
    let tile = decode_tile(&[0xFF; TILE_BYTES]);
    for row in tile.iter() {
      for &pixel in row.iter() {
        assert_eq!(pixel, 3);
        assert_eq!(pixel << 6, 192);
      }
    }
  }

  #[test]
  fn tile_orientation_test() {
    let mut record = [0; TILE_BYTES];
    // plane 0, row 0: leftmost pixel only
    record[0] = 0b1000_0000;
    // plane 1, row 3: rightmost pixel only
    record[8 + 3] = 0b0000_0001;
    let tile = decode_tile(&record);
    assert_eq!(tile[0][0], 1);
    assert_eq!(tile[0][1], 0);
    assert_eq!(tile[3][7], 2);
    assert_eq!(tile[3][6], 0);
  }

  #[test]
  fn render_zero_bank_test() {
    let canvas = render_bank(&vec![0; BANK_BYTES]).unwrap();
    assert_eq!(canvas.width(), 256);
    assert_eq!(canvas.height(), 128);
    assert!(canvas.pixels().all(|p| p.0[0] == 0));
  }

  #[test]
  fn column_major_order_test() {
    let mut bank = vec![0; BANK_BYTES];
    // record 16 is the second column's top tile, solid value 1
    for byte in bank[16 * TILE_BYTES..16 * TILE_BYTES + TILE_DIM].iter_mut() {
      *byte = 0xFF;
    }
    let canvas = render_bank(&bank).unwrap();
    // lands at pixel block (8..16, 0..8), not (0..8, 8..16)
    assert_eq!(canvas.get_pixel(8, 0).0[0], 64);
    assert_eq!(canvas.get_pixel(15, 7).0[0], 64);
    assert_eq!(canvas.get_pixel(0, 8).0[0], 0);
    assert_eq!(canvas.get_pixel(7, 15).0[0], 0);
    assert_eq!(canvas.get_pixel(16, 0).0[0], 0);
  }

  #[test]
  fn bad_bank_size_test() {
    assert_eq!(
      render_bank(&[0; 100]).err(),
      Some(FormatError::BadBankSize { actual: 100 })
    );
  }

  #[test]
  fn export_bank_test() {
    let dir = std::env::temp_dir().join("ines_tool_chr_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = export_bank(3, &vec![0; BANK_BYTES], &dir).unwrap();
    assert!(path.ends_with("chr_rom_bank_3.png"));
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
  }

  #[test]
  fn export_rom_test() {
    let header = RomHeader {
      prg_rom_banks: 1,
      chr_rom_banks: 2,
      mirroring: crate::cartridge::Mirroring::Vertical,
      has_battery_backed_ram: false,
      has_trainer: false,
      ignore_mirroring_control: false,
      mapper_number: 0,
    };
    let mut bytes = header.encode().to_vec();
    bytes.resize(HEADER_SIZE + PRG_BANK_SIZE + 2 * CHR_BANK_SIZE, 0);
    let rom = RomImage::from_bytes(bytes).unwrap();

    let dir = std::env::temp_dir().join("ines_tool_rom_test");
    std::fs::create_dir_all(&dir).unwrap();
    let written = export_chr_banks(&rom, &dir).unwrap();
    assert_eq!(written.len(), 2);
    assert!(written[0].ends_with("chr_rom_bank_0.png"));
    assert!(written[1].ends_with("chr_rom_bank_1.png"));
  }
}
