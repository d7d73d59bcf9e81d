use thiserror::Error;

use crate::common::Byte;

/// Structural failures while reading an iNES file. Every variant is fatal at
/// the point of detection; nothing continues past a failed check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
  #[error("not a valid iNES image, magic bytes {found:02X?} rather than NES\\x1A")]
  BadMagic { found: [Byte; 4] },

  #[error("trainer-prefixed ROMs are not supported")]
  TrainerUnsupported,

  #[error("ROM is {actual} bytes but the header declares {expected}")]
  SizeMismatch { expected: usize, actual: usize },

  #[error("CHR bank is {actual} bytes rather than 8192")]
  BadBankSize { actual: usize },
}
