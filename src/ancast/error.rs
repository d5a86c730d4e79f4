//! error.rs - castify error surface
//!
//! Every failure the build or inspect paths can hit, with the numbers that triggered it.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CastError>;

#[derive(Debug, Error)]
pub enum CastError {
    #[error("header length is 0x{header_len:X}, expected at least 0x10.")]
    MalformedHeader { header_len: u32 },

    #[error("loader is larger than its reported length (0x{actual:X} bytes, reported 0x{declared:X}).")]
    LoaderTooLarge { declared: u32, actual: usize },

    #[error("loader image is 0x{len:X} bytes, too small to hold the 0x10-byte descriptor.")]
    TruncatedDescriptor { len: usize },

    #[error("loader image is 0x{available:X} bytes, shorter than its header length 0x{header_len:X}.")]
    TruncatedHeader { header_len: u32, available: usize },

    #[error("ELF is 0x{len:X} bytes, too large for a 32-bit length field.")]
    ElfTooLarge { len: usize },

    #[error("sealed body is 0x{len:X} bytes, too large for the header size field.")]
    BodyTooLarge { len: usize },

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid {name}: {reason}")]
    InvalidKey { name: &'static str, reason: String },

    #[error("not an ancast image (magic is 0x{found:08X}, expected 0xEFA282D9).")]
    BadMagic { found: u32 },

    #[error("unrecognized signature type 0x{sig_type:02X}.")]
    UnknownSignatureType { sig_type: u32 },

    #[error("image is truncated: need 0x{needed:X} bytes, have 0x{available:X}.")]
    TruncatedImage { needed: usize, available: usize },

    #[error("body hash check failed (expected {expected}, calculated {calculated}).")]
    HashMismatch { expected: String, calculated: String },
}

impl CastError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CastError::Io { path: path.into(), source }
    }
}
