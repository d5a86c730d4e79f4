//! descriptor.rs - stage-1 loader descriptor
//!
//! The first 16 bytes of a loader image (and of every assembled body) are a
//! big-endian `{header_len, loader_len, elf_len, arg}` record. `header_len`
//! counts the descriptor itself, so anything below 0x10 is malformed.

use serde::Serialize;
use zerocopy::byteorder::{BigEndian, U32};
use zerocopy::{AsBytes, FromBytes};

use super::error::{CastError, Result};

pub const DESCRIPTOR_SIZE: usize = 0x10;

/// On-wire layout. Only ever touched through `LoaderDescriptor`.
#[repr(C)]
#[derive(Clone, Copy, AsBytes, FromBytes)]
struct RawDescriptor {
    header_len: U32<BigEndian>,
    loader_len: U32<BigEndian>,
    elf_len: U32<BigEndian>,
    arg: U32<BigEndian>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LoaderDescriptor {
    pub header_len: u32,
    pub loader_len: u32,
    pub elf_len: u32,
    pub arg: u32,
}

impl LoaderDescriptor {
    /// Read the descriptor from the start of `buf` and check `header_len`.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let raw = RawDescriptor::read_from_prefix(buf)
            .ok_or(CastError::TruncatedDescriptor { len: buf.len() })?;

        let desc = Self {
            header_len: raw.header_len.get(),
            loader_len: raw.loader_len.get(),
            elf_len: raw.elf_len.get(),
            arg: raw.arg.get(),
        };

        if (desc.header_len as usize) < DESCRIPTOR_SIZE {
            return Err(CastError::MalformedHeader { header_len: desc.header_len });
        }
        Ok(desc)
    }

    pub fn to_bytes(&self) -> [u8; DESCRIPTOR_SIZE] {
        let raw = RawDescriptor {
            header_len: U32::new(self.header_len),
            loader_len: U32::new(self.loader_len),
            elf_len: U32::new(self.elf_len),
            arg: U32::new(self.arg),
        };
        let mut out = [0u8; DESCRIPTOR_SIZE];
        out.copy_from_slice(raw.as_bytes());
        out
    }
}
