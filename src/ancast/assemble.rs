//! assemble.rs - body reconstruction from loader image + external ELF
//!
//! Loader image layout:
//!   +---------------------------+ 0
//!   | descriptor (16 bytes)     |
//!   | header tail               | header_len
//!   +---------------------------+
//!   | loader code               | <= loader_len
//!   +---------------------------+
//!   | embedded ELF (discarded)  | elf_len
//!   +---------------------------+
//!
//! The rebuilt body keeps the header tail, normalizes the loader to exactly
//! `loader_len` bytes and appends the external ELF.

use tracing::{debug, info, warn};

use super::descriptor::{LoaderDescriptor, DESCRIPTOR_SIZE};
use super::error::{CastError, Result};

/// Body ready for block padding. `descriptor` is the one written at offset 0.
#[derive(Debug)]
pub struct AssembledBody {
    pub descriptor: LoaderDescriptor,
    pub bytes: Vec<u8>,
}

pub fn assemble(loader_image: &[u8], elf: &[u8]) -> Result<AssembledBody> {
    let desc = LoaderDescriptor::parse(loader_image)?;

    let header_len = desc.header_len as usize;
    let loader_len = desc.loader_len as usize;

    if loader_image.len() < header_len {
        return Err(CastError::TruncatedHeader {
            header_len: desc.header_len,
            available: loader_image.len(),
        });
    }

    if desc.elf_len > 0 {
        warn!("loader already contains ELF, will replace.");
    }
    if desc.arg != 0 {
        debug!("descriptor arg 0x{:X} is cleared in the rebuilt body", desc.arg);
    }

    let elf_len = u32::try_from(elf.len()).map_err(|_| CastError::ElfTooLarge { len: elf.len() })?;

    let header = &loader_image[..header_len];
    // Bytes at the declared loader offsets are always loader; anything past them that
    // the declared embedded ELF does not account for is over-fill.
    let declared_end = header_len.saturating_add(loader_len).min(loader_image.len());
    let tail_end = loader_image.len().saturating_sub(desc.elf_len as usize);
    let loader_end = declared_end.max(tail_end);
    let loader = &loader_image[header_len..loader_end];

    if loader.len() > loader_len {
        return Err(CastError::LoaderTooLarge { declared: desc.loader_len, actual: loader.len() });
    }
    let pad = loader_len - loader.len();
    if pad > 0 {
        warn!("Padding loader with 0x{:X} zeroes.", pad);
    }

    info!("Header size: 0x{:X} bytes.", header_len);
    info!("Loader size: 0x{:X} bytes.", loader_len);
    info!("ELF size:    0x{:X} bytes.", elf_len);

    let rebuilt = LoaderDescriptor { elf_len, arg: 0, ..desc };

    let mut bytes = Vec::with_capacity(header_len + loader_len + elf.len());
    bytes.extend_from_slice(&rebuilt.to_bytes());
    bytes.extend_from_slice(&header[DESCRIPTOR_SIZE..]);
    bytes.extend_from_slice(loader);
    bytes.resize(bytes.len() + pad, 0);
    bytes.extend_from_slice(elf);

    Ok(AssembledBody { descriptor: rebuilt, bytes })
}
