//! header.rs - ancast container header (512 bytes, big-endian)
//!
//! Layout:
//!   +------------------------------+ 0x000
//!   | magic = 0xEFA282D9           | u32
//!   | reserved                     | 4
//!   | signature offset = 0x20      | u32
//!   | reserved                     | 20
//!   +------------------------------+ 0x020
//!   | signature type = 0x02        | u32
//!   | signature area (unsigned)    | 256
//!   | signature padding            | 124
//!   +------------------------------+ 0x1A0  <- BodyInfo
//!   | flags                        | u16   bit 0: body is plaintext
//!   | unk2, unk3                   | u8, u8
//!   | device = 0x21                | u32
//!   | type = 0x02                  | u32
//!   | body size                    | u32
//!   | body hash (SHA-1)            | 20
//!   | version = 0x02               | u32
//!   | reserved                     | 56
//!   +------------------------------+ 0x200
//!   | sealed body ...              |

use core::mem;

use bitflags::bitflags;
use digest::Digest;
use sha1::Sha1;
use tracing::info;
use zerocopy::byteorder::{BigEndian, U16, U32};
use zerocopy::{AsBytes, FromBytes};

use super::error::{CastError, Result};
use super::seal::SealedBody;

pub const ANCAST_MAGIC: u32 = 0xEFA2_82D9;
pub const SIG_OFFSET: u32 = 0x20;
pub const HEADER_SIZE: usize = 0x200;
pub const HASH_SIZE: usize = 20;

/// Signature types and where each places the body info block.
pub const SIG_TYPE_ECDSA: u32 = 0x01;
pub const SIG_TYPE_RSA2048: u32 = 0x02;
pub const BODY_INFO_OFFSET_ECDSA: usize = 0xA0;
pub const BODY_INFO_OFFSET_RSA2048: usize = 0x1A0;

/// `device` byte: high nibble is the target CPU, low nibble the image kind.
pub const TARGET_PPC: u8 = 0x01;
pub const TARGET_IOP: u8 = 0x02;
pub const DEVICE_IOP_FW: u32 = 0x21;
pub const BODY_TYPE: u32 = 0x02;
pub const BODY_VERSION: u32 = 0x02;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ImageFlags: u16 {
        const PLAINTEXT = 1 << 0;
    }
}

/// Per-body metadata block. Shared by every signature type; only its offset moves.
#[repr(C)]
#[derive(Clone, Copy, AsBytes, FromBytes)]
pub struct BodyInfo {
    pub flags: U16<BigEndian>,
    pub unk2: u8,
    pub unk3: u8,
    pub device: U32<BigEndian>,
    pub body_type: U32<BigEndian>,
    pub body_size: U32<BigEndian>,
    pub body_hash: [u8; HASH_SIZE],
    pub version: U32<BigEndian>,
    pub reserved: [u8; 0x38],
}

pub const BODY_INFO_SIZE: usize = mem::size_of::<BodyInfo>();

#[repr(C)]
#[derive(Clone, Copy, AsBytes, FromBytes)]
pub struct ContainerHeader {
    pub magic: U32<BigEndian>,
    pub reserved0: [u8; 4],
    pub sig_offset: U32<BigEndian>,
    pub reserved1: [u8; 20],
    pub sig_type: U32<BigEndian>,
    pub signature: [u8; 0x100],
    pub sig_padding: [u8; 0x7C],
    pub info: BodyInfo,
}

const _: () = assert!(BODY_INFO_SIZE == 0x60);
const _: () = assert!(mem::size_of::<ContainerHeader>() == HEADER_SIZE);

impl BodyInfo {
    pub fn flags(&self) -> ImageFlags {
        ImageFlags::from_bits_retain(self.flags.get())
    }

    pub fn target(&self) -> u8 {
        (self.device.get() >> 4) as u8
    }
}

impl ContainerHeader {
    /// IOP firmware header for `sealed`, hash taken over the body exactly as sealed.
    pub fn for_body(sealed: &SealedBody) -> Result<Self> {
        let body_size = u32::try_from(sealed.bytes.len())
            .map_err(|_| CastError::BodyTooLarge { len: sealed.bytes.len() })?;

        Ok(Self {
            magic: U32::new(ANCAST_MAGIC),
            reserved0: [0; 4],
            sig_offset: U32::new(SIG_OFFSET),
            reserved1: [0; 20],
            sig_type: U32::new(SIG_TYPE_RSA2048),
            signature: [0; 0x100],
            sig_padding: [0; 0x7C],
            info: BodyInfo {
                flags: U16::new(sealed.flags.bits()),
                unk2: 0,
                unk3: 0,
                device: U32::new(DEVICE_IOP_FW),
                body_type: U32::new(BODY_TYPE),
                body_size: U32::new(body_size),
                body_hash: body_digest(&sealed.bytes),
                version: U32::new(BODY_VERSION),
                reserved: [0; 0x38],
            },
        })
    }
}

pub fn body_digest(body: &[u8]) -> [u8; HASH_SIZE] {
    Sha1::digest(body).into()
}

/// Header followed by the sealed body, as one contiguous buffer.
pub fn build_image(sealed: &SealedBody) -> Result<Vec<u8>> {
    let header = ContainerHeader::for_body(sealed)?;

    info!("Body size:   0x{:X} bytes.", sealed.bytes.len());
    info!("Body hash:   {}.", hex::encode(header.info.body_hash));

    let mut out = Vec::with_capacity(HEADER_SIZE + sealed.bytes.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&sealed.bytes);
    Ok(out)
}
