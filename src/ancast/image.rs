//! image.rs - read-side view of an ancast image
//!
//! Mirrors what the boot ROM does before jumping into a body: check the
//! magic, follow the signature offset to the signature type, find the body
//! info block for that type, then hash the body and compare.

use serde::Serialize;
use zerocopy::FromBytes;

use super::config::SealKeys;
use super::descriptor::{LoaderDescriptor, DESCRIPTOR_SIZE};
use super::error::{CastError, Result};
use super::header::{
    body_digest, BodyInfo, ImageFlags, ANCAST_MAGIC, BODY_INFO_OFFSET_ECDSA, BODY_INFO_OFFSET_RSA2048,
    BODY_INFO_SIZE, SIG_TYPE_ECDSA, SIG_TYPE_RSA2048, TARGET_IOP, TARGET_PPC,
};
use super::seal::unseal;

#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub sig_type: u32,
    pub header_size: usize,
    pub flags: u16,
    pub plaintext: bool,
    pub unk2: u8,
    pub unk3: u8,
    pub device: u32,
    pub target: &'static str,
    pub body_type: u32,
    pub body_size: u32,
    pub version: u32,
    pub expected_hash: String,
    pub calculated_hash: String,
    pub hash_ok: bool,
    /// Leading descriptor of the body; needs a plaintext body or keys to decrypt it.
    pub descriptor: Option<LoaderDescriptor>,
}

impl ImageReport {
    pub fn check_hash(&self) -> Result<()> {
        if self.hash_ok {
            Ok(())
        } else {
            Err(CastError::HashMismatch {
                expected: self.expected_hash.clone(),
                calculated: self.calculated_hash.clone(),
            })
        }
    }
}

pub fn target_name(target: u8) -> &'static str {
    match target {
        TARGET_PPC => "PPC",
        TARGET_IOP => "IOP",
        _ => "unknown",
    }
}

fn be32_at(buf: &[u8], off: usize) -> Result<u32> {
    let end = off.checked_add(4).unwrap_or(usize::MAX);
    buf.get(off..end)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(CastError::TruncatedImage { needed: end, available: buf.len() })
}

pub fn inspect(image: &[u8], keys: Option<&SealKeys>) -> Result<ImageReport> {
    let magic = be32_at(image, 0).map_err(|_| CastError::BadMagic { found: 0 })?;
    if magic != ANCAST_MAGIC {
        return Err(CastError::BadMagic { found: magic });
    }

    let sig_offset = be32_at(image, 0x08)? as usize;
    let sig_type = be32_at(image, sig_offset)?;
    let info_offset = match sig_type {
        SIG_TYPE_ECDSA => BODY_INFO_OFFSET_ECDSA,
        SIG_TYPE_RSA2048 => BODY_INFO_OFFSET_RSA2048,
        other => return Err(CastError::UnknownSignatureType { sig_type: other }),
    };

    let header_size = info_offset + BODY_INFO_SIZE;
    let info = image
        .get(info_offset..)
        .and_then(|b| BodyInfo::read_from_prefix(b))
        .ok_or(CastError::TruncatedImage { needed: header_size, available: image.len() })?;

    let body_size = info.body_size.get();
    let body_end = header_size.saturating_add(body_size as usize);
    let body = image
        .get(header_size..body_end)
        .ok_or(CastError::TruncatedImage { needed: body_end, available: image.len() })?;

    let calculated = body_digest(body);
    let flags = info.flags();
    let plaintext = flags.contains(ImageFlags::PLAINTEXT);

    let descriptor = if plaintext {
        LoaderDescriptor::parse(body).ok()
    } else {
        keys.and_then(|k| decrypt_descriptor(body, k))
    };

    Ok(ImageReport {
        sig_type,
        header_size,
        flags: flags.bits(),
        plaintext,
        unk2: info.unk2,
        unk3: info.unk3,
        device: info.device.get(),
        target: target_name(info.target()),
        body_type: info.body_type.get(),
        body_size,
        version: info.version.get(),
        expected_hash: hex::encode(info.body_hash),
        calculated_hash: hex::encode(calculated),
        hash_ok: calculated == info.body_hash,
        descriptor,
    })
}

/// The descriptor fits in the first CBC block, which only needs the IV to decrypt.
fn decrypt_descriptor(body: &[u8], keys: &SealKeys) -> Option<LoaderDescriptor> {
    let mut block = [0u8; DESCRIPTOR_SIZE];
    block.copy_from_slice(body.get(..DESCRIPTOR_SIZE)?);
    unseal(&mut block, keys);
    LoaderDescriptor::parse(&block).ok()
}
