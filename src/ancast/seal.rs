//! seal.rs - 4 KiB block padding + AES-128-CBC body cipher
//!
//! The body is always padded to a whole number of 0x1000-byte blocks, so the
//! cipher never sees a partial AES block and no cipher-level padding is used.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes128;
use tracing::{debug, info};

use super::config::SealKeys;
use super::header::ImageFlags;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

pub const BODY_ALIGN: usize = 0x1000;
const AES_BLOCK: usize = 16;

#[derive(Debug)]
pub struct SealedBody {
    pub bytes: Vec<u8>,
    pub flags: ImageFlags,
}

/// Zero-extend `body` to the next `BODY_ALIGN` boundary. Returns the pad length.
pub fn pad_to_block(body: &mut Vec<u8>) -> usize {
    let aligned = (body.len() + BODY_ALIGN - 1) & !(BODY_ALIGN - 1);
    let pad = aligned - body.len();
    body.resize(aligned, 0);
    pad
}

/// Pad, then encrypt in place unless `no_crypto` is set, in which case the
/// body stays plaintext and `ImageFlags::PLAINTEXT` is raised instead.
pub fn seal(mut body: Vec<u8>, keys: &SealKeys, no_crypto: bool) -> SealedBody {
    let pad = pad_to_block(&mut body);
    if pad > 0 {
        info!("Padding payload with 0x{:X} zeroes.", pad);
    }

    let mut flags = ImageFlags::empty();
    if no_crypto {
        flags |= ImageFlags::PLAINTEXT;
        debug!("no-crypto override set, body left as plaintext");
    } else {
        encrypt_in_place(&mut body, keys);
    }

    SealedBody { bytes: body, flags }
}

/// CBC-encrypt `buf` in one pass. `buf.len()` must be a multiple of 16.
pub fn encrypt_in_place(buf: &mut [u8], keys: &SealKeys) {
    debug_assert_eq!(buf.len() % AES_BLOCK, 0);
    let mut enc = Aes128CbcEnc::new(&keys.key.into(), &keys.iv.into());
    for block in buf.chunks_exact_mut(AES_BLOCK) {
        enc.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

/// Inverse of `encrypt_in_place`; used when inspecting encrypted images.
pub fn unseal(buf: &mut [u8], keys: &SealKeys) {
    debug_assert_eq!(buf.len() % AES_BLOCK, 0);
    let mut dec = Aes128CbcDec::new(&keys.key.into(), &keys.iv.into());
    for block in buf.chunks_exact_mut(AES_BLOCK) {
        dec.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SealKeys {
        SealKeys { key: [0x42; 16], iv: [0x24; 16] }
    }

    #[test]
    fn pads_up_to_next_boundary() {
        let mut v = vec![1u8; 30];
        assert_eq!(pad_to_block(&mut v), BODY_ALIGN - 30);
        assert_eq!(v.len(), BODY_ALIGN);
        assert!(v[30..].iter().all(|&b| b == 0));
    }

    #[test]
    fn aligned_body_gets_no_padding() {
        let mut v = vec![7u8; 2 * BODY_ALIGN];
        assert_eq!(pad_to_block(&mut v), 0);
        assert_eq!(v.len(), 2 * BODY_ALIGN);
    }

    #[test]
    fn empty_body_stays_empty() {
        let mut v = Vec::new();
        assert_eq!(pad_to_block(&mut v), 0);
        assert!(v.is_empty());
    }

    #[test]
    fn sealed_len_always_block_multiple() {
        for len in [1usize, 15, 16, 4095, 4096, 4097, 9000] {
            let sealed = seal(vec![0xAB; len], &keys(), false);
            assert_eq!(sealed.bytes.len() % BODY_ALIGN, 0, "len {}", len);
            assert!(sealed.bytes.len() >= len);
        }
    }

    #[test]
    fn no_crypto_keeps_plaintext_and_sets_flag() {
        let sealed = seal(vec![0xAB; 30], &keys(), true);
        assert!(sealed.flags.contains(ImageFlags::PLAINTEXT));
        let mut expected = vec![0xAB; 30];
        expected.resize(BODY_ALIGN, 0);
        assert_eq!(sealed.bytes, expected);
    }

    #[test]
    fn encrypted_body_round_trips_with_same_keys() {
        let sealed = seal(vec![0xAB; 30], &keys(), false);
        assert!(sealed.flags.is_empty());
        let mut plain = vec![0xAB; 30];
        plain.resize(BODY_ALIGN, 0);
        assert_ne!(sealed.bytes, plain);

        let mut back = sealed.bytes.clone();
        unseal(&mut back, &keys());
        assert_eq!(back, plain);
    }

    #[test]
    fn cbc_chains_identical_blocks() {
        let sealed = seal(vec![0u8; 32], &keys(), false);
        assert_ne!(sealed.bytes[..16], sealed.bytes[16..32]);
    }

    #[test]
    fn matches_nist_cbc_vector() {
        // SP 800-38A F.2.1, first block.
        let keys = SealKeys {
            key: hex_16("2b7e151628aed2a6abf7158809cf4f3c"),
            iv: hex_16("000102030405060708090a0b0c0d0e0f"),
        };
        let mut buf = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
        encrypt_in_place(&mut buf, &keys);
        assert_eq!(hex::encode(buf), "7649abac8119b246cee98e9b12e9197d");
    }

    fn hex_16(s: &str) -> [u8; 16] {
        let mut out = [0u8; 16];
        out.copy_from_slice(&hex::decode(s).unwrap());
        out
    }
}
