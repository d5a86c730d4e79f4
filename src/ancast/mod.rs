//! mod.rs - ancast boot image build + inspect pipeline
//!
//! `Parse -> Assemble -> Pad+Seal -> Header+Emit`. Every stage is a plain
//! function over byte buffers; file I/O only happens at the two ends.

pub mod assemble;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod header;
pub mod image;
pub mod logging;
pub mod seal;

use std::fs;
use std::path::Path;

use tracing::{info, warn};

pub use assemble::{assemble, AssembledBody};
pub use config::{Config, Overrides, SealKeys};
pub use descriptor::LoaderDescriptor;
pub use error::{CastError, Result};
pub use header::{build_image, ContainerHeader, ImageFlags};
pub use image::{inspect, ImageReport};
pub use seal::{seal, SealedBody};

/// Full in-memory build: loader image + ELF in, ancast image out.
pub fn build(loader_image: &[u8], elf: &[u8], cfg: &Config) -> Result<Vec<u8>> {
    info!("Building payload...");
    let body = assemble(loader_image, elf)?;

    info!("Building ancast image...");
    let sealed = seal(body.bytes, &cfg.keys, cfg.no_crypto);
    build_image(&sealed)
}

/// Read both inputs, build, then write the output in one go. Nothing is
/// written if any stage fails.
pub fn build_files(loader_path: &Path, elf_path: &Path, out_path: &Path, cfg: &Config) -> Result<usize> {
    let loader_image = fs::read(loader_path).map_err(|e| CastError::io(loader_path, e))?;
    let elf = fs::read(elf_path).map_err(|e| CastError::io(elf_path, e))?;

    if !cfg.no_crypto && cfg.keys.is_placeholder() {
        warn!("no ancast key configured, encrypting with the all-zero placeholder key.");
    }

    let image = build(&loader_image, &elf, cfg)?;
    fs::write(out_path, &image).map_err(|e| CastError::io(out_path, e))?;
    Ok(image.len())
}

pub fn inspect_file(path: &Path, keys: Option<&SealKeys>) -> Result<ImageReport> {
    let image = fs::read(path).map_err(|e| CastError::io(path, e))?;
    inspect(&image, keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ancast::header::HEADER_SIZE;
    use crate::ancast::seal::BODY_ALIGN;

    fn sample_loader() -> Vec<u8> {
        let mut v = LoaderDescriptor { header_len: 0x10, loader_len: 4, elf_len: 0, arg: 0 }
            .to_bytes()
            .to_vec();
        v.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        v
    }

    fn cfg(no_crypto: bool) -> Config {
        Config { keys: SealKeys { key: [0x5E; 16], iv: config::DEFAULT_IV }, no_crypto }
    }

    #[test]
    fn sample_image_is_4608_bytes() {
        let img = build(&sample_loader(), &[0u8; 10], &cfg(false)).unwrap();
        assert_eq!(img.len(), HEADER_SIZE + BODY_ALIGN);
        assert_eq!(img.len(), 4608);
    }

    #[test]
    fn builds_are_deterministic() {
        let a = build(&sample_loader(), b"0123456789", &cfg(false)).unwrap();
        let b = build(&sample_loader(), b"0123456789", &cfg(false)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn no_crypto_body_is_padded_plaintext() {
        let img = build(&sample_loader(), b"0123456789", &cfg(true)).unwrap();
        let mut expected = LoaderDescriptor { header_len: 0x10, loader_len: 4, elf_len: 10, arg: 0 }
            .to_bytes()
            .to_vec();
        expected.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        expected.extend_from_slice(b"0123456789");
        expected.resize(BODY_ALIGN, 0);

        assert_eq!(&img[HEADER_SIZE..], &expected[..]);
        assert_eq!(img[0x1A1] & 1, 1);
        assert_eq!(&img[0x1B0..0x1C4], &header::body_digest(&expected));
    }

    #[test]
    fn encrypted_digest_covers_ciphertext() {
        let img = build(&sample_loader(), b"0123456789", &cfg(false)).unwrap();
        assert_eq!(img[0x1A1] & 1, 0);
        assert_eq!(&img[0x1B0..0x1C4], &header::body_digest(&img[HEADER_SIZE..]));
    }

    #[test]
    fn failed_build_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let loader = dir.path().join("loader.bin");
        let elf = dir.path().join("fw.elf");
        let out = dir.path().join("out.img");

        let mut bad = LoaderDescriptor { header_len: 0x10, loader_len: 2, elf_len: 0, arg: 0 }
            .to_bytes()
            .to_vec();
        bad.extend_from_slice(&[1, 2, 3]);
        fs::write(&loader, bad).unwrap();
        fs::write(&elf, b"\x7FELF").unwrap();

        let err = build_files(&loader, &elf, &out, &cfg(false)).unwrap_err();
        assert!(matches!(err, CastError::LoaderTooLarge { declared: 2, actual: 3 }));
        assert!(!out.exists());
    }

    #[test]
    fn missing_input_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bin");
        let err = build_files(&missing, &missing, &dir.path().join("o"), &cfg(false)).unwrap_err();
        assert!(err.to_string().contains("nope.bin"));
    }
}
