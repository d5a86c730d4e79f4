//! config.rs - cipher constants + build switches
//!
//! Resolution order: built-in defaults, then the TOML file, then CLI flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::error::{CastError, Result};

/// IOP ancast IV. Public, shared by every console.
pub const DEFAULT_IV: [u8; 16] = [
    0x91, 0xC9, 0xD0, 0x08, 0x31, 0x28, 0x51, 0xEF,
    0x6B, 0x22, 0x8B, 0xF1, 0x4B, 0xAD, 0x43, 0x22,
];

/// Placeholder only: the real ancast key lives in console OTP and is never shipped.
pub const PLACEHOLDER_KEY: [u8; 16] = [0; 16];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SealKeys {
    pub key: [u8; 16],
    pub iv: [u8; 16],
}

impl Default for SealKeys {
    fn default() -> Self {
        Self { key: PLACEHOLDER_KEY, iv: DEFAULT_IV }
    }
}

impl SealKeys {
    pub fn is_placeholder(&self) -> bool {
        self.key == PLACEHOLDER_KEY
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub keys: SealKeys,
    pub no_crypto: bool,
}

/// Values taken from the command line; `None` leaves the lower layer alone.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub key: Option<String>,
    pub iv: Option<String>,
    pub no_crypto: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    no_crypto: Option<bool>,
    cipher: CipherSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CipherSection {
    key: Option<String>,
    iv: Option<String>,
}

impl Config {
    pub fn resolve(overrides: &Overrides) -> Result<Self> {
        let mut cfg = Config::default();

        if let Some(path) = &overrides.config_path {
            cfg.apply_file(&load_file(path)?)?;
            debug!("loaded config from {}", path.display());
        }

        if let Some(key) = &overrides.key {
            cfg.keys.key = parse_hex16("key", key)?;
        }
        if let Some(iv) = &overrides.iv {
            cfg.keys.iv = parse_hex16("iv", iv)?;
        }
        if overrides.no_crypto {
            cfg.no_crypto = true;
        }

        Ok(cfg)
    }

    fn apply_file(&mut self, file: &FileConfig) -> Result<()> {
        if let Some(key) = &file.cipher.key {
            self.keys.key = parse_hex16("key", key)?;
        }
        if let Some(iv) = &file.cipher.iv {
            self.keys.iv = parse_hex16("iv", iv)?;
        }
        if let Some(no_crypto) = file.no_crypto {
            self.no_crypto = no_crypto;
        }
        Ok(())
    }
}

fn load_file(path: &Path) -> Result<FileConfig> {
    let text = fs::read_to_string(path).map_err(|e| CastError::io(path, e))?;
    parse_file(&text)
}

fn parse_file(text: &str) -> Result<FileConfig> {
    toml::from_str(text).map_err(|e| CastError::Config(e.to_string()))
}

/// Decode a 32-digit hex string (whitespace ignored) into 16 bytes.
pub fn parse_hex16(name: &'static str, s: &str) -> Result<[u8; 16]> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = hex::decode(&compact).map_err(|e| CastError::InvalidKey { name, reason: e.to_string() })?;
    <[u8; 16]>::try_from(bytes.as_slice()).map_err(|_| CastError::InvalidKey {
        name,
        reason: format!("expected 16 bytes, got {}", bytes.len()),
    })
}
