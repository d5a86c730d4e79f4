// src/lib.rs - castify library root
// Wraps a stage-1 loader and an ELF payload into a 512-byte-headed ancast
// container, optionally AES-128-CBC sealed, with a SHA-1 body hash.

pub mod ancast;

pub use ancast::{build, build_files, inspect, inspect_file, CastError, Config, ImageReport, Result, SealKeys};
