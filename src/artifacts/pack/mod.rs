//! Pack streams
//!
//! A pack carries a closed set of objects between repositories in one
//! stream.
//!
//! ## Format (Version 2)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "PACK" (4 bytes)
//!   - Version: 2 (4 bytes, big-endian)
//!   - Object count (4 bytes, big-endian)
//!
//! Objects, in id order:
//!   - Variable-length kind and size header
//!   - zlib stream of the payload
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```

pub mod collector;
pub mod object_header;
pub mod pack_file;

pub const SIGNATURE: &[u8; 4] = b"PACK";

pub const VERSION: u32 = 2;

/// Size of pack header in bytes
pub const HEADER_SIZE: usize = 12;

/// Size of SHA-1 trailer in bytes
pub const CHECKSUM_SIZE: usize = 20;
