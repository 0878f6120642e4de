//! Line-oriented wire protocol
//!
//! A connection opens with one command line:
//!
//! ```text
//! <upload-pack|receive-pack|merge-request> <repo-path> [--branch <name>] [--select <path>...]
//! ```
//!
//! Replies are newline-terminated lines; a failure is reported as a single
//! `error: <message>` line. Packs travel as a `pack <length>` line followed by
//! exactly that many bytes.

pub mod command_line;
pub mod framing;

/// Prefix of every failure reply
pub const ERROR_PREFIX: &str = "error: ";

/// Positive acknowledgement
pub const OK_REPLY: &str = "ok";

/// Default TCP port for the server
pub const DEFAULT_PORT: u16 = 9418;
