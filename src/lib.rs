//! # Helios demo gate
//!
//! `helios-gate` paces access to the Helios interactive demo. A visitor
//! submits an access code, the gate maps it to a preset role record, enforces
//! the code's lifetime usage ceiling and per-minute window, and stores a
//! 24-hour session locally.
//!
//! ## Not a security boundary
//!
//! Codes are compiled in and counters live in process memory, so anyone
//! holding the binary can read or reset them. Treat the gate as demo flow
//! shaping only.
//!
//! ## Layout
//!
//! - [`gate`]: validator, limiter, session flow and the cleanup task.
//! - [`dashboard`]: client for the metrics backend and KPI extraction.
//! - [`cli`]: the `helios-gate` command tree.

pub mod cli;
pub mod dashboard;
pub mod gate;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
