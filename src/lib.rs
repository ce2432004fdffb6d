//! aac2alac - Remux AAC audio into ALAC inside QuickTime containers
//!
//! This library crate exposes the command-line layer for integration testing.
//! The conversion machinery itself lives in `aac2alac-av`.

pub mod config;
pub mod console;
pub mod convert;
