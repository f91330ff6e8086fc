//! Encore command-line player
//!
//! Wires the metadata client, the redb-backed session store and the
//! headless playback resource into a single session, and drives it from
//! the terminal.

pub mod app;
pub mod config;
pub mod error;
pub mod navigator;
pub mod prompt;
