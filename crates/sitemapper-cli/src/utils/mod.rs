//! Shared helpers for command implementations.

pub mod input;
pub mod logging;
pub mod settings;
