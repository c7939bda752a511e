//! Command implementations for the sitemapper CLI.

pub mod generate;
pub mod index;
pub mod inspect;
pub mod ping;
