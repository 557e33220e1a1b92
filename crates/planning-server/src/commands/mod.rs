//! Subcommand implementations.

pub mod inspect;
pub mod render;
pub mod serve;
