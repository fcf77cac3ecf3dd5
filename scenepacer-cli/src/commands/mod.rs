//! CLI subcommands.

pub mod config;
pub mod declutter;
pub mod simulate;
