//! CLI command implementations.

pub mod common;
pub mod create_bank;
pub mod dump;
pub mod extract;
pub mod info;
pub mod paths;
