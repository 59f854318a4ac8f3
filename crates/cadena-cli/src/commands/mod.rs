//! CLI command implementations.

pub mod chains;
pub mod common;
pub mod edit;
pub mod effects;
pub mod export;
pub mod render;
pub mod settings;
