//! SoulReplay command line front end
//!
//! Exposes the CLI modules and the aggregated configuration for integration testing

pub mod cli;
pub mod config;

pub use config::ReplayConfig;
