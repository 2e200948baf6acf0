//! Command implementations for the Sluice CLI

pub mod sample_config;
pub mod serve;
