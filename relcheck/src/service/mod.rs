//! Deployed service access

pub mod client;
pub mod monitor;
