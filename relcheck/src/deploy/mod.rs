//! Deployment module

pub mod instance;
pub mod integration;
pub mod pipeline;
pub mod reaper;
pub mod runner;
pub mod step;
