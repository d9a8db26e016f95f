//! relcheck library
//!
//! Release verification for CI-built bundles: find the artifact, download
//! it, deploy it into a throwaway environment, run the integration test and
//! delete the environment afterwards.

pub mod app;
pub mod artifacts;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod service;
pub mod settings;
pub mod utils;
pub mod wait;
