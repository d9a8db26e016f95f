//! Entrypoint orchestration

pub mod credentials;
pub mod options;
pub mod run;
