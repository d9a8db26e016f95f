//! HTTP access to the CI system

pub mod ci_api;
pub mod client;
pub mod workflows;
