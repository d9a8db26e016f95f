//! Finding and fetching CI artifacts

pub mod download;
pub mod locator;
