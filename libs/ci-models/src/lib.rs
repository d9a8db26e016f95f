//! GitHub Actions REST payloads consumed by relcheck

pub mod models;

pub use models::{Artifact, ArtifactList, RunStatus, WorkflowRun, WorkflowRunList};
