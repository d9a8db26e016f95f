//! Declarative description of one external command

use std::fmt;
use std::path::Path;

use crate::errors::VerifyError;

/// A single argument of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArg {
    /// Passed through unchanged
    Literal(String),
    /// File pattern with one `*` in its last component, expanded in the
    /// working directory when the step runs
    Glob(String),
}

/// An external command: what to run and a label for logs and errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub label: String,
    pub program: String,
    pub args: Vec<StepArg>,
}

impl Step {
    pub fn new(label: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(StepArg::Literal(arg.into()));
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|arg| StepArg::Literal(arg.into())));
        self
    }

    pub fn glob(mut self, pattern: impl Into<String>) -> Self {
        self.args.push(StepArg::Glob(pattern.into()));
        self
    }

    /// Literal argument vector, with globs expanded against `workdir`
    pub fn resolve_args(&self, workdir: &Path) -> Result<Vec<String>, VerifyError> {
        let mut resolved = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            match arg {
                StepArg::Literal(value) => resolved.push(value.clone()),
                StepArg::Glob(pattern) => resolved.extend(expand_glob(workdir, pattern)?),
            }
        }
        Ok(resolved)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            match arg {
                StepArg::Literal(value) | StepArg::Glob(value) => write!(f, " {}", value)?,
            }
        }
        Ok(())
    }
}

fn expand_glob(workdir: &Path, pattern: &str) -> Result<Vec<String>, VerifyError> {
    let (dir, file_pattern) = match pattern.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, pattern),
    };
    let (prefix, suffix) = file_pattern.split_once('*').ok_or_else(|| {
        VerifyError::ConfigError(format!("pattern '{}' has no wildcard", pattern))
    })?;

    let search_dir = dir.map_or_else(|| workdir.to_path_buf(), |dir| workdir.join(dir));
    let mut matches = Vec::new();
    for entry in std::fs::read_dir(&search_dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if name.len() >= prefix.len() + suffix.len()
            && name.starts_with(prefix)
            && name.ends_with(suffix)
        {
            matches.push(match dir {
                Some(dir) => format!("{}/{}", dir, name),
                None => name,
            });
        }
    }

    if matches.is_empty() {
        return Err(VerifyError::NotFound(format!(
            "no file matches '{}' in {}",
            pattern,
            workdir.display()
        )));
    }
    matches.sort();
    Ok(matches)
}
