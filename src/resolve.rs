use std::process::Command;
use tracing::{debug, error};
use crate::error::ResolveError;

/// What the resolution engine reported while fetching a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// `(module path, version)` for every `downloading` line, in output order.
    pub downloads: Vec<(String, String)>,
}

impl ResolutionOutcome {
    /// Returns the first version reported for `module` that differs from `requested`.
    ///
    /// A `Some` here means the engine settled on another version than the
    /// client asked for (e.g. a branch name resolved to a pseudo-version).
    pub fn drift(&self, module: &str, requested: &str) -> Option<&str> {
        self.downloads
            .iter()
            .find(|(path, version)| path == module && version != requested)
            .map(|(_, version)| version.as_str())
    }
}

/// Fetches a module into the shared cache.
///
/// Implementations receive the canonical path, i.e. the output of the rule
/// engine, never the path the client asked for.
pub trait Resolver: Send + Sync {
    fn resolve(&self, module: &str, version: &str) -> Result<ResolutionOutcome, ResolveError>;
}

/// Resolves modules by running `go get -d <module>@<version>`.
///
/// The child inherits this process's environment and working directory, so
/// `GOPATH`, `GOPROXY`, `GOPRIVATE` and friends apply as usual.
#[derive(Debug, Clone)]
pub struct GoCommand {
    program: String,
}

impl GoCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for GoCommand {
    fn default() -> Self {
        Self::new("go")
    }
}

impl Resolver for GoCommand {
    fn resolve(&self, module: &str, version: &str) -> Result<ResolutionOutcome, ResolveError> {
        let target = format!("{module}@{version}");
        debug!(program = %self.program, %target, "running resolution engine");
        // output() drains both pipes before waiting on the child
        let output = Command::new(&self.program)
            .args(["get", "-d", &target])
            .output()
            .map_err(|source| ResolveError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            error!(%target, %stdout, %stderr, "download failed");
            return Err(ResolveError::Failed {
                target,
                status: output.status,
                stdout,
                stderr,
            });
        }
        Ok(parse_downloads(&stderr))
    }
}

/// Picks `go: downloading <path> <version>` lines out of the engine's stderr.
///
/// Only lines of exactly four whitespace-separated fields with `downloading`
/// in second place count; everything else is progress noise.
pub fn parse_downloads(stderr: &str) -> ResolutionOutcome {
    let downloads = stderr
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [_, "downloading", path, version] => Some((path.to_string(), version.to_string())),
                _ => None,
            }
        })
        .collect();
    ResolutionOutcome { downloads }
}
