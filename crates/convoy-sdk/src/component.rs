//! Shared component descriptors used across the plugin boundary.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Component kinds the orchestrator can load.
///
/// A kind is also a capability identity: the contract a value produced by a
/// dynamic invocation must satisfy. Functions declare the capabilities of
/// their output when they are registered, and the invocation engine validates
/// results by membership in that declared set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    /// Type converters consumed by the invocation engine.
    Mapper,
    /// Builds an artifact from application source.
    Builder,
    /// Pushes build artifacts to an artifact registry.
    Registry,
    /// Deploys artifacts onto a target platform.
    Platform,
    /// Manages releases of deployed artifacts.
    ReleaseManager,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Mapper => "mapper",
            Kind::Builder => "builder",
            Kind::Registry => "registry",
            Kind::Platform => "platform",
            Kind::ReleaseManager => "release-manager",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application source descriptor: name plus resolved source path.
///
/// The path is always absolute, derived from the project root and the
/// application's configured relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub app: String,
    pub path: PathBuf,
}

/// Ambient metadata about the job an operation executes under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: String,
    /// True when the job runs on the operator's machine rather than a runner.
    pub local: bool,
    pub workspace: String,
}

impl JobInfo {
    /// Metadata for a locally-executed job.
    pub fn local(workspace: impl Into<String>) -> Self {
        Self {
            id: "local".to_string(),
            local: true,
            workspace: workspace.into(),
        }
    }
}

/// A merged set of labels.
///
/// This is a newtype rather than a bare map so that merged labels are only
/// ever bound to invocation parameters that explicitly ask for labels: the
/// `LabelSet` type itself is the key the engine injects under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    pub labels: HashMap<String, String>,
}

impl LabelSet {
    pub fn new(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// Identity of one loaded plugin component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub kind: Kind,
    pub name: String,
    pub version: String,
}

impl fmt::Display for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}@{}", self.kind, self.name, self.version)
    }
}
