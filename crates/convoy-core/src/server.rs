//! References and records crossing the server RPC boundary.
//!
//! The wire transport and persisted state live behind [`ServerClient`]; this
//! core only produces stable references and operation records for it.

use serde::{Deserialize, Serialize};

/// Stable reference to one application, usable in server calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppRef {
    pub project: String,
    pub application: String,
}

/// Reference to the workspace operations execute in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceRef {
    pub workspace: String,
}

impl WorkspaceRef {
    pub fn new(workspace: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
        }
    }
}

/// Result of one operation, recorded against an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Operation kind, e.g. "build" or "deploy".
    pub operation: String,
    pub success: bool,
    /// Operation-specific payload, opaque to this core.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

/// Client handle for server RPCs.
pub trait ServerClient: Send + Sync {
    fn record_operation(&self, app: &AppRef, record: OperationRecord) -> anyhow::Result<()>;
}

/// Stand-in client used when no server is configured, e.g. for purely local
/// operation. Records are dropped.
#[derive(Debug, Default)]
pub struct NullClient;

impl ServerClient for NullClient {
    fn record_operation(&self, _app: &AppRef, _record: OperationRecord) -> anyhow::Result<()> {
        Ok(())
    }
}
