//! The plugin launcher boundary.
//!
//! Plugins run as isolated, separately-lifecycled processes. The orchestrator
//! only sees this boundary: enumerate what is available, start one instance,
//! and hold a shutdown handle that releases everything the instance owns.
//! The engine never assumes in-process call semantics; a transport-level
//! failure surfaces exactly like a local error.

use std::collections::HashMap;
use std::fmt;

use convoy_sdk::component::{ComponentInfo, Kind};
use convoy_sdk::dynfunc::DynFunc;

/// Errors surfaced by a [`Launcher`].
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("no {kind} plugin named '{name}' is registered")]
    UnknownPlugin { kind: Kind, name: String },

    #[error("failed to spawn {kind} plugin '{name}'")]
    Spawn {
        kind: Kind,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("handshake with {kind} plugin '{name}' failed")]
    Handshake {
        kind: Kind,
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Cleanup callback releasing every resource of one started plugin instance:
/// its process, its connections, anything it holds open.
///
/// Safe to invoke more than once; invocations after the first are no-ops.
pub struct ShutdownHandle {
    cleanup: Option<Box<dyn FnOnce() -> anyhow::Result<()> + Send>>,
}

impl ShutdownHandle {
    pub fn new(cleanup: impl FnOnce() -> anyhow::Result<()> + Send + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { cleanup: None }
    }

    /// Invoke the cleanup if it has not run yet.
    pub fn close(&mut self) -> anyhow::Result<()> {
        match self.cleanup.take() {
            Some(cleanup) => cleanup(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.cleanup.is_some() {
            "pending"
        } else {
            "closed"
        };
        write!(f, "ShutdownHandle({state})")
    }
}

/// One successfully started plugin instance.
pub struct StartedPlugin {
    pub info: ComponentInfo,
    /// Labels the loader resolved for this instance, not yet merged with
    /// ancestor scopes.
    pub labels: HashMap<String, String>,
    /// Converters the plugin exports into the chain.
    pub converters: Vec<DynFunc>,
    /// Operations the plugin exposes, keyed by operation name.
    pub operations: HashMap<String, DynFunc>,
    pub shutdown: ShutdownHandle,
}

/// Boundary to the subsystem that spawns and tracks plugin processes.
///
/// `start` blocks until the plugin process is ready, and either fully
/// succeeds (process running, handle valid) or fails cleanly with no
/// dangling process.
pub trait Launcher: Send + Sync {
    /// Names of the available plugins of `kind`, in a stable order for the
    /// duration of one App construction.
    fn registered(&self, kind: Kind) -> Vec<String>;

    /// Start one plugin instance.
    fn start(&self, kind: Kind, name: &str) -> Result<StartedPlugin, PluginError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_shutdown_handle_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let mut handle = ShutdownHandle::new(move || {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        handle.close().unwrap();
        handle.close().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shutdown_handle_reports_failure_once_then_noops() {
        let mut handle = ShutdownHandle::new(|| anyhow::bail!("process already gone"));

        assert!(handle.close().is_err());
        assert!(handle.close().is_ok());
    }

    #[test]
    fn test_noop_handle_closes_cleanly() {
        let mut handle = ShutdownHandle::noop();
        assert!(handle.close().is_ok());
    }
}
