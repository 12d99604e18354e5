//! Convoy Core Library
//!
//! The application-scoped execution core of the convoy deployment
//! orchestrator: declarative project configuration, label merging, the
//! plugin launcher boundary, and the `Project`/`App` aggregates with their
//! dynamic capability invocation engine.

pub mod app;
pub mod config;
pub mod labels;
pub mod plugin;
pub mod project;
pub mod server;

/// Re-exports of commonly used types
pub mod prelude {
    // Aggregates
    pub use crate::app::{App, ComponentRecord, ConstructionError, InvokeError, LoadedComponent};
    pub use crate::project::{Project, ProjectBuilder};

    // Configuration
    pub use crate::config::{AppConfig, Hook, HookFailurePolicy, ProjectConfig};

    // Plugin boundary
    pub use crate::plugin::{Launcher, PluginError, ShutdownHandle, StartedPlugin};

    // Server boundary
    pub use crate::server::{AppRef, OperationRecord, ServerClient, WorkspaceRef};

    // SDK surface most callers need alongside the core
    pub use convoy_sdk::component::{JobInfo, Kind, LabelSet, Source};
    pub use convoy_sdk::context::OpContext;
    pub use convoy_sdk::dynfunc::{ArgPool, DynFunc, DynValue, IntoDynFunc};
    pub use convoy_sdk::terminal::{ConsoleUI, UI, UiHandle};
}
