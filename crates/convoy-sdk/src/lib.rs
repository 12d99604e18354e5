//! Convoy Plugin SDK
//!
//! Shared building blocks consumed on both sides of the plugin boundary:
//! component descriptors, scoped data directories, the terminal UI sink, and
//! the dynamic function machinery through which plugins export converters
//! and operations to the orchestrator.

pub mod component;
pub mod context;
pub mod datadir;
pub mod dynfunc;
pub mod terminal;

/// Re-exports of commonly used types
pub mod prelude {
    // Component descriptors
    pub use crate::component::{ComponentInfo, JobInfo, Kind, LabelSet, Source};

    // Operation context
    pub use crate::context::OpContext;

    // Data directories
    pub use crate::datadir::{AppDir, ComponentDir, ProjectDir};

    // Dynamic functions
    pub use crate::dynfunc::{ArgPool, DynFunc, DynValue, IntoDynFunc, ResolutionError};

    // Terminal
    pub use crate::terminal::{ConsoleUI, Status, StatusSink, UI, UiHandle};
}
