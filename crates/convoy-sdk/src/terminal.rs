//! Terminal UI sink for operation output.

use std::sync::Arc;

/// Sink for user-facing operation output.
///
/// Consumers hold the sink behind an [`Arc`] so it can be shared across a
/// project, its apps, and every concurrent invocation.
pub trait UI: Send + Sync {
    /// Write a line of output attributed to the current operation.
    fn output(&self, message: &str);

    /// Open a status resource for a long-running step.
    fn status(&self) -> Status;
}

/// Shared handle to a [`UI`] implementation.
pub type UiHandle = Arc<dyn UI>;

/// Backing sink for one open [`Status`].
pub trait StatusSink: Send {
    fn update(&mut self, message: &str);
    fn close(&mut self);
}

/// A scoped status/progress resource.
///
/// The status is closed when dropped, so a `Status` held across a call is
/// released on every exit path. `close` may also be called explicitly;
/// closing more than once is a no-op.
pub struct Status {
    sink: Box<dyn StatusSink>,
    closed: bool,
}

impl Status {
    pub fn new(sink: Box<dyn StatusSink>) -> Self {
        Self {
            sink,
            closed: false,
        }
    }

    pub fn update(&mut self, message: &str) {
        if !self.closed {
            self.sink.update(message);
        }
    }

    pub fn close(mut self) {
        self.close_inner();
    }

    fn close_inner(&mut self) {
        if !self.closed {
            self.closed = true;
            self.sink.close();
        }
    }
}

impl Drop for Status {
    fn drop(&mut self) {
        self.close_inner();
    }
}

/// UI that writes to stdout.
#[derive(Debug, Default)]
pub struct ConsoleUI;

impl UI for ConsoleUI {
    fn output(&self, message: &str) {
        println!("{message}");
    }

    fn status(&self) -> Status {
        Status::new(Box::new(ConsoleStatus))
    }
}

struct ConsoleStatus;

impl StatusSink for ConsoleStatus {
    fn update(&mut self, message: &str) {
        println!("  ... {message}");
    }

    fn close(&mut self) {}
}
