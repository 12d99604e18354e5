//! Operation context threaded through every invocation.

use tokio_util::sync::CancellationToken;

/// Cancellation channel for one logical operation.
///
/// The context is the sole way an invocation is cancelled or timed out: the
/// invocation engine checks it before dispatching, and long-running plugin
/// calls receive a clone so they can return promptly once cancellation is
/// signalled.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancel: CancellationToken,
}

impl OpContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every holder of this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Derive a child context that is cancelled whenever `self` is, but can
    /// also be cancelled independently.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_propagates_to_clones() {
        let ctx = OpContext::new();
        let seen_by_callee = ctx.clone();
        assert!(!seen_by_callee.is_cancelled());

        ctx.cancel();
        assert!(seen_by_callee.is_cancelled());
    }

    #[test]
    fn test_child_cancellation_is_independent() {
        let parent = OpContext::new();
        let child = parent.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let second = parent.child();
        parent.cancel();
        assert!(second.is_cancelled());
    }
}
