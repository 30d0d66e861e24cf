//! Logger handed to components instead of a process-wide sink.

/// Receives operator-facing diagnostics from a component.
pub trait Log {
    fn warn(&self, message: &str);
}

impl<L: Log + ?Sized> Log for &L {
    fn warn(&self, message: &str) {
        (**self).warn(message)
    }
}

/// Forwards to `tracing`, tagged with the owning component.
#[derive(Debug, Clone, Copy)]
pub struct TracingLog {
    component: &'static str,
}

impl TracingLog {
    pub const fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl Log for TracingLog {
    fn warn(&self, message: &str) {
        tracing::warn!(component = self.component, "{}", message);
    }
}
