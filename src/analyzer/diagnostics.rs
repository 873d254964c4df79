//! Reporting of foreign keys that could not be resolved.

pub use crate::erd::UnresolvedReference;

/// Receives one warning per unresolved foreign key.
pub trait DiagnosticsSink {
    fn unresolved_reference(&mut self, warning: &UnresolvedReference);
}

/// Forwards warnings to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn unresolved_reference(&mut self, warning: &UnresolvedReference) {
        log::warn!("{warning}");
    }
}

impl DiagnosticsSink for Vec<UnresolvedReference> {
    fn unresolved_reference(&mut self, warning: &UnresolvedReference) {
        self.push(warning.clone());
    }
}
