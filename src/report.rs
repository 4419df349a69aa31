//! Presentation callbacks.
//!
//! The core never talks to a console or UI directly: warnings and per-table
//! progress flow through [`Reporter`], and front ends decide how to surface
//! them. The default implementation forwards everything to `tracing`.

use tracing::{info, warn};

/// Signals emitted while exporting tables. All methods default to no-ops so
/// implementors pick what they surface.
pub trait Reporter: Sync {
    fn table_started(&self, _table: &str, _statements: usize) {}
    fn table_finished(&self, _table: &str, _kept: usize, _malformed: usize) {}
    fn warning(&self, _message: &str) {}
}

/// Forwards every signal to `tracing`.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn table_started(&self, table: &str, statements: usize) {
        info!(table, statements, "export started");
    }

    fn table_finished(&self, table: &str, kept: usize, malformed: usize) {
        info!(table, kept, malformed, "export finished");
    }

    fn warning(&self, message: &str) {
        warn!("{message}");
    }
}
