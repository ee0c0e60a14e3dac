//! Run-level diagnostics collection.
//!
//! Every stage of the engine reports row errors and reconciliation warnings
//! here instead of aborting. The collector is append-only and drained once
//! by the caller after the run; appends also emit the matching `tracing`
//! event so the structured log and the drained list never disagree.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info, warn};

/// Severity of a single diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Progress messages and other non-problems.
    General,
    /// Data was usable but inconsistent; a best-effort resolution applied.
    Warning,
    /// A row was unusable and dropped.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::General => write!(f, "[General]"),
            Severity::Warning => write!(f, "[Warning]"),
            Severity::Error => write!(f, "[Error]  "),
        }
    }
}

/// One diagnostic record: what happened, how bad it was, and which input
/// row triggered it (1-based, when known).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub row: Option<usize>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "{} Row {}: {}", self.severity, row, self.message),
            None => write!(f, "{} {}", self.severity, self.message),
        }
    }
}

/// Append-only diagnostics sink shared by all stages of a run.
///
/// The mutex makes concurrent appends safe; within one source the original
/// append order is preserved.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn general(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.push(Severity::General, message, None);
    }

    pub fn warning(&self, row: Option<usize>, message: impl Into<String>) {
        let message = message.into();
        warn!(row, "{message}");
        self.push(Severity::Warning, message, row);
    }

    pub fn error(&self, row: Option<usize>, message: impl Into<String>) {
        let message = message.into();
        error!(row, "{message}");
        self.push(Severity::Error, message, row);
    }

    fn push(&self, severity: Severity, message: String, row: Option<usize>) {
        self.entries
            .lock()
            .expect("diagnostics mutex poisoned")
            .push(Diagnostic {
                severity,
                message,
                row,
            });
    }

    /// Snapshot of everything collected so far, in append order.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .expect("diagnostics mutex poisoned")
            .clone()
    }

    pub fn warning_count(&self) -> usize {
        self.entries()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.entries()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}
