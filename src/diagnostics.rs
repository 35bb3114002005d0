//! Diagnostics sink.
//!
//! The core never writes to a particular output device. It hands structured records
//! (severity, operation, subject, detail) to a [`Diagnostics`] implementation:
//!
//! - [`TracingDiagnostics`] forwards records to the `tracing` macros, with the operation and
//!   subject as structured fields
//! - [`NoDiagnostics`] discards everything
//! - [`Recorder`] keeps records in memory, which is what the tests inspect
//!
//! ```
//! use svgproj::diagnostics::{Diagnostics, Recorder, Severity};
//! use svgproj::diag_warn;
//!
//! let sink = Recorder::default();
//! diag_warn!(sink, "Scope::add", "coast", "overwriting {}", "style");
//! assert_eq!(sink.records()[0].severity, Severity::Warn);
//! ```

use std::cell::RefCell;
use std::fmt::Arguments;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// One diagnostic record.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub severity: Severity,
    pub operation: &'a str,
    pub subject: &'a str,
    pub detail: Arguments<'a>,
}

pub trait Diagnostics {
    fn record(&self, record: &Record<'_>);

    fn emit(&self, severity: Severity, operation: &str, subject: &str, detail: Arguments<'_>) {
        self.record(&Record {
            severity,
            operation,
            subject,
            detail,
        });
    }
}

#[macro_export]
macro_rules! diag_debug {
    ($sink:expr, $op:expr, $subject:expr, $($arg:tt)*) => {
        $sink.emit($crate::diagnostics::Severity::Debug, $op, $subject, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! diag_info {
    ($sink:expr, $op:expr, $subject:expr, $($arg:tt)*) => {
        $sink.emit($crate::diagnostics::Severity::Info, $op, $subject, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! diag_warn {
    ($sink:expr, $op:expr, $subject:expr, $($arg:tt)*) => {
        $sink.emit($crate::diagnostics::Severity::Warn, $op, $subject, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! diag_error {
    ($sink:expr, $op:expr, $subject:expr, $($arg:tt)*) => {
        $sink.emit($crate::diagnostics::Severity::Error, $op, $subject, format_args!($($arg)*))
    };
}

/// Forwards records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, r: &Record<'_>) {
        let (operation, subject) = (r.operation, r.subject);
        match r.severity {
            Severity::Debug => tracing::debug!(operation, subject, "{}", r.detail),
            Severity::Info => tracing::info!(operation, subject, "{}", r.detail),
            Severity::Warn => tracing::warn!(operation, subject, "{}", r.detail),
            Severity::Error => tracing::error!(operation, subject, "{}", r.detail),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {
    #[inline]
    fn record(&self, _record: &Record<'_>) {}
}

/// An owned copy of a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub severity: Severity,
    pub operation: String,
    pub subject: String,
    pub detail: String,
}

/// Keeps every record it receives.
#[derive(Debug, Default)]
pub struct Recorder {
    records: RefCell<Vec<Recorded>>,
}

impl Recorder {
    pub fn records(&self) -> Vec<Recorded> {
        self.records.borrow().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.severity == severity)
            .count()
    }
}

impl Diagnostics for Recorder {
    fn record(&self, r: &Record<'_>) {
        self.records.borrow_mut().push(Recorded {
            severity: r.severity,
            operation: r.operation.to_string(),
            subject: r.subject.to_string(),
            detail: r.detail.to_string(),
        });
    }
}
