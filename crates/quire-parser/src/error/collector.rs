//! Collector for accumulating diagnostics across pipeline stages.
//!
//! The [`DiagnosticCollector`] lets stages report warnings without aborting
//! and keeps them in emission order.

use log::warn;

use crate::error::{Diagnostic, ParseError};

/// A collector for accumulating diagnostics during assembly.
///
/// ```text
/// let mut collector = DiagnosticCollector::new();
///
/// collector.emit(
///     Diagnostic::warning("attribute `product` is not defined")
///         .with_code(ErrorCode::E300)
///         .with_label(span, "unresolved reference")
/// );
///
/// let warnings = collector.finish()?;
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    ///
    /// Warnings are also logged at `warn` level as they arrive.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        } else {
            warn!(code:? = diagnostic.code(); "{}", diagnostic.message());
        }
        self.diagnostics.push(diagnostic);
    }

    /// Number of diagnostics emitted so far.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Finish collection.
    ///
    /// - If any error was emitted, returns `Err(ParseError)` with all diagnostics.
    /// - Otherwise returns the collected warnings.
    pub fn finish(self) -> Result<Vec<Diagnostic>, ParseError> {
        if self.has_errors {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(self.diagnostics)
        }
    }

    /// Finish collection with a fatal diagnostic raised by a stage.
    ///
    /// The fatal diagnostic comes first; previously collected warnings follow.
    pub fn fail(self, fatal: Diagnostic) -> ParseError {
        let mut diagnostics = Vec::with_capacity(self.diagnostics.len() + 1);
        diagnostics.push(fatal);
        diagnostics.extend(self.diagnostics);
        ParseError::new(diagnostics)
    }
}
