//! Error and diagnostic system for the Quire parser.
//!
//! Diagnostics carry a severity, an error code, labeled spans, help text and
//! notes. Fatal diagnostics abort the pipeline and are returned inside a
//! [`ParseError`]; warnings are gathered by a collector and handed back with
//! the finished document.
//!
//! # Example
//!
//! ```
//! # use quire_parser::error::{Diagnostic, ErrorCode};
//! # use quire_parser::Span;
//!
//! let diag = Diagnostic::warning("footnote `disclaimer` is redefined")
//!     .with_code(ErrorCode::E301)
//!     .with_label(Span::new(100..140), "content ignored")
//!     .with_secondary_label(Span::new(20..60), "first defined here")
//!     .with_help("reference the footnote with `footnote:disclaimer[]`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
