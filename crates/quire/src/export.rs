//! Export functionality for Quire documents.
//!
//! This module provides the [`Exporter`] trait that defines the interface for
//! writing an assembled [`Document`] in an output format. It is the final
//! stage in the Quire processing pipeline.
//!
//! # Pipeline Position
//!
//! ```text
//! Source Text
//!     ↓ draft parse
//! Draft Document
//!     ↓ assemble
//! Document
//!     ↓ export (this module)
//! Output
//! ```
//!
//! # Available Backends
//!
//! - [`json`]: JSON output via [`json::JsonExporter`]
//!
//! # Error Handling
//!
//! Export operations return [`Error`], covering rendering failures and I/O
//! errors. [`Error`] converts into [`QuireError::Export`] at the crate
//! boundary.
//!
//! [`QuireError::Export`]: crate::QuireError::Export

/// JSON export backend.
pub mod json;

use quire_core::document::Document;

/// Abstraction for document export backends.
///
/// Exporters only read the document; the assembled tree is never changed
/// after the pipeline returns it.
pub trait Exporter {
    /// Exports a document to the backend's output format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the document cannot be converted to the
    /// target format, or [`Error::Io`] if writing the output fails.
    fn export_document(&mut self, document: &Document) -> Result<(), Error>;
}

/// Errors that can occur during document export.
#[derive(Debug)]
pub enum Error {
    /// A rendering or conversion failure described by `message`.
    Render(String),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}
