//! # Quire Parser
//!
//! Draft grammar and semantic assembly for Quire documents. This crate turns
//! AsciiDoc-flavoured source text into the [`quire_core`] document model.
//!
//! ## Usage
//!
//! ```
//! # use quire_parser::{assemble, AssembleConfig, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = "= Field Guide\n:product: Quire\n\n{product} keeps notes.\n\n== Setup\n";
//!
//!     let document = assemble(source, AssembleConfig::default())?;
//!     assert_eq!(document.title().as_deref(), Some("Field Guide"));
//!     Ok(())
//! }
//! ```

mod assemble;
mod config;
pub mod draft;
pub mod error;
mod span;

pub use config::{AssembleConfig, DEFAULT_MAX_NESTING_DEPTH, Doctype};
pub use span::{LineIndex, Position, Span};

use log::info;

use quire_core::document::Document;

use draft::{DraftOptions, DraftParser};
use error::{Diagnostic, DiagnosticCollector, ParseError};

/// Assemble source text into a document.
///
/// This is the main entry point. It runs the complete pipeline:
///
/// 1. **Draft** - parse front matter, blocks and inline markup
/// 2. **Assemble** - resolve attributes, substitute references, build
///    lists, footnotes and sections, and finalize the document
///
/// Warnings are logged and discarded; use [`assemble_with_warnings`] to
/// keep them.
///
/// # Errors
///
/// Returns a [`ParseError`] when the source cannot be parsed, an attribute
/// substitution cycles, substituted text fails to parse, or nesting exceeds
/// [`AssembleConfig::max_nesting_depth`].
///
/// # Example
///
/// ```
/// # use quire_parser::{assemble, AssembleConfig, error::ParseError};
///
/// fn main() -> Result<(), ParseError> {
///     let config = AssembleConfig::new().with_attribute("product", "Quire");
///     let document = assemble("Welcome to {product}.", config)?;
///     assert_eq!(document.elements().len(), 1);
///     Ok(())
/// }
/// ```
pub fn assemble(source: &str, config: AssembleConfig) -> Result<Document, ParseError> {
    assemble_with_warnings(source, config).map(|(document, _)| document)
}

/// Assemble source text into a document, returning warnings alongside it.
///
/// # Errors
///
/// See [`assemble`]. Warnings emitted before a fatal error are included in
/// the returned [`ParseError`] after the fatal diagnostic.
pub fn assemble_with_warnings(
    source: &str,
    config: AssembleConfig,
) -> Result<(Document, Vec<Diagnostic>), ParseError> {
    let parser = DraftParser::new(DraftOptions {
        max_nesting_depth: config.max_nesting_depth,
    });
    let mut diagnostics = DiagnosticCollector::new();

    let draft = match parser.parse(source) {
        Ok(draft) => draft,
        Err(fatal) => return Err(diagnostics.fail(fatal)),
    };
    let document = match assemble::run(draft, &config, &parser, &mut diagnostics) {
        Ok(document) => document,
        Err(fatal) => return Err(diagnostics.fail(fatal)),
    };

    let warnings = diagnostics.finish()?;
    info!(
        elements = document.elements().len(),
        footnotes = document.footnotes().len(),
        warnings = warnings.len();
        "Document assembled"
    );
    Ok((document, warnings))
}
