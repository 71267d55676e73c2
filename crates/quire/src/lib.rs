//! Quire - assemble AsciiDoc-flavoured markup into a structured document.
//!
//! Parsing, semantic assembly and export for Quire documents. Source text is
//! parsed into a draft tree, then attributes, lists, footnotes and sections
//! are resolved into the read-only [`document::Document`] model.

pub mod config;

mod error;
pub mod export;

pub use quire_core::{attribute, document, element, inline, span};
pub use quire_parser::error::{Diagnostic, ParseError};

pub use error::QuireError;

use log::{debug, info, trace};

use quire_core::attribute::{AttributeValue, Attributes};
use quire_parser::{AssembleConfig, LineIndex};

use config::AppConfig;
use export::{Exporter, json::JsonExporter};

/// Builder for assembling and exporting Quire documents.
///
/// # Examples
///
/// ```rust
/// use quire::{DocumentBuilder, config::AppConfig};
///
/// let source = "= Notes\n:version: 2\n\nRelease {version}.\n";
///
/// let builder = DocumentBuilder::new(AppConfig::default());
/// let document = builder.parse(source)
///     .expect("Failed to parse");
/// assert_eq!(document.title().as_deref(), Some("Notes"));
///
/// let json = builder.render_json(&document, false)
///     .expect("Failed to render");
/// assert!(json.contains("Release 2."));
/// ```
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    config: AppConfig,
    overrides: Attributes,
}

impl DocumentBuilder {
    /// Create a new document builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            overrides: Attributes::new(),
        }
    }

    /// Add an attribute override on top of the configured ones.
    ///
    /// Overrides added here win over the `[attributes]` table of the
    /// configuration.
    ///
    /// ```rust
    /// use quire::DocumentBuilder;
    ///
    /// let document = DocumentBuilder::default()
    ///     .with_attribute("who", "world")
    ///     .parse("Hello {who}.")
    ///     .expect("Failed to parse");
    /// assert_eq!(document.elements().len(), 1);
    /// ```
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.overrides.insert(name, value);
        self
    }

    /// The assembly options derived from the configuration and overrides.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::Config`] if the configuration is invalid.
    pub fn assemble_config(&self) -> Result<AssembleConfig, QuireError> {
        let mut config = self.config.assemble_config().map_err(QuireError::Config)?;
        for (name, value) in self.overrides.iter() {
            config.overrides.insert(name, value.clone());
        }
        Ok(config)
    }

    /// Parse source text into an assembled document.
    ///
    /// Warnings are logged and discarded.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::Parse`] when assembly fails, carrying the
    /// source text for rendering.
    pub fn parse(&self, source: &str) -> Result<document::Document, QuireError> {
        self.parse_with_warnings(source).map(|(document, _)| document)
    }

    /// Parse source text, returning the warnings next to the document.
    ///
    /// # Errors
    ///
    /// See [`DocumentBuilder::parse`].
    pub fn parse_with_warnings(
        &self,
        source: &str,
    ) -> Result<(document::Document, Vec<Diagnostic>), QuireError> {
        info!("Parsing document");

        let config = self.assemble_config()?;
        let (document, warnings) = quire_parser::assemble_with_warnings(source, config)
            .map_err(|err| QuireError::new_parse_error(err, source))?;

        let index = LineIndex::new(source);
        for warning in &warnings {
            match warning.primary_span() {
                Some(span) => {
                    let position = index.position(span.start());
                    debug!(line = position.line, column = position.column; "{warning}");
                }
                None => debug!("{warning}"),
            }
        }

        debug!(warnings = warnings.len(); "Document parsed successfully");
        trace!(document:?; "Parsed document");

        Ok((document, warnings))
    }

    /// Render a document to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::Export`] if serialization fails.
    pub fn render_json(
        &self,
        document: &document::Document,
        pretty: bool,
    ) -> Result<String, QuireError> {
        let mut exporter = JsonExporter::new(Vec::new()).with_pretty(pretty);
        exporter.export_document(document)?;
        String::from_utf8(exporter.into_inner()).map_err(|err| QuireError::Export(Box::new(err)))
    }
}
