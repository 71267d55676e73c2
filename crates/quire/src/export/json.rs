//! JSON export.

use std::io::Write;

use log::{debug, info};

use quire_core::document::Document;

use super::{Error, Exporter};

/// Writes a [`Document`] as JSON.
///
/// # Examples
///
/// ```
/// # use quire::{DocumentBuilder, export::{Exporter, json::JsonExporter}};
/// let document = DocumentBuilder::default()
///     .parse("Hello.")
///     .expect("Failed to parse");
///
/// let mut output = Vec::new();
/// JsonExporter::new(&mut output)
///     .with_pretty(true)
///     .export_document(&document)
///     .expect("Failed to export");
/// assert!(output.starts_with(b"{\n"));
/// ```
#[derive(Debug)]
pub struct JsonExporter<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonExporter<W> {
    /// Create an exporter writing compact JSON to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
        }
    }

    /// Indent the output.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Consume the exporter and return the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Exporter for JsonExporter<W> {
    fn export_document(&mut self, document: &Document) -> Result<(), Error> {
        debug!(pretty = self.pretty; "Serializing document to JSON");
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, document)
        } else {
            serde_json::to_writer(&mut self.writer, document)
        };
        result.map_err(|err| {
            if err.is_io() {
                Error::Io(err.into())
            } else {
                Error::Render(err.to_string())
            }
        })?;
        writeln!(self.writer).map_err(Error::Io)?;
        self.writer.flush().map_err(Error::Io)?;
        info!("Document exported as JSON");
        Ok(())
    }
}
