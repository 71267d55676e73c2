//! CLI logic for the Quire document assembler.
//!
//! This module contains the core CLI logic: load configuration, assemble the
//! input document and write it out as JSON.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, parse_attribute};

use std::fs;

use log::{info, warn};

use quire::{DocumentBuilder, QuireError};

use error_adapter::{DiagnosticAdapter, render};

/// Run the Quire CLI application
///
/// Processes the input file through the assembly pipeline and writes the
/// resulting document as JSON to the output file. Warnings are rendered
/// with their source snippets and logged.
///
/// # Errors
///
/// Returns `QuireError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parse and assembly errors
/// - Export errors
pub fn run(args: &Args) -> Result<(), QuireError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing document"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let builder = args
        .attributes
        .iter()
        .fold(DocumentBuilder::new(app_config), |builder, (name, value)| {
            builder.with_attribute(name.as_str(), value.clone())
        });
    let (document, warnings) = builder.parse_with_warnings(&source)?;
    for warning in &warnings {
        warn!("{}", render(&DiagnosticAdapter::new(warning, &source)));
    }

    let json = builder.render_json(&document, args.pretty)?;
    fs::write(&args.output, json)?;

    info!(output_file = args.output, warnings = warnings.len(); "JSON exported successfully");

    Ok(())
}
