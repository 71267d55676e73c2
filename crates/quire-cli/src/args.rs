//! Command-line argument definitions for the Quire CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, attribute overrides and logging verbosity.

use clap::Parser;

use quire::attribute::AttributeValue;

/// Command-line arguments for the Quire document assembler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input document
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output JSON file
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Attribute override, as `name=value`, `name` or `name!` to unset
    #[arg(short = 'a', long = "attribute", value_parser = parse_attribute)]
    pub attributes: Vec<(String, AttributeValue)>,

    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Parse a `-a` argument into an attribute name and value.
///
/// `name=value` sets text, a bare `name` sets an empty value and `name!`
/// unsets the attribute.
pub fn parse_attribute(arg: &str) -> Result<(String, AttributeValue), String> {
    let (name, value) = match arg.split_once('=') {
        Some((name, value)) => (name, AttributeValue::Text(value.to_string())),
        None => match arg.strip_suffix('!') {
            Some(name) => (name, AttributeValue::Absent),
            None => (arg, AttributeValue::Text(String::new())),
        },
    };

    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(format!("invalid attribute name `{name}`"));
    }
    Ok((name.to_string(), value))
}
