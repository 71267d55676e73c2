//! Configuration types for Quire document assembly.
//!
//! This module provides configuration structures that control how documents
//! are assembled. All types implement [`serde::Deserialize`] for loading from
//! external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration.
//! - [`ParserConfig`] - Doctype, undefined-reference policy and nesting limit.
//! - [`AttributeSetting`] - A configured attribute value.
//!
//! # Example
//!
//! ```
//! # use quire::config::AppConfig;
//! let config: AppConfig = toml::from_str(r#"
//!     [attributes]
//!     product = "Quire"
//!     toc = true
//!
//!     [parser]
//!     doctype = "book"
//! "#).expect("valid config");
//! assert_eq!(config.attributes().len(), 2);
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use quire_core::attribute::{AttributeValue, Attributes};
use quire_parser::{AssembleConfig, Doctype};

/// Top-level application configuration.
///
/// Groups attribute overrides and [`ParserConfig`] into a single
/// configuration root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Attribute overrides, applied ahead of front matter and declarations.
    #[serde(default)]
    attributes: BTreeMap<String, AttributeSetting>,

    /// Parser configuration section.
    #[serde(default)]
    parser: ParserConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from attribute overrides and parser settings.
    pub fn new(attributes: BTreeMap<String, AttributeSetting>, parser: ParserConfig) -> Self {
        Self { attributes, parser }
    }

    /// Returns the configured attribute overrides.
    pub fn attributes(&self) -> &BTreeMap<String, AttributeSetting> {
        &self.attributes
    }

    /// Returns the parser configuration.
    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// Build the options for one assembly run.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured doctype is unknown.
    pub fn assemble_config(&self) -> Result<AssembleConfig, String> {
        let overrides: Attributes = self
            .attributes
            .iter()
            .map(|(name, setting)| (name.as_str(), setting.to_value()))
            .collect();

        let mut config = AssembleConfig {
            overrides,
            ..AssembleConfig::default()
        }
        .with_drop_undefined_attributes(self.parser.drop_undefined_attributes);
        if let Some(doctype) = self.parser.doctype()? {
            config = config.with_doctype(doctype);
        }
        if let Some(depth) = self.parser.max_nesting_depth {
            config = config.with_max_nesting_depth(depth);
        }
        Ok(config)
    }
}

/// A configured attribute value.
///
/// TOML strings, booleans and string arrays map onto the matching
/// [`AttributeValue`] kinds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AttributeSetting {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl AttributeSetting {
    /// The attribute value this setting stands for.
    pub fn to_value(&self) -> AttributeValue {
        match self {
            AttributeSetting::Flag(flag) => AttributeValue::Flag(*flag),
            AttributeSetting::Text(text) => AttributeValue::Text(text.clone()),
            AttributeSetting::List(items) => AttributeValue::List(items.clone()),
        }
    }
}

/// Parser settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParserConfig {
    /// Doctype hint (`article`, `book`, `manpage` or `inline`).
    #[serde(default)]
    doctype: Option<String>,

    /// Remove unresolved `{name}` references instead of keeping them.
    #[serde(default)]
    drop_undefined_attributes: bool,

    /// Bound on markup, block, list and section nesting.
    #[serde(default)]
    max_nesting_depth: Option<usize>,
}

impl ParserConfig {
    /// Returns the parsed [`Doctype`], or `None` if no doctype is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured doctype is not a known value.
    pub fn doctype(&self) -> Result<Option<Doctype>, String> {
        self.doctype
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|err| format!("Invalid doctype in config: {err}"))
    }

    /// Returns `true` if unresolved references are removed.
    pub fn drop_undefined_attributes(&self) -> bool {
        self.drop_undefined_attributes
    }

    /// Returns the configured nesting limit, if any.
    pub fn max_nesting_depth(&self) -> Option<usize> {
        self.max_nesting_depth
    }
}

#[cfg(test)]
mod tests {
    use quire_parser::DEFAULT_MAX_NESTING_DEPTH;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default()
            .assemble_config()
            .expect("default config");
        assert!(config.overrides.is_empty());
        assert_eq!(config.doctype, None);
        assert_eq!(config.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
    }

    #[test]
    fn test_attribute_settings_map_to_values() {
        let config: AppConfig = toml::from_str(
            r#"
            [attributes]
            product = "Quire"
            toc = true
            tags = ["a", "b"]

            [parser]
            drop_undefined_attributes = true
            max_nesting_depth = 8
            "#,
        )
        .expect("valid config");

        let assemble = config.assemble_config().expect("assemble config");
        assert_eq!(assemble.overrides.text("product"), Some("Quire"));
        assert_eq!(assemble.overrides.get("toc"), Some(&AttributeValue::Flag(true)));
        assert_eq!(
            assemble.overrides.get("tags"),
            Some(&AttributeValue::List(vec!["a".into(), "b".into()]))
        );
        assert!(assemble.drop_undefined_attributes);
        assert_eq!(assemble.max_nesting_depth, 8);
    }

    #[test]
    fn test_invalid_doctype() {
        let config: AppConfig =
            toml::from_str("[parser]\ndoctype = \"novel\"\n").expect("valid toml");
        let err = config.assemble_config().unwrap_err();
        assert!(err.contains("novel"), "{err}");
    }
}
