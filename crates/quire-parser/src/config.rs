//! Options controlling document assembly.

use std::{fmt, str::FromStr};

use quire_core::attribute::{AttributeValue, Attributes};

/// Default bound on quoted text, block, list and section nesting.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Document type hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Doctype {
    #[default]
    Article,
    Book,
    Manpage,
    Inline,
}

impl Doctype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Doctype::Article => "article",
            Doctype::Book => "book",
            Doctype::Manpage => "manpage",
            Doctype::Inline => "inline",
        }
    }
}

impl fmt::Display for Doctype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Doctype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(Doctype::Article),
            "book" => Ok(Doctype::Book),
            "manpage" => Ok(Doctype::Manpage),
            "inline" => Ok(Doctype::Inline),
            other => Err(format!(
                "unknown doctype `{other}`, expected one of: article, book, manpage, inline"
            )),
        }
    }
}

/// Caller-supplied assembly options.
#[derive(Debug, Clone)]
pub struct AssembleConfig {
    /// Attribute overrides. These win over front matter and declarations.
    pub overrides: Attributes,
    /// Doctype hint, applied as the `doctype` override unless one is given.
    pub doctype: Option<Doctype>,
    /// Remove unresolved `{name}` references instead of keeping them.
    pub drop_undefined_attributes: bool,
    pub max_nesting_depth: usize,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            overrides: Attributes::new(),
            doctype: None,
            drop_undefined_attributes: false,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl AssembleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute override.
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.overrides.insert(name, value);
        self
    }

    pub fn with_doctype(mut self, doctype: Doctype) -> Self {
        self.doctype = Some(doctype);
        self
    }

    pub fn with_drop_undefined_attributes(mut self, drop: bool) -> Self {
        self.drop_undefined_attributes = drop;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Overrides with the doctype hint folded in.
    pub(crate) fn effective_overrides(&self) -> Attributes {
        let mut overrides = self.overrides.clone();
        if let Some(doctype) = self.doctype {
            overrides.insert_if_absent("doctype", doctype.as_str());
        }
        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctype_hint_does_not_replace_override() {
        let config = AssembleConfig::new()
            .with_attribute("doctype", "manpage")
            .with_doctype(Doctype::Book);
        assert_eq!(config.effective_overrides().text("doctype"), Some("manpage"));

        let config = AssembleConfig::new().with_doctype(Doctype::Book);
        assert_eq!(config.effective_overrides().text("doctype"), Some("book"));
    }

    #[test]
    fn test_doctype_from_str() {
        assert_eq!("book".parse::<Doctype>(), Ok(Doctype::Book));
        assert!("novel".parse::<Doctype>().is_err());
    }
}
