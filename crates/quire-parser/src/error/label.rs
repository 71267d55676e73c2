//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// A labeled span in the source text.
///
/// - **Primary labels** mark the main location of an error or warning.
/// - **Secondary labels** provide context, such as "first defined here".
///
/// ```text
/// warning[E301]: footnote `disclaimer` is redefined
///   --> guide.adoc:12:20
///    |
/// 12 | Shipping.footnote:disclaimer[Other text.]
///    |          ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ content ignored
///    |
///   --> guide.adoc:4:15
///    |
///  4 | Prices vary.footnote:disclaimer[Opinions are my own.]
///    |             ------------------------------------------ first defined here
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    /// Get the span this label applies to.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Get the label message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a primary label.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Check if this is a secondary label.
    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}
