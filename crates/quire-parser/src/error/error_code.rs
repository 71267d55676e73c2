//! Error codes for the Quire diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Grammar errors
//! - `E1xx` - Substitution errors
//! - `E2xx` - Structural limits
//! - `E3xx` - Assembly warnings

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Grammar Errors (E0xx)
    // =========================================================================
    /// Unterminated delimited block.
    ///
    /// A delimited block was opened but its closing delimiter line never
    /// appeared before the end of the enclosing content.
    E001,

    /// Invalid front matter.
    ///
    /// The leading `---` block does not contain a YAML mapping.
    E002,

    /// Unterminated front matter.
    ///
    /// The leading `---` block has no closing `---` line.
    E003,

    // =========================================================================
    // Substitution Errors (E1xx)
    // =========================================================================
    /// Substitution cycle.
    ///
    /// An attribute value references itself, directly or through other
    /// attributes.
    E100,

    /// Re-parse failure.
    ///
    /// Text produced by attribute substitution could not be parsed again.
    E101,

    /// Expansion too large.
    ///
    /// Attribute substitution produced more text than one document may
    /// expand to, typically through values that repeat other references.
    E102,

    // =========================================================================
    // Structural Limits (E2xx)
    // =========================================================================
    /// Nesting too deep.
    ///
    /// Quoted text, delimited blocks, lists or sections are nested deeper than
    /// the configured maximum.
    E200,

    // =========================================================================
    // Assembly Warnings (E3xx)
    // =========================================================================
    /// Unresolved attribute reference.
    ///
    /// A `{name}` reference names an attribute that is not set.
    E300,

    /// Footnote label redefined.
    ///
    /// A labeled footnote was given new content after its first definition.
    E301,

    /// Dangling footnote reference.
    ///
    /// A footnote reference names a label that was never defined.
    E302,

    /// Heading level jump.
    ///
    /// A section heading is more than one level deeper than its parent.
    E303,

    /// Level-0 section outside a book.
    ///
    /// Only book documents may contain more than one level-0 section.
    E304,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Grammar errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            // Substitution errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            // Structural limits
            ErrorCode::E200 => "E200",
            // Assembly warnings
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Grammar errors
            ErrorCode::E001 => "unterminated delimited block",
            ErrorCode::E002 => "invalid front matter",
            ErrorCode::E003 => "unterminated front matter",
            // Substitution errors
            ErrorCode::E100 => "substitution cycle",
            ErrorCode::E101 => "re-parse of substituted text failed",
            ErrorCode::E102 => "attribute expansion too large",
            // Structural limits
            ErrorCode::E200 => "nesting too deep",
            // Assembly warnings
            ErrorCode::E300 => "unresolved attribute reference",
            ErrorCode::E301 => "footnote label redefined",
            ErrorCode::E302 => "dangling footnote reference",
            ErrorCode::E303 => "heading level jump",
            ErrorCode::E304 => "level-0 section outside a book",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
