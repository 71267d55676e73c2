//! Inline nodes.
//!
//! Inline elements make up the text of paragraphs, titles, list items and
//! table cells. Text-bearing nodes keep both their raw source text and the
//! parsed inline tree in an [`InlineContent`] so that attribute substitution
//! can rewrite the raw text and re-derive the tree.

use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// Raw text together with its parsed inline structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InlineContent {
    /// Source text the elements were parsed from.
    pub raw: String,
    /// Parsed inline elements.
    pub elements: Vec<InlineElement>,
    /// Location of the raw text in the source.
    pub span: Span,
}

impl InlineContent {
    pub fn new(raw: impl Into<String>, elements: Vec<InlineElement>, span: Span) -> Self {
        Self {
            raw: raw.into(),
            elements,
            span,
        }
    }

    /// Plain text rendition of the elements, without markup.
    pub fn plain_text(&self) -> String {
        plain_text(&self.elements)
    }
}

/// Kind of quoted (formatted) text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotedKind {
    Bold,
    Italic,
    Monospace,
    Marked,
    Superscript,
    Subscript,
}

impl QuotedKind {
    /// The delimiter character for this kind of quoted text.
    pub fn delimiter(&self) -> char {
        match self {
            QuotedKind::Bold => '*',
            QuotedKind::Italic => '_',
            QuotedKind::Monospace => '`',
            QuotedKind::Marked => '#',
            QuotedKind::Superscript => '^',
            QuotedKind::Subscript => '~',
        }
    }

    /// Look up the quoted text kind for a delimiter character.
    pub fn from_delimiter(delimiter: char) -> Option<Self> {
        match delimiter {
            '*' => Some(QuotedKind::Bold),
            '_' => Some(QuotedKind::Italic),
            '`' => Some(QuotedKind::Monospace),
            '#' => Some(QuotedKind::Marked),
            '^' => Some(QuotedKind::Superscript),
            '~' => Some(QuotedKind::Subscript),
            _ => None,
        }
    }
}

/// Formatted text with nested inline content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotedText {
    pub kind: QuotedKind,
    pub elements: Vec<InlineElement>,
}

/// A hyperlink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub target: String,
    /// Link text; empty when the target itself is displayed.
    pub text: Vec<InlineElement>,
}

/// A reference to an element id within the document (`<<id,label>>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossReference {
    pub id: String,
    pub label: Option<String>,
}

/// An inline image (`image:target[alt]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineImage {
    pub target: String,
    pub alt: Option<String>,
}

/// An index term.
///
/// `((term))` stays visible in the text. `(((primary, secondary, tertiary)))`
/// is concealed: it only names index entries and renders as nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexTerm {
    /// Parsed visible term; empty when concealed.
    pub elements: Vec<InlineElement>,
    /// Primary, secondary and tertiary entries, most significant first.
    pub terms: Vec<String>,
    pub concealed: bool,
}

/// A footnote occurrence as written in the source (`footnote:label[content]`).
///
/// Only present in draft trees; the footnote pass replaces every occurrence
/// with a [`FootnoteReference`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FootnoteMacro {
    pub label: Option<String>,
    pub content: Vec<InlineElement>,
    pub span: Span,
}

/// Identifier assigned to a footnote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FootnoteId {
    /// Sequential identifier, starting at 1.
    Number(u32),
    /// Reference to a label that was never defined.
    Invalid,
}

impl FootnoteId {
    /// Returns the numeric identifier, or `None` for the invalid sentinel.
    pub fn number(&self) -> Option<u32> {
        match self {
            FootnoteId::Number(n) => Some(*n),
            FootnoteId::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, FootnoteId::Invalid)
    }
}

impl fmt::Display for FootnoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FootnoteId::Number(n) => write!(f, "{n}"),
            FootnoteId::Invalid => write!(f, "invalid"),
        }
    }
}

/// A footnote reference left in the tree after footnote processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FootnoteReference {
    pub id: FootnoteId,
    pub label: Option<String>,
    /// `true` when the reference reuses an earlier footnote.
    pub duplicate: bool,
}

/// An inline node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InlineElement {
    Text(String),
    Quoted(QuotedText),
    Link(Link),
    CrossReference(CrossReference),
    InlineImage(InlineImage),
    Passthrough(String),
    LineBreak,
    IndexTerm(IndexTerm),
    FootnoteMacro(FootnoteMacro),
    FootnoteReference(FootnoteReference),
}

impl InlineElement {
    /// Create a text element.
    pub fn text(content: impl Into<String>) -> Self {
        InlineElement::Text(content.into())
    }
}

/// Plain text rendition of inline elements, without markup.
///
/// Footnotes and concealed index terms are omitted; links fall back to their
/// target when they have no text.
pub fn plain_text(elements: &[InlineElement]) -> String {
    let mut out = String::new();
    push_plain_text(elements, &mut out);
    out
}

fn push_plain_text(elements: &[InlineElement], out: &mut String) {
    for element in elements {
        match element {
            InlineElement::Text(text) | InlineElement::Passthrough(text) => out.push_str(text),
            InlineElement::Quoted(quoted) => push_plain_text(&quoted.elements, out),
            InlineElement::Link(link) if link.text.is_empty() => out.push_str(&link.target),
            InlineElement::Link(link) => push_plain_text(&link.text, out),
            InlineElement::CrossReference(xref) => {
                out.push_str(xref.label.as_deref().unwrap_or(&xref.id))
            }
            InlineElement::InlineImage(image) => {
                out.push_str(image.alt.as_deref().unwrap_or_default())
            }
            InlineElement::LineBreak => out.push(' '),
            InlineElement::IndexTerm(term) => push_plain_text(&term.elements, out),
            InlineElement::FootnoteMacro(_) | InlineElement::FootnoteReference(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_flattens_markup() {
        let elements = vec![
            InlineElement::text("The "),
            InlineElement::Quoted(QuotedText {
                kind: QuotedKind::Bold,
                elements: vec![InlineElement::text("big")],
            }),
            InlineElement::text(" picture"),
            InlineElement::FootnoteReference(FootnoteReference {
                id: FootnoteId::Number(1),
                label: None,
                duplicate: false,
            }),
        ];
        assert_eq!(plain_text(&elements), "The big picture");
    }

    #[test]
    fn test_plain_text_of_index_terms() {
        let elements = vec![
            InlineElement::text("The "),
            InlineElement::IndexTerm(IndexTerm {
                elements: vec![InlineElement::text("parser")],
                terms: vec!["parser".into()],
                concealed: false,
            }),
            InlineElement::IndexTerm(IndexTerm {
                elements: Vec::new(),
                terms: vec!["grammar".into(), "inline".into()],
                concealed: true,
            }),
            InlineElement::text(" runs"),
        ];
        assert_eq!(plain_text(&elements), "The parser runs");
    }

    #[test]
    fn test_quoted_kind_delimiters_round_trip() {
        for kind in [
            QuotedKind::Bold,
            QuotedKind::Italic,
            QuotedKind::Monospace,
            QuotedKind::Marked,
            QuotedKind::Superscript,
            QuotedKind::Subscript,
        ] {
            assert_eq!(QuotedKind::from_delimiter(kind.delimiter()), Some(kind));
        }
        assert_eq!(QuotedKind::from_delimiter('x'), None);
    }

    #[test]
    fn test_footnote_id_sentinel() {
        assert_eq!(FootnoteId::Number(3).number(), Some(3));
        assert!(FootnoteId::Invalid.is_invalid());
        assert_eq!(FootnoteId::Invalid.to_string(), "invalid");
    }
}
