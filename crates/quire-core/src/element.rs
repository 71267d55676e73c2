//! Block-level nodes of the document tree.
//!
//! [`Element`] is a closed set over every block kind the grammar can
//! produce. A handful of variants only exist in draft trees (list items
//! before regrouping, attribute declarations, comments, blank lines, list
//! continuations and `toc::[]` macros); the assembly pipeline removes or
//! rewrites all of them before the document is finalized.

use indexmap::IndexMap;
use serde::Serialize;

use crate::{attribute::AttributeValue, inline::InlineContent, span::Span};

/// Attributes attached to a block by a preceding `[...]` line, an anchor or
/// a `.Title` line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockAttributes {
    /// First positional attribute, e.g. `source` in `[source,rust]`.
    pub style: Option<String>,
    pub id: Option<String>,
    pub roles: Vec<String>,
    pub options: Vec<String>,
    /// Positional attributes after the style.
    pub positional: Vec<String>,
    pub named: IndexMap<String, String>,
    pub title: Option<InlineContent>,
}

impl BlockAttributes {
    pub fn is_empty(&self) -> bool {
        self.style.is_none()
            && self.id.is_none()
            && self.roles.is_empty()
            && self.options.is_empty()
            && self.positional.is_empty()
            && self.named.is_empty()
            && self.title.is_none()
    }

    /// Returns `true` if the option (`%name` or `options=name`) is present.
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Merge `other` into `self`; values already present in `self` win.
    pub fn merge(&mut self, other: BlockAttributes) {
        if self.style.is_none() {
            self.style = other.style;
        }
        if self.id.is_none() {
            self.id = other.id;
        }
        if self.title.is_none() {
            self.title = other.title;
        }
        self.roles.extend(other.roles);
        self.options.extend(other.options);
        self.positional.extend(other.positional);
        for (name, value) in other.named {
            self.named.entry(name).or_insert(value);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paragraph {
    pub attributes: BlockAttributes,
    pub content: InlineContent,
    pub span: Span,
}

/// The family a list (or list item) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Unordered,
    Ordered,
    Labeled,
    QAndA,
    /// `<1>` items annotating the callout markers of a listing.
    Callout,
}

/// Checkbox state of a checklist item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkbox {
    #[default]
    None,
    Checked,
    Unchecked,
}

/// A list item.
///
/// In draft trees list items are flat block elements annotated with their
/// nesting `level`; list assembly moves them into [`List`] trees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub kind: ListKind,
    /// Nesting depth derived from the marker, starting at 1.
    pub level: usize,
    /// Marker as written (`**`, `.`, `1.`, `::`, ...).
    pub marker: String,
    /// Term of a labeled or Q&A item.
    pub term: Option<InlineContent>,
    pub checkbox: Checkbox,
    pub attributes: BlockAttributes,
    /// Principal text first, then attached blocks, then nested lists.
    pub elements: Vec<Element>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct List {
    pub kind: ListKind,
    pub attributes: BlockAttributes,
    pub items: Vec<ListItem>,
}

/// The kind of a delimited block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DelimitedKind {
    Listing,
    Literal,
    Passthrough,
    Example,
    Quote,
    Sidebar,
    Open,
}

impl DelimitedKind {
    /// Returns `true` if the block content is kept verbatim.
    pub fn is_verbatim(&self) -> bool {
        matches!(
            self,
            DelimitedKind::Listing | DelimitedKind::Literal | DelimitedKind::Passthrough
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DelimitedContent {
    /// Verbatim lines, no substitution or inline parsing.
    Verbatim(Vec<String>),
    /// Nested blocks.
    Blocks(Vec<Element>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelimitedBlock {
    pub kind: DelimitedKind,
    pub attributes: BlockAttributes,
    pub content: DelimitedContent,
    pub span: Span,
}

impl DelimitedBlock {
    /// Callout markers at the ends of verbatim lines, as
    /// `(line index, callout number)` pairs in source order.
    ///
    /// `<.>` markers are numbered after the highest number seen so far, so
    /// they pair with the `<.>` items of the callout list that follows.
    pub fn callouts(&self) -> Vec<(usize, u32)> {
        let DelimitedContent::Verbatim(lines) = &self.content else {
            return Vec::new();
        };
        let mut callouts = Vec::new();
        let mut last = 0;
        for (index, line) in lines.iter().enumerate() {
            let mut markers = Vec::new();
            let mut rest = line.trim_end();
            while let Some(open) = rest.rfind('<') {
                let number = match rest[open + 1..].strip_suffix('>') {
                    Some(".") => None,
                    Some(digits) if digits.bytes().all(|b| b.is_ascii_digit()) => {
                        match digits.parse::<u32>() {
                            Ok(number) => Some(number),
                            Err(_) => break,
                        }
                    }
                    _ => break,
                };
                markers.push(number);
                rest = rest[..open].trim_end();
            }
            for number in markers.into_iter().rev() {
                let number = number.unwrap_or(last + 1);
                last = last.max(number);
                callouts.push((index, number));
            }
        }
        callouts
    }
}

/// A section heading and, once assembled, the blocks it contains.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    /// 0 for the document title or a book part, 1..=5 for headings.
    pub level: usize,
    pub title: InlineContent,
    /// Explicit or generated id.
    pub id: Option<String>,
    pub attributes: BlockAttributes,
    pub elements: Vec<Element>,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Preamble {
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<InlineContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub attributes: BlockAttributes,
    pub header: Option<TableRow>,
    pub rows: Vec<TableRow>,
    pub span: Span,
}

/// A block image (`image::target[alt]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageBlock {
    pub attributes: BlockAttributes,
    pub target: String,
    pub alt: Option<String>,
    pub span: Span,
}

/// An attribute declaration (`:name: value`) or reset (`:name!:`).
///
/// Resets carry [`AttributeValue::Absent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeDeclaration {
    pub name: String,
    pub value: AttributeValue,
    /// Declared with the unlock marker (`:name@: value`).
    pub unlocked: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub lines: Vec<String>,
    /// `true` for a `////` comment block, `false` for a `//` line comment.
    pub block: bool,
}

/// A block-level node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Element {
    Paragraph(Paragraph),
    ListItem(ListItem),
    List(List),
    DelimitedBlock(DelimitedBlock),
    Section(Section),
    Preamble(Preamble),
    Table(Table),
    Image(ImageBlock),
    ThematicBreak,
    PageBreak,
    BlankLine,
    AttributeDeclaration(AttributeDeclaration),
    Comment(Comment),
    /// A block attached to the preceding list item with `+`.
    ListContinuation(Box<Element>),
    /// `toc::[]` block macro.
    TableOfContentsMacro,
    /// Table-of-contents placeholder, expanded by renderers.
    TableOfContents,
}

impl Element {
    /// Short name of the element kind, used in logs and diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Paragraph(_) => "paragraph",
            Element::ListItem(_) => "list item",
            Element::List(_) => "list",
            Element::DelimitedBlock(_) => "delimited block",
            Element::Section(_) => "section",
            Element::Preamble(_) => "preamble",
            Element::Table(_) => "table",
            Element::Image(_) => "image",
            Element::ThematicBreak => "thematic break",
            Element::PageBreak => "page break",
            Element::BlankLine => "blank line",
            Element::AttributeDeclaration(_) => "attribute declaration",
            Element::Comment(_) => "comment",
            Element::ListContinuation(_) => "list continuation",
            Element::TableOfContentsMacro => "toc macro",
            Element::TableOfContents => "table of contents",
        }
    }

    /// Source location of the element, for kinds that track one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Element::Paragraph(paragraph) => Some(paragraph.span),
            Element::ListItem(item) => Some(item.span),
            Element::List(list) => list
                .items
                .iter()
                .map(|item| item.span)
                .reduce(|acc, span| acc.union(span)),
            Element::DelimitedBlock(block) => Some(block.span),
            Element::Section(section) => Some(section.span),
            Element::Table(table) => Some(table.span),
            Element::Image(image) => Some(image.span),
            Element::AttributeDeclaration(declaration) => Some(declaration.span),
            Element::ListContinuation(inner) => inner.span(),
            _ => None,
        }
    }

    /// Returns `true` for kinds that only exist before assembly completes.
    pub fn is_draft_only(&self) -> bool {
        matches!(
            self,
            Element::ListItem(_)
                | Element::BlankLine
                | Element::AttributeDeclaration(_)
                | Element::Comment(_)
                | Element::ListContinuation(_)
                | Element::TableOfContentsMacro
        )
    }
}
