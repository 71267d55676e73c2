//! Draft grammar.
//!
//! The draft parser turns source text into a [`DraftDocument`]: optional
//! front matter, optional header lines and the flat sequence of block
//! elements, with text-bearing blocks already inline-parsed. The draft tree
//! is the input of the assembly pipeline; it still contains list items that
//! are not grouped into lists, attribute declarations, comments and blank
//! lines.
//!
//! The same parser is used to re-parse text after attribute substitution,
//! see [`DraftParser::parse_inlines`].

mod attrlist;
mod block;
mod front_matter;
pub(crate) mod header;
mod inline;

use log::debug;

use quire_core::{
    element::{AttributeDeclaration, DelimitedContent, Element},
    inline::InlineElement,
    span::Span,
};

use crate::{config::DEFAULT_MAX_NESTING_DEPTH, error::Diagnostic};

pub use block::DraftHeader;
pub use front_matter::FrontMatter;

/// Options for the draft parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftOptions {
    /// Bound on compound block and inline markup nesting.
    pub max_nesting_depth: usize,
}

impl Default for DraftOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Output of the draft parser.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftDocument {
    pub front_matter: Option<FrontMatter>,
    /// Author and revision lines, present when the document starts with a
    /// level-0 title.
    pub header: Option<DraftHeader>,
    pub blocks: Vec<Element>,
}

impl DraftDocument {
    /// Attribute declarations in document order, including those nested in
    /// compound blocks and list continuations.
    pub fn declarations(&self) -> Vec<&AttributeDeclaration> {
        let mut declarations = Vec::new();
        collect_declarations(&self.blocks, &mut declarations);
        declarations
    }
}

fn collect_declarations<'a>(elements: &'a [Element], out: &mut Vec<&'a AttributeDeclaration>) {
    for element in elements {
        match element {
            Element::AttributeDeclaration(declaration) => out.push(declaration),
            Element::DelimitedBlock(block) => {
                if let DelimitedContent::Blocks(blocks) = &block.content {
                    collect_declarations(blocks, out);
                }
            }
            Element::ListContinuation(inner) => {
                collect_declarations(std::slice::from_ref(inner.as_ref()), out)
            }
            _ => {}
        }
    }
}

/// Parser for the draft grammar.
#[derive(Debug, Clone, Default)]
pub struct DraftParser {
    options: DraftOptions,
}

impl DraftParser {
    pub fn new(options: DraftOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DraftOptions {
        &self.options
    }

    /// Parse a complete document.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`Diagnostic`] for unterminated delimited blocks or
    /// front matter, invalid front matter, and nesting beyond
    /// [`DraftOptions::max_nesting_depth`].
    pub fn parse(&self, source: &str) -> Result<DraftDocument, Diagnostic> {
        let (front_matter, body_start) = front_matter::split(source)?;
        let parser = block::BlockParser::new(source, body_start, self.options.max_nesting_depth);
        let (header, blocks) = parser.parse()?;
        debug!(
            blocks = blocks.len(),
            front_matter = front_matter.is_some(),
            header = header.is_some();
            "Parsed draft document"
        );
        Ok(DraftDocument {
            front_matter,
            header,
            blocks,
        })
    }

    /// Parse a text fragment into inline elements.
    ///
    /// `span` locates the fragment in the original source; element spans
    /// are reported relative to its start.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`Diagnostic`] when inline markup nests beyond
    /// [`DraftOptions::max_nesting_depth`].
    pub fn parse_inlines(&self, text: &str, span: Span) -> Result<Vec<InlineElement>, Diagnostic> {
        inline::parse_inlines(text, span.start(), self.options.max_nesting_depth)
    }
}

#[cfg(test)]
mod tests {
    use quire_core::{
        attribute::AttributeValue,
        element::{Checkbox, DelimitedKind, ListKind},
        inline::QuotedKind,
    };

    use super::*;
    use crate::error::ErrorCode;

    fn parse(source: &str) -> DraftDocument {
        DraftParser::default()
            .parse(source)
            .expect("Failed to parse")
    }

    fn non_blank(doc: &DraftDocument) -> Vec<&Element> {
        doc.blocks
            .iter()
            .filter(|element| !matches!(element, Element::BlankLine))
            .collect()
    }

    #[test]
    fn test_paragraphs_and_blank_lines() {
        let doc = parse("First line\nsecond line\n\nAnother *one*\n");
        assert_eq!(doc.blocks.len(), 3);
        assert!(matches!(doc.blocks[1], Element::BlankLine));

        let Element::Paragraph(first) = &doc.blocks[0] else {
            panic!("Expected paragraph, got {:?}", doc.blocks[0]);
        };
        assert_eq!(first.content.raw, "First line\nsecond line");
        assert_eq!(first.span, Span::new(0..22));

        let Element::Paragraph(second) = &doc.blocks[2] else {
            panic!("Expected paragraph");
        };
        assert!(matches!(
            &second.content.elements[1],
            InlineElement::Quoted(q) if q.kind == QuotedKind::Bold
        ));
    }

    #[test]
    fn test_header_with_author_and_revision() {
        let doc = parse(
            "= The Guide\nAda Lovelace <ada@example.org>\n\
             v2.0, 2024-05-01: Rewrite\n:toc:\n\nBody\n",
        );
        let header = doc.header.as_ref().expect("header");
        assert_eq!(header.authors.len(), 1);
        assert_eq!(header.authors[0].email.as_deref(), Some("ada@example.org"));
        let revision = header.revision.as_ref().expect("revision");
        assert_eq!(revision.number.as_deref(), Some("2.0"));

        let blocks = non_blank(&doc);
        assert!(matches!(blocks[0], Element::Section(s) if s.level == 0));
        assert!(matches!(blocks[1], Element::AttributeDeclaration(d) if d.name == "toc"));
        assert!(matches!(blocks[2], Element::Paragraph(_)));
    }

    #[test]
    fn test_level_zero_after_content_is_not_a_header() {
        let doc = parse("Intro\n\n= Part\nNot an author\n");
        assert!(doc.header.is_none());
    }

    #[test]
    fn test_attribute_declarations() {
        let doc = parse(":product: Quire\n:!draft:\n:edition@: 2\n:long: first \\\nsecond\n");
        let declarations = doc.declarations();
        assert_eq!(declarations.len(), 4);
        assert_eq!(declarations[0].value, AttributeValue::from("Quire"));
        assert_eq!(declarations[1].value, AttributeValue::Absent);
        assert!(declarations[2].unlocked);
        assert_eq!(declarations[3].value, AttributeValue::from("first second"));
    }

    #[test]
    fn test_declarations_inside_compound_blocks() {
        let doc = parse("====\n:inner: yes\n====\n");
        assert_eq!(doc.declarations().len(), 1);
    }

    #[test]
    fn test_block_attributes_apply_to_next_block() {
        let doc = parse("[[intro]]\n[quote#ignored.lead]\n.A title\n____\nQuoted\n____\n");
        let blocks = non_blank(&doc);
        assert_eq!(blocks.len(), 1);
        let Element::DelimitedBlock(block) = blocks[0] else {
            panic!("Expected delimited block");
        };
        assert_eq!(block.kind, DelimitedKind::Quote);
        assert_eq!(block.attributes.style.as_deref(), Some("quote"));
        assert_eq!(block.attributes.id.as_deref(), Some("ignored"));
        assert_eq!(block.attributes.roles, vec!["lead"]);
        assert_eq!(
            block.attributes.title.as_ref().map(|t| t.raw.as_str()),
            Some("A title")
        );
        let DelimitedContent::Blocks(inner) = &block.content else {
            panic!("Expected nested blocks");
        };
        assert!(matches!(inner[0], Element::Paragraph(_)));
    }

    #[test]
    fn test_verbatim_block_keeps_lines() {
        let doc = parse("[source,rust]\n----\nlet x = *y*;\n\n====\n----\n");
        let Element::DelimitedBlock(block) = &doc.blocks[0] else {
            panic!("Expected listing");
        };
        assert_eq!(block.kind, DelimitedKind::Listing);
        assert_eq!(
            block.content,
            DelimitedContent::Verbatim(vec![
                "let x = *y*;".to_string(),
                String::new(),
                "====".to_string()
            ])
        );
    }

    #[test]
    fn test_compound_block_skips_nested_verbatim() {
        let doc = parse("====\n----\n====\n----\n====\n");
        assert_eq!(doc.blocks.len(), 1);
    }

    #[test]
    fn test_unterminated_block() {
        let err = DraftParser::default()
            .parse("Text\n\n----\ncode\n")
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E001));
        assert_eq!(err.message(), "unterminated listing block");
        assert_eq!(err.primary_span(), Some(Span::new(6..10)));
    }

    #[test]
    fn test_block_nesting_limit() {
        let source = "====\n=====\n======\ntext\n======\n=====\n====\n";
        let parser = DraftParser::new(DraftOptions {
            max_nesting_depth: 2,
        });
        let err = parser.parse(source).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E200));

        let parser = DraftParser::new(DraftOptions {
            max_nesting_depth: 3,
        });
        assert!(parser.parse(source).is_ok());
    }

    #[test]
    fn test_list_items_are_flat() {
        let doc = parse("* one\n** nested\ncontinued\n* [x] two\n. first\n");
        let kinds: Vec<_> = doc
            .blocks
            .iter()
            .map(|element| match element {
                Element::ListItem(item) => (item.kind, item.level, item.checkbox),
                other => panic!("Expected list item, got {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ListKind::Unordered, 1, Checkbox::None),
                (ListKind::Unordered, 2, Checkbox::None),
                (ListKind::Unordered, 1, Checkbox::Checked),
                (ListKind::Ordered, 1, Checkbox::None),
            ]
        );

        let Element::ListItem(nested) = &doc.blocks[1] else {
            unreachable!();
        };
        let Element::Paragraph(text) = &nested.elements[0] else {
            panic!("Expected principal text");
        };
        assert_eq!(text.content.raw, "nested\ncontinued");
    }

    #[test]
    fn test_labeled_item_with_term() {
        let doc = parse("CPU:: The *brain*\nRAM:::\nShort-term memory\n");
        let Element::ListItem(item) = &doc.blocks[0] else {
            panic!("Expected list item");
        };
        assert_eq!(item.kind, ListKind::Labeled);
        assert_eq!(item.term.as_ref().map(|t| t.raw.as_str()), Some("CPU"));

        let Element::ListItem(item) = &doc.blocks[1] else {
            panic!("Expected list item");
        };
        assert_eq!(item.level, 2);
        let Element::Paragraph(text) = &item.elements[0] else {
            panic!("Expected principal text");
        };
        assert_eq!(text.content.raw, "Short-term memory");
    }

    #[test]
    fn test_list_continuation() {
        let doc = parse("* item\n+\n----\ncode\n----\n");
        assert!(matches!(doc.blocks[0], Element::ListItem(_)));
        let Element::ListContinuation(inner) = &doc.blocks[1] else {
            panic!("Expected continuation, got {:?}", doc.blocks[1]);
        };
        assert!(matches!(inner.as_ref(), Element::DelimitedBlock(_)));
    }

    #[test]
    fn test_comments() {
        let doc = parse("// note\n////\nblock\ncomment\n////\n");
        assert!(matches!(&doc.blocks[0], Element::Comment(c) if !c.block));
        assert!(matches!(&doc.blocks[1], Element::Comment(c) if c.block && c.lines.len() == 2));
    }

    #[test]
    fn test_table_with_implicit_header() {
        let doc = parse("|===\n|Name |Value\n\n|a |1\n|b\n|2\n|===\n");
        let Element::Table(table) = &doc.blocks[0] else {
            panic!("Expected table");
        };
        let header = table.header.as_ref().expect("header row");
        assert_eq!(header.cells[0].raw, "Name");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].cells[1].raw, "2");
    }

    #[test]
    fn test_block_macros_and_breaks() {
        let doc = parse("toc::[]\n\nimage::diagram.png[A diagram,300]\n\n'''\n\n<<<\n");
        let blocks = non_blank(&doc);
        assert!(matches!(blocks[0], Element::TableOfContentsMacro));
        let Element::Image(image) = blocks[1] else {
            panic!("Expected image");
        };
        assert_eq!(image.target, "diagram.png");
        assert_eq!(image.alt.as_deref(), Some("A diagram"));
        assert!(matches!(blocks[2], Element::ThematicBreak));
        assert!(matches!(blocks[3], Element::PageBreak));
    }

    #[test]
    fn test_literal_paragraph() {
        let doc = parse("  indented\n    more\n");
        let Element::DelimitedBlock(block) = &doc.blocks[0] else {
            panic!("Expected literal block");
        };
        assert_eq!(block.kind, DelimitedKind::Literal);
        assert_eq!(
            block.content,
            DelimitedContent::Verbatim(vec!["indented".to_string(), "  more".to_string()])
        );
    }

    #[test]
    fn test_front_matter_offsets_spans() {
        let doc = parse("---\ntitle: Guide\n---\nBody\n");
        assert!(doc.front_matter.is_some());
        let Element::Paragraph(paragraph) = &doc.blocks[0] else {
            panic!("Expected paragraph");
        };
        assert_eq!(paragraph.span, Span::new(21..25));
    }

    #[test]
    fn test_parse_inlines_fragment() {
        let parser = DraftParser::default();
        let elements = parser
            .parse_inlines("see footnote:[x]", Span::new(40..56))
            .expect("Failed to parse");
        let InlineElement::FootnoteMacro(footnote) = &elements[1] else {
            panic!("Expected footnote, got {:?}", elements);
        };
        assert_eq!(footnote.span.start(), 44);
    }
}
