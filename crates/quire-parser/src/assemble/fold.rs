//! Fold-based tree rewriting.
//!
//! Every rewriting stage implements [`Folder`]. Each method consumes a node
//! and returns its replacement; the defaults rebuild the node unchanged
//! after folding its children. Overriding methods that still need the
//! default descent call the matching `walk_*` function.

use quire_core::element::{
    BlockAttributes, DelimitedBlock, DelimitedContent, Element, ImageBlock, List, ListItem,
    Paragraph, Preamble, Section, Table, TableRow,
};
use quire_core::inline::InlineContent;

use crate::error::Result;

pub(crate) trait Folder {
    fn fold_elements(&mut self, elements: Vec<Element>) -> Result<Vec<Element>> {
        elements
            .into_iter()
            .map(|element| self.fold_element(element))
            .collect()
    }

    fn fold_element(&mut self, element: Element) -> Result<Element> {
        walk_element(self, element)
    }

    fn fold_paragraph(&mut self, paragraph: Paragraph) -> Result<Paragraph> {
        Ok(Paragraph {
            attributes: self.fold_block_attributes(paragraph.attributes)?,
            content: self.fold_inline_content(paragraph.content)?,
            span: paragraph.span,
        })
    }

    fn fold_list(&mut self, list: List) -> Result<List> {
        Ok(List {
            kind: list.kind,
            attributes: self.fold_block_attributes(list.attributes)?,
            items: list
                .items
                .into_iter()
                .map(|item| self.fold_list_item(item))
                .collect::<Result<_>>()?,
        })
    }

    fn fold_list_item(&mut self, item: ListItem) -> Result<ListItem> {
        let attributes = self.fold_block_attributes(item.attributes)?;
        let term = item
            .term
            .map(|term| self.fold_inline_content(term))
            .transpose()?;
        Ok(ListItem {
            attributes,
            term,
            elements: self.fold_elements(item.elements)?,
            ..item
        })
    }

    fn fold_delimited_block(&mut self, block: DelimitedBlock) -> Result<DelimitedBlock> {
        let attributes = self.fold_block_attributes(block.attributes)?;
        let content = match block.content {
            DelimitedContent::Blocks(blocks) => {
                DelimitedContent::Blocks(self.fold_elements(blocks)?)
            }
            verbatim @ DelimitedContent::Verbatim(_) => verbatim,
        };
        Ok(DelimitedBlock {
            attributes,
            content,
            ..block
        })
    }

    fn fold_section(&mut self, section: Section) -> Result<Section> {
        let attributes = self.fold_block_attributes(section.attributes)?;
        let title = self.fold_inline_content(section.title)?;
        Ok(Section {
            attributes,
            title,
            elements: self.fold_elements(section.elements)?,
            ..section
        })
    }

    fn fold_table(&mut self, table: Table) -> Result<Table> {
        let attributes = self.fold_block_attributes(table.attributes)?;
        let header = table
            .header
            .map(|row| self.fold_table_row(row))
            .transpose()?;
        let rows = table
            .rows
            .into_iter()
            .map(|row| self.fold_table_row(row))
            .collect::<Result<_>>()?;
        Ok(Table {
            attributes,
            header,
            rows,
            span: table.span,
        })
    }

    fn fold_table_row(&mut self, row: TableRow) -> Result<TableRow> {
        Ok(TableRow {
            cells: row
                .cells
                .into_iter()
                .map(|cell| self.fold_inline_content(cell))
                .collect::<Result<_>>()?,
        })
    }

    fn fold_image(&mut self, image: ImageBlock) -> Result<ImageBlock> {
        Ok(ImageBlock {
            attributes: self.fold_block_attributes(image.attributes)?,
            ..image
        })
    }

    /// Block titles are the only text-bearing part of block attributes.
    fn fold_block_attributes(&mut self, attributes: BlockAttributes) -> Result<BlockAttributes> {
        let title = attributes
            .title
            .map(|title| self.fold_inline_content(title))
            .transpose()?;
        Ok(BlockAttributes {
            title,
            ..attributes
        })
    }

    fn fold_inline_content(&mut self, content: InlineContent) -> Result<InlineContent> {
        Ok(content)
    }
}

/// Default descent into an element.
pub(crate) fn walk_element<F: Folder + ?Sized>(
    folder: &mut F,
    element: Element,
) -> Result<Element> {
    Ok(match element {
        Element::Paragraph(paragraph) => Element::Paragraph(folder.fold_paragraph(paragraph)?),
        Element::ListItem(item) => Element::ListItem(folder.fold_list_item(item)?),
        Element::List(list) => Element::List(folder.fold_list(list)?),
        Element::DelimitedBlock(block) => {
            Element::DelimitedBlock(folder.fold_delimited_block(block)?)
        }
        Element::Section(section) => Element::Section(folder.fold_section(section)?),
        Element::Preamble(preamble) => Element::Preamble(Preamble {
            elements: folder.fold_elements(preamble.elements)?,
        }),
        Element::Table(table) => Element::Table(folder.fold_table(table)?),
        Element::Image(image) => Element::Image(folder.fold_image(image)?),
        Element::ListContinuation(inner) => {
            Element::ListContinuation(Box::new(folder.fold_element(*inner)?))
        }
        leaf @ (Element::ThematicBreak
        | Element::PageBreak
        | Element::BlankLine
        | Element::AttributeDeclaration(_)
        | Element::Comment(_)
        | Element::TableOfContentsMacro
        | Element::TableOfContents) => leaf,
    })
}

#[cfg(test)]
mod tests {
    use quire_core::{inline::InlineElement, span::Span};

    use super::*;

    /// Upper-cases every inline text it sees and counts visits.
    struct Shout {
        visited: usize,
    }

    impl Folder for Shout {
        fn fold_inline_content(&mut self, content: InlineContent) -> Result<InlineContent> {
            self.visited += 1;
            let raw = content.raw.to_uppercase();
            Ok(InlineContent::new(
                raw.clone(),
                vec![InlineElement::Text(raw)],
                content.span,
            ))
        }
    }

    fn text(raw: &str) -> InlineContent {
        InlineContent::new(raw, vec![InlineElement::text(raw)], Span::default())
    }

    #[test]
    fn test_identity_fold_preserves_tree() {
        struct Identity;
        impl Folder for Identity {}

        let elements = vec![
            Element::Paragraph(Paragraph {
                attributes: BlockAttributes::default(),
                content: text("hello"),
                span: Span::new(0..5),
            }),
            Element::BlankLine,
        ];
        let folded = Identity
            .fold_elements(elements.clone())
            .expect("identity fold");
        assert_eq!(folded, elements);
    }

    #[test]
    fn test_fold_reaches_nested_text() {
        let section = Element::Section(Section {
            level: 1,
            title: text("title"),
            id: None,
            attributes: BlockAttributes {
                title: Some(text("block title")),
                ..Default::default()
            },
            elements: vec![Element::DelimitedBlock(DelimitedBlock {
                kind: quire_core::element::DelimitedKind::Example,
                attributes: BlockAttributes::default(),
                content: DelimitedContent::Blocks(vec![Element::Paragraph(Paragraph {
                    attributes: BlockAttributes::default(),
                    content: text("inner"),
                    span: Span::default(),
                })]),
                span: Span::default(),
            })],
            span: Span::default(),
        });

        let mut shout = Shout { visited: 0 };
        let folded = shout.fold_element(section).expect("fold");
        assert_eq!(shout.visited, 3);

        let Element::Section(section) = folded else {
            panic!("Expected section");
        };
        assert_eq!(section.title.raw, "TITLE");
        let Element::DelimitedBlock(block) = &section.elements[0] else {
            panic!("Expected delimited block");
        };
        let DelimitedContent::Blocks(blocks) = &block.content else {
            panic!("Expected blocks");
        };
        assert!(matches!(&blocks[0], Element::Paragraph(p) if p.content.raw == "INNER"));
    }
}
