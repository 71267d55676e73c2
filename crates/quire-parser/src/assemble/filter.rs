//! Removal of blocks that only matter while parsing.

use log::debug;

use quire_core::element::Element;

use crate::{
    assemble::fold::{Folder, walk_element},
    error::Result,
};

/// Drops attribute declarations, comments and blank lines at every depth.
#[derive(Debug, Default)]
pub(crate) struct BlockFilter {
    removed: usize,
}

impl BlockFilter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn filter(mut self, elements: Vec<Element>) -> Result<Vec<Element>> {
        let elements = self.fold_elements(elements)?;
        debug!(removed = self.removed; "Filtered draft-only blocks");
        Ok(elements)
    }
}

fn is_removable(element: &Element) -> bool {
    matches!(
        element,
        Element::AttributeDeclaration(_) | Element::Comment(_) | Element::BlankLine
    )
}

impl Folder for BlockFilter {
    fn fold_elements(&mut self, elements: Vec<Element>) -> Result<Vec<Element>> {
        let before = elements.len();
        let kept: Vec<Element> = elements
            .into_iter()
            .filter(|element| !is_removable(element))
            .collect();
        self.removed += before - kept.len();
        kept.into_iter()
            .map(|element| self.fold_element(element))
            .collect()
    }

    fn fold_element(&mut self, element: Element) -> Result<Element> {
        match element {
            Element::ListContinuation(inner) => self.fold_element(*inner),
            other => walk_element(self, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use quire_core::element::{DelimitedContent, List};

    use super::*;
    use crate::{assemble::lists::ListAssembler, draft::DraftParser};

    fn filter(source: &str) -> Vec<Element> {
        let draft = DraftParser::default()
            .parse(source)
            .expect("Failed to parse");
        let elements = ListAssembler::new(64)
            .assemble(draft.blocks)
            .expect("Failed to assemble lists");
        BlockFilter::new().filter(elements).expect("Failed to filter")
    }

    #[test]
    fn test_removes_draft_only_blocks_in_order() {
        let elements = filter(":a: 1\n\nFirst\n\n// note\n////\nblock\n////\n:!a:\nSecond\n");
        let kinds: Vec<_> = elements.iter().map(Element::kind_name).collect();
        assert_eq!(kinds, vec!["paragraph", "paragraph"]);
    }

    #[test]
    fn test_recurses_into_compound_blocks() {
        let elements = filter("====\n:inner: value\n\n// note\nText\n====\n");
        let Element::DelimitedBlock(block) = &elements[0] else {
            panic!("Expected delimited block");
        };
        let DelimitedContent::Blocks(blocks) = &block.content else {
            panic!("Expected compound content");
        };
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks[0], Element::Paragraph(_)));
    }

    #[test]
    fn test_recurses_into_list_items() {
        let elements = filter("* one\n+\n--\n// hidden\ntext\n--\n");
        let Element::List(List { items, .. }) = &elements[0] else {
            panic!("Expected list");
        };
        let Element::DelimitedBlock(block) = &items[0].elements[1] else {
            panic!("Expected attached open block");
        };
        let DelimitedContent::Blocks(blocks) = &block.content else {
            panic!("Expected compound content");
        };
        assert_eq!(blocks.len(), 1);
        assert!(elements.iter().all(|element| !element.is_draft_only()));
    }
}
