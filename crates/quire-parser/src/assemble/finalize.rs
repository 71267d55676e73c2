//! Document finalization.
//!
//! Wraps the preamble, places the table-of-contents placeholder and builds
//! the [`Document`] root.

use log::debug;

use quire_core::{
    attribute::{AttributeValue, Attributes},
    document::{Document, Footnote, Header, TableOfContents},
    element::{Element, Preamble},
};

use crate::{
    assemble::{
        fold::{Folder, walk_element},
        sections::Outline,
    },
    draft::DraftHeader,
    error::Result,
};

/// Section depth of the table of contents when `toclevels` is not usable.
const DEFAULT_TOC_LEVELS: usize = 2;

/// Where the table-of-contents placeholder goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TocPlacement {
    /// First body element.
    Auto,
    /// End of the preamble.
    Preamble,
    /// Wherever `toc::[]` appears.
    Macro,
}

impl TocPlacement {
    /// Placement requested by the `toc` and `toc-placement` attributes, or
    /// `None` when no table of contents is wanted.
    fn from_attributes(attributes: &Attributes) -> Option<Self> {
        let value = match attributes.get("toc")? {
            AttributeValue::Absent | AttributeValue::Flag(false) => return None,
            AttributeValue::Text(text) => text.as_str(),
            AttributeValue::Flag(true) | AttributeValue::List(_) => "",
        };
        let placement = attributes
            .text("toc-placement")
            .filter(|placement| !placement.is_empty())
            .unwrap_or(value);
        Some(match placement {
            "preamble" => TocPlacement::Preamble,
            "macro" => TocPlacement::Macro,
            _ => TocPlacement::Auto,
        })
    }
}

/// Replaces or drops `toc::[]` macros at every depth.
struct TocMacros {
    replace: bool,
}

impl Folder for TocMacros {
    fn fold_elements(&mut self, elements: Vec<Element>) -> Result<Vec<Element>> {
        let mut out = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Element::TableOfContentsMacro if self.replace => out.push(Element::TableOfContents),
                Element::TableOfContentsMacro => {}
                other => out.push(walk_element(self, other)?),
            }
        }
        Ok(out)
    }
}

pub(crate) struct DocumentFinalizer {
    attributes: Attributes,
    header: Option<DraftHeader>,
}

impl DocumentFinalizer {
    pub(crate) fn new(attributes: Attributes, header: Option<DraftHeader>) -> Self {
        Self { attributes, header }
    }

    pub(crate) fn finalize(self, outline: Outline, footnotes: Vec<Footnote>) -> Result<Document> {
        let Outline {
            header: title,
            preamble,
            sections,
        } = outline;

        let header = title.map(|section| {
            let (authors, revision) = self
                .header
                .map(|header| (header.authors, header.revision))
                .unwrap_or_default();
            Header {
                title: section.title,
                id: section.id,
                authors,
                revision,
            }
        });

        let mut elements = Vec::with_capacity(sections.len() + 2);
        let wrap = header.is_some() && !sections.is_empty() && !preamble.is_empty();
        if wrap {
            elements.push(Element::Preamble(Preamble { elements: preamble }));
        } else {
            elements.extend(preamble);
        }
        elements.extend(sections);

        let placement = TocPlacement::from_attributes(&self.attributes);
        let mut elements = TocMacros {
            replace: placement == Some(TocPlacement::Macro),
        }
        .fold_elements(elements)?;

        match placement {
            Some(TocPlacement::Auto) => elements.insert(0, Element::TableOfContents),
            Some(TocPlacement::Preamble) => match elements.first_mut() {
                Some(Element::Preamble(preamble)) => {
                    preamble.elements.push(Element::TableOfContents)
                }
                _ => elements.insert(0, Element::TableOfContents),
            },
            Some(TocPlacement::Macro) | None => {}
        }

        let table_of_contents = placement.map(|_| {
            let levels = self
                .attributes
                .text("toclevels")
                .and_then(|levels| levels.trim().parse().ok())
                .unwrap_or(DEFAULT_TOC_LEVELS);
            TableOfContents::from_elements(&elements, levels)
        });

        debug!(
            header = header.is_some(),
            elements = elements.len(),
            footnotes = footnotes.len(),
            placement:? = placement;
            "Finalized document"
        );
        Ok(Document::new(
            header,
            self.attributes,
            elements,
            footnotes,
            table_of_contents,
        ))
    }
}
