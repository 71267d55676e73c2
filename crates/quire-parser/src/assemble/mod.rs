//! Semantic assembly.
//!
//! Turns a [`DraftDocument`] into the final [`Document`]. Stages run in a
//! fixed order, each consuming the tree produced by the previous one:
//!
//! 1. **Attributes** - merge overrides, front matter and declarations
//! 2. **Substitute** - expand `{name}` references and re-parse changed text
//! 3. **Lists** - regroup flat list items into nested lists
//! 4. **Filter** - drop declarations, comments and blank lines
//! 5. **Footnotes** - number footnotes and resolve references
//! 6. **Sections** - nest blocks under headings and split off the preamble
//! 7. **Finalize** - place the table of contents and build the document

mod attributes;
mod filter;
mod finalize;
mod fold;
mod footnotes;
mod lists;
mod sections;
mod substitute;

use log::{debug, trace};

use quire_core::document::Document;

use crate::{
    config::AssembleConfig,
    draft::{DraftDocument, DraftParser},
    error::{DiagnosticCollector, Result},
};

use filter::BlockFilter;
use finalize::DocumentFinalizer;
use footnotes::FootnoteProcessor;
use lists::ListAssembler;
use sections::SectionBuilder;
use substitute::SubstitutionEngine;

/// Run every assembly stage over `draft`.
///
/// `parser` is the parser `draft` came from; substitution re-enters it for
/// changed text. Warnings go to `diagnostics`, fatal errors are returned.
pub(crate) fn run(
    draft: DraftDocument,
    config: &AssembleConfig,
    parser: &DraftParser,
    diagnostics: &mut DiagnosticCollector,
) -> Result<Document> {
    let mut attributes = attributes::resolve(&draft, &config.effective_overrides());
    let raw_title = draft
        .header
        .as_ref()
        .and_then(|_| attributes::document_title(&draft.blocks));
    let DraftDocument { header, blocks, .. } = draft;

    let blocks = SubstitutionEngine::new(
        &attributes,
        parser,
        config.drop_undefined_attributes,
        diagnostics,
    )
    .substitute(blocks)?;

    // A doctitle still equal to the raw heading was derived, not set.
    if let Some(raw_title) = raw_title {
        if attributes.text("doctitle") == Some(raw_title.as_str()) {
            if let Some(title) = attributes::document_title(&blocks) {
                trace!(doctitle = title.as_str(); "Document title after substitution");
                attributes.insert("doctitle", title);
            }
        }
    }

    let blocks = ListAssembler::new(config.max_nesting_depth).assemble(blocks)?;
    debug!(blocks = blocks.len(); "Assembled lists");

    let blocks = BlockFilter::new().filter(blocks)?;
    let (blocks, footnotes) = FootnoteProcessor::new(diagnostics).process(blocks)?;
    let outline =
        SectionBuilder::new(&attributes, config.max_nesting_depth, diagnostics).build(blocks)?;

    if !diagnostics.is_empty() {
        debug!(warnings = diagnostics.len(); "Assembly produced warnings");
    }

    DocumentFinalizer::new(attributes, header).finalize(outline, footnotes)
}
