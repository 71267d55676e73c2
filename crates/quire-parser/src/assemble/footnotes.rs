//! Footnote numbering.
//!
//! Walks the tree in document order and replaces every footnote macro with a
//! [`FootnoteReference`]. Footnotes with content get the next sequential id;
//! later references to the same label reuse it.

use std::collections::HashMap;

use log::{debug, trace};

use quire_core::{
    document::Footnote,
    element::Element,
    inline::{
        FootnoteId, FootnoteMacro, FootnoteReference, IndexTerm, InlineContent, InlineElement,
        Link, QuotedText,
    },
    span::Span,
};

use crate::{
    assemble::fold::Folder,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
};

pub(crate) struct FootnoteProcessor<'a> {
    diagnostics: &'a mut DiagnosticCollector,
    footnotes: Vec<Footnote>,
    /// Id and defining span of every labeled footnote seen so far.
    labels: HashMap<String, (u32, Span)>,
}

impl<'a> FootnoteProcessor<'a> {
    pub(crate) fn new(diagnostics: &'a mut DiagnosticCollector) -> Self {
        Self {
            diagnostics,
            footnotes: Vec::new(),
            labels: HashMap::new(),
        }
    }

    /// Number the footnotes of `elements`.
    ///
    /// Returns the rewritten tree and the defining footnotes in id order.
    pub(crate) fn process(
        mut self,
        elements: Vec<Element>,
    ) -> Result<(Vec<Element>, Vec<Footnote>)> {
        let elements = self.fold_elements(elements)?;
        debug!(footnotes = self.footnotes.len(); "Numbered footnotes");
        Ok((elements, self.footnotes))
    }

    fn rewrite(&mut self, elements: Vec<InlineElement>) -> Vec<InlineElement> {
        elements
            .into_iter()
            .map(|element| match element {
                InlineElement::FootnoteMacro(footnote) => {
                    InlineElement::FootnoteReference(self.reference(footnote))
                }
                InlineElement::Quoted(quoted) => InlineElement::Quoted(QuotedText {
                    kind: quoted.kind,
                    elements: self.rewrite(quoted.elements),
                }),
                InlineElement::Link(link) => InlineElement::Link(Link {
                    target: link.target,
                    text: self.rewrite(link.text),
                }),
                InlineElement::IndexTerm(term) => InlineElement::IndexTerm(IndexTerm {
                    elements: self.rewrite(term.elements),
                    ..term
                }),
                other => other,
            })
            .collect()
    }

    fn reference(&mut self, footnote: FootnoteMacro) -> FootnoteReference {
        let FootnoteMacro {
            label,
            content,
            span,
        } = footnote;
        let has_content = !content.is_empty();

        let known = label.as_ref().and_then(|label| self.labels.get(label)).copied();
        if let Some((id, defined_at)) = known {
            if has_content {
                self.redefined(label.as_deref().unwrap_or_default(), span, defined_at);
            }
            trace!(id = id; "Footnote reused");
            return FootnoteReference {
                id: FootnoteId::Number(id),
                label,
                duplicate: true,
            };
        }

        if !has_content {
            self.dangling(label.as_deref(), span);
            return FootnoteReference {
                id: FootnoteId::Invalid,
                label,
                duplicate: false,
            };
        }

        let id = self.next_id();
        if let Some(label) = &label {
            self.labels.insert(label.clone(), (id, span));
        }
        trace!(id = id; "Footnote defined");
        let index = self.footnotes.len();
        self.footnotes.push(Footnote {
            id,
            label: label.clone(),
            content: Vec::new(),
        });
        // Footnotes nested in the content are numbered after this one.
        self.footnotes[index].content = self.rewrite(content);
        FootnoteReference {
            id: FootnoteId::Number(id),
            label,
            duplicate: false,
        }
    }

    fn next_id(&self) -> u32 {
        self.footnotes
            .last()
            .map_or(1, |footnote| footnote.id.saturating_add(1))
    }

    fn redefined(&mut self, label: &str, span: Span, defined_at: Span) {
        self.diagnostics.emit(
            Diagnostic::warning(format!("footnote `{label}` is redefined"))
                .with_code(ErrorCode::E301)
                .with_label(span, "content ignored")
                .with_secondary_label(defined_at, "first defined here")
                .with_help(format!("reference the footnote with `footnote:{label}[]`")),
        );
    }

    fn dangling(&mut self, label: Option<&str>, span: Span) {
        let diagnostic = match label {
            Some(label) => Diagnostic::warning(format!("footnote `{label}` is never defined"))
                .with_label(span, "dangling reference")
                .with_help(format!("define it first with `footnote:{label}[text]`")),
            None => Diagnostic::warning("footnote has no content")
                .with_label(span, "empty footnote")
                .with_help("add the footnote text between the brackets"),
        };
        self.diagnostics.emit(diagnostic.with_code(ErrorCode::E302));
    }
}

impl Folder for FootnoteProcessor<'_> {
    fn fold_inline_content(&mut self, content: InlineContent) -> Result<InlineContent> {
        let elements = self.rewrite(content.elements);
        Ok(InlineContent {
            elements,
            ..content
        })
    }
}
