//! Attribute reference substitution.
//!
//! Replaces `{name}` references in text-bearing nodes with attribute values
//! and re-derives the inline structure of every changed text through the
//! draft parser. Values are expanded transitively before they are spliced,
//! so re-parsed output never needs a second pass.

use std::collections::HashMap;

use log::{debug, trace};

use quire_core::{
    attribute::{AttributeValue, Attributes},
    element::{Element, ImageBlock},
    inline::InlineContent,
    span::Span,
};

use crate::{
    assemble::fold::{Folder, walk_element},
    draft::DraftParser,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
};

/// Bound on nested attribute references inside attribute values.
pub(crate) const MAX_EXPANSION_DEPTH: usize = 32;

/// Bound on the bytes attribute substitution may produce for one document.
pub(crate) const MAX_EXPANSION_BYTES: usize = 4 * 1024 * 1024;

/// A piece of text split around attribute references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'a> {
    Literal(&'a str),
    /// `{name}`, with the byte offset of the opening brace.
    Reference {
        name: &'a str,
        token: &'a str,
        offset: usize,
    },
}

fn is_name_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Split `text` into literal runs and attribute references.
///
/// Escaped references (`\{name}`) and `+++` passthroughs stay literal.
fn scan(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut index = 0;

    while index < text.len() {
        let rest = &text[index..];

        if rest.starts_with("+++") {
            index += match rest[3..].find("+++") {
                Some(close) => close + 6,
                None => 3,
            };
            continue;
        }
        if rest.starts_with("\\{") {
            index += 2;
            continue;
        }
        if let Some(after) = rest.strip_prefix('{') {
            let name_len = after
                .char_indices()
                .find(|&(_, c)| !is_name_char(c))
                .map_or(after.len(), |(i, _)| i);
            let name = &after[..name_len];
            if name.starts_with(is_name_start) && after[name_len..].starts_with('}') {
                if literal_start < index {
                    pieces.push(Piece::Literal(&text[literal_start..index]));
                }
                let end = index + name_len + 2;
                pieces.push(Piece::Reference {
                    name,
                    token: &text[index..end],
                    offset: index,
                });
                index = end;
                literal_start = end;
                continue;
            }
        }

        index += rest.chars().next().map_or(1, char::len_utf8);
    }

    if literal_start < text.len() {
        pieces.push(Piece::Literal(&text[literal_start..]));
    }
    pieces
}

/// Rewrites text-bearing nodes using the effective attribute set.
pub(crate) struct SubstitutionEngine<'a> {
    attributes: &'a Attributes,
    parser: &'a DraftParser,
    drop_undefined: bool,
    diagnostics: &'a mut DiagnosticCollector,
    /// Fully expanded values, `None` for undefined names.
    expanded: HashMap<String, Option<String>>,
    /// Span of the block currently being rewritten.
    block_span: Span,
    /// Bytes produced so far, counted against `budget`.
    spent: usize,
    budget: usize,
}

impl<'a> SubstitutionEngine<'a> {
    pub(crate) fn new(
        attributes: &'a Attributes,
        parser: &'a DraftParser,
        drop_undefined: bool,
        diagnostics: &'a mut DiagnosticCollector,
    ) -> Self {
        let drop_undefined =
            drop_undefined || attributes.text("attribute-missing") == Some("drop");
        Self {
            attributes,
            parser,
            drop_undefined,
            diagnostics,
            expanded: HashMap::new(),
            block_span: Span::default(),
            spent: 0,
            budget: MAX_EXPANSION_BYTES,
        }
    }

    /// Substitute every text-bearing node of `elements`.
    pub(crate) fn substitute(&mut self, elements: Vec<Element>) -> Result<Vec<Element>> {
        let elements = self.fold_elements(elements)?;
        debug!(
            expanded = self.expanded.len(),
            bytes = self.spent;
            "Substituted attribute references"
        );
        Ok(elements)
    }

    /// Substitute the references in `text`.
    ///
    /// `base` is the source offset of `text` when the text maps one-to-one
    /// onto the source; otherwise diagnostics point at `fallback`. Returns
    /// `None` when nothing changed.
    fn substitute_text(
        &mut self,
        text: &str,
        base: Option<usize>,
        fallback: Span,
    ) -> Result<Option<String>> {
        let pieces = scan(text);
        if !pieces.iter().any(|piece| matches!(piece, Piece::Reference { .. })) {
            return Ok(None);
        }

        let mut out = String::with_capacity(text.len());
        let mut changed = false;
        for piece in pieces {
            match piece {
                Piece::Literal(literal) => out.push_str(literal),
                Piece::Reference {
                    name,
                    token,
                    offset,
                } => {
                    let span = base.map_or(fallback, |base| {
                        Span::new(base + offset..base + offset + token.len())
                    });
                    match self.expand(name, span, &mut Vec::new())? {
                        Some(value) => {
                            self.charge(name, span, value.len())?;
                            out.push_str(&value);
                            changed = true;
                        }
                        None => {
                            if !self.unresolved(name, token, span, &mut out) {
                                changed = true;
                            }
                        }
                    }
                }
            }
        }

        Ok(changed.then_some(out))
    }

    /// Handle an undefined reference. Returns `true` if the token was kept.
    fn unresolved(&mut self, name: &str, token: &str, span: Span, out: &mut String) -> bool {
        let action = if self.drop_undefined {
            "dropped"
        } else {
            "kept"
        };
        self.diagnostics.emit(
            Diagnostic::warning(format!("attribute `{name}` is not defined"))
                .with_code(ErrorCode::E300)
                .with_label(span, format!("unresolved reference {action}"))
                .with_help(format!("declare it with `:{name}: value` or pass it as an override")),
        );
        if self.drop_undefined {
            false
        } else {
            out.push_str(token);
            true
        }
    }

    /// Fully expanded value of attribute `name`, or `None` when undefined.
    ///
    /// `chain` holds the names currently being expanded.
    fn expand(
        &mut self,
        name: &str,
        span: Span,
        chain: &mut Vec<String>,
    ) -> Result<Option<String>> {
        if let Some(cached) = self.expanded.get(name) {
            return Ok(cached.clone());
        }
        if chain.iter().any(|entry| entry == name) || chain.len() >= MAX_EXPANSION_DEPTH {
            return Err(self.cycle(name, span, chain));
        }

        let Some(value) = self
            .attributes
            .get(name)
            .and_then(AttributeValue::to_substitution)
        else {
            return Ok(None);
        };

        chain.push(name.to_string());
        let mut out = String::with_capacity(value.len());
        let remaining = self.budget.saturating_sub(self.spent);
        for piece in scan(&value) {
            match piece {
                Piece::Literal(literal) => out.push_str(literal),
                Piece::Reference { name: inner, token, .. } => {
                    match self.expand(inner, span, chain)? {
                        Some(expanded) => {
                            if out.len() + expanded.len() > remaining {
                                return Err(self.too_large(name, span));
                            }
                            out.push_str(&expanded);
                        }
                        None => {
                            self.unresolved(inner, token, span, &mut out);
                        }
                    }
                }
            }
        }
        chain.pop();

        trace!(name = name, value = out.as_str(); "Expanded attribute");
        self.expanded.insert(name.to_string(), Some(out.clone()));
        Ok(Some(out))
    }

    /// Count `len` produced bytes against the document budget.
    fn charge(&mut self, name: &str, span: Span, len: usize) -> Result<()> {
        if len > self.budget.saturating_sub(self.spent) {
            return Err(self.too_large(name, span));
        }
        self.spent += len;
        Ok(())
    }

    fn too_large(&self, name: &str, span: Span) -> Diagnostic {
        Diagnostic::error(format!(
            "expanding attribute `{name}` exceeds the limit of {} bytes",
            self.budget
        ))
        .with_code(ErrorCode::E102)
        .with_label(span, "referenced here")
        .with_help(format!("check whether `{name}` repeats references to other attributes"))
    }

    fn cycle(&self, name: &str, span: Span, chain: &[String]) -> Diagnostic {
        let path = chain
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(" -> ");
        let message = if chain.len() >= MAX_EXPANSION_DEPTH {
            format!("attribute references nest deeper than {MAX_EXPANSION_DEPTH} levels: `{path}`")
        } else {
            format!("attribute substitution cycle `{path}`")
        };
        let last = chain.last().map_or(name, String::as_str);
        Diagnostic::error(message)
            .with_code(ErrorCode::E100)
            .with_label(span, "referenced here")
            .with_help(format!("remove the reference from `{last}` back to `{name}`"))
    }

    fn reparse_failed(&self, inner: Diagnostic) -> Diagnostic {
        let mut diagnostic = Diagnostic::error("substituted text could not be parsed")
            .with_code(ErrorCode::E101)
            .with_label(self.block_span, "in this block")
            .with_note(inner.to_string());
        if let Some(help) = inner.help() {
            diagnostic = diagnostic.with_help(help);
        }
        diagnostic
    }
}

impl Folder for SubstitutionEngine<'_> {
    fn fold_element(&mut self, element: Element) -> Result<Element> {
        let outer = self.block_span;
        if let Some(span) = element.span() {
            self.block_span = span;
        }
        let element = walk_element(self, element);
        self.block_span = outer;
        element
    }

    fn fold_image(&mut self, image: ImageBlock) -> Result<ImageBlock> {
        let attributes = self.fold_block_attributes(image.attributes)?;
        let target = self
            .substitute_text(&image.target, None, image.span)?
            .unwrap_or(image.target);
        let alt = match image.alt {
            Some(alt) => Some(self.substitute_text(&alt, None, image.span)?.unwrap_or(alt)),
            None => None,
        };
        Ok(ImageBlock {
            attributes,
            target,
            alt,
            span: image.span,
        })
    }

    fn fold_inline_content(&mut self, content: InlineContent) -> Result<InlineContent> {
        let base = (content.raw.len() == content.span.len()).then(|| content.span.start());
        let Some(raw) = self.substitute_text(&content.raw, base, content.span)? else {
            return Ok(content);
        };
        let elements = self
            .parser
            .parse_inlines(&raw, content.span)
            .map_err(|inner| self.reparse_failed(inner))?;
        Ok(InlineContent::new(raw, elements, content.span))
    }
}

#[cfg(test)]
mod tests {
    use quire_core::{
        element::Paragraph,
        inline::{InlineElement, QuotedKind},
    };

    use super::*;
    use crate::draft::DraftOptions;

    fn paragraph(raw: &str) -> Element {
        let parser = DraftParser::default();
        let span = Span::new(0..raw.len());
        let elements = parser.parse_inlines(raw, span).expect("Failed to parse");
        Element::Paragraph(Paragraph {
            attributes: Default::default(),
            content: InlineContent::new(raw, elements, span),
            span,
        })
    }

    fn content(element: &Element) -> &InlineContent {
        match element {
            Element::Paragraph(paragraph) => &paragraph.content,
            other => panic!("Expected paragraph, got {other:?}"),
        }
    }

    fn run(
        attributes: &Attributes,
        drop_undefined: bool,
        elements: Vec<Element>,
    ) -> (Result<Vec<Element>>, DiagnosticCollector) {
        let parser = DraftParser::default();
        let mut diagnostics = DiagnosticCollector::new();
        let result = SubstitutionEngine::new(attributes, &parser, drop_undefined, &mut diagnostics)
            .substitute(elements);
        (result, diagnostics)
    }

    #[test]
    fn test_scan_pieces() {
        let pieces = scan("a {b} \\{c} {not valid} +++{d}+++ {e-f}");
        let references: Vec<_> = pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Reference { name, offset, .. } => Some((*name, *offset)),
                Piece::Literal(_) => None,
            })
            .collect();
        assert_eq!(references, vec![("b", 2), ("e-f", 33)]);
    }

    #[test]
    fn test_value_markup_is_reparsed() {
        let attributes: Attributes = [("product", "*Quire*")].into_iter().collect();
        let (result, diagnostics) = run(&attributes, false, vec![paragraph("Use {product} daily")]);
        let elements = result.expect("substitution");
        let content = content(&elements[0]);

        assert_eq!(content.raw, "Use *Quire* daily");
        assert!(matches!(
            &content.elements[1],
            InlineElement::Quoted(q) if q.kind == QuotedKind::Bold
        ));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_transitive_expansion() {
        let attributes: Attributes = [
            ("name", "Quire"),
            ("full", "{name} {version}"),
            ("version", "2"),
        ]
        .into_iter()
        .collect();
        let (result, _) = run(&attributes, false, vec![paragraph("{full}")]);
        let elements = result.expect("substitution");
        assert_eq!(content(&elements[0]).raw, "Quire 2");
    }

    #[test]
    fn test_undefined_reference_is_kept_with_warning() {
        let (result, diagnostics) =
            run(&Attributes::new(), false, vec![paragraph("See {missing}.")]);
        let elements = result.expect("substitution");
        assert_eq!(content(&elements[0]).raw, "See {missing}.");

        let warnings = diagnostics.finish().expect("warnings only");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code(), Some(ErrorCode::E300));
        assert_eq!(warnings[0].primary_span(), Some(Span::new(4..13)));
    }

    #[test]
    fn test_undefined_reference_is_dropped() {
        let (result, diagnostics) =
            run(&Attributes::new(), true, vec![paragraph("See {missing}.")]);
        assert_eq!(content(&result.expect("substitution")[0]).raw, "See .");
        assert_eq!(diagnostics.len(), 1);

        let attributes: Attributes = [("attribute-missing", "drop")].into_iter().collect();
        let (result, _) = run(&attributes, false, vec![paragraph("See {missing}.")]);
        assert_eq!(content(&result.expect("substitution")[0]).raw, "See .");
    }

    #[test]
    fn test_absent_attribute_is_undefined() {
        let mut attributes = Attributes::new();
        attributes.insert("gone", AttributeValue::Absent);
        let (result, diagnostics) = run(&attributes, false, vec![paragraph("{gone}")]);
        assert_eq!(content(&result.expect("substitution")[0]).raw, "{gone}");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_escaped_reference_is_literal() {
        let attributes: Attributes = [("name", "Quire")].into_iter().collect();
        let (result, _) = run(&attributes, false, vec![paragraph("\\{name} is {name}")]);
        let elements = result.expect("substitution");
        let content = content(&elements[0]);
        assert_eq!(content.raw, "\\{name} is Quire");
        assert_eq!(content.plain_text(), "{name} is Quire");
    }

    #[test]
    fn test_cycle_is_fatal() {
        let attributes: Attributes = [("a", "{b}"), ("b", "{a}")].into_iter().collect();
        let (result, _) = run(&attributes, false, vec![paragraph("x {a}")]);
        let err = result.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E100));
        assert!(err.message().contains("a -> b -> a"), "{}", err.message());
        assert_eq!(err.primary_span(), Some(Span::new(2..5)));
    }

    #[test]
    fn test_self_reference_is_fatal() {
        let attributes: Attributes = [("a", "again {a}")].into_iter().collect();
        let (result, _) = run(&attributes, false, vec![paragraph("{a}")]);
        assert_eq!(result.unwrap_err().code(), Some(ErrorCode::E100));
    }

    #[test]
    fn test_deep_chain_is_reported_as_cycle() {
        let attributes: Attributes = (0..=MAX_EXPANSION_DEPTH)
            .map(|i| (format!("a{i}"), format!("{{a{}}}", i + 1)))
            .collect();
        let (result, _) = run(&attributes, false, vec![paragraph("{a0}")]);
        assert_eq!(result.unwrap_err().code(), Some(ErrorCode::E100));
    }

    #[test]
    fn test_doubling_chain_exceeds_budget() {
        let mut attributes: Attributes = (0..24)
            .map(|i| (format!("a{i}"), format!("{{a{0}}}{{a{0}}}", i + 1)))
            .collect();
        attributes.insert("a24", "xy");

        let parser = DraftParser::default();
        let mut diagnostics = DiagnosticCollector::new();
        let mut engine = SubstitutionEngine::new(&attributes, &parser, false, &mut diagnostics);
        engine.budget = 1024;
        let err = engine.substitute(vec![paragraph("see {a0}")]).unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E102));
        assert!(err.message().contains("`a"), "{}", err.message());
        assert_eq!(err.primary_span(), Some(Span::new(4..8)));
    }

    #[test]
    fn test_repeated_references_share_budget() {
        let attributes: Attributes = [("word", "abcdefghij")].into_iter().collect();
        let parser = DraftParser::default();
        let mut diagnostics = DiagnosticCollector::new();
        let mut engine = SubstitutionEngine::new(&attributes, &parser, false, &mut diagnostics);
        engine.budget = 25;

        let elements = engine
            .substitute(vec![paragraph("{word} {word}")])
            .expect("within budget");
        assert_eq!(content(&elements[0]).raw, "abcdefghij abcdefghij");

        let err = engine.substitute(vec![paragraph("{word}")]).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E102));
        assert!(err.message().contains("`word`"), "{}", err.message());
    }

    #[test]
    fn test_reparse_failure_is_wrapped() {
        let attributes: Attributes = [("deep", "*_*_*_x_*_*_*")].into_iter().collect();
        let parser = DraftParser::new(DraftOptions {
            max_nesting_depth: 3,
        });
        let mut diagnostics = DiagnosticCollector::new();
        let err = SubstitutionEngine::new(&attributes, &parser, false, &mut diagnostics)
            .substitute(vec![paragraph("a {deep} b")])
            .unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::E101));
        assert_eq!(err.primary_span(), Some(Span::new(0..10)));
        assert!(err.notes()[0].contains("E200"), "{:?}", err.notes());
    }

    #[test]
    fn test_substitution_is_idempotent() {
        let attributes: Attributes = [("a", "*{b}*"), ("b", "value"), ("c", "\\{a}")]
            .into_iter()
            .collect();
        let source = vec![paragraph("x {a} {c} {missing} \\{a}")];

        let (first, _) = run(&attributes, false, source);
        let first = first.expect("first pass");
        let (second, _) = run(&attributes, false, first.clone());
        assert_eq!(second.expect("second pass"), first);
    }
}
