//! Line-oriented block grammar.
//!
//! The block parser walks the source one line at a time and produces the
//! flat draft element sequence: list items are not yet grouped, attribute
//! declarations, comments and blank lines are kept, and sections carry no
//! children. Text-bearing blocks are inline-parsed as they are recognized.

use log::trace;

use quire_core::{
    attribute::AttributeValue,
    document::{Author, Revision},
    element::{
        AttributeDeclaration, BlockAttributes, Checkbox, Comment, DelimitedBlock,
        DelimitedContent, DelimitedKind, Element, ImageBlock, ListItem, ListKind, Paragraph,
        Section, Table, TableRow,
    },
    inline::InlineContent,
    span::Span,
};

use crate::{
    draft::{attrlist, header, inline},
    error::{Diagnostic, ErrorCode, Result},
};

/// Deepest marker-derived list level (`*****`, `.....`).
const MAX_MARKER_LEVEL: usize = 5;

/// Author and revision lines read below a level-0 title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftHeader {
    pub authors: Vec<Author>,
    pub revision: Option<Revision>,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// Line text without the line terminator.
    text: &'a str,
    start: usize,
}

impl Line<'_> {
    /// End offset ignoring trailing whitespace.
    fn content_end(&self) -> usize {
        self.start + self.text.trim_end().len()
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn span(&self) -> Span {
        Span::new(self.start..self.content_end())
    }
}

/// Kind of a fenced block opening line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fence {
    Delimited(DelimitedKind),
    Comment,
    Table,
}

impl Fence {
    fn name(&self) -> &'static str {
        match self {
            Fence::Delimited(DelimitedKind::Listing) => "listing",
            Fence::Delimited(DelimitedKind::Literal) => "literal",
            Fence::Delimited(DelimitedKind::Passthrough) => "passthrough",
            Fence::Delimited(DelimitedKind::Example) => "example",
            Fence::Delimited(DelimitedKind::Quote) => "quote",
            Fence::Delimited(DelimitedKind::Sidebar) => "sidebar",
            Fence::Delimited(DelimitedKind::Open) => "open",
            Fence::Comment => "comment",
            Fence::Table => "table",
        }
    }

    /// Fences whose content is never scanned for other fences.
    fn is_opaque(&self) -> bool {
        match self {
            Fence::Delimited(kind) => kind.is_verbatim(),
            Fence::Comment => true,
            Fence::Table => false,
        }
    }
}

fn fence(text: &str) -> Option<Fence> {
    let text = text.trim_end();
    match text {
        "--" => return Some(Fence::Delimited(DelimitedKind::Open)),
        "|===" => return Some(Fence::Table),
        _ => {}
    }
    let first = text.chars().next()?;
    if text.len() < 4 || !text.chars().all(|c| c == first) {
        return None;
    }
    let kind = match first {
        '-' => DelimitedKind::Listing,
        '.' => DelimitedKind::Literal,
        '+' => DelimitedKind::Passthrough,
        '=' => DelimitedKind::Example,
        '_' => DelimitedKind::Quote,
        '*' => DelimitedKind::Sidebar,
        '/' => return Some(Fence::Comment),
        _ => return None,
    };
    Some(Fence::Delimited(kind))
}

/// A parsed `:name: value` line.
#[derive(Debug)]
struct AttributeEntry<'a> {
    name: &'a str,
    value: &'a str,
    reset: bool,
    unlocked: bool,
}

fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

fn attribute_entry(text: &str) -> Option<AttributeEntry<'_>> {
    let rest = text.strip_prefix(':')?;
    let (head, value) = rest.split_once(':')?;
    if !value.is_empty() && !value.starts_with(char::is_whitespace) {
        return None;
    }

    let (mut name, mut reset) = match head.strip_prefix('!') {
        Some(name) => (name, true),
        None => (head, false),
    };
    let mut unlocked = false;
    loop {
        if let Some(stripped) = name.strip_suffix('!') {
            name = stripped;
            reset = true;
        } else if let Some(stripped) = name.strip_suffix('@') {
            name = stripped;
            unlocked = true;
        } else {
            break;
        }
    }

    is_attribute_name(name).then_some(AttributeEntry {
        name,
        value: value.trim(),
        reset,
        unlocked,
    })
}

fn is_attribute_line(text: &str) -> bool {
    let text = text.trim_end();
    text.len() >= 2 && text.starts_with('[') && text.ends_with(']')
}

fn is_comment_line(text: &str) -> bool {
    text.starts_with("//") && fence(text).is_none()
}

/// A recognized list item marker.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ItemMarker {
    kind: ListKind,
    level: usize,
    marker: String,
    /// Byte range of a labeled item's term within the line.
    term: Option<(usize, usize)>,
    checkbox: Checkbox,
    /// Byte offset of the item text within the line.
    text_offset: usize,
}

/// Offset of the text after a marker of `len` bytes, which must be followed
/// by whitespace and some text.
fn after_marker(body: &str, len: usize) -> Option<usize> {
    let rest = &body[len..];
    let text = rest.trim_start();
    if text.len() == rest.len() || text.is_empty() {
        return None;
    }
    Some(len + rest.len() - text.len())
}

fn list_marker(text: &str) -> Option<ItemMarker> {
    let indent = text.len() - text.trim_start().len();
    let body = text[indent..].trim_end();
    let simple = |kind, len: usize| {
        after_marker(body, len).map(|offset| ItemMarker {
            kind,
            level: if body.starts_with('-') { 1 } else { len },
            marker: body[..len].to_string(),
            term: None,
            checkbox: Checkbox::None,
            text_offset: indent + offset,
        })
    };

    let stars = body.chars().take_while(|&c| c == '*').count();
    if (1..=MAX_MARKER_LEVEL).contains(&stars) {
        if let Some(marker) = simple(ListKind::Unordered, stars) {
            return Some(with_checkbox(marker, text));
        }
    }
    if body.starts_with('-') {
        if let Some(marker) = simple(ListKind::Unordered, 1) {
            return Some(with_checkbox(marker, text));
        }
    }

    let dots = body.chars().take_while(|&c| c == '.').count();
    if (1..=MAX_MARKER_LEVEL).contains(&dots) {
        if let Some(marker) = simple(ListKind::Ordered, dots) {
            return Some(marker);
        }
    }

    let digits = body.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && body[digits..].starts_with('.') {
        if let Some(offset) = after_marker(body, digits + 1) {
            return Some(ItemMarker {
                kind: ListKind::Ordered,
                level: 1,
                marker: body[..=digits].to_string(),
                term: None,
                checkbox: Checkbox::None,
                text_offset: indent + offset,
            });
        }
    }

    callout_marker(body, indent).or_else(|| labeled_marker(body, indent))
}

/// `<1> text` or `<.> text`.
fn callout_marker(body: &str, indent: usize) -> Option<ItemMarker> {
    let close = body.strip_prefix('<')?.find('>')? + 1;
    let number = &body[1..close];
    if number != "." && (number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    let offset = after_marker(body, close + 1)?;
    Some(ItemMarker {
        kind: ListKind::Callout,
        level: 1,
        marker: body[..=close].to_string(),
        term: None,
        checkbox: Checkbox::None,
        text_offset: indent + offset,
    })
}

fn with_checkbox(mut marker: ItemMarker, text: &str) -> ItemMarker {
    let rest = &text[marker.text_offset..];
    let checkbox = if rest.starts_with("[x] ") || rest.starts_with("[*] ") {
        Checkbox::Checked
    } else if rest.starts_with("[ ] ") {
        Checkbox::Unchecked
    } else {
        return marker;
    };
    let after = &rest[4..];
    if after.trim().is_empty() {
        return marker;
    }
    marker.checkbox = checkbox;
    marker.text_offset += 4 + after.len() - after.trim_start().len();
    marker
}

/// `term:: text`, `term::: text`, `term:::: text` or `term;; text`.
fn labeled_marker(body: &str, indent: usize) -> Option<ItemMarker> {
    let bytes = body.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        let c = bytes[index];
        if c != b':' && c != b';' {
            index += 1;
            continue;
        }
        let run = bytes[index..].iter().take_while(|&&b| b == c).count();
        let level = match (c, run) {
            (b':', 2..=4) => Some(run - 1),
            (b';', 2) => Some(4),
            _ => None,
        };
        let sep_end = index + run;
        let at_boundary = sep_end == bytes.len() || bytes[sep_end].is_ascii_whitespace();
        let term = body[..index].trim();
        if let (Some(level), true, false) = (level, at_boundary, term.is_empty()) {
            let rest = &body[sep_end..];
            let text_offset = indent + sep_end + (rest.len() - rest.trim_start().len());
            let term_start = indent + (body.len() - body.trim_start().len());
            return Some(ItemMarker {
                kind: ListKind::Labeled,
                level,
                marker: body[index..sep_end].to_string(),
                term: Some((term_start, term_start + term.len())),
                checkbox: Checkbox::None,
                text_offset,
            });
        }
        index = sep_end;
    }
    None
}

fn unterminated(fence: Fence, opening: Line<'_>) -> Diagnostic {
    Diagnostic::error(format!("unterminated {} block", fence.name()))
        .with_code(ErrorCode::E001)
        .with_label(opening.span(), "opened here")
        .with_help(format!("add a closing `{}` line", opening.text.trim_end()))
}

/// Block-level parser over the lines of a source text.
pub(crate) struct BlockParser<'a> {
    source: &'a str,
    lines: Vec<Line<'a>>,
    pos: usize,
    max_depth: usize,
    /// A level-0 title may still become the document header.
    header_allowed: bool,
    header: Option<DraftHeader>,
}

impl<'a> BlockParser<'a> {
    /// Create a parser for `source`, starting at byte `offset`.
    pub(crate) fn new(source: &'a str, offset: usize, max_depth: usize) -> Self {
        let mut lines = Vec::new();
        let mut start = offset;
        for raw in source[offset..].split_inclusive('\n') {
            let text = raw.trim_end_matches('\n').trim_end_matches('\r');
            lines.push(Line { text, start });
            start += raw.len();
        }
        Self {
            source,
            lines,
            pos: 0,
            max_depth,
            header_allowed: true,
            header: None,
        }
    }

    /// Parse every block of the source.
    pub(crate) fn parse(mut self) -> Result<(Option<DraftHeader>, Vec<Element>)> {
        let end = self.lines.len();
        let blocks = self.parse_blocks(end, 0)?;
        trace!(blocks = blocks.len(); "Parsed draft blocks");
        Ok((self.header, blocks))
    }

    fn parse_blocks(&mut self, end: usize, depth: usize) -> Result<Vec<Element>> {
        let mut elements = Vec::new();
        let mut pending = BlockAttributes::default();
        while self.pos < end {
            if let Some(element) = self.next_block(end, depth, &mut pending)? {
                if !matches!(
                    element,
                    Element::BlankLine | Element::Comment(_) | Element::AttributeDeclaration(_)
                ) {
                    self.header_allowed = false;
                }
                elements.push(element);
            }
        }
        Ok(elements)
    }

    /// Parse blocks until one element is produced.
    fn next_element(&mut self, end: usize, depth: usize) -> Result<Option<Element>> {
        let mut pending = BlockAttributes::default();
        while self.pos < end {
            if let Some(element) = self.next_block(end, depth, &mut pending)? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// Parse the block starting at the current line.
    ///
    /// Attribute lines, anchors and block titles only update `pending` and
    /// produce no element.
    fn next_block(
        &mut self,
        end: usize,
        depth: usize,
        pending: &mut BlockAttributes,
    ) -> Result<Option<Element>> {
        let line = self.lines[self.pos];
        let text = line.text;

        if line.is_blank() {
            self.pos += 1;
            return Ok(Some(Element::BlankLine));
        }
        if let Some(fence) = fence(text) {
            let attributes = std::mem::take(pending);
            return self.fenced(fence, end, depth, attributes).map(Some);
        }
        if is_comment_line(text) {
            self.pos += 1;
            return Ok(Some(Element::Comment(Comment {
                lines: vec![text[2..].trim().to_string()],
                block: false,
            })));
        }
        if let Some(entry) = attribute_entry(text) {
            return Ok(Some(self.attribute_declaration(entry, end)));
        }
        if let Some(inner) = text
            .trim_end()
            .strip_prefix("[[")
            .and_then(|rest| rest.strip_suffix("]]"))
        {
            let (id, reftext) = match inner.split_once(',') {
                Some((id, reftext)) => (id.trim(), Some(reftext.trim())),
                None => (inner.trim(), None),
            };
            if !id.is_empty() && !id.contains(char::is_whitespace) {
                self.pos += 1;
                pending.id = Some(id.to_string());
                if let Some(reftext) = reftext.filter(|r| !r.is_empty()) {
                    pending.named.insert("reftext".to_string(), reftext.to_string());
                }
                return Ok(None);
            }
        }
        if is_attribute_line(text) {
            let inner = &text.trim_end()[1..text.trim_end().len() - 1];
            let mut attributes = attrlist::parse_attrlist(inner);
            attributes.merge(std::mem::take(pending));
            *pending = attributes;
            self.pos += 1;
            return Ok(None);
        }
        if let Some(title) = text.strip_prefix('.') {
            if title.starts_with(|c: char| !c.is_whitespace() && c != '.') {
                let content = self.inline_content(line.start + 1, line.content_end())?;
                pending.title = Some(content);
                self.pos += 1;
                return Ok(None);
            }
        }
        if let Some(element) = self.heading(end, depth, pending)? {
            return Ok(Some(element));
        }

        match text.trim_end() {
            "toc::[]" => {
                self.pos += 1;
                *pending = BlockAttributes::default();
                return Ok(Some(Element::TableOfContentsMacro));
            }
            "'''" => {
                self.pos += 1;
                *pending = BlockAttributes::default();
                return Ok(Some(Element::ThematicBreak));
            }
            "<<<" => {
                self.pos += 1;
                *pending = BlockAttributes::default();
                return Ok(Some(Element::PageBreak));
            }
            "+" => {
                self.pos += 1;
                if self.pos >= end || self.lines[self.pos].is_blank() {
                    return Ok(None);
                }
                let inner = self.next_element(end, depth)?;
                return Ok(inner.map(|element| Element::ListContinuation(Box::new(element))));
            }
            _ => {}
        }

        if let Some(image) = self.image(line, pending) {
            self.pos += 1;
            return Ok(Some(image));
        }
        if let Some(marker) = list_marker(text) {
            let attributes = std::mem::take(pending);
            return self.list_item(end, marker, attributes).map(Some);
        }

        let attributes = std::mem::take(pending);
        self.paragraph(end, attributes).map(Some)
    }

    fn inline_content(&self, start: usize, end: usize) -> Result<InlineContent> {
        let raw = &self.source[start..end];
        let elements = inline::parse_inlines(raw, start, self.max_depth)?;
        Ok(InlineContent::new(raw, elements, Span::new(start..end)))
    }

    fn attribute_declaration(&mut self, entry: AttributeEntry<'_>, end: usize) -> Element {
        let first = self.lines[self.pos];
        let mut last = first;
        let mut value = entry.value.to_string();
        self.pos += 1;

        // Values ending in ` \` continue on the next line.
        while value.ends_with('\\') && self.pos < end {
            value.pop();
            let next = self.lines[self.pos];
            value = format!("{} {}", value.trim_end(), next.text.trim());
            last = next;
            self.pos += 1;
        }

        let value = if entry.reset {
            AttributeValue::Absent
        } else {
            AttributeValue::Text(value.trim_end_matches('\\').trim().to_string())
        };
        Element::AttributeDeclaration(AttributeDeclaration {
            name: entry.name.to_string(),
            value,
            unlocked: entry.unlocked,
            span: Span::new(first.start..last.content_end()),
        })
    }

    fn heading(
        &mut self,
        end: usize,
        depth: usize,
        pending: &mut BlockAttributes,
    ) -> Result<Option<Element>> {
        let line = self.lines[self.pos];
        let markers = line.text.chars().take_while(|&c| c == '=').count();
        if !(1..=6).contains(&markers) {
            return Ok(None);
        }
        let rest = &line.text[markers..];
        if !rest.starts_with([' ', '\t']) || rest.trim().is_empty() {
            return Ok(None);
        }

        let title_start = line.start + markers + (rest.len() - rest.trim_start().len());
        let title = self.inline_content(title_start, line.content_end())?;
        let level = markers - 1;
        let attributes = std::mem::take(pending);
        self.pos += 1;

        if level == 0 && depth == 0 && self.header_allowed && self.header.is_none() {
            self.header = Some(self.header_lines(end));
        }
        self.header_allowed = false;

        Ok(Some(Element::Section(Section {
            level,
            title,
            id: attributes.id.clone(),
            attributes,
            elements: Vec::new(),
            span: line.span(),
        })))
    }

    /// Author and revision lines directly below the document title.
    fn header_lines(&mut self, end: usize) -> DraftHeader {
        let mut draft = DraftHeader::default();
        let candidate = |parser: &Self| {
            (parser.pos < end)
                .then(|| parser.lines[parser.pos].text)
                .filter(|text| header::is_header_line(text) && fence(text).is_none())
        };

        if let Some(text) = candidate(self).filter(|text| !header::looks_like_revision(text)) {
            draft.authors = header::parse_authors(text);
            self.pos += 1;
            if let Some(text) = candidate(self).filter(|text| header::looks_like_revision(text)) {
                draft.revision = Some(header::parse_revision(text));
                self.pos += 1;
            }
        }
        draft
    }

    fn image(&self, line: Line<'_>, pending: &mut BlockAttributes) -> Option<Element> {
        let rest = line.text.trim_end().strip_prefix("image::")?;
        let (target, content) = rest.split_once('[')?;
        let content = content.strip_suffix(']')?;
        if target.is_empty() || target.contains(char::is_whitespace) {
            return None;
        }
        let (alt, macro_attributes) = attrlist::parse_macro_attrlist(content);
        let mut attributes = std::mem::take(pending);
        attributes.merge(macro_attributes);
        Some(Element::Image(ImageBlock {
            attributes,
            target: target.to_string(),
            alt,
            span: line.span(),
        }))
    }

    /// Index of the line closing the fence opened at `open`.
    ///
    /// Inside compound blocks, opaque blocks are skipped so that their
    /// content cannot close the outer block.
    fn find_closing(&self, open: usize, end: usize, opaque: bool) -> Option<usize> {
        let delimiter = self.lines[open].text.trim_end();
        let mut index = open + 1;
        while index < end {
            let text = self.lines[index].text.trim_end();
            if text == delimiter {
                return Some(index);
            }
            if !opaque {
                if let Some(inner) = fence(text).filter(Fence::is_opaque) {
                    trace!(fence = inner.name(); "Skipping nested block");
                    if let Some(close) = self.find_closing(index, end, true) {
                        index = close;
                    }
                }
            }
            index += 1;
        }
        None
    }

    fn fenced(
        &mut self,
        fence: Fence,
        end: usize,
        depth: usize,
        attributes: BlockAttributes,
    ) -> Result<Element> {
        let open = self.pos;
        let opening = self.lines[open];
        let close = self
            .find_closing(open, end, fence.is_opaque())
            .ok_or_else(|| unterminated(fence, opening))?;
        let span = Span::new(opening.start..self.lines[close].content_end());

        let element = match fence {
            Fence::Comment => Element::Comment(Comment {
                lines: self.body_lines(open, close),
                block: true,
            }),
            Fence::Table => self.table(open, close, attributes, span)?,
            Fence::Delimited(kind) if kind.is_verbatim() => {
                Element::DelimitedBlock(DelimitedBlock {
                    kind,
                    attributes,
                    content: DelimitedContent::Verbatim(self.body_lines(open, close)),
                    span,
                })
            }
            Fence::Delimited(kind) => {
                if depth + 1 > self.max_depth {
                    return Err(Diagnostic::error("blocks are nested too deeply")
                        .with_code(ErrorCode::E200)
                        .with_label(
                            opening.span(),
                            format!("exceeds the maximum depth of {}", self.max_depth),
                        )
                        .with_help("reduce block nesting or raise the maximum nesting depth"));
                }
                self.pos = open + 1;
                let blocks = self.parse_blocks(close, depth + 1)?;
                Element::DelimitedBlock(DelimitedBlock {
                    kind,
                    attributes,
                    content: DelimitedContent::Blocks(blocks),
                    span,
                })
            }
        };

        self.pos = close + 1;
        Ok(element)
    }

    fn body_lines(&self, open: usize, close: usize) -> Vec<String> {
        self.lines[open + 1..close]
            .iter()
            .map(|line| line.text.to_string())
            .collect()
    }

    fn table(
        &self,
        open: usize,
        close: usize,
        attributes: BlockAttributes,
        span: Span,
    ) -> Result<Element> {
        let mut cells: Vec<(String, Span)> = Vec::new();
        let mut first_row_cells = None;
        let mut implicit_header = false;

        for index in open + 1..close {
            let line = self.lines[index];
            if line.is_blank() {
                continue;
            }
            let text = line.text;
            if !text.starts_with('|') {
                // Continuation of the previous cell.
                if let Some((raw, cell_span)) = cells.last_mut() {
                    raw.push('\n');
                    raw.push_str(text.trim());
                    *cell_span = cell_span.union(line.span());
                }
                continue;
            }

            let row = split_cells(line);
            if first_row_cells.is_none() {
                first_row_cells = Some(row.len());
                implicit_header = index + 1 < close && self.lines[index + 1].is_blank();
            }
            cells.extend(row);
        }

        let columns = attributes
            .named
            .get("cols")
            .map(|cols| column_count(cols.as_str()))
            .or(first_row_cells)
            .unwrap_or(1)
            .max(1);
        let has_header = !attributes.has_option("noheader")
            && (attributes.has_option("header") || implicit_header);

        let mut rows = Vec::new();
        for chunk in cells.chunks(columns) {
            let cells = chunk
                .iter()
                .map(|(raw, span)| {
                    let elements = inline::parse_inlines(raw, span.start(), self.max_depth)?;
                    Ok(InlineContent::new(raw.clone(), elements, *span))
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(TableRow { cells });
        }

        let header = if has_header && !rows.is_empty() {
            Some(rows.remove(0))
        } else {
            None
        };
        Ok(Element::Table(Table {
            attributes,
            header,
            rows,
            span,
        }))
    }

    fn list_item(
        &mut self,
        end: usize,
        marker: ItemMarker,
        attributes: BlockAttributes,
    ) -> Result<Element> {
        let line = self.lines[self.pos];
        let term = marker
            .term
            .map(|(start, stop)| self.inline_content(line.start + start, line.start + stop))
            .transpose()?;

        let mut text_start = line.start + marker.text_offset;
        let mut text_end = line.content_end();
        let mut has_text = text_start < text_end;
        self.pos += 1;

        while self.pos < end {
            let next = self.lines[self.pos];
            let text = next.text;
            if next.is_blank()
                || text.trim_end() == "+"
                || fence(text).is_some()
                || list_marker(text).is_some()
                || is_attribute_line(text)
                || attribute_entry(text).is_some()
                || is_comment_line(text)
            {
                break;
            }
            if !has_text {
                text_start = next.start + (text.len() - text.trim_start().len());
                has_text = true;
            }
            text_end = next.content_end();
            self.pos += 1;
        }

        let mut elements = Vec::new();
        if has_text {
            let content = self.inline_content(text_start, text_end)?;
            elements.push(Element::Paragraph(Paragraph {
                attributes: BlockAttributes::default(),
                content,
                span: Span::new(text_start..text_end),
            }));
        }

        Ok(Element::ListItem(ListItem {
            kind: marker.kind,
            level: marker.level,
            marker: marker.marker,
            term,
            checkbox: marker.checkbox,
            attributes,
            elements,
            span: Span::new(line.start..text_end.max(line.content_end())),
        }))
    }

    fn paragraph(&mut self, end: usize, attributes: BlockAttributes) -> Result<Element> {
        let first = self.lines[self.pos];
        let mut last = first;
        self.pos += 1;
        while self.pos < end {
            let next = self.lines[self.pos];
            if next.is_blank()
                || fence(next.text).is_some()
                || next.text.trim_end() == "+"
                || is_comment_line(next.text)
            {
                break;
            }
            last = next;
            self.pos += 1;
        }
        let span = Span::new(first.start..last.content_end());

        let verbatim_kind = match attributes.style.as_deref() {
            Some("source" | "listing") => Some(DelimitedKind::Listing),
            Some("literal") => Some(DelimitedKind::Literal),
            Some("pass") => Some(DelimitedKind::Passthrough),
            _ if first.text.starts_with([' ', '\t']) => Some(DelimitedKind::Literal),
            _ => None,
        };
        if let Some(kind) = verbatim_kind {
            let lines = self.source[span.range()].lines().collect::<Vec<_>>();
            let indent = lines
                .iter()
                .filter(|line| !line.trim().is_empty())
                .map(|line| line.len() - line.trim_start().len())
                .min()
                .unwrap_or(0);
            let lines = lines
                .iter()
                .map(|line| line.get(indent..).unwrap_or("").trim_end().to_string())
                .collect();
            return Ok(Element::DelimitedBlock(DelimitedBlock {
                kind,
                attributes,
                content: DelimitedContent::Verbatim(lines),
                span,
            }));
        }

        let content = self.inline_content(span.start(), span.end())?;
        Ok(Element::Paragraph(Paragraph {
            attributes,
            content,
            span,
        }))
    }
}

/// Cells of a `|a |b` table line, with trimmed text and spans.
fn split_cells(line: Line<'_>) -> Vec<(String, Span)> {
    let text = line.text;
    let mut cells = Vec::new();
    let mut cell_start = 1;
    let bytes = text.as_bytes();
    let mut index = 1;
    while index <= bytes.len() {
        let at_separator =
            index == bytes.len() || (bytes[index] == b'|' && bytes[index - 1] != b'\\');
        if at_separator {
            let raw = &text[cell_start..index];
            let leading = raw.len() - raw.trim_start().len();
            let trimmed = raw.trim();
            let start = line.start + cell_start + leading;
            cells.push((
                trimmed.replace("\\|", "|"),
                Span::new(start..start + trimmed.len()),
            ));
            cell_start = index + 1;
        }
        index += 1;
    }
    cells
}

/// Number of columns in a `cols` specification such as `1,2,1` or `3`.
fn column_count(cols: &str) -> usize {
    let cols = cols.trim();
    if !cols.contains(',') {
        if let Ok(count) = cols.parse() {
            return count;
        }
    }
    cols.split(',').filter(|c| !c.trim().is_empty()).count()
}
