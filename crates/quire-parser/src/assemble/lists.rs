//! List assembly.
//!
//! The draft grammar emits list items as flat blocks annotated with their
//! marker level. This stage regroups consecutive items into nested [`List`]
//! trees with an explicit stack of open frames.

use log::trace;

use quire_core::element::{
    DelimitedBlock, DelimitedContent, Element, List, ListItem, ListKind,
};

use crate::error::{Diagnostic, ErrorCode, Result};

/// An open list on the assembly stack.
#[derive(Debug)]
struct Frame {
    level: usize,
    /// Kind of the items as written; `list.kind` may differ for Q&A lists.
    kind: ListKind,
    /// Bullet character of an unordered list; `*` and `-` lists never merge.
    bullet: Option<char>,
    list: List,
}

fn bullet(item: &ListItem) -> Option<char> {
    match item.kind {
        ListKind::Unordered => item.marker.chars().next(),
        _ => None,
    }
}

/// Give a `<.>` callout item the number after the previous item's.
fn number_callout(list: &List, item: &mut ListItem) {
    if item.kind != ListKind::Callout || item.marker != "<.>" {
        return;
    }
    let previous = list
        .items
        .last()
        .and_then(|last| last.marker.trim_matches(['<', '>']).parse::<u32>().ok())
        .unwrap_or(0);
    item.marker = format!("<{}>", previous + 1);
}

pub(crate) struct ListAssembler {
    max_depth: usize,
}

impl ListAssembler {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Regroup every run of list items in `elements`, recursing into
    /// compound blocks and continuation content.
    pub(crate) fn assemble(&self, elements: Vec<Element>) -> Result<Vec<Element>> {
        let mut out = Vec::with_capacity(elements.len());
        let mut stack: Vec<Frame> = Vec::new();
        let mut blanks = Vec::new();

        for element in elements {
            match element {
                Element::ListItem(item) => {
                    blanks.clear();
                    let item = self.assemble_item(item)?;
                    self.push_item(&mut stack, &mut out, item)?;
                }
                Element::BlankLine if !stack.is_empty() => blanks.push(Element::BlankLine),
                Element::ListContinuation(inner) => {
                    let inner = self.assemble_element(*inner)?;
                    match stack.last_mut().and_then(|frame| frame.list.items.last_mut()) {
                        Some(item) => {
                            blanks.clear();
                            item.elements.push(inner);
                        }
                        None => out.push(inner),
                    }
                }
                other => {
                    close_all(&mut stack, &mut out);
                    out.append(&mut blanks);
                    out.push(self.assemble_element(other)?);
                }
            }
        }

        close_all(&mut stack, &mut out);
        out.append(&mut blanks);
        Ok(out)
    }

    fn assemble_element(&self, element: Element) -> Result<Element> {
        Ok(match element {
            Element::DelimitedBlock(block) => Element::DelimitedBlock(DelimitedBlock {
                content: match block.content {
                    DelimitedContent::Blocks(blocks) => {
                        DelimitedContent::Blocks(self.assemble(blocks)?)
                    }
                    verbatim @ DelimitedContent::Verbatim(_) => verbatim,
                },
                ..block
            }),
            Element::Section(mut section) => {
                section.elements = self.assemble(section.elements)?;
                Element::Section(section)
            }
            Element::ListContinuation(inner) => self.assemble_element(*inner)?,
            other => other,
        })
    }

    fn assemble_item(&self, mut item: ListItem) -> Result<ListItem> {
        item.elements = self.assemble(item.elements)?;
        Ok(item)
    }

    fn push_item(
        &self,
        stack: &mut Vec<Frame>,
        out: &mut Vec<Element>,
        mut item: ListItem,
    ) -> Result<()> {
        while stack.last().is_some_and(|frame| frame.level > item.level) {
            pop_frame(stack, out);
        }

        let bullet = bullet(&item);
        match stack.last_mut() {
            Some(frame)
                if frame.level == item.level
                    && frame.kind == item.kind
                    && frame.bullet == bullet =>
            {
                item.kind = frame.list.kind;
                number_callout(&frame.list, &mut item);
                frame.list.items.push(item);
                return Ok(());
            }
            Some(frame) if frame.level == item.level => {
                trace!(
                    from:? = frame.kind,
                    to:? = item.kind;
                    "List marker changed, opening sibling list"
                );
                pop_frame(stack, out);
            }
            _ => {}
        }

        if stack.len() + 1 > self.max_depth {
            return Err(Diagnostic::error("lists are nested too deeply")
                .with_code(ErrorCode::E200)
                .with_label(
                    item.span,
                    format!("exceeds the maximum depth of {}", self.max_depth),
                )
                .with_help("reduce list nesting or raise the maximum nesting depth"));
        }

        let attributes = std::mem::take(&mut item.attributes);
        let kind = match item.kind {
            ListKind::Labeled if attributes.style.as_deref() == Some("qanda") => ListKind::QAndA,
            kind => kind,
        };
        let frame = Frame {
            level: item.level,
            kind: item.kind,
            bullet,
            list: List {
                kind,
                attributes,
                items: Vec::new(),
            },
        };
        item.kind = kind;
        number_callout(&frame.list, &mut item);
        stack.push(frame);
        if let Some(frame) = stack.last_mut() {
            frame.list.items.push(item);
        }
        Ok(())
    }
}

/// Close the innermost frame, attaching its list to the parent's current
/// item or emitting it at this level.
fn pop_frame(stack: &mut Vec<Frame>, out: &mut Vec<Element>) {
    let Some(frame) = stack.pop() else {
        return;
    };
    let list = Element::List(frame.list);
    match stack.last_mut().and_then(|parent| parent.list.items.last_mut()) {
        Some(parent) => parent.elements.push(list),
        None => out.push(list),
    }
}

fn close_all(stack: &mut Vec<Frame>, out: &mut Vec<Element>) {
    while !stack.is_empty() {
        pop_frame(stack, out);
    }
}
