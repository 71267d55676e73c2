//! Inline markup parser.
//!
//! Turns the raw text of a paragraph, title, list item or table cell into
//! [`InlineElement`]s. Constructs that fail to match fall back to plain
//! text, so the only hard failure is exceeding the nesting budget.
//!
//! The same entry point serves whole documents and substituted fragments;
//! spans are reported relative to the `base` offset supplied by the caller.

use winnow::{
    Parser as _,
    combinator::{alt, delimited, eof, opt},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{any, take, take_until, take_while},
};

use quire_core::inline::{
    CrossReference, FootnoteMacro, IndexTerm, InlineElement, InlineImage, Link, QuotedKind,
    QuotedText, plain_text,
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::Span,
};

/// Characters that lose their meaning when preceded by a backslash.
const ESCAPABLE: &[char] = &['*', '_', '`', '#', '^', '~', '+', '{', '[', '<', '\\'];

/// Diagnostic details attached to cut errors.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InlineDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// Absolute offset of the construct that failed.
    start: usize,
    len: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<InlineDiagnostic>>;

#[derive(Debug, Clone, Copy)]
struct Context {
    /// Offset of the parsed text within the document source.
    base: usize,
    max_depth: usize,
}

/// How an open quoted-text run is closed.
#[derive(Debug, Clone, Copy)]
struct Closing {
    delimiter: char,
    double: bool,
    constrained: bool,
}

impl Closing {
    fn matches(&self, rest: &str, text: &str) -> bool {
        if text.chars().last().is_some_and(char::is_whitespace) {
            return false;
        }
        let mut chars = rest.chars();
        if chars.next() != Some(self.delimiter) {
            return false;
        }
        if self.double {
            return chars.next() == Some(self.delimiter);
        }
        !self.constrained || chars.next().is_none_or(|c| !c.is_alphanumeric())
    }

    fn len(&self) -> usize {
        if self.double { 2 } else { 1 }
    }
}

/// Parse `text` into inline elements.
///
/// `base` is the byte offset of `text` in the document source and is added
/// to every reported span.
pub(crate) fn parse_inlines(
    text: &str,
    base: usize,
    max_depth: usize,
) -> Result<Vec<InlineElement>> {
    let ctx = Context { base, max_depth };
    let mut input = LocatingSlice::new(text);
    inlines(&mut input, &ctx, 0, None).map_err(|err| convert_err_mode(err, &ctx))
}

/// The unconsumed part of the input.
fn remaining<'a>(input: &Input<'a>) -> &'a str {
    **input
}

fn backtrack<O>() -> IResult<O> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

fn next_char(input: &mut Input<'_>) -> IResult<char> {
    any.parse_next(input)
}

fn flush_text(text: &mut String, elements: &mut Vec<InlineElement>) {
    if !text.is_empty() {
        elements.push(InlineElement::Text(std::mem::take(text)));
    }
}

/// Parse a run of inline elements until the end of input or `closing`.
fn inlines(
    input: &mut Input<'_>,
    ctx: &Context,
    depth: usize,
    closing: Option<Closing>,
) -> IResult<Vec<InlineElement>> {
    let mut elements = Vec::new();
    let mut text = String::new();

    while !input.is_empty() {
        if let Some(closing) = closing {
            if closing.matches(remaining(input), &text) {
                break;
            }
        }

        // Backslash escapes keep the next markup character literally.
        if input.starts_with('\\') {
            let mut chars = input.chars();
            chars.next();
            if let Some(escaped) = chars.next().filter(|c| ESCAPABLE.contains(c)) {
                let _ = next_char(input)?;
                let _ = next_char(input)?;
                text.push(escaped);
                continue;
            }
        }

        let prev_is_word = text.chars().last().is_some_and(char::is_alphanumeric);
        let checkpoint = input.checkpoint();
        match inline_construct(input, ctx, depth, prev_is_word) {
            Ok(element) => {
                flush_text(&mut text, &mut elements);
                elements.push(element);
            }
            Err(ErrMode::Backtrack(_)) => {
                input.reset(&checkpoint);
                text.push(next_char(input)?);
            }
            Err(err) => return Err(err),
        }
    }

    flush_text(&mut text, &mut elements);
    Ok(elements)
}

fn inline_construct(
    input: &mut Input<'_>,
    ctx: &Context,
    depth: usize,
    prev_is_word: bool,
) -> IResult<InlineElement> {
    let Some(first) = input.chars().next() else {
        return backtrack();
    };
    match first {
        ' ' => line_break(input),
        '(' => index_term(input, ctx, depth),
        '+' => passthrough(input),
        '<' => cross_reference(input),
        'f' => footnote(input, ctx, depth),
        'i' => inline_image(input),
        'l' => link_macro(input, ctx, depth),
        'h' if !prev_is_word => url(input, ctx, depth),
        c if QuotedKind::from_delimiter(c).is_some() => quoted(input, ctx, depth, prev_is_word),
        _ => backtrack(),
    }
}

/// Check the nesting budget before descending into nested content.
fn enter(
    input: &Input<'_>,
    ctx: &Context,
    depth: usize,
    start: usize,
    len: usize,
) -> IResult<usize> {
    let depth = depth + 1;
    if depth > ctx.max_depth {
        return Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            InlineDiagnostic {
                code: ErrorCode::E200,
                message: "inline markup is nested too deeply",
                help: Some("reduce the nesting of formatted text"),
                start: ctx.base + start,
                len,
            },
        )));
    }
    Ok(depth)
}

/// Parse text that was cut out of the current input, such as macro content.
fn nested(text: &str, offset: usize, ctx: &Context, depth: usize) -> IResult<Vec<InlineElement>> {
    let ctx = Context {
        base: ctx.base + offset,
        ..*ctx
    };
    let mut input = LocatingSlice::new(text);
    inlines(&mut input, &ctx, depth, None)
}

/// `[content]`, returning the content and its offset.
fn bracketed<'a>(input: &mut Input<'a>) -> IResult<(usize, &'a str)> {
    '['.parse_next(input)?;
    let offset = input.current_token_start();
    let content = take_until(0.., "]").parse_next(input)?;
    ']'.parse_next(input)?;
    Ok((offset, content))
}

fn line_break(input: &mut Input<'_>) -> IResult<InlineElement> {
    (" +", alt(("\r\n", "\n", eof)))
        .value(InlineElement::LineBreak)
        .parse_next(input)
}

fn passthrough(input: &mut Input<'_>) -> IResult<InlineElement> {
    delimited("+++", take_until(0.., "+++"), "+++")
        .map(|raw: &str| InlineElement::Passthrough(raw.to_string()))
        .parse_next(input)
}

fn cross_reference(input: &mut Input<'_>) -> IResult<InlineElement> {
    delimited("<<", take_until(1.., ">>"), ">>")
        .verify_map(|inner: &str| {
            let (id, label) = match inner.split_once(',') {
                Some((id, label)) => (id.trim(), Some(label.trim())),
                None => (inner.trim(), None),
            };
            if id.is_empty() || id.contains(char::is_whitespace) {
                return None;
            }
            Some(InlineElement::CrossReference(CrossReference {
                id: id.to_string(),
                label: label.filter(|l| !l.is_empty()).map(str::to_string),
            }))
        })
        .parse_next(input)
}

/// `((term))` or `(((primary, secondary, tertiary)))`.
fn index_term(input: &mut Input<'_>, ctx: &Context, depth: usize) -> IResult<InlineElement> {
    if input.starts_with("(((") {
        let terms: Vec<String> = delimited("(((", take_until(1.., ")))"), ")))")
            .parse_next(input)?
            .split(',')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .take(3)
            .map(str::to_string)
            .collect();
        if terms.is_empty() {
            return backtrack();
        }
        return Ok(InlineElement::IndexTerm(IndexTerm {
            elements: Vec::new(),
            terms,
            concealed: true,
        }));
    }

    let start = input.current_token_start();
    "((".parse_next(input)?;
    let offset = input.current_token_start();
    let term = take_until(1.., "))").parse_next(input)?;
    "))".parse_next(input)?;
    if term.trim().is_empty() {
        return backtrack();
    }

    let end = input.current_token_start();
    let depth = enter(input, ctx, depth, start, end - start)?;
    let elements = nested(term, offset, ctx, depth)?;
    Ok(InlineElement::IndexTerm(IndexTerm {
        terms: vec![plain_text(&elements)],
        elements,
        concealed: false,
    }))
}

fn is_label_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn footnote(input: &mut Input<'_>, ctx: &Context, depth: usize) -> IResult<InlineElement> {
    let start = input.current_token_start();
    "footnote:".parse_next(input)?;
    let label = take_while(0.., is_label_char).parse_next(input)?;
    let (offset, content) = bracketed(input)?;
    let end = input.current_token_start();

    let depth = enter(input, ctx, depth, start, end - start)?;
    let content = nested(content, offset, ctx, depth)?;

    Ok(InlineElement::FootnoteMacro(FootnoteMacro {
        label: (!label.is_empty()).then(|| label.to_string()),
        content,
        span: Span::new(ctx.base + start..ctx.base + end),
    }))
}

fn inline_image(input: &mut Input<'_>) -> IResult<InlineElement> {
    "image:".parse_next(input)?;
    let target = take_while(1.., |c: char| !c.is_whitespace() && c != '[')
        .verify(|target: &str| !target.starts_with(':'))
        .parse_next(input)?;
    let (_, attrs) = bracketed(input)?;
    let alt = attrs
        .split(',')
        .next()
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .map(str::to_string);

    Ok(InlineElement::InlineImage(InlineImage {
        target: target.to_string(),
        alt,
    }))
}

fn link_text(
    input: &Input<'_>,
    ctx: &Context,
    depth: usize,
    start: usize,
    text: Option<(usize, &str)>,
) -> IResult<Vec<InlineElement>> {
    match text {
        Some((offset, text)) if !text.is_empty() => {
            let depth = enter(input, ctx, depth, start, offset - start)?;
            nested(text, offset, ctx, depth)
        }
        _ => Ok(Vec::new()),
    }
}

fn link_macro(input: &mut Input<'_>, ctx: &Context, depth: usize) -> IResult<InlineElement> {
    let start = input.current_token_start();
    "link:".parse_next(input)?;
    let target = take_while(1.., |c: char| !c.is_whitespace() && c != '[').parse_next(input)?;
    let text = bracketed(input)?;
    let text = link_text(input, ctx, depth, start, Some(text))?;

    Ok(InlineElement::Link(Link {
        target: target.to_string(),
        text,
    }))
}

fn url(input: &mut Input<'_>, ctx: &Context, depth: usize) -> IResult<InlineElement> {
    let start = input.current_token_start();
    let checkpoint = input.checkpoint();
    let target = (
        alt(("https://", "http://")),
        take_while(1.., |c: char| {
            !c.is_whitespace() && !matches!(c, '[' | ']' | '<' | '>')
        }),
    )
        .take()
        .parse_next(input)?;

    let text = opt(bracketed).parse_next(input)?;
    let target = match text {
        Some(_) => target,
        None => {
            // Trailing punctuation belongs to the sentence, not the URL.
            let trimmed = target.trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
            input.reset(&checkpoint);
            take(trimmed.len()).parse_next(input)?
        }
    };
    let text = link_text(input, ctx, depth, start, text)?;

    Ok(InlineElement::Link(Link {
        target: target.to_string(),
        text,
    }))
}

fn quoted(
    input: &mut Input<'_>,
    ctx: &Context,
    depth: usize,
    prev_is_word: bool,
) -> IResult<InlineElement> {
    let start = input.current_token_start();
    let Some(delimiter) = input.chars().next() else {
        return backtrack();
    };
    let Some(kind) = QuotedKind::from_delimiter(delimiter) else {
        return backtrack();
    };

    let script = matches!(kind, QuotedKind::Superscript | QuotedKind::Subscript);
    let double = !script && input.chars().nth(1) == Some(delimiter);
    let closing = Closing {
        delimiter,
        double,
        constrained: !double && !script,
    };
    if closing.constrained && prev_is_word {
        return backtrack();
    }

    let _ = take(closing.len()).parse_next(input)?;
    if input.chars().next().is_none_or(char::is_whitespace) {
        return backtrack();
    }
    let pattern: String = std::iter::repeat_n(delimiter, closing.len()).collect();
    if !input.contains(pattern.as_str()) {
        return backtrack();
    }

    let depth = enter(input, ctx, depth, start, closing.len())?;
    let elements = inlines(input, ctx, depth, Some(closing))?;
    if elements.is_empty() || !closing.matches(remaining(input), "") {
        return backtrack();
    }
    let _ = take(closing.len()).parse_next(input)?;

    Ok(InlineElement::Quoted(QuotedText { kind, elements }))
}

/// Convert a winnow error into a diagnostic.
fn convert_err_mode(err: ErrMode<ContextError<InlineDiagnostic>>, ctx: &Context) -> Diagnostic {
    let context_error = match err {
        ErrMode::Backtrack(inner) | ErrMode::Cut(inner) => inner,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    if let Some(InlineDiagnostic {
        code,
        message,
        help,
        start,
        len,
    }) = context_error.context().next()
    {
        let mut diag = Diagnostic::error(*message)
            .with_code(*code)
            .with_label(Span::new(*start..*start + *len), code.description());
        if let Some(h) = help {
            diag = diag.with_help(*h);
        }
        return diag;
    }

    Diagnostic::error("malformed inline markup").with_label(Span::new(ctx.base..ctx.base), "here")
}
