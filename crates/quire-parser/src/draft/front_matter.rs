//! YAML front matter delimited by `---` lines at the very start of a document.

use log::debug;
use serde_yaml::Value;

use quire_core::attribute::{AttributeValue, Attributes};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::Span,
};

const FENCE: &str = "---";

/// Attributes read from front matter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub attributes: Attributes,
    /// Location of the whole block, fences included.
    pub span: Span,
}

/// Split leading front matter off `source`.
///
/// Returns the parsed front matter, if any, and the byte offset where the
/// document body starts.
pub(crate) fn split(source: &str) -> Result<(Option<FrontMatter>, usize)> {
    let mut lines = line_ranges(source);
    let Some((first_start, first_end)) = lines.next() else {
        return Ok((None, 0));
    };
    if trim_line(&source[first_start..first_end]) != FENCE {
        return Ok((None, 0));
    }

    let body_start = first_end;
    for (start, end) in lines {
        if trim_line(&source[start..end]) == FENCE {
            let yaml = &source[body_start..start];
            let attributes = parse_yaml(yaml, body_start)?;
            debug!(attributes = attributes.len(); "Parsed front matter");
            return Ok((
                Some(FrontMatter {
                    attributes,
                    span: Span::new(0..end),
                }),
                end,
            ));
        }
    }

    Err(Diagnostic::error("unterminated front matter")
        .with_code(ErrorCode::E003)
        .with_label(Span::new(first_start..first_end), "opened here")
        .with_help("add a closing `---` line"))
}

/// Line ranges including their trailing newline.
fn line_ranges(source: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut offset = 0;
    source.split_inclusive('\n').map(move |line| {
        let start = offset;
        offset += line.len();
        (start, offset)
    })
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn parse_yaml(yaml: &str, offset: usize) -> Result<Attributes> {
    let value: Value = serde_yaml::from_str(yaml).map_err(|err| {
        let at = err.location().map_or(0, |location| location.index());
        let start = (offset + at).min(offset + yaml.len());
        Diagnostic::error(format!("invalid front matter: {err}"))
            .with_code(ErrorCode::E002)
            .with_label(Span::new(start..start), "here")
    })?;

    let invalid = |message: String| {
        Diagnostic::error(message)
            .with_code(ErrorCode::E002)
            .with_label(Span::new(offset..offset + yaml.len()), "in this front matter")
    };

    let mapping = match value {
        Value::Null => return Ok(Attributes::new()),
        Value::Mapping(mapping) => mapping,
        _ => return Err(invalid("front matter must be a mapping of attribute names".to_string())),
    };

    let mut attributes = Attributes::new();
    for (key, value) in mapping {
        let Value::String(name) = key else {
            return Err(invalid(format!(
                "front matter key `{}` is not a string",
                scalar_text(&key).unwrap_or_default()
            )));
        };
        let value = convert_value(&name, value).map_err(invalid)?;
        attributes.insert(name, value);
    }
    Ok(attributes)
}

fn convert_value(name: &str, value: Value) -> std::result::Result<AttributeValue, String> {
    match value {
        Value::Null => Ok(AttributeValue::Absent),
        Value::Bool(flag) => Ok(AttributeValue::Flag(flag)),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                scalar_text(item)
                    .ok_or_else(|| format!("front matter list `{name}` may only hold scalars"))
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(AttributeValue::List),
        Value::Tagged(tagged) => convert_value(name, tagged.value),
        other => scalar_text(&other)
            .map(AttributeValue::Text)
            .ok_or_else(|| format!("front matter value `{name}` is nested too deeply")),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        _ => None,
    }
}
