//! Block attribute lists: `[style#id.role%option,positional,key=value]`.

use quire_core::element::BlockAttributes;

/// Split an attribute list on commas that are not inside double quotes.
fn split_entries(content: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in content.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => entries.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    entries.push(current);

    entries
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .collect()
}

fn apply_shorthand_part(
    marker: Option<char>,
    value: &mut String,
    attributes: &mut BlockAttributes,
) {
    let value = std::mem::take(value);
    if value.is_empty() {
        return;
    }
    match marker {
        None => attributes.style = Some(value),
        Some('#') => attributes.id = Some(value),
        Some('.') => attributes.roles.push(value),
        Some('%') => attributes.options.push(value),
        Some(_) => {}
    }
}

/// Apply the `style#id.role%option` shorthand of the first positional entry.
fn apply_shorthand(entry: &str, attributes: &mut BlockAttributes) {
    let mut marker = None;
    let mut current = String::new();

    for c in entry.chars() {
        if matches!(c, '#' | '.' | '%') {
            apply_shorthand_part(marker, &mut current, attributes);
            marker = Some(c);
        } else {
            current.push(c);
        }
    }
    apply_shorthand_part(marker, &mut current, attributes);
}

/// Parse the content between the brackets of a block attribute line.
pub(crate) fn parse_attrlist(content: &str) -> BlockAttributes {
    let mut attributes = BlockAttributes::default();
    apply_entries(split_entries(content), true, &mut attributes);
    attributes
}

/// Parse the attribute list of a block macro such as `image::target[alt]`.
///
/// The first positional entry is returned as-is instead of being read as
/// style shorthand.
pub(crate) fn parse_macro_attrlist(content: &str) -> (Option<String>, BlockAttributes) {
    let mut entries = split_entries(content);
    let first = match entries.first() {
        Some(entry) if !entry.contains('=') => Some(entries.remove(0)),
        _ => None,
    };
    let mut attributes = BlockAttributes::default();
    apply_entries(entries, false, &mut attributes);
    (first.filter(|entry| !entry.is_empty()), attributes)
}

fn apply_entries(entries: Vec<String>, shorthand: bool, attributes: &mut BlockAttributes) {
    for (index, entry) in entries.into_iter().enumerate() {
        if entry.is_empty() {
            continue;
        }
        match entry.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                let value = value.trim().trim_matches('"').to_string();
                match key {
                    "id" => attributes.id = Some(value),
                    "role" => attributes
                        .roles
                        .extend(value.split_whitespace().map(str::to_string)),
                    "options" | "opts" => attributes.options.extend(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(str::to_string),
                    ),
                    _ => {
                        attributes.named.insert(key.to_string(), value);
                    }
                }
            }
            None if index == 0 && shorthand => apply_shorthand(&entry, attributes),
            None => attributes.positional.push(entry),
        }
    }
}
