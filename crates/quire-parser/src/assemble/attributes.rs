//! Attribute resolution.
//!
//! Merges caller overrides, front matter and in-document declarations into
//! the effective attribute set. Precedence is fixed: overrides, then front
//! matter, then declarations in source order. Within the document the first
//! declaration wins unless a later one carries the unlock marker; nothing
//! ever replaces an override.

use log::{debug, trace};

use quire_core::{
    attribute::{AttributeValue, Attributes},
    element::Element,
    inline::plain_text,
};

use crate::draft::{DraftDocument, header};

/// Character replacement attributes available in every document.
const BUILTIN_ATTRIBUTES: &[(&str, &str)] = &[
    ("empty", ""),
    ("sp", " "),
    ("nbsp", "&#160;"),
    ("zwsp", "&#8203;"),
    ("wj", "&#8288;"),
    ("apos", "&#39;"),
    ("quot", "&#34;"),
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("deg", "&#176;"),
    ("cpp", "C++"),
    ("two-colons", "::"),
    ("two-semicolons", ";;"),
];

/// Defaults applied when nothing else sets the attribute.
const DEFAULT_ATTRIBUTES: &[(&str, &str)] = &[
    ("sectids", ""),
    ("idprefix", "_"),
    ("idseparator", "_"),
    ("toclevels", "2"),
    ("doctype", "article"),
    ("attribute-missing", "skip"),
];

/// Resolve the effective attribute set of `draft`.
pub(crate) fn resolve(draft: &DraftDocument, overrides: &Attributes) -> Attributes {
    let mut attributes = overrides.clone();

    if let Some(front_matter) = &draft.front_matter {
        attributes.extend_missing(&front_matter.attributes);
    }

    for declaration in draft.declarations() {
        let name = declaration.name.as_str();
        if overrides.contains(name) {
            debug!(name = name; "Declaration ignored, attribute is overridden");
            continue;
        }
        if attributes.contains(name) && !declaration.unlocked {
            debug!(name = name; "Declaration ignored, attribute already set");
            continue;
        }
        trace!(name = name, value:% = declaration.value; "Attribute declared");
        attributes.insert(name, declaration.value.clone());
    }

    for (name, value) in header_attributes(draft) {
        attributes.insert_if_absent(name, value);
    }
    for &(name, value) in BUILTIN_ATTRIBUTES.iter().chain(DEFAULT_ATTRIBUTES) {
        attributes.insert_if_absent(name, value);
    }

    debug!(count = attributes.len(); "Resolved attributes");
    attributes
}

/// Plain text of the first level-0 heading in `blocks`.
pub(crate) fn document_title(blocks: &[Element]) -> Option<String> {
    blocks.iter().find_map(|element| match element {
        Element::Section(section) if section.level == 0 => {
            Some(plain_text(&section.title.elements))
        }
        _ => None,
    })
}

/// Attributes implied by the document title, author and revision lines.
fn header_attributes(draft: &DraftDocument) -> Vec<(&'static str, AttributeValue)> {
    let Some(header) = &draft.header else {
        return Vec::new();
    };
    let mut derived = Vec::new();

    if let Some(title) = document_title(&draft.blocks) {
        derived.push(("doctitle", AttributeValue::Text(title)));
    }

    if let Some(author) = header.authors.first() {
        derived.push(("author", author.full_name.clone().into()));
        let (first, middle, last) = header::name_parts(&author.full_name);
        let initials: String = [first, middle.as_deref(), last]
            .into_iter()
            .flatten()
            .filter_map(|name| name.chars().next())
            .collect();
        if let Some(first) = first {
            derived.push(("firstname", first.into()));
        }
        if let Some(middle) = middle {
            derived.push(("middlename", middle.into()));
        }
        if let Some(last) = last {
            derived.push(("lastname", last.into()));
        }
        derived.push(("authorinitials", initials.into()));
        if let Some(email) = &author.email {
            derived.push(("email", email.clone().into()));
        }
        let names: Vec<String> = header
            .authors
            .iter()
            .map(|author| author.full_name.clone())
            .collect();
        derived.push(("authorcount", names.len().to_string().into()));
        derived.push(("authors", names.join(", ").into()));
    }

    if let Some(revision) = &header.revision {
        let fields = [
            ("revnumber", &revision.number),
            ("revdate", &revision.date),
            ("revremark", &revision.remark),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                derived.push((name, value.clone().into()));
            }
        }
    }

    derived
}
