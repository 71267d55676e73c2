//! Author and revision lines below the document title.

use quire_core::document::{Author, Revision};

/// Returns `true` if `line` may be an author or revision line.
pub(crate) fn is_header_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with(':') && !line.starts_with('[') && !line.starts_with("//")
}

/// Parse `Full Name <email>; Other Name`.
pub(crate) fn parse_authors(line: &str) -> Vec<Author> {
    line.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('<') {
            Some((name, rest)) if rest.ends_with('>') => Author {
                full_name: normalize_name(name),
                email: Some(rest.trim_end_matches('>').trim().to_string()),
            },
            _ => Author {
                full_name: normalize_name(entry),
                email: None,
            },
        })
        .collect()
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.replace('_', " "))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns `true` if `line` reads like `v1.0, 2024-01-01: remark`.
pub(crate) fn looks_like_revision(line: &str) -> bool {
    let line = line.trim();
    let digits = line.strip_prefix('v').unwrap_or(line);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

/// Parse a revision line.
///
/// A single component is a date unless it carries the `v` prefix.
pub(crate) fn parse_revision(line: &str) -> Revision {
    let line = line.trim();
    let (line, remark) = match line.split_once(':') {
        Some((head, remark)) => (head.trim(), Some(remark.trim().to_string())),
        None => (line, None),
    };

    let (number, date) = match line.split_once(',') {
        Some((number, date)) => (Some(number.trim()), Some(date.trim())),
        None if line.starts_with('v') => (Some(line), None),
        None => (None, Some(line)),
    };

    Revision {
        number: number
            .map(|n| n.strip_prefix('v').unwrap_or(n).to_string())
            .filter(|n| !n.is_empty()),
        date: date.filter(|d| !d.is_empty()).map(str::to_string),
        remark: remark.filter(|r| !r.is_empty()),
    }
}

/// Split a full name into first, middle and last names.
pub(crate) fn name_parts(full_name: &str) -> (Option<&str>, Option<String>, Option<&str>) {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    match parts.as_slice() {
        [] => (None, None, None),
        [first] => (Some(first), None, None),
        [first, last] => (Some(first), None, Some(last)),
        [first, middle @ .., last] => (Some(first), Some(middle.join(" ")), Some(last)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authors() {
        let authors = parse_authors("Ada Lovelace <ada@example.org>; Charles_Babbage");
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].full_name, "Ada Lovelace");
        assert_eq!(authors[0].email.as_deref(), Some("ada@example.org"));
        assert_eq!(authors[1].full_name, "Charles Babbage");
        assert_eq!(authors[1].email, None);
    }

    #[test]
    fn test_parse_revision_full() {
        let revision = parse_revision("v1.2, 2024-03-01: Second draft");
        assert_eq!(revision.number.as_deref(), Some("1.2"));
        assert_eq!(revision.date.as_deref(), Some("2024-03-01"));
        assert_eq!(revision.remark.as_deref(), Some("Second draft"));
    }

    #[test]
    fn test_parse_revision_single_component() {
        assert_eq!(parse_revision("2024-03-01").date.as_deref(), Some("2024-03-01"));
        assert_eq!(parse_revision("v3").number.as_deref(), Some("3"));
    }

    #[test]
    fn test_looks_like_revision() {
        assert!(looks_like_revision("v1.0, today"));
        assert!(looks_like_revision("2024-01-01"));
        assert!(!looks_like_revision("Some Author"));
    }

    #[test]
    fn test_name_parts() {
        assert_eq!(
            name_parts("Ada King Lovelace"),
            (Some("Ada"), Some("King".to_string()), Some("Lovelace"))
        );
        assert_eq!(name_parts("Ada"), (Some("Ada"), None, None));
    }
}
