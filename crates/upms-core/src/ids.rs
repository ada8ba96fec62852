//! Parsing of textual id lists.
//!
//! Callers hand over id lists as plain text: comma-separated for role
//! grants and sub-user role requests, whitespace-separated for a
//! user's role and resource sets. Parsing is permissive: entries that
//! are not valid UUIDs are skipped without error, and repeated ids are
//! kept once, in order of first appearance.

use std::collections::HashSet;

use uuid::Uuid;

/// How the entries of an id list are delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSeparator {
    Comma,
    Whitespace,
}

pub fn parse_id_list(input: &str, separator: IdSeparator) -> Vec<Uuid> {
    let input = input.trim();
    let entries: Box<dyn Iterator<Item = &str>> = match separator {
        IdSeparator::Comma => Box::new(input.split(',')),
        IdSeparator::Whitespace => Box::new(input.split_whitespace()),
    };

    let mut seen = HashSet::new();
    entries
        .filter_map(|entry| Uuid::parse_str(entry.trim()).ok())
        .filter(|id| seen.insert(*id))
        .collect()
}
