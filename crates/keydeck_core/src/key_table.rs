use crate::key_value::{KeyRecord, KeyType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Which records the table shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KeyFilter {
    #[default]
    All,
    Type(KeyType),
}

impl KeyFilter {
    /// `"all"` or a type name; anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Some(KeyFilter::All);
        }
        KeyType::parse(trimmed).map(KeyFilter::Type)
    }

    pub fn matches(self, record: &KeyRecord) -> bool {
        match self {
            KeyFilter::All => true,
            KeyFilter::Type(key_type) => record.key_type == key_type,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyFilter::All => "all",
            KeyFilter::Type(key_type) => key_type.as_str(),
        }
    }
}

impl fmt::Display for KeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column the table is ordered by. Ordering is always ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Key,
    Type,
    Size,
    Ttl,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Key, SortKey::Type, SortKey::Size, SortKey::Ttl];

    /// Unrecognised names sort by key.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str().eq_ignore_ascii_case(value))
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Key => "key",
            SortKey::Type => "type",
            SortKey::Size => "size",
            SortKey::Ttl => "ttl",
        }
    }

    pub fn compare(self, a: &KeyRecord, b: &KeyRecord) -> Ordering {
        match self {
            SortKey::Key => compare_key_names(&a.key, &b.key),
            SortKey::Type => a.key_type.as_str().cmp(b.key_type.as_str()),
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::Ttl => match (a.has_expiry(), b.has_expiry()) {
                (true, true) => a.ttl.cmp(&b.ttl),
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dictionary-style ordering for key names: letters compare without regard
/// to case first, and on a tie the lowercase spelling comes first.
///
/// Each step compares whole sequences, so the result is a total order even
/// for characters whose lowercase form is longer than one char.
pub fn compare_key_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded
        .then_with(|| case_ranks(a).cmp(case_ranks(b)))
        .then_with(|| a.cmp(b))
}

fn case_ranks(name: &str) -> impl Iterator<Item = u8> + '_ {
    name.chars().map(|c| if c.is_lowercase() { 0 } else { 1 })
}

/// Records matching `filter`, ordered by `sort`. Equal records keep their
/// listing order.
pub fn apply(all_keys: &[KeyRecord], filter: KeyFilter, sort: SortKey) -> Vec<KeyRecord> {
    let mut filtered: Vec<KeyRecord> = all_keys
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect();

    filtered.sort_by(|a, b| sort.compare(a, b));
    filtered
}
