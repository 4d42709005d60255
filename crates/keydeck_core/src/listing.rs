use crate::key_value::{KeyRecord, KeyType, NO_EXPIRY, normalize_ttl};
use crate::size::{format_bytes, parse_size_bytes};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Label the table uses for keys without an expiry.
pub const INFINITE_TTL_LABEL: &str = "∞";

static TTL_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("TTL digit pattern is valid"));

/// Cell texts scraped from one server-rendered table row.
///
/// Every cell is optional: the scrape reports what it found and the
/// normalizer decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupRow {
    pub key: Option<String>,
    pub type_label: Option<String>,
    pub preview: Option<String>,
    pub size_label: Option<String>,
    pub ttl_label: Option<String>,
    /// Set for the "no keys" placeholder row.
    pub placeholder: bool,
}

impl MarkupRow {
    pub fn new(key: impl Into<String>, type_label: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            type_label: Some(type_label.into()),
            ..Self::default()
        }
    }

    pub fn placeholder() -> Self {
        Self {
            placeholder: true,
            ..Self::default()
        }
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    pub fn with_size_label(mut self, label: impl Into<String>) -> Self {
        self.size_label = Some(label.into());
        self
    }

    pub fn with_ttl_label(mut self, label: impl Into<String>) -> Self {
        self.ttl_label = Some(label.into());
        self
    }
}

/// One key as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub key: String,
    #[serde(rename = "type")]
    pub key_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default = "no_expiry")]
    pub ttl: i64,
    #[serde(default)]
    pub preview: String,
}

fn no_expiry() -> i64 {
    NO_EXPIRY
}

/// The two shapes an initial key listing can arrive in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawListing {
    Markup(Vec<MarkupRow>),
    Payload(Vec<ListingEntry>),
}

impl RawListing {
    pub fn len(&self) -> usize {
        match self {
            RawListing::Markup(rows) => rows.len(),
            RawListing::Payload(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read a TTL badge: the infinity marker means no expiry, otherwise the
/// first run of digits is the number of seconds.
pub fn parse_ttl_label(label: &str) -> i64 {
    let trimmed = label.trim();
    if trimmed.is_empty() || trimmed == INFINITE_TTL_LABEL {
        return NO_EXPIRY;
    }

    TTL_DIGITS
        .find(trimmed)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map(normalize_ttl)
        .unwrap_or(NO_EXPIRY)
}

/// Build the session's key records from whatever listing is available.
///
/// A missing listing is the "no data" state and produces no records.
pub fn normalize(listing: Option<RawListing>) -> Vec<KeyRecord> {
    let Some(listing) = listing else {
        log::debug!("No key listing available");
        return Vec::new();
    };

    let candidates: Vec<KeyRecord> = match listing {
        RawListing::Markup(rows) => rows.into_iter().filter_map(record_from_markup).collect(),
        RawListing::Payload(entries) => entries.into_iter().filter_map(record_from_entry).collect(),
    };

    let mut seen = HashSet::with_capacity(candidates.len());
    let records: Vec<KeyRecord> = candidates
        .into_iter()
        .filter(|record| {
            let fresh = seen.insert(record.key.clone());
            if !fresh {
                log::warn!("Duplicate key '{}' in listing, keeping the first", record.key);
            }
            fresh
        })
        .collect();

    log::info!("Loaded {} keys", records.len());
    records
}

fn record_from_markup(row: MarkupRow) -> Option<KeyRecord> {
    if row.placeholder {
        return None;
    }

    let key = row.key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())?;
    let type_display = row
        .type_label
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())?;

    let Some(key_type) = KeyType::parse(&type_display) else {
        log::warn!("Skipping key '{}' with unsupported type '{}'", key, type_display);
        return None;
    };

    let size_text = row
        .size_label
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| format_bytes(0));
    let size = parse_size_bytes(&size_text);
    let ttl = row.ttl_label.as_deref().map(parse_ttl_label).unwrap_or(NO_EXPIRY);

    Some(
        KeyRecord::new(key, key_type)
            .with_type_display(type_display)
            .with_preview(row.preview.map(|p| p.trim().to_string()).unwrap_or_default())
            .with_size_text(size, size_text)
            .with_ttl(ttl),
    )
}

fn record_from_entry(entry: ListingEntry) -> Option<KeyRecord> {
    if entry.key.is_empty() || entry.key_type.trim().is_empty() {
        return None;
    }

    let Some(key_type) = KeyType::parse(&entry.key_type) else {
        log::warn!(
            "Skipping key '{}' with unsupported type '{}'",
            entry.key,
            entry.key_type
        );
        return None;
    };

    Some(
        KeyRecord::new(entry.key, key_type)
            .with_type_display(entry.key_type.trim())
            .with_preview(entry.preview)
            .with_size(entry.size)
            .with_ttl(entry.ttl),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_labels() {
        assert_eq!(parse_ttl_label("∞"), NO_EXPIRY);
        assert_eq!(parse_ttl_label(" ∞ "), NO_EXPIRY);
        assert_eq!(parse_ttl_label("120s"), 120);
        assert_eq!(parse_ttl_label("expires in 45 seconds"), 45);
        assert_eq!(parse_ttl_label("never"), NO_EXPIRY);
        assert_eq!(parse_ttl_label("0s"), NO_EXPIRY);
    }

    #[test]
    fn markup_rows_keep_display_casing() {
        let records = normalize(Some(RawListing::Markup(vec![
            MarkupRow::new("user:1", "HASH")
                .with_preview("  Hash with 2 fields ")
                .with_size_label("1.5 KB")
                .with_ttl_label("30s"),
        ])));

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.key_type, KeyType::Hash);
        assert_eq!(record.type_display, "HASH");
        assert_eq!(record.preview, "Hash with 2 fields");
        assert_eq!(record.size, 1536);
        assert_eq!(record.size_text, "1.5 KB");
        assert_eq!(record.ttl, 30);
    }

    #[test]
    fn placeholder_and_incomplete_rows_are_skipped() {
        let records = normalize(Some(RawListing::Markup(vec![
            MarkupRow::placeholder(),
            MarkupRow {
                key: Some("orphan".to_string()),
                ..MarkupRow::default()
            },
            MarkupRow {
                type_label: Some("string".to_string()),
                ..MarkupRow::default()
            },
            MarkupRow::new("   ", "string"),
            MarkupRow::new("kept", "string"),
        ])));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "kept");
        assert_eq!(records[0].size_text, "0 Bytes");
        assert_eq!(records[0].ttl, NO_EXPIRY);
    }

    #[test]
    fn unsupported_types_are_skipped() {
        let records = normalize(Some(RawListing::Payload(vec![
            ListingEntry {
                key: "events".to_string(),
                key_type: "stream".to_string(),
                size: 10,
                ttl: -1,
                preview: String::new(),
            },
            ListingEntry {
                key: "name".to_string(),
                key_type: "string".to_string(),
                size: 2048,
                ttl: 0,
                preview: "alice".to_string(),
            },
        ])));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].size_text, "2 KB");
        assert_eq!(records[0].ttl, NO_EXPIRY);
    }

    #[test]
    fn duplicate_keys_keep_first_occurrence() {
        let records = normalize(Some(RawListing::Markup(vec![
            MarkupRow::new("a", "string").with_preview("first"),
            MarkupRow::new("a", "list").with_preview("second"),
        ])));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].preview, "first");
    }

    #[test]
    fn missing_listing_is_empty() {
        assert!(normalize(None).is_empty());
        assert!(normalize(Some(RawListing::Payload(Vec::new()))).is_empty());
    }

    #[test]
    fn listing_entry_deserializes_with_defaults() {
        let entry: ListingEntry =
            serde_json::from_str(r#"{"key": "k", "type": "set", "value": ["a"], "length": 1}"#)
                .unwrap();
        assert_eq!(entry.ttl, NO_EXPIRY);
        assert_eq!(entry.size, 0);
        assert!(entry.preview.is_empty());
    }
}
