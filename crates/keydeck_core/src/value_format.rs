//! Type-specific views of a key's value and the text form used by the
//! edit box.
//!
//! Plain strings inside structured values are shown without quotes and
//! nested values as compact JSON. Edit text for strings is the raw value;
//! every other type is edited as pretty-printed JSON. Sorted sets are
//! edited as a bare member array, so their scores do not survive an edit.

use crate::error::ConsoleError;
use crate::key_value::{KeyDetail, KeyPayload, KeyType};
use crate::render::html_escape;
use crate::size::format_bytes;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fmt::Write as _;

const UNKNOWN_ENCODING: &str = "unknown";

/// Text of a nested value: strings unquoted, anything else compact JSON.
pub fn display_scalar(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn ttl_label(ttl: i64) -> String {
    if ttl > 0 {
        format!("{} seconds", ttl)
    } else {
        "No expiry".to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedMember {
    pub rank: usize,
    pub member: String,
    pub score: f64,
}

/// How a value is laid out in the view dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayForm {
    /// String value; pretty-printed when it held a JSON object or array.
    Text { text: String, pretty_json: bool },
    /// Hash fields in stored order.
    Fields(Vec<(String, String)>),
    /// List items; the position is the index.
    Items(Vec<String>),
    Members(Vec<String>),
    Ranked(Vec<RankedMember>),
}

impl DisplayForm {
    pub fn from_payload(payload: &KeyPayload) -> Self {
        match payload {
            KeyPayload::String(text) => match pretty_json_text(text) {
                Some(pretty) => DisplayForm::Text {
                    text: pretty,
                    pretty_json: true,
                },
                None => DisplayForm::Text {
                    text: text.clone(),
                    pretty_json: false,
                },
            },
            KeyPayload::Hash(fields) => DisplayForm::Fields(
                fields
                    .iter()
                    .map(|(field, value)| (field.clone(), display_scalar(value)))
                    .collect(),
            ),
            KeyPayload::List(items) => {
                DisplayForm::Items(items.iter().map(display_scalar).collect())
            }
            KeyPayload::Set(members) => {
                DisplayForm::Members(members.iter().map(display_scalar).collect())
            }
            KeyPayload::ZSet(members) => DisplayForm::Ranked(
                members
                    .iter()
                    .enumerate()
                    .map(|(rank, entry)| RankedMember {
                        rank,
                        member: display_scalar(&entry.member),
                        score: entry.score,
                    })
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DisplayForm::Text { .. } => 1,
            DisplayForm::Fields(fields) => fields.len(),
            DisplayForm::Items(items) | DisplayForm::Members(items) => items.len(),
            DisplayForm::Ranked(members) => members.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn pretty_json_text(text: &str) -> Option<String> {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }

    let parsed: JsonValue = serde_json::from_str(text).ok()?;
    if !(parsed.is_object() || parsed.is_array()) {
        return None;
    }
    serde_json::to_string_pretty(&parsed).ok()
}

/// Everything the view dialog shows for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyView {
    pub key: String,
    pub key_type: KeyType,
    pub ttl_label: String,
    pub size_text: String,
    pub encoding: String,
    pub element_count: u64,
    pub display: DisplayForm,
}

impl KeyView {
    pub fn from_detail(detail: &KeyDetail) -> Self {
        Self {
            key: detail.key.clone(),
            key_type: detail.key_type(),
            ttl_label: ttl_label(detail.ttl),
            size_text: format_bytes(detail.size),
            encoding: detail
                .encoding
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| UNKNOWN_ENCODING.to_string()),
            element_count: detail.element_count(),
            display: DisplayForm::from_payload(&detail.value),
        }
    }

    fn count_label(&self) -> &'static str {
        match self.key_type {
            KeyType::String => "Length",
            KeyType::Hash => "Fields",
            KeyType::List | KeyType::Set | KeyType::ZSet => "Elements",
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();

        let _ = write!(
            out,
            "<div class=\"key-meta\">\
             <div class=\"meta-item\"><strong>Type:</strong>\
             <span class=\"type-badge type-{}\">{}</span></div>\
             <div class=\"meta-item\"><strong>{}:</strong><span>{}</span></div>\
             <div class=\"meta-item\"><strong>TTL:</strong><span>{}</span></div>\
             <div class=\"meta-item\"><strong>Size:</strong><span>{}</span></div>\
             <div class=\"meta-item\"><strong>Encoding:</strong><span>{}</span></div>\
             </div>",
            self.key_type.as_str(),
            self.key_type.as_str(),
            self.count_label(),
            self.element_count,
            html_escape(&self.ttl_label),
            html_escape(&self.size_text),
            html_escape(&self.encoding),
        );

        out.push_str("<div class=\"value-display\">");
        match &self.display {
            DisplayForm::Text { text, .. } => {
                let _ = write!(
                    out,
                    "<h4>Value:</h4><pre class=\"json-display\">{}</pre>",
                    html_escape(text)
                );
            }
            DisplayForm::Fields(fields) => {
                let _ = write!(
                    out,
                    "<h4>Fields ({}):</h4><div class=\"hash-fields\">",
                    fields.len()
                );
                for (field, value) in fields {
                    let _ = write!(
                        out,
                        "<div class=\"hash-field\"><div class=\"field-name\">{}:</div>\
                         <div class=\"field-value\">{}</div></div>",
                        html_escape(field),
                        html_escape(value)
                    );
                }
                out.push_str("</div>");
            }
            DisplayForm::Items(items) => {
                let _ = write!(
                    out,
                    "<h4>List items ({}):</h4><div class=\"list-items\">",
                    items.len()
                );
                for (index, item) in items.iter().enumerate() {
                    let _ = write!(
                        out,
                        "<div class=\"list-item\"><div class=\"item-index\">[{}]</div>\
                         <div class=\"item-value\">{}</div></div>",
                        index,
                        html_escape(item)
                    );
                }
                out.push_str("</div>");
            }
            DisplayForm::Members(members) => {
                let _ = write!(
                    out,
                    "<h4>Set members ({}):</h4><div class=\"set-members\">",
                    members.len()
                );
                for member in members {
                    let _ = write!(
                        out,
                        "<div class=\"set-member\"><div class=\"member-value\">{}</div></div>",
                        html_escape(member)
                    );
                }
                out.push_str("</div>");
            }
            DisplayForm::Ranked(members) => {
                let _ = write!(
                    out,
                    "<h4>Sorted set members ({}):</h4><table class=\"zset-table\">\
                     <thead><tr><th>Rank</th><th>Member</th><th>Score</th></tr></thead><tbody>",
                    members.len()
                );
                for entry in members {
                    let _ = write!(
                        out,
                        "<tr><td>{}</td><td>{}</td><td class=\"score\">{}</td></tr>",
                        entry.rank,
                        html_escape(&entry.member),
                        entry.score
                    );
                }
                out.push_str("</tbody></table>");
            }
        }
        out.push_str("</div>");

        out
    }

    /// Plain-text rendering for terminals.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Key:      {}", self.key);
        let _ = writeln!(out, "Type:     {}", self.key_type);
        let _ = writeln!(out, "{:<9} {}", format!("{}:", self.count_label()), self.element_count);
        let _ = writeln!(out, "TTL:      {}", self.ttl_label);
        let _ = writeln!(out, "Size:     {}", self.size_text);
        let _ = writeln!(out, "Encoding: {}", self.encoding);
        out.push('\n');

        match &self.display {
            DisplayForm::Text { text, .. } => {
                let _ = writeln!(out, "{}", text);
            }
            DisplayForm::Fields(fields) => {
                for (field, value) in fields {
                    let _ = writeln!(out, "{}: {}", field, value);
                }
            }
            DisplayForm::Items(items) => {
                for (index, item) in items.iter().enumerate() {
                    let _ = writeln!(out, "[{}] {}", index, item);
                }
            }
            DisplayForm::Members(members) => {
                for member in members {
                    let _ = writeln!(out, "- {}", member);
                }
            }
            DisplayForm::Ranked(members) => {
                let _ = writeln!(out, "{:<6} {:<30} Score", "Rank", "Member");
                for entry in members {
                    let _ = writeln!(out, "{:<6} {:<30} {}", entry.rank, entry.member, entry.score);
                }
            }
        }

        out
    }
}

/// Text placed in the edit box for an existing value.
pub fn edit_text(payload: &KeyPayload) -> String {
    match payload {
        KeyPayload::String(text) => text.clone(),
        KeyPayload::Hash(fields) => {
            let object: serde_json::Map<String, JsonValue> = fields
                .iter()
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect();
            pretty(&JsonValue::Object(object))
        }
        KeyPayload::List(items) | KeyPayload::Set(items) => {
            pretty(&JsonValue::Array(items.clone()))
        }
        KeyPayload::ZSet(members) => pretty(&JsonValue::Array(
            members.iter().map(|entry| entry.member.clone()).collect(),
        )),
    }
}

fn pretty(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// A validated value from the edit box, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub enum EditValue {
    String(String),
    Hash(IndexMap<String, JsonValue>),
    List(Vec<JsonValue>),
    /// Distinct members in first-seen order.
    Set(Vec<JsonValue>),
    /// Members only; scores are assigned by the server.
    ZSet(Vec<JsonValue>),
}

impl EditValue {
    pub fn key_type(&self) -> KeyType {
        match self {
            EditValue::String(_) => KeyType::String,
            EditValue::Hash(_) => KeyType::Hash,
            EditValue::List(_) => KeyType::List,
            EditValue::Set(_) => KeyType::Set,
            EditValue::ZSet(_) => KeyType::ZSet,
        }
    }

    /// Text sent to the write endpoint: raw for strings, compact JSON
    /// otherwise.
    pub fn to_wire(&self) -> String {
        match self {
            EditValue::String(text) => text.clone(),
            EditValue::Hash(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect(),
            )
            .to_string(),
            EditValue::List(items) | EditValue::Set(items) | EditValue::ZSet(items) => {
                JsonValue::Array(items.clone()).to_string()
            }
        }
    }
}

/// Validate edit box text for the given type.
pub fn parse_edit_text(key_type: KeyType, text: &str) -> Result<EditValue, ConsoleError> {
    if key_type == KeyType::String {
        return Ok(EditValue::String(text.to_string()));
    }

    let parsed: JsonValue = serde_json::from_str(text).map_err(|e| {
        ConsoleError::invalid_edit_value(key_type.as_str(), format!("invalid JSON: {}", e))
    })?;

    match (key_type, parsed) {
        (KeyType::Hash, JsonValue::Object(map)) => Ok(EditValue::Hash(map.into_iter().collect())),
        (KeyType::Hash, _) => Err(ConsoleError::invalid_edit_value(
            key_type.as_str(),
            "expected a JSON object",
        )),
        (KeyType::List, JsonValue::Array(items)) => Ok(EditValue::List(items)),
        (KeyType::Set, JsonValue::Array(items)) => Ok(EditValue::Set(dedupe(items))),
        (KeyType::ZSet, JsonValue::Array(items)) => Ok(EditValue::ZSet(items)),
        (_, _) => Err(ConsoleError::invalid_edit_value(
            key_type.as_str(),
            "expected a JSON array",
        )),
    }
}

fn dedupe(items: Vec<JsonValue>) -> Vec<JsonValue> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_value::ZSetMember;
    use serde_json::json;

    fn hash(value: JsonValue) -> IndexMap<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map.into_iter().collect(),
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn hash_edit_round_trip() {
        let fields = hash(json!({"name": "alice", "age": "30", "meta": {"tags": ["a", "b"]}}));
        let payload = KeyPayload::Hash(fields.clone());

        let text = edit_text(&payload);
        assert!(text.contains('\n'));

        let parsed = parse_edit_text(KeyType::Hash, &text).unwrap();
        assert_eq!(parsed, EditValue::Hash(fields));
    }

    #[test]
    fn string_list_and_set_round_trip() {
        let string = KeyPayload::String("  hello {not json ".to_string());
        assert_eq!(
            parse_edit_text(KeyType::String, &edit_text(&string)).unwrap(),
            EditValue::String("  hello {not json ".to_string())
        );

        let items = vec![json!("a"), json!(1), json!({"x": [1, 2]}), json!("a")];
        let list = KeyPayload::List(items.clone());
        assert_eq!(
            parse_edit_text(KeyType::List, &edit_text(&list)).unwrap(),
            EditValue::List(items)
        );

        let members = vec![json!("x"), json!("y")];
        let set = KeyPayload::Set(members.clone());
        assert_eq!(
            parse_edit_text(KeyType::Set, &edit_text(&set)).unwrap(),
            EditValue::Set(members)
        );
    }

    #[test]
    fn zset_edit_drops_scores() {
        let payload = KeyPayload::ZSet(vec![
            ZSetMember::new("low", 1.0),
            ZSetMember::new("high", 9.5),
        ]);
        let text = edit_text(&payload);
        let parsed = parse_edit_text(KeyType::ZSet, &text).unwrap();
        assert_eq!(parsed, EditValue::ZSet(vec![json!("low"), json!("high")]));
        assert!(!text.contains("9.5"));
    }

    #[test]
    fn set_input_is_deduplicated_in_first_seen_order() {
        let parsed = parse_edit_text(KeyType::Set, r#"["b", "a", "b", 1, "1", 1]"#).unwrap();
        assert_eq!(parsed, EditValue::Set(vec![json!("b"), json!("a"), json!(1), json!("1")]));
    }

    #[test]
    fn malformed_structured_input_is_rejected() {
        assert!(matches!(
            parse_edit_text(KeyType::Hash, "[1, 2]"),
            Err(ConsoleError::InvalidEditValue { .. })
        ));
        assert!(matches!(
            parse_edit_text(KeyType::List, "{\"a\": 1}"),
            Err(ConsoleError::InvalidEditValue { .. })
        ));
        assert!(matches!(
            parse_edit_text(KeyType::Set, "not json"),
            Err(ConsoleError::InvalidEditValue { .. })
        ));
        assert!(parse_edit_text(KeyType::String, "not json").is_ok());
    }

    #[test]
    fn wire_form_is_compact() {
        let text = "{\n  \"a\": \"1\",\n  \"b\": [1, 2]\n}";
        let value = parse_edit_text(KeyType::Hash, text).unwrap();
        assert_eq!(value.to_wire(), r#"{"a":"1","b":[1,2]}"#);
        assert_eq!(EditValue::String("raw text".into()).to_wire(), "raw text");
        assert_eq!(EditValue::List(vec![json!("x")]).to_wire(), r#"["x"]"#);
    }

    #[test]
    fn string_display_pretty_prints_json_objects() {
        let form = DisplayForm::from_payload(&KeyPayload::String(r#"{"a":1}"#.to_string()));
        assert_eq!(
            form,
            DisplayForm::Text {
                text: "{\n  \"a\": 1\n}".to_string(),
                pretty_json: true
            }
        );

        let plain = DisplayForm::from_payload(&KeyPayload::String("42".to_string()));
        assert_eq!(
            plain,
            DisplayForm::Text {
                text: "42".to_string(),
                pretty_json: false
            }
        );
    }

    #[test]
    fn nested_values_display_as_compact_json() {
        let payload = KeyPayload::List(vec![json!("plain"), json!({"k": [1]})]);
        let form = DisplayForm::from_payload(&payload);
        assert_eq!(
            form,
            DisplayForm::Items(vec!["plain".to_string(), r#"{"k":[1]}"#.to_string()])
        );
    }

    #[test]
    fn view_metadata() {
        let detail = KeyDetail::new(
            "scores",
            KeyPayload::ZSet(vec![ZSetMember::new("a", 1.0), ZSetMember::new("b", 2.5)]),
        )
        .with_ttl(90)
        .with_size(1536);

        let view = KeyView::from_detail(&detail);
        assert_eq!(view.ttl_label, "90 seconds");
        assert_eq!(view.size_text, "1.5 KB");
        assert_eq!(view.encoding, "unknown");
        assert_eq!(view.element_count, 2);

        let text = view.to_text();
        assert!(text.contains("Encoding: unknown"));
        assert!(text.contains("2.5"));

        let html = view.to_html();
        assert!(html.contains("zset-table"));
        assert!(html.contains("<td class=\"score\">2.5</td>"));
    }

    #[test]
    fn view_html_escapes_values() {
        let mut fields = IndexMap::new();
        fields.insert("<b>".to_string(), json!("x & y"));
        let detail = KeyDetail::new("h", KeyPayload::Hash(fields)).with_encoding("listpack");

        let html = KeyView::from_detail(&detail).to_html();
        assert!(html.contains("&lt;b&gt;:"));
        assert!(html.contains("x &amp; y"));
        assert!(html.contains("listpack"));
        assert_eq!(KeyView::from_detail(&detail).ttl_label, "No expiry");
    }
}
