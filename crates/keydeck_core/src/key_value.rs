use crate::ConsoleError;
use crate::size::format_bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// TTL marker for keys without an expiry.
pub const NO_EXPIRY: i64 = -1;

/// TTL the store reports for a key that does not exist.
const MISSING_KEY_TTL: i64 = -2;

/// Type name the store reports for a key that does not exist.
const MISSING_KEY_TYPE: &str = "none";

/// Value types the console can list, view and edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    String,
    Hash,
    List,
    Set,
    ZSet,
}

impl KeyType {
    pub const ALL: [KeyType; 5] = [
        KeyType::String,
        KeyType::Hash,
        KeyType::List,
        KeyType::Set,
        KeyType::ZSet,
    ];

    /// Wire name, as reported by `TYPE` and used in `value_type` form fields.
    pub fn as_str(self) -> &'static str {
        match self {
            KeyType::String => "string",
            KeyType::Hash => "hash",
            KeyType::List => "list",
            KeyType::Set => "set",
            KeyType::ZSet => "zset",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            KeyType::String => "String",
            KeyType::Hash => "Hash",
            KeyType::List => "List",
            KeyType::Set => "Set",
            KeyType::ZSet => "ZSet",
        }
    }

    /// Case-insensitive lookup of a type label. Returns `None` for types the
    /// console does not handle (`stream`, `none`, module types).
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|key_type| key_type.as_str().eq_ignore_ascii_case(label))
    }

    pub fn edit_placeholder(self) -> &'static str {
        match self {
            KeyType::String => "Enter a string value...",
            KeyType::Hash => r#"{"field1": "value1", "field2": "value2"}"#,
            KeyType::List => r#"["item1", "item2", "item3"]"#,
            KeyType::Set | KeyType::ZSet => r#"["member1", "member2", "member3"]"#,
        }
    }

    pub fn edit_hint(self) -> &'static str {
        match self {
            KeyType::String => "Any text or JSON",
            KeyType::Hash => "A JSON object of fields and values",
            KeyType::List => "A JSON array of list items",
            KeyType::Set | KeyType::ZSet => "A JSON array of members",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyType::parse(s).ok_or_else(|| ConsoleError::UnsupportedType(s.trim().to_string()))
    }
}

/// Collapse anything that is not a positive number of seconds to
/// [`NO_EXPIRY`].
pub fn normalize_ttl(ttl: i64) -> i64 {
    if ttl > 0 { ttl } else { NO_EXPIRY }
}

/// One row of the key table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub key: String,
    pub key_type: KeyType,
    pub type_display: String,
    pub preview: String,
    pub size: u64,
    pub size_text: String,
    pub ttl: i64,
}

impl KeyRecord {
    pub fn new(key: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            key: key.into(),
            key_type,
            type_display: key_type.as_str().to_string(),
            preview: String::new(),
            size: 0,
            size_text: format_bytes(0),
            ttl: NO_EXPIRY,
        }
    }

    pub fn with_type_display(mut self, display: impl Into<String>) -> Self {
        self.type_display = display.into();
        self
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = preview.into();
        self
    }

    /// Sets the byte count and derives the size label from it.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self.size_text = format_bytes(size);
        self
    }

    pub fn with_size_text(mut self, size: u64, size_text: impl Into<String>) -> Self {
        self.size = size;
        self.size_text = size_text.into();
        self
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = normalize_ttl(ttl);
        self
    }

    pub fn has_expiry(&self) -> bool {
        self.ttl != NO_EXPIRY
    }
}

/// A sorted-set entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ZSetMember {
    pub member: JsonValue,
    pub score: f64,
}

impl ZSetMember {
    pub fn new(member: impl Into<JsonValue>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

/// Full value of a key, polymorphic over its type.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPayload {
    String(String),
    Hash(IndexMap<String, JsonValue>),
    List(Vec<JsonValue>),
    Set(Vec<JsonValue>),
    /// Ordered by ascending score; rank is the position.
    ZSet(Vec<ZSetMember>),
}

impl KeyPayload {
    pub fn key_type(&self) -> KeyType {
        match self {
            KeyPayload::String(_) => KeyType::String,
            KeyPayload::Hash(_) => KeyType::Hash,
            KeyPayload::List(_) => KeyType::List,
            KeyPayload::Set(_) => KeyType::Set,
            KeyPayload::ZSet(_) => KeyType::ZSet,
        }
    }

    /// Number of fields, items or members. Strings count characters.
    pub fn len(&self) -> usize {
        match self {
            KeyPayload::String(text) => text.chars().count(),
            KeyPayload::Hash(fields) => fields.len(),
            KeyPayload::List(items) | KeyPayload::Set(items) => items.len(),
            KeyPayload::ZSet(members) => members.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interpret the `value` field of a key detail response.
    ///
    /// `null` is read as an empty value of the given type. Sorted sets accept
    /// both `{"member": m, "score": s}` objects and `[m, s]` pairs, with the
    /// score as a number or a numeric string.
    pub fn from_json(key_type: KeyType, value: JsonValue) -> Result<Self, ConsoleError> {
        match key_type {
            KeyType::String => Ok(KeyPayload::String(match value {
                JsonValue::Null => String::new(),
                JsonValue::String(text) => text,
                other => other.to_string(),
            })),
            KeyType::Hash => match value {
                JsonValue::Null => Ok(KeyPayload::Hash(IndexMap::new())),
                JsonValue::Object(map) => Ok(KeyPayload::Hash(map.into_iter().collect())),
                other => Err(unexpected_shape(key_type, &other)),
            },
            KeyType::List => match value {
                JsonValue::Null => Ok(KeyPayload::List(Vec::new())),
                JsonValue::Array(items) => Ok(KeyPayload::List(items)),
                other => Err(unexpected_shape(key_type, &other)),
            },
            KeyType::Set => match value {
                JsonValue::Null => Ok(KeyPayload::Set(Vec::new())),
                JsonValue::Array(items) => Ok(KeyPayload::Set(items)),
                other => Err(unexpected_shape(key_type, &other)),
            },
            KeyType::ZSet => {
                let items = match value {
                    JsonValue::Null => Vec::new(),
                    JsonValue::Array(items) => items,
                    other => return Err(unexpected_shape(key_type, &other)),
                };

                let mut members = items
                    .into_iter()
                    .map(parse_zset_member)
                    .collect::<Result<Vec<_>, _>>()?;
                members.sort_by(|a, b| a.score.total_cmp(&b.score));

                Ok(KeyPayload::ZSet(members))
            }
        }
    }
}

fn unexpected_shape(key_type: KeyType, value: &JsonValue) -> ConsoleError {
    let shape = match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    };
    ConsoleError::invalid_response(format!("{} value arrived as {}", key_type, shape))
}

fn parse_zset_member(item: JsonValue) -> Result<ZSetMember, ConsoleError> {
    let (member, score) = match item {
        JsonValue::Object(mut map) => {
            let member = map.remove("member").unwrap_or(JsonValue::Null);
            let score = map.remove("score").unwrap_or(JsonValue::Null);
            (member, score)
        }
        JsonValue::Array(pair) if pair.len() == 2 => {
            let mut pair = pair.into_iter();
            let member = pair.next().unwrap_or(JsonValue::Null);
            let score = pair.next().unwrap_or(JsonValue::Null);
            (member, score)
        }
        other => {
            return Err(ConsoleError::invalid_response(format!(
                "sorted set entry is not a member/score pair: {}",
                other
            )));
        }
    };

    let score = match &score {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ConsoleError::invalid_response(format!("invalid sorted set score: {}", score)))?;

    Ok(ZSetMember { member, score })
}

/// Key detail response as it arrives on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawKeyDetail {
    pub key: String,
    #[serde(rename = "type")]
    pub key_type: String,
    #[serde(default)]
    pub value: JsonValue,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub size: u64,
    #[serde(default = "no_expiry")]
    pub ttl: i64,
    #[serde(default)]
    pub encoding: Option<String>,
}

fn no_expiry() -> i64 {
    NO_EXPIRY
}

/// Full value of one key plus its metadata, fetched for view and edit.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDetail {
    pub key: String,
    pub value: KeyPayload,
    pub length: Option<u64>,
    pub size: u64,
    pub ttl: i64,
    pub encoding: Option<String>,
}

impl KeyDetail {
    pub fn new(key: impl Into<String>, value: KeyPayload) -> Self {
        Self {
            key: key.into(),
            value,
            length: None,
            size: 0,
            ttl: NO_EXPIRY,
            encoding: None,
        }
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = normalize_ttl(ttl);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn key_type(&self) -> KeyType {
        self.value.key_type()
    }

    /// Element count as reported by the server, falling back to the
    /// payload itself.
    pub fn element_count(&self) -> u64 {
        match self.length {
            Some(length) if length > 0 => length,
            _ => self.value.len() as u64,
        }
    }
}

impl TryFrom<RawKeyDetail> for KeyDetail {
    type Error = ConsoleError;

    fn try_from(raw: RawKeyDetail) -> Result<Self, Self::Error> {
        let missing = raw.key_type.trim().eq_ignore_ascii_case(MISSING_KEY_TYPE);
        if missing || raw.ttl == MISSING_KEY_TTL {
            return Err(ConsoleError::not_found(raw.key));
        }

        let key_type = KeyType::parse(&raw.key_type)
            .ok_or_else(|| ConsoleError::UnsupportedType(raw.key_type.clone()))?;

        Ok(Self {
            value: KeyPayload::from_json(key_type, raw.value)?,
            key: raw.key,
            length: raw.length,
            size: raw.size,
            ttl: normalize_ttl(raw.ttl),
            encoding: raw.encoding,
        })
    }
}

/// Full overwrite of a key, as submitted from the add/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyWriteRequest {
    pub key: String,
    pub key_type: KeyType,
    /// Raw text for strings, compact JSON for structured types.
    pub value: String,
    pub ttl: i64,
}

impl KeyWriteRequest {
    pub fn new(key: impl Into<String>, key_type: KeyType, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            key_type,
            value: value.into(),
            ttl: NO_EXPIRY,
        }
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Form fields in the order the write endpoint expects them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("key", self.key.clone()),
            ("value_type", self.key_type.as_str().to_string()),
            ("value", self.value.clone()),
            ("ttl", self.ttl.to_string()),
        ]
    }
}
