use indexmap::IndexMap;
use keydeck_core::{KeyDetail, KeyPayload, ZSetMember};
use serde_json::{Value as JsonValue, json};

pub fn string_key(key: &str, value: &str) -> KeyDetail {
    KeyDetail::new(key, KeyPayload::String(value.to_string())).with_size(value.len() as u64)
}

pub fn hash_key(key: &str, fields: &[(&str, JsonValue)]) -> KeyDetail {
    let map: IndexMap<String, JsonValue> = fields
        .iter()
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect();
    KeyDetail::new(key, KeyPayload::Hash(map)).with_size(64 * fields.len() as u64)
}

pub fn list_key(key: &str, items: Vec<JsonValue>) -> KeyDetail {
    let size = 16 * items.len() as u64;
    KeyDetail::new(key, KeyPayload::List(items)).with_size(size)
}

pub fn set_key(key: &str, members: Vec<JsonValue>) -> KeyDetail {
    let size = 16 * members.len() as u64;
    KeyDetail::new(key, KeyPayload::Set(members)).with_size(size)
}

pub fn zset_key(key: &str, members: &[(&str, f64)]) -> KeyDetail {
    let mut members: Vec<ZSetMember> = members
        .iter()
        .map(|(member, score)| ZSetMember::new(*member, *score))
        .collect();
    members.sort_by(|a, b| a.score.total_cmp(&b.score));
    let size = 24 * members.len() as u64;
    KeyDetail::new(key, KeyPayload::ZSet(members)).with_size(size)
}

/// One key of each type with a mix of expiries.
pub fn sample_keys() -> Vec<KeyDetail> {
    vec![
        string_key("greeting", "hello world").with_ttl(300),
        hash_key(
            "user:1",
            &[
                ("name", json!("alice")),
                ("age", json!("30")),
                ("meta", json!({"roles": ["admin"]})),
            ],
        ),
        list_key("queue:jobs", vec![json!("job-1"), json!("job-2"), json!("job-3")]).with_ttl(60),
        set_key("tags", vec![json!("red"), json!("green")]),
        zset_key("leaderboard", &[("bob", 12.0), ("carol", 30.5), ("dave", 7.0)]),
    ]
}

/// `count` string keys named `key:000`, `key:001`, ...
pub fn numbered_string_keys(count: usize) -> Vec<KeyDetail> {
    (0..count)
        .map(|i| string_key(&format!("key:{:03}", i), &format!("value {}", i)))
        .collect()
}

/// `count` keys named `key:000`, `key:001`, ... split evenly across
/// strings, hashes and lists, returned in a fixed shuffled order.
pub fn three_type_keys(count: usize) -> Vec<KeyDetail> {
    shuffled(count)
        .into_iter()
        .map(|i| {
            let key = format!("key:{:03}", i);
            match i % 3 {
                0 => string_key(&key, &format!("value {}", i)),
                1 => hash_key(&key, &[("index", json!(i.to_string()))]),
                _ => list_key(&key, vec![json!(i.to_string())]),
            }
        })
        .collect()
}

/// Fisher-Yates over `0..count` driven by a fixed-seed LCG.
fn shuffled(count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..count).collect();
    let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
    for i in (1..order.len()).rev() {
        seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let j = (seed >> 33) as usize % (i + 1);
        order.swap(i, j);
    }
    order
}
