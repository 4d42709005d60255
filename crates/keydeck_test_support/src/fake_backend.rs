use async_trait::async_trait;
use indexmap::IndexMap;
use keydeck_core::{
    ConsoleBackend, ConsoleError, KeyDetail, KeyPayload, KeyType, KeyWriteRequest, ListingEntry,
    MarkupRow, NO_EXPIRY, RawListing, ServerStats, ZSetMember, display_scalar, format_bytes,
    normalize_ttl,
};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Backend calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOperation {
    Stats,
    TestConnection,
    Search,
    ListKeys,
    KeyDetail,
    DeleteKey,
    SetKey,
    Flush,
}

#[derive(Debug, Clone, Default)]
pub struct FakeBackendStats {
    pub stats_calls: usize,
    pub list_calls: usize,
    pub searches: Vec<String>,
    pub detail_requests: Vec<String>,
    pub writes: Vec<KeyWriteRequest>,
    pub deletes: Vec<String>,
    pub flush_calls: usize,
}

#[derive(Default)]
struct FakeBackendState {
    keys: RwLock<IndexMap<String, KeyDetail>>,
    server_stats: RwLock<Option<ServerStats>>,
    failures: RwLock<HashMap<FakeOperation, String>>,
    rejected_writes: RwLock<Option<String>>,
    disconnected: AtomicBool,
    markup_listing: AtomicBool,
    stats_calls: AtomicUsize,
    list_calls: AtomicUsize,
    searches: Mutex<Vec<String>>,
    detail_requests: Mutex<Vec<String>>,
    writes: Mutex<Vec<KeyWriteRequest>>,
    deletes: Mutex<Vec<String>>,
    flush_calls: AtomicUsize,
}

/// In-memory stand-in for the admin HTTP service.
///
/// Writes, deletes and flushes change the stored keys, so a reload after
/// a write sees the new state. Clones share state.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<FakeBackendState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(self, detail: KeyDetail) -> Self {
        self.insert_key(detail);
        self
    }

    pub fn with_keys(self, details: impl IntoIterator<Item = KeyDetail>) -> Self {
        for detail in details {
            self.insert_key(detail);
        }
        self
    }

    pub fn with_stats(self, stats: ServerStats) -> Self {
        self.set_stats(stats);
        self
    }

    /// Serve the listing as scraped table rows instead of API entries.
    pub fn with_markup_listing(self) -> Self {
        self.state.markup_listing.store(true, Ordering::Relaxed);
        self
    }

    pub fn with_failure(self, operation: FakeOperation, message: impl Into<String>) -> Self {
        self.set_failure(operation, message);
        self
    }

    pub fn with_rejected_writes(self, message: impl Into<String>) -> Self {
        *rwlock_write(&self.state.rejected_writes) = Some(message.into());
        self
    }

    pub fn insert_key(&self, detail: KeyDetail) {
        rwlock_write(&self.state.keys).insert(detail.key.clone(), detail);
    }

    pub fn set_stats(&self, stats: ServerStats) {
        *rwlock_write(&self.state.server_stats) = Some(stats);
    }

    pub fn set_failure(&self, operation: FakeOperation, message: impl Into<String>) {
        rwlock_write(&self.state.failures).insert(operation, message.into());
    }

    pub fn clear_failure(&self, operation: FakeOperation) {
        rwlock_write(&self.state.failures).remove(&operation);
    }

    /// While disconnected the listing is absent and stats report
    /// `connected: false`.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.state.disconnected.store(disconnected, Ordering::Relaxed);
    }

    pub fn key_names(&self) -> Vec<String> {
        rwlock_read(&self.state.keys).keys().cloned().collect()
    }

    pub fn stored(&self, key: &str) -> Option<KeyDetail> {
        rwlock_read(&self.state.keys).get(key).cloned()
    }

    pub fn stats(&self) -> FakeBackendStats {
        FakeBackendStats {
            stats_calls: self.state.stats_calls.load(Ordering::Relaxed),
            list_calls: self.state.list_calls.load(Ordering::Relaxed),
            searches: mutex_lock(&self.state.searches).clone(),
            detail_requests: mutex_lock(&self.state.detail_requests).clone(),
            writes: mutex_lock(&self.state.writes).clone(),
            deletes: mutex_lock(&self.state.deletes).clone(),
            flush_calls: self.state.flush_calls.load(Ordering::Relaxed),
        }
    }

    pub fn as_backend_arc(self) -> Arc<dyn ConsoleBackend> {
        Arc::new(self)
    }

    fn check(&self, operation: FakeOperation) -> Result<(), ConsoleError> {
        match rwlock_read(&self.state.failures).get(&operation) {
            Some(message) => Err(ConsoleError::request_failed(message.clone())),
            None => Ok(()),
        }
    }

    fn is_disconnected(&self) -> bool {
        self.state.disconnected.load(Ordering::Relaxed)
    }

    /// Keys in insertion order, like a `SCAN` over the keyspace.
    fn listing(&self) -> RawListing {
        let keys = rwlock_read(&self.state.keys);
        let details = keys.values();

        if self.state.markup_listing.load(Ordering::Relaxed) {
            RawListing::Markup(details.into_iter().map(markup_row).collect())
        } else {
            RawListing::Payload(details.into_iter().map(listing_entry).collect())
        }
    }
}

#[async_trait]
impl ConsoleBackend for FakeBackend {
    fn describe(&self) -> String {
        "fake backend".to_string()
    }

    async fn stats(&self) -> Result<ServerStats, ConsoleError> {
        self.state.stats_calls.fetch_add(1, Ordering::Relaxed);
        self.check(FakeOperation::Stats)?;

        if self.is_disconnected() {
            return Ok(ServerStats::disconnected());
        }

        if let Some(stats) = rwlock_read(&self.state.server_stats).clone() {
            return Ok(stats);
        }

        Ok(ServerStats {
            keys_count: rwlock_read(&self.state.keys).len() as u64,
            ..ServerStats::connected()
        })
    }

    async fn test_connection(&self) -> Result<bool, ConsoleError> {
        self.check(FakeOperation::TestConnection)?;
        Ok(!self.is_disconnected())
    }

    async fn search(&self, pattern: &str) -> Result<Vec<String>, ConsoleError> {
        mutex_lock(&self.state.searches).push(pattern.to_string());
        self.check(FakeOperation::Search)?;

        Ok(rwlock_read(&self.state.keys)
            .keys()
            .filter(|key| glob_matches(pattern, key))
            .cloned()
            .collect())
    }

    async fn list_keys(&self) -> Result<Option<RawListing>, ConsoleError> {
        self.state.list_calls.fetch_add(1, Ordering::Relaxed);
        self.check(FakeOperation::ListKeys)?;

        if self.is_disconnected() {
            return Ok(None);
        }
        Ok(Some(self.listing()))
    }

    async fn key_detail(&self, key: &str) -> Result<KeyDetail, ConsoleError> {
        mutex_lock(&self.state.detail_requests).push(key.to_string());
        self.check(FakeOperation::KeyDetail)?;

        rwlock_read(&self.state.keys)
            .get(key)
            .cloned()
            .ok_or_else(|| ConsoleError::not_found(key))
    }

    async fn delete_key(&self, key: &str) -> Result<(), ConsoleError> {
        mutex_lock(&self.state.deletes).push(key.to_string());
        self.check(FakeOperation::DeleteKey)?;

        match rwlock_write(&self.state.keys).shift_remove(key) {
            Some(_) => Ok(()),
            None => Err(ConsoleError::write_rejected(format!("Key not found: {}", key))),
        }
    }

    async fn set_key(&self, request: &KeyWriteRequest) -> Result<(), ConsoleError> {
        mutex_lock(&self.state.writes).push(request.clone());
        self.check(FakeOperation::SetKey)?;

        if let Some(message) = rwlock_read(&self.state.rejected_writes).clone() {
            return Err(ConsoleError::write_rejected(message));
        }

        let payload = payload_from_write(request)?;
        let size = request.value.len() as u64;
        let detail = KeyDetail::new(request.key.clone(), payload)
            .with_size(size)
            .with_ttl(request.ttl);

        self.insert_key(detail);
        Ok(())
    }

    async fn flush(&self) -> Result<(), ConsoleError> {
        self.state.flush_calls.fetch_add(1, Ordering::Relaxed);
        self.check(FakeOperation::Flush)?;

        rwlock_write(&self.state.keys).clear();
        Ok(())
    }
}

/// Store a write the way the admin service does: sorted-set members all get
/// score 1 and set members are de-duplicated.
fn payload_from_write(request: &KeyWriteRequest) -> Result<KeyPayload, ConsoleError> {
    if request.key_type == KeyType::String {
        return Ok(KeyPayload::String(request.value.clone()));
    }

    let parsed: JsonValue = serde_json::from_str(&request.value)
        .map_err(|e| ConsoleError::write_rejected(e.to_string()))?;

    match (request.key_type, parsed) {
        (KeyType::Hash, JsonValue::Object(map)) => Ok(KeyPayload::Hash(map.into_iter().collect())),
        (KeyType::List, JsonValue::Array(items)) => Ok(KeyPayload::List(items)),
        (KeyType::Set, JsonValue::Array(items)) => {
            let mut seen = HashSet::new();
            Ok(KeyPayload::Set(
                items
                    .into_iter()
                    .filter(|item| seen.insert(item.to_string()))
                    .collect(),
            ))
        }
        (KeyType::ZSet, JsonValue::Array(items)) => Ok(KeyPayload::ZSet(
            items
                .iter()
                .map(|member| ZSetMember::new(display_scalar(member), 1.0))
                .collect(),
        )),
        (key_type, _) => Err(ConsoleError::write_rejected(format!(
            "value does not match type {}",
            key_type
        ))),
    }
}

pub fn preview_for(payload: &KeyPayload) -> String {
    match payload {
        KeyPayload::String(text) => keydeck_core::truncate_chars(text, 100),
        KeyPayload::Hash(fields) => format!("Hash with {} fields", fields.len()),
        KeyPayload::List(items) => format!("List with {} items", items.len()),
        KeyPayload::Set(members) => format!("Set with {} members", members.len()),
        KeyPayload::ZSet(members) => format!("Sorted Set with {} items", members.len()),
    }
}

fn listing_entry(detail: &KeyDetail) -> ListingEntry {
    ListingEntry {
        key: detail.key.clone(),
        key_type: detail.key_type().as_str().to_string(),
        size: detail.size,
        ttl: detail.ttl,
        preview: preview_for(&detail.value),
    }
}

fn markup_row(detail: &KeyDetail) -> MarkupRow {
    let ttl = normalize_ttl(detail.ttl);
    let ttl_label = if ttl == NO_EXPIRY {
        keydeck_core::INFINITE_TTL_LABEL.to_string()
    } else {
        format!("{}s", ttl)
    };

    MarkupRow::new(detail.key.clone(), detail.key_type().label())
        .with_preview(preview_for(&detail.value))
        .with_size_label(format_bytes(detail.size))
        .with_ttl_label(ttl_label)
}

/// Glob matching with `*` and `?`, as used by `KEYS`/`SCAN MATCH`.
pub fn glob_matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

fn rwlock_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn rwlock_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn mutex_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_patterns() {
        assert!(glob_matches("*", "anything"));
        assert!(glob_matches("user:*", "user:42"));
        assert!(!glob_matches("user:*", "session:1"));
        assert!(glob_matches("h?llo", "hello"));
        assert!(glob_matches("*:*:name", "a:b:name"));
        assert!(!glob_matches("", "x"));
        assert!(glob_matches("", ""));
    }

    #[test]
    fn zset_writes_get_unit_scores() {
        let request = KeyWriteRequest::new("z", KeyType::ZSet, r#"["a","b"]"#);
        match payload_from_write(&request).unwrap() {
            KeyPayload::ZSet(members) => {
                assert_eq!(members.len(), 2);
                assert!(members.iter().all(|m| m.score == 1.0));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }
}
