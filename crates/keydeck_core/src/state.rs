use crate::key_table::{self, KeyFilter, SortKey};
use crate::key_value::KeyRecord;
use crate::pagination::{PageMeta, Pagination};
use crate::render::{self, TableView};
use std::collections::HashSet;

/// Session state of the key table.
///
/// `all_keys` is the snapshot from the last load; `filtered_keys` is
/// derived from it and recomputed on every change to the snapshot, the
/// filter, or the sort.
#[derive(Debug, Clone)]
pub struct KeyTableState {
    all_keys: Vec<KeyRecord>,
    filtered_keys: Vec<KeyRecord>,
    filter: KeyFilter,
    sort: SortKey,
    pagination: Pagination,
}

impl Default for KeyTableState {
    fn default() -> Self {
        Self::new(Pagination::default().page_size())
    }
}

impl KeyTableState {
    pub fn new(page_size: usize) -> Self {
        Self {
            all_keys: Vec::new(),
            filtered_keys: Vec::new(),
            filter: KeyFilter::All,
            sort: SortKey::Key,
            pagination: Pagination::new(page_size),
        }
    }

    pub fn all_keys(&self) -> &[KeyRecord] {
        &self.all_keys
    }

    pub fn filtered_keys(&self) -> &[KeyRecord] {
        &self.filtered_keys
    }

    pub fn filter(&self) -> KeyFilter {
        self.filter
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn current_page(&self) -> usize {
        self.pagination.page()
    }

    pub fn page_size(&self) -> usize {
        self.pagination.page_size()
    }

    pub fn total_pages(&self) -> usize {
        self.pagination.total_pages(self.filtered_keys.len())
    }

    pub fn record(&self, key: &str) -> Option<&KeyRecord> {
        self.all_keys.iter().find(|record| record.key == key)
    }

    /// Replace the snapshot wholesale, keeping filter and sort. The page is
    /// pulled back if the list shrank below it.
    pub fn replace_keys(&mut self, records: Vec<KeyRecord>) {
        self.all_keys = records;
        self.recompute();
        self.pagination.clamp(self.filtered_keys.len());
    }

    pub fn set_filter(&mut self, filter: KeyFilter) {
        self.filter = filter;
        self.pagination.reset();
        self.recompute();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.pagination.reset();
        self.recompute();
    }

    pub fn reset_filters(&mut self) {
        self.filter = KeyFilter::All;
        self.sort = SortKey::Key;
        self.pagination.reset();
        self.recompute();
    }

    /// Jump to `page`, clamped to the valid range.
    pub fn go_to_page(&mut self, page: usize) {
        self.pagination = self.pagination.with_page(page);
        self.pagination.clamp(self.filtered_keys.len());
    }

    pub fn next_page(&mut self) -> bool {
        self.pagination.next_page(self.filtered_keys.len())
    }

    pub fn prev_page(&mut self) -> bool {
        self.pagination.prev_page()
    }

    /// Narrow the snapshot to the keys in `matches` and return to page 1.
    /// Returns how many records remain.
    pub fn retain_matches(&mut self, matches: &[String]) -> usize {
        let wanted: HashSet<&str> = matches.iter().map(String::as_str).collect();
        self.all_keys.retain(|record| wanted.contains(record.key.as_str()));
        self.pagination.reset();
        self.recompute();
        self.all_keys.len()
    }

    pub fn visible(&self) -> (&[KeyRecord], PageMeta) {
        self.pagination.slice(&self.filtered_keys)
    }

    pub fn page_meta(&self) -> PageMeta {
        self.visible().1
    }

    pub fn render(&self) -> TableView {
        render::render_table(self.visible().0)
    }

    fn recompute(&mut self) {
        self.filtered_keys = key_table::apply(&self.all_keys, self.filter, self.sort);
        log::debug!(
            "Key table: {} of {} keys (filter={}, sort={})",
            self.filtered_keys.len(),
            self.all_keys.len(),
            self.filter,
            self.sort
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_value::{KeyType, NO_EXPIRY};

    fn records(count: usize) -> Vec<KeyRecord> {
        (0..count)
            .map(|i| {
                let key_type = KeyType::ALL[i % KeyType::ALL.len()];
                KeyRecord::new(format!("key:{:03}", i), key_type).with_size(i as u64)
            })
            .collect()
    }

    #[test]
    fn hundred_twenty_records_scenario() {
        let mut state = KeyTableState::new(50);
        state.replace_keys(records(120));

        assert_eq!(state.total_pages(), 3);
        assert_eq!(state.visible().0.len(), 50);

        assert!(state.next_page());
        assert!(state.next_page());
        let (visible, meta) = state.visible();
        assert_eq!(visible.len(), 20);
        assert_eq!(meta.shown_label(), "101-120");

        assert!(!state.next_page());
        assert_eq!(state.current_page(), 3);

        state.set_filter(KeyFilter::Type(KeyType::Hash));
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.filtered_keys().len(), 24);
        assert!(state.filtered_keys().iter().all(|r| r.key_type == KeyType::Hash));
    }

    #[test]
    fn ttl_sort_scenario() {
        let mut state = KeyTableState::default();
        state.replace_keys(
            [-1, 30, -1, 5]
                .iter()
                .enumerate()
                .map(|(i, ttl)| KeyRecord::new(format!("k{}", i), KeyType::String).with_ttl(*ttl))
                .collect(),
        );

        state.set_sort(SortKey::Ttl);
        let ttls: Vec<i64> = state.filtered_keys().iter().map(|r| r.ttl).collect();
        let keys: Vec<&str> = state.filtered_keys().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(ttls, vec![5, 30, NO_EXPIRY, NO_EXPIRY]);
        assert_eq!(keys, vec!["k3", "k1", "k0", "k2"]);
    }

    #[test]
    fn empty_state() {
        let state = KeyTableState::default();
        let meta = state.page_meta();

        assert_eq!(meta.total_pages, 1);
        assert_eq!((meta.shown_start, meta.shown_end), (0, 0));
        assert!(state.render().is_empty());
    }

    #[test]
    fn filter_with_no_matches_renders_placeholder() {
        let mut state = KeyTableState::default();
        state.replace_keys(vec![KeyRecord::new("only", KeyType::String)]);
        state.set_filter(KeyFilter::Type(KeyType::ZSet));

        assert!(state.render().is_empty());
        state.reset_filters();
        assert_eq!(state.render().rows().len(), 1);
        assert!(!state.render().is_empty());
    }

    #[test]
    fn unordered_snapshot_is_sorted_before_paging() {
        let types = [KeyType::String, KeyType::Hash, KeyType::List];
        let snapshot: Vec<KeyRecord> = (0..120)
            .map(|i| (i * 7) % 120)
            .map(|i| KeyRecord::new(format!("key:{:03}", i), types[i % 3]))
            .collect();
        assert_eq!(snapshot[1].key, "key:007");

        let mut state = KeyTableState::new(50);
        state.replace_keys(snapshot);

        for key_type in types {
            let count = state.all_keys().iter().filter(|r| r.key_type == key_type).count();
            assert_eq!(count, 40);
        }

        let (visible, meta) = state.visible();
        assert_eq!(meta.total_pages, 3);
        let keys: Vec<&str> = visible.iter().map(|r| r.key.as_str()).collect();
        let expected: Vec<String> = (0..50).map(|i| format!("key:{:03}", i)).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn sort_change_resets_page() {
        let mut state = KeyTableState::new(10);
        state.replace_keys(records(35));
        state.go_to_page(3);
        assert_eq!(state.current_page(), 3);

        state.set_sort(SortKey::Size);
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn retain_matches_narrows_snapshot() {
        let mut state = KeyTableState::new(10);
        state.replace_keys(records(35));
        state.go_to_page(2);

        let matches = ["key:001".to_string(), "key:034".to_string(), "gone".to_string()];
        let kept = state.retain_matches(&matches);
        assert_eq!(kept, 2);
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.all_keys().len(), 2);
    }

    #[test]
    fn replace_keys_clamps_page() {
        let mut state = KeyTableState::new(10);
        state.replace_keys(records(35));
        state.go_to_page(4);
        state.replace_keys(records(12));
        assert_eq!(state.current_page(), 2);
    }

    #[test]
    fn go_to_page_clamps() {
        let mut state = KeyTableState::new(10);
        state.replace_keys(records(15));
        state.go_to_page(9);
        assert_eq!(state.current_page(), 2);
        state.go_to_page(0);
        assert_eq!(state.current_page(), 1);
    }
}
