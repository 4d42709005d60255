mod app_config;
mod console;
mod error;
mod key_table;
mod key_value;
mod listing;
mod pagination;
mod preferences;
mod refresh_policy;
mod render;
mod size;
mod state;
mod stats;
mod traits;
mod value_format;

pub use app_config::{ConsoleConfig, ConsoleConfigStore, DEFAULT_BASE_URL};
pub use console::{
    ActionOutcome, Console, ConsoleAction, EditForm, Notification, NotificationLevel,
    PendingConfirmation,
};
pub use error::ConsoleError;
pub use key_table::{KeyFilter, SortKey, apply as apply_filter_sort, compare_key_names};
pub use key_value::{
    KeyDetail, KeyPayload, KeyRecord, KeyType, KeyWriteRequest, NO_EXPIRY, RawKeyDetail,
    ZSetMember, normalize_ttl,
};
pub use listing::{
    INFINITE_TTL_LABEL, ListingEntry, MarkupRow, RawListing, normalize, parse_ttl_label,
};
pub use pagination::{DEFAULT_PAGE_SIZE, PageMeta, Pagination, paginate, total_pages};
pub use preferences::{
    FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences, Theme,
};
pub use refresh_policy::{DEFAULT_STATS_INTERVAL_SECS, RefreshPolicy};
pub use render::{
    EmptyState, KeyRow, PREVIEW_MAX_CHARS, RowAction, TableView, TtlBadge, html_escape,
    render_table,
};
pub use size::{format_bytes, parse_size, parse_size_bytes};
pub use state::KeyTableState;
pub use stats::{ConnectionStatus, ServerStats, StatsTicket, StatsTracker, StatsUpdate};
pub use traits::ConsoleBackend;
pub use value_format::{
    DisplayForm, EditValue, KeyView, RankedMember, display_scalar, edit_text, parse_edit_text,
    ttl_label,
};

/// Shorten `s` to at most `max_chars` characters, marking the cut with
/// `...`.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}...", &s[..cut]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("ключ-значение", 4), "ключ...");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }
}
