use keydeck_core::{
    ConnectionStatus, Notification, NotificationLevel, PageMeta, ServerStats, TableView,
    truncate_chars,
};
use std::fmt::Write;

const TERMINAL_PREVIEW_CHARS: usize = 40;

/// Plain-text rendering of one page of the key table, followed by the
/// pager line.
pub fn table_text(view: &TableView, meta: &PageMeta) -> String {
    let mut out = String::new();

    match view {
        TableView::Empty(empty) => {
            let _ = writeln!(out, "{}", empty.message);
        }
        TableView::Rows(rows) => {
            let previews: Vec<String> = rows
                .iter()
                .map(|row| truncate_chars(&row.preview, TERMINAL_PREVIEW_CHARS))
                .collect();
            let ttls: Vec<String> = rows.iter().map(|row| row.ttl.label()).collect();

            let key_width = column_width("KEY", rows.iter().map(|row| row.key.as_str()));
            let type_width =
                column_width("TYPE", rows.iter().map(|row| row.type_display.as_str()));
            let size_width = column_width("SIZE", rows.iter().map(|row| row.size_text.as_str()));
            let ttl_width = column_width("TTL", ttls.iter().map(String::as_str));

            let _ = writeln!(
                out,
                "{:<key_width$}  {:<type_width$}  {:>size_width$}  {:>ttl_width$}  PREVIEW",
                "KEY", "TYPE", "SIZE", "TTL",
            );

            for ((row, preview), ttl) in rows.iter().zip(&previews).zip(&ttls) {
                let _ = writeln!(
                    out,
                    "{:<key_width$}  {:<type_width$}  {:>size_width$}  {:>ttl_width$}  {}",
                    row.key, row.type_display, row.size_text, ttl, preview,
                );
            }
        }
    }

    let _ = write!(
        out,
        "Showing {} of {} keys. {}",
        meta.shown_label(),
        meta.total_count,
        meta.page_label()
    );

    let mut moves = Vec::new();
    if meta.has_prev() {
        moves.push(format!("prev: --page {}", meta.page - 1));
    }
    if meta.has_next() {
        moves.push(format!("next: --page {}", meta.page + 1));
    }
    if !moves.is_empty() {
        let _ = write!(out, " ({})", moves.join(", "));
    }

    out
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(|value| value.chars().count())
        .fold(header.len(), usize::max)
}

pub fn stats_text(stats: &ServerStats, status: ConnectionStatus) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Status:    {}", status.label());
    if let Some(error) = &stats.error {
        let _ = writeln!(out, "Error:     {}", error);
    }
    let _ = writeln!(out, "Keys:      {}", stats.keys_count);
    let _ = writeln!(out, "Memory:    {}", stats.used_memory);
    let _ = writeln!(out, "Clients:   {}", stats.connected_clients);
    let _ = writeln!(out, "Ops/sec:   {}", stats.ops_per_sec);
    let _ = write!(out, "Hit rate:  {}", stats.hit_rate_label());
    if let Some(uptime) = stats.uptime {
        let _ = write!(out, "\nUptime:    {}s", uptime);
    }

    out
}

pub fn notification_line(notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Info => "info",
        NotificationLevel::Error => "error",
    };

    format!(
        "[{}] {} {}",
        notification.at.format("%H:%M:%S"),
        tag,
        notification.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use keydeck_core::{KeyRecord, KeyType, paginate, render_table};

    #[test]
    fn table_text_aligns_columns() {
        let records = vec![
            KeyRecord::new("a", KeyType::String)
                .with_size(12)
                .with_preview("hello"),
            KeyRecord::new("session:long-name", KeyType::Hash)
                .with_size(2048)
                .with_ttl(30),
        ];
        let (slice, meta) = paginate(&records, 1, 50);
        let text = table_text(&render_table(slice), &meta);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("KEY "));
        assert!(lines[1].starts_with("a "));
        assert!(lines[1].ends_with("hello"));
        assert!(lines[2].contains("30s"));
        assert_eq!(lines[1].find("string"), lines[2].find("hash"));
        assert_eq!(lines[3], "Showing 1-2 of 2 keys. Page 1 of 1");
    }

    #[test]
    fn pager_line_names_neighbour_pages() {
        let records: Vec<KeyRecord> = (0..120)
            .map(|i| KeyRecord::new(format!("key:{:03}", i), KeyType::String))
            .collect();

        let (slice, meta) = paginate(&records, 1, 50);
        let text = table_text(&render_table(slice), &meta);
        assert!(text.ends_with("Showing 1-50 of 120 keys. Page 1 of 3 (next: --page 2)"));

        let (slice, meta) = paginate(&records, 2, 50);
        let text = table_text(&render_table(slice), &meta);
        assert!(text.ends_with("Page 2 of 3 (prev: --page 1, next: --page 3)"));

        let (slice, meta) = paginate(&records, 3, 50);
        let text = table_text(&render_table(slice), &meta);
        assert!(text.ends_with("Showing 101-120 of 120 keys. Page 3 of 3 (prev: --page 2)"));
    }

    #[test]
    fn empty_table_prints_placeholder() {
        let records: Vec<KeyRecord> = Vec::new();
        let (slice, meta) = paginate(&records, 1, 50);
        let text = table_text(&render_table(slice), &meta);

        assert!(text.starts_with("No keys match the current filter\n"));
        assert!(text.ends_with("Showing 0 of 0 keys. Page 1 of 1"));
    }

    #[test]
    fn stats_text_includes_hit_rate() {
        let mut stats = ServerStats::connected();
        stats.hits = 3;
        stats.misses = 1;

        let text = stats_text(&stats, ConnectionStatus::Connected);
        assert!(text.starts_with("Status:    Connected"));
        assert!(text.contains("Hit rate:  75.0%"));
    }
}
