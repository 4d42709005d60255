use crate::key_value::{KeyRecord, KeyType};
use crate::listing::INFINITE_TTL_LABEL;
use crate::truncate_chars;
use std::fmt::Write as _;

pub const PREVIEW_MAX_CHARS: usize = 100;

const EMPTY_MESSAGE: &str = "No keys match the current filter";
const COLUMN_COUNT: usize = 6;

/// Escape text for insertion into HTML element content or a quoted
/// attribute value.
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlBadge {
    Expires(i64),
    Infinite,
}

impl TtlBadge {
    pub fn from_ttl(ttl: i64) -> Self {
        if ttl > 0 {
            TtlBadge::Expires(ttl)
        } else {
            TtlBadge::Infinite
        }
    }

    pub fn label(&self) -> String {
        match self {
            TtlBadge::Expires(secs) => format!("{}s", secs),
            TtlBadge::Infinite => INFINITE_TTL_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    View,
    Edit,
    Delete,
    Copy,
}

impl RowAction {
    pub const ALL: [RowAction; 4] = [
        RowAction::View,
        RowAction::Edit,
        RowAction::Delete,
        RowAction::Copy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RowAction::View => "view",
            RowAction::Edit => "edit",
            RowAction::Delete => "delete",
            RowAction::Copy => "copy",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RowAction::View => "View",
            RowAction::Edit => "Edit",
            RowAction::Delete => "Delete",
            RowAction::Copy => "Copy key",
        }
    }

    fn button_class(self) -> &'static str {
        match self {
            RowAction::View => "btn-icon btn-info",
            RowAction::Edit => "btn-icon btn-warning",
            RowAction::Delete => "btn-icon btn-danger",
            RowAction::Copy => "btn-icon btn-secondary",
        }
    }
}

/// Display model of one table row. Text fields are unescaped; escaping
/// happens when the row is written out as markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRow {
    pub key: String,
    pub key_type: KeyType,
    pub type_display: String,
    pub preview: String,
    pub size_text: String,
    pub ttl: TtlBadge,
    pub actions: Vec<RowAction>,
}

impl KeyRow {
    pub fn from_record(record: &KeyRecord) -> Self {
        Self {
            key: record.key.clone(),
            key_type: record.key_type,
            type_display: record.type_display.clone(),
            preview: truncate_chars(&record.preview, PREVIEW_MAX_CHARS),
            size_text: record.size_text.clone(),
            ttl: TtlBadge::from_ttl(record.ttl),
            actions: RowAction::ALL.to_vec(),
        }
    }

    pub fn type_class(&self) -> String {
        format!("type-{}", self.key_type.as_str())
    }

    fn write_html(&self, out: &mut String) {
        let key = html_escape(&self.key);

        let _ = write!(
            out,
            "<tr data-type=\"{}\">\
             <td class=\"key-cell\"><i class=\"fas fa-key\"></i>\
             <span class=\"key-name\">{}</span></td>\
             <td><span class=\"type-badge {}\">{}</span></td>\
             <td class=\"value-cell\"><div class=\"value-preview\">{}</div></td>\
             <td><span class=\"size-badge\">{}</span></td>",
            self.key_type.as_str(),
            key,
            self.type_class(),
            html_escape(&self.type_display),
            html_escape(&self.preview),
            html_escape(&self.size_text),
        );

        match self.ttl {
            TtlBadge::Expires(_) => {
                let _ = write!(
                    out,
                    "<td><span class=\"ttl-badge\">{}</span></td>",
                    self.ttl.label()
                );
            }
            TtlBadge::Infinite => {
                let _ = write!(
                    out,
                    "<td><span class=\"ttl-badge infinite\">{}</span></td>",
                    self.ttl.label()
                );
            }
        }

        out.push_str("<td><div class=\"action-buttons\">");
        for action in &self.actions {
            let _ = write!(
                out,
                "<button type=\"button\" class=\"{}\" data-action=\"{}\" \
                 data-key=\"{}\" title=\"{}\"></button>",
                action.button_class(),
                action.as_str(),
                key,
                action.title(),
            );
        }
        out.push_str("</div></td></tr>");
    }
}

/// Placeholder row shown when nothing matches the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub message: String,
}

impl Default for EmptyState {
    fn default() -> Self {
        Self {
            message: EMPTY_MESSAGE.to_string(),
        }
    }
}

impl EmptyState {
    fn write_html(&self, out: &mut String) {
        let _ = write!(
            out,
            "<tr><td colspan=\"{}\" class=\"empty-state\"><p>{}</p>\
             <button type=\"button\" class=\"btn-secondary\" data-action=\"reset-filters\">\
             Reset filters</button>\
             </td></tr>",
            COLUMN_COUNT,
            html_escape(&self.message),
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableView {
    Rows(Vec<KeyRow>),
    Empty(EmptyState),
}

impl TableView {
    pub fn is_empty(&self) -> bool {
        matches!(self, TableView::Empty(_))
    }

    pub fn rows(&self) -> &[KeyRow] {
        match self {
            TableView::Rows(rows) => rows,
            TableView::Empty(_) => &[],
        }
    }

    /// Table body markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        match self {
            TableView::Rows(rows) => {
                for row in rows {
                    row.write_html(&mut out);
                }
            }
            TableView::Empty(empty) => empty.write_html(&mut out),
        }
        out
    }
}

/// Build the display rows for one page of records.
pub fn render_table(slice: &[KeyRecord]) -> TableView {
    if slice.is_empty() {
        return TableView::Empty(EmptyState::default());
    }

    TableView::Rows(slice.iter().map(KeyRow::from_record).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(html_escape("plain"), "plain");
    }

    #[test]
    fn empty_slice_renders_single_placeholder() {
        let view = render_table(&[]);
        assert!(view.is_empty());

        let html = view.to_html();
        assert_eq!(html.matches("<tr").count(), 1);
        assert!(html.contains("empty-state"));
        assert!(html.contains("reset-filters"));

        match view {
            TableView::Empty(empty) => assert_eq!(empty.message, EMPTY_MESSAGE),
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn key_with_markup_is_escaped_everywhere() {
        let record = KeyRecord::new("<script>alert('x')</script>", KeyType::String)
            .with_preview("a < b && c > d")
            .with_ttl(30);
        let html = render_table(&[record]).to_html();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(html.contains("data-key=\"&lt;script&gt;"));
        assert!(html.contains("a &lt; b &amp;&amp; c &gt; d"));
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn rows_carry_badges_and_actions() {
        let records = vec![
            KeyRecord::new("session", KeyType::Hash)
                .with_type_display("HASH")
                .with_size(2048)
                .with_ttl(45),
            KeyRecord::new("counter", KeyType::String),
        ];

        let view = render_table(&records);
        let rows = view.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].type_class(), "type-hash");
        assert_eq!(rows[0].type_display, "HASH");
        assert_eq!(rows[0].size_text, "2 KB");
        assert_eq!(rows[0].ttl.label(), "45s");
        assert_eq!(rows[1].ttl, TtlBadge::Infinite);
        assert_eq!(rows[1].ttl.label(), "∞");
        assert_eq!(rows[1].actions, RowAction::ALL.to_vec());

        let html = view.to_html();
        assert!(html.contains("ttl-badge infinite"));
        assert_eq!(html.matches("data-action=\"delete\"").count(), 2);
    }

    #[test]
    fn long_previews_are_truncated() {
        let record = KeyRecord::new("k", KeyType::String).with_preview("x".repeat(250));
        let row = KeyRow::from_record(&record);
        assert!(row.preview.chars().count() <= PREVIEW_MAX_CHARS + 3);
        assert!(row.preview.ends_with("..."));
    }
}
