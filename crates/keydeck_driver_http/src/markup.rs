use keydeck_core::{ConsoleError, MarkupRow};
use scraper::{ElementRef, Html, Selector};

/// Cell selectors for one row of the index page's key table.
struct RowSelectors {
    body: Selector,
    row: Selector,
    empty: Selector,
    key: Selector,
    key_type: Selector,
    preview: Selector,
    size: Selector,
    ttl: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self, ConsoleError> {
        Ok(Self {
            body: selector("#keysTableBody")?,
            row: selector("tr")?,
            empty: selector(".empty-state")?,
            key: selector(".key-name")?,
            key_type: selector(".type-badge")?,
            preview: selector(".value-preview")?,
            size: selector(".size-badge")?,
            ttl: selector(".ttl-badge")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, ConsoleError> {
    Selector::parse(css)
        .map_err(|e| ConsoleError::invalid_response(format!("selector '{}': {:?}", css, e)))
}

/// Read the key table out of the index page.
///
/// `None` when the page has no key table, which is how the service renders
/// a missing store connection. Cells are reported as found; deciding which
/// rows are usable is left to the normalizer.
pub fn key_rows(html: &str) -> Result<Option<Vec<MarkupRow>>, ConsoleError> {
    let selectors = RowSelectors::new()?;
    let document = Html::parse_document(html);

    let Some(body) = document.select(&selectors.body).next() else {
        return Ok(None);
    };

    let rows = body
        .select(&selectors.row)
        .map(|row| {
            if row.select(&selectors.empty).next().is_some() {
                return MarkupRow::placeholder();
            }

            MarkupRow {
                key: cell_text(row, &selectors.key),
                type_label: cell_text(row, &selectors.key_type),
                preview: cell_text(row, &selectors.preview),
                size_label: cell_text(row, &selectors.size),
                ttl_label: cell_text(row, &selectors.ttl),
                placeholder: false,
            }
        })
        .collect();

    Ok(Some(rows))
}

fn cell_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    row.select(selector)
        .next()
        .map(|cell| cell.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!(
            "<html><body><table><tbody id=\"keysTableBody\">{}</tbody></table></body></html>",
            body
        )
    }

    #[test]
    fn reads_every_badge() {
        let html = page(
            "<tr data-type=\"hash\">\
             <td class=\"key-cell\"><i class=\"fas fa-key\"></i>\
             <span class=\"key-name\"> user:1 </span></td>\
             <td><span class=\"type-badge hash\">HASH</span></td>\
             <td class=\"value-cell\"><div class=\"value-preview\">Hash with 2 fields</div></td>\
             <td><span class=\"size-badge\">1.5 KB</span></td>\
             <td><span class=\"ttl-badge\">30s</span></td></tr>",
        );

        let rows = key_rows(&html).unwrap().unwrap();
        assert_eq!(
            rows,
            vec![
                MarkupRow::new(" user:1 ", "HASH")
                    .with_preview("Hash with 2 fields")
                    .with_size_label("1.5 KB")
                    .with_ttl_label("30s")
            ]
        );
    }

    #[test]
    fn entities_are_decoded() {
        let html = page(
            "<tr><td><span class=\"key-name\">a&lt;b&amp;c</span></td>\
             <td><span class=\"type-badge\">string</span></td></tr>",
        );

        let rows = key_rows(&html).unwrap().unwrap();
        assert_eq!(rows[0].key.as_deref(), Some("a<b&c"));
        assert_eq!(rows[0].preview, None);
        assert_eq!(rows[0].ttl_label, None);
    }

    #[test]
    fn empty_state_row_is_a_placeholder() {
        let html = page("<tr><td colspan=\"6\" class=\"empty-state\"><p>No keys</p></td></tr>");
        assert_eq!(key_rows(&html).unwrap(), Some(vec![MarkupRow::placeholder()]));
    }

    #[test]
    fn page_without_table_has_no_listing() {
        let html = "<html><body><div id=\"connectionCard\">Not connected</div></body></html>";
        assert_eq!(key_rows(html).unwrap(), None);
    }
}
