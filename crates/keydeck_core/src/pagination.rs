pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Position within the filtered key list.
///
/// Pages are 1-based. The page count never drops below one, so an empty
/// table still reports "Page 1 of 1".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn total_pages(&self, total_count: usize) -> usize {
        total_pages(total_count, self.page_size)
    }

    /// Moves forward one page. Returns false when already on the last page.
    pub fn next_page(&mut self, total_count: usize) -> bool {
        if self.page >= self.total_pages(total_count) {
            return false;
        }
        self.page += 1;
        true
    }

    /// Moves back one page. Returns false when already on the first page.
    pub fn prev_page(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Pulls the page back inside the valid range after the list shrank.
    pub fn clamp(&mut self, total_count: usize) {
        self.page = self.page.clamp(1, self.total_pages(total_count));
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> (&'a [T], PageMeta) {
        paginate(items, self.page, self.page_size)
    }
}

pub fn total_pages(total_count: usize, page_size: usize) -> usize {
    total_count.div_ceil(page_size.max(1)).max(1)
}

/// Counters shown in the pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub page: usize,
    pub total_pages: usize,
    pub total_count: usize,
    /// 1-based, 0 when nothing is shown.
    pub shown_start: usize,
    /// 1-based inclusive, 0 when nothing is shown.
    pub shown_end: usize,
}

impl PageMeta {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// `"0"`, a single row number, or `"start-end"`.
    pub fn shown_label(&self) -> String {
        if self.shown_end == 0 {
            "0".to_string()
        } else if self.shown_start == self.shown_end {
            self.shown_start.to_string()
        } else {
            format!("{}-{}", self.shown_start, self.shown_end)
        }
    }

    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.page, self.total_pages)
    }
}

/// Slice out one page of `items`. A page past the end yields an empty slice.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> (&[T], PageMeta) {
    let page_size = page_size.max(1);
    let page = page.max(1);
    let total_count = items.len();

    let start = (page - 1).saturating_mul(page_size).min(total_count);
    let end = page.saturating_mul(page_size).min(total_count);
    let visible = &items[start..end];

    let (shown_start, shown_end) = if visible.is_empty() {
        (0, 0)
    } else {
        (start + 1, end)
    };

    let meta = PageMeta {
        page,
        total_pages: total_pages(total_count, page_size),
        total_count,
        shown_start,
        shown_end,
    };

    (visible, meta)
}
