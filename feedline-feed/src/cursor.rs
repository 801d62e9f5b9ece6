//! Pagination cursor lookup.
use crate::model::{CursorType, RawPage};

/// Tokens for the adjacent pages; empty when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursors {
    pub previous: String,
    pub next: String,
}

/// Read cursors from the first page that has any markers; later pages are ignored.
pub fn extract(pages: &[RawPage]) -> PageCursors {
    let Some(page) = pages.iter().find(|p| !p.markers.is_empty()) else {
        return PageCursors::default();
    };
    let find = |kind: CursorType| {
        page.markers
            .iter()
            .find(|m| m.cursor_type == kind)
            .map(|m| m.value.clone())
            .unwrap_or_default()
    };
    PageCursors {
        previous: find(CursorType::Top),
        next: find(CursorType::Bottom),
    }
}
