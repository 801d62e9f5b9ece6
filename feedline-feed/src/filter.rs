//! Repost removal.
use crate::model::RawPage;

/// Drop repost items from every page. Page boundaries, item order and pagination
/// markers are preserved, so applying it twice changes nothing.
pub fn exclude_reposts(pages: Vec<RawPage>) -> Vec<RawPage> {
    pages
        .into_iter()
        .map(|mut page| {
            page.items.retain(|item| !item.is_repost);
            page
        })
        .collect()
}

/// Apply [`exclude_reposts`] only when the request asked for it.
pub fn apply(pages: Vec<RawPage>, retweets_excluded: bool) -> Vec<RawPage> {
    if !retweets_excluded {
        return pages;
    }
    let before: usize = pages.iter().map(|p| p.items.len()).sum();
    let pages = exclude_reposts(pages);
    let after: usize = pages.iter().map(|p| p.items.len()).sum();
    tracing::debug!(removed = before - after, kept = after, "feed.filter.reposts");
    pages
}
