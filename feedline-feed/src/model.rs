use chrono::{DateTime, Utc};
use feedline_common::{FeedlineError, Result};
use serde::{Deserialize, Serialize};

/// Profile data of the account whose timeline is being rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable numeric identifier.
    pub account_id: String,
    pub display_name: Option<String>,
    pub handle: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorType {
    Top,
    Bottom,
}

/// Opaque pagination token attached to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMarker {
    pub cursor_type: CursorType,
    pub value: String,
}

impl PageMarker {
    pub fn top(value: impl Into<String>) -> Self {
        Self {
            cursor_type: CursorType::Top,
            value: value.into(),
        }
    }

    pub fn bottom(value: impl Into<String>) -> Self {
        Self {
            cursor_type: CursorType::Bottom,
            value: value.into(),
        }
    }
}

/// One retrieved post. The payload is owned by the client/renderer pair and is never
/// inspected here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub id: String,
    pub is_repost: bool,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    pub items: Vec<RawItem>,
    pub markers: Vec<PageMarker>,
}

/// Pagination parameters forwarded verbatim to the timeline client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOptions {
    pub page_size: Option<u32>,
    pub cursor: Option<String>,
}

/// Fully resolved, immutable description of one timeline request.
///
/// ```
/// use feedline_feed::TimelineRequest;
///
/// let req = TimelineRequest::builder("+44196397")
///     .retweets_excluded(true)
///     .page_size(Some(40))
///     .build()
///     .unwrap();
///
/// assert_eq!(req.account_id(), "+44196397");
/// assert!(req.retweets_excluded());
/// assert!(!req.replies_excluded());
/// assert_eq!(req.page_options().page_size, Some(40));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRequest {
    account_id: String,
    replies_excluded: bool,
    retweets_excluded: bool,
    page_size: Option<u32>,
    cursor: Option<String>,
    bypass_cache: bool,
}

impl TimelineRequest {
    pub fn builder(account_id: impl Into<String>) -> TimelineRequestBuilder {
        TimelineRequestBuilder {
            account_id: account_id.into(),
            replies_excluded: false,
            retweets_excluded: false,
            page_size: None,
            cursor: None,
            bypass_cache: false,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn replies_excluded(&self) -> bool {
        self.replies_excluded
    }

    pub fn retweets_excluded(&self) -> bool {
        self.retweets_excluded
    }

    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn bypass_cache(&self) -> bool {
        self.bypass_cache
    }

    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            page_size: self.page_size,
            cursor: self.cursor.clone(),
        }
    }
}

/// Validating builder for [`TimelineRequest`].
#[derive(Debug, Clone)]
pub struct TimelineRequestBuilder {
    account_id: String,
    replies_excluded: bool,
    retweets_excluded: bool,
    page_size: Option<u32>,
    cursor: Option<String>,
    bypass_cache: bool,
}

impl TimelineRequestBuilder {
    pub fn replies_excluded(mut self, yes: bool) -> Self {
        self.replies_excluded = yes;
        self
    }

    pub fn retweets_excluded(mut self, yes: bool) -> Self {
        self.retweets_excluded = yes;
        self
    }

    pub fn page_size(mut self, size: Option<u32>) -> Self {
        self.page_size = size;
        self
    }

    /// Empty cursors are treated as absent.
    pub fn cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor.filter(|c| !c.is_empty());
        self
    }

    pub fn bypass_cache(mut self, yes: bool) -> Self {
        self.bypass_cache = yes;
        self
    }

    pub fn build(self) -> Result<TimelineRequest> {
        validate_account_id(&self.account_id)?;
        if self.page_size == Some(0) {
            return Err(FeedlineError::Parameter("count must be positive".into()));
        }
        Ok(TimelineRequest {
            account_id: self.account_id,
            replies_excluded: self.replies_excluded,
            retweets_excluded: self.retweets_excluded,
            page_size: self.page_size,
            cursor: self.cursor,
            bypass_cache: self.bypass_cache,
        })
    }
}

/// A handle, or `+` followed by a numeric account id.
fn validate_account_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(FeedlineError::Parameter("account id is empty".into()));
    }
    if id.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(FeedlineError::Parameter(format!(
            "account id {id:?} contains whitespace or '/'"
        )));
    }
    if let Some(numeric) = id.strip_prefix('+') {
        if numeric.is_empty() || !numeric.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FeedlineError::Parameter(format!(
                "numeric account id {id:?} must be '+' followed by digits"
            )));
        }
    }
    Ok(())
}

/// A rendered feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub guid: String,
    pub description: String,
    pub author: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
}

/// Format-neutral feed handed to the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDocument {
    pub title: String,
    pub link: String,
    pub image: Option<String>,
    pub description: Option<String>,
    /// Empty when no Top marker was found.
    pub previous_page: String,
    /// Empty when no Bottom marker was found.
    pub next_page: String,
    pub items: Vec<FeedItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_include_everything() {
        let req = TimelineRequest::builder("DIYgod").build().unwrap();
        assert!(!req.replies_excluded());
        assert!(!req.retweets_excluded());
        assert!(!req.bypass_cache());
        assert_eq!(req.page_options(), PageOptions::default());
    }

    #[test]
    fn empty_cursor_is_dropped() {
        let req = TimelineRequest::builder("DIYgod")
            .cursor(Some(String::new()))
            .build()
            .unwrap();
        assert_eq!(req.cursor(), None);
    }

    #[test]
    fn rejects_malformed_account_ids() {
        for bad in ["", "   ", "+", "+12ab", "a/b", "two words"] {
            let err = TimelineRequest::builder(bad).build().unwrap_err();
            assert!(err.is_parameter(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn accepts_handles_and_numeric_ids() {
        for good in ["DIYgod", "+44196397", "under_score"] {
            assert!(TimelineRequest::builder(good).build().is_ok(), "{good:?}");
        }
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(
            TimelineRequest::builder("DIYgod")
                .page_size(Some(0))
                .build()
                .unwrap_err()
                .is_parameter()
        );
    }

    #[test]
    fn document_serializes_empty_cursors_as_strings() {
        let doc = FeedDocument {
            title: "Twitter @DIYgod".into(),
            link: "https://x.com/DIYgod".into(),
            image: None,
            description: None,
            previous_page: String::new(),
            next_page: String::new(),
            items: vec![],
        };
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["previousPage"], "");
        assert_eq!(v["nextPage"], "");
    }
}
