//! Route modifiers and request resolution.
//!
//! The modifier segment is either a bare token (`exclude_replies`, `exclude_rts`,
//! `exclude_rts_replies`) or a query-string style list such as
//! `exclude_rts&count=20&excludeReplies=1`. Anything unrecognised is ignored.
use crate::model::TimelineRequest;
use crate::route::RouteInput;
use feedline_common::{FeedlineError, Result};

/// Flags and page size extracted from the modifier segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub exclude_replies: bool,
    pub exclude_retweets: bool,
    pub count: Option<u32>,
}

impl Modifiers {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let mut mods = Modifiers::default();
        let Some(raw) = raw else {
            return Ok(mods);
        };

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match (key.as_ref(), value.as_ref()) {
                ("", _) => {}
                ("exclude_replies", "") => mods.exclude_replies = true,
                ("exclude_rts", "") => mods.exclude_retweets = true,
                ("exclude_rts_replies" | "exclude_replies_rts", "") => {
                    mods.exclude_replies = true;
                    mods.exclude_retweets = true;
                }
                ("count", v) => {
                    let count = v
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| {
                            FeedlineError::Parameter(format!(
                                "count must be a positive integer, got {v:?}"
                            ))
                        })?;
                    mods.count = Some(count);
                }
                ("excludeReplies", v) => match parse_flag(v) {
                    Some(b) => mods.exclude_replies = b,
                    None => tracing::debug!(value = %v, "feed.params.ignored_flag_value"),
                },
                ("includeRts", v) => match parse_flag(v) {
                    Some(b) => mods.exclude_retweets = !b,
                    None => tracing::debug!(value = %v, "feed.params.ignored_flag_value"),
                },
                (k, _) => tracing::debug!(token = %k, "feed.params.ignored_modifier"),
            }
        }
        Ok(mods)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Builds [`TimelineRequest`]s from route inputs.
#[derive(Debug, Clone, Default)]
pub struct ParameterResolver {
    default_page_size: Option<u32>,
}

impl ParameterResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page size used when the route does not carry a `count`.
    pub fn with_default_page_size(mut self, size: Option<u32>) -> Self {
        self.default_page_size = size;
        self
    }

    /// ```
    /// use feedline_feed::{ParameterResolver, RouteInput};
    ///
    /// let req = ParameterResolver::new()
    ///     .resolve(&RouteInput::new("DIYgod").with_modifiers("exclude_replies"))
    ///     .unwrap();
    /// assert!(req.replies_excluded());
    /// assert!(!req.retweets_excluded());
    /// ```
    pub fn resolve(&self, input: &RouteInput) -> Result<TimelineRequest> {
        let mods = Modifiers::parse(input.modifiers.as_deref())?;
        TimelineRequest::builder(input.account_id.clone())
            .replies_excluded(mods.exclude_replies)
            .retweets_excluded(mods.exclude_retweets)
            .page_size(mods.count.or(self.default_page_size))
            .cursor(input.cursor.clone())
            .bypass_cache(input.no_cache)
            .build()
    }
}
