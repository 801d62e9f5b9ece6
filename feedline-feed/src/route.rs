//! Inbound request shape for `GET /user/{accountId}/{modifiers?}?cursor=..&noCache`.
use feedline_common::{FeedlineError, Result};
use percent_encoding::percent_decode_str;
use url::Url;

/// Raw, unvalidated inputs of a user-timeline request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteInput {
    pub account_id: String,
    pub modifiers: Option<String>,
    pub cursor: Option<String>,
    pub no_cache: bool,
}

impl RouteInput {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ..Self::default()
        }
    }

    pub fn with_modifiers(mut self, modifiers: impl Into<String>) -> Self {
        self.modifiers = Some(modifiers.into());
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    /// Parse a route such as `/user/DIYgod/exclude_rts?cursor=abc&noCache`.
    ///
    /// `noCache` is a presence flag; its value is ignored.
    ///
    /// ```
    /// use feedline_feed::RouteInput;
    ///
    /// let input = RouteInput::from_route("/user/+44196397/exclude_rts_replies?cursor=DAAB&noCache").unwrap();
    /// assert_eq!(input.account_id, "+44196397");
    /// assert_eq!(input.modifiers.as_deref(), Some("exclude_rts_replies"));
    /// assert_eq!(input.cursor.as_deref(), Some("DAAB"));
    /// assert!(input.no_cache);
    /// ```
    pub fn from_route(route: &str) -> Result<Self> {
        let base = Url::parse("http://feedline.invalid/")
            .map_err(|e| FeedlineError::Parameter(e.to_string()))?;
        let url = base
            .join(route.trim_start_matches('/'))
            .map_err(|e| FeedlineError::Parameter(format!("invalid route {route:?}: {e}")))?;

        // Path segments stay percent-encoded in `Url`; `+` in an id arrives as `%2B`.
        let segments = url
            .path_segments()
            .map(|s| {
                s.filter(|seg| !seg.is_empty())
                    .map(|seg| {
                        percent_decode_str(seg).decode_utf8().map_err(|e| {
                            FeedlineError::Parameter(format!("invalid route segment {seg:?}: {e}"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        let (account_id, modifiers) = match segments.as_slice() {
            [user, id] if user == "user" => (id, None),
            [user, id, mods] if user == "user" => (id, Some(mods)),
            _ => {
                return Err(FeedlineError::Parameter(format!(
                    "route {route:?} does not match /user/{{id}}/{{modifiers?}}"
                )));
            }
        };

        let mut input = RouteInput::new(account_id.to_string());
        input.modifiers = modifiers.map(|m| m.to_string());
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "cursor" => input.cursor = Some(value.into_owned()),
                "noCache" => input.no_cache = true,
                other => tracing::debug!(key = %other, "feed.route.ignored_query_param"),
            }
        }
        Ok(input)
    }
}
