//! Final feed document assembly.
use crate::client::FeedItemRenderer;
use crate::cursor::PageCursors;
use crate::model::{FeedDocument, RawPage, UserProfile};
use regex::Regex;
use std::sync::LazyLock;

// `_normal`, `_bigger` and `_mini` are the reduced avatar renditions.
static LOW_RES_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_(?:normal|bigger|mini)(\.[A-Za-z0-9]+)?(\?[^/]*)?$").expect("static regex")
});

/// Rewrite a reduced avatar URL to its full-size asset; other URLs pass through.
///
/// ```
/// use feedline_feed::assemble::full_size_image_url;
///
/// assert_eq!(
///     full_size_image_url("https://pbs.twimg.com/profile_images/1/abc_normal.jpg"),
///     "https://pbs.twimg.com/profile_images/1/abc.jpg"
/// );
/// assert_eq!(
///     full_size_image_url("https://pbs.twimg.com/profile_images/1/abc.png"),
///     "https://pbs.twimg.com/profile_images/1/abc.png"
/// );
/// ```
pub fn full_size_image_url(url: &str) -> String {
    LOW_RES_SUFFIX.replace(url, "${1}${2}").into_owned()
}

/// Builds [`FeedDocument`]s for one platform.
#[derive(Debug, Clone)]
pub struct FeedAssembler {
    platform_name: String,
    profile_base_url: String,
}

impl Default for FeedAssembler {
    fn default() -> Self {
        Self::new("Twitter", "https://x.com")
    }
}

impl FeedAssembler {
    pub fn new(platform_name: impl Into<String>, profile_base_url: impl Into<String>) -> Self {
        Self {
            platform_name: platform_name.into(),
            profile_base_url: profile_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `<platform> @<display name>`, falling back to the handle when the profile has
    /// no usable display name.
    pub fn title(&self, profile: &UserProfile) -> String {
        let name = profile
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(profile.handle.as_str());
        format!("{} @{}", self.platform_name, name)
    }

    pub fn profile_link(&self, handle: &str) -> String {
        format!("{}/{}", self.profile_base_url, handle)
    }

    pub fn assemble(
        &self,
        profile: &UserProfile,
        pages: &[RawPage],
        cursors: PageCursors,
        renderer: &dyn FeedItemRenderer,
    ) -> FeedDocument {
        let items = renderer.render(pages);
        tracing::debug!(
            handle = %profile.handle,
            items = items.len(),
            has_previous = !cursors.previous.is_empty(),
            has_next = !cursors.next.is_empty(),
            "feed.document.assembled"
        );
        FeedDocument {
            title: self.title(profile),
            link: self.profile_link(&profile.handle),
            image: profile
                .profile_image_url
                .as_deref()
                .map(full_size_image_url),
            description: profile.bio.clone(),
            previous_page: cursors.previous,
            next_page: cursors.next,
            items,
        }
    }
}
