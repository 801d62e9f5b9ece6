//! Feed item rendering for decoded X posts.
use crate::twitter::types::{MediaKind, Post};
use feedline_feed::{FeedItem, FeedItemRenderer, RawItem, RawPage};

const TITLE_MAX_CHARS: usize = 100;

/// Renders [`Post`] payloads as feed items with an HTML description.
#[derive(Debug, Clone)]
pub struct TweetRenderer {
    base_url: String,
}

impl Default for TweetRenderer {
    fn default() -> Self {
        Self::new("https://x.com")
    }
}

impl TweetRenderer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Permalink of a post; falls back to the handle-less `i/web` form.
    pub fn make_status_url(&self, handle: Option<&str>, id: &str) -> String {
        match handle {
            Some(h) => format!("{}/{}/status/{}", self.base_url, h, id),
            None => format!("{}/i/web/status/{}", self.base_url, id),
        }
    }

    fn render_item(&self, item: &RawItem) -> Option<FeedItem> {
        let post: Post = match serde_json::from_value(item.payload.clone()) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(id = %item.id, error = %e, "x.render.skipped");
                return None;
            }
        };
        let link = self.make_status_url(post.author_handle.as_deref(), &post.id);

        let (title, description) = match post.reposted.as_deref() {
            Some(original) => {
                let who = original.author_handle.as_deref().unwrap_or("unknown");
                (
                    format!("RT @{}: {}", who, summary(&original.text)),
                    format!(
                        "RT <a href=\"{}/{}\">@{}</a>:<br>{}",
                        self.base_url,
                        escape_html(who),
                        escape_html(who),
                        self.body(original)
                    ),
                )
            }
            None => (summary(&post.text), self.body(&post)),
        };

        Some(FeedItem {
            title,
            guid: link.clone(),
            link,
            description,
            author: post.author_name.or(post.author_handle),
            pub_date: post.created_at,
        })
    }

    fn body(&self, post: &Post) -> String {
        let mut html = escape_html(&post.text).replace('\n', "<br>");
        for m in &post.media {
            let img = format!("<img src=\"{}\">", escape_html(&m.url));
            html.push_str("<br>");
            match (&m.kind, &m.link) {
                (MediaKind::Photo, _) | (_, None) => html.push_str(&img),
                (_, Some(link)) => {
                    html.push_str(&format!("<a href=\"{}\">{}</a>", escape_html(link), img));
                }
            }
        }
        if let Some(quoted) = post.quoted.as_deref() {
            let who = quoted.author_handle.as_deref().unwrap_or("unknown");
            let link = self.make_status_url(quoted.author_handle.as_deref(), &quoted.id);
            html.push_str(&format!(
                "<blockquote><a href=\"{}\">@{}</a>:<br>{}</blockquote>",
                escape_html(&link),
                escape_html(who),
                self.body(quoted)
            ));
        }
        html
    }
}

impl FeedItemRenderer for TweetRenderer {
    fn render(&self, pages: &[RawPage]) -> Vec<FeedItem> {
        pages
            .iter()
            .flat_map(|p| &p.items)
            .filter_map(|item| self.render_item(item))
            .collect()
    }
}

/// First line of the text, cut to a readable title length.
fn summary(text: &str) -> String {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if line.chars().count() <= TITLE_MAX_CHARS {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(TITLE_MAX_CHARS).collect();
    cut.push('…');
    cut
}

/// Minimal HTML escaping for text and attribute values.
///
/// ```
/// use feedline_social::twitter::render::escape_html;
///
/// assert_eq!(escape_html(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
/// ```
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
