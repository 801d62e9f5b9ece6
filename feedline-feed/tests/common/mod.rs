use async_trait::async_trait;
use feedline_common::{FeedlineError, Result};
use feedline_feed::{
    FeedItem, FeedItemRenderer, PageMarker, PageOptions, RawItem, RawPage, TimelineClient,
    UserProfile,
};
use serde_json::json;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Profile(String),
    Posts(String, PageOptions),
    PostsAndReplies(String, PageOptions),
}

/// In-memory timeline source that records every call.
#[derive(Default)]
pub struct FakeClient {
    pub pages: Vec<RawPage>,
    pub fail_session: bool,
    pub fail_profile: bool,
    pub inits: AtomicUsize,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeClient {
    pub fn with_pages(pages: Vec<RawPage>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TimelineClient for FakeClient {
    async fn init_session(&self) -> Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_session {
            return Err(FeedlineError::Session("login rejected".into()));
        }
        Ok(())
    }

    async fn get_profile(&self, account_id: &str) -> Result<UserProfile> {
        self.record(Call::Profile(account_id.to_string()));
        if self.fail_profile {
            return Err(FeedlineError::Retrieval("rate limited".into()));
        }
        Ok(UserProfile {
            account_id: "3178231".into(),
            display_name: Some("DIYgod".into()),
            handle: "DIYgod".into(),
            bio: Some("写代码是热爱，写到世界充满爱！".into()),
            profile_image_url: Some(
                "https://pbs.twimg.com/profile_images/1234/avatar_normal.jpg".into(),
            ),
        })
    }

    async fn get_posts(&self, account_id: &str, options: &PageOptions) -> Result<Vec<RawPage>> {
        self.record(Call::Posts(account_id.to_string(), options.clone()));
        Ok(self.pages.clone())
    }

    async fn get_posts_and_replies(
        &self,
        account_id: &str,
        options: &PageOptions,
    ) -> Result<Vec<RawPage>> {
        self.record(Call::PostsAndReplies(account_id.to_string(), options.clone()));
        Ok(self.pages.clone())
    }
}

/// Renders each item as its id.
pub struct IdRenderer;

impl FeedItemRenderer for IdRenderer {
    fn render(&self, pages: &[RawPage]) -> Vec<FeedItem> {
        pages
            .iter()
            .flat_map(|p| &p.items)
            .map(|i| FeedItem {
                title: i.id.clone(),
                link: format!("https://x.com/DIYgod/status/{}", i.id),
                guid: i.id.clone(),
                description: String::new(),
                author: Some("DIYgod".into()),
                pub_date: None,
            })
            .collect()
    }
}

pub fn item(id: &str, is_repost: bool) -> RawItem {
    RawItem {
        id: id.into(),
        is_repost,
        payload: json!({ "id": id }),
    }
}

/// A pinned-post page without markers followed by a regular page with cursors.
pub fn sample_pages() -> Vec<RawPage> {
    vec![
        RawPage {
            items: vec![item("100", false)],
            markers: vec![],
        },
        RawPage {
            items: vec![item("101", false), item("102", true), item("103", false)],
            markers: vec![PageMarker::top("TOP-1"), PageMarker::bottom("BOTTOM-1")],
        },
    ]
}
