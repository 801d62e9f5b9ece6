//! Collaborator seams: the authenticated timeline source and the item renderer.
use crate::model::{FeedItem, PageOptions, RawPage, UserProfile};
use async_trait::async_trait;
use feedline_common::Result;

/// Authenticated access to an account's profile and timeline.
///
/// Implementations own the shared session. `init_session` may be called by many
/// concurrent requests and must bootstrap the session at most once; every other call
/// assumes it has completed. Account ids are passed through exactly as the caller gave
/// them (`+`-prefixed numeric ids included) and resolved by the implementation.
#[async_trait]
pub trait TimelineClient: Send + Sync {
    async fn init_session(&self) -> Result<()>;

    async fn get_profile(&self, account_id: &str) -> Result<UserProfile>;

    /// Authored posts only.
    async fn get_posts(&self, account_id: &str, options: &PageOptions) -> Result<Vec<RawPage>>;

    /// Authored posts and replies.
    async fn get_posts_and_replies(
        &self,
        account_id: &str,
        options: &PageOptions,
    ) -> Result<Vec<RawPage>>;
}

/// Turns retrieved pages into renderable feed entries.
pub trait FeedItemRenderer: Send + Sync {
    fn render(&self, pages: &[RawPage]) -> Vec<FeedItem>;
}
