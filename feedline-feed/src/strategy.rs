//! Chooses which timeline retrieval to run for a request.
use crate::client::TimelineClient;
use crate::model::{RawPage, TimelineRequest};
use feedline_common::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStrategy {
    PostsOnly,
    PostsAndReplies,
}

impl RetrievalStrategy {
    /// Cache bypass always takes the posts-only path, whatever the reply setting.
    pub fn select(request: &TimelineRequest) -> Self {
        if request.bypass_cache() || request.replies_excluded() {
            Self::PostsOnly
        } else {
            Self::PostsAndReplies
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PostsOnly => "posts",
            Self::PostsAndReplies => "posts_and_replies",
        }
    }

    /// Run the retrieval. Failures propagate unchanged; nothing is retried here.
    pub async fn retrieve(
        self,
        client: &dyn TimelineClient,
        request: &TimelineRequest,
    ) -> Result<Vec<RawPage>> {
        let options = request.page_options();
        let pages = match self {
            Self::PostsOnly => client.get_posts(request.account_id(), &options).await?,
            Self::PostsAndReplies => {
                client
                    .get_posts_and_replies(request.account_id(), &options)
                    .await?
            }
        };
        tracing::debug!(
            account_id = %request.account_id(),
            strategy = self.name(),
            pages = pages.len(),
            "feed.timeline.retrieved"
        );
        Ok(pages)
    }
}
