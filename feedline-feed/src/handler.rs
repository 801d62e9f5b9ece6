//! Request orchestration for the user-timeline feed.
use crate::assemble::FeedAssembler;
use crate::client::{FeedItemRenderer, TimelineClient};
use crate::model::{FeedDocument, TimelineRequest};
use crate::params::ParameterResolver;
use crate::route::RouteInput;
use crate::strategy::RetrievalStrategy;
use crate::{cursor, filter};
use feedline_common::Result;
use std::sync::Arc;

/// Serves user-timeline feeds. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct UserTimelineHandler {
    client: Arc<dyn TimelineClient>,
    renderer: Arc<dyn FeedItemRenderer>,
    resolver: ParameterResolver,
    assembler: FeedAssembler,
}

impl UserTimelineHandler {
    pub fn new(client: Arc<dyn TimelineClient>, renderer: Arc<dyn FeedItemRenderer>) -> Self {
        Self {
            client,
            renderer,
            resolver: ParameterResolver::new(),
            assembler: FeedAssembler::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: ParameterResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_assembler(mut self, assembler: FeedAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Resolve the route inputs and build the feed.
    pub async fn handle(&self, input: &RouteInput) -> Result<FeedDocument> {
        let request = self.resolver.resolve(input)?;
        self.handle_request(&request).await
    }

    /// Build the feed for an already resolved request. Any session or retrieval failure
    /// fails the whole request.
    pub async fn handle_request(&self, request: &TimelineRequest) -> Result<FeedDocument> {
        let strategy = RetrievalStrategy::select(request);
        tracing::info!(
            account_id = %request.account_id(),
            strategy = strategy.name(),
            replies_excluded = request.replies_excluded(),
            retweets_excluded = request.retweets_excluded(),
            page_size = ?request.page_size(),
            has_cursor = request.cursor().is_some(),
            bypass_cache = request.bypass_cache(),
            "feed.request.resolved"
        );

        self.client.init_session().await?;

        let (profile, pages) = tokio::try_join!(
            self.client.get_profile(request.account_id()),
            strategy.retrieve(self.client.as_ref(), request),
        )?;

        let pages = filter::apply(pages, request.retweets_excluded());
        let cursors = cursor::extract(&pages);
        let doc = self
            .assembler
            .assemble(&profile, &pages, cursors, self.renderer.as_ref());

        tracing::info!(
            account_id = %request.account_id(),
            items = doc.items.len(),
            "feed.request.completed"
        );
        Ok(doc)
    }
}
