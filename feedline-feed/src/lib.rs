//! Feed synthesis for a single account timeline.
//!
//! A request flows through five stages:
//!
//! 1. [`params::ParameterResolver`] turns route inputs into an immutable
//!    [`TimelineRequest`].
//! 2. [`strategy::RetrievalStrategy`] picks posts-only or posts-and-replies retrieval
//!    on the [`TimelineClient`].
//! 3. [`filter`] drops reposts when asked to, keeping page boundaries and markers.
//! 4. [`cursor`] finds the previous/next pagination tokens.
//! 5. [`assemble::FeedAssembler`] builds the [`FeedDocument`], delegating items to a
//!    [`FeedItemRenderer`].
//!
//! [`handler::UserTimelineHandler`] wires the stages together. Session bootstrap, HTTP
//! transport and feed encoding live outside this crate.
pub mod assemble;
pub mod client;
pub mod cursor;
pub mod filter;
pub mod handler;
pub mod model;
pub mod params;
pub mod route;
pub mod strategy;

pub use assemble::FeedAssembler;
pub use client::{FeedItemRenderer, TimelineClient};
pub use handler::UserTimelineHandler;
pub use model::{
    CursorType, FeedDocument, FeedItem, PageMarker, PageOptions, RawItem, RawPage,
    TimelineRequest, TimelineRequestBuilder, UserProfile,
};
pub use params::ParameterResolver;
pub use route::RouteInput;
