//! X/Twitter integration surface.
//!
//! `client` talks to the web GraphQL API with an injected cookie session, `extract`
//! converts raw responses into the feed core's typed pages up front, `render` turns
//! decoded posts into feed items, and `types` holds both the wire models and the
//! normalized [`types::Post`] carried in item payloads.
pub mod client;
pub mod extract;
pub mod render;
pub mod types;

pub use client::{XClientConfig, XCredentials, XQueryIds, XTimelineClient};
pub use render::TweetRenderer;
