use anyhow::{Context, Result};
use feedline_common::observability::{LogConfig, LogFormat};
use feedline_config::{FeedlineConfig, LoggingConfig};
use feedline_feed::{FeedAssembler, ParameterResolver, UserTimelineHandler};
use feedline_social::twitter::{
    TweetRenderer, XClientConfig, XCredentials, XQueryIds, XTimelineClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub fn log_config(logging: &LoggingConfig) -> LogConfig {
    LogConfig {
        log_dir: logging.dir.as_ref().map(PathBuf::from),
        emit_file: logging.file,
        emit_stderr: logging.stderr,
        format: LogFormat::from_name(&logging.format),
        default_filter: logging.filter.clone(),
        ..LogConfig::default()
    }
}

fn client_config(cfg: &FeedlineConfig) -> XClientConfig {
    let tw = &cfg.twitter;
    let credentials = XCredentials {
        auth_token: tw.auth_token.clone(),
        csrf_token: tw.csrf_token.clone(),
        bearer_token: tw.bearer_token.clone(),
    };
    let mut config = XClientConfig::new(credentials).with_base_url(tw.base_url.clone());
    config.query_ids = XQueryIds {
        user_by_screen_name: tw.query_ids.user_by_screen_name.clone(),
        user_by_rest_id: tw.query_ids.user_by_rest_id.clone(),
        user_tweets: tw.query_ids.user_tweets.clone(),
        user_tweets_and_replies: tw.query_ids.user_tweets_and_replies.clone(),
    };
    if let Some(size) = tw.page_size {
        config.page_size = size;
    }
    config.timeout = Duration::from_secs(tw.timeout_secs);
    config
}

/// Build the request handler and its collaborators from loaded configuration.
pub fn build_handler(cfg: &FeedlineConfig) -> Result<UserTimelineHandler> {
    let client = XTimelineClient::new(client_config(cfg)).context("building X client")?;
    let renderer = TweetRenderer::new(cfg.feed.profile_base_url.clone());
    let assembler = FeedAssembler::new(
        cfg.feed.platform_name.clone(),
        cfg.feed.profile_base_url.clone(),
    );
    let resolver = ParameterResolver::new().with_default_page_size(cfg.twitter.page_size);

    Ok(
        UserTimelineHandler::new(Arc::new(client), Arc::new(renderer))
            .with_resolver(resolver)
            .with_assembler(assembler),
    )
}
