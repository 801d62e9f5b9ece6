//! Authenticated client for the X web GraphQL API.
//!
//! The session is built from injected cookies (`auth_token` + `ct0`) and checked once
//! against `1.1/account/settings.json`; every later call reuses the same headers.
//! Handles are resolved to numeric ids through `UserByScreenName` and remembered for the
//! life of the client, while `+`-prefixed ids skip that lookup entirely.
use crate::twitter::extract::{pages_from_response, profile_from_response};
use crate::twitter::types::{AccountSettings, UserResponse};
use async_trait::async_trait;
use dashmap::DashMap;
use feedline_common::{FeedlineError, Result};
use feedline_feed::{PageOptions, RawPage, TimelineClient, UserProfile};
use feedline_http::{Auth, HttpClient, HttpError, RequestOpts};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

pub const DEFAULT_BASE_URL: &str = "https://x.com/i/api/";
pub const DEFAULT_PAGE_SIZE: u32 = 20;

// Feature switches the web client sends with every timeline query.
const FEATURES: &str = r#"{"rweb_tipjar_consumption_enabled":true,"responsive_web_graphql_exclude_directive_enabled":true,"verified_phone_label_enabled":false,"creator_subscriptions_tweet_preview_api_enabled":true,"responsive_web_graphql_timeline_navigation_enabled":true,"responsive_web_graphql_skip_user_profile_image_extensions_enabled":false,"communities_web_enable_tweet_community_results_fetch":true,"c9s_tweet_anatomy_moderator_badge_enabled":true,"tweetypie_unmention_optimization_enabled":true,"responsive_web_edit_tweet_api_enabled":true,"graphql_is_translatable_rweb_tweet_is_translatable_enabled":true,"view_counts_everywhere_api_enabled":true,"longform_notetweets_consumption_enabled":true,"responsive_web_twitter_article_tweet_consumption_enabled":true,"tweet_awards_web_tipping_enabled":false,"freedom_of_speech_not_reach_fetch_enabled":true,"standardized_nudges_misinfo":true,"tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled":true,"rweb_video_timestamps_enabled":true,"longform_notetweets_rich_text_read_enabled":true,"longform_notetweets_inline_media_enabled":true,"responsive_web_enhance_cards_enabled":false,"hidden_profile_likes_enabled":true,"hidden_profile_subscriptions_enabled":true,"highlights_tweets_tab_ui_enabled":true,"subscriptions_verification_info_is_identity_verified_enabled":true,"subscriptions_verification_info_verified_since_enabled":true,"responsive_web_twitter_article_notes_tab_enabled":true}"#;

/// Cookie credentials of a logged-in web session plus the web client's bearer token.
#[derive(Clone)]
pub struct XCredentials {
    pub auth_token: String,
    pub csrf_token: String,
    pub bearer_token: String,
}

impl std::fmt::Debug for XCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XCredentials")
            .field("auth_token", &"***")
            .field("csrf_token", &"***")
            .field("bearer_token", &"***")
            .finish()
    }
}

/// Persisted-query ids; X rotates these with web client releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XQueryIds {
    pub user_by_screen_name: String,
    pub user_by_rest_id: String,
    pub user_tweets: String,
    pub user_tweets_and_replies: String,
}

impl Default for XQueryIds {
    fn default() -> Self {
        Self {
            user_by_screen_name: "G3KGOASz96M-Qu0nwmGXNg".into(),
            user_by_rest_id: "tD8zKvQzwY3kdx5yz6YmOw".into(),
            user_tweets: "E3opETHurmVJflFsUBVuUQ".into(),
            user_tweets_and_replies: "bt4TKuFz4T7Ckk-VvQVSow".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct XClientConfig {
    pub base_url: String,
    pub credentials: XCredentials,
    pub query_ids: XQueryIds,
    /// Timeline page size used when the request does not carry a count.
    pub page_size: u32,
    pub timeout: Duration,
}

impl XClientConfig {
    pub fn new(credentials: XCredentials) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            credentials,
            query_ids: XQueryIds::default(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

struct Session {
    headers: HeaderMap,
}

#[derive(Debug, Clone, Copy)]
enum TimelineKind {
    Tweets,
    TweetsAndReplies,
}

/// [`TimelineClient`] backed by the X web API.
pub struct XTimelineClient {
    http: HttpClient,
    credentials: XCredentials,
    query_ids: XQueryIds,
    page_size: u32,
    session: OnceCell<Session>,
    rest_ids: DashMap<String, String>,
    // One shared lookup per account while it is in flight.
    lookups: DashMap<String, Arc<OnceCell<UserProfile>>>,
}

impl XTimelineClient {
    pub fn new(config: XClientConfig) -> Result<Self> {
        let base_url = if config.base_url.ends_with('/') {
            config.base_url
        } else {
            format!("{}/", config.base_url)
        };
        let http = HttpClient::new(&base_url)
            .map_err(|e| FeedlineError::Config(format!("x base url: {e}")))?
            .with_timeout(config.timeout);
        Ok(Self {
            http,
            credentials: config.credentials,
            query_ids: config.query_ids,
            page_size: config.page_size.max(1),
            session: OnceCell::new(),
            rest_ids: DashMap::new(),
            lookups: DashMap::new(),
        })
    }

    /// Numeric id already known for `handle`, if any.
    pub fn cached_rest_id(&self, handle: &str) -> Option<String> {
        self.rest_ids
            .get(&handle.to_ascii_lowercase())
            .map(|v| v.value().clone())
    }

    fn session_headers(&self) -> Result<HeaderMap> {
        let value = |raw: String| {
            HeaderValue::from_str(&raw)
                .map_err(|e| FeedlineError::Session(format!("invalid credential: {e}")))
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::COOKIE,
            value(format!(
                "auth_token={}; ct0={}",
                self.credentials.auth_token, self.credentials.csrf_token
            ))?,
        );
        headers.insert(
            HeaderName::from_static("x-csrf-token"),
            value(self.credentials.csrf_token.clone())?,
        );
        headers.insert(
            HeaderName::from_static("x-twitter-auth-type"),
            HeaderValue::from_static("OAuth2Session"),
        );
        headers.insert(
            HeaderName::from_static("x-twitter-active-user"),
            HeaderValue::from_static("yes"),
        );
        Ok(headers)
    }

    async fn bootstrap(&self) -> Result<Session> {
        let headers = self.session_headers()?;
        let settings: AccountSettings = self
            .http
            .get_json(
                "1.1/account/settings.json",
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.credentials.bearer_token)),
                    headers: Some(headers.clone()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "x.session.failed");
                FeedlineError::Session(e.to_string())
            })?;
        tracing::info!(
            screen_name = settings.screen_name.as_deref().unwrap_or("-"),
            "x.session.ready"
        );
        Ok(Session { headers })
    }

    async fn session(&self) -> Result<&Session> {
        self.session.get_or_try_init(|| self.bootstrap()).await
    }

    async fn graphql(
        &self,
        query_id: &str,
        operation: &str,
        variables: Value,
    ) -> Result<UserResponse> {
        let session = self.session().await?;
        let path = format!("graphql/{query_id}/{operation}");
        tracing::debug!(operation, "x.graphql.request");
        let query: Vec<(&str, Cow<'_, str>)> = vec![
            ("variables", variables.to_string().into()),
            ("features", FEATURES.into()),
        ];
        self.http
            .get_json(
                &path,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.credentials.bearer_token)),
                    headers: Some(session.headers.clone()),
                    query: Some(query),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| retrieval(operation, e))
    }

    /// Fetch the profile for `account_id`. Concurrent callers for the same account share
    /// a single upstream request; once it settles the next call fetches afresh.
    async fn lookup_user(&self, account_id: &str) -> Result<UserProfile> {
        let key = account_id.to_ascii_lowercase();
        let cell = self.lookups.entry(key.clone()).or_default().value().clone();
        let result = cell
            .get_or_try_init(|| self.fetch_user(account_id))
            .await
            .cloned();
        self.lookups.remove_if(&key, |_, v| Arc::ptr_eq(v, &cell));
        result
    }

    async fn fetch_user(&self, account_id: &str) -> Result<UserProfile> {
        let resp = match account_id.strip_prefix('+') {
            Some(rest_id) => {
                self.graphql(
                    &self.query_ids.user_by_rest_id,
                    "UserByRestId",
                    json!({ "userId": rest_id, "withSafetyModeUserFields": true }),
                )
                .await?
            }
            None => {
                self.graphql(
                    &self.query_ids.user_by_screen_name,
                    "UserByScreenName",
                    json!({ "screen_name": account_id, "withSafetyModeUserFields": true }),
                )
                .await?
            }
        };
        let profile = profile_from_response(resp)
            .map_err(|e| FeedlineError::Retrieval(format!("user {account_id}: {e:#}")))?;
        self.rest_ids
            .insert(profile.handle.to_ascii_lowercase(), profile.account_id.clone());
        Ok(profile)
    }

    async fn rest_id(&self, account_id: &str) -> Result<String> {
        if let Some(id) = account_id.strip_prefix('+') {
            return Ok(id.to_string());
        }
        if let Some(id) = self.cached_rest_id(account_id) {
            tracing::trace!(handle = account_id, "x.rest_id.cached");
            return Ok(id);
        }
        Ok(self.lookup_user(account_id).await?.account_id)
    }

    async fn timeline(
        &self,
        kind: TimelineKind,
        account_id: &str,
        options: &PageOptions,
    ) -> Result<Vec<RawPage>> {
        let user_id = self.rest_id(account_id).await?;
        let count = options.page_size.unwrap_or(self.page_size);

        let mut variables = json!({
            "userId": user_id,
            "count": count,
            "includePromotedContent": false,
            "withQuickPromoteEligibilityTweetFields": true,
            "withVoice": true,
            "withV2Timeline": true,
        });
        if let Some(cursor) = &options.cursor {
            variables["cursor"] = json!(cursor);
        }
        let (query_id, operation) = match kind {
            TimelineKind::Tweets => (&self.query_ids.user_tweets, "UserTweets"),
            TimelineKind::TweetsAndReplies => {
                variables["withCommunity"] = json!(true);
                (&self.query_ids.user_tweets_and_replies, "UserTweetsAndReplies")
            }
        };

        let resp = self.graphql(query_id, operation, variables).await?;
        let pages = pages_from_response(resp)
            .map_err(|e| FeedlineError::Retrieval(format!("{operation}: {e:#}")))?;
        tracing::debug!(
            operation,
            user_id = %user_id,
            pages = pages.len(),
            items = pages.iter().map(|p| p.items.len()).sum::<usize>(),
            "x.timeline.decoded"
        );
        Ok(pages)
    }
}

fn retrieval(operation: &str, err: HttpError) -> FeedlineError {
    tracing::warn!(operation, status = ?err.status(), error = %err, "x.graphql.failed");
    FeedlineError::Retrieval(format!("{operation}: {err}"))
}

#[async_trait]
impl TimelineClient for XTimelineClient {
    async fn init_session(&self) -> Result<()> {
        self.session().await.map(|_| ())
    }

    async fn get_profile(&self, account_id: &str) -> Result<UserProfile> {
        self.lookup_user(account_id).await
    }

    async fn get_posts(&self, account_id: &str, options: &PageOptions) -> Result<Vec<RawPage>> {
        self.timeline(TimelineKind::Tweets, account_id, options).await
    }

    async fn get_posts_and_replies(
        &self,
        account_id: &str,
        options: &PageOptions,
    ) -> Result<Vec<RawPage>> {
        self.timeline(TimelineKind::TweetsAndReplies, account_id, options)
            .await
    }
}
