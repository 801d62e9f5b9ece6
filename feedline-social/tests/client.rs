use feedline_feed::{PageOptions, RouteInput, TimelineClient, UserTimelineHandler};
use feedline_social::twitter::{TweetRenderer, XClientConfig, XCredentials, XTimelineClient};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn client(server: &MockServer) -> XTimelineClient {
    let creds = XCredentials {
        auth_token: "auth-cookie".into(),
        csrf_token: "csrf-cookie".into(),
        bearer_token: "web-bearer".into(),
    };
    XTimelineClient::new(
        XClientConfig::new(creds).with_base_url(format!("{}/i/api/", server.uri())),
    )
    .unwrap()
}

async fn mount_settings(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/i/api/1.1/account/settings.json"))
        .and(header("authorization", "Bearer web-bearer"))
        .and(header("x-csrf-token", "csrf-cookie"))
        .and(header("cookie", "auth_token=auth-cookie; ct0=csrf-cookie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "screen_name": "feedbot" })))
        .expect(expected)
        .mount(server)
        .await;
}

fn user_body(rest_id: &str, handle: &str) -> Value {
    json!({ "data": { "user": { "result": {
        "__typename": "User",
        "rest_id": rest_id,
        "legacy": {
            "name": handle,
            "screen_name": handle,
            "description": "bio",
            "profile_image_url_https": "https://pbs.twimg.com/profile_images/1/me_normal.jpg"
        }
    } } } })
}

fn tweet(id: &str, text: &str, retweet_of: Option<Value>) -> Value {
    let mut legacy = json!({ "full_text": text, "created_at": "Wed May 01 08:00:00 +0000 2024" });
    if let Some(original) = retweet_of {
        legacy["retweeted_status_result"] = json!({ "result": original });
    }
    json!({
        "entryId": format!("tweet-{id}"),
        "content": {
            "entryType": "TimelineTimelineItem",
            "itemContent": { "itemType": "TimelineTweet", "tweet_results": { "result": {
                "__typename": "Tweet",
                "rest_id": id,
                "core": { "user_results": { "result": {
                    "rest_id": "3178231", "legacy": { "screen_name": "DIYgod", "name": "DIYgod" }
                } } },
                "legacy": legacy
            } } }
        }
    })
}

fn cursor(kind: &str, value: &str) -> Value {
    json!({
        "entryId": format!("cursor-{value}"),
        "content": { "entryType": "TimelineTimelineCursor", "cursorType": kind, "value": value }
    })
}

fn timeline_body() -> Value {
    let original = json!({
        "__typename": "Tweet",
        "rest_id": "900",
        "core": { "user_results": { "result": { "legacy": { "screen_name": "alice" } } } },
        "legacy": { "full_text": "alice wrote this" }
    });
    json!({ "data": { "user": { "result": {
        "__typename": "User",
        "timeline_v2": { "timeline": { "instructions": [
            { "type": "TimelineClearCache" },
            { "type": "TimelineAddEntries", "entries": [
                tweet("2", "RT @alice: alice wrote this", Some(original)),
                tweet("1", "my own post", None),
                cursor("Top", "TOP-1"),
                cursor("Bottom", "BOTTOM-1")
            ] }
        ] } }
    } } } })
}

fn variables(req: &Request) -> Value {
    let raw = req
        .url
        .query_pairs()
        .find(|(k, _)| k == "variables")
        .map(|(_, v)| v.into_owned())
        .expect("variables query parameter");
    serde_json::from_str(&raw).unwrap()
}

async fn requests_to(server: &MockServer, operation: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().ends_with(operation))
        .collect()
}

#[tokio::test]
async fn concurrent_init_bootstraps_once() {
    let server = MockServer::start().await;
    mount_settings(&server, 1).await;
    let client = client(&server);

    let (a, b, c, d) = tokio::join!(
        client.init_session(),
        client.init_session(),
        client.init_session(),
        client.init_session()
    );
    for r in [a, b, c, d] {
        r.unwrap();
    }
    client.init_session().await.unwrap();
}

#[tokio::test]
async fn failed_bootstrap_is_a_session_error_and_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/i/api/1.1/account/settings.json"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "errors": [{ "message": "Could not authenticate you", "code": 32 }] })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_settings(&server, 1).await;
    let client = client(&server);

    let err = client.init_session().await.unwrap_err();
    assert!(err.is_session(), "{err}");
    assert!(err.to_string().contains("Could not authenticate you"));

    client.init_session().await.unwrap();
}

#[tokio::test]
async fn handles_are_resolved_once_and_cached() {
    let server = MockServer::start().await;
    mount_settings(&server, 1).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/i/api/graphql/[^/]+/UserByScreenName$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body("3178231", "DIYgod")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/i/api/graphql/[^/]+/UserTweets$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline_body()))
        .expect(2)
        .mount(&server)
        .await;
    let client = client(&server);
    client.init_session().await.unwrap();

    let profile = client.get_profile("DIYgod").await.unwrap();
    assert_eq!(profile.account_id, "3178231");
    assert_eq!(client.cached_rest_id("diygod").as_deref(), Some("3178231"));

    for _ in 0..2 {
        let pages = client.get_posts("DIYgod", &PageOptions::default()).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].items.len(), 2);
    }

    let lookups = requests_to(&server, "UserByScreenName").await;
    assert_eq!(variables(&lookups[0])["screen_name"], "DIYgod");
    for req in requests_to(&server, "UserTweets").await {
        let vars = variables(&req);
        assert_eq!(vars["userId"], "3178231");
        assert_eq!(vars["count"], 20);
        assert!(vars.get("cursor").is_none());
    }
}

#[tokio::test]
async fn numeric_ids_skip_the_handle_lookup() {
    let server = MockServer::start().await;
    mount_settings(&server, 1).await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserByRestId$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body("44196397", "elonmusk")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserByScreenName$"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserTweetsAndReplies$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline_body()))
        .expect(1)
        .mount(&server)
        .await;
    let client = client(&server);

    let profile = client.get_profile("+44196397").await.unwrap();
    assert_eq!(profile.handle, "elonmusk");

    let options = PageOptions {
        page_size: Some(5),
        cursor: Some("DAABCgABGA".into()),
    };
    client
        .get_posts_and_replies("+44196397", &options)
        .await
        .unwrap();

    let lookup = &requests_to(&server, "UserByRestId").await[0];
    assert_eq!(variables(lookup)["userId"], "44196397");
    let timeline = &requests_to(&server, "UserTweetsAndReplies").await[0];
    let vars = variables(timeline);
    assert_eq!(vars["userId"], "44196397");
    assert_eq!(vars["count"], 5);
    assert_eq!(vars["cursor"], "DAABCgABGA");
    assert_eq!(vars["withCommunity"], true);
}

#[tokio::test]
async fn rate_limits_are_retrieval_errors() {
    let server = MockServer::start().await;
    mount_settings(&server, 1).await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserTweets$"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({ "errors": [{ "message": "Rate limit exceeded", "code": 88 }] })),
        )
        .mount(&server)
        .await;
    let client = client(&server);

    let err = client
        .get_posts("+3178231", &PageOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_retrieval(), "{err}");
    assert!(err.to_string().contains("UserTweets"));
}

#[tokio::test]
async fn undecodable_timelines_are_retrieval_errors() {
    let server = MockServer::start().await;
    mount_settings(&server, 1).await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserTweets$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "user": { "result": {} } } })))
        .mount(&server)
        .await;
    let client = client(&server);

    let err = client
        .get_posts("+3178231", &PageOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_retrieval(), "{err}");
}

#[tokio::test]
async fn builds_a_feed_end_to_end() {
    let server = MockServer::start().await;
    mount_settings(&server, 1).await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserByScreenName$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body("3178231", "DIYgod")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserTweetsAndReplies$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline_body()))
        .expect(1)
        .mount(&server)
        .await;

    let handler = UserTimelineHandler::new(
        Arc::new(client(&server)),
        Arc::new(TweetRenderer::default()),
    );
    let input = RouteInput::from_route("/user/DIYgod/exclude_rts").unwrap();
    let doc = handler.handle(&input).await.unwrap();

    assert_eq!(doc.title, "Twitter @DIYgod");
    assert_eq!(doc.link, "https://x.com/DIYgod");
    assert_eq!(
        doc.image.as_deref(),
        Some("https://pbs.twimg.com/profile_images/1/me.jpg")
    );
    assert_eq!(doc.description.as_deref(), Some("bio"));
    assert_eq!(doc.previous_page, "TOP-1");
    assert_eq!(doc.next_page, "BOTTOM-1");

    assert_eq!(doc.items.len(), 1);
    assert_eq!(doc.items[0].title, "my own post");
    assert_eq!(doc.items[0].link, "https://x.com/DIYgod/status/1");
}

#[tokio::test]
async fn reposts_render_with_the_original_author() {
    let server = MockServer::start().await;
    mount_settings(&server, 1).await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserByRestId$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body("3178231", "DIYgod")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserTweets$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline_body()))
        .expect(1)
        .mount(&server)
        .await;

    let handler = UserTimelineHandler::new(
        Arc::new(client(&server)),
        Arc::new(TweetRenderer::default()),
    );
    let input = RouteInput::new("+3178231").with_no_cache(true);
    let doc = handler.handle(&input).await.unwrap();

    let titles: Vec<&str> = doc.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["RT @alice: alice wrote this", "my own post"]);
}

#[tokio::test]
async fn concurrent_profile_and_timeline_share_one_handle_lookup() {
    let server = MockServer::start().await;
    mount_settings(&server, 1).await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserByScreenName$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(user_body("3178231", "DIYgod"))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserTweets$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline_body()))
        .expect(1)
        .mount(&server)
        .await;
    let client = client(&server);
    client.init_session().await.unwrap();

    let options = PageOptions::default();
    let (profile, pages) = tokio::try_join!(
        client.get_profile("DIYgod"),
        client.get_posts("diygod", &options)
    )
    .unwrap();
    assert_eq!(profile.account_id, "3178231");
    assert_eq!(pages[0].items.len(), 2);

    let timeline = &requests_to(&server, "UserTweets").await[0];
    assert_eq!(variables(timeline)["userId"], "3178231");
}

#[tokio::test]
async fn profile_is_refetched_once_a_lookup_settles() {
    let server = MockServer::start().await;
    mount_settings(&server, 1).await;
    Mock::given(method("GET"))
        .and(path_regex(r"/UserByScreenName$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body("3178231", "DIYgod")))
        .expect(2)
        .mount(&server)
        .await;
    let client = client(&server);

    client.get_profile("DIYgod").await.unwrap();
    client.get_profile("DIYgod").await.unwrap();
}
