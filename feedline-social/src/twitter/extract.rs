//! Decoding of raw GraphQL payloads into typed feed pages and profiles.
//!
//! Everything the feed core sees has passed through here: missing results, missing ids
//! or handles are errors rather than silently empty fields.
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use feedline_feed::{CursorType, PageMarker, RawItem, RawPage, UserProfile};

use crate::twitter::types::{
    Entry, EntryContent, Instruction, ItemContent, Media, MediaKind, MediaRef, Post, Tweet,
    TweetResults, UserResponse, UserResult,
};

const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

fn user_result(resp: UserResponse) -> Result<UserResult> {
    let errors = resp
        .errors
        .as_deref()
        .and_then(|e| e.first())
        .map(|e| e.message.clone());
    let result = resp
        .data
        .and_then(|d| d.user)
        .and_then(|u| u.result)
        .ok_or_else(|| match &errors {
            Some(msg) => anyhow!("user not found: {msg}"),
            None => anyhow!("response has no data.user.result"),
        })?;
    if result.typename.as_deref() == Some("UserUnavailable") {
        return Err(anyhow!("user is unavailable"));
    }
    Ok(result)
}

/// Convert a `UserByScreenName` / `UserByRestId` response into a profile.
pub fn profile_from_response(resp: UserResponse) -> Result<UserProfile> {
    let user = user_result(resp)?;
    let legacy = user.legacy.unwrap_or_default();
    let core = user.core.unwrap_or_default();

    let account_id = user.rest_id.context("user result has no rest_id")?;
    let handle = core
        .screen_name
        .or(legacy.screen_name)
        .context("user result has no screen_name")?;

    Ok(UserProfile {
        account_id,
        display_name: core.name.or(legacy.name),
        handle,
        bio: legacy.description,
        profile_image_url: user
            .avatar
            .and_then(|a| a.image_url)
            .or(legacy.profile_image_url_https)
            .or(legacy.profile_image_url),
    })
}

/// Convert a `UserTweets` / `UserTweetsAndReplies` response into pages, one per
/// `TimelineAddEntries`/`TimelinePinEntry` instruction that carries entries.
///
/// `TimelineReplaceEntry` cursors update the markers already collected for this
/// response instead of opening a page of their own, so Top and Bottom cursors
/// delivered as two replacements still end up side by side on the first page that
/// carries markers.
pub fn pages_from_response(resp: UserResponse) -> Result<Vec<RawPage>> {
    let user = user_result(resp)?;
    let timeline = user
        .timeline_v2
        .or(user.timeline)
        .and_then(|t| t.timeline)
        .context("user result has no timeline")?;

    let mut pages = Vec::new();
    for instruction in timeline.instructions {
        let entries = match instruction {
            Instruction::TimelineAddEntries { entries } => entries,
            Instruction::TimelinePinEntry { entry } => vec![entry],
            Instruction::TimelineReplaceEntry { entry } => match entry.content {
                EntryContent::TimelineTimelineCursor { value, cursor_type } => {
                    if let Some(marker) = marker(&cursor_type, value) {
                        replace_marker(&mut pages, marker);
                    }
                    continue;
                }
                content => vec![Entry {
                    entry_id: entry.entry_id,
                    content,
                }],
            },
            Instruction::Other => continue,
        };

        let mut page = RawPage::default();
        for entry in entries {
            push_entry(&mut page, entry);
        }
        if !page.items.is_empty() || !page.markers.is_empty() {
            pages.push(page);
        }
    }
    Ok(pages)
}

fn push_entry(page: &mut RawPage, entry: Entry) {
    match entry.content {
        EntryContent::TimelineTimelineItem { item_content } => {
            push_item_content(page, item_content);
        }
        EntryContent::TimelineTimelineModule { items } => {
            for module_item in items {
                push_item_content(page, module_item.item.item_content);
            }
        }
        EntryContent::TimelineTimelineCursor { value, cursor_type } => {
            page.markers.extend(marker(&cursor_type, value));
        }
        EntryContent::Other => {
            tracing::trace!(entry_id = %entry.entry_id, "x.extract.skipped_entry");
        }
    }
}

/// Overwrite the marker of the same kind wherever it sits; otherwise attach the new one
/// to the first page with markers, the last page, or a fresh page, in that order.
fn replace_marker(pages: &mut Vec<RawPage>, marker: PageMarker) {
    if let Some(slot) = pages
        .iter_mut()
        .flat_map(|p| p.markers.iter_mut())
        .find(|m| m.cursor_type == marker.cursor_type)
    {
        slot.value = marker.value;
        return;
    }
    let target = pages
        .iter()
        .position(|p| !p.markers.is_empty())
        .or(pages.len().checked_sub(1));
    match target {
        Some(i) => pages[i].markers.push(marker),
        None => pages.push(RawPage {
            items: Vec::new(),
            markers: vec![marker],
        }),
    }
}

fn push_item_content(page: &mut RawPage, content: ItemContent) {
    match content {
        ItemContent::TimelineTweet { tweet_results } => {
            if let Some(item) = raw_item(&tweet_results) {
                page.items.push(item);
            }
        }
        ItemContent::TimelineTimelineCursor { value, cursor_type } => {
            page.markers.extend(marker(&cursor_type, value));
        }
        ItemContent::Other => {}
    }
}

fn marker(cursor_type: &str, value: String) -> Option<PageMarker> {
    let cursor_type = match cursor_type {
        "Top" => CursorType::Top,
        "Bottom" => CursorType::Bottom,
        other => {
            tracing::trace!(cursor_type = %other, "x.extract.skipped_cursor");
            return None;
        }
    };
    Some(PageMarker { cursor_type, value })
}

fn raw_item(results: &TweetResults) -> Option<RawItem> {
    let tweet = results.result.as_ref()?.tweet()?;
    let is_repost = tweet
        .legacy
        .as_ref()
        .is_some_and(|l| l.retweeted_status_result.is_some());
    let post = post_from_tweet(tweet);
    let payload = match serde_json::to_value(&post) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(id = %tweet.rest_id, error = %e, "x.extract.payload_error");
            return None;
        }
    };
    Some(RawItem {
        id: tweet.rest_id.clone(),
        is_repost,
        payload,
    })
}

fn author(tweet: &Tweet) -> (Option<String>, Option<String>) {
    let Some(user) = tweet
        .core
        .as_ref()
        .and_then(|c| c.user_results.as_ref())
        .and_then(|u| u.result.as_ref())
    else {
        return (None, None);
    };
    let core = user.core.as_ref();
    let legacy = user.legacy.as_ref();
    let handle = core
        .and_then(|c| c.screen_name.clone())
        .or_else(|| legacy.and_then(|l| l.screen_name.clone()));
    let name = core
        .and_then(|c| c.name.clone())
        .or_else(|| legacy.and_then(|l| l.name.clone()));
    (handle, name)
}

/// Normalize one tweet, including the reposted and quoted tweets it embeds.
pub fn post_from_tweet(tweet: &Tweet) -> Post {
    let legacy = tweet.legacy.clone().unwrap_or_default();
    let (author_handle, author_name) = author(tweet);

    let raw_text = tweet
        .note_tweet
        .as_ref()
        .and_then(|n| n.note_tweet_results.as_ref())
        .and_then(|r| r.result.as_ref())
        .and_then(|r| r.text.clone())
        .unwrap_or(legacy.full_text);

    let url_entities = legacy.entities.map(|e| e.urls).unwrap_or_default();
    let media_entities = legacy
        .extended_entities
        .map(|e| e.media)
        .unwrap_or_default();

    let mut text = raw_text;
    let mut urls = Vec::new();
    for entity in &url_entities {
        if let (Some(short), Some(expanded)) = (&entity.url, &entity.expanded_url) {
            text = text.replace(short.as_str(), expanded);
            urls.push(expanded.clone());
        }
    }
    for m in &media_entities {
        if let Some(short) = &m.url {
            text = text.replace(short.as_str(), "");
        }
    }

    Post {
        id: tweet.rest_id.clone(),
        author_handle,
        author_name,
        text: text.trim().to_string(),
        created_at: legacy.created_at.as_deref().and_then(parse_created_at),
        reply_to_handle: legacy
            .in_reply_to_status_id_str
            .as_ref()
            .and(legacy.in_reply_to_screen_name),
        urls,
        media: media_entities.iter().filter_map(to_media_ref).collect(),
        reposted: nested_post(legacy.retweeted_status_result.as_deref()),
        quoted: nested_post(tweet.quoted_status_result.as_deref()),
    }
}

fn nested_post(results: Option<&TweetResults>) -> Option<Box<Post>> {
    let tweet = results?.result.as_ref()?.tweet()?;
    Some(Box::new(post_from_tweet(tweet)))
}

fn to_media_ref(m: &Media) -> Option<MediaRef> {
    let kind = match m.kind.as_deref() {
        Some("photo") => MediaKind::Photo,
        Some("video") => MediaKind::Video,
        Some("animated_gif") => MediaKind::Gif,
        _ => MediaKind::Unknown,
    };
    Some(MediaRef {
        kind,
        url: m.media_url_https.clone()?,
        link: match kind {
            MediaKind::Photo => None,
            _ => m.expanded_url.clone(),
        },
    })
}

/// Parse X's `created_at`, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, CREATED_AT_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
