use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------
// Wire models: UserByScreenName / UserByRestId / UserTweets / UserTweetsAndReplies
// ------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    #[serde(default)]
    pub data: Option<UserData>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub user: Option<UserResults>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserResults {
    #[serde(default)]
    pub result: Option<UserResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserResult {
    #[serde(rename = "__typename", default)]
    pub typename: Option<String>,
    #[serde(default)]
    pub rest_id: Option<String>,
    #[serde(default)]
    pub legacy: Option<UserLegacy>,
    /// Newer payloads move name/handle here.
    #[serde(default)]
    pub core: Option<UserCore>,
    #[serde(default)]
    pub avatar: Option<UserAvatar>,
    #[serde(default)]
    pub timeline_v2: Option<TimelineWrapper>,
    #[serde(default)]
    pub timeline: Option<TimelineWrapper>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLegacy {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub screen_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub profile_image_url_https: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserCore {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub screen_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserAvatar {
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineWrapper {
    #[serde(default)]
    pub timeline: Option<Timeline>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Instruction {
    TimelineAddEntries {
        #[serde(default)]
        entries: Vec<Entry>,
    },
    TimelinePinEntry {
        entry: Entry,
    },
    TimelineReplaceEntry {
        entry: Entry,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    #[serde(rename = "entryId")]
    pub entry_id: String,
    pub content: EntryContent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "entryType")]
pub enum EntryContent {
    TimelineTimelineItem {
        #[serde(rename = "itemContent")]
        item_content: ItemContent,
    },
    TimelineTimelineModule {
        #[serde(default)]
        items: Vec<ModuleItem>,
    },
    TimelineTimelineCursor {
        value: String,
        #[serde(rename = "cursorType")]
        cursor_type: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleItem {
    #[serde(rename = "entryId")]
    pub entry_id: String,
    pub item: ModuleItemBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleItemBody {
    #[serde(rename = "itemContent")]
    pub item_content: ItemContent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "itemType")]
pub enum ItemContent {
    TimelineTweet {
        #[serde(default)]
        tweet_results: TweetResults,
    },
    TimelineTimelineCursor {
        value: String,
        #[serde(rename = "cursorType")]
        cursor_type: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetResults {
    #[serde(default)]
    pub result: Option<TweetResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "__typename")]
pub enum TweetResult {
    Tweet(Tweet),
    TweetWithVisibilityResults { tweet: Tweet },
    #[serde(other)]
    Unavailable,
}

impl TweetResult {
    pub fn tweet(&self) -> Option<&Tweet> {
        match self {
            TweetResult::Tweet(t) | TweetResult::TweetWithVisibilityResults { tweet: t } => {
                Some(t)
            }
            TweetResult::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    pub rest_id: String,
    #[serde(default)]
    pub core: Option<TweetCore>,
    #[serde(default)]
    pub legacy: Option<TweetLegacy>,
    #[serde(default)]
    pub note_tweet: Option<NoteTweet>,
    #[serde(default)]
    pub quoted_status_result: Option<Box<TweetResults>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetCore {
    #[serde(default)]
    pub user_results: Option<UserResults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetLegacy {
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub in_reply_to_status_id_str: Option<String>,
    #[serde(default)]
    pub in_reply_to_screen_name: Option<String>,
    #[serde(default)]
    pub retweeted_status_result: Option<Box<TweetResults>>,
    #[serde(default)]
    pub entities: Option<Entities>,
    #[serde(default)]
    pub extended_entities: Option<ExtendedEntities>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteTweet {
    #[serde(default)]
    pub note_tweet_results: Option<NoteTweetResults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteTweetResults {
    #[serde(default)]
    pub result: Option<NoteTweetText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteTweetText {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrlEntity {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub expanded_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// t.co link embedded in the text.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub media_url_https: Option<String>,
    #[serde(default)]
    pub expanded_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountSettings {
    #[serde(default)]
    pub screen_name: Option<String>,
}

// ------------------------------------------------------------------
// Normalized post carried in `RawItem::payload`
// ------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_handle: Option<String>,
    pub author_name: Option<String>,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    pub reply_to_handle: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub reposted: Option<Box<Post>>,
    #[serde(default)]
    pub quoted: Option<Box<Post>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Gif,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    /// Image (or preview image) URL.
    pub url: String,
    /// Page to open for playable media.
    pub link: Option<String>,
}
