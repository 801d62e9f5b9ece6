//! Loader for feedline configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are attached, with `FEEDLINE_`-prefixed
//! environment variables applied on top (`FEEDLINE_TWITTER__AUTH_TOKEN` maps to
//! `twitter.auth_token`). String values may reference `${VAR}` placeholders, which are
//! expanded after merging. Credentials have no defaults and must be injected.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct FeedlineConfig {
    pub version: Option<String>,
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Session credentials and endpoints for the X timeline client.
#[derive(Debug, Deserialize)]
pub struct TwitterConfig {
    /// `auth_token` cookie of an already logged-in session.
    pub auth_token: String,
    /// `ct0` cookie, echoed back as the CSRF header.
    pub csrf_token: String,
    /// Bearer token of the web client.
    pub bearer_token: String,
    #[serde(default = "default_twitter_base_url")]
    pub base_url: String,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub page_size: Option<u32>,
    #[serde(default = "default_timeout_secs", deserialize_with = "scalar::required")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub query_ids: QueryIds,
}

/// GraphQL persisted-query ids. They rotate upstream, so they are overridable.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryIds {
    #[serde(default = "default_user_by_screen_name")]
    pub user_by_screen_name: String,
    #[serde(default = "default_user_by_rest_id")]
    pub user_by_rest_id: String,
    #[serde(default = "default_user_tweets")]
    pub user_tweets: String,
    #[serde(default = "default_user_tweets_and_replies")]
    pub user_tweets_and_replies: String,
}

impl Default for QueryIds {
    fn default() -> Self {
        Self {
            user_by_screen_name: default_user_by_screen_name(),
            user_by_rest_id: default_user_by_rest_id(),
            user_tweets: default_user_tweets(),
            user_tweets_and_replies: default_user_tweets_and_replies(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_platform_name")]
    pub platform_name: String,
    #[serde(default = "default_profile_base_url")]
    pub profile_base_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            platform_name: default_platform_name(),
            profile_base_url: default_profile_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default = "default_true", deserialize_with = "scalar::required")]
    pub stderr: bool,
    #[serde(default, deserialize_with = "scalar::required")]
    pub file: bool,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            dir: None,
            stderr: true,
            file: false,
            filter: default_log_filter(),
        }
    }
}

/// Numbers and booleans arrive as strings from the environment overlay and as native
/// values from YAML; both are accepted. Strings are never coerced the other way, so
/// digit-only credentials stay exact.
mod scalar {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use std::fmt::Display;
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Native(T),
        Text(String),
    }

    impl<T> Raw<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        fn into_value<E: Error>(self) -> Result<T, E> {
            match self {
                Raw::Native(v) => Ok(v),
                Raw::Text(s) => s
                    .trim()
                    .parse()
                    .map_err(|e| E::custom(format!("invalid value {s:?}: {e}"))),
            }
        }
    }

    pub fn required<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
        T::Err: Display,
    {
        Raw::<T>::deserialize(d)?.into_value()
    }

    pub fn optional<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
        T::Err: Display,
    {
        Option::<Raw<T>>::deserialize(d)?
            .map(|raw| raw.into_value())
            .transpose()
    }
}

fn default_twitter_base_url() -> String {
    "https://x.com/i/api/".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_user_by_screen_name() -> String {
    "G3KGOASz96M-Qu0nwmGXNg".into()
}
fn default_user_by_rest_id() -> String {
    "tD8zKvQzwY3kdx5yz6YmOw".into()
}
fn default_user_tweets() -> String {
    "E3opETHurmVJflFsUBVuUQ".into()
}
fn default_user_tweets_and_replies() -> String {
    "bt4TKuFz4T7Ckk-VvQVSow".into()
}
fn default_platform_name() -> String {
    "Twitter".into()
}
fn default_profile_base_url() -> String {
    "https://x.com".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_log_filter() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}

impl FeedlineConfig {
    /// Reject empty credentials and placeholders that never resolved.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let credentials = [
            ("twitter.auth_token", &self.twitter.auth_token),
            ("twitter.csrf_token", &self.twitter.csrf_token),
            ("twitter.bearer_token", &self.twitter.bearer_token),
        ];
        for (key, value) in credentials {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{key} must not be empty")));
            }
            if value.contains("${") {
                return Err(ConfigError::Message(format!(
                    "{key} references an unset environment variable"
                )));
            }
        }
        if self.twitter.page_size == Some(0) {
            return Err(ConfigError::Message(
                "twitter.page_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct FeedlineConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FeedlineConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedlineConfigLoader {
    /// Empty loader. The `FEEDLINE_` environment overlay is always applied last by
    /// [`load`](Self::load), so it wins over files and inline YAML.
    ///
    /// ```
    /// use feedline_config::FeedlineConfigLoader;
    ///
    /// let config = FeedlineConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// version: "1"
    /// twitter:
    ///   auth_token: "a"
    ///   csrf_token: "c"
    ///   bearer_token: "b"
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.feed.platform_name, "Twitter");
    /// assert_eq!(config.twitter.base_url, "https://x.com/i/api/");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped so headless
    /// deployments can rely purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// `${VAR}` placeholders are expanded before the typed structs are materialised, and
    /// the result is validated.
    ///
    /// ```
    /// use feedline_config::FeedlineConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOCTEST_X_AUTH", "injected-from-env"); }
    ///
    /// let config = FeedlineConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// twitter:
    ///   auth_token: "${DOCTEST_X_AUTH}"
    ///   csrf_token: "ct0"
    ///   bearer_token: "bearer"
    ///   page_size: 40
    /// logging:
    ///   format: json
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.twitter.auth_token, "injected-from-env");
    /// assert_eq!(config.twitter.page_size, Some(40));
    /// assert_eq!(config.logging.format, "json");
    /// assert!(config.logging.stderr);
    ///
    /// unsafe { std::env::remove_var("DOCTEST_X_AUTH"); }
    /// ```
    pub fn load(self) -> Result<FeedlineConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("FEEDLINE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: FeedlineConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}
