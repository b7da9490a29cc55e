//! Loader for run configuration with defaults, YAML, and environment overlays.
//!
//! Precedence, lowest to highest:
//!
//! 1. built-in defaults (the `Default` impls below)
//! 2. YAML files / snippets, in the order they were attached
//! 3. `TWITTREND__SECTION__KEY` environment variables
//! 4. the credential variables `LINE_CHANNEL_ACCESS_TOKEN` and `LINE_GROUP_ID`
//!
//! String values may contain `${VAR}` placeholders; they are expanded after
//! merging. A credential that is empty or still holds an unresolved
//! placeholder is treated as absent.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "TWITTREND";

/// File picked up by the binary when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "twittrend.yaml";
/// Push-API bearer credential.
pub const LINE_TOKEN_ENV: &str = "LINE_CHANNEL_ACCESS_TOKEN";
/// Push destination (group, room or user id).
pub const LINE_GROUP_ENV: &str = "LINE_GROUP_ID";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrendConfig {
    pub source: SourceConfig,
    pub extract: ExtractConfig,
    pub message: MessageConfig,
    pub line: LineConfig,
    pub logging: LoggingConfig,
}

/// Where the trend page lives and how we ask for it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://twittrend.jp/".into(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .into(),
            accept_language: "ja,en-US;q=0.9,en;q=0.8".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractConfig {
    /// A list needs at least this many items to count as the trend list.
    pub min_items: usize,
    /// At most this many entries are kept.
    pub max_items: usize,
    /// Fall back to the heading-landmark search when no list is long enough.
    pub landmark_fallback: bool,
    pub region_marker: String,
    pub current_marker: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_items: 20,
            max_items: 50,
            landmark_fallback: false,
            region_marker: "日本のトレンド".into(),
            current_marker: "現在".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MessageConfig {
    pub header: String,
    /// Offset from UTC used for the timestamp line (540 = JST).
    pub utc_offset_minutes: i32,
    pub max_chars: usize,
    pub omitted_marker: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            header: "【日本のトレンド TOP50】".into(),
            utc_offset_minutes: 9 * 60,
            max_chars: 4800,
            omitted_marker: "\n…(以下省略)".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LineConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub channel_access_token: Option<String>,
    pub group_id: Option<String>,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.line.me/v2/bot/message/push".into(),
            timeout_secs: 10,
            channel_access_token: None,
            group_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    /// `text` or `json`
    pub format: String,
    /// Filter used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: "text".into(),
            filter: "info".into(),
        }
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

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn usable_credential(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.contains("${"))
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct TrendConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for TrendConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendConfigLoader {
    /// Start from built-in defaults; environment overlays are applied in [`load`](Self::load).
    ///
    /// ```
    /// use twittrend_config::TrendConfigLoader;
    ///
    /// let config = TrendConfigLoader::new()
    ///     .with_yaml_str("source:\n  timeout_secs: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.source.timeout_secs, 3);
    /// assert_eq!(config.extract.max_items, 50);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so env-only deployments need no file at all.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use twittrend_config::TrendConfigLoader;
    ///
    /// let cfg = TrendConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// extract:
    ///   min_items: 10
    ///   landmark_fallback: true
    /// message:
    ///   header: "Trends"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.extract.min_items, 10);
    /// assert!(cfg.extract.landmark_fallback);
    /// assert_eq!(cfg.message.header, "Trends");
    /// assert_eq!(cfg.message.max_chars, 4800);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    pub fn load(self) -> Result<TrendConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("line.channel_access_token", non_empty_env(LINE_TOKEN_ENV))?
            .set_override_option("line.group_id", non_empty_env(LINE_GROUP_ENV))?
            .build()?;

        // Convert to serde_json::Value first
        let mut v: Value = cfg.try_deserialize()?;
        // Recursively expand environment variables
        expand_env_in_value(&mut v);

        let mut typed: TrendConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        typed.line.channel_access_token = usable_credential(typed.line.channel_access_token);
        typed.line.group_id = usable_credential(typed.line.group_id);

        typed.validate()?;
        Ok(typed)
    }
}

impl TrendConfig {
    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extract.min_items == 0 {
            return Err(ConfigError::Message(
                "extract.min_items must be at least 1".into(),
            ));
        }
        if self.extract.max_items == 0 {
            return Err(ConfigError::Message(
                "extract.max_items must be at least 1".into(),
            ));
        }
        if self.message.max_chars == 0 {
            return Err(ConfigError::Message(
                "message.max_chars must be at least 1".into(),
            ));
        }
        if self.message.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::Message(format!(
                "message.utc_offset_minutes out of range: {}",
                self.message.utc_offset_minutes
            )));
        }
        if self.source.timeout_secs == 0 || self.line.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "timeouts must be at least one second".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Osaka")), ("PREF", Some("Osaka-fu"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${PREF}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Osaka", { "loc": "Osaka-Osaka-fu" }, 42, true, null])
            );
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${TWITTREND_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${TWITTREND_DOES_NOT_EXIST}"));
    }

    #[test]
    fn unresolved_or_blank_credentials_are_absent() {
        assert_eq!(usable_credential(Some("  ".into())), None);
        assert_eq!(usable_credential(Some("${LINE_GROUP_ID}".into())), None);
        assert_eq!(
            usable_credential(Some(" Cabc ".into())),
            Some("Cabc".to_string())
        );
        assert_eq!(usable_credential(None), None);
    }

    #[test]
    fn validate_rejects_zero_threshold() {
        let mut cfg = TrendConfig::default();
        cfg.extract.min_items = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn defaults_match_source_page_expectations() {
        let cfg = TrendConfig::default();
        assert_eq!(cfg.extract.min_items, 20);
        assert_eq!(cfg.extract.max_items, 50);
        assert_eq!(cfg.message.max_chars, 4800);
        assert_eq!(cfg.message.utc_offset_minutes, 540);
        assert_eq!(cfg.source.timeout_secs, 10);
        assert!(cfg.validate().is_ok());
    }
}
