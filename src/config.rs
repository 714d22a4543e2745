use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    models::ContentType,
};

/// Printed when the credentials cannot be found.
pub const CONFIG_HELP: &str = r#"The config file should be a JSON object holding your Redux
username and password, e.g.

    {
        "username": "myusername",
        "password": "mypassword",
        "default_audio_type": "mp3",
        "default_video_type": "mp4-hi"
    }

By default it is read from ~/.get_redux.cfg. Any field can also be set
through the environment as REDUX_<FIELD>, e.g. REDUX_PASSWORD."#;

/// Application configuration, loaded from the JSON config file with
/// `REDUX_*` environment variables (and `.env`) layered on top.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Media key used for radio when `--media` is not given.
    #[serde(default)]
    pub default_audio_type: Option<String>,

    /// Media key used for TV when `--media` is not given.
    #[serde(default)]
    pub default_video_type: Option<String>,

    /// Base URL of the Redux API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Directory downloaded files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Number of programmes processed at once. Output order is unaffected.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-request transport timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "http://devapi.bbcredux.com".to_string()
}
fn default_output_dir() -> String {
    ".".to_string()
}
fn default_max_concurrent() -> usize {
    1
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            default_audio_type: None,
            default_video_type: None,
            api_base: default_api_base(),
            output_dir: default_output_dir(),
            max_concurrent: default_max_concurrent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// `REDUX_*` environment variables; each one that is set replaces the file value.
#[derive(Debug, Default, Deserialize)]
pub struct EnvOverrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub default_audio_type: Option<String>,
    pub default_video_type: Option<String>,
    pub api_base: Option<String>,
    pub output_dir: Option<String>,
    pub max_concurrent: Option<usize>,
    pub timeout_secs: Option<u64>,
}

/// `~/.get_redux.cfg`, or a relative `.get_redux.cfg` when no home directory is known.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".get_redux.cfg"))
        .unwrap_or_else(|| PathBuf::from(".get_redux.cfg"))
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        // .env is optional
        let _ = dotenvy::dotenv();

        let file = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
            Some(raw)
        } else {
            tracing::debug!("No config file at {}, using environment only", path.display());
            None
        };

        let overrides = envy::prefixed("REDUX_")
            .from_env::<EnvOverrides>()
            .map_err(|e| AppError::Config(format!("bad REDUX_* environment: {e}")))?;

        Self::from_sources(file.as_deref(), overrides)
    }

    /// Merge config file contents (if any) with environment overrides and validate.
    pub fn from_sources(file: Option<&str>, env: EnvOverrides) -> Result<Self> {
        let mut config = match file {
            Some(raw) => serde_json::from_str::<AppConfig>(raw)
                .map_err(|e| AppError::Config(format!("config file is not valid JSON: {e}")))?,
            None => AppConfig::default(),
        };

        if let Some(v) = env.username {
            config.username = v;
        }
        if let Some(v) = env.password {
            config.password = v;
        }
        if env.default_audio_type.is_some() {
            config.default_audio_type = env.default_audio_type;
        }
        if env.default_video_type.is_some() {
            config.default_video_type = env.default_video_type;
        }
        if let Some(v) = env.api_base {
            config.api_base = v;
        }
        if let Some(v) = env.output_dir {
            config.output_dir = v;
        }
        if let Some(v) = env.max_concurrent {
            config.max_concurrent = v;
        }
        if let Some(v) = env.timeout_secs {
            config.timeout_secs = v;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<()> {
        if self.username.is_empty() {
            return Err(AppError::Config("missing username".into()));
        }
        if self.password.is_empty() {
            return Err(AppError::Config("missing password".into()));
        }
        self.api_base = self.api_base.trim_end_matches('/').to_string();
        self.max_concurrent = self.max_concurrent.max(1);
        Ok(())
    }

    /// Media key to download when the user did not pick one.
    pub fn media_key_for(&self, content_type: ContentType) -> String {
        match content_type {
            ContentType::Radio => self
                .default_audio_type
                .clone()
                .unwrap_or_else(|| "mp3".to_string()),
            ContentType::Tv => self
                .default_video_type
                .clone()
                .unwrap_or_else(|| "mp4-hi".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = r#"{
        "username": "alice",
        "password": "secret",
        "default_audio_type": "mp3-hi"
    }"#;

    fn env(vars: &[(&str, &str)]) -> EnvOverrides {
        envy::prefixed("REDUX_")
            .from_iter(
                vars.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<Vec<_>>(),
            )
            .unwrap()
    }

    #[test]
    fn file_values_and_defaults() {
        let config = AppConfig::from_sources(Some(FILE), EnvOverrides::default()).unwrap();
        assert_eq!(config.username, "alice");
        assert_eq!(config.api_base, "http://devapi.bbcredux.com");
        assert_eq!(config.output_dir, ".");
        assert_eq!(config.max_concurrent, 1);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn environment_overrides_file() {
        let config = AppConfig::from_sources(
            Some(FILE),
            env(&[
                ("REDUX_PASSWORD", "hunter2"),
                ("REDUX_API_BASE", "http://localhost:8080/"),
                ("REDUX_MAX_CONCURRENT", "4"),
            ]),
        )
        .unwrap();
        assert_eq!(config.username, "alice");
        assert_eq!(config.password, "hunter2");
        assert_eq!(config.api_base, "http://localhost:8080");
        assert_eq!(config.max_concurrent, 4);
    }

    #[test]
    fn environment_alone_is_enough() {
        let config = AppConfig::from_sources(
            None,
            env(&[("REDUX_USERNAME", "bob"), ("REDUX_PASSWORD", "pw")]),
        )
        .unwrap();
        assert_eq!(config.username, "bob");
    }

    #[test]
    fn missing_credentials_fail() {
        let err = AppConfig::from_sources(Some(r#"{"username": "alice"}"#), EnvOverrides::default())
            .unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("password")));

        let err = AppConfig::from_sources(None, EnvOverrides::default()).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("username")));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let err = AppConfig::from_sources(Some("{ not json"), EnvOverrides::default()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let config =
            AppConfig::from_sources(Some(FILE), env(&[("REDUX_MAX_CONCURRENT", "0")])).unwrap();
        assert_eq!(config.max_concurrent, 1);
    }

    #[test]
    fn media_key_defaults_per_content_type() {
        let config = AppConfig::from_sources(Some(FILE), EnvOverrides::default()).unwrap();
        assert_eq!(config.media_key_for(ContentType::Radio), "mp3-hi");
        assert_eq!(config.media_key_for(ContentType::Tv), "mp4-hi");

        let bare = AppConfig::from_sources(
            Some(r#"{"username": "a", "password": "b"}"#),
            EnvOverrides::default(),
        )
        .unwrap();
        assert_eq!(bare.media_key_for(ContentType::Radio), "mp3");
    }

    #[test]
    fn load_reads_the_given_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redux.cfg");
        std::fs::write(&path, FILE).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.default_audio_type.as_deref(), Some("mp3-hi"));
    }
}
