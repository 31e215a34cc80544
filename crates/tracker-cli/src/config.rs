// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracker_api::{EnvToken, FileToken, StaticToken, TokenSource};
use tracker_app::EntityKind;

pub const APP_NAME: &str = "tracker";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_SEARCH_DEBOUNCE: &str = "300ms";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_TOKEN_ENV: &str = "TRACKER_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: Server::default(),
            auth: Auth::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

/// At most one source may be set. With none, the token is read from
/// `TRACKER_TOKEN` when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Auth {
    pub token: Option<String>,
    pub token_file: Option<String>,
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub start_tab: Option<String>,
    pub search_debounce: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            start_tab: Some(EntityKind::Jobs.as_str().to_owned()),
            search_debounce: Some(DEFAULT_SEARCH_DEBOUNCE.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("TRACKER_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set TRACKER_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [server], [auth], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let base_url = self.base_url();
        if base_url.is_empty() {
            bail!("server.base_url in {} must not be empty", path.display());
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!(
                "server.base_url in {} must start with http:// or https://, got {base_url:?}",
                path.display()
            );
        }

        if let Some(timeout) = &self.server.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "server.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(debounce) = &self.ui.search_debounce {
            parse_duration(debounce).with_context(|| {
                format!("ui.search_debounce in {} is invalid", path.display())
            })?;
        }

        if let Some(tab) = &self.ui.start_tab
            && EntityKind::parse(tab).is_none()
        {
            bail!(
                "ui.start_tab in {} must be \"jobs\" or \"skills\", got {tab:?}",
                path.display()
            );
        }

        let sources = [
            self.auth.token.is_some(),
            self.auth.token_file.is_some(),
            self.auth.token_env.is_some(),
        ];
        if sources.iter().filter(|set| **set).count() > 1 {
            bail!(
                "[auth] in {} sets more than one of token, token_file, token_env; keep one",
                path.display()
            );
        }

        EnvFilter::try_new(self.log_level()).map_err(|error| {
            anyhow!(
                "log.level in {} is not a valid filter ({error})",
                path.display()
            )
        })?;

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.server
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim()
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.server.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn search_debounce(&self) -> Result<Duration> {
        parse_duration(
            self.ui
                .search_debounce
                .as_deref()
                .unwrap_or(DEFAULT_SEARCH_DEBOUNCE),
        )
    }

    pub fn start_tab(&self) -> EntityKind {
        self.ui
            .start_tab
            .as_deref()
            .and_then(EntityKind::parse)
            .unwrap_or(EntityKind::Jobs)
    }

    pub fn token_source(&self) -> Arc<dyn TokenSource> {
        if let Some(token) = &self.auth.token {
            return Arc::new(StaticToken::new(token.clone()));
        }
        if let Some(path) = &self.auth.token_file {
            return Arc::new(FileToken::new(path));
        }
        let var = self.auth.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV);
        Arc::new(EnvToken::new(var))
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let data_root = dirs::data_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].file in the config")
        })?;
        Ok(data_root.join(APP_NAME).join("tracker.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# tracker config\n# Place this file at: {}\n\nversion = 1\n\n[server]\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[auth]\n# Set at most one. Without any, {} is read when present.\n# token = \"...\"\n# token_file = \"/absolute/path/to/token\"\n# token_env = \"{}\"\n\n[ui]\nstart_tab = \"jobs\"\nsearch_debounce = \"{}\"\n\n[log]\nlevel = \"{}\"\n# Optional. Default is platform data dir (for example ~/.local/share/tracker/tracker.log)\n# file = \"/absolute/path/to/tracker.log\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_TOKEN_ENV,
            DEFAULT_TOKEN_ENV,
            DEFAULT_SEARCH_DEBOUNCE,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins.saturating_mul(60)));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 300ms or 10s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;
    use tracker_api::TokenSource;
    use tracker_app::EntityKind;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.base_url(), "http://localhost:5000");
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        assert_eq!(config.search_debounce()?, Duration::from_millis(300));
        assert_eq!(config.start_tab(), EntityKind::Jobs);
        assert_eq!(config.log_level(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[server]\nbase_url = \"http://localhost:5000\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[server], [auth], [ui], and [log]"));
        Ok(())
    }

    #[test]
    fn full_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[server]\nbase_url = \"https://tracker.example/api/\"\ntimeout = \"2s\"\n[auth]\ntoken_env = \"MY_TOKEN\"\n[ui]\nstart_tab = \"skills\"\nsearch_debounce = \"0ms\"\n[log]\nlevel = \"debug\"\nfile = \"/tmp/tracker-test.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "https://tracker.example/api");
        assert_eq!(config.timeout()?, Duration::from_secs(2));
        assert_eq!(config.search_debounce()?, Duration::ZERO);
        assert_eq!(config.start_tab(), EntityKind::Skills);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_file()?, PathBuf::from("/tmp/tracker-test.log"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn base_url_must_be_http() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[server]\nbase_url = \"ftp://nope\"\n")?;
        let error = Config::load(&path).expect_err("non-http base url should fail");
        assert!(error.to_string().contains("must start with http://"));

        let (_temp, path) = write_config("version = 1\n[server]\nbase_url = \"  \"\n")?;
        let error = Config::load(&path).expect_err("blank base url should fail");
        assert!(error.to_string().contains("must not be empty"));
        Ok(())
    }

    #[test]
    fn zero_timeout_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[server]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn unknown_start_tab_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\nstart_tab = \"dashboard\"\n")?;
        let error = Config::load(&path).expect_err("unknown tab should fail");
        assert!(error.to_string().contains("ui.start_tab"));
        Ok(())
    }

    #[test]
    fn only_one_auth_source_is_allowed() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[auth]\ntoken = \"abc\"\ntoken_env = \"OTHER\"\n")?;
        let error = Config::load(&path).expect_err("two auth sources should fail");
        assert!(error.to_string().contains("more than one"));
        Ok(())
    }

    #[test]
    fn token_source_prefers_configured_token() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[auth]\ntoken = \"abc\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.token_source().token()?, Some("abc".to_owned()));
        Ok(())
    }

    #[test]
    fn token_source_reads_token_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let token_path = temp.path().join("token");
        std::fs::write(&token_path, "from-file\n")?;
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            format!(
                "version = 1\n[auth]\ntoken_file = {:?}\n",
                token_path.display().to_string()
            ),
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.token_source().token()?, Some("from-file".to_owned()));
        Ok(())
    }

    #[test]
    fn token_source_defaults_to_tracker_token_env() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("TRACKER_TOKEN", "from-env");
        }
        let token = Config::default().token_source().token();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("TRACKER_TOKEN");
        }
        assert_eq!(token?, Some("from-env".to_owned()));
        assert_eq!(Config::default().token_source().token()?, None);
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"tracker=loud\"\n")?;
        let error = Config::load(&path).expect_err("bad filter should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("TRACKER_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("TRACKER_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("300ms")?, Duration::from_millis(300));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        Ok(())
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let error = parse_duration("soon").expect_err("invalid duration should fail");
        assert!(error.to_string().contains("invalid duration"));
    }

    #[test]
    fn example_config_round_trips_through_load() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, Config::example_config(&path))?;
        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "http://localhost:5000");
        assert_eq!(config.start_tab(), EntityKind::Jobs);
        Ok(())
    }
}
