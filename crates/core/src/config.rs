use std::env;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SanityError};

/// Store (Supabase) project URL. Required.
pub const STORE_URL_KEY: &str = "NEXT_PUBLIC_SUPABASE_URL";
/// Service-role key used for direct table reads. Required.
pub const SERVICE_KEY_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

pub const DEFAULT_ENV_FILE: &str = ".env.local";
pub const DEFAULT_APP_URL: &str = "https://visual-decompiler.vercel.app";
pub const DEFAULT_MEDIA_URL: &str = "https://images.unsplash.com/photo-1490481651871-ab68de25d43d?q=80&w=2070&auto=format&fit=crop";
pub const DEFAULT_STATUS_TABLE: &str = "ad_digests";
pub const DEFAULT_WORKER_TOKEN: &str = "OPEN";

// ── .env.local loading ────────────────────────────────────────

/// Parse `KEY=VALUE` lines.
///
/// Blank lines, `#` comments and lines without `=` are skipped. Key and value
/// are trimmed and one matching pair of surrounding quotes is removed from
/// the value.
pub fn parse_env_file(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), unquote(value.trim()).to_string()))
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Apply an env file to the process environment, overwriting existing values.
/// Returns the number of variables set.
pub fn load_env_file(path: &Path) -> Result<usize> {
    let contents = std::fs::read_to_string(path)?;
    let pairs = parse_env_file(&contents);
    for (key, value) in &pairs {
        env::set_var(key, value);
    }
    Ok(pairs.len())
}

/// Load `path` (usually `.env.local`) into the process environment.
///
/// A missing or unreadable file only produces a warning; returns `None` in
/// that case so the caller carries on with whatever the environment holds.
pub fn load_env_local(path: &Path) -> Option<usize> {
    match load_env_file(path) {
        Ok(count) => {
            tracing::debug!(path = %path.display(), count, "Loaded env file");
            Some(count)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not load env file");
            None
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_required(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| SanityError::MissingConfig(key.to_string()))
}

fn validate_url(key: &str, raw: &str) -> Result<String> {
    url::Url::parse(raw).map_err(|e| SanityError::InvalidConfig(format!("{key}={raw}: {e}")))?;
    Ok(raw.trim_end_matches('/').to_string())
}

// ── Runner config ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SanityConfig {
    /// Base URL of the status store's REST interface.
    pub store_url: String,
    pub service_key: String,
    /// Deployed application hosting `/api/ingest`, `/api/worker` and `/report/<id>`.
    pub app_url: String,
    /// Image URL submitted for ingestion (a cache-busting `t=` is appended per run).
    pub media_url: String,
    pub status_table: String,
    pub worker_token: String,
    pub worker_timeout: Duration,
    pub poll_attempts: u32,
    pub poll_interval: Duration,
    /// How long to wait for the worker report after a terminal status.
    pub terminal_grace: Duration,
}

impl SanityConfig {
    /// Build config from the two store credentials in the environment (load
    /// the env file first). Everything else takes the stock values.
    ///
    /// Fails if either credential is absent or empty.
    pub fn from_env() -> Result<Self> {
        let store_url = env_required(STORE_URL_KEY)?;
        let service_key = env_required(SERVICE_KEY_KEY)?;
        let store_url = validate_url(STORE_URL_KEY, &store_url)?;
        Ok(Self::new(&store_url, &service_key, DEFAULT_APP_URL))
    }

    /// Config pointing at explicit endpoints with the stock timings.
    pub fn new(store_url: &str, service_key: &str, app_url: &str) -> Self {
        Self {
            store_url: store_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            app_url: app_url.trim_end_matches('/').to_string(),
            media_url: DEFAULT_MEDIA_URL.to_string(),
            status_table: DEFAULT_STATUS_TABLE.to_string(),
            worker_token: DEFAULT_WORKER_TOKEN.to_string(),
            worker_timeout: Duration::from_secs(350),
            poll_attempts: 18,
            poll_interval: Duration::from_secs(10),
            terminal_grace: Duration::from_secs(2),
        }
    }

    pub fn ingest_url(&self) -> String {
        format!("{}/api/ingest", self.app_url)
    }

    pub fn worker_url(&self) -> String {
        format!("{}/api/worker", self.app_url)
    }

    pub fn report_url(&self, job_id: &crate::JobId) -> String {
        format!("{}/report/{}", self.app_url, job_id)
    }

    /// Redacted summary lines; credentials and the worker token never appear.
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            "Config loaded:".to_string(),
            format!("  store:   url={}, table={}", self.store_url, self.status_table),
            format!("  app:     url={}", self.app_url),
            format!(
                "  poll:    attempts={}, interval={}s",
                self.poll_attempts,
                self.poll_interval.as_secs()
            ),
            format!("  worker:  timeout={}s", self.worker_timeout.as_secs()),
        ]
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        for line in self.summary_lines() {
            tracing::info!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobId;

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let pairs = parse_env_file("# comment\n\nFOO='bar'\n   \n");
        assert_eq!(pairs, vec![("FOO".to_string(), "bar".to_string())]);
    }

    #[test]
    fn parse_strips_quotes_exactly_once() {
        let pairs = parse_env_file("A=\"'x'\"\nB='\"y\"'\nC=\"z\"");
        assert_eq!(pairs[0].1, "'x'");
        assert_eq!(pairs[1].1, "\"y\"");
        assert_eq!(pairs[2].1, "z");
    }

    #[test]
    fn parse_leaves_unbalanced_quotes() {
        let pairs = parse_env_file("A='open\nB=\"");
        assert_eq!(pairs[0].1, "'open");
        assert_eq!(pairs[1].1, "\"");
    }

    #[test]
    fn parse_splits_on_first_equals_and_trims() {
        let pairs = parse_env_file("  TOKEN = abc=def==  ");
        assert_eq!(pairs, vec![("TOKEN".to_string(), "abc=def==".to_string())]);
    }

    #[test]
    fn parse_ignores_lines_without_equals() {
        let pairs = parse_env_file("export\nJUST_A_WORD\nK=v");
        assert_eq!(pairs, vec![("K".to_string(), "v".to_string())]);
    }

    #[test]
    fn load_env_file_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.local");
        std::fs::write(&path, "# local\nSANITY_TEST_OVERWRITE='fresh'\n").unwrap();
        env::set_var("SANITY_TEST_OVERWRITE", "stale");

        let count = load_env_file(&path).unwrap();

        assert_eq!(count, 1);
        assert_eq!(env::var("SANITY_TEST_OVERWRITE").unwrap(), "fresh");
        env::remove_var("SANITY_TEST_OVERWRITE");
    }

    #[test]
    fn load_env_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_env_file(&dir.path().join("nope"));
        assert!(matches!(result, Err(SanityError::EnvFile(_))));
    }

    #[test]
    fn from_env_requires_both_credentials() {
        env::set_var(STORE_URL_KEY, "https://db.example");
        env::set_var(SERVICE_KEY_KEY, "");

        match SanityConfig::from_env() {
            Err(SanityError::MissingConfig(key)) => assert_eq!(key, SERVICE_KEY_KEY),
            other => panic!("expected MissingConfig, got: {other:?}"),
        }

        env::set_var(SERVICE_KEY_KEY, "service");
        let config = SanityConfig::from_env().unwrap();
        assert_eq!(config.store_url, "https://db.example");
        assert_eq!(config.poll_attempts, 18);

        env::remove_var(STORE_URL_KEY);
        env::remove_var(SERVICE_KEY_KEY);
    }

    #[test]
    fn derived_urls() {
        let config = SanityConfig::new("https://db.example/", "key", "https://app.example/");
        let id = JobId::new("abc-123");
        assert_eq!(config.ingest_url(), "https://app.example/api/ingest");
        assert_eq!(config.worker_url(), "https://app.example/api/worker");
        assert_eq!(config.report_url(&id), "https://app.example/report/abc-123");
        assert_eq!(config.store_url, "https://db.example");
    }

    #[test]
    fn summary_never_shows_secrets() {
        let mut config = SanityConfig::new("https://db.example", "super-secret", DEFAULT_APP_URL);
        config.worker_token = "worker-token-xyz".to_string();

        let lines = config.summary_lines();

        assert!(lines.iter().any(|l| l.contains("https://db.example")));
        assert!(lines.iter().all(|l| !l.contains("super-secret")));
        assert!(lines.iter().all(|l| !l.contains("worker-token-xyz")));
    }

    #[test]
    fn load_env_local_missing_file_continues() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_env_local(&dir.path().join(".env.local")), None);
    }

    #[test]
    fn load_env_local_reads_only_the_given_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "SANITY_TEST_SIBLING_ONLY=leaked\n").unwrap();
        let path = dir.path().join(".env.local");
        std::fs::write(&path, "SANITY_TEST_LOCAL_ONLY=local\n").unwrap();

        assert_eq!(load_env_local(&path), Some(1));
        assert_eq!(env::var("SANITY_TEST_LOCAL_ONLY").unwrap(), "local");
        assert!(env::var("SANITY_TEST_SIBLING_ONLY").is_err());
        env::remove_var("SANITY_TEST_LOCAL_ONLY");
    }
}
