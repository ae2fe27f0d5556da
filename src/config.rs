//! Configuration from explicit values with environment-variable fallback.
//!
//! The binary loads `.env` (if present) before anything here runs, so the
//! variables below may come from either the process environment or that file.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::info;

use crate::error::{Error, Result};

/// Connection settings for a Fairspace instance and its Keycloak realm.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub url: String,
    pub keycloak_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

/// Explicitly supplied settings. Empty or absent fields are read from the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct ApiOverrides {
    pub url: Option<String>,
    pub keycloak_url: Option<String>,
    pub realm: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ApiConfig {
    /// Resolve every setting from the overrides or the process environment.
    pub fn resolve(overrides: ApiOverrides) -> Result<Self> {
        Self::resolve_with(overrides, |name| env::var(name).ok())
    }

    /// Resolve using an arbitrary variable lookup.
    pub fn resolve_with<F>(overrides: ApiOverrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(ApiConfig {
            url: trim_url(use_or_read_value(overrides.url, "FAIRSPACE_URL", &lookup)?),
            keycloak_url: trim_url(use_or_read_value(
                overrides.keycloak_url,
                "KEYCLOAK_URL",
                &lookup,
            )?),
            realm: use_or_read_value(overrides.realm, "KEYCLOAK_REALM", &lookup)?,
            client_id: use_or_read_value(overrides.client_id, "KEYCLOAK_CLIENT_ID", &lookup)?,
            client_secret: use_or_read_value(
                overrides.client_secret,
                "KEYCLOAK_CLIENT_SECRET",
                &lookup,
            )?,
            username: use_or_read_value(overrides.username, "KEYCLOAK_USERNAME", &lookup)?,
            password: use_or_read_value(overrides.password, "KEYCLOAK_PASSWORD", &lookup)?,
        })
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/auth/realms/{}/protocol/openid-connect/token",
            self.keycloak_url, self.realm
        )
    }

    /// Root of the WebDAV tree, with a trailing slash.
    pub fn webdav_root(&self) -> String {
        format!("{}/api/webdav/", self.url)
    }
}

fn use_or_read_value<F>(value: Option<String>, variable: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        return Ok(v);
    }
    info!("Reading variable {variable} from environment.");
    lookup(variable)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("Please configure the {variable} environment variable.")))
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Sizes and knobs for the synthetic data set.
#[derive(Debug, Clone)]
pub struct TestDataConfig {
    pub subject_count: usize,
    pub event_count: usize,
    pub sample_count: usize,
    pub collection_count: usize,
    pub dirs_per_collection: usize,
    pub files_per_dir: usize,
    /// Code of the workspace that owns the generated collections.
    pub workspace_code: String,
    /// Upload zero-byte files instead of copies of `test_file`.
    pub empty_files: bool,
    pub test_file: PathBuf,
    /// Pause before every n-th directory; 0 disables pausing.
    pub pause_every_dirs: usize,
    pub pause_seconds: u64,
}

impl Default for TestDataConfig {
    fn default() -> Self {
        TestDataConfig {
            subject_count: 1000,
            event_count: 1500,
            sample_count: 3000,
            collection_count: 5,
            dirs_per_collection: 50,
            files_per_dir: 500,
            workspace_code: "test".to_string(),
            empty_files: true,
            test_file: PathBuf::from("coffee.jpg"),
            pause_every_dirs: 10,
            pause_seconds: 5,
        }
    }
}

impl TestDataConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = TestDataConfig::default();
        Ok(TestDataConfig {
            subject_count: parse_or(&lookup, "SUBJECT_COUNT", d.subject_count)?,
            event_count: parse_or(&lookup, "EVENT_COUNT", d.event_count)?,
            sample_count: parse_or(&lookup, "SAMPLE_COUNT", d.sample_count)?,
            collection_count: parse_or(&lookup, "COLLECTION_COUNT", d.collection_count)?,
            dirs_per_collection: parse_or(&lookup, "DIRS_PER_COLLECTION", d.dirs_per_collection)?,
            files_per_dir: parse_or(&lookup, "FILES_PER_DIR", d.files_per_dir)?,
            workspace_code: lookup("WORKSPACE_CODE")
                .filter(|v| !v.is_empty())
                .unwrap_or(d.workspace_code),
            empty_files: parse_or(&lookup, "EMPTY_FILES", d.empty_files)?,
            test_file: lookup("TEST_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(d.test_file),
            pause_every_dirs: parse_or(&lookup, "PAUSE_EVERY_DIRS", d.pause_every_dirs)?,
            pause_seconds: parse_or(&lookup, "PAUSE_SECONDS", d.pause_seconds)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, variable: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(variable) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| Error::Config(format!("invalid value '{raw}' for {variable}: {e}"))),
        _ => Ok(default),
    }
}
