use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::readings::ServiceOptions;

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String, max_connections: u32 },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityBackend {
    Http {
        base_url: String,
        project_id: String,
        access_token: String,
        timeout: Duration,
    },
    /// Fixed allow-list; for local development.
    Static { uids: Vec<String> },
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub store: StoreBackend,
    /// Top-level namespace every reading collection lives under.
    pub app_key: String,
    pub identity: IdentityBackend,
    pub require_extended_fields: bool,
    pub verify_reads: bool,
    pub empty_result_not_found: bool,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let store = match env.optional("STORE_BACKEND", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: env.required("DATABASE_URL")?,
                max_connections: env.parsed("DATABASE_MAX_CONNECTIONS", "10")?,
            },
            "memory" => StoreBackend::Memory,
            other => return Err(anyhow!("unknown STORE_BACKEND: {other:?}")),
        };

        let identity = match env.optional("IDENTITY_BACKEND", "http").as_str() {
            "http" => IdentityBackend::Http {
                base_url: env.optional("IDENTITY_BASE_URL", "https://identitytoolkit.googleapis.com"),
                project_id: env.required("IDENTITY_PROJECT_ID")?,
                access_token: env.required("IDENTITY_ACCESS_TOKEN")?,
                timeout: Duration::from_secs(env.parsed("IDENTITY_TIMEOUT_SECS", "10")?),
            },
            "static" => IdentityBackend::Static {
                uids: env
                    .optional("IDENTITY_STATIC_UIDS", "")
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect(),
            },
            other => return Err(anyhow!("unknown IDENTITY_BACKEND: {other:?}")),
        };

        Ok(Self {
            server_host: env.optional("SERVER_HOST", "0.0.0.0"),
            server_port: env
                .optional("SERVER_PORT", "3000")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            store,
            app_key: env.optional("APP_KEY", "hydrosense"),
            identity,
            require_extended_fields: env.flag("REQUIRE_EXTENDED_FIELDS", false)?,
            verify_reads: env.flag("VERIFY_READS", true)?,
            empty_result_not_found: env.flag("EMPTY_RESULT_NOT_FOUND", false)?,
            log_json: env.flag("LOG_JSON", false)?,
        })
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            require_extended_fields: self.require_extended_fields,
            verify_reads: self.verify_reads,
            empty_result_not_found: self.empty_result_not_found,
        }
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> Result<String> {
        (self.0)(key)
            .filter(|v| !v.is_empty())
            .with_context(|| format!("missing required env var: {key}"))
    }

    fn optional(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_owned())
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T>
    where
        T: std::str::FromStr,
    {
        self.optional(key, default)
            .parse()
            .map_err(|_| anyhow!("{key} must be a positive integer"))
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match (self.0)(key) {
            None => Ok(default),
            Some(raw) => parse_bool(&raw).with_context(|| {
                format!("{key} must be a boolean (true/false/1/0/yes/no), got: {raw:?}")
            }),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
