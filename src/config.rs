use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "MiTratamiento";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for remote mirror requests.
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// Get the application data directory.
/// Platform local-data dir (e.g. ~/.local/share/MiTratamiento), or the
/// working directory when the platform reports none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the on-device key-value store.
pub fn store_path() -> PathBuf {
    app_data_dir().join("store.db")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "mitratamiento_lib=info,mitratamiento=info"
}

// ═══════════════════════════════════════════════════════════
// Remote mirror configuration
// ═══════════════════════════════════════════════════════════

/// How `push` maps local records onto remote documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushMode {
    /// Every push adds a fresh document per record (remote picks the id).
    #[default]
    Append,
    /// The local record id is used as the remote document id, so a repeated
    /// push overwrites instead of duplicating.
    Upsert,
}

impl PushMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushMode::Append => "append",
            PushMode::Upsert => "upsert",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Some(PushMode::Append),
            "upsert" => Some(PushMode::Upsert),
            _ => None,
        }
    }
}

/// Connection settings for the HTTP document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub push_mode: PushMode,
    pub timeout_secs: u64,
}

impl RemoteConfig {
    /// Read remote settings from the process environment.
    /// Returns `None` when no base URL is configured (mirror disabled).
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let base_url = lookup("MITRATAMIENTO_REMOTE_URL")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())?;

        let push_mode = match lookup("MITRATAMIENTO_PUSH_MODE") {
            Some(raw) => PushMode::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown push mode, falling back to append");
                PushMode::Append
            }),
            None => PushMode::Append,
        };

        let timeout_secs = lookup("MITRATAMIENTO_REMOTE_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS);

        Some(Self {
            base_url,
            auth_token: lookup("MITRATAMIENTO_REMOTE_TOKEN").filter(|t| !t.is_empty()),
            push_mode,
            timeout_secs,
        })
    }
}

/// Everything `AppServices::init` needs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub remote: Option<RemoteConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let store_path = std::env::var("MITRATAMIENTO_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| store_path());
        Self {
            store_path,
            remote: RemoteConfig::from_env(),
        }
    }
}
