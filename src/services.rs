//! Explicitly constructed application services.
//!
//! `AppServices` owns the Local Store and the optional Remote Mirror. It is
//! built once by `init`, handed to whatever needs it, and released with
//! `shutdown`. Store operations are synchronous; the remote calls are exposed
//! as async methods that run the blocking transport on `spawn_blocking`.

use std::sync::Arc;

use thiserror::Error;

use crate::config::AppConfig;
use crate::db::{self, KvStore, StoreError};
use crate::models::MirrorSnapshot;
use crate::stats::{self, HealthReport};
use crate::sync::{HttpDocumentStore, PushReport, RemoteMirror, SyncError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    TaskJoin(String),

    #[error("Remote mirror is not configured")]
    RemoteDisabled,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

pub struct AppServices {
    store: Arc<KvStore>,
    mirror: Option<RemoteMirror>,
}

impl AppServices {
    /// Open the store (creating its directory) and, when configured, the
    /// HTTP mirror. Call from synchronous code: the HTTP transport must not
    /// be created inside an async runtime.
    pub fn init(config: &AppConfig) -> Result<Self, ServiceError> {
        if let Some(dir) = config.store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let store = KvStore::open(&config.store_path)?;

        let mirror = match &config.remote {
            Some(remote) => {
                let transport = HttpDocumentStore::new(remote)?;
                Some(RemoteMirror::new(Arc::new(transport), remote.push_mode))
            }
            None => None,
        };

        tracing::info!(
            store = %config.store_path.display(),
            remote = mirror.is_some(),
            "Services initialised"
        );
        Ok(Self::with_parts(store, mirror))
    }

    pub fn with_parts(store: KvStore, mirror: Option<RemoteMirror>) -> Self {
        Self {
            store: Arc::new(store),
            mirror,
        }
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }

    pub fn mirror(&self) -> Option<&RemoteMirror> {
        self.mirror.as_ref()
    }

    /// Pretty-printed export snapshot.
    pub fn export_json(&self) -> Result<String, ServiceError> {
        Ok(serde_json::to_string_pretty(&db::export_all(&self.store))?)
    }

    pub fn health_report(&self) -> HealthReport {
        let kv = self.store();
        stats::build_health_report(
            db::get_user_profile(kv).as_ref(),
            &db::get_medications(kv),
            &db::get_blood_pressure_history(kv),
            &db::get_delivery_dates(kv),
            chrono::Utc::now(),
        )
    }

    /// Push the full Local Store to the mirror under `user_id`.
    pub async fn push_to_remote(&self, user_id: &str) -> Result<PushReport, ServiceError> {
        let mirror = self.mirror.clone().ok_or(ServiceError::RemoteDisabled)?;
        let store = Arc::clone(&self.store);
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || -> Result<PushReport, ServiceError> {
            let snapshot: MirrorSnapshot = db::export_all(&store).into();
            Ok(mirror.push(&user_id, &snapshot)?)
        })
        .await
        .map_err(|e| ServiceError::TaskJoin(e.to_string()))?
    }

    /// Pull the mirror and replace the local collections (and the profile,
    /// when the remote has one) wholesale.
    pub async fn pull_into_local(&self, user_id: &str) -> Result<MirrorSnapshot, ServiceError> {
        let mirror = self.mirror.clone().ok_or(ServiceError::RemoteDisabled)?;
        let store = Arc::clone(&self.store);
        let user_id = user_id.to_string();

        tokio::task::spawn_blocking(move || -> Result<MirrorSnapshot, ServiceError> {
            let snapshot = mirror.pull(&user_id)?;
            apply_snapshot(&store, &snapshot)?;
            Ok(snapshot)
        })
        .await
        .map_err(|e| ServiceError::TaskJoin(e.to_string()))?
    }

    /// Release the store and mirror.
    pub fn shutdown(self) {
        let Self { store, mirror } = self;
        drop(mirror);
        drop(store);
        tracing::info!("Services shut down");
    }
}

fn apply_snapshot(kv: &KvStore, snapshot: &MirrorSnapshot) -> Result<(), StoreError> {
    if let Some(profile) = &snapshot.user_data {
        db::save_user_profile(kv, profile)?;
    }
    if let Some(items) = &snapshot.medications {
        db::save_medication_list(kv, items)?;
    }
    if let Some(items) = &snapshot.blood_pressure {
        db::save_blood_pressure_list(kv, items)?;
    }
    if let Some(items) = &snapshot.delivery_dates {
        db::save_delivery_list(kv, items)?;
    }
    if let Some(items) = &snapshot.caregivers {
        db::save_caregiver_list(kv, items)?;
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Command-line entry
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Export,
    Report,
    Clear,
    Push(String),
    Pull(String),
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self, ServiceError> {
        let unknown = || ServiceError::UnknownCommand(args.join(" "));
        match args {
            [] => Ok(Command::Export),
            [cmd] if cmd == "export" => Ok(Command::Export),
            [cmd] if cmd == "report" => Ok(Command::Report),
            [cmd] if cmd == "clear" => Ok(Command::Clear),
            [cmd, user] if cmd == "push" => Ok(Command::Push(user.clone())),
            [cmd, user] if cmd == "pull" => Ok(Command::Pull(user.clone())),
            _ => Err(unknown()),
        }
    }
}

/// Execute one command and return what should be printed.
pub fn run_command(config: &AppConfig, args: &[String]) -> Result<String, ServiceError> {
    let command = Command::parse(args)?;
    let services = AppServices::init(config)?;

    let output = match command {
        Command::Export => services.export_json()?,
        Command::Report => serde_json::to_string_pretty(&services.health_report())?,
        Command::Clear => {
            db::clear_all(services.store())?;
            "All local data cleared".to_string()
        }
        Command::Push(user) => {
            let runtime = remote_runtime()?;
            let report = runtime.block_on(services.push_to_remote(&user))?;
            serde_json::to_string_pretty(&report)?
        }
        Command::Pull(user) => {
            let runtime = remote_runtime()?;
            let snapshot = runtime.block_on(services.pull_into_local(&user))?;
            serde_json::to_string_pretty(&snapshot)?
        }
    };

    services.shutdown();
    Ok(output)
}

fn remote_runtime() -> Result<tokio::runtime::Runtime, ServiceError> {
    Ok(tokio::runtime::Builder::new_current_thread().enable_all().build()?)
}
