//! Remote Mirror: whole-collection push/pull between the Local Store and a
//! per-user remote document store.
//!
//! Layout per user: a singleton user document plus one sub-collection per
//! entity type (`medications`, `bloodPressure`, `deliveries`, `caregivers`)
//! holding one document per record. The transport sits behind the
//! `DocumentStore` trait; `HttpDocumentStore` talks to a REST endpoint and
//! `InMemoryDocumentStore` backs tests and offline use.
//!
//! Remote failures are always propagated. Nothing here retries.

pub mod http;
pub mod memory;

pub use http::HttpDocumentStore;
pub use memory::InMemoryDocumentStore;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::PushMode;
use crate::db::CollectionRecord;
use crate::models::{BloodPressureMeasurement, Caregiver, DeliveryDate, Medication, MirrorSnapshot, UserProfile};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    #[error("Remote returned status {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid remote document {0}")]
    InvalidDocument(String),

    #[error("Remote mirror unavailable: {0}")]
    Unavailable(String),
}

/// Per-user sub-collections on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteCollection {
    #[serde(rename = "medications")]
    Medications,
    #[serde(rename = "bloodPressure")]
    BloodPressure,
    #[serde(rename = "deliveries")]
    Deliveries,
    #[serde(rename = "caregivers")]
    Caregivers,
}

impl RemoteCollection {
    pub const ALL: [RemoteCollection; 4] = [
        RemoteCollection::Medications,
        RemoteCollection::BloodPressure,
        RemoteCollection::Deliveries,
        RemoteCollection::Caregivers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteCollection::Medications => "medications",
            RemoteCollection::BloodPressure => "bloodPressure",
            RemoteCollection::Deliveries => "deliveries",
            RemoteCollection::Caregivers => "caregivers",
        }
    }
}

impl std::fmt::Display for RemoteCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote document: its remote identity and its JSON fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: String,
    pub data: Map<String, Value>,
}

/// Transport seam for the remote document store. Calls are blocking.
pub trait DocumentStore: Send + Sync {
    /// Create a document with a remote-assigned id. Returns that id.
    fn add_document(
        &self,
        user_id: &str,
        collection: RemoteCollection,
        data: &Map<String, Value>,
    ) -> Result<String, SyncError>;

    /// Create or replace the document with the given id.
    fn set_document(
        &self,
        user_id: &str,
        collection: RemoteCollection,
        doc_id: &str,
        data: &Map<String, Value>,
    ) -> Result<(), SyncError>;

    /// Write fields into the user document, keeping fields not in `data`.
    fn merge_user_document(&self, user_id: &str, data: &Map<String, Value>) -> Result<(), SyncError>;

    /// The user document, or `None` if it was never written.
    fn get_user_document(&self, user_id: &str) -> Result<Option<Map<String, Value>>, SyncError>;

    fn list_documents(
        &self,
        user_id: &str,
        collection: RemoteCollection,
    ) -> Result<Vec<RemoteDocument>, SyncError>;
}

/// What a push wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    pub user_document: bool,
    pub medications: usize,
    pub blood_pressure: usize,
    pub deliveries: usize,
    pub caregivers: usize,
}

impl PushReport {
    pub fn documents_written(&self) -> usize {
        usize::from(self.user_document)
            + self.medications
            + self.blood_pressure
            + self.deliveries
            + self.caregivers
    }
}

/// Push/pull adapter over a `DocumentStore`.
#[derive(Clone)]
pub struct RemoteMirror {
    store: Arc<dyn DocumentStore>,
    push_mode: PushMode,
}

impl RemoteMirror {
    pub fn new(store: Arc<dyn DocumentStore>, push_mode: PushMode) -> Self {
        Self { store, push_mode }
    }

    pub fn push_mode(&self) -> PushMode {
        self.push_mode
    }

    /// Write every present entity of `snapshot` to the remote side.
    ///
    /// In `Append` mode each record becomes a new remote document, so
    /// repeated pushes accumulate duplicates. In `Upsert` mode the local id
    /// is the document id and a repeat push overwrites. The profile is
    /// merged into the user document in both modes.
    pub fn push(&self, user_id: &str, snapshot: &MirrorSnapshot) -> Result<PushReport, SyncError> {
        let now = Utc::now();
        let mut report = PushReport::default();

        if let Some(profile) = &snapshot.user_data {
            let data = to_document(profile, now)?;
            self.store.merge_user_document(user_id, &data)?;
            report.user_document = true;
        }
        if let Some(items) = &snapshot.medications {
            report.medications = self.push_collection(user_id, RemoteCollection::Medications, items, now)?;
        }
        if let Some(items) = &snapshot.blood_pressure {
            report.blood_pressure = self.push_collection(user_id, RemoteCollection::BloodPressure, items, now)?;
        }
        if let Some(items) = &snapshot.delivery_dates {
            report.deliveries = self.push_collection(user_id, RemoteCollection::Deliveries, items, now)?;
        }
        if let Some(items) = &snapshot.caregivers {
            report.caregivers = self.push_collection(user_id, RemoteCollection::Caregivers, items, now)?;
        }

        tracing::info!(
            user_id,
            mode = self.push_mode.as_str(),
            documents = report.documents_written(),
            "Pushed local data to remote mirror"
        );
        Ok(report)
    }

    fn push_collection<T: CollectionRecord>(
        &self,
        user_id: &str,
        collection: RemoteCollection,
        items: &[T],
        now: DateTime<Utc>,
    ) -> Result<usize, SyncError> {
        for item in items {
            let data = to_document(item, now)?;
            match self.push_mode {
                PushMode::Append => {
                    self.store.add_document(user_id, collection, &data)?;
                }
                PushMode::Upsert => {
                    self.store.set_document(user_id, collection, item.id(), &data)?;
                }
            }
        }
        Ok(items.len())
    }

    /// Read everything the remote side holds for `user_id`.
    ///
    /// Every collection is returned (empty when the remote has none).
    /// Blood-pressure readings come back newest-first, deliveries
    /// earliest-first; other collections keep the remote listing order.
    pub fn pull(&self, user_id: &str) -> Result<MirrorSnapshot, SyncError> {
        let user_data = match self.store.get_user_document(user_id)? {
            Some(data) => Some(from_document::<UserProfile>("user", Value::Object(data))?),
            None => None,
        };

        let medications: Vec<Medication> = self.pull_collection(user_id, RemoteCollection::Medications)?;
        let mut blood_pressure: Vec<BloodPressureMeasurement> =
            self.pull_collection(user_id, RemoteCollection::BloodPressure)?;
        let mut delivery_dates: Vec<DeliveryDate> = self.pull_collection(user_id, RemoteCollection::Deliveries)?;
        let caregivers: Vec<Caregiver> = self.pull_collection(user_id, RemoteCollection::Caregivers)?;

        blood_pressure.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        delivery_dates.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));

        tracing::info!(
            user_id,
            medications = medications.len(),
            blood_pressure = blood_pressure.len(),
            deliveries = delivery_dates.len(),
            caregivers = caregivers.len(),
            "Pulled remote mirror"
        );

        Ok(MirrorSnapshot {
            user_data,
            medications: Some(medications),
            blood_pressure: Some(blood_pressure),
            delivery_dates: Some(delivery_dates),
            caregivers: Some(caregivers),
        })
    }

    /// Documents without an `id` field take the remote document id.
    ///
    /// Append-mode pushes leave several documents carrying the same record
    /// id; those collapse to the one with the newest `updatedAt` (the later
    /// listing wins a tie), at the position of the first copy.
    fn pull_collection<T: DeserializeOwned>(
        &self,
        user_id: &str,
        collection: RemoteCollection,
    ) -> Result<Vec<T>, SyncError> {
        let mut records: Vec<(String, Option<DateTime<Utc>>, Map<String, Value>)> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();

        for RemoteDocument { id, mut data } in self.store.list_documents(user_id, collection)? {
            let label = format!("{collection}/{id}");
            let record_id = match data.entry("id").or_insert(Value::String(id)) {
                Value::String(record_id) => record_id.clone(),
                other => {
                    return Err(SyncError::InvalidDocument(format!(
                        "{label}: id must be a string, got {other}"
                    )))
                }
            };
            let updated_at = data
                .get("updatedAt")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc));

            match by_id.get(&record_id) {
                Some(&slot) => {
                    tracing::debug!(%collection, id = %record_id, "Collapsing duplicate remote record");
                    if updated_at >= records[slot].1 {
                        records[slot] = (label, updated_at, data);
                    }
                }
                None => {
                    by_id.insert(record_id, records.len());
                    records.push((label, updated_at, data));
                }
            }
        }

        records
            .into_iter()
            .map(|(label, _, data)| from_document(&label, Value::Object(data)))
            .collect()
    }
}

/// Serialize a record to a document body stamped with `updatedAt`.
fn to_document<T: Serialize>(record: &T, now: DateTime<Utc>) -> Result<Map<String, Value>, SyncError> {
    match serde_json::to_value(record)? {
        Value::Object(mut map) => {
            map.insert("updatedAt".into(), Value::String(now.to_rfc3339()));
            Ok(map)
        }
        other => Err(SyncError::InvalidDocument(format!(
            "expected an object, got {other}"
        ))),
    }
}

fn from_document<T: DeserializeOwned>(label: &str, value: Value) -> Result<T, SyncError> {
    serde_json::from_value(value).map_err(|e| SyncError::InvalidDocument(format!("{label}: {e}")))
}
