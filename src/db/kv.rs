//! Key-value store over a single SQLite table.
//!
//! Each key holds one UTF-8 JSON blob and a revision counter that increases
//! on every write. `set_if_revision` is the compare-and-set primitive used by
//! collection read-modify-write cycles: a writer holding a stale revision gets
//! `StoreError::Conflict` instead of overwriting a newer value.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use super::{open_database, open_memory_database, StorageKey, StoreError};

/// A stored blob and the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
    pub revision: i64,
}

/// On-device key-value store.
pub struct KvStore {
    conn: Mutex<Connection>,
}

impl KvStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::from_connection(open_database(path)?))
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Read a key. `None` when the key is absent.
    pub fn get(&self, key: StorageKey) -> Result<Option<StoredValue>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT value, revision FROM kv_store WHERE key = ?1",
                params![key.as_str()],
                |row| {
                    Ok(StoredValue {
                        value: row.get(0)?,
                        revision: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Unconditionally overwrite a key. Returns the new revision.
    pub fn set(&self, key: StorageKey, value: &str) -> Result<i64, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let revision = next_revision(&tx)?;
        tx.execute(
            "INSERT INTO kv_store (key, value, revision, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                revision = excluded.revision,
                updated_at = excluded.updated_at",
            params![key.as_str(), value, revision],
        )?;
        tx.commit()?;
        Ok(revision)
    }

    /// Write a key only if its revision still matches `expected`.
    ///
    /// `expected = None` means "the key must not exist yet". Revisions come
    /// from one store-wide sequence, so a key that was removed and recreated
    /// never reuses a revision an earlier reader may still hold.
    pub fn set_if_revision(
        &self,
        key: StorageKey,
        value: &str,
        expected: Option<i64>,
    ) -> Result<i64, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let revision = next_revision(&tx)?;
        let written = match expected {
            Some(current) => tx.execute(
                "UPDATE kv_store SET value = ?2, revision = ?3, updated_at = datetime('now')
                 WHERE key = ?1 AND revision = ?4",
                params![key.as_str(), value, revision, current],
            )?,
            None => tx.execute(
                "INSERT INTO kv_store (key, value, revision, updated_at)
                 VALUES (?1, ?2, ?3, datetime('now'))
                 ON CONFLICT(key) DO NOTHING",
                params![key.as_str(), value, revision],
            )?,
        };

        if written == 0 {
            // Dropping `tx` rolls back the sequence bump too.
            tracing::warn!(key = %key, ?expected, "Revision mismatch, write rejected");
            return Err(StoreError::Conflict {
                key: key.as_str().to_string(),
            });
        }
        tx.commit()?;
        Ok(revision)
    }

    /// Remove a single key. Absent keys are ignored.
    pub fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        self.remove_many(&[key])
    }

    /// Remove several keys in one transaction.
    pub fn remove_many(&self, keys: &[StorageKey]) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute("DELETE FROM kv_store WHERE key = ?1", params![key.as_str()])?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Whether a key currently exists.
    pub fn contains(&self, key: StorageKey) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Leave the connection mutex poisoned.
    #[cfg(test)]
    pub(crate) fn poison_lock(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.conn.lock();
            panic!("store lock poisoned on purpose");
        }));
    }
}

/// Draw the next store-wide revision.
fn next_revision(tx: &Transaction<'_>) -> Result<i64, StoreError> {
    let revision = tx.query_row(
        "UPDATE kv_revision_seq SET last = last + 1 WHERE id = 1 RETURNING last",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(revision)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> KvStore {
        KvStore::open_in_memory().unwrap()
    }

    #[test]
    fn get_absent_returns_none() {
        let kv = test_store();
        assert!(kv.get(StorageKey::Medications).unwrap().is_none());
    }

    #[test]
    fn set_then_get() {
        let kv = test_store();
        let rev = kv.set(StorageKey::Medications, "[]").unwrap();
        assert_eq!(rev, 1);
        let stored = kv.get(StorageKey::Medications).unwrap().unwrap();
        assert_eq!(stored.value, "[]");
        assert_eq!(stored.revision, 1);
    }

    #[test]
    fn set_increments_revision() {
        let kv = test_store();
        kv.set(StorageKey::AppSettings, "{}").unwrap();
        let rev = kv.set(StorageKey::AppSettings, "{\"a\":1}").unwrap();
        assert_eq!(rev, 2);
        assert_eq!(kv.get(StorageKey::AppSettings).unwrap().unwrap().value, "{\"a\":1}");
    }

    #[test]
    fn set_if_revision_accepts_current() {
        let kv = test_store();
        let rev = kv.set(StorageKey::Caregivers, "[]").unwrap();
        let next = kv.set_if_revision(StorageKey::Caregivers, "[1]", Some(rev)).unwrap();
        assert_eq!(next, rev + 1);
    }

    #[test]
    fn stale_revision_is_a_conflict() {
        let kv = test_store();
        let rev = kv.set(StorageKey::Caregivers, "[]").unwrap();

        // Two writers read revision `rev`; the first one wins.
        kv.set_if_revision(StorageKey::Caregivers, "[\"first\"]", Some(rev)).unwrap();
        let second = kv.set_if_revision(StorageKey::Caregivers, "[\"second\"]", Some(rev));

        assert!(matches!(second, Err(StoreError::Conflict { .. })));
        assert_eq!(
            kv.get(StorageKey::Caregivers).unwrap().unwrap().value,
            "[\"first\"]"
        );
    }

    #[test]
    fn create_only_write_conflicts_when_key_exists() {
        let kv = test_store();
        kv.set_if_revision(StorageKey::DeliveryDates, "[]", None).unwrap();
        let again = kv.set_if_revision(StorageKey::DeliveryDates, "[]", None);
        assert!(matches!(again, Err(StoreError::Conflict { .. })));
    }

    #[test]
    fn remove_many_clears_only_named_keys() {
        let kv = test_store();
        kv.set(StorageKey::UserData, "{}").unwrap();
        kv.set(StorageKey::HasLaunched, "true").unwrap();
        kv.remove_many(&[StorageKey::UserData, StorageKey::Medications]).unwrap();

        assert!(!kv.contains(StorageKey::UserData).unwrap());
        assert!(kv.contains(StorageKey::HasLaunched).unwrap());
    }

    #[test]
    fn revisions_are_store_wide() {
        let kv = test_store();
        let a = kv.set(StorageKey::Medications, "[]").unwrap();
        let b = kv.set(StorageKey::Caregivers, "[]").unwrap();
        assert!(b > a);
    }

    #[test]
    fn recreated_key_never_reuses_a_revision() {
        let kv = test_store();
        let stale = kv.set(StorageKey::BloodPressure, "[\"old\"]").unwrap();

        // Wipe, then another writer recreates the key.
        kv.remove(StorageKey::BloodPressure).unwrap();
        let fresh = kv.set_if_revision(StorageKey::BloodPressure, "[\"new\"]", None).unwrap();
        assert!(fresh > stale);

        let late = kv.set_if_revision(StorageKey::BloodPressure, "[\"lost\"]", Some(stale));
        assert!(matches!(late, Err(StoreError::Conflict { .. })));
        assert_eq!(kv.get(StorageKey::BloodPressure).unwrap().unwrap().value, "[\"new\"]");
    }

    #[test]
    fn rejected_write_does_not_consume_a_revision() {
        let kv = test_store();
        let first = kv.set(StorageKey::UserData, "{}").unwrap();
        assert!(kv.set_if_revision(StorageKey::UserData, "{}", None).is_err());
        assert_eq!(kv.set(StorageKey::UserData, "{}").unwrap(), first + 1);
    }
}
