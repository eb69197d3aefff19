//! Active session persistence with file locking.
//!
//! The active session (profile, events, water tally) and the undo recall
//! slot live in small JSON files. Reads take a shared lock, writes go
//! through a locked temp file that is renamed over the original, so a
//! concurrent reader sees either the old or the new session.

use crate::store::{DeletedEventRecall, SessionEventStore};
use crate::{Error, Profile, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The session currently being logged
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActiveSession {
    #[serde(default)]
    pub profile: Option<Profile>,
    pub store: SessionEventStore,
    #[serde(default)]
    pub water_oz: f64,
}

impl Default for ActiveSession {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl ActiveSession {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            profile: None,
            store: SessionEventStore::new(now),
            water_oz: 0.0,
        }
    }

    /// Profile, or `NotFound` until `setup` has run
    pub fn require_profile(&self) -> Result<Profile> {
        self.profile
            .ok_or_else(|| Error::NotFound("profile (run setup first)".into()))
    }

    /// Add water to the tally
    pub fn log_water(&mut self, oz: f64) -> Result<f64> {
        if !(oz.is_finite() && oz > 0.0) {
            return Err(Error::invalid(format!(
                "water ounces must be a positive number, got {}",
                oz
            )));
        }
        self.water_oz += oz;
        Ok(self.water_oz)
    }

    /// Drop events and water, keep the profile
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.store = SessionEventStore::new(now);
        self.water_oz = 0.0;
    }

    /// Load the session with a shared lock.
    ///
    /// Returns an empty session if the file doesn't exist or is corrupted.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(load_json(path, "session")?.unwrap_or_default())
    }

    /// Save atomically: write a locked temp file, sync, rename over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(self, path)?;
        tracing::debug!("Saved active session to {:?}", path);
        Ok(())
    }

    /// Load, age to `now`, modify and save while holding the session write lock
    ///
    /// Concurrent updates are serialized on a `.lock` file next to `path`, so
    /// no mutation is lost to a racing writer.
    pub fn update<T, F>(path: &Path, now: DateTime<Utc>, f: F) -> Result<(Self, T)>
    where
        F: FnOnce(&mut ActiveSession) -> Result<T>,
    {
        let _guard = WriteLock::acquire(path)?;
        let mut session = load_json(path, "session")?.unwrap_or_else(|| Self::new(now));
        session.store.advance_to(now);
        let out = f(&mut session)?;
        session.save(path)?;
        Ok((session, out))
    }
}

// ============================================================================
// Recall slot
// ============================================================================

/// Load the undo recall slot, if one is stored and readable
pub fn load_recall(path: &Path) -> Result<Option<DeletedEventRecall>> {
    load_json(path, "recall")
}

pub fn save_recall(path: &Path, recall: &DeletedEventRecall) -> Result<()> {
    save_json(recall, path)?;
    tracing::debug!(
        "Stored recall for index {} until {}",
        recall.original_index,
        recall.expires_at
    );
    Ok(())
}

/// Remove the recall slot; a missing file is fine
pub fn clear_recall(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Locked JSON files
// ============================================================================

/// Exclusive lock on a sidecar file, released on drop
struct WriteLock {
    file: File,
}

impl WriteLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = sidecar_lock_path(path);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn sidecar_lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

/// Read `path` as JSON under a shared lock.
///
/// A missing file is `None`; an unreadable or corrupted file is logged and
/// also treated as `None`.
fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Option<T>> {
    if !path.exists() {
        tracing::debug!("No {} file at {:?}", what, path);
        return Ok(None);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {} file {:?}: {}. Ignoring it.", what, path, e);
            return Ok(None);
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {} file {:?}: {}. Ignoring it.", what, path, e);
        return Ok(None);
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read {} file {:?}: {}. Ignoring it.", what, path, e);
        return Ok(None);
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded {} from {:?}", what, path);
            Ok(Some(value))
        }
        Err(e) => {
            tracing::warn!("Failed to parse {} file {:?}: {}. Ignoring it.", what, path, e);
            Ok(None)
        }
    }
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "path missing parent"))?;
    std::fs::create_dir_all(parent)?;

    // Temp file in the same directory so the rename is atomic
    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionEvent;
    use chrono::Duration;

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session").join("active.json");

        let mut session = ActiveSession::default();
        session.profile = Some(Profile::new(160.0, true).unwrap());
        session.store.append(SessionEvent::new(1.0, 2.0)).unwrap();
        session.log_water(12.0).unwrap();
        session.save(&path).unwrap();

        let loaded = ActiveSession::load(&path).unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let session = ActiveSession::load(&temp_dir.path().join("missing.json")).unwrap();
        assert!(session.profile.is_none());
        assert!(session.store.is_empty());
        assert_eq!(session.water_oz, 0.0);
    }

    #[test]
    fn test_corrupted_session_is_treated_as_empty() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("active.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let session = ActiveSession::load(&path).unwrap();
        assert!(session.profile.is_none());
        assert!(session.store.is_empty());
    }

    #[test]
    fn test_update_ages_events() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("active.json");
        let start = Utc::now();

        let mut session = ActiveSession::new(start);
        session.store.append(SessionEvent::new(0.0, 1.0)).unwrap();
        session.save(&path).unwrap();

        let (session, count) =
            ActiveSession::update(&path, start + Duration::minutes(90), |s| Ok(s.store.len()))
                .unwrap();
        assert_eq!(count, 1);
        assert_eq!(session.store.events()[0].hours_ago, 1.5);
        assert_eq!(ActiveSession::load(&path).unwrap(), session);
    }

    #[test]
    fn test_failed_update_leaves_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("active.json");
        let session = ActiveSession::default();
        session.save(&path).unwrap();

        let result = ActiveSession::update(&path, session.store.as_of(), |s| {
            s.store.append(SessionEvent::new(0.0, 1.0))?;
            s.log_water(-3.0)
        });
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(ActiveSession::load(&path).unwrap().store.is_empty());
    }

    #[test]
    fn test_reset_keeps_profile() {
        let mut session = ActiveSession::default();
        session.profile = Some(Profile::new(130.0, false).unwrap());
        session.store.append(SessionEvent::new(0.0, 1.0)).unwrap();
        session.log_water(8.0).unwrap();

        session.reset(Utc::now());
        assert!(session.profile.is_some());
        assert!(session.store.is_empty());
        assert_eq!(session.water_oz, 0.0);
    }

    #[test]
    fn test_require_profile() {
        let session = ActiveSession::default();
        assert!(matches!(session.require_profile(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_recall_slot_lifecycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("recall.json");
        assert!(load_recall(&path).unwrap().is_none());

        let mut store = SessionEventStore::new(Utc::now());
        store.append(SessionEvent::new(0.5, 1.0)).unwrap();
        let deleted = store.delete_at(0).unwrap();
        let recall = DeletedEventRecall::new(deleted, Utc::now(), Duration::seconds(120));

        save_recall(&path, &recall).unwrap();
        assert_eq!(load_recall(&path).unwrap(), Some(recall));

        clear_recall(&path).unwrap();
        assert!(load_recall(&path).unwrap().is_none());
        // Clearing twice is fine
        clear_recall(&path).unwrap();
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("active.json");
        ActiveSession::default().save(&path).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "active.json")
            .collect();
        assert!(extras.is_empty(), "found extras: {:?}", extras);
    }
}
