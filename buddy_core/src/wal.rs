//! Journal of saved sessions.
//!
//! Finished sessions are appended to a JSONL (JSON Lines) file with file
//! locking so concurrent saves never interleave.

use crate::store::SessionEventStore;
use crate::{Profile, Result, SessionEvent, Totals};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A finished session as written to the journal.
///
/// Event ages are relative to `saved_at`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedSession {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub profile: Profile,
    pub events: Vec<SessionEvent>,
    #[serde(default)]
    pub water_oz: f64,
}

impl SavedSession {
    /// Snapshot a store that has been aged to `saved_at`
    pub fn from_store(
        profile: Profile,
        store: &SessionEventStore,
        water_oz: f64,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            saved_at,
            profile,
            events: store.events().to_vec(),
            water_oz,
        }
    }

    pub fn totals(&self) -> Totals {
        Totals::of(&self.events)
    }
}

/// Session sink trait for persisting finished sessions
pub trait SessionSink {
    fn append(&mut self, session: &SavedSession) -> Result<()>;
}

/// JSONL-based session sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionSink for JsonlSink {
    fn append(&mut self, session: &SavedSession) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        // One write per line so a crash never leaves half a record behind another
        let mut line = serde_json::to_string(session)?;
        line.push('\n');
        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(line.as_bytes())?;
        writer.flush()?;

        file.unlock()?;

        tracing::info!(
            "Saved session {} with {} events",
            session.id,
            session.events.len()
        );
        Ok(())
    }
}

/// Read every session in the journal, in file order.
///
/// Lines that fail to parse are skipped with a warning.
pub fn read_sessions(path: &Path) -> Result<Vec<SavedSession>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<SavedSession>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from journal", sessions.len());
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_session() -> SavedSession {
        SavedSession {
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            profile: Profile::new(180.0, true).unwrap(),
            events: vec![SessionEvent::new(2.0, 1.0), SessionEvent::new(0.5, 1.5)],
            water_oz: 16.0,
        }
    }

    #[test]
    fn test_append_and_read_single_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("saved_sessions.jsonl");

        let session = create_test_session();
        let mut sink = JsonlSink::new(&path);
        sink.append(&session).unwrap();

        let sessions = read_sessions(&path).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, session.id);
        assert_eq!(sessions[0].events, session.events);
        assert_eq!(sessions[0].totals().standard_drinks, 2.5);
    }

    #[test]
    fn test_append_multiple_sessions() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("saved_sessions.jsonl");

        let mut sink = JsonlSink::new(&path);
        for _ in 0..5 {
            sink.append(&create_test_session()).unwrap();
        }

        assert_eq!(read_sessions(&path).unwrap().len(), 5);
    }

    #[test]
    fn test_read_missing_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = read_sessions(&temp_dir.path().join("nonexistent.jsonl")).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_corrupted_line_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("saved_sessions.jsonl");

        let mut sink = JsonlSink::new(&path);
        sink.append(&create_test_session()).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{ not a session").unwrap();
        }
        sink.append(&create_test_session()).unwrap();

        assert_eq!(read_sessions(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_from_store_copies_events() {
        let now = Utc::now();
        let mut store = SessionEventStore::new(now);
        store.append(SessionEvent::new(1.0, 1.0)).unwrap();
        let saved = SavedSession::from_store(Profile::new(150.0, false).unwrap(), &store, 8.0, now);
        assert_eq!(saved.events, store.events());
        assert_eq!(saved.saved_at, now);
        assert_eq!(saved.water_oz, 8.0);
    }
}
