//! Saved session history.
//!
//! Loads the journal newest-first for listing and debriefs.

use crate::wal::{read_sessions, SavedSession};
use crate::{Error, Result};
use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// Load saved sessions, newest first.
///
/// With `days`, only sessions saved within that many days are returned.
/// A session journaled twice is only listed once.
pub fn load_saved_sessions(path: &Path, days: Option<i64>) -> Result<Vec<SavedSession>> {
    let cutoff = days.map(|d| Utc::now() - Duration::days(d));
    let mut seen_ids = HashSet::new();

    let mut sessions: Vec<SavedSession> = read_sessions(path)?
        .into_iter()
        .filter(|s| cutoff.map_or(true, |c| s.saved_at >= c))
        .filter(|s| seen_ids.insert(s.id))
        .collect();

    sessions.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));

    tracing::debug!("Loaded {} saved sessions", sessions.len());
    Ok(sessions)
}

/// Find a saved session by id
pub fn find_session(sessions: &[SavedSession], id: Uuid) -> Result<&SavedSession> {
    sessions
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| Error::NotFound(format!("saved session {}", id)))
}

/// Most recently saved session, if any
pub fn latest_session(sessions: &[SavedSession]) -> Option<&SavedSession> {
    sessions.first()
}
