//! Session event store and the delete/undo protocol.
//!
//! Events are addressed by position. Indices are only meaningful within one
//! synchronous batch of operations: a delete or restore renumbers everything
//! after it, so callers must re-read the list instead of caching indices.
//!
//! Every mutation validates its input before touching the list, so a failed
//! call leaves the store exactly as it was.

use crate::{Error, IndexedEvent, Nutrients, Result, SessionEvent, Totals};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Result of a delete, handed back to the caller for a possible undo
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeletedEvent {
    pub deleted_event: SessionEvent,
    pub deleted_index: usize,
}

/// Ordered drink events of the current, unsaved session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionEventStore {
    /// Instant the `hours_ago` values are relative to
    as_of: DateTime<Utc>,
    events: Vec<SessionEvent>,
    /// Set by a delete, consumed by the next restore
    #[serde(default)]
    restore_armed: bool,
}

impl SessionEventStore {
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            events: Vec::new(),
            restore_armed: false,
        }
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Positional view for callers that edit by index
    pub fn indexed(&self) -> Vec<IndexedEvent> {
        self.events
            .iter()
            .enumerate()
            .map(|(index, event)| IndexedEvent {
                index,
                event: *event,
            })
            .collect()
    }

    pub fn totals(&self) -> Totals {
        Totals::of(&self.events)
    }

    /// Re-anchor every event to `now` so "2h ago" keeps aging.
    ///
    /// A clock that moved backwards leaves the events untouched.
    pub fn advance_to(&mut self, now: DateTime<Utc>) {
        let elapsed = now - self.as_of;
        if elapsed < Duration::zero() {
            tracing::warn!(
                "Clock moved backwards by {}s; keeping event ages",
                -elapsed.num_seconds()
            );
            return;
        }
        let hours = hours_in(elapsed);
        for event in &mut self.events {
            event.hours_ago += hours;
        }
        self.as_of = now;
    }

    /// Push an event; its index is the previous length
    pub fn append(&mut self, event: SessionEvent) -> Result<usize> {
        event.validate()?;
        self.events.push(event);
        let index = self.events.len() - 1;
        tracing::info!(
            "Logged {:.2} standard drinks {:.2}h ago at index {}",
            event.standard_drinks,
            event.hours_ago,
            index
        );
        Ok(index)
    }

    /// Replace time and amount at `index`; `None` nutrients keep the existing ones
    pub fn edit_at(
        &mut self,
        index: usize,
        hours_ago: f64,
        standard_drinks: f64,
        nutrients: Option<Nutrients>,
    ) -> Result<SessionEvent> {
        let current = self.get(index)?;
        let edited = SessionEvent {
            hours_ago,
            standard_drinks,
            nutrients: nutrients.unwrap_or(current.nutrients),
        };
        edited.validate()?;
        self.events[index] = edited;
        tracing::info!("Edited event {}", index);
        Ok(edited)
    }

    /// Remove the event at `index`; later events shift down by one
    pub fn delete_at(&mut self, index: usize) -> Result<DeletedEvent> {
        self.get(index)?;
        let deleted_event = self.events.remove(index);
        self.restore_armed = true;
        tracing::info!("Deleted event {}", index);
        Ok(DeletedEvent {
            deleted_event,
            deleted_index: index,
        })
    }

    /// Reinsert a deleted event at `index`, clamped to the current length.
    ///
    /// Only one restore is allowed per delete.
    pub fn restore(&mut self, index: usize, event: SessionEvent) -> Result<usize> {
        if !self.restore_armed {
            return Err(Error::NothingToRestore(
                "no event has been deleted since the last restore".into(),
            ));
        }
        event.validate()?;
        let index = index.min(self.events.len());
        self.events.insert(index, event);
        self.restore_armed = false;
        tracing::info!("Restored event at index {}", index);
        Ok(index)
    }

    /// Session reset
    pub fn clear(&mut self) {
        self.events.clear();
        self.restore_armed = false;
    }

    /// Session load: replace the whole list, all-or-nothing
    pub fn replace(&mut self, events: Vec<SessionEvent>) -> Result<()> {
        for (index, event) in events.iter().enumerate() {
            event
                .validate()
                .map_err(|e| Error::invalid(format!("event {}: {}", index, e)))?;
        }
        self.events = events;
        self.restore_armed = false;
        Ok(())
    }

    fn get(&self, index: usize) -> Result<SessionEvent> {
        self.events.get(index).copied().ok_or_else(|| {
            Error::NotFound(format!(
                "event index {} (session has {} events)",
                index,
                self.events.len()
            ))
        })
    }
}

/// Caller-held snapshot enabling one undo within a bounded window
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeletedEventRecall {
    pub event: SessionEvent,
    pub original_index: usize,
    pub captured_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl DeletedEventRecall {
    pub fn new(deleted: DeletedEvent, now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            event: deleted.deleted_event,
            original_index: deleted.deleted_index,
            captured_at: now,
            expires_at: now + window,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Consume the snapshot, returning the index and the event aged to `now`
    pub fn take(self, now: DateTime<Utc>) -> Result<(usize, SessionEvent)> {
        if self.is_expired(now) {
            return Err(Error::NothingToRestore(format!(
                "undo window closed at {}",
                self.expires_at.to_rfc3339()
            )));
        }
        let mut event = self.event;
        let elapsed = now - self.captured_at;
        if elapsed > Duration::zero() {
            event.hours_ago += hours_in(elapsed);
        }
        Ok((self.original_index, event))
    }
}

fn hours_in(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(events: &[SessionEvent]) -> SessionEventStore {
        let mut store = SessionEventStore::new(Utc::now());
        for event in events {
            store.append(*event).unwrap();
        }
        store
    }

    #[test]
    fn test_append_returns_previous_length() {
        let mut store = SessionEventStore::new(Utc::now());
        assert_eq!(store.append(SessionEvent::new(1.0, 1.0)).unwrap(), 0);
        assert_eq!(store.append(SessionEvent::new(0.0, 1.0)).unwrap(), 1);
        assert!(store.append(SessionEvent::new(0.0, -1.0)).is_err());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_edit_keeps_nutrients_on_partial_update() {
        let mut event = SessionEvent::new(1.0, 1.0);
        event.nutrients.calories = 110.0;
        let mut store = store_with(&[event]);

        let edited = store.edit_at(0, 2.0, 2.0, None).unwrap();
        assert_eq!(edited.hours_ago, 2.0);
        assert_eq!(edited.standard_drinks, 2.0);
        assert_eq!(edited.nutrients.calories, 110.0);

        let replaced = Nutrients {
            calories: 50.0,
            carbs_g: 1.0,
            sugar_g: 0.0,
        };
        let edited = store.edit_at(0, 2.0, 2.0, Some(replaced)).unwrap();
        assert_eq!(edited.nutrients, replaced);
    }

    #[test]
    fn test_edit_out_of_range_leaves_list_unchanged() {
        let mut store = store_with(&[SessionEvent::new(1.0, 1.0)]);
        let before = store.clone();
        assert!(matches!(
            store.edit_at(5, 0.0, 1.0, None),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.edit_at(0, 0.0, f64::NAN, None),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn test_delete_shifts_indices() {
        let mut store = store_with(&[
            SessionEvent::new(3.0, 1.0),
            SessionEvent::new(2.0, 1.0),
            SessionEvent::new(1.0, 1.0),
        ]);
        let deleted = store.delete_at(1).unwrap();
        assert_eq!(deleted.deleted_index, 1);
        assert_eq!(deleted.deleted_event.hours_ago, 2.0);
        assert_eq!(store.indexed()[1].event.hours_ago, 1.0);
        assert!(matches!(store.delete_at(2), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_restore_is_single_use() {
        let mut store = store_with(&[SessionEvent::new(1.0, 1.0), SessionEvent::new(0.0, 2.0)]);
        let before = store.events().to_vec();

        let deleted = store.delete_at(0).unwrap();
        store
            .restore(deleted.deleted_index, deleted.deleted_event)
            .unwrap();
        assert_eq!(store.events(), before.as_slice());

        assert!(matches!(
            store.restore(deleted.deleted_index, deleted.deleted_event),
            Err(Error::NothingToRestore(_))
        ));
    }

    #[test]
    fn test_restore_without_delete_fails() {
        let mut store = store_with(&[SessionEvent::new(1.0, 1.0)]);
        assert!(matches!(
            store.restore(0, SessionEvent::new(1.0, 1.0)),
            Err(Error::NothingToRestore(_))
        ));
    }

    #[test]
    fn test_restore_clamps_index_after_shrink() {
        let mut store = store_with(&[
            SessionEvent::new(3.0, 1.0),
            SessionEvent::new(2.0, 1.0),
            SessionEvent::new(1.0, 1.0),
        ]);
        let first = store.delete_at(2).unwrap();
        store.delete_at(0).unwrap();
        let at = store.restore(first.deleted_index, first.deleted_event).unwrap();
        assert_eq!(at, 1);
        assert_eq!(store.events()[1], first.deleted_event);
    }

    #[test]
    fn test_edit_between_delete_and_restore() {
        let mut store = store_with(&[SessionEvent::new(2.0, 1.0), SessionEvent::new(1.0, 1.0)]);
        let deleted = store.delete_at(0).unwrap();
        store.edit_at(0, 0.5, 1.5, None).unwrap();
        store
            .restore(deleted.deleted_index, deleted.deleted_event)
            .unwrap();
        assert_eq!(store.events()[0].hours_ago, 2.0);
        assert_eq!(store.events()[1].standard_drinks, 1.5);
    }

    #[test]
    fn test_replace_is_all_or_nothing() {
        let mut store = store_with(&[SessionEvent::new(1.0, 1.0)]);
        let before = store.clone();
        let err = store
            .replace(vec![SessionEvent::new(0.0, 1.0), SessionEvent::new(0.0, 0.0)])
            .unwrap_err();
        assert!(err.to_string().contains("event 1"));
        assert_eq!(store, before);

        store.replace(vec![SessionEvent::new(4.0, 2.0)]).unwrap();
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_advance_ages_events() {
        let start = Utc::now();
        let mut store = SessionEventStore::new(start);
        store.append(SessionEvent::new(2.0, 1.0)).unwrap();

        store.advance_to(start + Duration::minutes(90));
        assert!((store.events()[0].hours_ago - 3.5).abs() < 1e-9);

        // Backwards clock is ignored
        store.advance_to(start);
        assert!((store.events()[0].hours_ago - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_recall_expiry_and_aging() {
        let now = Utc::now();
        let deleted = DeletedEvent {
            deleted_event: SessionEvent::new(1.0, 1.0),
            deleted_index: 0,
        };
        let recall = DeletedEventRecall::new(deleted, now, Duration::seconds(120));

        let (index, event) = recall.take(now + Duration::seconds(36)).unwrap();
        assert_eq!(index, 0);
        assert!((event.hours_ago - 1.01).abs() < 1e-9);

        assert!(matches!(
            recall.take(now + Duration::seconds(121)),
            Err(Error::NothingToRestore(_))
        ));
    }

    #[test]
    fn test_store_json_roundtrip() {
        let store = store_with(&[SessionEvent::new(1.0, 1.0)]);
        let json = serde_json::to_string(&store).unwrap();
        let parsed: SessionEventStore = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, store);
    }
}
