#![forbid(unsafe_code)]

//! Core domain model and business logic for Drinking Buddy.
//!
//! This crate provides:
//! - Domain types (profile, session events, catalog entries)
//! - The drink catalog
//! - The Widmark BAC model and curve
//! - Advisory, planning and debrief engines
//! - Persistence (active session, undo recall slot, saved-session journal)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod model;
pub mod store;
pub mod advisory;
pub mod planning;
pub mod debrief;
pub mod engine;
pub mod state;
pub mod wal;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use model::{BacModel, Curve, CurvePoint};
pub use store::{DeletedEvent, DeletedEventRecall, SessionEventStore};
pub use engine::{SessionEngine, SessionQuery, SessionState};
pub use state::ActiveSession;
pub use wal::{JsonlSink, SavedSession, SessionSink};
pub use history::load_saved_sessions;
