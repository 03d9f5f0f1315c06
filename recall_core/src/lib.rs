#![forbid(unsafe_code)]

//! Core domain model and business logic for recall, a fixed-interval
//! flashcard reviewer.
//!
//! This crate provides:
//! - Domain types (cards, outcomes, result records)
//! - Due-card scheduling
//! - The study session state machine and the interactive desk
//! - Persistence (card store, results store, CSV export)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod scheduler;
pub mod session;
pub mod desk;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::{load_cards, JsonResultStore, MemoryResultStore, ResultStore};
pub use scheduler::{compute_due, DUE_INTERVAL_DAYS};
pub use session::{Command, Event, Session, SessionState, SessionSummary};
pub use desk::{Action, Desk};
pub use export::export_csv;
