//! MargaNav - Safe-path planning session for mine-contaminated grids
//!
//! Reads JSON-lines commands (configure world, set mines, request path),
//! drives the `marga_map` planner and streams every step of the
//! computation as timestamped events for playback by an external viewer.
//!
//! ## Data Flow
//!
//! ```text
//! stdin ──► reader thread ──► bounded channel ──► Session ──► EventEmitter ──► stdout
//!                                                   │  ▲
//!                                                   ▼  │
//!                                           World + AStarPlanner
//! ```
//!
//! - [`protocol`]: inbound envelope, commands and world-export documents
//! - [`session`]: command dispatch, one command at a time
//! - [`mission`]: simulated flight and corridor sweeps over hidden mines
//! - [`events`]: event log, listener fan-out and replay
//! - [`threads`]: stdin reader and session loop

pub mod config;
pub mod error;
pub mod events;
pub mod mission;
pub mod protocol;
pub mod session;
pub mod signal;
pub mod threads;

pub use config::MargaConfig;
pub use error::{NavError, Result};
pub use events::{Event, EventEmitter, EventKind, EventListener, replay};
pub use session::Session;
