//! # Giveaways Core
//!
//! The giveaway lifecycle engine: creation of time-boxed drawings, entry
//! tracking while they are open, the weighted winner draw at close, restart-safe
//! restoration of in-flight drawings and deferred retention cleanup.
//!
//! The engine talks to the outside world only through the collaborator traits
//! in [`store`] and [`notifier`]; persistence and chat rendering live in the
//! `giveaways-db` and `giveaways-discord-bot` crates.

/// Clock abstraction used for deadlines
pub mod clock;
/// Engine configuration loaded from the environment
pub mod config;
/// Engine facade wiring every component together
pub mod engine;
/// Error taxonomy
pub mod errors;
/// Join/leave operations against open giveaways
pub mod ledger;
/// Open to closed state machine and deadline timers
pub mod lifecycle;
/// Mocks of the collaborator traits for tests
pub mod mock;
/// Persisted data model
pub mod models;
/// Notification and eligibility collaborator contracts
pub mod notifier;
/// Startup reconstruction of in-memory scheduling state
pub mod restoration;
/// Periodic purge of expired closed giveaways
pub mod retention;
/// Weighted, duplicate-free winner draw
pub mod selector;
/// Persistence collaborator contract
pub mod store;

pub use engine::GiveawayEngine;
pub use errors::{EntryError, GiveawayError, GiveawayResult, NotifyError, StoreError, StoreResult};
