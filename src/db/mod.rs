//! Database layer (Firestore, plus an in-memory store for development).

pub mod firestore;
pub mod memory;
pub mod store;

pub use self::firestore::FirestoreDb;
pub use self::memory::MemoryStore;
pub use self::store::{ActivityQuery, ActivityStore, TokenStore};

/// Collection names as constants.
pub mod collections {
    pub const ACTIVITIES: &str = "activities";
    /// Strava OAuth tokens (keyed by athlete_id)
    pub const STRAVA_TOKENS: &str = "strava_tokens";
}
