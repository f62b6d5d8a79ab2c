//! Watch set persistence.
//!
//! `WatchStore` owns the in-memory watch set and commits every mutation
//! through a `WatchPersistence` backend before acknowledging it.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Engine configuration
//! └── watchlist.json        # Persisted watch set
//! ```

pub mod local;
mod store;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::WatchSet;

// Re-export for convenience
pub use local::JsonFileStorage;
pub use store::WatchStore;

/// Trait for watch set storage backends.
#[async_trait]
pub trait WatchPersistence: Send + Sync {
    /// Load the persisted watch set. A backend with nothing stored yet
    /// returns an empty set.
    async fn load(&self) -> Result<WatchSet>;

    /// Durably replace the persisted watch set. Returns only once the
    /// data is committed.
    async fn save(&self, watches: &WatchSet) -> Result<()>;
}
