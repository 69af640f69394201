//! Geocoin Core - game session over the procedural world
//!
//! Wraps the pure world model from `geocoin-logic` with the player's side of
//! the game: position, trail and inventory, write-through transfers, world
//! reset, snapshot persistence, and a live position feed.
//!
//! # Example
//!
//! ```rust,no_run
//! use geocoin_core::prelude::*;
//!
//! let storage = FileStorage::new("geocoin-save.json");
//! let mut game = Game::open(WorldConfig::default(), storage).unwrap();
//!
//! game.step(Direction::North).unwrap();
//! if let Some(cache) = game.visible().first() {
//!     let id = cache.id();
//!     game.collect(id).unwrap();
//! }
//! ```

pub mod feed;
pub mod game;
pub mod persistence;
pub mod storage;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::feed::{position_feed, FeedClosed, PositionSender, PositionWatch};
    pub use crate::game::{Direction, Game, GameError, LoadStatus, TransferOutcome};
    pub use crate::persistence::{SaveData, SaveError, SaveFormat};
    pub use crate::storage::{FileStorage, MemoryStorage, Storage};
    pub use geocoin_logic::prelude::*;
}
