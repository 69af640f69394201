//! Pure world model for Geocoin.
//!
//! This crate contains the procedural world and its mutable state, independent
//! of any map renderer, UI toolkit or location sensor. Functions take plain
//! data and return results, making them unit-testable and usable from the
//! game session crate, the headless harness, and any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cache`] | Caches, their mementos, and the Cache Store |
//! | [`cells`] | Coordinates, cell identities, flyweight Cell Index |
//! | [`config`] | World constants (cell size, spawn rate, radius) |
//! | [`luck`] | Deterministic hash-based sampler and mint decisions |
//! | [`token`] | Collectible token value type and its persisted record |
//! | [`transfer`] | Player inventory and the collect/deposit protocol |
//! | [`world`] | World View Builder: visible window, mint-or-restore |

pub mod cache;
pub mod cells;
pub mod config;
pub mod luck;
pub mod token;
pub mod transfer;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::cache::{Cache, CacheMemento, CacheStore, StoreError};
    pub use crate::cells::{Cell, CellId, CellIndex, LatLon};
    pub use crate::config::WorldConfig;
    pub use crate::luck::{HashSampler, Sampler};
    pub use crate::token::{Token, TokenRecord};
    pub use crate::transfer::{collect, deposit, Container, Inventory, TransferError};
    pub use crate::world::WorldBuilder;
}
