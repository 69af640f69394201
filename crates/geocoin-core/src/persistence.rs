//! Save/Load functionality for persisting the game session
//!
//! A snapshot holds the player position, trail, inventory and every cache
//! memento. All of it is plain data with no cross-references, so any
//! point-in-time snapshot is self-consistent on its own.
//!
//! JSON is the default encoding and mirrors the logical schema key for key;
//! bincode is available for a compact binary form.

use std::io::{Read, Write};

use geocoin_logic::cache::{CacheMemento, CacheStore, StoreError};
use geocoin_logic::cells::LatLon;
use geocoin_logic::token::Token;
use geocoin_logic::transfer::Inventory;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Encoding used for snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveFormat {
    #[default]
    Json,
    Bincode,
}

/// Serializable snapshot of the game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub player_position: LatLon,
    /// Visited positions as `[lat, lon]` pairs, oldest first
    pub player_trail: Vec<[f64; 2]>,
    pub inventory: Vec<Token>,
    /// `("{i},{j}", memento)` pairs in identity order
    pub caches: Vec<(String, CacheMemento)>,
}

/// Session state rebuilt from a snapshot.
#[derive(Debug)]
pub struct SavedState {
    pub position: LatLon,
    pub trail: Vec<LatLon>,
    pub inventory: Inventory,
    pub caches: CacheStore,
}

impl SaveData {
    /// Capture the current session.
    pub fn capture(
        position: LatLon,
        trail: &[LatLon],
        inventory: &Inventory,
        caches: &CacheStore,
    ) -> Self {
        Self {
            version: SAVE_VERSION,
            player_position: position,
            player_trail: trail.iter().map(|p| [p.lat, p.lon]).collect(),
            inventory: inventory.tokens().to_vec(),
            caches: caches.serialize_all(),
        }
    }

    /// Validate and rebuild the session this snapshot describes. The version
    /// has already been checked by [`load_game`].
    pub fn into_state(self) -> Result<SavedState, SaveError> {
        let finite = |p: &LatLon| p.lat.is_finite() && p.lon.is_finite();
        if !finite(&self.player_position) {
            return Err(SaveError::CorruptSnapshot(
                "player position is not a finite coordinate".to_string(),
            ));
        }
        let trail: Vec<LatLon> = self
            .player_trail
            .iter()
            .map(|&[lat, lon]| LatLon::new(lat, lon))
            .collect();
        if !trail.iter().all(finite) {
            return Err(SaveError::CorruptSnapshot(
                "player trail holds a non-finite coordinate".to_string(),
            ));
        }

        let mut caches = CacheStore::new();
        caches.restore_all(self.caches)?;

        Ok(SavedState {
            position: self.player_position,
            trail,
            inventory: Inventory::from_tokens(self.inventory),
            caches,
        })
    }
}

/// Save a snapshot to a writer
pub fn save_game<W: Write>(writer: W, data: &SaveData, format: SaveFormat) -> Result<(), SaveError> {
    match format {
        SaveFormat::Json => serde_json::to_writer(writer, data)?,
        SaveFormat::Bincode => bincode::serialize_into(writer, data)?,
    }
    Ok(())
}

/// Load a snapshot from a reader, checking its version
pub fn load_game<R: Read>(reader: R, format: SaveFormat) -> Result<SaveData, SaveError> {
    let save_data: SaveData = match format {
        SaveFormat::Json => serde_json::from_reader(reader)?,
        SaveFormat::Bincode => bincode::deserialize_from(reader)?,
    };

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    Ok(save_data)
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

impl SaveError {
    /// Whether the stored data itself is unusable, as opposed to the storage
    /// failing to read or write it.
    pub fn is_corrupt(&self) -> bool {
        !matches!(self, SaveError::Io(_))
    }
}

impl From<StoreError> for SaveError {
    fn from(e: StoreError) -> Self {
        SaveError::CorruptSnapshot(e.to_string())
    }
}
