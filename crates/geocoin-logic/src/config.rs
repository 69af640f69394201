//! World configuration — cell size, spawn rate, cache richness, view radius.
//!
//! `WorldConfig::default()` is the live game tuning. Every field carries a
//! serde default so a partial JSON override file only needs the fields it
//! changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cells::LatLon;

/// Degrees of latitude/longitude spanned by one cell edge.
pub const CELL_SIZE: f64 = 0.0001;
/// Probability that any given cell holds a cache.
pub const SPAWN_PROBABILITY: f64 = 0.1;
/// Upper bound on the number of tokens minted into one cache.
pub const MAX_TOKENS: u32 = 10;
/// Half-width of the square visibility window, in cells.
pub const VISIBILITY_RADIUS: i32 = 8;
/// Starting position: Oakes College classroom.
pub const ORIGIN: LatLon = LatLon {
    lat: 36.9895,
    lon: -122.06278,
};

/// Tunable world parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldConfig {
    pub cell_size: f64,
    pub spawn_probability: f64,
    pub max_tokens: u32,
    pub visibility_radius: i32,
    /// Default player position, used on a fresh start and after a reset.
    pub origin: LatLon,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            spawn_probability: SPAWN_PROBABILITY,
            max_tokens: MAX_TOKENS,
            visibility_radius: VISIBILITY_RADIUS,
            origin: ORIGIN,
        }
    }
}

/// A configuration value outside its legal range.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("cell size must be a positive finite number, got {0}")]
    CellSize(f64),
    #[error("spawn probability must lie in [0, 1], got {0}")]
    SpawnProbability(f64),
    #[error("max tokens must be at least 1")]
    MaxTokens,
    #[error("visibility radius must not be negative, got {0}")]
    Radius(i32),
}

impl WorldConfig {
    /// Check every field against its legal range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::CellSize(self.cell_size));
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(ConfigError::SpawnProbability(self.spawn_probability));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::MaxTokens);
        }
        if self.visibility_radius < 0 {
            return Err(ConfigError::Radius(self.visibility_radius));
        }
        Ok(())
    }

    /// Number of cells in the visibility window.
    pub fn window_cells(&self) -> usize {
        let side = (2 * self.visibility_radius.max(0) + 1) as usize;
        side * side
    }
}
