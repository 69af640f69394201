//! Game session - main entry point for driving the world
//!
//! Every state-changing action (movement, transfer, reset) runs to
//! completion and then saves a full snapshot before returning. There is no
//! batching; any snapshot on disk matches the live state at some action
//! boundary.

use geocoin_logic::cache::{Cache, StoreError};
use geocoin_logic::cells::{CellId, LatLon};
use geocoin_logic::config::{ConfigError, WorldConfig};
use geocoin_logic::luck::{HashSampler, Sampler};
use geocoin_logic::token::Token;
use geocoin_logic::transfer::{self, Inventory, TransferError};
use geocoin_logic::world::WorldBuilder;
use thiserror::Error;

use crate::feed::PositionWatch;
use crate::persistence::{load_game, save_game, SaveData, SaveError, SaveFormat, SavedState};
use crate::storage::Storage;

/// One-cell manual movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// `(dlat, dlon)` in cells.
    fn delta(self) -> (f64, f64) {
        match self {
            Direction::North => (1.0, 0.0),
            Direction::South => (-1.0, 0.0),
            Direction::East => (0.0, 1.0),
            Direction::West => (0.0, -1.0),
        }
    }
}

/// How the session obtained its starting state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No prior snapshot; started from defaults.
    Fresh,
    /// Restored from the stored snapshot.
    Restored,
    /// The stored snapshot was unusable; started from defaults.
    Recovered(String),
}

/// Result of a collect or deposit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Moved(Token),
    /// Nothing moved; both containers are unchanged.
    Declined(TransferError),
}

impl TransferOutcome {
    pub fn moved(&self) -> Option<Token> {
        match self {
            TransferOutcome::Moved(t) => Some(*t),
            TransferOutcome::Declined(_) => None,
        }
    }
}

/// Errors surfaced by session actions.
#[derive(Debug, Error)]
pub enum GameError {
    /// A cell that was never discovered. Callers that only act on caches
    /// returned by movement never see this.
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to save session: {0}")]
    Save(#[from] SaveError),
    #[error("invalid world configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("position ({lat}, {lon}) is not a finite coordinate")]
    InvalidPosition { lat: f64, lon: f64 },
}

/// A single player's session over the procedural world.
pub struct Game<St: Storage, S: Sampler = HashSampler> {
    world: WorldBuilder<S>,
    storage: St,
    format: SaveFormat,
    position: LatLon,
    trail: Vec<LatLon>,
    inventory: Inventory,
    visible: Vec<Cache>,
    load_status: LoadStatus,
}

impl<St: Storage> Game<St, HashSampler> {
    /// Open a session with the hash sampler and JSON snapshots.
    pub fn open(config: WorldConfig, storage: St) -> Result<Self, GameError> {
        Self::open_with(config, HashSampler, storage, SaveFormat::Json)
    }
}

impl<St: Storage, S: Sampler> Game<St, S> {
    /// Open a session, loading the stored snapshot once.
    ///
    /// A missing snapshot starts from defaults. A corrupt one is reported in
    /// [`Game::load_status`] and also starts from defaults; it is never fatal.
    pub fn open_with(
        config: WorldConfig,
        sampler: S,
        storage: St,
        format: SaveFormat,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let mut game = Self {
            world: WorldBuilder::with_sampler(config, sampler),
            storage,
            format,
            position: config.origin,
            trail: Vec::new(),
            inventory: Inventory::new(),
            visible: Vec::new(),
            load_status: LoadStatus::Fresh,
        };

        let status = match game.read_snapshot() {
            Ok(None) => {
                log::info!("No saved session; starting at {:?}", config.origin);
                LoadStatus::Fresh
            }
            Ok(Some(state)) => {
                log::info!(
                    "Restored session: {} caches, {} tokens held",
                    state.caches.len(),
                    state.inventory.len()
                );
                game.position = state.position;
                game.trail = state.trail;
                game.inventory = state.inventory;
                *game.world.store_mut() = state.caches;
                LoadStatus::Restored
            }
            Err(e) => {
                log::warn!("Discarding unreadable saved session: {}", e);
                LoadStatus::Recovered(e.to_string())
            }
        };
        game.load_status = status;

        game.refresh_visible();
        Ok(game)
    }

    fn read_snapshot(&self) -> Result<Option<SavedState>, SaveError> {
        let Some(bytes) = self.storage.read()? else {
            return Ok(None);
        };
        let data = load_game(&bytes[..], self.format)?;
        Ok(Some(data.into_state()?))
    }

    /// Movement entry point for every position source.
    ///
    /// Records the position in the trail, recomputes the visible caches and
    /// saves. Returns the caches now in view. A non-finite fix is rejected
    /// before anything changes.
    pub fn on_position_changed(&mut self, lat: f64, lon: f64) -> Result<&[Cache], GameError> {
        if !(lat.is_finite() && lon.is_finite()) {
            log::warn!("Ignoring non-finite position ({}, {})", lat, lon);
            return Err(GameError::InvalidPosition { lat, lon });
        }
        self.position = LatLon::new(lat, lon);
        self.trail.push(self.position);
        self.refresh_visible();
        log::debug!(
            "Moved to ({:.5}, {:.5}); {} caches in view",
            lat,
            lon,
            self.visible.len()
        );
        self.save()?;
        Ok(&self.visible)
    }

    /// Move one cell in `direction`.
    pub fn step(&mut self, direction: Direction) -> Result<&[Cache], GameError> {
        let (di, dj) = direction.delta();
        let size = self.world.config().cell_size;
        let next = self.position.offset(di * size, dj * size);
        self.on_position_changed(next.lat, next.lon)
    }

    /// Drain pending fixes from a live feed, in arrival order. Returns how
    /// many were applied.
    pub fn pump(&mut self, watch: &mut PositionWatch) -> Result<usize, GameError> {
        let mut applied = 0;
        while let Some(fix) = watch.next_fix() {
            self.on_position_changed(fix.lat, fix.lon)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Take the top token of the cache at `id` into the inventory.
    pub fn collect(&mut self, id: CellId) -> Result<TransferOutcome, GameError> {
        self.transfer(id, transfer::collect)
    }

    /// Give the top inventory token to the cache at `id`.
    pub fn deposit(&mut self, id: CellId) -> Result<TransferOutcome, GameError> {
        self.transfer(id, transfer::deposit)
    }

    fn transfer(
        &mut self,
        id: CellId,
        op: fn(&mut Cache, &mut Inventory) -> Result<Token, TransferError>,
    ) -> Result<TransferOutcome, GameError> {
        let mut cache = self.world.cache(id).map_err(|e| {
            log::error!("Transfer against undiscovered cell {}: {}", id, e);
            debug_assert!(
                !matches!(e, StoreError::NotFound(_)),
                "transfer against undiscovered cell {}",
                id
            );
            e
        })?;

        match op(&mut cache, &mut self.inventory) {
            Ok(token) => {
                self.world.store_cache(&cache);
                if let Some(slot) = self.visible.iter_mut().find(|c| c.id() == id) {
                    *slot = cache;
                }
                log::debug!("Moved token {} at cache {}", token, id);
                self.save()?;
                Ok(TransferOutcome::Moved(token))
            }
            Err(reason) => {
                log::debug!("Transfer at cache {} declined: {}", id, reason);
                Ok(TransferOutcome::Declined(reason))
            }
        }
    }

    /// Wipe the world back to its initial state, if `confirm` agrees.
    ///
    /// Clears every cache, the inventory and the trail, and returns the player
    /// to the configured origin. Returns whether the reset happened.
    pub fn reset(&mut self, confirm: impl FnOnce() -> bool) -> Result<bool, GameError> {
        if !confirm() {
            return Ok(false);
        }
        self.world.reset();
        self.inventory.clear();
        self.trail.clear();
        self.position = self.world.config().origin;
        self.refresh_visible();
        log::info!("World reset");
        self.save()?;
        Ok(true)
    }

    /// Write a full snapshot to storage.
    pub fn save(&mut self) -> Result<(), GameError> {
        let data = self.snapshot();
        let mut buf = Vec::new();
        save_game(&mut buf, &data, self.format)?;
        self.storage.write(&buf).map_err(|e| {
            log::error!("Failed to write saved session: {}", e);
            GameError::Save(SaveError::Io(e))
        })
    }

    /// Current state in its persisted form.
    pub fn snapshot(&self) -> SaveData {
        SaveData::capture(
            self.position,
            &self.trail,
            &self.inventory,
            self.world.store(),
        )
    }

    fn refresh_visible(&mut self) {
        let radius = self.world.config().visibility_radius;
        self.visible = self.world.compute_visible(self.position, radius);
    }

    pub fn position(&self) -> LatLon {
        self.position
    }

    pub fn trail(&self) -> &[LatLon] {
        &self.trail
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Caches in view at the current position, in identity order.
    pub fn visible(&self) -> &[Cache] {
        &self.visible
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    pub fn world(&self) -> &WorldBuilder<S> {
        &self.world
    }

    pub fn storage(&self) -> &St {
        &self.storage
    }

    /// Tokens held by the player plus tokens in every stored cache.
    /// Transfers never change this.
    pub fn total_tokens(&self) -> Result<usize, GameError> {
        Ok(self.inventory.len() + self.world.store().token_total()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn open() -> Game<MemoryStorage> {
        Game::open(WorldConfig::default(), MemoryStorage::new()).unwrap()
    }

    #[test]
    fn fresh_session_starts_at_origin() {
        let game = open();
        assert_eq!(game.load_status(), &LoadStatus::Fresh);
        assert_eq!(game.position(), WorldConfig::default().origin);
        assert!(game.trail().is_empty());
        assert!(game.inventory().is_empty());
        assert_eq!(game.visible().len(), 30);
    }

    #[test]
    fn step_moves_one_cell_and_saves() {
        let mut game = open();
        let start = game.world().cells().canonicalize(game.position().lat, game.position().lon);
        game.step(Direction::East).unwrap();
        let here = game.world().cells().canonicalize(game.position().lat, game.position().lon);
        assert_eq!(here, start.offset(0, 1));
        assert_eq!(game.trail().len(), 1);
        assert!(game.storage().contents().is_some());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = WorldConfig {
            cell_size: -1.0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            Game::open(config, MemoryStorage::new()),
            Err(GameError::Config(_))
        ));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "undiscovered cell"))]
    fn collect_unknown_cell_is_not_found() {
        let mut game = open();
        let err = game.collect(CellId::new(0, 0)).unwrap_err();
        assert!(matches!(err, GameError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn non_finite_position_is_rejected_untouched() {
        let mut game = open();
        game.step(Direction::North).unwrap();
        let position = game.position();
        let saved = game.storage().contents();

        for (lat, lon) in [(f64::NAN, -122.0), (36.0, f64::INFINITY)] {
            let err = game.on_position_changed(lat, lon).unwrap_err();
            assert!(matches!(err, GameError::InvalidPosition { .. }));
        }
        assert_eq!(game.position(), position);
        assert_eq!(game.trail().len(), 1);
        assert_eq!(game.storage().contents(), saved);
    }

    #[test]
    fn collect_updates_visible_and_store() {
        let mut game = open();
        let id = game.visible()[0].id();
        let before = game.visible()[0].len();
        let token = game.collect(id).unwrap().moved().unwrap();
        assert_eq!(token.home(), id);
        assert_eq!(game.visible()[0].len(), before - 1);
        assert_eq!(game.world().cache(id).unwrap().len(), before - 1);
        assert_eq!(game.inventory().top(), Some(&token));
    }

    #[test]
    fn declined_reset_changes_nothing() {
        let mut game = open();
        let id = game.visible()[0].id();
        game.collect(id).unwrap();
        assert!(!game.reset(|| false).unwrap());
        assert_eq!(game.inventory().len(), 1);
    }
}
