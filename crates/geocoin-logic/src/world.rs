//! World View Builder — turns a player position into the caches around it.
//!
//! Cells already in the store are restored unconditionally; the existence
//! roll is permanent once a cache has been minted. Cells that fail the roll
//! are not recorded at all, since the deterministic sampler reproduces the
//! same failure for free next time.

use crate::cache::{Cache, CacheStore, StoreError};
use crate::cells::{CellId, CellIndex, LatLon};
use crate::config::WorldConfig;
use crate::luck::{self, HashSampler, Sampler};

/// Owns the procedural world: sampler, cell index, and cache store.
#[derive(Debug)]
pub struct WorldBuilder<S = HashSampler> {
    config: WorldConfig,
    sampler: S,
    cells: CellIndex,
    store: CacheStore,
}

impl WorldBuilder<HashSampler> {
    pub fn new(config: WorldConfig) -> Self {
        Self::with_sampler(config, HashSampler)
    }
}

impl<S: Sampler> WorldBuilder<S> {
    pub fn with_sampler(config: WorldConfig, sampler: S) -> Self {
        Self {
            cells: CellIndex::new(config.cell_size),
            config,
            sampler,
            store: CacheStore::new(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn cells(&self) -> &CellIndex {
        &self.cells
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CacheStore {
        &mut self.store
    }

    /// Identities in the square window of half-width `radius` around
    /// `center`, in ascending order. Corners are included.
    pub fn window(&self, center: LatLon, radius: i32) -> Vec<CellId> {
        let origin = self.cells.canonicalize(center.lat, center.lon);
        let radius = radius.max(0);
        (-radius..=radius)
            .flat_map(|di| (-radius..=radius).map(move |dj| origin.offset(di, dj)))
            .collect()
    }

    /// Caches visible from `center`, minting any newly discovered ones.
    ///
    /// Idempotent: with an unchanged center and store, a second call returns
    /// the same caches and leaves the store byte-identical.
    pub fn compute_visible(&mut self, center: LatLon, radius: i32) -> Vec<Cache> {
        self.window(center, radius)
            .into_iter()
            .filter_map(|id| self.discover(id))
            .collect()
    }

    /// Cache at `id`, restored from the store or minted on first discovery.
    /// `None` when no cache exists there.
    pub fn discover(&mut self, id: CellId) -> Option<Cache> {
        if self.store.has(id) {
            return match self.store.get(id) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    log::error!("Skipping unreadable cache {}: {}", id, e);
                    None
                }
            };
        }

        if !luck::spawns(&self.sampler, id, self.config.spawn_probability) {
            return None;
        }

        let cell = self.cells.resolve(id);
        let count = luck::token_count(&self.sampler, id, self.config.max_tokens);
        let cache = Cache::mint(*cell, count);
        self.store.put(&cache);
        log::debug!("Minted cache {} with {} tokens", id, count);
        Some(cache)
    }

    /// Restore a previously discovered cache.
    pub fn cache(&self, id: CellId) -> Result<Cache, StoreError> {
        self.store.get(id)
    }

    /// Write a mutated cache back to the store.
    pub fn store_cache(&mut self, cache: &Cache) {
        self.store.put(cache);
    }

    /// Forget every minted cache. Cell records are kept; they are pure
    /// memoization of geography.
    pub fn reset(&mut self) {
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Seed table: listed keys get their value, everything else never spawns.
    struct Table(HashMap<String, f64>);

    impl Sampler for Table {
        fn sample(&self, key: &str) -> f64 {
            self.0.get(key).copied().unwrap_or(0.99)
        }
    }

    fn config() -> WorldConfig {
        WorldConfig {
            cell_size: 1.0,
            origin: LatLon::new(0.5, 0.5),
            ..WorldConfig::default()
        }
    }

    fn table(entries: &[(&str, f64)]) -> Table {
        Table(entries.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    #[test]
    fn window_is_square_with_corners() {
        let world = WorldBuilder::new(config());
        let ids = world.window(LatLon::new(0.5, 0.5), 1);
        assert_eq!(ids.len(), 9);
        assert!(ids.contains(&CellId::new(-1, -1)));
        assert!(ids.contains(&CellId::new(1, 1)));
        assert_eq!(world.window(LatLon::new(0.5, 0.5), 0), [CellId::new(0, 0)]);
    }

    #[test]
    fn only_spawning_cells_are_minted() {
        let sampler = table(&[("1,1", 0.05), ("1,1-coins", 0.25), ("-2,0", 0.5)]);
        let mut world = WorldBuilder::with_sampler(config(), sampler);
        let visible = world.compute_visible(LatLon::new(0.5, 0.5), 2);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id(), CellId::new(1, 1));
        assert_eq!(visible[0].len(), 3);
        assert_eq!(world.store().len(), 1);
    }

    #[test]
    fn stored_cache_is_never_rerolled() {
        let sampler = table(&[("0,0", 0.0), ("0,0-coins", 0.0)]);
        let mut world = WorldBuilder::with_sampler(config(), sampler);
        let mut cache = world.discover(CellId::new(0, 0)).unwrap();
        cache.tokens.clear();
        world.store_cache(&cache);
        let again = world.compute_visible(LatLon::new(0.5, 0.5), 0);
        assert_eq!(again.len(), 1);
        assert!(again[0].is_empty());
        assert_eq!(again[0].minted, 1);
    }

    #[test]
    fn missing_cache_lookup_is_not_found() {
        let world = WorldBuilder::new(config());
        assert!(matches!(
            world.cache(CellId::new(40, 40)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn reset_clears_store() {
        let sampler = table(&[("0,0", 0.0)]);
        let mut world = WorldBuilder::with_sampler(config(), sampler);
        world.compute_visible(LatLon::new(0.5, 0.5), 1);
        assert_eq!(world.store().len(), 1);
        world.reset();
        assert!(world.store().is_empty());
    }
}
