//! Geographic cells — coordinate canonicalization and the flyweight Cell Index.
//!
//! Identity is always the integer pair `(i, j)`; raw floating-point
//! coordinates are never used as keys.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Same point shifted by whole degrees.
    pub fn offset(&self, dlat: f64, dlon: f64) -> Self {
        Self::new(self.lat + dlat, self.lon + dlon)
    }
}

/// Discrete cell identity: coordinates floor-divided by the cell size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    pub i: i32,
    pub j: i32,
}

impl CellId {
    pub fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// Identity of the cell containing `(lat, lon)`.
    pub fn from_coords(lat: f64, lon: f64, cell_size: f64) -> Self {
        Self {
            i: (lat / cell_size).floor() as i32,
            j: (lon / cell_size).floor() as i32,
        }
    }

    /// Neighbouring identity; saturates at the edges of the `i32` grid.
    pub fn offset(&self, di: i32, dj: i32) -> Self {
        Self::new(self.i.saturating_add(di), self.j.saturating_add(dj))
    }

    /// South-west corner of this cell.
    pub fn corner(&self, cell_size: f64) -> LatLon {
        LatLon::new(self.i as f64 * cell_size, self.j as f64 * cell_size)
    }
}

/// Store key form: `"{i},{j}"`.
impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.i, self.j)
    }
}

/// Malformed `"{i},{j}"` key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cell key {0:?}")]
pub struct ParseCellIdError(pub String);

impl FromStr for CellId {
    type Err = ParseCellIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseCellIdError(s.to_string());
        let (i, j) = s.split_once(',').ok_or_else(bad)?;
        Ok(Self {
            i: i.trim().parse().map_err(|_| bad())?,
            j: j.trim().parse().map_err(|_| bad())?,
        })
    }
}

/// Canonical anchor record for one cell identity. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub i: i32,
    pub j: i32,
    pub anchor: LatLon,
}

impl Cell {
    pub fn id(&self) -> CellId {
        CellId::new(self.i, self.j)
    }

    /// South-west and north-east corners, for drawing the cell's rectangle.
    pub fn bounds(&self, cell_size: f64) -> (LatLon, LatLon) {
        let sw = self.id().corner(cell_size);
        (sw, sw.offset(cell_size, cell_size))
    }
}

/// Flyweight table: exactly one `Cell` record per identity.
///
/// Owned by the world builder rather than living in a global, so every test
/// gets a fresh index.
#[derive(Debug)]
pub struct CellIndex {
    cell_size: f64,
    cells: HashMap<CellId, Rc<Cell>>,
}

impl CellIndex {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Floor-divide a coordinate pair into its cell identity.
    pub fn canonicalize(&self, lat: f64, lon: f64) -> CellId {
        CellId::from_coords(lat, lon, self.cell_size)
    }

    /// Canonical cell containing `point`, anchored at `point` if this is the
    /// first time the identity is seen.
    pub fn cell_at(&mut self, point: LatLon) -> Rc<Cell> {
        let id = self.canonicalize(point.lat, point.lon);
        self.intern(id, point)
    }

    /// Canonical cell for `id`, anchored at its south-west corner if new.
    pub fn resolve(&mut self, id: CellId) -> Rc<Cell> {
        let corner = id.corner(self.cell_size);
        self.intern(id, corner)
    }

    /// Whether a record exists for `id`.
    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn intern(&mut self, id: CellId, anchor: LatLon) -> Rc<Cell> {
        self.cells
            .entry(id)
            .or_insert_with(|| {
                Rc::new(Cell {
                    i: id.i,
                    j: id.j,
                    anchor,
                })
            })
            .clone()
    }
}
