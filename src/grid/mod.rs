//! Precomputed potential-energy grids
//!
//! Every map in a [`Grid`] shares one [`Field`]: the same origin, spacing and
//! dimensions. Map values are stored z-major: the outermost axis is z (`w`),
//! then y (`v`), with x (`u`) varying fastest, so the flat index of node
//! `(u, v, w)` is `(w * ny + v) * nx + u`.

use crate::atom::{AtomError, AtomType};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with grids
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Invalid grid dimension: {0}")]
    InvalidDimension(String),

    #[error("Invalid grid spacing: {0}")]
    InvalidSpacing(f64),

    #[error("Map {key} has {actual} values, field needs {expected}")]
    MapSize {
        key: MapKey,
        expected: usize,
        actual: usize,
    },

    #[error("Point {position:?} is outside the grid interior")]
    OutOfBounds { position: Vector3<f64> },

    #[error("No energy map for key {0}")]
    MissingMap(MapKey),

    #[error("Invalid map key: {0}")]
    InvalidKey(#[from] AtomError),
}

/// Node counts along each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl GridDimensions {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    pub fn node_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Flat z-major index of node `(u, v, w)`
    #[inline]
    pub fn index(&self, u: usize, v: usize, w: usize) -> usize {
        (w * self.ny + v) * self.nx + u
    }
}

/// The spatial sampling domain shared by every map.
///
/// Always has at least two nodes per axis and a finite positive spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldData")]
pub struct Field {
    /// Position of node (0, 0, 0) in Angstroms
    lo: Vector3<f64>,

    /// Distance between neighbouring nodes in Angstroms
    spacing: f64,

    dimensions: GridDimensions,
}

#[derive(Deserialize)]
struct FieldData {
    lo: Vector3<f64>,
    spacing: f64,
    dimensions: GridDimensions,
}

impl TryFrom<FieldData> for Field {
    type Error = GridError;

    fn try_from(data: FieldData) -> Result<Self, Self::Error> {
        Field::new(data.lo, data.spacing, data.dimensions)
    }
}

impl Field {
    pub fn new(lo: Vector3<f64>, spacing: f64, dimensions: GridDimensions) -> Result<Self, GridError> {
        let field = Self {
            lo,
            spacing,
            dimensions,
        };
        field.validate()?;
        Ok(field)
    }

    fn validate(&self) -> Result<(), GridError> {
        let d = self.dimensions;
        // Interpolation needs a lower and an upper node on every axis
        if d.nx < 2 || d.ny < 2 || d.nz < 2 {
            return Err(GridError::InvalidDimension(format!("{:?}", d)));
        }
        if !(self.spacing > 0.0 && self.spacing.is_finite()) {
            return Err(GridError::InvalidSpacing(self.spacing));
        }
        Ok(())
    }

    pub fn lo(&self) -> Vector3<f64> {
        self.lo
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Convert real-space coordinates to fractional grid units `(u, v, w)`
    #[inline]
    pub fn to_grid_units(&self, position: &Vector3<f64>) -> Vector3<f64> {
        (position - self.lo) / self.spacing
    }

    /// Real-space position of node `(u, v, w)`
    pub fn node_position(&self, u: usize, v: usize, w: usize) -> Vector3<f64> {
        self.lo + Vector3::new(u as f64, v as f64, w as f64) * self.spacing
    }
}

/// Identifies one energy map in a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    Electrostatic,
    Desolvation,
    AtomType(AtomType),
}

impl MapKey {
    /// Parse the short tag used by map files: `e`, `d`, or an atom type
    pub fn from_tag(tag: &str) -> Result<Self, GridError> {
        match tag {
            "e" => Ok(MapKey::Electrostatic),
            "d" => Ok(MapKey::Desolvation),
            other => Ok(MapKey::AtomType(AtomType::from_pdbqt_string(other)?)),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            MapKey::Electrostatic => "e",
            MapKey::Desolvation => "d",
            MapKey::AtomType(atom_type) => atom_type.to_pdbqt_string(),
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.tag())
    }
}

/// A dense 3D array of energies laid out z-major
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyMap {
    dimensions: GridDimensions,
    values: Vec<f64>,
}

impl EnergyMap {
    /// Wrap flat z-major values
    pub fn from_values(dimensions: GridDimensions, values: Vec<f64>) -> Option<Self> {
        (values.len() == dimensions.node_count()).then_some(Self { dimensions, values })
    }

    /// Build a map from a function of node indices `(u, v, w)`
    pub fn from_fn<F>(dimensions: GridDimensions, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> f64,
    {
        let mut values = Vec::with_capacity(dimensions.node_count());
        for w in 0..dimensions.nz {
            for v in 0..dimensions.ny {
                for u in 0..dimensions.nx {
                    values.push(f(u, v, w));
                }
            }
        }
        Self { dimensions, values }
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at node `(u, v, w)`.
    ///
    /// Panics if the node lies outside the map.
    #[inline]
    pub fn value(&self, u: usize, v: usize, w: usize) -> f64 {
        self.values[self.dimensions.index(u, v, w)]
    }
}

/// Index of a map resolved once at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapSlot(usize);

/// A field together with every energy map sampled on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridData", into = "GridData")]
pub struct Grid {
    field: Field,
    maps: Vec<EnergyMap>,
    slots: HashMap<MapKey, MapSlot>,
}

impl Grid {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            maps: Vec::new(),
            slots: HashMap::new(),
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Add or replace a map; its dimensions must match the field
    pub fn insert_map(&mut self, key: MapKey, map: EnergyMap) -> Result<MapSlot, GridError> {
        if map.dimensions != self.field.dimensions {
            return Err(GridError::MapSize {
                key,
                expected: self.field.dimensions.node_count(),
                actual: map.values.len(),
            });
        }
        if let Some(&slot) = self.slots.get(&key) {
            self.maps[slot.0] = map;
            return Ok(slot);
        }
        let slot = MapSlot(self.maps.len());
        self.maps.push(map);
        self.slots.insert(key, slot);
        Ok(slot)
    }

    /// Add a map from flat z-major values
    pub fn insert_values(&mut self, key: MapKey, values: Vec<f64>) -> Result<MapSlot, GridError> {
        let expected = self.field.dimensions.node_count();
        let actual = values.len();
        let map = EnergyMap::from_values(self.field.dimensions, values).ok_or(GridError::MapSize {
            key,
            expected,
            actual,
        })?;
        self.insert_map(key, map)
    }

    pub fn slot(&self, key: MapKey) -> Result<MapSlot, GridError> {
        self.slots.get(&key).copied().ok_or(GridError::MissingMap(key))
    }

    pub fn map(&self, key: MapKey) -> Result<&EnergyMap, GridError> {
        Ok(self.map_at(self.slot(key)?))
    }

    /// Map behind a slot obtained from this grid
    #[inline]
    pub fn map_at(&self, slot: MapSlot) -> &EnergyMap {
        &self.maps[slot.0]
    }

}

/// Serialized form of a [`Grid`]: map values keyed by tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridData {
    pub field: Field,
    pub maps: BTreeMap<String, Vec<f64>>,
}

impl TryFrom<GridData> for Grid {
    type Error = GridError;

    fn try_from(data: GridData) -> Result<Self, Self::Error> {
        let mut grid = Grid::new(data.field);
        for (tag, values) in data.maps {
            grid.insert_values(MapKey::from_tag(&tag)?, values)?;
        }
        Ok(grid)
    }
}

impl From<Grid> for GridData {
    fn from(grid: Grid) -> Self {
        let mut maps = BTreeMap::new();
        let mut maps_by_slot: Vec<Option<EnergyMap>> = grid.maps.into_iter().map(Some).collect();
        for (key, slot) in grid.slots {
            if let Some(map) = maps_by_slot[slot.0].take() {
                maps.insert(key.tag().to_string(), map.values);
            }
        }
        Self {
            field: grid.field,
            maps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Field {
        Field::new(Vector3::new(-1.0, 0.0, 2.0), 0.5, GridDimensions::new(4, 3, 2)).unwrap()
    }

    #[test]
    fn test_field_validation() {
        let dims = GridDimensions::new(4, 4, 4);
        assert!(Field::new(Vector3::zeros(), 0.375, dims).is_ok());
        assert_eq!(
            Field::new(Vector3::zeros(), 0.0, dims),
            Err(GridError::InvalidSpacing(0.0))
        );
        assert!(matches!(
            Field::new(Vector3::zeros(), 0.375, GridDimensions::new(4, 1, 4)),
            Err(GridError::InvalidDimension(_))
        ));
    }

    #[test]
    fn test_grid_units_and_node_positions() {
        let field = field();
        let p = field.node_position(3, 2, 1);
        assert_eq!(p, Vector3::new(0.5, 1.0, 2.5));
        assert_eq!(field.to_grid_units(&p), Vector3::new(3.0, 2.0, 1.0));
    }

    #[test]
    fn test_z_major_layout() {
        let dims = GridDimensions::new(4, 3, 2);
        let map = EnergyMap::from_fn(dims, |u, v, w| (100 * w + 10 * v + u) as f64);

        // x varies fastest
        assert_eq!(&map.values()[..4], &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(map.values()[dims.index(0, 1, 0)], 10.0);
        assert_eq!(map.values()[dims.index(0, 0, 1)], 100.0);
        assert_eq!(map.value(3, 2, 1), 123.0);
    }

    #[test]
    fn test_invalid_field_json_is_rejected() {
        let valid = r#"{"lo": [0.0, 0.0, 0.0], "spacing": 0.5, "dimensions": {"nx": 4, "ny": 4, "nz": 4}}"#;
        let field: Field = serde_json::from_str(valid).unwrap();
        assert_eq!(field.dimensions(), GridDimensions::new(4, 4, 4));

        let empty_axis = valid.replace("\"nx\": 4", "\"nx\": 0");
        assert!(matches!(
            serde_json::from_str::<Field>(&empty_axis),
            Err(e) if e.to_string().contains("Invalid grid dimension")
        ));

        let grid = format!(r#"{{"field": {}, "maps": {{}}}}"#, empty_axis);
        assert!(serde_json::from_str::<Grid>(&grid).is_err());

        let flat = valid.replace("0.5", "-0.5");
        assert!(serde_json::from_str::<Field>(&flat).is_err());
    }

    #[test]
    fn test_map_keys() {
        assert_eq!(MapKey::from_tag("e"), Ok(MapKey::Electrostatic));
        assert_eq!(MapKey::from_tag("d"), Ok(MapKey::Desolvation));
        assert_eq!(
            MapKey::from_tag("OA"),
            Ok(MapKey::AtomType(AtomType::OxygenH))
        );
        assert!(MapKey::from_tag("??").is_err());
        assert_eq!(MapKey::AtomType(AtomType::Aromatic).to_string(), "A");
    }

    #[test]
    fn test_insert_and_resolve_maps() {
        let field = field();
        let mut grid = Grid::new(field);
        let slot = grid
            .insert_values(MapKey::Electrostatic, vec![1.5; 24])
            .unwrap();
        assert_eq!(grid.slot(MapKey::Electrostatic), Ok(slot));
        assert_eq!(grid.map_at(slot).value(0, 0, 0), 1.5);

        // Replacing keeps the slot
        let again = grid
            .insert_values(MapKey::Electrostatic, vec![2.5; 24])
            .unwrap();
        assert_eq!(again, slot);
        assert_eq!(grid.map(MapKey::Electrostatic).unwrap().value(1, 1, 1), 2.5);

        assert_eq!(
            grid.insert_values(MapKey::Desolvation, vec![0.0; 5]),
            Err(GridError::MapSize {
                key: MapKey::Desolvation,
                expected: 24,
                actual: 5
            })
        );
        assert_eq!(
            grid.slot(MapKey::Desolvation),
            Err(GridError::MissingMap(MapKey::Desolvation))
        );
    }

    #[test]
    fn test_grid_json() {
        let mut grid = Grid::new(field());
        grid.insert_values(MapKey::Electrostatic, (0..24).map(f64::from).collect())
            .unwrap();
        grid.insert_values(MapKey::AtomType(AtomType::Carbon), vec![-0.25; 24])
            .unwrap();

        let json = serde_json::to_string(&grid).unwrap();
        assert!(json.contains("\"e\""));
        assert!(json.contains("\"C\""));

        let parsed: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.field(), grid.field());
        assert_eq!(
            parsed.map(MapKey::Electrostatic).unwrap(),
            grid.map(MapKey::Electrostatic).unwrap()
        );
        assert!(parsed.slot(MapKey::AtomType(AtomType::Carbon)).is_ok());
    }
}
