//! Grid-based intermolecular energy of a pose

pub mod energy;
pub mod interpolation;

pub use energy::{score, EnergyReport, ResolvedMaps, ScoringMode};
pub use interpolation::CellSample;

use crate::grid::{GridError, MapKey};
use thiserror::Error;

/// Errors that can occur while scoring a pose
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("No energy map {key} for ligand atom {atom_id}")]
    MissingMap { atom_id: u32, key: MapKey },

    #[error("Ligand atom {id} is outside the grid: {source}")]
    LigandAtomOutside { id: u32, source: GridError },

    #[error("Flexible receptor atom {id} is outside the grid: {source}")]
    FlexAtomOutside { id: u32, source: GridError },

    #[error("Maps were resolved for {resolved} ligand atoms, ligand has {atoms}")]
    StaleMaps { resolved: usize, atoms: usize },
}
