//! RustDock-Grid: grid-based AutoDock energies and torsional kinematics
//!
//! This library scores poses of a flexible ligand against precomputed
//! AutoDock 4 energy maps, and generates new poses by rotating rotatable
//! bonds and moving the ligand as a rigid body. Choosing which poses to try
//! is left to the caller's optimizer.

pub mod atom;
pub mod dock;
pub mod grid;
pub mod io;
pub mod kinematics;
pub mod math;
pub mod molecule;
pub mod scoring;

// Re-export commonly used types and functions
pub use atom::{Atom, AtomType};
pub use dock::{Dock, DockError, DockingParameters, PoseSnapshot};
pub use grid::{EnergyMap, Field, Grid, GridDimensions, MapKey};
pub use math::Rotation;
pub use molecule::{Branch, Ligand, Protein};
pub use scoring::EnergyReport;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type for docking session operations
pub type Result<T> = std::result::Result<T, DockError>;
