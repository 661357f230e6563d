//! A docking session: one ligand, one receptor, one grid

use crate::grid::Grid;
use crate::kinematics::{self, BranchOrder, KinematicsError, TaggedBranch};
use crate::math::Rotation;
use crate::molecule::{Ligand, MoleculeError, Protein};
use crate::scoring::{self, EnergyReport, ResolvedMaps, ScoringError, ScoringMode};
use log::{debug, info};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by a docking session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DockError {
    #[error("Invalid ligand: {0}")]
    Ligand(#[source] MoleculeError),

    #[error("Invalid flexible receptor: {0}")]
    Protein(#[source] MoleculeError),

    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Snapshot does not match the session: {0}")]
    Snapshot(#[source] MoleculeError),
}

/// Docking parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockingParameters {
    /// Score atoms in parallel with rayon
    pub parallel_scoring: bool,

    /// Smallest atom count for which parallel scoring is used
    pub parallel_threshold: usize,
}

impl Default for DockingParameters {
    fn default() -> Self {
        Self {
            parallel_scoring: false,
            parallel_threshold: 256,
        }
    }
}

impl DockingParameters {
    fn scoring_mode(&self, atom_count: usize) -> ScoringMode {
        if self.parallel_scoring && atom_count >= self.parallel_threshold {
            ScoringMode::Parallel
        } else {
            ScoringMode::Sequential
        }
    }
}

/// Coordinates of every movable atom, for rolling back a pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    pub ligand: Vec<Vector3<f64>>,
    pub protein: Vec<Vector3<f64>>,
}

/// The docking session.
///
/// Construction validates both molecules, resolves the energy maps every
/// ligand atom needs, and fixes the branch rotation order for the lifetime
/// of the session.
#[derive(Debug, Clone)]
pub struct Dock {
    ligand: Ligand,
    protein: Protein,
    grid: Grid,
    params: DockingParameters,
    sorted_branches: BranchOrder,
    maps: ResolvedMaps,
    energies: EnergyReport,
}

impl Dock {
    pub fn new(
        ligand: Ligand,
        protein: Protein,
        grid: Grid,
        params: DockingParameters,
    ) -> Result<Self, DockError> {
        ligand.validate().map_err(DockError::Ligand)?;
        protein.validate().map_err(DockError::Protein)?;

        let maps = ResolvedMaps::resolve(&grid, &ligand)?;
        let sorted_branches = BranchOrder::build(&ligand, &protein)?;

        info!(
            "Docking session: {} ligand atoms, {} flexible receptor atoms, {} rotatable bonds",
            ligand.atoms.len(),
            protein.flex_atoms.len(),
            sorted_branches.len()
        );

        Ok(Self {
            ligand,
            protein,
            grid,
            params,
            sorted_branches,
            maps,
            energies: EnergyReport::default(),
        })
    }

    pub fn ligand(&self) -> &Ligand {
        &self.ligand
    }

    pub fn protein(&self) -> &Protein {
        &self.protein
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> &DockingParameters {
        &self.params
    }

    /// Rotatable bonds in the order torsion angles are applied
    pub fn sorted_branches(&self) -> impl Iterator<Item = &TaggedBranch> {
        self.sorted_branches.iter()
    }

    /// Number of torsion angles `rotate_branches` expects
    pub fn torsion_count(&self) -> usize {
        self.sorted_branches.len()
    }

    /// Rotate every ligand and receptor branch, one angle (radians) per
    /// entry of `sorted_branches`.
    pub fn rotate_branches(&mut self, rotations: &[f64]) -> Result<(), DockError> {
        kinematics::rotate_branches(
            &self.sorted_branches,
            &mut self.ligand,
            &mut self.protein,
            rotations,
        )?;
        Ok(())
    }

    /// Place the whole ligand: rotate about its `about` point, which then
    /// lands on `translation`
    pub fn transform_ligand_root(&mut self, translation: &Vector3<f64>, rotation: &Rotation) {
        kinematics::transform_ligand_root(&mut self.ligand, translation, rotation);
    }

    /// Score the current pose, replacing the previous energies
    pub fn calc_energy(&mut self) -> Result<&EnergyReport, DockError> {
        let atom_count = self.ligand.atoms.len() + self.protein.flex_atoms.len();
        let mode = self.params.scoring_mode(atom_count);

        self.energies = scoring::score(&self.grid, &self.maps, &self.ligand, &self.protein, mode)?;
        debug!(
            "Pose energy: elec {:.4}, emap {:.4}",
            self.energies.elec_total, self.energies.emap_total
        );
        Ok(&self.energies)
    }

    /// Energies from the last `calc_energy` call
    pub fn energies(&self) -> &EnergyReport {
        &self.energies
    }

    pub fn snapshot(&self) -> PoseSnapshot {
        PoseSnapshot {
            ligand: self.ligand.atom_coordinates(),
            protein: self.protein.atom_coordinates(),
        }
    }

    /// Put every movable atom back where `snapshot` recorded it
    pub fn restore(&mut self, snapshot: &PoseSnapshot) -> Result<(), DockError> {
        if snapshot.protein.len() != self.protein.flex_atoms.len() {
            return Err(DockError::Snapshot(MoleculeError::CoordinateCount {
                expected: self.protein.flex_atoms.len(),
                actual: snapshot.protein.len(),
            }));
        }
        self.ligand
            .set_atom_coordinates(&snapshot.ligand)
            .map_err(DockError::Snapshot)?;
        self.protein
            .set_atom_coordinates(&snapshot.protein)
            .map_err(DockError::Snapshot)?;
        Ok(())
    }

    /// Per-atom listing of the last computed energies
    pub fn energy_table(&self) -> EnergyTable<'_> {
        EnergyTable { dock: self }
    }
}

/// Tabular view of a session's per-atom energies
pub struct EnergyTable<'a> {
    dock: &'a Dock,
}

impl fmt::Display for EnergyTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let energies = &self.dock.energies;
        for (i, atom) in self.dock.ligand.atoms.iter().enumerate() {
            let c = atom.coordinates;
            write!(
                f,
                "{:>2}: {:>2} - {:8.3}, {:8.3}, {:8.3}",
                i + 1,
                atom.atom_type,
                c.x,
                c.y,
                c.z
            )?;
            match (energies.emaps.get(i), energies.elecs.get(i)) {
                (Some(emap), Some(elec)) => writeln!(f, " | {:+7.2} | {:+7.2}", emap, elec)?,
                _ => writeln!(f)?,
            }
        }
        for (i, atom) in self.dock.protein.flex_atoms.iter().enumerate() {
            let c = atom.coordinates;
            write!(
                f,
                "{:>2}: {:>2} - {:8.3}, {:8.3}, {:8.3}",
                atom.id, atom.atom_type, c.x, c.y, c.z
            )?;
            match (
                energies.flex_desolv_samples.get(i),
                energies.flex_elec_samples.get(i),
            ) {
                (Some(d), Some(e)) => writeln!(f, " | d {:+7.2} | e {:+7.2}", d, e)?,
                _ => writeln!(f)?,
            }
        }
        writeln!(
            f,
            "Total: emap {:+.4} | elec {:+.4}",
            energies.emap_total, energies.elec_total
        )
    }
}
