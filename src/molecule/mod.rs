//! Ligand and flexible receptor representations

use crate::atom::Atom;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur when validating molecules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("Ligand atom at position {index} has id {id}, expected {expected}")]
    NonContiguousId { index: usize, id: u32, expected: u32 },

    #[error("Duplicate atom id {0}")]
    DuplicateId(u32),

    #[error("Branch {anchor}-{link} references missing atom {id}")]
    MissingAtom { anchor: u32, link: u32, id: u32 },

    #[error("Branch {anchor}-{link} lists its own bond atom {id} as movable")]
    BondAtomInBranch { anchor: u32, link: u32, id: u32 },

    #[error("Expected {expected} coordinates, got {actual}")]
    CoordinateCount { expected: usize, actual: usize },
}

/// A rotatable bond and the atoms downstream of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Atom at the fixed end of the bond
    pub anchor_id: u32,

    /// Atom at the rotating end of the bond, the rotation pivot
    pub link_id: u32,

    /// Atoms that move with the bond, excluding anchor and link
    pub atom_ids: Vec<u32>,
}

impl Branch {
    pub fn new(anchor_id: u32, link_id: u32, atom_ids: Vec<u32>) -> Self {
        Self {
            anchor_id,
            link_id,
            atom_ids,
        }
    }

    /// Number of atoms moved by this bond
    pub fn len(&self) -> usize {
        self.atom_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atom_ids.is_empty()
    }

    /// Check the branch against the ids present in its molecule
    fn validate(&self, ids: &HashSet<u32>) -> Result<(), MoleculeError> {
        let (anchor, link) = (self.anchor_id, self.link_id);
        for &id in [anchor, link].iter().chain(&self.atom_ids) {
            if !ids.contains(&id) {
                return Err(MoleculeError::MissingAtom { anchor, link, id });
            }
        }
        if let Some(&id) = self
            .atom_ids
            .iter()
            .find(|&&id| id == anchor || id == link)
        {
            return Err(MoleculeError::BondAtomInBranch { anchor, link, id });
        }
        Ok(())
    }
}

/// Uniform access to a molecule's mutable atom store.
///
/// Kinematics uses this to rotate ligand and receptor branches through the
/// same code path.
pub trait AtomStore {
    fn atoms(&self) -> &[Atom];

    fn atoms_mut(&mut self) -> &mut [Atom];
}

fn validate_branches(atoms: &[Atom], branches: &[Branch]) -> Result<(), MoleculeError> {
    let mut ids = HashSet::with_capacity(atoms.len());
    for atom in atoms {
        if !ids.insert(atom.id) {
            return Err(MoleculeError::DuplicateId(atom.id));
        }
    }
    branches.iter().try_for_each(|branch| branch.validate(&ids))
}

fn origin() -> Vector3<f64> {
    Vector3::zeros()
}

/// The movable molecule being docked
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ligand {
    /// Atoms, where the atom at index i has id i + 1
    pub atoms: Vec<Atom>,

    /// Rotatable bonds, in file order
    #[serde(default)]
    pub branches: Vec<Branch>,

    /// Central point the whole body rotates about
    #[serde(default = "origin")]
    pub about: Vector3<f64>,
}

impl Ligand {
    pub fn new(atoms: Vec<Atom>, branches: Vec<Branch>, about: Vector3<f64>) -> Self {
        Self {
            atoms,
            branches,
            about,
        }
    }

    /// Check id contiguity and branch integrity
    pub fn validate(&self) -> Result<(), MoleculeError> {
        for (index, atom) in self.atoms.iter().enumerate() {
            let expected = index as u32 + 1;
            if atom.id != expected {
                return Err(MoleculeError::NonContiguousId {
                    index,
                    id: atom.id,
                    expected,
                });
            }
        }
        validate_branches(&self.atoms, &self.branches)
    }

    pub fn atom_coordinates(&self) -> Vec<Vector3<f64>> {
        self.atoms.iter().map(|atom| atom.coordinates).collect()
    }

    /// Overwrite every atom coordinate, in atom order
    pub fn set_atom_coordinates(&mut self, coordinates: &[Vector3<f64>]) -> Result<(), MoleculeError> {
        set_coordinates(&mut self.atoms, coordinates)
    }
}

impl AtomStore for Ligand {
    fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }
}

/// The flexible side chains of the receptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Protein {
    #[serde(default)]
    pub flex_atoms: Vec<Atom>,

    #[serde(default)]
    pub flex_branches: Vec<Branch>,
}

impl Protein {
    pub fn new(flex_atoms: Vec<Atom>, flex_branches: Vec<Branch>) -> Self {
        Self {
            flex_atoms,
            flex_branches,
        }
    }

    /// A receptor with no flexible residues
    pub fn rigid() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), MoleculeError> {
        validate_branches(&self.flex_atoms, &self.flex_branches)
    }

    pub fn atom_coordinates(&self) -> Vec<Vector3<f64>> {
        self.flex_atoms.iter().map(|atom| atom.coordinates).collect()
    }

    pub fn set_atom_coordinates(&mut self, coordinates: &[Vector3<f64>]) -> Result<(), MoleculeError> {
        set_coordinates(&mut self.flex_atoms, coordinates)
    }
}

impl AtomStore for Protein {
    fn atoms(&self) -> &[Atom] {
        &self.flex_atoms
    }

    fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.flex_atoms
    }
}

fn set_coordinates(atoms: &mut [Atom], coordinates: &[Vector3<f64>]) -> Result<(), MoleculeError> {
    if atoms.len() != coordinates.len() {
        return Err(MoleculeError::CoordinateCount {
            expected: atoms.len(),
            actual: coordinates.len(),
        });
    }
    for (atom, coordinate) in atoms.iter_mut().zip(coordinates) {
        atom.coordinates = *coordinate;
    }
    Ok(())
}
