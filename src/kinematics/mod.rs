//! Torsional and whole-body motion of ligand and receptor atoms

use crate::atom::Atom;
use crate::math::{transform, MathError, Rotation};
use crate::molecule::{AtomStore, Branch, Ligand, Protein};
use log::debug;
use nalgebra::Vector3;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur while moving atoms
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    #[error("Expected {expected} torsion angles, got {actual}")]
    AngleCountMismatch { expected: usize, actual: usize },

    #[error("{molecule:?} branch {anchor}-{link} references missing atom {id}")]
    MissingAtom {
        molecule: MoleculeTag,
        anchor: u32,
        link: u32,
        id: u32,
    },

    #[error("Degenerate rotation axis for branch {anchor}-{link}: {source}")]
    DegenerateBond {
        anchor: u32,
        link: u32,
        source: MathError,
    },
}

/// Which molecule's atom store a branch indexes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoleculeTag {
    Ligand,
    Protein,
}

impl MoleculeTag {
    fn store<'a>(&self, ligand: &'a mut Ligand, protein: &'a mut Protein) -> &'a mut dyn AtomStore {
        match self {
            MoleculeTag::Ligand => ligand,
            MoleculeTag::Protein => protein,
        }
    }
}

/// A branch together with the molecule it belongs to, with its atoms
/// resolved to positions in that molecule's atom store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedBranch {
    pub molecule: MoleculeTag,
    pub branch: Branch,
    anchor: usize,
    link: usize,
    movable: Vec<usize>,
}

impl TaggedBranch {
    /// Resolve every atom of `branch` against `index`, the id to position
    /// map of the owning molecule
    fn resolve(
        molecule: MoleculeTag,
        branch: &Branch,
        index: &HashMap<u32, usize>,
    ) -> Result<Self, KinematicsError> {
        let position = |id: u32| {
            index.get(&id).copied().ok_or(KinematicsError::MissingAtom {
                molecule,
                anchor: branch.anchor_id,
                link: branch.link_id,
                id,
            })
        };

        Ok(Self {
            molecule,
            anchor: position(branch.anchor_id)?,
            link: position(branch.link_id)?,
            movable: branch
                .atom_ids
                .iter()
                .map(|&id| position(id))
                .collect::<Result<_, _>>()?,
            branch: branch.clone(),
        })
    }
}

fn id_index(atoms: &[Atom]) -> HashMap<u32, usize> {
    atoms
        .iter()
        .enumerate()
        .map(|(position, atom)| (atom.id, position))
        .collect()
}

/// Every rotatable branch of a docking session, innermost subtrees first.
///
/// Branches are ordered by ascending number of downstream atoms. A subtree
/// is always smaller than the subtree that contains it, so every branch is
/// rotated after all the branches nested inside it, and each rotation moves
/// atoms whose coordinates already carry the deeper torsions. Ties keep
/// ligand-then-protein file order; tied branches never share movable atoms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchOrder {
    branches: Vec<TaggedBranch>,
}

impl BranchOrder {
    /// Collect, resolve and sort the branches of both molecules
    pub fn build(ligand: &Ligand, protein: &Protein) -> Result<Self, KinematicsError> {
        let ligand_index = id_index(&ligand.atoms);
        let protein_index = id_index(&protein.flex_atoms);

        let mut branches = ligand
            .branches
            .iter()
            .map(|branch| TaggedBranch::resolve(MoleculeTag::Ligand, branch, &ligand_index))
            .chain(protein.flex_branches.iter().map(|branch| {
                TaggedBranch::resolve(MoleculeTag::Protein, branch, &protein_index)
            }))
            .collect::<Result<Vec<_>, _>>()?;
        branches.sort_by_key(|tagged| tagged.branch.len());

        debug!(
            "Built branch order: {} ligand and {} receptor branches",
            ligand.branches.len(),
            protein.flex_branches.len()
        );
        Ok(Self { branches })
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaggedBranch> {
        self.branches.iter()
    }
}

/// Rotate one resolved branch of `store` by `angle` radians about its bond.
///
/// Fails if `store` no longer holds the atoms the branch was resolved
/// against.
pub fn rotate_branch(
    store: &mut dyn AtomStore,
    tagged: &TaggedBranch,
    angle: f64,
) -> Result<(), KinematicsError> {
    let branch = &tagged.branch;
    let (anchor, link) = (branch.anchor_id, branch.link_id);
    let atoms = store.atoms_mut();
    let coordinates = |position: usize, id: u32| {
        atoms
            .get(position)
            .filter(|atom| atom.id == id)
            .map(|atom| atom.coordinates)
            .ok_or(KinematicsError::MissingAtom {
                molecule: tagged.molecule,
                anchor,
                link,
                id,
            })
    };

    let anchor_coord = coordinates(tagged.anchor, anchor)?;
    let link_coord = coordinates(tagged.link, link)?;
    let coords = tagged
        .movable
        .iter()
        .zip(&branch.atom_ids)
        .map(|(&position, &id)| coordinates(position, id))
        .collect::<Result<Vec<_>, _>>()?;

    let rotation = Rotation::from_angle_axis(angle, &(anchor_coord - link_coord))
        .map_err(|source| KinematicsError::DegenerateBond {
            anchor,
            link,
            source,
        })?;

    for (&position, coord) in tagged.movable.iter().zip(transform(&link_coord, &rotation, &coords)) {
        atoms[position].coordinates = coord;
    }
    Ok(())
}

/// Apply one torsion angle per branch, in branch order.
///
/// `angles[i]` rotates the i-th branch of `order`. On error the atoms may be
/// left partly rotated.
pub fn rotate_branches(
    order: &BranchOrder,
    ligand: &mut Ligand,
    protein: &mut Protein,
    angles: &[f64],
) -> Result<(), KinematicsError> {
    if angles.len() != order.len() {
        return Err(KinematicsError::AngleCountMismatch {
            expected: order.len(),
            actual: angles.len(),
        });
    }

    for (tagged, &angle) in order.iter().zip(angles) {
        let store = tagged.molecule.store(ligand, protein);
        rotate_branch(store, tagged, angle)?;
    }
    Ok(())
}

/// Place the whole ligand: rotate every atom about `ligand.about`, then
/// move it so that the `about` point lands on `translation`. Receptor atoms
/// are untouched.
pub fn transform_ligand_root(ligand: &mut Ligand, translation: &Vector3<f64>, rotation: &Rotation) {
    let about = ligand.about;
    for atom in ligand.atoms.iter_mut() {
        atom.coordinates = rotation.rotate(&(atom.coordinates - about)) + translation;
    }
}
