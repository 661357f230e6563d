//! Per-atom and total grid energies

use super::interpolation::CellSample;
use super::ScoringError;
use crate::atom::Atom;
use crate::grid::{Grid, MapKey, MapSlot};
use crate::molecule::{Ligand, Protein};
use log::trace;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How the per-atom loop is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    Sequential,
    Parallel,
}

/// Map slots resolved once per ligand, so scoring never looks up keys
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMaps {
    electrostatic: MapSlot,
    desolvation: MapSlot,
    atom_types: Vec<MapSlot>,
}

impl ResolvedMaps {
    /// Resolve the electrostatic and desolvation maps and one atom-type map
    /// per ligand atom.
    pub fn resolve(grid: &Grid, ligand: &Ligand) -> Result<Self, ScoringError> {
        let electrostatic = grid.slot(MapKey::Electrostatic)?;
        let desolvation = grid.slot(MapKey::Desolvation)?;
        let atom_types = ligand
            .atoms
            .iter()
            .map(|atom| {
                let key = MapKey::AtomType(atom.atom_type);
                grid.slot(key).map_err(|_| ScoringError::MissingMap { atom_id: atom.id, key })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            electrostatic,
            desolvation,
            atom_types,
        })
    }

    pub fn ligand_atom_count(&self) -> usize {
        self.atom_types.len()
    }
}

/// Energies of the current pose
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyReport {
    /// Electrostatic energy of each ligand atom
    pub elecs: Vec<f64>,

    pub elec_total: f64,

    /// Van der Waals plus desolvation energy of each ligand atom
    pub emaps: Vec<f64>,

    pub emap_total: f64,

    /// Raw electrostatic map samples at each flexible receptor atom
    pub flex_elec_samples: Vec<f64>,

    /// Raw desolvation map samples at each flexible receptor atom
    pub flex_desolv_samples: Vec<f64>,
}

impl EnergyReport {
    /// Combined intermolecular grid energy of the ligand
    pub fn total(&self) -> f64 {
        self.elec_total + self.emap_total
    }
}

fn score_ligand_atom(
    grid: &Grid,
    maps: &ResolvedMaps,
    index: usize,
    atom: &Atom,
) -> Result<(f64, f64), ScoringError> {
    let sample = CellSample::locate(grid.field(), &atom.coordinates)
        .map_err(|source| ScoringError::LigandAtomOutside { id: atom.id, source })?;

    let e = sample.sample(grid.map_at(maps.electrostatic));
    let d = sample.sample(grid.map_at(maps.desolvation));
    let m = sample.sample(grid.map_at(maps.atom_types[index]));

    let elec = e * atom.charge;
    let emap = m + d * atom.charge.abs();
    Ok((elec, emap))
}

fn sample_flex_atom(
    grid: &Grid,
    maps: &ResolvedMaps,
    atom: &Atom,
) -> Result<(f64, f64), ScoringError> {
    let sample = CellSample::locate(grid.field(), &atom.coordinates)
        .map_err(|source| ScoringError::FlexAtomOutside { id: atom.id, source })?;

    Ok((
        sample.sample(grid.map_at(maps.electrostatic)),
        sample.sample(grid.map_at(maps.desolvation)),
    ))
}

/// Score the ligand against the grid.
///
/// The result depends only on the current coordinates and the grid: both
/// modes produce bit-identical reports, since every atom fills its own slot
/// and totals are summed in atom order afterwards.
pub fn score(
    grid: &Grid,
    maps: &ResolvedMaps,
    ligand: &Ligand,
    protein: &Protein,
    mode: ScoringMode,
) -> Result<EnergyReport, ScoringError> {
    if maps.ligand_atom_count() != ligand.atoms.len() {
        return Err(ScoringError::StaleMaps {
            resolved: maps.ligand_atom_count(),
            atoms: ligand.atoms.len(),
        });
    }

    let (ligand_terms, flex_terms): (Vec<(f64, f64)>, Vec<(f64, f64)>) = match mode {
        ScoringMode::Sequential => (
            ligand
                .atoms
                .iter()
                .enumerate()
                .map(|(i, atom)| score_ligand_atom(grid, maps, i, atom))
                .collect::<Result<_, _>>()?,
            protein
                .flex_atoms
                .iter()
                .map(|atom| sample_flex_atom(grid, maps, atom))
                .collect::<Result<_, _>>()?,
        ),
        ScoringMode::Parallel => (
            ligand
                .atoms
                .par_iter()
                .enumerate()
                .map(|(i, atom)| score_ligand_atom(grid, maps, i, atom))
                .collect::<Result<_, _>>()?,
            protein
                .flex_atoms
                .par_iter()
                .map(|atom| sample_flex_atom(grid, maps, atom))
                .collect::<Result<_, _>>()?,
        ),
    };

    let (elecs, emaps): (Vec<f64>, Vec<f64>) = ligand_terms.into_iter().unzip();
    let (flex_elec_samples, flex_desolv_samples): (Vec<f64>, Vec<f64>) =
        flex_terms.into_iter().unzip();

    let elec_total = elecs.iter().fold(0.0, |acc, e| acc + e);
    let emap_total = emaps.iter().fold(0.0, |acc, e| acc + e);

    trace!(
        "Scored {} ligand atoms and {} flexible atoms: elec {:.4}, emap {:.4}",
        elecs.len(),
        flex_elec_samples.len(),
        elec_total,
        emap_total
    );

    Ok(EnergyReport {
        elecs,
        elec_total,
        emaps,
        emap_total,
        flex_elec_samples,
        flex_desolv_samples,
    })
}
