//! Atom representation and related functionality

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when building atoms
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AtomError {
    #[error("Unknown AutoDock atom type: {0}")]
    UnknownType(String),
}

/// AutoDock 4 force-field atom types.
///
/// Every type that appears in a ligand must have a matching energy map in
/// the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AtomType {
    // Non-hydrogen types
    Carbon,       // C
    Aromatic,     // A (aromatic carbon)
    Nitrogen,     // N
    NitrogenH,    // NA (hydrogen bond acceptor)
    NitrogenS,    // NS (directional acceptor)
    OxygenH,      // OA (hydrogen bond acceptor)
    OxygenS,      // OS (directional acceptor)
    Sulfur,       // S
    SulfurH,      // SA (hydrogen bond acceptor)
    Phosphorus,   // P
    Fluorine,     // F
    Chlorine,     // Cl
    Bromine,      // Br
    Iodine,       // I

    // Hydrogen types
    Hydrogen,     // H
    HydrogenD,    // HD (hydrogen bond donor)
    HydrogenS,    // HS (directional donor)

    // Metal types
    Zinc,         // Zn
    Calcium,      // Ca
    Manganese,    // Mn
    Magnesium,    // Mg
    Iron,         // Fe

    // Zinc pseudo-atom
    ZincPseudo,   // TZ
}

impl AtomType {
    /// Parse atom type from its PDBQT tag
    pub fn from_pdbqt_string(s: &str) -> Result<Self, AtomError> {
        let atom_type = match s.trim().to_uppercase().as_str() {
            "C" => AtomType::Carbon,
            "A" => AtomType::Aromatic,
            "N" => AtomType::Nitrogen,
            "NA" => AtomType::NitrogenH,
            "NS" => AtomType::NitrogenS,
            "OA" => AtomType::OxygenH,
            "OS" => AtomType::OxygenS,
            "S" => AtomType::Sulfur,
            "SA" => AtomType::SulfurH,
            "P" => AtomType::Phosphorus,
            "F" => AtomType::Fluorine,
            "CL" => AtomType::Chlorine,
            "BR" => AtomType::Bromine,
            "I" => AtomType::Iodine,
            "H" => AtomType::Hydrogen,
            "HD" => AtomType::HydrogenD,
            "HS" => AtomType::HydrogenS,
            "ZN" => AtomType::Zinc,
            "CA" => AtomType::Calcium,
            "MN" => AtomType::Manganese,
            "MG" => AtomType::Magnesium,
            "FE" => AtomType::Iron,
            "TZ" => AtomType::ZincPseudo,
            _ => return Err(AtomError::UnknownType(s.to_string())),
        };
        Ok(atom_type)
    }

    /// Convert atom type to its PDBQT tag
    pub fn to_pdbqt_string(&self) -> &'static str {
        match self {
            AtomType::Carbon => "C",
            AtomType::Aromatic => "A",
            AtomType::Nitrogen => "N",
            AtomType::NitrogenH => "NA",
            AtomType::NitrogenS => "NS",
            AtomType::OxygenH => "OA",
            AtomType::OxygenS => "OS",
            AtomType::Sulfur => "S",
            AtomType::SulfurH => "SA",
            AtomType::Phosphorus => "P",
            AtomType::Fluorine => "F",
            AtomType::Chlorine => "Cl",
            AtomType::Bromine => "Br",
            AtomType::Iodine => "I",
            AtomType::Hydrogen => "H",
            AtomType::HydrogenD => "HD",
            AtomType::HydrogenS => "HS",
            AtomType::Zinc => "Zn",
            AtomType::Calcium => "Ca",
            AtomType::Manganese => "Mn",
            AtomType::Magnesium => "Mg",
            AtomType::Iron => "Fe",
            AtomType::ZincPseudo => "TZ",
        }
    }
}

impl FromStr for AtomType {
    type Err = AtomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_pdbqt_string(s)
    }
}

impl TryFrom<String> for AtomType {
    type Error = AtomError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_pdbqt_string(&s)
    }
}

impl From<AtomType> for String {
    fn from(atom_type: AtomType) -> Self {
        atom_type.to_pdbqt_string().to_string()
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.to_pdbqt_string())
    }
}

/// An atom of the ligand or of a flexible receptor side chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// Serial number, unique within the owning molecule
    pub id: u32,

    /// Force-field type, selects the van der Waals map
    pub atom_type: AtomType,

    /// Current coordinates (in Angstroms)
    pub coordinates: Vector3<f64>,

    /// Partial charge
    pub charge: f64,
}

impl Atom {
    /// Create a new atom
    pub fn new(id: u32, atom_type: AtomType, coordinates: Vector3<f64>, charge: f64) -> Self {
        Self {
            id,
            atom_type,
            coordinates,
            charge,
        }
    }

    /// Calculate distance to another atom
    pub fn distance(&self, other: &Atom) -> f64 {
        (self.coordinates - other.coordinates).norm()
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, {}, {}) [{}]",
            self.atom_type.to_pdbqt_string(),
            self.coordinates.x,
            self.coordinates.y,
            self.coordinates.z,
            self.charge
        )
    }
}
