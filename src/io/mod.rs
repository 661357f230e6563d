//! Reading docking sessions and writing energy reports

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::dock::{Dock, DockError, DockingParameters};
use crate::grid::Grid;
use crate::molecule::{Ligand, Protein};
use crate::scoring::EnergyReport;

/// Errors that can occur during file I/O operations
#[derive(Error, Debug)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a docking session is built from, as delivered by the file
/// parsers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub ligand: Ligand,

    #[serde(default)]
    pub protein: Protein,

    pub grid: Grid,

    #[serde(default)]
    pub params: DockingParameters,
}

impl Session {
    /// Validate the inputs and start a docking session
    pub fn into_dock(self) -> Result<Dock, DockError> {
        Dock::new(self.ligand, self.protein, self.grid, self.params)
    }
}

/// Read a JSON session document
pub fn load_session<P: AsRef<Path>>(path: P) -> Result<Session, IoError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write a session document, pretty-printed
pub fn save_session<P: AsRef<Path>>(session: &Session, path: P) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, session)?;
    writer.flush()?;
    Ok(())
}

/// Write an energy report as JSON
pub fn write_report<P: AsRef<Path>>(report: &EnergyReport, path: P) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}
