//! Main executable for rustdock-grid

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use nalgebra::Vector3;
use std::path::{Path, PathBuf};

use rustdock_grid::dock::Dock;
use rustdock_grid::io::{load_session, write_report};
use rustdock_grid::math::Rotation;

/// Command-line arguments for the application
#[derive(Parser, Debug)]
#[clap(
    name = "griddock",
    version = rustdock_grid::VERSION,
    about = "Score ligand poses against precomputed AutoDock energy grids"
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score the pose stored in a session file
    Score {
        /// JSON session file (ligand, flexible receptor, grid, parameters)
        #[clap(long, short, value_parser)]
        session: PathBuf,

        /// Write the energy report as JSON
        #[clap(long, short, value_parser)]
        out: Option<PathBuf>,

        /// Score atoms in parallel
        #[clap(long)]
        parallel: bool,
    },

    /// Apply a candidate pose, then score it
    Pose {
        /// JSON session file (ligand, flexible receptor, grid, parameters)
        #[clap(long, short, value_parser)]
        session: PathBuf,

        /// One torsion angle per rotatable bond in degrees, in branch order
        #[clap(long, value_delimiter = ',', allow_hyphen_values = true)]
        torsions: Option<Vec<f64>>,

        /// Position (x,y,z) in Angstroms for the ligand's about point
        #[clap(long, value_delimiter = ',', allow_hyphen_values = true)]
        translation: Option<Vec<f64>>,

        /// Whole-body rotation axis (x,y,z)
        #[clap(long, value_delimiter = ',', allow_hyphen_values = true)]
        axis: Option<Vec<f64>>,

        /// Whole-body rotation angle in degrees
        #[clap(long, default_value_t = 0.0, allow_hyphen_values = true)]
        angle: f64,

        /// Write the energy report as JSON
        #[clap(long, short, value_parser)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Parse command-line arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            session,
            out,
            parallel,
        } => {
            let mut dock = open_session(&session, parallel)?;
            score_and_report(&mut dock, out.as_deref())?;
        }

        Commands::Pose {
            session,
            torsions,
            translation,
            axis,
            angle,
            out,
        } => {
            let mut dock = open_session(&session, false)?;

            if let Some(degrees) = torsions {
                let radians: Vec<f64> = degrees.iter().map(|d| d.to_radians()).collect();
                dock.rotate_branches(&radians)
                    .context("Failed to apply torsion angles")?;
                info!("Applied {} torsion angles", radians.len());
            }

            let translation = match translation {
                Some(t) => parse_vector("translation", &t)?,
                None => dock.ligand().about,
            };
            let rotation = match axis {
                Some(a) => Rotation::from_angle_axis(angle.to_radians(), &parse_vector("axis", &a)?)
                    .context("Invalid whole-body rotation")?,
                None => {
                    if angle != 0.0 {
                        warn!("Ignoring rotation angle {} without an axis", angle);
                    }
                    Rotation::identity()
                }
            };
            dock.transform_ligand_root(&translation, &rotation);

            score_and_report(&mut dock, out.as_deref())?;
        }
    }

    Ok(())
}

fn open_session(path: &Path, parallel: bool) -> Result<Dock> {
    info!("Loading session: {}", path.display());
    let mut session = load_session(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;
    if parallel {
        session.params.parallel_scoring = true;
    }
    let dock = session
        .into_dock()
        .with_context(|| format!("Invalid session: {}", path.display()))?;

    let field = dock.grid().field();
    let d = field.dimensions();
    info!(
        "Grid: {}x{}x{} nodes, spacing {} A, origin {:?}",
        d.nx,
        d.ny,
        d.nz,
        field.spacing(),
        field.lo()
    );
    if dock.params().parallel_scoring {
        info!(
            "Parallel scoring from {} atoms",
            dock.params().parallel_threshold
        );
    }
    Ok(dock)
}

fn score_and_report(dock: &mut Dock, out: Option<&Path>) -> Result<()> {
    dock.calc_energy().context("Failed to score pose")?;
    print!("{}", dock.energy_table());

    if let Some(out_path) = out {
        info!("Writing energies to {}", out_path.display());
        write_report(dock.energies(), out_path)
            .with_context(|| format!("Failed to write report to {}", out_path.display()))?;
    }
    Ok(())
}

fn parse_vector(name: &str, values: &[f64]) -> Result<Vector3<f64>> {
    match values {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => bail!("--{} needs exactly three comma-separated values", name),
    }
}
