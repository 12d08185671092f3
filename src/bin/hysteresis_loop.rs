// src/bin/hysteresis_loop.rs
//
// Static hysteresis loop of a multiscale slab.
//
// Geometry: 16 x 4 x 4 simple-cubic atoms in 4 x 4 x 4-atom cells (4 cells along x).
// The last cell is a material excluded from the continuum description, so it stays
// atomistic; the other three are driven as macrospins through the sweep.
//
// Run:
//   cargo run --release --bin hysteresis_loop [config.json]
//
// Logging via RUST_LOG (e.g. RUST_LOG=multiscale_mm=debug for one line per field).
//
// Output:
//   out/hysteresis/
//     ├── config.json
//     └── table.csv

use std::env;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use multiscale_mm::config::RunConfig;
use multiscale_mm::hysteresis::{HysteresisDriver, SimulationControl};
use multiscale_mm::lattice::SimpleCubicLattice;
use multiscale_mm::macrospin::MacrospinDynamics;
use multiscale_mm::params::MU_B;
use multiscale_mm::state::CoupledSystemState;
use multiscale_mm::system::Material;
use multiscale_mm::table::CsvTable;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let mut cfg = match env::args().nth(1) {
        Some(path) => RunConfig::from_json_file(Path::new(&path))?,
        None => {
            let mut c = RunConfig::default();
            // Slight tilt so the reversal is not a metastable antiparallel state.
            c.hysteresis.field_direction = [0.05, 0.0, 1.0];
            c
        }
    };
    cfg.run.binary = "hysteresis_loop".to_string();
    if cfg.run.run_id.is_empty() {
        cfg.run.run_id = "hysteresis".to_string();
    }

    // --- slab parameters ---
    let a = 3.0e-10; // lattice constant (m)
    let mu_s = 1.5 * MU_B; // J/T
    let j_ij = 5.0e-21; // J
    let ku = 0.25 * mu_s; // J per atom -> 2 ku / mu_s = 0.5 T
    let alpha = 0.1;
    // ------------------------

    let soft = Material::with_uniform_exchange(mu_s, alpha, ku, j_ij, 2);
    let mut pinned = soft.clone();
    pinned.micromagnetic_enabled = false;

    let lattice = SimpleCubicLattice::new([16, 4, 4], a, 4);
    let sys = lattice.build(vec![soft, pinned], 0.0, |[i, _, _]| usize::from(i >= 12));

    let state = CoupledSystemState::initialize(&sys, &cfg.multiscale)?;
    info!(
        continuum_cells = state.cell_list().len(),
        atomistic_atoms = state.classification.partition.atomistic.len(),
        "classified"
    );

    let out_dir: PathBuf = Path::new("out").join(&cfg.run.run_id);
    create_dir_all(&out_dir)?;
    cfg.write_to_dir(&out_dir)?;

    let mut dynamics = MacrospinDynamics::new(state, &cfg.macrospin)?;
    let mut ctrl = SimulationControl::default();
    let mut table = CsvTable::create(&out_dir.join("table.csv"))?;

    let mut driver = HysteresisDriver::new(cfg.hysteresis.clone());
    let report = driver.run(&mut ctrl, &mut dynamics, &mut table)?;
    table.finish()?;

    println!(
        "{} field steps ({} converged, {} hit the time budget), {} integration steps",
        report.records, report.converged, report.budget_exhausted, ctrl.time
    );
    println!("Wrote outputs to {:?}", out_dir);
    Ok(())
}
