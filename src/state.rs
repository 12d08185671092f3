// src/state.rs
//
// Coupled atomistic/continuum state for one simulation run.
//
// Built once from the atomistic inputs (reduction + classification), then read by
// the integrator on every step. The only field mutated after setup is the external
// field accumulator.

use std::ops::Range;

use tracing::info;

use crate::classify::{classify, Classification, Resolution};
use crate::config::{DiscretisationMode, MultiscaleConfig};
use crate::error::SetupError;
use crate::reduce::{reduce_all, MacroNeighbourList, PerCellParameters};
use crate::system::{AtomisticSystem, CellMembership};

#[derive(Debug, Clone)]
pub struct CoupledSystemState {
    pub mode: DiscretisationMode,
    pub n_atoms: usize,
    pub params: PerCellParameters,
    pub classification: Classification,
    /// Cells coupled to each local cell through the exchange matrix.
    pub macro_neighbours: MacroNeighbourList,
    /// Mean atom position per cell (m).
    pub cell_centres: Vec<[f64; 3]>,
    pub cell_volumes: Vec<f64>,
    pub temperature: f64,
    /// External induction (T) applied to the continuum cells.
    pub ext_field: [f64; 3],
}

impl CoupledSystemState {
    /// Validate the inputs, reduce per-cell parameters and classify every cell.
    ///
    /// Fails before anything is computed if the input arrays are inconsistent.
    pub fn initialize(sys: &AtomisticSystem, cfg: &MultiscaleConfig) -> Result<Self, SetupError> {
        sys.validate()?;

        let membership = CellMembership::build(sys.n_cells, &sys.cell_of_atom);
        let cell_centres = membership.centres(&sys.coords);
        let params = reduce_all(sys, &membership, &cell_centres);
        let classification = classify(sys, &params, cfg.mode);
        let macro_neighbours = params.exchange.neighbour_list(&sys.local_cells);

        info!(
            n_cells = sys.n_cells,
            n_local_cells = sys.local_cells.len(),
            n_atoms = sys.n_atoms(),
            n_materials = sys.n_materials(),
            temperature = sys.temperature,
            "coupled system initialised"
        );

        Ok(Self {
            mode: cfg.mode,
            n_atoms: sys.n_atoms(),
            params,
            classification,
            macro_neighbours,
            cell_centres,
            cell_volumes: sys.cell_volumes.clone(),
            temperature: sys.temperature,
            ext_field: [0.0; 3],
        })
    }

    /// Re-run classification on the stored parameters. Same inputs, same result.
    pub fn reclassify(&mut self, sys: &AtomisticSystem) {
        self.classification = classify(sys, &self.params, self.mode);
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.params.n_cells()
    }

    #[inline]
    pub fn resolution(&self, cell: usize) -> Resolution {
        self.classification.resolution[cell]
    }

    /// Local continuum cells with a usable moment.
    #[inline]
    pub fn cell_list(&self) -> &[usize] {
        &self.classification.cell_list
    }

    #[inline]
    pub fn atomistic_ranges(&self) -> &[Range<usize>] {
        &self.classification.ranges
    }

    #[inline]
    pub fn set_external_field(&mut self, b: [f64; 3]) {
        self.ext_field = b;
    }
}
