// src/macrospin.rs
//
// Zero-temperature macrospin dynamics over the continuum cell list.
//
// Each listed cell carries one reduced moment m_c driven by
//   B_c = B_applied + (2 Ku_c / Ms_c) (m_c · u) u
// with Ms_c the cell's total moment (J/T) and Ku_c its total anisotropy energy (J),
// so the anisotropy term is a field in tesla. Cells are independent, so each is
// advanced through a whole integrator call on its own (rayon over cells).
//
// This is the reference integrator for the hysteresis driver; atomistic cells and
// inter-cell exchange are not evolved here.

use rayon::prelude::*;
use tracing::trace;

use crate::config::MacrospinConfig;
use crate::error::SweepError;
use crate::hysteresis::{Integrator, SimulationControl, Statistics};
use crate::llg::step_llg_heun_recompute_field;
use crate::params::LLGParams;
use crate::state::CoupledSystemState;
use crate::vec3::{add_scaled, cross, dot, norm, normalize};

#[derive(Debug, Clone)]
pub struct MacrospinDynamics {
    state: CoupledSystemState,
    easy_axis: [f64; 3],
    dt: f64,
    /// One moment per entry of `state.cell_list()`.
    m: Vec<[f64; 3]>,
    mean_sum: [f64; 3],
    mean_samples: usize,
}

impl MacrospinDynamics {
    pub fn new(state: CoupledSystemState, cfg: &MacrospinConfig) -> Result<Self, SweepError> {
        if !(cfg.dt.is_finite() && cfg.dt > 0.0) {
            return Err(SweepError::InvalidConfig(format!(
                "macrospin dt must be positive, got {}",
                cfg.dt
            )));
        }
        let m0 = normalize(cfg.initial_m);
        let m = vec![m0; state.cell_list().len()];
        Ok(Self {
            state,
            easy_axis: normalize(cfg.easy_axis),
            dt: cfg.dt,
            m,
            mean_sum: [0.0; 3],
            mean_samples: 0,
        })
    }

    pub fn state(&self) -> &CoupledSystemState {
        &self.state
    }

    /// Current moments, in cell-list order.
    pub fn moments(&self) -> &[[f64; 3]] {
        &self.m
    }

    /// Anisotropy field prefactor 2 Ku / Ms (T) of a cell.
    #[inline]
    fn anisotropy_coeff(&self, cell: usize) -> f64 {
        let ms = self.state.params.ms[cell];
        if ms == 0.0 {
            return 0.0;
        }
        2.0 * self.state.params.ku[cell] / ms
    }

    /// Instantaneous moment-weighted mean of m over the listed cells.
    fn instantaneous_mean(&self) -> [f64; 3] {
        let mut sum = [0.0; 3];
        let mut weight = 0.0;
        for (&cell, &mc) in self.state.cell_list().iter().zip(&self.m) {
            let w = self.state.params.ms[cell];
            sum = add_scaled(sum, w, mc);
            weight += w;
        }
        if weight == 0.0 {
            return [0.0; 3];
        }
        [sum[0] / weight, sum[1] / weight, sum[2] / weight]
    }
}

impl Integrator for MacrospinDynamics {
    fn integrate(&mut self, ctrl: &mut SimulationControl, steps: u64) -> Result<(), SweepError> {
        let b_ext = ctrl.applied_induction();
        self.state.set_external_field(b_ext);

        let u = self.easy_axis;
        let dt = self.dt;
        let cells = self.state.cell_list();
        let coeffs: Vec<f64> = cells.iter().map(|&c| self.anisotropy_coeff(c)).collect();
        let params = &self.state.params;

        self.m
            .par_iter_mut()
            .zip(cells.par_iter())
            .zip(coeffs.par_iter())
            .for_each(|((mc, &cell), &coeff)| {
                let p = LLGParams {
                    gamma: params.gamma[cell],
                    alpha: params.alpha[cell],
                    dt,
                    b_ext,
                };
                let b_ani = |v: [f64; 3]| {
                    let s = coeff * dot(v, u);
                    [s * u[0], s * u[1], s * u[2]]
                };
                for _ in 0..steps {
                    *mc = step_llg_heun_recompute_field(*mc, &p, b_ani);
                }
            });

        if let Some(pos) = self.m.iter().position(|v| v.iter().any(|x| !x.is_finite())) {
            return Err(SweepError::Integrator(format!(
                "non-finite magnetisation in cell {} at step {}",
                self.state.cell_list()[pos],
                ctrl.time + steps
            )));
        }

        ctrl.time += steps;
        trace!(time = ctrl.time, n_cells = self.m.len(), "macrospins advanced");
        Ok(())
    }
}

impl Statistics for MacrospinDynamics {
    fn reset_mean_magnetisation(&mut self) {
        self.mean_sum = [0.0; 3];
        self.mean_samples = 0;
    }

    fn accumulate_mean_magnetisation(&mut self, _ctrl: &SimulationControl) {
        self.mean_sum = add_scaled(self.mean_sum, 1.0, self.instantaneous_mean());
        self.mean_samples += 1;
    }

    /// Time average since the last reset, or the current state if nothing was sampled.
    fn mean_magnetisation(&self) -> [f64; 3] {
        if self.mean_samples == 0 {
            return self.instantaneous_mean();
        }
        let n = self.mean_samples as f64;
        [self.mean_sum[0] / n, self.mean_sum[1] / n, self.mean_sum[2] / n]
    }

    fn max_torque(&self, ctrl: &SimulationControl) -> f64 {
        let b_ext = ctrl.applied_induction();
        let u = self.easy_axis;
        let mut maxv = 0.0;
        for (&cell, &mc) in self.state.cell_list().iter().zip(&self.m) {
            let b = add_scaled(b_ext, self.anisotropy_coeff(cell) * dot(mc, u), u);
            let mag = norm(cross(mc, b));
            if mag > maxv {
                maxv = mag;
            }
        }
        maxv
    }
}
