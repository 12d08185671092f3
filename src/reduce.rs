// ===============================
// src/reduce.rs
// ===============================
//
// Atomistic -> continuum parameter reduction.
//
// Every pass follows the same pattern:
//   for each process-local cell, walk the atoms mapped into it (ascending ids),
//   look up the atom's material constant, accumulate, normalise.
// Cells outside the local list stay zero; reconciling them across processes is
// somebody else's job.
//
// Passes run over local cells with rayon. Each cell's accumulation is sequential
// in atom order, so results do not depend on the thread count.
//
// Units:
//  - ms    : total cell moment (J/T)
//  - ku    : total cell anisotropy energy (J), so 2 ku / ms is a field in Tesla
//  - gamma : rad/(s·T)
//  - tc    : K (negative means "no stable continuum model")
//  - A     : J/m

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::params::{
    CHI_0, CHI_TC_FLOOR_FRAC, GAMMA_E_RAD_PER_S_T, K_B, M_E_CRITICAL_EXPONENT,
    TC_MEAN_FIELD_EPSILON,
};
use crate::system::{AtomisticSystem, CellMembership};
use crate::vec3::{dot, min_image_delta};

/// Dense cell x cell exchange-coupling matrix, row-major (row = source cell).
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeMatrix {
    n_cells: usize,
    data: Vec<f64>,
}

impl ExchangeMatrix {
    pub fn zeros(n_cells: usize) -> Self {
        Self {
            n_cells,
            data: vec![0.0; n_cells * n_cells],
        }
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n_cells + j]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_cells..(i + 1) * self.n_cells]
    }

    /// Flat row-major storage (`n_cells^2` entries).
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Off-diagonal couplings of the given cells, as a cell-level CSR list.
    pub fn neighbour_list(&self, local_cells: &[usize]) -> MacroNeighbourList {
        let mut start = vec![0usize; self.n_cells];
        let mut end = vec![0usize; self.n_cells];
        let mut cells = Vec::new();
        for &ci in local_cells {
            start[ci] = cells.len();
            for (cj, &a) in self.row(ci).iter().enumerate() {
                if cj != ci && a != 0.0 {
                    cells.push(cj);
                }
            }
            end[ci] = cells.len();
        }
        MacroNeighbourList { cells, start, end }
    }
}

/// Cells coupled to each cell through the exchange matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroNeighbourList {
    pub cells: Vec<usize>,
    pub start: Vec<usize>,
    pub end: Vec<usize>,
}

impl MacroNeighbourList {
    #[inline]
    pub fn of(&self, cell: usize) -> &[usize] {
        &self.cells[self.start[cell]..self.end[cell]]
    }
}

/// One value per cell for each reduced quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct PerCellParameters {
    pub ms: Vec<f64>,
    pub alpha: Vec<f64>,
    pub tc: Vec<f64>,
    pub ku: Vec<f64>,
    pub gamma: Vec<f64>,
    pub one_over_chi_para: Vec<f64>,
    pub one_over_chi_perp: Vec<f64>,
    /// Equilibrium reduced magnetisation at the simulation temperature.
    pub m_e: Vec<f64>,
    pub alpha_para: Vec<f64>,
    pub alpha_perp: Vec<f64>,
    pub exchange: ExchangeMatrix,
}

impl PerCellParameters {
    /// All-zero parameters for `n_cells` cells.
    pub fn zeros(n_cells: usize) -> Self {
        Self {
            ms: vec![0.0; n_cells],
            alpha: vec![0.0; n_cells],
            tc: vec![0.0; n_cells],
            ku: vec![0.0; n_cells],
            gamma: vec![0.0; n_cells],
            one_over_chi_para: vec![0.0; n_cells],
            one_over_chi_perp: vec![0.0; n_cells],
            m_e: vec![0.0; n_cells],
            alpha_para: vec![0.0; n_cells],
            alpha_perp: vec![0.0; n_cells],
            exchange: ExchangeMatrix::zeros(n_cells),
        }
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.ms.len()
    }
}

/// Run every reduction pass. `sys` must already be validated.
pub fn reduce_all(
    sys: &AtomisticSystem,
    membership: &CellMembership,
    centres: &[[f64; 3]],
) -> PerCellParameters {
    let t = sys.temperature;

    let ms = calculate_ms(sys, membership);
    let alpha = calculate_alpha(sys, membership);
    let tc = calculate_tc(sys, membership);
    let ku = calculate_ku(sys, membership);
    let gamma = calculate_gamma(sys, membership);
    let m_e = calculate_m_e(sys, &tc, t);
    let one_over_chi_para = calculate_chi_para(sys, &tc, t);
    let one_over_chi_perp = calculate_chi_perp(sys, &tc, t);
    let (alpha_para, alpha_perp) = calculate_llb_damping(sys, &alpha, &tc, t);
    let exchange = calculate_exchange_matrix(sys, membership, centres);

    PerCellParameters {
        ms,
        alpha,
        tc,
        ku,
        gamma,
        one_over_chi_para,
        one_over_chi_perp,
        m_e,
        alpha_para,
        alpha_perp,
        exchange,
    }
}

/// Evaluate `f` on every local cell and scatter into a `n_cells` array.
fn per_local_cell<F>(sys: &AtomisticSystem, f: F) -> Vec<f64>
where
    F: Fn(usize) -> f64 + Sync,
{
    let values: Vec<(usize, f64)> = sys.local_cells.par_iter().map(|&c| (c, f(c))).collect();
    let mut out = vec![0.0; sys.n_cells];
    for (c, v) in values {
        out[c] = v;
    }
    out
}

fn mean_over_atoms<F>(atoms: &[usize], f: F) -> f64
where
    F: Fn(usize) -> f64,
{
    if atoms.is_empty() {
        return 0.0;
    }
    let sum: f64 = atoms.iter().map(|&a| f(a)).sum();
    sum / atoms.len() as f64
}

/// Total moment per cell (J/T).
pub fn calculate_ms(sys: &AtomisticSystem, membership: &CellMembership) -> Vec<f64> {
    per_local_cell(sys, |c| {
        membership
            .atoms_in(c)
            .iter()
            .map(|&a| sys.material(a).mu_s)
            .sum()
    })
}

/// Atom-averaged Gilbert damping.
pub fn calculate_alpha(sys: &AtomisticSystem, membership: &CellMembership) -> Vec<f64> {
    per_local_cell(sys, |c| {
        mean_over_atoms(membership.atoms_in(c), |a| sys.material(a).alpha)
    })
}

/// Total anisotropy energy per cell (J).
pub fn calculate_ku(sys: &AtomisticSystem, membership: &CellMembership) -> Vec<f64> {
    per_local_cell(sys, |c| {
        membership
            .atoms_in(c)
            .iter()
            .map(|&a| sys.material(a).ku)
            .sum()
    })
}

/// Atom-averaged gyromagnetic ratio (rad/(s·T)).
pub fn calculate_gamma(sys: &AtomisticSystem, membership: &CellMembership) -> Vec<f64> {
    per_local_cell(sys, |c| {
        GAMMA_E_RAD_PER_S_T * mean_over_atoms(membership.atoms_in(c), |a| sys.material(a).gamma_rel)
    })
}

/// Exchange summed over every (atom in `cell`, neighbour) pair, keyed by the neighbour's cell.
fn exchange_tally(sys: &AtomisticSystem, membership: &CellMembership, cell: usize) -> BTreeMap<usize, f64> {
    let mut tally = BTreeMap::new();
    for &a in membership.atoms_in(cell) {
        for &b in sys.neighbours.of(a) {
            *tally.entry(sys.cell_of_atom[b]).or_insert(0.0) += sys.j_between(a, b);
        }
    }
    tally
}

/// Mean-field Curie temperature from the exchange seen by the cell's atoms:
///
///   Tc = eps * (sum_i sum_j J_ij) / (3 k_B N)
///
/// A net antiferromagnetic coupling comes out negative.
pub fn calculate_tc(sys: &AtomisticSystem, membership: &CellMembership) -> Vec<f64> {
    per_local_cell(sys, |c| {
        let n = membership.count(c);
        if n == 0 {
            return 0.0;
        }
        let total: f64 = exchange_tally(sys, membership, c).values().sum();
        TC_MEAN_FIELD_EPSILON * total / (3.0 * K_B * n as f64)
    })
}

#[inline]
fn equilibrium_magnetisation(tc: f64, t: f64) -> f64 {
    if tc <= 0.0 || t >= tc {
        return 0.0;
    }
    (1.0 - t / tc).powf(M_E_CRITICAL_EXPONENT)
}

#[inline]
fn inverse_chi_para(tc: f64, t: f64) -> f64 {
    if tc <= 0.0 {
        return 0.0;
    }
    let gap = (tc - t).abs().max(CHI_TC_FLOOR_FRAC * tc);
    gap / (CHI_0 * tc)
}

#[inline]
fn inverse_chi_perp(tc: f64, t: f64) -> f64 {
    if tc <= 0.0 {
        return 0.0;
    }
    if t < tc {
        equilibrium_magnetisation(tc, t) / CHI_0
    } else {
        inverse_chi_para(tc, t)
    }
}

pub fn calculate_m_e(sys: &AtomisticSystem, tc: &[f64], temperature: f64) -> Vec<f64> {
    per_local_cell(sys, |c| equilibrium_magnetisation(tc[c], temperature))
}

/// 1/chi_parallel with chi_par = chi_0 Tc / |Tc - T|.
pub fn calculate_chi_para(sys: &AtomisticSystem, tc: &[f64], temperature: f64) -> Vec<f64> {
    per_local_cell(sys, |c| inverse_chi_para(tc[c], temperature))
}

/// 1/chi_perp with chi_perp = chi_0 / m_e below Tc and chi_par above.
pub fn calculate_chi_perp(sys: &AtomisticSystem, tc: &[f64], temperature: f64) -> Vec<f64> {
    per_local_cell(sys, |c| inverse_chi_perp(tc[c], temperature))
}

/// Longitudinal and transverse LLB damping.
///
/// Below Tc: a_par = alpha 2T/(3Tc), a_perp = alpha (1 - T/(3Tc)).
/// Above Tc both equal a_par.
pub fn calculate_llb_damping(
    sys: &AtomisticSystem,
    alpha: &[f64],
    tc: &[f64],
    temperature: f64,
) -> (Vec<f64>, Vec<f64>) {
    let para = per_local_cell(sys, |c| {
        if tc[c] <= 0.0 {
            return 0.0;
        }
        alpha[c] * 2.0 * temperature / (3.0 * tc[c])
    });
    let perp = per_local_cell(sys, |c| {
        if tc[c] <= 0.0 {
            return 0.0;
        }
        if temperature < tc[c] {
            alpha[c] * (1.0 - temperature / (3.0 * tc[c]))
        } else {
            para[c]
        }
    });
    (para, perp)
}

/// Cell-to-cell exchange stiffness A (J/m).
///
/// With J(ci, cj) the atomistic exchange summed over pairs crossing from ci to cj:
///  - diagonal:     A = J(c, c) n_uc / (2 a_c N_c),  a_c = (n_uc V_c / N_c)^(1/3)
///  - off-diagonal: A = J(ci, cj) d^2 / (2 V_ci),    d = |centre_j - centre_i| (minimum image)
pub fn calculate_exchange_matrix(
    sys: &AtomisticSystem,
    membership: &CellMembership,
    centres: &[[f64; 3]],
) -> ExchangeMatrix {
    let n_uc = sys.atoms_per_unit_cell;

    let rows: Vec<(usize, Vec<(usize, f64)>)> = sys
        .local_cells
        .par_iter()
        .map(|&ci| {
            let n = membership.count(ci);
            let v = sys.cell_volumes[ci];
            if n == 0 || v <= 0.0 {
                return (ci, Vec::new());
            }
            let entries = exchange_tally(sys, membership, ci)
                .into_iter()
                .map(|(cj, j_sum)| {
                    let a = if cj == ci {
                        let a_c = (n_uc * v / n as f64).cbrt();
                        j_sum * n_uc / (2.0 * a_c * n as f64)
                    } else {
                        let d = min_image_delta(centres[ci], centres[cj], sys.system_dimensions);
                        j_sum * dot(d, d) / (2.0 * v)
                    };
                    (cj, a)
                })
                .collect();
            (ci, entries)
        })
        .collect();

    let mut matrix = ExchangeMatrix::zeros(sys.n_cells);
    for (ci, entries) in rows {
        for (cj, a) in entries {
            matrix.data[ci * sys.n_cells + cj] = a;
        }
    }
    matrix
}
