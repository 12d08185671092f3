// src/llg.rs
//
// Single-macrospin LLG stepping (Landau-Lifshitz form, reduced magnetisation m):
//
//   dm/dt = -gamma/(1+alpha^2) [ m × B + alpha m × (m × B) ]
//
// B may depend on m (anisotropy), so the Heun step recomputes the field at the
// predictor.

use crate::params::LLGParams;
use crate::vec3::{add_scaled, cross, normalize};

/// LLG right-hand side for one moment in induction `b` (T).
#[inline]
pub fn llg_rhs(m: [f64; 3], b: [f64; 3], gamma: f64, alpha: f64) -> [f64; 3] {
    let pre = -gamma / (1.0 + alpha * alpha);
    let m_cross_b = cross(m, b);
    let t = add_scaled(m_cross_b, alpha, cross(m, m_cross_b));
    [pre * t[0], pre * t[1], pre * t[2]]
}

/// One Heun (RK2) step. `field(m)` returns the m-dependent part of B, added to
/// `params.b_ext`.
pub fn step_llg_heun_recompute_field<F>(m: [f64; 3], params: &LLGParams, field: F) -> [f64; 3]
where
    F: Fn([f64; 3]) -> [f64; 3],
{
    let b_of = |v: [f64; 3]| add_scaled(params.b_ext, 1.0, field(v));
    let dt = params.dt;

    let k1 = llg_rhs(m, b_of(m), params.gamma, params.alpha);
    let pred = normalize(add_scaled(m, dt, k1));
    let k2 = llg_rhs(pred, b_of(pred), params.gamma, params.alpha);

    normalize(add_scaled(m, 0.5 * dt, add_scaled(k1, 1.0, k2)))
}
