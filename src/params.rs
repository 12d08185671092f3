// src/params.rs

/// Free-electron gyromagnetic ratio (rad / (s·T)).
pub const GAMMA_E_RAD_PER_S_T: f64 = 1.760_859_630_23e11;

/// Boltzmann constant (J/K).
pub const K_B: f64 = 1.380_649e-23;

/// Bohr magneton (J/T).
pub const MU_B: f64 = 9.274_010_078_3e-24;

/// Spin-wave correction applied to the mean-field Curie temperature.
pub const TC_MEAN_FIELD_EPSILON: f64 = 0.79;

/// Critical exponent for the equilibrium magnetisation m_e(T) = (1 - T/Tc)^beta.
pub const M_E_CRITICAL_EXPONENT: f64 = 0.34;

/// Prefactor of the reduced susceptibilities, chi_0 = 1 / (4 pi).
pub const CHI_0: f64 = 1.0 / (4.0 * std::f64::consts::PI);

/// Smallest |Tc - T| (relative to Tc) used in the susceptibility laws.
pub const CHI_TC_FLOOR_FRAC: f64 = 1e-3;

/// Cells whose total moment (J/T) does not exceed this never enter the continuum solver.
pub const MS_THRESHOLD: f64 = 1e-30;

/// Parameters for one macrospin LLG step.
#[derive(Debug, Clone, Copy)]
pub struct LLGParams {
    pub gamma: f64,      // gyromagnetic ratio (rad/(s·T))
    pub alpha: f64,      // Gilbert damping
    pub dt: f64,         // time step (s)
    pub b_ext: [f64; 3], // uniform applied induction (Tesla)
}
