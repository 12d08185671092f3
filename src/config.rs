// src/config.rs
//
// Run configuration. Loaded from JSON (every field optional, defaults below) and
// written back next to the outputs as `config.json` so a run can be reproduced.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{ConfigError, SweepError};
use crate::field::MicroTesla;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub multiscale: MultiscaleConfig,
    pub hysteresis: HysteresisConfig,
    pub macrospin: MacrospinConfig,
    pub run: RunInfo,
}

/// How cells are discretised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscretisationMode {
    /// Every cell is a continuum macrospin; no atomistic region at all.
    Micromagnetic,
    /// Cells are classified continuum/atomistic from Tc and material eligibility.
    #[default]
    Multiscale,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiscaleConfig {
    pub mode: DiscretisationMode,
}

/// Where a fresh sweep branch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepSpan {
    /// Field magnitudes 0 ..= h_max on each branch.
    #[default]
    FromZero,
    /// Field magnitudes -h_max ..= h_max on each branch (full loop per branch).
    Symmetric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    /// Sweep maximum (T).
    pub h_max: f64,
    /// Field step (T); the sign is ignored.
    pub h_increment: f64,
    /// Equilibration field (T); the larger of this and `h_max` is applied first.
    pub h_equilibrate: f64,
    /// Direction of the applied field (normalised on use).
    pub field_direction: [f64; 3],
    pub span: SweepSpan,

    /// Steps integrated at the saturating field before the sweep.
    pub equilibration_steps: u64,
    /// Per-field integration budget (steps).
    pub loop_steps: u64,
    /// Steps per integrator call between convergence checks.
    pub partial_steps: u64,

    /// Max torque |m x B| (T) below which a field value counts as converged.
    pub torque_tolerance: f64,
    /// Convergence is only accepted after more than this many steps at the field.
    pub min_settle_steps: u64,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            h_max: 1.0,
            h_increment: 0.1,
            h_equilibrate: 0.0,
            field_direction: [0.0, 0.0, 1.0],
            span: SweepSpan::FromZero,
            equilibration_steps: 10_000,
            loop_steps: 20_000,
            partial_steps: 100,
            torque_tolerance: 1e-6,
            min_settle_steps: 100,
        }
    }
}

impl HysteresisConfig {
    pub fn validate(&self) -> Result<(), SweepError> {
        if !self.h_max.is_finite() || self.h_max < 0.0 {
            return Err(SweepError::InvalidConfig(format!(
                "h_max must be finite and >= 0, got {}",
                self.h_max
            )));
        }
        if !self.h_equilibrate.is_finite() {
            return Err(SweepError::InvalidConfig(format!(
                "h_equilibrate must be finite, got {}",
                self.h_equilibrate
            )));
        }
        if !self.h_increment.is_finite() || MicroTesla::from_tesla(self.h_increment.abs()).0 == 0 {
            return Err(SweepError::InvalidConfig(format!(
                "h_increment must be at least 1 uT in magnitude, got {}",
                self.h_increment
            )));
        }
        let h_max = MicroTesla::from_tesla(self.h_max);
        let inc = MicroTesla::from_tesla(self.h_increment.abs());
        if h_max.0.checked_add(inc.0).is_none() {
            return Err(SweepError::InvalidConfig(format!(
                "h_max {} T leaves no room for one more increment in micro-tesla",
                self.h_max
            )));
        }
        if self.partial_steps == 0 {
            return Err(SweepError::InvalidConfig(
                "partial_steps must be positive".to_string(),
            ));
        }
        if self.field_direction.iter().all(|&x| x == 0.0) {
            return Err(SweepError::InvalidConfig(
                "field_direction must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings of the reference macrospin integrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MacrospinConfig {
    /// Time step (s).
    pub dt: f64,
    /// Uniaxial easy axis shared by all cells.
    pub easy_axis: [f64; 3],
    /// Initial magnetisation direction of every cell.
    pub initial_m: [f64; 3],
}

impl Default for MacrospinConfig {
    fn default() -> Self {
        Self {
            dt: 1e-14,
            easy_axis: [0.0, 0.0, 1.0],
            initial_m: [0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunInfo {
    pub binary: String,
    pub run_id: String,

    // Optional provenance (can be filled later)
    pub git_commit: Option<String>,
    pub timestamp_utc: Option<String>,
}

impl RunConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let cfg = serde_json::from_reader(BufReader::new(file))?;
        Ok(cfg)
    }

    pub fn write_to_dir(&self, out_dir: &Path) -> std::io::Result<()> {
        let path = out_dir.join("config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
