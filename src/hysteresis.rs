// ===============================
// src/hysteresis.rs
// ===============================
//
// Static hysteresis loop driver.
//
// Sweep shape:
//   Equilibrating -> SweepingField(parity, field) -> ConvergingAtField -> ... -> Done
//
// - The saturating field max(h_equilibrate, h_max) is applied and the system is
//   equilibrated once (skipped when continuing from a checkpoint).
// - Two branches: parity -1 (descending) then +1 (ascending). On each branch the
//   field magnitude steps upward from the branch start to h_max; the applied field
//   is magnitude × parity.
// - At every field value the integrator runs in spans of `partial_steps` until the
//   max torque drops below `torque_tolerance` (after `min_settle_steps`) or the
//   per-field budget `loop_steps` is spent.
//
// Field bookkeeping is fixed point (MicroTesla) so the loop bounds are exact.
// Thermal noise is switched off for the whole sweep.
//
// The driver never retries: integrator and output failures are returned as-is.

use tracing::{debug, info, trace};

use crate::config::{HysteresisConfig, SweepSpan};
use crate::error::SweepError;
use crate::field::{MicroTesla, Parity};
use crate::vec3::normalize;

// -------------------------
// Global simulation control
// -------------------------

/// Persisted sweep progress read back from a checkpoint. Never written by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Checkpoint {
    /// A checkpoint was loaded at start-up.
    pub loaded: bool,
    /// Continue the sweep from it instead of starting over.
    pub continue_sweep: bool,
    /// Parity counter at the time of the checkpoint.
    pub parity: i64,
    /// Next field magnitude that was due to be visited.
    pub field: MicroTesla,
}

/// Simulation-wide settings the sweep reads and mutates.
#[derive(Debug, Clone)]
pub struct SimulationControl {
    /// Elapsed integration steps.
    pub time: u64,
    pub temperature: f64,
    /// Thermal (stochastic) term of the Hamiltonian.
    pub thermal_enabled: bool,
    /// Signed applied field magnitude (T).
    pub applied_field: f64,
    /// Unit direction of the applied field.
    pub field_direction: [f64; 3],
    /// Sweep counters, kept current so a checkpoint writer can persist them.
    pub sweep_parity: i64,
    pub sweep_field: MicroTesla,
    pub checkpoint: Checkpoint,
}

impl Default for SimulationControl {
    fn default() -> Self {
        Self {
            time: 0,
            temperature: 0.0,
            thermal_enabled: true,
            applied_field: 0.0,
            field_direction: [0.0, 0.0, 1.0],
            sweep_parity: -1,
            sweep_field: MicroTesla::ZERO,
            checkpoint: Checkpoint::default(),
        }
    }
}

impl SimulationControl {
    /// Applied induction vector (T).
    #[inline]
    pub fn applied_induction(&self) -> [f64; 3] {
        let d = self.field_direction;
        let h = self.applied_field;
        [h * d[0], h * d[1], h * d[2]]
    }
}

// -------------------------
// Collaborators
// -------------------------

/// Advances the coupled dynamics.
pub trait Integrator {
    /// Integrate `steps` steps under the current applied field, advancing `ctrl.time`.
    fn integrate(&mut self, ctrl: &mut SimulationControl, steps: u64) -> Result<(), SweepError>;
}

/// Summary statistics of the current magnetic state.
pub trait Statistics {
    fn reset_mean_magnetisation(&mut self);
    fn accumulate_mean_magnetisation(&mut self, ctrl: &SimulationControl);
    /// Mean reduced magnetisation since the last reset.
    fn mean_magnetisation(&self) -> [f64; 3];
    /// max_i |m_i × B_i| (T).
    fn max_torque(&self, ctrl: &SimulationControl) -> f64;
}

/// Receives one record per visited field value.
pub trait StepOutput {
    fn write_step(&mut self, record: &FieldStepRecord) -> Result<(), SweepError>;
}

impl StepOutput for Vec<FieldStepRecord> {
    fn write_step(&mut self, record: &FieldStepRecord) -> Result<(), SweepError> {
        self.push(*record);
        Ok(())
    }
}

// -------------------------
// Sweep state
// -------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    Idle,
    Equilibrating,
    SweepingField { parity: Parity, field: MicroTesla },
    ConvergingAtField { parity: Parity, field: MicroTesla },
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStop {
    /// Max torque fell below the tolerance.
    Converged,
    /// The per-field step budget ran out first.
    TimeBudget,
}

impl FieldStop {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldStop::Converged => "converged",
            FieldStop::TimeBudget => "time_budget",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStepRecord {
    /// Position in the sweep (0-based).
    pub index: usize,
    pub parity: Parity,
    /// Field magnitude visited.
    pub field: MicroTesla,
    /// Signed applied field (T).
    pub applied_field: f64,
    pub magnetisation: [f64; 3],
    pub max_torque: f64,
    /// Steps integrated at this field.
    pub steps: u64,
    pub stop: FieldStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepState {
    pub h_max: MicroTesla,
    pub h_increment: MicroTesla,
    pub parity: Parity,
    pub current_field: MicroTesla,
    pub previous_parity: Parity,
    pub is_resuming: bool,
}

impl SweepState {
    pub fn new(cfg: &HysteresisConfig, checkpoint: &Checkpoint) -> Self {
        let is_resuming = checkpoint.loaded && checkpoint.continue_sweep;
        let (parity, current_field) = if is_resuming {
            (Parity::from_sign(checkpoint.parity), checkpoint.field)
        } else {
            (Parity::Descending, MicroTesla::ZERO)
        };
        Self {
            h_max: MicroTesla::from_tesla(cfg.h_max),
            h_increment: MicroTesla::from_tesla(cfg.h_increment.abs()),
            parity,
            current_field,
            previous_parity: parity,
            is_resuming,
        }
    }

    /// First magnitude of a fresh branch.
    pub fn branch_start(&self, span: SweepSpan) -> MicroTesla {
        match span {
            SweepSpan::FromZero => MicroTesla::ZERO,
            SweepSpan::Symmetric => -self.h_max,
        }
    }
}

/// Lower field bound of a branch when continuing from a checkpoint.
///
/// - previous branch descending, still descending: resume at the saved field.
/// - previous branch descending, now ascending: resume at the saved field if it is
///   not positive, otherwise restart the branch at `branch_start`.
/// - previous branch ascending: resume at the saved field.
pub fn resume_lower_bound(
    prev_parity: Parity,
    prev_field: MicroTesla,
    new_parity: Parity,
    branch_start: MicroTesla,
) -> MicroTesla {
    match (prev_parity, new_parity) {
        (Parity::Descending, Parity::Descending) => prev_field,
        (Parity::Descending, Parity::Ascending) => {
            if prev_field.is_positive() {
                branch_start
            } else {
                prev_field
            }
        }
        (Parity::Ascending, _) => prev_field,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub records: usize,
    pub converged: usize,
    pub budget_exhausted: usize,
    pub equilibrated: bool,
}

// -------------------------
// Driver
// -------------------------

#[derive(Debug, Clone)]
pub struct HysteresisDriver {
    cfg: HysteresisConfig,
    phase: SweepPhase,
}

impl HysteresisDriver {
    pub fn new(cfg: HysteresisConfig) -> Self {
        Self {
            cfg,
            phase: SweepPhase::Idle,
        }
    }

    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    /// Run the full two-branch sweep.
    pub fn run<D, O>(
        &mut self,
        ctrl: &mut SimulationControl,
        dynamics: &mut D,
        output: &mut O,
    ) -> Result<SweepReport, SweepError>
    where
        D: Integrator + Statistics,
        O: StepOutput,
    {
        self.cfg.validate()?;

        // Thermal noise would keep the torque from ever converging.
        ctrl.temperature = 0.0;
        ctrl.thermal_enabled = false;
        ctrl.field_direction = normalize(self.cfg.field_direction);

        let mut sweep = SweepState::new(&self.cfg, &ctrl.checkpoint);
        let mut report = SweepReport::default();

        ctrl.applied_field = self.cfg.h_equilibrate.max(self.cfg.h_max);
        if sweep.is_resuming {
            info!(
                parity = sweep.parity.sign(),
                field_ut = sweep.current_field.0,
                "continuing sweep from checkpoint; equilibration skipped"
            );
        } else {
            self.phase = SweepPhase::Equilibrating;
            info!(
                field_t = ctrl.applied_field,
                steps = self.cfg.equilibration_steps,
                "equilibrating in saturating field"
            );
            self.integrate_checked(ctrl, dynamics, self.cfg.equilibration_steps)?;
            report.equilibrated = true;
        }

        let branch_start = sweep.branch_start(self.cfg.span);
        loop {
            let parity = sweep.parity;
            let mut field = if sweep.is_resuming {
                resume_lower_bound(sweep.previous_parity, sweep.current_field, parity, branch_start)
            } else {
                branch_start
            };
            sweep.is_resuming = false;
            ctrl.sweep_parity = parity.sign();
            ctrl.sweep_field = field;

            info!(
                parity = parity.sign(),
                from_ut = field.0,
                to_ut = sweep.h_max.0,
                "sweeping branch"
            );

            while field <= sweep.h_max {
                self.phase = SweepPhase::SweepingField { parity, field };
                let record = self.converge_at_field(ctrl, dynamics, parity, field, report.records)?;

                field += sweep.h_increment;
                sweep.current_field = field;
                ctrl.sweep_field = field;

                match record.stop {
                    FieldStop::Converged => report.converged += 1,
                    FieldStop::TimeBudget => report.budget_exhausted += 1,
                }
                report.records += 1;
                output.write_step(&record)?;
            }

            ctrl.sweep_parity = parity.sign() + 2;
            match parity.next() {
                Some(next) => sweep.parity = next,
                None => break,
            }
        }

        self.phase = SweepPhase::Done;
        info!(
            records = report.records,
            converged = report.converged,
            budget_exhausted = report.budget_exhausted,
            "hysteresis sweep complete"
        );
        Ok(report)
    }

    /// Integrate at one field value until converged or out of budget.
    fn converge_at_field<D>(
        &mut self,
        ctrl: &mut SimulationControl,
        dynamics: &mut D,
        parity: Parity,
        field: MicroTesla,
        index: usize,
    ) -> Result<FieldStepRecord, SweepError>
    where
        D: Integrator + Statistics,
    {
        self.phase = SweepPhase::ConvergingAtField { parity, field };
        ctrl.applied_field = field.applied(parity);

        let start = ctrl.time;
        dynamics.reset_mean_magnetisation();

        let mut stop = FieldStop::TimeBudget;
        let mut torque = None;
        while ctrl.time < start + self.cfg.loop_steps {
            self.integrate_checked(ctrl, dynamics, self.cfg.partial_steps)?;

            let t = dynamics.max_torque(ctrl);
            torque = Some(t);
            trace!(elapsed = ctrl.time - start, torque = t, "integration span");
            if t < self.cfg.torque_tolerance && ctrl.time - start > self.cfg.min_settle_steps {
                stop = FieldStop::Converged;
                break;
            }

            dynamics.accumulate_mean_magnetisation(ctrl);
        }

        let max_torque = match torque {
            Some(t) => t,
            None => dynamics.max_torque(ctrl),
        };
        let record = FieldStepRecord {
            index,
            parity,
            field,
            applied_field: ctrl.applied_field,
            magnetisation: dynamics.mean_magnetisation(),
            max_torque,
            steps: ctrl.time - start,
            stop,
        };

        debug!(
            parity = parity.sign(),
            field_t = record.applied_field,
            steps = record.steps,
            torque = record.max_torque,
            stop = stop.as_str(),
            "field step done"
        );
        Ok(record)
    }

    fn integrate_checked<I: Integrator>(
        &self,
        ctrl: &mut SimulationControl,
        integrator: &mut I,
        steps: u64,
    ) -> Result<(), SweepError> {
        if steps == 0 {
            return Ok(());
        }
        let before = ctrl.time;
        integrator.integrate(ctrl, steps)?;
        if ctrl.time <= before {
            return Err(SweepError::Integrator(format!(
                "integrator did not advance time (still at step {})",
                ctrl.time
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Integrator stand-in: advances time, reports a scripted torque and records calls.
    struct Scripted {
        torque: f64,
        calls: Vec<(u64, f64)>,
        /// (sweep_parity, sweep_field) seen at each call.
        counters: Vec<(i64, MicroTesla)>,
        fail_on_call: Option<usize>,
        stall: bool,
        resets: usize,
    }

    impl Scripted {
        fn with_torque(torque: f64) -> Self {
            Self {
                torque,
                calls: Vec::new(),
                counters: Vec::new(),
                fail_on_call: None,
                stall: false,
                resets: 0,
            }
        }
    }

    impl Integrator for Scripted {
        fn integrate(&mut self, ctrl: &mut SimulationControl, steps: u64) -> Result<(), SweepError> {
            self.calls.push((steps, ctrl.applied_field));
            self.counters.push((ctrl.sweep_parity, ctrl.sweep_field));
            if self.fail_on_call == Some(self.calls.len()) {
                return Err(SweepError::Integrator("NaN in magnetisation".into()));
            }
            if !self.stall {
                ctrl.time += steps;
            }
            Ok(())
        }
    }

    impl Statistics for Scripted {
        fn reset_mean_magnetisation(&mut self) {
            self.resets += 1;
        }
        fn accumulate_mean_magnetisation(&mut self, _ctrl: &SimulationControl) {}
        fn mean_magnetisation(&self) -> [f64; 3] {
            [0.0, 0.0, 1.0]
        }
        fn max_torque(&self, _ctrl: &SimulationControl) -> f64 {
            self.torque
        }
    }

    struct FailingOutput;

    impl StepOutput for FailingOutput {
        fn write_step(&mut self, _record: &FieldStepRecord) -> Result<(), SweepError> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        }
    }

    fn cfg() -> HysteresisConfig {
        HysteresisConfig {
            h_max: 1.0,
            h_increment: 0.1,
            h_equilibrate: 0.0,
            equilibration_steps: 500,
            loop_steps: 1000,
            partial_steps: 100,
            ..HysteresisConfig::default()
        }
    }

    fn fields_of(records: &[FieldStepRecord], parity: Parity) -> Vec<i64> {
        records
            .iter()
            .filter(|r| r.parity == parity)
            .map(|r| r.field.0)
            .collect()
    }

    #[test]
    fn resume_bound_rules() {
        let start = MicroTesla(-1_000_000);
        let h = MicroTesla(300_000);
        let neg = MicroTesla(-200_000);
        use Parity::*;
        assert_eq!(resume_lower_bound(Descending, h, Descending, start), h);
        assert_eq!(resume_lower_bound(Descending, neg, Ascending, start), neg);
        assert_eq!(resume_lower_bound(Descending, MicroTesla::ZERO, Ascending, start), MicroTesla::ZERO);
        assert_eq!(resume_lower_bound(Descending, h, Ascending, start), start);
        assert_eq!(resume_lower_bound(Ascending, h, Ascending, start), h);
        assert_eq!(resume_lower_bound(Ascending, neg, Ascending, start), neg);
    }

    #[test]
    fn fresh_sweep_visits_eleven_fields_per_branch() {
        let mut ctrl = SimulationControl::default();
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        let report = HysteresisDriver::new(cfg()).run(&mut ctrl, &mut dyn_, &mut out).unwrap();

        assert_eq!(report.records, 22);
        assert_eq!(out.len(), 22);
        let expected: Vec<i64> = (0..=10).map(|k| k * 100_000).collect();
        assert_eq!(fields_of(&out, Parity::Descending), expected);
        assert_eq!(fields_of(&out, Parity::Ascending), expected);
        assert!(out[..11].iter().all(|r| r.applied_field <= 0.0));
        assert!(out[11..].iter().all(|r| r.applied_field >= 0.0));
        assert!(out.iter().enumerate().all(|(i, r)| r.index == i));
        assert!(report.equilibrated);
        assert_eq!(dyn_.resets, 22);
    }

    #[test]
    fn equilibration_runs_first_at_the_larger_field() {
        let mut c = cfg();
        c.h_equilibrate = 2.0;
        let mut ctrl = SimulationControl::default();
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        HysteresisDriver::new(c).run(&mut ctrl, &mut dyn_, &mut out).unwrap();
        assert_eq!(dyn_.calls[0], (500, 2.0));
    }

    #[test]
    fn symmetric_span_covers_negative_to_positive_maximum() {
        let mut c = cfg();
        c.span = SweepSpan::Symmetric;
        let mut ctrl = SimulationControl::default();
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        let report = HysteresisDriver::new(c).run(&mut ctrl, &mut dyn_, &mut out).unwrap();
        assert_eq!(report.records, 42);
        let desc = fields_of(&out, Parity::Descending);
        assert_eq!(desc.first(), Some(&-1_000_000));
        assert_eq!(desc.last(), Some(&1_000_000));
        assert!(desc.windows(2).all(|w| w[1] - w[0] == 100_000));
        // Descending branch starts at +h_max applied.
        assert!((out[0].applied_field - 1.0).abs() < 1e-12);
    }

    #[test]
    fn thermal_term_is_disabled() {
        let mut ctrl = SimulationControl {
            temperature: 300.0,
            ..SimulationControl::default()
        };
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        HysteresisDriver::new(cfg()).run(&mut ctrl, &mut dyn_, &mut out).unwrap();
        assert_eq!(ctrl.temperature, 0.0);
        assert!(!ctrl.thermal_enabled);
    }

    #[test]
    fn low_torque_converges_after_settle_time() {
        let mut ctrl = SimulationControl::default();
        let mut dyn_ = Scripted::with_torque(0.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        let report = HysteresisDriver::new(cfg()).run(&mut ctrl, &mut dyn_, &mut out).unwrap();
        // Needs strictly more than 100 elapsed steps -> two spans of 100.
        assert!(out.iter().all(|r| r.stop == FieldStop::Converged && r.steps == 200));
        assert_eq!(report.converged, 22);
        assert_eq!(report.budget_exhausted, 0);
    }

    #[test]
    fn high_torque_spends_the_whole_budget() {
        let mut ctrl = SimulationControl::default();
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        let report = HysteresisDriver::new(cfg()).run(&mut ctrl, &mut dyn_, &mut out).unwrap();
        assert!(out.iter().all(|r| r.stop == FieldStop::TimeBudget && r.steps == 1000));
        assert_eq!(report.budget_exhausted, 22);
        assert_eq!(ctrl.time, 500 + 22 * 1000);
    }

    #[test]
    fn resume_mid_ascending_branch_skips_visited_fields() {
        let mut ctrl = SimulationControl {
            checkpoint: Checkpoint {
                loaded: true,
                continue_sweep: true,
                parity: 1,
                field: MicroTesla::from_tesla(0.3),
            },
            ..SimulationControl::default()
        };
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        let report = HysteresisDriver::new(cfg()).run(&mut ctrl, &mut dyn_, &mut out).unwrap();

        assert!(!report.equilibrated);
        assert_eq!(dyn_.calls[0].0, 100, "first call must be a sweep span");
        let expected: Vec<i64> = (3..=10).map(|k| k * 100_000).collect();
        assert_eq!(fields_of(&out, Parity::Ascending), expected);
        assert!(fields_of(&out, Parity::Descending).is_empty());
    }

    #[test]
    fn resume_mid_descending_branch_then_runs_full_ascending() {
        let mut ctrl = SimulationControl {
            checkpoint: Checkpoint {
                loaded: true,
                continue_sweep: true,
                parity: -1,
                field: MicroTesla::from_tesla(0.5),
            },
            ..SimulationControl::default()
        };
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        HysteresisDriver::new(cfg()).run(&mut ctrl, &mut dyn_, &mut out).unwrap();
        assert_eq!(fields_of(&out, Parity::Descending).len(), 6);
        assert_eq!(fields_of(&out, Parity::Ascending).len(), 11);
    }

    #[test]
    fn loaded_checkpoint_without_continue_starts_fresh() {
        let mut ctrl = SimulationControl {
            checkpoint: Checkpoint {
                loaded: true,
                continue_sweep: false,
                parity: 1,
                field: MicroTesla::from_tesla(0.3),
            },
            ..SimulationControl::default()
        };
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        let report = HysteresisDriver::new(cfg()).run(&mut ctrl, &mut dyn_, &mut out).unwrap();
        assert!(report.equilibrated);
        assert_eq!(report.records, 22);
    }

    #[test]
    fn sweep_counters_track_progress() {
        let mut ctrl = SimulationControl::default();
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        let mut driver = HysteresisDriver::new(cfg());
        driver.run(&mut ctrl, &mut dyn_, &mut out).unwrap();
        assert_eq!(ctrl.sweep_field, MicroTesla(1_100_000));
        assert_eq!(ctrl.sweep_parity, 3);
        assert_eq!(driver.phase(), SweepPhase::Done);
    }

    #[test]
    fn resumed_branch_counters_match_the_field_being_visited() {
        let mut ctrl = SimulationControl {
            checkpoint: Checkpoint {
                loaded: true,
                continue_sweep: true,
                parity: 1,
                field: MicroTesla::from_tesla(0.3),
            },
            ..SimulationControl::default()
        };
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        HysteresisDriver::new(cfg()).run(&mut ctrl, &mut dyn_, &mut out).unwrap();

        // 10 spans per field, no equilibration call.
        assert!(
            dyn_.counters.iter().all(|&(p, _)| p == 1),
            "sweep_parity must be +1 throughout the ascending branch: {:?}",
            &dyn_.counters[..4]
        );
        assert!(dyn_.counters[..10].iter().all(|&(_, f)| f == MicroTesla(300_000)));
        assert!(dyn_.counters[10..20].iter().all(|&(_, f)| f == MicroTesla(400_000)));
        assert_eq!(ctrl.sweep_parity, 3);
    }

    #[test]
    fn fresh_branch_counters_start_at_the_branch_start() {
        let mut ctrl = SimulationControl {
            sweep_parity: 7,
            sweep_field: MicroTesla(123),
            ..SimulationControl::default()
        };
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        HysteresisDriver::new(cfg()).run(&mut ctrl, &mut dyn_, &mut out).unwrap();

        // Call 0 is equilibration; the first descending field follows.
        assert_eq!(dyn_.counters[1], (-1, MicroTesla::ZERO));
        // First span of the ascending branch.
        assert_eq!(dyn_.counters[1 + 11 * 10], (1, MicroTesla::ZERO));
    }

    #[test]
    fn integrator_failure_propagates() {
        let mut ctrl = SimulationControl::default();
        let mut dyn_ = Scripted::with_torque(1.0);
        // Call 1 is equilibration; each field takes 10 spans.
        dyn_.fail_on_call = Some(1 + 10 * 3 + 1);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        let err = HysteresisDriver::new(cfg()).run(&mut ctrl, &mut dyn_, &mut out).unwrap_err();
        assert!(matches!(err, SweepError::Integrator(_)));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn output_failure_propagates() {
        let mut ctrl = SimulationControl::default();
        let mut dyn_ = Scripted::with_torque(1.0);
        let err = HysteresisDriver::new(cfg())
            .run(&mut ctrl, &mut dyn_, &mut FailingOutput)
            .unwrap_err();
        assert!(matches!(err, SweepError::Output(_)));
    }

    #[test]
    fn stalled_integrator_is_an_error() {
        let mut ctrl = SimulationControl::default();
        let mut dyn_ = Scripted::with_torque(1.0);
        dyn_.stall = true;
        let mut out: Vec<FieldStepRecord> = Vec::new();
        let err = HysteresisDriver::new(cfg()).run(&mut ctrl, &mut dyn_, &mut out).unwrap_err();
        assert!(matches!(err, SweepError::Integrator(_)));
    }

    #[test]
    fn invalid_increment_is_rejected_up_front() {
        let mut c = cfg();
        c.h_increment = 0.0;
        let mut ctrl = SimulationControl::default();
        let mut dyn_ = Scripted::with_torque(1.0);
        let mut out: Vec<FieldStepRecord> = Vec::new();
        let err = HysteresisDriver::new(c).run(&mut ctrl, &mut dyn_, &mut out).unwrap_err();
        assert!(matches!(err, SweepError::InvalidConfig(_)));
        assert!(dyn_.calls.is_empty());
    }
}
