use serde::{Deserialize, Serialize};

use crate::engine::LpSolverKind;

/// Benders decomposition configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BendersConfig {
    /// Relative optimality gap at which the run stops.
    ///
    /// Convergence criterion: (best_ub - lb) / (1 + |best_ub|) <= epsilon
    pub epsilon: f64,

    /// Minimum amount by which a scenario surrogate η_s must underestimate
    /// the scenario cost before a cut is added.
    pub cut_violation_tolerance: f64,

    /// Allowed disagreement between a subproblem's primal objective and the
    /// objective rebuilt from its dual prices.
    pub duality_tolerance: f64,

    /// Maximum number of master solves.
    pub max_iterations: usize,

    /// Lower bound of η_s when some recourse cost may be negative.
    ///
    /// Ignored when every scenario price is non-negative; η_s is then
    /// bounded below by zero.
    pub eta_lower_bound: f64,

    /// Engine for the integer master problem.
    pub master_solver: LpSolverKind,

    /// Engine for the scenario subproblems.
    pub subproblem_solver: LpSolverKind,
}

impl Default for BendersConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-4,
            cut_violation_tolerance: 1e-4,
            duality_tolerance: 1e-4,
            max_iterations: 1000,
            eta_lower_bound: -1e9,
            master_solver: LpSolverKind::default(),
            subproblem_solver: LpSolverKind::default(),
        }
    }
}

impl BendersConfig {
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_cut_violation_tolerance(mut self, tolerance: f64) -> Self {
        self.cut_violation_tolerance = tolerance;
        self
    }

    pub fn with_duality_tolerance(mut self, tolerance: f64) -> Self {
        self.duality_tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_eta_lower_bound(mut self, bound: f64) -> Self {
        self.eta_lower_bound = bound;
        self
    }

    pub fn with_master_solver(mut self, kind: LpSolverKind) -> Self {
        self.master_solver = kind;
        self
    }

    pub fn with_subproblem_solver(mut self, kind: LpSolverKind) -> Self {
        self.subproblem_solver = kind;
        self
    }

    /// Check that the tolerances and limits make sense.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(format!("epsilon must be non-negative, got {}", self.epsilon));
        }
        if !(self.cut_violation_tolerance.is_finite() && self.cut_violation_tolerance >= 0.0) {
            return Err(format!(
                "cut_violation_tolerance must be non-negative, got {}",
                self.cut_violation_tolerance
            ));
        }
        if !(self.duality_tolerance.is_finite() && self.duality_tolerance > 0.0) {
            return Err(format!(
                "duality_tolerance must be positive, got {}",
                self.duality_tolerance
            ));
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if !(self.eta_lower_bound.is_finite() && self.eta_lower_bound <= 0.0) {
            return Err(format!(
                "eta_lower_bound must be finite and non-positive, got {}",
                self.eta_lower_bound
            ));
        }
        if !self.master_solver.supports_integer() {
            return Err(format!(
                "master solver '{}' cannot handle integer reservations",
                self.master_solver
            ));
        }
        Ok(())
    }
}
