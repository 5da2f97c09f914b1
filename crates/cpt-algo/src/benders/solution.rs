use std::time::Duration;

use serde::{Serialize, Serializer};

use super::first_stage::CapacityPlan;

/// Relative optimality gap used for the stopping test
pub fn relative_gap(best_upper_bound: f64, lower_bound: f64) -> f64 {
    (best_upper_bound - lower_bound) / (1.0 + best_upper_bound.abs())
}

/// Why the decomposition loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The relative gap fell to epsilon or below
    GapClosed,
    /// No scenario produced a violated cut, but the gap is still above epsilon
    NoViolatedCuts,
    /// `max_iterations` master solves were spent
    IterationLimit,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TerminationReason::GapClosed => "gap closed",
            TerminationReason::NoViolatedCuts => "no violated cuts",
            TerminationReason::IterationLimit => "iteration limit",
        };
        f.write_str(text)
    }
}

/// Bounds after one master solve and one pass over the scenarios
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationRecord {
    pub iteration: usize,
    /// Master objective
    pub lower_bound: f64,
    /// Reservation cost plus expected recourse cost of this iteration's decision
    pub upper_bound: f64,
    pub best_upper_bound: f64,
    pub gap: f64,
    pub cuts_added: usize,
}

pub(crate) fn duration_seconds<S: Serializer>(
    value: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

/// Outcome of a decomposition run
#[derive(Debug, Clone, Serialize)]
pub struct BendersSolution {
    /// Objective of the last master problem
    pub objective: f64,
    pub lower_bound: f64,
    pub best_upper_bound: f64,
    pub gap: f64,
    pub iterations: usize,
    /// Total number of cuts added to the master
    pub cuts: usize,
    #[serde(rename = "elapsed_seconds", serialize_with = "duration_seconds")]
    pub elapsed: Duration,
    pub termination: TerminationReason,
    /// Reservations of the last master solution
    pub plan: CapacityPlan,
    /// Recourse surrogate η_s of the last master solution, per scenario
    pub eta: Vec<f64>,
    pub history: Vec<IterationRecord>,
}

impl BendersSolution {
    /// True only when the gap test passed
    pub fn converged(&self) -> bool {
        self.termination == TerminationReason::GapClosed
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Benders Solution Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!(
            "Status: {} ({})\n",
            if self.converged() {
                "Converged"
            } else {
                "Not converged"
            },
            self.termination
        ));
        s.push_str(&format!("Objective: {:.4}\n", self.objective));
        s.push_str(&format!(
            "Bounds: [{:.4}, {:.4}] gap {:.2e}\n",
            self.lower_bound, self.best_upper_bound, self.gap
        ));
        s.push_str(&format!("Iterations: {}\n", self.iterations));
        s.push_str(&format!("Cuts: {}\n", self.cuts));
        s.push_str(&format!("Elapsed: {:.4?}\n", self.elapsed));
        s.push_str("VM reservations:\n");
        for r in &self.plan.vm_reservations {
            s.push_str(&format!(
                "  {} / {} @ {}: {}\n",
                r.user, r.vm_type, r.provider, r.count
            ));
        }
        s.push_str("Router reservations:\n");
        for r in &self.plan.router_reservations {
            s.push_str(&format!("  {} @ {}: {:.2}\n", r.user, r.router, r.bandwidth));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benders::first_stage::VmReservation;

    fn solution(termination: TerminationReason) -> BendersSolution {
        BendersSolution {
            objective: 27.5,
            lower_bound: 27.5,
            best_upper_bound: 27.5,
            gap: 0.0,
            iterations: 4,
            cuts: 6,
            elapsed: Duration::from_millis(1500),
            termination,
            plan: CapacityPlan {
                vm_reservations: vec![VmReservation {
                    user: "u0".into(),
                    vm_type: "small".into(),
                    provider: "p0".into(),
                    count: 2,
                }],
                router_reservations: Vec::new(),
            },
            eta: vec![2.0, 25.0],
            history: Vec::new(),
        }
    }

    #[test]
    fn gap_is_relative_to_upper_bound() {
        assert_eq!(relative_gap(9.0, 4.0), 0.5);
        assert_eq!(relative_gap(-9.0, -14.0), 0.5);
        assert_eq!(relative_gap(0.0, 0.0), 0.0);
    }

    #[test]
    fn only_gap_closure_counts_as_converged() {
        assert!(solution(TerminationReason::GapClosed).converged());
        assert!(!solution(TerminationReason::NoViolatedCuts).converged());
        assert!(!solution(TerminationReason::IterationLimit).converged());
    }

    #[test]
    fn summary_lists_reservations() {
        let summary = solution(TerminationReason::GapClosed).summary();
        assert!(summary.contains("Status: Converged (gap closed)"));
        assert!(summary.contains("Objective: 27.5000"));
        assert!(summary.contains("u0 / small @ p0: 2"));
    }

    #[test]
    fn json_reports_elapsed_seconds() {
        let json = serde_json::to_value(solution(TerminationReason::GapClosed)).unwrap();
        assert_eq!(json["elapsed_seconds"], 1.5);
        assert_eq!(json["termination"], "gap_closed");
        assert_eq!(json["cuts"], 6);
    }
}
