//! Deterministic equivalent of the two-stage problem.
//!
//! One MILP holding the reservations and a full copy of the recourse block
//! for every scenario. It grows linearly with the number of scenarios and is
//! meant for validating decomposition runs on small instances.

use std::time::Duration;

use cpt_core::solver::{LinearModel, LpBackend, ObjectiveSense};
use cpt_core::ProblemInstance;
use serde::Serialize;
use tracing::info;
use web_time::Instant;

use super::error::{BendersError, SolveStage};
use super::first_stage::{CapacityPlan, FirstStageVars};
use super::keys::{ExtensiveRow, SubproblemRow};
use super::solution::duration_seconds;
use super::subproblem::{add_recourse_block, scenario_objective};

/// Optimum of the deterministic equivalent
#[derive(Debug, Clone, Serialize)]
pub struct ExtensiveSolution {
    pub objective: f64,
    /// First-stage part of the objective
    pub reservation_cost: f64,
    pub plan: CapacityPlan,
    #[serde(rename = "elapsed_seconds", serialize_with = "duration_seconds")]
    pub elapsed: Duration,
}

impl ExtensiveSolution {
    /// Probability-weighted recourse part of the objective
    pub fn expected_recourse_cost(&self) -> f64 {
        self.objective - self.reservation_cost
    }
}

/// Build and solve the extensive form with `engine`, which must accept
/// integer variables.
pub fn solve_extensive_form<B: LpBackend>(
    instance: &ProblemInstance,
    engine: &B,
) -> Result<ExtensiveSolution, BendersError> {
    instance.validate()?;
    let start = Instant::now();

    let mut model = LinearModel::new("extensive", ObjectiveSense::Minimize);
    let first_stage = FirstStageVars::add_to(&mut model, instance);
    let mut objective = first_stage.reservation_cost(instance);

    for s in instance.scenario_ids() {
        let label = format!("s{}_", s.value());
        let vars = add_recourse_block(&mut model, instance, &label, |row| ExtensiveRow {
            scenario: s,
            row,
        })?;

        // The reservations move from the right-hand side into the rows
        for (&(user, vm, provider), &xr) in &first_stage.vm_reservation {
            let key = ExtensiveRow {
                scenario: s,
                row: SubproblemRow::VmUtilizationBound { user, vm, provider },
            };
            model.add_to_row(&key, xr, -1.0)?;
        }
        for (&(user, router), &yr) in &first_stage.router_reservation {
            let key = ExtensiveRow {
                scenario: s,
                row: SubproblemRow::RouterUtilizationBound { user, router },
            };
            model.add_to_row(&key, yr, -1.0)?;
        }
        for user in instance.user_ids() {
            for vm in instance.vm_type_ids() {
                let key = ExtensiveRow {
                    scenario: s,
                    row: SubproblemRow::VmDemand { user, vm },
                };
                model.set_rhs(&key, instance.demand(s, user, vm))?;
            }
        }

        let probability = instance.scenario(s).probability;
        for &(var, coef) in &scenario_objective(instance, s, &vars).terms {
            objective.add_term(var, probability * coef);
        }
    }
    model.set_objective(objective);

    info!(
        vars = model.num_vars(),
        rows = model.num_rows(),
        engine = engine.name(),
        "solving extensive form"
    );

    let solution = engine
        .solve(&model, false)
        .map_err(|source| BendersError::EngineFailure {
            stage: SolveStage::ExtensiveForm,
            iteration: 0,
            source,
        })?;
    let decision = first_stage.read(&solution);
    let elapsed = start.elapsed();

    info!(
        objective = solution.objective,
        elapsed_ms = elapsed.as_millis() as u64,
        "extensive form solved"
    );

    Ok(ExtensiveSolution {
        objective: solution.objective,
        reservation_cost: decision.reservation_cost(instance),
        plan: decision.plan(instance),
        elapsed,
    })
}

#[cfg(all(test, feature = "solver-highs"))]
mod tests {
    use super::*;
    use crate::engine::{GoodLpEngine, LpSolverKind};
    use crate::test_utils::{two_scenario_instance, TWO_SCENARIO_OPTIMUM};

    #[test]
    fn two_scenario_optimum() {
        let instance = two_scenario_instance();
        let solution =
            solve_extensive_form(&instance, &GoodLpEngine::new(LpSolverKind::Highs)).unwrap();
        assert!((solution.objective - TWO_SCENARIO_OPTIMUM).abs() < 1e-6);
        assert_eq!(solution.plan.total_vms(), 2);
        assert!((solution.plan.total_bandwidth() - 2.0).abs() < 1e-6);
        // 6·2 + 1·2 reserved, 0.5·2 + 0.5·25 expected recourse
        assert!((solution.reservation_cost - 14.0).abs() < 1e-6);
        assert!((solution.expected_recourse_cost() - 13.5).abs() < 1e-6);
    }
}
