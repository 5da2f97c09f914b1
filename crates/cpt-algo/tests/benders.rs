//! End-to-end decomposition tests on the shared fixtures

#![cfg(feature = "solver-highs")]

use cpt_algo::test_utils::{
    multi_entity_instance, two_scenario_instance, unbounded_capacity_instance,
    zero_demand_instance, TWO_SCENARIO_OPTIMUM,
};
use cpt_algo::benders::SolveStage;
use cpt_algo::{
    solve_extensive_form, BendersConfig, BendersError, BendersSolver, GoodLpEngine, LpSolverKind,
    TerminationReason,
};
use cpt_core::solver::{EngineError, LinearModel, LpBackend, LpSolution, RowKey};
use cpt_core::{
    NetworkArc, NetworkNode, ProblemInstance, ProblemInstanceBuilder, Provider, ProviderId,
    Router, RouterId, Scenario, ScenarioId, UnitCosts, UserId, VmType,
};

fn highs_config() -> BendersConfig {
    BendersConfig::default()
        .with_master_solver(LpSolverKind::Highs)
        .with_subproblem_solver(LpSolverKind::Highs)
}

fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol * (1.0 + expected.abs()),
        "expected {}, got {}",
        expected,
        actual
    );
}

fn extensive_optimum(instance: &ProblemInstance) -> f64 {
    solve_extensive_form(instance, &GoodLpEngine::new(LpSolverKind::Highs))
        .unwrap()
        .objective
}

#[test]
fn two_scenario_instance_converges_to_known_optimum() {
    let solution = BendersSolver::new(highs_config())
        .solve(&two_scenario_instance())
        .unwrap();

    assert!(solution.converged());
    assert_eq!(solution.termination, TerminationReason::GapClosed);
    assert!(solution.iterations <= 20, "{} iterations", solution.iterations);
    assert!(solution.cuts > 0);
    assert_close(solution.objective, TWO_SCENARIO_OPTIMUM, 1e-4);
    assert_eq!(solution.plan.total_vms(), 2);
    assert_eq!(solution.history.len(), solution.iterations);
}

#[test]
fn decomposition_matches_extensive_form() {
    for instance in [two_scenario_instance(), multi_entity_instance()] {
        let expected = extensive_optimum(&instance);
        let solution = BendersSolver::new(highs_config()).solve(&instance).unwrap();
        assert!(solution.converged(), "{}", solution.summary());
        assert_close(solution.objective, expected, 1e-3);
        assert_close(solution.best_upper_bound, expected, 1e-3);
    }
}

#[test]
fn bounds_are_monotone() {
    let solution = BendersSolver::new(highs_config())
        .solve(&multi_entity_instance())
        .unwrap();

    for pair in solution.history.windows(2) {
        assert!(pair[1].lower_bound >= pair[0].lower_bound - 1e-6);
        assert!(pair[1].best_upper_bound <= pair[0].best_upper_bound + 1e-9);
    }
    for record in &solution.history {
        assert!(record.lower_bound <= record.best_upper_bound + 1e-6);
        assert!(record.upper_bound >= record.best_upper_bound - 1e-9);
    }
}

#[test]
fn zero_demand_needs_a_single_iteration() {
    let solution = BendersSolver::new(highs_config())
        .solve(&zero_demand_instance())
        .unwrap();

    assert_eq!(solution.iterations, 1);
    assert_eq!(solution.cuts, 0);
    assert!(solution.objective.abs() < 1e-9);
    assert_eq!(solution.plan.total_vms(), 0);
    assert!(solution.converged());
}

#[test]
fn unbounded_capacities_solve_to_same_optimum() {
    let solution = BendersSolver::new(highs_config())
        .solve(&unbounded_capacity_instance())
        .unwrap();
    assert!(solution.converged());
    assert_close(solution.objective, TWO_SCENARIO_OPTIMUM, 1e-4);
}

#[test]
fn dangling_arc_is_rejected_before_solving() {
    let mut instance = two_scenario_instance();
    instance.arcs.push(NetworkArc {
        from: NetworkNode::Router(RouterId::new(9)),
        to: NetworkNode::User(UserId::new(0)),
    });

    let err = BendersSolver::new(highs_config())
        .solve(&instance)
        .unwrap_err();
    assert!(matches!(err, BendersError::DataInconsistency(_)), "{}", err);
}

#[test]
fn iteration_limit_is_reported() {
    let solution = BendersSolver::new(highs_config().with_max_iterations(1))
        .solve(&two_scenario_instance())
        .unwrap();

    assert_eq!(solution.iterations, 1);
    assert_eq!(solution.termination, TerminationReason::IterationLimit);
    assert!(!solution.converged());
    // Cut-free master: nothing reserved, lower bound zero
    assert!(solution.lower_bound.abs() < 1e-9);
    // Everything on demand: 0.5·23 + 0.5·46
    assert_close(solution.best_upper_bound, 34.5, 1e-9);
}

#[cfg(feature = "solver-clarabel")]
#[test]
fn clarabel_subproblems_reach_the_same_optimum() {
    let config = highs_config()
        .with_subproblem_solver(LpSolverKind::Clarabel)
        .with_duality_tolerance(1e-3);
    let solution = BendersSolver::new(config)
        .solve(&two_scenario_instance())
        .unwrap();
    assert_close(solution.objective, TWO_SCENARIO_OPTIMUM, 1e-3);
}

#[cfg(feature = "solver-clarabel")]
#[test]
fn clarabel_master_is_rejected() {
    let config = highs_config().with_master_solver(LpSolverKind::Clarabel);
    let err = BendersSolver::new(config)
        .solve(&two_scenario_instance())
        .unwrap_err();
    assert!(matches!(err, BendersError::Config(_)));
}

/// HiGHS with every row dual scaled by one half
struct HalvedDuals(GoodLpEngine);

impl LpBackend for HalvedDuals {
    fn name(&self) -> &'static str {
        "halved-highs"
    }

    fn solve<K: RowKey>(
        &self,
        model: &LinearModel<K>,
        with_duals: bool,
    ) -> Result<LpSolution, EngineError> {
        let mut solution = self.0.solve(model, with_duals)?;
        if let Some(duals) = solution.duals.as_mut() {
            for dual in duals.iter_mut() {
                *dual *= 0.5;
            }
        }
        Ok(solution)
    }
}

#[test]
fn wrong_duals_abort_with_strong_duality_violation() {
    let engine = || HalvedDuals(GoodLpEngine::new(LpSolverKind::Highs));
    let solver = BendersSolver::with_engines(highs_config(), engine(), engine());

    // First master reserves nothing; scenario 0 then costs 23 and the halved
    // duals rebuild only 11.5.
    let err = solver.solve(&two_scenario_instance()).unwrap_err();
    match err {
        BendersError::StrongDualityViolation {
            iteration,
            scenario,
            primal,
            dual,
        } => {
            assert_eq!(iteration, 1);
            assert_eq!(scenario, ScenarioId::new(0));
            assert_close(primal, 23.0, 1e-6);
            assert_close(dual, 11.5, 1e-6);
        }
        other => panic!("expected a strong duality violation, got {}", other),
    }
}

/// Demand of 25 VMs in the first scenario against 10 CPU in total
fn overloaded_instance() -> ProblemInstance {
    let scenario = |name: &str, demand: f64| {
        Scenario::new(name, 0.5)
            .with_vm_costs(vec![UnitCosts::new(1.0, 10.0)])
            .with_router_costs(vec![UnitCosts::new(0.0, 1.5)])
            .with_demand(vec![vec![demand]])
    };
    ProblemInstanceBuilder::new()
        .user("u0")
        .vm_type(VmType::new("small", 6.0).with_resources(1.0, 0.0, 0.0, 1.0))
        .provider(Provider::new("p0").with_cpu_capacity(10.0))
        .router(Router::new("r0", 1.0))
        .arc(
            NetworkNode::Provider(ProviderId::new(0)),
            NetworkNode::Router(RouterId::new(0)),
        )
        .arc(
            NetworkNode::Router(RouterId::new(0)),
            NetworkNode::User(UserId::new(0)),
        )
        .scenario(scenario("overload", 25.0))
        .scenario(scenario("normal", 2.0))
        .build()
        .unwrap()
}

#[test]
fn infeasible_scenario_aborts_with_subproblem_failure() {
    let instance = overloaded_instance();

    let diag = instance.diagnose();
    let feasibility: Vec<_> = diag.issues_by_category("feasibility").collect();
    assert_eq!(feasibility.len(), 1);
    assert!(feasibility[0].message.contains("cpu"));

    let err = BendersSolver::new(highs_config())
        .solve(&instance)
        .unwrap_err();
    match err {
        BendersError::EngineFailure {
            stage, iteration, ..
        } => {
            assert_eq!(stage, SolveStage::Subproblem(ScenarioId::new(0)));
            assert_eq!(iteration, 1);
        }
        other => panic!("expected a subproblem engine failure, got {}", other),
    }
}
