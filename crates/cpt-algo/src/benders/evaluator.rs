use cpt_core::solver::{EngineError, LpBackend};
use cpt_core::{ProblemInstance, ScenarioId};
use tracing::debug;

use super::certificate::DualCertificate;
use super::error::{BendersError, SolveStage};
use super::first_stage::FirstStageDecision;
use super::subproblem::SubproblemContext;

/// What one scenario solve produced
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub scenario: ScenarioId,
    /// Optimal recourse cost
    pub objective: f64,
    /// Recourse cost rebuilt from the dual prices
    pub dual_objective: f64,
    pub certificate: DualCertificate,
}

impl ScenarioOutcome {
    pub fn duality_gap(&self) -> f64 {
        (self.objective - self.dual_objective).abs()
    }
}

/// Solves the recourse problem of any scenario at a fixed first stage.
///
/// Owns the only [`SubproblemContext`]; evaluations are sequential and each
/// one starts from a full placeholder reset, so the outcome depends only on
/// its arguments.
pub struct ScenarioEvaluator<'a, B: LpBackend> {
    instance: &'a ProblemInstance,
    engine: &'a B,
    context: SubproblemContext,
}

impl<'a, B: LpBackend> ScenarioEvaluator<'a, B> {
    pub fn new(instance: &'a ProblemInstance, engine: &'a B) -> Result<Self, BendersError> {
        Ok(Self {
            instance,
            engine,
            context: SubproblemContext::build(instance)?,
        })
    }

    pub fn context(&self) -> &SubproblemContext {
        &self.context
    }

    /// Refresh the subproblem for `scenario`, solve it and collect its duals.
    ///
    /// Engine failures are reported with iteration 0; the driver attaches the
    /// real iteration.
    pub fn evaluate(
        &mut self,
        scenario: ScenarioId,
        first_stage: &FirstStageDecision,
    ) -> Result<ScenarioOutcome, BendersError> {
        self.context.reset_placeholders()?;
        self.context.fix_first_stage(first_stage)?;
        self.context.apply_scenario(self.instance, scenario)?;

        let engine_failure = |source: EngineError| BendersError::EngineFailure {
            stage: SolveStage::Subproblem(scenario),
            iteration: 0,
            source,
        };

        let model = self.context.model();
        let solution = self.engine.solve(model, true).map_err(engine_failure)?;
        let duals = solution
            .duals
            .as_ref()
            .ok_or_else(|| engine_failure(EngineError::MissingDuals(model.name().to_string())))?;

        let mut certificate = DualCertificate::new();
        for (row, &dual) in model.rows().iter().zip(duals) {
            certificate.record(row.key, dual);
        }
        let dual_objective = certificate.dual_objective(self.instance, scenario, first_stage);

        debug!(
            scenario = scenario.value(),
            objective = solution.objective,
            dual_objective,
            engine = self.engine.name(),
            "scenario evaluated"
        );

        Ok(ScenarioOutcome {
            scenario,
            objective: solution.objective,
            dual_objective,
            certificate,
        })
    }
}

#[cfg(all(test, feature = "solver-highs"))]
mod tests {
    use super::*;
    use crate::engine::{GoodLpEngine, LpSolverKind};
    use crate::test_utils::two_scenario_instance;
    use cpt_core::{ProviderId, RouterId, UserId, VmTypeId};

    fn reserve(instance: &ProblemInstance, x: f64, y: f64) -> FirstStageDecision {
        let u = UserId::new(0);
        let mut decision = FirstStageDecision::empty(instance);
        decision
            .vm_reservations
            .insert((u, VmTypeId::new(0), ProviderId::new(0)), x);
        decision.router_reservations.insert((u, RouterId::new(0)), y);
        decision
    }

    #[test]
    fn recourse_costs_match_hand_computation() {
        let instance = two_scenario_instance();
        let engine = GoodLpEngine::new(LpSolverKind::Highs);
        let mut evaluator = ScenarioEvaluator::new(&instance, &engine).unwrap();
        let decision = reserve(&instance, 2.0, 2.0);

        let low = evaluator.evaluate(ScenarioId::new(0), &decision).unwrap();
        let high = evaluator.evaluate(ScenarioId::new(1), &decision).unwrap();
        assert!((low.objective - 2.0).abs() < 1e-6);
        assert!((high.objective - 25.0).abs() < 1e-6);
        assert!(low.duality_gap() < 1e-6);
        assert!(high.duality_gap() < 1e-6);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let instance = two_scenario_instance();
        let engine = GoodLpEngine::new(LpSolverKind::Highs);
        let mut evaluator = ScenarioEvaluator::new(&instance, &engine).unwrap();
        let decision = reserve(&instance, 1.0, 3.0);
        let other = reserve(&instance, 5.0, 0.0);

        let first = evaluator.evaluate(ScenarioId::new(1), &decision).unwrap();
        evaluator.evaluate(ScenarioId::new(0), &other).unwrap();
        let second = evaluator.evaluate(ScenarioId::new(1), &decision).unwrap();

        assert_eq!(first.objective, second.objective);
        assert_eq!(first.certificate, second.certificate);
    }

    #[test]
    fn no_reservation_buys_everything_on_demand() {
        let instance = two_scenario_instance();
        let engine = GoodLpEngine::new(LpSolverKind::Highs);
        let mut evaluator = ScenarioEvaluator::new(&instance, &engine).unwrap();
        let outcome = evaluator
            .evaluate(ScenarioId::new(0), &FirstStageDecision::empty(&instance))
            .unwrap();
        // 2 VMs at 10 plus 2 units of bandwidth at 1.5
        assert!((outcome.objective - 23.0).abs() < 1e-6);
    }
}
