use cpt_core::solver::LpBackend;
use cpt_core::ProblemInstance;
use tracing::{info, warn};
use web_time::Instant;

use super::certificate::BendersCut;
use super::config::BendersConfig;
use super::error::{BendersError, SolveStage};
use super::evaluator::ScenarioEvaluator;
use super::master::{MasterProblem, MasterSolution};
use super::solution::{relative_gap, BendersSolution, IterationRecord, TerminationReason};
use crate::engine::GoodLpEngine;

/// Multi-cut Benders decomposition driver.
///
/// # Example
///
/// ```ignore
/// use cpt_algo::{BendersConfig, BendersSolver};
/// use cpt_algo::test_utils::two_scenario_instance;
///
/// let solver = BendersSolver::new(BendersConfig::default());
/// let solution = solver.solve(&two_scenario_instance())?;
/// assert!(solution.converged());
/// ```
pub struct BendersSolver<B: LpBackend = GoodLpEngine> {
    config: BendersConfig,
    master_engine: B,
    subproblem_engine: B,
}

impl BendersSolver<GoodLpEngine> {
    /// Solver using the engines named in `config`
    pub fn new(config: BendersConfig) -> Self {
        let master_engine = GoodLpEngine::new(config.master_solver);
        let subproblem_engine = GoodLpEngine::new(config.subproblem_solver);
        Self {
            config,
            master_engine,
            subproblem_engine,
        }
    }
}

/// Upper bound and cuts gathered in one pass over the scenarios
struct ScenarioPass {
    upper_bound: f64,
    cuts: Vec<BendersCut>,
}

impl<B: LpBackend> BendersSolver<B> {
    pub fn with_engines(config: BendersConfig, master_engine: B, subproblem_engine: B) -> Self {
        Self {
            config,
            master_engine,
            subproblem_engine,
        }
    }

    pub fn config(&self) -> &BendersConfig {
        &self.config
    }

    /// Run the decomposition to termination.
    ///
    /// The instance is validated first; diagnostics warnings are logged but
    /// do not stop the run.
    pub fn solve(&self, instance: &ProblemInstance) -> Result<BendersSolution, BendersError> {
        self.config.validate().map_err(BendersError::Config)?;
        instance.validate()?;
        for issue in instance.diagnose().warnings() {
            warn!("{}", issue);
        }

        let start = Instant::now();
        let mut master = MasterProblem::build(instance, &self.config);
        let mut evaluator = ScenarioEvaluator::new(instance, &self.subproblem_engine)?;

        info!(
            scenarios = instance.num_scenarios(),
            master_vars = master.model().num_vars(),
            subproblem_rows = evaluator.context().model().num_rows(),
            "starting benders decomposition"
        );

        let mut best_upper_bound = f64::INFINITY;
        let mut history = Vec::new();
        let mut iteration = 0;

        loop {
            iteration += 1;

            let master_solution = master.solve(&self.master_engine).map_err(|source| {
                BendersError::EngineFailure {
                    stage: SolveStage::Master,
                    iteration,
                    source,
                }
            })?;
            let lower_bound = master_solution.objective;

            let pass =
                self.evaluate_scenarios(instance, &mut evaluator, &master_solution, iteration)?;
            for cut in &pass.cuts {
                master.add_cut(cut)?;
            }

            best_upper_bound = best_upper_bound.min(pass.upper_bound);
            let gap = relative_gap(best_upper_bound, lower_bound);
            history.push(IterationRecord {
                iteration,
                lower_bound,
                upper_bound: pass.upper_bound,
                best_upper_bound,
                gap,
                cuts_added: pass.cuts.len(),
            });
            info!(
                iteration,
                lower_bound,
                upper_bound = pass.upper_bound,
                best_upper_bound,
                gap,
                cuts = pass.cuts.len(),
                "benders iteration"
            );

            let termination = if gap <= self.config.epsilon {
                Some(TerminationReason::GapClosed)
            } else if pass.cuts.is_empty() {
                Some(TerminationReason::NoViolatedCuts)
            } else if iteration >= self.config.max_iterations {
                Some(TerminationReason::IterationLimit)
            } else {
                None
            };

            if let Some(termination) = termination {
                if termination != TerminationReason::GapClosed {
                    warn!(%termination, gap, "benders stopped before closing the gap");
                }
                let elapsed = start.elapsed();
                info!(
                    objective = lower_bound,
                    iterations = iteration,
                    cuts = master.cut_count(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    %termination,
                    "benders finished"
                );
                return Ok(BendersSolution {
                    objective: lower_bound,
                    lower_bound,
                    best_upper_bound,
                    gap,
                    iterations: iteration,
                    cuts: master.cut_count(),
                    elapsed,
                    termination,
                    plan: master_solution.first_stage.plan(instance),
                    eta: master_solution.eta,
                    history,
                });
            }
        }
    }

    /// Evaluate every scenario at the master's first stage, checking strong
    /// duality and collecting the cuts the master's η values violate.
    fn evaluate_scenarios(
        &self,
        instance: &ProblemInstance,
        evaluator: &mut ScenarioEvaluator<'_, B>,
        master_solution: &MasterSolution,
        iteration: usize,
    ) -> Result<ScenarioPass, BendersError> {
        let first_stage = &master_solution.first_stage;
        let initial = ScenarioPass {
            upper_bound: first_stage.reservation_cost(instance),
            cuts: Vec::new(),
        };

        instance.scenario_ids().try_fold(initial, |mut pass, s| {
            let outcome = evaluator
                .evaluate(s, first_stage)
                .map_err(|err| err.at_iteration(iteration))?;

            if outcome.duality_gap() >= self.config.duality_tolerance {
                return Err(BendersError::StrongDualityViolation {
                    iteration,
                    scenario: s,
                    primal: outcome.objective,
                    dual: outcome.dual_objective,
                });
            }

            pass.upper_bound += instance.scenario(s).probability * outcome.objective;

            let eta = master_solution.eta[s.value()];
            if eta < outcome.objective - self.config.cut_violation_tolerance {
                pass.cuts.push(outcome.certificate.optimality_cut(instance, s));
            }
            Ok(pass)
        })
    }
}
