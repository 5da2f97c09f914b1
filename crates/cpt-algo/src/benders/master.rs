//! Master problem: reservations plus one recourse surrogate per scenario.
//!
//! ```text
//! min  Σ rcost[v]·xr[u,v,p] + Σ rcost[r]·yr[u,r] + Σ prob[s]·η[s]
//! s.t. η[s] - Σ π·(xr, yr) >= constant       one row per optimality cut
//!      xr integer >= 0,  yr >= 0,  η[s] >= η_min
//! ```
//!
//! The model starts without rows; every row it ever gets is a cut.

use cpt_core::solver::{
    EngineError, LinearExpr, LinearModel, LpBackend, ModelError, ObjectiveSense, Relation, VarId,
    VarKind,
};
use cpt_core::ProblemInstance;

use super::certificate::BendersCut;
use super::config::BendersConfig;
use super::first_stage::{FirstStageDecision, FirstStageVars};
use super::keys::CutKey;

/// Result of one master solve
#[derive(Debug, Clone)]
pub struct MasterSolution {
    /// Lower bound on the optimal expected cost
    pub objective: f64,
    pub first_stage: FirstStageDecision,
    /// η values indexed by scenario position
    pub eta: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct MasterProblem {
    model: LinearModel<CutKey>,
    first_stage: FirstStageVars,
    eta: Vec<VarId>,
    cuts_per_scenario: Vec<usize>,
}

impl MasterProblem {
    pub fn build(instance: &ProblemInstance, config: &BendersConfig) -> Self {
        let mut model = LinearModel::new("master", ObjectiveSense::Minimize);
        let first_stage = FirstStageVars::add_to(&mut model, instance);

        let eta_lower_bound = if instance.recourse_costs_non_negative() {
            0.0
        } else {
            config.eta_lower_bound
        };
        let eta: Vec<VarId> = instance
            .scenario_ids()
            .map(|s| {
                model.add_var(
                    format!("eta[{}]", s.value()),
                    VarKind::Continuous,
                    eta_lower_bound,
                    f64::INFINITY,
                )
            })
            .collect();

        let mut objective = first_stage.reservation_cost(instance);
        for (s, &var) in instance.scenario_ids().zip(&eta) {
            objective.add_term(var, instance.scenario(s).probability);
        }
        model.set_objective(objective);

        Self {
            model,
            first_stage,
            cuts_per_scenario: vec![0; eta.len()],
            eta,
        }
    }

    pub fn model(&self) -> &LinearModel<CutKey> {
        &self.model
    }

    pub fn first_stage_vars(&self) -> &FirstStageVars {
        &self.first_stage
    }

    pub fn eta_vars(&self) -> &[VarId] {
        &self.eta
    }

    pub fn cut_count(&self) -> usize {
        self.model.num_rows()
    }

    pub fn solve<B: LpBackend>(&self, engine: &B) -> Result<MasterSolution, EngineError> {
        let solution = engine.solve(&self.model, false)?;
        Ok(MasterSolution {
            objective: solution.objective,
            first_stage: self.first_stage.read(&solution),
            eta: self.eta.iter().map(|&var| solution.value(var)).collect(),
        })
    }

    /// Add `η_s >= Σ coef·x + constant` as a permanent row
    pub fn add_cut(&mut self, cut: &BendersCut) -> Result<(), ModelError> {
        let s = cut.scenario.value();
        let eta = *self
            .eta
            .get(s)
            .ok_or_else(|| ModelError::UnknownRow(format!("eta of {}", cut.scenario)))?;

        let mut expr = LinearExpr::new().with_term(eta, 1.0);
        for (key, &coef) in &cut.vm_coefficients {
            if let Some(&var) = self.first_stage.vm_reservation.get(key) {
                expr.add_term(var, -coef);
            }
        }
        for (key, &coef) in &cut.router_coefficients {
            if let Some(&var) = self.first_stage.router_reservation.get(key) {
                expr.add_term(var, -coef);
            }
        }

        let key = CutKey {
            scenario: cut.scenario,
            ordinal: self.cuts_per_scenario[s],
        };
        self.model.add_row(key, expr, Relation::GreaterEq, cut.constant)?;
        self.cuts_per_scenario[s] += 1;
        Ok(())
    }
}
