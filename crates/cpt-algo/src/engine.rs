//! `good_lp` lowering of [`cpt_core::solver`] models.
//!
//! Every row is handed to `good_lp` as either `expr <= rhs` or `expr == rhs`;
//! `>=` rows are negated first and their dual is negated back, so the
//! orientation `good_lp` picks internally never leaks into the reported
//! prices.

use std::str::FromStr;

use anyhow::anyhow;
use cpt_core::solver::{
    EngineError, LinearExpr, LinearModel, LpBackend, LpSolution, ObjectiveSense, Relation, RowKey,
    VarKind,
};
#[cfg(feature = "solver-clarabel")]
use good_lp::solvers::clarabel::clarabel as clarabel_solver;
#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as highs_solver;
use good_lp::solvers::{DualValues, SolutionWithDual};
use good_lp::{
    constraint, variable, Expression, ProblemVariables, Solution, SolverModel, Variable,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LpSolverKind {
    #[cfg(feature = "solver-clarabel")]
    Clarabel,
    #[cfg(feature = "solver-highs")]
    Highs,
}

impl Default for LpSolverKind {
    fn default() -> Self {
        #[cfg(feature = "solver-highs")]
        {
            LpSolverKind::Highs
        }
        #[cfg(not(feature = "solver-highs"))]
        {
            LpSolverKind::Clarabel
        }
    }
}

impl LpSolverKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_LP_SOLVERS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            #[cfg(feature = "solver-clarabel")]
            LpSolverKind::Clarabel => "clarabel",
            #[cfg(feature = "solver-highs")]
            LpSolverKind::Highs => "highs",
        }
    }

    /// Whether the engine can solve models with integer variables
    pub fn supports_integer(&self) -> bool {
        match self {
            #[cfg(feature = "solver-clarabel")]
            LpSolverKind::Clarabel => false,
            #[cfg(feature = "solver-highs")]
            LpSolverKind::Highs => true,
        }
    }

    /// Factor turning the engine's raw row multipliers into `∂objective/∂rhs`.
    ///
    /// HiGHS already reports sensitivities. Clarabel reports the conic
    /// multiplier `z >= 0` of `Ax + s = b, s >= 0`, which is the negated
    /// sensitivity of a minimization.
    fn dual_scale(&self) -> f64 {
        match self {
            #[cfg(feature = "solver-clarabel")]
            LpSolverKind::Clarabel => -1.0,
            #[cfg(feature = "solver-highs")]
            LpSolverKind::Highs => 1.0,
        }
    }
}

impl std::fmt::Display for LpSolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const AVAILABLE_LP_SOLVERS: &[&str] = &[
    #[cfg(feature = "solver-clarabel")]
    "clarabel",
    #[cfg(feature = "solver-highs")]
    "highs",
];

fn unknown_solver_error(label: &str) -> anyhow::Error {
    anyhow!(
        "unknown lp solver '{}'; supported values: {}",
        label,
        LpSolverKind::available().join(", ")
    )
}

impl FromStr for LpSolverKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            "clarabel" => {
                #[cfg(feature = "solver-clarabel")]
                {
                    Ok(LpSolverKind::Clarabel)
                }
                #[cfg(not(feature = "solver-clarabel"))]
                {
                    Err(unknown_solver_error(&normalized))
                }
            }
            "highs" => {
                #[cfg(feature = "solver-highs")]
                {
                    Ok(LpSolverKind::Highs)
                }
                #[cfg(not(feature = "solver-highs"))]
                {
                    Err(unknown_solver_error(&normalized))
                }
            }
            other => Err(unknown_solver_error(other)),
        }
    }
}

/// [`LpBackend`] that solves models through `good_lp`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoodLpEngine {
    kind: LpSolverKind,
}

impl GoodLpEngine {
    pub fn new(kind: LpSolverKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> LpSolverKind {
        self.kind
    }
}

impl LpBackend for GoodLpEngine {
    fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    fn solve<K: RowKey>(
        &self,
        model: &LinearModel<K>,
        with_duals: bool,
    ) -> Result<LpSolution, EngineError> {
        if model.has_integer_vars() && !self.kind.supports_integer() {
            return Err(EngineError::Unsupported {
                backend: self.kind.as_str(),
                model: model.name().to_string(),
                reason: "integer variables need a MILP engine".into(),
            });
        }

        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .variables()
            .iter()
            .map(|def| {
                let mut definition = variable().name(def.name.clone());
                if def.lower.is_finite() {
                    definition = definition.min(def.lower);
                }
                if def.upper.is_finite() {
                    definition = definition.max(def.upper);
                }
                if def.kind == VarKind::Integer {
                    definition = definition.integer();
                }
                vars.add(definition)
            })
            .collect();

        let objective = lower_expr(model.objective(), &handles);
        let unsolved = match model.sense() {
            ObjectiveSense::Minimize => vars.minimise(objective),
            ObjectiveSense::Maximize => vars.maximise(objective),
        };

        let scale = self.kind.dual_scale();
        match self.kind {
            #[cfg(feature = "solver-clarabel")]
            LpSolverKind::Clarabel => solve_lowered(
                unsolved.using(clarabel_solver),
                model,
                &handles,
                with_duals,
                scale,
            ),
            #[cfg(feature = "solver-highs")]
            LpSolverKind::Highs => solve_lowered(
                unsolved.using(highs_solver),
                model,
                &handles,
                with_duals,
                scale,
            ),
        }
    }
}

fn lower_expr(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    let mut lowered = Expression::from(expr.constant);
    for &(var, coef) in &expr.terms {
        lowered += coef * handles[var.index()];
    }
    lowered
}

fn solve_lowered<M, K>(
    mut problem: M,
    model: &LinearModel<K>,
    handles: &[Variable],
    with_duals: bool,
    dual_scale: f64,
) -> Result<LpSolution, EngineError>
where
    M: SolverModel,
    M::Solution: for<'a> SolutionWithDual<'a>,
    K: RowKey,
{
    let mut references = Vec::with_capacity(model.num_rows());
    let mut orientation = Vec::with_capacity(model.num_rows());
    for row in model.rows() {
        let (lowered, sign) = match row.relation {
            Relation::LessEq => {
                let lhs = lower_expr(&row.expr, handles);
                let rhs = row.rhs;
                (constraint!(lhs <= rhs), 1.0)
            }
            Relation::GreaterEq => {
                let lhs = lower_expr(&row.expr.negated(), handles);
                let rhs = -row.rhs;
                (constraint!(lhs <= rhs), -1.0)
            }
            Relation::Equal => {
                let lhs = lower_expr(&row.expr, handles);
                let rhs = row.rhs;
                (constraint!(lhs == rhs), 1.0)
            }
        };
        references.push(problem.add_constraint(lowered));
        orientation.push(sign);
    }

    let mut solution = problem.solve().map_err(|err| EngineError::NotOptimal {
        model: model.name().to_string(),
        reason: err.to_string(),
    })?;

    let values: Vec<f64> = handles.iter().map(|&var| solution.value(var)).collect();
    let objective = model.objective_value(&values);

    let duals = if with_duals {
        let dual_values = solution.compute_dual();
        Some(
            references
                .iter()
                .zip(&orientation)
                .map(|(reference, sign)| sign * dual_scale * dual_values.dual(reference.clone()))
                .collect(),
        )
    } else {
        None
    };

    Ok(LpSolution {
        objective,
        values,
        duals,
    })
}
