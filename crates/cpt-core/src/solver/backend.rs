use thiserror::Error;

use super::model::{LinearModel, RowId, RowKey, VarId};

/// Failure reported by an LP/MILP engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine finished without an optimal solution
    #[error("model '{model}' was not solved to optimality: {reason}")]
    NotOptimal { model: String, reason: String },

    /// The engine cannot handle this kind of model
    #[error("{backend} cannot solve model '{model}': {reason}")]
    Unsupported {
        backend: &'static str,
        model: String,
        reason: String,
    },

    /// Duals were requested but the engine did not produce them
    #[error("no dual values available for model '{0}'")]
    MissingDuals(String),
}

/// Result of one solve
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub objective: f64,
    /// Primal values indexed by [`VarId::index`]
    pub values: Vec<f64>,
    /// Row duals indexed by [`RowId::index`], if requested
    pub duals: Option<Vec<f64>>,
}

impl LpSolution {
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }

    pub fn dual(&self, row: RowId) -> Option<f64> {
        self.duals.as_ref().map(|d| d[row.index()])
    }
}

/// An engine able to solve a [`LinearModel`] to optimality.
///
/// Implementations must follow the dual sign convention documented in the
/// [module root](super).
pub trait LpBackend {
    fn name(&self) -> &'static str;

    fn solve<K: RowKey>(
        &self,
        model: &LinearModel<K>,
        with_duals: bool,
    ) -> Result<LpSolution, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{LinearExpr, ObjectiveSense, Relation};

    /// Solves single-variable models `min c·x s.t. x >= b` in closed form.
    struct ClosedForm;

    impl LpBackend for ClosedForm {
        fn name(&self) -> &'static str {
            "closed-form"
        }

        fn solve<K: RowKey>(
            &self,
            model: &LinearModel<K>,
            with_duals: bool,
        ) -> Result<LpSolution, EngineError> {
            let row = model.rows().first().ok_or_else(|| EngineError::NotOptimal {
                model: model.name().to_string(),
                reason: "no rows".into(),
            })?;
            let cost = model.objective().terms[0].1;
            Ok(LpSolution {
                objective: cost * row.rhs,
                values: vec![row.rhs],
                duals: with_duals.then(|| vec![cost]),
            })
        }
    }

    #[test]
    fn solution_accessors() {
        let mut model: LinearModel<&str> = LinearModel::new("single", ObjectiveSense::Minimize);
        let x = model.add_nonneg("x");
        model.set_objective(LinearExpr::new().with_term(x, 3.0));
        let row = model
            .add_row("demand", LinearExpr::new().with_term(x, 1.0), Relation::GreaterEq, 2.0)
            .unwrap();

        let backend = ClosedForm;
        let solution = backend.solve(&model, true).unwrap();
        assert_eq!(solution.value(x), 2.0);
        assert_eq!(solution.dual(row), Some(3.0));
        assert_eq!(solution.objective, 6.0);

        let primal_only = backend.solve(&model, false).unwrap();
        assert_eq!(primal_only.dual(row), None);
    }

    #[test]
    fn engine_error_messages_name_the_model() {
        let err = EngineError::Unsupported {
            backend: "clarabel",
            model: "master".into(),
            reason: "integer variables".into(),
        };
        assert_eq!(
            err.to_string(),
            "clarabel cannot solve model 'master': integer variables"
        );
    }
}
