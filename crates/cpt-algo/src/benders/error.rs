use cpt_core::solver::{EngineError, ModelError};
use cpt_core::{CptError, ScenarioId};
use thiserror::Error;

/// Which model an engine failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStage {
    Master,
    Subproblem(ScenarioId),
    ExtensiveForm,
}

impl std::fmt::Display for SolveStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStage::Master => write!(f, "master problem"),
            SolveStage::Subproblem(s) => write!(f, "subproblem of {}", s),
            SolveStage::ExtensiveForm => write!(f, "extensive form"),
        }
    }
}

/// Errors that abort a decomposition run.
///
/// None of them is retried: cuts already added stay in the master and the
/// run reports the failure as is.
#[derive(Debug, Error)]
pub enum BendersError {
    /// The objective rebuilt from the subproblem duals disagrees with the
    /// primal subproblem objective.
    #[error(
        "strong duality violated in iteration {iteration} for {scenario}: \
         primal {primal:.6}, dual {dual:.6}"
    )]
    StrongDualityViolation {
        iteration: usize,
        scenario: ScenarioId,
        primal: f64,
        dual: f64,
    },

    /// An engine did not reach optimality.
    #[error("engine failure in iteration {iteration} while solving the {stage}: {source}")]
    EngineFailure {
        stage: SolveStage,
        iteration: usize,
        #[source]
        source: EngineError,
    },

    /// Instance or model construction referenced something that does not exist.
    #[error("data inconsistency: {0}")]
    DataInconsistency(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BendersError {
    /// Attach the iteration number to errors raised below the driver
    pub fn at_iteration(self, iteration: usize) -> Self {
        match self {
            BendersError::StrongDualityViolation {
                scenario,
                primal,
                dual,
                ..
            } => BendersError::StrongDualityViolation {
                iteration,
                scenario,
                primal,
                dual,
            },
            BendersError::EngineFailure { stage, source, .. } => BendersError::EngineFailure {
                stage,
                iteration,
                source,
            },
            other => other,
        }
    }
}

impl From<ModelError> for BendersError {
    fn from(err: ModelError) -> Self {
        BendersError::DataInconsistency(err.to_string())
    }
}

impl From<CptError> for BendersError {
    fn from(err: CptError) -> Self {
        match err {
            CptError::DataInconsistency(msg) => BendersError::DataInconsistency(msg),
            CptError::Config(msg) => BendersError::Config(msg),
            other => BendersError::DataInconsistency(other.to_string()),
        }
    }
}
