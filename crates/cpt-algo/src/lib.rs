//! # cpt-algo: Decomposition Algorithms for Capacity Planning
//!
//! This crate solves two-stage stochastic capacity planning problems
//! described by [`cpt_core::ProblemInstance`].
//!
//! | Entry point | Method | Use |
//! |-------------|--------|-----|
//! | [`BendersSolver`] | Multi-cut Benders decomposition | Production solves |
//! | [`solve_extensive_form`] | Deterministic equivalent MILP | Validation on small instances |
//!
//! ## Engines
//!
//! Models are built with the solver-agnostic layer in [`cpt_core::solver`]
//! and handed to a [`GoodLpEngine`], which lowers them to `good_lp`:
//!
//! | [`LpSolverKind`] | Feature | Integer variables | Row duals |
//! |------------------|---------|-------------------|-----------|
//! | `highs` | `solver-highs` | yes | yes |
//! | `clarabel` | `solver-clarabel` | no | yes |
//!
//! The master problem is a MILP and therefore needs HiGHS. Scenario
//! subproblems are pure LPs and run on either engine.
//!
//! ## Example
//!
//! ```ignore
//! use cpt_algo::{BendersConfig, BendersSolver};
//! use cpt_core::io::load_instance;
//!
//! let instance = load_instance("planning.yaml")?;
//! let solver = BendersSolver::new(BendersConfig::default().with_epsilon(1e-5));
//! let solution = solver.solve(&instance)?;
//! println!("{}", solution.summary());
//! ```

#[cfg(not(any(feature = "solver-highs", feature = "solver-clarabel")))]
compile_error!("cpt-algo needs at least one of the `solver-highs` or `solver-clarabel` features");

pub mod benders;
pub mod engine;
pub mod test_utils;

pub use benders::{
    solve_extensive_form, BendersConfig, BendersCut, BendersError, BendersSolution,
    BendersSolver, CapacityPlan, DualCertificate, ExtensiveSolution, FirstStageDecision,
    IterationRecord, TerminationReason,
};
pub use engine::{GoodLpEngine, LpSolverKind};
