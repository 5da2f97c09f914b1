//! Multi-cut Benders decomposition
//!
//! Splits the two-stage planning problem into a master MILP over the
//! reservations and one recourse LP per scenario.
//!
//! ## Loop
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  repeat                                                              │
//! │    solve master            → xr, yr, η_s          LB = master obj    │
//! │    for each scenario s                                               │
//! │      fix xr, yr; apply demand and prices of s                        │
//! │      solve recourse LP     → Q_s, duals π                            │
//! │      check |Q_s − Σ π·b| < duality tolerance                         │
//! │      if η_s < Q_s − tol:  add  η_s >= Σ π·(xr, yr) + constant_s      │
//! │    UB = reservation cost + Σ prob_s·Q_s,  best UB = min over passes  │
//! │  until (best UB − LB)/(1 + |best UB|) <= ε                           │
//! │     or no cut was added                                              │
//! │     or max_iterations master solves                                  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cut coefficients
//!
//! With π the row duals of the recourse LP (∂objective/∂rhs):
//!
//! | Row family | Contributes to |
//! |------------|----------------|
//! | VM utilization bound | coefficient of `xr[u,v,p]` |
//! | router utilization bound | coefficient of `yr[u,r]` |
//! | finite CPU, storage, memory, bandwidth capacity | constant, times capacity |
//! | VM demand | constant, times scenario demand |
//! | network rows | nothing (zero right-hand side) |
//!
//! Every subproblem is assumed feasible for every master decision: on-demand
//! purchases are unbounded unless a finite capacity row blocks them, so no
//! feasibility cuts are generated. [`cpt_core::ProblemInstance::diagnose`]
//! warns when capacities cannot cover the largest demand.
//!
//! ## Modules
//!
//! - [`keys`]: typed row keys of the subproblem, master and extensive models
//! - [`first_stage`]: reservation variables and decisions
//! - [`subproblem`]: recourse model built once and refreshed per scenario
//! - [`evaluator`]: scenario solve plus dual collection
//! - [`certificate`]: dual prices and the cuts built from them
//! - [`master`]: master problem and cut rows
//! - [`driver`]: the loop itself ([`BendersSolver`])
//! - [`extensive`]: deterministic equivalent for cross-checking

pub mod certificate;
pub mod config;
pub mod driver;
pub mod error;
pub mod evaluator;
pub mod extensive;
pub mod first_stage;
pub mod keys;
pub mod master;
pub mod solution;
pub mod subproblem;

pub use certificate::{BendersCut, DualCertificate};
pub use config::BendersConfig;
pub use driver::BendersSolver;
pub use error::{BendersError, SolveStage};
pub use evaluator::{ScenarioEvaluator, ScenarioOutcome};
pub use extensive::{solve_extensive_form, ExtensiveSolution};
pub use first_stage::{CapacityPlan, FirstStageDecision, RouterReservation, VmReservation};
pub use keys::{ConstraintFamily, CutKey, ExtensiveRow, SubproblemRow};
pub use master::{MasterProblem, MasterSolution};
pub use solution::{relative_gap, BendersSolution, IterationRecord, TerminationReason};
pub use subproblem::SubproblemContext;
