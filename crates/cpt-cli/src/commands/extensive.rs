//! `cpt extensive`: deterministic equivalent in one MILP

use std::path::Path;

use anyhow::{Context, Result};
use cpt_algo::{solve_extensive_form, GoodLpEngine, LpSolverKind};
use cpt_core::io::load_instance;

use super::report::print_plan;

pub fn handle(instance_path: &Path, solver: Option<&str>, json: bool) -> Result<()> {
    let kind = match solver {
        Some(name) => name.parse::<LpSolverKind>()?,
        None => LpSolverKind::default(),
    };
    let instance = load_instance(instance_path)
        .with_context(|| format!("loading instance {}", instance_path.display()))?;

    let solution = solve_extensive_form(&instance, &GoodLpEngine::new(kind))
        .context("solving extensive form")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&solution).context("serializing solution")?
        );
        return Ok(());
    }

    println!("Objective:         {:.4}", solution.objective);
    println!("Reservation cost:  {:.4}", solution.reservation_cost);
    println!("Expected recourse: {:.4}", solution.expected_recourse_cost());
    println!("Time:              {:.3} s", solution.elapsed.as_secs_f64());
    println!();
    print_plan(&solution.plan)
}
