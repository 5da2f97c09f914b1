//! `cpt solve`: multi-cut Benders decomposition

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cpt_algo::{BendersConfig, BendersSolver, LpSolverKind};
use cpt_core::io::load_instance;
use tracing::info;

use super::report::print_plan;

/// Command-line values that take precedence over the config file
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub epsilon: Option<f64>,
    pub max_iterations: Option<usize>,
    pub solver: Option<&'a str>,
    pub master_solver: Option<&'a str>,
}

pub fn handle(
    instance_path: &Path,
    config_path: Option<&Path>,
    overrides: &Overrides<'_>,
    json: bool,
    out: Option<&Path>,
) -> Result<()> {
    let config = resolve_config(config_path, overrides)?;
    let instance = load_instance(instance_path)
        .with_context(|| format!("loading instance {}", instance_path.display()))?;

    info!(
        users = instance.num_users(),
        vm_types = instance.num_vm_types(),
        providers = instance.num_providers(),
        routers = instance.num_routers(),
        scenarios = instance.num_scenarios(),
        "instance loaded"
    );

    let solution = BendersSolver::new(config)
        .solve(&instance)
        .context("running benders decomposition")?;

    if let Some(path) = out {
        let data = serde_json::to_string_pretty(&solution).context("serializing solution")?;
        fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
        info!("solution written to {}", path.display());
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&solution).context("serializing solution")?
        );
        return Ok(());
    }

    println!(
        "Status:     {}",
        if solution.converged() {
            "converged".to_string()
        } else {
            format!("not converged ({})", solution.termination)
        }
    );
    println!("Objective:  {:.4}", solution.objective);
    println!(
        "Bounds:     [{:.4}, {:.4}] gap {:.2e}",
        solution.lower_bound, solution.best_upper_bound, solution.gap
    );
    println!("Iterations: {}", solution.iterations);
    println!("Cuts:       {}", solution.cuts);
    println!("Time:       {:.3} s", solution.elapsed.as_secs_f64());
    println!();
    print_plan(&solution.plan)
}

/// Defaults, then the TOML file, then the flags
pub fn resolve_config(path: Option<&Path>, overrides: &Overrides<'_>) -> Result<BendersConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<BendersConfig>(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => BendersConfig::default(),
    };

    if let Some(epsilon) = overrides.epsilon {
        config.epsilon = epsilon;
    }
    if let Some(max_iterations) = overrides.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(name) = overrides.solver {
        config.subproblem_solver = name.parse::<LpSolverKind>()?;
    }
    if let Some(name) = overrides.master_solver {
        config.master_solver = name.parse::<LpSolverKind>()?;
    }
    Ok(config)
}
