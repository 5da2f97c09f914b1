use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cpt", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level (logs go to stderr)
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve an instance with multi-cut Benders decomposition
    Solve {
        /// Instance file (.json, .yaml or .yml)
        instance: PathBuf,
        /// TOML file with Benders settings; flags override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Relative optimality gap at which to stop
        #[arg(long)]
        epsilon: Option<f64>,
        /// Maximum number of master solves
        #[arg(long)]
        max_iterations: Option<usize>,
        /// LP engine for the scenario subproblems (clarabel, highs)
        #[arg(long)]
        solver: Option<String>,
        /// Engine for the integer master problem (highs)
        #[arg(long)]
        master_solver: Option<String>,
        /// Print the solution as JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Also write the JSON solution to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Solve the deterministic equivalent in a single MILP
    Extensive {
        /// Instance file (.json, .yaml or .yml)
        instance: PathBuf,
        /// Engine for the MILP (highs)
        #[arg(long)]
        solver: Option<String>,
        /// Print the solution as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Check an instance for errors and suspicious data
    Validate {
        /// Instance file (.json, .yaml or .yml)
        instance: PathBuf,
        /// Print the diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
}
