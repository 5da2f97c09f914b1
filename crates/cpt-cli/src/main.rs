use clap::Parser;
use cpt_cli::{Cli, Commands};
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("could not install log subscriber: {err}");
    }

    let (name, result) = match &cli.command {
        Commands::Solve {
            instance,
            config,
            epsilon,
            max_iterations,
            solver,
            master_solver,
            json,
            out,
        } => {
            let overrides = commands::solve::Overrides {
                epsilon: *epsilon,
                max_iterations: *max_iterations,
                solver: solver.as_deref(),
                master_solver: master_solver.as_deref(),
            };
            let result = commands::solve::handle(
                instance,
                config.as_deref(),
                &overrides,
                *json,
                out.as_deref(),
            );
            ("solve", result)
        }
        Commands::Extensive {
            instance,
            solver,
            json,
        } => (
            "extensive",
            commands::extensive::handle(instance, solver.as_deref(), *json),
        ),
        Commands::Validate { instance, json } => {
            ("validate", commands::validate::handle(instance, *json))
        }
    };

    if let Err(err) = result {
        error!("{} failed: {:?}", name, err);
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
