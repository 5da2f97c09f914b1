//! `cpt validate`: instance diagnostics

use std::path::Path;

use anyhow::{bail, Context, Result};
use cpt_core::io::load_instance;

pub fn handle(instance_path: &Path, json: bool) -> Result<()> {
    let instance = load_instance(instance_path)
        .with_context(|| format!("loading instance {}", instance_path.display()))?;
    let diagnostics = instance.diagnose();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&diagnostics).context("serializing diagnostics")?
        );
    } else {
        for issue in &diagnostics.issues {
            println!("{}", issue);
        }
        println!(
            "{}: {} users, {} VM types, {} providers, {} routers, {} arcs, {} scenarios ({})",
            instance_path.display(),
            instance.num_users(),
            instance.num_vm_types(),
            instance.num_providers(),
            instance.num_routers(),
            instance.num_arcs(),
            instance.num_scenarios(),
            diagnostics.summary()
        );
    }

    if diagnostics.has_errors() {
        bail!(
            "{} is not a consistent instance ({})",
            instance_path.display(),
            diagnostics.summary()
        );
    }
    Ok(())
}
