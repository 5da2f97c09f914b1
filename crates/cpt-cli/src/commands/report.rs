//! Plain-text rendering shared by the solve commands

use std::io::{self, Write};

use anyhow::Result;
use cpt_algo::CapacityPlan;
use tabwriter::TabWriter;

/// Print the reservation plan as two aligned tables
pub fn print_plan(plan: &CapacityPlan) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());

    writeln!(writer, "USER\tVM TYPE\tPROVIDER\tRESERVED")?;
    for r in &plan.vm_reservations {
        writeln!(writer, "{}\t{}\t{}\t{}", r.user, r.vm_type, r.provider, r.count)?;
    }
    writeln!(writer)?;
    writeln!(writer, "USER\tROUTER\tBANDWIDTH")?;
    for r in &plan.router_reservations {
        writeln!(writer, "{}\t{}\t{:.4}", r.user, r.router, r.bandwidth)?;
    }

    writer.flush()?;
    Ok(())
}
