use anyhow::{Context, Result};
use clap::Args;
use genesys_core::registry::DeviceRegistry;

use super::session::{build_settings, open_device, ScanArgs};
use crate::summary::print_session_summary;

#[derive(Args)]
pub struct RegsArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Also print every slope table entry
    #[arg(long)]
    pub slopes: bool,
}

/// Program a scan against the in-memory scanner and print what was written.
pub fn run(args: &RegsArgs, registry: &DeviceRegistry) -> Result<()> {
    let (mut dev, iface) = open_device(registry, &args.scan.model)?;
    let settings = build_settings(&args.scan, &dev)?;

    dev.start_scan(settings.clone())
        .context("Failed to program scan registers")?;
    print_session_summary(&dev, &settings, &dev.session);

    {
        let iface = iface.borrow();

        println!("Registers ({}):", iface.cached_regs().len());
        for reg in iface.cached_regs().iter() {
            println!("  {:#06x} = {:#04x}", reg.address, reg.value);
        }
        println!();

        println!("Frontend registers ({}):", iface.cached_fe_regs().len());
        for reg in iface.cached_fe_regs().iter() {
            println!("  {:#04x} = {:#06x}", reg.address, reg.value);
        }
        println!();

        println!("Slope tables:");
        for (table, steps) in iface.recorded_slope_tables() {
            let first = steps.first().copied().unwrap_or(0);
            let last = steps.last().copied().unwrap_or(0);
            println!("  table {table}: {} steps, {first} .. {last}", steps.len());
            if args.slopes {
                for chunk in steps.chunks(16) {
                    let line: Vec<String> = chunk.iter().map(|s| s.to_string()).collect();
                    println!("    {}", line.join(" "));
                }
            }
        }
    }

    dev.end_scan()?;
    Ok(())
}
