use anyhow::Result;
use clap::Args;
use genesys_core::registry::DeviceRegistry;

#[derive(Args)]
pub struct ModelsArgs {
    /// Show sensor and motor tables as well
    #[arg(short, long)]
    pub detailed: bool,
}

pub fn run(args: &ModelsArgs, registry: &DeviceRegistry) -> Result<()> {
    for config in registry.iter() {
        let model = &config.model;
        println!(
            "{:<26} {:04x}:{:04x}  {} {}  ({}, {})",
            model.name,
            config.vendor_id,
            config.product_id,
            model.vendor,
            model.model,
            model.asic_type,
            if model.is_cis { "CIS" } else { "CCD" }
        );

        if !args.detailed {
            continue;
        }
        for res in &model.resolutions {
            let methods: Vec<String> = res.methods.iter().map(|m| m.to_string()).collect();
            println!("    {:<12}{} dpi: {:?}", "Resolutions", methods.join(", "), res.resolutions_x);
        }
        println!("    {:<12}{} configurations", "Sensors", config.sensors.len());
        for sensor in &config.sensors {
            println!(
                "      {} dpi  dpihw {}  lperiod {}  segments {}",
                sensor.resolutions,
                sensor.register_dpihw,
                sensor.exposure_lperiod,
                sensor.segment_count()
            );
        }
        println!("    {:<12}base {} dpi", "Motor", config.motor.base_ydpi);
        for profile in &config.motor.profiles {
            println!("      {profile}");
        }
        println!();
    }
    Ok(())
}
