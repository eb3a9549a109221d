use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use genesys_core::image::tiff::save_image;
use genesys_core::registry::DeviceRegistry;
use indicatif::{ProgressBar, ProgressStyle};
use memmap2::Mmap;
use tracing::info;

use super::session::{build_settings, open_device, ScanArgs};
use crate::summary::print_session_summary;

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Raw capture of the scanner's bulk data for this scan
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output image (.tiff or .png)
    #[arg(short, long, default_value = "scan.tiff")]
    pub output: PathBuf,

    /// The capture starts with the shading reference scans; calibrate on them first
    #[arg(long)]
    pub calibrate: bool,

    /// Dump the output of every pipeline stage as TIFF into this directory
    #[arg(long)]
    pub dump_dir: Option<PathBuf>,
}

/// Replay a raw capture through the device pipeline and save the image.
pub fn run(args: &RunArgs, registry: &DeviceRegistry) -> Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    // SAFETY: the capture is only read, and only while this command runs.
    let mmap = unsafe { Mmap::map(&file)? };
    let capture_len = mmap.len();
    info!(path = %args.input.display(), bytes = capture_len, "Mapped raw capture");

    let (mut dev, iface) = open_device(registry, &args.scan.model)?;
    let settings = build_settings(&args.scan, &dev)?;
    if let Some(ref dir) = args.dump_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        dev.debug_dump_dir = Some(dir.clone());
    }
    iface.borrow_mut().set_bulk_data(mmap);

    println!("Input:    {} ({} bytes)", args.input.display(), capture_len);
    println!("Output:   {}", args.output.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:24} [{bar:40}] {pos}%")?
            .progress_chars("=> "),
    );

    if args.calibrate {
        pb.set_message("Calibrating");
        dev.calibrate(settings.clone()).context("Shading calibration failed")?;
        info!(
            bytes = iface.borrow().bulk_bytes_read(),
            "Shading references read from capture"
        );
    }

    let image = dev.scan_image(settings.clone(), |stage, progress| {
        pb.set_message(stage.to_string());
        pb.set_position((progress * 100.0) as u64);
    })?;
    pb.finish_with_message("Done");

    print_session_summary(&dev, &settings, &dev.session);

    let consumed = iface.borrow().bulk_bytes_read();
    if consumed > capture_len as u64 {
        println!(
            "Warning: the scan read {consumed} bytes but the capture has only {capture_len}; the rest was zero-filled"
        );
    }

    save_image(&args.output, &image)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;
    println!(
        "\n{}x{} {} image saved to {}",
        image.width(),
        image.height(),
        image.format(),
        args.output.display()
    );
    Ok(())
}
