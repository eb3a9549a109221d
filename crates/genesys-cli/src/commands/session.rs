use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use genesys_core::consts::MM_PER_INCH;
use genesys_core::device::Device;
use genesys_core::interface::{SharedInterface, TestScannerInterface};
use genesys_core::registry::DeviceRegistry;
use genesys_core::settings::{ColorFilter, ScanColorMode, ScanMethod, Settings};

use crate::summary::print_session_summary;

#[derive(Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Flatbed,
    Transparency,
    Infrared,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Gray,
    Color,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FilterArg {
    Red,
    Green,
    Blue,
    None,
}

/// Scan request shared by the commands that program a device.
#[derive(Args)]
pub struct ScanArgs {
    /// Model name as listed by `genesys models`
    #[arg(short, long)]
    pub model: String,

    /// Scan method; defaults to the model's default
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// Colour mode
    #[arg(long, value_enum, default_value = "color")]
    pub mode: ModeArg,

    /// Horizontal resolution in dpi
    #[arg(long, default_value = "300")]
    pub xres: u32,

    /// Vertical resolution in dpi; defaults to --xres
    #[arg(long)]
    pub yres: Option<u32>,

    /// Left edge of the scan area in mm
    #[arg(long, default_value = "0")]
    pub x: f32,

    /// Top edge of the scan area in mm
    #[arg(long, default_value = "0")]
    pub y: f32,

    /// Width of the scan area in mm; defaults to the full scan area
    #[arg(long)]
    pub width: Option<f32>,

    /// Height of the scan area in mm
    #[arg(long, default_value = "10")]
    pub height: f32,

    /// Bits per channel
    #[arg(long, default_value = "8")]
    pub depth: u32,

    /// Channel used for gray scans
    #[arg(long, value_enum, default_value = "none")]
    pub color_filter: FilterArg,

    /// Light all LEDs for gray scans
    #[arg(long)]
    pub true_gray: bool,
}

#[derive(Args)]
pub struct SessionArgs {
    #[command(flatten)]
    pub scan: ScanArgs,
}

/// Compute and print the scan session for a request.
pub fn run(args: &SessionArgs, registry: &DeviceRegistry) -> Result<()> {
    let (mut dev, _iface) = open_device(registry, &args.scan.model)?;
    let settings = build_settings(&args.scan, &dev)?;

    let sensor = dev
        .find_sensor(settings.xres, settings.channels(), settings.scan_method)?
        .clone();
    dev.settings = settings.clone();
    let session = dev
        .cmd_set()
        .calculate_scan_session(&dev, &sensor, &settings)
        .context("Failed to compute scan session")?;

    print_session_summary(&dev, &settings, &session);
    println!("{session}");
    Ok(())
}

/// Create a device for `model` on top of the in-memory interface and boot it.
pub fn open_device(
    registry: &DeviceRegistry,
    model: &str,
) -> Result<(Device, Rc<RefCell<TestScannerInterface>>)> {
    let config = registry.find(model)?;
    let iface = Rc::new(RefCell::new(TestScannerInterface::new(config.model.asic_type)));
    let shared: SharedInterface = iface.clone();

    let mut dev = Device::new(config, shared)?;
    dev.init(true)
        .with_context(|| format!("Failed to initialize {}", config.model.name))?;
    Ok((dev, iface))
}

pub fn build_settings(args: &ScanArgs, dev: &Device) -> Result<Settings> {
    let scan_method = match args.method {
        Some(MethodArg::Flatbed) => ScanMethod::Flatbed,
        Some(MethodArg::Transparency) => ScanMethod::Transparency,
        Some(MethodArg::Infrared) => ScanMethod::TransparencyInfrared,
        None => dev.model.default_method,
    };
    if !dev.model.has_method(scan_method) {
        bail!("{} does not support {scan_method} scans", dev.model.name);
    }

    let scan_mode = match args.mode {
        ModeArg::Gray => ScanColorMode::Gray,
        ModeArg::Color => ScanColorMode::ColorSinglePass,
    };
    let color_filter = match args.color_filter {
        FilterArg::Red => ColorFilter::Red,
        FilterArg::Green => ColorFilter::Green,
        FilterArg::Blue => ColorFilter::Blue,
        FilterArg::None => ColorFilter::None,
    };
    let depth = args.depth;
    if depth != 8 && depth != 16 {
        bail!("Unsupported depth {depth}, expected 8 or 16");
    }

    let xres = args.xres;
    let yres = args.yres.unwrap_or(xres);
    let full_width = if scan_method == ScanMethod::Flatbed {
        dev.model.x_size
    } else {
        dev.model.x_size_ta
    };
    let width = args.width.unwrap_or(full_width);
    let pixels = (width * xres as f32 / MM_PER_INCH) as u32;
    let lines = (args.height * yres as f32 / MM_PER_INCH) as u32;
    if pixels == 0 || lines == 0 {
        bail!("Scan area is empty ({pixels} x {lines} pixels)");
    }

    Ok(Settings {
        scan_method,
        scan_mode,
        xres,
        yres,
        tl_x: args.x,
        tl_y: args.y,
        lines,
        pixels,
        requested_pixels: pixels,
        depth,
        color_filter,
        true_gray: args.true_gray,
    })
}
