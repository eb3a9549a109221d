//! Per-ASIC register programming and the helpers shared between chip families.
//!
//! A command set turns a [`Settings`] request into a computed [`ScanSession`],
//! programs the register file for it and starts or stops the scan. The image
//! pipeline that reconstructs lines from the raw sensor data is built here as
//! well, since its shape depends on the same session.

pub mod gl842;
pub mod gl847;

use std::rc::Rc;

use tracing::{debug, info};

use crate::consts::MM_PER_INCH;
use crate::device::Device;
use crate::error::{GenesysError, Result, SaneStatus};
use crate::image::buffer::ProducerCallback;
use crate::image::{ImageBuffer, PixelFormat};
use crate::model::{AsicType, ModelFlag, ModelId};
use crate::motor::{create_slope_table_for_speed, get_slope_table_max_size, Motor, MotorProfile, MotorSlopeTable};
use crate::pipeline::{
    BufferedCallableSource, Calibrate, ComponentShiftLines, DebugDump, Desegment, FormatConvert,
    ImagePipelineStack, Invert, MergeMonoLines, PixelShiftColumns, PixelShiftLines, ScaleRows,
    Swap16BitEndian,
};
use crate::register::{MotorMode, RegisterSet};
use crate::sensor::{Sensor, SensorExposure};
use crate::session::ScanSession;
use crate::settings::{ScanColorMode, ScanFlag, ScanMethod, SetupParams, Settings};
use crate::utilities::align_multiple_ceil;

pub use gl842::CommandSetGl842;
pub use gl847::CommandSetGl847;

/// Bulk endpoint image data is read from.
const BULK_IN_IMAGE: u8 = 0x45;

/// What `set_fe` should do with the analog frontend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrontendSet {
    /// Reload the model's initial frontend values and write them.
    Init,
    /// Write the current frontend values.
    Set,
    PowerSave,
}

/// Chip-family specific part of the scan sequence.
pub trait CommandSet {
    fn asic_type(&self) -> AsicType;

    /// Load the initial register set and bring the ASIC into a known state.
    fn asic_boot(&self, dev: &mut Device, cold: bool) -> Result<()>;

    fn set_fe(&self, dev: &mut Device, sensor: &Sensor, set: FrontendSet) -> Result<()>;

    /// Translate user settings into a computed session positioned on the scan area.
    fn calculate_scan_session(
        &self,
        dev: &Device,
        sensor: &Sensor,
        settings: &Settings,
    ) -> Result<ScanSession>;

    /// Program `regs` for `session` and build the image pipeline that will read it.
    fn init_regs_for_scan_session(
        &self,
        dev: &mut Device,
        sensor: &Sensor,
        regs: &mut RegisterSet,
        session: &ScanSession,
    ) -> Result<()>;

    /// Session for a 16-bit shading reference scan over the model's
    /// calibration area, with the sensor configuration it runs at.
    ///
    /// Dark references are taken with the lamp off unless the model is sheetfed.
    fn calculate_shading_session(
        &self,
        dev: &Device,
        sensor: &Sensor,
        is_dark: bool,
    ) -> Result<(Sensor, ScanSession)>;

    fn begin_scan(
        &self,
        dev: &mut Device,
        sensor: &Sensor,
        regs: &mut RegisterSet,
        start_motor: bool,
    ) -> Result<()>;

    fn end_scan(&self, dev: &mut Device, regs: &mut RegisterSet, check_stop: bool) -> Result<()>;

    /// Switch the transparency adapter lamp. Models without a separately wired
    /// lamp have nothing to do here.
    fn set_xpa_lamp_power(&self, dev: &mut Device, set: bool) -> Result<()> {
        debug!(model = %dev.model.name, set, "No secondary lamp to switch");
        Ok(())
    }

    fn set_motor_mode(&self, _dev: &mut Device, regs: &mut RegisterSet, mode: MotorMode) -> Result<()> {
        regs.state.motor_mode = mode;
        Ok(())
    }
}

/// Command set driving `asic_type`.
pub fn create_command_set(asic_type: AsicType) -> Result<Rc<dyn CommandSet>> {
    match asic_type {
        AsicType::Gl842 => Ok(Rc::new(CommandSetGl842)),
        AsicType::Gl847 => Ok(Rc::new(CommandSetGl847)),
        other => Err(GenesysError::status(
            SaneStatus::Unsupported,
            format!("no command set for {other}"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Register helpers shared by the chip families
// ---------------------------------------------------------------------------

const REG_0x01: u16 = 0x01;
const REG_0x01_SCAN: u8 = 0x01;
const REG_0x02: u16 = 0x02;
const REG_0x02_MTRPWR: u8 = 0x10;
const REG_0x03: u16 = 0x03;
const REG_0x03_LAMPPWR: u8 = 0x10;
const REG_0x05: u16 = 0x05;
const REG_0x05_DPIHW: u8 = 0xc0;
const REG_0x0D: u16 = 0x0d;
const REG_0x0D_CLRLNCNT: u8 = 0x01;
const REG_0x0D_CLRMCNT: u8 = 0x04;
const REG_0x0F: u16 = 0x0f;
const REG_0x40: u16 = 0x40;
const REG_0x40_DATAENB: u8 = 0x01;
const REG_0x40_MOTMFLG: u8 = 0x02;
const REG_0x41: u16 = 0x41;
const REG_0x41_MOTORENB: u8 = 0x01;
const REG_EXPR: u16 = 0x10;
const REG_EXPG: u16 = 0x12;
const REG_EXPB: u16 = 0x14;

/// Clear the SCAN bit so that writing the register set does not start a scan.
pub fn set_optical_off(asic_type: AsicType, regs: &mut RegisterSet) -> Result<()> {
    match asic_type {
        AsicType::Gl124 => regs.set8_mask(0x01, 0, 0x01),
        _ => regs.set8_mask(REG_0x01, 0, REG_0x01_SCAN),
    }
}

pub fn set_exposure(asic_type: AsicType, regs: &mut RegisterSet, exposure: &SensorExposure) -> Result<()> {
    if asic_type == AsicType::Gl124 {
        return Err(GenesysError::status(
            SaneStatus::Unsupported,
            "GL124 exposure registers are not supported",
        ));
    }
    regs.set16(REG_EXPR, exposure.red)?;
    regs.set16(REG_EXPG, exposure.green)?;
    regs.set16(REG_EXPB, exposure.blue)
}

/// Apply the sensor's register overlay and exposure.
pub fn setup_sensor(dev: &mut Device, sensor: &Sensor, regs: &mut RegisterSet) -> Result<()> {
    for reg in &sensor.custom_regs {
        regs.set8(reg.address, reg.value)?;
    }
    let asic_type = dev.model.asic_type;
    if asic_type != AsicType::Gl841 && asic_type != AsicType::Gl843 {
        set_exposure(asic_type, regs, &sensor.exposure)?;
    }
    dev.segment_order = sensor.segment_order.clone();
    Ok(())
}

/// Select the hardware dpi the sensor clock runs at.
pub fn set_dpihw(regs: &mut RegisterSet, dpihw: u32) -> Result<()> {
    let value = match dpihw {
        600 => 0x00,
        1200 => 0x40,
        2400 => 0x80,
        4800 => 0xc0,
        _ => return Err(GenesysError::invalid(format!("unknown dpihw value {dpihw}"))),
    };
    regs.set8_mask(REG_0x05, value, REG_0x05_DPIHW)
}

pub fn set_lamp_power(dev: &Device, sensor: &Sensor, regs: &mut RegisterSet, set: bool) -> Result<()> {
    let asic_type = dev.model.asic_type;
    if set {
        regs.set8_mask(REG_0x03, REG_0x03_LAMPPWR, REG_0x03_LAMPPWR)?;
        if asic_type == AsicType::Gl843 {
            set_exposure(asic_type, regs, &sensor.exposure)?;
        }
        // Infrared scans run with the flatbed lamp off.
        let ir_model = matches!(
            dev.model.model_id,
            ModelId::Canon8400f
                | ModelId::PlustekOpticfilm7200i
                | ModelId::PlustekOpticfilm7500i
                | ModelId::PlustekOpticfilm8200i
        );
        if ir_model && dev.settings.scan_method == ScanMethod::TransparencyInfrared {
            regs.set8_mask(REG_0x03, 0, REG_0x03_LAMPPWR)?;
        }
    } else {
        regs.set8_mask(REG_0x03, 0, REG_0x03_LAMPPWR)?;
        if asic_type == AsicType::Gl843 {
            set_exposure(asic_type, regs, &SensorExposure::new(0x0101, 0x0101, 0x0101))?;
        }
    }
    regs.state.is_lamp_on = set;
    Ok(())
}

pub fn set_motor_power(regs: &mut RegisterSet, set: bool) -> Result<()> {
    let value = if set { REG_0x02_MTRPWR } else { 0 };
    regs.set8_mask(REG_0x02, value, REG_0x02_MTRPWR)?;
    regs.state.is_motor_on = set;
    Ok(())
}

/// Setup for a shading reference scan of `pixels` pixels from `startx`, both at
/// `resolution`, beginning `starty` lines into the calibration strip.
pub fn shading_setup_params(
    dev: &Device,
    resolution: u32,
    startx: u32,
    pixels: u32,
    starty: u32,
    is_dark: bool,
) -> SetupParams {
    let settings = &dev.settings;
    let model = &dev.model;
    let is_transparency = matches!(
        settings.scan_method,
        ScanMethod::Transparency | ScanMethod::TransparencyInfrared
    );

    let calib_size_mm = if is_transparency {
        model.y_size_calib_ta_mm
    } else {
        model.y_size_calib_mm
    };
    let lines = ((calib_size_mm * resolution as f32 / MM_PER_INCH) as u32).max(1);

    let mut flags =
        ScanFlag::DISABLE_SHADING | ScanFlag::DISABLE_GAMMA | ScanFlag::DISABLE_BUFFER_FULL_MOVE;
    if is_transparency {
        flags |= ScanFlag::USE_XPA;
    }
    if is_dark && !model.is_sheetfed {
        flags |= ScanFlag::DISABLE_LAMP;
    }

    let channels = settings.channels();
    SetupParams {
        xres: resolution,
        yres: resolution,
        startx,
        starty,
        pixels,
        requested_pixels: 0,
        lines,
        depth: 16,
        channels,
        scan_method: Some(settings.scan_method),
        scan_mode: Some(if channels == 3 {
            ScanColorMode::ColorSinglePass
        } else {
            ScanColorMode::Gray
        }),
        color_filter: Some(settings.color_filter),
        flags,
    }
}

/// Gamma is only applied at 8 bit, and only when some channel actually has a curve.
pub fn should_enable_gamma(session: &ScanSession, sensor: &Sensor) -> bool {
    if session.params.flags.has(ScanFlag::DISABLE_GAMMA) {
        return false;
    }
    if sensor.gamma.iter().any(|&g| g == 1.0) {
        return false;
    }
    session.params.depth != 16
}

pub fn start_action(dev: &Device, start_motor: bool) -> Result<()> {
    let value = u8::from(start_motor);
    dev.interface.borrow_mut().write_register(REG_0x0F, value)
}

pub fn clear_scan_and_feed_counts(dev: &Device) -> Result<()> {
    let value = match dev.model.asic_type {
        AsicType::Gl841 | AsicType::Gl842 => REG_0x0D_CLRLNCNT,
        AsicType::Gl843
        | AsicType::Gl845
        | AsicType::Gl846
        | AsicType::Gl847
        | AsicType::Gl124 => REG_0x0D_CLRLNCNT | REG_0x0D_CLRMCNT,
        other => {
            return Err(GenesysError::status(
                SaneStatus::Unsupported,
                format!("clearing counters is not supported on {other}"),
            ))
        }
    };
    dev.interface.borrow_mut().write_register(REG_0x0D, value)
}

fn is_motor_stopped(dev: &Device) -> Result<bool> {
    let mut iface = dev.interface.borrow_mut();
    let status = iface.read_register(REG_0x41)?;
    let reg40 = iface.read_register(REG_0x40)?;
    Ok(status & REG_0x41_MOTORENB == 0 && reg40 & (REG_0x40_DATAENB | REG_0x40_MOTMFLG) == 0)
}

/// Stop the scan and wait for the motor to come to rest.
pub fn stop_action(dev: &Device, regs: &mut RegisterSet) -> Result<()> {
    if is_motor_stopped(dev)? {
        debug!("Motor is already stopped");
        return Ok(());
    }

    set_optical_off(dev.model.asic_type, regs)?;
    {
        let mut iface = dev.interface.borrow_mut();
        iface.write_register(REG_0x01, regs.get8(REG_0x01)?)?;
        iface.sleep_ms(100);
        if iface.is_mock() {
            return Ok(());
        }
    }

    for _ in 0..10 {
        if is_motor_stopped(dev)? {
            return Ok(());
        }
        dev.interface.borrow_mut().sleep_ms(100);
    }
    Err(GenesysError::status(SaneStatus::IoError, "could not stop motor"))
}

// ---------------------------------------------------------------------------
// Motor tables
// ---------------------------------------------------------------------------

/// Profile best suited for `exposure`: an exact `max_exposure` match, otherwise
/// the tightest profile that still covers it.
pub fn get_motor_profile_ptr<'a>(
    profiles: &'a [MotorProfile],
    exposure: u32,
    session: &ScanSession,
) -> Option<&'a MotorProfile> {
    let mut best: Option<&MotorProfile> = None;

    for profile in profiles {
        if !profile.resolutions.matches(&session.params.yres) {
            continue;
        }
        if !profile.scan_methods.matches(&session.params.scan_method()) {
            continue;
        }
        if profile.max_exposure == exposure {
            return Some(profile);
        }
        if profile.max_exposure == 0 || profile.max_exposure >= exposure {
            best = match best {
                Some(current) if current.max_exposure <= profile.max_exposure => Some(current),
                _ => Some(profile),
            };
        }
    }
    best
}

pub fn get_motor_profile<'a>(
    profiles: &'a [MotorProfile],
    exposure: u32,
    session: &ScanSession,
) -> Result<&'a MotorProfile> {
    get_motor_profile_ptr(profiles, exposure, session).ok_or_else(|| {
        GenesysError::invalid(format!(
            "Motor slope is not configured for exposure {exposure} at {} dpi",
            session.params.yres
        ))
    })
}

/// Acceleration table for scanning at `ydpi` with the given line exposure.
pub fn create_slope_table(
    asic_type: AsicType,
    motor: &Motor,
    ydpi: u32,
    exposure: u32,
    step_multiplier: usize,
    profile: &MotorProfile,
) -> Result<MotorSlopeTable> {
    let target_speed_w = (u64::from(exposure) * u64::from(ydpi) / u64::from(motor.base_ydpi)) as u32;
    create_slope_table_for_speed(
        &profile.slope,
        target_speed_w,
        profile.step_type,
        step_multiplier,
        2 * step_multiplier,
        get_slope_table_max_size(asic_type)?,
    )
}

/// Acceleration table up to the fastest speed the profile allows.
pub fn create_slope_table_fastest(
    asic_type: AsicType,
    step_multiplier: usize,
    profile: &MotorProfile,
) -> Result<MotorSlopeTable> {
    create_slope_table_for_speed(
        &profile.slope,
        profile.slope.max_speed_w,
        profile.step_type,
        step_multiplier,
        2 * step_multiplier,
        get_slope_table_max_size(asic_type)?,
    )
}

/// Lowest vertical resolution the model offers for the current scan method.
pub fn get_lowest_ydpi(dev: &Device) -> Result<u32> {
    Ok(dev
        .model
        .get_resolution_settings(dev.settings.scan_method)?
        .min_resolution_y())
}

/// Upload slope table `table_nr` to the ASIC.
pub fn send_slope_table(dev: &Device, sensor: &Sensor, table_nr: u32, steps: &[u16]) -> Result<()> {
    if table_nr > 4 {
        return Err(GenesysError::invalid(format!("invalid slope table {table_nr}")));
    }
    let asic_type = dev.model.asic_type;

    let mut table: Vec<u8> = steps.iter().flat_map(|s| s.to_le_bytes()).collect();

    // Some chips always read the full table; pad it with the final speed.
    if asic_type == AsicType::Gl841 || dev.model.model_id == ModelId::CanonLide90 {
        let max_bytes = get_slope_table_max_size(asic_type)? * 2;
        let last = steps.last().copied().unwrap_or(0).to_le_bytes();
        while table.len() < max_bytes {
            table.extend_from_slice(&last);
        }
    }

    let mut iface = dev.interface.borrow_mut();
    if iface.is_mock() {
        iface.record_slope_table(table_nr, steps);
    }

    match asic_type {
        AsicType::Gl841 | AsicType::Gl842 => {
            let start_address = match sensor.register_dpihw {
                600 => 0x08000,
                1200 => 0x10000,
                2400 => 0x20000,
                other => {
                    return Err(GenesysError::invalid(format!(
                        "unexpected dpihw {other} for slope tables"
                    )))
                }
            };
            iface.write_buffer(0x3c, start_address + 0x200 * table_nr, &table)
        }
        AsicType::Gl843 => iface.write_gamma(0x28, 0x40000 + 0x8000 * table_nr, &table),
        AsicType::Gl845 | AsicType::Gl846 | AsicType::Gl847 | AsicType::Gl124 => {
            iface.write_ahb(0x1000_0000 + 0x4000 * table_nr, &table)
        }
        other => Err(GenesysError::status(
            SaneStatus::Unsupported,
            format!("slope tables are not supported on {other}"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Image pipeline
// ---------------------------------------------------------------------------

/// Build the node chain that turns raw lines read from the scanner into the
/// rows the frontend asked for.
pub fn build_image_pipeline(
    dev: &mut Device,
    sensor: &Sensor,
    session: &ScanSession,
) -> Result<ImagePipelineStack> {
    dev.pipeline_index += 1;
    let pipeline_index = dev.pipeline_index;
    let dump_path = |step: &str| {
        dev.debug_dump_dir
            .as_ref()
            .map(|dir| dir.join(format!("gl_pipeline_{pipeline_index}_{step}.tiff")))
    };

    let is_cis = dev.model.is_cis;
    let model_flags = dev.model.flags;
    let color_order = dev.model.line_mode_color_order;
    let channels = if is_cis { 1 } else { session.params.channels };
    let format = PixelFormat::create(session.params.depth, channels, color_order)?;
    let depth = format.depth();
    let width = format.pixels_from_row_bytes(session.output_line_bytes_raw as usize);

    let interface = Rc::clone(&dev.interface);
    let read_data_from_usb: ProducerCallback = Box::new(move |data: &mut [u8]| {
        debug!(size = data.len(), "read_data_from_usb");
        interface.borrow_mut().bulk_read_data(BULK_IN_IMAGE, data)?;
        Ok(true)
    });

    let lines = session.optical_line_count as usize;
    // Reads have to come in multiples of two bytes.
    let buffer_size = align_multiple_ceil(session.buffer_size_read as u64, 2) as usize;

    let mut source = BufferedCallableSource::new(width, lines, format, buffer_size, read_data_from_usb);
    source.set_last_read_multiple(Some(2));

    let mut pipeline = ImagePipelineStack::new();
    pipeline.push_first_node(source)?;

    if let Some(path) = dump_path("0_from_usb") {
        pipeline.push_node(|src| Ok(DebugDump::new(src, path)))?;
    }

    if session.segment_count > 1 {
        let output_width = (session.output_segment_pixel_group_count * session.segment_count) as usize;
        let segment_order = dev.segment_order.clone();
        let conseq_pixel_dist = session.conseq_pixel_dist as usize;
        pipeline.push_node(|src| {
            Desegment::new(src, output_width, segment_order, conseq_pixel_dist, 1, 1)
        })?;
        if let Some(path) = dump_path("1_after_desegment") {
            pipeline.push_node(|src| Ok(DebugDump::new(src, path)))?;
        }
    }

    if depth == 16 && model_flags.has(ModelFlag::SWAP_16BIT_DATA) {
        pipeline.push_node(|src| Ok(Swap16BitEndian::new(src)))?;
    }

    if model_flags.has(ModelFlag::INVERT_PIXEL_DATA) {
        pipeline.push_node(Invert::new)?;
    }

    if is_cis && session.params.channels == 3 {
        pipeline.push_node(|src| MergeMonoLines::new(src, color_order))?;
        if let Some(path) = dump_path("2_after_merge") {
            pipeline.push_node(|src| Ok(DebugDump::new(src, path)))?;
        }
    }

    match pipeline.output_format()? {
        PixelFormat::Bgr888 => pipeline.push_node(|src| FormatConvert::new(src, PixelFormat::Rgb888))?,
        PixelFormat::Bgr161616 => {
            pipeline.push_node(|src| FormatConvert::new(src, PixelFormat::Rgb161616))?
        }
        _ => {}
    }

    if session.max_color_shift_lines > 0 && session.params.channels == 3 {
        let (r, g, b) = (
            session.color_shift_lines_r as usize,
            session.color_shift_lines_g as usize,
            session.color_shift_lines_b as usize,
        );
        pipeline.push_node(|src| ComponentShiftLines::new(src, r, g, b))?;
        if let Some(path) = dump_path("3_after_color_unshift") {
            pipeline.push_node(|src| Ok(DebugDump::new(src, path)))?;
        }
    }

    if !session.stagger_x.is_empty() {
        let shifts = session.stagger_x.shifts().to_vec();
        pipeline.push_node(|src| PixelShiftColumns::new(src, shifts))?;
    }

    if session.num_staggered_lines > 0 {
        let shifts = session.stagger_y.shifts().to_vec();
        pipeline.push_node(|src| PixelShiftLines::new(src, shifts))?;
        if let Some(path) = dump_path("4_after_unstagger") {
            pipeline.push_node(|src| Ok(DebugDump::new(src, path)))?;
        }
    }

    if session.use_host_side_calib
        && !model_flags.has(ModelFlag::DISABLE_SHADING_CALIBRATION)
        && !session.params.flags.has(ScanFlag::DISABLE_SHADING)
    {
        // The references are laid out like the calibration scan that produced them.
        let (calib_channels, calib_pixel_offset) = if dev.calib_session.computed {
            (dev.calib_session.params.channels, dev.calib_session.shading_pixel_offset)
        } else {
            (session.params.channels, session.shading_pixel_offset)
        };
        let offset_pixels =
            (i64::from(session.params.startx) + i64::from(calib_pixel_offset)).max(0) as usize;
        let offset = offset_pixels * calib_channels as usize;
        let (dark, white) = (&dev.dark_average_data, &dev.white_average_data);
        pipeline.push_node(|src| Calibrate::new(src, dark, white, offset))?;
        if let Some(path) = dump_path("5_after_calibrate") {
            pipeline.push_node(|src| Ok(DebugDump::new(src, path)))?;
        }
    }

    let requested_pixels = session.params.requested_pixels() as usize;
    if pipeline.output_width()? != requested_pixels {
        pipeline.push_node(|src| ScaleRows::new(src, requested_pixels))?;
    }

    debug!(
        sensor = %sensor.sensor_id,
        nodes = pipeline.node_count(),
        width = pipeline.output_width()?,
        height = pipeline.output_height()?,
        "Image pipeline"
    );
    Ok(pipeline)
}

/// Build the pipeline for `session` and hand it to the device as its read buffer.
pub fn setup_image_pipeline(dev: &mut Device, sensor: &Sensor, session: &ScanSession) -> Result<()> {
    dev.clear_pipeline();
    let mut pipeline = build_image_pipeline(dev, sensor, session)?;

    let output_format = pipeline.output_format()?;
    let output_width = pipeline.output_width()?;
    let output_height = pipeline.output_height()?;
    let row_bytes = pipeline.output_row_bytes()?;
    info!(
        format = %output_format,
        width = output_width,
        height = output_height,
        row_bytes,
        "Pipeline ready"
    );

    let read_from_pipeline: ProducerCallback =
        Box::new(move |out: &mut [u8]| pipeline.get_next_row_data(out));
    dev.set_pipeline(
        ImageBuffer::new(row_bytes, read_from_pipeline),
        PipelineOutput {
            format: output_format,
            width: output_width,
            height: output_height,
            row_bytes,
        },
    );
    Ok(())
}

/// Geometry of the rows the current pipeline delivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineOutput {
    pub format: PixelFormat,
    pub width: usize,
    pub height: usize,
    pub row_bytes: usize,
}
