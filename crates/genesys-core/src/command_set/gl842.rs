//! GL842 command set (Canon LiDE 90, Plustek OpticFilm 7200).

use tracing::{debug, info};

use super::{
    clear_scan_and_feed_counts, create_slope_table, create_slope_table_fastest, get_motor_profile,
    get_motor_profile_ptr, send_slope_table, set_dpihw, set_lamp_power, set_motor_power,
    set_optical_off, setup_image_pipeline, setup_sensor, shading_setup_params, should_enable_gamma,
    start_action, stop_action, CommandSet, FrontendSet,
};
use crate::consts::{
    BACKTRACK_TABLE, FAST_TABLE, GL842_ZMOD_MAX_YRES, HOME_TABLE, MM_PER_INCH, SCAN_TABLE, STOP_TABLE,
};
use crate::device::{Device, ScanHeadId};
use crate::error::{GenesysError, Result, SaneStatus};
use crate::frontend::FrontendType;
use crate::model::{AsicType, ModelFlag, ModelId};
use crate::motor::{calculate_zmod, MotorProfile};
use crate::register::{MotorMode, RegisterSet};
use crate::sensor::Sensor;
use crate::session::{compute_session, ScanSession};
use crate::settings::{ColorFilter, ScanFlag, ScanMethod, SetupParams, Settings};

/// GL842 register addresses and bit fields.
pub mod regs {
    pub const REG_0x01: u16 = 0x01;
    pub const REG_0x01_CISSET: u8 = 0x80;
    pub const REG_0x01_DOGENB: u8 = 0x40;
    pub const REG_0x01_DVDSET: u8 = 0x20;
    pub const REG_0x01_SHDAREA: u8 = 0x02;
    pub const REG_0x01_SCAN: u8 = 0x01;

    pub const REG_0x02: u16 = 0x02;
    pub const REG_0x02_NOTHOME: u8 = 0x80;
    pub const REG_0x02_ACDCDIS: u8 = 0x40;
    pub const REG_0x02_AGOHOME: u8 = 0x20;
    pub const REG_0x02_MTRPWR: u8 = 0x10;
    pub const REG_0x02_FASTFED: u8 = 0x08;
    pub const REG_0x02_MTRREV: u8 = 0x04;

    pub const REG_0x03: u16 = 0x03;
    pub const REG_0x03_AVEENB: u8 = 0x40;
    pub const REG_0x03_XPASEL: u8 = 0x20;
    pub const REG_0x03_LAMPPWR: u8 = 0x10;

    pub const REG_0x04: u16 = 0x04;
    pub const REG_0x04_LINEART: u8 = 0x80;
    pub const REG_0x04_BITSET: u8 = 0x40;
    pub const REG_0x04_AFEMOD: u8 = 0x30;
    pub const REG_0x04_FILTER: u8 = 0x0c;
    pub const REG_0x04_FESET: u8 = 0x03;

    pub const REG_0x05: u16 = 0x05;
    pub const REG_0x05_DPIHW: u8 = 0xc0;
    pub const REG_0x05_GMMENB: u8 = 0x08;

    pub const REG_0x0D: u16 = 0x0d;
    pub const REG_0x0D_CLRLNCNT: u8 = 0x01;

    pub const REG_0x0E: u16 = 0x0e;

    pub const REG_EXPR: u16 = 0x10;
    pub const REG_EXPG: u16 = 0x12;
    pub const REG_EXPB: u16 = 0x14;

    pub const REG_0x1C: u16 = 0x1c;
    pub const REG_0x1C_TGTIME: u8 = 0x07;
    pub const REG_0x1E: u16 = 0x1e;

    pub const REG_STEPNO: u16 = 0x21;
    pub const REG_FWDSTEP: u16 = 0x22;
    pub const REG_BWDSTEP: u16 = 0x23;
    pub const REG_FASTNO: u16 = 0x24;
    pub const REG_LINCNT: u16 = 0x25;

    pub const REG_0x2A: u16 = 0x2a;
    pub const REG_0x2B: u16 = 0x2b;
    pub const REG_DPISET: u16 = 0x2c;
    pub const REG_0x2E: u16 = 0x2e;
    pub const REG_0x2F: u16 = 0x2f;

    pub const REG_STRPIXEL: u16 = 0x30;
    pub const REG_ENDPIXEL: u16 = 0x32;
    pub const REG_DUMMY: u16 = 0x34;
    pub const REG_MAXWD: u16 = 0x35;
    pub const REG_LPERIOD: u16 = 0x38;
    pub const REG_FEEDL: u16 = 0x3d;

    pub const REG_0x40: u16 = 0x40;
    pub const REG_0x40_DATAENB: u8 = 0x01;
    pub const REG_0x40_MOTMFLG: u8 = 0x02;

    pub const REG_0x41: u16 = 0x41;
    pub const REG_0x41_MOTORENB: u8 = 0x01;
    pub const REG_0x41_FEBUSY: u8 = 0x02;

    pub const REG_FMOVDEC: u16 = 0x5f;
    pub const REG_Z1MOD: u16 = 0x60;
    pub const REG_Z2MOD: u16 = 0x63;

    pub const REG_0x67: u16 = 0x67;
    pub const REG_0x67_STEPSEL: u8 = 0xc0;
    pub const REG_0x67S_STEPSEL: u32 = 6;

    pub const REG_0x68: u16 = 0x68;
    pub const REG_0x68_FSTPSEL: u8 = 0xc0;
    pub const REG_0x68S_FSTPSEL: u32 = 6;

    pub const REG_FSHDEC: u16 = 0x69;
    pub const REG_FMOVNO: u16 = 0x6a;

    pub const REG_0x6B: u16 = 0x6b;
    pub const REG_0x6C: u16 = 0x6c;
    pub const REG_0x6D: u16 = 0x6d;
    pub const REG_0x6E: u16 = 0x6e;
    pub const REG_0x6F: u16 = 0x6f;

    pub const REG_0x80: u16 = 0x80;
    pub const REG_0x80_TABLE1_NORMAL: u8 = 0x03;
    pub const REG_0x80S_TABLE1_NORMAL: u32 = 0;
    pub const REG_0x80_TABLE2_BACK: u8 = 0x0c;
    pub const REG_0x80S_TABLE2_BACK: u32 = 2;
    pub const REG_0x80_TABLE4_FAST: u8 = 0x30;
    pub const REG_0x80S_TABLE4_FAST: u32 = 4;
    pub const REG_0x80_TABLE5_GO_HOME: u8 = 0xc0;
    pub const REG_0x80S_TABLE5_GO_HOME: u32 = 6;
}

use regs::*;

/// Motor steps per slope table entry.
const STEP_MULTIPLIER: usize = 2;

#[derive(Clone, Copy, Debug, Default)]
pub struct CommandSetGl842;

/// Boot sequence the OpticFilm 7200 expects in its internal memory.
const OPTICFILM_7200_BOOT_DATA: [u8; 32] = [
    0xd0, 0x38, 0x07, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x6a, 0x73, 0x63, 0x68, 0x69, 0x65, 0x6e, 0x00,
];

fn vref_bits(vref: i32, shift: u32, mask: u8) -> u8 {
    ((vref << shift) as u8) & mask
}

struct MotorScan<'a> {
    profile: &'a MotorProfile,
    exposure: u32,
    scan_yres: u32,
    scan_lines: u32,
    scan_dummy: u32,
    feed_steps: u32,
    flags: ScanFlag,
}

fn init_motor_regs_scan(
    dev: &Device,
    sensor: &Sensor,
    session: &ScanSession,
    regs: &mut RegisterSet,
    scan: MotorScan<'_>,
) -> Result<()> {
    debug!(
        exposure = scan.exposure,
        scan_yres = scan.scan_yres,
        step_type = %scan.profile.step_type,
        scan_lines = scan.scan_lines,
        scan_dummy = scan.scan_dummy,
        feed_steps = scan.feed_steps,
        flags = %scan.flags,
        "init_motor_regs_scan"
    );
    let asic_type = dev.model.asic_type;

    let mut use_fast_fed =
        (scan.scan_yres >= 300 && scan.feed_steps > 900) || scan.flags.has(ScanFlag::FEEDING);
    if dev.model.flags.has(ModelFlag::DISABLE_FAST_FEEDING) {
        use_fast_fed = false;
    }

    regs.set24(REG_LINCNT, scan.scan_lines)?;

    regs.set8(REG_0x02, 0)?;
    set_motor_power(regs, true)?;

    let mut reg02 = regs.get8(REG_0x02)?;
    if use_fast_fed {
        reg02 |= REG_0x02_FASTFED;
    } else {
        reg02 &= !REG_0x02_FASTFED;
    }
    if scan.flags.has(ScanFlag::AUTO_GO_HOME) {
        reg02 |= REG_0x02_AGOHOME | REG_0x02_NOTHOME;
    }
    if scan.flags.has(ScanFlag::DISABLE_BUFFER_FULL_MOVE)
        || scan.scan_yres >= 2400
        || scan.scan_yres >= sensor.full_resolution
    {
        reg02 |= REG_0x02_ACDCDIS;
    }
    if scan.flags.has(ScanFlag::REVERSE) {
        reg02 |= REG_0x02_MTRREV;
    } else {
        reg02 &= !REG_0x02_MTRREV;
    }
    regs.set8(REG_0x02, reg02)?;

    let scan_table = create_slope_table(
        asic_type,
        &dev.motor,
        scan.scan_yres,
        scan.exposure,
        STEP_MULTIPLIER,
        scan.profile,
    )?;
    send_slope_table(dev, sensor, SCAN_TABLE, &scan_table.table)?;
    send_slope_table(dev, sensor, BACKTRACK_TABLE, &scan_table.table)?;
    send_slope_table(dev, sensor, STOP_TABLE, &scan_table.table)?;

    let scan_steps = (scan_table.len() / STEP_MULTIPLIER) as u8;
    regs.set8(REG_STEPNO, scan_steps)?;
    regs.set8(REG_FASTNO, scan_steps)?;
    regs.set8(REG_FSHDEC, scan_steps)?;

    let fast_profile = get_motor_profile_ptr(&dev.motor.fast_profiles, 0, session).unwrap_or(scan.profile);
    let fast_table = create_slope_table_fastest(asic_type, STEP_MULTIPLIER, fast_profile)?;
    send_slope_table(dev, sensor, FAST_TABLE, &fast_table.table)?;
    send_slope_table(dev, sensor, HOME_TABLE, &fast_table.table)?;

    let fast_steps = (fast_table.len() / STEP_MULTIPLIER) as u8;
    regs.set8(REG_FMOVNO, fast_steps)?;

    if scan.profile.motor_vref != -1 && fast_profile.motor_vref != 1 {
        let vref = vref_bits(scan.profile.motor_vref, REG_0x80S_TABLE1_NORMAL, REG_0x80_TABLE1_NORMAL)
            | vref_bits(scan.profile.motor_vref, REG_0x80S_TABLE2_BACK, REG_0x80_TABLE2_BACK)
            | vref_bits(fast_profile.motor_vref, REG_0x80S_TABLE4_FAST, REG_0x80_TABLE4_FAST)
            | vref_bits(fast_profile.motor_vref, REG_0x80S_TABLE5_GO_HOME, REG_0x80_TABLE5_GO_HOME);
        regs.set8(REG_0x80, vref)?;
    }

    // The acceleration distance is covered by the slope tables, not by FEEDL.
    let mut feedl = scan.feed_steps << scan.profile.step_type.shift();
    let mut dist = (scan_table.len() / STEP_MULTIPLIER) as u32;
    if use_fast_fed {
        dist += (fast_table.len() / STEP_MULTIPLIER) as u32 * 2;
    }
    if dist < feedl {
        feedl -= dist;
    } else {
        feedl = 1;
    }
    regs.set24(REG_FEEDL, feedl)?;

    let accel_steps = scan_table.len() / STEP_MULTIPLIER;
    let (mut z1, mut z2) = calculate_zmod(
        use_fast_fed,
        scan.exposure,
        &scan_table.table,
        accel_steps,
        feedl,
        accel_steps as u32,
    )?;
    if scan.scan_yres > GL842_ZMOD_MAX_YRES {
        z1 = 0;
        z2 = 0;
    }
    regs.set24(REG_Z1MOD, z1)?;
    regs.set24(REG_Z2MOD, z2)?;

    regs.set8_mask(REG_0x1E, scan.scan_dummy as u8, 0x0f)?;
    regs.set8_mask(
        REG_0x67,
        (scan.profile.step_type.shift() << REG_0x67S_STEPSEL) as u8,
        REG_0x67_STEPSEL,
    )?;
    regs.set8_mask(
        REG_0x68,
        (fast_profile.step_type.shift() << REG_0x68S_FSTPSEL) as u8,
        REG_0x68_FSTPSEL,
    )?;

    // steps for the STOP table
    regs.set8(REG_FMOVDEC, fast_steps)?;
    Ok(())
}

fn init_optical_regs_scan(
    cmd: &CommandSetGl842,
    dev: &mut Device,
    sensor: &Sensor,
    regs: &mut RegisterSet,
    exposure: u32,
    session: &ScanSession,
) -> Result<()> {
    setup_sensor(dev, sensor, regs)?;
    cmd.set_fe(dev, sensor, FrontendSet::Set)?;

    set_optical_off(dev.model.asic_type, regs)?;
    let flags = session.params.flags;
    let reg01 = regs.find_reg_mut(REG_0x01)?;
    if flags.has(ScanFlag::DISABLE_SHADING)
        || dev.model.flags.has(ModelFlag::DISABLE_SHADING_CALIBRATION)
        || session.use_host_side_calib
    {
        reg01.value &= !REG_0x01_DVDSET;
    } else {
        reg01.value |= REG_0x01_DVDSET;
    }
    reg01.value |= REG_0x01_SHDAREA;

    regs.find_reg_mut(REG_0x03)?.value &= !REG_0x03_AVEENB;

    set_lamp_power(dev, sensor, regs, !flags.has(ScanFlag::DISABLE_LAMP))?;

    let reg03 = regs.find_reg_mut(REG_0x03)?;
    reg03.value &= !REG_0x03_XPASEL;
    if flags.has(ScanFlag::USE_XPA) {
        reg03.value |= REG_0x03_XPASEL;
    }
    regs.state.is_xpa_on = flags.has(ScanFlag::USE_XPA);

    // black/white threshold
    regs.set8(REG_0x2E, 0x7f)?;
    regs.set8(REG_0x2F, 0x7f)?;

    let mut reg04 = regs.get8(REG_0x04)? & REG_0x04_FESET;
    if session.params.depth == 16 {
        reg04 |= REG_0x04_BITSET;
    }
    if session.params.channels == 1 {
        reg04 |= match session.params.color_filter() {
            ColorFilter::Red => 0x14,
            ColorFilter::Blue => 0x1c,
            ColorFilter::Green => 0x18,
            ColorFilter::None => 0x00,
        };
    } else {
        reg04 |= match dev.frontend.layout.frontend_type {
            FrontendType::Wolfson => 0x10,
            FrontendType::AnalogDevices => 0x20,
            other => {
                return Err(GenesysError::invalid(format!("invalid frontend type {other:?}")));
            }
        };
    }
    regs.set8(REG_0x04, reg04)?;

    let dpihw = dev
        .find_sensor(
            session.output_resolution,
            session.params.channels,
            session.params.scan_method(),
        )?
        .register_dpihw;
    set_dpihw(regs, dpihw)?;

    let gamma = if should_enable_gamma(session, sensor) {
        REG_0x05_GMMENB
    } else {
        0
    };
    regs.set8_mask(REG_0x05, gamma, REG_0x05_GMMENB)?;

    regs.set16(REG_DPISET, sensor.register_dpiset as u16)?;
    regs.set16(REG_STRPIXEL, session.pixel_startx as u16)?;
    regs.set16(REG_ENDPIXEL, session.pixel_endx as u16)?;

    if dev.model.is_cis {
        regs.set24(REG_MAXWD, session.output_line_bytes_raw * session.params.channels)?;
    } else {
        regs.set24(REG_MAXWD, session.output_line_bytes_raw)?;
    }

    let tgtime = exposure / 65536 + 1;
    regs.set16(REG_LPERIOD, (exposure / tgtime) as u16)?;
    regs.set8(REG_DUMMY, sensor.dummy_pixel as u8)?;
    Ok(())
}

impl CommandSet for CommandSetGl842 {
    fn asic_type(&self) -> AsicType {
        AsicType::Gl842
    }

    fn asic_boot(&self, dev: &mut Device, cold: bool) -> Result<()> {
        debug!(model = %dev.model.name, cold, "asic_boot");
        if cold {
            let mut iface = dev.interface.borrow_mut();
            iface.write_register(REG_0x0E, 0x01)?;
            iface.write_register(REG_0x0E, 0x00)?;
        }

        let sensor = dev.find_sensor_any()?.clone();
        let mut regs = RegisterSet::new();
        for reg in &dev.initial_regs {
            regs.init_reg(reg.address, reg.value);
        }
        set_dpihw(&mut regs, sensor.register_dpihw)?;
        setup_sensor(dev, &sensor, &mut regs)?;
        dev.interface.borrow_mut().write_registers(&regs)?;
        dev.reg = regs;

        let mut iface = dev.interface.borrow_mut();
        if dev.model.model_id == ModelId::PlustekOpticfilm7200 {
            iface.write_buffer(0x3c, 0x010a00, &OPTICFILM_7200_BOOT_DATA)?;
        }

        iface.write_register(REG_0x2A, 0x00)?;
        iface.write_register(REG_0x2B, 0x00)?;

        for address in [REG_0x6E, REG_0x6F] {
            if let Ok(value) = dev.gpo_regs.get_value(address) {
                iface.write_register(address, value)?;
            }
        }
        iface.sleep_ms(100);
        Ok(())
    }

    fn set_fe(&self, dev: &mut Device, sensor: &Sensor, set: FrontendSet) -> Result<()> {
        debug!(?set, "set_fe");
        if set == FrontendSet::Init {
            dev.frontend = dev.frontend_initial.clone();
        }

        let mut iface = dev.interface.borrow_mut();
        let fe_type = iface.read_register(REG_0x04)? & REG_0x04_FESET;
        if fe_type == 2 || dev.model.model_id == ModelId::CanonLide90 {
            for reg in &dev.frontend.regs {
                iface.write_fe_register(reg.address as u8, reg.value)?;
            }
            return Ok(());
        }
        if fe_type != 0 {
            return Err(GenesysError::status(
                SaneStatus::Unsupported,
                format!("unsupported frontend type {fe_type}"),
            ));
        }

        for i in 1..=3u8 {
            iface.write_fe_register(i, dev.frontend.regs.get_value(u16::from(i))?)?;
        }
        for reg in &sensor.custom_fe_regs {
            iface.write_fe_register(reg.address as u8, reg.value)?;
        }
        for i in 0..3 {
            iface.write_fe_register(0x20 + i as u8, dev.frontend.get_offset(i))?;
        }
        for i in 0..3 {
            iface.write_fe_register(0x28 + i as u8, dev.frontend.get_gain(i))?;
        }
        Ok(())
    }

    fn calculate_scan_session(
        &self,
        dev: &Device,
        sensor: &Sensor,
        settings: &Settings,
    ) -> Result<ScanSession> {
        debug!(?settings, "calculate_scan_session");
        let model = &dev.model;
        let mut flags = ScanFlag::NONE;

        let is_transparency = matches!(
            settings.scan_method,
            ScanMethod::Transparency | ScanMethod::TransparencyInfrared
        );
        let mut move_mm = 0.0f32;
        if is_transparency {
            // The sensor already sits at the transparency adapter.
            if !dev.ignore_offsets {
                move_mm = model.y_offset_ta - model.y_offset_sensor_to_ta;
            }
            flags |= ScanFlag::USE_XPA;
        } else if !dev.ignore_offsets {
            move_mm = model.y_offset;
        }
        move_mm += settings.tl_y;
        let move_steps = move_mm * dev.motor.base_ydpi as f32 / MM_PER_INCH;

        let start_mm = if is_transparency { model.x_offset_ta } else { model.x_offset } + settings.tl_x;
        let start = start_mm * settings.xres as f32 / MM_PER_INCH;

        let mut session = ScanSession::new(SetupParams {
            xres: settings.xres,
            yres: settings.yres,
            startx: start.max(0.0) as u32,
            starty: move_steps.max(0.0) as u32,
            pixels: settings.pixels,
            requested_pixels: settings.requested_pixels,
            lines: settings.lines,
            depth: settings.depth,
            channels: settings.channels(),
            scan_method: Some(settings.scan_method),
            scan_mode: Some(settings.scan_mode),
            color_filter: Some(settings.color_filter),
            flags,
        });
        compute_session(model, &dev.motor, sensor, &mut session)?;
        Ok(session)
    }

    fn init_regs_for_scan_session(
        &self,
        dev: &mut Device,
        sensor: &Sensor,
        regs: &mut RegisterSet,
        session: &ScanSession,
    ) -> Result<()> {
        session.assert_computed()?;

        // A CIS colour scan is three gray lines per output line.
        let dummy = 0;
        let slope_dpi = if dev.model.is_cis {
            session.params.yres * session.params.channels
        } else {
            session.params.yres
        } * (1 + dummy);

        let mut exposure = u32::try_from(sensor.exposure_lperiod)
            .map_err(|_| GenesysError::invalid("exposure not defined in sensor definition"))?;
        if dev.model.model_id == ModelId::CanonLide90 {
            exposure *= 2;
        }

        init_optical_regs_scan(self, dev, sensor, regs, exposure, session)?;

        let profile = get_motor_profile(&dev.motor.profiles, exposure, session)?;
        init_motor_regs_scan(
            dev,
            sensor,
            session,
            regs,
            MotorScan {
                profile,
                exposure,
                scan_yres: slope_dpi,
                scan_lines: session.optical_line_count,
                scan_dummy: dummy,
                feed_steps: session.params.starty,
                flags: session.params.flags,
            },
        )?;

        setup_image_pipeline(dev, sensor, session)?;

        dev.read_active = true;
        dev.session = session.clone();
        dev.total_bytes_read = 0;
        dev.total_bytes_to_read =
            u64::from(session.output_line_bytes_requested) * u64::from(session.params.lines);
        info!(
            total_bytes = dev.total_bytes_to_read,
            lines = session.params.lines,
            "Registers ready for scan"
        );
        Ok(())
    }

    fn calculate_shading_session(
        &self,
        dev: &Device,
        sensor: &Sensor,
        is_dark: bool,
    ) -> Result<(Sensor, ScanSession)> {
        let model = &dev.model;
        let settings = &dev.settings;
        let resolution = if sensor.shading_resolution != 0 {
            sensor.shading_resolution
        } else {
            settings.xres
        };
        let calib_sensor = dev
            .find_sensor(resolution, settings.channels(), settings.scan_method)?
            .clone();

        let is_transparency = matches!(
            settings.scan_method,
            ScanMethod::Transparency | ScanMethod::TransparencyInfrared
        );
        let to_pixels = |mm: f32| (mm * resolution as f32 / MM_PER_INCH).max(0.0) as u32;
        // On the adapter only the film window is lit.
        let (startx, pixels, move_mm) = if is_transparency {
            (
                to_pixels(model.x_offset_ta),
                to_pixels(model.x_size_ta),
                model.y_offset_calib_white_ta - model.y_offset_sensor_to_ta,
            )
        } else {
            (0, to_pixels(model.x_size_calib_mm), model.y_offset_calib_white)
        };

        let starty = to_pixels(move_mm);
        let params = shading_setup_params(dev, resolution, startx, pixels, starty, is_dark);
        debug!(
            resolution,
            startx,
            starty,
            pixels,
            lines = params.lines,
            is_dark,
            "calculate_shading_session"
        );
        let mut session = ScanSession::new(params);
        compute_session(model, &dev.motor, &calib_sensor, &mut session)?;
        Ok((calib_sensor, session))
    }

    fn begin_scan(
        &self,
        dev: &mut Device,
        _sensor: &Sensor,
        regs: &mut RegisterSet,
        start_motor: bool,
    ) -> Result<()> {
        let model_flags = dev.model.flags;
        if regs.state.is_xpa_on && regs.state.is_lamp_on && !model_flags.has(ModelFlag::TA_NO_SECONDARY_LAMP) {
            self.set_xpa_lamp_power(dev, true)?;
        }
        if regs.state.is_xpa_on && !model_flags.has(ModelFlag::UTA_NO_SECONDARY_MOTOR) {
            self.set_motor_mode(dev, regs, MotorMode::PrimaryAndSecondary)?;
        }

        if dev.model.model_id == ModelId::CanonLide90 {
            let mut iface = dev.interface.borrow_mut();
            if dev.session.params.flags.has(ScanFlag::REVERSE) {
                iface.write_register(REG_0x6B, 0x01)?;
                iface.write_register(REG_0x6C, 0x02)?;
            } else {
                iface.write_register(REG_0x6B, 0x03)?;
                let gpio = match dev.session.params.xres {
                    150 => Some(0x74),
                    300 => Some(0x38),
                    600 => Some(0x1c),
                    1200 => Some(0x2c),
                    2400 => Some(0x0c),
                    _ => None,
                };
                if let Some(value) = gpio {
                    iface.write_register(REG_0x6C, value)?;
                }
            }
            iface.sleep_ms(100);
        }

        clear_scan_and_feed_counts(dev)?;

        {
            let mut iface = dev.interface.borrow_mut();
            let value = iface.read_register(REG_0x01)? | REG_0x01_SCAN;
            iface.write_register(REG_0x01, value)?;
        }

        start_action(dev, start_motor)?;

        if regs.state.is_motor_on {
            match regs.state.motor_mode {
                MotorMode::Primary => dev.advance_head_pos_by_session(ScanHeadId::Primary)?,
                MotorMode::PrimaryAndSecondary => {
                    dev.advance_head_pos_by_session(ScanHeadId::Primary)?;
                    dev.advance_head_pos_by_session(ScanHeadId::Secondary)?;
                }
                MotorMode::Secondary => dev.advance_head_pos_by_session(ScanHeadId::Secondary)?,
            }
        }
        Ok(())
    }

    fn end_scan(&self, dev: &mut Device, regs: &mut RegisterSet, check_stop: bool) -> Result<()> {
        debug!(check_stop, "end_scan");
        if regs.state.is_xpa_on {
            self.set_xpa_lamp_power(dev, false)?;
        }
        if !dev.model.is_sheetfed {
            stop_action(dev, regs)?;
        }
        Ok(())
    }
}
