//! GL847 command set (Canon LiDE 100/200/700F).

use tracing::{debug, info};

use super::{
    create_slope_table, get_lowest_ydpi, get_motor_profile, send_slope_table, set_dpihw,
    set_lamp_power, set_motor_power, set_optical_off, setup_image_pipeline, setup_sensor,
    shading_setup_params, should_enable_gamma, start_action, stop_action, CommandSet, FrontendSet,
};
use crate::consts::{BACKTRACK_TABLE, FAST_TABLE, HOME_TABLE, MM_PER_INCH, SCAN_TABLE, STOP_TABLE};
use crate::device::{Device, ScanHeadId};
use crate::error::{GenesysError, Result};
use crate::model::{AsicType, ModelFlag, ModelId};
use crate::motor::{calculate_zmod, MotorProfile, StepType};
use crate::register::RegisterSet;
use crate::sensor::Sensor;
use crate::session::{compute_session, ScanSession};
use crate::settings::{ColorFilter, ScanFlag, ScanMethod, SetupParams, Settings};

/// GL847 register addresses and bit fields.
pub mod regs {
    pub const REG_0x01: u16 = 0x01;
    pub const REG_0x01_CISSET: u8 = 0x80;
    pub const REG_0x01_DOGENB: u8 = 0x40;
    pub const REG_0x01_DVDSET: u8 = 0x20;
    pub const REG_0x01_STAGGER: u8 = 0x10;
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

    pub const REG_0x08: u16 = 0x08;

    pub const REG_0x0B: u16 = 0x0b;
    pub const REG_0x0B_DRAMSEL: u8 = 0x07;
    pub const REG_0x0B_ENBDRAM: u8 = 0x08;

    pub const REG_0x0C: u16 = 0x0c;
    pub const REG_0x0C_CCDLMT: u8 = 0x0f;

    pub const REG_0x0D: u16 = 0x0d;
    pub const REG_0x0D_CLRLNCNT: u8 = 0x01;
    pub const REG_0x0D_CLRMCNT: u8 = 0x04;

    pub const REG_0x0E: u16 = 0x0e;

    pub const REG_0x1C: u16 = 0x1c;
    pub const REG_0x1C_TGTIME: u8 = 0x07;
    pub const REG_0x1E: u16 = 0x1e;

    pub const REG_STEPNO: u16 = 0x21;
    pub const REG_FWDSTEP: u16 = 0x22;
    pub const REG_BWDSTEP: u16 = 0x23;
    pub const REG_FASTNO: u16 = 0x24;
    pub const REG_LINCNT: u16 = 0x25;

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
    pub const REG_0x40_CHKVER: u8 = 0x10;

    pub const REG_0x41: u16 = 0x41;
    pub const REG_0x41_FEBUSY: u8 = 0x02;

    pub const REG_FMOVDEC: u16 = 0x5f;
    pub const REG_0x60: u16 = 0x60;
    pub const REG_0x60S_STEPSEL: u32 = 5;
    pub const REG_0x63: u16 = 0x63;
    pub const REG_0x63S_FSTPSEL: u32 = 5;

    pub const REG_0x67: u16 = 0x67;
    pub const REG_0x67_MTRPWM: u8 = 0x80;
    pub const REG_0x68: u16 = 0x68;
    pub const REG_0x68_FASTPWM: u8 = 0x80;

    pub const REG_FSHDEC: u16 = 0x69;
    pub const REG_FMOVNO: u16 = 0x6a;

    pub const REG_0x6C: u16 = 0x6c;
    pub const REG_0x6C_GPIO13: u8 = 0x10;
    pub const REG_0x6C_GPIO10: u8 = 0x02;

    pub const REG_0x87: u16 = 0x87;
    pub const REG_0x87_LEDADD: u8 = 0x04;

    pub const REG_0x9D: u16 = 0x9d;
    pub const REG_0xF8: u16 = 0xf8;
}

use regs::*;

/// GPIO registers that have to be written first, in this order.
const GPIO_ORDER_FIRST: [u16; 3] = [0xa7, 0xa6, 0x6e];
/// GPIO registers written after the motor GPIO reset, in this order.
const GPIO_ORDER_SECOND: [u16; 7] = [0x6b, 0x6c, 0x6d, 0x6e, 0x6f, 0xa8, 0xa9];

#[derive(Clone, Copy, Debug, Default)]
pub struct CommandSetGl847;

/// Number of motor steps per slope table entry, as configured by STEPTIM.
fn step_multiplier(regs: &RegisterSet) -> Result<usize> {
    let value = (regs.get8(REG_0x9D)? & 0x0f) >> 1;
    Ok(1 << value)
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
    let mult = step_multiplier(regs)?;

    regs.set24(REG_LINCNT, scan.scan_lines)?;

    regs.set8(REG_0x02, 0)?;
    set_motor_power(regs, true)?;

    // Fast feeding is never used on these scanners.
    let mut reg02 = regs.get8(REG_0x02)? & !REG_0x02_FASTFED;
    if scan.flags.has(ScanFlag::AUTO_GO_HOME) {
        reg02 |= REG_0x02_AGOHOME | REG_0x02_NOTHOME;
    }
    if scan.flags.has(ScanFlag::DISABLE_BUFFER_FULL_MOVE) || scan.scan_yres >= sensor.full_resolution {
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
        mult,
        scan.profile,
    )?;
    send_slope_table(dev, sensor, SCAN_TABLE, &scan_table.table)?;
    send_slope_table(dev, sensor, BACKTRACK_TABLE, &scan_table.table)?;

    // Fast moves run at the lowest resolution with at most quarter stepping.
    let fast_dpi = get_lowest_ydpi(dev)?;
    let mut fast_profile = scan.profile.clone();
    fast_profile.step_type = fast_profile.step_type.min(StepType::Quarter);
    let fast_table = create_slope_table(asic_type, &dev.motor, fast_dpi, scan.exposure, mult, &fast_profile)?;
    send_slope_table(dev, sensor, STOP_TABLE, &fast_table.table)?;
    send_slope_table(dev, sensor, FAST_TABLE, &fast_table.table)?;
    send_slope_table(dev, sensor, HOME_TABLE, &fast_table.table)?;

    let mut feedl = scan.feed_steps << scan.profile.step_type.shift();
    let mut dist = scan_table.len() as u32;
    if scan.flags.has(ScanFlag::FEEDING) {
        dist *= 2;
    }
    if dist < feedl {
        feedl -= dist;
    } else {
        feedl = 0;
    }
    regs.set24(REG_FEEDL, feedl)?;

    let ccdlmt = u32::from(regs.get8(REG_0x0C)? & REG_0x0C_CCDLMT) + 1;
    let tgtime = 1u32 << (regs.get8(REG_0x1C)? & REG_0x1C_TGTIME);

    {
        let mut iface = dev.interface.borrow_mut();

        // Vref for quarter stepping and above.
        let effective = iface.read_register(REG_0x6C)?;
        let value = match scan.profile.step_type {
            StepType::Quarter => effective & !REG_0x6C_GPIO13,
            StepType::Eighth => effective | REG_0x6C_GPIO13,
            _ => effective,
        };
        iface.write_register(REG_0x6C, value)?;

        let effective = iface.read_register(REG_0x6C)?;
        iface.write_register(REG_0x6C, effective | REG_0x6C_GPIO10)?;
    }

    let min_restep = (scan_table.len() / (2 * mult)).saturating_sub(1).max(1);
    regs.set8(REG_FWDSTEP, min_restep as u8)?;
    regs.set8(REG_BWDSTEP, min_restep as u8)?;

    let (z1, z2) = calculate_zmod(
        false,
        scan.exposure * ccdlmt * tgtime,
        &scan_table.table,
        scan_table.len(),
        feedl,
        (min_restep * mult) as u32,
    )?;
    let step_bits = scan.profile.step_type.shift();
    regs.set24(REG_0x60, z1 | (step_bits << (16 + REG_0x60S_STEPSEL)))?;
    regs.set24(REG_0x63, z2 | (step_bits << (16 + REG_0x63S_FSTPSEL)))?;

    regs.set8_mask(REG_0x1E, scan.scan_dummy as u8, 0x0f)?;
    regs.set8(REG_0x67, REG_0x67_MTRPWM)?;
    regs.set8(REG_0x68, REG_0x68_FASTPWM)?;

    let scan_steps = (scan_table.len() / mult) as u8;
    let fast_steps = (fast_table.len() / mult) as u8;
    regs.set8(REG_STEPNO, scan_steps)?;
    regs.set8(REG_FASTNO, scan_steps)?;
    regs.set8(REG_FSHDEC, scan_steps)?;
    regs.set8(REG_FMOVNO, fast_steps)?;
    regs.set8(REG_FMOVDEC, fast_steps)?;
    Ok(())
}

fn init_optical_regs_scan(
    cmd: &CommandSetGl847,
    dev: &mut Device,
    sensor: &Sensor,
    regs: &mut RegisterSet,
    exposure: u32,
    session: &ScanSession,
) -> Result<()> {
    debug!(exposure, "init_optical_regs_scan");
    setup_sensor(dev, sensor, regs)?;
    cmd.set_fe(dev, sensor, FrontendSet::Set)?;

    set_optical_off(dev.model.asic_type, regs)?;
    let flags = session.params.flags;
    let reg01 = regs.find_reg_mut(REG_0x01)?;
    reg01.value |= REG_0x01_SHDAREA;
    if flags.has(ScanFlag::DISABLE_SHADING)
        || dev.model.flags.has(ModelFlag::DISABLE_SHADING_CALIBRATION)
        || session.use_host_side_calib
    {
        reg01.value &= !REG_0x01_DVDSET;
    } else {
        reg01.value |= REG_0x01_DVDSET;
    }

    let reg03 = regs.find_reg_mut(REG_0x03)?;
    reg03.value &= !(REG_0x03_AVEENB | REG_0x03_XPASEL);
    if flags.has(ScanFlag::USE_XPA) {
        reg03.value |= REG_0x03_XPASEL;
    }
    set_lamp_power(dev, sensor, regs, !flags.has(ScanFlag::DISABLE_LAMP))?;
    regs.state.is_xpa_on = flags.has(ScanFlag::USE_XPA);

    // black/white threshold
    regs.set8(REG_0x2E, 0x7f)?;
    regs.set8(REG_0x2F, 0x7f)?;

    let reg04 = regs.find_reg_mut(REG_0x04)?;
    reg04.value &= !REG_0x04_LINEART;
    if session.params.depth == 16 {
        reg04.value |= REG_0x04_BITSET;
    } else {
        reg04.value &= !REG_0x04_BITSET;
    }
    reg04.value &= !(REG_0x04_FILTER | REG_0x04_AFEMOD);
    if session.params.channels == 1 {
        reg04.value |= match session.params.color_filter() {
            ColorFilter::Red => 0x14,
            ColorFilter::Blue => 0x1c,
            ColorFilter::Green => 0x18,
            ColorFilter::None => 0x00,
        };
    } else {
        reg04.value |= 0x10;
    }

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

    // CIS scanners do true gray by adding the three LEDs.
    if dev.model.is_cis {
        let ledadd = if session.enable_ledadd { REG_0x87_LEDADD } else { 0 };
        regs.set8_mask(REG_0x87, ledadd, REG_0x87_LEDADD)?;
    }

    regs.set16(REG_DPISET, sensor.register_dpiset as u16)?;
    regs.set16(REG_STRPIXEL, session.pixel_startx as u16)?;
    regs.set16(REG_ENDPIXEL, session.pixel_endx as u16)?;

    setup_image_pipeline(dev, sensor, session)?;

    // MAXWD counts 4-byte words.
    regs.set24(REG_MAXWD, (session.output_line_bytes_raw * session.params.channels) >> 2)?;
    regs.set16(REG_LPERIOD, exposure as u16)?;
    regs.set8(REG_DUMMY, sensor.dummy_pixel as u8)?;
    Ok(())
}

fn init_gpio(dev: &Device) -> Result<()> {
    let mut iface = dev.interface.borrow_mut();
    for address in GPIO_ORDER_FIRST {
        iface.write_register(address, dev.gpo_regs.get_value(address)?)?;
    }

    iface.write_register(REG_0x6C, 0x00)?;

    for address in GPIO_ORDER_SECOND {
        iface.write_register(address, dev.gpo_regs.get_value(address)?)?;
    }

    for reg in &dev.gpo_regs {
        if GPIO_ORDER_FIRST.contains(&reg.address) || GPIO_ORDER_SECOND.contains(&reg.address) {
            continue;
        }
        iface.write_register(reg.address, reg.value)?;
    }
    Ok(())
}

fn init_memory_layout(dev: &mut Device) -> Result<()> {
    let layout = match dev.model.model_id {
        ModelId::CanonLide100 | ModelId::CanonLide200 => Some(0x29),
        ModelId::CanonLide700f => Some(0x2a),
        _ => None,
    };
    if let Some(value) = layout {
        dev.interface.borrow_mut().write_register(REG_0x0B, value)?;
    }
    // Register writes must not touch the memory layout from now on.
    dev.reg.remove_reg(REG_0x0B)
}

impl CommandSet for CommandSetGl847 {
    fn asic_type(&self) -> AsicType {
        AsicType::Gl847
    }

    fn asic_boot(&self, dev: &mut Device, cold: bool) -> Result<()> {
        debug!(model = %dev.model.name, cold, "asic_boot");
        {
            let mut iface = dev.interface.borrow_mut();
            if cold {
                iface.write_register(REG_0x0E, 0x01)?;
                iface.write_register(REG_0x0E, 0x00)?;
            }

            if iface.read_register(REG_0x40)? & REG_0x40_CHKVER != 0 {
                let version = iface.read_register(0x00)?;
                info!(version = %format!("{version:#04x}"), "Genesys chip version");
            }
        }

        let mut regs = RegisterSet::new();
        for reg in &dev.initial_regs {
            regs.init_reg(reg.address, reg.value);
        }
        let full_resolution = dev.find_sensor_any()?.full_resolution;
        let dpihw = dev
            .find_sensor(full_resolution, 3, ScanMethod::Flatbed)?
            .register_dpihw;
        set_dpihw(&mut regs, dpihw)?;
        dev.reg = regs;

        {
            let mut iface = dev.interface.borrow_mut();
            iface.write_registers(&dev.reg)?;

            // DRAM is enabled by a rising edge on ENBDRAM.
            let value = (dev.reg.get8(REG_0x0B)? & REG_0x0B_DRAMSEL) | REG_0x0B_ENBDRAM;
            iface.write_register(REG_0x0B, value)?;
            dev.reg.set8(REG_0x0B, value)?;

            iface.write_register(REG_0x08, dev.reg.get8(REG_0x08)?)?;
        }

        init_gpio(dev)?;
        init_memory_layout(dev)?;

        dev.reg.init_reg(REG_0xF8, 0x01);
        let value = dev.reg.get8(REG_0xF8)?;
        dev.interface.borrow_mut().write_register(REG_0xF8, value)?;
        Ok(())
    }

    fn set_fe(&self, dev: &mut Device, _sensor: &Sensor, set: FrontendSet) -> Result<()> {
        debug!(?set, "set_fe");
        {
            let mut iface = dev.interface.borrow_mut();
            iface.read_register(REG_0x04)?;
            while iface.read_register(REG_0x41)? & REG_0x41_FEBUSY != 0 {
                iface.sleep_ms(10);
            }
        }

        if set == FrontendSet::Init {
            dev.frontend = dev.frontend_initial.clone();
        }

        let mut iface = dev.interface.borrow_mut();
        // reset the DAC
        iface.write_fe_register(0x00, 0x80)?;
        for reg in &dev.frontend.regs {
            iface.write_fe_register(reg.address as u8, reg.value)?;
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

        // Backtracking is not handled well on these scanners.
        let mut flags = ScanFlag::DISABLE_BUFFER_FULL_MOVE;

        let is_transparency = matches!(
            settings.scan_method,
            ScanMethod::Transparency | ScanMethod::TransparencyInfrared
        );
        let mut move_mm = model.y_offset;
        if is_transparency {
            if !dev.ignore_offsets {
                move_mm = model.y_offset_ta - model.y_offset_sensor_to_ta;
            }
            flags |= ScanFlag::USE_XPA;
        } else if !dev.ignore_offsets {
            move_mm = model.y_offset;
        }
        move_mm += settings.tl_y;
        let move_steps = move_mm * dev.motor.base_ydpi as f32 / MM_PER_INCH
            - dev.head_pos(ScanHeadId::Primary)? as f32;

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

        let dummy = match dev.model.model_id {
            ModelId::CanonLide100 | ModelId::CanonLide200 | ModelId::CanonLide700f => {
                3u32.saturating_sub(session.params.channels)
            }
            _ => 0,
        };

        // A CIS colour scan is three gray lines per output line.
        let slope_dpi = if dev.model.is_cis {
            session.params.yres * session.params.channels
        } else {
            session.params.yres
        } * (1 + dummy);

        let exposure = u32::try_from(sensor.exposure_lperiod)
            .map_err(|_| GenesysError::invalid("exposure not defined in sensor definition"))?;

        init_optical_regs_scan(self, dev, sensor, regs, exposure, session)?;

        let profile = get_motor_profile(&dev.motor.profiles, exposure, session)?;
        init_motor_regs_scan(
            dev,
            sensor,
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
        let resolution = sensor.shading_resolution;
        let calib_sensor = dev
            .find_sensor(resolution, settings.channels(), settings.scan_method)?
            .clone();

        let pixels = (model.x_size_calib_mm * resolution as f32 / MM_PER_INCH) as u32;
        let move_steps = model.y_offset_calib_white * dev.motor.base_ydpi as f32 / MM_PER_INCH;

        let params =
            shading_setup_params(dev, resolution, 0, pixels, move_steps.max(0.0) as u32, is_dark);
        debug!(resolution, pixels, lines = params.lines, is_dark, "calculate_shading_session");
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
        if regs.state.is_xpa_on && regs.state.is_lamp_on {
            self.set_xpa_lamp_power(dev, true)?;
        }

        {
            let mut iface = dev.interface.borrow_mut();
            if matches!(dev.model.model_id, ModelId::CanonLide100 | ModelId::CanonLide200) {
                let value = iface.read_register(REG_0x6C)? & !REG_0x6C_GPIO10;
                iface.write_register(REG_0x6C, value)?;
            }

            iface.write_register(REG_0x0D, REG_0x0D_CLRLNCNT)?;
            iface.write_register(REG_0x0D, REG_0x0D_CLRMCNT)?;

            let value = iface.read_register(REG_0x01)? | REG_0x01_SCAN;
            iface.write_register(REG_0x01, value)?;
            regs.set8(REG_0x01, value)?;
        }

        start_action(dev, start_motor)?;
        dev.advance_head_pos_by_session(ScanHeadId::Primary)
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
