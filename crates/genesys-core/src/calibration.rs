//! Host-side shading calibration.
//!
//! Dark and white reference strips are scanned at 16 bit and reduced to one
//! value per pixel and channel. The results are kept on the device and applied
//! to later scans by the `Calibrate` pipeline node.

use byteorder::{ByteOrder, LittleEndian};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::command_set::CommandSet;
use crate::consts::{DARK_SHADING_CONSTANT, PARALLEL_PIXEL_THRESHOLD, SHADING_PERCENTILE};
use crate::device::Device;
use crate::error::{GenesysError, Result, SaneStatus};
use crate::model::ModelFlag;
use crate::register::RegisterSet;
use crate::sensor::Sensor;
use crate::settings::ScanMethod;

/// Per-column percentile of `lines` rows holding `elements` samples each.
///
/// The result is the sample of rank `lines * percentile` in each column, not an
/// interpolated value. Large inputs are split across columns with Rayon.
pub fn compute_array_percentile_approx(
    data: &[u16],
    lines: usize,
    elements: usize,
    percentile: f32,
) -> Result<Vec<u16>> {
    if lines == 0 {
        return Err(GenesysError::invalid("no reference lines to average"));
    }
    if data.len() < lines * elements {
        return Err(GenesysError::invalid(format!(
            "{} samples do not cover {lines} lines of {elements}",
            data.len()
        )));
    }
    if lines == 1 {
        return Ok(data[..elements].to_vec());
    }

    let rank = ((lines as f32 * percentile) as usize).min(lines - 1);
    let column_value = |column: &mut Vec<u16>, x: usize| {
        column.clear();
        column.extend((0..lines).map(|y| data[y * elements + x]));
        *column.select_nth_unstable(rank).1
    };

    if lines * elements >= PARALLEL_PIXEL_THRESHOLD {
        Ok((0..elements)
            .into_par_iter()
            .map_init(|| Vec::with_capacity(lines), column_value)
            .collect())
    } else {
        let mut column = Vec::with_capacity(lines);
        Ok((0..elements).map(|x| column_value(&mut column, x)).collect())
    }
}

/// Dark reference estimated from the sensor's dummy pixels in a white scan.
///
/// The dummy pixels are never exposed, so their level is the black level of
/// every channel.
pub fn dark_from_dummy_pixels(
    white: &[u16],
    channels: usize,
    xres: u32,
    sensor: &Sensor,
) -> Result<Vec<u16>> {
    let skip = 4;
    let xend = if xres <= sensor.full_resolution / 2 { 36 } else { 68 };
    if channels == 0 || white.len() < channels * (xend + 1) {
        return Err(GenesysError::invalid(format!(
            "white reference of {} samples has no dummy pixels",
            white.len()
        )));
    }

    let mut sums = vec![0u32; channels];
    for x in skip + 1..=xend {
        for (c, sum) in sums.iter_mut().enumerate() {
            *sum += u32::from(white[x * channels + c]);
        }
    }
    let count = (xend - skip) as u32;
    debug!(?sums, count, "Dark level from dummy pixels");
    Ok((0..white.len())
        .map(|i| (sums[i % channels] / count) as u16)
        .collect())
}

/// Scan the shading references for `dev.settings` and store them on `dev`.
///
/// `sensor` is the configuration the following scans will use.
pub fn run_shading_calibration(dev: &mut Device, sensor: &Sensor) -> Result<()> {
    let model_flags = dev.model.flags;
    if model_flags.has(ModelFlag::DISABLE_SHADING_CALIBRATION) {
        info!(model = %dev.model.name, "Shading calibration is disabled");
        return Ok(());
    }
    if !sensor.use_host_side_calib {
        return Err(GenesysError::status(
            SaneStatus::Unsupported,
            format!("{} only supports shading in the ASIC", dev.model.name),
        ));
    }
    if model_flags.has(ModelFlag::DARK_WHITE_CALIBRATION) {
        return Err(GenesysError::status(
            SaneStatus::Unsupported,
            "combined dark and white shading calibration is not supported",
        ));
    }

    let dark = if model_flags.has(ModelFlag::DARK_CALIBRATION) {
        Some(scan_shading_reference(dev, sensor, true)?)
    } else {
        None
    };
    let white = scan_shading_reference(dev, sensor, false)?;

    let dark = match dark {
        Some(dark) => dark,
        None if model_flags.has(ModelFlag::USE_CONSTANT_FOR_DARK_CALIBRATION) => {
            vec![DARK_SHADING_CONSTANT; white.len()]
        }
        None => dark_from_dummy_pixels(
            &white,
            dev.calib_session.params.channels as usize,
            dev.settings.xres,
            sensor,
        )?,
    };

    info!(samples = white.len(), "Shading calibration done");
    dev.set_calibration(dark, white);
    Ok(())
}

fn scan_shading_reference(dev: &mut Device, sensor: &Sensor, is_dark: bool) -> Result<Vec<u16>> {
    let cmd = dev.cmd_set();
    let (calib_sensor, session) = cmd.calculate_shading_session(dev, sensor, is_dark)?;

    let channels = session.params.channels as usize;
    let start_offset = session.params.startx as usize * channels;
    let elements = session.output_line_bytes_requested as usize / 2;
    let lines = session.params.lines as usize;
    info!(
        is_dark,
        resolution = session.params.xres,
        pixels = session.params.pixels,
        lines,
        "Scanning shading reference"
    );
    dev.calib_session = session.clone();

    if is_dark && dev.settings.scan_method == ScanMethod::TransparencyInfrared {
        debug!("No dark reference through the infrared filter");
        return Ok(vec![0; start_offset + elements]);
    }

    let mut regs = dev.reg.clone();
    cmd.init_regs_for_scan_session(dev, &calib_sensor, &mut regs, &session)?;
    let read = read_reference_lines(dev, cmd.as_ref(), &calib_sensor, &mut regs, is_dark);
    let stop = cmd.end_scan(dev, &mut regs, true);
    dev.clear_pipeline();
    dev.read_active = false;
    let raw = read?;
    stop?;

    let mut samples = vec![0u16; raw.len() / 2];
    LittleEndian::read_u16_into(&raw[..samples.len() * 2], &mut samples);

    let mut average = vec![0; start_offset];
    average.extend(compute_array_percentile_approx(
        &samples,
        lines,
        elements,
        SHADING_PERCENTILE,
    )?);
    Ok(average)
}

fn read_reference_lines(
    dev: &mut Device,
    cmd: &dyn CommandSet,
    sensor: &Sensor,
    regs: &mut RegisterSet,
    is_dark: bool,
) -> Result<Vec<u8>> {
    {
        let mut iface = dev.interface.borrow_mut();
        iface.write_registers(regs)?;
        // Let the lamp settle after switching it.
        if is_dark {
            iface.sleep_ms(200);
        } else if dev.model.flags.has(ModelFlag::DARK_CALIBRATION) {
            iface.sleep_ms(500);
        }
    }

    cmd.begin_scan(dev, sensor, regs, !is_dark)?;

    let mut raw = vec![0u8; dev.total_bytes_to_read as usize];
    let mut filled = 0;
    while filled < raw.len() {
        let n = dev.read(&mut raw[filled..])?;
        if n == 0 {
            return Err(GenesysError::status(SaneStatus::Eof, "shading scan ended early"));
        }
        filled += n;
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_picks_median_per_column() {
        // three lines of two samples
        let data = [10, 200, 30, 100, 20, 300];
        assert_eq!(compute_array_percentile_approx(&data, 3, 2, 0.5).unwrap(), vec![20, 200]);
        assert_eq!(compute_array_percentile_approx(&data, 3, 2, 0.0).unwrap(), vec![10, 100]);
        assert_eq!(compute_array_percentile_approx(&data, 3, 2, 1.0).unwrap(), vec![30, 300]);
    }

    #[test]
    fn percentile_of_wide_reference() {
        // Large enough to be split across threads.
        let elements = 40_000;
        let data: Vec<u16> = (0..3)
            .flat_map(|y| (0..elements).map(move |x| (x % 1000) as u16 + [7, 1, 4][y]))
            .collect();
        let median = compute_array_percentile_approx(&data, 3, elements, 0.5).unwrap();
        assert_eq!(median.len(), elements);
        assert!(median.iter().enumerate().all(|(x, &v)| v == (x % 1000) as u16 + 4));
    }

    #[test]
    fn percentile_single_line_is_copied() {
        let data = [5, 6, 7];
        assert_eq!(compute_array_percentile_approx(&data, 1, 3, 0.5).unwrap(), vec![5, 6, 7]);
    }

    #[test]
    fn percentile_rejects_short_input() {
        assert!(compute_array_percentile_approx(&[1, 2, 3], 0, 3, 0.5).is_err());
        assert!(compute_array_percentile_approx(&[1, 2, 3], 2, 2, 0.5).is_err());
    }

    #[test]
    fn dummy_pixels_give_dark_level_per_channel() {
        let sensor = Sensor {
            full_resolution: 1200,
            ..Sensor::default()
        };
        // Two channels: dummy pixels read 100 and 40, the rest is bright.
        let mut white = vec![0u16; 2 * 80];
        for x in 0..80 {
            let (a, b) = if x <= 36 { (100, 40) } else { (60000, 50000) };
            white[2 * x] = a;
            white[2 * x + 1] = b;
        }
        let dark = dark_from_dummy_pixels(&white, 2, 300, &sensor).unwrap();
        assert_eq!(dark.len(), white.len());
        assert!(dark.chunks(2).all(|px| px == [100, 40]));

        // Above half the full resolution the dummy area is wider.
        assert_eq!(dark_from_dummy_pixels(&white, 2, 1200, &sensor).unwrap()[0], {
            let sum: u32 = (5..=68).map(|x| u32::from(white[2 * x])).sum();
            (sum / 64) as u16
        });
        assert!(dark_from_dummy_pixels(&white[..20], 2, 300, &sensor).is_err());
    }
}
