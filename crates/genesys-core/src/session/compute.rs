use tracing::{debug, info};

use super::ScanSession;
use crate::consts::BULK_READ_LINES;
use crate::error::{GenesysError, Result};
use crate::model::{AsicType, Model, ModelFlag, ModelId};
use crate::motor::Motor;
use crate::sensor::Sensor;
use crate::settings::ScanFlag;
use crate::utilities::{align_multiple_ceil, align_multiple_floor, multiply_by_depth_ceil};

fn align_floor(x: u32, multiple: u32) -> u32 {
    align_multiple_floor(u64::from(x), u64::from(multiple)) as u32
}

fn align_ceil(x: u32, multiple: u32) -> u32 {
    align_multiple_ceil(u64::from(x), u64::from(multiple)) as u32
}

fn depth_bytes(pixels: u32, depth: u32) -> u32 {
    multiply_by_depth_ceil(u64::from(pixels), u64::from(depth)) as u32
}

fn is_opticfilm_quarter_ccd(model_id: ModelId) -> bool {
    matches!(
        model_id,
        ModelId::PlustekOpticfilm7200
            | ModelId::PlustekOpticfilm7200i
            | ModelId::PlustekOpticfilm7300
            | ModelId::PlustekOpticfilm7400
            | ModelId::PlustekOpticfilm7500i
            | ModelId::PlustekOpticfilm8200i
    )
}

/// Adjust a pixel count so the ASIC can acquire it.
///
/// By default only the pixel count at the optical resolution is aligned, as
/// each ASIC needs; with `adjust_output_pixels` the count at the output
/// resolution is aligned instead.
pub fn session_adjust_output_pixels(
    output_pixels: u32,
    model: &Model,
    sensor: &Sensor,
    output_xresolution: u32,
    output_yresolution: u32,
    adjust_output_pixels: bool,
) -> u32 {
    let mut output_pixels = output_pixels;
    let mut adjust_output_pixels = adjust_output_pixels;
    let mut adjust_optical_pixels = !adjust_output_pixels;
    if model.model_id == ModelId::Canon5600f {
        adjust_optical_pixels = true;
        adjust_output_pixels = true;
    }

    if adjust_optical_pixels {
        let optical_resolution = sensor.optical_resolution();
        let mut optical_pixels = output_pixels * optical_resolution / output_xresolution;

        match model.asic_type {
            AsicType::Gl841 | AsicType::Gl842 => {
                optical_pixels = align_ceil(optical_pixels, 2);
            }
            AsicType::Gl646 if output_xresolution == 400 => {
                optical_pixels = align_floor(optical_pixels, 6);
            }
            AsicType::Gl843 => {
                // Quarter-CCD modes report four times the physical pixel count.
                optical_pixels =
                    align_ceil(optical_pixels, 2 * sensor.full_resolution / optical_resolution);
                if is_opticfilm_quarter_ccd(model.model_id) {
                    optical_pixels = align_ceil(optical_pixels, 16);
                }
            }
            _ => {}
        }
        output_pixels = optical_pixels * output_xresolution / optical_resolution;
    }

    if adjust_output_pixels {
        let even_pixels_asic = matches!(
            model.asic_type,
            AsicType::Gl847 | AsicType::Gl124 | AsicType::Gl845 | AsicType::Gl846 | AsicType::Gl843
        );
        if model.flags.has(ModelFlag::SIS_SENSOR) || even_pixels_asic {
            output_pixels = if output_xresolution <= 1200 {
                align_floor(output_pixels, 4)
            } else if output_xresolution < output_yresolution {
                align_floor(output_pixels, 8)
            } else {
                align_floor(output_pixels, 16)
            };
        }

        let lineart_corner_case = matches!(model.asic_type, AsicType::Gl124 | AsicType::Gl847)
            || output_xresolution < output_yresolution;
        if output_xresolution >= 1200 && lineart_corner_case {
            output_pixels = if output_xresolution < output_yresolution {
                align_floor(output_pixels, 8)
            } else {
                align_floor(output_pixels, 16)
            };
        }
    }

    output_pixels
}

fn compute_session_pixel_offsets(model: &Model, s: &mut ScanSession, sensor: &Sensor) {
    s.pixel_startx = 0;
    s.pixel_endx = 0;
    match model.asic_type {
        AsicType::Gl646 => {
            s.pixel_startx = s.output_startx * sensor.full_resolution / s.params.xres;
            s.pixel_endx =
                s.pixel_startx + s.optical_pixels * s.full_resolution / s.optical_resolution;
        }
        AsicType::Gl841
        | AsicType::Gl842
        | AsicType::Gl843
        | AsicType::Gl845
        | AsicType::Gl846
        | AsicType::Gl847 => {
            let mut startx_xres = s.optical_resolution;
            if matches!(model.model_id, ModelId::Canon5600f | ModelId::CanonLide90) {
                if s.output_resolution == 1200 {
                    startx_xres /= 2;
                }
                if s.output_resolution >= 2400 {
                    startx_xres /= 4;
                }
            }
            s.pixel_startx = s.output_startx * startx_xres / s.params.xres;
            s.pixel_endx = s.pixel_startx + s.optical_pixels_raw;
        }
        AsicType::Gl124 => {
            s.pixel_startx = s.output_startx * sensor.full_resolution / s.params.xres;
            s.pixel_endx = s.pixel_startx + s.optical_pixels_raw;
        }
        AsicType::Unknown => {}
    }

    // Unstaggering needs the start pixel on a stagger period boundary.
    let needed_x_alignment = s.stagger_x.len().max(s.stagger_y.len()).max(1) as u32;
    let aligned_pixel_startx = align_floor(s.pixel_startx, needed_x_alignment);
    s.pixel_endx -= s.pixel_startx - aligned_pixel_startx;
    s.pixel_startx = aligned_pixel_startx;

    s.pixel_startx = sensor.pixel_count_ratio.apply(s.pixel_startx);
    s.pixel_endx = sensor.pixel_count_ratio.apply(s.pixel_endx);

    if matches!(
        model.model_id,
        ModelId::PlustekOpticfilm7200
            | ModelId::PlustekOpticfilm7200i
            | ModelId::PlustekOpticfilm7300
            | ModelId::PlustekOpticfilm7500i
    ) {
        let divisor = sensor.pixel_count_ratio.divisor;
        s.pixel_startx = align_floor(s.pixel_startx, divisor);
        s.pixel_endx = align_floor(s.pixel_endx, divisor);
    }
}

/// Derive the full scan geometry of `s` from its parameters.
///
/// Only `s.params` is read; every derived field is overwritten, so calling this
/// again on a computed session yields the same result.
pub fn compute_session(model: &Model, motor: &Motor, sensor: &Sensor, s: &mut ScanSession) -> Result<()> {
    s.params.assert_valid()?;

    if s.params.depth != 8 && s.params.depth != 16 {
        return Err(GenesysError::invalid(format!(
            "unsupported depth setting {}",
            s.params.depth
        )));
    }
    if s.params.xres == 0 || s.params.yres == 0 || motor.base_ydpi == 0 {
        return Err(GenesysError::invalid("resolution must not be zero"));
    }

    s.full_resolution = sensor.full_resolution;
    s.optical_resolution = sensor.optical_resolution();
    s.output_resolution = s.params.xres;
    s.pixel_count_ratio = sensor.pixel_count_ratio;

    if s.output_resolution > s.optical_resolution {
        return Err(GenesysError::invalid(format!(
            "output resolution {} is higher than optical resolution {}",
            s.output_resolution, s.optical_resolution
        )));
    }

    s.output_pixels =
        session_adjust_output_pixels(s.params.pixels, model, sensor, s.params.xres, s.params.yres, false);

    s.optical_pixels = s.output_pixels * s.optical_resolution / s.output_resolution;

    let startx = i64::from(s.params.startx) + i64::from(sensor.output_pixel_offset);
    if startx < 0 {
        return Err(GenesysError::invalid(format!(
            "invalid output pixel offset {}",
            sensor.output_pixel_offset
        )));
    }
    s.output_startx = startx as u32;

    s.stagger_x = sensor.stagger_x.clone();
    s.stagger_y = sensor.stagger_y.clone();

    s.num_staggered_lines = 0;
    if !s.params.flags.has(ScanFlag::IGNORE_STAGGER_OFFSET) {
        s.num_staggered_lines = s.stagger_y.max_shift() as u32 * s.params.yres / s.params.xres;
    }

    s.color_shift_lines_r = model.ld_shift_r * s.params.yres / motor.base_ydpi;
    s.color_shift_lines_g = model.ld_shift_g * s.params.yres / motor.base_ydpi;
    s.color_shift_lines_b = model.ld_shift_b * s.params.yres / motor.base_ydpi;

    s.max_color_shift_lines = 0;
    if s.params.channels > 1 && !s.params.flags.has(ScanFlag::IGNORE_COLOR_OFFSET) {
        s.max_color_shift_lines = s
            .color_shift_lines_r
            .max(s.color_shift_lines_g)
            .max(s.color_shift_lines_b);
    }

    s.output_line_count = s.params.lines + s.max_color_shift_lines + s.num_staggered_lines;
    s.optical_line_count = if model.is_cis {
        s.output_line_count * s.params.channels
    } else {
        s.output_line_count
    };

    s.output_channel_bytes = depth_bytes(s.output_pixels, s.params.depth);
    s.output_line_bytes = s.output_channel_bytes * s.params.channels;

    s.segment_count = sensor.segment_count();

    s.optical_pixels_raw = s.optical_pixels;
    s.output_line_bytes_raw = s.output_line_bytes;
    s.conseq_pixel_dist = 0;

    let segmented_asic = matches!(
        model.asic_type,
        AsicType::Gl845 | AsicType::Gl846 | AsicType::Gl847
    );
    if segmented_asic
        && model.model_id != ModelId::PlustekOpticfilm7400
        && model.model_id != ModelId::PlustekOpticfilm8200i
    {
        if s.segment_count > 1 {
            s.conseq_pixel_dist = sensor.segment_size;

            // Multi-segment sensors scan up to the segment boundary.
            if model.model_id == ModelId::Canon5600f {
                let mut startx_xres = s.optical_resolution;
                if s.output_resolution == 1200 {
                    startx_xres /= 2;
                }
                if s.output_resolution >= 2400 {
                    startx_xres /= 4;
                }
                let optical_startx = s.output_startx * startx_xres / s.params.xres;
                let optical_endx = optical_startx + s.optical_pixels;

                let multi_segment_size_output = s.segment_count * s.conseq_pixel_dist;
                let multi_segment_size_optical =
                    multi_segment_size_output * s.optical_resolution / s.output_resolution;

                let optical_endx = align_ceil(optical_endx, multi_segment_size_optical);
                s.optical_pixels_raw = align_floor(
                    optical_endx - optical_startx,
                    4 * s.optical_resolution / s.output_resolution,
                );
            } else {
                let extra_segment_scan_area =
                    align_ceil(s.conseq_pixel_dist, 2) * (s.segment_count - 1);
                s.optical_pixels_raw += s.pixel_count_ratio.apply_inverse(extra_segment_scan_area);
            }
        }

        if model.model_id == ModelId::Canon5600f {
            let output_pixels_raw = s.optical_pixels_raw * s.output_resolution / s.optical_resolution;
            s.output_line_bytes_raw = depth_bytes(output_pixels_raw, s.params.depth) * s.params.channels;
        } else {
            s.output_line_bytes_raw = depth_bytes(
                s.optical_pixels_raw * s.output_resolution / sensor.full_resolution / s.segment_count,
                s.params.depth,
            );
        }
    }

    if matches!(model.asic_type, AsicType::Gl841 | AsicType::Gl842) && model.is_cis {
        s.output_line_bytes_raw = s.output_channel_bytes;
    }

    if model.asic_type == AsicType::Gl124 {
        if model.is_cis {
            s.output_line_bytes_raw = s.output_channel_bytes;
        }
        s.conseq_pixel_dist =
            s.output_pixels / (s.full_resolution / s.optical_resolution) / s.segment_count;
    }

    if matches!(model.asic_type, AsicType::Gl842 | AsicType::Gl843) {
        if model.is_cis {
            if s.segment_count > 1 {
                s.conseq_pixel_dist = sensor.segment_size;
            }
        } else {
            s.conseq_pixel_dist = s.output_pixels / s.segment_count;
        }
    }

    s.output_segment_pixel_group_count = 0;
    if matches!(
        model.asic_type,
        AsicType::Gl124 | AsicType::Gl842 | AsicType::Gl843
    ) {
        s.output_segment_pixel_group_count =
            s.output_pixels / (s.full_resolution / s.optical_resolution * s.segment_count);
    }
    if model.model_id == ModelId::CanonLide90 {
        s.output_segment_pixel_group_count = s.output_pixels / s.segment_count;
    }
    if segmented_asic {
        s.output_segment_pixel_group_count = if model.model_id == ModelId::Canon5600f {
            s.output_pixels / s.segment_count
        } else {
            s.pixel_count_ratio.apply(s.optical_pixels)
        };
    }

    s.output_line_bytes_requested =
        depth_bytes(s.params.requested_pixels() * s.params.channels, s.params.depth);

    s.output_total_bytes_raw = s.output_line_bytes_raw * s.output_line_count;
    s.output_total_bytes = s.output_line_bytes * s.output_line_count;
    if model.model_id == ModelId::CanonLide90 {
        s.output_total_bytes_raw *= s.params.channels;
        s.output_total_bytes *= s.params.channels;
    }

    s.buffer_size_read = s.output_line_bytes_raw as usize * BULK_READ_LINES;
    compute_session_pixel_offsets(model, s, sensor);

    s.shading_pixel_offset = sensor.shading_pixel_offset;

    s.enable_ledadd = false;
    if matches!(
        model.asic_type,
        AsicType::Gl124 | AsicType::Gl845 | AsicType::Gl846
    ) {
        s.enable_ledadd = s.params.channels == 1
            && model.is_cis
            && s.params.flags.has(ScanFlag::ENABLE_LEDADD);
    }

    s.use_host_side_calib = sensor.use_host_side_calib;

    // These ASICs have no 16-bit gamma.
    if matches!(
        model.asic_type,
        AsicType::Gl841 | AsicType::Gl842 | AsicType::Gl843
    ) && s.params.depth == 16
    {
        s.params.flags |= ScanFlag::DISABLE_GAMMA;
    }

    s.computed = true;

    info!(
        model = %model.name,
        xres = s.params.xres,
        yres = s.params.yres,
        output_pixels = s.output_pixels,
        lines = s.output_line_count,
        segments = s.segment_count,
        "Computed scan session"
    );
    debug!("{s}");
    Ok(())
}
