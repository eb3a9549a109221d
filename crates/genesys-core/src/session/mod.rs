//! Scan session: the requested scan plus every geometry value derived from it.

mod compute;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GenesysError, Result};
use crate::sensor::StaggerConfig;
use crate::settings::SetupParams;
use crate::utilities::Ratio;

pub use compute::{compute_session, session_adjust_output_pixels};

/// Derived scan geometry. Filled in by [`compute_session`]; until then only
/// `params` is meaningful.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSession {
    pub params: SetupParams,
    pub computed: bool,

    /// Full resolution of the sensor in use.
    pub full_resolution: u32,
    pub optical_resolution: u32,
    /// Pixels at the optical resolution, without segment overhead.
    pub optical_pixels: u32,
    /// Pixels at the optical resolution, including segment overhead.
    pub optical_pixels_raw: u32,
    /// Sensor lines to acquire. On CIS scanners each colour is a separate line.
    pub optical_line_count: u32,
    pub output_resolution: u32,
    pub output_startx: u32,
    pub output_pixels: u32,
    pub output_channel_bytes: u32,
    pub output_line_bytes: u32,
    /// Bytes per line as the scanner sends them, before desegmentation.
    pub output_line_bytes_raw: u32,
    pub output_line_bytes_requested: u32,
    /// Requested lines plus the extra lines needed for stagger and colour shift.
    pub output_line_count: u32,
    pub output_total_bytes_raw: u32,
    pub output_total_bytes: u32,
    pub num_staggered_lines: u32,
    pub max_color_shift_lines: u32,
    pub color_shift_lines_r: u32,
    pub color_shift_lines_g: u32,
    pub color_shift_lines_b: u32,
    pub stagger_x: StaggerConfig,
    pub stagger_y: StaggerConfig,
    pub segment_count: u32,
    /// Pixel range programmed into the STRPIXEL/ENDPIXEL registers.
    pub pixel_startx: u32,
    pub pixel_endx: u32,
    pub pixel_count_ratio: Ratio,
    /// Distance between consecutive pixels of one segment in the raw line.
    pub conseq_pixel_dist: u32,
    /// Pixels delivered by a single segment.
    pub output_segment_pixel_group_count: u32,
    pub output_segment_start_offset: u32,
    pub shading_pixel_offset: i32,
    pub buffer_size_read: usize,
    pub enable_ledadd: bool,
    pub use_host_side_calib: bool,
}

impl ScanSession {
    pub fn new(params: SetupParams) -> Self {
        Self {
            params,
            segment_count: 1,
            ..Default::default()
        }
    }

    pub fn assert_computed(&self) -> Result<()> {
        if self.computed {
            Ok(())
        } else {
            Err(GenesysError::SessionNotComputed)
        }
    }
}

impl fmt::Display for ScanSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ScanSession {{")?;
        writeln!(f, "    computed: {}", self.computed)?;
        writeln!(f, "    full_resolution: {}", self.full_resolution)?;
        writeln!(f, "    optical_resolution: {}", self.optical_resolution)?;
        writeln!(f, "    optical_pixels: {}", self.optical_pixels)?;
        writeln!(f, "    optical_pixels_raw: {}", self.optical_pixels_raw)?;
        writeln!(f, "    optical_line_count: {}", self.optical_line_count)?;
        writeln!(f, "    output_resolution: {}", self.output_resolution)?;
        writeln!(f, "    output_startx: {}", self.output_startx)?;
        writeln!(f, "    output_pixels: {}", self.output_pixels)?;
        writeln!(f, "    output_line_bytes: {}", self.output_line_bytes)?;
        writeln!(f, "    output_line_bytes_raw: {}", self.output_line_bytes_raw)?;
        writeln!(f, "    output_line_count: {}", self.output_line_count)?;
        writeln!(f, "    num_staggered_lines: {}", self.num_staggered_lines)?;
        writeln!(
            f,
            "    color_shift_lines_r/g/b: {}/{}/{}",
            self.color_shift_lines_r, self.color_shift_lines_g, self.color_shift_lines_b
        )?;
        writeln!(f, "    max_color_shift_lines: {}", self.max_color_shift_lines)?;
        writeln!(f, "    stagger_x: {:?}", self.stagger_x.shifts())?;
        writeln!(f, "    stagger_y: {:?}", self.stagger_y.shifts())?;
        writeln!(f, "    segment_count: {}", self.segment_count)?;
        writeln!(f, "    pixel_startx: {}", self.pixel_startx)?;
        writeln!(f, "    pixel_endx: {}", self.pixel_endx)?;
        writeln!(f, "    pixel_count_ratio: {}", self.pixel_count_ratio)?;
        writeln!(f, "    conseq_pixel_dist: {}", self.conseq_pixel_dist)?;
        writeln!(
            f,
            "    output_segment_pixel_group_count: {}",
            self.output_segment_pixel_group_count
        )?;
        writeln!(f, "    shading_pixel_offset: {}", self.shading_pixel_offset)?;
        writeln!(f, "    buffer_size_read: {}", self.buffer_size_read)?;
        writeln!(f, "    enable_ledadd: {}", self.enable_ledadd)?;
        writeln!(f, "    use_host_side_calib: {}", self.use_host_side_calib)?;
        writeln!(f, "    params: {}", self.params.to_string().replace('\n', "\n    "))?;
        write!(f, "}}")
    }
}
