use std::fmt;

use serde::{Deserialize, Serialize};

use crate::register::RegisterSettingSet;
use crate::settings::ScanMethod;
use crate::utilities::{Ratio, ValueFilter};

/// Per-column or per-row offsets of interleaved sensor pixels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaggerConfig {
    shifts: Vec<usize>,
}

impl StaggerConfig {
    pub fn new(shifts: Vec<usize>) -> Self {
        Self { shifts }
    }

    pub fn shifts(&self) -> &[usize] {
        &self.shifts
    }

    pub fn max_shift(&self) -> usize {
        self.shifts.iter().copied().max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorExposure {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl SensorExposure {
    pub fn new(red: u16, green: u16, blue: u16) -> Self {
        Self { red, green, blue }
    }
}

fn default_channels() -> Vec<u32> {
    vec![1, 3]
}

fn default_one() -> u32 {
    1
}

fn default_lperiod() -> i32 {
    -1
}

fn default_gamma() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Description of one sensor configuration: the resolutions, channel counts and
/// scan methods it applies to, plus everything needed to program the ASIC for it.
///
/// A model usually lists one `Sensor` per supported resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub sensor_id: String,
    /// Resolution of the physical sensor.
    pub full_resolution: u32,
    /// Resolution actually delivered by the sensor in this mode; 0 means `full_resolution`.
    #[serde(default)]
    pub optical_resolution: u32,
    #[serde(default)]
    pub resolutions: ValueFilter<u32>,
    #[serde(default = "default_channels")]
    pub channels: Vec<u32>,
    #[serde(default)]
    pub method: ScanMethod,
    pub register_dpihw: u32,
    pub register_dpiset: u32,
    #[serde(default)]
    pub shading_resolution: u32,
    #[serde(default = "default_one")]
    pub shading_factor: u32,
    #[serde(default)]
    pub shading_pixel_offset: i32,
    #[serde(default)]
    pub pixel_count_ratio: Ratio,
    /// Added to the start pixel of every scan; may be negative.
    #[serde(default)]
    pub output_pixel_offset: i32,
    #[serde(default)]
    pub black_pixels: u32,
    #[serde(default)]
    pub dummy_pixel: u32,
    #[serde(default)]
    pub fau_gain_white_ref: u32,
    #[serde(default)]
    pub gain_white_ref: u32,
    #[serde(default)]
    pub exposure: SensorExposure,
    #[serde(default = "default_lperiod")]
    pub exposure_lperiod: i32,
    #[serde(default)]
    pub segment_size: u32,
    #[serde(default)]
    pub segment_order: Vec<usize>,
    #[serde(default)]
    pub stagger_x: StaggerConfig,
    #[serde(default)]
    pub stagger_y: StaggerConfig,
    #[serde(default)]
    pub use_host_side_calib: bool,
    #[serde(default)]
    pub custom_regs: RegisterSettingSet<u8>,
    #[serde(default)]
    pub custom_fe_regs: RegisterSettingSet<u16>,
    #[serde(default = "default_gamma")]
    pub gamma: [f32; 3],
}

impl Default for Sensor {
    fn default() -> Self {
        Self {
            sensor_id: String::new(),
            full_resolution: 0,
            optical_resolution: 0,
            resolutions: ValueFilter::Any,
            channels: default_channels(),
            method: ScanMethod::Flatbed,
            register_dpihw: 0,
            register_dpiset: 0,
            shading_resolution: 0,
            shading_factor: 1,
            shading_pixel_offset: 0,
            pixel_count_ratio: Ratio::default(),
            output_pixel_offset: 0,
            black_pixels: 0,
            dummy_pixel: 0,
            fau_gain_white_ref: 0,
            gain_white_ref: 0,
            exposure: SensorExposure::default(),
            exposure_lperiod: -1,
            segment_size: 0,
            segment_order: Vec::new(),
            stagger_x: StaggerConfig::default(),
            stagger_y: StaggerConfig::default(),
            use_host_side_calib: false,
            custom_regs: RegisterSettingSet::new(),
            custom_fe_regs: RegisterSettingSet::new(),
            gamma: default_gamma(),
        }
    }
}

impl Sensor {
    pub fn optical_resolution(&self) -> u32 {
        if self.optical_resolution != 0 {
            self.optical_resolution
        } else {
            self.full_resolution
        }
    }

    /// CCD pixels combined into one system pixel, from the CKSEL bits of register 0x18.
    pub fn ccd_pixels_per_system_pixel(&self) -> u32 {
        let cksel = self.custom_regs.get_value(0x18).unwrap_or(0);
        u32::from(cksel & 0x03) + 1
    }

    pub fn matches_channel_count(&self, channels: u32) -> bool {
        self.channels.contains(&channels)
    }

    pub fn matches(&self, xres: u32, channels: u32, method: ScanMethod) -> bool {
        self.resolutions.matches(&xres) && self.matches_channel_count(channels) && self.method == method
    }

    pub fn segment_count(&self) -> u32 {
        if self.segment_order.len() < 2 {
            1
        } else {
            self.segment_order.len() as u32
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sensor {{")?;
        writeln!(f, "    sensor_id: {}", self.sensor_id)?;
        writeln!(f, "    full_resolution: {}", self.full_resolution)?;
        writeln!(f, "    optical_resolution: {}", self.optical_resolution())?;
        writeln!(f, "    resolutions: {}", self.resolutions)?;
        writeln!(f, "    channels: {:?}", self.channels)?;
        writeln!(f, "    method: {}", self.method)?;
        writeln!(f, "    register_dpihw: {}", self.register_dpihw)?;
        writeln!(f, "    register_dpiset: {}", self.register_dpiset)?;
        writeln!(f, "    shading_resolution: {}", self.shading_resolution)?;
        writeln!(f, "    pixel_count_ratio: {}", self.pixel_count_ratio)?;
        writeln!(f, "    output_pixel_offset: {}", self.output_pixel_offset)?;
        writeln!(f, "    exposure_lperiod: {}", self.exposure_lperiod)?;
        writeln!(f, "    segment_size: {}", self.segment_size)?;
        writeln!(f, "    segment_order: {:?}", self.segment_order)?;
        writeln!(f, "    stagger_x: {:?}", self.stagger_x.shifts())?;
        writeln!(f, "    stagger_y: {:?}", self.stagger_y.shifts())?;
        writeln!(f, "    use_host_side_calib: {}", self.use_host_side_calib)?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_count_needs_two_entries() {
        let mut sensor = Sensor::default();
        assert_eq!(sensor.segment_count(), 1);
        sensor.segment_order = vec![0];
        assert_eq!(sensor.segment_count(), 1);
        sensor.segment_order = vec![0, 2, 1, 3];
        assert_eq!(sensor.segment_count(), 4);
    }

    #[test]
    fn cksel_from_custom_regs() {
        let mut sensor = Sensor::default();
        assert_eq!(sensor.ccd_pixels_per_system_pixel(), 1);
        sensor.custom_regs.set_value(0x18, 0x12);
        assert_eq!(sensor.ccd_pixels_per_system_pixel(), 3);
    }
}
