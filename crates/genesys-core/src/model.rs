use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::error::{GenesysError, Result};
use crate::image::ColorOrder;
use crate::settings::ScanMethod;

/// Scanner controller chip family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsicType {
    #[default]
    Unknown,
    Gl646,
    Gl841,
    Gl842,
    Gl843,
    Gl845,
    Gl846,
    Gl847,
    Gl124,
}

impl fmt::Display for AsicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Gl646 => write!(f, "GL646"),
            Self::Gl841 => write!(f, "GL841"),
            Self::Gl842 => write!(f, "GL842"),
            Self::Gl843 => write!(f, "GL843"),
            Self::Gl845 => write!(f, "GL845"),
            Self::Gl846 => write!(f, "GL846"),
            Self::Gl847 => write!(f, "GL847"),
            Self::Gl124 => write!(f, "GL124"),
        }
    }
}

/// Models that need special handling somewhere in session computation or
/// register programming.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    #[default]
    Unknown,
    Canon4400f,
    Canon5600f,
    Canon8400f,
    CanonLide90,
    CanonLide100,
    CanonLide200,
    CanonLide700f,
    PlustekOpticfilm7200,
    PlustekOpticfilm7200i,
    PlustekOpticfilm7300,
    PlustekOpticfilm7400,
    PlustekOpticfilm7500i,
    PlustekOpticfilm8200i,
}

/// Bit set of model quirks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelFlag(u32);

impl ModelFlag {
    pub const NONE: Self = Self(0);
    pub const UNTESTED: Self = Self(1 << 0);
    pub const GAMMA_14BIT: Self = Self(1 << 1);
    pub const WARMUP: Self = Self(1 << 4);
    pub const DISABLE_ADC_CALIBRATION: Self = Self(1 << 5);
    pub const DISABLE_EXPOSURE_CALIBRATION: Self = Self(1 << 6);
    pub const DISABLE_SHADING_CALIBRATION: Self = Self(1 << 7);
    pub const DARK_CALIBRATION: Self = Self(1 << 8);
    pub const HOST_SIDE_CALIBRATION_COMPLETE_SCAN: Self = Self(1 << 9);
    pub const MUST_WAIT: Self = Self(1 << 10);
    pub const USE_CONSTANT_FOR_DARK_CALIBRATION: Self = Self(1 << 11);
    pub const DARK_WHITE_CALIBRATION: Self = Self(1 << 12);
    pub const CUSTOM_GAMMA: Self = Self(1 << 13);
    pub const DISABLE_FAST_FEEDING: Self = Self(1 << 14);
    /// Multi-segment sensor.
    pub const SIS_SENSOR: Self = Self(1 << 16);
    pub const SHADING_REPARK: Self = Self(1 << 18);
    pub const INVERT_PIXEL_DATA: Self = Self(1 << 19);
    /// 16-bit samples arrive byte-swapped.
    pub const SWAP_16BIT_DATA: Self = Self(1 << 20);
    pub const UTA_NO_SECONDARY_MOTOR: Self = Self(1 << 21);
    pub const TA_NO_SECONDARY_LAMP: Self = Self(1 << 22);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn has(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ModelFlag {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Resolutions supported for a group of scan methods.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodResolutions {
    pub methods: Vec<ScanMethod>,
    pub resolutions_x: Vec<u32>,
    pub resolutions_y: Vec<u32>,
}

impl MethodResolutions {
    pub fn min_resolution_x(&self) -> u32 {
        self.resolutions_x.iter().copied().min().unwrap_or(0)
    }

    pub fn min_resolution_y(&self) -> u32 {
        self.resolutions_y.iter().copied().min().unwrap_or(0)
    }

    pub fn nearest_resolution_x(&self, resolution: u32) -> u32 {
        self.resolutions_x
            .iter()
            .copied()
            .min_by_key(|&r| r.abs_diff(resolution))
            .unwrap_or(resolution)
    }
}

/// Static description of one scanner model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    pub name: String,
    pub vendor: String,
    pub model: String,
    pub model_id: ModelId,
    pub asic_type: AsicType,
    pub resolutions: Vec<MethodResolutions>,
    pub bpp_gray_values: Vec<u32>,
    pub bpp_color_values: Vec<u32>,
    pub default_method: ScanMethod,
    /// Start of the scan area in mm, relative to the sensor home position.
    pub x_offset: f32,
    pub y_offset: f32,
    pub x_size: f32,
    pub y_size: f32,
    pub x_offset_ta: f32,
    pub y_offset_ta: f32,
    pub x_size_ta: f32,
    pub y_size_ta: f32,
    /// Head position aligned with the transparency lamp, mm.
    pub y_offset_sensor_to_ta: f32,
    /// Start and size of the white calibration strip, mm.
    pub y_offset_calib_white: f32,
    pub y_size_calib_mm: f32,
    pub x_size_calib_mm: f32,
    /// Calibration area on the transparency adapter, mm.
    pub y_offset_calib_white_ta: f32,
    pub y_size_calib_ta_mm: f32,
    /// Line distance between colour channels, in lines at the motor base resolution.
    pub ld_shift_r: u32,
    pub ld_shift_g: u32,
    pub ld_shift_b: u32,
    pub line_mode_color_order: ColorOrder,
    pub is_cis: bool,
    pub is_sheetfed: bool,
    pub sensor_id: String,
    pub frontend_id: String,
    pub motor_id: String,
    pub flags: ModelFlag,
    pub search_lines: u32,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            name: String::new(),
            vendor: String::new(),
            model: String::new(),
            model_id: ModelId::Unknown,
            asic_type: AsicType::Unknown,
            resolutions: Vec::new(),
            bpp_gray_values: vec![8, 16],
            bpp_color_values: vec![8, 16],
            default_method: ScanMethod::Flatbed,
            x_offset: 0.0,
            y_offset: 0.0,
            x_size: 0.0,
            y_size: 0.0,
            x_offset_ta: 0.0,
            y_offset_ta: 0.0,
            x_size_ta: 0.0,
            y_size_ta: 0.0,
            y_offset_sensor_to_ta: 0.0,
            y_offset_calib_white: 0.0,
            y_size_calib_mm: 0.0,
            x_size_calib_mm: 0.0,
            y_offset_calib_white_ta: 0.0,
            y_size_calib_ta_mm: 0.0,
            ld_shift_r: 0,
            ld_shift_g: 0,
            ld_shift_b: 0,
            line_mode_color_order: ColorOrder::Rgb,
            is_cis: false,
            is_sheetfed: false,
            sensor_id: String::new(),
            frontend_id: String::new(),
            motor_id: String::new(),
            flags: ModelFlag::NONE,
            search_lines: 0,
        }
    }
}

impl Model {
    pub fn has_method(&self, method: ScanMethod) -> bool {
        self.resolution_settings(method).is_some()
    }

    pub fn resolution_settings(&self, method: ScanMethod) -> Option<&MethodResolutions> {
        self.resolutions.iter().find(|r| r.methods.contains(&method))
    }

    pub fn get_resolution_settings(&self, method: ScanMethod) -> Result<&MethodResolutions> {
        self.resolution_settings(method).ok_or_else(|| {
            GenesysError::invalid(format!("{} does not support scan method {method}", self.name))
        })
    }

    /// All x resolutions for `method`, highest first.
    pub fn get_resolutions(&self, method: ScanMethod) -> Result<Vec<u32>> {
        let settings = self.get_resolution_settings(method)?;
        let mut res = settings.resolutions_x.clone();
        res.extend(&settings.resolutions_y);
        res.sort_unstable_by(|a, b| b.cmp(a));
        res.dedup();
        Ok(res)
    }
}
