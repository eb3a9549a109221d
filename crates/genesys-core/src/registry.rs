//! Scanner model registry.
//!
//! Everything that describes a concrete scanner (model geometry, sensor table,
//! motor profiles, analog frontend, GPIO and initial register values) lives in a
//! [`DeviceRegistry`]. The registry is built once, either from the built-in
//! tables or from a TOML file, and passed by reference to whoever opens a device.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::command_set::create_command_set;
use crate::error::{GenesysError, Result};
use crate::frontend::{Frontend, FrontendLayout, FrontendType};
use crate::image::ColorOrder;
use crate::model::{AsicType, MethodResolutions, Model, ModelFlag, ModelId};
use crate::motor::{Motor, MotorProfile, MotorSlope, StepType};
use crate::register::RegisterSettingSet;
use crate::sensor::{Sensor, SensorExposure, StaggerConfig};
use crate::settings::ScanMethod;
use crate::utilities::{Ratio, ValueFilter};

/// One scanner model with every table needed to drive it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub model: Model,
    pub sensors: Vec<Sensor>,
    pub motor: Motor,
    pub frontend: Frontend,
    #[serde(default)]
    pub gpo_regs: RegisterSettingSet<u8>,
    pub initial_regs: RegisterSettingSet<u8>,
}

impl ModelConfig {
    /// Check that the tables are consistent enough to open a device with.
    pub fn validate(&self) -> Result<()> {
        let name = &self.model.name;
        create_command_set(self.model.asic_type)
            .map_err(|e| GenesysError::Config(format!("{name}: {e}")))?;

        if self.sensors.is_empty() {
            return Err(GenesysError::Config(format!("{name}: no sensors defined")));
        }
        if self.motor.base_ydpi == 0 {
            return Err(GenesysError::Config(format!("{name}: motor base_ydpi is 0")));
        }
        if self.motor.profiles.is_empty() {
            return Err(GenesysError::Config(format!("{name}: motor has no profiles")));
        }

        // Sensor registers are written on top of the initial set, so they must exist there.
        for sensor in &self.sensors {
            if let Some(reg) = sensor
                .custom_regs
                .iter()
                .find(|reg| !self.initial_regs.has_reg(reg.address))
            {
                return Err(GenesysError::Config(format!(
                    "{name}: sensor register {:#04x} is missing from the initial registers",
                    reg.address
                )));
            }
        }
        Ok(())
    }
}

/// Immutable collection of scanner models.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRegistry {
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

impl DeviceRegistry {
    /// The models shipped with the library.
    pub fn builtin() -> Self {
        Self {
            models: vec![canon_lide_90(), plustek_opticfilm_7200(), canon_lide_200()],
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let registry: Self = toml::from_str(contents)?;
        for model in &registry.models {
            model.validate()?;
        }
        debug!(models = registry.models.len(), "Parsed registry");
        Ok(registry)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let registry = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), models = registry.models.len(), "Loaded registry");
        Ok(registry)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Look a model up by its short name (`canon-lide-90`), case-insensitively.
    pub fn find(&self, name: &str) -> Result<&ModelConfig> {
        self.models
            .iter()
            .find(|m| m.model.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| GenesysError::Config(format!("unknown model '{name}'")))
    }

    pub fn find_by_usb_id(&self, vendor_id: u16, product_id: u16) -> Option<&ModelConfig> {
        self.models
            .iter()
            .find(|m| m.vendor_id == vendor_id && m.product_id == product_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelConfig> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Built-in tables
// ---------------------------------------------------------------------------

fn regs8(values: &[(u16, u8)]) -> RegisterSettingSet<u8> {
    values.iter().copied().collect()
}

fn regs16(values: &[(u16, u16)]) -> RegisterSettingSet<u16> {
    values.iter().copied().collect()
}

fn flatbed_resolutions(method: ScanMethod, resolutions: &[u32]) -> Vec<MethodResolutions> {
    vec![MethodResolutions {
        methods: vec![method],
        resolutions_x: resolutions.to_vec(),
        resolutions_y: resolutions.to_vec(),
    }]
}

fn profile_for(slope: MotorSlope, step_type: StepType, resolutions: &[u32]) -> MotorProfile {
    MotorProfile {
        resolutions: ValueFilter::Values(resolutions.to_vec()),
        ..MotorProfile::new(slope, step_type, 0)
    }
}

/// Register file shared by the GL842 models; the model-specific values are
/// layered on top.
fn gl842_initial_regs(model_id: ModelId) -> RegisterSettingSet<u8> {
    let mut regs = match model_id {
        ModelId::PlustekOpticfilm7200 => regs8(&[
            (0x01, 0x00), (0x02, 0x78), (0x03, 0xbf), (0x04, 0x22), (0x05, 0x48),
            (0x06, 0xb8), (0x07, 0x00), (0x08, 0x00), (0x09, 0x00), (0x0a, 0x00),
            (0x0d, 0x01),
        ]),
        _ => regs8(&[
            (0x01, 0x82), (0x02, 0x10), (0x03, 0x60), (0x04, 0x10), (0x05, 0x8c),
            (0x06, 0x18), (0x08, 0x00), (0x09, 0x21), (0x0a, 0x00), (0x0d, 0x00),
        ]),
    };

    let common = regs8(&[
        // exposure, set from the sensor
        (0x10, 0x00), (0x11, 0x00), (0x12, 0x00), (0x13, 0x00), (0x14, 0x00), (0x15, 0x00),
        (0x16, 0x00), (0x17, 0x00), (0x18, 0x00), (0x19, 0x00), (0x1a, 0x00), (0x1b, 0x00),
        (0x1c, 0x00), (0x1d, 0x00), (0x1e, 0x10),
        // motor setup
        (0x21, 0x10), (0x22, 0x10), (0x23, 0x10), (0x24, 0x10),
        (0x25, 0x00), (0x26, 0x00), (0x27, 0x00),
        (0x29, 0xff),
        (0x2c, 0x02), (0x2d, 0x58), (0x2e, 0x80), (0x2f, 0x80),
        (0x30, 0x00), (0x31, 0x49), (0x32, 0x53), (0x33, 0xb9),
        (0x34, 0x13), (0x35, 0x00), (0x36, 0x40), (0x37, 0x00), (0x38, 0x2a), (0x39, 0xf8),
        (0x3d, 0x00), (0x3e, 0x00), (0x3f, 0x01),
        (0x52, 0x00), (0x53, 0x00), (0x54, 0x00), (0x55, 0x00), (0x56, 0x00),
        (0x57, 0x00), (0x58, 0x00), (0x59, 0x00), (0x5a, 0x00),
        (0x5f, 0x10),
        (0x60, 0x00), (0x61, 0x00), (0x62, 0x00), (0x63, 0x00), (0x64, 0x00), (0x65, 0x00),
        (0x69, 0x10), (0x6a, 0x10),
        (0x70, 0x00), (0x71, 0x00), (0x72, 0x00), (0x73, 0x00), (0x74, 0x00), (0x75, 0x00),
        (0x76, 0x00), (0x77, 0x00), (0x78, 0x00), (0x79, 0x00), (0x7a, 0x00), (0x7b, 0x00),
        (0x7c, 0x00), (0x7d, 0x00), (0x7f, 0x00),
        (0x80, 0x00),
    ]);
    regs.merge(&common);

    match model_id {
        ModelId::PlustekOpticfilm7200 => regs.merge(&regs8(&[
            (0x1f, 0x01), (0x20, 0x27), (0x5e, 0x01), (0x67, 0x7f), (0x68, 0x7f),
            (0x81, 0x00), (0x82, 0x00), (0x83, 0x00), (0x84, 0x00), (0x85, 0x00),
            (0x86, 0x00), (0x87, 0x00),
        ])),
        _ => regs.merge(&regs8(&[
            (0x1f, 0x02), (0x20, 0x02), (0x5d, 0x20), (0x5e, 0x41), (0x66, 0x00),
            (0x67, 0x40), (0x68, 0x40), (0x7e, 0x00),
            (0x81, 0x00), (0x82, 0x0f), (0x83, 0x00), (0x84, 0x0e), (0x85, 0x00),
            (0x86, 0x0d), (0x87, 0x00), (0x88, 0x00), (0x89, 0x00),
        ])),
    }
    regs
}

fn canon_lide_90() -> ModelConfig {
    let model = Model {
        name: "canon-lide-90".into(),
        vendor: "Canon".into(),
        model: "LiDE 90".into(),
        model_id: ModelId::CanonLide90,
        asic_type: AsicType::Gl842,
        resolutions: flatbed_resolutions(ScanMethod::Flatbed, &[2400, 1200, 600, 300]),
        x_offset: 3.5,
        y_offset: 9.0,
        x_size: 219.0,
        y_size: 299.0,
        y_offset_calib_white: 0.0,
        y_size_calib_mm: 2.0,
        x_size_calib_mm: 221.5,
        line_mode_color_order: ColorOrder::Rgb,
        is_cis: true,
        sensor_id: "cis-canon-lide-90".into(),
        frontend_id: "canon-lide-90".into(),
        motor_id: "canon-lide-90".into(),
        flags: ModelFlag::DISABLE_ADC_CALIBRATION
            | ModelFlag::HOST_SIDE_CALIBRATION_COMPLETE_SCAN
            | ModelFlag::USE_CONSTANT_FOR_DARK_CALIBRATION
            | ModelFlag::DISABLE_FAST_FEEDING
            | ModelFlag::SHADING_REPARK
            | ModelFlag::CUSTOM_GAMMA,
        search_lines: 400,
        ..Model::default()
    };

    let base = Sensor {
        sensor_id: "cis-canon-lide-90".into(),
        full_resolution: 2400,
        black_pixels: 20,
        dummy_pixel: 253,
        fau_gain_white_ref: 150,
        gain_white_ref: 150,
        use_host_side_calib: true,
        custom_regs: regs8(&[
            (0x16, 0x20), (0x17, 0x06), (0x18, 0x00), (0x19, 0xff),
            (0x1a, 0x24), (0x1c, 0x00), (0x1d, 0x04),
            (0x52, 0x02), (0x53, 0x04), (0x54, 0x02), (0x55, 0x04),
            (0x56, 0x02), (0x57, 0x04), (0x58, 0x0a), (0x59, 0x71), (0x5a, 0x55),
            (0x70, 0x00), (0x71, 0x05), (0x72, 0x07), (0x73, 0x09),
            (0x74, 0x00), (0x75, 0x01), (0x76, 0xff),
            (0x77, 0x00), (0x78, 0x00), (0x79, 0x3f),
            (0x7a, 0x00), (0x7b, 0x00), (0x7c, 0x1e), (0x7d, 0x11), (0x7f, 0x50),
        ]),
        gamma: [1.0, 1.0, 1.0],
        ..Sensor::default()
    };

    // (resolution, optical, dpihw, dpiset, shading resolution, shading factor,
    //  output offset, exposure, lperiod, segment order)
    let table: [(u32, u32, u32, u32, u32, u32, i32, [u16; 3], i32, &[usize]); 4] = [
        (300, 300, 600, 600, 300, 2, 280, [955, 1235, 675], 6500, &[]),
        (600, 600, 600, 600, 600, 1, 250, [1655, 2075, 1095], 6536, &[]),
        (1200, 1200, 1200, 1200, 1200, 1, 500, [3055, 4175, 1935], 12688, &[0, 1]),
        (2400, 2400, 2400, 2400, 2400, 1, 1000, [5855, 7535, 3615], 21500, &[0, 1, 2, 3]),
    ];
    let sensors = table
        .iter()
        .map(|&(res, optical, dpihw, dpiset, shading_res, factor, offset, exp, lperiod, order)| Sensor {
            resolutions: ValueFilter::Values(vec![res]),
            optical_resolution: optical,
            register_dpihw: dpihw,
            register_dpiset: dpiset,
            shading_resolution: shading_res,
            shading_factor: factor,
            output_pixel_offset: offset,
            exposure: SensorExposure::new(exp[0], exp[1], exp[2]),
            exposure_lperiod: lperiod,
            segment_size: 5152,
            segment_order: order.to_vec(),
            ..base.clone()
        })
        .collect();

    let motor = Motor {
        id: "canon-lide-90".into(),
        base_ydpi: 1200,
        profiles: vec![
            profile_for(MotorSlope::create_from_steps(8000, 3000, 200), StepType::Full, &[150, 300]),
            profile_for(MotorSlope::create_from_steps(7000, 3000, 200), StepType::Half, &[600, 1200]),
            profile_for(MotorSlope::create_from_steps(7000, 3000, 200), StepType::Quarter, &[2400]),
        ],
        fast_profiles: Vec::new(),
    };

    let frontend = Frontend {
        id: "canon-lide-90".into(),
        regs: regs16(&[
            (0x01, 0x23), (0x02, 0x07), (0x03, 0x29), (0x06, 0x0d), (0x08, 0x00), (0x09, 0x16),
            (0x20, 0x4d), (0x21, 0x4d), (0x22, 0x4d), (0x23, 0x4d),
            (0x28, 0x14), (0x29, 0x14), (0x2a, 0x14), (0x2b, 0x14),
        ]),
        reg2: [0, 0, 0],
        layout: FrontendLayout::wolfson(),
    };

    ModelConfig {
        vendor_id: 0x04a9,
        product_id: 0x1900,
        model,
        sensors,
        motor,
        frontend,
        gpo_regs: regs8(&[(0x6b, 0x03), (0x6c, 0x74), (0x6d, 0x80), (0x6e, 0x7f), (0x6f, 0xe0)]),
        initial_regs: gl842_initial_regs(ModelId::CanonLide90),
    }
}

fn plustek_opticfilm_7200() -> ModelConfig {
    let model = Model {
        name: "plustek-opticfilm-7200".into(),
        vendor: "PLUSTEK".into(),
        model: "OpticFilm 7200".into(),
        model_id: ModelId::PlustekOpticfilm7200,
        asic_type: AsicType::Gl842,
        resolutions: flatbed_resolutions(ScanMethod::Transparency, &[7200, 3600, 1800, 900]),
        bpp_gray_values: vec![16],
        bpp_color_values: vec![16],
        default_method: ScanMethod::Transparency,
        x_size: 36.0,
        y_size: 44.0,
        x_offset_ta: 0.7,
        y_offset_ta: 28.0,
        x_size_ta: 36.0,
        y_size_ta: 25.0,
        x_size_calib_mm: 35.9834,
        y_offset_calib_white_ta: 0.0,
        y_size_calib_ta_mm: 2.0,
        ld_shift_g: 12,
        ld_shift_b: 24,
        line_mode_color_order: ColorOrder::Rgb,
        sensor_id: "ccd-plustek-opticfilm-7200".into(),
        frontend_id: "plustek-opticfilm-7200".into(),
        motor_id: "plustek-opticfilm-7200".into(),
        flags: ModelFlag::WARMUP
            | ModelFlag::CUSTOM_GAMMA
            | ModelFlag::DARK_CALIBRATION
            | ModelFlag::SHADING_REPARK,
        search_lines: 200,
        ..Model::default()
    };

    let base = Sensor {
        sensor_id: "ccd-plustek-opticfilm-7200".into(),
        full_resolution: 7200,
        register_dpihw: 1200,
        black_pixels: 88,
        dummy_pixel: 19,
        fau_gain_white_ref: 210,
        gain_white_ref: 230,
        exposure: SensorExposure::new(0x2b00, 0x2b00, 0x2b00),
        exposure_lperiod: 0x694e,
        use_host_side_calib: true,
        custom_regs: regs8(&[
            (0x16, 0x3b), (0x17, 0x4b), (0x18, 0x10), (0x19, 0x00),
            (0x1a, 0x24), (0x1b, 0x00), (0x1c, 0x40), (0x1d, 0x84),
            (0x52, 0x09), (0x53, 0x0c), (0x54, 0x0e), (0x55, 0x02),
            (0x56, 0x04), (0x57, 0x07), (0x58, 0x22), (0x59, 0x69), (0x5a, 0xc0),
            (0x70, 0x08), (0x71, 0x09), (0x72, 0x0b), (0x73, 0x0c),
            (0x74, 0x00), (0x75, 0x00), (0x76, 0x00),
            (0x77, 0x00), (0x78, 0x7f), (0x79, 0xff),
            (0x7a, 0x00), (0x7b, 0x00), (0x7c, 0x00), (0x7d, 0x00), (0x7f, 0x01),
        ]),
        gamma: [1.0, 1.0, 1.0],
        ..Sensor::default()
    };

    // (resolution, pixel count ratio, output offset, dpiset, stagger y)
    let table: [(u32, u32, i32, u32, &[usize]); 4] = [
        (900, 8, 2, 150, &[]),
        (1800, 4, 10, 300, &[]),
        (3600, 2, 10, 600, &[]),
        (7200, 1, 20, 1200, &[0, 4]),
    ];
    let sensors = table
        .iter()
        .map(|&(res, ratio, offset, dpiset, stagger)| Sensor {
            resolutions: ValueFilter::Values(vec![res]),
            method: ScanMethod::Transparency,
            shading_resolution: res,
            pixel_count_ratio: Ratio::new(ratio, ratio),
            output_pixel_offset: offset,
            register_dpiset: dpiset,
            stagger_y: StaggerConfig::new(stagger.to_vec()),
            ..base.clone()
        })
        .collect();

    let motor = Motor {
        id: "plustek-opticfilm-7200".into(),
        base_ydpi: 3600,
        profiles: vec![MotorProfile {
            motor_vref: 0,
            ..MotorProfile::new(MotorSlope::create_from_steps(20000 * 2, 600 * 2, 200), StepType::Half, 0)
        }],
        fast_profiles: Vec::new(),
    };

    let frontend = Frontend {
        id: "plustek-opticfilm-7200".into(),
        regs: regs16(&[
            (0x00, 0xf8), (0x01, 0x80), (0x02, 0x2e), (0x03, 0x17),
            (0x04, 0x20), (0x05, 0x0109), (0x06, 0x01), (0x07, 0x0104),
        ]),
        reg2: [0, 0, 0],
        layout: FrontendLayout::analog_devices(),
    };

    ModelConfig {
        vendor_id: 0x07b3,
        product_id: 0x0807,
        model,
        sensors,
        motor,
        frontend,
        gpo_regs: regs8(&[
            (0x6b, 0x33), (0x6c, 0x00), (0x6d, 0x80), (0x6e, 0x0c), (0x6f, 0x80), (0x7e, 0x00),
        ]),
        initial_regs: gl842_initial_regs(ModelId::PlustekOpticfilm7200),
    }
}

fn canon_lide_200() -> ModelConfig {
    let model = Model {
        name: "canon-lide-200".into(),
        vendor: "Canon".into(),
        model: "LiDE 200".into(),
        model_id: ModelId::CanonLide200,
        asic_type: AsicType::Gl847,
        resolutions: flatbed_resolutions(
            ScanMethod::Flatbed,
            &[4800, 2400, 1200, 600, 300, 200, 150, 100, 75],
        ),
        x_offset: 1.1,
        y_offset: 8.3,
        x_size: 216.07,
        y_size: 299.0,
        y_offset_calib_white: 0.4233334,
        y_size_calib_mm: 3.0,
        x_size_calib_mm: 217.4241,
        line_mode_color_order: ColorOrder::Rgb,
        is_cis: true,
        sensor_id: "cis-canon-lide-200".into(),
        frontend_id: "canon-lide-200".into(),
        motor_id: "canon-lide-200".into(),
        flags: ModelFlag::SIS_SENSOR
            | ModelFlag::DARK_CALIBRATION
            | ModelFlag::SHADING_REPARK
            | ModelFlag::CUSTOM_GAMMA,
        search_lines: 400,
        ..Model::default()
    };

    let base = Sensor {
        sensor_id: "cis-canon-lide-200".into(),
        full_resolution: 4800,
        black_pixels: 87 * 4,
        dummy_pixel: 16 * 4,
        fau_gain_white_ref: 210,
        gain_white_ref: 200,
        pixel_count_ratio: Ratio::new(1, 8),
        segment_size: 5136,
        gamma: [2.2, 2.2, 2.2],
        ..Sensor::default()
    };

    // Only 0x17 differs between the resolutions.
    let custom_regs = |reg17: u8| {
        regs8(&[
            (0x16, 0x10), (0x17, reg17), (0x18, 0x00), (0x19, 0xff),
            (0x1a, 0x34), (0x1b, 0x00), (0x1c, 0x02), (0x1d, 0x04),
            (0x52, 0x03), (0x53, 0x07), (0x54, 0x00), (0x55, 0x00),
            (0x56, 0x00), (0x57, 0x00), (0x58, 0x2a), (0x59, 0xe1), (0x5a, 0x55),
            (0x74, 0x00), (0x75, 0x00), (0x76, 0x3c),
            (0x77, 0x00), (0x78, 0x00), (0x79, 0x9f),
            (0x7a, 0x00), (0x7b, 0x00), (0x7c, 0x55),
        ])
    };

    // (resolution, dpihw, lperiod, exposure, shading factor, output offset,
    //  segment order, reg 0x17)
    let table: [(u32, u32, i32, [u16; 3], u32, i32, &[usize], u8); 10] = [
        (75, 600, 2848, [304, 203, 180], 8, 40, &[], 0x0a),
        (100, 600, 2848, [304, 203, 180], 6, 53, &[], 0x0a),
        (150, 600, 2848, [304, 203, 180], 4, 80, &[], 0x0a),
        (200, 600, 2848, [304, 203, 180], 3, 106, &[], 0x0a),
        (300, 600, 1424, [304, 203, 180], 2, 160, &[], 0x0a),
        (400, 600, 1424, [304, 203, 180], 1, 213, &[], 0x0a),
        (600, 600, 1432, [492, 326, 296], 1, 320, &[], 0x0a),
        (1200, 1200, 2712, [935, 592, 538], 1, 640, &[0, 1], 0x08),
        (2400, 2400, 5280, [1777, 1125, 979], 1, 1280, &[0, 2, 1, 3], 0x06),
        (4800, 4800, 10416, [3377, 2138, 1780], 1, 2560, &[0, 2, 4, 6, 1, 3, 5, 7], 0x04),
    ];
    let sensors = table
        .iter()
        .map(|&(res, dpihw, lperiod, exp, factor, offset, order, reg17)| Sensor {
            resolutions: ValueFilter::Values(vec![res]),
            register_dpihw: dpihw,
            register_dpiset: res,
            shading_resolution: dpihw,
            exposure_lperiod: lperiod,
            exposure: SensorExposure::new(exp[0], exp[1], exp[2]),
            shading_factor: factor,
            output_pixel_offset: offset,
            segment_order: order.to_vec(),
            custom_regs: custom_regs(reg17),
            ..base.clone()
        })
        .collect();

    let motor = Motor {
        id: "canon-lide-200".into(),
        base_ydpi: 1200,
        profiles: vec![
            MotorProfile::new(MotorSlope::create_from_steps(46876, 864, 255), StepType::Half, 1432),
            MotorProfile::new(MotorSlope::create_from_steps(46876, 864, 279), StepType::Quarter, 2712),
            MotorProfile::new(MotorSlope::create_from_steps(31680, 864, 247), StepType::Eighth, 5280),
            MotorProfile::new(MotorSlope::create_from_steps(31680, 864, 247), StepType::Eighth, 10416),
        ],
        fast_profiles: Vec::new(),
    };

    let frontend = Frontend {
        id: "canon-lide-200".into(),
        regs: regs16(&[
            (0x00, 0x9d), (0x01, 0x91), (0x02, 0x32), (0x03, 0x04),
            (0x04, 0x00), (0x05, 0x00), (0x06, 0x3f), (0x07, 0x00),
        ]),
        reg2: [0, 0, 0],
        layout: FrontendLayout {
            frontend_type: FrontendType::AnalogDevicesGl847,
            ..FrontendLayout::analog_devices()
        },
    };

    let initial_regs = regs8(&[
        (0x01, 0x82), (0x02, 0x18), (0x03, 0x50), (0x04, 0x12), (0x05, 0x80), (0x06, 0x50),
        (0x08, 0x10), (0x09, 0x01), (0x0a, 0x00), (0x0b, 0x01), (0x0c, 0x02),
        (0x10, 0x00), (0x11, 0x00), (0x12, 0x00), (0x13, 0x00), (0x14, 0x00), (0x15, 0x00),
        (0x16, 0x10), (0x17, 0x08), (0x18, 0x00), (0x19, 0x50),
        (0x1a, 0x34), (0x1b, 0x00), (0x1c, 0x02), (0x1d, 0x04), (0x1e, 0x10), (0x1f, 0x04),
        (0x20, 0x02), (0x21, 0x10), (0x22, 0x7f), (0x23, 0x7f), (0x24, 0x10),
        (0x25, 0x00), (0x26, 0x00), (0x27, 0x00),
        (0x2c, 0x09), (0x2d, 0x60), (0x2e, 0x80), (0x2f, 0x80),
        (0x30, 0x00), (0x31, 0x10), (0x32, 0x15), (0x33, 0x0e),
        (0x34, 0x40), (0x35, 0x00), (0x36, 0x2a), (0x37, 0x30), (0x38, 0x2a), (0x39, 0xf8),
        (0x3d, 0x00), (0x3e, 0x00), (0x3f, 0x00),
        (0x52, 0x03), (0x53, 0x07), (0x54, 0x00), (0x55, 0x00), (0x56, 0x00),
        (0x57, 0x00), (0x58, 0x2a), (0x59, 0xe1), (0x5a, 0x55),
        (0x5e, 0x41), (0x5f, 0x40),
        (0x60, 0x00), (0x61, 0x21), (0x62, 0x40), (0x63, 0x00), (0x64, 0x21), (0x65, 0x40),
        (0x67, 0x80), (0x68, 0x80), (0x69, 0x20), (0x6a, 0x20),
        (0x74, 0x00), (0x75, 0x00), (0x76, 0x3c), (0x77, 0x00), (0x78, 0x00), (0x79, 0x9f),
        (0x7a, 0x00), (0x7b, 0x00), (0x7c, 0x55), (0x7d, 0x00),
        (0x87, 0x02), (0x9d, 0x06), (0xa2, 0x0f), (0xbd, 0x18), (0xfe, 0x08),
        // gamma[0] and gamma[256]
        (0xbe, 0x00), (0xc5, 0x00), (0xc6, 0x00), (0xc7, 0x00), (0xc8, 0x00), (0xc9, 0x00),
        (0xca, 0x00),
    ]);

    ModelConfig {
        vendor_id: 0x04a9,
        product_id: 0x1905,
        model,
        sensors,
        motor,
        frontend,
        gpo_regs: regs8(&[
            (0x6b, 0x02), (0x6c, 0xf9), (0x6d, 0x20), (0x6e, 0xff), (0x6f, 0x00),
            (0xa6, 0x04), (0xa7, 0x04), (0xa8, 0x00), (0xa9, 0x00),
        ]),
        initial_regs,
    }
}
