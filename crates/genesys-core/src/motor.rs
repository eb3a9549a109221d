//! Stepper motor acceleration model and slope table generation.
//!
//! Speeds are expressed as the time one motor step takes (`_w` suffix), in
//! units of the ASIC pixel clock. Smaller values mean a faster motor.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GenesysError, Result};
use crate::model::AsicType;
use crate::settings::ScanMethod;
use crate::utilities::ValueFilter;

/// Microstepping mode. The value is the shift applied to full-step timings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    #[default]
    Full = 0,
    Half = 1,
    Quarter = 2,
    Eighth = 3,
}

impl StepType {
    pub fn shift(self) -> u32 {
        self as u32
    }

    pub fn from_shift(shift: u32) -> Result<Self> {
        match shift {
            0 => Ok(Self::Full),
            1 => Ok(Self::Half),
            2 => Ok(Self::Quarter),
            3 => Ok(Self::Eighth),
            _ => Err(GenesysError::invalid(format!("invalid step type {shift}"))),
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "1/1"),
            Self::Half => write!(f, "1/2"),
            Self::Quarter => write!(f, "1/4"),
            Self::Eighth => write!(f, "1/8"),
        }
    }
}

/// Constant acceleration from `initial_speed_w` up to `max_speed_w`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorSlope {
    pub initial_speed_w: u32,
    pub max_speed_w: u32,
    /// Acceleration in speed units per step; speed here is `1 / w`.
    pub acceleration: f32,
    #[serde(default)]
    pub max_step_count: u32,
}

impl MotorSlope {
    /// Slope that goes from `initial_w` to `max_w` in `steps` steps.
    pub fn create_from_steps(initial_w: u32, max_w: u32, steps: u32) -> Self {
        let initial_speed_v = 1.0f32 / initial_w as f32;
        let max_speed_v = 1.0f32 / max_w as f32;
        let acceleration =
            (max_speed_v * max_speed_v - initial_speed_v * initial_speed_v) / (2 * steps) as f32;
        Self {
            initial_speed_w: initial_w,
            max_speed_w: max_w,
            acceleration,
            max_step_count: 0,
        }
    }

    /// Step time of step number `step` of the acceleration, shifted for `step_type`.
    pub fn get_table_step_shifted(&self, step: u32, step_type: StepType) -> u32 {
        // The first two steps both run at the initial speed.
        if step < 2 {
            return self.initial_speed_w >> step_type.shift();
        }
        let step = step - 1;

        let initial_speed_v = 1.0f32 / self.initial_speed_w as f32;
        let speed_v =
            (initial_speed_v * initial_speed_v + 2.0 * self.acceleration * step as f32).sqrt();
        ((1.0f32 / speed_v) as u32) >> step_type.shift()
    }
}

impl fmt::Display for MotorSlope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MotorSlope {{ initial_speed_w: {}, max_speed_w: {}, a: {:e} }}",
            self.initial_speed_w, self.max_speed_w, self.acceleration
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MotorSlopeTable {
    pub table: Vec<u16>,
    pixeltime_sum: u64,
}

impl MotorSlopeTable {
    pub fn new(table: Vec<u16>) -> Self {
        let mut t = Self {
            table,
            pixeltime_sum: 0,
        };
        t.generate_pixeltime_sum();
        t
    }

    /// Sum of every step time in the table.
    pub fn pixeltime_sum(&self) -> u64 {
        self.pixeltime_sum
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn generate_pixeltime_sum(&mut self) {
        self.pixeltime_sum = self.table.iter().map(|&v| u64::from(v)).sum();
    }
}

/// Maximum number of entries a slope table may have on the given ASIC.
pub fn get_slope_table_max_size(asic_type: AsicType) -> Result<usize> {
    match asic_type {
        AsicType::Gl646 | AsicType::Gl841 | AsicType::Gl842 => Ok(255),
        AsicType::Gl843 | AsicType::Gl845 | AsicType::Gl846 | AsicType::Gl847 | AsicType::Gl124 => {
            Ok(1024)
        }
        AsicType::Unknown => Err(GenesysError::invalid("unknown asic type")),
    }
}

/// Build the acceleration table that takes the motor from standstill to
/// `target_speed_w`.
///
/// The table always ends on the target speed, or on the slope's maximum speed
/// when the target is faster than the motor can go. It is then padded with the
/// final value until its length is a multiple of `steps_alignment` and at
/// least `min_size`, never reaching `max_size`.
pub fn create_slope_table_for_speed(
    slope: &MotorSlope,
    target_speed_w: u32,
    step_type: StepType,
    steps_alignment: usize,
    min_size: usize,
    max_size: usize,
) -> Result<MotorSlopeTable> {
    let step_shift = step_type.shift();

    let target_speed_shifted_w = target_speed_w >> step_shift;
    let max_speed_shifted_w = slope.max_speed_w >> step_shift;

    if target_speed_shifted_w < max_speed_shifted_w {
        warn!(
            target = target_speed_shifted_w,
            max = max_speed_shifted_w,
            "Failed to reach target motor speed"
        );
    }

    if target_speed_shifted_w >= u32::from(u16::MAX) {
        return Err(GenesysError::invalid("target motor speed is too low"));
    }

    let final_speed = target_speed_shifted_w.max(max_speed_shifted_w);
    let limit = max_size.saturating_sub(1);

    let mut table = Vec::with_capacity(max_size);
    while table.len() < limit {
        let current = slope.get_table_step_shifted(table.len() as u32, step_type);
        if current <= final_speed {
            break;
        }
        table.push(current as u16);
    }

    table.push(final_speed as u16);

    while table.len() < limit
        && (table.len() % steps_alignment.max(1) != 0 || table.len() < min_size)
    {
        let last = table[table.len() - 1];
        table.push(last);
    }

    let table = MotorSlopeTable::new(table);
    debug!(
        target = target_speed_w,
        step_type = %step_type,
        steps = table.len(),
        sum = table.pixeltime_sum(),
        "Slope table"
    );
    Ok(table)
}

/// Z1 and Z2 motor phase corrections for a scan starting after a feed.
///
/// `table` is the scan slope table; `acceleration_steps` of it are used when
/// accelerating. Returns `(z1, z2)`.
pub fn calculate_zmod(
    two_table: bool,
    exposure_time: u32,
    table: &[u16],
    acceleration_steps: usize,
    move_steps: u32,
    buffer_acceleration_steps: u32,
) -> Result<(u32, u32)> {
    if exposure_time == 0 || acceleration_steps == 0 || table.len() < acceleration_steps {
        return Err(GenesysError::invalid(format!(
            "can't compute zmod with exposure {exposure_time} and {acceleration_steps} of {} steps",
            table.len()
        )));
    }
    let exposure = u64::from(exposure_time);
    let sum: u64 = table[..acceleration_steps].iter().map(|&v| u64::from(v)).sum();
    let last_accel = u64::from(table[acceleration_steps - 1]);

    let z1 = (sum + u64::from(buffer_acceleration_steps) * last_accel) % exposure;
    let z2 = if two_table {
        (sum + last_accel) % exposure
    } else {
        (sum + u64::from(move_steps) * last_accel) % exposure
    };
    Ok((z1 as u32, z2 as u32))
}

fn default_vref() -> i32 {
    -1
}

/// Slope and step mode used for a range of resolutions and exposures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotorProfile {
    pub slope: MotorSlope,
    #[serde(default)]
    pub step_type: StepType,
    #[serde(default = "default_vref")]
    pub motor_vref: i32,
    #[serde(default)]
    pub resolutions: ValueFilter<u32>,
    #[serde(default)]
    pub scan_methods: ValueFilter<ScanMethod>,
    /// Highest exposure this profile is meant for; 0 means unlimited.
    #[serde(default)]
    pub max_exposure: u32,
}

impl MotorProfile {
    pub fn new(slope: MotorSlope, step_type: StepType, max_exposure: u32) -> Self {
        Self {
            slope,
            step_type,
            motor_vref: -1,
            resolutions: ValueFilter::Any,
            scan_methods: ValueFilter::Any,
            max_exposure,
        }
    }
}

impl fmt::Display for MotorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MotorProfile {{ max_exposure: {}, step_type: {}, motor_vref: {}, resolutions: {}, {} }}",
            self.max_exposure,
            self.step_type,
            self.motor_vref,
            self.resolutions,
            self.slope
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Motor {
    pub id: String,
    /// Resolution of one full motor step, in lines per inch.
    pub base_ydpi: u32,
    #[serde(default)]
    pub profiles: Vec<MotorProfile>,
    #[serde(default)]
    pub fast_profiles: Vec<MotorProfile>,
}

impl Motor {
    /// Slope of the first profile with the given step type.
    pub fn get_slope_with_step_type(&self, step_type: StepType) -> Result<&MotorSlope> {
        self.profiles
            .iter()
            .find(|p| p.step_type == step_type)
            .map(|p| &p.slope)
            .ok_or_else(|| GenesysError::invalid(format!("no slope for step type {step_type}")))
    }

    pub fn max_step_type(&self) -> StepType {
        self.profiles
            .iter()
            .map(|p| p.step_type)
            .max()
            .unwrap_or(StepType::Full)
    }
}
