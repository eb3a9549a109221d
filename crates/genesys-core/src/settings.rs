use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::consts::NOT_SET;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMethod {
    #[default]
    Flatbed,
    /// Transparency adapter
    Transparency,
    /// Transparency adapter, infrared channel
    TransparencyInfrared,
}

impl fmt::Display for ScanMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flatbed => write!(f, "Flatbed"),
            Self::Transparency => write!(f, "Transparency Adapter"),
            Self::TransparencyInfrared => write!(f, "Transparency Adapter Infrared"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanColorMode {
    #[default]
    Lineart,
    Halftone,
    Gray,
    ColorSinglePass,
}

impl fmt::Display for ScanColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lineart => write!(f, "Lineart"),
            Self::Halftone => write!(f, "Halftone"),
            Self::Gray => write!(f, "Gray"),
            Self::ColorSinglePass => write!(f, "Color"),
        }
    }
}

/// Colour channel used for mono scans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorFilter {
    Red,
    Green,
    Blue,
    #[default]
    None,
}

impl fmt::Display for ColorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "Red"),
            Self::Green => write!(f, "Green"),
            Self::Blue => write!(f, "Blue"),
            Self::None => write!(f, "None"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Bit set of per-scan options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanFlag(u32);

impl ScanFlag {
    pub const NONE: Self = Self(0);
    pub const SINGLE_LINE: Self = Self(1 << 0);
    pub const DISABLE_SHADING: Self = Self(1 << 1);
    pub const DISABLE_GAMMA: Self = Self(1 << 2);
    pub const DISABLE_BUFFER_FULL_MOVE: Self = Self(1 << 3);
    /// Skip the horizontal stagger offset for odd/even CCD pixels.
    pub const IGNORE_STAGGER_OFFSET: Self = Self(1 << 4);
    /// Skip the vertical offset between colour channels.
    pub const IGNORE_COLOR_OFFSET: Self = Self(1 << 5);
    pub const DISABLE_LAMP: Self = Self(1 << 6);
    pub const CALIBRATION: Self = Self(1 << 7);
    pub const FEEDING: Self = Self(1 << 8);
    pub const USE_XPA: Self = Self(1 << 9);
    pub const ENABLE_LEDADD: Self = Self(1 << 10);
    pub const REVERSE: Self = Self(1 << 12);
    /// Park the head automatically once the scan finishes.
    pub const AUTO_GO_HOME: Self = Self(1 << 13);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn has(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for ScanFlag {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ScanFlag {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ScanFlag {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for ScanFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ScanFlag, &str); 13] = [
            (ScanFlag::SINGLE_LINE, "SINGLE_LINE"),
            (ScanFlag::DISABLE_SHADING, "DISABLE_SHADING"),
            (ScanFlag::DISABLE_GAMMA, "DISABLE_GAMMA"),
            (ScanFlag::DISABLE_BUFFER_FULL_MOVE, "DISABLE_BUFFER_FULL_MOVE"),
            (ScanFlag::IGNORE_STAGGER_OFFSET, "IGNORE_STAGGER_OFFSET"),
            (ScanFlag::IGNORE_COLOR_OFFSET, "IGNORE_COLOR_OFFSET"),
            (ScanFlag::DISABLE_LAMP, "DISABLE_LAMP"),
            (ScanFlag::CALIBRATION, "CALIBRATION"),
            (ScanFlag::FEEDING, "FEEDING"),
            (ScanFlag::USE_XPA, "USE_XPA"),
            (ScanFlag::ENABLE_LEDADD, "ENABLE_LEDADD"),
            (ScanFlag::REVERSE, "REVERSE"),
            (ScanFlag::AUTO_GO_HOME, "AUTO_GO_HOME"),
        ];
        if self.0 == 0 {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.has(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(" | "))
    }
}

/// Scan request as seen by the frontend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scan_method: ScanMethod,
    pub scan_mode: ScanColorMode,
    /// Horizontal dpi
    pub xres: u32,
    /// Vertical dpi
    pub yres: u32,
    /// X start on the scan table, mm
    pub tl_x: f32,
    /// Y start on the scan table, mm
    pub tl_y: f32,
    /// Lines at scan resolution
    pub lines: u32,
    /// Pixels expected from the scanner
    pub pixels: u32,
    /// Pixels expected by the frontend
    pub requested_pixels: u32,
    pub depth: u32,
    pub color_filter: ColorFilter,
    /// Gray scans light all LEDs at once instead of using one colour channel.
    pub true_gray: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scan_method: ScanMethod::Flatbed,
            scan_mode: ScanColorMode::ColorSinglePass,
            xres: 300,
            yres: 300,
            tl_x: 0.0,
            tl_y: 0.0,
            lines: 100,
            pixels: 600,
            requested_pixels: 600,
            depth: 8,
            color_filter: ColorFilter::None,
            true_gray: false,
        }
    }
}

impl Settings {
    pub fn channels(&self) -> u32 {
        if self.scan_mode == ScanColorMode::ColorSinglePass {
            3
        } else {
            1
        }
    }
}

/// Requested geometry and format of one scan, in scanner units.
///
/// Fields left at `NOT_SET` make `assert_valid` fail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupParams {
    pub xres: u32,
    pub yres: u32,
    /// Start pixel counted in `xres` units.
    pub startx: u32,
    /// Start line counted in the motor base resolution.
    pub starty: u32,
    pub pixels: u32,
    /// Pixels requested by the frontend; 0 means the same as `pixels`.
    pub requested_pixels: u32,
    pub lines: u32,
    pub depth: u32,
    pub channels: u32,
    pub scan_method: Option<ScanMethod>,
    pub scan_mode: Option<ScanColorMode>,
    pub color_filter: Option<ColorFilter>,
    pub flags: ScanFlag,
}

impl Default for SetupParams {
    fn default() -> Self {
        Self {
            xres: NOT_SET,
            yres: NOT_SET,
            startx: NOT_SET,
            starty: NOT_SET,
            pixels: NOT_SET,
            requested_pixels: 0,
            lines: NOT_SET,
            depth: NOT_SET,
            channels: NOT_SET,
            scan_method: None,
            scan_mode: None,
            color_filter: None,
            flags: ScanFlag::NONE,
        }
    }
}

impl SetupParams {
    pub fn requested_pixels(&self) -> u32 {
        if self.requested_pixels != 0 {
            self.requested_pixels
        } else {
            self.pixels
        }
    }

    pub fn assert_valid(&self) -> crate::error::Result<()> {
        let numbers = [
            self.xres,
            self.yres,
            self.startx,
            self.starty,
            self.pixels,
            self.lines,
            self.depth,
            self.channels,
        ];
        if numbers.contains(&NOT_SET)
            || self.scan_method.is_none()
            || self.scan_mode.is_none()
            || self.color_filter.is_none()
        {
            return Err(crate::error::GenesysError::invalid("SetupParams are not valid"));
        }
        Ok(())
    }

    pub fn scan_method(&self) -> ScanMethod {
        self.scan_method.unwrap_or_default()
    }

    pub fn scan_mode(&self) -> ScanColorMode {
        self.scan_mode.unwrap_or_default()
    }

    pub fn color_filter(&self) -> ColorFilter {
        self.color_filter.unwrap_or_default()
    }
}

impl fmt::Display for SetupParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SetupParams {{")?;
        writeln!(f, "    xres: {} yres: {}", self.xres, self.yres)?;
        writeln!(f, "    pixels: {} requested_pixels: {}", self.pixels, self.requested_pixels())?;
        writeln!(f, "    lines: {}", self.lines)?;
        writeln!(f, "    depth: {} channels: {}", self.depth, self.channels)?;
        writeln!(f, "    startx: {} starty: {}", self.startx, self.starty)?;
        writeln!(f, "    scan_mode: {}", self.scan_mode())?;
        writeln!(f, "    color_filter: {}", self.color_filter())?;
        writeln!(f, "    flags: {}", self.flags)?;
        write!(f, "}}")
    }
}
