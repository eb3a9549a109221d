/// Millimetres per inch, used to convert scan area geometry into motor and sensor units.
pub const MM_PER_INCH: f32 = 25.4;

/// Number of raw lines fetched from the device per bulk read.
pub const BULK_READ_LINES: usize = 64;

/// Marker for a `SetupParams` field that has not been filled in yet.
pub const NOT_SET: u32 = u32::MAX;

/// Pixel count (width * height) above which whole-image format conversion
/// runs rows in parallel with Rayon.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Slope table index used while scanning.
pub const SCAN_TABLE: u32 = 0;

/// Slope table index used while backtracking after a buffer-full stop.
pub const BACKTRACK_TABLE: u32 = 1;

/// Slope table index used when decelerating to a stop.
pub const STOP_TABLE: u32 = 2;

/// Slope table index used for fast feeding.
pub const FAST_TABLE: u32 = 3;

/// Slope table index used when returning to the home position.
pub const HOME_TABLE: u32 = 4;

/// Luminance weights applied when writing a colour pixel into a mono format.
pub const LUMINANCE_R: f32 = 0.3;
pub const LUMINANCE_G: f32 = 0.59;
pub const LUMINANCE_B: f32 = 0.11;

/// Resolution above which Z1/Z2 motor modulation is disabled on GL842.
pub const GL842_ZMOD_MAX_YRES: u32 = 600;

/// Dark shading reference for models whose black level is a known constant.
pub const DARK_SHADING_CONSTANT: u16 = 0x0101;

/// Percentile of the reference lines kept per sample when averaging shading data.
pub const SHADING_PERCENTILE: f32 = 0.5;
