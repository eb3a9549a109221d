use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R};
use crate::error::{GenesysError, Result};

/// Memory order of the colour channels of an interleaved pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorOrder {
    #[default]
    Rgb,
    Gbr,
    Bgr,
}

/// In-memory pixel layouts produced by the scanner and the image pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    #[default]
    Unknown,
    I1,
    Rgb111,
    I8,
    Rgb888,
    Bgr888,
    I16,
    Rgb161616,
    Bgr161616,
}

struct PixelFormatDesc {
    format: PixelFormat,
    depth: u32,
    channels: u32,
    order: ColorOrder,
}

const KNOWN_PIXEL_FORMATS: [PixelFormatDesc; 8] = [
    PixelFormatDesc { format: PixelFormat::I1, depth: 1, channels: 1, order: ColorOrder::Rgb },
    PixelFormatDesc { format: PixelFormat::I8, depth: 8, channels: 1, order: ColorOrder::Rgb },
    PixelFormatDesc { format: PixelFormat::I16, depth: 16, channels: 1, order: ColorOrder::Rgb },
    PixelFormatDesc { format: PixelFormat::Rgb111, depth: 1, channels: 3, order: ColorOrder::Rgb },
    PixelFormatDesc { format: PixelFormat::Rgb888, depth: 8, channels: 3, order: ColorOrder::Rgb },
    PixelFormatDesc {
        format: PixelFormat::Rgb161616,
        depth: 16,
        channels: 3,
        order: ColorOrder::Rgb,
    },
    PixelFormatDesc { format: PixelFormat::Bgr888, depth: 8, channels: 3, order: ColorOrder::Bgr },
    PixelFormatDesc {
        format: PixelFormat::Bgr161616,
        depth: 16,
        channels: 3,
        order: ColorOrder::Bgr,
    },
];

impl PixelFormat {
    fn desc(self) -> Option<&'static PixelFormatDesc> {
        KNOWN_PIXEL_FORMATS.iter().find(|d| d.format == self)
    }

    /// Bits per channel: 1, 8 or 16. `Unknown` reports 0.
    pub fn depth(self) -> u32 {
        self.desc().map_or(0, |d| d.depth)
    }

    /// Channels per pixel: 1 or 3. `Unknown` reports 0.
    pub fn channels(self) -> u32 {
        self.desc().map_or(0, |d| d.channels)
    }

    pub fn color_order(self) -> Option<ColorOrder> {
        self.desc().map(|d| d.order)
    }

    pub fn is_known(self) -> bool {
        self.desc().is_some()
    }

    /// Bytes needed for `width` pixels, rounding partial bytes up.
    pub fn row_bytes(self, width: usize) -> usize {
        let bits = (self.depth() * self.channels()) as usize * width;
        bits.div_ceil(8)
    }

    /// Whole pixels that fit in `row_bytes` bytes.
    pub fn pixels_from_row_bytes(self, row_bytes: usize) -> usize {
        let bits = (self.depth() * self.channels()) as usize;
        if bits == 0 {
            return 0;
        }
        row_bytes * 8 / bits
    }

    /// Bytes used by one pixel when the depth is byte-aligned (8 or 16 bits).
    pub fn pixel_bytes(self) -> usize {
        (self.depth() / 8 * self.channels()) as usize
    }

    /// Look up the format for a depth, channel count and colour order.
    pub fn create(depth: u32, channels: u32, order: ColorOrder) -> Result<Self> {
        // Mono formats are listed with Rgb order only.
        let order = if channels == 1 { ColorOrder::Rgb } else { order };
        KNOWN_PIXEL_FORMATS
            .iter()
            .find(|d| d.depth == depth && d.channels == channels && d.order == order)
            .map(|d| d.format)
            .ok_or_else(|| {
                GenesysError::invalid(format!(
                    "no pixel format with depth {depth}, {channels} channels, order {order:?}"
                ))
            })
    }

    pub(crate) fn ensure_known(self) -> Result<()> {
        if self.is_known() {
            Ok(())
        } else {
            Err(GenesysError::UnsupportedFormat(self))
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::I1 => "I1",
            Self::Rgb111 => "RGB111",
            Self::I8 => "I8",
            Self::Rgb888 => "RGB888",
            Self::Bgr888 => "BGR888",
            Self::I16 => "I16",
            Self::Rgb161616 => "RGB161616",
            Self::Bgr161616 => "BGR161616",
        };
        f.write_str(name)
    }
}

pub fn get_pixel_format_depth(format: PixelFormat) -> u32 {
    format.depth()
}

pub fn get_pixel_channels(format: PixelFormat) -> u32 {
    format.channels()
}

pub fn get_pixel_row_bytes(format: PixelFormat, width: usize) -> usize {
    format.row_bytes(width)
}

pub fn get_pixels_from_row_bytes(format: PixelFormat, row_bytes: usize) -> usize {
    format.pixels_from_row_bytes(row_bytes)
}

pub fn create_pixel_format(depth: u32, channels: u32, order: ColorOrder) -> Result<PixelFormat> {
    PixelFormat::create(depth, channels, order)
}

/// Logical pixel with every channel scaled to the full 16-bit range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl Pixel {
    pub fn new(r: u16, g: u16, b: u16) -> Self {
        Self { r, g, b }
    }

    pub fn gray(v: u16) -> Self {
        Self { r: v, g: v, b: v }
    }
}

/// Pixel bytes exactly as stored in a row of a given format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawPixel {
    pub data: [u8; 6],
}

impl RawPixel {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut data = [0u8; 6];
        let n = bytes.len().min(6);
        data[..n].copy_from_slice(&bytes[..n]);
        Self { data }
    }
}

#[inline]
fn read_bit(data: &[u8], x: usize) -> u16 {
    u16::from((data[x / 8] >> (7 - (x % 8))) & 0x1)
}

#[inline]
fn write_bit(data: &mut [u8], x: usize, value: u16) {
    let mask = 0x1u8 << (7 - (x % 8));
    let bit = ((value & 0x1) as u8) << (7 - (x % 8));
    data[x / 8] = (data[x / 8] & !mask) | bit;
}

#[inline]
fn expand8(v: u8) -> u16 {
    u16::from(v) | (u16::from(v) << 8)
}

#[inline]
fn expand1(bit: u16) -> u16 {
    if bit != 0 {
        0xffff
    } else {
        0
    }
}

#[inline]
fn compress1(v: u16) -> u16 {
    u16::from(v & 0x8000 != 0)
}

/// Per-pixel access on `PixelFormat::Unknown` is a caller bug: nodes and
/// `convert_pixel_row_format` reject unknown formats up front. Debug builds
/// stop here; release builds log it and the access reads zero or writes nothing.
#[track_caller]
fn unknown_format(format: PixelFormat) {
    if cfg!(debug_assertions) {
        panic!("unsupported pixel format {format} in per-pixel access");
    }
    error!(%format, "Per-pixel access with an unsupported pixel format");
}

/// Read pixel `x` of a row and normalise it to 16 bits per channel.
///
/// # Panics
///
/// In debug builds, panics if `format` is `PixelFormat::Unknown`. Pipeline
/// nodes reject unknown formats when they are constructed.
pub fn get_pixel_from_row(data: &[u8], x: usize, format: PixelFormat) -> Pixel {
    match format {
        PixelFormat::I1 => Pixel::gray(expand1(read_bit(data, x))),
        PixelFormat::Rgb111 => {
            let x = x * 3;
            Pixel::new(
                expand1(read_bit(data, x)),
                expand1(read_bit(data, x + 1)),
                expand1(read_bit(data, x + 2)),
            )
        }
        PixelFormat::I8 => Pixel::gray(expand8(data[x])),
        PixelFormat::I16 => Pixel::gray(LittleEndian::read_u16(&data[x * 2..])),
        PixelFormat::Rgb888 => {
            let x = x * 3;
            Pixel::new(expand8(data[x]), expand8(data[x + 1]), expand8(data[x + 2]))
        }
        PixelFormat::Bgr888 => {
            let x = x * 3;
            Pixel::new(expand8(data[x + 2]), expand8(data[x + 1]), expand8(data[x]))
        }
        PixelFormat::Rgb161616 => {
            let x = x * 6;
            Pixel::new(
                LittleEndian::read_u16(&data[x..]),
                LittleEndian::read_u16(&data[x + 2..]),
                LittleEndian::read_u16(&data[x + 4..]),
            )
        }
        PixelFormat::Bgr161616 => {
            let x = x * 6;
            Pixel::new(
                LittleEndian::read_u16(&data[x + 4..]),
                LittleEndian::read_u16(&data[x + 2..]),
                LittleEndian::read_u16(&data[x..]),
            )
        }
        PixelFormat::Unknown => {
            unknown_format(format);
            Pixel::default()
        }
    }
}

/// Store `pixel` at position `x`, converting to the row format. Colour pixels
/// written to mono formats are reduced with luminance weights.
///
/// # Panics
///
/// In debug builds, panics if `format` is `PixelFormat::Unknown`.
pub fn set_pixel_to_row(data: &mut [u8], x: usize, pixel: Pixel, format: PixelFormat) {
    match format {
        PixelFormat::I1 => write_bit(data, x, compress1(pixel.r)),
        PixelFormat::Rgb111 => {
            let x = x * 3;
            write_bit(data, x, compress1(pixel.r));
            write_bit(data, x + 1, compress1(pixel.g));
            write_bit(data, x + 2, compress1(pixel.b));
        }
        PixelFormat::I8 => {
            let val = f32::from(pixel.r >> 8) * LUMINANCE_R
                + f32::from(pixel.g >> 8) * LUMINANCE_G
                + f32::from(pixel.b >> 8) * LUMINANCE_B;
            data[x] = val as u8;
        }
        PixelFormat::I16 => {
            let val = f32::from(pixel.r) * LUMINANCE_R
                + f32::from(pixel.g) * LUMINANCE_G
                + f32::from(pixel.b) * LUMINANCE_B;
            LittleEndian::write_u16(&mut data[x * 2..], val as u16);
        }
        PixelFormat::Rgb888 => {
            let x = x * 3;
            data[x] = (pixel.r >> 8) as u8;
            data[x + 1] = (pixel.g >> 8) as u8;
            data[x + 2] = (pixel.b >> 8) as u8;
        }
        PixelFormat::Bgr888 => {
            let x = x * 3;
            data[x] = (pixel.b >> 8) as u8;
            data[x + 1] = (pixel.g >> 8) as u8;
            data[x + 2] = (pixel.r >> 8) as u8;
        }
        PixelFormat::Rgb161616 => {
            let x = x * 6;
            LittleEndian::write_u16(&mut data[x..], pixel.r);
            LittleEndian::write_u16(&mut data[x + 2..], pixel.g);
            LittleEndian::write_u16(&mut data[x + 4..], pixel.b);
        }
        PixelFormat::Bgr161616 => {
            let x = x * 6;
            LittleEndian::write_u16(&mut data[x..], pixel.b);
            LittleEndian::write_u16(&mut data[x + 2..], pixel.g);
            LittleEndian::write_u16(&mut data[x + 4..], pixel.r);
        }
        PixelFormat::Unknown => unknown_format(format),
    }
}

/// # Panics
///
/// In debug builds, panics if `format` is `PixelFormat::Unknown`.
pub fn get_raw_pixel_from_row(data: &[u8], x: usize, format: PixelFormat) -> RawPixel {
    match format {
        PixelFormat::I1 => RawPixel::from_bytes(&[read_bit(data, x) as u8]),
        PixelFormat::Rgb111 => {
            let x = x * 3;
            let v = (read_bit(data, x) << 2) | (read_bit(data, x + 1) << 1) | read_bit(data, x + 2);
            RawPixel::from_bytes(&[v as u8])
        }
        PixelFormat::I8 => RawPixel::from_bytes(&data[x..x + 1]),
        PixelFormat::I16 => RawPixel::from_bytes(&data[x * 2..x * 2 + 2]),
        PixelFormat::Rgb888 | PixelFormat::Bgr888 => RawPixel::from_bytes(&data[x * 3..x * 3 + 3]),
        PixelFormat::Rgb161616 | PixelFormat::Bgr161616 => {
            RawPixel::from_bytes(&data[x * 6..x * 6 + 6])
        }
        PixelFormat::Unknown => {
            unknown_format(format);
            RawPixel::default()
        }
    }
}

/// # Panics
///
/// In debug builds, panics if `format` is `PixelFormat::Unknown`.
pub fn set_raw_pixel_to_row(data: &mut [u8], x: usize, pixel: RawPixel, format: PixelFormat) {
    match format {
        PixelFormat::I1 => write_bit(data, x, u16::from(pixel.data[0] & 0x1)),
        PixelFormat::Rgb111 => {
            let x = x * 3;
            let v = u16::from(pixel.data[0]);
            write_bit(data, x, (v >> 2) & 0x1);
            write_bit(data, x + 1, (v >> 1) & 0x1);
            write_bit(data, x + 2, v & 0x1);
        }
        PixelFormat::I8 => data[x] = pixel.data[0],
        PixelFormat::I16 => data[x * 2..x * 2 + 2].copy_from_slice(&pixel.data[..2]),
        PixelFormat::Rgb888 | PixelFormat::Bgr888 => {
            data[x * 3..x * 3 + 3].copy_from_slice(&pixel.data[..3])
        }
        PixelFormat::Rgb161616 | PixelFormat::Bgr161616 => {
            data[x * 6..x * 6 + 6].copy_from_slice(&pixel.data)
        }
        PixelFormat::Unknown => unknown_format(format),
    }
}

/// Read the `channel`-th stored sample of pixel `x`. For 1-bit formats the
/// sample is addressed MSB first at bit `x * channels + channel`.
///
/// # Panics
///
/// In debug builds, panics if `format` is `PixelFormat::Unknown`.
pub fn get_raw_channel_from_row(data: &[u8], x: usize, channel: usize, format: PixelFormat) -> u16 {
    match format {
        PixelFormat::I1 => read_bit(data, x),
        PixelFormat::Rgb111 => read_bit(data, x * 3 + channel),
        PixelFormat::I8 => u16::from(data[x]),
        PixelFormat::I16 => LittleEndian::read_u16(&data[x * 2..]),
        PixelFormat::Rgb888 | PixelFormat::Bgr888 => u16::from(data[x * 3 + channel]),
        PixelFormat::Rgb161616 | PixelFormat::Bgr161616 => {
            LittleEndian::read_u16(&data[x * 6 + channel * 2..])
        }
        PixelFormat::Unknown => {
            unknown_format(format);
            0
        }
    }
}

/// # Panics
///
/// In debug builds, panics if `format` is `PixelFormat::Unknown`.
pub fn set_raw_channel_to_row(
    data: &mut [u8],
    x: usize,
    channel: usize,
    value: u16,
    format: PixelFormat,
) {
    match format {
        PixelFormat::I1 => write_bit(data, x, value),
        PixelFormat::Rgb111 => write_bit(data, x * 3 + channel, value),
        PixelFormat::I8 => data[x] = value as u8,
        PixelFormat::I16 => LittleEndian::write_u16(&mut data[x * 2..], value),
        PixelFormat::Rgb888 | PixelFormat::Bgr888 => data[x * 3 + channel] = value as u8,
        PixelFormat::Rgb161616 | PixelFormat::Bgr161616 => {
            LittleEndian::write_u16(&mut data[x * 6 + channel * 2..], value)
        }
        PixelFormat::Unknown => unknown_format(format),
    }
}

/// Convert `count` pixels from `src` in `src_format` into `dst` in `dst_format`.
///
/// Identical formats are a plain byte copy.
pub fn convert_pixel_row_format(
    src: &[u8],
    src_format: PixelFormat,
    dst: &mut [u8],
    dst_format: PixelFormat,
    count: usize,
) -> Result<()> {
    src_format.ensure_known()?;
    dst_format.ensure_known()?;

    let src_bytes = src_format.row_bytes(count);
    let dst_bytes = dst_format.row_bytes(count);
    if src.len() < src_bytes || dst.len() < dst_bytes {
        return Err(GenesysError::invalid(format!(
            "row too short for {count} pixels: source {} of {src_bytes}, destination {} of {dst_bytes}",
            src.len(),
            dst.len()
        )));
    }

    if src_format == dst_format {
        dst[..dst_bytes].copy_from_slice(&src[..src_bytes]);
        return Ok(());
    }

    for x in 0..count {
        let pixel = get_pixel_from_row(src, x, src_format);
        set_pixel_to_row(dst, x, pixel, dst_format);
    }
    Ok(())
}
