use std::path::Path;

use ::image::{ImageBuffer as RasterBuffer, ImageFormat, Luma, Rgb};
use byteorder::{ByteOrder, LittleEndian};

use super::{Image, PixelFormat};
use crate::error::{GenesysError, Result};

fn expand_bits(data: &[u8], samples: usize) -> Vec<u8> {
    (0..samples)
        .map(|i| {
            if (data[i / 8] >> (7 - (i % 8))) & 0x1 != 0 {
                0xff
            } else {
                0
            }
        })
        .collect()
}

fn save_raster(
    path: &Path,
    data: &[u8],
    depth: u32,
    channels: u32,
    width: usize,
    height: usize,
    format: ImageFormat,
) -> Result<()> {
    let row_bytes = (width * channels as usize * depth as usize).div_ceil(8);
    if data.len() < row_bytes * height {
        return Err(GenesysError::invalid(format!(
            "image data has {} bytes, expected {}",
            data.len(),
            row_bytes * height
        )));
    }
    let (w, h) = (width as u32, height as u32);
    let samples_per_row = width * channels as usize;
    let size_error = || GenesysError::invalid("raster size does not match dimensions");

    match (depth, channels) {
        (1, _) | (8, _) => {
            let mut samples = Vec::with_capacity(samples_per_row * height);
            for row in data.chunks(row_bytes).take(height) {
                if depth == 1 {
                    samples.extend(expand_bits(row, samples_per_row));
                } else {
                    samples.extend_from_slice(&row[..samples_per_row]);
                }
            }
            if channels == 1 {
                RasterBuffer::<Luma<u8>, _>::from_raw(w, h, samples)
                    .ok_or_else(size_error)?
                    .save_with_format(path, format)?;
            } else {
                RasterBuffer::<Rgb<u8>, _>::from_raw(w, h, samples)
                    .ok_or_else(size_error)?
                    .save_with_format(path, format)?;
            }
        }
        (16, _) => {
            let mut samples = vec![0u16; samples_per_row * height];
            for (row, out) in data
                .chunks(row_bytes)
                .take(height)
                .zip(samples.chunks_mut(samples_per_row))
            {
                LittleEndian::read_u16_into(&row[..samples_per_row * 2], out);
            }
            if channels == 1 {
                RasterBuffer::<Luma<u16>, _>::from_raw(w, h, samples)
                    .ok_or_else(size_error)?
                    .save_with_format(path, format)?;
            } else {
                RasterBuffer::<Rgb<u16>, _>::from_raw(w, h, samples)
                    .ok_or_else(size_error)?
                    .save_with_format(path, format)?;
            }
        }
        _ => {
            return Err(GenesysError::invalid(format!(
                "cannot store {depth}-bit, {channels}-channel raster"
            )))
        }
    }
    Ok(())
}

/// Save raw rows as an uncompressed TIFF file.
///
/// 1-bit data is widened to 8-bit gray or RGB. 16-bit samples are read little endian.
pub fn write_tiff_file(
    path: &Path,
    data: &[u8],
    depth: u32,
    channels: u32,
    width: usize,
    height: usize,
) -> Result<()> {
    save_raster(path, data, depth, channels, width, height, ImageFormat::Tiff)
}

fn as_rgb_order(image: &Image) -> Result<std::borrow::Cow<'_, Image>> {
    let converted = match image.format() {
        PixelFormat::Bgr888 => image.convert_format(PixelFormat::Rgb888)?,
        PixelFormat::Bgr161616 => image.convert_format(PixelFormat::Rgb161616)?,
        PixelFormat::Unknown => return Err(GenesysError::UnsupportedFormat(PixelFormat::Unknown)),
        _ => return Ok(std::borrow::Cow::Borrowed(image)),
    };
    Ok(std::borrow::Cow::Owned(converted))
}

/// Save an `Image` as TIFF. BGR images are reordered to RGB first.
pub fn write_tiff_image(path: &Path, image: &Image) -> Result<()> {
    let image = as_rgb_order(image)?;
    let format = image.format();
    write_tiff_file(
        path,
        image.data(),
        format.depth(),
        format.channels(),
        image.width(),
        image.height(),
    )
}

/// Save an `Image`, choosing TIFF or PNG from the file extension (TIFF by default).
pub fn save_image(path: &Path, image: &Image) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => {
            let image = as_rgb_order(image)?;
            let format = image.format();
            save_raster(
                path,
                image.data(),
                format.depth(),
                format.channels(),
                image.width(),
                image.height(),
                ImageFormat::Png,
            )
        }
        _ => write_tiff_image(path, image),
    }
}
