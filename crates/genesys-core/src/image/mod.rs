pub mod buffer;
pub mod pixel;
pub mod row_buffer;
pub mod tiff;

use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{GenesysError, Result};

pub use buffer::ImageBuffer;
pub use pixel::{
    convert_pixel_row_format, get_pixel_from_row, get_raw_channel_from_row,
    get_raw_pixel_from_row, set_pixel_to_row, set_raw_channel_to_row, set_raw_pixel_to_row,
    ColorOrder, Pixel, PixelFormat, RawPixel,
};
pub use row_buffer::RowBuffer;
pub use tiff::write_tiff_file;

/// A complete image held in memory as tightly packed rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    format: PixelFormat,
    row_bytes: usize,
    data: Vec<u8>,
}

impl Image {
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Self {
        let row_bytes = format.row_bytes(width);
        Self {
            width,
            height,
            format,
            row_bytes,
            data: vec![0; row_bytes * height],
        }
    }

    /// Wrap existing row data. Fails when `data` does not match the geometry.
    pub fn from_data(width: usize, height: usize, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let row_bytes = format.row_bytes(width);
        if data.len() != row_bytes * height {
            return Err(GenesysError::invalid(format!(
                "image data has {} bytes, expected {}",
                data.len(),
                row_bytes * height
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            row_bytes,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn get_row(&self, y: usize) -> &[u8] {
        &self.data[y * self.row_bytes..(y + 1) * self.row_bytes]
    }

    pub fn get_row_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.data[y * self.row_bytes..(y + 1) * self.row_bytes]
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Pixel {
        get_pixel_from_row(self.get_row(y), x, self.format)
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: Pixel) {
        let format = self.format;
        set_pixel_to_row(self.get_row_mut(y), x, pixel, format);
    }

    pub fn get_raw_pixel(&self, x: usize, y: usize) -> RawPixel {
        get_raw_pixel_from_row(self.get_row(y), x, self.format)
    }

    pub fn set_raw_pixel(&mut self, x: usize, y: usize, pixel: RawPixel) {
        let format = self.format;
        set_raw_pixel_to_row(self.get_row_mut(y), x, pixel, format);
    }

    pub fn get_raw_channel(&self, x: usize, y: usize, channel: usize) -> u16 {
        get_raw_channel_from_row(self.get_row(y), x, channel, self.format)
    }

    pub fn set_raw_channel(&mut self, x: usize, y: usize, channel: usize, value: u16) {
        let format = self.format;
        set_raw_channel_to_row(self.get_row_mut(y), x, channel, value, format);
    }

    /// Change geometry and format. Existing bytes are kept where they fit, new bytes are zero.
    pub fn resize(&mut self, width: usize, height: usize, format: PixelFormat) {
        self.width = width;
        self.height = height;
        self.format = format;
        self.row_bytes = format.row_bytes(width);
        self.data.resize(self.row_bytes * height, 0);
    }

    /// Convert every row into `format`, returning a new image.
    ///
    /// Large images are converted in parallel, one row per task.
    pub fn convert_format(&self, format: PixelFormat) -> Result<Image> {
        self.format.ensure_known()?;
        format.ensure_known()?;

        let mut out = Image::new(self.width, self.height, format);
        if self.height == 0 || self.row_bytes == 0 {
            return Ok(out);
        }

        let width = self.width;
        let src_format = self.format;
        let src_rows = self.data.chunks(self.row_bytes);
        let dst_row_bytes = out.row_bytes;

        if width * self.height >= PARALLEL_PIXEL_THRESHOLD {
            self.data
                .par_chunks(self.row_bytes)
                .zip(out.data.par_chunks_mut(dst_row_bytes))
                .try_for_each(|(src, dst)| {
                    convert_pixel_row_format(src, src_format, dst, format, width)
                })?;
        } else {
            for (src, dst) in src_rows.zip(out.data.chunks_mut(dst_row_bytes)) {
                convert_pixel_row_format(src, src_format, dst, format, width)?;
            }
        }
        Ok(out)
    }
}
