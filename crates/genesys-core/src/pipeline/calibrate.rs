use tracing::debug;

use super::node::{BoxedNode, ImagePipelineNode};
use crate::error::{GenesysError, Result};
use crate::image::{get_raw_channel_from_row, set_raw_channel_to_row, PixelFormat};

/// Host-side shading correction.
///
/// `bottom` and `top` hold one 16-bit reference value per sample (pixel and
/// channel, interleaved), starting at sample `x_start`. Each sample is mapped
/// linearly so that `bottom` becomes 0 and `top` becomes full scale. This is the
/// same transform the ASIC applies when shading runs in hardware.
pub struct Calibrate {
    source: BoxedNode,
    max_value: u32,
    offset: Vec<f32>,
    multiplier: Vec<f32>,
}

impl Calibrate {
    pub fn new(source: BoxedNode, bottom: &[u16], top: &[u16], x_start: usize) -> Result<Self> {
        let max_value = match source.format().depth() {
            8 => 255,
            16 => 65535,
            depth => {
                return Err(GenesysError::invalid(format!(
                    "unsupported depth for calibration {depth}"
                )))
            }
        };

        let size = if bottom.len() >= x_start && top.len() >= x_start {
            (bottom.len() - x_start).min(top.len() - x_start)
        } else {
            0
        };
        debug!(size, x_start, "Calibrate");

        let mut offset = Vec::with_capacity(size);
        let mut multiplier = Vec::with_capacity(size);
        for i in x_start..x_start + size {
            let low = f32::from(bottom[i]);
            let range = f32::from(top[i]) - low;
            offset.push(low / 65535.0);
            // A flat reference column would divide by zero; leave such columns unscaled.
            multiplier.push(if range > 0.0 { 65535.0 / range } else { 1.0 });
        }

        Ok(Self {
            source,
            max_value,
            offset,
            multiplier,
        })
    }
}

impl ImagePipelineNode for Calibrate {
    fn width(&self) -> usize {
        self.source.width()
    }

    fn height(&self) -> usize {
        self.source.height()
    }

    fn format(&self) -> PixelFormat {
        self.source.format()
    }

    fn eof(&self) -> bool {
        self.source.eof()
    }

    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        let ret = self.source.get_next_row_data(out)?;

        let format = self.format();
        let channels = format.channels() as usize;
        let max_value = self.max_value as f32;
        let mut calib = self.offset.iter().zip(&self.multiplier);

        'pixels: for x in 0..self.width() {
            for ch in 0..channels {
                let Some((&offset, &multiplier)) = calib.next() else {
                    break 'pixels;
                };
                let value = f32::from(get_raw_channel_from_row(out, x, ch, format)) / max_value;
                let value = ((value - offset) * multiplier * max_value).round();
                let value = value.clamp(0.0, max_value) as u16;
                set_raw_channel_to_row(out, x, ch, value, format);
            }
        }
        Ok(ret)
    }

    fn name(&self) -> &'static str {
        "Calibrate"
    }
}
