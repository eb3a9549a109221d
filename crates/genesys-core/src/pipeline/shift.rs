use tracing::debug;

use super::node::{BoxedNode, ImagePipelineNode};
use crate::error::{GenesysError, Result};
use crate::image::{get_raw_pixel_from_row, set_raw_pixel_to_row, PixelFormat, RowBuffer};

/// Vertically realigns staggered pixel columns.
///
/// Pixel `x` of output row `y` is taken from source row `y + shifts[x % shifts.len()]`.
pub struct PixelShiftLines {
    source: BoxedNode,
    extra_height: usize,
    height: usize,
    pixel_shifts: Vec<usize>,
    buffer: RowBuffer,
}

impl PixelShiftLines {
    pub fn new(source: BoxedNode, shifts: Vec<usize>) -> Result<Self> {
        debug!(?shifts, "PixelShiftLines");
        source.format().ensure_known()?;
        let extra_height = shifts
            .iter()
            .copied()
            .max()
            .ok_or_else(|| GenesysError::invalid("pixel shift list is empty"))?;
        let height = source.height().saturating_sub(extra_height);
        let buffer = RowBuffer::new(source.row_bytes());
        Ok(Self {
            source,
            extra_height,
            height,
            pixel_shifts: shifts,
            buffer,
        })
    }
}

impl ImagePipelineNode for PixelShiftLines {
    fn width(&self) -> usize {
        self.source.width()
    }

    fn height(&self) -> usize {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.source.format()
    }

    fn eof(&self) -> bool {
        self.source.eof()
    }

    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        let mut got_data = true;

        if !self.buffer.empty() {
            self.buffer.pop_front()?;
        }
        while self.buffer.height() < self.extra_height + 1 {
            self.buffer.push_back();
            got_data &= self.source.get_next_row_data(self.buffer.back_mut()?)?;
        }

        let format = self.format();
        let rows = self
            .pixel_shifts
            .iter()
            .map(|&shift| self.buffer.get_row(shift))
            .collect::<Result<Vec<_>>>()?;

        for x in 0..self.width() {
            let row = rows[x % rows.len()];
            let pixel = get_raw_pixel_from_row(row, x, format);
            set_raw_pixel_to_row(out, x, pixel, format);
        }
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "PixelShiftLines"
    }
}

/// Horizontally realigns pixels within groups of `shifts.len()` pixels.
///
/// Output pixel `group_start + i` is read from source pixel `group_start + shifts[i]`.
/// The output is narrower than the source by `compute_pixel_shift_extra_width`.
pub struct PixelShiftColumns {
    source: BoxedNode,
    width: usize,
    pixel_shifts: Vec<usize>,
    temp_buffer: Vec<u8>,
}

impl PixelShiftColumns {
    pub fn new(source: BoxedNode, shifts: Vec<usize>) -> Result<Self> {
        debug!(?shifts, "PixelShiftColumns");
        source.format().ensure_known()?;
        if shifts.is_empty() {
            return Err(GenesysError::invalid("pixel shift list is empty"));
        }
        let extra_width = compute_pixel_shift_extra_width(source.width(), &shifts);
        let width = source.width().saturating_sub(extra_width);
        let temp_buffer = vec![0; source.row_bytes()];
        Ok(Self {
            source,
            width,
            pixel_shifts: shifts,
            temp_buffer,
        })
    }
}

impl ImagePipelineNode for PixelShiftColumns {
    fn width(&self) -> usize {
        self.width
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
        if self.width == 0 {
            return Err(GenesysError::invalid("attempt to read zero-width line"));
        }
        let got_data = self.source.get_next_row_data(&mut self.temp_buffer)?;

        let format = self.format();
        let shift_count = self.pixel_shifts.len();
        let width = self.width;

        for x in (0..width).step_by(shift_count) {
            for (ishift, &shift) in self.pixel_shifts.iter().enumerate() {
                if x + ishift >= width {
                    break;
                }
                let pixel = get_raw_pixel_from_row(&self.temp_buffer, x + shift, format);
                set_raw_pixel_to_row(out, x + ishift, pixel, format);
            }
        }
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "PixelShiftColumns"
    }
}

/// Number of source columns lost at the right edge when shifting pixels
/// within groups by `shifts`.
///
/// For every slot of the group this finds how far past the last complete
/// output pixel its shifted source pixel would land, and keeps the largest.
pub fn compute_pixel_shift_extra_width(source_width: usize, shifts: &[usize]) -> usize {
    if shifts.is_empty() {
        return 0;
    }
    let group_size = shifts.len() as i64;
    let non_filled_group = (source_width % shifts.len()) as i64;
    let mut extra_width: i64 = 0;

    for (i, &shift) in shifts.iter().enumerate() {
        let shift = shift as i64;
        let mut shift_groups = shift / group_size;
        let shift_rem = shift % group_size;

        if shift_rem < non_filled_group {
            shift_groups -= 1;
        }
        extra_width = extra_width.max(shift_groups * group_size + non_filled_group - i as i64);
    }
    extra_width.max(0) as usize
}
