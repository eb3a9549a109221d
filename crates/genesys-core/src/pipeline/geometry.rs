use tracing::debug;

use super::node::{BoxedNode, ImagePipelineNode};
use crate::error::Result;
use crate::image::{
    get_raw_channel_from_row, get_raw_pixel_from_row, set_raw_channel_to_row,
    set_raw_pixel_to_row, PixelFormat, RawPixel,
};

/// Cuts a `width` x `height` window starting at (`offset_x`, `offset_y`) out of
/// the source. Parts of the window outside the source are filled with zeros.
pub struct Extract {
    source: BoxedNode,
    offset_x: usize,
    offset_y: usize,
    width: usize,
    height: usize,
    current_line: usize,
    cached_line: Vec<u8>,
}

impl Extract {
    pub fn new(
        source: BoxedNode,
        offset_x: usize,
        offset_y: usize,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        debug!(offset_x, offset_y, width, height, "Extract");
        source.format().ensure_known()?;
        let cached_line = vec![0; source.row_bytes()];
        Ok(Self {
            source,
            offset_x,
            offset_y,
            width,
            height,
            current_line: 0,
            cached_line,
        })
    }
}

impl ImagePipelineNode for Extract {
    fn width(&self) -> usize {
        self.width
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
        let row_bytes = self.row_bytes();

        while self.current_line < self.offset_y {
            got_data &= self.source.get_next_row_data(&mut self.cached_line)?;
            self.current_line += 1;
        }
        if self.current_line >= self.source.height() {
            out[..row_bytes].fill(0);
            self.current_line += 1;
            return Ok(got_data);
        }

        got_data &= self.source.get_next_row_data(&mut self.cached_line)?;

        let format = self.format();
        let x_src_width = self
            .source
            .width()
            .saturating_sub(self.offset_x)
            .min(self.width);
        let x_pad_after = self.width - x_src_width;

        if format.depth() < 8 {
            // no per-bit addressing, copy pixel by pixel
            for i in 0..x_src_width {
                let pixel = get_raw_pixel_from_row(&self.cached_line, i + self.offset_x, format);
                set_raw_pixel_to_row(out, i, pixel, format);
            }
            for i in 0..x_pad_after {
                set_raw_pixel_to_row(out, i + x_src_width, RawPixel::default(), format);
            }
        } else {
            let bpp = format.pixel_bytes();
            let copied = x_src_width * bpp;
            if x_src_width > 0 {
                let src_start = self.offset_x * bpp;
                out[..copied].copy_from_slice(&self.cached_line[src_start..src_start + copied]);
            }
            out[copied..(x_src_width + x_pad_after) * bpp].fill(0);
        }

        self.current_line += 1;
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "Extract"
    }
}

/// Resamples each row to `width` pixels with an integer accumulator.
///
/// Downscaling averages the source pixels that fall into each output pixel;
/// upscaling repeats source pixels.
pub struct ScaleRows {
    source: BoxedNode,
    width: usize,
    cached_line: Vec<u8>,
}

impl ScaleRows {
    pub fn new(source: BoxedNode, width: usize) -> Result<Self> {
        debug!(from = source.width(), to = width, "ScaleRows");
        source.format().ensure_known()?;
        let cached_line = vec![0; source.row_bytes()];
        Ok(Self {
            source,
            width,
            cached_line,
        })
    }
}

impl ImagePipelineNode for ScaleRows {
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
        let src_width = self.source.width();
        let dst_width = self.width;

        let got_data = self.source.get_next_row_data(&mut self.cached_line)?;

        let src = &self.cached_line;
        let format = self.format();
        let channels = format.channels() as usize;

        if src_width > dst_width {
            let mut counter = src_width / 2;
            let mut src_x = 0;
            for dst_x in 0..dst_width {
                let mut avg = [0u32; 3];
                let mut count = 0u32;
                while counter < src_width && src_x < src_width {
                    counter += dst_width;
                    for (c, sum) in avg.iter_mut().enumerate().take(channels) {
                        *sum += u32::from(get_raw_channel_from_row(src, src_x, c, format));
                    }
                    src_x += 1;
                    count += 1;
                }
                counter = counter.saturating_sub(src_width);

                let count = count.max(1);
                for (c, sum) in avg.iter().enumerate().take(channels) {
                    set_raw_channel_to_row(out, dst_x, c, (sum / count) as u16, format);
                }
            }
        } else {
            let mut counter = dst_width / 2;
            let mut dst_x = 0;
            for src_x in 0..src_width {
                let mut value = [0u16; 3];
                for (c, v) in value.iter_mut().enumerate().take(channels) {
                    *v = get_raw_channel_from_row(src, src_x, c, format);
                }
                while (counter < dst_width || src_x + 1 == src_width) && dst_x < dst_width {
                    counter += src_width;
                    for (c, v) in value.iter().enumerate().take(channels) {
                        set_raw_channel_to_row(out, dst_x, c, *v, format);
                    }
                    dst_x += 1;
                }
                counter = counter.saturating_sub(dst_width);
            }
        }
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "ScaleRows"
    }
}
