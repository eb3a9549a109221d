use tracing::debug;

use super::node::{BoxedNode, ImagePipelineNode};
use crate::error::{GenesysError, Result};
use crate::image::{convert_pixel_row_format, PixelFormat};

/// Converts rows into another pixel format. Rows pass straight through when
/// the formats already match.
pub struct FormatConvert {
    source: BoxedNode,
    dst_format: PixelFormat,
    buffer: Vec<u8>,
}

impl FormatConvert {
    pub fn new(source: BoxedNode, dst_format: PixelFormat) -> Result<Self> {
        source.format().ensure_known()?;
        dst_format.ensure_known()?;
        debug!(from = %source.format(), to = %dst_format, "FormatConvert");
        let buffer = vec![0; source.row_bytes()];
        Ok(Self {
            source,
            dst_format,
            buffer,
        })
    }
}

impl ImagePipelineNode for FormatConvert {
    fn width(&self) -> usize {
        self.source.width()
    }

    fn height(&self) -> usize {
        self.source.height()
    }

    fn format(&self) -> PixelFormat {
        self.dst_format
    }

    fn eof(&self) -> bool {
        self.source.eof()
    }

    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        let src_format = self.source.format();
        if src_format == self.dst_format {
            return self.source.get_next_row_data(out);
        }

        let got_data = self.source.get_next_row_data(&mut self.buffer)?;
        convert_pixel_row_format(&self.buffer, src_format, out, self.dst_format, self.width())?;
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "FormatConvert"
    }
}

/// Swaps the bytes of every 16-bit sample. Does nothing for other depths.
pub struct Swap16BitEndian {
    source: BoxedNode,
    needs_swapping: bool,
}

impl Swap16BitEndian {
    pub fn new(source: BoxedNode) -> Self {
        let needs_swapping = source.format().depth() == 16;
        if !needs_swapping {
            debug!(format = %source.format(), "Swap16BitEndian does nothing for non 16-bit formats");
        }
        Self {
            source,
            needs_swapping,
        }
    }
}

impl ImagePipelineNode for Swap16BitEndian {
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
        let got_data = self.source.get_next_row_data(out)?;
        if self.needs_swapping {
            let row_bytes = self.row_bytes();
            for pair in out[..row_bytes].chunks_exact_mut(2) {
                pair.swap(0, 1);
            }
        }
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "Swap16BitEndian"
    }
}

/// Complements every sample.
pub struct Invert {
    source: BoxedNode,
}

impl Invert {
    pub fn new(source: BoxedNode) -> Result<Self> {
        match source.format().depth() {
            1 | 8 | 16 => Ok(Self { source }),
            _ => Err(GenesysError::UnsupportedFormat(source.format())),
        }
    }
}

impl ImagePipelineNode for Invert {
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
        let got_data = self.source.get_next_row_data(out)?;
        let format = self.source.format();
        let num_values = self.width() * format.channels() as usize;

        // 0xff - v and 0xffff - v are the bitwise complement, so every depth
        // reduces to flipping the bytes that hold samples.
        let num_bytes = match format.depth() {
            16 => num_values * 2,
            8 => num_values,
            1 => num_values.div_ceil(8),
            _ => return Err(GenesysError::UnsupportedFormat(format)),
        };
        for byte in &mut out[..num_bytes] {
            *byte = !*byte;
        }
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "Invert"
    }
}
