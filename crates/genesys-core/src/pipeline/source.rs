use tracing::warn;

use super::node::ImagePipelineNode;
use crate::error::{GenesysError, Result};
use crate::image::buffer::ProducerCallback;
use crate::image::{Image, ImageBuffer, PixelFormat};

/// Source that asks a producer for exactly one row per call.
pub struct CallableSource {
    producer: ProducerCallback,
    width: usize,
    height: usize,
    format: PixelFormat,
    eof: bool,
}

impl CallableSource {
    pub fn new(width: usize, height: usize, format: PixelFormat, producer: ProducerCallback) -> Self {
        Self {
            producer,
            width,
            height,
            format,
            eof: false,
        }
    }
}

impl ImagePipelineNode for CallableSource {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        let row_bytes = self.row_bytes();
        let got_data = (self.producer)(&mut out[..row_bytes])?;
        if !got_data {
            self.eof = true;
        }
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "CallableSource"
    }
}

/// Source that reads from a producer in batches of `input_batch_size` bytes and
/// hands out rows from the batch.
pub struct BufferedCallableSource {
    width: usize,
    height: usize,
    format: PixelFormat,
    eof: bool,
    curr_row: usize,
    buffer: ImageBuffer,
}

impl BufferedCallableSource {
    pub fn new(
        width: usize,
        height: usize,
        format: PixelFormat,
        input_batch_size: usize,
        producer: ProducerCallback,
    ) -> Self {
        let mut buffer = ImageBuffer::new(input_batch_size, producer);
        buffer.set_remaining_size(Some((height * format.row_bytes(width)) as u64));
        Self {
            width,
            height,
            format,
            eof: false,
            curr_row: 0,
            buffer,
        }
    }

    pub fn remaining_bytes(&self) -> Option<u64> {
        self.buffer.remaining_size()
    }

    pub fn set_remaining_bytes(&mut self, bytes: Option<u64>) {
        self.buffer.set_remaining_size(bytes);
    }

    pub fn set_last_read_multiple(&mut self, bytes: Option<u64>) {
        self.buffer.set_last_read_multiple(bytes);
    }
}

impl ImagePipelineNode for BufferedCallableSource {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        if self.curr_row >= self.height {
            warn!(row = self.curr_row, height = self.height, "Reading past the end of buffered source");
            self.eof = true;
            return Ok(false);
        }

        let row_bytes = self.row_bytes();
        let got_data = self.buffer.get_data(&mut out[..row_bytes])?;
        self.curr_row += 1;
        if !got_data {
            self.eof = true;
        }
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "BufferedCallableSource"
    }
}

/// Source over an owned byte array of `height` rows.
pub struct ArraySource {
    width: usize,
    height: usize,
    format: PixelFormat,
    eof: bool,
    data: Vec<u8>,
    next_row: usize,
}

impl ArraySource {
    pub fn new(width: usize, height: usize, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let size = format.row_bytes(width) * height;
        if data.len() < size {
            return Err(GenesysError::invalid(format!(
                "the given array is too small ({} bytes), need at least {size}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            eof: false,
            data,
            next_row: 0,
        })
    }
}

impl ImagePipelineNode for ArraySource {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn eof(&self) -> bool {
        self.eof
    }

    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        if self.next_row >= self.height {
            self.eof = true;
            return Ok(false);
        }
        let row_bytes = self.row_bytes();
        let start = row_bytes * self.next_row;
        out[..row_bytes].copy_from_slice(&self.data[start..start + row_bytes]);
        self.next_row += 1;
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "ArraySource"
    }
}

/// Source over the rows of an `Image`.
pub struct ImageSource {
    source: Image,
    next_row: usize,
}

impl ImageSource {
    pub fn new(source: Image) -> Self {
        Self {
            source,
            next_row: 0,
        }
    }
}

impl ImagePipelineNode for ImageSource {
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
        self.next_row >= self.height()
    }

    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        if self.next_row >= self.height() {
            return Ok(false);
        }
        let row_bytes = self.row_bytes();
        out[..row_bytes].copy_from_slice(self.source.get_row(self.next_row));
        self.next_row += 1;
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "ImageSource"
    }
}
