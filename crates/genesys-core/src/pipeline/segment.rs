use tracing::debug;

use super::node::{BoxedNode, ImagePipelineNode};
use crate::error::{GenesysError, Result};
use crate::image::{get_raw_pixel_from_row, set_raw_pixel_to_row, PixelFormat, RowBuffer};

/// Reassembles lines from sensors that read out several segments in parallel.
///
/// Each output row is built from `interleaved_lines` consecutive source rows
/// treated as one contiguous input line. Output pixels are produced in groups
/// of `pixels_per_chunk` per segment, with segment `i` read from input offset
/// `segment_order[i] * segment_pixels`.
pub struct Desegment {
    source: BoxedNode,
    output_width: usize,
    segment_order: Vec<usize>,
    segment_pixels: usize,
    interleaved_lines: usize,
    pixels_per_chunk: usize,
    buffer: RowBuffer,
}

impl Desegment {
    pub fn new(
        source: BoxedNode,
        output_width: usize,
        segment_order: Vec<usize>,
        segment_pixels: usize,
        interleaved_lines: usize,
        pixels_per_chunk: usize,
    ) -> Result<Self> {
        debug!(
            segment_count = segment_order.len(),
            segment_pixels,
            interleaved_lines,
            pixels_per_chunk,
            "Desegment"
        );
        source.format().ensure_known()?;
        if interleaved_lines == 0 || pixels_per_chunk == 0 || segment_order.is_empty() {
            return Err(GenesysError::invalid(
                "desegmenting needs at least one line, one segment and one pixel per chunk",
            ));
        }
        if source.height() % interleaved_lines > 0 {
            return Err(GenesysError::invalid(format!(
                "height is not a multiple of the number of lines to interleave {}/{}",
                source.height(),
                interleaved_lines
            )));
        }
        let buffer = RowBuffer::new(source.row_bytes());
        Ok(Self {
            source,
            output_width,
            segment_order,
            segment_pixels,
            interleaved_lines,
            pixels_per_chunk,
            buffer,
        })
    }

    /// Same as `new` with segments laid out in their natural order.
    pub fn with_segment_count(
        source: BoxedNode,
        output_width: usize,
        segment_count: usize,
        segment_pixels: usize,
        interleaved_lines: usize,
        pixels_per_chunk: usize,
    ) -> Result<Self> {
        Self::new(
            source,
            output_width,
            (0..segment_count).collect(),
            segment_pixels,
            interleaved_lines,
            pixels_per_chunk,
        )
    }
}

impl ImagePipelineNode for Desegment {
    fn width(&self) -> usize {
        self.output_width
    }

    fn height(&self) -> usize {
        self.source.height() / self.interleaved_lines
    }

    fn format(&self) -> PixelFormat {
        self.source.format()
    }

    fn eof(&self) -> bool {
        self.source.eof()
    }

    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        let mut got_data = true;

        self.buffer.clear();
        for i in 0..self.interleaved_lines {
            self.buffer.push_back();
            got_data &= self.source.get_next_row_data(self.buffer.get_row_mut(i)?)?;
        }

        let format = self.format();
        let segment_count = self.segment_order.len();
        let in_data = self.buffer.linear_data()?;
        let groups_count = self.output_width / (segment_count * self.pixels_per_chunk);

        for igroup in 0..groups_count {
            for (isegment, &segment) in self.segment_order.iter().enumerate() {
                let input_offset = igroup * self.pixels_per_chunk + self.segment_pixels * segment;
                let output_offset = (igroup * segment_count + isegment) * self.pixels_per_chunk;

                for ipixel in 0..self.pixels_per_chunk {
                    let pixel = get_raw_pixel_from_row(in_data, input_offset + ipixel, format);
                    set_raw_pixel_to_row(out, output_offset + ipixel, pixel, format);
                }
            }
        }
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "Desegment"
    }
}

/// Joins `interleaved_lines` consecutive source rows into one wider row,
/// taking `pixels_per_chunk` pixels from each row in turn.
pub struct DeinterleaveLines(Desegment);

impl DeinterleaveLines {
    pub fn new(source: BoxedNode, interleaved_lines: usize, pixels_per_chunk: usize) -> Result<Self> {
        let width = source.width();
        Desegment::with_segment_count(
            source,
            width * interleaved_lines,
            interleaved_lines,
            width,
            interleaved_lines,
            pixels_per_chunk,
        )
        .map(Self)
    }
}

impl ImagePipelineNode for DeinterleaveLines {
    fn width(&self) -> usize {
        self.0.width()
    }

    fn height(&self) -> usize {
        self.0.height()
    }

    fn format(&self) -> PixelFormat {
        self.0.format()
    }

    fn eof(&self) -> bool {
        self.0.eof()
    }

    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        self.0.get_next_row_data(out)
    }

    fn name(&self) -> &'static str {
        "DeinterleaveLines"
    }
}
