use tracing::debug;

use super::node::{BoxedNode, ImagePipelineNode};
use crate::error::{GenesysError, Result};
use crate::image::{
    get_raw_channel_from_row, set_raw_channel_to_row, ColorOrder, PixelFormat, RowBuffer,
};

/// Merges three consecutive mono rows (red, green, blue) into one colour row.
pub struct MergeMonoLines {
    source: BoxedNode,
    output_format: PixelFormat,
    buffer: RowBuffer,
}

impl MergeMonoLines {
    pub fn new(source: BoxedNode, color_order: ColorOrder) -> Result<Self> {
        debug!(?color_order, "MergeMonoLines");
        let output_format = Self::output_format(source.format(), color_order)?;
        let buffer = RowBuffer::new(source.row_bytes());
        Ok(Self {
            source,
            output_format,
            buffer,
        })
    }

    fn output_format(input: PixelFormat, order: ColorOrder) -> Result<PixelFormat> {
        match (input, order) {
            (PixelFormat::I1, ColorOrder::Rgb) => Ok(PixelFormat::Rgb111),
            (PixelFormat::I8, ColorOrder::Rgb) => Ok(PixelFormat::Rgb888),
            (PixelFormat::I8, ColorOrder::Bgr) => Ok(PixelFormat::Bgr888),
            (PixelFormat::I16, ColorOrder::Rgb) => Ok(PixelFormat::Rgb161616),
            (PixelFormat::I16, ColorOrder::Bgr) => Ok(PixelFormat::Bgr161616),
            _ => Err(GenesysError::invalid(format!(
                "unsupported format combination {input} {order:?}"
            ))),
        }
    }
}

impl ImagePipelineNode for MergeMonoLines {
    fn width(&self) -> usize {
        self.source.width()
    }

    fn height(&self) -> usize {
        self.source.height() / 3
    }

    fn format(&self) -> PixelFormat {
        self.output_format
    }

    fn eof(&self) -> bool {
        self.source.eof()
    }

    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        let mut got_data = true;

        self.buffer.clear();
        for i in 0..3 {
            self.buffer.push_back();
            got_data &= self.source.get_next_row_data(self.buffer.get_row_mut(i)?)?;
        }

        let row0 = self.buffer.get_row(0)?;
        let row1 = self.buffer.get_row(1)?;
        let row2 = self.buffer.get_row(2)?;
        let format = self.source.format();

        for x in 0..self.width() {
            let ch0 = get_raw_channel_from_row(row0, x, 0, format);
            let ch1 = get_raw_channel_from_row(row1, x, 0, format);
            let ch2 = get_raw_channel_from_row(row2, x, 0, format);
            set_raw_channel_to_row(out, x, 0, ch0, self.output_format);
            set_raw_channel_to_row(out, x, 1, ch1, self.output_format);
            set_raw_channel_to_row(out, x, 2, ch2, self.output_format);
        }
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "MergeMonoLines"
    }
}

/// Splits each colour row into three mono rows, one per stored channel.
pub struct SplitMonoLines {
    source: BoxedNode,
    output_format: PixelFormat,
    buffer: Vec<u8>,
    next_channel: usize,
}

impl SplitMonoLines {
    pub fn new(source: BoxedNode) -> Result<Self> {
        let output_format = match source.format() {
            PixelFormat::Rgb111 => PixelFormat::I1,
            PixelFormat::Rgb888 | PixelFormat::Bgr888 => PixelFormat::I8,
            PixelFormat::Rgb161616 | PixelFormat::Bgr161616 => PixelFormat::I16,
            other => return Err(GenesysError::UnsupportedFormat(other)),
        };
        let buffer = vec![0; source.row_bytes()];
        Ok(Self {
            source,
            output_format,
            buffer,
            next_channel: 0,
        })
    }
}

impl ImagePipelineNode for SplitMonoLines {
    fn width(&self) -> usize {
        self.source.width()
    }

    fn height(&self) -> usize {
        self.source.height() * 3
    }

    fn format(&self) -> PixelFormat {
        self.output_format
    }

    fn eof(&self) -> bool {
        self.source.eof()
    }

    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        let mut got_data = true;
        if self.next_channel == 0 {
            got_data &= self.source.get_next_row_data(&mut self.buffer)?;
        }

        let format = self.source.format();
        for x in 0..self.width() {
            let ch = get_raw_channel_from_row(&self.buffer, x, self.next_channel, format);
            set_raw_channel_to_row(out, x, 0, ch, self.output_format);
        }
        self.next_channel = (self.next_channel + 1) % 3;
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "SplitMonoLines"
    }
}

/// Undoes a vertical offset between the colour planes of a sensor.
///
/// Channel `c` of output row `y` comes from source row `y + shift[c]`. The last
/// `max(shift)` rows of the source cannot be completed and are not emitted.
pub struct ComponentShiftLines {
    source: BoxedNode,
    extra_height: usize,
    height: usize,
    channel_shifts: [usize; 3],
    buffer: RowBuffer,
}

impl ComponentShiftLines {
    pub fn new(source: BoxedNode, shift_r: usize, shift_g: usize, shift_b: usize) -> Result<Self> {
        debug!(shift_r, shift_g, shift_b, "ComponentShiftLines");
        let channel_shifts = match source.format() {
            PixelFormat::Rgb111 | PixelFormat::Rgb888 | PixelFormat::Rgb161616 => {
                [shift_r, shift_g, shift_b]
            }
            PixelFormat::Bgr888 | PixelFormat::Bgr161616 => [shift_b, shift_g, shift_r],
            other => return Err(GenesysError::UnsupportedFormat(other)),
        };
        let extra_height = channel_shifts.iter().copied().max().unwrap_or(0);
        let height = source.height().saturating_sub(extra_height);
        let buffer = RowBuffer::new(source.row_bytes());
        Ok(Self {
            source,
            extra_height,
            height,
            channel_shifts,
            buffer,
        })
    }
}

impl ImagePipelineNode for ComponentShiftLines {
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
        let rows = [
            self.buffer.get_row(self.channel_shifts[0])?,
            self.buffer.get_row(self.channel_shifts[1])?,
            self.buffer.get_row(self.channel_shifts[2])?,
        ];

        for x in 0..self.width() {
            for (ch, row) in rows.iter().enumerate() {
                let value = get_raw_channel_from_row(row, x, ch, format);
                set_raw_channel_to_row(out, x, ch, value, format);
            }
        }
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "ComponentShiftLines"
    }
}
