use std::path::PathBuf;

use tracing::{debug, warn};

use super::node::{BoxedNode, ImagePipelineNode};
use crate::error::Result;
use crate::image::{write_tiff_file, PixelFormat, RowBuffer};

/// Passes rows through unchanged and keeps a copy of each. When the node is
/// dropped the collected rows are written to `path` as a TIFF file.
///
/// Failures while writing are logged and otherwise ignored.
pub struct DebugDump {
    source: BoxedNode,
    path: PathBuf,
    buffer: RowBuffer,
}

impl DebugDump {
    pub fn new(source: BoxedNode, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!(path = %path.display(), "DebugDump");
        let buffer = RowBuffer::new(source.row_bytes());
        Self {
            source,
            path,
            buffer,
        }
    }

    fn write_dump(&mut self) -> Result<()> {
        let format = self.format();
        self.buffer.linearize();
        write_tiff_file(
            &self.path,
            self.buffer.linear_data()?,
            format.depth(),
            format.channels(),
            self.width(),
            self.buffer.height(),
        )
    }
}

impl ImagePipelineNode for DebugDump {
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
        let row_bytes = self.row_bytes();
        self.buffer.push_back();
        self.buffer.back_mut()?.copy_from_slice(&out[..row_bytes]);
        Ok(got_data)
    }

    fn name(&self) -> &'static str {
        "DebugDump"
    }
}

impl Drop for DebugDump {
    fn drop(&mut self) {
        if self.buffer.empty() {
            return;
        }
        if let Err(e) = self.write_dump() {
            warn!(path = %self.path.display(), error = %e, "Failed to write debug image");
        }
    }
}
