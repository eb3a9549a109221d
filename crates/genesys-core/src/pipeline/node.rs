use crate::error::Result;
use crate::image::PixelFormat;

/// One stage of the pull-based row pipeline.
///
/// A node owns its upstream source, so dropping a node tears the chain down
/// from the sink towards the source.
pub trait ImagePipelineNode {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    fn format(&self) -> PixelFormat;

    fn row_bytes(&self) -> usize {
        self.format().row_bytes(self.width())
    }

    fn eof(&self) -> bool;

    /// Write the next output row into `out`, which must hold at least `row_bytes()` bytes.
    ///
    /// `Ok(false)` means the upstream data ran out. The row contents are then
    /// unspecified and `eof()` reports true.
    fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool>;

    /// Short name used in log output.
    fn name(&self) -> &'static str;
}

pub type BoxedNode = Box<dyn ImagePipelineNode>;
