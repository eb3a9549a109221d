//! Pull-based row pipeline that turns raw sensor lines into image rows.

mod calibrate;
mod color_lines;
mod debug;
mod format;
mod geometry;
pub mod node;
mod segment;
mod shift;
mod source;
mod stack;

pub use calibrate::Calibrate;
pub use color_lines::{ComponentShiftLines, MergeMonoLines, SplitMonoLines};
pub use debug::DebugDump;
pub use format::{FormatConvert, Invert, Swap16BitEndian};
pub use geometry::{Extract, ScaleRows};
pub use node::{BoxedNode, ImagePipelineNode};
pub use segment::{DeinterleaveLines, Desegment};
pub use shift::{compute_pixel_shift_extra_width, PixelShiftColumns, PixelShiftLines};
pub use source::{ArraySource, BufferedCallableSource, CallableSource, ImageSource};
pub use stack::ImagePipelineStack;
