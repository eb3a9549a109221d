use tracing::debug;

use super::node::{BoxedNode, ImagePipelineNode};
use crate::error::{GenesysError, Result};
use crate::image::{Image, PixelFormat};

#[derive(Clone, Copy, Debug)]
struct InputGeometry {
    width: usize,
    height: usize,
    format: PixelFormat,
    row_bytes: usize,
}

/// Owns a chain of pipeline nodes, source first.
///
/// Only the last node is held directly; every node owns its upstream node, so
/// dropping the chain always releases a node before the node it reads from.
#[derive(Default)]
pub struct ImagePipelineStack {
    output: Option<BoxedNode>,
    input: Option<InputGeometry>,
    node_count: usize,
}

impl ImagePipelineStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an empty stack with its data source.
    pub fn push_first_node<N>(&mut self, node: N) -> Result<()>
    where
        N: ImagePipelineNode + 'static,
    {
        if self.output.is_some() {
            return Err(GenesysError::PipelineOrder(
                "trying to append first node when there are existing nodes",
            ));
        }
        debug!(
            node = node.name(),
            width = node.width(),
            height = node.height(),
            format = %node.format(),
            "Pipeline source"
        );
        self.input = Some(InputGeometry {
            width: node.width(),
            height: node.height(),
            format: node.format(),
            row_bytes: node.row_bytes(),
        });
        self.output = Some(Box::new(node));
        self.node_count = 1;
        Ok(())
    }

    /// Append a node built on top of the current last node.
    ///
    /// `build` receives the current chain as the new node's source. If it fails
    /// the chain it was given is dropped and the stack is left empty.
    pub fn push_node<N, F>(&mut self, build: F) -> Result<()>
    where
        N: ImagePipelineNode + 'static,
        F: FnOnce(BoxedNode) -> Result<N>,
    {
        let source = self.output.take().ok_or(GenesysError::PipelineOrder(
            "the pipeline does not contain any nodes",
        ))?;
        match build(source) {
            Ok(node) => {
                debug!(
                    node = node.name(),
                    width = node.width(),
                    height = node.height(),
                    format = %node.format(),
                    "Pipeline node"
                );
                self.output = Some(Box::new(node));
                self.node_count += 1;
                Ok(())
            }
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    fn ensure_node_exists(&self) -> Result<&dyn ImagePipelineNode> {
        self.output
            .as_deref()
            .ok_or(GenesysError::PipelineOrder("the pipeline does not contain any nodes"))
    }

    fn input(&self) -> Result<InputGeometry> {
        self.input
            .ok_or(GenesysError::PipelineOrder("the pipeline does not contain any nodes"))
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_none()
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn input_width(&self) -> Result<usize> {
        Ok(self.input()?.width)
    }

    pub fn input_height(&self) -> Result<usize> {
        Ok(self.input()?.height)
    }

    pub fn input_format(&self) -> Result<PixelFormat> {
        Ok(self.input()?.format)
    }

    pub fn input_row_bytes(&self) -> Result<usize> {
        Ok(self.input()?.row_bytes)
    }

    pub fn output_width(&self) -> Result<usize> {
        Ok(self.ensure_node_exists()?.width())
    }

    pub fn output_height(&self) -> Result<usize> {
        Ok(self.ensure_node_exists()?.height())
    }

    pub fn output_format(&self) -> Result<PixelFormat> {
        Ok(self.ensure_node_exists()?.format())
    }

    pub fn output_row_bytes(&self) -> Result<usize> {
        Ok(self.ensure_node_exists()?.row_bytes())
    }

    pub fn output_node(&self) -> Option<&dyn ImagePipelineNode> {
        self.output.as_deref()
    }

    pub fn eof(&self) -> bool {
        self.output.as_ref().map_or(true, |node| node.eof())
    }

    /// Drop every node, sink first.
    pub fn clear(&mut self) {
        self.output = None;
        self.input = None;
        self.node_count = 0;
    }

    pub fn get_next_row_data(&mut self, out: &mut [u8]) -> Result<bool> {
        let node = self.output.as_mut().ok_or(GenesysError::PipelineOrder(
            "the pipeline does not contain any nodes",
        ))?;
        let row_bytes = node.row_bytes();
        if out.len() < row_bytes {
            return Err(GenesysError::invalid(format!(
                "output buffer holds {} bytes, a row needs {row_bytes}",
                out.len()
            )));
        }
        node.get_next_row_data(out)
    }

    /// Pull every output row and return them as one contiguous buffer.
    pub fn get_all_data(&mut self) -> Result<Vec<u8>> {
        let row_bytes = self.output_row_bytes()?;
        let height = self.output_height()?;

        let mut data = vec![0; row_bytes * height];
        if row_bytes > 0 {
            for row in data.chunks_mut(row_bytes) {
                self.get_next_row_data(row)?;
            }
        }
        Ok(data)
    }

    /// Pull every output row into an `Image`.
    pub fn get_image(&mut self) -> Result<Image> {
        let width = self.output_width()?;
        let height = self.output_height()?;
        let format = self.output_format()?;
        let data = self.get_all_data()?;
        Image::from_data(width, height, format, data)
    }
}
