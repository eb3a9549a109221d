use crate::error::Result;
use crate::utilities::align_multiple_ceil;

/// Fills the given slice completely. Returns `Ok(false)` once the producer has no
/// more data to give; transient waits are the producer's own business.
pub type ProducerCallback = Box<dyn FnMut(&mut [u8]) -> Result<bool>>;

/// Adapts a producer that delivers fixed-size chunks to readers that want
/// arbitrarily sized pieces.
pub struct ImageBuffer {
    producer: ProducerCallback,
    size: usize,
    curr_size: usize,
    remaining_size: Option<u64>,
    last_read_multiple: Option<u64>,
    buffer_offset: usize,
    buffer: Vec<u8>,
}

impl ImageBuffer {
    pub fn new(size: usize, producer: ProducerCallback) -> Self {
        Self {
            producer,
            size,
            curr_size: 0,
            remaining_size: None,
            last_read_multiple: None,
            buffer_offset: 0,
            buffer: vec![0; size],
        }
    }

    /// Bytes already read from the producer but not handed out yet.
    pub fn available(&self) -> usize {
        self.curr_size - self.buffer_offset
    }

    pub fn remaining_size(&self) -> Option<u64> {
        self.remaining_size
    }

    /// Cap the total number of bytes requested from the producer. `None` removes the cap.
    pub fn set_remaining_size(&mut self, bytes: Option<u64>) {
        self.remaining_size = bytes;
    }

    /// Round the request that exhausts the cap up to a multiple of `bytes`.
    pub fn set_last_read_multiple(&mut self, bytes: Option<u64>) {
        self.last_read_multiple = bytes;
    }

    fn copy_buffer(&mut self, out: &mut [u8], written: &mut usize) {
        let count = (out.len() - *written).min(self.available());
        out[*written..*written + count]
            .copy_from_slice(&self.buffer[self.buffer_offset..self.buffer_offset + count]);
        *written += count;
        self.buffer_offset += count;
    }

    /// Fill `out` completely. Returns `Ok(false)` if the producer ran dry or the
    /// size cap was reached before that happened.
    pub fn get_data(&mut self, out: &mut [u8]) -> Result<bool> {
        let mut written = 0;
        if self.available() > 0 {
            self.copy_buffer(out, &mut written);
        }
        if written == out.len() {
            return Ok(true);
        }

        let mut got_data = true;
        while written < out.len() && got_data {
            self.buffer_offset = 0;

            let mut size_to_read = self.size as u64;
            if let Some(remaining) = self.remaining_size.as_mut() {
                size_to_read = size_to_read.min(*remaining);
                *remaining -= size_to_read;
            }
            let exhausted = self.remaining_size == Some(0);
            if size_to_read == 0 {
                got_data = false;
                break;
            }

            let mut aligned_size = size_to_read;
            if exhausted {
                if let Some(multiple) = self.last_read_multiple {
                    aligned_size = align_multiple_ceil(size_to_read, multiple);
                }
            }
            let aligned_size = aligned_size as usize;
            if aligned_size > self.buffer.len() {
                self.buffer.resize(aligned_size, 0);
            }

            if (self.producer)(&mut self.buffer[..aligned_size])? {
                self.curr_size = size_to_read as usize;
                self.copy_buffer(out, &mut written);
            } else {
                // Whatever the producer left in the buffer is not valid data.
                self.curr_size = 0;
                got_data = false;
            }

            if exhausted && written < out.len() {
                got_data = false;
            }
        }
        Ok(got_data)
    }
}
