use crate::error::{GenesysError, Result};

/// Growable ring of fixed-size rows.
///
/// Rows live in `[first, last)`. When the range wraps past the end of the
/// allocation the buffer is non-linear and `last < first` (or equal, when full).
#[derive(Clone, Debug, Default)]
pub struct RowBuffer {
    row_bytes: usize,
    first: usize,
    last: usize,
    buffer_end: usize,
    is_linear: bool,
    data: Vec<u8>,
}

impl RowBuffer {
    pub fn new(row_bytes: usize) -> Self {
        Self {
            row_bytes,
            first: 0,
            last: 0,
            buffer_end: 0,
            is_linear: true,
            data: Vec::new(),
        }
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn height(&self) -> usize {
        if self.is_linear {
            self.last - self.first
        } else {
            self.last + self.buffer_end - self.first
        }
    }

    pub fn height_capacity(&self) -> usize {
        self.buffer_end
    }

    pub fn empty(&self) -> bool {
        self.is_linear && self.first == self.last
    }

    pub fn full(&self) -> bool {
        if self.is_linear {
            self.last == self.buffer_end
        } else {
            self.first == self.last
        }
    }

    pub fn is_linear(&self) -> bool {
        self.is_linear
    }

    fn row_index(&self, y: usize) -> usize {
        if y >= self.buffer_end - self.first {
            y - (self.buffer_end - self.first)
        } else {
            y + self.first
        }
    }

    fn check_index(&self, y: usize) -> Result<usize> {
        let height = self.height();
        if y >= height {
            return Err(GenesysError::RowIndexOutOfRange { index: y, height });
        }
        Ok(self.row_index(y) * self.row_bytes)
    }

    /// Row `y`, counted from the logical front.
    pub fn get_row(&self, y: usize) -> Result<&[u8]> {
        let start = self.check_index(y)?;
        Ok(&self.data[start..start + self.row_bytes])
    }

    pub fn get_row_mut(&mut self, y: usize) -> Result<&mut [u8]> {
        let start = self.check_index(y)?;
        Ok(&mut self.data[start..start + self.row_bytes])
    }

    pub fn front(&self) -> Result<&[u8]> {
        self.get_row(0)
    }

    pub fn front_mut(&mut self) -> Result<&mut [u8]> {
        self.get_row_mut(0)
    }

    pub fn back(&self) -> Result<&[u8]> {
        let y = self.height().checked_sub(1).ok_or(GenesysError::EmptyRowBuffer)?;
        self.get_row(y)
    }

    pub fn back_mut(&mut self) -> Result<&mut [u8]> {
        let y = self.height().checked_sub(1).ok_or(GenesysError::EmptyRowBuffer)?;
        self.get_row_mut(y)
    }

    /// Rotate storage so that row 0 sits at the start of the allocation.
    pub fn linearize(&mut self) {
        if !self.is_linear {
            let height = self.height();
            self.data.rotate_left(self.row_bytes * self.first);
            self.first = 0;
            self.last = height;
            self.is_linear = true;
        }
    }

    /// Grow the allocation to at least `capacity` rows. Always leaves the buffer linear.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        self.linearize();
        if capacity <= self.buffer_end {
            return;
        }
        self.data.resize(capacity * self.row_bytes, 0);
        self.buffer_end = capacity;
    }

    fn grow_if_needed(&mut self) {
        if self.height() + 1 >= self.height_capacity() {
            self.ensure_capacity(std::cmp::max(1, self.height() * 2));
        }
    }

    /// Append a row slot at the back. Its contents are unspecified until written.
    pub fn push_back(&mut self) {
        self.grow_if_needed();
        if self.last == self.buffer_end {
            self.is_linear = false;
            self.last = 0;
        }
        self.last += 1;
    }

    /// Prepend a row slot at the front. Its contents are unspecified until written.
    pub fn push_front(&mut self) {
        self.grow_if_needed();
        if self.first == 0 {
            self.is_linear = false;
            self.first = self.buffer_end;
        }
        self.first -= 1;
    }

    pub fn pop_front(&mut self) -> Result<()> {
        if self.empty() {
            return Err(GenesysError::EmptyRowBuffer);
        }
        self.first += 1;
        if self.first == self.last {
            self.first = 0;
            self.last = 0;
            self.is_linear = true;
        } else if self.first == self.buffer_end {
            self.first = 0;
            self.is_linear = true;
        }
        Ok(())
    }

    pub fn pop_back(&mut self) -> Result<()> {
        if self.empty() {
            return Err(GenesysError::EmptyRowBuffer);
        }
        if self.last == 0 {
            self.last = self.buffer_end;
            self.is_linear = true;
        }
        self.last -= 1;
        if self.first == self.last {
            self.first = 0;
            self.last = 0;
            self.is_linear = true;
        }
        Ok(())
    }

    /// Drop all rows, keeping the allocation.
    pub fn clear(&mut self) {
        self.first = 0;
        self.last = 0;
        self.is_linear = true;
    }

    /// Contiguous bytes of all rows in logical order. Requires a linear buffer.
    pub fn linear_data(&self) -> Result<&[u8]> {
        if !self.is_linear {
            return Err(GenesysError::invalid("row buffer must be linearized first"));
        }
        Ok(&self.data[self.first * self.row_bytes..self.last * self.row_bytes])
    }
}
