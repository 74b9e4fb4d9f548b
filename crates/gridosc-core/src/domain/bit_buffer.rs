//! In-memory mirror of the LEDs on a grid device.
//!
//! A [`BitBuffer`] stores one small integer per LED, laid out row-major
//! (`row = y`, `col = x`).  For binary LEDs each cell is `0` or `1`; the
//! type does not enforce that, so a cell can also carry a 4-bit level.
//!
//! # Permissive writes
//!
//! Every mutator is total.  Coordinates that fall outside the buffer are
//! dropped without an error, so callers can draw at an offset (for example
//! a row of 16 values starting at `x = 8` on an 8-wide grid) without
//! clipping first.  Reads outside the buffer return `0`.

use std::ops::{BitAnd, BitOr, BitXor};

/// Side length of the square block used by `/grid/led/map`.
pub const MAP_SIZE: usize = 8;

/// An 8×8 block of LED values, indexed `[row][col]`.
pub type LedMap = [[u8; MAP_SIZE]; MAP_SIZE];

/// A dense `width × height` grid of LED values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitBuffer {
    width: u32,
    height: u32,
    /// Row-major storage: cell `(x, y)` lives at `y * width + x`.
    leds: Vec<u8>,
}

impl BitBuffer {
    /// Creates a buffer with every LED off.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            leds: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the value at `(x, y)`, or `None` outside the buffer.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        self.index(x, y).map(|i| self.leds[i])
    }

    /// Sets one LED.  Ignored when `(x, y)` is outside the buffer.
    pub fn led_set(&mut self, x: u32, y: u32, s: u8) {
        if let Some(i) = self.index(x, y) {
            self.leds[i] = s;
        }
    }

    /// Sets every LED to `s`.
    pub fn led_all(&mut self, s: u8) {
        self.leds.fill(s);
    }

    /// Writes a sequence of rows, the first one at `y_offset`.
    ///
    /// Each row is applied with [`BitBuffer::led_row`] starting at `x_offset`.
    pub fn led_map<R: AsRef<[u8]>>(&mut self, x_offset: u32, y_offset: u32, rows: &[R]) {
        for (r, row) in rows.iter().enumerate() {
            if let Some(y) = offset(y_offset, r) {
                self.led_row(x_offset, y, row.as_ref());
            }
        }
    }

    /// Writes `data` along row `y`, the first value at `x_offset`.
    pub fn led_row(&mut self, x_offset: u32, y: u32, data: &[u8]) {
        for (i, &s) in data.iter().enumerate() {
            if let Some(x) = offset(x_offset, i) {
                self.led_set(x, y, s);
            }
        }
    }

    /// Writes `data` down column `x`, the first value at `y_offset`.
    pub fn led_col(&mut self, x: u32, y_offset: u32, data: &[u8]) {
        for (i, &s) in data.iter().enumerate() {
            if let Some(y) = offset(y_offset, i) {
                self.led_set(x, y, s);
            }
        }
    }

    /// Extracts the 8×8 block whose top-left corner is `(x_offset, y_offset)`.
    ///
    /// Cells beyond the buffer edge read as `0`, so a block hanging off the
    /// right or bottom of a small device is still well defined.
    pub fn get_map(&self, x_offset: u32, y_offset: u32) -> LedMap {
        let mut map = [[0u8; MAP_SIZE]; MAP_SIZE];
        for (r, row) in map.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                if let (Some(x), Some(y)) = (offset(x_offset, c), offset(y_offset, r)) {
                    *cell = self.get(x, y).unwrap_or(0);
                }
            }
        }
        map
    }

    /// Returns row `y` as a slice, or `None` outside the buffer.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        Some(&self.leds[start..start + self.width as usize])
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Applies `op` cell by cell.  Both operands must share a shape.
    fn combine(&self, other: &Self, op: impl Fn(u8, u8) -> u8) -> Self {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "BitBuffer operands must have the same dimensions"
        );
        Self {
            width: self.width,
            height: self.height,
            leds: self
                .leds
                .iter()
                .zip(&other.leds)
                .map(|(&a, &b)| op(a, b))
                .collect(),
        }
    }
}

/// `base + i` as a coordinate, or `None` if it does not fit in `u32`.
fn offset(base: u32, i: usize) -> Option<u32> {
    u32::try_from(i).ok().and_then(|i| base.checked_add(i))
}

impl BitAnd for &BitBuffer {
    type Output = BitBuffer;

    /// # Panics
    ///
    /// Panics if the two buffers have different dimensions.
    fn bitand(self, rhs: Self) -> BitBuffer {
        self.combine(rhs, |a, b| a & b)
    }
}

impl BitOr for &BitBuffer {
    type Output = BitBuffer;

    /// # Panics
    ///
    /// Panics if the two buffers have different dimensions.
    fn bitor(self, rhs: Self) -> BitBuffer {
        self.combine(rhs, |a, b| a | b)
    }
}

impl BitXor for &BitBuffer {
    type Output = BitBuffer;

    /// # Panics
    ///
    /// Panics if the two buffers have different dimensions.
    fn bitxor(self, rhs: Self) -> BitBuffer {
        self.combine(rhs, |a, b| a ^ b)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
