//! Two-dimensional channel arrays and boolean masks.
//!
//! Masks are combined with genuine boolean AND / OR. Both operands must share a
//! shape; combining anything else is a `ShapeMismatch`.

use crate::error::{GreenViewError, Result};

/// A row-major grid of `f64` values derived from one colour channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelArray {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl ChannelArray {
    pub fn new(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != width * height {
            return Err(GreenViewError::InvalidInput(format!(
                "channel array of {}x{} needs {} values, got {}",
                width,
                height,
                width * height,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Elementwise combination of two same-shaped arrays.
    pub fn zip_with(&self, other: &ChannelArray, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        ensure_same_shape(self.shape(), other.shape())?;
        Ok(Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().zip(&other.data).map(|(&a, &b)| f(a, b)).collect(),
        })
    }

    /// Largest value, `None` when empty. NaN values are skipped.
    pub fn max(&self) -> Option<f64> {
        self.data.iter().copied().filter(|v| !v.is_nan()).reduce(f64::max)
    }

    /// Smallest value, `None` when empty. NaN values are skipped.
    pub fn min(&self) -> Option<f64> {
        self.data.iter().copied().filter(|v| !v.is_nan()).reduce(f64::min)
    }

    /// Rejects empty arrays and arrays holding NaN or infinity.
    pub fn ensure_finite(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(GreenViewError::InvalidInput("channel array is empty".into()));
        }
        if let Some(index) = self.data.iter().position(|v| !v.is_finite()) {
            return Err(GreenViewError::InvalidInput(format!(
                "non-finite value at ({}, {})",
                index % self.width.max(1),
                index / self.width.max(1)
            )));
        }
        Ok(())
    }

    /// Strict `value < limit` predicate.
    pub fn less_than(&self, limit: f64) -> Mask {
        self.predicate(|v| v < limit)
    }

    /// Strict `value > limit` predicate.
    pub fn greater_than(&self, limit: f64) -> Mask {
        self.predicate(|v| v > limit)
    }

    pub fn predicate(&self, f: impl Fn(f64) -> bool) -> Mask {
        Mask {
            width: self.width,
            height: self.height,
            bits: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

/// A row-major boolean grid marking pixels that satisfy a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(width: usize, height: usize, bits: Vec<bool>) -> Result<Self> {
        if bits.len() != width * height {
            return Err(GreenViewError::InvalidInput(format!(
                "mask of {}x{} needs {} values, got {}",
                width,
                height,
                width * height,
                bits.len()
            )));
        }
        Ok(Self { width, height, bits })
    }

    pub fn filled(width: usize, height: usize, value: bool) -> Self {
        Self {
            width,
            height,
            bits: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        (x < self.width && y < self.height).then(|| self.bits[y * self.width + x])
    }

    pub fn and(&self, other: &Mask) -> Result<Mask> {
        self.combine(other, |a, b| a && b)
    }

    pub fn or(&self, other: &Mask) -> Result<Mask> {
        self.combine(other, |a, b| a || b)
    }

    /// Number of `true` pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// `100 × count / total`. The denominator is whatever the caller says the
    /// image area is; it is not derived from this mask.
    pub fn percentage_of(&self, total_pixels: usize) -> f64 {
        self.count() as f64 / total_pixels as f64 * 100.0
    }

    fn combine(&self, other: &Mask, op: impl Fn(bool, bool) -> bool) -> Result<Mask> {
        ensure_same_shape(self.shape(), other.shape())?;
        Ok(Mask {
            width: self.width,
            height: self.height,
            bits: self.bits.iter().zip(&other.bits).map(|(&a, &b)| op(a, b)).collect(),
        })
    }
}

fn ensure_same_shape(expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected != actual {
        return Err(GreenViewError::ShapeMismatch { expected, actual });
    }
    Ok(())
}
