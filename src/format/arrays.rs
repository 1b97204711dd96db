//! Raw numeric array sections.
//!
//! Per-frame custom data (stage positions, PFS state, exposure, camera
//! temperature, acquisition timestamps) is stored as a bare little-endian
//! array with no header: the element count is the chunk length divided by
//! the element size.

use std::sync::Arc;

use crate::error::DecodeError;
use crate::io::{read_f64_le, read_i32_le};

/// Decode a chunk as little-endian f64 values.
pub fn decode_f64_array(data: &[u8]) -> Result<Vec<f64>, DecodeError> {
    check_aligned(data, 8)?;
    Ok(data.chunks_exact(8).map(read_f64_le).collect())
}

/// Decode a chunk as little-endian i32 values.
pub fn decode_i32_array(data: &[u8]) -> Result<Vec<i32>, DecodeError> {
    check_aligned(data, 4)?;
    Ok(data.chunks_exact(4).map(read_i32_le).collect())
}

fn check_aligned(data: &[u8], element_size: usize) -> Result<(), DecodeError> {
    if data.len() % element_size != 0 {
        return Err(DecodeError::MisalignedArray {
            len: data.len(),
            element_size,
        });
    }
    Ok(())
}

// =============================================================================
// ScaledSeries
// =============================================================================

/// A finite, restartable sequence that applies a per-element transform to
/// stored raw values.
///
/// Nothing is precomputed: every call to [`ScaledSeries::iter`] starts over
/// from the raw values.
#[derive(Clone)]
pub struct ScaledSeries {
    raw: Arc<[f64]>,
    transform: fn(f64) -> f64,
}

impl ScaledSeries {
    /// Camera temperature readings: raw × 100, rounded to two decimals.
    pub fn camera_temperature(raw: Arc<[f64]>) -> Self {
        Self {
            raw,
            transform: |v| (v * 100.0 * 100.0).round() / 100.0,
        }
    }

    /// Acquisition timestamps: raw milliseconds to seconds.
    pub fn acquisition_times(raw: Arc<[f64]>) -> Self {
        Self {
            raw,
            transform: |v| v / 1000.0,
        }
    }

    /// Iterate the transformed values from the start.
    pub fn iter(&self) -> ScaledIter<'_> {
        ScaledIter {
            inner: self.raw.iter(),
            transform: self.transform,
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Untransformed stored values.
    pub fn raw(&self) -> &[f64] {
        &self.raw
    }
}

impl std::fmt::Debug for ScaledSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a ScaledSeries {
    type Item = f64;
    type IntoIter = ScaledIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`ScaledSeries`].
pub struct ScaledIter<'a> {
    inner: std::slice::Iter<'a, f64>,
    transform: fn(f64) -> f64,
}

impl Iterator for ScaledIter<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        self.inner.next().map(|&v| (self.transform)(v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ScaledIter<'_> {}
