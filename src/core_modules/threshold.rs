//! Automatic bimodal threshold selection.
//!
//! Otsu's method on a 256-bin histogram: every split point of the histogram is
//! scored by its between-class variance and the best one wins. Splits that put
//! all of the mass on one side have no defined variance; they are skipped with an
//! explicit check instead of letting NaN or infinity flow through the arithmetic.
//! If no split is defined at all the caller's fallback level is returned.

use crate::core_modules::channel::ChannelArray;
use crate::error::{GreenViewError, Result};

pub const HISTOGRAM_BINS: usize = 256;
const BIN_SCALE: f64 = 255.0;

/// Where a selected threshold came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSource {
    /// The histogram had at least one well-defined split.
    Histogram,
    /// The histogram was degenerate; the caller's fallback level was used.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSelection {
    /// Normalized threshold, `split index / 255`.
    pub level: f64,
    pub source: ThresholdSource,
}

/// Returns the threshold separating `array` into two populations, or
/// `fallback_level` when the histogram offers no defined split.
pub fn select_threshold(array: &ChannelArray, fallback_level: f64) -> Result<f64> {
    select_threshold_detailed(array, fallback_level).map(|selection| selection.level)
}

/// Like [`select_threshold`], also reporting whether the fallback was taken.
pub fn select_threshold_detailed(array: &ChannelArray, fallback_level: f64) -> Result<ThresholdSelection> {
    if !fallback_level.is_finite() {
        return Err(GreenViewError::InvalidInput(format!(
            "fallback level must be finite, got {}",
            fallback_level
        )));
    }
    array.ensure_finite()?;

    let fallback = ThresholdSelection {
        level: fallback_level,
        source: ThresholdSource::Fallback,
    };

    let histogram = histogram(array);
    let Some(best_index) = best_split(&histogram) else {
        tracing::trace!("degenerate histogram, using fallback level {}", fallback_level);
        return Ok(fallback);
    };

    let level = best_index / BIN_SCALE;
    if level.is_nan() {
        return Ok(fallback);
    }
    Ok(ThresholdSelection {
        level,
        source: ThresholdSource::Histogram,
    })
}

/// Brings values onto the 0..255 histogram scale.
///
/// - max ≤ 1: a normalized array, multiplied by 255.
/// - max ≥ 256: stretched from [min, max] onto [0, 255].
/// - otherwise: already on the byte scale.
///
/// Negative results are clamped to zero.
fn to_histogram_scale(array: &ChannelArray) -> Vec<f64> {
    let max = array.max().unwrap_or(0.0);
    let min = array.min().unwrap_or(0.0);

    let scale: Box<dyn Fn(f64) -> f64> = if max <= 1.0 {
        Box::new(|v| v * BIN_SCALE)
    } else if max >= HISTOGRAM_BINS as f64 {
        let span = max - min;
        Box::new(move |v| (v - min) / span * BIN_SCALE)
    } else {
        Box::new(|v| v)
    };

    array.values().iter().map(|&v| scale(v).max(0.0)).collect()
}

/// Counts per unit-width bin over [0, 256); the value 256 lands in the last bin.
fn histogram(array: &ChannelArray) -> [u64; HISTOGRAM_BINS] {
    let mut bins = [0u64; HISTOGRAM_BINS];
    for value in to_histogram_scale(array) {
        let bin = (value.floor() as usize).min(HISTOGRAM_BINS - 1);
        bins[bin] += 1;
    }
    bins
}

/// Split index with maximum between-class variance. Tied maxima are averaged,
/// so the result can fall between two bins. `None` when no split is defined.
fn best_split(histogram: &[u64; HISTOGRAM_BINS]) -> Option<f64> {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return None;
    }
    let total_f = total as f64;

    // Class-0 weights use integer counts so that "all mass on one side" is exact.
    let mut cumulative_count = 0u64;
    let mut mu = 0.0f64;
    let mut cumulative = Vec::with_capacity(HISTOGRAM_BINS);
    for (index, &count) in histogram.iter().enumerate() {
        cumulative_count += count;
        mu += count as f64 / total_f * (index + 1) as f64;
        cumulative.push((cumulative_count, mu));
    }
    let mu_total = mu;

    let mut best_variance = f64::NEG_INFINITY;
    let mut tied: Vec<usize> = Vec::new();
    for (index, &(count, mu_k)) in cumulative.iter().enumerate() {
        if count == 0 || count == total {
            continue;
        }
        let omega = count as f64 / total_f;
        let variance = (mu_total * omega - mu_k).powi(2) / (omega * (1.0 - omega));
        if !variance.is_finite() {
            continue;
        }
        if variance > best_variance {
            best_variance = variance;
            tied.clear();
            tied.push(index);
        } else if variance == best_variance {
            tied.push(index);
        }
    }

    if tied.is_empty() {
        return None;
    }
    Some(tied.iter().sum::<usize>() as f64 / tied.len() as f64)
}

/// Forces a threshold into `[floor, ceiling]`.
pub fn clamp_threshold(threshold: f64, floor: f64, ceiling: f64) -> f64 {
    if threshold > ceiling {
        ceiling
    } else if threshold < floor {
        floor
    } else {
        threshold
    }
}
