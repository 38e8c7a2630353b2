//! Exponential Time-Decayed Smoothing
//!
//! ## Why time-aware decay?
//!
//! The float sender is noisy (sloshing, vibration, ADC jitter) and the
//! gateway samples at an irregular cadence: bursts while the engine runs,
//! long gaps while parked. A fixed-window average over *N samples* would
//! weight a dense burst far more than a sparse hour. Decaying by elapsed
//! *time* instead gives every stretch of the day the weight its duration
//! deserves.
//!
//! ## Recurrence
//!
//! ```text
//! for each sample (t, liters), ascending:
//!     decay = exp(-(t - t_prev) / τ)      (0 for the first sample)
//!     S     = S * decay + liters
//!     W     = W * decay + 1
//!     emit  round(S / W, decimals)
//! ```
//!
//! This equals the continuous weighted mean
//! `Σ lᵢ·exp(-(t - tᵢ)/τ) / Σ exp(-(t - tᵢ)/τ)` sampled at each `t`.
//! With τ = 3600 s a reading from an hour ago counts `1/e` of a fresh one.
//!
//! ## Determinism
//!
//! Query results must be reproducible, so the pass is bit-identical for an
//! unchanged input sequence:
//!
//! - samples are consumed strictly in stored order (timestamp, then arrival)
//! - `exp` comes from `libm`, a pure-Rust implementation that does not
//!   depend on the platform math library
//! - rounding is half-to-even on the scaled value
//!
//! The pass is inherently sequential within a day; different days share
//! nothing and may be smoothed concurrently.

use crate::errors::{ConfigError, ConfigResult};
use crate::samples::{CalibratedSample, SmoothedSample};
use crate::time::{elapsed_secs, Timestamp};

/// Decay constant of the reference deployment (seconds)
pub const DEFAULT_DECAY_TAU_SECS: f64 = 3600.0;

/// Decimals kept in smoothed output
pub const DEFAULT_ROUND_DECIMALS: u32 = 2;

/// Largest supported rounding precision
pub const MAX_ROUND_DECIMALS: u32 = 9;

/// Running state of the decayed average
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayAccumulator {
    tau_secs: f64,
    weighted_sum: f64,
    weight_total: f64,
    previous: Option<Timestamp>,
}

impl DecayAccumulator {
    /// Empty accumulator with decay constant `tau_secs`
    pub fn new(tau_secs: f64) -> Self {
        Self {
            tau_secs,
            weighted_sum: 0.0,
            weight_total: 0.0,
            previous: None,
        }
    }

    /// Fold in the next sample and return the unrounded average.
    ///
    /// Samples must arrive in ascending timestamp order.
    pub fn push(&mut self, sample: CalibratedSample) -> f64 {
        let decay = match self.previous {
            Some(previous) => {
                let dt = elapsed_secs(previous, sample.timestamp);
                debug_assert!(dt >= 0.0, "samples must be pushed in timestamp order");
                libm::exp(-dt / self.tau_secs)
            }
            None => 0.0,
        };

        self.weighted_sum = self.weighted_sum * decay + sample.liters;
        self.weight_total = self.weight_total * decay + 1.0;
        self.previous = Some(sample.timestamp);

        self.weighted_sum / self.weight_total
    }

    /// Current average, `None` before the first sample
    pub fn average(&self) -> Option<f64> {
        self.previous.map(|_| self.weighted_sum / self.weight_total)
    }

    /// Timestamp of the last folded sample
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.previous
    }

    /// Forget all history
    pub fn reset(&mut self) {
        *self = Self::new(self.tau_secs);
    }
}

/// Whole-partition smoother
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSmoother {
    tau_secs: f64,
    decimals: u32,
    scale: f64,
}

impl ExponentialSmoother {
    /// Smoother with decay constant `tau_secs`, rounding to `decimals`
    pub fn new(tau_secs: f64, decimals: u32) -> ConfigResult<Self> {
        if !tau_secs.is_finite() || tau_secs <= 0.0 {
            return Err(ConfigError::InvalidDecay { tau_secs });
        }
        if decimals > MAX_ROUND_DECIMALS {
            return Err(ConfigError::InvalidRounding {
                decimals,
                max: MAX_ROUND_DECIMALS,
            });
        }

        Ok(Self {
            tau_secs,
            decimals,
            scale: 10f64.powi(decimals as i32),
        })
    }

    /// Decay constant in seconds
    pub fn tau_secs(&self) -> f64 {
        self.tau_secs
    }

    /// Output precision
    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Fresh accumulator with this smoother's decay constant
    pub fn accumulator(&self) -> DecayAccumulator {
        DecayAccumulator::new(self.tau_secs)
    }

    /// Round half-to-even at the configured precision
    pub fn round(&self, value: f64) -> f64 {
        (value * self.scale).round_ties_even() / self.scale
    }

    /// Lazily smooth an ordered sequence
    pub fn smooth_iter<'a, I>(&self, samples: I) -> SmoothingIter<'a, I::IntoIter>
    where
        I: IntoIterator<Item = &'a CalibratedSample>,
    {
        SmoothingIter {
            smoother: *self,
            accumulator: self.accumulator(),
            samples: samples.into_iter(),
        }
    }

    /// Smooth one partition, one output per input sample
    pub fn smooth_partition(&self, samples: &[CalibratedSample]) -> Vec<SmoothedSample> {
        self.smooth_iter(samples).collect()
    }
}

impl Default for ExponentialSmoother {
    fn default() -> Self {
        Self {
            tau_secs: DEFAULT_DECAY_TAU_SECS,
            decimals: DEFAULT_ROUND_DECIMALS,
            scale: 100.0,
        }
    }
}

/// Iterator returned by [`ExponentialSmoother::smooth_iter`]
pub struct SmoothingIter<'a, I>
where
    I: Iterator<Item = &'a CalibratedSample>,
{
    smoother: ExponentialSmoother,
    accumulator: DecayAccumulator,
    samples: I,
}

impl<'a, I> Iterator for SmoothingIter<'a, I>
where
    I: Iterator<Item = &'a CalibratedSample>,
{
    type Item = SmoothedSample;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.samples.next()?;
        let average = self.accumulator.push(*sample);

        Some(SmoothedSample {
            timestamp: sample.timestamp,
            fuel_level: self.smoother.round(average),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.samples.size_hint()
    }
}
