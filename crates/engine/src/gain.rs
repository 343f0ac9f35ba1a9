/// Decibel gain model
///
/// Levels are expressed as `log10` ratios against full scale, and gains are
/// applied with the power-ratio exponent `10^(dB / 10)`. Output levels of
/// existing renders depend on this exact convention.
use overvoice_core::{AudioError, BitDepth, PcmSample, Result};
use std::cmp::Ordering;

/// Direction a gain is applied in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GainSign {
    /// Multiply by `10^(+dB / 10)`
    Boost,
    /// Multiply by `10^(-dB / 10)`
    Cut,
}

impl GainSign {
    fn factor(self) -> f64 {
        match self {
            GainSign::Boost => 1.0,
            GainSign::Cut => -1.0,
        }
    }
}

/// Linear multiplier for a gain of `db` in the given direction
#[inline]
pub fn gain_factor(db: f64, sign: GainSign) -> f64 {
    10_f64.powf(sign.factor() * 0.1 * db)
}

/// Apply a gain to a raw sample: `sample * 10^(sign * 0.1 * db)`
///
/// The result is truncated toward zero and saturated to the sample's range.
#[inline]
pub fn apply_gain<T: PcmSample>(sample: T, db: f64, sign: GainSign) -> T {
    scale(sample, gain_factor(db, sign))
}

#[inline]
pub(crate) fn scale<T: PcmSample>(sample: T, factor: f64) -> T {
    T::from_f64(sample.to_f64() * factor)
}

/// A decibel figure tagged with the bit depth it was measured at
///
/// Comparisons look at the dB value only; the tag just fixes the full-scale
/// reference used when the value was derived from a sample.
#[derive(Clone, Copy, Debug)]
pub struct Decibel {
    value: f64,
    bit_depth: BitDepth,
}

impl Decibel {
    pub fn new(value: f64, bit_depth: BitDepth) -> Self {
        Self { value, bit_depth }
    }

    /// Build a value from a decimal literal such as `"15"` or `"-2.5"`
    pub fn parse(literal: &str, bit_depth: BitDepth) -> Result<Self> {
        let value: f64 = literal
            .trim()
            .parse()
            .map_err(|_| AudioError::InvalidGainLiteral(literal.to_string()))?;
        if !value.is_finite() {
            return Err(AudioError::InvalidGainLiteral(literal.to_string()));
        }
        Ok(Self::new(value, bit_depth))
    }

    /// Level of `sample` relative to its depth's full scale
    ///
    /// Negative samples are measured against `-full_scale - 1`, so the most
    /// negative integer sample also sits at 0 dB. Silence is `-inf`.
    pub fn from_full_scale<T: PcmSample>(sample: T) -> Self {
        let bit_depth = T::BIT_DEPTH;
        let raw = sample.to_f64();
        let reference = if raw < 0.0 {
            -bit_depth.full_scale() - 1.0
        } else {
            bit_depth.full_scale()
        };
        Self::new((raw / reference).log10(), bit_depth)
    }

    /// Level of `sample` relative to an arbitrary `reference` sample
    pub fn from_reference<T: PcmSample>(reference: T, sample: T) -> Self {
        Self::new((sample.to_f64() / reference.to_f64()).log10(), T::BIT_DEPTH)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Full-scale reference for this value's bit depth
    pub fn full_scale(&self) -> f64 {
        self.bit_depth.full_scale()
    }

    /// Raise `sample` by this gain
    pub fn boost<T: PcmSample>(&self, sample: T) -> T {
        apply_gain(sample, self.value, GainSign::Boost)
    }

    /// Lower `sample` by this gain
    pub fn cut<T: PcmSample>(&self, sample: T) -> T {
        apply_gain(sample, self.value, GainSign::Cut)
    }
}

impl PartialEq for Decibel {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for Decibel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}
