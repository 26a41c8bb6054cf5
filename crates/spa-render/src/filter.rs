//! Biquad filters.
//!
//! Coefficients follow the Audio EQ Cookbook formulas for lowpass,
//! highpass, and bandpass. The filter runs the direct-form-I difference
//! equation with fresh state per invocation. When cutoff or resonance is
//! automated, coefficients are recomputed every [`COEFF_UPDATE_INTERVAL`]
//! samples while the delay-line state carries across blocks, so the sweep
//! stays free of discontinuities.

use std::f64::consts::PI;

use spa_doc::{FilterConfig, FilterType};

use crate::automation::{param_value, progress};

/// Samples between coefficient updates while a filter parameter sweeps.
pub const COEFF_UPDATE_INTERVAL: usize = 64;

/// Biquad filter coefficients, normalized by a0.
#[derive(Debug, Clone, Copy)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Lowpass coefficients for the given cutoff and Q.
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let (cos_omega, alpha) = intermediates(cutoff, q, sample_rate);

        let b0 = (1.0 - cos_omega) / 2.0;
        let b1 = 1.0 - cos_omega;
        let b2 = (1.0 - cos_omega) / 2.0;
        Self::normalize(b0, b1, b2, cos_omega, alpha)
    }

    /// Highpass coefficients.
    pub fn highpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let (cos_omega, alpha) = intermediates(cutoff, q, sample_rate);

        let b0 = (1.0 + cos_omega) / 2.0;
        let b1 = -(1.0 + cos_omega);
        let b2 = (1.0 + cos_omega) / 2.0;
        Self::normalize(b0, b1, b2, cos_omega, alpha)
    }

    /// Bandpass coefficients (constant skirt gain).
    pub fn bandpass(center: f64, q: f64, sample_rate: f64) -> Self {
        let (cos_omega, alpha) = intermediates(center, q, sample_rate);

        let b0 = alpha;
        let b1 = 0.0;
        let b2 = -alpha;
        Self::normalize(b0, b1, b2, cos_omega, alpha)
    }

    /// Coefficients for a filter config evaluated at sweep progress `p`.
    pub fn for_config(config: &FilterConfig, p: f64, sample_rate: f64) -> Self {
        let mut cutoff = param_value(&config.cutoff, p);
        if let Some(cents) = config.detune {
            cutoff *= (cents / 1200.0).exp2();
        }
        let q = param_value(&config.resonance, p);

        match config.kind {
            FilterType::Lowpass => Self::lowpass(cutoff, q, sample_rate),
            FilterType::Highpass => Self::highpass(cutoff, q, sample_rate),
            FilterType::Bandpass => Self::bandpass(cutoff, q, sample_rate),
        }
    }

    fn normalize(b0: f64, b1: f64, b2: f64, cos_omega: f64, alpha: f64) -> Self {
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

fn intermediates(cutoff: f64, q: f64, sample_rate: f64) -> (f64, f64) {
    let q = q.max(0.1);
    let cutoff = cutoff.clamp(1.0, sample_rate * 0.49);
    let omega = 2.0 * PI * cutoff / sample_rate;
    let alpha = omega.sin() / (2.0 * q);
    (omega.cos(), alpha)
}

/// Biquad filter with direct-form-I state.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Swaps in new coefficients, keeping the delay-line state.
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.coeffs.b1 * self.x1 + self.coeffs.b2 * self.x2
            - self.coeffs.a1 * self.y1
            - self.coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Processes a buffer in place.
    pub fn process_buffer(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

/// Applies a filter config to a buffer with fresh state.
///
/// Static configs run a single coefficient set; automated configs step the
/// coefficients every [`COEFF_UPDATE_INTERVAL`] samples.
pub fn apply(samples: &mut [f64], config: &FilterConfig, sample_rate: f64) {
    if samples.is_empty() {
        return;
    }

    let automated = config.cutoff.is_curve() || config.resonance.is_curve();
    if !automated {
        let coeffs = BiquadCoeffs::for_config(config, 0.0, sample_rate);
        BiquadFilter::new(coeffs).process_buffer(samples);
        return;
    }

    let total = samples.len();
    let mut filter = BiquadFilter::new(BiquadCoeffs::for_config(config, 0.0, sample_rate));
    for (block_index, block) in samples.chunks_mut(COEFF_UPDATE_INTERVAL).enumerate() {
        let start = block_index * COEFF_UPDATE_INTERVAL;
        filter.set_coeffs(BiquadCoeffs::for_config(
            config,
            progress(start, total),
            sample_rate,
        ));
        filter.process_buffer(block);
    }
}
