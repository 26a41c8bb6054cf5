//! Waveform generators.
//!
//! Every waveform is a pure function of a normalized phase in [0, 1).
//! Oscillation comes from a [`PhaseAccumulator`] advancing the phase by
//! `freq / sample_rate` per sample and wrapping modulo 1, which keeps phase
//! continuous across frequency sweeps.

use std::f64::consts::PI;

use spa_doc::Waveform;

pub const TWO_PI: f64 = 2.0 * PI;

/// Evaluates a waveform at the given phase.
#[inline]
pub fn sample(wave: Waveform, phase: f64) -> f64 {
    match wave {
        Waveform::Sine => sine(phase),
        Waveform::Square => square(phase),
        Waveform::Triangle => triangle(phase),
        Waveform::Saw => sawtooth(phase),
        Waveform::Pulse => pulse(phase),
    }
}

/// Sine wave: `sin(2*pi*phase)`.
#[inline]
pub fn sine(phase: f64) -> f64 {
    (TWO_PI * phase).sin()
}

/// Square wave with 50% duty.
#[inline]
pub fn square(phase: f64) -> f64 {
    if phase < 0.5 {
        1.0
    } else {
        -1.0
    }
}

/// Triangle wave, continuous at the half-phase point, range [-1, 1].
#[inline]
pub fn triangle(phase: f64) -> f64 {
    if phase < 0.25 {
        4.0 * phase
    } else if phase < 0.75 {
        2.0 - 4.0 * phase
    } else {
        4.0 * phase - 4.0
    }
}

/// Sawtooth wave rising from -1 to 1 over one period.
#[inline]
pub fn sawtooth(phase: f64) -> f64 {
    2.0 * phase - 1.0
}

/// Pulse wave with the fixed 25% width the document language uses.
#[inline]
pub fn pulse(phase: f64) -> f64 {
    pulse_width(phase, 0.25)
}

/// Pulse wave with an explicit duty width in (0, 1).
#[inline]
pub fn pulse_width(phase: f64, width: f64) -> f64 {
    if phase < width {
        1.0
    } else {
        -1.0
    }
}

/// Tracks oscillator phase across samples.
///
/// [`advance`](PhaseAccumulator::advance) returns the phase *before*
/// stepping it, so the first sample is generated at the initial phase.
#[derive(Debug, Clone)]
pub struct PhaseAccumulator {
    phase: f64,
    sample_rate: f64,
}

impl PhaseAccumulator {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            phase: 0.0,
            sample_rate,
        }
    }

    /// Starts from an initial phase in [0, 1).
    pub fn with_phase(initial_phase: f64, sample_rate: f64) -> Self {
        Self {
            phase: initial_phase.rem_euclid(1.0),
            sample_rate,
        }
    }

    /// Returns the current phase, then advances it by `freq / sample_rate`.
    #[inline]
    pub fn advance(&mut self, freq: f64) -> f64 {
        let phase = self.phase;
        self.phase += freq / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        phase
    }
}
