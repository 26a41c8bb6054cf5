//! Noise colour generators.
//!
//! All colours start from uniform white samples in [-1, 1] drawn from a
//! PCG32 stream and shape the spectrum with cheap time-domain recurrences:
//! a seven-state first-order cascade for pink, a leaky integrator for
//! brown, and first/second differences for blue and violet. Grey reuses the
//! pink generator as an approximation.

use rand::Rng;
use rand_pcg::Pcg32;

use spa_doc::NoiseColor;

#[inline]
fn white_sample(rng: &mut Pcg32) -> f64 {
    rng.gen::<f64>() * 2.0 - 1.0
}

/// Uniform white noise in [-1, 1].
pub fn white(rng: &mut Pcg32, num_samples: usize) -> Vec<f64> {
    (0..num_samples).map(|_| white_sample(rng)).collect()
}

/// Pink noise: six first-order filtered bands plus weighted white, with a
/// 0.11 make-up gain (Voss-McCartney style cascade).
pub fn pink(rng: &mut Pcg32, num_samples: usize) -> Vec<f64> {
    let mut b = [0.0f64; 7];
    let mut output = Vec::with_capacity(num_samples);

    for _ in 0..num_samples {
        let w = white_sample(rng);
        b[0] = 0.99886 * b[0] + w * 0.0555179;
        b[1] = 0.99332 * b[1] + w * 0.0750759;
        b[2] = 0.96900 * b[2] + w * 0.1538520;
        b[3] = 0.86650 * b[3] + w * 0.3104856;
        b[4] = 0.55000 * b[4] + w * 0.5329522;
        b[5] = -0.7616 * b[5] - w * 0.0168980;
        let sum: f64 = b.iter().sum::<f64>() + w * 0.5362;
        b[6] = w * 0.115926;
        output.push(sum * 0.11);
    }

    output
}

/// Brown (red) noise: leaky integrator `y = (y + 0.02*w) / 1.02`, with a
/// 3.5 make-up gain.
pub fn brown(rng: &mut Pcg32, num_samples: usize) -> Vec<f64> {
    let mut y = 0.0f64;
    let mut output = Vec::with_capacity(num_samples);

    for _ in 0..num_samples {
        y = (y + 0.02 * white_sample(rng)) / 1.02;
        output.push(y * 3.5);
    }

    output
}

/// Blue noise: first difference of white, halved.
pub fn blue(rng: &mut Pcg32, num_samples: usize) -> Vec<f64> {
    let mut prev = 0.0f64;
    let mut output = Vec::with_capacity(num_samples);

    for _ in 0..num_samples {
        let w = white_sample(rng);
        output.push((w - prev) * 0.5);
        prev = w;
    }

    output
}

/// Violet (purple) noise: second difference of white, quartered.
pub fn violet(rng: &mut Pcg32, num_samples: usize) -> Vec<f64> {
    let mut w1 = 0.0f64;
    let mut w2 = 0.0f64;
    let mut output = Vec::with_capacity(num_samples);

    for _ in 0..num_samples {
        let w = white_sample(rng);
        output.push((w - 2.0 * w1 + w2) * 0.25);
        w2 = w1;
        w1 = w;
    }

    output
}

/// Generates `num_samples` of the given colour.
pub fn generate(color: NoiseColor, rng: &mut Pcg32, num_samples: usize) -> Vec<f64> {
    match color {
        NoiseColor::White => white(rng, num_samples),
        NoiseColor::Pink => pink(rng, num_samples),
        NoiseColor::Brown => brown(rng, num_samples),
        NoiseColor::Blue => blue(rng, num_samples),
        NoiseColor::Violet => violet(rng, num_samples),
        // True A-weighted grey is not required; pink stands in.
        NoiseColor::Grey => pink(rng, num_samples),
    }
}
