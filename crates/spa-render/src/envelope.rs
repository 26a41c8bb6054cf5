//! ADSR envelope applied over a fixed-length buffer.
//!
//! The document language shapes one-shot buffers, so the envelope is
//! computed against the buffer length rather than driven by note-on/off
//! events: attack, decay, and release each claim `floor(time * sr)`
//! samples, sustain absorbs whatever remains, and when the three timed
//! phases overrun the buffer they are truncated in order.

use spa_doc::Adsr;

/// Generates per-sample envelope gains for a buffer of `num_samples`.
pub fn generate(env: &Adsr, sample_rate: f64, num_samples: usize) -> Vec<f64> {
    let attack_len = (env.attack * sample_rate).floor() as usize;
    let decay_len = (env.decay * sample_rate).floor() as usize;
    let release_len = (env.release * sample_rate).floor() as usize;

    // Truncate phases in order when they exceed the buffer.
    let na = attack_len.min(num_samples);
    let nd = decay_len.min(num_samples - na);
    let nr = release_len.min(num_samples - na - nd);
    let ns = num_samples - na - nd - nr;

    let sustain = env.sustain;
    let mut gains = Vec::with_capacity(num_samples);

    for i in 0..na {
        gains.push(i as f64 / attack_len as f64);
    }
    for i in 0..nd {
        gains.push(1.0 - (1.0 - sustain) * (i as f64 / decay_len as f64));
    }
    for _ in 0..ns {
        gains.push(sustain);
    }
    for i in 0..nr {
        gains.push(sustain * (1.0 - i as f64 / release_len as f64));
    }

    gains
}

/// Applies the envelope to `samples` in place.
pub fn apply(samples: &mut [f64], env: &Adsr, sample_rate: f64) {
    let gains = generate(env, sample_rate, samples.len());
    for (sample, gain) in samples.iter_mut().zip(gains.iter()) {
        *sample *= gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 1000.0;

    #[test]
    fn phase_boundaries() {
        // A = 0.1s -> 100 samples, D = 0.1s -> 100, R = 0.1s -> 100,
        // 500 samples total leaves 200 of sustain.
        let env = Adsr::new(0.1, 0.1, 0.5, 0.1);
        let gains = generate(&env, SR, 500);

        assert_eq!(gains.len(), 500);
        assert_eq!(gains[0], 0.0);
        // First decay sample sits at full scale.
        assert_eq!(gains[100], 1.0);
        // First sustain sample sits at the sustain level.
        assert!((gains[200] - 0.5).abs() < 1e-12);
        assert!((gains[350] - 0.5).abs() < 1e-12);
        // Final sample is within one release step of zero.
        assert!(gains[499] <= 0.5 / 100.0 + 1e-12);
    }

    #[test]
    fn attack_ramp_is_linear() {
        let env = Adsr::new(0.1, 0.0, 1.0, 0.0);
        let gains = generate(&env, SR, 200);
        assert!((gains[50] - 0.5).abs() < 1e-12);
        assert!((gains[150] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn release_only_envelope() {
        // Half sustain at full level, half linear fade.
        let env = Adsr::new(0.0, 0.0, 1.0, 0.05);
        let gains = generate(&env, 48000.0, 4800);
        assert_eq!(gains.len(), 4800);
        for &g in &gains[..2400] {
            assert_eq!(g, 1.0);
        }
        assert!(gains[2400] <= 1.0);
        for pair in gains[2400..].windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert!(gains[4799] < 1e-3);
    }

    #[test]
    fn overlong_phases_truncate_in_order() {
        // A + D + R = 0.6s against a 0.3s buffer: no sustain, release
        // squeezed to what remains.
        let env = Adsr::new(0.2, 0.2, 0.5, 0.2);
        let gains = generate(&env, SR, 300);
        assert_eq!(gains.len(), 300);
        // Attack gets its full 200 samples, decay the remaining 100.
        assert!((gains[199] - 199.0 / 200.0).abs() < 1e-12);
        assert_eq!(gains[200], 1.0);
    }

    #[test]
    fn no_negative_gains_when_overlong() {
        let env = Adsr::new(0.0, 0.5, 0.2, 0.5);
        let gains = generate(&env, SR, 300);
        for pair in gains.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-12);
        }
        for &g in &gains {
            assert!(g >= 0.0);
        }
    }

    #[test]
    fn zero_length_buffer() {
        let env = Adsr::new(0.1, 0.1, 0.5, 0.1);
        assert!(generate(&env, SR, 0).is_empty());
    }

    #[test]
    fn apply_scales_in_place() {
        let env = Adsr::new(0.0, 0.0, 0.5, 0.0);
        let mut samples = vec![1.0; 10];
        apply(&mut samples, &env, SR);
        for &s in &samples {
            assert!((s - 0.5).abs() < 1e-12);
        }
    }
}
