//! Repeat expansion.
//!
//! Expands a rendered leaf (or group) buffer into a series of decayed,
//! optionally pitch-shifted copies. Copies mix additively into the
//! destination, so an interval shorter than the buffer overlaps tails
//! rather than cutting them. Expansion is bounded: a computed length that
//! is non-finite, negative, or past [`MAX_EXPANSION_SECONDS`] logs a
//! diagnostic and returns the input unchanged.

use log::warn;

use spa_doc::Repeat;

/// Safety limit on expanded output length, in seconds.
pub const MAX_EXPANSION_SECONDS: f64 = 60.0;

/// Expands `samples` according to the repeat block.
pub fn expand(samples: Vec<f64>, repeat: &Repeat, sample_rate: f64) -> Vec<f64> {
    let len = samples.len();
    let count = repeat.count.resolved() as usize;
    let interval_f = (repeat.interval * sample_rate).floor();
    let delay_f = (repeat.delay * sample_rate).floor();

    if interval_f < 1.0 || count <= 1 || len == 0 {
        return samples;
    }

    // Bounds are checked in floating point before any usize conversion so
    // pathological intervals cannot overflow the arithmetic below.
    let total_f = delay_f + len as f64 + (count as f64 - 1.0) * (len as f64 + interval_f);
    if !total_f.is_finite() || total_f < 0.0 || total_f > MAX_EXPANSION_SECONDS * sample_rate {
        warn!(
            "repeat expansion of {:.0} samples exceeds the {}s limit; skipping",
            total_f, MAX_EXPANSION_SECONDS
        );
        return samples;
    }

    let interval = interval_f as usize;
    let delay = delay_f as usize;
    let total = delay + len + (count - 1) * (len + interval);
    let mut output = vec![0.0; total];

    mix_at(&mut output, &samples, delay);

    let decay = repeat.decay;
    let shift = repeat.pitch_shift.unwrap_or(0.0);

    for k in 1..count {
        let offset = delay + k * (len + interval);
        let gain = (1.0 - decay).powi(k as i32);

        if shift != 0.0 {
            // Nearest-neighbour resample at ratio 2^(shift*k/12).
            let ratio = (shift * k as f64 / 12.0).exp2();
            let copy_len = (len as f64 / ratio).floor() as usize;
            for i in 0..copy_len {
                let dest = offset + i;
                if dest >= total {
                    break;
                }
                let src = (i as f64 * ratio).floor() as usize;
                if src >= len {
                    break;
                }
                output[dest] += samples[src] * gain;
            }
        } else {
            for (i, &sample) in samples.iter().enumerate() {
                let dest = offset + i;
                if dest >= total {
                    break;
                }
                output[dest] += sample * gain;
            }
        }
    }

    output
}

/// Duration in seconds that a repeat block stretches `dur` to, for layout
/// purposes.
///
/// Mirrors the skip conditions of [`expand`] exactly, in the same floored
/// sample domain: an interval that floors to zero samples, a single play,
/// an empty buffer, or a bound violation leaves the base duration
/// unchanged, so a container's layout always matches the buffer the
/// expansion actually produces.
pub fn expanded_duration(dur: f64, block: &Repeat, sample_rate: f64) -> f64 {
    let len = (dur * sample_rate).floor();
    let count = block.count.resolved() as f64;
    let interval = (block.interval * sample_rate).floor();
    let delay = (block.delay * sample_rate).floor();

    if interval < 1.0 || count <= 1.0 || len < 1.0 {
        return dur;
    }

    let total = delay + len + (count - 1.0) * (len + interval);
    if !total.is_finite() || total < 0.0 || total > MAX_EXPANSION_SECONDS * sample_rate {
        return dur;
    }

    total / sample_rate
}

fn mix_at(dest: &mut [f64], src: &[f64], offset: usize) {
    for (i, &sample) in src.iter().enumerate() {
        if let Some(slot) = dest.get_mut(offset + i) {
            *slot += sample;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spa_doc::RepeatCount;

    fn repeat(count: u32, interval: f64) -> Repeat {
        Repeat {
            count: RepeatCount::Finite(count),
            interval,
            delay: 0.0,
            decay: 0.0,
            pitch_shift: None,
        }
    }

    const SR: f64 = 1000.0;

    #[test]
    fn expansion_length() {
        // L = 100, I' = 50, R = 3: total = 100 + 2 * 150 = 400.
        let buffer = vec![1.0; 100];
        let out = expand(buffer, &repeat(3, 0.05), SR);
        assert_eq!(out.len(), 400);
    }

    #[test]
    fn single_count_is_identity() {
        let buffer = vec![0.5; 64];
        let out = expand(buffer.clone(), &repeat(1, 0.1), SR);
        assert_eq!(out, buffer);
    }

    #[test]
    fn zero_interval_is_identity() {
        let buffer = vec![0.5; 64];
        let out = expand(buffer.clone(), &repeat(5, 0.0001), SR);
        assert_eq!(out, buffer);
    }

    #[test]
    fn decay_compounds_per_repetition() {
        let buffer = vec![1.0; 10];
        let mut rep = repeat(3, 0.01);
        rep.decay = 0.5;
        let out = expand(buffer, &rep, SR);

        // Peaks at offsets 0, 20, 40 with gains 1, 0.5, 0.25.
        assert_eq!(out[0], 1.0);
        assert_eq!(out[20], 0.5);
        assert_eq!(out[40], 0.25);
        // Gap samples are silent.
        assert_eq!(out[15], 0.0);
    }

    #[test]
    fn delay_offsets_the_first_play() {
        let buffer = vec![1.0; 10];
        let mut rep = repeat(2, 0.01);
        rep.delay = 0.05;
        let out = expand(buffer, &rep, SR);

        assert_eq!(out.len(), 50 + 10 + 20);
        assert_eq!(out[49], 0.0);
        assert_eq!(out[50], 1.0);
        assert_eq!(out[70], 1.0);
    }

    #[test]
    fn downshifted_copy_is_truncated() {
        // -12 semitones doubles the copy length; samples past the computed
        // total are discarded rather than growing the buffer.
        let buffer = vec![1.0; 100];
        let mut rep = repeat(2, 0.01);
        rep.pitch_shift = Some(-12.0);
        let out = expand(buffer, &rep, SR);

        assert_eq!(out.len(), 100 + 110);
        assert_eq!(out[110], 1.0);
        assert_eq!(out[209], 1.0);
    }

    #[test]
    fn octave_up_halves_the_copy() {
        let buffer: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let mut rep = repeat(2, 0.01);
        rep.pitch_shift = Some(12.0);
        let out = expand(buffer, &rep, SR);

        let offset = 110;
        // Copy reads every other source sample for 50 samples.
        assert_eq!(out[offset], 0.0);
        assert_eq!(out[offset + 1], 2.0);
        assert_eq!(out[offset + 49], 98.0);
        assert_eq!(out[offset + 50], 0.0);
    }

    #[test]
    fn bound_violation_returns_input_unchanged() {
        // 1000 samples repeated 100 times at 1s intervals is far past 60s.
        let buffer = vec![1.0; 1000];
        let out = expand(buffer.clone(), &repeat(100, 1.0), SR);
        assert_eq!(out, buffer);
    }

    #[test]
    fn empty_input_is_identity() {
        let out = expand(Vec::new(), &repeat(3, 0.1), SR);
        assert!(out.is_empty());
    }

    #[test]
    fn layout_duration_matches_expansion() {
        // expanded_duration must agree with expand() sample-for-sample,
        // including every skip condition.
        let mut decayed = repeat(4, 0.02);
        decayed.decay = 0.3;
        decayed.delay = 0.05;
        let cases = [
            (0.1, repeat(3, 0.05)),
            (0.1, repeat(1, 0.05)),
            // interval floors to zero samples at this rate
            (0.1, repeat(5, 0.0001)),
            (0.25, decayed),
            // bound violation
            (1.0, repeat(100, 1.0)),
        ];

        for (dur, rep) in cases {
            let len = (dur * SR) as usize;
            let expanded = expand(vec![1.0; len], &rep, SR);
            let seconds = expanded_duration(dur, &rep, SR);
            assert_eq!(
                expanded.len(),
                (seconds * SR).round() as usize,
                "mismatch for dur {} repeat {:?}",
                dur,
                rep
            );
        }
    }
}
