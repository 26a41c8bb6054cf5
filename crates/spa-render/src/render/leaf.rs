//! Leaf rendering: tones and noise bursts.
//!
//! A leaf renders to a mono buffer of `floor(dur * sample_rate)` samples
//! through the fixed pipeline: source (oscillator or noise), envelope,
//! amplitude, filter, repeat. Pan and `at` belong to the enclosing
//! container and never touch the leaf buffer.
//!
//! Range checks here mirror the validator; a document that validates
//! cleanly cannot fail in this module.

use rand_pcg::Pcg32;

use spa_doc::{Adsr, Document, EnvelopeSpec, FilterConfig, Noise, Param, Repeat, Tone};

use crate::automation::{curve_value, progress};
use crate::error::{RenderError, RenderResult};
use crate::oscillator::{self, PhaseAccumulator};
use crate::{envelope, filter, noise, repeat};

/// Renders a tone to a mono buffer.
pub fn render_tone(tone: &Tone, doc: &Document, sample_rate: f64) -> RenderResult<Vec<f64>> {
    check_dur("tone.dur", tone.dur)?;
    check_positive("tone.freq", &tone.freq)?;
    if let Some(phase) = tone.phase {
        if !(0.0..1.0).contains(&phase) {
            return Err(RenderError::invalid_param(
                "tone.phase",
                "must be within [0, 1)",
            ));
        }
    }
    check_pan("tone.pan", tone.pan)?;

    let num_samples = (tone.dur * sample_rate).floor() as usize;
    let mut samples = Vec::with_capacity(num_samples);
    let initial_phase = tone.phase.unwrap_or(0.0);

    match &tone.freq {
        Param::Scalar(freq) => {
            // Closed-form phase avoids accumulation drift; i * freq stays an
            // exact integer so period boundaries land on the right sample.
            for i in 0..num_samples {
                let phase = (initial_phase + i as f64 * freq / sample_rate).fract();
                samples.push(oscillator::sample(tone.wave, phase));
            }
        }
        Param::Curve(curve) => {
            // Advancing the phase by the instantaneous step keeps the sweep
            // phase-continuous.
            let mut acc = PhaseAccumulator::with_phase(initial_phase, sample_rate);
            for i in 0..num_samples {
                let freq = curve_value(curve, progress(i, num_samples));
                samples.push(oscillator::sample(tone.wave, acc.advance(freq)));
            }
        }
    }

    finish_leaf(
        samples,
        "tone",
        tone.envelope.as_ref(),
        tone.amp.as_ref(),
        tone.filter.as_ref(),
        tone.repeat.as_ref(),
        doc,
        sample_rate,
    )
}

/// Renders a noise burst to a mono buffer.
pub fn render_noise(
    noise_leaf: &Noise,
    doc: &Document,
    sample_rate: f64,
    rng: &mut Pcg32,
) -> RenderResult<Vec<f64>> {
    check_dur("noise.dur", noise_leaf.dur)?;
    check_pan("noise.pan", noise_leaf.pan)?;

    let num_samples = (noise_leaf.dur * sample_rate).floor() as usize;
    let samples = noise::generate(noise_leaf.color, rng, num_samples);

    finish_leaf(
        samples,
        "noise",
        noise_leaf.envelope.as_ref(),
        noise_leaf.amp.as_ref(),
        noise_leaf.filter.as_ref(),
        noise_leaf.repeat.as_ref(),
        doc,
        sample_rate,
    )
}

/// The shared tail of the leaf pipeline: envelope, amplitude, filter,
/// repeat.
#[allow(clippy::too_many_arguments)]
fn finish_leaf(
    mut samples: Vec<f64>,
    element: &str,
    env: Option<&EnvelopeSpec>,
    amp: Option<&Param>,
    filter_config: Option<&FilterConfig>,
    repeat_block: Option<&Repeat>,
    doc: &Document,
    sample_rate: f64,
) -> RenderResult<Vec<f64>> {
    if let Some(spec) = env {
        let adsr = resolve_envelope(spec, doc)?;
        check_adsr(element, &adsr)?;
        envelope::apply(&mut samples, &adsr, sample_rate);
    }

    if let Some(amp) = amp {
        check_unit(&format!("{}.amp", element), amp)?;
        match amp {
            Param::Scalar(gain) => {
                for sample in samples.iter_mut() {
                    *sample *= gain;
                }
            }
            Param::Curve(curve) => {
                let total = samples.len();
                for (i, sample) in samples.iter_mut().enumerate() {
                    *sample *= curve_value(curve, progress(i, total));
                }
            }
        }
    }

    if let Some(config) = filter_config {
        check_filter(element, config)?;
        filter::apply(&mut samples, config, sample_rate);
    }

    if let Some(block) = repeat_block {
        check_repeat(element, block)?;
        samples = repeat::expand(samples, block, sample_rate);
    }

    Ok(samples)
}

/// Resolves an envelope spec to concrete ADSR values.
///
/// References normally disappear at parse time; one surviving here means
/// resolution was disabled, so the lookup happens against `defs` now.
pub fn resolve_envelope(spec: &EnvelopeSpec, doc: &Document) -> RenderResult<Adsr> {
    match spec {
        EnvelopeSpec::Inline(adsr) => Ok(*adsr),
        EnvelopeSpec::Ref(id) => doc
            .envelope(id)
            .copied()
            .ok_or_else(|| RenderError::UnresolvedReference { id: id.clone() }),
    }
}

fn check_dur(name: &str, dur: f64) -> RenderResult<()> {
    if !dur.is_finite() || dur <= 0.0 {
        return Err(RenderError::invalid_param(
            name,
            format!("must be a positive number of seconds, got {}", dur),
        ));
    }
    Ok(())
}

fn check_positive(name: &str, param: &Param) -> RenderResult<()> {
    for value in [param.start(), param.end()] {
        if !value.is_finite() || value <= 0.0 {
            return Err(RenderError::invalid_param(
                name,
                format!("must be positive, got {}", value),
            ));
        }
    }
    Ok(())
}

fn check_unit(name: &str, param: &Param) -> RenderResult<()> {
    for value in [param.start(), param.end()] {
        if !(0.0..=1.0).contains(&value) {
            return Err(RenderError::invalid_param(
                name,
                format!("must be within [0, 1], got {}", value),
            ));
        }
    }
    Ok(())
}

pub(crate) fn check_pan(name: &str, pan: Option<f64>) -> RenderResult<()> {
    if let Some(pan) = pan {
        if !(-1.0..=1.0).contains(&pan) {
            return Err(RenderError::invalid_param(
                name,
                format!("must be within [-1, 1], got {}", pan),
            ));
        }
    }
    Ok(())
}

fn check_adsr(element: &str, adsr: &Adsr) -> RenderResult<()> {
    if adsr.attack < 0.0 || adsr.decay < 0.0 || adsr.release < 0.0 {
        return Err(RenderError::invalid_param(
            format!("{}.envelope", element),
            "times must be non-negative",
        ));
    }
    if !(0.0..=1.0).contains(&adsr.sustain) {
        return Err(RenderError::invalid_param(
            format!("{}.envelope", element),
            "sustain must be within [0, 1]",
        ));
    }
    Ok(())
}

fn check_filter(element: &str, config: &FilterConfig) -> RenderResult<()> {
    check_positive(&format!("{}.cutoff", element), &config.cutoff)?;
    for value in [config.resonance.start(), config.resonance.end()] {
        if !(value >= 0.1) {
            return Err(RenderError::invalid_param(
                format!("{}.resonance", element),
                format!("must be at least 0.1, got {}", value),
            ));
        }
    }
    Ok(())
}

pub(crate) fn check_repeat(element: &str, block: &Repeat) -> RenderResult<()> {
    if !block.interval.is_finite() || block.interval <= 0.0 {
        return Err(RenderError::invalid_param(
            format!("{}.repeat.interval", element),
            "must be positive",
        ));
    }
    if !block.delay.is_finite() || block.delay < 0.0 {
        return Err(RenderError::invalid_param(
            format!("{}.repeat.delay", element),
            "must be non-negative",
        ));
    }
    if !(0.0..1.0).contains(&block.decay) {
        return Err(RenderError::invalid_param(
            format!("{}.repeat.decay", element),
            "must be within [0, 1)",
        ));
    }
    if let Some(shift) = block.pitch_shift {
        if !(-12.0..=12.0).contains(&shift) {
            return Err(RenderError::invalid_param(
                format!("{}.repeat.pitchShift", element),
                "must be within [-12, 12] semitones",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;
    use spa_doc::{Curve, CurveKind, NoiseColor, Waveform};
    use std::collections::HashMap;

    fn empty_doc() -> Document {
        Document {
            version: "1.0".to_string(),
            namespace: None,
            defs: HashMap::new(),
            nodes: Vec::new(),
        }
    }

    fn sine_tone(freq: f64, dur: f64) -> Tone {
        Tone {
            wave: Waveform::Sine,
            freq: Param::Scalar(freq),
            dur,
            amp: None,
            envelope: None,
            pan: None,
            filter: None,
            phase: None,
            repeat: None,
            at: None,
        }
    }

    #[test]
    fn tone_sample_count() {
        let doc = empty_doc();
        let samples = render_tone(&sine_tone(440.0, 0.1), &doc, 48000.0).unwrap();
        assert_eq!(samples.len(), 4800);
        assert_eq!(samples[0], 0.0);
        for &s in &samples {
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn sub_sample_duration_renders_nothing() {
        let doc = empty_doc();
        let samples = render_tone(&sine_tone(440.0, 1.0 / 96000.0), &doc, 48000.0).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn square_tone_shape() {
        let doc = empty_doc();
        let mut tone = sine_tone(1000.0, 0.001);
        tone.wave = Waveform::Square;
        let samples = render_tone(&tone, &doc, 48000.0).unwrap();

        assert_eq!(samples.len(), 48);
        for &s in &samples[..24] {
            assert_eq!(s, 1.0);
        }
        for &s in &samples[24..] {
            assert_eq!(s, -1.0);
        }
    }

    #[test]
    fn scalar_amp_scales() {
        let doc = empty_doc();
        let mut tone = sine_tone(440.0, 0.05);
        let reference = render_tone(&tone, &doc, 48000.0).unwrap();
        tone.amp = Some(Param::Scalar(0.5));
        let scaled = render_tone(&tone, &doc, 48000.0).unwrap();

        for (r, s) in reference.iter().zip(scaled.iter()) {
            assert!((r * 0.5 - s).abs() < 1e-12);
        }
    }

    #[test]
    fn amp_curve_fades_in() {
        let doc = empty_doc();
        let mut tone = sine_tone(440.0, 0.1);
        tone.amp = Some(Param::Curve(Curve::new(0.0, 1.0, CurveKind::Linear)));
        let samples = render_tone(&tone, &doc, 48000.0).unwrap();
        assert_eq!(samples[0], 0.0);
    }

    #[test]
    fn envelope_reference_resolves_against_defs() {
        let mut doc = empty_doc();
        doc.defs
            .insert("tail".to_string(), Adsr::new(0.0, 0.0, 1.0, 0.05));
        let mut tone = sine_tone(440.0, 0.1);
        tone.envelope = Some(EnvelopeSpec::Ref("tail".to_string()));
        assert!(render_tone(&tone, &doc, 48000.0).is_ok());

        tone.envelope = Some(EnvelopeSpec::Ref("missing".to_string()));
        let err = render_tone(&tone, &doc, 48000.0).unwrap_err();
        assert!(matches!(err, RenderError::UnresolvedReference { .. }));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let doc = empty_doc();

        let err = render_tone(&sine_tone(0.0, 0.1), &doc, 48000.0).unwrap_err();
        assert!(matches!(err, RenderError::InvalidParameter { .. }));

        let err = render_tone(&sine_tone(440.0, -0.1), &doc, 48000.0).unwrap_err();
        assert!(matches!(err, RenderError::InvalidParameter { .. }));

        let mut tone = sine_tone(440.0, 0.1);
        tone.phase = Some(1.0);
        assert!(render_tone(&tone, &doc, 48000.0).is_err());

        let mut tone = sine_tone(440.0, 0.1);
        tone.amp = Some(Param::Scalar(1.5));
        assert!(render_tone(&tone, &doc, 48000.0).is_err());
    }

    #[test]
    fn initial_phase_offsets_the_oscillator() {
        let doc = empty_doc();
        let mut tone = sine_tone(440.0, 0.01);
        tone.phase = Some(0.25);
        let samples = render_tone(&tone, &doc, 48000.0).unwrap();
        assert!((samples[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn frequency_sweep_is_phase_continuous() {
        let doc = empty_doc();
        let mut tone = sine_tone(440.0, 0.1);
        tone.freq = Param::Curve(Curve::new(220.0, 880.0, CurveKind::Exp));
        let samples = render_tone(&tone, &doc, 48000.0).unwrap();

        // A phase-continuous sine never jumps more than the largest
        // per-sample increment allows.
        let max_delta = 2.0 * std::f64::consts::PI * 880.0 / 48000.0;
        for pair in samples.windows(2) {
            assert!((pair[1] - pair[0]).abs() <= max_delta + 1e-9);
        }
    }

    #[test]
    fn noise_sample_count_and_range() {
        let doc = empty_doc();
        let leaf = Noise {
            color: NoiseColor::White,
            dur: 0.01,
            amp: None,
            envelope: None,
            pan: None,
            filter: None,
            repeat: None,
            at: None,
        };
        let mut rng = create_rng(42);
        let samples = render_noise(&leaf, &doc, 48000.0, &mut rng).unwrap();
        assert_eq!(samples.len(), 480);
        for &s in &samples {
            assert!((-1.0..=1.0).contains(&s));
        }
    }
}
