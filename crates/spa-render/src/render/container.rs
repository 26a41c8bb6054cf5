//! Container rendering: groups, sequences, and node dispatch.

use spa_doc::{Document, Group, Sequence, SoundNode};

use crate::error::{RenderError, RenderResult};
use crate::mixer::mix_into;
use crate::render::leaf::{check_pan, check_repeat, render_noise, render_tone};
use crate::repeat;
use crate::rng::create_node_rng;

/// Renders any sound node to a mono buffer.
///
/// `path` is the chain of child indices from the document root down to
/// this node; noise leaves derive their RNG stream from it.
pub fn render_node(
    node: &SoundNode,
    doc: &Document,
    sample_rate: f64,
    seed: u32,
    path: &[usize],
) -> RenderResult<Vec<f64>> {
    match node {
        SoundNode::Tone(tone) => render_tone(tone, doc, sample_rate),
        SoundNode::Noise(noise) => {
            let mut rng = create_node_rng(seed, path);
            render_noise(noise, doc, sample_rate, &mut rng)
        }
        SoundNode::Group(group) => render_group(group, doc, sample_rate, seed, path),
        SoundNode::Sequence(seq) => render_sequence(seq, doc, sample_rate, seed, path),
    }
}

/// Renders a group: children in parallel from time zero, mixed additively.
///
/// Children's `at` offsets are ignored; groups are parallel by definition.
pub fn render_group(
    group: &Group,
    doc: &Document,
    sample_rate: f64,
    seed: u32,
    path: &[usize],
) -> RenderResult<Vec<f64>> {
    if let Some(amp) = group.amp {
        if !(0.0..=1.0).contains(&amp) {
            return Err(RenderError::invalid_param(
                "group.amp",
                format!("must be within [0, 1], got {}", amp),
            ));
        }
    }
    check_pan("group.pan", group.pan)?;

    let mut buffers = Vec::with_capacity(group.children.len());
    for (i, child) in group.children.iter().enumerate() {
        let child_path = [path, &[i]].concat();
        buffers.push(render_node(child, doc, sample_rate, seed, &child_path)?);
    }

    let max_len = buffers.iter().map(Vec::len).fold(0, usize::max);
    let mut mixed = vec![0.0; max_len];
    for buffer in &buffers {
        mix_into(&mut mixed, buffer, 0);
    }

    if let Some(amp) = group.amp {
        for sample in mixed.iter_mut() {
            *sample *= amp;
        }
    }

    if let Some(block) = &group.repeat {
        check_repeat("group", block)?;
        mixed = repeat::expand(mixed, block, sample_rate);
    }

    Ok(mixed)
}

/// Renders a sequence: children mixed at their `at` offsets.
pub fn render_sequence(
    seq: &Sequence,
    doc: &Document,
    sample_rate: f64,
    seed: u32,
    path: &[usize],
) -> RenderResult<Vec<f64>> {
    if let Some(tempo) = seq.tempo {
        if !tempo.is_finite() || tempo <= 0.0 {
            return Err(RenderError::invalid_param(
                "sequence.tempo",
                format!("must be positive, got {}", tempo),
            ));
        }
    }

    let mut total = 0.0f64;
    for child in &seq.children {
        let at = seq.offset_seconds(child.at());
        if !at.is_finite() || at < 0.0 {
            return Err(RenderError::invalid_param(
                format!("sequence.{}.at", child.tag()),
                "offsets must be non-negative",
            ));
        }
        total = total.max(at + effective_duration(child, sample_rate));
    }

    let total_samples = (total * sample_rate).floor() as usize;
    let mut mixed = vec![0.0; total_samples];

    for (i, child) in seq.children.iter().enumerate() {
        let child_path = [path, &[i]].concat();
        let buffer = render_node(child, doc, sample_rate, seed, &child_path)?;
        let offset = (seq.offset_seconds(child.at()) * sample_rate).floor() as usize;
        // Tails past the allocated length truncate silently.
        mix_into(&mut mixed, &buffer, offset);
    }

    Ok(mixed)
}

/// Duration of a node for sequence layout, in seconds.
///
/// Leaves contribute their `dur`, groups the longest child, nested
/// sequences their own total. A repeat block stretches the duration via
/// [`repeat::expanded_duration`], which applies the same skip conditions
/// as the expansion itself, so the layout matches what the renderer
/// actually produces.
pub fn effective_duration(node: &SoundNode, sample_rate: f64) -> f64 {
    match node {
        SoundNode::Tone(t) => with_repeat(t.dur, &t.repeat, sample_rate),
        SoundNode::Noise(n) => with_repeat(n.dur, &n.repeat, sample_rate),
        SoundNode::Group(g) => {
            let longest = g
                .children
                .iter()
                .map(|child| effective_duration(child, sample_rate))
                .fold(0.0f64, f64::max);
            with_repeat(longest, &g.repeat, sample_rate)
        }
        SoundNode::Sequence(s) => s
            .children
            .iter()
            .map(|child| s.offset_seconds(child.at()) + effective_duration(child, sample_rate))
            .fold(0.0f64, f64::max),
    }
}

fn with_repeat(dur: f64, block: &Option<spa_doc::Repeat>, sample_rate: f64) -> f64 {
    match block {
        Some(block) => repeat::expanded_duration(dur, block, sample_rate),
        None => dur,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spa_doc::{Noise, NoiseColor, Param, Repeat, RepeatCount, Tone, Waveform};
    use std::collections::HashMap;

    fn empty_doc() -> Document {
        Document {
            version: "1.0".to_string(),
            namespace: None,
            defs: HashMap::new(),
            nodes: Vec::new(),
        }
    }

    fn sine_tone(freq: f64, dur: f64, at: Option<f64>) -> SoundNode {
        SoundNode::Tone(Tone {
            wave: Waveform::Sine,
            freq: Param::Scalar(freq),
            dur,
            amp: None,
            envelope: None,
            pan: None,
            filter: None,
            phase: None,
            repeat: None,
            at,
        })
    }

    const SR: f64 = 48000.0;

    #[test]
    fn group_takes_longest_child() {
        let group = Group {
            children: vec![sine_tone(440.0, 0.1, None), sine_tone(880.0, 0.2, None)],
            amp: None,
            pan: None,
            repeat: None,
            at: None,
        };
        let doc = empty_doc();
        let mixed = render_group(&group, &doc, SR, 0, &[0]).unwrap();
        assert_eq!(mixed.len(), 9600);
    }

    #[test]
    fn group_mix_is_additive() {
        let group = Group {
            children: vec![sine_tone(440.0, 0.05, None), sine_tone(440.0, 0.05, None)],
            amp: None,
            pan: None,
            repeat: None,
            at: None,
        };
        let doc = empty_doc();
        let mixed = render_group(&group, &doc, SR, 0, &[0]).unwrap();
        let single = render_node(&sine_tone(440.0, 0.05, None), &doc, SR, 0, &[0]).unwrap();
        for (m, s) in mixed.iter().zip(single.iter()) {
            assert!((m - 2.0 * s).abs() < 1e-12);
        }
    }

    #[test]
    fn group_ignores_child_offsets() {
        let group = Group {
            children: vec![sine_tone(440.0, 0.1, Some(5.0))],
            amp: None,
            pan: None,
            repeat: None,
            at: None,
        };
        let doc = empty_doc();
        let mixed = render_group(&group, &doc, SR, 0, &[0]).unwrap();
        assert_eq!(mixed.len(), 4800);
    }

    #[test]
    fn group_amp_scales_the_mix() {
        let group = Group {
            children: vec![sine_tone(440.0, 0.05, None)],
            amp: Some(0.25),
            pan: None,
            repeat: None,
            at: None,
        };
        let doc = empty_doc();
        let mixed = render_group(&group, &doc, SR, 0, &[0]).unwrap();
        let single = render_node(&sine_tone(440.0, 0.05, None), &doc, SR, 0, &[0]).unwrap();
        for (m, s) in mixed.iter().zip(single.iter()) {
            assert!((m - 0.25 * s).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_group_renders_empty() {
        let group = Group {
            children: Vec::new(),
            amp: None,
            pan: None,
            repeat: None,
            at: None,
        };
        let doc = empty_doc();
        assert!(render_group(&group, &doc, SR, 0, &[0]).unwrap().is_empty());
    }

    #[test]
    fn sequence_lays_children_end_to_end() {
        let seq = Sequence {
            children: vec![
                sine_tone(440.0, 0.1, Some(0.0)),
                sine_tone(880.0, 0.1, Some(0.1)),
            ],
            tempo: None,
            at: None,
        };
        let doc = empty_doc();
        let mixed = render_sequence(&seq, &doc, SR, 0, &[0]).unwrap();
        assert_eq!(mixed.len(), 9600);

        let first = render_node(&sine_tone(440.0, 0.1, None), &doc, SR, 0, &[0]).unwrap();
        let second = render_node(&sine_tone(880.0, 0.1, None), &doc, SR, 0, &[0]).unwrap();
        for i in 0..4800 {
            assert!((mixed[i] - first[i]).abs() < 1e-12);
            assert!((mixed[4800 + i] - second[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn sequence_tempo_scales_offsets() {
        // 2 beats at 120 bpm = 1 second.
        let seq = Sequence {
            children: vec![sine_tone(440.0, 0.5, Some(2.0))],
            tempo: Some(120.0),
            at: None,
        };
        let doc = empty_doc();
        let mixed = render_sequence(&seq, &doc, SR, 0, &[0]).unwrap();
        assert_eq!(mixed.len(), (1.5 * SR) as usize);
        // The first second is silence.
        for &s in &mixed[..48000] {
            assert_eq!(s, 0.0);
        }
    }

    #[test]
    fn sequence_rejects_negative_offsets() {
        let seq = Sequence {
            children: vec![sine_tone(440.0, 0.1, Some(-0.5))],
            tempo: None,
            at: None,
        };
        let doc = empty_doc();
        assert!(render_sequence(&seq, &doc, SR, 0, &[0]).is_err());
    }

    #[test]
    fn nested_sequence_duration() {
        let inner = SoundNode::Sequence(Sequence {
            children: vec![sine_tone(440.0, 0.25, Some(0.25))],
            tempo: None,
            at: Some(0.5),
        });
        let seq = Sequence {
            children: vec![inner],
            tempo: None,
            at: None,
        };
        let doc = empty_doc();
        let mixed = render_sequence(&seq, &doc, SR, 0, &[0]).unwrap();
        // 0.5 offset + (0.25 + 0.25) inner total
        assert_eq!(mixed.len(), 48000);
    }

    #[test]
    fn repeat_extends_layout_duration() {
        let node = SoundNode::Tone(Tone {
            wave: Waveform::Sine,
            freq: Param::Scalar(440.0),
            dur: 0.1,
            amp: None,
            envelope: None,
            pan: None,
            filter: None,
            phase: None,
            repeat: Some(Repeat {
                count: RepeatCount::Finite(3),
                interval: 0.1,
                delay: 0.05,
                decay: 0.0,
                pitch_shift: None,
            }),
            at: None,
        });
        // 0.05 + 0.1 + 2 * 0.2
        assert!((effective_duration(&node, SR) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn bounded_out_repeat_does_not_extend_layout() {
        let node = SoundNode::Noise(Noise {
            color: NoiseColor::White,
            dur: 1.0,
            amp: None,
            envelope: None,
            pan: None,
            filter: None,
            repeat: Some(Repeat {
                count: RepeatCount::Infinite,
                interval: 1.0,
                delay: 0.0,
                decay: 0.0,
                pitch_shift: None,
            }),
            at: None,
        });
        assert!((effective_duration(&node, SR) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sub_sample_interval_does_not_extend_layout() {
        // An interval that floors to zero samples makes the expansion a
        // no-op, so the layout must stay at the base duration too.
        let tone = |repeat| {
            SoundNode::Tone(Tone {
                wave: Waveform::Sine,
                freq: Param::Scalar(440.0),
                dur: 0.1,
                amp: None,
                envelope: None,
                pan: None,
                filter: None,
                phase: None,
                repeat,
                at: Some(0.0),
            })
        };
        let repeat = Repeat {
            count: RepeatCount::Finite(5),
            interval: 0.00001,
            delay: 0.0,
            decay: 0.0,
            pitch_shift: None,
        };
        assert!((effective_duration(&tone(Some(repeat)), SR) - 0.1).abs() < 1e-12);

        let seq = Sequence {
            children: vec![tone(Some(repeat))],
            tempo: None,
            at: None,
        };
        let doc = empty_doc();
        let mixed = render_sequence(&seq, &doc, SR, 0, &[0]).unwrap();
        let child = render_node(&tone(Some(repeat)), &doc, SR, 0, &[0, 0]).unwrap();
        assert_eq!(mixed.len(), child.len());
    }

    #[test]
    fn siblings_get_distinct_noise_streams() {
        let noise = |_: usize| {
            SoundNode::Noise(Noise {
                color: NoiseColor::White,
                dur: 0.01,
                amp: None,
                envelope: None,
                pan: None,
                filter: None,
                repeat: None,
                at: None,
            })
        };
        let group = Group {
            children: vec![noise(0), noise(1)],
            amp: None,
            pan: None,
            repeat: None,
            at: None,
        };
        let doc = empty_doc();
        let mixed = render_group(&group, &doc, SR, 42, &[0]).unwrap();
        let single = render_node(&noise(0), &doc, SR, 42, &[0, 0]).unwrap();
        // If both children shared a stream the mix would be exactly twice
        // one of them.
        let doubled: Vec<f64> = single.iter().map(|s| s * 2.0).collect();
        assert_ne!(mixed, doubled);
    }
}
