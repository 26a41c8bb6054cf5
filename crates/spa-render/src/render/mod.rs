//! Render entry points.
//!
//! The top-level render treats the document's sound nodes as one implicit
//! group: each node renders to its own mono buffer, the buffers mix
//! additively from sample zero, and the mix is gained, normalized, and
//! expanded to the requested channel count.

mod container;
mod leaf;

use log::warn;

use spa_doc::{Document, ParseOptions};

use crate::error::RenderResult;
use crate::mixer;

pub use container::{effective_duration, render_node};
pub use leaf::{render_noise, render_tone, resolve_envelope};

/// Options controlling [`render`].
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count; mono content is duplicated across channels.
    pub channels: usize,
    /// Divide by the peak when it exceeds 1.0.
    pub normalize: bool,
    /// Gain applied to the mix before normalization.
    pub master_volume: f64,
    /// Base seed for noise generators.
    pub seed: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            normalize: true,
            master_volume: 1.0,
            seed: 0,
        }
    }
}

/// A rendered PCM buffer with interleaved floating-point samples.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    /// Interleaved samples in [-1, 1] after normalization.
    pub samples: Vec<f64>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl PcmBuffer {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Renders a parsed document to a PCM buffer.
pub fn render(doc: &Document, options: &RenderOptions) -> RenderResult<PcmBuffer> {
    if options.sample_rate == 0 {
        return Err(crate::error::RenderError::invalid_param(
            "sampleRate",
            "must be positive",
        ));
    }
    let sample_rate = options.sample_rate as f64;
    let channels = options.channels.max(1);

    let mut buffers = Vec::with_capacity(doc.nodes.len());
    for (i, node) in doc.nodes.iter().enumerate() {
        buffers.push(render_node(node, doc, sample_rate, options.seed, &[i])?);
    }

    // Single-pass max, then sum; buffers can run to hundreds of thousands
    // of samples.
    let max_len = buffers.iter().map(Vec::len).fold(0, usize::max);
    let mut mix = vec![0.0; max_len];
    for buffer in &buffers {
        mixer::mix_into(&mut mix, buffer, 0);
    }

    if options.master_volume != 1.0 {
        mixer::apply_gain(&mut mix, options.master_volume);
    }

    scrub_non_finite(&mut mix);

    if options.normalize {
        mixer::normalize(&mut mix);
    }

    Ok(PcmBuffer {
        samples: mixer::expand_channels(mix, channels),
        sample_rate: options.sample_rate,
        channels,
    })
}

/// Parses and renders XML text in one call.
pub fn render_str(xml: &str, options: &RenderOptions) -> RenderResult<PcmBuffer> {
    let doc = spa_doc::parse(xml, &ParseOptions::default())?;
    render(&doc, options)
}

/// Replaces non-finite samples with silence so one bad value cannot poison
/// normalization or downstream hosts.
fn scrub_non_finite(samples: &mut [f64]) {
    let mut scrubbed = 0usize;
    for sample in samples.iter_mut() {
        if !sample.is_finite() {
            *sample = 0.0;
            scrubbed += 1;
        }
    }
    if scrubbed > 0 {
        warn!("muted {} non-finite samples in the mix", scrubbed);
    }
}
