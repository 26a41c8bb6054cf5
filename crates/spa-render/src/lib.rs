//! SPA renderer.
//!
//! Synthesizes parsed SPA documents (see the `spa-doc` crate) into PCM
//! sample buffers. Rendering is synchronous and single-threaded: one call
//! to [`render`] walks the document tree, synthesizes each leaf through
//! the oscillator/noise to envelope to amplitude to filter to repeat pipeline,
//! composites containers, and returns an owned buffer. No state survives
//! the call; filter state, oscillator phase, and PRNG streams are local to
//! a single leaf.
//!
//! # Example
//!
//! ```
//! use spa_render::{render_str, RenderOptions};
//!
//! let xml = r#"<spa version="1.0">
//!     <tone wave="sine" freq="440" dur="0.25"/>
//! </spa>"#;
//!
//! let buffer = render_str(xml, &RenderOptions::default()).unwrap();
//! assert_eq!(buffer.frames(), 12000);
//! assert_eq!(buffer.channels, 2);
//! ```
//!
//! # Determinism
//!
//! Noise generators draw from PCG32 streams seeded per leaf from the
//! render seed and the leaf's position in the tree, so the same document,
//! options, and seed always produce the same buffer.
//!
//! # Crate structure
//!
//! - [`oscillator`] - waveform functions and phase accumulation
//! - [`noise`] - noise colour generators
//! - [`envelope`] - fixed-length ADSR
//! - [`filter`] - RBJ biquads, static and swept
//! - [`automation`] - curve evaluation
//! - [`repeat`] - bounded repeat expansion
//! - [`mixer`] - mixing, normalization, channel expansion
//! - [`render`] / [`render_str`] - entry points

pub mod automation;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod mixer;
pub mod noise;
pub mod oscillator;
mod render;
pub mod repeat;
pub mod rng;

// Re-export main types at the crate root
pub use error::{RenderError, RenderResult};
pub use render::{
    effective_duration, render, render_node, render_noise, render_str, render_tone,
    resolve_envelope, PcmBuffer, RenderOptions,
};
