//! SPA document library.
//!
//! SPA documents are XML descriptions of synthetic sound effects: oscillator
//! tones, noise bursts, parallel groups, and timed sequences, each carrying
//! attributes for frequency, duration, amplitude, envelopes, filters, and
//! repetition. This crate owns the text-to-model half of the pipeline:
//!
//! - [`parse`] - XML text into a typed, immutable [`Document`], resolving
//!   `#id` envelope references by default.
//! - [`validate`] - structural and value-range checks over the raw XML,
//!   accumulated into a [`ValidationReport`] without ever failing.
//!
//! Rendering documents into PCM sample buffers lives in the companion
//! `spa-render` crate.
//!
//! # Example
//!
//! ```
//! use spa_doc::{parse, validate, ParseOptions};
//!
//! let xml = r#"<spa version="1.0">
//!     <tone wave="sine" freq="440" dur="0.5"/>
//! </spa>"#;
//!
//! let report = validate(xml);
//! assert!(report.is_valid());
//!
//! let doc = parse(xml, &ParseOptions::default()).unwrap();
//! assert_eq!(doc.nodes.len(), 1);
//! ```

pub mod document;
pub mod error;
pub mod parser;
pub mod validation;

// Re-export commonly used types at the crate root
pub use document::{
    Adsr, Curve, CurveKind, Document, EnvelopeSpec, FilterConfig, FilterType, Group, Noise,
    NoiseColor, Param, Repeat, RepeatCount, Sequence, SoundNode, Tone, Waveform,
    INFINITE_REPEAT_CAP,
};
pub use error::{
    ErrorCode, ParseError, ValidationError, ValidationReport, ValidationWarning, WarningCode,
};
pub use parser::{parse, ParseOptions};
pub use validation::{validate, MAX_REPEAT_SECONDS};
