//! Typed document model.
//!
//! A [`Document`] is the parsed form of an SPA XML file: a version string,
//! an optional envelope definitions table, and an ordered list of top-level
//! sound nodes. Documents are immutable after parsing; the renderer only
//! reads them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Number of repetitions the `infinite` repeat token expands to.
pub const INFINITE_REPEAT_CAP: u32 = 100;

/// A complete SPA document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Value of the root `version` attribute.
    pub version: String,
    /// Namespace URI from `xmlns`, preserved but not interpreted.
    pub namespace: Option<String>,
    /// Envelope definitions collected from `defs` elements, keyed by `id`.
    pub defs: HashMap<String, Adsr>,
    /// Top-level sound nodes in document order.
    pub nodes: Vec<SoundNode>,
}

impl Document {
    /// Looks up an envelope definition by id (without the `#` prefix).
    pub fn envelope(&self, id: &str) -> Option<&Adsr> {
        self.defs.get(id)
    }
}

/// A sound node: the closed sum the renderer dispatches on.
#[derive(Debug, Clone, PartialEq)]
pub enum SoundNode {
    Tone(Tone),
    Noise(Noise),
    Group(Group),
    Sequence(Sequence),
}

impl SoundNode {
    /// Start offset in seconds (beats when the enclosing sequence has a
    /// tempo). Only sequences consult this; groups play children from zero.
    pub fn at(&self) -> f64 {
        match self {
            SoundNode::Tone(t) => t.at.unwrap_or(0.0),
            SoundNode::Noise(n) => n.at.unwrap_or(0.0),
            SoundNode::Group(g) => g.at.unwrap_or(0.0),
            SoundNode::Sequence(s) => s.at.unwrap_or(0.0),
        }
    }

    /// Element name for error paths.
    pub fn tag(&self) -> &'static str {
        match self {
            SoundNode::Tone(_) => "tone",
            SoundNode::Noise(_) => "noise",
            SoundNode::Group(_) => "group",
            SoundNode::Sequence(_) => "sequence",
        }
    }
}

/// An oscillator tone leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    pub wave: Waveform,
    /// Frequency in Hz, scalar or swept.
    pub freq: Param,
    /// Duration in seconds.
    pub dur: f64,
    /// Linear amplitude in [0, 1], scalar or automated.
    pub amp: Option<Param>,
    pub envelope: Option<EnvelopeSpec>,
    /// Stereo pan in [-1, 1].
    pub pan: Option<f64>,
    pub filter: Option<FilterConfig>,
    /// Initial oscillator phase in [0, 1).
    pub phase: Option<f64>,
    pub repeat: Option<Repeat>,
    pub at: Option<f64>,
}

/// A noise generator leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Noise {
    pub color: NoiseColor,
    pub dur: f64,
    pub amp: Option<Param>,
    pub envelope: Option<EnvelopeSpec>,
    pub pan: Option<f64>,
    pub filter: Option<FilterConfig>,
    pub repeat: Option<Repeat>,
    pub at: Option<f64>,
}

/// A parallel container: children start together and mix additively.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub children: Vec<SoundNode>,
    /// Scalar amplitude applied to the mixed buffer.
    pub amp: Option<f64>,
    pub pan: Option<f64>,
    pub repeat: Option<Repeat>,
    pub at: Option<f64>,
}

/// A timed container: children start at their `at` offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub children: Vec<SoundNode>,
    /// Beats per minute; when set, child `at` values are beat counts.
    pub tempo: Option<f64>,
    pub at: Option<f64>,
}

impl Sequence {
    /// Converts a child `at` value to seconds, honouring tempo.
    pub fn offset_seconds(&self, at: f64) -> f64 {
        match self.tempo {
            Some(bpm) => at * (60.0 / bpm),
            None => at,
        }
    }
}

/// Oscillator waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Saw,
    Pulse,
}

impl Waveform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Saw => "saw",
            Waveform::Pulse => "pulse",
        }
    }
}

impl FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "triangle" => Ok(Waveform::Triangle),
            "saw" | "sawtooth" => Ok(Waveform::Saw),
            "pulse" => Ok(Waveform::Pulse),
            _ => Err(format!("unknown waveform: {}", s)),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Noise colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoiseColor {
    White,
    Pink,
    Brown,
    Blue,
    Violet,
    Grey,
}

impl NoiseColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseColor::White => "white",
            NoiseColor::Pink => "pink",
            NoiseColor::Brown => "brown",
            NoiseColor::Blue => "blue",
            NoiseColor::Violet => "violet",
            NoiseColor::Grey => "grey",
        }
    }
}

impl FromStr for NoiseColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "white" => Ok(NoiseColor::White),
            "pink" => Ok(NoiseColor::Pink),
            "brown" | "red" => Ok(NoiseColor::Brown),
            "blue" => Ok(NoiseColor::Blue),
            "violet" | "purple" => Ok(NoiseColor::Violet),
            "grey" | "gray" => Ok(NoiseColor::Grey),
            _ => Err(format!("unknown noise color: {}", s)),
        }
    }
}

impl fmt::Display for NoiseColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parameter value: either a plain scalar or an automation curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Param {
    Scalar(f64),
    Curve(Curve),
}

impl Param {
    /// The value at progress 0, for range validation.
    pub fn start(&self) -> f64 {
        match self {
            Param::Scalar(v) => *v,
            Param::Curve(c) => c.start,
        }
    }

    /// The value at progress 1.
    pub fn end(&self) -> f64 {
        match self {
            Param::Scalar(v) => *v,
            Param::Curve(c) => c.end,
        }
    }

    pub fn is_curve(&self) -> bool {
        matches!(self, Param::Curve(_))
    }
}

/// Interpolation between a start and end value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    pub start: f64,
    pub end: f64,
    pub kind: CurveKind,
}

impl Curve {
    pub fn new(start: f64, end: f64, kind: CurveKind) -> Self {
        Self { start, end, kind }
    }
}

/// Automation curve kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveKind {
    Linear,
    Exp,
    Log,
    Smooth,
    EaseIn,
    EaseOut,
    Step,
}

impl FromStr for CurveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(CurveKind::Linear),
            "exp" => Ok(CurveKind::Exp),
            "log" => Ok(CurveKind::Log),
            "smooth" => Ok(CurveKind::Smooth),
            "ease-in" => Ok(CurveKind::EaseIn),
            "ease-out" => Ok(CurveKind::EaseOut),
            "step" => Ok(CurveKind::Step),
            _ => Err(format!("unknown curve kind: {}", s)),
        }
    }
}

/// An ADSR amplitude envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level in [0, 1].
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Adsr {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }
}

impl FromStr for Adsr {
    type Err = String;

    /// Parses the inline `attack,decay,sustain,release` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!(
                "envelope must be four comma-separated numbers, got '{}'",
                s
            ));
        }
        let mut values = [0.0f64; 4];
        for (i, part) in parts.iter().enumerate() {
            values[i] = part
                .parse::<f64>()
                .map_err(|_| format!("malformed envelope component '{}'", part))?;
        }
        Ok(Adsr::new(values[0], values[1], values[2], values[3]))
    }
}

impl fmt::Display for Adsr {
    /// Writes the inline form back out; round-trips with [`FromStr`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.attack, self.decay, self.sustain, self.release
        )
    }
}

/// An envelope as written: inline values, or a `#id` reference.
///
/// With reference resolution enabled (the default), the parser replaces
/// `Ref` with the looked-up `Inline` form, so the renderer normally never
/// sees a reference.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeSpec {
    Inline(Adsr),
    /// Reference id without the leading `#`.
    Ref(String),
}

/// Biquad filter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Lowpass => "lowpass",
            FilterType::Highpass => "highpass",
            FilterType::Bandpass => "bandpass",
        }
    }
}

impl FromStr for FilterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lowpass" => Ok(FilterType::Lowpass),
            "highpass" => Ok(FilterType::Highpass),
            "bandpass" => Ok(FilterType::Bandpass),
            _ => Err(format!("unknown filter type: {}", s)),
        }
    }
}

/// Filter configuration for a leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub kind: FilterType,
    /// Cutoff (or centre) frequency in Hz, scalar or automated.
    pub cutoff: Param,
    /// Resonance / Q, at least 0.1; defaults to 1.0.
    pub resonance: Param,
    /// Gain in dB; accepted but inert for the three supported types.
    pub gain_db: Option<f64>,
    /// Cutoff detune in cents.
    pub detune: Option<f64>,
}

/// Repeat count: a positive integer or the `infinite` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatCount {
    Finite(u32),
    Infinite,
}

impl RepeatCount {
    /// The concrete repetition count, with `infinite` capped.
    pub fn resolved(&self) -> u32 {
        match self {
            RepeatCount::Finite(n) => *n,
            RepeatCount::Infinite => INFINITE_REPEAT_CAP,
        }
    }
}

impl FromStr for RepeatCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "infinite" {
            return Ok(RepeatCount::Infinite);
        }
        match s.parse::<u32>() {
            Ok(n) if n > 0 => Ok(RepeatCount::Finite(n)),
            _ => Err(format!(
                "repeat count must be a positive integer or 'infinite', got '{}'",
                s
            )),
        }
    }
}

/// Repeat block: re-trigger a rendered buffer at a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Repeat {
    pub count: RepeatCount,
    /// Gap between repetitions in seconds.
    pub interval: f64,
    /// Silence before the first play, in seconds.
    pub delay: f64,
    /// Linear amplitude loss per repetition, in [0, 1).
    pub decay: f64,
    /// Semitone shift per repetition (tones only), in [-12, 12].
    pub pitch_shift: Option<f64>,
}
