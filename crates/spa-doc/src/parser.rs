//! XML text to typed [`Document`] conversion.
//!
//! The parser aborts on the first fatal problem (malformed XML, missing
//! required attribute, malformed number, unknown enum value); accumulating
//! diagnostics over a whole document is the validator's job.

use std::borrow::Cow;
use std::collections::HashMap;

use roxmltree::Node;

use crate::document::{
    Adsr, Curve, CurveKind, Document, EnvelopeSpec, FilterConfig, FilterType, Group, Noise,
    NoiseColor, Param, Repeat, RepeatCount, Sequence, SoundNode, Tone, Waveform,
};
use crate::error::ParseError;

/// Options controlling [`parse`].
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Replace `#id` envelope references with their `defs` entries.
    pub resolve_references: bool,
    /// Strip XML comments before parsing.
    pub allow_comments: bool,
    /// Reserved.
    pub strict: bool,
    /// Reserved.
    pub validate: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            resolve_references: true,
            allow_comments: true,
            strict: false,
            validate: false,
        }
    }
}

/// Parses SPA XML text into a [`Document`].
pub fn parse(xml: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    let text = if options.allow_comments {
        strip_comments(xml)
    } else {
        Cow::Borrowed(xml)
    };

    let tree = roxmltree::Document::parse(&text)?;
    let root = tree.root_element();

    if root.tag_name().name() != "spa" {
        return Err(ParseError::InvalidRoot {
            found: root.tag_name().name().to_string(),
        });
    }

    let version = root
        .attribute("version")
        .ok_or(ParseError::MissingVersion)?
        .to_string();

    let namespace = root
        .tag_name()
        .namespace()
        .or_else(|| root.attribute("xmlns"))
        .map(str::to_string);

    // Definitions are collected over the whole tree first so a reference may
    // appear before its defs block.
    let defs = collect_defs(root)?;

    let mut nodes = Vec::new();
    for child in root.children().filter(Node::is_element) {
        if let Some(node) = parse_sound_node(child, &defs, options)? {
            nodes.push(node);
        }
    }

    Ok(Document {
        version,
        namespace,
        defs,
        nodes,
    })
}

/// Removes `<!-- ... -->` spans. An unterminated comment is left in place
/// for the XML parser to report.
pub(crate) fn strip_comments(xml: &str) -> Cow<'_, str> {
    if !xml.contains("<!--") {
        return Cow::Borrowed(xml);
    }
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        match rest[start + 4..].find("-->") {
            Some(end) => rest = &rest[start + 4 + end + 3..],
            None => {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn collect_defs(root: Node) -> Result<HashMap<String, Adsr>, ParseError> {
    let mut defs = HashMap::new();
    for defs_el in root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "defs")
    {
        for envelope in defs_el
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "envelope")
        {
            let id = envelope.attribute("id").ok_or(ParseError::MissingId)?;
            let adsr = Adsr::new(
                opt_f64(envelope, "attack")?.unwrap_or(0.0),
                opt_f64(envelope, "decay")?.unwrap_or(0.0),
                opt_f64(envelope, "sustain")?.unwrap_or(1.0),
                opt_f64(envelope, "release")?.unwrap_or(0.0),
            );
            defs.insert(id.to_string(), adsr);
        }
    }
    Ok(defs)
}

/// Parses one element into a sound node, or `None` for elements that are
/// not sound nodes (`defs`, unknown tags).
fn parse_sound_node(
    node: Node,
    defs: &HashMap<String, Adsr>,
    options: &ParseOptions,
) -> Result<Option<SoundNode>, ParseError> {
    match node.tag_name().name() {
        "tone" => Ok(Some(SoundNode::Tone(parse_tone(node, defs, options)?))),
        "noise" => Ok(Some(SoundNode::Noise(parse_noise(node, defs, options)?))),
        "group" => Ok(Some(SoundNode::Group(parse_group(node, defs, options)?))),
        "sequence" => Ok(Some(SoundNode::Sequence(parse_sequence(
            node, defs, options,
        )?))),
        // Unknown elements are skipped here; the validator warns about them.
        _ => Ok(None),
    }
}

fn parse_tone(
    node: Node,
    defs: &HashMap<String, Adsr>,
    options: &ParseOptions,
) -> Result<Tone, ParseError> {
    let wave = parse_enum::<Waveform>(node, "wave", req_attr(node, "wave")?)?;
    let freq = parse_param(node, "freq")?
        .ok_or_else(|| ParseError::missing_attribute("tone", "freq"))?;
    let dur = req_f64(node, "dur")?;

    Ok(Tone {
        wave,
        freq,
        dur,
        amp: parse_param(node, "amp")?,
        envelope: parse_envelope(node, defs, options)?,
        pan: opt_f64(node, "pan")?,
        filter: parse_filter(node)?,
        phase: opt_f64(node, "phase")?,
        repeat: parse_repeat(node, true)?,
        at: opt_f64(node, "at")?,
    })
}

fn parse_noise(
    node: Node,
    defs: &HashMap<String, Adsr>,
    options: &ParseOptions,
) -> Result<Noise, ParseError> {
    let color = parse_enum::<NoiseColor>(node, "color", req_attr(node, "color")?)?;
    let dur = req_f64(node, "dur")?;

    Ok(Noise {
        color,
        dur,
        amp: parse_param(node, "amp")?,
        envelope: parse_envelope(node, defs, options)?,
        pan: opt_f64(node, "pan")?,
        filter: parse_filter(node)?,
        repeat: parse_repeat(node, false)?,
        at: opt_f64(node, "at")?,
    })
}

fn parse_group(
    node: Node,
    defs: &HashMap<String, Adsr>,
    options: &ParseOptions,
) -> Result<Group, ParseError> {
    let mut children = Vec::new();
    for child in node.children().filter(Node::is_element) {
        if let Some(sound) = parse_sound_node(child, defs, options)? {
            children.push(sound);
        }
    }

    Ok(Group {
        children,
        amp: opt_f64(node, "amp")?,
        pan: opt_f64(node, "pan")?,
        repeat: parse_repeat(node, false)?,
        at: opt_f64(node, "at")?,
    })
}

fn parse_sequence(
    node: Node,
    defs: &HashMap<String, Adsr>,
    options: &ParseOptions,
) -> Result<Sequence, ParseError> {
    let mut children = Vec::new();
    for child in node.children().filter(Node::is_element) {
        if let Some(sound) = parse_sound_node(child, defs, options)? {
            children.push(sound);
        }
    }

    Ok(Sequence {
        children,
        tempo: opt_f64(node, "tempo")?,
        at: opt_f64(node, "at")?,
    })
}

fn parse_envelope(
    node: Node,
    defs: &HashMap<String, Adsr>,
    options: &ParseOptions,
) -> Result<Option<EnvelopeSpec>, ParseError> {
    let Some(raw) = node.attribute("envelope") else {
        return Ok(None);
    };

    if let Some(id) = raw.strip_prefix('#') {
        if !options.resolve_references {
            return Ok(Some(EnvelopeSpec::Ref(id.to_string())));
        }
        return match defs.get(id) {
            Some(adsr) => Ok(Some(EnvelopeSpec::Inline(*adsr))),
            None => Err(ParseError::UnresolvedReference { id: id.to_string() }),
        };
    }

    let adsr: Adsr = raw
        .parse()
        .map_err(|e: String| ParseError::invalid_value(node.tag_name().name(), "envelope", e))?;
    Ok(Some(EnvelopeSpec::Inline(adsr)))
}

fn parse_filter(node: Node) -> Result<Option<FilterConfig>, ParseError> {
    let Some(raw) = node.attribute("filter") else {
        return Ok(None);
    };
    let kind = parse_enum::<FilterType>(node, "filter", raw)?;

    let cutoff = parse_param(node, "cutoff")?
        .ok_or_else(|| ParseError::missing_attribute(node.tag_name().name(), "cutoff"))?;
    let resonance = parse_param(node, "resonance")?.unwrap_or(Param::Scalar(1.0));

    Ok(Some(FilterConfig {
        kind,
        cutoff,
        resonance,
        gain_db: opt_f64(node, "gain")?,
        detune: opt_f64(node, "detune")?,
    }))
}

fn parse_repeat(node: Node, with_pitch: bool) -> Result<Option<Repeat>, ParseError> {
    let Some(raw) = node.attribute("repeat") else {
        return Ok(None);
    };
    let count: RepeatCount = raw
        .parse()
        .map_err(|e: String| ParseError::invalid_value(node.tag_name().name(), "repeat", e))?;

    let interval = req_f64(node, "repeat.interval")?;
    let delay = opt_f64(node, "repeat.delay")?.unwrap_or(0.0);
    let decay = opt_f64(node, "repeat.decay")?.unwrap_or(0.0);
    let pitch_shift = if with_pitch {
        opt_f64(node, "repeat.pitchShift")?
    } else {
        None
    };

    Ok(Some(Repeat {
        count,
        interval,
        delay,
        decay,
        pitch_shift,
    }))
}

/// Parses a scalar-or-curve parameter. `name.start` + `name.end` supersede
/// a plain `name` attribute; `name.curve` selects the kind (default linear).
fn parse_param(node: Node, name: &str) -> Result<Option<Param>, ParseError> {
    let start_attr = format!("{}.start", name);
    let end_attr = format!("{}.end", name);

    if node.attribute(start_attr.as_str()).is_some() && node.attribute(end_attr.as_str()).is_some()
    {
        let start = req_f64(node, &start_attr)?;
        let end = req_f64(node, &end_attr)?;
        let kind = match node.attribute(format!("{}.curve", name).as_str()) {
            Some(raw) => parse_enum::<CurveKind>(node, &format!("{}.curve", name), raw)?,
            None => CurveKind::Linear,
        };
        return Ok(Some(Param::Curve(Curve::new(start, end, kind))));
    }

    match node.attribute(name) {
        Some(_) => Ok(Some(Param::Scalar(req_f64(node, name)?))),
        None => Ok(None),
    }
}

fn parse_enum<T: std::str::FromStr<Err = String>>(
    node: Node,
    attribute: &str,
    raw: &str,
) -> Result<T, ParseError> {
    raw.parse()
        .map_err(|e: String| ParseError::invalid_value(node.tag_name().name(), attribute, e))
}

fn req_attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, ParseError> {
    node.attribute(name)
        .ok_or_else(|| ParseError::missing_attribute(node.tag_name().name(), name))
}

fn req_f64(node: Node, name: &str) -> Result<f64, ParseError> {
    parse_f64(node, name, req_attr(node, name)?)
}

fn opt_f64(node: Node, name: &str) -> Result<Option<f64>, ParseError> {
    node.attribute(name)
        .map(|raw| parse_f64(node, name, raw))
        .transpose()
}

fn parse_f64(node: Node, name: &str, raw: &str) -> Result<f64, ParseError> {
    raw.trim().parse::<f64>().map_err(|_| {
        ParseError::invalid_value(
            node.tag_name().name(),
            name,
            format!("malformed number '{}'", raw),
        )
    })
}
