//! Structural and value-range validation.
//!
//! [`validate`] walks the raw XML independently of the typed parser so that
//! every problem in a document is reported, not just the first. It never
//! fails; malformed input becomes a `PARSE_ERROR` entry in the report.
//!
//! The checks here are a superset of the range checks the renderer performs,
//! so a document that validates cleanly also renders without error.

use std::collections::HashSet;

use roxmltree::Node;

use crate::document::{
    Adsr, CurveKind, FilterType, NoiseColor, RepeatCount, Waveform,
};
use crate::error::{
    ErrorCode, ValidationError, ValidationReport, ValidationWarning, WarningCode,
};
use crate::parser::strip_comments;

/// Safety limit on repeat-expanded length, in seconds.
pub const MAX_REPEAT_SECONDS: f64 = 60.0;

/// Validates SPA XML text, accumulating every error and warning.
pub fn validate(xml: &str) -> ValidationReport {
    let mut report = ValidationReport::new();

    let text = strip_comments(xml);
    let tree = match roxmltree::Document::parse(&text) {
        Ok(tree) => tree,
        Err(e) => {
            report.add_error(ValidationError::new(
                ErrorCode::ParseError,
                format!("malformed XML: {}", e),
            ));
            return report;
        }
    };

    let root = tree.root_element();
    if root.tag_name().name() != "spa" {
        report.add_error(ValidationError::new(
            ErrorCode::InvalidRoot,
            format!(
                "root element must be 'spa', found '{}'",
                root.tag_name().name()
            ),
        ));
        return report;
    }
    if root.attribute("version").is_none() {
        report.add_error(ValidationError::new(
            ErrorCode::MissingVersion,
            "root element is missing the 'version' attribute",
        ));
    }

    let defs_ids = collect_defs_ids(root, &mut report);

    check_children(root, "", false, &defs_ids, &mut report);

    report
}

fn collect_defs_ids(root: Node, report: &mut ValidationReport) -> HashSet<String> {
    let mut ids = HashSet::new();
    for defs_el in root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "defs")
    {
        for (idx, envelope) in defs_el
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "envelope")
            .enumerate()
        {
            let path = format!("defs.envelope[{}]", idx);
            match envelope.attribute("id") {
                Some(id) => {
                    ids.insert(id.to_string());
                }
                None => report.add_error(ValidationError::with_path(
                    ErrorCode::MissingId,
                    "envelope in 'defs' is missing the 'id' attribute",
                    path.clone(),
                )),
            }
            check_adsr_attrs(envelope, &path, report);
        }
    }
    ids
}

fn check_adsr_attrs(node: Node, path: &str, report: &mut ValidationReport) {
    for attr in ["attack", "decay", "release"] {
        if let Some(value) = check_number(node, attr, path, report) {
            if value < 0.0 {
                invalid(report, path, attr, format!("{} must be non-negative", attr));
            }
        }
    }
    if let Some(sustain) = check_number(node, "sustain", path, report) {
        if !(0.0..=1.0).contains(&sustain) {
            invalid(report, path, "sustain", "sustain must be within [0, 1]");
        }
    }
}

fn check_children(
    parent: Node,
    path: &str,
    in_sequence: bool,
    defs_ids: &HashSet<String>,
    report: &mut ValidationReport,
) {
    for (idx, child) in parent.children().filter(|n| n.is_element()).enumerate() {
        let name = child.tag_name().name();
        let child_path = if path.is_empty() {
            format!("{}[{}]", name, idx)
        } else {
            format!("{}.{}[{}]", path, name, idx)
        };

        match name {
            "tone" => check_tone(child, &child_path, in_sequence, defs_ids, report),
            "noise" => check_noise(child, &child_path, in_sequence, defs_ids, report),
            "group" => check_group(child, &child_path, in_sequence, defs_ids, report),
            "sequence" => check_sequence(child, &child_path, in_sequence, defs_ids, report),
            // defs contents are checked in collect_defs_ids.
            "defs" => {}
            _ => report.add_warning(ValidationWarning::with_path(
                WarningCode::UnknownElement,
                format!("unknown element '{}'", name),
                child_path,
            )),
        }
    }
}

fn check_tone(
    node: Node,
    path: &str,
    in_sequence: bool,
    defs_ids: &HashSet<String>,
    report: &mut ValidationReport,
) {
    match node.attribute("wave") {
        Some(raw) => {
            if raw.parse::<Waveform>().is_err() {
                invalid(report, path, "wave", format!("unknown waveform '{}'", raw));
            }
        }
        None => missing(report, path, "wave"),
    }

    check_positive_param(node, "freq", path, true, report);
    let dur = check_dur(node, path, report);

    check_unit_param(node, "amp", path, report);
    check_pan(node, path, report);
    check_phase(node, path, report);
    check_envelope_attr(node, path, defs_ids, report);
    check_filter(node, path, report);
    check_repeat(node, path, dur, true, report);
    check_at(node, path, in_sequence, report);
}

fn check_noise(
    node: Node,
    path: &str,
    in_sequence: bool,
    defs_ids: &HashSet<String>,
    report: &mut ValidationReport,
) {
    match node.attribute("color") {
        Some(raw) => {
            if raw.parse::<NoiseColor>().is_err() {
                invalid(report, path, "color", format!("unknown noise color '{}'", raw));
            }
        }
        None => missing(report, path, "color"),
    }

    let dur = check_dur(node, path, report);

    check_unit_param(node, "amp", path, report);
    check_pan(node, path, report);
    check_envelope_attr(node, path, defs_ids, report);
    check_filter(node, path, report);
    check_repeat(node, path, dur, false, report);
    check_at(node, path, in_sequence, report);
}

fn check_group(
    node: Node,
    path: &str,
    in_sequence: bool,
    defs_ids: &HashSet<String>,
    report: &mut ValidationReport,
) {
    if let Some(amp) = check_number(node, "amp", path, report) {
        if !(0.0..=1.0).contains(&amp) {
            invalid(report, path, "amp", "amp must be within [0, 1]");
        }
    }
    check_pan(node, path, report);
    check_repeat(node, path, None, false, report);
    check_at(node, path, in_sequence, report);

    let sound_children = node
        .children()
        .filter(|n| {
            n.is_element()
                && matches!(
                    n.tag_name().name(),
                    "tone" | "noise" | "group" | "sequence"
                )
        })
        .count();
    if sound_children == 0 {
        report.add_warning(ValidationWarning::with_path(
            WarningCode::EmptyGroup,
            "group has no sound children",
            path,
        ));
    }

    check_children(node, path, false, defs_ids, report);
}

fn check_sequence(
    node: Node,
    path: &str,
    in_sequence: bool,
    defs_ids: &HashSet<String>,
    report: &mut ValidationReport,
) {
    if let Some(tempo) = check_number(node, "tempo", path, report) {
        if !tempo.is_finite() || tempo <= 0.0 {
            invalid(report, path, "tempo", "tempo must be positive");
        }
    }
    check_at(node, path, in_sequence, report);

    check_children(node, path, true, defs_ids, report);
}

fn check_dur(node: Node, path: &str, report: &mut ValidationReport) -> Option<f64> {
    match node.attribute("dur") {
        Some(_) => {
            let dur = check_number(node, "dur", path, report)?;
            if !(dur > 0.0) || !dur.is_finite() {
                invalid(report, path, "dur", "dur must be a positive number of seconds");
                return None;
            }
            Some(dur)
        }
        None => {
            missing(report, path, "dur");
            None
        }
    }
}

/// Checks a scalar-or-curve parameter that must stay positive. With
/// `required`, a missing parameter is an error.
fn check_positive_param(
    node: Node,
    name: &str,
    path: &str,
    required: bool,
    report: &mut ValidationReport,
) {
    let (present, values) = param_values(node, name, path, report);
    if !present {
        if required {
            missing(report, path, name);
        }
        return;
    }
    for value in values.into_iter().flatten() {
        if !(value > 0.0) || !value.is_finite() {
            invalid(report, path, name, format!("{} must be positive", name));
            return;
        }
    }
}

/// Checks a scalar-or-curve parameter constrained to [0, 1].
fn check_unit_param(node: Node, name: &str, path: &str, report: &mut ValidationReport) {
    let (present, values) = param_values(node, name, path, report);
    if !present {
        return;
    }
    for value in values.into_iter().flatten() {
        if !(0.0..=1.0).contains(&value) {
            invalid(report, path, name, format!("{} must be within [0, 1]", name));
            return;
        }
    }
}

/// Reads the scalar-or-curve attribute triple for `name`. Returns whether
/// the parameter is present at all and the endpoint values that parsed.
fn param_values(
    node: Node,
    name: &str,
    path: &str,
    report: &mut ValidationReport,
) -> (bool, [Option<f64>; 2]) {
    let start_attr = format!("{}.start", name);
    let end_attr = format!("{}.end", name);
    let has_start = node.attribute(start_attr.as_str()).is_some();
    let has_end = node.attribute(end_attr.as_str()).is_some();

    if let Some(raw) = node.attribute(format!("{}.curve", name).as_str()) {
        if raw.parse::<CurveKind>().is_err() {
            invalid(
                report,
                path,
                &format!("{}.curve", name),
                format!("unknown curve kind '{}'", raw),
            );
        }
    }

    if has_start && has_end {
        let start = check_number(node, &start_attr, path, report);
        let end = check_number(node, &end_attr, path, report);
        return (true, [start, end]);
    }
    if has_start || has_end {
        // A lone endpoint only counts when the scalar form is also absent.
        if node.attribute(name).is_none() {
            report.add_error(ValidationError::with_path(
                ErrorCode::MissingAttribute,
                format!("'{0}.start' and '{0}.end' must both be present", name),
                format!("{}.{}", path, name),
            ));
            return (true, [None, None]);
        }
    }

    match node.attribute(name) {
        Some(_) => {
            let value = check_number(node, name, path, report);
            (true, [value, None])
        }
        None => (false, [None, None]),
    }
}

fn check_pan(node: Node, path: &str, report: &mut ValidationReport) {
    if let Some(pan) = check_number(node, "pan", path, report) {
        if !(-1.0..=1.0).contains(&pan) {
            invalid(report, path, "pan", "pan must be within [-1, 1]");
        }
    }
}

fn check_phase(node: Node, path: &str, report: &mut ValidationReport) {
    if let Some(phase) = check_number(node, "phase", path, report) {
        if !(0.0..1.0).contains(&phase) {
            invalid(report, path, "phase", "phase must be within [0, 1)");
        }
    }
}

fn check_at(node: Node, path: &str, in_sequence: bool, report: &mut ValidationReport) {
    if let Some(at) = check_number(node, "at", path, report) {
        if in_sequence && (!at.is_finite() || at < 0.0) {
            invalid(report, path, "at", "sequence child offsets must be non-negative");
        }
    }
}

fn check_envelope_attr(
    node: Node,
    path: &str,
    defs_ids: &HashSet<String>,
    report: &mut ValidationReport,
) {
    let Some(raw) = node.attribute("envelope") else {
        return;
    };
    if let Some(id) = raw.strip_prefix('#') {
        if !defs_ids.contains(id) {
            report.add_error(ValidationError::with_path(
                ErrorCode::ReferenceUnresolved,
                format!("envelope reference '#{}' does not match any entry in 'defs'", id),
                format!("{}.envelope", path),
            ));
        }
        return;
    }
    match raw.parse::<Adsr>() {
        Ok(adsr) => {
            if adsr.attack < 0.0 || adsr.decay < 0.0 || adsr.release < 0.0 {
                invalid(report, path, "envelope", "envelope times must be non-negative");
            }
            if !(0.0..=1.0).contains(&adsr.sustain) {
                invalid(report, path, "envelope", "sustain must be within [0, 1]");
            }
        }
        Err(e) => invalid(report, path, "envelope", e),
    }
}

fn check_filter(node: Node, path: &str, report: &mut ValidationReport) {
    let Some(raw) = node.attribute("filter") else {
        return;
    };
    if raw.parse::<FilterType>().is_err() {
        invalid(report, path, "filter", format!("unknown filter type '{}'", raw));
    }

    let has_cutoff = node.attribute("cutoff").is_some()
        || (node.attribute("cutoff.start").is_some() && node.attribute("cutoff.end").is_some());
    if !has_cutoff {
        missing(report, path, "cutoff");
    } else {
        check_positive_param(node, "cutoff", path, false, report);
    }

    let (present, values) = param_values(node, "resonance", path, report);
    if present {
        for value in values.into_iter().flatten() {
            if !(value >= 0.1) {
                invalid(report, path, "resonance", "resonance must be at least 0.1");
                break;
            }
        }
    }

    check_number(node, "gain", path, report);
    check_number(node, "detune", path, report);
}

fn check_repeat(
    node: Node,
    path: &str,
    dur: Option<f64>,
    with_pitch: bool,
    report: &mut ValidationReport,
) {
    let Some(raw) = node.attribute("repeat") else {
        return;
    };
    let count = match raw.parse::<RepeatCount>() {
        Ok(count) => Some(count),
        Err(e) => {
            invalid(report, path, "repeat", e);
            None
        }
    };

    let interval = match node.attribute("repeat.interval") {
        Some(_) => {
            let interval = check_number(node, "repeat.interval", path, report);
            if let Some(value) = interval {
                if !value.is_finite() || value <= 0.0 {
                    invalid(report, path, "repeat.interval", "interval must be positive");
                }
            }
            interval
        }
        None => {
            missing(report, path, "repeat.interval");
            None
        }
    };

    let delay = check_number(node, "repeat.delay", path, report);
    if let Some(value) = delay {
        if !value.is_finite() || value < 0.0 {
            invalid(report, path, "repeat.delay", "delay must be non-negative");
        }
    }
    if let Some(decay) = check_number(node, "repeat.decay", path, report) {
        if !(0.0..1.0).contains(&decay) {
            invalid(report, path, "repeat.decay", "decay must be within [0, 1)");
        }
    }
    if with_pitch {
        if let Some(shift) = check_number(node, "repeat.pitchShift", path, report) {
            if !(-12.0..=12.0).contains(&shift) {
                invalid(
                    report,
                    path,
                    "repeat.pitchShift",
                    "pitch shift must be within [-12, 12] semitones",
                );
            }
        }
    }

    // The expanded length is computable from attributes alone, so the bound
    // violation the renderer would skip over is reportable ahead of time.
    if let (Some(count), Some(interval), Some(dur)) = (count, interval, dur) {
        let repeats = count.resolved() as f64;
        let total = delay.unwrap_or(0.0) + dur + (repeats - 1.0) * (dur + interval);
        if !total.is_finite() || total < 0.0 || total > MAX_REPEAT_SECONDS {
            report.add_warning(ValidationWarning::with_path(
                WarningCode::RepeatBound,
                format!(
                    "repeat expansion of {:.1}s exceeds the {}s limit and will be skipped",
                    total, MAX_REPEAT_SECONDS
                ),
                format!("{}.repeat", path),
            ));
        }
    }
}

/// Parses a numeric attribute, recording an error for malformed values.
fn check_number(node: Node, name: &str, path: &str, report: &mut ValidationReport) -> Option<f64> {
    let raw = node.attribute(name)?;
    match raw.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            invalid(report, path, name, format!("malformed number '{}'", raw));
            None
        }
    }
}

fn missing(report: &mut ValidationReport, path: &str, attribute: &str) {
    report.add_error(ValidationError::with_path(
        ErrorCode::MissingAttribute,
        format!("missing required attribute '{}'", attribute),
        format!("{}.{}", path, attribute),
    ));
}

fn invalid(report: &mut ValidationReport, path: &str, attribute: &str, message: impl Into<String>) {
    report.add_error(ValidationError::with_path(
        ErrorCode::InvalidValue,
        message,
        format!("{}.{}", path, attribute),
    ));
}
