//! Render command implementation.

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;

use spa_render::{render_str, RenderOptions};

/// Runs the render command: XML in, WAV out.
#[allow(clippy::too_many_arguments)]
pub fn run(
    input: &str,
    output: &str,
    sample_rate: u32,
    channels: usize,
    normalize: bool,
    master_volume: f64,
    seed: u32,
) -> Result<ExitCode> {
    println!("{} {}", "Rendering:".cyan().bold(), input);

    let xml = fs::read_to_string(input)
        .with_context(|| format!("failed to read input file: {}", input))?;

    let options = RenderOptions {
        sample_rate,
        channels,
        normalize,
        master_volume,
        seed,
    };
    let buffer = render_str(&xml, &options)
        .with_context(|| format!("failed to render: {}", input))?;

    write_wav(&buffer, output)
        .with_context(|| format!("failed to write WAV file: {}", output))?;

    println!(
        "{} {} ({:.3}s, {} Hz, {} ch)",
        "Wrote".green().bold(),
        output,
        buffer.duration_seconds(),
        buffer.sample_rate,
        buffer.channels
    );
    Ok(ExitCode::SUCCESS)
}

fn write_wav(buffer: &spa_render::PcmBuffer, path: &str) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.channels as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &buffer.samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f64) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
