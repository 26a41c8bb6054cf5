//! SPA CLI - render and validate SPA sound effect documents.

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "spa", version, about = "Render SPA sound effect XML to WAV")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an SPA document to a WAV file
    Render {
        /// Path to the SPA XML file
        input: String,
        /// Output WAV path
        #[arg(short, long, default_value = "out.wav")]
        output: String,
        /// Output sample rate in Hz
        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,
        /// Output channel count
        #[arg(long, default_value_t = 2)]
        channels: usize,
        /// Skip peak normalization
        #[arg(long)]
        no_normalize: bool,
        /// Master gain applied before normalization
        #[arg(long, default_value_t = 1.0)]
        master_volume: f64,
        /// Seed for noise generators
        #[arg(long, default_value_t = 0)]
        seed: u32,
    },
    /// Validate an SPA document and print the report
    Validate {
        /// Path to the SPA XML file
        input: String,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            input,
            output,
            sample_rate,
            channels,
            no_normalize,
            master_volume,
            seed,
        } => commands::render::run(
            &input,
            &output,
            sample_rate,
            channels,
            !no_normalize,
            master_volume,
            seed,
        ),
        Commands::Validate { input, json } => commands::validate::run(&input, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
