//! Command-line interface.
//!
//! Provides commands for transcribing a saved capture, probing format
//! detection without touching the network, checking the external
//! dependencies, and printing the resolved configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::FfmpegTranscoder;
use crate::config;
use crate::core::detect;
use crate::core::TranscriptionPipeline;

/// escriba - resilient voice-note transcription pipeline
#[derive(Parser, Debug)]
#[command(name = "escriba")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe a saved audio capture
    Transcribe {
        /// Path to the audio file (any format, possibly malformed)
        file: PathBuf,

        /// Override the target language hint (ISO 639-1)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Inspect format detection for a file (no network calls)
    Probe {
        /// Path to the payload to inspect
        file: PathBuf,
    },

    /// Check external dependencies (ffmpeg, service credentials)
    Doctor,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Transcribe { file, language } => transcribe_file(&file, language).await,
            Commands::Probe { file } => probe_file(&file),
            Commands::Doctor => doctor().await,
            Commands::Config => show_config(),
        }
    }
}

/// Transcribe a saved capture and print the text
async fn transcribe_file(file: &PathBuf, language: Option<String>) -> Result<()> {
    let payload = std::fs::read(file)
        .with_context(|| format!("Failed to read audio file: {}", file.display()))?;

    eprintln!(
        "Loaded {} ({} KB)",
        file.display(),
        payload.len() / 1024
    );

    let mut cfg = config::config()?.clone();
    if let Some(lang) = language {
        cfg.language = lang;
    }

    let pipeline = TranscriptionPipeline::new(&cfg)
        .context("Failed to construct transcription pipeline")?;

    match pipeline.transcribe(&payload).await {
        Ok(result) => {
            println!("{}", result.text);
            eprintln!(
                "\n[transcribed in {} attempt(s){}]",
                result.attempts_made,
                if result.used_degraded_audio {
                    ", degraded audio"
                } else {
                    ""
                }
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("\n[transcription failed: {}]", e);
            std::process::exit(1);
        }
    }
}

/// Run only the detector and report what it saw
fn probe_file(file: &PathBuf) -> Result<()> {
    let payload = std::fs::read(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let detection = detect::detect(&payload);

    println!("File:       {}", file.display());
    println!("Size:       {} bytes", payload.len());
    println!("Signature:  {}", detect::signature_hex(&payload));
    println!("Envelope:   {}", if detection.unwrapped { "yes (unwrapped)" } else { "no" });
    if detection.unwrapped {
        println!("Inner size: {} bytes", detection.bytes.len());
        println!("Inner sig:  {}", detect::signature_hex(&detection.bytes));
    }
    println!("Format:     {}", detection.format);
    println!(
        "Route:      {}",
        if detection.format.is_native() {
            "fast path (no conversion)"
        } else {
            "conversion fallback chain"
        }
    );

    Ok(())
}

/// Verify the external dependencies are reachable
async fn doctor() -> Result<()> {
    let cfg = config::config()?;

    println!("escriba doctor");
    println!("══════════════════════════════════════════════════════════════");

    let transcoder = FfmpegTranscoder::new(cfg.ffmpeg_path.clone(), cfg.limits.tool_timeout());
    match transcoder.health_check().await {
        Ok(version) => println!("✓ ffmpeg:    {}", version),
        Err(e) => println!("✗ ffmpeg:    {} ({})", cfg.ffmpeg_path, e),
    }

    match &cfg.api_key {
        Some(_) => println!("✓ api key:   set"),
        None => println!("✗ api key:   OPENAI_API_KEY not set"),
    }

    println!("  api base:  {}", cfg.api_base);
    println!("  scratch:   {}", cfg.scratch_dir.display());

    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("escriba configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Scratch:   {}", cfg.scratch_dir.display());
    println!("  ffmpeg:    {}", cfg.ffmpeg_path);
    println!();
    println!("Audio:");
    println!("  Model:     {}", cfg.model);
    println!("  Language:  {}", cfg.language);
    println!("  API base:  {}", cfg.api_base);
    println!(
        "  API key:   {}",
        if cfg.api_key.is_some() { "set" } else { "(not set)" }
    );
    println!();
    println!("Limits:");
    println!("  Tool timeout:    {}s", cfg.limits.tool_timeout_seconds);
    println!("  Request timeout: {}s", cfg.limits.request_timeout_seconds);

    Ok(())
}
