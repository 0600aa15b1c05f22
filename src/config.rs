//! Configuration for the transcription pipeline.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (OPENAI_API_KEY, OPENAI_API_BASE,
//!    ESCRIBA_FFMPEG, ESCRIBA_SCRATCH, ESCRIBA_LANGUAGE)
//! 2. Config file (.escriba/config.yaml)
//! 3. Defaults (~/.escriba)
//!
//! Config file discovery:
//! - Searches current directory and parents for .escriba/config.yaml
//! - The scratch path in the config file is relative to the config
//!   file's parent directory
//!
//! The API key is env-only and never read from the file. Resolved
//! configuration is established once at startup and never mutated.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub audio: Option<AudioConfig>,
    #[serde(default)]
    pub limits: Option<LimitsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Scratch directory for temporary artifacts (relative to config file)
    pub scratch: Option<String>,
    /// ffmpeg binary path
    pub ffmpeg: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub model: Option<String>,
    pub language: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub tool_timeout_seconds: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to the scratch directory
    pub scratch_dir: PathBuf,
    /// ffmpeg binary (path or bare name resolved via PATH)
    pub ffmpeg_path: String,
    /// Transcription model identifier
    pub model: String,
    /// Target language hint (ISO 639-1)
    pub language: String,
    /// Transcription API base URL
    pub api_base: String,
    /// Bearer token (env-only; None until the caller needs the service)
    pub api_key: Option<String>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Timeout settings
    pub limits: LimitSettings,
}

#[derive(Debug, Clone)]
pub struct LimitSettings {
    /// Upper bound for one external tool invocation
    pub tool_timeout_seconds: u64,
    /// Upper bound for one transcription service call
    pub request_timeout_seconds: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            tool_timeout_seconds: 60,
            request_timeout_seconds: 120,
        }
    }
}

impl LimitSettings {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".escriba").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_scratch = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".escriba")
        .join("tmp");

    let config_file = find_config_file();
    let file = match config_file.as_ref() {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };

    // Base directory for relative paths: parent of .escriba/
    let base_dir = config_file
        .as_ref()
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let scratch_dir = if let Ok(env_scratch) = std::env::var("ESCRIBA_SCRATCH") {
        PathBuf::from(env_scratch)
    } else if let Some(scratch) = file.as_ref().and_then(|f| f.paths.scratch.as_deref()) {
        resolve_path(&base_dir, scratch)
    } else {
        default_scratch
    };

    let ffmpeg_path = std::env::var("ESCRIBA_FFMPEG")
        .ok()
        .or_else(|| file.as_ref().and_then(|f| f.paths.ffmpeg.clone()))
        .unwrap_or_else(|| "ffmpeg".to_string());

    let model = file
        .as_ref()
        .and_then(|f| f.audio.as_ref())
        .and_then(|a| a.model.clone())
        .unwrap_or_else(|| "whisper-1".to_string());

    let language = std::env::var("ESCRIBA_LANGUAGE")
        .ok()
        .or_else(|| {
            file.as_ref()
                .and_then(|f| f.audio.as_ref())
                .and_then(|a| a.language.clone())
        })
        .unwrap_or_else(|| "pt".to_string());

    let api_base = std::env::var("OPENAI_API_BASE")
        .ok()
        .or_else(|| {
            file.as_ref()
                .and_then(|f| f.audio.as_ref())
                .and_then(|a| a.api_base.clone())
        })
        .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

    let api_key = std::env::var("OPENAI_API_KEY").ok();

    let limits = LimitSettings {
        tool_timeout_seconds: file
            .as_ref()
            .and_then(|f| f.limits.as_ref())
            .and_then(|l| l.tool_timeout_seconds)
            .unwrap_or(60),
        request_timeout_seconds: file
            .as_ref()
            .and_then(|f| f.limits.as_ref())
            .and_then(|l| l.request_timeout_seconds)
            .unwrap_or(120),
    };

    Ok(ResolvedConfig {
        scratch_dir,
        ffmpeg_path,
        model,
        language,
        api_base,
        api_key,
        config_file,
        limits,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
