//! ffmpeg adapter for audio transcoding.
//!
//! Every conversion attempt is one subprocess invocation with explicit
//! input-format, codec, sample-rate, and channel flags. Invocations are
//! bounded by the configured tool timeout.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;
use tokio::time::timeout;

/// Driver for the external ffmpeg binary
pub struct FfmpegTranscoder {
    /// Path to the ffmpeg binary (default: "ffmpeg")
    binary_path: String,

    /// Upper bound for one invocation
    tool_timeout: Duration,
}

impl FfmpegTranscoder {
    /// Create a transcoder with a custom binary path and timeout
    pub fn new(binary_path: impl Into<String>, tool_timeout: Duration) -> Self {
        Self {
            binary_path: binary_path.into(),
            tool_timeout,
        }
    }

    /// The configured binary path
    pub fn binary_path(&self) -> &str {
        &self.binary_path
    }

    /// Run one conversion: `ffmpeg -y [input_args] -i <input> [output_args] <output>`.
    ///
    /// A non-zero exit, a spawn failure, or a timeout all surface as
    /// errors; the caller decides whether to try the next hypothesis.
    pub async fn convert(
        &self,
        input: &Path,
        output: &Path,
        input_args: &[&str],
        output_args: &[&str],
    ) -> Result<()> {
        let mut command = Command::new(&self.binary_path);
        command.arg("-y");
        command.args(input_args);
        command.arg("-i").arg(input);
        command.args(output_args);
        command.arg(output);

        self.run(command, "convert").await
    }

    /// Generate a short silent clip from ffmpeg's synthetic audio source.
    pub async fn synthesize_silence(&self, output: &Path, seconds: u32) -> Result<()> {
        let mut command = Command::new(&self.binary_path);
        command.args(["-y", "-f", "lavfi", "-t"]);
        command.arg(seconds.to_string());
        command.args(["-i", "anullsrc=r=16000:cl=mono"]);
        command.args(["-acodec", "libmp3lame", "-ab", "8k"]);
        command.arg(output);

        self.run(command, "synthesize silence").await
    }

    /// Check that the binary is present and answers `-version`.
    pub async fn health_check(&self) -> Result<String> {
        let output = Command::new(&self.binary_path)
            .arg("-version")
            .output()
            .await
            .with_context(|| format!("failed to run '{}' health check", self.binary_path))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg health check failed: {}", stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or("ffmpeg").to_string())
    }

    /// Spawn the prepared command, wait for it under the tool timeout,
    /// and map a non-zero exit to an error carrying stderr.
    async fn run(&self, mut command: Command, action: &str) -> Result<()> {
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let child = command
            .spawn()
            .with_context(|| format!("failed to spawn '{}' for {}", self.binary_path, action))?;

        let output = timeout(self.tool_timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!(
                    "ffmpeg {} timed out after {:?}",
                    action, self.tool_timeout
                )
            })?
            .with_context(|| format!("failed to wait for ffmpeg {}", action))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "ffmpeg {} failed with exit code {}: {}",
                action,
                exit_code,
                last_stderr_line(&stderr)
            );
        }

        Ok(())
    }
}

/// ffmpeg prints banner noise before the actual failure; the last
/// non-empty stderr line is the useful part.
fn last_stderr_line(stderr: &str) -> &str {
    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_binary_path() {
        let transcoder = FfmpegTranscoder::new("/custom/path/ffmpeg", Duration::from_secs(5));
        assert_eq!(transcoder.binary_path(), "/custom/path/ffmpeg");
    }

    #[test]
    fn test_last_stderr_line_skips_trailing_blanks() {
        let stderr = "ffmpeg version 6.0\nInvalid data found when processing input\n\n";
        assert_eq!(
            last_stderr_line(stderr),
            "Invalid data found when processing input"
        );
    }

    #[tokio::test]
    async fn test_missing_binary_fails_health_check() {
        let transcoder =
            FfmpegTranscoder::new("/nonexistent/ffmpeg-missing", Duration::from_secs(5));
        assert!(transcoder.health_check().await.is_err());
    }
}
