//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// How many trailing stderr lines are kept for error reporting.
const STDERR_TAIL_LINES: usize = 40;

/// Declarative ffmpeg invocation.
///
/// Options are grouped around the input: seek and demuxer flags land
/// before `-i`, filter and encoder flags between the input and the
/// output path. The output is always overwritten; a failed run removes
/// it again so callers never see a half-written file.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Options emitted before `-i` (seek position, demuxer flags).
    pre_input: Vec<String>,
    /// Source media file.
    input: PathBuf,
    /// Options emitted between the input and the output path.
    post_input: Vec<String>,
    /// Destination file.
    output: PathBuf,
    /// Verbosity handed to `-v`.
    log_level: String,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            pre_input: Vec::new(),
            input: input.as_ref().to_path_buf(),
            post_input: Vec::new(),
            output: output.as_ref().to_path_buf(),
            log_level: "error".to_string(),
        }
    }

    /// Append one option before `-i`.
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.pre_input.push(arg.into());
        self
    }

    /// Append one option after the input.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.post_input.push(arg.into());
        self
    }

    /// Append several options after the input.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_input.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set seek position (before input, for fast keyframe seeking).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Set output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Set video filter chain.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Cap the output frame rate.
    pub fn fps(self, fps: u32) -> Self {
        self.output_arg("-r").output_arg(fps.to_string())
    }

    /// Drop the video stream (audio-only output).
    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    /// Move the moov atom up front for streaming playback.
    pub fn faststart(self) -> Self {
        self.output_arg("-movflags").output_arg("+faststart")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// The output path this command writes.
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Assemble the full argv, overwrite flag and log level included.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-v".to_string(),
            self.log_level.clone(),
        ];
        args.extend(self.pre_input.iter().cloned());
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().into_owned());
        args.extend(self.post_input.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Runner for FFmpeg commands with cancellation and timeout.
///
/// On cancellation or timeout the child is killed and the (partial)
/// output file is removed so no half-written media survives the job.
pub struct FfmpegRunner {
    cancel_rx: Option<watch::Receiver<bool>>,
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self {
            cancel_rx: None,
            timeout_secs: None,
        }
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        require_tool("ffmpeg")?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr not captured");
        let stderr_task = tokio::spawn(collect_stderr_tail(stderr));

        let result = self.wait_for_completion(&mut child, cmd.output_path()).await;
        let stderr_tail = stderr_task.await.unwrap_or_default();

        match result {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => {
                remove_partial_output(cmd.output_path()).await;
                Err(MediaError::ffmpeg_failed(
                    "FFmpeg exited with non-zero status",
                    Some(stderr_tail),
                    status.code(),
                ))
            }
            Err(e) => {
                remove_partial_output(cmd.output_path()).await;
                Err(e)
            }
        }
    }

    /// Wait for the child, honoring cancellation and timeout.
    async fn wait_for_completion(
        &self,
        child: &mut tokio::process::Child,
        output: &Path,
    ) -> MediaResult<std::process::ExitStatus> {
        let mut cancel_rx = self.cancel_rx.clone();

        let wait = async {
            loop {
                match &mut cancel_rx {
                    Some(rx) => {
                        tokio::select! {
                            status = child.wait() => return status.map_err(MediaError::from),
                            changed = rx.changed() => {
                                if changed.is_err() || *rx.borrow() {
                                    info!("FFmpeg cancelled, killing process on {}", output.display());
                                    let _ = child.kill().await;
                                    return Err(MediaError::Cancelled);
                                }
                            }
                        }
                    }
                    None => return child.wait().await.map_err(MediaError::from),
                }
            }
        };

        match self.timeout_secs {
            Some(secs) => {
                match tokio::time::timeout(std::time::Duration::from_secs(secs), wait).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("FFmpeg timed out after {}s, killing process", secs);
                        let _ = child.kill().await;
                        Err(MediaError::Timeout(secs))
                    }
                }
            }
            None => wait.await,
        }
    }
}

/// Collect the trailing stderr lines for error reporting.
async fn collect_stderr_tail(stderr: tokio::process::ChildStderr) -> String {
    let mut reader = BufReader::new(stderr).lines();
    let mut tail: Vec<String> = Vec::new();
    while let Ok(Some(line)) = reader.next_line().await {
        if tail.len() == STDERR_TAIL_LINES {
            tail.remove(0);
        }
        tail.push(line);
    }
    tail.join("\n")
}

async fn remove_partial_output(path: &Path) {
    if path.exists() {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove partial output {}: {}", path.display(), e);
        }
    }
}

/// Look up an external tool on `PATH`.
///
/// All subprocess entry points (ffmpeg, ffprobe, yt-dlp) go through this
/// so a missing binary surfaces as one consistent error.
pub fn require_tool(name: &str) -> MediaResult<PathBuf> {
    which::which(name).map_err(|_| MediaError::ToolNotFound(name.to_string()))
}
