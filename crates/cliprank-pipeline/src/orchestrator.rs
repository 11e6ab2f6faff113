//! Job orchestration.
//!
//! One [`Pipeline`] value drives the whole stage graph for a job:
//! ingest, then ASR and scene detection concurrently, then windowing,
//! then featurization and grading concurrently, then ranking, planning
//! and bounded-concurrency rendering. The orchestrator owns the job
//! arena (scratch directory plus per-job state); stages receive
//! references and never retain them past the call.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use cliprank_clients::{check_endpoints, AsrClient, ClientError, EndpointHealth, GraderClient};
use cliprank_media::{
    detect_scene_cuts, execute_plan, fetch, probe_encoder, probe_video, MediaError,
};
use cliprank_models::{
    ClipLogRow, CropStrategy, EncodingConfig, MediaAsset, RankedClip, RenderPlan,
};
use cliprank_text::compute_features_parallel;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::joblog::write_job_log;
use crate::planner::build_render_plan;
use crate::ranker::rank_windows;
use crate::retry::{retry_async, RetryConfig};
use crate::windower::generate_windows;

/// Whole-ingest timeout, including retries (10 minutes).
const INGEST_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Scratch-directory quota; new render tasks wait while usage is above
/// this and earlier renders are still in flight.
const SCRATCH_QUOTA_BYTES: u64 = 20 * 1024 * 1024 * 1024;

/// Poll interval while waiting out the scratch quota.
const QUOTA_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Job lifecycle states.
///
/// `Transcribing` covers the concurrent ASR + scene-detection phase and
/// `Featurizing` the concurrent featurization + grading phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Init,
    Ingesting,
    Transcribing,
    Windowing,
    Featurizing,
    Ranking,
    Planning,
    Rendering,
    Done,
    Failed,
    Cancelled,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Ingesting => "ingesting",
            Self::Transcribing => "transcribing",
            Self::Windowing => "windowing",
            Self::Featurizing => "featurizing",
            Self::Ranking => "ranking",
            Self::Planning => "planning",
            Self::Rendering => "rendering",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Result of one selected clip: a rendered file or a recorded failure.
#[derive(Debug)]
pub struct ClipOutcome {
    pub clip: RankedClip,
    pub file_path: Option<PathBuf>,
    pub error: Option<String>,
}

/// Everything a caller needs to summarize a finished job.
#[derive(Debug)]
pub struct JobReport {
    pub media_id: String,
    pub outcomes: Vec<ClipOutcome>,
    pub log_path: PathBuf,
    pub windows_considered: usize,
    /// Windows whose grading degraded to the sentinel and were excluded
    /// from selection.
    pub degraded_windows: usize,
}

impl JobReport {
    /// Clips rendered successfully.
    pub fn produced(&self) -> usize {
        self.outcomes.iter().filter(|o| o.file_path.is_some()).count()
    }

    /// Clips that failed to render.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.produced()
    }
}

/// Per-job scratch directory; swept on drop.
struct JobArena {
    scratch: tempfile::TempDir,
}

impl JobArena {
    fn new() -> std::io::Result<Self> {
        Ok(Self {
            scratch: tempfile::Builder::new().prefix("cliprank-").tempdir()?,
        })
    }

    fn path(&self) -> &Path {
        self.scratch.path()
    }
}

/// The pipeline orchestrator.
pub struct Pipeline {
    config: PipelineConfig,
    asr: AsrClient,
    grader: GraderClient,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        let asr = AsrClient::new(&config.whisper_server_url, &config.whisper_model);
        let grader = GraderClient::new(
            &config.chat_server_url,
            &config.chat_model,
            config.grader_concurrency,
        );
        Ok(Self {
            config,
            asr,
            grader,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Probe both model endpoints.
    pub async fn check_health(&self) -> EndpointHealth {
        check_endpoints(&self.config.whisper_server_url, &self.config.chat_server_url).await
    }

    /// Run one job: produce the top-`k` clips for a source URL.
    ///
    /// `cancel_rx` is polled at every stage boundary, before each grader
    /// request, and inside every ffmpeg invocation.
    pub async fn run(
        &self,
        source_url: &str,
        k: usize,
        external_cancel: watch::Receiver<bool>,
    ) -> PipelineResult<JobReport> {
        let job_id = Uuid::new_v4();
        info!(job_id = %job_id, url = %source_url, k, "Starting job");

        // Internal cancel channel: external cancellation forwards into
        // it, and cancel_on_first_failure can trip it from inside.
        let (cancel_tx, cancel_rx) = watch::channel(false);
        forward_cancellation(external_cancel, cancel_tx.clone());

        match self.run_stages(source_url, k, &cancel_tx, &cancel_rx).await {
            Ok(report) => {
                info!(
                    job_id = %job_id,
                    state = %JobState::Done,
                    produced = report.produced(),
                    failed = report.failed(),
                    "Job finished"
                );
                Ok(report)
            }
            Err(PipelineError::Cancelled) => {
                info!(job_id = %job_id, state = %JobState::Cancelled, "Job cancelled");
                Err(PipelineError::Cancelled)
            }
            Err(e) => {
                error!(job_id = %job_id, state = %JobState::Failed, "Job failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        source_url: &str,
        k: usize,
        cancel_tx: &watch::Sender<bool>,
        cancel_rx: &watch::Receiver<bool>,
    ) -> PipelineResult<JobReport> {
        let arena = JobArena::new()?;
        let mut state = JobState::Init;

        // Ingest, with the 1s/4s/16s backoff schedule for transient
        // failures and a hard deadline over the whole attempt sequence.
        transition(&mut state, JobState::Ingesting);
        ensure_live(cancel_rx)?;
        let media = self.ingest(source_url, arena.path()).await?;

        // ASR and scene detection run concurrently; scene detection is
        // non-fatal and degrades to zero cuts on its own.
        transition(&mut state, JobState::Transcribing);
        ensure_live(cancel_rx)?;
        let (transcript_result, cuts) = tokio::join!(
            self.asr.transcribe(&media.audio_path, media.duration_seconds),
            detect_scene_cuts(
                &media.local_path,
                media.duration_seconds,
                self.config.scene_threshold
            ),
        );
        let transcript = transcript_result.map_err(map_asr_error)?;
        info!(
            tokens = transcript.len(),
            scene_cuts = cuts.len(),
            "Analysis complete"
        );

        transition(&mut state, JobState::Windowing);
        ensure_live(cancel_rx)?;
        let windows = generate_windows(
            &media.id,
            &transcript,
            &cuts,
            media.duration_seconds,
            &self.config.window_config(),
        );
        if windows.is_empty() {
            // An empty candidate set is a valid, empty result.
            info!("No candidate windows; emitting empty log");
            let log_path = write_job_log(&self.config.output_dir, &media.id, &[])?;
            transition(&mut state, JobState::Done);
            return Ok(JobReport {
                media_id: media.id,
                outcomes: Vec::new(),
                log_path,
                windows_considered: 0,
                degraded_windows: 0,
            });
        }
        info!(windows = windows.len(), "Candidate windows generated");

        // CPU-bound featurization on a small worker pool, concurrent
        // with the bounded grader requests.
        transition(&mut state, JobState::Featurizing);
        ensure_live(cancel_rx)?;
        let worker_threads = num_cpus::get().min(4);
        let feature_windows = windows.clone();
        let features_task = tokio::task::spawn_blocking(move || {
            compute_features_parallel(&feature_windows, worker_threads)
        });
        let (features_result, grades_result) = tokio::join!(
            features_task,
            self.grader.grade(&windows, Some(cancel_rx.clone()))
        );
        let features = features_result
            .map_err(|e| PipelineError::Internal(format!("Featurization panicked: {}", e)))?;
        let grades = grades_result.map_err(|e| match e {
            ClientError::Cancelled => PipelineError::Cancelled,
            other => PipelineError::Internal(other.to_string()),
        })?;
        let degraded_windows = grades.iter().filter(|g| g.is_sentinel()).count();
        if degraded_windows > 0 {
            warn!(
                degraded = degraded_windows,
                total = windows.len(),
                "Some windows have sentinel grades and are excluded from selection"
            );
        }

        transition(&mut state, JobState::Ranking);
        ensure_live(cancel_rx)?;
        let clips = rank_windows(&windows, &features, &grades, k, &self.config.rank_weights);
        info!(selected = clips.len(), requested = k, "Clips selected");

        transition(&mut state, JobState::Planning);
        ensure_live(cancel_rx)?;
        let source_info = probe_video(&media.local_path).await?;
        let encoder = probe_encoder().await;
        std::fs::create_dir_all(&self.config.output_dir)?;
        let plans: Vec<RenderPlan> = clips
            .iter()
            .map(|clip| {
                let (lo, hi) = clip.window.token_span;
                build_render_plan(
                    clip,
                    &transcript.tokens()[lo..=hi],
                    &media.id,
                    &media.local_path,
                    &self.config.output_dir,
                    media.duration_seconds,
                    source_info.fps,
                    encoder,
                    CropStrategy::Center,
                )
            })
            .collect();

        transition(&mut state, JobState::Rendering);
        ensure_live(cancel_rx)?;
        let outcomes = self
            .render_all(clips, plans, &media, arena.path(), cancel_tx, cancel_rx)
            .await?;

        let rows: Vec<ClipLogRow> = outcomes
            .iter()
            .map(|o| {
                let path = o.file_path.as_ref().map(|p| p.to_string_lossy().into_owned());
                ClipLogRow::from_clip(&media.id, &o.clip, path.as_deref(), o.error.as_deref())
            })
            .collect();
        let log_path = write_job_log(&self.config.output_dir, &media.id, &rows)?;

        transition(&mut state, JobState::Done);
        Ok(JobReport {
            media_id: media.id,
            outcomes,
            log_path,
            windows_considered: windows.len(),
            degraded_windows,
        })
    }

    async fn ingest(&self, source_url: &str, scratch: &Path) -> PipelineResult<MediaAsset> {
        let retry_config = RetryConfig::ingest("ingest");
        let attempt = retry_async(
            &retry_config,
            || fetch(source_url, scratch),
            MediaError::is_retryable,
        );

        match tokio::time::timeout(INGEST_TIMEOUT, attempt).await {
            Ok(Ok(media)) => Ok(media),
            Ok(Err(e)) => Err(PipelineError::Ingest(e.to_string())),
            Err(_) => Err(PipelineError::ingest(format!(
                "Timed out after {}s",
                INGEST_TIMEOUT.as_secs()
            ))),
        }
    }

    /// Render every selected clip with bounded concurrency.
    ///
    /// Clip failures are isolated: a failed render records its error and
    /// the rest proceed (unless `cancel_on_first_failure` is set).
    async fn render_all(
        &self,
        clips: Vec<RankedClip>,
        plans: Vec<RenderPlan>,
        media: &MediaAsset,
        scratch: &Path,
        cancel_tx: &watch::Sender<bool>,
        cancel_rx: &watch::Receiver<bool>,
    ) -> PipelineResult<Vec<ClipOutcome>> {
        let in_flight = AtomicUsize::new(0);
        let mut outcomes: Vec<Option<ClipOutcome>> = Vec::with_capacity(clips.len());
        outcomes.resize_with(clips.len(), || None);

        let mut results = stream::iter(clips.into_iter().zip(plans).enumerate())
            .map(|(idx, (clip, plan))| {
                let in_flight = &in_flight;
                let cancel_rx = cancel_rx.clone();
                async move {
                    if *cancel_rx.borrow() {
                        return (idx, clip, Err(MediaError::Cancelled));
                    }
                    wait_for_scratch_quota(scratch, in_flight, &cancel_rx).await;

                    in_flight.fetch_add(1, Ordering::SeqCst);
                    let result = self.render_one(&plan, media, &cancel_rx).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    (idx, clip, result.map(|()| plan.output_path))
                }
            })
            .buffer_unordered(self.config.render_concurrency);

        let mut cancelled = false;
        let mut failure_seen = false;
        while let Some((idx, clip, result)) = results.next().await {
            let outcome = match result {
                Ok(path) => {
                    info!(window_id = %clip.window.id, rank = clip.rank, "Clip rendered");
                    ClipOutcome {
                        clip,
                        file_path: Some(path),
                        error: None,
                    }
                }
                Err(MediaError::Cancelled) => {
                    cancelled = true;
                    ClipOutcome {
                        clip,
                        file_path: None,
                        error: Some("cancelled".to_string()),
                    }
                }
                Err(e) => {
                    warn!(window_id = %clip.window.id, "Clip render failed: {}", e);
                    failure_seen = true;
                    if self.config.cancel_on_first_failure {
                        let _ = cancel_tx.send(true);
                    }
                    ClipOutcome {
                        clip,
                        file_path: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes[idx] = Some(outcome);
        }

        // Cancellation observed mid-render either came from outside (the
        // job is cancelled) or from cancel_on_first_failure tripping the
        // internal channel (the job completes with recorded failures).
        if cancelled && !(self.config.cancel_on_first_failure && failure_seen) {
            return Err(PipelineError::Cancelled);
        }

        Ok(outcomes
            .into_iter()
            .map(|o| o.expect("every clip produced an outcome"))
            .collect())
    }

    /// Render one plan, retrying once on the CPU encoder.
    async fn render_one(
        &self,
        plan: &RenderPlan,
        media: &MediaAsset,
        cancel_rx: &watch::Receiver<bool>,
    ) -> Result<(), MediaError> {
        let encoding = EncodingConfig::new(plan.encoder_profile, self.config.render_quality);

        match execute_plan(plan, &encoding, media.sample_rate_hint, Some(cancel_rx.clone())).await
        {
            Ok(()) => Ok(()),
            Err(MediaError::Cancelled) => Err(MediaError::Cancelled),
            Err(first) => {
                warn!(
                    output = %plan.output_path.display(),
                    "Render failed, retrying on CPU encoder: {}",
                    first
                );
                execute_plan(
                    plan,
                    &encoding.cpu_fallback(),
                    media.sample_rate_hint,
                    Some(cancel_rx.clone()),
                )
                .await
            }
        }
    }
}

/// Fail with `Cancelled` if the cancel signal is set.
fn ensure_live(cancel_rx: &watch::Receiver<bool>) -> PipelineResult<()> {
    if *cancel_rx.borrow() {
        Err(PipelineError::Cancelled)
    } else {
        Ok(())
    }
}

fn transition(state: &mut JobState, next: JobState) {
    info!(from = %state, to = %next, "Stage transition");
    *state = next;
}

fn map_asr_error(e: ClientError) -> PipelineError {
    match e {
        ClientError::Cancelled => PipelineError::Cancelled,
        other => PipelineError::Asr(other.to_string()),
    }
}

/// Forward an external cancel signal into the job's internal channel.
fn forward_cancellation(mut external: watch::Receiver<bool>, internal: watch::Sender<bool>) {
    tokio::spawn(async move {
        loop {
            if *external.borrow() {
                let _ = internal.send(true);
                return;
            }
            if external.changed().await.is_err() {
                return;
            }
        }
    });
}

/// Hold new render tasks while the scratch directory is over quota and
/// earlier renders are still finalizing.
async fn wait_for_scratch_quota(
    scratch: &Path,
    in_flight: &AtomicUsize,
    cancel_rx: &watch::Receiver<bool>,
) {
    loop {
        if *cancel_rx.borrow() {
            return;
        }
        if in_flight.load(Ordering::SeqCst) == 0 {
            return;
        }
        if dir_size_bytes(scratch) <= SCRATCH_QUOTA_BYTES {
            return;
        }
        info!("Scratch directory over quota, waiting for renders to finalize");
        tokio::time::sleep(QUOTA_POLL_INTERVAL).await;
    }
}

/// Recursive directory size; errors count as zero.
fn dir_size_bytes(path: &Path) -> u64 {
    let mut total = 0u64;
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };
    for entry in entries.flatten() {
        match entry.metadata() {
            Ok(meta) if meta.is_dir() => total += dir_size_bytes(&entry.path()),
            Ok(meta) => total += meta.len(),
            Err(_) => {}
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliprank_models::{LlmGrade, TextFeatures, Window};

    fn outcome(rank: usize, rendered: bool) -> ClipOutcome {
        ClipOutcome {
            clip: RankedClip {
                window: Window::new("m", 0.0, 90.0, (0, 0), "t".into(), 0),
                features: TextFeatures::default(),
                grade: LlmGrade::from_raw(3, vec![], vec![]),
                final_score: 0.4,
                rank,
            },
            file_path: rendered.then(|| PathBuf::from("/out/clip.mp4")),
            error: (!rendered).then(|| "render failed".to_string()),
        }
    }

    #[test]
    fn test_report_counts() {
        let report = JobReport {
            media_id: "m".into(),
            outcomes: vec![outcome(1, true), outcome(2, false), outcome(3, true)],
            log_path: PathBuf::from("/out/m_clips_log.csv"),
            windows_considered: 10,
            degraded_windows: 2,
        };
        assert_eq!(report.produced(), 2);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_ensure_live() {
        let (tx, rx) = watch::channel(false);
        assert!(ensure_live(&rx).is_ok());
        tx.send(true).unwrap();
        assert!(matches!(ensure_live(&rx), Err(PipelineError::Cancelled)));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(JobState::Transcribing.to_string(), "transcribing");
        assert_eq!(JobState::Done.to_string(), "done");
    }

    #[test]
    fn test_dir_size_missing_path_is_zero() {
        assert_eq!(dir_size_bytes(Path::new("/nonexistent/cliprank")), 0);
    }

    #[tokio::test]
    async fn test_forward_cancellation() {
        let (ext_tx, ext_rx) = watch::channel(false);
        let (int_tx, int_rx) = watch::channel(false);
        forward_cancellation(ext_rx, int_tx);

        ext_tx.send(true).unwrap();
        // Give the forwarder a moment to observe the change.
        for _ in 0..50 {
            if *int_rx.borrow() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(*int_rx.borrow());
    }
}
