//! Pipeline configuration.
//!
//! One immutable configuration value is constructed at startup (defaults,
//! optionally overlaid by a JSON file) and threaded through the
//! orchestrator to every stage. Unknown keys in the file are rejected.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use cliprank_models::RenderQuality;

use crate::error::{PipelineError, PipelineResult};

/// Window generation parameters, all in seconds.
#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    /// Target window length.
    pub duration: f64,
    /// Anchor stride.
    pub stride: f64,
    /// Minimum acceptable window length.
    pub min: f64,
    /// Maximum acceptable window length.
    pub max: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            duration: 90.0,
            stride: 15.0,
            min: 45.0,
            max: 120.0,
        }
    }
}

/// Blend weights for the final ranking score.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RankWeights {
    pub coverage: f64,
    pub density: f64,
    pub cogency: f64,
    pub quote_bonus: f64,
    pub scene_cut_penalty: f64,
    pub filler_penalty: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            coverage: 0.35,
            density: 0.20,
            cogency: 0.25,
            quote_bonus: 0.10,
            scene_cut_penalty: 0.05,
            filler_penalty: 0.05,
        }
    }
}

/// Immutable pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PipelineConfig {
    /// Base URL of the transcription endpoint.
    pub whisper_server_url: String,
    /// Base URL of the chat-completion endpoint.
    pub chat_server_url: String,
    /// Model name sent to the transcription endpoint.
    pub whisper_model: String,
    /// Model name sent to the chat endpoint.
    pub chat_model: String,
    pub window_duration: f64,
    pub window_stride: f64,
    pub window_min: f64,
    pub window_max: f64,
    /// Maximum in-flight grading requests.
    pub grader_concurrency: usize,
    /// Maximum concurrent render jobs.
    pub render_concurrency: usize,
    pub render_quality: RenderQuality,
    pub output_dir: PathBuf,
    /// Cancel the whole job as soon as any clip fails to render.
    pub cancel_on_first_failure: bool,
    /// FFmpeg scene score threshold for cut detection.
    pub scene_threshold: f64,
    /// Ranking blend weights.
    pub rank_weights: RankWeights,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            whisper_server_url: "http://localhost:8000".to_string(),
            chat_server_url: "http://localhost:8001".to_string(),
            whisper_model: "openai/whisper-large-v3".to_string(),
            chat_model: "meta-llama/Llama-3.1-8B-Instruct".to_string(),
            window_duration: 90.0,
            window_stride: 15.0,
            window_min: 45.0,
            window_max: 120.0,
            grader_concurrency: 4,
            render_concurrency: 2,
            render_quality: RenderQuality::Medium,
            output_dir: PathBuf::from("rendered_clips"),
            cancel_on_first_failure: false,
            scene_threshold: 0.4,
            rank_weights: RankWeights::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file over the defaults.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            PipelineError::config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.whisper_server_url.trim().is_empty() || self.chat_server_url.trim().is_empty() {
            return Err(PipelineError::config("Server URLs must be non-empty"));
        }
        if self.window_stride <= 0.0 {
            return Err(PipelineError::config("window_stride must be positive"));
        }
        if self.window_min <= 0.0
            || self.window_min > self.window_duration
            || self.window_duration > self.window_max
        {
            return Err(PipelineError::config(
                "window lengths must satisfy 0 < window_min <= window_duration <= window_max",
            ));
        }
        if self.grader_concurrency == 0 || self.render_concurrency == 0 {
            return Err(PipelineError::config("concurrency values must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.scene_threshold) {
            return Err(PipelineError::config("scene_threshold must be in [0, 1]"));
        }
        Ok(())
    }

    pub fn window_config(&self) -> WindowConfig {
        WindowConfig {
            duration: self.window_duration,
            stride: self.window_stride,
            min: self.window_min,
            max: self.window_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.window_duration, 90.0);
        assert_eq!(config.grader_concurrency, 4);
        assert_eq!(config.render_concurrency, 2);
    }

    #[test]
    fn test_default_weights_match_readme_values() {
        let w = RankWeights::default();
        assert_eq!(w.coverage, 0.35);
        assert_eq!(w.density, 0.20);
        assert_eq!(w.cogency, 0.25);
        assert_eq!(w.quote_bonus, 0.10);
        assert_eq!(w.scene_cut_penalty, 0.05);
        assert_eq!(w.filler_penalty, 0.05);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let json = r#"{"window_duration": 60.0, "not_a_key": true}"#;
        let result: Result<PipelineConfig, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_file_overlays_defaults() {
        let json = r#"{"window_duration": 60.0, "grader_concurrency": 8}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.window_duration, 60.0);
        assert_eq!(config.grader_concurrency, 8);
        assert_eq!(config.window_stride, 15.0);
    }

    #[test]
    fn test_invalid_window_lengths() {
        let mut config = PipelineConfig::default();
        config.window_min = 200.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.window_stride = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = PipelineConfig::default();
        config.render_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
