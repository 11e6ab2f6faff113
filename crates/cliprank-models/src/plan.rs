//! Per-clip render plans.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::encoding::EncoderProfile;

/// Output width in pixels (9:16 portrait).
pub const TARGET_WIDTH: u32 = 1080;
/// Output height in pixels.
pub const TARGET_HEIGHT: u32 = 1920;
/// Output frame-rate ceiling.
pub const TARGET_FPS: u32 = 30;

/// How the portrait crop window is placed over the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropStrategy {
    /// Fixed center crop.
    Center,
    /// Per-frame crop rectangles from a face tracker. The default tracker
    /// implementation degrades to center crop.
    FaceTrackStub,
}

impl Default for CropStrategy {
    fn default() -> Self {
        Self::Center
    }
}

/// One burned-in caption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEvent {
    /// Start time in seconds, relative to the cut.
    pub start: f64,
    /// End time in seconds, relative to the cut.
    pub end: f64,
    pub text: String,
    pub speaker_label: Option<String>,
}

/// Everything the renderer needs to produce one output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderPlan {
    /// Seek position into the source, seconds.
    pub cut_start: f64,
    /// End position, seconds; `cut_end - cut_start` is the clip duration.
    pub cut_end: f64,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub crop_strategy: CropStrategy,
    pub subtitle_events: Vec<SubtitleEvent>,
    pub encoder_profile: EncoderProfile,
    /// (width, height), always portrait.
    pub target_resolution: (u32, u32),
    /// Capped at the source fps.
    pub target_fps: u32,
}

impl RenderPlan {
    pub fn duration(&self) -> f64 {
        self.cut_end - self.cut_start
    }
}
