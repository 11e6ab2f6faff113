//! Shared value types for the cliprank pipeline.
//!
//! Everything in this crate is value-semantic and free of I/O: media
//! descriptors, word-timestamped transcripts, scene cuts, candidate
//! windows, feature vectors, grades, ranked clips and render plans.
//! Invariants are enforced at construction boundaries so downstream
//! stages can rely on them without re-checking.

pub mod clip;
pub mod encoding;
pub mod features;
pub mod grade;
pub mod media;
pub mod plan;
pub mod scene;
pub mod timestamp;
pub mod transcript;
pub mod window;

pub use clip::{ClipLogRow, RankedClip};
pub use encoding::{EncoderProfile, EncodingConfig, RenderQuality};
pub use features::TextFeatures;
pub use grade::LlmGrade;
pub use media::{media_id_from_url, MediaAsset};
pub use plan::{CropStrategy, RenderPlan, SubtitleEvent, TARGET_FPS, TARGET_HEIGHT, TARGET_WIDTH};
pub use scene::SceneCut;
pub use timestamp::{format_ass_time, format_seconds, format_srt_time};
pub use transcript::{Token, Transcript};
pub use window::Window;
