//! Ranked clips and the per-clip job log row.

use serde::{Deserialize, Serialize};

use crate::features::TextFeatures;
use crate::grade::LlmGrade;
use crate::window::Window;

/// Maximum characters of window text carried into the log preview.
pub const TEXT_PREVIEW_CHARS: usize = 160;

/// A window selected for rendering, with everything that scored it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedClip {
    pub window: Window,
    pub features: TextFeatures,
    pub grade: LlmGrade,
    /// Blended score after clamping to [0, 1].
    pub final_score: f64,
    /// 1-based selection rank.
    pub rank: usize,
}

/// One CSV log row per produced clip.
///
/// Field order matches the emitted column order; list-valued fields are
/// `|`-joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipLogRow {
    pub video_id: String,
    pub rank: usize,
    pub window_id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub keyphrase_score: f64,
    pub density_score: f64,
    pub cogency_score: u8,
    pub final_score: f64,
    pub quotes: String,
    pub salient_terms: String,
    pub keyphrases: String,
    pub scene_cuts: usize,
    pub file_path: String,
    pub text_preview: String,
}

impl ClipLogRow {
    /// Build a log row for a rendered (or failed) clip.
    ///
    /// `file_path` is empty when rendering failed; `error` annotates the
    /// preview so failures stay visible in the log.
    pub fn from_clip(
        video_id: &str,
        clip: &RankedClip,
        file_path: Option<&str>,
        error: Option<&str>,
    ) -> Self {
        let preview = match error {
            Some(e) => format!("error: {} | {}", e, text_preview(&clip.window.text)),
            None => text_preview(&clip.window.text),
        };

        Self {
            video_id: video_id.to_string(),
            rank: clip.rank,
            window_id: clip.window.id.clone(),
            start_time: clip.window.start,
            end_time: clip.window.end,
            keyphrase_score: clip.features.coverage_score,
            density_score: clip.features.density_score,
            cogency_score: clip.grade.cogency,
            final_score: clip.final_score,
            quotes: clip.grade.quotes.join("|"),
            salient_terms: clip.grade.salient_terms.join("|"),
            keyphrases: clip.features.keyphrase_names(10).join("|"),
            scene_cuts: clip.window.contains_scene_cuts,
            file_path: file_path.unwrap_or_default().to_string(),
            text_preview: preview,
        }
    }
}

/// First 160 chars of the text with newlines collapsed to spaces.
fn text_preview(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
        .chars()
        .take(TEXT_PREVIEW_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_clip() -> RankedClip {
        let window = Window::new("vid", 10.0, 100.0, (0, 9), "line one\nline two".into(), 1);
        RankedClip {
            window,
            features: TextFeatures {
                keyphrases: vec![("rust".into(), 0.9), ("memory safety".into(), 0.7)],
                coverage_score: 0.8,
                density_score: 0.6,
                filler_ratio: 0.05,
                scene_cut_penalty: 1.0 / 3.0,
            },
            grade: LlmGrade::from_raw(4, vec!["a quote".into()], vec!["rust".into()]),
            final_score: 0.71,
            rank: 1,
        }
    }

    #[test]
    fn test_preview_collapses_newlines() {
        let row = ClipLogRow::from_clip("vid", &sample_clip(), Some("/out/clip.mp4"), None);
        assert_eq!(row.text_preview, "line one line two");
        assert_eq!(row.file_path, "/out/clip.mp4");
    }

    #[test]
    fn test_preview_truncates() {
        let mut clip = sample_clip();
        clip.window.text = "word ".repeat(100);
        let row = ClipLogRow::from_clip("vid", &clip, None, None);
        assert_eq!(row.text_preview.chars().count(), TEXT_PREVIEW_CHARS);
    }

    #[test]
    fn test_error_annotation() {
        let row = ClipLogRow::from_clip("vid", &sample_clip(), None, Some("render failed"));
        assert!(row.text_preview.starts_with("error: render failed"));
        assert!(row.file_path.is_empty());
    }

    #[test]
    fn test_pipe_joined_lists() {
        let row = ClipLogRow::from_clip("vid", &sample_clip(), None, None);
        assert_eq!(row.keyphrases, "rust|memory safety");
        assert_eq!(row.quotes, "a quote");
    }
}
