//! Candidate clip windows over the transcript.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A candidate clip interval with boundaries snapped to token and scene
/// structure. Produced by the windower; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    /// Deterministic id derived from `(media_id, start, end)`.
    pub id: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds, > start.
    pub end: f64,
    /// Inclusive token index range into the transcript.
    pub token_span: (usize, usize),
    /// Joined token text for the span.
    pub text: String,
    /// Number of scene cuts strictly interior to (start, end).
    pub contains_scene_cuts: usize,
}

impl Window {
    pub fn new(
        media_id: &str,
        start: f64,
        end: f64,
        token_span: (usize, usize),
        text: String,
        contains_scene_cuts: usize,
    ) -> Self {
        Self {
            id: window_id(media_id, start, end),
            start,
            end,
            token_span,
            text,
            contains_scene_cuts,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Number of tokens covered by this window.
    pub fn token_count(&self) -> usize {
        self.token_span.1 - self.token_span.0 + 1
    }

    /// Overlap with another window as a fraction of this window's
    /// token span.
    pub fn token_overlap_ratio(&self, other: &Window) -> f64 {
        let lo = self.token_span.0.max(other.token_span.0);
        let hi = self.token_span.1.min(other.token_span.1);
        if hi < lo {
            return 0.0;
        }
        (hi - lo + 1) as f64 / self.token_count() as f64
    }

    /// Temporal intersection with `[start, end)` in seconds.
    pub fn time_overlap(&self, start: f64, end: f64) -> f64 {
        (self.end.min(end) - self.start.max(start)).max(0.0)
    }
}

/// Deterministic window id: hash of the media id and the boundary times
/// at millisecond resolution.
fn window_id(media_id: &str, start: f64, end: f64) -> String {
    let key = format!(
        "{}:{}:{}",
        media_id,
        (start * 1000.0).round() as i64,
        (end * 1000.0).round() as i64
    );
    let digest = Sha256::digest(key.as_bytes());
    let hex: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
    format!("w{}", hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_deterministic() {
        let a = Window::new("vid", 10.0, 100.0, (0, 9), "text".into(), 0);
        let b = Window::new("vid", 10.0, 100.0, (5, 20), "other".into(), 2);
        assert_eq!(a.id, b.id);

        let c = Window::new("vid", 10.0, 100.5, (0, 9), "text".into(), 0);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_token_overlap_ratio() {
        let a = Window::new("v", 0.0, 10.0, (0, 9), String::new(), 0);
        let b = Window::new("v", 5.0, 15.0, (5, 14), String::new(), 0);
        // Tokens 5..=9 shared: 5 of a's 10.
        assert!((a.token_overlap_ratio(&b) - 0.5).abs() < 1e-9);

        let c = Window::new("v", 20.0, 30.0, (20, 29), String::new(), 0);
        assert_eq!(a.token_overlap_ratio(&c), 0.0);
    }

    #[test]
    fn test_time_overlap() {
        let w = Window::new("v", 10.0, 20.0, (0, 0), String::new(), 0);
        assert!((w.time_overlap(15.0, 25.0) - 5.0).abs() < 1e-9);
        assert_eq!(w.time_overlap(20.0, 30.0), 0.0);
        assert!((w.time_overlap(0.0, 100.0) - 10.0).abs() < 1e-9);
    }
}
