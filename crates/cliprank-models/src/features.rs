//! Per-window text feature signals.

use serde::{Deserialize, Serialize};

/// Feature signals computed over a window's text, all in [0, 1].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextFeatures {
    /// Extracted keyphrases with their blended weights.
    pub keyphrases: Vec<(String, f64)>,
    /// How much of the job-wide high-IDF vocabulary the window covers.
    pub coverage_score: f64,
    /// Information density (lexical diversity, entropy, content ratio).
    pub density_score: f64,
    /// Fraction of tokens that are filler words/phrases.
    pub filler_ratio: f64,
    /// Penalty for interior scene cuts, `min(1, cuts / 3)`.
    pub scene_cut_penalty: f64,
}

impl TextFeatures {
    /// Top keyphrase strings, for logging.
    pub fn keyphrase_names(&self, limit: usize) -> Vec<String> {
        self.keyphrases
            .iter()
            .take(limit)
            .map(|(p, _)| p.clone())
            .collect()
    }
}
