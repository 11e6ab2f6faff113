//! Information density statistics.

use std::collections::HashMap;

use crate::stopwords::is_stopword;
use crate::tokenize::words;

const W_DIVERSITY: f64 = 0.4;
const W_ENTROPY: f64 = 0.3;
const W_CONTENT: f64 = 0.3;

/// Information density of a text span, in [0, 1].
///
/// Weighted average of three measurements:
/// - type/token ratio over stopword-filtered tokens (0.4)
/// - Shannon entropy of the filtered unigram distribution, normalized by
///   `ln(N)` (0.3)
/// - content-word ratio, non-stopword over total tokens (0.3)
pub fn density_score(text: &str) -> f64 {
    let all = words(text);
    if all.is_empty() {
        return 0.0;
    }

    let content: Vec<&String> = all.iter().filter(|w| !is_stopword(w)).collect();
    let content_ratio = content.len() as f64 / all.len() as f64;

    if content.is_empty() {
        return (W_CONTENT * content_ratio).clamp(0.0, 1.0);
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for w in &content {
        *counts.entry(w.as_str()).or_insert(0) += 1;
    }

    let n = content.len() as f64;
    let diversity = counts.len() as f64 / n;

    let entropy: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum();
    let normalized_entropy = if n > 1.0 { entropy / n.ln() } else { 0.0 };

    let score =
        W_DIVERSITY * diversity + W_ENTROPY * normalized_entropy + W_CONTENT * content_ratio;
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert_eq!(density_score(""), 0.0);
        assert_eq!(density_score("   "), 0.0);
    }

    #[test]
    fn test_range() {
        let score = density_score("the quick brown fox jumps over the lazy dog");
        assert!(score > 0.0 && score <= 1.0);
    }

    #[test]
    fn test_repetition_scores_lower_than_variety() {
        let repeated = density_score("word word word word word word word word");
        let varied = density_score("quantum entanglement drives superconducting qubit coherence experiments forward");
        assert!(varied > repeated);
    }

    #[test]
    fn test_stopword_only_text() {
        let score = density_score("the and of to in it");
        assert!(score >= 0.0 && score < 0.1);
    }

    #[test]
    fn test_deterministic() {
        let text = "neural networks learn representations of structure in data";
        assert_eq!(density_score(text), density_score(text));
    }
}
