//! LLM grading results.

use serde::{Deserialize, Serialize};

/// Maximum quotes kept per grade.
pub const MAX_QUOTES: usize = 3;
/// Maximum length of a kept quote, in characters.
pub const MAX_QUOTE_CHARS: usize = 240;
/// Maximum salient terms kept per grade.
pub const MAX_SALIENT_TERMS: usize = 8;

/// Cogency judgment for one window, as returned by the grader.
///
/// A `cogency` of 0 is the sentinel for a failed or malformed grade; the
/// ranker excludes sentinel-graded windows from selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmGrade {
    /// 1..=5 judgment, or 0 for the sentinel.
    pub cogency: u8,
    /// Up to 3 quote-worthy sentences, each <= 240 chars.
    pub quotes: Vec<String>,
    /// Up to 8 salient non-stopword terms.
    pub salient_terms: Vec<String>,
}

impl LlmGrade {
    /// Build a grade from raw model output, clamping to the contract.
    pub fn from_raw(cogency: i64, quotes: Vec<String>, salient_terms: Vec<String>) -> Self {
        let cogency = cogency.clamp(1, 5) as u8;
        let quotes = quotes
            .into_iter()
            .filter(|q| !q.trim().is_empty())
            .map(|q| truncate_chars(q.trim(), MAX_QUOTE_CHARS))
            .take(MAX_QUOTES)
            .collect();
        let salient_terms = salient_terms
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.trim().to_string())
            .take(MAX_SALIENT_TERMS)
            .collect();
        Self {
            cogency,
            quotes,
            salient_terms,
        }
    }

    /// Distinguished value for a window whose grading failed.
    pub fn sentinel() -> Self {
        Self {
            cogency: 0,
            quotes: Vec::new(),
            salient_terms: Vec::new(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.cogency == 0
    }

    /// Quote bonus term for the ranking formula: `min(1, quotes / 3)`.
    pub fn quote_bonus(&self) -> f64 {
        (self.quotes.len() as f64 / MAX_QUOTES as f64).min(1.0)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_clamps() {
        let g = LlmGrade::from_raw(
            9,
            vec!["q1".into(), "q2".into(), "q3".into(), "q4".into()],
            (0..12).map(|i| format!("t{}", i)).collect(),
        );
        assert_eq!(g.cogency, 5);
        assert_eq!(g.quotes.len(), 3);
        assert_eq!(g.salient_terms.len(), 8);

        let g = LlmGrade::from_raw(-3, vec![], vec![]);
        assert_eq!(g.cogency, 1);
    }

    #[test]
    fn test_quote_truncation() {
        let long = "x".repeat(500);
        let g = LlmGrade::from_raw(3, vec![long], vec![]);
        assert_eq!(g.quotes[0].chars().count(), MAX_QUOTE_CHARS);
    }

    #[test]
    fn test_sentinel() {
        let s = LlmGrade::sentinel();
        assert!(s.is_sentinel());
        assert_eq!(s.quote_bonus(), 0.0);
        assert!(!LlmGrade::from_raw(1, vec![], vec![]).is_sentinel());
    }

    #[test]
    fn test_quote_bonus() {
        let g = LlmGrade::from_raw(4, vec!["a".into(), "b".into()], vec![]);
        assert!((g.quote_bonus() - 2.0 / 3.0).abs() < 1e-9);
        let g = LlmGrade::from_raw(4, vec!["a".into(), "b".into(), "c".into()], vec![]);
        assert!((g.quote_bonus() - 1.0).abs() < 1e-9);
    }
}
