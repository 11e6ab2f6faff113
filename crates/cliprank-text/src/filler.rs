//! Filler word and phrase detection.

use crate::tokenize::words;

/// Filler vocabulary, single words and multi-word phrases.
const FILLER_PHRASES: &[&[&str]] = &[
    &["um"],
    &["uh"],
    &["like"],
    &["you", "know"],
    &["i", "mean"],
    &["sort", "of"],
    &["kind", "of"],
    &["basically"],
    &["literally"],
];

/// Fraction of tokens belonging to filler words or phrases, in [0, 1].
///
/// Matching is case-insensitive and phrase-aware: "you know" counts its
/// two tokens once, and longer phrases are matched before shorter ones at
/// the same position.
pub fn filler_ratio(text: &str) -> f64 {
    let tokens = words(text);
    if tokens.is_empty() {
        return 0.0;
    }

    // Longest-match-first so "sort of" wins over a hypothetical "sort".
    let mut phrases: Vec<&[&str]> = FILLER_PHRASES.to_vec();
    phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));

    let mut filler_tokens = 0usize;
    let mut i = 0usize;
    while i < tokens.len() {
        let mut matched = 0usize;
        for phrase in &phrases {
            if phrase.len() <= tokens.len() - i
                && phrase
                    .iter()
                    .zip(&tokens[i..i + phrase.len()])
                    .all(|(p, t)| *p == t.as_str())
            {
                matched = phrase.len();
                break;
            }
        }
        if matched > 0 {
            filler_tokens += matched;
            i += matched;
        } else {
            i += 1;
        }
    }

    filler_tokens as f64 / tokens.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filler() {
        assert_eq!(filler_ratio("the quick brown fox"), 0.0);
    }

    #[test]
    fn test_single_word_fillers() {
        // 2 filler tokens of 4.
        let r = filler_ratio("um well uh yes");
        assert!((r - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_phrase_fillers() {
        // "you know" = 2 filler tokens of 4.
        let r = filler_ratio("you know the answer");
        assert!((r - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_case_insensitive() {
        let r = filler_ratio("Um, LIKE, Basically.");
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_phrase_not_counted() {
        // "you" alone is not a filler.
        assert_eq!(filler_ratio("you said the answer"), 0.0);
    }

    #[test]
    fn test_empty() {
        assert_eq!(filler_ratio(""), 0.0);
    }
}
