//! Job-wide corpus statistics.

use std::collections::{HashMap, HashSet};

use crate::stopwords::is_stopword;
use crate::tokenize::words;

/// Fraction of the vocabulary (by IDF, descending) considered "rare
/// enough" for coverage credit.
const TOP_IDF_FRACTION: f64 = 0.05;

/// IDF statistics over all window texts in one job.
///
/// Fitted once per job; the top-5% IDF vocabulary backs the coverage
/// score. Deterministic: ties in IDF resolve by term ordering.
#[derive(Debug, Clone, Default)]
pub struct CorpusStats {
    idf: HashMap<String, f64>,
    top_vocabulary: HashSet<String>,
}

impl CorpusStats {
    /// Fit IDF over the window texts of a job.
    pub fn fit<S: AsRef<str>>(texts: &[S]) -> Self {
        let doc_count = texts.len();
        if doc_count == 0 {
            return Self::default();
        }

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            let mut seen: HashSet<String> = HashSet::new();
            for w in words(text.as_ref()) {
                if !is_stopword(&w) {
                    seen.insert(w);
                }
            }
            for w in seen {
                *doc_freq.entry(w).or_insert(0) += 1;
            }
        }

        let n = doc_count as f64;
        let idf: HashMap<String, f64> = doc_freq
            .into_iter()
            .map(|(w, df)| {
                let value = (n / (1.0 + df as f64)).ln() + 1.0;
                (w, value)
            })
            .collect();

        // Top 5% of terms by IDF; term text breaks ties.
        let mut ranked: Vec<(&String, f64)> = idf.iter().map(|(w, v)| (w, *v)).collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        let keep = ((ranked.len() as f64 * TOP_IDF_FRACTION).ceil() as usize).max(1);
        let top_vocabulary: HashSet<String> =
            ranked.into_iter().take(keep).map(|(w, _)| w.clone()).collect();

        Self {
            idf,
            top_vocabulary,
        }
    }

    /// IDF of a term, if seen during fitting.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    /// Whether a phrase touches the high-IDF vocabulary: true when any
    /// of its content words is in the top-5% set.
    pub fn phrase_in_top_vocabulary(&self, phrase: &str) -> bool {
        phrase
            .split(' ')
            .any(|w| self.top_vocabulary.contains(w))
    }

    /// Raw coverage for one window: the sum of keyphrase weights whose
    /// phrase touches the high-IDF vocabulary. Min-max normalization
    /// across the job happens in the feature assembly step.
    pub fn raw_coverage(&self, keyphrases: &[(String, f64)]) -> f64 {
        keyphrases
            .iter()
            .filter(|(p, _)| self.phrase_in_top_vocabulary(p))
            .map(|(_, w)| w)
            .sum()
    }
}
