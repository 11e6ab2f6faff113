//! Keyphrase extraction.
//!
//! Two extractors run over each window and their outputs are unioned:
//!
//! 1. An embedding extractor: candidate phrases are scored by cosine
//!    similarity between a hashed character-ngram phrase embedding and
//!    the document centroid. This mirrors model-based extractors while
//!    staying deterministic and offline.
//! 2. A statistical extractor: YAKE-style word statistics (frequency,
//!    first position, dispersion across the text) combined per phrase.
//!
//! Each extractor returns up to [`MAX_PHRASES`] candidates with scores
//! min-max normalized to [0, 1]; the final weight of a phrase is the max
//! across extractors.

use std::collections::HashMap;

use crate::stopwords::is_stopword;
use crate::tokenize::words;

/// Maximum phrases returned per extractor.
pub const MAX_PHRASES: usize = 10;

/// Embedding dimensionality for the hashed ngram vectors.
const EMBED_DIM: usize = 64;

/// Block size (in tokens) for the dispersion statistic.
const SPREAD_BLOCK: usize = 25;

/// Extract keyphrases from a text: union of both extractors, weight =
/// max across them, ordered by weight descending (phrase text breaks
/// ties so output order is fully deterministic).
pub fn extract_keyphrases(text: &str) -> Vec<(String, f64)> {
    let tokens = words(text);
    if tokens.is_empty() {
        return Vec::new();
    }

    let candidates = candidate_phrases(&tokens);
    if candidates.is_empty() {
        return Vec::new();
    }

    let embed = embedding_scores(&tokens, &candidates);
    let stat = statistical_scores(&tokens, &candidates);

    let mut merged: HashMap<String, f64> = HashMap::new();
    for (phrase, score) in embed.into_iter().chain(stat) {
        let entry = merged.entry(phrase).or_insert(0.0);
        if score > *entry {
            *entry = score;
        }
    }

    let mut out: Vec<(String, f64)> = merged.into_iter().collect();
    out.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    out
}

/// Candidate 1-3 grams with their occurrence count and first position.
///
/// Boundary words must be content words; a 3-gram may carry one interior
/// stopword ("state of play").
fn candidate_phrases(tokens: &[String]) -> Vec<Candidate> {
    let mut seen: HashMap<String, Candidate> = HashMap::new();

    for n in 1..=3usize {
        for (i, gram) in tokens.windows(n).enumerate() {
            if is_stopword(&gram[0]) || is_stopword(&gram[n - 1]) {
                continue;
            }
            if n == 1 && gram[0].len() < 2 {
                continue;
            }
            let phrase = gram.join(" ");
            let entry = seen.entry(phrase.clone()).or_insert(Candidate {
                phrase,
                word_count: n,
                count: 0,
                first_pos: i,
            });
            entry.count += 1;
        }
    }

    let mut candidates: Vec<Candidate> = seen.into_values().collect();
    candidates.sort_by(|a, b| a.phrase.cmp(&b.phrase));
    candidates
}

#[derive(Debug, Clone)]
struct Candidate {
    phrase: String,
    word_count: usize,
    count: usize,
    first_pos: usize,
}

// --- embedding extractor -------------------------------------------------

/// Hashed character-trigram embedding of a word.
fn embed_word(word: &str) -> [f64; EMBED_DIM] {
    let mut v = [0.0; EMBED_DIM];
    let padded: Vec<char> = std::iter::once('^')
        .chain(word.chars())
        .chain(std::iter::once('$'))
        .collect();
    for tri in padded.windows(3) {
        let h = fnv1a(&tri.iter().collect::<String>());
        let idx = (h % EMBED_DIM as u64) as usize;
        let sign = if (h >> 32) & 1 == 0 { 1.0 } else { -1.0 };
        v[idx] += sign;
    }
    v
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x1000_0000_01b3);
    }
    hash
}

fn add_assign(acc: &mut [f64; EMBED_DIM], v: &[f64; EMBED_DIM]) {
    for (a, b) in acc.iter_mut().zip(v.iter()) {
        *a += b;
    }
}

fn cosine(a: &[f64; EMBED_DIM], b: &[f64; EMBED_DIM]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

/// Score candidates by similarity to the document centroid.
fn embedding_scores(tokens: &[String], candidates: &[Candidate]) -> Vec<(String, f64)> {
    let mut doc = [0.0; EMBED_DIM];
    let mut content_words = 0usize;
    for w in tokens.iter().filter(|w| !is_stopword(w)) {
        add_assign(&mut doc, &embed_word(w));
        content_words += 1;
    }
    if content_words == 0 {
        return Vec::new();
    }

    let scored: Vec<(String, f64)> = candidates
        .iter()
        .map(|c| {
            let mut pv = [0.0; EMBED_DIM];
            for w in c.phrase.split(' ') {
                add_assign(&mut pv, &embed_word(w));
            }
            // Repeated phrases are slightly better anchors.
            let freq_boost = 1.0 + (c.count as f64).ln() / 4.0;
            (c.phrase.clone(), cosine(&pv, &doc).max(0.0) * freq_boost)
        })
        .collect();

    top_normalized(scored)
}

// --- statistical extractor -----------------------------------------------

/// Per-word quality statistics, YAKE-style: frequent, early, and evenly
/// dispersed words make better phrase material.
fn word_quality(tokens: &[String]) -> HashMap<String, f64> {
    let total = tokens.len();
    let block_count = total.div_ceil(SPREAD_BLOCK).max(1);

    struct Acc {
        tf: usize,
        first_pos: usize,
        blocks: Vec<bool>,
    }
    let mut stats: HashMap<&str, Acc> = HashMap::new();

    for (i, w) in tokens.iter().enumerate() {
        if is_stopword(w) {
            continue;
        }
        let entry = stats.entry(w.as_str()).or_insert_with(|| Acc {
            tf: 0,
            first_pos: i,
            blocks: vec![false; block_count],
        });
        entry.tf += 1;
        entry.blocks[i / SPREAD_BLOCK] = true;
    }

    let max_tf = stats.values().map(|a| a.tf).max().unwrap_or(1) as f64;

    stats
        .into_iter()
        .map(|(w, acc)| {
            let freq = acc.tf as f64 / max_tf;
            let position = 1.0 / (1.0 + acc.first_pos as f64 / total as f64);
            let spread =
                acc.blocks.iter().filter(|b| **b).count() as f64 / block_count as f64;
            (w.to_string(), freq * position * (0.5 + 0.5 * spread))
        })
        .collect()
}

fn statistical_scores(tokens: &[String], candidates: &[Candidate]) -> Vec<(String, f64)> {
    let quality = word_quality(tokens);
    if quality.is_empty() {
        return Vec::new();
    }

    let scored: Vec<(String, f64)> = candidates
        .iter()
        .map(|c| {
            let word_scores: Vec<f64> = c
                .phrase
                .split(' ')
                .filter_map(|w| quality.get(w).copied())
                .collect();
            if word_scores.is_empty() {
                return (c.phrase.clone(), 0.0);
            }
            let mean = word_scores.iter().sum::<f64>() / word_scores.len() as f64;
            // Multi-word phrases carry more information per mention.
            let length_boost = 1.0 + 0.15 * (c.word_count as f64 - 1.0);
            let freq = (c.count as f64).sqrt();
            (c.phrase.clone(), mean * length_boost * freq)
        })
        .collect();

    top_normalized(scored)
}

/// Keep the top [`MAX_PHRASES`] and min-max normalize scores to [0, 1].
fn top_normalized(mut scored: Vec<(String, f64)>) -> Vec<(String, f64)> {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scored.truncate(MAX_PHRASES);

    if scored.is_empty() {
        return scored;
    }
    let max = scored.first().map(|(_, s)| *s).unwrap_or(0.0);
    let min = scored.last().map(|(_, s)| *s).unwrap_or(0.0);
    let range = max - min;

    for (_, s) in scored.iter_mut() {
        *s = if range > f64::EPSILON {
            (*s - min) / range
        } else if max > 0.0 {
            1.0
        } else {
            0.0
        };
    }
    scored
}
