//! Word-timestamped transcript types.

use serde::{Deserialize, Serialize};

/// Tolerance for token end times past the media duration (seconds).
pub const DURATION_TOLERANCE: f64 = 0.25;

/// A single word-level transcript unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Word text, trimmed, never empty.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds, >= start.
    pub end: f64,
    /// ASR confidence in [0, 1], when reported.
    pub confidence: Option<f64>,
    /// Speaker label pass-through, when reported.
    pub speaker_label: Option<String>,
}

impl Token {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            confidence: None,
            speaker_label: None,
        }
    }
}

/// Immutable ordered sequence of tokens.
///
/// Construction normalizes the raw ASR output: empty tokens are dropped,
/// regressions in start/end times are clamped so both sequences are
/// non-decreasing, and tokens ending past `duration + 0.25s` are clipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    tokens: Vec<Token>,
}

impl Transcript {
    /// Normalize raw tokens into a transcript.
    pub fn from_raw_tokens(raw: Vec<Token>, duration_seconds: f64) -> Self {
        let limit = duration_seconds + DURATION_TOLERANCE;
        let mut tokens: Vec<Token> = Vec::with_capacity(raw.len());
        let mut last_start = 0.0f64;
        let mut last_end = 0.0f64;

        for mut tok in raw {
            let text = tok.text.trim();
            if text.is_empty() {
                continue;
            }
            tok.text = text.to_string();

            if !tok.start.is_finite() || !tok.end.is_finite() {
                continue;
            }
            tok.start = tok.start.max(0.0);
            tok.end = tok.end.max(tok.start);

            // Enforce non-decreasing order (overlaps permitted).
            tok.start = tok.start.max(last_start);
            tok.end = tok.end.max(last_end).max(tok.start);

            if tok.start > limit {
                continue;
            }
            tok.end = tok.end.min(limit);

            if let Some(c) = tok.confidence {
                tok.confidence = Some(c.clamp(0.0, 1.0));
            }

            last_start = tok.start;
            last_end = tok.end;
            tokens.push(tok);
        }

        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Start of the first token, or 0.0 for an empty transcript.
    pub fn span_start(&self) -> f64 {
        self.tokens.first().map(|t| t.start).unwrap_or(0.0)
    }

    /// End of the last token, or 0.0 for an empty transcript.
    pub fn span_end(&self) -> f64 {
        self.tokens.last().map(|t| t.end).unwrap_or(0.0)
    }

    /// Index of the first token with `start >= t`.
    pub fn first_token_at_or_after(&self, t: f64) -> Option<usize> {
        self.tokens.iter().position(|tok| tok.start >= t)
    }

    /// Joined text over an inclusive token index range.
    pub fn join_text(&self, span: (usize, usize)) -> String {
        let (lo, hi) = span;
        self.tokens[lo..=hi]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
