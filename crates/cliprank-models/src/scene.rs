//! Scene cut timestamps.

use serde::{Deserialize, Serialize};

/// Minimum spacing between distinct scene cuts (seconds).
pub const DEDUP_WINDOW: f64 = 0.5;

/// A detected visual discontinuity in the source media.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneCut {
    /// Time in seconds, within [0, duration].
    pub time: f64,
}

impl SceneCut {
    pub fn new(time: f64) -> Self {
        Self { time }
    }

    /// Normalize raw cut times: clamp to the media span, sort ascending,
    /// and drop cuts within 0.5s of their predecessor.
    pub fn normalize(raw: Vec<f64>, duration_seconds: f64) -> Vec<SceneCut> {
        let mut times: Vec<f64> = raw
            .into_iter()
            .filter(|t| t.is_finite())
            .map(|t| t.max(0.0).min(duration_seconds))
            .collect();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mut cuts: Vec<SceneCut> = Vec::with_capacity(times.len());
        for t in times {
            match cuts.last() {
                Some(prev) if t - prev.time < DEDUP_WINDOW => {}
                _ => cuts.push(SceneCut::new(t)),
            }
        }
        cuts
    }
}

/// Count cuts strictly interior to `(start, end)`.
pub fn cuts_within(cuts: &[SceneCut], start: f64, end: f64) -> usize {
    cuts.iter()
        .filter(|c| c.time > start && c.time < end)
        .count()
}

/// Nearest cut to `t`, if any, with its distance.
pub fn nearest_cut(cuts: &[SceneCut], t: f64) -> Option<(SceneCut, f64)> {
    cuts.iter()
        .map(|c| (*c, (c.time - t).abs()))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sorts_and_dedups() {
        let cuts = SceneCut::normalize(vec![10.0, 3.0, 3.3, 3.9, 20.0], 100.0);
        let times: Vec<f64> = cuts.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![3.0, 3.9, 10.0, 20.0]);
    }

    #[test]
    fn test_normalize_clamps_to_media_span() {
        // Out-of-range cuts are clamped to the span edges, not dropped.
        let cuts = SceneCut::normalize(vec![-1.0, 5.0, 150.0], 100.0);
        let times: Vec<f64> = cuts.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![0.0, 5.0, 100.0]);
    }

    #[test]
    fn test_clamped_cuts_dedup_at_edges() {
        // Several cuts past the end collapse onto one cut at the edge.
        let cuts = SceneCut::normalize(vec![150.0, 200.0, 100.2], 100.0);
        let times: Vec<f64> = cuts.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![100.0]);
    }

    #[test]
    fn test_cuts_within_is_strict() {
        let cuts = SceneCut::normalize(vec![10.0, 20.0, 30.0], 100.0);
        assert_eq!(cuts_within(&cuts, 10.0, 30.0), 1);
        assert_eq!(cuts_within(&cuts, 9.0, 31.0), 3);
        assert_eq!(cuts_within(&cuts, 40.0, 50.0), 0);
    }

    #[test]
    fn test_nearest_cut() {
        let cuts = SceneCut::normalize(vec![10.0, 20.0], 100.0);
        let (cut, dist) = nearest_cut(&cuts, 12.0).unwrap();
        assert_eq!(cut.time, 10.0);
        assert!((dist - 2.0).abs() < 1e-9);
        assert!(nearest_cut(&[], 5.0).is_none());
    }
}
