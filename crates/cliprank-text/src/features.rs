//! Per-window feature assembly.

use cliprank_models::{TextFeatures, Window};

use crate::density::density_score;
use crate::filler::filler_ratio;
use crate::idf::CorpusStats;
use crate::keyphrase::extract_keyphrases;

/// Interior scene cuts at which the penalty saturates.
const SCENE_CUT_SATURATION: f64 = 3.0;

/// Per-window signals that do not depend on the rest of the job.
struct WindowSignals {
    keyphrases: Vec<(String, f64)>,
    density: f64,
    filler: f64,
}

/// Compute text features for every window of a job.
///
/// IDF statistics are fitted over all window texts first, raw coverage is
/// min-max normalized across the job, and everything else is computed per
/// window. Pure and deterministic: the same windows always yield the same
/// feature vectors.
pub fn compute_features(windows: &[Window]) -> Vec<TextFeatures> {
    compute_features_parallel(windows, 1)
}

/// [`compute_features`] with the per-window work spread over a worker
/// pool of `threads` OS threads. Output is identical to the sequential
/// path for any thread count.
pub fn compute_features_parallel(windows: &[Window], threads: usize) -> Vec<TextFeatures> {
    if windows.is_empty() {
        return Vec::new();
    }

    let texts: Vec<&str> = windows.iter().map(|w| w.text.as_str()).collect();
    let stats = CorpusStats::fit(&texts);

    let signals = compute_signals(windows, threads.max(1));

    let raw_coverage: Vec<f64> = signals
        .iter()
        .map(|s| stats.raw_coverage(&s.keyphrases))
        .collect();
    let coverage = min_max_normalize(&raw_coverage);

    windows
        .iter()
        .zip(signals)
        .zip(coverage)
        .map(|((window, s), coverage_score)| TextFeatures {
            keyphrases: s.keyphrases,
            coverage_score,
            density_score: s.density,
            filler_ratio: s.filler,
            scene_cut_penalty: (window.contains_scene_cuts as f64 / SCENE_CUT_SATURATION)
                .min(1.0),
        })
        .collect()
}

/// Per-window signal extraction, chunked across `threads` workers.
fn compute_signals(windows: &[Window], threads: usize) -> Vec<WindowSignals> {
    let signal_of = |w: &Window| WindowSignals {
        keyphrases: extract_keyphrases(&w.text),
        density: density_score(&w.text),
        filler: filler_ratio(&w.text),
    };

    if threads <= 1 || windows.len() <= 1 {
        return windows.iter().map(signal_of).collect();
    }

    let chunk_size = windows.len().div_ceil(threads);
    let mut out: Vec<Option<WindowSignals>> = Vec::with_capacity(windows.len());
    out.resize_with(windows.len(), || None);

    std::thread::scope(|scope| {
        for (chunk, slot) in windows
            .chunks(chunk_size)
            .zip(out.chunks_mut(chunk_size))
        {
            scope.spawn(move || {
                for (window, slot) in chunk.iter().zip(slot.iter_mut()) {
                    *slot = Some(signal_of(window));
                }
            });
        }
    });

    out.into_iter().map(|s| s.expect("worker filled slot")).collect()
}

/// Min-max normalize to [0, 1], with clipping.
///
/// A degenerate range maps nonzero values to 1 and zeros to 0, so a
/// single-window job still gets coverage credit.
fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    values
        .iter()
        .map(|v| {
            if range > f64::EPSILON {
                ((v - min) / range).clamp(0.0, 1.0)
            } else if *v > 0.0 {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(media: &str, start: f64, end: f64, text: &str, cuts: usize) -> Window {
        Window::new(media, start, end, (0, 0), text.to_string(), cuts)
    }

    #[test]
    fn test_all_signals_in_unit_range() {
        let windows = vec![
            window("m", 0.0, 90.0, "superconducting qubits need microwave control electronics", 0),
            window("m", 15.0, 105.0, "um you know like basically stuff happens", 5),
        ];
        for f in compute_features(&windows) {
            assert!((0.0..=1.0).contains(&f.coverage_score));
            assert!((0.0..=1.0).contains(&f.density_score));
            assert!((0.0..=1.0).contains(&f.filler_ratio));
            assert!((0.0..=1.0).contains(&f.scene_cut_penalty));
        }
    }

    #[test]
    fn test_scene_cut_penalty_saturates() {
        let windows = vec![window("m", 0.0, 90.0, "text here now", 7)];
        let f = compute_features(&windows);
        assert_eq!(f[0].scene_cut_penalty, 1.0);
    }

    #[test]
    fn test_scene_cut_penalty_fractional() {
        let windows = vec![window("m", 0.0, 90.0, "text here now", 1)];
        let f = compute_features(&windows);
        assert!((f[0].scene_cut_penalty - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_filler_heavy_window_flagged() {
        let windows = vec![
            window("m", 0.0, 90.0, "the experiment produced clean measurement data", 0),
            window("m", 15.0, 105.0, "um uh like you know i mean", 0),
        ];
        let f = compute_features(&windows);
        assert!(f[1].filler_ratio > f[0].filler_ratio);
        assert!(f[1].filler_ratio > 0.9);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let windows: Vec<Window> = (0..9)
            .map(|i| {
                window(
                    "m",
                    i as f64 * 15.0,
                    i as f64 * 15.0 + 90.0,
                    &format!("window {} talks about entropy and compression tradeoffs", i),
                    i % 3,
                )
            })
            .collect();

        let sequential = compute_features(&windows);
        for threads in [2, 4, 16] {
            let parallel = compute_features_parallel(&windows, threads);
            for (a, b) in sequential.iter().zip(parallel.iter()) {
                assert_eq!(a.keyphrases, b.keyphrases);
                assert_eq!(a.coverage_score, b.coverage_score);
                assert_eq!(a.density_score, b.density_score);
                assert_eq!(a.filler_ratio, b.filler_ratio);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let windows = vec![
            window("m", 0.0, 90.0, "gradient descent minimizes the training loss", 1),
            window("m", 15.0, 105.0, "the optimizer follows the loss surface downhill", 0),
        ];
        let a = compute_features(&windows);
        let b = compute_features(&windows);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.coverage_score, y.coverage_score);
            assert_eq!(x.density_score, y.density_score);
            assert_eq!(x.keyphrases, y.keyphrases);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(compute_features(&[]).is_empty());
    }
}
