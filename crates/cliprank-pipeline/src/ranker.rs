//! Hybrid ranking and top-K selection.

use tracing::debug;

use cliprank_models::{LlmGrade, RankedClip, TextFeatures, Window};

use crate::config::RankWeights;

/// Maximum temporal overlap between selected clips, as a fraction of the
/// shorter clip's length.
const MAX_OVERLAP_FRACTION: f64 = 0.10;

/// Blend feature and grade signals into a final score, clamped to [0, 1].
///
/// The negative-weight terms can push the raw blend below zero; clamping
/// happens before selection so ordering sees the clamped value.
pub fn final_score(features: &TextFeatures, grade: &LlmGrade, weights: &RankWeights) -> f64 {
    let raw = weights.coverage * features.coverage_score
        + weights.density * features.density_score
        + weights.cogency * (grade.cogency as f64 / 5.0)
        + weights.quote_bonus * grade.quote_bonus()
        - weights.scene_cut_penalty * features.scene_cut_penalty
        - weights.filler_penalty * features.filler_ratio;
    raw.clamp(0.0, 1.0)
}

/// Score every graded window and select the top K non-overlapping clips.
///
/// Sentinel-graded windows are excluded. Selection is greedy by score
/// with ties broken by cogency, then coverage, then earlier start; a
/// candidate is rejected when it overlaps any picked clip by more than
/// 10% of the shorter of the two. Returns at most `k` clips, ranked in
/// selection order.
pub fn rank_windows(
    windows: &[Window],
    features: &[TextFeatures],
    grades: &[LlmGrade],
    k: usize,
    weights: &RankWeights,
) -> Vec<RankedClip> {
    debug_assert_eq!(windows.len(), features.len());
    debug_assert_eq!(windows.len(), grades.len());

    let mut candidates: Vec<(usize, f64)> = windows
        .iter()
        .enumerate()
        .filter(|(i, _)| !grades[*i].is_sentinel())
        .map(|(i, _)| (i, final_score(&features[i], &grades[i], weights)))
        .collect();

    candidates.sort_by(|&(a, score_a), &(b, score_b)| {
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| grades[b].cogency.cmp(&grades[a].cogency))
            .then_with(|| {
                features[b]
                    .coverage_score
                    .partial_cmp(&features[a].coverage_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| {
                windows[a]
                    .start
                    .partial_cmp(&windows[b].start)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    let mut selected: Vec<RankedClip> = Vec::with_capacity(k);
    for (idx, score) in candidates {
        if selected.len() == k {
            break;
        }
        let window = &windows[idx];
        let conflicts = selected.iter().any(|picked| {
            let overlap = window.time_overlap(picked.window.start, picked.window.end);
            let shorter = window.duration().min(picked.window.duration());
            overlap > MAX_OVERLAP_FRACTION * shorter
        });
        if conflicts {
            continue;
        }

        selected.push(RankedClip {
            window: window.clone(),
            features: features[idx].clone(),
            grade: grades[idx].clone(),
            final_score: score,
            rank: selected.len() + 1,
        });
    }

    debug!(
        candidates = windows.len(),
        selected = selected.len(),
        "Ranking complete"
    );
    selected
}
