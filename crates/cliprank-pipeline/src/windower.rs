//! Candidate window generation.
//!
//! Anchors are laid down every stride; each anchor's nominal interval is
//! snapped to token boundaries, preferring speech pauses and nearby scene
//! cuts, then near-duplicate windows are merged. The output is ordered by
//! start time and deterministic for a given transcript and cut list.

use tracing::debug;

use cliprank_models::{scene, SceneCut, Token, Transcript, Window};

use crate::config::WindowConfig;

/// Token-boundary snap tolerance around a nominal boundary (seconds).
const SNAP_TOLERANCE: f64 = 0.75;

/// Minimum silence before/after a token for it to count as a pause
/// boundary (seconds).
const PAUSE_GAP: f64 = 0.150;

/// Range within which a scene cut overrides the token-pause heuristic
/// (seconds).
const SCENE_SNAP_RANGE: f64 = 1.5;

/// Token-span overlap at which two windows are considered duplicates.
const MERGE_OVERLAP: f64 = 0.85;

/// Generate candidate windows over a transcript.
///
/// An empty transcript yields no windows. A transcript whose span is
/// shorter than the minimum window length yields a single window over
/// the full span.
pub fn generate_windows(
    media_id: &str,
    transcript: &Transcript,
    cuts: &[SceneCut],
    duration: f64,
    cfg: &WindowConfig,
) -> Vec<Window> {
    if transcript.is_empty() {
        return Vec::new();
    }

    let tokens = transcript.tokens();
    let span = transcript.span_end() - transcript.span_start();
    if span < cfg.min {
        let window = make_window(
            media_id,
            transcript,
            cuts,
            (0, tokens.len() - 1),
        );
        return vec![window];
    }

    let mut windows: Vec<Window> = Vec::new();
    let mut anchor = 0.0f64;
    while anchor <= duration - cfg.min {
        if let Some(window) = window_at_anchor(media_id, transcript, cuts, duration, cfg, anchor) {
            // Adjacent anchors can snap onto identical boundaries.
            if !windows.iter().any(|w| w.id == window.id) {
                windows.push(window);
            }
        }
        anchor += cfg.stride;
    }

    let merged = merge_near_duplicates(windows, cuts);
    debug!(count = merged.len(), "Generated candidate windows");
    merged
}

/// Build the snapped window for one anchor, or discard it.
fn window_at_anchor(
    media_id: &str,
    transcript: &Transcript,
    cuts: &[SceneCut],
    duration: f64,
    cfg: &WindowConfig,
    anchor: f64,
) -> Option<Window> {
    let tokens = transcript.tokens();

    let target_start = scene_preferred_target(cuts, anchor);
    let target_end = scene_preferred_target(cuts, (anchor + cfg.duration).min(duration));

    let start_idx = snap_start(tokens, target_start)?;
    let end_idx = snap_end(tokens, target_end)?;
    if end_idx < start_idx {
        return None;
    }

    let start = tokens[start_idx].start;
    let end = tokens[end_idx].end;
    let length = end - start;
    if length < cfg.min || length > cfg.max {
        return None;
    }

    Some(make_window(media_id, transcript, cuts, (start_idx, end_idx)))
}

fn make_window(
    media_id: &str,
    transcript: &Transcript,
    cuts: &[SceneCut],
    span: (usize, usize),
) -> Window {
    let tokens = transcript.tokens();
    let start = tokens[span.0].start;
    let end = tokens[span.1].end;
    Window::new(
        media_id,
        start,
        end,
        span,
        transcript.join_text(span),
        scene::cuts_within(cuts, start, end),
    )
}

/// A scene cut within 1.5s of the nominal boundary takes precedence over
/// the nominal target.
fn scene_preferred_target(cuts: &[SceneCut], nominal: f64) -> f64 {
    match scene::nearest_cut(cuts, nominal) {
        Some((cut, dist)) if dist <= SCENE_SNAP_RANGE => cut.time,
        _ => nominal,
    }
}

/// Snap to the token start nearest the target within tolerance,
/// preferring starts preceded by a speech pause.
fn snap_start(tokens: &[Token], target: f64) -> Option<usize> {
    let candidates: Vec<usize> = (0..tokens.len())
        .filter(|&i| (tokens[i].start - target).abs() <= SNAP_TOLERANCE)
        .collect();

    let is_pause = |i: usize| i == 0 || tokens[i].start - tokens[i - 1].end >= PAUSE_GAP;
    pick_nearest(&candidates, |i| (tokens[i].start - target).abs(), is_pause)
}

/// Snap to the token end nearest the target within tolerance, preferring
/// ends followed by a speech pause.
fn snap_end(tokens: &[Token], target: f64) -> Option<usize> {
    let candidates: Vec<usize> = (0..tokens.len())
        .filter(|&i| (tokens[i].end - target).abs() <= SNAP_TOLERANCE)
        .collect();

    let is_pause =
        |i: usize| i + 1 == tokens.len() || tokens[i + 1].start - tokens[i].end >= PAUSE_GAP;
    pick_nearest(&candidates, |i| (tokens[i].end - target).abs(), is_pause)
}

/// Nearest candidate by distance, restricted to pause boundaries when
/// any exist. Lower index breaks exact distance ties.
fn pick_nearest<D, P>(candidates: &[usize], distance: D, is_pause: P) -> Option<usize>
where
    D: Fn(usize) -> f64,
    P: Fn(usize) -> bool,
{
    let paused: Vec<usize> = candidates.iter().copied().filter(|&i| is_pause(i)).collect();
    let pool = if paused.is_empty() { candidates } else { &paused };

    pool.iter().copied().min_by(|&a, &b| {
        distance(a)
            .partial_cmp(&distance(b))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    })
}

/// Merge windows with >= 85% token-span overlap.
///
/// The survivor is the window whose boundaries sit closer to a scene
/// cut; with no cuts in play the earlier window wins.
fn merge_near_duplicates(windows: Vec<Window>, cuts: &[SceneCut]) -> Vec<Window> {
    let mut kept: Vec<Window> = Vec::with_capacity(windows.len());

    'outer: for window in windows {
        for existing in kept.iter_mut() {
            if span_overlap(existing, &window) >= MERGE_OVERLAP {
                if boundary_cut_distance(&window, cuts) < boundary_cut_distance(existing, cuts) {
                    *existing = window;
                }
                continue 'outer;
            }
        }
        kept.push(window);
    }

    kept.sort_by(|a, b| {
        a.start
            .partial_cmp(&b.start)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    kept
}

/// Token overlap relative to the smaller of the two spans.
fn span_overlap(a: &Window, b: &Window) -> f64 {
    let smaller = a.token_count().min(b.token_count());
    let lo = a.token_span.0.max(b.token_span.0);
    let hi = a.token_span.1.min(b.token_span.1);
    if hi < lo || smaller == 0 {
        return 0.0;
    }
    (hi - lo + 1) as f64 / smaller as f64
}

/// Distance from the nearer of the window's boundaries to its nearest
/// scene cut; infinite with no cuts, so "earlier wins" applies.
fn boundary_cut_distance(window: &Window, cuts: &[SceneCut]) -> f64 {
    let start_dist = scene::nearest_cut(cuts, window.start).map(|(_, d)| d);
    let end_dist = scene::nearest_cut(cuts, window.end).map(|(_, d)| d);
    match (start_dist, end_dist) {
        (Some(s), Some(e)) => s.min(e),
        _ => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliprank_models::Token;

    /// Synthetic transcript: a token every 0.6s lasting 0.4s, so every
    /// boundary is a 0.2s pause.
    fn regular_transcript(duration: f64) -> Transcript {
        let mut tokens = Vec::new();
        let mut i = 0usize;
        loop {
            let start = i as f64 * 0.6;
            let end = start + 0.4;
            if end > duration {
                break;
            }
            tokens.push(Token::new(format!("w{}", i), start, end));
            i += 1;
        }
        Transcript::from_raw_tokens(tokens, duration)
    }

    fn default_cfg() -> WindowConfig {
        WindowConfig::default()
    }

    #[test]
    fn test_empty_transcript_yields_no_windows() {
        let transcript = Transcript::from_raw_tokens(vec![], 300.0);
        let windows = generate_windows("m", &transcript, &[], 300.0, &default_cfg());
        assert!(windows.is_empty());
    }

    #[test]
    fn test_short_media_single_full_span_window() {
        let transcript = regular_transcript(30.0);
        let windows = generate_windows("m", &transcript, &[], 30.0, &default_cfg());
        assert_eq!(windows.len(), 1);
        let w = &windows[0];
        assert_eq!(w.start, transcript.span_start());
        assert_eq!(w.end, transcript.span_end());
        assert_eq!(w.token_span.0, 0);
        assert_eq!(w.token_span.1, transcript.len() - 1);
    }

    #[test]
    fn test_window_invariants() {
        let duration = 600.0;
        let transcript = regular_transcript(duration);
        let cfg = default_cfg();
        let windows = generate_windows("m", &transcript, &[], duration, &cfg);
        assert!(!windows.is_empty());

        let tokens = transcript.tokens();
        for w in &windows {
            assert!(w.start < w.end);
            assert!(w.duration() >= cfg.min && w.duration() <= cfg.max);
            assert!(w.end <= duration + 0.25);
            // Boundaries are exact token boundaries: no token is split.
            assert_eq!(w.start, tokens[w.token_span.0].start);
            assert_eq!(w.end, tokens[w.token_span.1].end);
        }
        for pair in windows.windows(2) {
            assert!(pair[0].start <= pair[1].start);
        }
    }

    #[test]
    fn test_boundaries_snap_near_nominal() {
        let duration = 600.0;
        let transcript = regular_transcript(duration);
        let windows = generate_windows("m", &transcript, &[], duration, &default_cfg());
        // First anchor is 0: start should be at the very first token.
        assert_eq!(windows[0].start, 0.0);
        // Its end should sit within snap tolerance of the 90s nominal.
        assert!((windows[0].end - 90.0).abs() <= SNAP_TOLERANCE);
    }

    #[test]
    fn test_scene_cut_preferred_over_pause() {
        let duration = 600.0;
        let transcript = regular_transcript(duration);
        // Cut 1.2s away from the first anchor's nominal end of 90s.
        let cuts = SceneCut::normalize(vec![91.2], duration);
        let windows = generate_windows("m", &transcript, &cuts, duration, &default_cfg());
        // The first window's end should track the cut, not the nominal.
        assert!(
            (windows[0].end - 91.2).abs() <= SNAP_TOLERANCE,
            "end {} should snap near cut at 91.2",
            windows[0].end
        );
    }

    #[test]
    fn test_interior_cut_annotation() {
        let duration = 600.0;
        let transcript = regular_transcript(duration);
        let cuts = SceneCut::normalize(vec![40.0, 50.0], duration);
        let windows = generate_windows("m", &transcript, &cuts, duration, &default_cfg());
        let first = &windows[0];
        assert_eq!(first.contains_scene_cuts, 2);
    }

    #[test]
    fn test_no_anchor_without_tokens_nearby() {
        // Tokens only in the first 50s of a 600s file: later anchors have
        // nothing to snap to and are discarded.
        let mut tokens = Vec::new();
        for i in 0..80 {
            let start = i as f64 * 0.6;
            tokens.push(Token::new(format!("w{}", i), start, start + 0.4));
        }
        let transcript = Transcript::from_raw_tokens(tokens, 600.0);
        let windows = generate_windows("m", &transcript, &[], 600.0, &default_cfg());
        // Every anchor's nominal 90s end falls in silence, beyond snap
        // tolerance of any token boundary, so every anchor is discarded.
        assert!(windows.is_empty());
    }

    #[test]
    fn test_merge_keeps_one_of_near_duplicates() {
        let duration = 600.0;
        let transcript = regular_transcript(duration);
        let windows = generate_windows("m", &transcript, &[], duration, &default_cfg());
        // With a 15s stride over 90s windows, raw anchors overlap by over
        // 80%; post-merge neighbors must stay under the merge threshold.
        for (i, a) in windows.iter().enumerate() {
            for b in windows.iter().skip(i + 1) {
                assert!(
                    span_overlap(a, b) < MERGE_OVERLAP,
                    "windows {} and {} overlap {:.2}",
                    a.id,
                    b.id,
                    span_overlap(a, b)
                );
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let duration = 600.0;
        let transcript = regular_transcript(duration);
        let cuts = SceneCut::normalize(vec![33.0, 120.5, 300.0], duration);
        let a = generate_windows("m", &transcript, &cuts, duration, &default_cfg());
        let b = generate_windows("m", &transcript, &cuts, duration, &default_cfg());
        let ids_a: Vec<&str> = a.iter().map(|w| w.id.as_str()).collect();
        let ids_b: Vec<&str> = b.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }
}
