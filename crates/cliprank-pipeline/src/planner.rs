//! Per-clip render plan construction.

use std::path::Path;

use cliprank_models::{
    CropStrategy, EncoderProfile, RankedClip, RenderPlan, SubtitleEvent, Token, TARGET_FPS,
    TARGET_HEIGHT, TARGET_WIDTH,
};

/// Pad applied around the window so the first/last phoneme survives the
/// cut (seconds).
const CUT_PAD: f64 = 0.1;

/// Maximum characters on one caption line.
const CAPTION_MAX_CHARS: usize = 42;

/// Maximum duration of one caption line (seconds).
const CAPTION_MAX_SECS: f64 = 2.5;

/// Build the render plan for one ranked clip.
///
/// `window_tokens` is the token slice covered by the clip's window;
/// caption timing is rebased onto the cut so subtitles burn in at the
/// right offsets.
#[allow(clippy::too_many_arguments)]
pub fn build_render_plan(
    clip: &RankedClip,
    window_tokens: &[Token],
    media_id: &str,
    source_path: &Path,
    output_dir: &Path,
    duration: f64,
    source_fps: f64,
    encoder_profile: EncoderProfile,
    crop_strategy: CropStrategy,
) -> RenderPlan {
    let cut_start = (clip.window.start - CUT_PAD).max(0.0);
    let cut_end = (clip.window.end + CUT_PAD).min(duration);

    let subtitle_events = group_captions(window_tokens, cut_start, cut_end - cut_start);

    let output_path = output_dir.join(format!("{}_clip_{:02}.mp4", media_id, clip.rank));

    let target_fps = if source_fps >= 1.0 {
        (source_fps.floor() as u32).min(TARGET_FPS)
    } else {
        TARGET_FPS
    };

    RenderPlan {
        cut_start,
        cut_end,
        source_path: source_path.to_path_buf(),
        output_path,
        crop_strategy,
        subtitle_events,
        encoder_profile,
        target_resolution: (TARGET_WIDTH, TARGET_HEIGHT),
        target_fps,
    }
}

/// Group tokens into caption lines of at most 42 characters or 2.5
/// seconds, whichever triggers first, never splitting a token. Each line
/// inherits the speaker label of its first token.
fn group_captions(tokens: &[Token], cut_start: f64, cut_duration: f64) -> Vec<SubtitleEvent> {
    let mut events: Vec<SubtitleEvent> = Vec::new();
    let mut line: Vec<&Token> = Vec::new();
    let mut line_chars = 0usize;

    let flush = |line: &mut Vec<&Token>, events: &mut Vec<SubtitleEvent>| {
        if line.is_empty() {
            return;
        }
        let first = line[0];
        let last = line[line.len() - 1];
        let start = (first.start - cut_start).max(0.0);
        let end = (last.end - cut_start).min(cut_duration);
        if end > start {
            events.push(SubtitleEvent {
                start,
                end,
                text: line
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                speaker_label: first.speaker_label.clone(),
            });
        }
        line.clear();
    };

    for token in tokens {
        if !line.is_empty() {
            let would_be_chars = line_chars + 1 + token.text.chars().count();
            let would_be_secs = token.end - line[0].start;
            let speaker_changed = token.speaker_label != line[0].speaker_label;
            if would_be_chars > CAPTION_MAX_CHARS
                || would_be_secs > CAPTION_MAX_SECS
                || speaker_changed
            {
                flush(&mut line, &mut events);
                line_chars = 0;
            }
        }
        line_chars = if line.is_empty() {
            token.text.chars().count()
        } else {
            line_chars + 1 + token.text.chars().count()
        };
        line.push(token);
    }
    flush(&mut line, &mut events);

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliprank_models::{LlmGrade, TextFeatures, Window};

    fn clip(start: f64, end: f64, rank: usize) -> RankedClip {
        RankedClip {
            window: Window::new("vid", start, end, (0, 0), "text".into(), 0),
            features: TextFeatures::default(),
            grade: LlmGrade::from_raw(4, vec![], vec![]),
            final_score: 0.5,
            rank,
        }
    }

    fn tok(text: &str, start: f64, end: f64) -> Token {
        Token::new(text, start, end)
    }

    #[test]
    fn test_cut_padding_and_clamping() {
        let plan = build_render_plan(
            &clip(10.0, 100.0, 1),
            &[],
            "vid",
            Path::new("/src.mp4"),
            Path::new("/out"),
            300.0,
            30.0,
            EncoderProfile::CpuH264,
            CropStrategy::Center,
        );
        assert!((plan.cut_start - 9.9).abs() < 1e-9);
        assert!((plan.cut_end - 100.1).abs() < 1e-9);

        // Pad clamps at media bounds.
        let plan = build_render_plan(
            &clip(0.0, 300.0, 1),
            &[],
            "vid",
            Path::new("/src.mp4"),
            Path::new("/out"),
            300.0,
            30.0,
            EncoderProfile::CpuH264,
            CropStrategy::Center,
        );
        assert_eq!(plan.cut_start, 0.0);
        assert_eq!(plan.cut_end, 300.0);
    }

    #[test]
    fn test_output_path_naming() {
        let plan = build_render_plan(
            &clip(10.0, 100.0, 3),
            &[],
            "abc123",
            Path::new("/src.mp4"),
            Path::new("/out"),
            300.0,
            30.0,
            EncoderProfile::CpuH264,
            CropStrategy::Center,
        );
        assert_eq!(
            plan.output_path,
            Path::new("/out").join("abc123_clip_03.mp4")
        );
    }

    #[test]
    fn test_fps_capped_at_source() {
        let plan = build_render_plan(
            &clip(10.0, 100.0, 1),
            &[],
            "vid",
            Path::new("/src.mp4"),
            Path::new("/out"),
            300.0,
            24.0,
            EncoderProfile::CpuH264,
            CropStrategy::Center,
        );
        assert_eq!(plan.target_fps, 24);

        let plan = build_render_plan(
            &clip(10.0, 100.0, 1),
            &[],
            "vid",
            Path::new("/src.mp4"),
            Path::new("/out"),
            300.0,
            60.0,
            EncoderProfile::CpuH264,
            CropStrategy::Center,
        );
        assert_eq!(plan.target_fps, 30);
    }

    #[test]
    fn test_caption_char_limit() {
        let tokens: Vec<Token> = (0..20)
            .map(|i| tok("abcdefgh", 10.0 + i as f64 * 0.1, 10.0 + i as f64 * 0.1 + 0.08))
            .collect();
        let events = group_captions(&tokens, 9.9, 100.0);
        assert!(events.len() > 1);
        for e in &events {
            assert!(e.text.chars().count() <= CAPTION_MAX_CHARS);
        }
    }

    #[test]
    fn test_caption_duration_limit() {
        // Short words spaced 1s apart: the 2.5s cap triggers first.
        let tokens: Vec<Token> = (0..10)
            .map(|i| tok("hi", 10.0 + i as f64, 10.3 + i as f64))
            .collect();
        let events = group_captions(&tokens, 9.9, 100.0);
        for e in &events {
            assert!(e.end - e.start <= CAPTION_MAX_SECS + 1e-9);
        }
    }

    #[test]
    fn test_caption_never_splits_token() {
        let tokens = vec![
            tok("supercalifragilisticexpialidocious-and-then-some-more-text", 10.0, 12.0),
            tok("next", 12.0, 12.5),
        ];
        let events = group_captions(&tokens, 9.9, 100.0);
        // The over-long token still lands whole on its own line.
        assert!(events[0].text.starts_with("supercali"));
        assert!(events[0].text.ends_with("more-text"));
    }

    #[test]
    fn test_caption_inherits_first_speaker() {
        let mut a = tok("hello", 10.0, 10.4);
        a.speaker_label = Some("Speaker 1".into());
        let mut b = tok("there", 10.5, 10.9);
        b.speaker_label = Some("Speaker 1".into());
        let mut c = tok("reply", 11.0, 11.4);
        c.speaker_label = Some("Speaker 2".into());

        let events = group_captions(&[a, b, c], 9.9, 100.0);
        assert_eq!(events[0].speaker_label.as_deref(), Some("Speaker 1"));
        assert_eq!(events[1].speaker_label.as_deref(), Some("Speaker 2"));
    }

    #[test]
    fn test_caption_times_rebased_to_cut() {
        let tokens = vec![tok("word", 10.0, 10.5)];
        let events = group_captions(&tokens, 9.9, 90.2);
        assert!((events[0].start - 0.1).abs() < 1e-9);
        assert!((events[0].end - 0.6).abs() < 1e-9);
    }
}
