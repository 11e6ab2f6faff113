//! ASS subtitle track authoring for burned-in captions.

use std::path::Path;

use cliprank_models::{format_ass_time, SubtitleEvent};

use crate::error::MediaResult;

/// Caption style: white fill, black outline, bottom-safe placement.
/// PlayRes matches the 1080x1920 output so margins are in output pixels.
const ASS_HEADER: &str = "\
[Script Info]
ScriptType: v4.00+
PlayResX: 1080
PlayResY: 1920
WrapStyle: 0
ScaledBorderAndShadow: yes

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Caption,Arial,72,&H00FFFFFF,&H00FFFFFF,&H00000000,&H80000000,-1,0,0,0,100,100,0,0,1,4,1,2,60,60,220,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
";

/// Write subtitle events to an ASS file next to the render output.
pub async fn write_ass_file(path: &Path, events: &[SubtitleEvent]) -> MediaResult<()> {
    let mut content = String::from(ASS_HEADER);
    for event in events {
        content.push_str(&format_dialogue(event));
        content.push('\n');
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}

fn format_dialogue(event: &SubtitleEvent) -> String {
    let text = match &event.speaker_label {
        Some(label) => format!("[{}] {}", label, event.text),
        None => event.text.clone(),
    };
    format!(
        "Dialogue: 0,{},{},Caption,,0,0,0,,{}",
        format_ass_time(event.start),
        format_ass_time(event.end),
        escape_ass_text(&text)
    )
}

/// Escape text for an ASS Dialogue line: newlines become soft breaks and
/// override braces are neutralized.
fn escape_ass_text(text: &str) -> String {
    text.replace('\n', "\\N")
        .replace('{', "(")
        .replace('}', ")")
}

/// Quote a subtitle path for use inside an ffmpeg filter argument.
///
/// Filter strings treat `:`, `'` and `\` specially; paths with them must
/// be escaped or the filter graph parser splits at the wrong place.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(start: f64, end: f64, text: &str, speaker: Option<&str>) -> SubtitleEvent {
        SubtitleEvent {
            start,
            end,
            text: text.to_string(),
            speaker_label: speaker.map(String::from),
        }
    }

    #[test]
    fn test_dialogue_format() {
        let line = format_dialogue(&event(1.5, 3.0, "hello world", None));
        assert_eq!(
            line,
            "Dialogue: 0,0:00:01.50,0:00:03.00,Caption,,0,0,0,,hello world"
        );
    }

    #[test]
    fn test_speaker_prefix() {
        let line = format_dialogue(&event(0.0, 1.0, "hi", Some("Speaker 1")));
        assert!(line.ends_with("[Speaker 1] hi"));
    }

    #[test]
    fn test_ass_escaping() {
        assert_eq!(escape_ass_text("a\nb"), "a\\Nb");
        assert_eq!(escape_ass_text("{\\b1}x"), "(\\b1)x");
    }

    #[test]
    fn test_filter_path_escaping() {
        let escaped = escape_filter_path(Path::new("/tmp/job:1/subs.ass"));
        assert_eq!(escaped, "/tmp/job\\:1/subs.ass");
    }

    #[tokio::test]
    async fn test_write_ass_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.ass");
        write_ass_file(&path, &[event(0.0, 2.5, "first line", None)])
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.starts_with("[Script Info]"));
        assert!(content.contains("Style: Caption"));
        assert!(content.contains("first line"));
    }
}
