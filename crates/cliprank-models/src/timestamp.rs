//! Time formatting helpers for logs and subtitle tracks.

/// Format seconds as `HH:MM:SS` or `HH:MM:SS.mmm` when fractional.
pub fn format_seconds(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    if (secs - secs.floor()).abs() > 0.0005 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}

/// SRT cue time: `HH:MM:SS,mmm`.
pub fn format_srt_time(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = (total_secs % 60.0).floor() as u32;
    let millis = ((total_secs - total_secs.floor()) * 1000.0).round() as u32;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis.min(999))
}

/// ASS event time: `H:MM:SS.cc` (centiseconds).
pub fn format_ass_time(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = (total_secs % 60.0).floor() as u32;
    let centis = ((total_secs - total_secs.floor()) * 100.0).round() as u32;
    format!("{}:{:02}:{:02}.{:02}", hours, mins, secs, centis.min(99))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(90.0), "00:01:30");
        assert_eq!(format_seconds(3661.0), "01:01:01");
        assert_eq!(format_seconds(30.5), "00:00:30.500");
    }

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(75.25), "00:01:15,250");
        assert_eq!(format_srt_time(3600.001), "01:00:00,001");
    }

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(75.25), "0:01:15.25");
        assert_eq!(format_ass_time(3661.5), "1:01:01.50");
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(format_seconds(-5.0), "00:00:00");
        assert_eq!(format_srt_time(-1.0), "00:00:00,000");
    }
}
