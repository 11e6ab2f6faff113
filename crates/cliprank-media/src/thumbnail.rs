//! Clip thumbnail generation.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Thumbnail width; height follows the source aspect.
const THUMBNAIL_WIDTH: u32 = 480;
/// Grab the frame one second in, past any fade-in.
const THUMBNAIL_SEEK_SECS: f64 = 1.0;

/// Generate a JPEG thumbnail for a rendered clip.
pub async fn generate_thumbnail(video: &Path, output: &Path) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(video, output)
        .seek(THUMBNAIL_SEEK_SECS)
        .video_filter(format!("scale={}:-2", THUMBNAIL_WIDTH))
        .output_arg("-vframes")
        .output_arg("1");

    FfmpegRunner::new().run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_command() {
        let cmd = FfmpegCommand::new("clip.mp4", "clip.jpg")
            .seek(THUMBNAIL_SEEK_SECS)
            .video_filter(format!("scale={}:-2", THUMBNAIL_WIDTH))
            .output_arg("-vframes")
            .output_arg("1");
        let args = cmd.build_args();
        assert!(args.contains(&"-vframes".to_string()));
        assert!(args.contains(&"scale=480:-2".to_string()));
    }
}
