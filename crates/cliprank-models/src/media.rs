//! Media asset descriptor and stable id derivation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A fetched source video, ready for probing and cutting.
///
/// Created by the ingest stage and read-only afterwards; the file it
/// points at lives inside the job arena and is swept with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Stable identifier derived from the source URL.
    pub id: String,
    /// Local path to the downloaded video file.
    pub local_path: PathBuf,
    /// Local path to the extracted audio sidecar (mono WAV) used for ASR.
    pub audio_path: PathBuf,
    /// Duration in seconds, always > 0.
    pub duration_seconds: f64,
    /// Audio sample rate reported by the probe, if any.
    pub sample_rate_hint: Option<u32>,
}

/// Derive a stable media id from a source URL.
///
/// YouTube-style URLs yield the 11-character video id (matching the
/// filenames and log keys users already know); anything else falls back
/// to a SHA-256 prefix so ids stay deterministic and filesystem-safe.
pub fn media_id_from_url(url: &str) -> String {
    if let Some(id) = extract_youtube_id(url) {
        return id;
    }

    let digest = Sha256::digest(url.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..12].to_string()
}

fn extract_youtube_id(url: &str) -> Option<String> {
    // watch?v=ID form
    if let Some(idx) = url.find("v=") {
        let id: String = url[idx + 2..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if id.len() == 11 {
            return Some(id);
        }
    }

    // youtu.be/ID and shorts/ID forms
    for marker in ["youtu.be/", "/shorts/"] {
        if let Some(idx) = url.find(marker) {
            let id: String = url[idx + marker.len()..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect();
            if id.len() == 11 {
                return Some(id);
            }
        }
    }

    None
}
