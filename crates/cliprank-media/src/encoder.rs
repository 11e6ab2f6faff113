//! Hardware encoder probing.

use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use cliprank_models::EncoderProfile;

static ENCODER_PROBE: OnceCell<EncoderProfile> = OnceCell::const_new();

/// Probe for a hardware H.264 encoder.
///
/// Runs once per process and caches the result; every subsequent call
/// returns the cached profile. Falls back to the CPU encoder when ffmpeg
/// is missing, the probe fails, or NVENC is not listed.
pub async fn probe_encoder() -> EncoderProfile {
    *ENCODER_PROBE
        .get_or_init(|| async {
            let profile = run_probe().await;
            match profile {
                EncoderProfile::HwH264Nvenc => info!("Hardware H.264 encoder available (NVENC)"),
                EncoderProfile::CpuH264 => info!("Using CPU H.264 encoder (libx264)"),
            }
            profile
        })
        .await
}

async fn run_probe() -> EncoderProfile {
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => {
            let listing = String::from_utf8_lossy(&out.stdout);
            if listing.contains("h264_nvenc") {
                EncoderProfile::HwH264Nvenc
            } else {
                EncoderProfile::CpuH264
            }
        }
        Ok(_) | Err(_) => {
            warn!("Encoder probe failed, assuming CPU encoder");
            EncoderProfile::CpuH264
        }
    }
}
