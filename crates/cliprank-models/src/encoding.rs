//! Video encoding configuration.

use serde::{Deserialize, Serialize};

/// Default audio bitrate for rendered clips.
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";
/// Sample rate clips are upsampled to when the source is below 44.1 kHz.
pub const UPSAMPLE_RATE: u32 = 48_000;
/// Minimum source sample rate that is preserved as-is.
pub const MIN_PRESERVED_RATE: u32 = 44_100;

/// Which H.264 encoder executes a render plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderProfile {
    /// NVENC hardware encoder (`h264_nvenc`, quality via `-cq`).
    HwH264Nvenc,
    /// Software encoder (`libx264`, quality via `-crf`).
    CpuH264,
}

/// Output quality knob, mapped onto CRF/CQ values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderQuality {
    Low,
    Medium,
    High,
}

impl Default for RenderQuality {
    fn default() -> Self {
        Self::Medium
    }
}

/// Encoder settings for one render invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub profile: EncoderProfile,
    pub quality: RenderQuality,
    /// Audio bitrate string passed to `-b:a`.
    pub audio_bitrate: String,
}

impl EncodingConfig {
    pub fn new(profile: EncoderProfile, quality: RenderQuality) -> Self {
        Self {
            profile,
            quality,
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }

    /// The same settings on the CPU encoder, for the fallback retry.
    pub fn cpu_fallback(&self) -> Self {
        Self {
            profile: EncoderProfile::CpuH264,
            ..self.clone()
        }
    }

    fn quality_value(&self) -> u8 {
        match self.quality {
            RenderQuality::Low => 28,
            RenderQuality::Medium => 20,
            RenderQuality::High => 18,
        }
    }

    /// Video codec arguments for this profile.
    ///
    /// NVENC takes its quality via `-cq`; libx264 via `-preset`/`-crf`.
    pub fn video_args(&self) -> Vec<String> {
        match self.profile {
            EncoderProfile::HwH264Nvenc => vec![
                "-c:v".into(),
                "h264_nvenc".into(),
                "-preset".into(),
                "p4".into(),
                "-cq".into(),
                self.quality_value().to_string(),
            ],
            EncoderProfile::CpuH264 => vec![
                "-c:v".into(),
                "libx264".into(),
                "-preset".into(),
                "medium".into(),
                "-crf".into(),
                self.quality_value().to_string(),
            ],
        }
    }

    /// Audio codec arguments: AAC stereo at the configured bitrate, with
    /// the output sample rate chosen from the source rate.
    pub fn audio_args(&self, source_sample_rate: Option<u32>) -> Vec<String> {
        let mut args = vec![
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            self.audio_bitrate.clone(),
            "-ac".into(),
            "2".into(),
        ];
        if let Some(rate) = output_sample_rate(source_sample_rate) {
            args.push("-ar".into());
            args.push(rate.to_string());
        }
        args
    }
}

/// Preserve sample rates >= 44.1 kHz; upsample anything lower to 48 kHz.
pub fn output_sample_rate(source: Option<u32>) -> Option<u32> {
    match source {
        Some(rate) if rate >= MIN_PRESERVED_RATE => Some(rate),
        Some(_) => Some(UPSAMPLE_RATE),
        None => Some(UPSAMPLE_RATE),
    }
}
