//! Whisper-compatible transcription client.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, info, warn};

use cliprank_models::{Token, Transcript};

use crate::error::{ClientError, ClientResult};

/// Whole-transcript request timeout (10 minutes).
const ASR_TIMEOUT_SECS: u64 = 10 * 60;

/// Transport retries on 5xx/connection errors.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff between retries.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

/// Client for a Whisper-compatible `audio/transcriptions` endpoint.
pub struct AsrClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

/// Wire format: verbose_json with word timestamps. Word lists appear
/// either at the top level or nested under segments; both are accepted.
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    words: Vec<WireWord>,
    #[serde(default)]
    segments: Vec<WireSegment>,
}

#[derive(Debug, Deserialize)]
struct WireSegment {
    #[serde(default)]
    words: Vec<WireWord>,
    #[serde(default)]
    speaker: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireWord {
    word: String,
    start: f64,
    end: f64,
    #[serde(default)]
    probability: Option<f64>,
    #[serde(default)]
    speaker: Option<String>,
}

impl AsrClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Transcribe an audio file into a word-timestamped transcript.
    ///
    /// Retries transient failures up to 3 times; a malformed response is
    /// terminal. Tokens are normalized against `duration_seconds` per the
    /// data-model invariants.
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        duration_seconds: f64,
    ) -> ClientResult<Transcript> {
        let mut attempt = 0u32;
        loop {
            match self.transcribe_once(audio_path).await {
                Ok(response) => {
                    let tokens = flatten_words(response);
                    if tokens.is_empty() {
                        info!("Transcription returned no words");
                    }
                    return Ok(Transcript::from_raw_tokens(tokens, duration_seconds));
                }
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                    warn!(
                        attempt,
                        delay_secs = delay.as_secs(),
                        "Transcription attempt failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn transcribe_once(&self, audio_path: &Path) -> ClientResult<TranscriptionResponse> {
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();
        let bytes = tokio::fs::read(audio_path).await?;

        debug!(
            file = %file_name,
            size_bytes = bytes.len(),
            "Uploading audio for transcription"
        );

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word")
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .multipart(form)
            .timeout(Duration::from_secs(ASR_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout(ASR_TIMEOUT_SECS)
                } else {
                    ClientError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("HTTP {}: {}", status, truncate(&body, 200));
            return if status.is_server_error() {
                Err(ClientError::Server(message))
            } else {
                Err(ClientError::AsrMalformed(message))
            };
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::AsrMalformed(format!("JSON parse failed: {}", e)))
    }
}

/// Flatten top-level and per-segment word lists, in order, into tokens.
fn flatten_words(response: TranscriptionResponse) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::new();

    let top_level = !response.words.is_empty();
    for w in response.words {
        out.push(to_token(w, None));
    }

    if !top_level {
        for segment in response.segments {
            let speaker = segment.speaker.clone();
            for w in segment.words {
                out.push(to_token(w, speaker.clone()));
            }
        }
    }

    out
}

fn to_token(w: WireWord, segment_speaker: Option<String>) -> Token {
    Token {
        text: w.word,
        start: w.start,
        end: w.end,
        confidence: w.probability,
        speaker_label: w.speaker.or(segment_speaker),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
