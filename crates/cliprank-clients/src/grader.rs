//! Chat-completion cogency grader.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, warn};

use cliprank_models::{LlmGrade, Window};

use crate::error::{ClientError, ClientResult};

/// Per-request timeout.
const GRADE_TIMEOUT_SECS: u64 = 45;

/// Transport retries (5xx / connection errors only).
const MAX_RETRIES: u32 = 2;

/// Backoff delays between transport retries.
const RETRY_DELAYS: [Duration; 2] = [Duration::from_secs(2), Duration::from_secs(8)];

/// Default number of in-flight grading requests.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Grading rubric, fixed for every request.
const SYSTEM_PROMPT: &str = "You grade a ~90-second transcript chunk for a short-form clip. \
Criteria: clear claim followed by a brief reason and one example; minimal dangling pronouns; \
quote-worthiness. Respond with JSON only: \
{ \"cogency\": 1-5, \"quotes\": [up to 3 concise sentences], \"salient_terms\": [up to 8 non-stopwords] }";

/// Client for an OpenAI-compatible `chat/completions` endpoint.
pub struct GraderClient {
    base_url: String,
    model: String,
    concurrency: usize,
    client: reqwest::Client,
}

/// Wire format of the grade payload inside the model's message content.
#[derive(Debug, Deserialize)]
struct WireGrade {
    cogency: i64,
    #[serde(default)]
    quotes: Vec<String>,
    #[serde(default)]
    salient_terms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl GraderClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            concurrency: concurrency.max(1),
            client: reqwest::Client::new(),
        }
    }

    /// Grade a batch of windows, returning one grade per window in input
    /// order. A window whose request or parse fails gets the sentinel
    /// grade; the batch itself never fails except on cancellation.
    pub async fn grade(
        &self,
        windows: &[Window],
        cancel_rx: Option<watch::Receiver<bool>>,
    ) -> ClientResult<Vec<LlmGrade>> {
        let mut grades: Vec<LlmGrade> = vec![LlmGrade::sentinel(); windows.len()];

        let mut results = stream::iter(windows.iter().enumerate())
            .map(|(idx, window)| {
                let cancel = cancel_rx.clone();
                async move {
                    if let Some(rx) = &cancel {
                        if *rx.borrow() {
                            return (idx, Err(ClientError::Cancelled));
                        }
                    }
                    (idx, self.grade_window(window).await)
                }
            })
            .buffer_unordered(self.concurrency);

        while let Some((idx, result)) = results.next().await {
            match result {
                Ok(grade) => grades[idx] = grade,
                Err(ClientError::Cancelled) => return Err(ClientError::Cancelled),
                Err(e) => {
                    warn!(
                        window_id = %windows[idx].id,
                        "Grading degraded to sentinel: {}",
                        e
                    );
                }
            }
        }

        Ok(grades)
    }

    /// Grade one window, retrying transient transport failures.
    async fn grade_window(&self, window: &Window) -> ClientResult<LlmGrade> {
        let mut attempt = 0u32;
        let content = loop {
            match self.request_completion(&window.text).await {
                Ok(content) => break content,
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    let delay = RETRY_DELAYS[attempt as usize];
                    attempt += 1;
                    warn!(
                        window_id = %window.id,
                        attempt,
                        delay_secs = delay.as_secs(),
                        "Grader request failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        };

        match parse_grade(&content) {
            Some(grade) => Ok(grade),
            None => Err(ClientError::Grade(format!(
                "Unparseable grade payload: {}",
                truncate(&content, 120)
            ))),
        }
    }

    async fn request_completion(&self, window_text: &str) -> ClientResult<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": window_text},
            ],
            "temperature": 0.2,
            "top_p": 0.9,
            "max_tokens": 400,
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&payload)
            .timeout(Duration::from_secs(GRADE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout(GRADE_TIMEOUT_SECS)
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
                Err(ClientError::Grade(message))
            };
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Grade(format!("Chat response malformed: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ClientError::Grade("Chat response had no choices".into()))
    }
}

/// Parse model output into a grade: strict JSON first, then one repair
/// pass (strip code fences, slice the outermost `{...}`).
fn parse_grade(content: &str) -> Option<LlmGrade> {
    if let Ok(wire) = serde_json::from_str::<WireGrade>(content) {
        return Some(to_grade(wire));
    }

    let repaired = repair_json(content)?;
    match serde_json::from_str::<WireGrade>(&repaired) {
        Ok(wire) => Some(to_grade(wire)),
        Err(e) => {
            debug!("Grade repair pass failed: {}", e);
            None
        }
    }
}

fn to_grade(wire: WireGrade) -> LlmGrade {
    LlmGrade::from_raw(wire.cogency, wire.quotes, wire.salient_terms)
}

/// One-shot repair: drop markdown code fences, then slice from the first
/// `{` to the last `}`.
fn repair_json(content: &str) -> Option<String> {
    let without_fences: String = content
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n");

    let start = without_fences.find('{')?;
    let end = without_fences.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(without_fences[start..=end].to_string())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
