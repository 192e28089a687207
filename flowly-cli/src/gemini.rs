use flowly_core::{AI_REQUEST_TIMEOUT, PlanService, PlanningError, PlanningResult};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::config::normalize_gemini_model;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Single-turn `generateContent` client used as the planner's AI service.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Serialize)]
struct Req<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct Resp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Deserialize, Default)]
struct PartOut {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: &str, base_url: &str) -> PlanningResult<Self> {
        let api_key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            PlanningError::configuration(
                "GEMINI_API_KEY is not set; export it or run: flowly auth paste-gemini-key",
            )
        })?;
        let model = normalize_gemini_model(model);
        if model.is_empty() {
            return Err(PlanningError::configuration("no Gemini model configured"));
        }
        let http = reqwest::Client::builder()
            .timeout(AI_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PlanningError::configuration(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn complete_async(&self, prompt: &str) -> PlanningResult<String> {
        let body = Req {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                PlanningError::transport(format!("gemini request: {}", e.without_url()))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(PlanningError::transport(format!(
                "gemini responded with {status}: {txt}"
            )));
        }
        info!(model = %self.model, %status, "gemini request ok");

        let body = resp.text().await.map_err(|e| {
            PlanningError::transport(format!("read gemini response: {}", e.without_url()))
        })?;
        response_text(&body)
    }
}

/// `candidates[0].content.parts[0].text` of a `generateContent` reply.
pub fn response_text(body: &str) -> PlanningResult<String> {
    let out: Resp = serde_json::from_str(body)
        .map_err(|e| PlanningError::parse(format!("gemini response is not JSON: {e}")))?;
    let text = out
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| PlanningError::parse("gemini response missing text content"))?;
    debug!(raw = %text, "gemini raw text");
    Ok(text)
}

impl PlanService for GeminiClient {
    fn complete(&self, prompt: &str) -> PlanningResult<String> {
        // main runs under #[tokio::main]; a nested block_on would panic.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.complete_async(prompt)))
        } else {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| PlanningError::transport(format!("create tokio runtime: {e}")))?;
            rt.block_on(self.complete_async(prompt))
        }
    }
}
