//! Summary request building and the completion service client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http;
use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{DnsRecordSet, GenerationParams, WhoisRecord, render_values};

/// Default text-completion endpoint.
pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/completions";

/// A text-generation service: prompt in, generated text out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> ToolboxResult<String>;
}

/// Format both result sets into the summary prompt.
///
/// WHOIS lines are `key: value`; DNS lines are `TYPE: [v1, v2]`.
pub fn build_prompt(whois: &WhoisRecord, dns: &DnsRecordSet, language: &str) -> String {
    let formatted_whois = whois
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n");
    let formatted_dns = dns
        .iter()
        .map(|(record_type, values)| format!("{record_type}: {}", render_values(values)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Please provide a summary and explanation of the following WHOIS and DNS information in {language}.\n\n\
         WHOIS information:\n{formatted_whois}\n\n\
         DNS information:\n{formatted_dns}\n\n"
    )
}

/// Build the prompt, request a completion and trim the answer.
///
/// Service failures propagate unchanged.
pub async fn summarize(
    service: &dyn CompletionService,
    whois: &WhoisRecord,
    dns: &DnsRecordSet,
    language: &str,
) -> ToolboxResult<String> {
    let prompt = build_prompt(whois, dns, language);
    log::debug!("[summary] requesting completion for a {}-byte prompt", prompt.len());
    let text = service.complete(&prompt).await?;
    Ok(text.trim().to_string())
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    n: u8,
    stop: Option<&'a str>,
    temperature: f64,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for an OpenAI-compatible `/v1/completions` endpoint.
pub struct OpenAiCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    params: GenerationParams,
}

impl OpenAiCompletionClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        params: GenerationParams,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            params,
        }
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletionClient {
    async fn complete(&self, prompt: &str) -> ToolboxResult<String> {
        let body = CompletionRequest {
            model: &self.params.model,
            prompt,
            max_tokens: self.params.max_tokens,
            n: 1,
            stop: None,
            temperature: self.params.temperature,
        };
        let request = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body);

        let (status, text) =
            http::execute_request(request, "completion", "POST", &self.endpoint).await?;

        if !(200..300).contains(&status) {
            let detail = serde_json::from_str::<ApiErrorBody>(&text)
                .map_or_else(|_| http::truncate_for_log(&text), |body| body.error.message);
            return Err(ToolboxError::CompletionError(format!("HTTP {status}: {detail}")));
        }

        let response: CompletionResponse = http::parse_json(&text, "completion")?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| ToolboxError::CompletionError("response contained no choices".to_string()))
    }
}
