use crate::config::Config;
use crate::util::prefix_chars;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Rate limit retry configuration
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 2000;
const BACKOFF_MULTIPLIER: u64 = 2;

/// API usage information, when the endpoint reports it
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Response from the LLM including usage stats
#[derive(Debug)]
pub struct LlmResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: [Message<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completion client for an Azure OpenAI-style deployment endpoint.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    url: Option<String>,
    api_key: Option<String>,
    initial_backoff: Duration,
}

impl LlmClient {
    pub fn new(url: Option<String>, api_key: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            url: url.filter(|u| !u.trim().is_empty()),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(config.llm_url(), config.llm_api_key())
    }

    /// Shorten the first rate-limit wait (tests use milliseconds).
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Both an endpoint and a key are present
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.api_key.is_some()
    }

    /// Call the LLM and return only the trimmed content
    pub async fn complete(&self, system: &str, user: &str, temperature: Option<f32>) -> anyhow::Result<String> {
        Ok(self.chat(system, user, temperature).await?.content)
    }

    /// Call the LLM with automatic retry and exponential backoff on 429
    pub async fn chat(&self, system: &str, user: &str, temperature: Option<f32>) -> anyhow::Result<LlmResponse> {
        let (Some(url), Some(api_key)) = (self.url.as_deref(), self.api_key.as_deref()) else {
            return Err(anyhow::anyhow!(
                "LLM credentials not configured. Run 'faultline setup' or set OPENAI_KEY and FAULTLINE_LLM_URL."
            ));
        };

        let request = ChatRequest {
            messages: [
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
        };

        let mut retry_count = 0;
        loop {
            let response = self
                .http
                .post(url)
                .header("api-key", api_key)
                .json(&request)
                .send()
                .await
                .context("Failed to reach the chat-completion endpoint")?;

            let status = response.status();
            let text = response.text().await?;

            if status.is_success() {
                let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to parse chat-completion response: {}\n{}",
                        e,
                        prefix_chars(&text, 200)
                    )
                })?;

                let content = parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| anyhow::anyhow!("Chat-completion response had no choices"))?;

                if let Some(usage) = &parsed.usage {
                    tracing::debug!(
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        total_tokens = usage.total_tokens,
                        "llm usage"
                    );
                }

                return Ok(LlmResponse {
                    content: content.trim().to_string(),
                    usage: parsed.usage,
                });
            }

            if status.as_u16() == 429 && retry_count < MAX_RETRIES {
                retry_count += 1;
                let wait = parse_retry_after(&text)
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| {
                        self.initial_backoff * BACKOFF_MULTIPLIER.pow(retry_count - 1) as u32
                    });
                tracing::warn!(
                    attempt = retry_count,
                    max = MAX_RETRIES,
                    wait_ms = wait.as_millis() as u64,
                    "chat-completion rate limited; retrying"
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            let error_msg = match status.as_u16() {
                401 => "Invalid LLM API key. Run 'faultline setup' to update it.".to_string(),
                429 => format!(
                    "Rate limited by the chat-completion endpoint after {} retries. Try again in a few minutes.",
                    retry_count
                ),
                500..=599 => format!(
                    "Chat-completion server error ({}). The service may be temporarily unavailable.",
                    status
                ),
                _ => format!("API error {}: {}", status, prefix_chars(&text, 200)),
            };
            return Err(anyhow::anyhow!("{}", error_msg));
        }
    }
}

/// Extract a retry-after hint such as "retry after 7 seconds"
fn parse_retry_after(text: &str) -> Option<u64> {
    let text_lower = text.to_lowercase();
    let pos = text_lower.find("retry")?;
    text_lower[pos..]
        .split_whitespace()
        .skip(1)
        .take(5)
        .filter_map(|word| {
            word.trim_matches(|c: char| !c.is_ascii_digit())
                .parse::<u64>()
                .ok()
        })
        .find(|secs| *secs > 0 && *secs < 300)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const OK_BODY: &str = r#"{"choices":[{"message":{"role":"assistant","content":"  hello  "}}],
        "usage":{"prompt_tokens":10,"completion_tokens":2,"total_tokens":12}}"#;

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("Please retry after 7 seconds."), Some(7));
        assert_eq!(parse_retry_after("Retry-After: 12s"), Some(12));
        assert_eq!(parse_retry_after("rate limited"), None);
        assert_eq!(parse_retry_after("retry after 9000 seconds"), None);
    }

    #[test]
    fn test_is_configured_requires_url_and_key() {
        assert!(!LlmClient::new(None, Some("k".into())).unwrap().is_configured());
        assert!(!LlmClient::new(Some("http://x".into()), Some("  ".into())).unwrap().is_configured());
        assert!(LlmClient::new(Some("http://x".into()), Some("k".into())).unwrap().is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_client_errors() {
        let client = LlmClient::new(None, None).unwrap();
        let err = client.complete("s", "u", None).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[tokio::test]
    async fn test_chat_sends_key_and_messages() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("api-key", "secret")
            .match_body(Matcher::PartialJsonString(
                r#"{"messages":[{"role":"system","content":"sys"},{"role":"user","content":"hi"}],"temperature":0.5}"#
                    .to_string(),
            ))
            .with_header("content-type", "application/json")
            .with_body(OK_BODY)
            .create_async()
            .await;

        let client = LlmClient::new(Some(format!("{}/chat", server.url())), Some("secret".into())).unwrap();
        let response = client.chat("sys", "hi", Some(0.5)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "hello");
        assert_eq!(response.usage.unwrap().total_tokens, 12);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_then_reported() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("POST", "/chat")
            .with_status(429)
            .with_body("slow down")
            .expect(4)
            .create_async()
            .await;

        let client = LlmClient::new(Some(format!("{}/chat", server.url())), Some("k".into()))
            .unwrap()
            .with_initial_backoff(Duration::from_millis(1));

        let err = client.complete("s", "u", None).await.unwrap_err();
        limited.assert_async().await;
        assert!(err.to_string().contains("after 3 retries"));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_readable_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(401)
            .create_async()
            .await;

        let client = LlmClient::new(Some(format!("{}/chat", server.url())), Some("bad".into())).unwrap();
        let err = client.complete("s", "u", None).await.unwrap_err();
        assert!(err.to_string().contains("Invalid LLM API key"));
    }
}
