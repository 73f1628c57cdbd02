//! OpenAI-compatible chat completions client.
//!
//! One client backs one candidate session. It accumulates token usage, cost
//! and request time over its lifetime and exposes them through
//! [`UsageMeter`], so the runner can diff snapshots around each call.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use extractbench_core::{MetricSnapshot, UsageMeter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::http::user_agent;

/// `<provider>:<model>`, e.g. `openai:gpt-4o` or `ollama:llama3.1:8b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiId {
    pub provider: String,
    pub model: String,
}

impl AiId {
    /// Split on the first `:`; the model may itself contain colons.
    pub fn parse(ai_id: &str) -> Result<Self> {
        match ai_id.split_once(':') {
            Some((provider, model)) if !provider.is_empty() && !model.is_empty() => Ok(Self {
                provider: provider.to_ascii_lowercase(),
                model: model.to_string(),
            }),
            _ => Err(ProviderError::InvalidAiId(ai_id.to_string())),
        }
    }
}

/// Where a provider's chat API lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Resolve `provider` from the environment.
    ///
    /// | provider | base url                    | key                |
    /// |----------|-----------------------------|--------------------|
    /// | openai   | `OPENAI_BASE_URL` or public | `OPENAI_API_KEY`   |
    /// | ollama   | `OLLAMA_BASE_URL` or local  | none               |
    /// | mistral  | `MISTRAL_BASE_URL` or public| `MISTRAL_API_KEY`  |
    /// | other    | `<NAME>_BASE_URL` required  | `<NAME>_API_KEY`   |
    pub fn from_env(provider: &str) -> Result<Self> {
        Self::resolve(provider, |name| std::env::var(name).ok().filter(|v| !v.is_empty()))
    }

    fn resolve(provider: &str, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let prefix = provider.to_ascii_uppercase().replace('-', "_");
        let base_var = format!("{prefix}_BASE_URL");
        let key_var = format!("{prefix}_API_KEY");

        let default_base = match provider {
            "openai" => Some("https://api.openai.com/v1"),
            "ollama" => Some("http://localhost:11434/v1"),
            "mistral" => Some("https://api.mistral.ai/v1"),
            _ => None,
        };
        let base_url = env(&base_var)
            .or_else(|| default_base.map(str::to_string))
            .ok_or_else(|| ProviderError::MissingEnv(base_var))?;

        let api_key = match provider {
            "ollama" => env(&key_var),
            "openai" | "mistral" => Some(env(&key_var).ok_or(ProviderError::MissingEnv(key_var))?),
            _ => env(&key_var),
        };
        Ok(Self::new(base_url, api_key))
    }
}

/// Price per million tokens, read from candidate options
/// `input_cost_per_mtok` / `output_cost_per_mtok`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pricing {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl Pricing {
    pub fn from_options(options: &BTreeMap<String, Value>) -> Result<Self> {
        Ok(Self {
            input_per_mtok: number_option(options, "input_cost_per_mtok")?.unwrap_or(0.0),
            output_per_mtok: number_option(options, "output_cost_per_mtok")?.unwrap_or(0.0),
        })
    }
}

pub(crate) fn number_option(options: &BTreeMap<String, Value>, key: &str) -> Result<Option<f64>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| ProviderError::InvalidOption {
            key: key.to_string(),
            reason: format!("expected a number, got {v}"),
        }),
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

/// Chat client for one model, metering everything it sends.
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: Endpoint,
    model: String,
    pricing: Pricing,
    usage: Mutex<MetricSnapshot>,
}

impl ChatClient {
    pub fn new(endpoint: Endpoint, model: impl Into<String>, pricing: Pricing, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint,
            model: model.into(),
            pricing,
            usage: Mutex::new(MetricSnapshot::default()),
        })
    }

    /// Client for `ai_id`, with the endpoint resolved from the environment.
    pub fn from_env(ai_id: &str, pricing: Pricing, timeout: Duration) -> Result<Self> {
        let id = AiId::parse(ai_id)?;
        Self::new(Endpoint::from_env(&id.provider)?, id.model, pricing, timeout)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user exchange and return the reply text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
        };

        let mut builder = self.http.post(&url).json(&request);
        if let Some(key) = &self.endpoint.api_key {
            builder = builder.bearer_auth(key);
        }

        let started = Instant::now();
        let response = builder.send().await?.error_for_status()?;
        let body: ChatResponse = response.json().await?;
        let took = started.elapsed().as_secs_f64();

        let tokens = body.usage.unwrap_or_default();
        self.meter(&tokens, took);
        debug!(
            model = %self.model,
            input = tokens.prompt_tokens,
            output = tokens.completion_tokens,
            secs = took,
            "chat completion"
        );

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse("no choices in completion".to_string()))
    }

    fn meter(&self, tokens: &TokenUsage, secs: f64) {
        let total = if tokens.total_tokens > 0 {
            tokens.total_tokens
        } else {
            tokens.prompt_tokens + tokens.completion_tokens
        };
        let input_cost = tokens.prompt_tokens as f64 * self.pricing.input_per_mtok / 1_000_000.0;
        let output_cost = tokens.completion_tokens as f64 * self.pricing.output_per_mtok / 1_000_000.0;
        let call = MetricSnapshot::new()
            .with_usage("input", tokens.prompt_tokens)
            .with_usage("output", tokens.completion_tokens)
            .with_usage("total", total)
            .with_cost("input", input_cost)
            .with_cost("output", output_cost)
            .with_cost("total", input_cost + output_cost)
            .with_elapsed("requests", secs);

        let mut usage = self.usage.lock().unwrap_or_else(|p| p.into_inner());
        *usage = usage.add(&call);
    }
}

impl UsageMeter for ChatClient {
    fn snapshot(&self) -> MetricSnapshot {
        self.usage.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}
