use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const MODELS_URL: &str = "https://openrouter.ai/api/v1/models";
const CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const CHAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin client over the OpenRouter API, shared by the daily model sync and
/// the recipe suggestion endpoint.
pub struct OpenRouterClient {
    client: Client,
    api_key: Option<String>,
    referer: String,
}

/// One entry of the upstream model catalogue, as OpenRouter serves it.
/// Prices arrive as stringly-typed USD per token.
#[derive(Debug, Clone, Deserialize)]
pub struct RawModel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub pricing: Option<RawPricing>,
    #[serde(default)]
    pub architecture: Option<RawArchitecture>,
    #[serde(default)]
    pub context_length: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPricing {
    #[serde(default)]
    pub prompt: Option<serde_json::Value>,
    #[serde(default)]
    pub completion: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawArchitecture {
    #[serde(default)]
    pub modality: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<RawModel>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: i64,
    #[serde(default)]
    pub completion_tokens: i64,
}

impl OpenRouterClient {
    pub fn new(api_key: Option<String>, referer: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client");
        Self {
            client,
            api_key,
            referer,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch the full upstream model catalogue. No auth required.
    pub async fn list_models(&self) -> anyhow::Result<Vec<RawModel>> {
        let response = self
            .client
            .get(MODELS_URL)
            .send()
            .await
            .context("fetch openrouter models")?;
        if !response.status().is_success() {
            anyhow::bail!("failed to fetch models: {}", response.status());
        }
        let body: ModelsResponse = response.json().await.context("decode models response")?;
        Ok(body.data)
    }

    pub async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let api_key = self.api_key.as_deref().context(
            "OpenRouter API key not configured. Please add OPENROUTER_API_KEY to your environment.",
        )?;
        let response = self
            .client
            .post(CHAT_URL)
            .timeout(CHAT_TIMEOUT)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", "Hearth Recipe App")
            .json(request)
            .send()
            .await
            .context("openrouter chat request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenRouter API error: {status} {body}");
        }
        response.json().await.context("decode chat response")
    }
}

/// Upstream prices are USD per single token; convert to USD per 1M tokens.
/// A missing or null value means free, but an unparseable one returns `None`
/// so callers can tell "known zero" apart from "price unknown".
pub fn price_per_million(raw: Option<&serde_json::Value>) -> Option<f64> {
    let per_token = match raw {
        None | Some(serde_json::Value::Null) => 0.0,
        Some(serde_json::Value::String(s)) => s.parse::<f64>().ok()?,
        Some(serde_json::Value::Number(n)) => n.as_f64()?,
        Some(_) => return None,
    };
    Some(per_token * 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn price_parses_strings_and_numbers() {
        assert!((price_per_million(Some(&json!("0.000001"))).unwrap() - 1.0).abs() < 1e-9);
        assert!((price_per_million(Some(&json!(0.000002))).unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(price_per_million(Some(&json!("0"))), Some(0.0));
        assert_eq!(price_per_million(None), Some(0.0));
        assert_eq!(price_per_million(Some(&json!(null))), Some(0.0));
    }

    #[test]
    fn unparseable_price_is_not_zero() {
        assert_eq!(price_per_million(Some(&json!("garbage"))), None);
        assert_eq!(price_per_million(Some(&json!({"usd": 1}))), None);
    }

    #[test]
    fn raw_model_decodes_sparse_payloads() {
        let m: RawModel = serde_json::from_value(json!({
            "id": "foo/bar",
            "name": "Bar"
        }))
        .unwrap();
        assert_eq!(m.id, "foo/bar");
        assert!(m.pricing.is_none());
        assert!(m.context_length.is_none());
    }
}
