use std::time::Duration;

use axum::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::GenerationError;

const FAL_API_URL: &str = "https://fal.run/fal-ai/flux-2";

/// Seam over the external image provider so the workflow can be exercised
/// without network access.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Bytes, GenerationError>;
}

#[derive(Debug, Serialize)]
struct FalRequest<'a> {
    prompt: &'a str,
    image_size: &'static str,
    num_images: u32,
    enable_safety_checker: bool,
    output_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct FalResponse {
    #[serde(default)]
    images: Vec<FalImage>,
}

#[derive(Debug, Deserialize)]
struct FalImage {
    url: String,
}

pub struct FalClient {
    client: Client,
    api_key: Option<String>,
}

impl FalClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("reqwest client");
        Self { client, api_key }
    }
}

#[async_trait]
impl ImageGenerator for FalClient {
    async fn generate(&self, prompt: &str) -> Result<Bytes, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::ServiceUnavailable)?;

        let request = FalRequest {
            prompt,
            image_size: "landscape_4_3",
            num_images: 1,
            enable_safety_checker: false,
            output_format: "webp",
        };

        let response = self
            .client
            .post(FAL_API_URL)
            .header("Authorization", format!("Key {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "fal api error");
            return Err(GenerationError::Provider(format!("{status} {body}")));
        }

        let result: FalResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Provider(e.to_string()))?;
        let image_url = result
            .images
            .first()
            .map(|i| i.url.as_str())
            .ok_or(GenerationError::NoImageInResponse)?;

        debug!(%image_url, "downloading generated image");
        let image = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(|e| GenerationError::Download(e.to_string()))?;
        if !image.status().is_success() {
            return Err(GenerationError::Download(image.status().to_string()));
        }

        image
            .bytes()
            .await
            .map_err(|e| GenerationError::Download(e.to_string()))
    }
}
