use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::config::GENERATE_PATH;
use crate::error::GenerationError;
use crate::models::{GenerateRequest, Generation, Style};

const DEFAULT_FAILURE_MESSAGE: &str = "Generation failed";

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
}

/// Thin wrapper around `POST /api/generate`. No retries: the first failure
/// is returned to the caller.
#[derive(Clone, Debug)]
pub struct GenerationClient {
    http: Client,
    endpoint: Url,
}

impl GenerationClient {
    pub fn new(base_url: &str) -> Result<Self, GenerationError> {
        let base = Url::parse(base_url)
            .map_err(|err| GenerationError::new(format!("invalid endpoint {base_url}: {err}")))?;
        let endpoint = base
            .join(GENERATE_PATH)
            .map_err(|err| GenerationError::new(format!("invalid endpoint {base_url}: {err}")))?;
        Ok(Self {
            http: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn generate(
        &self,
        image_data_url: &str,
        prompt: &str,
        style: Style,
    ) -> Result<Generation, GenerationError> {
        let request = GenerateRequest {
            image_data_url: image_data_url.to_string(),
            prompt: prompt.to_string(),
            style,
        };
        tracing::debug!(endpoint = %self.endpoint, %style, "sending generation request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| GenerationError::new(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorPayload>()
                .await
                .ok()
                .and_then(|payload| payload.message)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
            tracing::debug!(%status, %message, "generation request rejected");
            return Err(GenerationError::new(message));
        }

        response
            .json::<Generation>()
            .await
            .map_err(|err| GenerationError::new(err.to_string()))
    }
}
