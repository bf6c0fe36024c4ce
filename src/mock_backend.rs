//! Mock generation backend: validates the request, waits, maybe fails, and
//! echoes the uploaded image back as the "generated" one.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::config::{
    self, ERROR_SIMULATION_RATE, GENERATE_PATH, GENERATION_DELAY_MS, INTAKE_PATH,
    MAX_PROMPT_LENGTH,
};
use crate::models::{ApiErrorBody, Generation, Style};
use crate::web_pages;

const GENERATE_BODY_LIMIT: usize = 16 * 1024 * 1024;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

/// Latency and fault injection for the mock endpoint. A fault rate of `0.0`
/// never fails and `1.0` always does.
#[derive(Clone, Debug)]
pub struct MockBackend {
    delay: Duration,
    fault_rate: f64,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(Duration::from_millis(GENERATION_DELAY_MS), ERROR_SIMULATION_RATE)
    }
}

impl MockBackend {
    pub fn new(delay: Duration, fault_rate: f64) -> Self {
        Self {
            delay,
            fault_rate: config::clamp_fault_rate(fault_rate),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn fault_rate(&self) -> f64 {
        self.fault_rate
    }

    pub async fn generate(&self, body: &[u8]) -> Result<Generation, ApiError> {
        let payload: Value = serde_json::from_slice(body).map_err(|err| {
            tracing::error!(error = %err, "generation api error");
            ApiError::internal()
        })?;

        let image_data_url = required_field(&payload, "imageDataUrl");
        let prompt = required_field(&payload, "prompt");
        let style = required_field(&payload, "style");
        let (Some(image_data_url), Some(prompt), Some(style)) = (image_data_url, prompt, style)
        else {
            return Err(ApiError::bad_request(
                "Missing required fields: imageDataUrl, prompt, and style are required",
            ));
        };

        // UTF-16 code units, the unit the page's `maxlength` counts.
        if prompt.encode_utf16().count() > MAX_PROMPT_LENGTH {
            return Err(ApiError::bad_request(format!(
                "Prompt too long. Maximum {MAX_PROMPT_LENGTH} characters allowed."
            )));
        }
        let style = style
            .parse::<Style>()
            .map_err(|err| ApiError::bad_request(err.to_string()))?;

        tokio::time::sleep(self.delay).await;

        if self.roll_fault() {
            tracing::debug!("injecting model overload");
            return Err(ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Model overloaded",
            ));
        }

        Ok(Generation {
            id: generation_id(),
            image_url: image_data_url.to_string(),
            prompt: prompt.to_string(),
            style,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    fn roll_fault(&self) -> bool {
        rand::thread_rng().gen_bool(self.fault_rate)
    }
}

fn required_field<'a>(payload: &'a Value, name: &str) -> Option<&'a str> {
    payload
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn generation_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("gen_{}_{suffix}", Utc::now().timestamp_millis())
}

pub async fn handle_generate(
    State(backend): State<Arc<MockBackend>>,
    body: Bytes,
) -> Result<Json<Generation>, ApiError> {
    let generation = backend.generate(&body).await?;
    tracing::debug!(id = %generation.id, style = %generation.style, "mock generation served");
    Ok(Json(generation))
}

pub fn router(backend: MockBackend) -> Router {
    Router::new()
        .route("/", get(web_pages::studio_page))
        .route(
            GENERATE_PATH,
            post(handle_generate).layer(DefaultBodyLimit::max(GENERATE_BODY_LIMIT)),
        )
        .route(
            INTAKE_PATH,
            // The intake handler stops reading once the file passes its size limit.
            post(web_pages::handle_image_intake).layer(DefaultBodyLimit::disable()),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(backend))
}
