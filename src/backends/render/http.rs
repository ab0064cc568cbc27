// SPDX-License-Identifier: GPL-3.0-only

//! HTTP render service client
//!
//! `POST {base}/virtual-makeup/try-makeup` with a multipart form holding the
//! JPEG source and the flattened region parameters. Success bodies are the
//! composite image; failures usually carry `{"detail": "..."}`.

use super::RenderService;
use crate::constants::{app_info, render};
use crate::errors::RenderError;
use crate::pipelines::render::RenderRequest;
use crate::session::Region;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct HttpRenderService {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

impl HttpRenderService {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .user_agent(app_info::user_agent())
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });

        Self {
            client,
            endpoint: endpoint_url(base_url),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(request: &RenderRequest) -> Result<Form, RenderError> {
        let image = Part::bytes(request.image.to_vec())
            .file_name(render::IMAGE_PART_NAME)
            .mime_str(render::IMAGE_MIME)
            .map_err(|e| RenderError::Network(format!("Invalid image part: {}", e)))?;

        let lips = request.region(Region::Lips);
        let cheeks = request.region(Region::Cheeks);

        Ok(Form::new()
            .part("image", image)
            .text("lips_color", lips.color.to_hex())
            .text("lips_intensity", lips.intensity.get().to_string())
            .text("cheeks_color", cheeks.color.to_hex())
            .text("cheeks_intensity", cheeks.intensity.get().to_string())
            .text("makeup_type", request.makeup_type.as_str())
            .text("t", chrono::Utc::now().timestamp_millis().to_string()))
    }
}

#[async_trait]
impl RenderService for HttpRenderService {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        debug!(
            generation = request.generation,
            endpoint = %self.endpoint,
            "Sending render request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, render::IMAGE_MIME)
            .multipart(Self::form(request)?)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Server {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Network(format!("Failed to read render body: {}", e)))?;

        if bytes.is_empty() {
            return Err(RenderError::InvalidResponse("Empty body".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        render::TRY_MAKEUP_PATH
    )
}

/// Connection refusal means there is no service at all
fn map_transport_error(err: reqwest::Error) -> RenderError {
    if err.is_connect() {
        RenderError::Unavailable(err.to_string())
    } else if err.is_timeout() {
        RenderError::Network(format!("Transport timeout: {}", err))
    } else {
        RenderError::Network(err.to_string())
    }
}

/// Pull `detail` out of a JSON error body, falling back to the raw text
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.detail,
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
