use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::OracleConfig;
use crate::error::OracleError;
use crate::transport::{OracleRequest, VisionOracle};

/// Client for the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model_name: String,
}

impl HttpOracle {
    pub fn new(cfg: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OracleError::InvalidConfig("api_key is required for api mode".into()))?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(8);
        if let Some(secs) = cfg.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| OracleError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/models/{}:generateContent",
            cfg.api_url.trim_end_matches('/'),
            cfg.model_name
        );

        Ok(Self {
            client,
            endpoint,
            api_key,
            model_name: cfg.model_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Request body in the generateContent wire format.
pub(crate) fn build_payload(request: &OracleRequest) -> Value {
    let mut parts = vec![json!({ "text": request.prompt })];
    for image in &request.images {
        parts.push(json!({
            "inline_data": {
                "mime_type": image.mime_type(),
                "data": image.to_base64(),
            }
        }));
    }

    let mut payload = json!({
        "contents": [{ "role": "user", "parts": parts }],
    });
    if request.json_response {
        payload["generationConfig"] = json!({ "responseMimeType": "application/json" });
    }
    payload
}

/// Concatenated text of the first candidate.
pub(crate) fn extract_text(body: &Value) -> Result<String, OracleError> {
    let parts = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array);

    let Some(parts) = parts else {
        let reason = body
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
            .or_else(|| body.pointer("/candidates/0/finishReason").and_then(Value::as_str))
            .unwrap_or("no candidates");
        return Err(OracleError::MalformedResponse(format!(
            "response carried no text ({reason})"
        )));
    };

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        return Err(OracleError::MalformedResponse("response text was empty".into()));
    }
    Ok(text)
}

#[async_trait]
impl VisionOracle for HttpOracle {
    async fn generate(&self, request: OracleRequest) -> Result<String, OracleError> {
        let payload = build_payload(&request);
        debug!(
            model = %self.model_name,
            task = ?request.task,
            images = request.images.len(),
            "oracle_request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(e.without_url().to_string()))?;
        extract_text(&body)
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
