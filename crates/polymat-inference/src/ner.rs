//! NER tagger sidecar client.
//!
//! The materials tagger runs as a GPU-resident sidecar service; this
//! module provides the HTTP client for it. Tag spans come back as
//! character offsets into the submitted text, non-overlapping and sorted
//! ascending.
//!
//! # Configuration
//!
//! - `POLYMAT_TAGGER_BASE_URL`: base URL of the tagger sidecar. Set to an
//!   empty string to disable tagging.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use polymat_core::{defaults, Result, TagSpan};

/// Backend trait for sequence tagging.
#[async_trait]
pub trait NerTagger: Send + Sync {
    /// Tag a paragraph, returning character-offset spans.
    async fn tag(&self, text: &str) -> Result<Vec<TagSpan>>;

    /// Check if the tagger backend is available.
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// HTTP client for the tagger sidecar.
pub struct SidecarTagger {
    base_url: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl SidecarTagger {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            model: String::new(), // Populated on first health check
            client: reqwest::Client::new(),
            timeout_secs: defaults::TAGGER_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    /// Returns None if the base URL is unset or explicitly empty.
    pub fn from_env() -> Option<Self> {
        let base_url =
            std::env::var(defaults::ENV_TAGGER_BASE_URL).unwrap_or_else(|_| String::new());
        if base_url.is_empty() {
            return None;
        }
        Some(Self::new(base_url))
    }
}

/// Request payload for the sidecar `/tag` endpoint.
#[derive(Serialize)]
struct TagRequest<'a> {
    text: &'a str,
}

/// Response payload from the sidecar `/tag` endpoint.
#[derive(Deserialize)]
struct TagResponse {
    spans: Vec<TagSpan>,
}

/// Health check response from the sidecar.
#[derive(Deserialize)]
struct HealthResponse {
    status: String,
    #[allow(dead_code)]
    model: String,
}

#[async_trait]
impl NerTagger for SidecarTagger {
    async fn tag(&self, text: &str) -> Result<Vec<TagSpan>> {
        let url = format!("{}/tag", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&TagRequest { text })
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| polymat_core::Error::Tagger(format!("tagger request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(polymat_core::Error::Tagger(format!(
                "tagger returned {}: {}",
                status, body
            )));
        }

        let result: TagResponse = response.json().await.map_err(|e| {
            polymat_core::Error::Tagger(format!("failed to parse tagger response: {}", e))
        })?;

        Ok(result.spans)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => {
                if resp.status().is_success() {
                    if let Ok(health) = resp.json::<HealthResponse>().await {
                        if health.status == "healthy" {
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
            Err(_) => Ok(false),
        }
    }

    fn model_name(&self) -> &str {
        if self.model.is_empty() {
            "materials-ner"
        } else {
            &self.model
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_span_serialization() {
        let span = TagSpan {
            start: 0,
            end: 11,
            entity_group: "POLYMER".to_string(),
            word: "polystyrene".to_string(),
        };

        let json = serde_json::to_value(&span).unwrap();
        assert_eq!(json["start"], 0);
        assert_eq!(json["end"], 11);
        assert_eq!(json["entity_group"], "POLYMER");

        let deserialized: TagSpan = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized, span);
    }

    #[test]
    fn test_sidecar_tagger_new() {
        let tagger = SidecarTagger::new("http://localhost:8091".to_string());
        assert_eq!(tagger.base_url, "http://localhost:8091");
        assert_eq!(tagger.timeout_secs, defaults::TAGGER_TIMEOUT_SECS);
        assert_eq!(tagger.model_name(), "materials-ner");
    }

    #[test]
    fn test_tag_request_serialization() {
        let req = TagRequest {
            text: "PS has a Tg of 100 °C",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["text"], "PS has a Tg of 100 °C");
    }

    #[test]
    fn test_tag_response_deserialization() {
        let json = serde_json::json!({
            "spans": [
                {"start": 0, "end": 2, "entity_group": "POLYMER", "word": "PS"},
                {"start": 9, "end": 11, "entity_group": "PROP_NAME", "word": "Tg"}
            ]
        });
        let resp: TagResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.spans.len(), 2);
        assert_eq!(resp.spans[0].entity_group, "POLYMER");
        assert_eq!(resp.spans[1].start, 9);
    }
}
