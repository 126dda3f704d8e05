//! Mock backends for tests and offline pipeline runs.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use polymat_core::{Result, TagSpan};

use crate::llm::ExtractionBackend;
use crate::ner::NerTagger;

/// Tagger returning canned spans per call, in order. Once the queue is
/// exhausted, further calls return no spans.
pub struct MockTagger {
    responses: Mutex<Vec<Vec<TagSpan>>>,
    calls: Mutex<Vec<String>>,
}

impl MockTagger {
    pub fn new(responses: Vec<Vec<TagSpan>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Texts this tagger was called with.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NerTagger for MockTagger {
    async fn tag(&self, text: &str) -> Result<Vec<TagSpan>> {
        self.calls.lock().unwrap().push(text.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn model_name(&self) -> &str {
        "mock-tagger"
    }
}

/// Extraction backend returning canned JSON responses per call, in order.
/// Once the queue is exhausted, further calls yield `None`.
pub struct MockExtractionBackend {
    responses: Mutex<Vec<Option<JsonValue>>>,
    calls: Mutex<Vec<String>>,
}

impl MockExtractionBackend {
    pub fn new(responses: Vec<Option<JsonValue>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Prompts this backend was called with.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionBackend for MockExtractionBackend {
    async fn extract_records(&self, prompt: &str) -> Result<Option<JsonValue>> {
        self.calls.lock().unwrap().push(prompt.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(None)
        } else {
            Ok(responses.remove(0))
        }
    }

    fn model_name(&self) -> &str {
        "mock-llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_tagger_returns_in_order() {
        let span = TagSpan {
            start: 0,
            end: 2,
            entity_group: "POLYMER".to_string(),
            word: "PS".to_string(),
        };
        let tagger = MockTagger::new(vec![vec![span.clone()], vec![]]);

        let first = tagger.tag("PS film").await.unwrap();
        assert_eq!(first, vec![span]);
        let second = tagger.tag("nothing").await.unwrap();
        assert!(second.is_empty());
        let third = tagger.tag("exhausted").await.unwrap();
        assert!(third.is_empty());
        assert_eq!(tagger.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_backend_returns_in_order() {
        let backend = MockExtractionBackend::new(vec![
            Some(json!([{"material": "PS"}])),
            None,
        ]);
        assert!(backend.extract_records("p1").await.unwrap().is_some());
        assert!(backend.extract_records("p2").await.unwrap().is_none());
        assert!(backend.extract_records("p3").await.unwrap().is_none());
        assert_eq!(backend.calls(), vec!["p1", "p2", "p3"]);
    }
}
