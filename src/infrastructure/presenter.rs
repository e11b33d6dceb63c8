// Presentation port - turns a named template plus context into bytes
// The core never formats HTML; a template engine can sit behind this trait.

use axum::body::Bytes;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{AppError, AppResult};

/// Named values handed to presentation (`page_obj`, `post`, `form`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Serialize>(&mut self, key: &str, value: T) -> AppResult<()> {
        let value = serde_json::to_value(value).map_err(|e| {
            AppError::Internal(format!("Failed to serialize context value {}: {}", key, e))
        })?;
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    pub fn with<T: Serialize>(mut self, key: &str, value: T) -> AppResult<Self> {
        self.insert(key, value)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

pub trait Presenter: Send + Sync {
    fn render(&self, template: &str, context: &Context) -> AppResult<Bytes>;

    fn content_type(&self) -> &'static str;
}

/// Renders `{"template": ..., "context": {...}}` documents.
#[derive(Debug, Default, Clone)]
pub struct JsonPresenter;

impl Presenter for JsonPresenter {
    fn render(&self, template: &str, context: &Context) -> AppResult<Bytes> {
        let document = json!({
            "template": template,
            "context": context,
        });
        let body = serde_json::to_vec(&document)
            .map_err(|e| AppError::Internal(format!("Failed to render {}: {}", template, e)))?;
        Ok(Bytes::from(body))
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
