//! Resolution of public model names to upstream chatbot app ids.

use crate::core::config::AppConfig;
use crate::core::{AppError, Result};
use std::collections::HashMap;

/// Upstream chatbot application id.
pub type AppId = u64;

/// Read-only model name → app id table, built once at startup.
#[derive(Debug, Clone)]
pub struct ModelResolver {
    models: HashMap<String, AppId>,
}

impl ModelResolver {
    pub fn new(models: HashMap<String, AppId>) -> Self {
        Self { models }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.models.clone())
    }

    /// Look up the app id for `model`.
    ///
    /// Matching is exact and case-sensitive. Unknown names fail with
    /// [`AppError::UnsupportedModel`] without touching the network.
    pub fn resolve(&self, model: &str) -> Result<AppId> {
        self.models
            .get(model)
            .copied()
            .ok_or_else(|| AppError::UnsupportedModel(model.to_string()))
    }

    /// Configured model names, sorted.
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
