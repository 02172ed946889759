use std::fmt::{self, Debug, Formatter};

/// Connection parameters for the model backend.
///
/// Every field is optional so that independent providers can each
/// contribute the part they know about; the merger fills the gaps
/// by priority.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ModelConfig {
    /// API key used to authenticate against the backend.
    pub api_key: Option<String>,
    /// Base URL of the backend.
    pub base_url: Option<String>,
    /// Name of the model to call.
    pub model_name: Option<String>,
}

impl ModelConfig {
    /// Creates an empty configuration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the model name.
    #[inline]
    pub fn with_model_name<S: Into<String>>(mut self, model_name: S) -> Self {
        self.model_name = Some(model_name.into());
        self
    }
}

impl Debug for ModelConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ModelConfig::new()
            .with_api_key("sk-secret")
            .with_model_name("test-model");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("test-model"));
    }
}
