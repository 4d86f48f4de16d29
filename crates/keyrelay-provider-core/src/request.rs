pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: Option<String>,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(model: Option<String>, prompt: impl Into<String>) -> Self {
        Self {
            model,
            prompt: prompt.into(),
        }
    }

    /// Requested model, or `default` when none (or a blank one) was supplied.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(default)
    }
}
