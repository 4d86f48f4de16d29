use serde::{Deserialize, Serialize};

use super::types::Content;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentPath {
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentRequestBody {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateContentRequest {
    pub path: GenerateContentPath,
    pub body: GenerateContentRequestBody,
}

impl GenerateContentRequest {
    /// Single-turn request carrying one user text part.
    pub fn from_prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            path: GenerateContentPath {
                model: model.into(),
            },
            body: GenerateContentRequestBody {
                contents: vec![Content::user_text(prompt)],
            },
        }
    }
}
