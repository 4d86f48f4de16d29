//! Bodies exchanged with the browser client on the relay endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayTextResponse {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_is_optional() {
        let body: RelayRequestBody = serde_json::from_value(json!({ "prompt": "halo" })).unwrap();
        assert_eq!(body.model, None);
        assert_eq!(body.prompt, "halo");
    }

    #[test]
    fn prompt_is_required() {
        let err = serde_json::from_value::<RelayRequestBody>(json!({ "model": "m" }));
        assert!(err.is_err());
    }

    #[test]
    fn error_without_details_omits_field() {
        let body = RelayErrorResponse {
            error: "boom".to_string(),
            details: None,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "error": "boom" }));
    }
}
