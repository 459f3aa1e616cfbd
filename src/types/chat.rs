use serde::{Deserialize, Serialize};

/// Request body for both chat endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The user prompt to send to the model.
    pub prompt: String,
}

impl ChatRequest {
    /// Creates a new chat request for the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Response body of the non-streaming chat endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// The complete model reply.
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn request_wire_format() {
        let req = ChatRequest::new("hello");
        assert_eq!(to_value(req).unwrap(), json!({"prompt": "hello"}));
    }

    #[test]
    fn response_wire_format() {
        let resp: ChatResponse = serde_json::from_str(r#"{"response":"hi"}"#).unwrap();
        assert_eq!(resp.response, "hi");
    }
}
