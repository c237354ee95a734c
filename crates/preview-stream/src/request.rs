use crate::errors::PreviewError;

/// Default upper bound on prompt length, in characters.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 4_000;

const SYSTEM_PROMPT: &str = "You are an expert web application generator. \
Given a description, reply with one complete, self-contained HTML document: \
all CSS inside <style> tags and all JavaScript inside <script> tags, so it renders \
standalone in a sandboxed iframe. Use semantic HTML, clean typography, a thoughtful \
color scheme, smooth transitions and a responsive layout. Output only the document.";

/// One generation call: which record it is for and what to build.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GenerateRequest {
    /// Opaque identifier of the caller's target (for example a project id).
    pub target_id: String,
    /// Natural-language description of the page to generate.
    pub prompt: String,
}

impl GenerateRequest {
    pub fn new(target_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            prompt: prompt.into(),
        }
    }

    /// Caller-side checks run before a session starts.
    pub fn validate(&self, max_prompt_chars: usize) -> Result<(), PreviewError> {
        if self.target_id.trim().is_empty() {
            return Err(PreviewError::Validation("target id must not be empty".into()));
        }
        if self.prompt.trim().is_empty() {
            return Err(PreviewError::Validation("prompt must not be empty".into()));
        }
        let chars = self.prompt.chars().count();
        if chars > max_prompt_chars {
            return Err(PreviewError::Validation(format!(
                "prompt is {chars} characters, limit is {max_prompt_chars}"
            )));
        }
        Ok(())
    }

    /// Conversational JSON body posted upstream.
    pub fn to_body(&self, model: Option<&str>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "target_id": self.target_id,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": format!("Create a web application for: {}", self.prompt.trim()) },
            ],
            "stream": true,
        });
        if let Some(model) = model.map(str::trim).filter(|m| !m.is_empty()) {
            body["model"] = serde_json::json!(model);
        }
        body
    }
}
