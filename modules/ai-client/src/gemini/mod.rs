mod client;
pub mod schema;
pub(crate) mod types;

pub use schema::StructuredOutput;

use base64::Engine;

use crate::error::AiError;
use crate::util::strip_code_blocks;
use client::GeminiClient;
use types::*;

// =============================================================================
// Gemini
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Share a connection pool (and its timeouts) with other clients.
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key, self.http.clone());
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }

    /// Plain text completion for a single prompt.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, AiError> {
        let request = GenerateRequest::new(Content::user(vec![Part::text(prompt)])).config(
            GenerationConfig {
                temperature: Some(0.4),
                max_output_tokens: Some(1024),
                ..Default::default()
            },
        );

        let response = self.client().generate(&self.model, &request).await?;
        response
            .text()
            .map(|t| t.trim().to_string())
            .ok_or_else(|| AiError::Empty(response.empty_reason()))
    }

    /// Send an image with a prompt and parse the reply as `T`.
    ///
    /// The request asks for `application/json` constrained by
    /// [`StructuredOutput::gemini_schema`]. Replies are still passed through
    /// [`strip_code_blocks`] since the model occasionally fences them anyway.
    pub async fn extract_from_image<T: StructuredOutput>(
        &self,
        bytes: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<T, AiError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        let request = GenerateRequest::new(Content::user(vec![
            Part::text(prompt),
            Part::inline(mime_type, encoded),
        ]))
        .config(GenerationConfig {
            temperature: Some(0.2),
            max_output_tokens: None,
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(T::gemini_schema()),
        });

        let response = self.client().generate(&self.model, &request).await?;
        let text = response
            .text()
            .ok_or_else(|| AiError::Empty(response.empty_reason()))?;

        serde_json::from_str(strip_code_blocks(&text)).map_err(|e| {
            AiError::Parse(format!("{} response is not a valid {}: {e}", self.model, T::type_name()))
        })
    }
}
