pub mod error;

pub use error::{ClassifierError, Result};

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Raw answer from `POST /classify`. The service is free to omit either field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Prediction {
    #[serde(rename = "issueType")]
    pub issue_type: Option<String>,
    /// Model confidence in 0..1.
    pub confidence: Option<f64>,
}

pub struct ClassifierClient {
    client: reqwest::Client,
    base_url: String,
}

impl ClassifierClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Upload one image as the multipart `file` field and read the prediction.
    pub async fn classify(&self, image: &[u8], mime_type: &str) -> Result<Prediction> {
        let url = format!("{}/classify", self.base_url);
        let part = Part::bytes(image.to_vec()).file_name(upload_name(mime_type));
        let part = match part.mime_str(mime_type) {
            Ok(part) => part,
            Err(_) => {
                tracing::debug!(mime_type, "Unrecognized MIME type, sending as octet-stream");
                Part::bytes(image.to_vec())
                    .file_name(upload_name(mime_type))
                    .mime_str("application/octet-stream")?
            }
        };
        let form = Form::new().part("file", part);

        tracing::debug!(url = %url, bytes = image.len(), "Submitting image for classification");

        let resp = self.client.post(&url).multipart(form).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn upload_name(mime_type: &str) -> String {
    let ext = match mime_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/heic" => "heic",
        _ => "jpg",
    };
    format!("upload.{ext}")
}
