//! Cloudinary media storage over its signed upload API.

use crate::config::CloudinaryConfig;
use crate::error::MediaError;
use crate::ports::media::{MediaKind, MediaStorage, UploadedMedia};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::io::ReaderStream;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);
const DESTROY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

pub struct CloudinaryMedia {
    client: Client,
    config: CloudinaryConfig,
    base_url: String,
}

impl CloudinaryMedia {
    pub fn new(config: CloudinaryConfig) -> Result<Self, MediaError> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            config,
            base_url: API_BASE.to_string(),
        })
    }

    fn endpoint(&self, kind: MediaKind, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            self.config.cloud_name,
            kind.as_str(),
            action
        )
    }

    /// Signed form carrying `params` plus the credentials.
    fn signed_form(&self, params: &[(&'static str, String)]) -> Form {
        let timestamp = unix_now().to_string();
        let mut signed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        signed.push(("timestamp", timestamp.as_str()));
        let signature = sign(&signed, &self.config.api_secret);

        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(*key, value.clone());
        }
        form
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Parameters sorted by name and joined as `a=1&b=2`.
fn string_to_sign(params: &[(&str, &str)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Streams the staged file into the form instead of reading it into memory.
async fn file_part(local_path: &Path) -> Result<Part, MediaError> {
    let file = tokio::fs::File::open(local_path).await?;
    let len = file.metadata().await?.len();
    let file_name = local_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let mime = mime_guess::from_path(local_path).first_or_octet_stream();
    let body = Body::wrap_stream(ReaderStream::new(file));
    Ok(Part::stream_with_length(body, len)
        .file_name(file_name)
        .mime_str(mime.essence_str())?)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, MediaError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|body| body.error.message)
            .unwrap_or_else(|_| status.to_string());
        return Err(MediaError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl MediaStorage for CloudinaryMedia {
    async fn upload(&self, local_path: &Path, kind: MediaKind) -> Result<UploadedMedia, MediaError> {
        let part = file_part(local_path).await?;
        let form = self.signed_form(&[]).part("file", part);
        let response = self
            .client
            .post(self.endpoint(kind, "upload"))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = read_json(response).await?;
        tracing::debug!("uploaded {} to cloudinary as {}", kind.as_str(), uploaded.public_id);

        Ok(UploadedMedia {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
            duration: uploaded.duration,
        })
    }

    async fn destroy(&self, public_id: &str, kind: MediaKind) -> Result<(), MediaError> {
        let form = self.signed_form(&[("public_id", public_id.to_string())]);
        let response = self
            .client
            .post(self.endpoint(kind, "destroy"))
            .timeout(DESTROY_TIMEOUT)
            .multipart(form)
            .send()
            .await?;
        let destroyed: DestroyResponse = read_json(response).await?;
        match destroyed.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Rejected {
                status: 200,
                message: format!("destroy of {} returned {}", public_id, other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> CloudinaryMedia {
        CloudinaryMedia::new(CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "1234".into(),
            api_secret: "abcd".into(),
        })
        .unwrap()
    }

    #[test]
    fn test_params_are_sorted_before_signing() {
        let raw = string_to_sign(&[("timestamp", "1315060510"), ("public_id", "sample")]);
        assert_eq!(raw, "public_id=sample&timestamp=1315060510");
    }

    #[test]
    fn test_signature_is_sha1_of_params_and_secret() {
        let params = [("timestamp", "1315060510"), ("public_id", "sample")];
        let expected = hex::encode(Sha1::digest(
            b"public_id=sample&timestamp=1315060510abcd",
        ));
        assert_eq!(sign(&params, "abcd"), expected);
        assert_eq!(expected.len(), 40);
    }

    #[tokio::test]
    async fn test_file_part_streams_from_disk() {
        let mut staged = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        std::io::Write::write_all(&mut staged, &vec![7u8; 64 * 1024]).unwrap();
        assert!(file_part(staged.path()).await.is_ok());

        let missing = staged.path().with_extension("gone");
        assert!(matches!(file_part(&missing).await, Err(MediaError::Io(_))));
    }

    #[test]
    fn test_endpoints_follow_resource_type() {
        let media = media();
        assert_eq!(
            media.endpoint(MediaKind::Video, "upload"),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
        assert_eq!(
            media.endpoint(MediaKind::Image, "destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }
}
