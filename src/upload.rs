use crate::config::ImageHostConfig;
use futures_util::future::join_all;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_FOLDER: &str = "general";
const ROOT_FOLDER: &str = "sp-warehouse";
const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Image stored on the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    #[serde(rename = "secure_url")]
    pub url: String,
    pub public_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Image host is not configured: missing {0}")]
    NotConfigured(&'static str),

    #[error("Image host API error: HTTP {status} - {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn user_message(&self) -> String {
        match self {
            UploadError::NotConfigured(what) => format!(
                "Uploads are disabled: set {} in the config file or environment",
                what
            ),
            UploadError::Api { status, message } => {
                format!("Image host rejected the request ({}): {}", status, message)
            }
            UploadError::Http(e) => format!("Network error: {}", e),
            UploadError::Io(e) => format!("Could not read file: {}", e),
        }
    }
}

/// Remote image storage used by the admin flows.
pub trait ImageHost {
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, folder: &str) -> Result<UploadedImage, UploadError>;

    async fn remove(&self, public_id: &str) -> Result<(), UploadError>;
}

/// Remove the hosted images behind `urls`, best effort. Returns how many
/// were removed; failures and non-hosted URLs are logged and skipped.
pub async fn remove_images<H: ImageHost>(host: &H, urls: &[String]) -> usize {
    let ids: Vec<String> = urls.iter().filter_map(|u| public_id_from_url(u)).collect();
    let results = join_all(ids.iter().map(|id| host.remove(id))).await;
    let mut removed = 0;
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(()) => removed += 1,
            Err(e) => warn!(public_id = %id, error = %e, "image removal failed"),
        }
    }
    removed
}

/// Signed-upload client for Cloudinary.
pub struct CloudinaryClient {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorMessage,
}

#[derive(Deserialize)]
struct ApiErrorMessage {
    message: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

/// `k=v` pairs sorted by key and joined with `&`, as the API expects them
/// before the secret is appended.
fn string_to_sign(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn sign(params: &[(&str, String)], secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryClient {
    pub fn from_config(config: &ImageHostConfig) -> Result<Self, UploadError> {
        fn required(value: &Option<String>, name: &'static str) -> Result<String, UploadError> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(UploadError::NotConfigured(name))
        }
        Ok(Self {
            http: reqwest::Client::new(),
            cloud_name: required(&config.cloud_name, "CLOUDINARY_CLOUD_NAME")?,
            api_key: required(&config.api_key, "CLOUDINARY_API_KEY")?,
            api_secret: required(&config.api_secret, "CLOUDINARY_API_SECRET")?,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.cloud_name)
    }

    fn signed_form(&self, params: Vec<(&'static str, String)>) -> Form {
        let signature = sign(&params, &self.api_secret);
        let mut form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }
        form
    }

    async fn post(&self, action: &str, form: Form) -> Result<reqwest::Response, UploadError> {
        let response = self.http.post(self.endpoint(action)).multipart(form).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        Err(UploadError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn unix_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

impl ImageHost for CloudinaryClient {
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, folder: &str) -> Result<UploadedImage, UploadError> {
        let folder = if folder.trim().is_empty() { DEFAULT_FOLDER } else { folder.trim() };
        let params = vec![
            ("folder", format!("{ROOT_FOLDER}/{folder}")),
            ("timestamp", unix_timestamp()),
            ("transformation", "q_auto:good/f_auto".to_string()),
        ];
        let size = bytes.len();
        let form = self
            .signed_form(params)
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        debug!(file = file_name, size, "uploading image");
        let image: UploadedImage = self.post("upload", form).await?.json().await?;
        info!(public_id = %image.public_id, "image uploaded");
        Ok(image)
    }

    async fn remove(&self, public_id: &str) -> Result<(), UploadError> {
        let params = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", unix_timestamp()),
        ];
        let response: DestroyResponse = self.post("destroy", self.signed_form(params)).await?.json().await?;
        // "not found" is fine: the image is gone either way
        if response.result != "ok" && response.result != "not found" {
            return Err(UploadError::Api {
                status: 200,
                message: response.result,
            });
        }
        info!(public_id, "image removed");
        Ok(())
    }
}

/// Delivery options for [`optimize_image_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptions {
    pub quality: String,
    pub format: String,
    pub crop: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            quality: "auto".to_string(),
            format: "auto".to_string(),
            crop: "fill".to_string(),
        }
    }
}

/// Add a resize/format transformation to a Cloudinary URL. Other URLs are
/// returned unchanged.
pub fn optimize_image_url(url: &str, width: u32, height: Option<u32>, options: &ImageOptions) -> String {
    if url.is_empty() {
        return String::new();
    }
    if !url.contains("cloudinary.com") {
        return url.to_string();
    }
    let height = height.map(|h| format!(",h_{h}")).unwrap_or_default();
    let transform = format!(
        "w_{width}{height},c_{},q_{},f_{}",
        options.crop, options.quality, options.format
    );
    url.replacen("/upload/", &format!("/upload/{transform}/"), 1)
}

static VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^v\d+$").expect("static pattern compiles"));
static TRANSFORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{1,3}_[^,]+(,[a-z]{1,3}_[^,]+)*$").expect("static pattern compiles"));

/// Public id of a Cloudinary delivery URL: the path after `/upload/` without
/// transformations, version or extension.
pub fn public_id_from_url(url: &str) -> Option<String> {
    if !url.contains("cloudinary.com") {
        return None;
    }
    let (_, rest) = url.split_once("/upload/")?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    let start = match segments.iter().position(|s| VERSION.is_match(s)) {
        Some(version) => version + 1,
        None => segments.iter().take_while(|s| TRANSFORM.is_match(s)).count(),
    };
    let path = segments.get(start..)?;
    let (last, dirs) = path.split_last()?;
    let stem = last.rsplit_once('.').map_or(*last, |(stem, _)| stem);
    if stem.is_empty() {
        return None;
    }
    let mut id = dirs.join("/");
    if !id.is_empty() {
        id.push('/');
    }
    id.push_str(stem);
    Some(id)
}


#[cfg(test)]
mod tests {
    use super::fake::RecordingHost;
    use super::*;

    const URL: &str = "https://res.cloudinary.com/demo/image/upload/v1718000000/sp-warehouse/works/roof-02.jpg";

    #[test]
    fn test_optimize_inserts_transformation() {
        let out = optimize_image_url(URL, 800, Some(600), &ImageOptions::default());
        assert_eq!(
            out,
            "https://res.cloudinary.com/demo/image/upload/w_800,h_600,c_fill,q_auto,f_auto/v1718000000/sp-warehouse/works/roof-02.jpg"
        );
        let opts = ImageOptions {
            quality: "80".into(),
            ..Default::default()
        };
        assert!(optimize_image_url(URL, 400, None, &opts).contains("/upload/w_400,c_fill,q_80,f_auto/"));
    }

    #[test]
    fn test_optimize_leaves_other_urls_alone() {
        assert_eq!(optimize_image_url("", 100, None, &ImageOptions::default()), "");
        let other = "https://example.com/upload/a.jpg";
        assert_eq!(optimize_image_url(other, 100, None, &ImageOptions::default()), other);
    }

    #[test]
    fn test_public_id_from_url() {
        assert_eq!(public_id_from_url(URL).as_deref(), Some("sp-warehouse/works/roof-02"));
        let transformed = optimize_image_url(URL, 800, Some(600), &ImageOptions::default());
        assert_eq!(public_id_from_url(&transformed).as_deref(), Some("sp-warehouse/works/roof-02"));
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/d/image/upload/w_10,c_fill/folder/pic.png?x=1").as_deref(),
            Some("folder/pic")
        );
        assert_eq!(public_id_from_url("https://example.com/upload/a.jpg"), None);
        assert_eq!(public_id_from_url("https://res.cloudinary.com/d/image/upload/"), None);
    }

    #[test]
    fn test_signature_params_sorted_and_stable() {
        let params = vec![
            ("timestamp", "1315060510".to_string()),
            ("folder", "sp-warehouse/works".to_string()),
            ("eager", String::new()),
        ];
        assert_eq!(string_to_sign(&params), "folder=sp-warehouse/works&timestamp=1315060510");
        let a = sign(&params, "secret");
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, sign(&params, "secret"));
        assert_ne!(a, sign(&params, "other"));
    }

    #[test]
    fn test_client_requires_credentials() {
        let config = ImageHostConfig {
            cloud_name: Some("demo".into()),
            api_key: Some("key".into()),
            api_secret: Some("  ".into()),
        };
        let err = CloudinaryClient::from_config(&config).err().unwrap();
        assert!(matches!(err, UploadError::NotConfigured("CLOUDINARY_API_SECRET")));
        assert!(err.user_message().contains("CLOUDINARY_API_SECRET"));

        let config = ImageHostConfig {
            api_secret: Some("s".into()),
            ..config
        };
        let client = CloudinaryClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint("destroy"), "https://api.cloudinary.com/v1_1/demo/image/destroy");
    }

    #[tokio::test]
    async fn test_remove_images_is_best_effort() {
        let host = RecordingHost::default();
        host.failing.borrow_mut().insert("sp-warehouse/works/b".into());
        let urls = vec![
            "https://res.cloudinary.com/d/image/upload/v1/sp-warehouse/works/a.jpg".to_string(),
            "https://res.cloudinary.com/d/image/upload/v1/sp-warehouse/works/b.jpg".to_string(),
            "https://example.com/c.jpg".to_string(),
        ];
        assert_eq!(remove_images(&host, &urls).await, 1);
        assert_eq!(*host.removed.borrow(), vec!["sp-warehouse/works/a".to_string()]);
    }
}
