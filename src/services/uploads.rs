use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{
    config::CloudinaryConfig,
    error::{AppError, Result},
};

/// Upload target folder on the hosting side.
const UPLOAD_FOLDER: &str = "chat-apps";
/// Server-side transformation applied to every uploaded image.
const UPLOAD_TRANSFORMATION: &str = "c_limit,h_500,w_500";

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Rejects payloads that are data URIs but do not decode to an image.
///
/// Plain `http(s)` URLs pass through untouched; the hosting service fetches
/// those itself.
fn check_image_payload(image: &str) -> Result<()> {
    let Some(rest) = image.strip_prefix("data:") else {
        return Ok(());
    };

    let encoded = rest
        .split_once(";base64,")
        .map(|(_, data)| data)
        .ok_or_else(|| AppError::BadRequest("Malformed image payload".to_string()))?;

    let bytes = BASE64
        .decode(encoded)
        .map_err(|_| AppError::BadRequest("Malformed image payload".to_string()))?;

    match infer::get(&bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(()),
        _ => Err(AppError::BadRequest(
            "Image payload is not a supported image format".to_string(),
        )),
    }
}

/// Signature over the alphabetically sorted upload parameters plus the API
/// secret, as required by the hosting service's signed-upload contract.
fn sign_upload(timestamp: i64, api_secret: &str) -> String {
    let to_sign = format!(
        "folder={UPLOAD_FOLDER}&timestamp={timestamp}&transformation={UPLOAD_TRANSFORMATION}{api_secret}"
    );
    hex::encode(Sha256::digest(to_sign.as_bytes()))
}

/// Uploads an image payload and returns the hosted URL.
///
/// Called before persistence so stored records only ever carry real hosted
/// URLs, never pending payloads.
pub async fn upload_image(
    http: &reqwest::Client,
    config: &CloudinaryConfig,
    image: &str,
) -> Result<String> {
    check_image_payload(image)?;

    let timestamp = Utc::now().timestamp();
    let signature = sign_upload(timestamp, &config.api_secret);

    let endpoint = format!(
        "https://api.cloudinary.com/v1_1/{}/image/upload",
        config.cloud_name
    );

    let form = [
        ("file", image.to_string()),
        ("api_key", config.api_key.clone()),
        ("timestamp", timestamp.to_string()),
        ("folder", UPLOAD_FOLDER.to_string()),
        ("transformation", UPLOAD_TRANSFORMATION.to_string()),
        ("signature", signature),
        ("signature_algorithm", "sha256".to_string()),
    ];

    let response = http
        .post(&endpoint)
        .form(&form)
        .send()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        return Err(AppError::Upload(format!("upload rejected ({status}): {detail}")));
    }

    let uploaded: UploadResponse = response
        .json()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?;

    Ok(uploaded.secure_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const TINY_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn data_uri_with_png_bytes_is_accepted() {
        let payload = format!("data:image/png;base64,{TINY_PNG}");
        assert!(check_image_payload(&payload).is_ok());
    }

    #[test]
    fn plain_url_passes_through() {
        assert!(check_image_payload("https://example.com/cat.png").is_ok());
    }

    #[test]
    fn data_uri_with_non_image_bytes_is_rejected() {
        let payload = format!("data:image/png;base64,{}", BASE64.encode(b"hello world"));
        assert!(matches!(
            check_image_payload(&payload),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn data_uri_with_broken_base64_is_rejected() {
        assert!(check_image_payload("data:image/png;base64,!!!").is_err());
        assert!(check_image_payload("data:image/png,raw-not-base64").is_err());
    }

    #[test]
    fn upload_signature_is_deterministic() {
        let a = sign_upload(1_700_000_000, "secret");
        let b = sign_upload(1_700_000_000, "secret");
        let c = sign_upload(1_700_000_000, "other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
