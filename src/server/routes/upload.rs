//! Storage upload endpoint

use crate::core::media::{extension_for, parse_data_url};
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

/// Request body for /api/upload.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub image: Option<String>,
}

/// Push a base64 data URL into provider storage and return the hosted
/// URL.
pub async fn upload(
    body: web::Json<UploadRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let body = body.into_inner();

    let Some(image) = body.image.as_deref().filter(|i| !i.is_empty()) else {
        return Err(GatewayError::bad_request("No image provided"));
    };

    let parsed = parse_data_url(image)?;
    let ext = extension_for(&parsed.content_type);
    let file_name = format!("upload_{}.{}", chrono::Utc::now().timestamp_millis(), ext);

    let url = state
        .provider
        .upload(parsed.bytes, &parsed.content_type, &file_name, None)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "url": url,
    })))
}
