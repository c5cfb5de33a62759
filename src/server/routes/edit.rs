//! Image edit endpoint

use crate::core::identity::resolve_client_identity;
use crate::core::media::{extension_for, parse_data_url};
use crate::core::provider::{GenerationPayload, ProviderError};
use crate::server::routes::QuotaSnapshot;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// Model every edit request runs on.
const EDIT_MODEL: &str = "fal-ai/gemini-25-flash-image/edit";

/// Request body for /api/edit.
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub object_image_url: Option<String>,
    #[serde(default = "default_num_images")]
    pub num_images: u32,
    #[serde(default, rename = "customApiKey")]
    pub custom_api_key: Option<String>,
}

fn default_num_images() -> u32 {
    1
}

/// Run an image edit on the pinned edit model.
///
/// Data URL sources are uploaded to provider storage first; remote URLs
/// must clear the outbound guard and are forwarded as-is.
pub async fn edit(
    req: HttpRequest,
    body: web::Json<EditRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let body = body.into_inner();

    let prompt = body.prompt.as_deref().filter(|p| !p.is_empty());
    let image_url = body.image_url.as_deref().filter(|u| !u.is_empty());
    let (Some(prompt), Some(image_url)) = (prompt, image_url) else {
        return Err(GatewayError::bad_request(
            "Missing required fields: prompt and image_url",
        ));
    };

    let custom_key = body.custom_api_key.as_deref().filter(|k| !k.is_empty());

    // Callers on their own key are not charged against the shared quota.
    let decision = match custom_key {
        None => {
            let client = resolve_client_identity(req.headers());
            let decision = state.generation_limiter.check(&client);
            if !decision.allowed {
                return Err(GatewayError::quota_exhausted(decision));
            }
            Some(decision)
        }
        Some(_) => None,
    };

    let mut image_urls = vec![resolve_image_source(&state, image_url, "person", custom_key).await?];
    if let Some(object_url) = body.object_image_url.as_deref().filter(|u| !u.is_empty()) {
        image_urls.push(resolve_image_source(&state, object_url, "object", custom_key).await?);
    }

    info!("Edit request with {} source image(s)", image_urls.len());

    let input = json!({
        "prompt": prompt,
        "image_urls": image_urls,
        "num_images": body.num_images,
    });

    let run = state
        .provider
        .run_queued(EDIT_MODEL, &input, custom_key)
        .await
        .map_err(edit_error)?;

    let payload: GenerationPayload =
        serde_json::from_value(run.payload).map_err(|e| ProviderError::parsing(e.to_string()))?;
    let images: Vec<_> = payload
        .into_images()
        .into_iter()
        .map(|image| image.into_file())
        .collect();

    if images.is_empty() {
        return Err(ProviderError::MissingOutput.into());
    }

    let response = match decision {
        Some(decision) => json!({
            "success": true,
            "images": images,
            "requestId": run.request_id,
            "limits": QuotaSnapshot::from_decision(&decision),
        }),
        None => json!({
            "success": true,
            "images": images,
            "requestId": run.request_id,
        }),
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Normalize one image source into a URL the provider can fetch.
async fn resolve_image_source(
    state: &AppState,
    source: &str,
    label: &str,
    custom_key: Option<&str>,
) -> Result<String> {
    if source.starts_with("data:") {
        let parsed = parse_data_url(source)?;
        let ext = extension_for(&parsed.content_type);
        let file_name = format!("{}_{}.{}", label, chrono::Utc::now().timestamp_millis(), ext);
        let url = state
            .provider
            .upload(parsed.bytes, &parsed.content_type, &file_name, custom_key)
            .await?;
        return Ok(url);
    }

    state.url_guard.evaluate(source)?;
    Ok(source.to_string())
}

/// Map upstream edit failures onto the established client messages.
fn edit_error(err: ProviderError) -> GatewayError {
    match err {
        ProviderError::InvalidInput { .. } => {
            GatewayError::invalid_input("Invalid request - check image format")
        }
        ProviderError::Authentication { .. } => GatewayError::auth("Invalid API key"),
        other => other.into(),
    }
}
