//! Merge-and-describe endpoint

use super::describe::{VISION_MODEL, extract_prompt, fallback_response, guard_image_source};
use crate::core::media::{DataUrl, compose_side_by_side, parse_data_url};
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpResponse, web};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const MERGED_FILE_NAME: &str = "merged-image.jpg";
const MERGED_CONTENT_TYPE: &str = "image/jpeg";

const COMPOSED_PROMPT: &str = "This image shows a person on the LEFT and a separate object on the RIGHT. The person should be holding/using the object from the RIGHT side, not whatever they may already have. Generate a prompt for the LEFT person to hold/use the RIGHT object. Format: \"[person description] [action with RIGHT object]\". Example: \"This woman holding this bottle\". Only the RIGHT object matters.";

const COMPOSED_SYSTEM_PROMPT: &str = "IGNORE anything the person on LEFT already has. Focus only on the separate object on the RIGHT side. Generate prompt for LEFT person to hold/use the RIGHT object. Format: '[person] [action] [RIGHT object]'. Keep under 6 words.";

/// Request body for /api/compose.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequest {
    #[serde(default)]
    pub person_image_url: Option<String>,
    #[serde(default)]
    pub object_image_url: Option<String>,
}

/// Merge both images into one side-by-side frame, upload it, and run the
/// vision model over the merged frame so the prompt is spatially grounded.
pub async fn compose(
    body: web::Json<ComposeRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let body = body.into_inner();

    let person = body.person_image_url.as_deref().filter(|u| !u.is_empty());
    let object = body.object_image_url.as_deref().filter(|u| !u.is_empty());
    let (Some(person), Some(object)) = (person, object) else {
        return Err(GatewayError::bad_request(
            "Missing required fields: personImageUrl and objectImageUrl",
        ));
    };

    let person_image = gather_image(&state, person).await?;
    let object_image = gather_image(&state, object).await?;

    // A raster failure on either side degrades to the person image alone.
    let merged = match compose_side_by_side(&person_image.bytes, &object_image.bytes) {
        Ok(jpeg) => Bytes::from(jpeg),
        Err(e) => {
            warn!("Side-by-side merge failed, using person image alone: {}", e);
            person_image.bytes.clone()
        }
    };

    let merged_url = match state
        .provider
        .upload(merged, MERGED_CONTENT_TYPE, MERGED_FILE_NAME, None)
        .await
    {
        Ok(url) => url,
        Err(e) => {
            warn!("Merged image upload failed, serving fallback prompt: {}", e);
            return Ok(fallback_response(person, object));
        }
    };

    debug!("Merged image uploaded: {}", merged_url);

    let input = json!({
        "prompt": COMPOSED_PROMPT,
        "system_prompt": COMPOSED_SYSTEM_PROMPT,
        "priority": "latency",
        "model": "google/gemini-25-flash",
        "image_url": merged_url,
    });

    match state.provider.run_stream(VISION_MODEL, &input, None).await {
        Ok(aggregate) => {
            let prompt = extract_prompt(&aggregate);
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "prompt": prompt,
                "personImageUrl": person,
                "objectImageUrl": object,
            })))
        }
        Err(e) => {
            warn!("Vision analysis failed, serving fallback prompt: {}", e);
            Ok(fallback_response(person, object))
        }
    }
}

/// Load one image source into memory: data URLs decode locally, remote
/// URLs are fetched after clearing the outbound guard.
async fn gather_image(state: &AppState, source: &str) -> Result<DataUrl> {
    if source.starts_with("data:") {
        return Ok(parse_data_url(source)?);
    }
    guard_image_source(state, source)?;
    Ok(state.media.fetch(source).await?)
}
