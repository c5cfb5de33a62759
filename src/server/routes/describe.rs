//! Vision description endpoint

use crate::core::provider::StreamAggregate;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpResponse, web};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

/// Vision model behind the describe and compose endpoints.
pub(super) const VISION_MODEL: &str = "fal-ai/any-llm/vision";

/// Prompt returned when the model streams nothing usable.
pub(super) const DEFAULT_PROMPT: &str = "Person holding and using the object in a natural pose";

/// Canned prompts served when the vision call fails outright.
pub(super) const FALLBACK_PROMPTS: &[&str] = &[
    "Person holding and showcasing the object in a natural, professional pose with good lighting",
    "Person using the object in an everyday, realistic setting with natural lighting",
    "Person wearing/carrying the object in a stylish, advertising-style pose",
    "Person demonstrating the object in a clean, studio-like environment",
    "Person posed naturally with the object, showing it in use",
];

const ANALYSIS_PROMPT: &str = "I see two images - a person and an object. The person should be holding, wearing, or using this object. Please generate a detailed prompt for an AI image generator that describes how the person would naturally interact with this object. Focus on realistic pose, natural interaction, and good composition. Example: \"Woman in black outfit holding and showcasing brown leather handbag in professional advertising pose with studio lighting\". Only provide the prompt text, no additional commentary.\n\nImage 1: Person\nImage 2: Object to be held/used\n\nGenerate a prompt for: Person holding/using the object naturally.";

const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert at creating detailed prompts for AI image generation. Analyze the person and object images. Create a single, detailed prompt that describes the person holding, using, or wearing the object in a natural and realistic way. Only provide the prompt text, no additional commentary or formatting.";

/// Request body for /api/describe.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeRequest {
    #[serde(default)]
    pub person_image_url: Option<String>,
    #[serde(default)]
    pub object_image_url: Option<String>,
}

/// Turn a person image and an object image into a generation prompt
/// describing the person using the object.
///
/// Vision failures degrade to a canned prompt instead of an error.
pub async fn describe(
    body: web::Json<DescribeRequest>,
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

    guard_image_source(&state, person)?;
    guard_image_source(&state, object)?;

    let input = json!({
        "prompt": ANALYSIS_PROMPT,
        "system_prompt": ANALYSIS_SYSTEM_PROMPT,
        "priority": "latency",
        "model": "google/gemini-25-flash",
        "image_url": person,
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

/// Data URLs are used as-is; remote URLs must clear the outbound guard.
pub(super) fn guard_image_source(state: &AppState, source: &str) -> Result<()> {
    if source.starts_with("data:") {
        return Ok(());
    }
    state.url_guard.evaluate(source)?;
    Ok(())
}

/// Prompt extraction order: the final event's `output`, then the
/// concatenated message text, then the default.
pub(super) fn extract_prompt(aggregate: &StreamAggregate) -> String {
    if let Some(output) = aggregate.final_output() {
        return output.to_string();
    }
    let message = aggregate.aggregated_message();
    if !message.is_empty() {
        return message;
    }
    DEFAULT_PROMPT.to_string()
}

/// Successful response built from a canned prompt, marked `fallback`.
pub(super) fn fallback_response(person: &str, object: &str) -> HttpResponse {
    let prompt = FALLBACK_PROMPTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DEFAULT_PROMPT);

    HttpResponse::Ok().json(json!({
        "success": true,
        "prompt": prompt,
        "personImageUrl": person,
        "objectImageUrl": object,
        "fallback": true,
    }))
}
