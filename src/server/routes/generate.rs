//! Passthrough generation endpoint

use crate::core::identity::resolve_client_identity;
use crate::core::models::{is_model_allowed, model_validation_error};
use crate::server::routes::QuotaSnapshot;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

/// Request body for /api/generate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub custom_api_key: Option<String>,
}

/// Queue a generation on any allowlisted model, forwarding `input` to
/// the provider untouched.
pub async fn generate(
    req: HttpRequest,
    body: web::Json<GenerateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let body = body.into_inner();

    let model = body.model.as_deref().filter(|m| !m.is_empty());
    let input = body.input.as_ref().filter(|v| !v.is_null());
    let (Some(model), Some(input)) = (model, input) else {
        return Err(GatewayError::bad_request("Missing model or input"));
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

    if !is_model_allowed(model) {
        return Err(GatewayError::validation(model_validation_error()));
    }

    info!("Generation request for {}", model);

    let run = state.provider.run_queued(model, input, custom_key).await?;
    let data = run.payload.get("data").cloned().unwrap_or(run.payload);

    let response = match decision {
        Some(decision) => json!({
            "data": data,
            "limits": QuotaSnapshot::from_decision(&decision),
        }),
        None => json!({ "data": data }),
    };

    Ok(HttpResponse::Ok().json(response))
}
