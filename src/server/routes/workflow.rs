//! Streaming workflow endpoint

use crate::core::models::{is_model_allowed, model_validation_error};
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

/// Request body for /api/workflow.
#[derive(Debug, Deserialize)]
pub struct WorkflowRequest {
    #[serde(default)]
    pub workflow: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
}

/// Run an allowlisted workflow over the provider's streaming endpoint.
///
/// The stream is drained server-side; the client gets the final event,
/// falling back to the last `data` payload seen on the stream.
pub async fn workflow(
    body: web::Json<WorkflowRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let body = body.into_inner();

    let workflow = body.workflow.as_deref().filter(|w| !w.is_empty());
    let input = body.input.as_ref().filter(|v| !v.is_null());
    let (Some(workflow), Some(input)) = (workflow, input) else {
        return Err(GatewayError::bad_request("Missing workflow or input"));
    };

    if !is_model_allowed(workflow) {
        return Err(GatewayError::validation(model_validation_error()));
    }

    info!("Workflow request for {}", workflow);

    let aggregate = state.provider.run_stream(workflow, input, None).await?;
    let result = aggregate
        .final_event
        .clone()
        .or_else(|| aggregate.latest_data())
        .unwrap_or_else(|| json!({}));

    Ok(HttpResponse::Ok().json(result))
}
