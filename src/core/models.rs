//! Allowlist of upstream model and workflow identifiers
//!
//! The gateway forwards caller-chosen identifiers to the provider, so the
//! set of accepted values is closed. Membership is exact string equality:
//! no prefixes, no wildcards, no case folding.

/// Model identifiers the gateway will forward upstream.
pub const ALLOWED_MODELS: &[&str] = &[
    "fal-ai/gemini-25-flash-image/edit",
    "fal-ai/gemini-25-flash-image",
    "fal-ai/any-llm/vision",
];

/// Check a caller-supplied model identifier against the allowlist.
pub fn is_model_allowed(model: &str) -> bool {
    ALLOWED_MODELS.contains(&model)
}

/// Rejection message enumerating the permitted identifiers.
pub fn model_validation_error() -> String {
    format!(
        "Invalid model. Only the following models are allowed: {}",
        ALLOWED_MODELS.join(", ")
    )
}
