//! Type conversions for GatewayError

use super::types::GatewayError;
use crate::config::ConfigError;
use crate::core::media::MediaError;
use crate::core::url_guard::UrlRejection;

// Media failures split by where the fault lies: bad client input,
// unreachable remote, or a local raster problem.
impl From<MediaError> for GatewayError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidDataUrl | MediaError::Decode(_) => {
                GatewayError::BadRequest(err.to_string())
            }
            MediaError::Fetch(message) => GatewayError::Network(message),
            MediaError::Raster(message) => GatewayError::Internal(message),
        }
    }
}

impl From<ConfigError> for GatewayError {
    fn from(err: ConfigError) -> Self {
        GatewayError::Config(err.to_string())
    }
}

// URL rejections surface their own client-facing message verbatim.
impl From<UrlRejection> for GatewayError {
    fn from(err: UrlRejection) -> Self {
        GatewayError::Validation(err.to_string())
    }
}
