//! # fal-gateway
//!
//! Admission-controlled HTTP gateway in front of the fal.ai image APIs.
//!
//! Every `/api` request passes client identity resolution and a shared
//! sliding-window rate limit. Generation traffic additionally clears a
//! per-client quota, a closed model allowlist, and an outbound URL guard
//! before anything is forwarded upstream.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     fal_gateway::server::builder::run_server().await?;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

// Public module exports
pub mod config;
pub mod core;
pub mod server;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use server::{AppState, HttpServer};
pub use utils::error::{GatewayError, Result};
