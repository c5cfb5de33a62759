//! Core gateway logic: admission control and the upstream provider client

pub mod identity;
pub mod media;
pub mod models;
pub mod provider;
pub mod rate_limit;
pub mod url_guard;
