//! Utility modules for the gateway

pub mod error; // Error handling
