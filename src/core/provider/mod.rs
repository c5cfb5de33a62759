//! Upstream provider integration
//!
//! Everything that talks to fal.ai lives here: the queue/stream/storage
//! client, the wire types for its responses, and the error taxonomy for
//! upstream failures.

mod client;
mod error;
mod types;


pub use client::FalClient;
pub use error::ProviderError;
pub use types::{
    GenerationData, GenerationPayload, ImageFile, ImageRef, ImageSet, QueueRun, StreamAggregate,
};
