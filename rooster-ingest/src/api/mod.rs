//! HTTP API handlers for rooster-ingest

pub mod health;
pub mod ingest;
pub mod sse;

pub use health::health_routes;
pub use ingest::ingest_routes;
pub use sse::sse_routes;
