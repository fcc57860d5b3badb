//! HTTP API handlers for rooster-dash

pub mod articles;
pub mod drafts;
pub mod health;
pub mod reviews;
pub mod sse;
pub mod subscriptions;
pub mod tags;

pub use articles::article_routes;
pub use drafts::draft_routes;
pub use health::health_routes;
pub use reviews::review_routes;
pub use sse::sse_routes;
pub use subscriptions::subscription_routes;
pub use tags::tag_routes;
