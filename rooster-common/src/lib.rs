//! # Rooster Common Library
//!
//! Shared code for the Rooster services including:
//! - Article, tag, subscription and review models
//! - The JSON-file store shared by all services
//! - Configuration loading and root folder resolution
//! - Event types (DashboardEvent) and the EventBus
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod sse;
pub mod store;

pub use error::{Error, Result};
pub use models::{Article, DashboardData, Priority, ReviewItem, ReviewStatus, SourceRef, Subscription, Tag};
