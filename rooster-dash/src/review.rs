//! Review workflow
//!
//! Review items move `pending → approved` or `pending → rejected`. Decided
//! items are final.

use chrono::{DateTime, Utc};
use rooster_common::{DashboardData, ReviewItem, ReviewStatus, SourceRef};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Review text is empty")]
    EmptyText,

    #[error("Review item {0} not found")]
    NotFound(u64),

    #[error("Review item {0} is already {1}")]
    AlreadyDecided(u64, ReviewStatus),
}

/// Queue a new pending review item
pub fn submit(
    data: &mut DashboardData,
    text: &str,
    sources: Vec<SourceRef>,
    now: DateTime<Utc>,
) -> Result<ReviewItem, ReviewError> {
    if text.trim().is_empty() {
        return Err(ReviewError::EmptyText);
    }

    let item = ReviewItem {
        id: data.next_review_id(),
        text: text.to_string(),
        sources,
        created_at: now,
        status: ReviewStatus::Pending,
        decided_at: None,
    };
    data.reviews.push(item.clone());
    Ok(item)
}

fn pending_item(data: &mut DashboardData, id: u64) -> Result<&mut ReviewItem, ReviewError> {
    let item = data
        .reviews
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or(ReviewError::NotFound(id))?;

    if item.status != ReviewStatus::Pending {
        return Err(ReviewError::AlreadyDecided(id, item.status));
    }
    Ok(item)
}

/// Approve a pending item, optionally replacing its text with an edited version
pub fn approve(
    data: &mut DashboardData,
    id: u64,
    edited_text: Option<String>,
    now: DateTime<Utc>,
) -> Result<ReviewItem, ReviewError> {
    let item = pending_item(data, id)?;

    if let Some(text) = edited_text {
        if text.trim().is_empty() {
            return Err(ReviewError::EmptyText);
        }
        item.text = text;
    }
    item.status = ReviewStatus::Approved;
    item.decided_at = Some(now);
    Ok(item.clone())
}

/// Reject a pending item
pub fn reject(data: &mut DashboardData, id: u64, now: DateTime<Utc>) -> Result<ReviewItem, ReviewError> {
    let item = pending_item(data, id)?;
    item.status = ReviewStatus::Rejected;
    item.decided_at = Some(now);
    Ok(item.clone())
}

/// Put back an earlier copy of an item, matched by id
pub fn restore(data: &mut DashboardData, snapshot: ReviewItem) -> Result<(), ReviewError> {
    let item = data
        .reviews
        .iter_mut()
        .find(|r| r.id == snapshot.id)
        .ok_or(ReviewError::NotFound(snapshot.id))?;
    *item = snapshot;
    Ok(())
}
