//! Cancellation request document
//!
//! Standalone document so that pending requests can be listed for review
//! without loading every order. The one-pending-request-per-target
//! invariant is enforced by the workflow engine, not by the store.

use serde::{Deserialize, Serialize};

/// Request resolution state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancellationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Cancellation request (partition `cancellations`)
///
/// `item_index` present: targets one item of the order.
/// `item_index` absent: targets the whole order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancellationRequest {
    pub id: String,
    pub order_id: String,
    pub order_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_index: Option<usize>,
    /// Item display name snapshot for the review screen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    pub reason: String,
    pub requested_by: String,
    pub requested_at: i64,
    pub status: CancellationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
    /// Approver/rejecter comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver_comment: Option<String>,
}

impl CancellationRequest {
    pub fn is_pending(&self) -> bool {
        self.status == CancellationStatus::Pending
    }

    /// Whether this request targets the whole order
    pub fn is_order_level(&self) -> bool {
        self.item_index.is_none()
    }
}
