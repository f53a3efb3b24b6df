//! Order document and item state machine
//!
//! An order is owned by the terminal currently editing it and shared-read
//! by every other terminal. It is never physically deleted; terminal states
//! are `Paid` and `Cancelled`.
//!
//! Item cancellation state is a single tagged enum ([`ItemState`]) so that
//! illegal flag combinations (cancelled *and* pending, rejected *and*
//! cancelled, ...) are unrepresentable. Dispatch is orthogonal to the state
//! machine and tracked per station.

use serde::{Deserialize, Serialize};

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Open for mutation at the terminal
    #[default]
    Pending,
    /// Sent to billing; an immutable ticket exists
    Billing,
    /// Paid; terminal state for the happy path
    Paid,
    /// Fully cancelled through the approval workflow; terminal
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }
}

/// Preparation station
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Station {
    Bar,
    Kitchen,
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Station::Bar => write!(f, "bar"),
            Station::Kitchen => write!(f, "kitchen"),
        }
    }
}

/// Dispatch record for one station
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchRecord {
    pub dispatched_by: String,
    pub dispatched_at: i64,
}

/// Per-station dispatch flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DispatchState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar: Option<DispatchRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kitchen: Option<DispatchRecord>,
}

impl DispatchState {
    pub fn record(&self, station: Station) -> Option<&DispatchRecord> {
        match station {
            Station::Bar => self.bar.as_ref(),
            Station::Kitchen => self.kitchen.as_ref(),
        }
    }

    pub fn any(&self) -> bool {
        self.bar.is_some() || self.kitchen.is_some()
    }
}

/// Item cancellation state machine
///
/// `Active → PendingCancellation → {Cancelled | CancellationRejected}`;
/// `CancellationRejected → Active` on dismissal. `Cancelled` is terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemState {
    #[default]
    Active,
    PendingCancellation {
        request_id: String,
        requested_by: String,
        requested_at: i64,
    },
    Cancelled {
        approved_by: String,
        approved_at: i64,
    },
    /// Rejection notice shown to the original requester until dismissed
    CancellationRejected {
        reason: String,
        rejected_by: String,
        rejected_at: i64,
        /// The requester's original cancellation reason
        original_reason: String,
    },
}

impl ItemState {
    pub fn is_active(&self) -> bool {
        matches!(self, ItemState::Active)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ItemState::Cancelled { .. })
    }

    pub fn is_pending_cancellation(&self) -> bool {
        matches!(self, ItemState::PendingCancellation { .. })
    }
}

/// Order line item, addressed by position within the order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Dish reference
    pub dish_id: String,
    /// Display name snapshot
    pub name: String,
    /// Unit price snapshot at ordering time
    pub unit_price: f64,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// Price before promotion, when a promotional price was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub state: ItemState,
    #[serde(default)]
    pub dispatch: DispatchState,
}

impl OrderItem {
    /// Whether this item contributes to the order total
    pub fn counts_toward_total(&self) -> bool {
        !self.state.is_cancelled()
    }

    /// Whether this item has been picked up by any station
    pub fn is_dispatched(&self) -> bool {
        self.dispatch.any()
    }

    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Pending whole-order cancellation marker
///
/// Not a status transition: `status` is untouched until approval, the order
/// merely carries this marker while the request is open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingOrderCancellation {
    pub request_id: String,
    pub requested_by: String,
    pub requested_at: i64,
    pub reason: String,
}

/// Rejected whole-order cancellation notice, shown until dismissed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRejectionNotice {
    pub reason: String,
    pub rejected_by: String,
    pub rejected_at: i64,
    pub original_reason: String,
}

/// Order document (partition `orders`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    /// Sequential number shared with tickets and closures
    pub order_number: i64,
    pub table_id: String,
    /// Waiter reference
    pub server_id: String,
    pub items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub status: OrderStatus,
    pub created_at: i64,
    /// Stamped by the send-to-stations marker transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_to_stations_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    /// Cached sum over non-cancelled items; recomputed on every mutation
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_cancellation: Option<PendingOrderCancellation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_rejected: Option<OrderRejectionNotice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
}

impl Order {
    /// Items that still count toward the total, with their positions
    pub fn active_items(&self) -> impl Iterator<Item = (usize, &OrderItem)> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.counts_toward_total())
    }

    pub fn has_active_items(&self) -> bool {
        self.active_items().next().is_some()
    }

    pub fn item(&self, index: usize) -> Option<&OrderItem> {
        self.items.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_state_default_is_active() {
        let state = ItemState::default();
        assert!(state.is_active());
        assert!(!state.is_cancelled());
        assert!(!state.is_pending_cancellation());
    }

    #[test]
    fn test_cancelled_item_excluded_from_total_set() {
        let item = OrderItem {
            dish_id: "dishes:1".to_string(),
            name: "Alitas".to_string(),
            unit_price: 5.0,
            quantity: 2,
            comments: None,
            original_price: None,
            state: ItemState::Cancelled {
                approved_by: "admin".to_string(),
                approved_at: 0,
            },
            dispatch: DispatchState::default(),
        };
        assert!(!item.counts_toward_total());
        assert_eq!(item.line_total(), 10.0);
    }

    #[test]
    fn test_dispatch_state_any() {
        let mut dispatch = DispatchState::default();
        assert!(!dispatch.any());
        dispatch.kitchen = Some(DispatchRecord {
            dispatched_by: "cook".to_string(),
            dispatched_at: 1,
        });
        assert!(dispatch.any());
        assert!(dispatch.record(Station::Kitchen).is_some());
        assert!(dispatch.record(Station::Bar).is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Billing.is_terminal());
    }
}
