//! Pure order state transitions
//!
//! Every function mutates an in-memory [`Order`] and returns the taxonomy
//! error for illegal transitions; persistence and revision handling stay in
//! the service layer. Totals are recomputed by the mutation that changes
//! them, never patched incrementally.

use super::money;
use shared::models::{
    DispatchRecord, ItemState, Order, OrderItem, OrderRejectionNotice, OrderStatus,
    PendingOrderCancellation, Station,
};
use shared::{CoreError, CoreResult};

/// Recompute the cached total over non-cancelled items
pub fn recompute_total(order: &mut Order) {
    order.total = money::order_total(&order.items);
}

fn require_status(order: &Order, expected: OrderStatus, operation: &str) -> CoreResult<()> {
    if order.status != expected {
        return Err(CoreError::invalid_state(format!(
            "{} requires {:?} order, {} is {:?}",
            operation, expected, order.id, order.status
        )));
    }
    Ok(())
}

fn item_mut<'a>(order: &'a mut Order, index: usize) -> CoreResult<&'a mut OrderItem> {
    let order_id = order.id.clone();
    order.items.get_mut(index).ok_or_else(|| {
        CoreError::not_found(format!("Item {} in order {}", index, order_id))
    })
}

pub fn item_ref<'a>(order: &'a Order, index: usize) -> CoreResult<&'a OrderItem> {
    order
        .items
        .get(index)
        .ok_or_else(|| CoreError::not_found(format!("Item {} in order {}", index, order.id)))
}

// ── Item mutation (terminal-side editing) ───────────────────────────

/// Append an item line; legal only while the order is `Pending`
pub fn push_item(order: &mut Order, item: OrderItem) -> CoreResult<()> {
    require_status(order, OrderStatus::Pending, "add_item")?;
    money::validate_price(item.unit_price, "unit_price")?;
    money::validate_quantity(item.quantity)?;
    order.items.push(item);
    recompute_total(order);
    Ok(())
}

/// Physically remove an item that was never sent anywhere.
///
/// Only legal for `Active`, never-dispatched items on a `Pending` order;
/// anything that reached a station goes through the gated cancellation
/// workflow instead.
pub fn remove_item_direct(order: &mut Order, index: usize) -> CoreResult<OrderItem> {
    require_status(order, OrderStatus::Pending, "remove_item_direct")?;
    let item = item_ref(order, index)?;
    if item.is_dispatched() {
        return Err(CoreError::invalid_state(format!(
            "Item {} in order {} was dispatched; use the cancellation workflow",
            index, order.id
        )));
    }
    if !item.state.is_active() {
        return Err(CoreError::invalid_state(format!(
            "Item {} in order {} has cancellation state {:?}",
            index, order.id, item.state
        )));
    }
    let removed = order.items.remove(index);
    recompute_total(order);
    Ok(removed)
}

/// Change an item's quantity before it is sent anywhere
pub fn update_item_quantity(order: &mut Order, index: usize, quantity: i32) -> CoreResult<()> {
    require_status(order, OrderStatus::Pending, "update_item_quantity")?;
    money::validate_quantity(quantity)?;
    let item = item_mut(order, index)?;
    if item.is_dispatched() || !item.state.is_active() {
        return Err(CoreError::invalid_state(format!(
            "Item {} in order {} can no longer be edited",
            index, order.id
        )));
    }
    item.quantity = quantity;
    recompute_total(order);
    Ok(())
}

// ── Station flow ────────────────────────────────────────────────────

/// Mark the order visible to preparation stations. Idempotent; the first
/// timestamp is kept.
pub fn mark_sent_to_stations(order: &mut Order, now: i64) -> CoreResult<bool> {
    require_status(order, OrderStatus::Pending, "send_to_stations")?;
    if order.sent_to_stations_at.is_some() {
        return Ok(false);
    }
    order.sent_to_stations_at = Some(now);
    Ok(true)
}

/// Record a station pickup. Re-dispatch is a no-op (`Ok(false)`).
pub fn mark_dispatched(
    order: &mut Order,
    index: usize,
    station: Station,
    actor_id: &str,
    now: i64,
) -> CoreResult<bool> {
    if order.status.is_terminal() {
        return Err(CoreError::invalid_state(format!(
            "Order {} is {:?}; nothing left to dispatch",
            order.id, order.status
        )));
    }
    let item = item_mut(order, index)?;
    if item.state.is_cancelled() {
        return Err(CoreError::invalid_state(format!(
            "Item {} in order {} is cancelled",
            index, order.id
        )));
    }
    let slot = match station {
        Station::Bar => &mut item.dispatch.bar,
        Station::Kitchen => &mut item.dispatch.kitchen,
    };
    if slot.is_some() {
        return Ok(false);
    }
    *slot = Some(DispatchRecord {
        dispatched_by: actor_id.to_string(),
        dispatched_at: now,
    });
    Ok(true)
}

// ── Item cancellation state machine ─────────────────────────────────

/// `Active → PendingCancellation`; refused for dispatched items
pub fn begin_item_cancellation(
    order: &mut Order,
    index: usize,
    request_id: &str,
    requester_id: &str,
    now: i64,
) -> CoreResult<()> {
    let order_id = order.id.clone();
    let item = item_mut(order, index)?;
    match &item.state {
        ItemState::Cancelled { .. } => Err(CoreError::invalid_state(format!(
            "Item {} in order {} is already cancelled",
            index, order_id
        ))),
        ItemState::PendingCancellation { .. } => Err(CoreError::invalid_state(format!(
            "Item {} in order {} already has a pending cancellation request",
            index, order_id
        ))),
        ItemState::CancellationRejected { .. } => Err(CoreError::invalid_state(format!(
            "Item {} in order {} has an undismissed rejection notice",
            index, order_id
        ))),
        ItemState::Active => {
            if item.is_dispatched() {
                return Err(CoreError::invalid_state(format!(
                    "Item {} in order {} was already picked up by its station",
                    index, order_id
                )));
            }
            item.state = ItemState::PendingCancellation {
                request_id: request_id.to_string(),
                requested_by: requester_id.to_string(),
                requested_at: now,
            };
            Ok(())
        }
    }
}

/// `PendingCancellation → Cancelled`; excludes the item from the total
pub fn apply_item_cancellation(
    order: &mut Order,
    index: usize,
    approver_id: &str,
    now: i64,
) -> CoreResult<()> {
    let order_id = order.id.clone();
    let item = item_mut(order, index)?;
    if !item.state.is_pending_cancellation() {
        return Err(CoreError::invalid_state(format!(
            "Item {} in order {} has no pending cancellation to approve",
            index, order_id
        )));
    }
    item.state = ItemState::Cancelled {
        approved_by: approver_id.to_string(),
        approved_at: now,
    };
    recompute_total(order);
    Ok(())
}

/// `PendingCancellation → CancellationRejected`; the item keeps counting
pub fn mark_item_cancellation_rejected(
    order: &mut Order,
    index: usize,
    reason: &str,
    rejecter_id: &str,
    original_reason: &str,
    now: i64,
) -> CoreResult<()> {
    let order_id = order.id.clone();
    let item = item_mut(order, index)?;
    if !item.state.is_pending_cancellation() {
        return Err(CoreError::invalid_state(format!(
            "Item {} in order {} has no pending cancellation to reject",
            index, order_id
        )));
    }
    item.state = ItemState::CancellationRejected {
        reason: reason.to_string(),
        rejected_by: rejecter_id.to_string(),
        rejected_at: now,
        original_reason: original_reason.to_string(),
    };
    Ok(())
}

/// `CancellationRejected → Active` once the requester acknowledged
pub fn dismiss_item_rejection(order: &mut Order, index: usize) -> CoreResult<()> {
    let order_id = order.id.clone();
    let item = item_mut(order, index)?;
    if !matches!(item.state, ItemState::CancellationRejected { .. }) {
        return Err(CoreError::invalid_state(format!(
            "Item {} in order {} has no rejection notice to dismiss",
            index, order_id
        )));
    }
    item.state = ItemState::Active;
    Ok(())
}

// ── Whole-order cancellation ────────────────────────────────────────

/// Attach the pending full-cancellation marker; `status` stays untouched
pub fn mark_order_pending_cancellation(
    order: &mut Order,
    marker: PendingOrderCancellation,
) -> CoreResult<()> {
    if !matches!(order.status, OrderStatus::Pending | OrderStatus::Billing) {
        return Err(CoreError::invalid_state(format!(
            "Order {} is {:?} and cannot be cancelled",
            order.id, order.status
        )));
    }
    if order.pending_cancellation.is_some() {
        return Err(CoreError::invalid_state(format!(
            "Order {} already has a pending full-cancellation request",
            order.id
        )));
    }
    order.pending_cancellation = Some(marker);
    Ok(())
}

/// Approved full cancellation: `Pending | Billing → Cancelled`
pub fn apply_order_cancellation(order: &mut Order, approver_id: &str, now: i64) -> CoreResult<()> {
    if !matches!(order.status, OrderStatus::Pending | OrderStatus::Billing) {
        return Err(CoreError::invalid_state(format!(
            "Order {} is {:?} and cannot be cancelled",
            order.id, order.status
        )));
    }
    order.status = OrderStatus::Cancelled;
    order.cancelled_by = Some(approver_id.to_string());
    order.cancelled_at = Some(now);
    order.pending_cancellation = None;
    order.cancellation_rejected = None;
    Ok(())
}

/// Rejected full cancellation: clear the marker, leave a notice
pub fn mark_order_cancellation_rejected(
    order: &mut Order,
    notice: OrderRejectionNotice,
) -> CoreResult<()> {
    if order.pending_cancellation.is_none() {
        return Err(CoreError::invalid_state(format!(
            "Order {} has no pending full-cancellation request",
            order.id
        )));
    }
    order.pending_cancellation = None;
    order.cancellation_rejected = Some(notice);
    Ok(())
}

/// Acknowledge a rejected full-cancellation notice
pub fn dismiss_order_rejection(order: &mut Order) -> CoreResult<()> {
    if order.cancellation_rejected.is_none() {
        return Err(CoreError::invalid_state(format!(
            "Order {} has no rejection notice to dismiss",
            order.id
        )));
    }
    order.cancellation_rejected = None;
    Ok(())
}
