//! Cancellation workflow engine
//!
//! Two independent but structurally identical flows gate every removal
//! once an order has left the terminal: item-level and whole-order.
//! Both follow request → approve/reject, with the request stored as a
//! standalone document so supervisors can review pending requests without
//! loading every order.
//!
//! # Request flow
//!
//! ```text
//! request_*_cancellation(..)
//!     ├─ 1. Role gate (requester) and reason validation
//!     ├─ 2. Load order, apply the pending-state transition in memory
//!     │     (fails here => nothing was written)
//!     ├─ 3. Create the request document
//!     └─ 4. Save the order with its revision
//! ```
//!
//! Approval reverses inventory with one *positive* movement per ingredient
//! requirement, equal to what the sale of the item would deduct. The order
//! update, the inventory appends and the request update are separate
//! writes - the store has no multi-document transactions, so a crash in
//! between leaves a partially applied approval. The item state machine
//! makes re-approval fail `InvalidState`, which keeps stock at exactly one
//! reversal.

use crate::auth::Actor;
use crate::inventory::{ConsumptionResolver, InventoryLedger};
use crate::orders::aggregate;
use crate::store::{DocumentStore, DocumentStoreExt, Revision, new_doc_id, partitions};
use crate::utils::validation::{MAX_NOTE_LEN, validate_required_text};
use shared::models::{
    CancellationRequest, CancellationStatus, Order, OrderItem, OrderRejectionNotice, OrderStatus,
    PendingOrderCancellation,
};
use shared::util::now_millis;
use shared::{CoreError, CoreResult};
use std::sync::Arc;

pub struct CancellationEngine {
    store: Arc<dyn DocumentStore>,
    resolver: Arc<ConsumptionResolver>,
    ledger: Arc<InventoryLedger>,
}

impl CancellationEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        resolver: Arc<ConsumptionResolver>,
        ledger: Arc<InventoryLedger>,
    ) -> Self {
        Self {
            store,
            resolver,
            ledger,
        }
    }

    async fn load_order(&self, order_id: &str) -> CoreResult<(Order, Revision)> {
        self.store
            .get_typed(order_id)
            .await
            .map_err(CoreError::from)
    }

    async fn load_request(&self, request_id: &str) -> CoreResult<(CancellationRequest, Revision)> {
        self.store
            .get_typed(request_id)
            .await
            .map_err(CoreError::from)
    }

    fn require_open(order: &Order) -> CoreResult<()> {
        if !matches!(order.status, OrderStatus::Pending | OrderStatus::Billing) {
            return Err(CoreError::invalid_state(format!(
                "Order {} is {:?}; cancellations only apply to open orders",
                order.id, order.status
            )));
        }
        Ok(())
    }

    /// Positive reversal movements for one item's ingredient requirements
    async fn reverse_item_consumption(
        &self,
        item: &OrderItem,
        order: &Order,
        reason_prefix: &str,
        actor: &Actor,
    ) -> CoreResult<()> {
        let consumed = self
            .resolver
            .consumed_ingredients(&item.dish_id, item.quantity)
            .await?;
        for consumption in consumed {
            self.ledger
                .record_movement(
                    &consumption.ingredient_id,
                    consumption.amount,
                    &format!(
                        "{} - {} (order #{})",
                        reason_prefix, item.name, order.order_number
                    ),
                    actor,
                    Some(order.id.clone()),
                )
                .await?;
        }
        Ok(())
    }

    // ── Item-level flow ─────────────────────────────────────────────

    /// File a cancellation request for one item.
    ///
    /// Fails `InvalidState` - before anything is written - if the item is
    /// already cancelled, already has a pending request, carries an
    /// undismissed rejection, or was picked up by its station.
    pub async fn request_item_cancellation(
        &self,
        order_id: &str,
        item_index: usize,
        reason: &str,
        requester: &Actor,
    ) -> CoreResult<CancellationRequest> {
        requester.require_can_request_cancellations()?;
        validate_required_text(reason, "reason", MAX_NOTE_LEN)?;

        let (mut order, rev) = self.load_order(order_id).await?;
        Self::require_open(&order)?;

        let request_id = new_doc_id(partitions::CANCELLATIONS);
        let now = now_millis();
        let item_name = aggregate::item_ref(&order, item_index)?.name.clone();

        // Validates and flips the item in memory; nothing is persisted yet
        aggregate::begin_item_cancellation(
            &mut order,
            item_index,
            &request_id,
            &requester.user_id,
            now,
        )?;

        let request = CancellationRequest {
            id: request_id,
            order_id: order.id.clone(),
            order_number: order.order_number,
            item_index: Some(item_index),
            item_name: Some(item_name),
            reason: reason.to_string(),
            requested_by: requester.user_id.clone(),
            requested_at: now,
            status: CancellationStatus::Pending,
            resolved_by: None,
            resolved_at: None,
            resolver_comment: None,
        };
        self.store
            .save_typed(&request.id, &request, None)
            .await
            .map_err(CoreError::from)?;
        self.store
            .save_typed(&order.id, &order, Some(&rev))
            .await
            .map_err(CoreError::from)?;

        tracing::info!(
            order_id,
            item_index,
            request_id = %request.id,
            requested_by = %requester.user_id,
            "Item cancellation requested"
        );
        Ok(request)
    }

    /// Approve an item cancellation: the item stops counting toward the
    /// total and its consumed ingredients are restocked.
    pub async fn approve_item_cancellation(
        &self,
        request_id: &str,
        approver: &Actor,
    ) -> CoreResult<(CancellationRequest, Order)> {
        approver.require_can_resolve_cancellations()?;

        let (mut request, request_rev) = self.load_request(request_id).await?;
        if !request.is_pending() {
            return Err(CoreError::invalid_state(format!(
                "Request {} was already processed",
                request_id
            )));
        }
        let item_index = request.item_index.ok_or_else(|| {
            CoreError::invalid_state(format!("Request {} targets the whole order", request_id))
        })?;

        let (mut order, order_rev) = self.load_order(&request.order_id).await?;
        let item = aggregate::item_ref(&order, item_index)?.clone();
        let now = now_millis();
        aggregate::apply_item_cancellation(&mut order, item_index, &approver.user_id, now)?;

        self.store
            .save_typed(&order.id, &order, Some(&order_rev))
            .await
            .map_err(CoreError::from)?;

        self.reverse_item_consumption(&item, &order, "Cancellation reversal", approver)
            .await?;

        request.status = CancellationStatus::Approved;
        request.resolved_by = Some(approver.user_id.clone());
        request.resolved_at = Some(now);
        self.store
            .save_typed(&request.id, &request, Some(&request_rev))
            .await
            .map_err(CoreError::from)?;

        tracing::info!(
            request_id,
            order_id = %order.id,
            item_index,
            approved_by = %approver.user_id,
            new_total = order.total,
            "Item cancellation approved"
        );
        Ok((request, order))
    }

    /// Reject an item cancellation; the item keeps counting and carries the
    /// rejection notice until the requester dismisses it.
    pub async fn reject_item_cancellation(
        &self,
        request_id: &str,
        reason: &str,
        approver: &Actor,
    ) -> CoreResult<(CancellationRequest, Order)> {
        approver.require_can_resolve_cancellations()?;
        validate_required_text(reason, "reason", MAX_NOTE_LEN)?;

        let (mut request, request_rev) = self.load_request(request_id).await?;
        if !request.is_pending() {
            return Err(CoreError::invalid_state(format!(
                "Request {} was already processed",
                request_id
            )));
        }
        let item_index = request.item_index.ok_or_else(|| {
            CoreError::invalid_state(format!("Request {} targets the whole order", request_id))
        })?;

        let (mut order, order_rev) = self.load_order(&request.order_id).await?;
        let now = now_millis();
        aggregate::mark_item_cancellation_rejected(
            &mut order,
            item_index,
            reason,
            &approver.user_id,
            &request.reason,
            now,
        )?;
        self.store
            .save_typed(&order.id, &order, Some(&order_rev))
            .await
            .map_err(CoreError::from)?;

        request.status = CancellationStatus::Rejected;
        request.resolved_by = Some(approver.user_id.clone());
        request.resolved_at = Some(now);
        request.resolver_comment = Some(reason.to_string());
        self.store
            .save_typed(&request.id, &request, Some(&request_rev))
            .await
            .map_err(CoreError::from)?;

        tracing::info!(
            request_id,
            order_id = %order.id,
            item_index,
            rejected_by = %approver.user_id,
            "Item cancellation rejected"
        );
        Ok((request, order))
    }

    /// Acknowledge a rejected item cancellation; the item returns to
    /// `Active` and can be requested again.
    pub async fn dismiss_rejection(
        &self,
        order_id: &str,
        item_index: usize,
        actor: &Actor,
    ) -> CoreResult<Order> {
        let (mut order, rev) = self.load_order(order_id).await?;
        aggregate::dismiss_item_rejection(&mut order, item_index)?;
        self.store
            .save_typed(&order.id, &order, Some(&rev))
            .await
            .map_err(CoreError::from)?;
        tracing::info!(order_id, item_index, dismissed_by = %actor.user_id, "Rejection dismissed");
        Ok(order)
    }

    // ── Whole-order flow ────────────────────────────────────────────

    /// File a full-cancellation request. The order status stays untouched;
    /// only the pending marker is set.
    pub async fn request_order_cancellation(
        &self,
        order_id: &str,
        reason: &str,
        requester: &Actor,
    ) -> CoreResult<CancellationRequest> {
        requester.require_can_request_cancellations()?;
        validate_required_text(reason, "reason", MAX_NOTE_LEN)?;

        let (mut order, rev) = self.load_order(order_id).await?;

        let request_id = new_doc_id(partitions::CANCELLATIONS);
        let now = now_millis();
        aggregate::mark_order_pending_cancellation(
            &mut order,
            PendingOrderCancellation {
                request_id: request_id.clone(),
                requested_by: requester.user_id.clone(),
                requested_at: now,
                reason: reason.to_string(),
            },
        )?;

        let request = CancellationRequest {
            id: request_id,
            order_id: order.id.clone(),
            order_number: order.order_number,
            item_index: None,
            item_name: None,
            reason: reason.to_string(),
            requested_by: requester.user_id.clone(),
            requested_at: now,
            status: CancellationStatus::Pending,
            resolved_by: None,
            resolved_at: None,
            resolver_comment: None,
        };
        self.store
            .save_typed(&request.id, &request, None)
            .await
            .map_err(CoreError::from)?;
        self.store
            .save_typed(&order.id, &order, Some(&rev))
            .await
            .map_err(CoreError::from)?;

        tracing::info!(
            order_id,
            request_id = %request.id,
            requested_by = %requester.user_id,
            "Full order cancellation requested"
        );
        Ok(request)
    }

    /// Approve a full cancellation: the order becomes `Cancelled` and every
    /// currently non-cancelled item is restocked in one pass.
    pub async fn approve_order_cancellation(
        &self,
        request_id: &str,
        approver: &Actor,
    ) -> CoreResult<(CancellationRequest, Order)> {
        approver.require_can_resolve_cancellations()?;

        let (mut request, request_rev) = self.load_request(request_id).await?;
        if !request.is_pending() {
            return Err(CoreError::invalid_state(format!(
                "Request {} was already processed",
                request_id
            )));
        }
        if !request.is_order_level() {
            return Err(CoreError::invalid_state(format!(
                "Request {} targets a single item",
                request_id
            )));
        }

        let (mut order, order_rev) = self.load_order(&request.order_id).await?;
        let active_items: Vec<OrderItem> = order
            .active_items()
            .map(|(_, item)| item.clone())
            .collect();
        let now = now_millis();
        aggregate::apply_order_cancellation(&mut order, &approver.user_id, now)?;

        self.store
            .save_typed(&order.id, &order, Some(&order_rev))
            .await
            .map_err(CoreError::from)?;

        for item in &active_items {
            self.reverse_item_consumption(item, &order, "Full cancellation reversal", approver)
                .await?;
        }

        request.status = CancellationStatus::Approved;
        request.resolved_by = Some(approver.user_id.clone());
        request.resolved_at = Some(now);
        self.store
            .save_typed(&request.id, &request, Some(&request_rev))
            .await
            .map_err(CoreError::from)?;

        tracing::info!(
            request_id,
            order_id = %order.id,
            reverted_items = active_items.len(),
            approved_by = %approver.user_id,
            "Full order cancellation approved"
        );
        Ok((request, order))
    }

    /// Reject a full cancellation: clear the marker, leave a notice on the
    /// order until the requester dismisses it.
    pub async fn reject_order_cancellation(
        &self,
        request_id: &str,
        reason: &str,
        approver: &Actor,
    ) -> CoreResult<(CancellationRequest, Order)> {
        approver.require_can_resolve_cancellations()?;
        validate_required_text(reason, "reason", MAX_NOTE_LEN)?;

        let (mut request, request_rev) = self.load_request(request_id).await?;
        if !request.is_pending() {
            return Err(CoreError::invalid_state(format!(
                "Request {} was already processed",
                request_id
            )));
        }
        if !request.is_order_level() {
            return Err(CoreError::invalid_state(format!(
                "Request {} targets a single item",
                request_id
            )));
        }

        let (mut order, order_rev) = self.load_order(&request.order_id).await?;
        let now = now_millis();
        aggregate::mark_order_cancellation_rejected(
            &mut order,
            OrderRejectionNotice {
                reason: reason.to_string(),
                rejected_by: approver.user_id.clone(),
                rejected_at: now,
                original_reason: request.reason.clone(),
            },
        )?;
        self.store
            .save_typed(&order.id, &order, Some(&order_rev))
            .await
            .map_err(CoreError::from)?;

        request.status = CancellationStatus::Rejected;
        request.resolved_by = Some(approver.user_id.clone());
        request.resolved_at = Some(now);
        request.resolver_comment = Some(reason.to_string());
        self.store
            .save_typed(&request.id, &request, Some(&request_rev))
            .await
            .map_err(CoreError::from)?;

        tracing::info!(
            request_id,
            order_id = %order.id,
            rejected_by = %approver.user_id,
            "Full order cancellation rejected"
        );
        Ok((request, order))
    }

    /// Acknowledge a rejected full cancellation
    pub async fn dismiss_order_rejection(
        &self,
        order_id: &str,
        actor: &Actor,
    ) -> CoreResult<Order> {
        let (mut order, rev) = self.load_order(order_id).await?;
        aggregate::dismiss_order_rejection(&mut order)?;
        self.store
            .save_typed(&order.id, &order, Some(&rev))
            .await
            .map_err(CoreError::from)?;
        tracing::info!(order_id, dismissed_by = %actor.user_id, "Order rejection dismissed");
        Ok(order)
    }

    // ── Review queries ──────────────────────────────────────────────

    /// All pending requests, item-level and order-level
    pub async fn pending_requests(&self) -> CoreResult<Vec<CancellationRequest>> {
        let requests: Vec<CancellationRequest> = self
            .store
            .query_typed(partitions::CANCELLATIONS)
            .await
            .map_err(CoreError::from)?;
        Ok(requests.into_iter().filter(|r| r.is_pending()).collect())
    }
}
