//! Order service - read-modify-write against the document store
//!
//! Every mutating operation loads the order with its revision, applies the
//! aggregate transition in memory and writes back conditioned on that
//! revision. A stale revision surfaces `ConcurrentModification`; the
//! service never retries on its own and never merges concurrent edits -
//! merging independently edited item lists is not well-defined.

use super::aggregate;
use super::money;
use crate::auth::Actor;
use crate::inventory::{ConsumptionResolver, InventoryLedger};
use crate::sequence::SequenceAllocator;
use crate::store::{DocumentStore, DocumentStoreExt, Revision, new_doc_id, partitions};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use shared::models::{
    DispatchState, ItemState, Order, OrderItem, OrderStatus, PaymentInfo, PaymentMethod, Station,
    Ticket, TicketStatus,
};
use shared::util::now_millis;
use shared::{CoreError, CoreResult};
use std::sync::Arc;

/// One item line as entered at the terminal
#[derive(Debug, Clone)]
pub struct NewItemLine {
    pub dish_id: String,
    pub name: String,
    pub unit_price: f64,
    pub quantity: i32,
    pub comments: Option<String>,
    /// Price before promotion, when a promotional price is applied
    pub original_price: Option<f64>,
}

/// Input for creating an order
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub table_id: String,
    pub server_id: String,
    pub items: Vec<NewItemLine>,
    pub comments: Option<String>,
}

/// Order lifecycle operations
pub struct OrderService {
    store: Arc<dyn DocumentStore>,
    sequences: Arc<dyn SequenceAllocator>,
    resolver: Arc<ConsumptionResolver>,
    ledger: Arc<InventoryLedger>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        sequences: Arc<dyn SequenceAllocator>,
        resolver: Arc<ConsumptionResolver>,
        ledger: Arc<InventoryLedger>,
    ) -> Self {
        Self {
            store,
            sequences,
            resolver,
            ledger,
        }
    }

    fn build_item(line: NewItemLine) -> CoreResult<OrderItem> {
        validate_required_text(&line.dish_id, "dish_id", MAX_NAME_LEN)?;
        validate_required_text(&line.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&line.comments, "comments", MAX_NOTE_LEN)?;
        money::validate_price(line.unit_price, "unit_price")?;
        if let Some(original) = line.original_price {
            money::validate_price(original, "original_price")?;
        }
        money::validate_quantity(line.quantity)?;
        Ok(OrderItem {
            dish_id: line.dish_id,
            name: line.name,
            unit_price: line.unit_price,
            quantity: line.quantity,
            comments: line.comments,
            original_price: line.original_price,
            state: ItemState::Active,
            dispatch: DispatchState::default(),
        })
    }

    async fn load(&self, order_id: &str) -> CoreResult<(Order, Revision)> {
        self.store
            .get_typed(order_id)
            .await
            .map_err(CoreError::from)
    }

    async fn save(&self, order: Order, rev: &Revision) -> CoreResult<Order> {
        self.store
            .save_typed(&order.id, &order, Some(rev))
            .await
            .map_err(CoreError::from)?;
        Ok(order)
    }

    // ── Creation and queries ────────────────────────────────────────

    /// Create a new order in `Pending` state with a fresh sequence number
    pub async fn create_order(&self, input: CreateOrderInput, actor: &Actor) -> CoreResult<Order> {
        validate_required_text(&input.table_id, "table_id", MAX_NAME_LEN)?;
        validate_required_text(&input.server_id, "server_id", MAX_NAME_LEN)?;
        validate_optional_text(&input.comments, "comments", MAX_NOTE_LEN)?;
        if input.items.is_empty() {
            return Err(CoreError::validation("an order needs at least one item"));
        }

        let items = input
            .items
            .into_iter()
            .map(Self::build_item)
            .collect::<CoreResult<Vec<_>>>()?;

        let order_number = self.sequences.next_order_number().await?;
        let mut order = Order {
            id: new_doc_id(partitions::ORDERS),
            order_number,
            table_id: input.table_id,
            server_id: input.server_id,
            items,
            comments: input.comments,
            status: OrderStatus::Pending,
            created_at: now_millis(),
            sent_to_stations_at: None,
            paid_at: None,
            total: 0.0,
            pending_cancellation: None,
            cancellation_rejected: None,
            cancelled_by: None,
            cancelled_at: None,
        };
        aggregate::recompute_total(&mut order);

        self.store
            .save_typed(&order.id, &order, None)
            .await
            .map_err(CoreError::from)?;

        tracing::info!(
            order_id = %order.id,
            order_number,
            table_id = %order.table_id,
            total = order.total,
            created_by = %actor.user_id,
            "Order created"
        );
        Ok(order)
    }

    pub async fn get_order(&self, order_id: &str) -> CoreResult<Order> {
        Ok(self.load(order_id).await?.0)
    }

    /// Orders that are not yet paid or cancelled
    pub async fn active_orders(&self) -> CoreResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .store
            .query_typed(partitions::ORDERS)
            .await
            .map_err(CoreError::from)?;
        Ok(orders
            .into_iter()
            .filter(|order| !order.status.is_terminal())
            .collect())
    }

    pub async fn get_ticket(&self, ticket_id: &str) -> CoreResult<Ticket> {
        let (ticket, _) = self
            .store
            .get_typed::<Ticket>(ticket_id)
            .await
            .map_err(CoreError::from)?;
        Ok(ticket)
    }

    // ── Item mutation ───────────────────────────────────────────────

    pub async fn add_item(&self, order_id: &str, line: NewItemLine) -> CoreResult<Order> {
        let (mut order, rev) = self.load(order_id).await?;
        let item = Self::build_item(line)?;
        aggregate::push_item(&mut order, item)?;
        let order = self.save(order, &rev).await?;
        tracing::info!(order_id, total = order.total, "Item added");
        Ok(order)
    }

    pub async fn remove_item_direct(&self, order_id: &str, index: usize) -> CoreResult<Order> {
        let (mut order, rev) = self.load(order_id).await?;
        let removed = aggregate::remove_item_direct(&mut order, index)?;
        let order = self.save(order, &rev).await?;
        tracing::info!(order_id, item = %removed.name, "Item removed before dispatch");
        Ok(order)
    }

    pub async fn update_item_quantity(
        &self,
        order_id: &str,
        index: usize,
        quantity: i32,
    ) -> CoreResult<Order> {
        let (mut order, rev) = self.load(order_id).await?;
        aggregate::update_item_quantity(&mut order, index, quantity)?;
        self.save(order, &rev).await
    }

    // ── Station flow ────────────────────────────────────────────────

    /// Make the order's items visible to the preparation stations
    pub async fn send_to_stations(&self, order_id: &str) -> CoreResult<Order> {
        let (mut order, rev) = self.load(order_id).await?;
        if !aggregate::mark_sent_to_stations(&mut order, now_millis())? {
            return Ok(order);
        }
        let order = self.save(order, &rev).await?;
        tracing::info!(order_id, order_number = order.order_number, "Order sent to stations");
        Ok(order)
    }

    /// Record a station pickup; re-dispatching the same item is a no-op
    pub async fn mark_dispatched(
        &self,
        order_id: &str,
        index: usize,
        station: Station,
        actor: &Actor,
    ) -> CoreResult<Order> {
        let (mut order, rev) = self.load(order_id).await?;
        if !aggregate::mark_dispatched(&mut order, index, station, &actor.user_id, now_millis())? {
            return Ok(order);
        }
        let order = self.save(order, &rev).await?;
        tracing::info!(
            order_id,
            item_index = index,
            station = %station,
            dispatched_by = %actor.user_id,
            "Item dispatched"
        );
        Ok(order)
    }

    // ── Billing and payment ─────────────────────────────────────────

    /// Freeze the active items into an immutable ticket and move the order
    /// to `Billing`.
    ///
    /// The ticket is written before the order; if the order write loses a
    /// revision race the ticket stays behind as an orphan. That mirrors the
    /// storage model's lack of multi-document atomicity.
    pub async fn send_to_billing(&self, order_id: &str) -> CoreResult<(Order, Ticket)> {
        let (mut order, rev) = self.load(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(CoreError::invalid_state(format!(
                "Order {} is {:?} and cannot be sent to billing",
                order.id, order.status
            )));
        }
        if !order.has_active_items() {
            return Err(CoreError::invalid_state(format!(
                "Order {} has no active items to bill",
                order.id
            )));
        }

        aggregate::recompute_total(&mut order);
        let ticket_number = self.sequences.next_ticket_number().await?;
        let ticket = Ticket {
            id: new_doc_id(partitions::TICKETS),
            ticket_number,
            order_id: order.id.clone(),
            order_number: order.order_number,
            table_id: order.table_id.clone(),
            server_id: order.server_id.clone(),
            items: order
                .active_items()
                .map(|(_, item)| item.clone())
                .collect(),
            total: order.total,
            status: TicketStatus::PendingPayment,
            created_at: now_millis(),
            paid_at: None,
            payment: None,
        };
        self.store
            .save_typed(&ticket.id, &ticket, None)
            .await
            .map_err(CoreError::from)?;

        order.status = OrderStatus::Billing;
        let order = self.save(order, &rev).await?;

        tracing::info!(
            order_id,
            ticket_id = %ticket.id,
            ticket_number,
            total = ticket.total,
            "Order sent to billing"
        );
        Ok((order, ticket))
    }

    fn validate_payment(payment: &PaymentInfo, ticket_total: f64) -> CoreResult<()> {
        money::validate_price(payment.amount, "amount")?;
        if !money::amounts_match(payment.amount, ticket_total) {
            return Err(CoreError::validation(format!(
                "payment amount {} does not match ticket total {}",
                payment.amount, ticket_total
            )));
        }
        match &payment.method {
            PaymentMethod::Cash { received, change } => {
                money::validate_price(*received, "received")?;
                if *received + money::MONEY_TOLERANCE < payment.amount {
                    return Err(CoreError::validation(format!(
                        "received {} is less than the amount due {}",
                        received, payment.amount
                    )));
                }
                if !money::amounts_match(*change, received - payment.amount) {
                    return Err(CoreError::validation(format!(
                        "change {} does not match received - amount",
                        change
                    )));
                }
            }
            PaymentMethod::Mixed { cash, card } => {
                money::validate_price(*cash, "cash")?;
                money::validate_price(*card, "card")?;
                if !money::amounts_match(cash + card, payment.amount) {
                    return Err(CoreError::validation(
                        "mixed payment parts do not add up to the amount",
                    ));
                }
            }
            PaymentMethod::Card | PaymentMethod::Transfer | PaymentMethod::Crypto => {}
        }
        Ok(())
    }

    /// Settle the order's pending ticket and record ingredient consumption.
    ///
    /// Ticket and order are two separate revision-checked writes, and the
    /// consumption movements follow as independent appends - there is no
    /// cross-document transaction.
    pub async fn mark_paid(
        &self,
        order_id: &str,
        payment: PaymentInfo,
        actor: &Actor,
    ) -> CoreResult<(Order, Ticket)> {
        let (mut order, order_rev) = self.load(order_id).await?;
        if order.status != OrderStatus::Billing {
            return Err(CoreError::invalid_state(format!(
                "Order {} is {:?} and cannot be paid",
                order.id, order.status
            )));
        }

        // Locate the pending ticket for this order
        let tickets: Vec<(Ticket, Revision)> = self
            .store
            .query_typed_with_revisions(partitions::TICKETS)
            .await
            .map_err(CoreError::from)?;
        let (mut ticket, ticket_rev) = tickets
            .into_iter()
            .filter(|(t, _)| t.order_id == order.id && t.status == TicketStatus::PendingPayment)
            .max_by_key(|(t, _)| t.created_at)
            .ok_or_else(|| {
                CoreError::invalid_state(format!("Order {} has no pending ticket", order.id))
            })?;

        Self::validate_payment(&payment, ticket.total)?;

        let now = now_millis();
        ticket.status = TicketStatus::Paid;
        ticket.paid_at = Some(now);
        ticket.payment = Some(payment);
        self.store
            .save_typed(&ticket.id, &ticket, Some(&ticket_rev))
            .await
            .map_err(CoreError::from)?;

        order.status = OrderStatus::Paid;
        order.paid_at = Some(now);
        let order = self.save(order, &order_rev).await?;

        // Consumption: one negative movement per ingredient requirement of
        // every active item
        for (_, item) in order.active_items() {
            let consumed = self
                .resolver
                .consumed_ingredients(&item.dish_id, item.quantity)
                .await?;
            for consumption in consumed {
                self.ledger
                    .record_movement(
                        &consumption.ingredient_id,
                        -consumption.amount,
                        &format!("Sale - {} (order #{})", item.name, order.order_number),
                        actor,
                        Some(order.id.clone()),
                    )
                    .await?;
            }
        }

        tracing::info!(
            order_id,
            ticket_number = ticket.ticket_number,
            total = ticket.total,
            paid_by = %actor.user_id,
            "Order paid"
        );
        Ok((order, ticket))
    }
}
