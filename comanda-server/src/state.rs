//! Service wiring
//!
//! Builds the engine services on top of one document store, applying the
//! configuration (numbering floors, venue timezone). Terminals hold one
//! [`ServerState`] and call into its services per action.

use crate::Config;
use crate::cancellations::CancellationEngine;
use crate::closure::ClosureEngine;
use crate::inventory::{ConsumptionResolver, InventoryLedger};
use crate::orders::OrderService;
use crate::reporting::ReportingQueries;
use crate::sequence::{MaxScanAllocator, SequenceAllocator};
use crate::store::DocumentStore;
use std::sync::Arc;

pub struct ServerState {
    pub config: Config,
    pub orders: OrderService,
    pub cancellations: CancellationEngine,
    pub closures: ClosureEngine,
    pub reporting: ReportingQueries,
    pub ledger: Arc<InventoryLedger>,
    pub resolver: Arc<ConsumptionResolver>,
}

impl ServerState {
    /// Wire all services against one store.
    ///
    /// Uses the max-scan sequence allocator (current numbering behavior).
    /// Callers that want the atomic counter instead can wire
    /// [`crate::sequence::CounterAllocator`] through [`Self::with_allocator`].
    pub fn initialize(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        let sequences: Arc<dyn SequenceAllocator> = Arc::new(MaxScanAllocator::new(
            store.clone(),
            config.order_number_start,
            config.ticket_number_start,
        ));
        Self::with_allocator(config, store, sequences)
    }

    pub fn with_allocator(
        config: Config,
        store: Arc<dyn DocumentStore>,
        sequences: Arc<dyn SequenceAllocator>,
    ) -> Self {
        let resolver = Arc::new(ConsumptionResolver::new(store.clone()));
        let ledger = Arc::new(InventoryLedger::with_stock_cache(store.clone()));
        let orders = OrderService::new(
            store.clone(),
            sequences.clone(),
            resolver.clone(),
            ledger.clone(),
        );
        let cancellations =
            CancellationEngine::new(store.clone(), resolver.clone(), ledger.clone());
        let closures = ClosureEngine::new(store.clone(), sequences, config.venue_tz);
        let reporting = ReportingQueries::new(store, config.venue_tz);

        tracing::info!(venue_tz = %config.venue_tz, "Server state initialized");
        Self {
            config,
            orders,
            cancellations,
            closures,
            reporting,
            ledger,
            resolver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Actor;
    use crate::orders::{CreateOrderInput, NewItemLine};
    use crate::store::MemoryStore;
    use shared::models::{PaymentInfo, PaymentMethod, Role};

    #[tokio::test]
    async fn test_initialized_state_runs_a_full_flow() {
        let state = ServerState::initialize(Config::default(), Arc::new(MemoryStore::new()));
        let waiter = Actor::new("waiter-1", Role::Waiter);
        let cashier = Actor::new("cashier-1", Role::Cashier);

        let order = state
            .orders
            .create_order(
                CreateOrderInput {
                    table_id: "tables:1".to_string(),
                    server_id: "users:waiter-1".to_string(),
                    items: vec![NewItemLine {
                        dish_id: "dishes:a".to_string(),
                        name: "Alitas".to_string(),
                        unit_price: 5.0,
                        quantity: 2,
                        comments: None,
                        original_price: None,
                    }],
                    comments: None,
                },
                &waiter,
            )
            .await
            .unwrap();

        state.orders.send_to_billing(&order.id).await.unwrap();
        let (order, ticket) = state
            .orders
            .mark_paid(
                &order.id,
                PaymentInfo {
                    method: PaymentMethod::Card,
                    amount: 10.0,
                },
                &cashier,
            )
            .await
            .unwrap();
        assert!(ticket.is_paid());
        assert!(order.paid_at.is_some());
    }

    #[tokio::test]
    async fn test_numbering_floors_come_from_config() {
        let config = Config {
            order_number_start: 1000,
            ticket_number_start: 5000,
            ..Config::default()
        };
        let state = ServerState::initialize(config, Arc::new(MemoryStore::new()));

        let order = state
            .orders
            .create_order(
                CreateOrderInput {
                    table_id: "tables:1".to_string(),
                    server_id: "users:w".to_string(),
                    items: vec![NewItemLine {
                        dish_id: "dishes:a".to_string(),
                        name: "Alitas".to_string(),
                        unit_price: 5.0,
                        quantity: 1,
                        comments: None,
                        original_price: None,
                    }],
                    comments: None,
                },
                &Actor::new("w", Role::Waiter),
            )
            .await
            .unwrap();
        assert_eq!(order.order_number, 1000);

        let (_, ticket) = state.orders.send_to_billing(&order.id).await.unwrap();
        assert_eq!(ticket.ticket_number, 5000);
    }
}
