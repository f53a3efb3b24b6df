//! Order lifecycle tests
//!
//! `test_core` covers single operations against the service;
//! `test_flows` covers cross-component scenarios (cancellation approval,
//! payment consumption, closures, revision races).

mod test_flows;

use crate::auth::Actor;
use crate::cancellations::CancellationEngine;
use crate::closure::ClosureEngine;
use crate::inventory::{ConsumptionResolver, InventoryLedger, RequirementInput};
use crate::orders::{CreateOrderInput, NewItemLine, OrderService};
use crate::sequence::MaxScanAllocator;
use crate::store::MemoryStore;
use shared::models::{Order, Role};
use std::sync::Arc;

const TZ: chrono_tz::Tz = chrono_tz::America::El_Salvador;

pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub orders: OrderService,
    pub cancellations: CancellationEngine,
    pub closures: ClosureEngine,
    pub ledger: Arc<InventoryLedger>,
    pub resolver: Arc<ConsumptionResolver>,
}

pub fn env() -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    let sequences = Arc::new(MaxScanAllocator::new(store.clone(), 1, 1));
    let resolver = Arc::new(ConsumptionResolver::new(store.clone()));
    let ledger = Arc::new(InventoryLedger::new(store.clone()));
    let orders = OrderService::new(
        store.clone(),
        sequences.clone(),
        resolver.clone(),
        ledger.clone(),
    );
    let cancellations = CancellationEngine::new(store.clone(), resolver.clone(), ledger.clone());
    let closures = ClosureEngine::new(store.clone(), sequences, TZ);
    TestEnv {
        store,
        orders,
        cancellations,
        closures,
        ledger,
        resolver,
    }
}

pub fn waiter() -> Actor {
    Actor::new("waiter-1", Role::Waiter)
}

pub fn admin() -> Actor {
    Actor::new("admin-1", Role::Admin)
}

pub fn cashier() -> Actor {
    Actor::new("cashier-1", Role::Cashier)
}

pub fn line(dish_id: &str, name: &str, unit_price: f64, quantity: i32) -> NewItemLine {
    NewItemLine {
        dish_id: dish_id.to_string(),
        name: name.to_string(),
        unit_price,
        quantity,
        comments: None,
        original_price: None,
    }
}

pub fn input(items: Vec<NewItemLine>) -> CreateOrderInput {
    CreateOrderInput {
        table_id: "tables:4".to_string(),
        server_id: "users:waiter-1".to_string(),
        items,
        comments: None,
    }
}

pub fn requirement(ingredient_id: &str, quantity: f64, unit: &str) -> RequirementInput {
    RequirementInput {
        ingredient_id: ingredient_id.to_string(),
        quantity,
        unit: unit.to_string(),
        in_shots: false,
    }
}

/// Order with dish A (qty 2 @ 5.00) and dish B (qty 1 @ 8.00), total 18.00
pub async fn two_dish_order(env: &TestEnv) -> Order {
    env.orders
        .create_order(
            input(vec![
                line("dishes:a", "Alitas", 5.0, 2),
                line("dishes:b", "Carnitas", 8.0, 1),
            ]),
            &waiter(),
        )
        .await
        .unwrap()
}
