use super::*;
use crate::store::{DocumentStore, DocumentStoreExt};
use shared::models::{OrderStatus, PaymentInfo, PaymentMethod};
use shared::CoreError;

#[tokio::test]
async fn test_item_cancellation_scenario_total_and_reversal() {
    let env = env();
    // Dish A requires 0.3 kg of chicken and 0.05 l of oil per serving
    env.resolver
        .replace_for_dish(
            "dishes:a",
            vec![
                requirement("ingredients:chicken", 0.3, "kg"),
                requirement("ingredients:oil", 0.05, "l"),
            ],
        )
        .await
        .unwrap();

    // [{dish=A, qty=2, price=5.00}, {dish=B, qty=1, price=8.00}] -> 18.00
    let order = two_dish_order(&env).await;
    assert_eq!(order.total, 18.0);

    let request = env
        .cancellations
        .request_item_cancellation(&order.id, 0, "wrong dish", &waiter())
        .await
        .unwrap();
    let (_, order) = env
        .cancellations
        .approve_item_cancellation(&request.id, &admin())
        .await
        .unwrap();

    // Total drops to the remaining item
    assert_eq!(order.total, 8.0);

    // Each ingredient is reverted with a positive amount of
    // 2 x relation.quantity
    let chicken = env
        .ledger
        .movements_for("ingredients:chicken")
        .await
        .unwrap();
    assert_eq!(chicken.len(), 1);
    assert!((chicken[0].amount - 0.6).abs() < 1e-9);
    assert!(chicken[0].is_entry());

    let oil = env.ledger.movements_for("ingredients:oil").await.unwrap();
    assert_eq!(oil.len(), 1);
    assert!((oil[0].amount - 0.1).abs() < 1e-9);
}

#[tokio::test]
async fn test_payment_consumes_ingredients_of_active_items_only() {
    let env = env();
    env.resolver
        .replace_for_dish("dishes:a", vec![requirement("ingredients:chicken", 0.3, "kg")])
        .await
        .unwrap();
    env.resolver
        .replace_for_dish("dishes:b", vec![requirement("ingredients:beef", 0.2, "kg")])
        .await
        .unwrap();

    let order = two_dish_order(&env).await;

    // Cancel dish A before billing; only dish B should be consumed
    let request = env
        .cancellations
        .request_item_cancellation(&order.id, 0, "changed mind", &waiter())
        .await
        .unwrap();
    env.cancellations
        .approve_item_cancellation(&request.id, &admin())
        .await
        .unwrap();

    env.orders.send_to_billing(&order.id).await.unwrap();
    env.orders
        .mark_paid(
            &order.id,
            PaymentInfo {
                method: PaymentMethod::Card,
                amount: 8.0,
            },
            &cashier(),
        )
        .await
        .unwrap();

    // Chicken: one positive reversal only. Beef: one negative sale exit.
    assert_eq!(
        env.ledger.current_stock("ingredients:chicken").await.unwrap(),
        0.6
    );
    let beef = env.ledger.movements_for("ingredients:beef").await.unwrap();
    assert_eq!(beef.len(), 1);
    assert!((beef[0].amount + 0.2).abs() < 1e-9);
    assert_eq!(beef[0].order_ref.as_deref(), Some(order.id.as_str()));
}

#[tokio::test]
async fn test_closure_runs_twice_with_distinct_numbers_and_same_tickets() {
    let env = env();
    let today = chrono::Utc::now()
        .with_timezone(&super::TZ)
        .date_naive();

    // Two paid orders today
    for _ in 0..2 {
        let order = two_dish_order(&env).await;
        env.orders.send_to_billing(&order.id).await.unwrap();
        env.orders
            .mark_paid(
                &order.id,
                PaymentInfo {
                    method: PaymentMethod::Card,
                    amount: 18.0,
                },
                &cashier(),
            )
            .await
            .unwrap();
    }

    let first = env.closures.generate_closure(today, &admin()).await.unwrap();
    let second = env.closures.generate_closure(today, &admin()).await.unwrap();

    assert!(!first.no_sales);
    assert_eq!(first.closure.ticket_count, 2);
    assert_eq!(first.closure.total, 36.0);
    assert_ne!(first.closure.closure_number, second.closure.closure_number);

    let mut a = first.closure.ticket_numbers.clone();
    let mut b = second.closure.ticket_numbers.clone();
    a.sort();
    b.sort();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_two_writers_on_the_same_revision_one_wins() {
    let env = env();
    let order = two_dish_order(&env).await;

    // Both terminals read the same revision
    let (doc_a, rev_a) = env.store.get(&order.id).await.unwrap();
    let (doc_b, rev_b) = env.store.get(&order.id).await.unwrap();
    assert_eq!(rev_a, rev_b);

    // Terminal A edits the comments, terminal B the table - disjoint
    // aspects, but the document is the unit of concurrency
    let mut edit_a = doc_a.clone();
    edit_a["comments"] = serde_json::json!("no onions");
    let mut edit_b = doc_b.clone();
    edit_b["table_id"] = serde_json::json!("tables:9");

    assert!(env.store.save(&order.id, edit_a, Some(&rev_a)).await.is_ok());
    let err: CoreError = env
        .store
        .save(&order.id, edit_b, Some(&rev_b))
        .await
        .unwrap_err()
        .into();
    assert!(matches!(err, CoreError::ConcurrentModification(_)));

    // The loser reloads and retries once, as recommended
    let (mut doc, rev) = env.store.get(&order.id).await.unwrap();
    assert_eq!(doc["comments"], "no onions");
    doc["table_id"] = serde_json::json!("tables:9");
    assert!(env.store.save(&order.id, doc, Some(&rev)).await.is_ok());
}

#[tokio::test]
async fn test_stale_terminal_write_is_rejected_after_approval() {
    let env = env();
    let order = two_dish_order(&env).await;

    // A terminal holds on to an old revision while an approver mutates
    // the same order through the cancellation flow
    let (_, stale_rev) = env
        .store
        .get_typed::<shared::models::Order>(&order.id)
        .await
        .unwrap();

    let request = env
        .cancellations
        .request_item_cancellation(&order.id, 0, "wrong dish", &waiter())
        .await
        .unwrap();
    env.cancellations
        .approve_item_cancellation(&request.id, &admin())
        .await
        .unwrap();

    let err: CoreError = env
        .store
        .save_typed(&order.id, &order, Some(&stale_rev))
        .await
        .unwrap_err()
        .into();
    assert!(matches!(err, CoreError::ConcurrentModification(_)));
}

#[tokio::test]
async fn test_full_lifecycle_happy_path() {
    let env = env();
    let order = two_dish_order(&env).await;

    let order = env.orders.send_to_stations(&order.id).await.unwrap();
    assert!(order.sent_to_stations_at.is_some());

    let cook = Actor::new("cook-1", Role::Kitchen);
    let bartender = Actor::new("bar-1", Role::Bar);
    env.orders
        .mark_dispatched(&order.id, 0, shared::models::Station::Kitchen, &cook)
        .await
        .unwrap();
    env.orders
        .mark_dispatched(&order.id, 1, shared::models::Station::Bar, &bartender)
        .await
        .unwrap();

    let (order, ticket) = env.orders.send_to_billing(&order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Billing);

    let (order, ticket) = env
        .orders
        .mark_paid(
            &order.id,
            PaymentInfo {
                method: PaymentMethod::Cash {
                    received: 20.0,
                    change: 2.0,
                },
                amount: ticket.total,
            },
            &cashier(),
        )
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert!(ticket.is_paid());

    let today = chrono::Utc::now().with_timezone(&super::TZ).date_naive();
    let outcome = env.closures.generate_closure(today, &admin()).await.unwrap();
    assert_eq!(outcome.closure.ticket_count, 1);
    assert_eq!(outcome.closure.total, 18.0);
    assert_eq!(outcome.closure.ticket_numbers, vec![ticket.ticket_number]);
}
