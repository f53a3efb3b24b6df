//! Read-only reporting queries
//!
//! The surface exposed to the reporting collaborator: date-range reads
//! over orders, tickets, closures and inventory movements. No write
//! access; rendering (PDF/Excel) happens elsewhere.

use crate::store::{DocumentStore, DocumentStoreExt, partitions};
use crate::utils::time::{day_end_millis, day_start_millis};
use chrono::NaiveDate;
use chrono_tz::Tz;
use shared::models::{DailyClosure, InventoryMovement, Order, Ticket};
use shared::{CoreError, CoreResult};
use std::sync::Arc;

pub struct ReportingQueries {
    store: Arc<dyn DocumentStore>,
    tz: Tz,
}

impl ReportingQueries {
    pub fn new(store: Arc<dyn DocumentStore>, tz: Tz) -> Self {
        Self { store, tz }
    }

    fn range_millis(&self, start: NaiveDate, end: NaiveDate) -> CoreResult<(i64, i64)> {
        if end < start {
            return Err(CoreError::validation(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        Ok((day_start_millis(start, self.tz), day_end_millis(end, self.tz)))
    }

    /// Orders created in the date range (inclusive, venue-local days)
    pub async fn orders_between(&self, start: NaiveDate, end: NaiveDate) -> CoreResult<Vec<Order>> {
        let (from, to) = self.range_millis(start, end)?;
        let orders: Vec<Order> = self
            .store
            .query_typed(partitions::ORDERS)
            .await
            .map_err(CoreError::from)?;
        Ok(orders
            .into_iter()
            .filter(|o| o.created_at >= from && o.created_at < to)
            .collect())
    }

    /// Tickets paid in the date range
    pub async fn paid_tickets_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<Ticket>> {
        let (from, to) = self.range_millis(start, end)?;
        let tickets: Vec<Ticket> = self
            .store
            .query_typed(partitions::TICKETS)
            .await
            .map_err(CoreError::from)?;
        Ok(tickets
            .into_iter()
            .filter(|t| {
                t.is_paid()
                    && t.paid_at
                        .is_some_and(|paid_at| paid_at >= from && paid_at < to)
            })
            .collect())
    }

    /// Closures whose covered day lies in the date range
    pub async fn closures_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<DailyClosure>> {
        if end < start {
            return Err(CoreError::validation(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        let closures: Vec<DailyClosure> = self
            .store
            .query_typed(partitions::CLOSURES)
            .await
            .map_err(CoreError::from)?;
        Ok(closures
            .into_iter()
            .filter(|c| c.closure_date >= start && c.closure_date <= end)
            .collect())
    }

    /// Inventory movements recorded in the date range
    pub async fn movements_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<InventoryMovement>> {
        let (from, to) = self.range_millis(start, end)?;
        let movements: Vec<InventoryMovement> = self
            .store
            .query_typed(partitions::INVENTORY)
            .await
            .map_err(CoreError::from)?;
        Ok(movements
            .into_iter()
            .filter(|m| m.recorded_at >= from && m.recorded_at < to)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::utils::time::day_start_millis;
    use shared::models::TicketStatus;

    const TZ: Tz = chrono_tz::America::El_Salvador;

    fn queries() -> (Arc<MemoryStore>, ReportingQueries) {
        let store = Arc::new(MemoryStore::new());
        let queries = ReportingQueries::new(store.clone(), TZ);
        (store, queries)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_paid_tickets_between_filters_by_payment_day() {
        let (store, queries) = queries();
        let noon_day1 = day_start_millis(date(2024, 6, 1), TZ) + 12 * 3600 * 1000;
        let noon_day5 = day_start_millis(date(2024, 6, 5), TZ) + 12 * 3600 * 1000;

        for (n, paid_at, status) in [
            (1, Some(noon_day1), TicketStatus::Paid),
            (2, Some(noon_day5), TicketStatus::Paid),
            (3, None, TicketStatus::PendingPayment),
        ] {
            let ticket = Ticket {
                id: format!("tickets:{}", n),
                ticket_number: n,
                order_id: format!("orders:{}", n),
                order_number: n,
                table_id: "tables:1".to_string(),
                server_id: "users:w".to_string(),
                items: vec![],
                total: 10.0,
                status,
                created_at: 0,
                paid_at,
                payment: None,
            };
            store.save_typed(&ticket.id, &ticket, None).await.unwrap();
        }

        let hits = queries
            .paid_tickets_between(date(2024, 6, 1), date(2024, 6, 3))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].ticket_number, 1);

        let all = queries
            .paid_tickets_between(date(2024, 6, 1), date(2024, 6, 5))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let (_, queries) = queries();
        let err = queries
            .paid_tickets_between(date(2024, 6, 5), date(2024, 6, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
