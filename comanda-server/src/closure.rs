//! Daily closure (Z-report) engine
//!
//! Snapshots the paid tickets of one venue-local calendar day into an
//! immutable closure record. The engine does not enforce at-most-one
//! closure per date: re-running for a closed date produces a new closure
//! over the same tickets. Callers that want the invariant check
//! [`ClosureEngine::find_closures_for_date`] first.

use crate::auth::Actor;
use crate::sequence::SequenceAllocator;
use crate::store::{DocumentStore, DocumentStoreExt, new_doc_id, partitions};
use crate::utils::time::{millis_on_date, validate_not_future};
use chrono::NaiveDate;
use chrono_tz::Tz;
use shared::models::{DailyClosure, Ticket};
use shared::util::now_millis;
use shared::{CoreError, CoreResult};
use std::sync::Arc;

/// Result of a closure run
#[derive(Debug, Clone)]
pub struct ClosureOutcome {
    pub closure: DailyClosure,
    /// Soft warning: the day had no paid tickets. The (empty) closure is
    /// still valid and persisted; callers decide whether to block on it.
    pub no_sales: bool,
}

pub struct ClosureEngine {
    store: Arc<dyn DocumentStore>,
    sequences: Arc<dyn SequenceAllocator>,
    tz: Tz,
}

impl ClosureEngine {
    pub fn new(store: Arc<dyn DocumentStore>, sequences: Arc<dyn SequenceAllocator>, tz: Tz) -> Self {
        Self {
            store,
            sequences,
            tz,
        }
    }

    /// Paid tickets whose payment timestamp falls on the given venue-local day
    async fn paid_tickets_on(&self, date: NaiveDate) -> CoreResult<Vec<Ticket>> {
        let tickets: Vec<Ticket> = self
            .store
            .query_typed(partitions::TICKETS)
            .await
            .map_err(CoreError::from)?;
        Ok(tickets
            .into_iter()
            .filter(|ticket| {
                ticket.is_paid()
                    && ticket
                        .paid_at
                        .is_some_and(|paid_at| millis_on_date(paid_at, date, self.tz))
            })
            .collect())
    }

    /// Generate and persist the closure for one calendar day
    pub async fn generate_closure(
        &self,
        date: NaiveDate,
        actor: &Actor,
    ) -> CoreResult<ClosureOutcome> {
        validate_not_future(date, self.tz)?;

        let tickets = self.paid_tickets_on(date).await?;
        let total = tickets.iter().map(|t| t.total).sum::<f64>();
        let closure_number = self.sequences.next_closure_number().await?;

        let closure = DailyClosure {
            id: new_doc_id(partitions::CLOSURES),
            closure_number,
            closure_date: date,
            generated_at: now_millis(),
            generated_by: actor.user_id.clone(),
            ticket_count: tickets.len() as i64,
            total: crate::orders::money::round_money(total),
            ticket_numbers: tickets.iter().map(|t| t.ticket_number).collect(),
        };
        self.store
            .save_typed(&closure.id, &closure, None)
            .await
            .map_err(CoreError::from)?;

        let no_sales = closure.ticket_count == 0;
        if no_sales {
            tracing::warn!(%date, closure_number, "Closure generated with no sales");
        } else {
            tracing::info!(
                %date,
                closure_number,
                ticket_count = closure.ticket_count,
                total = closure.total,
                generated_by = %actor.user_id,
                "Daily closure generated"
            );
        }
        Ok(ClosureOutcome { closure, no_sales })
    }

    /// Existing closures for a date; lets callers enforce at-most-once
    pub async fn find_closures_for_date(&self, date: NaiveDate) -> CoreResult<Vec<DailyClosure>> {
        Ok(self
            .closure_history()
            .await?
            .into_iter()
            .filter(|c| c.closure_date == date)
            .collect())
    }

    /// All closures, newest first
    pub async fn closure_history(&self) -> CoreResult<Vec<DailyClosure>> {
        let mut closures: Vec<DailyClosure> = self
            .store
            .query_typed(partitions::CLOSURES)
            .await
            .map_err(CoreError::from)?;
        closures.sort_by_key(|c| std::cmp::Reverse(c.generated_at));
        Ok(closures)
    }
}
