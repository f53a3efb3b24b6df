//! Daily closure (Z-report) document

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Immutable daily aggregate of paid tickets (partition `closures`)
///
/// The engine does not enforce at-most-one closure per date; re-running for
/// a closed date produces a new closure over the same tickets. Callers that
/// want the invariant check existing closures first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyClosure {
    pub id: String,
    /// Sequential number shared with orders and tickets
    pub closure_number: i64,
    /// Venue-local calendar day the closure covers
    pub closure_date: NaiveDate,
    pub generated_at: i64,
    pub generated_by: String,
    pub ticket_count: i64,
    pub total: f64,
    /// Ticket numbers included in this closure
    pub ticket_numbers: Vec<i64>,
}
