//! Billing ticket - immutable snapshot of an order's active items
//!
//! Created when an order is sent to billing. The item list and total are
//! frozen at snapshot time; later order mutations never touch the ticket.

use super::order::OrderItem;
use serde::{Deserialize, Serialize};

/// Ticket status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    PendingPayment,
    Paid,
}

/// Payment method with method-specific amounts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash { received: f64, change: f64 },
    Card,
    Mixed { cash: f64, card: f64 },
    Transfer,
    Crypto,
}

/// Payment details recorded when a ticket is settled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentInfo {
    #[serde(flatten)]
    pub method: PaymentMethod,
    /// Amount settled against the ticket total
    pub amount: f64,
}

/// Ticket document (partition `tickets`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: String,
    /// Sequential number shared with orders and closures
    pub ticket_number: i64,
    pub order_id: String,
    pub order_number: i64,
    pub table_id: String,
    pub server_id: String,
    /// Active items frozen at billing time
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub status: TicketStatus,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentInfo>,
}

impl Ticket {
    pub fn is_paid(&self) -> bool {
        self.status == TicketStatus::Paid
    }
}
