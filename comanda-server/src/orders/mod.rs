//! Order lifecycle
//!
//! The aggregate ([`aggregate`]) holds the pure state transitions: item
//! mutation, dispatch flags, the item cancellation state machine and total
//! recomputation. The service ([`service`]) wraps them in read-modify-write
//! cycles against the document store: read order + revision, mutate in
//! memory, write conditioned on that revision.
//!
//! # Order state machine
//!
//! ```text
//! Pending ──send_to_billing──► Billing ──mark_paid──► Paid
//!    │                            │
//!    └────────── approved full cancellation ────────► Cancelled
//! ```
//!
//! `Paid` and `Cancelled` are terminal. Cancellation of a whole order is
//! only reachable through the approval workflow in [`crate::cancellations`].

pub mod aggregate;
pub mod money;
pub mod service;

pub use service::{CreateOrderInput, NewItemLine, OrderService};

#[cfg(test)]
mod tests;
