//! Comanda back-office core
//!
//! Order lifecycle, two-tier cancellation approval, append-only inventory
//! ledger, sequential numbering and daily Z-closures for a multi-terminal
//! restaurant POS, on top of a revision-checked document store.
//!
//! # Concurrency model
//!
//! Every mutation is read-modify-write: read a document and its revision,
//! apply the change in memory, write conditioned on that revision. A stale
//! revision fails with `ConcurrentModification`; the caller reloads and
//! decides whether to retry. There is no multi-document atomicity - flows
//! that touch several documents (cancellation approval + inventory
//! reversal) are sequences of independent compare-and-swap writes. The
//! inventory ledger sidesteps conflicts entirely by being append-only.

pub mod auth;
pub mod cancellations;
pub mod closure;
pub mod config;
pub mod inventory;
pub mod orders;
pub mod reporting;
pub mod sequence;
pub mod state;
pub mod store;
pub mod utils;

// Re-exports
pub use config::Config;
pub use shared::{CoreError, CoreResult};
pub use state::ServerState;
