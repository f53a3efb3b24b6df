//! Shared types for the Comanda back-office
//!
//! Domain models, the core error taxonomy and time utilities used by the
//! server crate. This crate does no I/O.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use serde::{Deserialize, Serialize};
