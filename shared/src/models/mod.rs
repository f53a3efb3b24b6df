//! Data models
//!
//! Documents persisted through the store adapter plus the role table.
//! All timestamps are Unix millis (`i64`); money is `f64` rounded to two
//! decimal places by the server's money helpers before storage.

pub mod cancellation;
pub mod closure;
pub mod inventory;
pub mod order;
pub mod role;
pub mod ticket;

// Re-exports
pub use cancellation::*;
pub use closure::*;
pub use inventory::*;
pub use order::*;
pub use role::*;
pub use ticket::*;
