//! Stream engine primitives.
//! Stable, protocol-neutral, behavior-free.
//!
//! Rule: No String identifiers in engine state. Ever.

pub mod primitives;

pub use primitives::{Address, Amount, StreamIndex, TokenId, UnixTimestamp};
