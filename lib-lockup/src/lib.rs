//! Token Lockup Streams
//!
//! This crate provides the canonical lifecycle logic for token-vesting
//! streams: a sender deposits tokens that unlock linearly to a recipient
//! between a start and an end time, optionally gated by a cliff.
//!
//! # Key Rules
//!
//! 1. **Linear accrual**: `streamed = deposited * elapsed / duration`,
//!    integer math, rounded down; zero before the cliff, everything at end
//! 2. **Ledger bound**: `withdrawn + refunded <= deposited`, always
//! 3. **Funds move with state**: every mutation pairs with exactly one
//!    custodian transfer; the transfer commits first, field writes follow
//! 4. **Explicit time**: every operation takes `now` from the host; the
//!    engine never reads a clock
//!
//! # Usage
//!
//! ```ignore
//! use lib_lockup::{CreateStreamParams, InMemoryCustodian, InMemoryRegistry, StreamEngine};
//!
//! let mut engine = StreamEngine::new(InMemoryRegistry::new(), custodian);
//! let id = engine.create(params, now)?;
//! engine.withdraw(id, recipient, amount, now)?;
//! ```

pub mod config;
pub mod custodian;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod lifecycle;
pub mod registry;
pub mod schedule;
pub mod state;

pub use config::LockupConfig;
pub use custodian::{FundHolder, InMemoryCustodian, TreasuryCustodian};
pub use engine::StreamEngine;
pub use errors::{CustodyError, StreamError, StreamResult};
pub use ledger::StreamAmounts;
pub use lifecycle::{cancel, create_stream, renounce_cancelability, withdraw, CreateStreamParams};
pub use registry::{InMemoryRegistry, StreamRegistry};
pub use schedule::streamed_amount;
pub use state::{Stream, StreamId, StreamStatus, STREAM_ID_PREFIX};
