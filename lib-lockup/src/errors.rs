//! Stream Engine Errors

use lib_types::{Amount, UnixTimestamp};
use thiserror::Error;

use crate::state::StreamId;

/// Error during stream operations
///
/// Every precondition failure of the four lifecycle operations maps to
/// exactly one variant here, surfaced to the caller unchanged. The engine
/// never recovers silently and never retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    // =========================================================================
    // Creation validation
    // =========================================================================
    #[error("Amount must be greater than 0")]
    InvalidAmount,

    #[error("Start time must not be in the past: start {start}, now {now}")]
    StartTimeInPast {
        start: UnixTimestamp,
        now: UnixTimestamp,
    },

    #[error("End time must be after start time: start {start}, end {end}")]
    EndTimeBeforeStartTime {
        start: UnixTimestamp,
        end: UnixTimestamp,
    },

    #[error("Cliff time must be between start and end time: start {start}, cliff {cliff}, end {end}")]
    CliffTimeOutOfRange {
        start: UnixTimestamp,
        cliff: UnixTimestamp,
        end: UnixTimestamp,
    },

    #[error("Stream name exceeds {max} bytes: got {len}")]
    NameTooLong { len: usize, max: usize },

    // =========================================================================
    // Authorization
    // =========================================================================
    #[error("Caller is not authorized for this operation")]
    Unauthorized,

    // =========================================================================
    // State
    // =========================================================================
    #[error("Stream is already canceled")]
    AlreadyCanceled,

    #[error("Stream is not cancelable")]
    NotCancelable,

    #[error("Stream is not cancelable after the end time has passed")]
    NotCancelableAfterEnd,

    #[error("Stream cancelability is not renounceable after the end time has passed")]
    NotRenounceableAfterEnd,

    // =========================================================================
    // Timing
    // =========================================================================
    #[error("Stream has not started: start {start}, now {now}")]
    NotStarted {
        start: UnixTimestamp,
        now: UnixTimestamp,
    },

    #[error("Cliff time has not been reached: cliff {cliff}, now {now}")]
    CliffNotReached {
        cliff: UnixTimestamp,
        now: UnixTimestamp,
    },

    // =========================================================================
    // Balance
    // =========================================================================
    #[error("Stream is empty: deposit fully withdrawn and refunded")]
    StreamEmpty,

    #[error("Amount exceeds available balance: available {available}, requested {requested}")]
    InsufficientAvailableBalance {
        available: Amount,
        requested: Amount,
    },

    // =========================================================================
    // Collaborators
    // =========================================================================
    #[error("Stream not found: {0}")]
    StreamNotFound(StreamId),

    #[error("Stream id is not in the correct format: {0:?}")]
    InvalidStreamIdFormat(String),

    #[error("Treasury transfer failed: {0}")]
    Transfer(#[from] CustodyError),

    // =========================================================================
    // Internal defects
    //
    // Unreachable through the public operations. Observing one of these
    // means a schedule or ledger computation bug, not a caller mistake.
    // =========================================================================
    #[error("Ledger invariant violated: withdrawn {withdrawn} + refunded {refunded} exceeds deposited {deposited}")]
    LedgerInvariantViolated {
        deposited: Amount,
        withdrawn: Amount,
        refunded: Amount,
    },

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Error from the treasury custodian
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: Amount, need: Amount },

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;
