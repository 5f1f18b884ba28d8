//! Stream State
//!
//! The durable Stream entity, its identifier, and the read projections
//! derived from it. Mutable only through the lifecycle operations; between
//! operations it is owned by the registry.
//!
//! # Consensus-Critical
//!
//! The id is stored as its registry-assigned index, never as a string; the
//! human-facing `LL-<index>` form exists only at the display boundary.
//! Depleted and ended are projections over the stored fields, never stored
//! flags, so they cannot desynchronize from the ledger.

use std::fmt;
use std::str::FromStr;

use lib_types::{Address, Amount, StreamIndex, TokenId, UnixTimestamp};
use serde::{Deserialize, Serialize};

use crate::errors::StreamError;
use crate::ledger::StreamAmounts;
use crate::schedule;

/// Prefix of the human-facing stream id form
pub const STREAM_ID_PREFIX: &str = "LL";

/// Stream identifier derived from the registry-assigned index.
///
/// Renders as `LL-<index>` and parses the same form back.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct StreamId(pub StreamIndex);

impl StreamId {
    /// Create a stream id from a registry index
    pub const fn new(index: StreamIndex) -> Self {
        Self(index)
    }

    /// The registry index this id was derived from
    pub const fn index(&self) -> StreamIndex {
        self.0
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamId({}-{})", STREAM_ID_PREFIX, self.0)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", STREAM_ID_PREFIX, self.0)
    }
}

impl FromStr for StreamId {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = s
            .strip_prefix(STREAM_ID_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|index| index.parse::<StreamIndex>().ok())
            .ok_or_else(|| StreamError::InvalidStreamIdFormat(s.to_string()))?;
        Ok(Self(index))
    }
}

/// Derived stream state for dashboards and hosts.
///
/// Evaluation order matters: a depleted stream reports `Depleted` even if
/// it was canceled, and a canceled stream reports `Canceled` regardless of
/// where `now` falls on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamStatus {
    /// Deposit fully withdrawn and refunded; nothing left ever
    Depleted,
    /// Canceled by the sender; residual streamed funds may remain withdrawable
    Canceled,
    /// Before start_time
    NotStarted,
    /// Started but before cliff_time
    BeforeCliff,
    /// Actively streaming (between cliff and end)
    Streaming,
    /// Past end_time with funds still in the treasury
    Ended,
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depleted => write!(f, "Depleted"),
            Self::Canceled => write!(f, "Canceled"),
            Self::NotStarted => write!(f, "Not started"),
            Self::BeforeCliff => write!(f, "Before cliff"),
            Self::Streaming => write!(f, "Streaming"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

/// A token-vesting stream.
///
/// `deposited` tokens stream linearly from `sender` to `recipient` between
/// `start_time` and `end_time`, gated by `cliff_time`. Created once by the
/// lifecycle `create` operation, then mutated in place by `withdraw`,
/// `cancel`, and `renounce_cancelability`; never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Registry-derived identity; immutable
    pub id: StreamId,
    /// Free-text label; immutable, cosmetic only
    pub name: String,

    /// Creator and depositor of the stream
    pub sender: Address,
    /// Beneficiary of the streamed tokens
    pub recipient: Address,

    /// Asset being streamed; opaque to the engine
    pub token_mint: TokenId,

    /// Deposited/withdrawn/refunded ledger
    pub amounts: StreamAmounts,

    /// When linear accrual begins
    pub start_time: UnixTimestamp,
    /// Before this nothing is withdrawable; equal to start_time means no cliff
    pub cliff_time: UnixTimestamp,
    /// When the full deposit is streamed
    pub end_time: UnixTimestamp,

    /// Sender may still cancel; only ever flips true -> false
    pub is_cancelable: bool,
    /// Stream was canceled; only ever flips false -> true
    pub is_canceled: bool,
    /// Advisory metadata; no transfer operation exists in the engine
    pub is_transferable: bool,
}

impl Stream {
    /// Amount economically earned by the recipient at `now`, before any
    /// withdrawal accounting.
    pub fn streamed_amount(&self, now: UnixTimestamp) -> Amount {
        schedule::streamed_amount(
            self.start_time,
            self.cliff_time,
            self.end_time,
            self.amounts.deposited,
            now,
        )
    }

    /// Amount the recipient could withdraw at `now`.
    pub fn withdrawable_amount(&self, now: UnixTimestamp) -> Amount {
        self.amounts.available_to_withdraw(self.streamed_amount(now))
    }

    /// Amount a cancellation at `now` would return to the sender.
    ///
    /// Zero once the stream is canceled, non-cancelable, or past its end.
    pub fn refundable_amount(&self, now: UnixTimestamp) -> Amount {
        if self.is_canceled || !self.is_cancelable || now >= self.end_time {
            return 0;
        }
        self.amounts.deposited.saturating_sub(self.streamed_amount(now))
    }

    /// True when every deposited token has been withdrawn or refunded.
    pub fn is_depleted(&self) -> bool {
        self.amounts.is_depleted()
    }

    /// True when `now` is at or past the end of the schedule.
    pub fn has_ended(&self, now: UnixTimestamp) -> bool {
        now >= self.end_time
    }

    /// Derived status at `now`.
    pub fn status(&self, now: UnixTimestamp) -> StreamStatus {
        if self.is_depleted() {
            return StreamStatus::Depleted;
        }
        if self.is_canceled {
            return StreamStatus::Canceled;
        }
        if now < self.start_time {
            return StreamStatus::NotStarted;
        }
        if now < self.cliff_time {
            return StreamStatus::BeforeCliff;
        }
        if now < self.end_time {
            return StreamStatus::Streaming;
        }
        StreamStatus::Ended
    }
}
