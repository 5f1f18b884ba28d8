//! Stream Lifecycle
//!
//! The four mutating operations of the engine.
//!
//! # Operations
//!
//! - `create_stream`: validate parameters and fund a new stream treasury
//! - `withdraw`: recipient takes streamed tokens out of the treasury
//! - `cancel`: sender reclaims the unstreamed remainder and ends accrual
//! - `renounce_cancelability`: sender gives up the right to cancel
//!
//! # Atomicity
//!
//! Each operation validates everything up front, stages the new ledger
//! value, executes the single custodian transfer, and only then writes
//! stream fields. The transfer is the one fallible effect; if it fails the
//! stream is exactly as it was. The field writes after it cannot fail.
//!
//! # Consensus-Critical
//!
//! Check order within each operation is fixed: the first failing check
//! decides the error even when several would fail.

use lib_types::{Address, Amount, TokenId, UnixTimestamp};
use serde::{Deserialize, Serialize};

use crate::config::LockupConfig;
use crate::custodian::{FundHolder, TreasuryCustodian};
use crate::errors::{StreamError, StreamResult};
use crate::ledger::StreamAmounts;
use crate::state::{Stream, StreamId};

/// Parameters for creating a stream
///
/// `cliff_time` equal to `start_time` means no cliff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStreamParams {
    /// Depositor; the only party allowed to cancel
    pub sender: Address,
    /// Beneficiary; the only party allowed to withdraw
    pub recipient: Address,
    /// Asset to stream
    pub token_mint: TokenId,
    /// Cosmetic label, bounded by `LockupConfig::max_name_len`
    pub name: String,
    /// Total deposit, streamed in full by `end_time`
    pub amount: Amount,
    /// When linear accrual begins
    pub start_time: UnixTimestamp,
    /// When the full deposit is streamed
    pub end_time: UnixTimestamp,
    /// Before this nothing is withdrawable
    pub cliff_time: UnixTimestamp,
    /// Whether the sender may cancel
    pub is_cancelable: bool,
    /// Advisory metadata carried on the stream
    pub is_transferable: bool,
}

/// Create a new stream and fund its treasury
///
/// The caller supplies the id peeked from the registry and commits the
/// index allocation only after this returns Ok, so a rejected create burns
/// no id.
///
/// # Errors
/// - `InvalidAmount` - deposit is zero
/// - `StartTimeInPast` - start_time before now
/// - `EndTimeBeforeStartTime` - end_time not after start_time
/// - `CliffTimeOutOfRange` - cliff_time outside [start_time, end_time]
/// - `NameTooLong` - name exceeds the configured bound
/// - `Transfer` - custodian could not move the deposit
pub fn create_stream(
    custodian: &dyn TreasuryCustodian,
    id: StreamId,
    params: CreateStreamParams,
    config: &LockupConfig,
    now: UnixTimestamp,
) -> StreamResult<Stream> {
    // =========================================================================
    // Check 1: Deposit amount
    // =========================================================================
    if params.amount == 0 {
        return Err(StreamError::InvalidAmount);
    }

    // =========================================================================
    // Check 2: Start not in the past (start == now is allowed)
    // =========================================================================
    if params.start_time < now {
        return Err(StreamError::StartTimeInPast {
            start: params.start_time,
            now,
        });
    }

    // =========================================================================
    // Check 3: End strictly after start
    // =========================================================================
    if params.end_time <= params.start_time {
        return Err(StreamError::EndTimeBeforeStartTime {
            start: params.start_time,
            end: params.end_time,
        });
    }

    // =========================================================================
    // Check 4: Cliff within [start, end]
    // =========================================================================
    if params.cliff_time < params.start_time || params.cliff_time > params.end_time {
        return Err(StreamError::CliffTimeOutOfRange {
            start: params.start_time,
            cliff: params.cliff_time,
            end: params.end_time,
        });
    }

    // =========================================================================
    // Check 5: Name length
    // =========================================================================
    if params.name.len() > config.max_name_len {
        return Err(StreamError::NameTooLong {
            len: params.name.len(),
            max: config.max_name_len,
        });
    }

    // =========================================================================
    // Fund the treasury, then build the stream
    // =========================================================================
    custodian.transfer(
        FundHolder::Party(params.sender),
        FundHolder::Treasury(id),
        params.amount,
    )?;

    let stream = Stream {
        id,
        name: params.name,
        sender: params.sender,
        recipient: params.recipient,
        token_mint: params.token_mint,
        amounts: StreamAmounts::new(params.amount),
        start_time: params.start_time,
        cliff_time: params.cliff_time,
        end_time: params.end_time,
        is_cancelable: params.is_cancelable,
        is_canceled: false,
        is_transferable: params.is_transferable,
    };

    tracing::info!(
        "Stream {} created: {} tokens from {} to {}, streaming {} -> {} (cliff {})",
        stream.id,
        stream.amounts.deposited,
        stream.sender,
        stream.recipient,
        stream.start_time,
        stream.end_time,
        stream.cliff_time,
    );

    Ok(stream)
}

/// Withdraw streamed tokens to the recipient
///
/// Returns the ledger after the withdrawal. Withdrawal stays possible after
/// cancellation for whatever had streamed before the cancel.
///
/// # Errors
/// - `Unauthorized` - caller is not the recipient
/// - `InvalidAmount` - amount is zero
/// - `NotStarted` - now before start_time
/// - `CliffNotReached` - now before cliff_time
/// - `StreamEmpty` - deposit fully withdrawn and refunded
/// - `InsufficientAvailableBalance` - amount exceeds what has streamed
/// - `Transfer` - custodian could not move the funds
pub fn withdraw(
    stream: &mut Stream,
    custodian: &dyn TreasuryCustodian,
    caller: Address,
    amount: Amount,
    now: UnixTimestamp,
) -> StreamResult<StreamAmounts> {
    // =========================================================================
    // Check 1: Authorization
    // =========================================================================
    if caller != stream.recipient {
        return Err(StreamError::Unauthorized);
    }

    // =========================================================================
    // Check 2: Amount
    // =========================================================================
    if amount == 0 {
        return Err(StreamError::InvalidAmount);
    }

    // =========================================================================
    // Check 3: Stream has started
    // =========================================================================
    if now < stream.start_time {
        return Err(StreamError::NotStarted {
            start: stream.start_time,
            now,
        });
    }

    // =========================================================================
    // Check 4: Cliff has passed (now == cliff is allowed)
    // =========================================================================
    if now < stream.cliff_time {
        return Err(StreamError::CliffNotReached {
            cliff: stream.cliff_time,
            now,
        });
    }

    // =========================================================================
    // Check 5: Funds available
    // =========================================================================
    let streamed = stream.streamed_amount(now);
    let available = stream.amounts.available_to_withdraw(streamed);

    tracing::debug!(
        "Stream {}: {} streamed, {} available at {}",
        stream.id,
        streamed,
        available,
        now,
    );

    if available == 0 && stream.amounts.is_depleted() {
        return Err(StreamError::StreamEmpty);
    }
    if amount > available {
        return Err(StreamError::InsufficientAvailableBalance {
            available,
            requested: amount,
        });
    }

    // =========================================================================
    // Commit: stage ledger, move funds, then write
    // =========================================================================
    let next = stream.amounts.with_withdrawal(amount, streamed)?;

    custodian.transfer(
        FundHolder::Treasury(stream.id),
        FundHolder::Party(stream.recipient),
        amount,
    )?;

    stream.amounts = next;

    tracing::info!(
        "Stream {}: withdrew {} to {} ({} of {} taken)",
        stream.id,
        amount,
        stream.recipient,
        stream.amounts.withdrawn,
        stream.amounts.deposited,
    );

    Ok(stream.amounts)
}

/// Cancel a stream and refund the unstreamed remainder to the sender
///
/// Returns the refunded amount. Whatever had streamed by `now` stays in
/// the treasury for the recipient to withdraw; accrual stops because the
/// refund caps the ledger at the streamed amount.
///
/// # Errors
/// - `Unauthorized` - caller is not the sender
/// - `AlreadyCanceled` - stream was canceled before
/// - `NotCancelable` - cancelability renounced or never granted
/// - `NotCancelableAfterEnd` - now at or past end_time
/// - `Transfer` - custodian could not move the refund
pub fn cancel(
    stream: &mut Stream,
    custodian: &dyn TreasuryCustodian,
    caller: Address,
    now: UnixTimestamp,
) -> StreamResult<Amount> {
    // =========================================================================
    // Checks, in order
    // =========================================================================
    if caller != stream.sender {
        return Err(StreamError::Unauthorized);
    }
    if stream.is_canceled {
        return Err(StreamError::AlreadyCanceled);
    }
    if !stream.is_cancelable {
        return Err(StreamError::NotCancelable);
    }
    if stream.has_ended(now) {
        return Err(StreamError::NotCancelableAfterEnd);
    }

    // =========================================================================
    // Refund: everything not yet streamed
    //
    // now < end_time here, so streamed < deposited and the refund is
    // non-zero. Before the cliff streamed is 0 and the full deposit
    // returns.
    // =========================================================================
    let streamed = stream.streamed_amount(now);
    let refund = stream.amounts.deposited.saturating_sub(streamed);

    tracing::debug!(
        "Stream {}: cancel split at {}: {} streamed stays, {} refunds",
        stream.id,
        now,
        streamed,
        refund,
    );

    // =========================================================================
    // Commit: stage ledger, move funds, then write
    // =========================================================================
    let next = stream.amounts.with_refund(refund)?;

    custodian.transfer(
        FundHolder::Treasury(stream.id),
        FundHolder::Party(stream.sender),
        refund,
    )?;

    stream.amounts = next;
    stream.is_canceled = true;
    stream.is_cancelable = false;

    tracing::info!(
        "Stream {}: canceled at {}, refunded {} to {}, {} left for {}",
        stream.id,
        now,
        refund,
        stream.sender,
        stream.amounts.treasury_balance(),
        stream.recipient,
    );

    Ok(refund)
}

/// Irrevocably give up the right to cancel a stream
///
/// # Errors
/// - `Unauthorized` - caller is not the sender
/// - `AlreadyCanceled` - stream was already canceled
/// - `NotCancelable` - cancelability already renounced or never granted
/// - `NotRenounceableAfterEnd` - now at or past end_time
pub fn renounce_cancelability(
    stream: &mut Stream,
    caller: Address,
    now: UnixTimestamp,
) -> StreamResult<()> {
    // Same gate order as cancel; only the terminal time error differs.
    if caller != stream.sender {
        return Err(StreamError::Unauthorized);
    }
    if stream.is_canceled {
        return Err(StreamError::AlreadyCanceled);
    }
    if !stream.is_cancelable {
        return Err(StreamError::NotCancelable);
    }
    if stream.has_ended(now) {
        return Err(StreamError::NotRenounceableAfterEnd);
    }

    stream.is_cancelable = false;

    tracing::info!("Stream {}: cancelability renounced", stream.id);

    Ok(())
}
