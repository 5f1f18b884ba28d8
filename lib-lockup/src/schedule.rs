//! Linear Vesting Schedule
//!
//! Pure computation of how much of a deposit is economically earned
//! (streamed) at a given time, independent of withdrawals and cancellation.
//!
//! # Vesting Model
//!
//! Tokens stream linearly between `start_time` and `end_time`, but nothing
//! unlocks before `cliff_time`:
//!
//! ```text
//! |----cliff----|--------linear streaming--------|
//! ^             ^                                ^
//! start_time    cliff_time                       end_time
//! ```
//!
//! - Before the cliff: 0 streamed
//! - At the cliff: the linear share since `start_time` becomes streamed
//! - At or after the end: the full deposit is streamed
//!
//! # Consensus-Critical
//!
//! Integer math only. No floating point. The floor division truncates
//! toward zero so the result never exceeds the true proportional share,
//! and for fixed parameters the result is non-decreasing in `now`.

use lib_types::{Amount, UnixTimestamp};

/// Amount of the deposit streamed to the recipient at `now`.
///
/// Returns 0 before `start_time` or `cliff_time`, the full `deposited`
/// at or after `end_time`, and the floored linear share
/// `deposited * (now - start) / (end - start)` in between.
///
/// Creation validation guarantees `start <= cliff <= end` and
/// `start < end`, so the division is never by zero here.
pub fn streamed_amount(
    start_time: UnixTimestamp,
    cliff_time: UnixTimestamp,
    end_time: UnixTimestamp,
    deposited: Amount,
    now: UnixTimestamp,
) -> Amount {
    if now < start_time || now < cliff_time {
        return 0;
    }
    if now >= end_time {
        return deposited;
    }

    // Linear region: start <= cliff <= now < end, so both differences are
    // non-negative and duration is at least 1. Widening before subtracting
    // keeps spans wider than i64 in range.
    let elapsed = (now as i128 - start_time as i128) as u128;
    let duration = (end_time as i128 - start_time as i128) as u128;

    // Widen to u128 so deposited * elapsed cannot overflow. The quotient is
    // strictly less than deposited in this region and fits back into Amount.
    ((deposited as u128).saturating_mul(elapsed) / duration) as Amount
}
