//! Stream Amount Ledger
//!
//! Bookkeeping of `deposited`/`withdrawn`/`refunded` for a single stream.
//! The ledger has no time awareness: callers feed it the streamed amount
//! computed by the schedule and it enforces the balance rules.
//!
//! # Invariants
//!
//! - `withdrawn + refunded <= deposited` at all times
//! - `deposited` is fixed at creation and never changes
//! - `withdrawn` and `refunded` increase monotonically
//!
//! A violated invariant is a computation defect in the schedule or ledger,
//! never a caller error; it surfaces as `LedgerInvariantViolated` and must
//! be unreachable through the lifecycle operations.
//!
//! # Staging
//!
//! `with_withdrawal` / `with_refund` return the next ledger value without
//! touching `self`, so lifecycle operations can compute the post-state
//! before any funds move and commit it with a plain assignment afterwards.

use lib_types::Amount;
use serde::{Deserialize, Serialize};

use crate::errors::{StreamError, StreamResult};

/// Deposited, withdrawn, and refunded token amounts for one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAmounts {
    /// Principal locked at creation; immutable
    pub deposited: Amount,
    /// Total paid out to the recipient so far
    pub withdrawn: Amount,
    /// Total returned to the sender by cancellation
    pub refunded: Amount,
}

impl StreamAmounts {
    /// Fresh ledger for a new stream: nothing withdrawn, nothing refunded.
    pub fn new(deposited: Amount) -> Self {
        Self {
            deposited,
            withdrawn: 0,
            refunded: 0,
        }
    }

    /// Amount the recipient may withdraw right now, given the streamed
    /// amount at the caller's `now`.
    ///
    /// Streamed principal that was refunded by a cancellation can no longer
    /// be earned, so the streamed amount is capped at
    /// `deposited - refunded` before subtracting prior withdrawals.
    /// Never negative.
    pub fn available_to_withdraw(&self, streamed: Amount) -> Amount {
        let earnable = self.deposited.saturating_sub(self.refunded);
        earnable.min(streamed).saturating_sub(self.withdrawn)
    }

    /// True when the deposit is fully spoken for: every token has been
    /// either withdrawn or refunded, and nothing will ever be withdrawable
    /// again.
    pub fn is_depleted(&self) -> bool {
        self.withdrawn.saturating_add(self.refunded) == self.deposited
    }

    /// Treasury balance implied by the ledger:
    /// `deposited - withdrawn - refunded`.
    pub fn treasury_balance(&self) -> Amount {
        self.deposited
            .saturating_sub(self.withdrawn)
            .saturating_sub(self.refunded)
    }

    /// Next ledger value after withdrawing `amount`, without mutating.
    ///
    /// Requires `amount > 0` and `amount <= available_to_withdraw(streamed)`.
    pub fn with_withdrawal(&self, amount: Amount, streamed: Amount) -> StreamResult<Self> {
        if amount == 0 {
            return Err(StreamError::InvalidAmount);
        }
        let available = self.available_to_withdraw(streamed);
        if amount > available {
            return Err(StreamError::InsufficientAvailableBalance {
                available,
                requested: amount,
            });
        }

        let next = Self {
            deposited: self.deposited,
            withdrawn: self
                .withdrawn
                .checked_add(amount)
                .ok_or(StreamError::Overflow)?,
            refunded: self.refunded,
        };
        next.check_invariant()?;
        Ok(next)
    }

    /// Next ledger value after refunding `amount` to the sender, without
    /// mutating.
    ///
    /// Used only by cancellation. The caller derives
    /// `amount = deposited - streamed(now)`, which satisfies the invariant
    /// by construction; the check here is the backstop.
    pub fn with_refund(&self, amount: Amount) -> StreamResult<Self> {
        let next = Self {
            deposited: self.deposited,
            withdrawn: self.withdrawn,
            refunded: self
                .refunded
                .checked_add(amount)
                .ok_or(StreamError::Overflow)?,
        };
        next.check_invariant()?;
        Ok(next)
    }

    /// Mutating form of [`Self::with_withdrawal`].
    pub fn record_withdrawal(&mut self, amount: Amount, streamed: Amount) -> StreamResult<()> {
        *self = self.with_withdrawal(amount, streamed)?;
        Ok(())
    }

    /// Mutating form of [`Self::with_refund`].
    pub fn record_refund(&mut self, amount: Amount) -> StreamResult<()> {
        *self = self.with_refund(amount)?;
        Ok(())
    }

    fn check_invariant(&self) -> StreamResult<()> {
        let spent = self
            .withdrawn
            .checked_add(self.refunded)
            .ok_or(StreamError::Overflow)?;
        if spent > self.deposited {
            return Err(StreamError::LedgerInvariantViolated {
                deposited: self.deposited,
                withdrawn: self.withdrawn,
                refunded: self.refunded,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ledger() {
        let amounts = StreamAmounts::new(1000);
        assert_eq!(amounts.deposited, 1000);
        assert_eq!(amounts.withdrawn, 0);
        assert_eq!(amounts.refunded, 0);
        assert_eq!(amounts.treasury_balance(), 1000);
        assert!(!amounts.is_depleted());
    }

    // ─── available_to_withdraw ───

    #[test]
    fn test_available_tracks_streamed() {
        let amounts = StreamAmounts::new(1000);
        assert_eq!(amounts.available_to_withdraw(0), 0);
        assert_eq!(amounts.available_to_withdraw(400), 400);
        assert_eq!(amounts.available_to_withdraw(1000), 1000);
    }

    #[test]
    fn test_available_subtracts_withdrawn() {
        let mut amounts = StreamAmounts::new(1000);
        amounts.record_withdrawal(300, 500).unwrap();
        assert_eq!(amounts.available_to_withdraw(500), 200);
        assert_eq!(amounts.available_to_withdraw(300), 0);
    }

    #[test]
    fn test_available_capped_by_unrefunded_principal() {
        let mut amounts = StreamAmounts::new(1000);
        amounts.record_refund(600).unwrap();
        // Only 400 of principal remains earnable, regardless of streamed
        assert_eq!(amounts.available_to_withdraw(1000), 400);
        assert_eq!(amounts.available_to_withdraw(250), 250);
    }

    #[test]
    fn test_available_never_negative() {
        let mut amounts = StreamAmounts::new(1000);
        amounts.record_withdrawal(500, 500).unwrap();
        // Streamed below what was already withdrawn: saturates to zero
        assert_eq!(amounts.available_to_withdraw(100), 0);
    }

    // ─── withdrawal ───

    #[test]
    fn test_withdrawal_zero_amount_rejected() {
        let mut amounts = StreamAmounts::new(1000);
        assert_eq!(
            amounts.record_withdrawal(0, 500),
            Err(StreamError::InvalidAmount)
        );
    }

    #[test]
    fn test_withdrawal_exceeding_available_rejected() {
        let mut amounts = StreamAmounts::new(1000);
        let err = amounts.record_withdrawal(501, 500).unwrap_err();
        assert_eq!(
            err,
            StreamError::InsufficientAvailableBalance {
                available: 500,
                requested: 501,
            }
        );
        // Nothing was applied
        assert_eq!(amounts.withdrawn, 0);
    }

    #[test]
    fn test_withdrawal_exact_available_drains() {
        let mut amounts = StreamAmounts::new(1000);
        amounts.record_withdrawal(500, 500).unwrap();
        assert_eq!(amounts.withdrawn, 500);
        assert_eq!(amounts.available_to_withdraw(500), 0);
        assert_eq!(amounts.treasury_balance(), 500);
    }

    #[test]
    fn test_staged_withdrawal_leaves_self_untouched() {
        let amounts = StreamAmounts::new(1000);
        let staged = amounts.with_withdrawal(250, 500).unwrap();
        assert_eq!(staged.withdrawn, 250);
        assert_eq!(amounts.withdrawn, 0);
    }

    // ─── refund ───

    #[test]
    fn test_refund_accumulates() {
        let mut amounts = StreamAmounts::new(1000);
        amounts.record_refund(700).unwrap();
        assert_eq!(amounts.refunded, 700);
        assert_eq!(amounts.treasury_balance(), 300);
    }

    #[test]
    fn test_full_refund_depletes() {
        let mut amounts = StreamAmounts::new(1000);
        amounts.record_refund(1000).unwrap();
        assert!(amounts.is_depleted());
        assert_eq!(amounts.treasury_balance(), 0);
    }

    #[test]
    fn test_withdraw_plus_refund_depletes() {
        let mut amounts = StreamAmounts::new(1000);
        amounts.record_withdrawal(400, 400).unwrap();
        amounts.record_refund(600).unwrap();
        assert!(amounts.is_depleted());
        assert_eq!(amounts.available_to_withdraw(1000), 0);
    }

    // ─── invariant ───

    #[test]
    fn test_refund_breaking_invariant_rejected() {
        let mut amounts = StreamAmounts::new(1000);
        amounts.record_withdrawal(400, 400).unwrap();
        let err = amounts.record_refund(601).unwrap_err();
        assert_eq!(
            err,
            StreamError::LedgerInvariantViolated {
                deposited: 1000,
                withdrawn: 400,
                refunded: 601,
            }
        );
        // Failed mutation leaves the ledger as it was
        assert_eq!(amounts.refunded, 0);
    }

    #[test]
    fn test_refund_overflow_rejected() {
        let mut amounts = StreamAmounts::new(Amount::MAX);
        amounts.record_refund(Amount::MAX).unwrap();
        assert_eq!(amounts.record_refund(1), Err(StreamError::Overflow));
    }
}
