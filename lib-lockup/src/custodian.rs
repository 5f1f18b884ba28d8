//! Treasury Custody
//!
//! The engine never holds tokens itself. Every deposit, withdrawal, and
//! refund is a transfer the host executes between an external party account
//! and a per-stream treasury. This module defines that seam.
//!
//! The lifecycle operations call `transfer` exactly once per state change,
//! before any stream field is mutated. A custodian that fails the transfer
//! therefore leaves the stream untouched.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use lib_types::{Address, Amount};

use crate::errors::CustodyError;
use crate::state::StreamId;

/// An endpoint of a custodial transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FundHolder {
    /// External account owned by a sender or recipient
    Party(Address),
    /// The escrow bucket dedicated to one stream
    Treasury(StreamId),
}

impl fmt::Display for FundHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Party(address) => write!(f, "party {}", address),
            Self::Treasury(id) => write!(f, "treasury {}", id),
        }
    }
}

/// Trait for the fund storage backing the stream engine
///
/// Implementations ride on whatever holds the actual tokens. The engine
/// only requires that a successful `transfer` moved exactly `amount` from
/// `from` to `to` and that a failed one moved nothing.
pub trait TreasuryCustodian {
    /// Move `amount` tokens between two holders
    fn transfer(&self, from: FundHolder, to: FundHolder, amount: Amount) -> Result<(), CustodyError>;
}

/// Map-backed custodian for tests and hosts without external token storage
#[derive(Debug, Default)]
pub struct InMemoryCustodian {
    balances: RefCell<HashMap<FundHolder, Amount>>,
}

impl InMemoryCustodian {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an external party account with funds
    pub fn credit_party(&self, address: Address, amount: Amount) {
        let mut balances = self.balances.borrow_mut();
        let entry = balances.entry(FundHolder::Party(address)).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Current balance of any holder; unknown holders read as zero
    pub fn balance_of(&self, holder: FundHolder) -> Amount {
        *self.balances.borrow().get(&holder).unwrap_or(&0)
    }
}

impl TreasuryCustodian for InMemoryCustodian {
    fn transfer(&self, from: FundHolder, to: FundHolder, amount: Amount) -> Result<(), CustodyError> {
        let mut balances = self.balances.borrow_mut();

        let from_balance = *balances.get(&from).unwrap_or(&0);
        if from_balance < amount {
            return Err(CustodyError::InsufficientFunds {
                have: from_balance,
                need: amount,
            });
        }

        // Debit and credit land on the same entry; nothing moves.
        if from == to {
            return Ok(());
        }

        let to_balance = *balances.get(&to).unwrap_or(&0);
        let new_to_balance = to_balance.checked_add(amount).ok_or(CustodyError::Overflow)?;

        // Both sides validated; the writes below cannot fail.
        balances.insert(from, from_balance - amount);
        balances.insert(to, new_to_balance);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party(byte: u8) -> FundHolder {
        FundHolder::Party(Address::new([byte; 32]))
    }

    #[test]
    fn test_transfer_moves_funds() {
        let custodian = InMemoryCustodian::new();
        custodian.credit_party(Address::new([1u8; 32]), 1000);

        let treasury = FundHolder::Treasury(StreamId::new(0));
        custodian.transfer(party(1), treasury, 400).unwrap();

        assert_eq!(custodian.balance_of(party(1)), 600);
        assert_eq!(custodian.balance_of(treasury), 400);
    }

    #[test]
    fn test_insufficient_funds_rejected() {
        let custodian = InMemoryCustodian::new();
        custodian.credit_party(Address::new([1u8; 32]), 100);

        let result = custodian.transfer(party(1), party(2), 101);
        assert_eq!(
            result,
            Err(CustodyError::InsufficientFunds { have: 100, need: 101 })
        );
        // Nothing moved.
        assert_eq!(custodian.balance_of(party(1)), 100);
        assert_eq!(custodian.balance_of(party(2)), 0);
    }

    #[test]
    fn test_unknown_holder_reads_as_zero() {
        let custodian = InMemoryCustodian::new();
        assert_eq!(custodian.balance_of(party(9)), 0);
        assert_eq!(
            custodian.transfer(party(9), party(1), 1),
            Err(CustodyError::InsufficientFunds { have: 0, need: 1 })
        );
    }

    #[test]
    fn test_credit_overflow_rejected_on_transfer() {
        let custodian = InMemoryCustodian::new();
        custodian.credit_party(Address::new([1u8; 32]), Amount::MAX);
        custodian.credit_party(Address::new([2u8; 32]), 1);

        let result = custodian.transfer(party(2), party(1), 1);
        assert_eq!(result, Err(CustodyError::Overflow));
        // Debit side untouched after the failed credit.
        assert_eq!(custodian.balance_of(party(2)), 1);
    }

    #[test]
    fn test_fund_holder_display() {
        let treasury = FundHolder::Treasury(StreamId::new(3));
        assert_eq!(treasury.to_string(), "treasury LL-3");
    }

    #[test]
    fn test_zero_amount_transfer_is_noop() {
        let custodian = InMemoryCustodian::new();
        custodian.transfer(party(1), party(2), 0).unwrap();
        assert_eq!(custodian.balance_of(party(2)), 0);
    }

    #[test]
    fn test_self_transfer_leaves_balance_unchanged() {
        let custodian = InMemoryCustodian::new();
        custodian.credit_party(Address::new([1u8; 32]), 100);

        custodian.transfer(party(1), party(1), 50).unwrap();
        assert_eq!(custodian.balance_of(party(1)), 100);

        // The debit check still applies to the degenerate pair.
        assert_eq!(
            custodian.transfer(party(1), party(1), 101),
            Err(CustodyError::InsufficientFunds { have: 100, need: 101 })
        );
    }
}
