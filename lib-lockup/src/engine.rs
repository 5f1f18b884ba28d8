//! Stream Engine
//!
//! Facade over the registry and the custodian. Hosts hand it authenticated
//! callers, explicit `now` timestamps, and stream ids; it resolves the ids
//! and runs the lifecycle operations. There is no ambient clock anywhere in
//! the engine; every operation takes `now` from the host.

use lib_types::{Address, Amount, UnixTimestamp};

use crate::config::LockupConfig;
use crate::custodian::TreasuryCustodian;
use crate::errors::{StreamError, StreamResult};
use crate::ledger::StreamAmounts;
use crate::lifecycle::{self, CreateStreamParams};
use crate::registry::StreamRegistry;
use crate::state::{Stream, StreamId, StreamStatus};

/// The stream engine
///
/// Owns the registry and a handle to the custodian. Mutating operations
/// take `&mut self`; the host serializes access, which is what makes each
/// operation an atomic transaction against one stream.
pub struct StreamEngine<R, C> {
    registry: R,
    custodian: C,
    config: LockupConfig,
}

impl<R: StreamRegistry, C: TreasuryCustodian> StreamEngine<R, C> {
    /// Create an engine with the default config
    pub fn new(registry: R, custodian: C) -> Self {
        Self::with_config(registry, custodian, LockupConfig::default())
    }

    /// Create an engine with an explicit config
    pub fn with_config(registry: R, custodian: C, config: LockupConfig) -> Self {
        Self {
            registry,
            custodian,
            config,
        }
    }

    /// Create a stream; returns its id
    ///
    /// The index is peeked before the deposit moves and committed only
    /// after, so a failed create leaves the counter where it was.
    pub fn create(
        &mut self,
        params: CreateStreamParams,
        now: UnixTimestamp,
    ) -> StreamResult<StreamId> {
        let id = StreamId::new(self.registry.next_index());
        let stream = lifecycle::create_stream(&self.custodian, id, params, &self.config, now)?;

        // Deposit succeeded; committing the id and the record cannot fail.
        self.registry.allocate_index();
        self.registry.add_stream(stream);
        Ok(id)
    }

    /// Withdraw streamed tokens to the recipient of `id`
    pub fn withdraw(
        &mut self,
        id: StreamId,
        caller: Address,
        amount: Amount,
        now: UnixTimestamp,
    ) -> StreamResult<StreamAmounts> {
        let stream = self
            .registry
            .get_stream_mut(id)
            .ok_or(StreamError::StreamNotFound(id))?;
        lifecycle::withdraw(stream, &self.custodian, caller, amount, now)
    }

    /// Cancel the stream `id`; returns the refunded amount
    pub fn cancel(
        &mut self,
        id: StreamId,
        caller: Address,
        now: UnixTimestamp,
    ) -> StreamResult<Amount> {
        let stream = self
            .registry
            .get_stream_mut(id)
            .ok_or(StreamError::StreamNotFound(id))?;
        lifecycle::cancel(stream, &self.custodian, caller, now)
    }

    /// Irrevocably give up the right to cancel the stream `id`
    pub fn renounce_cancelability(
        &mut self,
        id: StreamId,
        caller: Address,
        now: UnixTimestamp,
    ) -> StreamResult<()> {
        let stream = self
            .registry
            .get_stream_mut(id)
            .ok_or(StreamError::StreamNotFound(id))?;
        lifecycle::renounce_cancelability(stream, caller, now)
    }

    /// Look up a stream by id
    pub fn get_stream(&self, id: StreamId) -> StreamResult<&Stream> {
        self.registry
            .get_stream(id)
            .ok_or(StreamError::StreamNotFound(id))
    }

    /// Amount streamed to the recipient of `id` at `now`
    pub fn streamed_amount(&self, id: StreamId, now: UnixTimestamp) -> StreamResult<Amount> {
        Ok(self.get_stream(id)?.streamed_amount(now))
    }

    /// Amount the recipient of `id` could withdraw at `now`
    pub fn withdrawable_amount(&self, id: StreamId, now: UnixTimestamp) -> StreamResult<Amount> {
        Ok(self.get_stream(id)?.withdrawable_amount(now))
    }

    /// Amount a cancellation of `id` at `now` would refund
    pub fn refundable_amount(&self, id: StreamId, now: UnixTimestamp) -> StreamResult<Amount> {
        Ok(self.get_stream(id)?.refundable_amount(now))
    }

    /// Derived status of `id` at `now`
    pub fn status(&self, id: StreamId, now: UnixTimestamp) -> StreamResult<StreamStatus> {
        Ok(self.get_stream(id)?.status(now))
    }

    /// Ids of all streams ever created, in creation order
    pub fn stream_ids(&self) -> Vec<StreamId> {
        self.registry.stream_ids()
    }

    /// The underlying registry
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// The underlying custodian
    pub fn custodian(&self) -> &C {
        &self.custodian
    }

    /// The active config
    pub fn config(&self) -> &LockupConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custodian::{FundHolder, InMemoryCustodian};
    use crate::registry::InMemoryRegistry;
    use lib_types::TokenId;

    const T: UnixTimestamp = 1_700_000_000;

    const SENDER: Address = Address::new([1u8; 32]);
    const RECIPIENT: Address = Address::new([2u8; 32]);

    fn test_engine() -> StreamEngine<InMemoryRegistry, InMemoryCustodian> {
        let custodian = InMemoryCustodian::new();
        custodian.credit_party(SENDER, 100_000);
        StreamEngine::new(InMemoryRegistry::new(), custodian)
    }

    fn test_params(amount: Amount) -> CreateStreamParams {
        CreateStreamParams {
            sender: SENDER,
            recipient: RECIPIENT,
            token_mint: TokenId::new([3u8; 32]),
            name: "grant".to_string(),
            amount,
            start_time: T,
            end_time: T + 100,
            cliff_time: T,
            is_cancelable: true,
            is_transferable: false,
        }
    }

    #[test]
    fn test_ids_assigned_in_order() {
        let mut engine = test_engine();
        let first = engine.create(test_params(1000), T).unwrap();
        let second = engine.create(test_params(2000), T).unwrap();

        assert_eq!(first.to_string(), "LL-0");
        assert_eq!(second.to_string(), "LL-1");
        assert_eq!(engine.stream_ids(), vec![first, second]);
    }

    #[test]
    fn test_failed_create_burns_no_id() {
        let mut engine = test_engine();
        let rejected = engine.create(test_params(0), T);
        assert_eq!(rejected, Err(StreamError::InvalidAmount));

        let id = engine.create(test_params(1000), T).unwrap();
        assert_eq!(id, StreamId::new(0));
    }

    #[test]
    fn test_operations_on_unknown_id() {
        let mut engine = test_engine();
        let missing = StreamId::new(7);

        assert_eq!(
            engine.get_stream(missing).err(),
            Some(StreamError::StreamNotFound(missing))
        );
        assert_eq!(
            engine.withdraw(missing, RECIPIENT, 1, T),
            Err(StreamError::StreamNotFound(missing))
        );
        assert_eq!(
            engine.cancel(missing, SENDER, T),
            Err(StreamError::StreamNotFound(missing))
        );
        assert_eq!(
            engine.renounce_cancelability(missing, SENDER, T),
            Err(StreamError::StreamNotFound(missing))
        );
    }

    #[test]
    fn test_end_to_end_withdraw_and_views() {
        let mut engine = test_engine();
        let id = engine.create(test_params(1000), T).unwrap();

        assert_eq!(engine.streamed_amount(id, T + 40).unwrap(), 400);
        assert_eq!(engine.withdrawable_amount(id, T + 40).unwrap(), 400);
        assert_eq!(engine.status(id, T + 40).unwrap(), StreamStatus::Streaming);

        engine.withdraw(id, RECIPIENT, 300, T + 40).unwrap();
        assert_eq!(engine.withdrawable_amount(id, T + 40).unwrap(), 100);
        assert_eq!(
            engine
                .custodian()
                .balance_of(FundHolder::Party(RECIPIENT)),
            300
        );
    }

    #[test]
    fn test_cancel_through_engine() {
        let mut engine = test_engine();
        let id = engine.create(test_params(1000), T).unwrap();

        assert_eq!(engine.refundable_amount(id, T + 40).unwrap(), 600);
        let refund = engine.cancel(id, SENDER, T + 40).unwrap();
        assert_eq!(refund, 600);
        assert_eq!(engine.status(id, T + 40).unwrap(), StreamStatus::Canceled);
        assert_eq!(engine.refundable_amount(id, T + 50).unwrap(), 0);
    }
}
