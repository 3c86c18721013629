//! Spot price and fee records linked to the actions of their transaction.

use super::{
    Action, Applied, Fee, FeePool, Pool, ProtocolEvents, SkipReason, SpotPrice,
    indexer::Reduction,
};
use crate::{
    abi::pool::{FeePool::FeeWithdrawn, OptionAMMPool::TradeInfo},
    ids,
    reader::ContractReader,
    store::{Store, StoreExt},
    types::EventContext,
};

impl<S: Store, R: ContractReader> Reduction<'_, S, R> {
    pub(super) fn trade_info(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &TradeInfo,
    ) -> Applied {
        if !self.batch.contains::<Pool>(&ids::address_id(ctx.address())) {
            tracing::debug!(pool = %ctx.address(), "trade info of unknown pool");
            return Applied::Skipped(SkipReason::MissingDependency);
        }

        let tx_id = ctx.tx_id();
        let mut price = SpotPrice {
            id: tx_id.clone(),
            value: event.spotPrice,
            iv: event.newIV,
            action: None,
        };
        if let Some(mut action) = self.batch.load::<Action>(&tx_id) {
            action.spot_price = Some(price.id.clone());
            price.action = Some(action.id.clone());
            self.batch.upsert(action);
        }
        self.batch.upsert(price);
        Applied::Done
    }

    /// Accumulates the withdrawn fee of the transaction on the side of the emitting fee pool.
    pub(super) fn fee_withdrawn(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &FeeWithdrawn,
    ) -> Applied {
        let Some(fee_pool) = self.batch.load::<FeePool>(&ids::address_id(ctx.address())) else {
            tracing::debug!(fee_pool = %ctx.address(), "fee of unknown fee pool");
            return Applied::Skipped(SkipReason::MissingDependency);
        };

        let tx_id = ctx.tx_id();
        let side = fee_pool.r#type;
        let fee_id = ids::fee_id(&tx_id, side);
        let mut fee = self.batch.load::<Fee>(&fee_id).unwrap_or_else(|| Fee {
            id: fee_id,
            value: Default::default(),
            r#type: side,
            fee_pool: fee_pool.id.clone(),
            action: None,
            metadata: None,
        });
        fee.value = fee.value.saturating_add(event.feeWithdrawn);

        let mut metadata = self.metadata_or_empty(&tx_id);
        metadata.link_fee(side, fee.id.clone());
        fee.metadata = Some(metadata.id.clone());

        if let Some(mut action) = self.batch.load::<Action>(&tx_id) {
            fee.action = Some(action.id.clone());
            action.metadata = Some(metadata.id.clone());
            self.batch.upsert(action);
        }

        tracing::debug!(fee = %fee.id, value = %fee.value, %side, "fee withdrawn");
        self.batch.upsert(metadata);
        self.batch.upsert(fee);
        Applied::Done
    }
}
